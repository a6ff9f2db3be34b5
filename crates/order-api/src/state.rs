//! # Application State
//!
//! Shared state for the Axum application: gateway selector, restaurant
//! directory, order repository and the two domain services built on top
//! of them. Everything is wired explicitly here so tests can substitute
//! fakes for the gateways and the repository.

use order_core::{
    CheckoutService, GatewaySelector, InMemoryOrderRepository, OrderRepository,
    RestaurantDirectory, WebhookReconciler,
};
use order_paymee::PaymeeGateway;
use order_stripe::StripeGateway;
use std::sync::Arc;

/// Application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Environment (development, staging, production)
    pub environment: String,
}

impl AppConfig {
    /// Load from environment variables
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        Self {
            host: std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: std::env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
        }
    }

    /// Get the socket address to bind to
    pub fn socket_addr(&self) -> anyhow::Result<std::net::SocketAddr> {
        Ok(format!("{}:{}", self.host, self.port).parse()?)
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Checkout orchestrator
    pub checkout: Arc<CheckoutService>,
    /// Webhook reconciler
    pub reconciler: Arc<WebhookReconciler>,
    /// Order repository (read path for the orders listing)
    pub orders: Arc<dyn OrderRepository>,
    /// Application config
    pub config: AppConfig,
}

impl AppState {
    /// Create production state: env-configured gateways, TOML-seeded
    /// restaurant directory, in-memory order store.
    pub fn new() -> anyhow::Result<Self> {
        let config = AppConfig::from_env();
        let directory = Arc::new(load_restaurant_directory()?);
        let repository: Arc<dyn OrderRepository> = Arc::new(InMemoryOrderRepository::new());

        let stripe = StripeGateway::from_env()
            .map_err(|e| anyhow::anyhow!("failed to initialize Stripe: {}", e))?;
        let paymee = PaymeeGateway::from_env()
            .map_err(|e| anyhow::anyhow!("failed to initialize Paymee: {}", e))?;

        let gateways = GatewaySelector::new()
            .with_gateway(Arc::new(stripe))
            .with_gateway(Arc::new(paymee));

        Ok(Self::with_parts(directory, repository, gateways, config))
    }

    /// Wire state from explicit parts (tests pass fakes here)
    pub fn with_parts(
        directory: Arc<RestaurantDirectory>,
        repository: Arc<dyn OrderRepository>,
        gateways: GatewaySelector,
        config: AppConfig,
    ) -> Self {
        let checkout = Arc::new(CheckoutService::new(
            directory,
            repository.clone(),
            gateways.clone(),
        ));
        let reconciler = Arc::new(WebhookReconciler::new(repository.clone(), gateways));

        Self {
            checkout,
            reconciler,
            orders: repository,
            config,
        }
    }
}

/// Load the restaurant directory from config
fn load_restaurant_directory() -> anyhow::Result<RestaurantDirectory> {
    let config_paths = [
        "config/restaurants.toml",
        "../config/restaurants.toml",
        "../../config/restaurants.toml",
    ];

    for path in config_paths {
        if let Ok(content) = std::fs::read_to_string(path) {
            let directory = RestaurantDirectory::from_toml(&content)
                .map_err(|e| anyhow::anyhow!("failed to parse {}: {}", path, e))?;
            tracing::info!(
                "loaded {} restaurants from {}",
                directory.restaurants.len(),
                path
            );
            return Ok(directory);
        }
    }

    tracing::warn!("no restaurant directory found, using empty directory");
    Ok(RestaurantDirectory::new())
}
