//! # Dine-Cart RS
//!
//! Restaurant ordering backend with pluggable payment providers.
//!
//! ## Usage
//!
//! ```bash
//! # Set environment variables
//! export STRIPE_SECRET_KEY=sk_test_...
//! export STRIPE_WEBHOOK_SECRET=whsec_...
//! export PAYMEE_API_KEY=...
//! export FRONTEND_URL=http://localhost:5173
//!
//! # Run the server
//! dine-cart
//! ```

use order_api::{routes, state::AppState};
use tracing::{info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(Level::INFO.into())
                .from_env_lossy(),
        )
        .init();

    // Print banner
    print_banner();

    // Initialize application state
    let state = AppState::new()?;

    let addr = state.config.socket_addr()?;
    let is_prod = state.config.is_production();

    info!("Environment: {}", state.config.environment);
    info!(
        "Payment providers: {:?}",
        state.checkout.gateways().providers()
    );

    // Create router
    let app = routes::create_router(state);

    // Start server
    info!("🍽️  Dine-Cart starting on http://{}", addr);

    if !is_prod {
        info!("📝 Health: http://{}/health", addr);
        info!("🛒 Checkout: POST http://{}/api/v1/checkout", addr);
        info!("🔔 Stripe webhook: POST http://{}/webhook/stripe", addr);
        info!("🔔 Paymee webhook: POST http://{}/webhook/paymee", addr);
    }

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn print_banner() {
    println!(
        r#"
  🍽️  Dine-Cart RS 🍽️
  ━━━━━━━━━━━━━━━━━━━━━━━
  Restaurant ordering backend
  Version: {}

"#,
        env!("CARGO_PKG_VERSION")
    );
}
