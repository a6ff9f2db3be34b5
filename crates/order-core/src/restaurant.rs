//! # Restaurant Directory
//!
//! Read-only view of restaurants and their menus, seeded from
//! `config/restaurants.toml`. Menus are owned by a separate subsystem and
//! may change between checkout requests; pricing must tolerate that.

use serde::{Deserialize, Serialize};

/// A menu item, read-only input to pricing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MenuItem {
    /// Unique item identifier within the restaurant
    pub id: String,

    /// Display name
    pub name: String,

    /// Unit price in minor currency units
    pub price: i64,
}

/// A restaurant, as seen by the checkout path
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Restaurant {
    /// Unique restaurant identifier
    pub id: String,

    /// Display name (carried into provider sessions)
    pub restaurant_name: String,

    /// Flat delivery price in minor currency units
    pub delivery_price: i64,

    /// Current menu; items may be edited or removed at any time
    #[serde(default)]
    pub menu_items: Vec<MenuItem>,
}

impl Restaurant {
    /// Find a menu item by id
    pub fn menu_item(&self, id: &str) -> Option<&MenuItem> {
        self.menu_items.iter().find(|item| item.id == id)
    }
}

/// Directory of restaurants (loaded from config)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RestaurantDirectory {
    pub restaurants: Vec<Restaurant>,
}

impl RestaurantDirectory {
    pub fn new() -> Self {
        Self {
            restaurants: Vec::new(),
        }
    }

    pub fn add(&mut self, restaurant: Restaurant) {
        self.restaurants.push(restaurant);
    }

    /// Find a restaurant by id
    pub fn find_by_id(&self, id: &str) -> Option<&Restaurant> {
        self.restaurants.iter().find(|r| r.id == id)
    }

    /// Load directory from a TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(toml_str)
    }
}
