//! Catalog Product Model
//!
//! Pushed by the inventory collaborator; orders snapshot from it at add time.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Product size with its own price
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProductSize {
    pub id: String,
    pub name: String,
    pub price: Decimal,
}

/// Addon that can be attached to a product line
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProductAddon {
    pub id: String,
    pub name: String,
    pub price: Decimal,
}

/// Catalog product entity
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CatalogProduct {
    pub id: String,
    pub restaurant_id: String,
    pub name: String,
    /// Base price, used when no size is chosen
    pub price: Decimal,
    /// Tax rate in percentage (e.g., 10 = 10%)
    #[serde(default)]
    pub tax_rate: Decimal,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub sizes: Vec<ProductSize>,
    #[serde(default)]
    pub addons: Vec<ProductAddon>,
}

fn default_true() -> bool {
    true
}

impl CatalogProduct {
    pub fn find_size(&self, size_id: &str) -> Option<&ProductSize> {
        self.sizes.iter().find(|s| s.id == size_id)
    }

    pub fn find_addon(&self, addon_id: &str) -> Option<&ProductAddon> {
        self.addons.iter().find(|a| a.id == addon_id)
    }
}

/// Upsert payload (id and restaurant come from the path and token)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogProductUpsert {
    pub name: String,
    pub price: Decimal,
    #[serde(default)]
    pub tax_rate: Decimal,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub sizes: Vec<ProductSize>,
    #[serde(default)]
    pub addons: Vec<ProductAddon>,
}

impl CatalogProductUpsert {
    pub fn into_product(self, id: String, restaurant_id: String) -> CatalogProduct {
        CatalogProduct {
            id,
            restaurant_id,
            name: self.name,
            price: self.price,
            tax_rate: self.tax_rate,
            is_active: self.is_active,
            sizes: self.sizes,
            addons: self.addons,
        }
    }
}
