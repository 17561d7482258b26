//! Catalog Service - product records pushed by inventory, with in-memory caching
//!
//! The redb table is the source of truth; the cache is rebuilt from it at
//! startup and updated after every successful write.

use parking_lot::RwLock;
use rust_decimal::Decimal;
use shared::models::{CatalogProduct, CatalogProductUpsert};
use std::collections::HashMap;
use std::sync::Arc;

use crate::core::RestaurantScope;
use crate::orders::{Entity, OrderError, OrderResult, OrderStore};

/// Maximum tax rate in percent
const MAX_TAX_RATE: i64 = 100;

/// Product lookup used when resolving order lines
pub trait CatalogLookup: Send + Sync {
    /// Product visible in `scope`, active or not
    fn product(&self, scope: &RestaurantScope, product_id: &str) -> Option<CatalogProduct>;
}

#[derive(Clone)]
pub struct CatalogService {
    store: OrderStore,
    /// Products cache: product_id -> CatalogProduct
    products: Arc<RwLock<HashMap<String, CatalogProduct>>>,
}

impl std::fmt::Debug for CatalogService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogService")
            .field("products", &self.products.read().len())
            .finish()
    }
}

impl CatalogService {
    pub fn new(store: OrderStore) -> Self {
        Self {
            store,
            products: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Load all persisted products into the cache
    pub fn warmup(&self) -> OrderResult<usize> {
        let products = self.store.load_products()?;
        let count = products.len();
        let mut cache = self.products.write();
        cache.clear();
        for product in products {
            cache.insert(product.id.clone(), product);
        }
        tracing::info!(count, "Catalog cache warmed up");
        Ok(count)
    }

    pub fn get_product(&self, scope: &RestaurantScope, id: &str) -> Option<CatalogProduct> {
        self.products
            .read()
            .get(id)
            .filter(|p| scope.contains(&p.restaurant_id))
            .cloned()
    }

    /// Products of a restaurant, by name
    pub fn list_products(&self, scope: &RestaurantScope) -> Vec<CatalogProduct> {
        let mut products: Vec<_> = self
            .products
            .read()
            .values()
            .filter(|p| scope.contains(&p.restaurant_id))
            .cloned()
            .collect();
        products.sort_by(|a, b| a.name.cmp(&b.name));
        products
    }

    /// Insert or replace a product
    ///
    /// A product id owned by another restaurant is reported as not found.
    pub fn upsert(
        &self,
        scope: &RestaurantScope,
        id: &str,
        data: CatalogProductUpsert,
    ) -> OrderResult<CatalogProduct> {
        validate_upsert(id, &data)?;
        if let Some(existing) = self.products.read().get(id)
            && !scope.contains(&existing.restaurant_id)
        {
            return Err(OrderError::NotFound(Entity::Product, id.to_string()));
        }

        let product = data.into_product(id.to_string(), scope.as_str().to_string());
        self.store.put_product(&product)?;
        self.products.write().insert(product.id.clone(), product.clone());

        tracing::info!(product_id = %id, restaurant_id = %scope, active = product.is_active, "Catalog product upserted");
        Ok(product)
    }

    /// Mark a product inactive; existing order lines keep their snapshot
    pub fn deactivate(&self, scope: &RestaurantScope, id: &str) -> OrderResult<CatalogProduct> {
        let mut product = self
            .get_product(scope, id)
            .ok_or_else(|| OrderError::NotFound(Entity::Product, id.to_string()))?;
        product.is_active = false;
        self.store.put_product(&product)?;
        self.products.write().insert(product.id.clone(), product.clone());

        tracing::info!(product_id = %id, restaurant_id = %scope, "Catalog product deactivated");
        Ok(product)
    }
}

impl CatalogLookup for CatalogService {
    fn product(&self, scope: &RestaurantScope, product_id: &str) -> Option<CatalogProduct> {
        self.get_product(scope, product_id)
    }
}

fn validate_upsert(id: &str, data: &CatalogProductUpsert) -> OrderResult<()> {
    if id.trim().is_empty() {
        return Err(OrderError::Validation("product id must not be empty".into()));
    }
    if data.name.trim().is_empty() {
        return Err(OrderError::Validation("product name must not be empty".into()));
    }
    let negative_price = data.price.is_sign_negative()
        || data.sizes.iter().any(|s| s.price.is_sign_negative())
        || data.addons.iter().any(|a| a.price.is_sign_negative());
    if negative_price {
        return Err(OrderError::Validation("prices must not be negative".into()));
    }
    if data.tax_rate.is_sign_negative() || data.tax_rate > Decimal::from(MAX_TAX_RATE) {
        return Err(OrderError::Validation(format!(
            "tax_rate must be between 0 and {}",
            MAX_TAX_RATE
        )));
    }
    Ok(())
}
