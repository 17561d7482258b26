use shared::order::KitchenFeed;
use shared::util::now_millis;

use crate::core::RestaurantScope;
use crate::orders::{OrderResult, OrderStore};

/// Stateless read model for kitchen displays
#[derive(Debug, Clone)]
pub struct KitchenFeedService {
    store: OrderStore,
    poll_interval_secs: u64,
}

impl KitchenFeedService {
    pub fn new(store: OrderStore, poll_interval_secs: u64) -> Self {
        Self {
            store,
            poll_interval_secs,
        }
    }

    /// Active orders of the restaurant, oldest first
    pub fn poll(&self, scope: &RestaurantScope) -> OrderResult<KitchenFeed> {
        let orders = self.store.list_active_for_kitchen(scope)?;
        tracing::debug!(restaurant_id = %scope, count = orders.len(), "Kitchen feed polled");
        Ok(KitchenFeed {
            restaurant_id: scope.as_str().to_string(),
            orders,
            generated_at: now_millis(),
            poll_interval_secs: self.poll_interval_secs,
        })
    }
}
