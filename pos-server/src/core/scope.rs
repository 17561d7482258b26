//! Restaurant scope - the tenant boundary

use std::fmt;

/// Restaurant every query and mutation is filtered by
///
/// Taken from the caller's token; never from the request body.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RestaurantScope(String);

impl RestaurantScope {
    pub fn new(restaurant_id: impl Into<String>) -> Self {
        Self(restaurant_id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether a record with this `restaurant_id` is visible in scope
    pub fn contains(&self, restaurant_id: &str) -> bool {
        self.0 == restaurant_id
    }
}

impl fmt::Display for RestaurantScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
