//! Kitchen display support
//!
//! Displays poll [`KitchenFeedService::poll`] at the advertised interval;
//! the server keeps no per-display state.

pub mod feed;

pub use feed::KitchenFeedService;
