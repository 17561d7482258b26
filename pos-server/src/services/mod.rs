//! 服务层 - 服务器核心服务
//!
//! # 服务列表
//!
//! - [`CatalogService`] - 产品目录管理（含内存缓存）

pub mod catalog_service;

pub use catalog_service::{CatalogLookup, CatalogService};
