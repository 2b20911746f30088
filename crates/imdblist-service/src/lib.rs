//! Core service for the IMDb list catalog addon.
//!
//! Turns a user-supplied IMDb list into Stremio catalogs: one upstream
//! fetch per `(list, sort order)` key, translated into normalized catalog
//! entries and held in an in-memory cache with a 24 hour freshness window.
//! Concurrent requests for the same key coalesce into a single fetch, and a
//! failing upstream degrades to an empty catalog instead of an error.

pub mod caching;
pub mod catalog;
pub mod config;
pub mod fetch;
pub mod logging;
pub mod manifest;
pub mod translate;
pub mod types;

pub use catalog::{AddonService, CatalogError, CatalogResponse};
