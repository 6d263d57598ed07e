//! Local key-value storage (the browser `localStorage` analogue).
//!
//! Values are opaque strings; callers own their encoding.

pub mod file;
pub mod memory;

pub use file::JsonFileStore;
pub use memory::MemoryStore;

use crate::error::AppError;

/// Storage key names as constants.
pub mod keys {
    /// JSON array of favorite meal ids
    pub const FAVORITES: &str = "mealFavorites";
}

/// Synchronous string key-value store.
///
/// `set` and `remove` must be durable before they return.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str) -> Result<(), AppError>;
    fn remove(&self, key: &str) -> Result<(), AppError>;
}
