//! Persistent cache for entity progress.
//!
//! This crate provides a trait-based tagged cache interface with an in-memory
//! and a JSON-file implementation.

#![warn(missing_docs)]

pub mod trait_;
pub mod memory;
pub mod json_cache;

pub use trait_::{CacheBackend, CacheEntry, CacheError, Expire, Result};
pub use memory::MemoryCache;
pub use json_cache::JsonFileCache;
