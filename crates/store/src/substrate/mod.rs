//! Storage substrates.
//!
//! A substrate is the flat, string-only key-value surface every namespace
//! shares. It is synchronous and offers no locking, transactions or
//! compare-and-swap: concurrent handles get last-write-wins semantics.

pub mod file;
pub mod memory;
#[cfg(all(feature = "web", target_arch = "wasm32"))]
pub mod web;

use thiserror::Error;

pub use file::JsonFileSubstrate;
pub use memory::MemorySubstrate;
#[cfg(all(feature = "web", target_arch = "wasm32"))]
pub use web::WebStorageSubstrate;

#[derive(Debug, Error)]
pub enum SubstrateError {
    #[error("quota exceeded: {needed} bytes needed, limit is {limit}")]
    QuotaExceeded { needed: usize, limit: usize },
    #[error("io error: {0}")]
    Io(String),
    #[error("corrupt substrate data: {0}")]
    Corrupt(String),
    #[error("substrate unavailable: {0}")]
    Unavailable(String),
}

/// Synchronous string key-value storage shared by every store handle.
pub trait KeyValueSubstrate: Send + Sync {
    /// Raw text stored under `raw_key`, or `None` when nothing is stored.
    fn read(&self, raw_key: &str) -> Result<Option<String>, SubstrateError>;

    /// Unconditionally overwrite the text stored under `raw_key`.
    fn write(&self, raw_key: &str, value: &str) -> Result<(), SubstrateError>;

    /// Remove `raw_key`; absent keys are a no-op.
    fn remove(&self, raw_key: &str) -> Result<(), SubstrateError>;
}
