//! Typed, namespaced key-value persistence over a string-only storage substrate.
//!
//! - [`NamespacedStore`] gives typed `get`/`set`/`delete` over one namespace.
//! - Values are stored as JSON text under `"<namespace>__<key>"`.
//! - Each namespace keeps a [`Catalog`] under `"<namespace>_config"` listing
//!   known keys and access/update timestamps; it is re-persisted by every
//!   operation and restored when another handle opens the same namespace.
//! - Substrates ([`KeyValueSubstrate`]) are injected and shared via `Arc`.

pub mod catalog;
pub mod errors;
pub mod field;
pub mod hooks;
pub mod namespaced;
pub mod substrate;

pub use catalog::{Catalog, History, DEFAULT_NAMESPACE};
pub use errors::{StoreError, StoreResult};
pub use field::{Field, Untyped};
pub use hooks::StoreOptions;
pub use namespaced::NamespacedStore;
pub use substrate::{JsonFileSubstrate, KeyValueSubstrate, MemorySubstrate, SubstrateError};
