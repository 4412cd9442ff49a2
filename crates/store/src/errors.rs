use thiserror::Error;

use crate::substrate::SubstrateError;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("invalid key: {0}")]
    InvalidKey(String),
    #[error("cannot serialize value for key `{key}`: {source}")]
    Serialization {
        key: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("cannot parse stored value for key `{key}`: {source}")]
    Deserialization {
        key: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("catalog for namespace `{namespace}` is corrupt: {source}")]
    CorruptCatalog {
        namespace: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("substrate error: {0}")]
    Substrate(#[from] SubstrateError),
}

impl StoreError {
    pub fn invalid_key(reason: &str) -> Self { Self::InvalidKey(reason.to_string()) }

    /// Key the error refers to, when it concerns a single entry.
    pub fn key(&self) -> Option<&str> {
        match self {
            Self::Serialization { key, .. } | Self::Deserialization { key, .. } => Some(key),
            _ => None,
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;
