//! Per-namespace catalog record and raw key derivation.
//!
//! The catalog is best-effort metadata: `known_keys` mirrors which entries
//! some handle last saw, while the entries themselves are authoritative for
//! value presence.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Namespace used whenever the caller supplies an empty name.
pub const DEFAULT_NAMESPACE: &str = "default_llama_store";

/// Map an empty namespace name to [`DEFAULT_NAMESPACE`].
pub fn normalize_namespace(name: &str) -> &str {
    if name.is_empty() { DEFAULT_NAMESPACE } else { name }
}

/// Raw substrate key holding the catalog of `namespace`.
pub fn catalog_key(namespace: &str) -> String {
    format!("{namespace}_config")
}

/// Raw substrate key holding the entry `key` of `namespace`.
pub fn entry_key(namespace: &str, key: &str) -> String {
    format!("{namespace}__{key}")
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Catalog {
    #[serde(rename = "storeName")]
    pub namespace_name: String,
    #[serde(rename = "keysAvailable", with = "key_set", default)]
    pub known_keys: BTreeSet<String>,
    #[serde(rename = "meta")]
    pub history: History,
}

/// Informational timestamps, epoch milliseconds as decimal strings.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct History {
    #[serde(default)]
    pub created_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_accessed: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<String>,
}

impl Catalog {
    /// Fresh catalog with no keys, created at `created_at`.
    pub fn new(namespace_name: &str, created_at: String) -> Self {
        Self {
            namespace_name: namespace_name.to_string(),
            known_keys: BTreeSet::new(),
            history: History { created_at, ..History::default() },
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    pub fn touch_accessed(&mut self, now: String) { self.history.last_accessed = Some(now); }

    pub fn touch_updated(&mut self, now: String) { self.history.last_updated = Some(now); }
}

/// `known_keys` is stored as a JSON array; duplicates collapse on decode.
mod key_set {
    use std::collections::BTreeSet;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(keys: &BTreeSet<String>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(keys.iter())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<BTreeSet<String>, D::Error> {
        let keys: Vec<String> = Vec::deserialize(deserializer)?;
        Ok(keys.into_iter().collect())
    }
}
