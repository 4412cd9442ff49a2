use dashmap::DashMap;

use super::{KeyValueSubstrate, SubstrateError};

/// In-process substrate backed by a concurrent map.
///
/// With a quota set, writes whose total footprint (key plus value bytes
/// across all entries) would exceed the limit fail with
/// [`SubstrateError::QuotaExceeded`] and leave the map untouched.
#[derive(Debug, Default)]
pub struct MemorySubstrate {
    entries: DashMap<String, String>,
    quota_bytes: Option<usize>,
}

impl MemorySubstrate {
    pub fn new() -> Self { Self::default() }

    pub fn with_quota(quota_bytes: usize) -> Self {
        Self { entries: DashMap::new(), quota_bytes: Some(quota_bytes) }
    }

    pub fn len(&self) -> usize { self.entries.len() }

    pub fn is_empty(&self) -> bool { self.entries.is_empty() }

    /// Drop every entry, across all namespaces.
    pub fn clear(&self) { self.entries.clear() }

    /// All raw keys currently stored, sorted.
    pub fn raw_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.entries.iter().map(|e| e.key().clone()).collect();
        keys.sort();
        keys
    }

    fn used_bytes_excluding(&self, raw_key: &str) -> usize {
        self.entries
            .iter()
            .filter(|e| e.key() != raw_key)
            .map(|e| e.key().len() + e.value().len())
            .sum()
    }
}

impl KeyValueSubstrate for MemorySubstrate {
    fn read(&self, raw_key: &str) -> Result<Option<String>, SubstrateError> {
        Ok(self.entries.get(raw_key).map(|v| v.value().clone()))
    }

    fn write(&self, raw_key: &str, value: &str) -> Result<(), SubstrateError> {
        if let Some(limit) = self.quota_bytes {
            let needed = self.used_bytes_excluding(raw_key) + raw_key.len() + value.len();
            if needed > limit {
                return Err(SubstrateError::QuotaExceeded { needed, limit });
            }
        }
        self.entries.insert(raw_key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, raw_key: &str) -> Result<(), SubstrateError> {
        self.entries.remove(raw_key);
        Ok(())
    }
}
