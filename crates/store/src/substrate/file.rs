use std::{
    collections::BTreeMap,
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
    sync::RwLock,
};

use super::{KeyValueSubstrate, SubstrateError};

/// Substrate persisted as a single JSON object file.
///
/// The whole map is rewritten on every `write`/`remove`, so the file is
/// always a complete snapshot. Intended for small state where a database
/// is overkill.
#[derive(Debug)]
pub struct JsonFileSubstrate {
    inner: RwLock<BTreeMap<String, String>>,
    file_path: PathBuf,
}

impl JsonFileSubstrate {
    /// Open the substrate at `path`, creating the file with an empty map if missing.
    pub fn open<P: Into<PathBuf>>(path: P) -> Result<Self, SubstrateError> {
        let file_path = path.into();
        if let Some(parent) = file_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| SubstrateError::Io(e.to_string()))?;
            }
        }

        let map = match fs::read(&file_path) {
            Ok(bytes) if bytes.is_empty() => BTreeMap::new(),
            Ok(bytes) => serde_json::from_slice(&bytes)
                .map_err(|e| SubstrateError::Corrupt(format!("{}: {e}", file_path.display())))?,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                let empty = BTreeMap::new();
                Self::persist(&file_path, &empty)?;
                empty
            }
            Err(e) => return Err(SubstrateError::Io(e.to_string())),
        };

        Ok(Self { inner: RwLock::new(map), file_path })
    }

    pub fn path(&self) -> &Path { &self.file_path }

    /// Write the snapshot to a sibling temp file, then rename it over `path`
    /// so a crash never leaves a truncated file behind.
    fn persist(path: &Path, map: &BTreeMap<String, String>) -> Result<(), SubstrateError> {
        let data = serde_json::to_vec(map).map_err(|e| SubstrateError::Io(e.to_string()))?;
        let tmp = Self::temp_path(path);
        fs::write(&tmp, data).map_err(|e| SubstrateError::Io(e.to_string()))?;
        fs::rename(&tmp, path).map_err(|e| {
            let _ = fs::remove_file(&tmp);
            SubstrateError::Io(e.to_string())
        })
    }

    fn temp_path(path: &Path) -> PathBuf {
        let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
        name.push(".tmp");
        path.with_file_name(name)
    }

    /// Apply `f` to a copy of the map, persist it, then commit in memory.
    fn update<F>(&self, f: F) -> Result<(), SubstrateError>
    where
        F: FnOnce(&mut BTreeMap<String, String>),
    {
        let mut map = self.inner.write().map_err(|e| SubstrateError::Unavailable(e.to_string()))?;
        let mut next = map.clone();
        f(&mut next);
        Self::persist(&self.file_path, &next)?;
        *map = next;
        Ok(())
    }
}

impl KeyValueSubstrate for JsonFileSubstrate {
    fn read(&self, raw_key: &str) -> Result<Option<String>, SubstrateError> {
        let map = self.inner.read().map_err(|e| SubstrateError::Unavailable(e.to_string()))?;
        Ok(map.get(raw_key).cloned())
    }

    fn write(&self, raw_key: &str, value: &str) -> Result<(), SubstrateError> {
        self.update(|m| {
            m.insert(raw_key.to_string(), value.to_string());
        })
    }

    fn remove(&self, raw_key: &str) -> Result<(), SubstrateError> {
        self.update(|m| {
            m.remove(raw_key);
        })
    }
}
