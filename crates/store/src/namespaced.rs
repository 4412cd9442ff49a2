use std::{collections::BTreeSet, fmt, marker::PhantomData, sync::Arc};

use common::utils::clock::now_millis_string;
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, trace};

use crate::{
    catalog::{catalog_key, entry_key, normalize_namespace, Catalog},
    errors::{StoreError, StoreResult},
    field::Field,
    hooks::StoreOptions,
    substrate::KeyValueSubstrate,
};

/// Typed handle over one namespace of a shared substrate.
///
/// The catalog is loaded (or created) when the handle is opened and
/// re-persisted by every operation, including reads, which bump
/// `lastAccessed`. Handles never lock the substrate: two handles on the
/// same namespace that interleave mutations overwrite each other's catalog
/// and the last writer's `keysAvailable` wins, even though the other
/// handle's entries remain in the substrate.
pub struct NamespacedStore<S> {
    substrate: Arc<dyn KeyValueSubstrate>,
    catalog: Catalog,
    options: StoreOptions,
    restored: bool,
    _schema: PhantomData<fn() -> S>,
}

impl<S> NamespacedStore<S> {
    /// Open `name` without lifecycle hooks. An empty name selects
    /// [`DEFAULT_NAMESPACE`](crate::catalog::DEFAULT_NAMESPACE).
    pub fn open(substrate: Arc<dyn KeyValueSubstrate>, name: &str) -> StoreResult<Self> {
        Self::open_with(substrate, name, StoreOptions::default())
    }

    /// Open `name`, restoring its catalog if one is persisted and creating
    /// it otherwise. Exactly one of `on_restore`/`on_initialize` fires.
    pub fn open_with(
        substrate: Arc<dyn KeyValueSubstrate>,
        name: &str,
        options: StoreOptions,
    ) -> StoreResult<Self> {
        let name = normalize_namespace(name);
        let existing = substrate.read(&catalog_key(name))?.filter(|raw| !raw.is_empty());

        match existing {
            Some(raw) => {
                let mut catalog = Catalog::from_json(&raw).map_err(|source| StoreError::CorruptCatalog {
                    namespace: name.to_string(),
                    source,
                })?;
                catalog.namespace_name = name.to_string();
                debug!(namespace = name, keys = catalog.known_keys.len(), "catalog restored");
                let store = Self::from_parts(substrate, catalog, options, true);
                store.options.fire_restore(&store.catalog);
                Ok(store)
            }
            None => {
                let catalog = Catalog::new(name, now_millis_string());
                let store = Self::from_parts(substrate, catalog, options, false);
                store.save()?;
                debug!(namespace = name, "catalog initialized");
                store.options.fire_initialize(&store.catalog);
                Ok(store)
            }
        }
    }

    fn from_parts(
        substrate: Arc<dyn KeyValueSubstrate>,
        catalog: Catalog,
        options: StoreOptions,
        restored: bool,
    ) -> Self {
        Self { substrate, catalog, options, restored, _schema: PhantomData }
    }

    pub fn namespace_name(&self) -> &str { &self.catalog.namespace_name }

    /// Whether the catalog was found in the substrate when the handle was opened.
    pub fn restored(&self) -> bool { self.restored }

    /// In-memory catalog; reading it does not touch `lastAccessed`.
    pub fn catalog(&self) -> &Catalog { &self.catalog }

    /// Keys this handle believes are persisted. Bumps `lastAccessed`.
    pub fn known_keys(&mut self) -> StoreResult<&BTreeSet<String>> {
        self.catalog.touch_accessed(now_millis_string());
        self.save()?;
        Ok(&self.catalog.known_keys)
    }

    /// Read `field`. Absent or empty entries yield `Ok(None)`; text that
    /// does not parse as `V` is a [`StoreError::Deserialization`].
    pub fn get<V>(&mut self, field: &Field<S, V>) -> StoreResult<Option<V>>
    where
        V: DeserializeOwned,
    {
        let key = field.name();
        self.options.fire_get(key);
        self.catalog.touch_accessed(now_millis_string());
        self.save()?;

        let raw = match self.substrate.read(&entry_key(self.namespace_name(), key))? {
            Some(raw) if !raw.is_empty() => raw,
            _ => return Ok(None),
        };
        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|source| StoreError::Deserialization { key: key.to_string(), source })
    }

    /// Write `value` under `field`. Fails without touching the entry or
    /// the key set when the key is empty or the value cannot be serialized.
    pub fn set<V>(&mut self, field: &Field<S, V>, value: &V) -> StoreResult<()>
    where
        V: Serialize + 'static,
    {
        let key = field.name();
        self.options.fire_set(key, value);
        self.catalog.touch_updated(now_millis_string());
        if key.is_empty() {
            return Err(StoreError::invalid_key("key must not be empty"));
        }

        let text = serde_json::to_string(value)
            .map_err(|source| StoreError::Serialization { key: key.to_string(), source })?;
        self.substrate.write(&entry_key(self.namespace_name(), key), &text)?;
        self.catalog.known_keys.insert(key.to_string());
        self.save()
    }

    /// Remove `field`. Deleting an absent key is a no-op.
    pub fn delete<V>(&mut self, field: &Field<S, V>) -> StoreResult<()> {
        let key = field.name();
        self.options.fire_delete(key);
        self.catalog.touch_updated(now_millis_string());
        self.substrate.remove(&entry_key(self.namespace_name(), key))?;
        self.catalog.known_keys.remove(key);
        self.save()
    }

    fn save(&self) -> StoreResult<()> {
        let raw_key = catalog_key(self.namespace_name());
        let text = self
            .catalog
            .to_json()
            .map_err(|source| StoreError::Serialization { key: raw_key.clone(), source })?;
        self.substrate.write(&raw_key, &text)?;
        trace!(namespace = self.namespace_name(), keys = self.catalog.known_keys.len(), "catalog persisted");
        Ok(())
    }
}

impl<S> fmt::Debug for NamespacedStore<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NamespacedStore")
            .field("catalog", &self.catalog)
            .field("options", &self.options)
            .field("restored", &self.restored)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::substrate::MemorySubstrate;
    use std::sync::Mutex;

    struct Profile;

    impl Profile {
        const AGE: Field<Profile, u32> = Field::new("age");
    }

    fn recorder() -> (Arc<Mutex<Vec<String>>>, StoreOptions) {
        let log = Arc::new(Mutex::new(Vec::new()));
        let (a, b, c, d, e) = (log.clone(), log.clone(), log.clone(), log.clone(), log.clone());
        let options = StoreOptions::new()
            .on_initialize(move |cat| {
                a.lock().unwrap().push(format!("init:{}", cat.namespace_name));
                Ok(())
            })
            .on_restore(move |cat| {
                b.lock().unwrap().push(format!("restore:{}", cat.known_keys.len()));
                Ok(())
            })
            .on_set(move |k, _| {
                c.lock().unwrap().push(format!("set:{k}"));
                Ok(())
            })
            .on_get(move |k| {
                d.lock().unwrap().push(format!("get:{k}"));
                Ok(())
            })
            .on_delete(move |k| {
                e.lock().unwrap().push(format!("delete:{k}"));
                Ok(())
            });
        (log, options)
    }

    #[test]
    fn exactly_one_construction_hook_fires() -> Result<(), anyhow::Error> {
        let substrate: Arc<dyn KeyValueSubstrate> = Arc::new(MemorySubstrate::new());

        let (log, options) = recorder();
        let mut first = NamespacedStore::<Profile>::open_with(substrate.clone(), "s", options)?;
        assert!(!first.restored());
        first.set(&Profile::AGE, &22)?;
        first.get(&Profile::AGE)?;
        first.delete(&Profile::AGE)?;
        first.set(&Profile::AGE, &23)?;
        assert_eq!(
            *log.lock().unwrap(),
            vec!["init:s", "set:age", "get:age", "delete:age", "set:age"]
        );

        let (log, options) = recorder();
        let second = NamespacedStore::<Profile>::open_with(substrate, "s", options)?;
        assert!(second.restored());
        assert_eq!(*log.lock().unwrap(), vec!["restore:1"]);
        Ok(())
    }

    #[test]
    fn construction_hook_sees_persisted_catalog() -> Result<(), anyhow::Error> {
        let memory = Arc::new(MemorySubstrate::new());
        let substrate: Arc<dyn KeyValueSubstrate> = memory.clone();
        let probe = memory.clone();
        let seen = Arc::new(Mutex::new(None));
        let seen_in_hook = seen.clone();
        let options = StoreOptions::new().on_initialize(move |_| {
            *seen_in_hook.lock().unwrap() = Some(probe.read("s_config")?.is_some());
            Ok(())
        });
        NamespacedStore::<Profile>::open_with(substrate, "s", options)?;
        assert_eq!(*seen.lock().unwrap(), Some(true));
        Ok(())
    }

    #[test]
    fn reads_bump_last_accessed_and_writes_bump_last_updated() -> Result<(), anyhow::Error> {
        let memory = Arc::new(MemorySubstrate::new());
        let mut store = NamespacedStore::<Profile>::open(memory.clone(), "s")?;
        assert!(store.catalog().history.last_accessed.is_none());
        assert!(store.catalog().history.last_updated.is_none());

        store.get(&Profile::AGE)?;
        assert!(store.catalog().history.last_accessed.is_some());
        assert!(store.catalog().history.last_updated.is_none());

        store.set(&Profile::AGE, &1)?;
        let persisted = Catalog::from_json(&memory.read("s_config")?.unwrap_or_default())?;
        assert_eq!(persisted.history, store.catalog().history);
        assert!(persisted.history.last_updated.is_some());
        Ok(())
    }

    #[test]
    fn corrupt_catalog_is_reported() -> Result<(), anyhow::Error> {
        let memory = Arc::new(MemorySubstrate::new());
        memory.write("s_config", "{broken")?;
        let err = NamespacedStore::<Profile>::open(memory, "s").unwrap_err();
        assert!(matches!(err, StoreError::CorruptCatalog { ref namespace, .. } if namespace == "s"));
        Ok(())
    }

    #[test]
    fn empty_catalog_text_takes_initialize_path() -> Result<(), anyhow::Error> {
        let memory = Arc::new(MemorySubstrate::new());
        memory.write("s_config", "")?;
        let store = NamespacedStore::<Profile>::open(memory.clone(), "s")?;
        assert!(!store.restored());
        assert!(!memory.read("s_config")?.unwrap_or_default().is_empty());
        Ok(())
    }
}
