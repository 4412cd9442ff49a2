//! Optional lifecycle hooks.
//!
//! Hooks are observers: an `Err` or a panic raised by a hook is discarded
//! at the call site and never changes the outcome of the store operation.

use std::{
    any::Any,
    fmt,
    panic::{catch_unwind, AssertUnwindSafe},
};

use tracing::debug;

use crate::catalog::Catalog;

type CatalogHook = Box<dyn Fn(&Catalog) -> anyhow::Result<()> + Send + Sync>;
type KeyHook = Box<dyn Fn(&str) -> anyhow::Result<()> + Send + Sync>;
type SetHook = Box<dyn Fn(&str, &dyn Any) -> anyhow::Result<()> + Send + Sync>;

/// Lifecycle callbacks supplied at construction.
#[derive(Default)]
pub struct StoreOptions {
    on_initialize: Option<CatalogHook>,
    on_restore: Option<CatalogHook>,
    on_set: Option<SetHook>,
    on_get: Option<KeyHook>,
    on_delete: Option<KeyHook>,
}

impl StoreOptions {
    pub fn new() -> Self { Self::default() }

    /// Called once a fresh catalog has been created and persisted.
    pub fn on_initialize<F>(mut self, f: F) -> Self
    where
        F: Fn(&Catalog) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.on_initialize = Some(Box::new(f));
        self
    }

    /// Called once an existing catalog has been loaded.
    pub fn on_restore<F>(mut self, f: F) -> Self
    where
        F: Fn(&Catalog) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.on_restore = Some(Box::new(f));
        self
    }

    /// Called before a value is written; the value can be downcast to the field's type.
    pub fn on_set<F>(mut self, f: F) -> Self
    where
        F: Fn(&str, &dyn Any) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.on_set = Some(Box::new(f));
        self
    }

    pub fn on_get<F>(mut self, f: F) -> Self
    where
        F: Fn(&str) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.on_get = Some(Box::new(f));
        self
    }

    pub fn on_delete<F>(mut self, f: F) -> Self
    where
        F: Fn(&str) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.on_delete = Some(Box::new(f));
        self
    }

    pub(crate) fn fire_initialize(&self, catalog: &Catalog) {
        if let Some(hook) = &self.on_initialize {
            isolate("on_initialize", || hook(catalog));
        }
    }

    pub(crate) fn fire_restore(&self, catalog: &Catalog) {
        if let Some(hook) = &self.on_restore {
            isolate("on_restore", || hook(catalog));
        }
    }

    pub(crate) fn fire_set(&self, key: &str, value: &dyn Any) {
        if let Some(hook) = &self.on_set {
            isolate("on_set", || hook(key, value));
        }
    }

    pub(crate) fn fire_get(&self, key: &str) {
        if let Some(hook) = &self.on_get {
            isolate("on_get", || hook(key));
        }
    }

    pub(crate) fn fire_delete(&self, key: &str) {
        if let Some(hook) = &self.on_delete {
            isolate("on_delete", || hook(key));
        }
    }
}

impl fmt::Debug for StoreOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreOptions")
            .field("on_initialize", &self.on_initialize.is_some())
            .field("on_restore", &self.on_restore.is_some())
            .field("on_set", &self.on_set.is_some())
            .field("on_get", &self.on_get.is_some())
            .field("on_delete", &self.on_delete.is_some())
            .finish()
    }
}

fn isolate<F>(hook: &'static str, f: F)
where
    F: FnOnce() -> anyhow::Result<()>,
{
    match catch_unwind(AssertUnwindSafe(f)) {
        Ok(Ok(())) => {}
        Ok(Err(e)) => debug!(hook, error = %e, "lifecycle hook failed; ignored"),
        Err(_) => debug!(hook, "lifecycle hook panicked; ignored"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    };

    #[test]
    fn failing_and_panicking_hooks_are_contained() {
        let calls = Arc::new(AtomicUsize::new(0));
        let (c1, c2) = (calls.clone(), calls.clone());
        let options = StoreOptions::new()
            .on_get(move |_| {
                c1.fetch_add(1, Ordering::SeqCst);
                Err(anyhow::anyhow!("boom"))
            })
            .on_delete(move |_| {
                c2.fetch_add(1, Ordering::SeqCst);
                panic!("hook panic")
            });

        options.fire_get("a");
        options.fire_delete("a");
        // unset hooks are skipped
        options.fire_set("a", &1u32);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn set_hook_sees_typed_value() {
        let seen = Arc::new(AtomicUsize::new(0));
        let s = seen.clone();
        let options = StoreOptions::new().on_set(move |key, value| {
            assert_eq!(key, "age");
            if let Some(v) = value.downcast_ref::<u32>() {
                s.store(*v as usize, Ordering::SeqCst);
            }
            Ok(())
        });
        options.fire_set("age", &22u32);
        assert_eq!(seen.load(Ordering::SeqCst), 22);
        assert!(format!("{options:?}").contains("on_set: true"));
    }
}
