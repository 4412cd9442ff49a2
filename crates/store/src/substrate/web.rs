use web_sys::Storage;

use super::{KeyValueSubstrate, SubstrateError};

/// Browser `localStorage` substrate.
///
/// Storage is looked up on every call, so the handle itself holds no JS
/// object.
#[derive(Debug, Default, Clone, Copy)]
pub struct WebStorageSubstrate;

impl WebStorageSubstrate {
    /// Bind to `window.localStorage`, failing early if it is unavailable.
    pub fn local() -> Result<Self, SubstrateError> {
        local_storage()?;
        Ok(Self)
    }
}

fn local_storage() -> Result<Storage, SubstrateError> {
    web_sys::window()
        .ok_or_else(|| SubstrateError::Unavailable("no window".into()))?
        .local_storage()
        .map_err(|e| SubstrateError::Unavailable(format!("{e:?}")))?
        .ok_or_else(|| SubstrateError::Unavailable("localStorage disabled".into()))
}

impl KeyValueSubstrate for WebStorageSubstrate {
    fn read(&self, raw_key: &str) -> Result<Option<String>, SubstrateError> {
        local_storage()?
            .get_item(raw_key)
            .map_err(|e| SubstrateError::Unavailable(format!("{e:?}")))
    }

    fn write(&self, raw_key: &str, value: &str) -> Result<(), SubstrateError> {
        // browsers report a full storage area as a DOMException on setItem
        local_storage()?
            .set_item(raw_key, value)
            .map_err(|e| SubstrateError::Io(format!("{e:?}")))
    }

    fn remove(&self, raw_key: &str) -> Result<(), SubstrateError> {
        local_storage()?
            .remove_item(raw_key)
            .map_err(|e| SubstrateError::Io(format!("{e:?}")))
    }
}
