//! Persistence backends for the garden slot.
//!
//! The garden keeps everything under one key, so a backend only has to read,
//! replace and clear a single string value. [`MemorySlot`] is the in-process
//! fake; [`LmdbSlot`] keeps the slot in an LMDB environment on disk.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use lmdb::{Database, DatabaseFlags, Environment, Transaction, WriteFlags};
use log::{debug, info, warn};

use crate::app_response::AppResponse;

pub trait SlotStorage {
    /// Returns `Ok(None)` when nothing has been saved under `key`.
    fn read(&self, key: &str) -> Result<Option<String>, AppResponse>;

    /// Replaces the whole value under `key`.
    fn write(&mut self, key: &str, value: &str) -> Result<(), AppResponse>;

    fn clear(&mut self, key: &str) -> Result<(), AppResponse>;
}

impl<S: SlotStorage + ?Sized> SlotStorage for Box<S> {
    fn read(&self, key: &str) -> Result<Option<String>, AppResponse> {
        (**self).read(key)
    }

    fn write(&mut self, key: &str, value: &str) -> Result<(), AppResponse> {
        (**self).write(key, value)
    }

    fn clear(&mut self, key: &str) -> Result<(), AppResponse> {
        (**self).clear(key)
    }
}

/// In-memory slot map. Clones share the same map, which lets a test keep a
/// handle to the storage after moving a clone into a store.
#[derive(Debug, Clone, Default)]
pub struct MemorySlot {
    slots: Rc<RefCell<HashMap<String, String>>>,
    writes: Rc<RefCell<usize>>,
}

impl MemorySlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_value(key: &str, value: &str) -> Self {
        let slot = Self::default();
        slot.slots.borrow_mut().insert(key.to_string(), value.to_string());
        slot
    }

    pub fn raw(&self, key: &str) -> Option<String> {
        self.slots.borrow().get(key).cloned()
    }

    /// Number of successful writes, for asserting write-through behaviour.
    pub fn write_count(&self) -> usize {
        *self.writes.borrow()
    }
}

impl SlotStorage for MemorySlot {
    fn read(&self, key: &str) -> Result<Option<String>, AppResponse> {
        Ok(self.raw(key))
    }

    fn write(&mut self, key: &str, value: &str) -> Result<(), AppResponse> {
        self.slots.borrow_mut().insert(key.to_string(), value.to_string());
        *self.writes.borrow_mut() += 1;
        Ok(())
    }

    fn clear(&mut self, key: &str) -> Result<(), AppResponse> {
        self.slots.borrow_mut().remove(key);
        Ok(())
    }
}

const MAP_SIZE: usize = 64 * 1024 * 1024;

/// Slot kept in an LMDB environment at `<name>.lmdb`.
pub struct LmdbSlot {
    env: Option<Environment>,
    db: Database,
    path: PathBuf,
}

impl LmdbSlot {
    pub fn open(name: &str) -> Result<Self, AppResponse> {
        if name.trim().is_empty() {
            return Err(AppResponse::BadRequest("Garden name cannot be empty".to_string()));
        }

        let path = PathBuf::from(format!("{name}.lmdb"));
        fs::create_dir_all(&path).map_err(|e| {
            AppResponse::DatabaseError(format!("Cannot create {}: {e}", path.display()))
        })?;

        let env = Environment::new()
            .set_max_dbs(1)
            .set_map_size(MAP_SIZE)
            .open(&path)?;
        let db = env.create_db(Some("garden"), DatabaseFlags::empty())?;

        info!("Opened garden slot storage at {}", path.display());
        Ok(Self { env: Some(env), db, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn env(&self) -> Result<&Environment, AppResponse> {
        self.env
            .as_ref()
            .ok_or_else(|| AppResponse::DatabaseError("Garden storage is closed".to_string()))
    }

    /// Drops the environment. Later calls fail with `DatabaseError`.
    pub fn close(&mut self) -> Result<(), AppResponse> {
        if let Some(env) = self.env.take() {
            env.sync(true)?;
            info!("Closed garden slot storage at {}", self.path.display());
        }
        Ok(())
    }
}

impl SlotStorage for LmdbSlot {
    fn read(&self, key: &str) -> Result<Option<String>, AppResponse> {
        let env = self.env()?;
        let txn = env.begin_ro_txn()?;
        let value = match txn.get(self.db, &key) {
            Ok(bytes) => Some(String::from_utf8(bytes.to_vec()).map_err(|e| {
                AppResponse::SerializationError(format!("Slot '{key}' is not UTF-8: {e}"))
            })?),
            Err(lmdb::Error::NotFound) => None,
            Err(e) => return Err(e.into()),
        };
        txn.abort();
        Ok(value)
    }

    fn write(&mut self, key: &str, value: &str) -> Result<(), AppResponse> {
        let env = self.env()?;
        let mut txn = env.begin_rw_txn()?;
        txn.put(self.db, &key, &value, WriteFlags::empty())?;
        txn.commit()?;
        debug!("Wrote {} bytes to slot '{}'", value.len(), key);
        Ok(())
    }

    fn clear(&mut self, key: &str) -> Result<(), AppResponse> {
        let env = self.env()?;
        let mut txn = env.begin_rw_txn()?;
        match txn.del(self.db, &key, None) {
            Ok(()) | Err(lmdb::Error::NotFound) => {}
            Err(e) => {
                warn!("Failed to clear slot '{}': {:?}", key, e);
                return Err(e.into());
            }
        }
        txn.commit()?;
        Ok(())
    }
}

impl Drop for LmdbSlot {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            warn!("Error closing garden storage: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_slot_roundtrip_and_clear() {
        let mut slot = MemorySlot::new();
        assert_eq!(slot.read("k").unwrap(), None);

        slot.write("k", "[]").unwrap();
        assert_eq!(slot.read("k").unwrap().as_deref(), Some("[]"));
        assert_eq!(slot.write_count(), 1);

        slot.clear("k").unwrap();
        assert_eq!(slot.read("k").unwrap(), None);
    }

    #[test]
    fn test_memory_slot_clones_share_state() {
        let observer = MemorySlot::new();
        let mut writer = observer.clone();
        writer.write("garden", "[1]").unwrap();
        assert_eq!(observer.raw("garden").as_deref(), Some("[1]"));
        assert_eq!(observer.write_count(), 1);
    }

    #[test]
    fn test_boxed_slot_delegates() {
        let observer = MemorySlot::new();
        let mut boxed: Box<dyn SlotStorage> = Box::new(observer.clone());
        boxed.write("a", "b").unwrap();
        assert_eq!(boxed.read("a").unwrap().as_deref(), Some("b"));
        assert_eq!(observer.raw("a").as_deref(), Some("b"));
    }
}
