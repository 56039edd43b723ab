//! In-memory storage backend, used by tests and embedders that don't want
//! anything on disk.

use std::collections::{BTreeMap, HashMap};

use parking_lot::{ReentrantMutex, RwLock};
use tracing::debug;

use crate::object::{Object, ObjectId};
use crate::storage::backend::{decode_stored, Storage};
use crate::storage::error::{StorageError, StorageResult};
use crate::storage::index::IndexEntries;
use crate::storage::refs::{BranchName, Head};

#[derive(Debug, Default)]
struct State {
    initialized: bool,
    /// encoded bytes, so reads go through the same validation as disk
    objects: HashMap<ObjectId, Vec<u8>>,
    refs: BTreeMap<BranchName, ObjectId>,
    head: Option<Head>,
    index: IndexEntries,
}

/// storage held entirely in memory
#[derive(Debug, Default)]
pub struct MemoryStorage {
    state: RwLock<State>,
    /// held by every ref/index write and for the whole of `atomically`
    txn: ReentrantMutex<()>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// number of stored objects
    pub fn object_count(&self) -> usize {
        self.state.read().objects.len()
    }
}

impl Storage for MemoryStorage {
    fn initialize(&self, default_branch: &BranchName) -> StorageResult<()> {
        let mut state = self.state.write();
        if state.initialized {
            return Err(StorageError::AlreadyInitialized("<memory>".into()));
        }
        state.initialized = true;
        state.head = Some(Head::Symbolic(default_branch.clone()));
        debug!(branch = %default_branch, "memory storage initialized");
        Ok(())
    }

    fn is_initialized(&self) -> StorageResult<bool> {
        Ok(self.state.read().initialized)
    }

    fn store_object(&self, object: &Object) -> StorageResult<ObjectId> {
        let encoded = object.encode();
        let id = ObjectId::hash_encoded(&encoded);
        self.state.write().objects.entry(id).or_insert(encoded);
        Ok(id)
    }

    fn get_object(&self, id: ObjectId) -> StorageResult<Object> {
        let state = self.state.read();
        let raw = state.objects.get(&id).ok_or(StorageError::ObjectNotFound(id))?;
        decode_stored(id, raw)
    }

    fn has_object(&self, id: ObjectId) -> StorageResult<bool> {
        Ok(self.state.read().objects.contains_key(&id))
    }

    fn update_ref(&self, name: &BranchName, commit: ObjectId) -> StorageResult<()> {
        let _txn = self.txn.lock();
        self.state.write().refs.insert(name.clone(), commit);
        Ok(())
    }

    fn get_ref(&self, name: &BranchName) -> StorageResult<ObjectId> {
        self.state
            .read()
            .refs
            .get(name)
            .copied()
            .ok_or_else(|| StorageError::RefNotFound(name.to_string()))
    }

    fn list_refs(&self) -> StorageResult<BTreeMap<BranchName, ObjectId>> {
        Ok(self.state.read().refs.clone())
    }

    fn get_head(&self) -> StorageResult<Head> {
        self.state
            .read()
            .head
            .clone()
            .ok_or_else(|| StorageError::NotARepository("<memory>".into()))
    }

    fn set_head(&self, head: &Head) -> StorageResult<()> {
        let _txn = self.txn.lock();
        self.state.write().head = Some(head.clone());
        Ok(())
    }

    fn get_index_entries(&self) -> StorageResult<IndexEntries> {
        Ok(self.state.read().index.clone())
    }

    fn update_index(&self, path: &str, id: ObjectId) -> StorageResult<()> {
        let _txn = self.txn.lock();
        self.state.write().index.insert(path.to_string(), id);
        Ok(())
    }

    fn update_index_entries(&self, entries: &IndexEntries) -> StorageResult<()> {
        let _txn = self.txn.lock();
        self.state.write().index = entries.clone();
        Ok(())
    }

    fn remove_index_entry(&self, path: &str) -> StorageResult<Option<ObjectId>> {
        let _txn = self.txn.lock();
        Ok(self.state.write().index.remove(path))
    }

    fn clear_index(&self) -> StorageResult<()> {
        let _txn = self.txn.lock();
        self.state.write().index.clear();
        Ok(())
    }

    fn atomically<T, E, F>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&Self) -> Result<T, E>,
        E: From<StorageError>,
    {
        let _txn = self.txn.lock();
        f(self)
    }
}
