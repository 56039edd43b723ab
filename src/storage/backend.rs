//! The storage capability the repository is written against.
//!
//! Implementations persist objects, refs, HEAD and the index and contain no
//! business logic. Every method takes `&self`; backends handle their own
//! interior mutability and serialize index/ref read-modify-write cycles.

use std::collections::BTreeMap;

use crate::object::{Blob, Commit, Object, ObjectId, ObjectKind, Tree};
use crate::storage::error::{StorageError, StorageResult};
use crate::storage::index::IndexEntries;
use crate::storage::refs::{BranchName, Head};

pub trait Storage {
    /// create the empty layout with HEAD pointing at `default_branch`
    fn initialize(&self, default_branch: &BranchName) -> StorageResult<()>;

    /// whether the metadata root exists
    fn is_initialized(&self) -> StorageResult<bool>;

    /// persist an object under its own hash; storing it twice is a no-op
    fn store_object(&self, object: &Object) -> StorageResult<ObjectId>;

    /// load and validate an object
    fn get_object(&self, id: ObjectId) -> StorageResult<Object>;

    fn has_object(&self, id: ObjectId) -> StorageResult<bool>;

    /// point a branch at a commit, creating the ref if needed
    fn update_ref(&self, name: &BranchName, commit: ObjectId) -> StorageResult<()>;

    /// the commit a branch points at; `RefNotFound` if the ref is absent
    fn get_ref(&self, name: &BranchName) -> StorageResult<ObjectId>;

    fn list_refs(&self) -> StorageResult<BTreeMap<BranchName, ObjectId>>;

    fn get_head(&self) -> StorageResult<Head>;

    fn set_head(&self, head: &Head) -> StorageResult<()>;

    /// staged entries; a missing index reads as empty
    fn get_index_entries(&self) -> StorageResult<IndexEntries>;

    /// upsert one entry
    fn update_index(&self, path: &str, id: ObjectId) -> StorageResult<()>;

    /// replace the whole index
    fn update_index_entries(&self, entries: &IndexEntries) -> StorageResult<()>;

    /// remove one entry, returning what it pointed at
    ///
    /// when the path is not staged nothing is written and `None` comes back
    fn remove_index_entry(&self, path: &str) -> StorageResult<Option<ObjectId>>;

    fn clear_index(&self) -> StorageResult<()>;

    /// run `f` with exclusive access to refs, HEAD and the index
    ///
    /// every ref/index write from other handles waits until `f` returns.
    /// `f` must do its work through the handle it is given; nested calls
    /// on that handle do not lock again.
    fn atomically<T, E, F>(&self, f: F) -> Result<T, E>
    where
        Self: Sized,
        F: FnOnce(&Self) -> Result<T, E>,
        E: From<StorageError>;

    // ==================== Provided ====================

    /// the commit HEAD resolves to, or `None` while the branch is unborn
    fn resolve_head(&self) -> StorageResult<Option<ObjectId>> {
        match self.get_head()? {
            Head::Symbolic(branch) => match self.get_ref(&branch) {
                Ok(id) => Ok(Some(id)),
                Err(StorageError::RefNotFound(_)) => Ok(None),
                Err(e) => Err(e),
            },
            Head::Detached(id) => Ok(Some(id)),
        }
    }

    /// the commit object HEAD resolves to, or `None` before the first commit
    fn get_head_commit(&self) -> StorageResult<Option<(ObjectId, Commit)>> {
        match self.resolve_head()? {
            Some(id) => Ok(Some((id, self.get_commit(id)?))),
            None => Ok(None),
        }
    }

    fn get_commit(&self, id: ObjectId) -> StorageResult<Commit> {
        match self.get_object(id)? {
            Object::Commit(commit) => Ok(commit),
            other => Err(unexpected(id, ObjectKind::Commit, &other)),
        }
    }

    fn get_tree(&self, id: ObjectId) -> StorageResult<Tree> {
        match self.get_object(id)? {
            Object::Tree(tree) => Ok(tree),
            other => Err(unexpected(id, ObjectKind::Tree, &other)),
        }
    }

    fn get_blob(&self, id: ObjectId) -> StorageResult<Blob> {
        match self.get_object(id)? {
            Object::Blob(blob) => Ok(blob),
            other => Err(unexpected(id, ObjectKind::Blob, &other)),
        }
    }
}

fn unexpected(id: ObjectId, expected: ObjectKind, found: &Object) -> StorageError {
    StorageError::UnexpectedObjectKind {
        id,
        expected,
        found: found.kind(),
    }
}

/// check raw stored bytes against the hash they were stored under
pub(crate) fn decode_stored(id: ObjectId, raw: &[u8]) -> StorageResult<Object> {
    let object = Object::decode(raw).map_err(|source| StorageError::CorruptObject { id, source })?;
    let actual = ObjectId::hash_encoded(raw);
    if actual != id {
        return Err(StorageError::HashMismatch { expected: id, actual });
    }
    Ok(object)
}
