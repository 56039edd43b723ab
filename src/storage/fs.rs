//! Filesystem storage backend.
//!
//! Layout under the metadata root:
//!
//! ```text
//! <meta>/objects/<hash>           "<type> <len>\0<payload>"
//! <meta>/refs/heads/<branch>      commit hash, hex text
//! <meta>/HEAD                     "ref: refs/heads/<branch>" or a raw hash
//! <meta>/index                    JSON map of path -> blob hash
//! <meta>/lock                     advisory lock for index/ref updates
//! ```

use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::debug;
use walkdir::WalkDir;

use crate::object::{Object, ObjectId};
use crate::storage::backend::{decode_stored, Storage};
use crate::storage::error::{StorageError, StorageResult};
use crate::storage::index::{decode_index, encode_index, IndexEntries, EMPTY_INDEX};
use crate::storage::lock::{write_atomic, RepoLock};
use crate::storage::refs::{parse_ref, BranchName, Head};

pub const OBJECTS_DIR: &str = "objects";
pub const REFS_DIR: &str = "refs";
pub const HEADS_DIR: &str = "heads";
pub const HEAD_FILE: &str = "HEAD";
pub const INDEX_FILE: &str = "index";
pub const LOCK_FILE: &str = "lock";

/// storage rooted at a metadata directory on disk
#[derive(Debug)]
pub struct FileSystemStorage {
    meta: PathBuf,
    /// set on the view handed to `atomically`, whose caller already holds the lock
    locked: bool,
}

impl FileSystemStorage {
    /// storage for the metadata directory at `meta` (e.g. `<root>/.yag`)
    pub fn new(meta: impl Into<PathBuf>) -> Self {
        Self {
            meta: meta.into(),
            locked: false,
        }
    }

    /// the metadata root
    pub fn path(&self) -> &Path {
        &self.meta
    }

    fn object_path(&self, id: ObjectId) -> PathBuf {
        self.meta.join(OBJECTS_DIR).join(id.to_hex())
    }

    fn heads_dir(&self) -> PathBuf {
        self.meta.join(REFS_DIR).join(HEADS_DIR)
    }

    fn ref_path(&self, name: &BranchName) -> PathBuf {
        let mut path = self.heads_dir();
        for part in name.as_str().split('/') {
            path.push(part);
        }
        path
    }

    fn head_path(&self) -> PathBuf {
        self.meta.join(HEAD_FILE)
    }

    fn index_path(&self) -> PathBuf {
        self.meta.join(INDEX_FILE)
    }

    /// `None` when this handle already runs under the lock
    fn lock(&self) -> StorageResult<Option<RepoLock>> {
        if self.locked {
            return Ok(None);
        }
        Ok(Some(RepoLock::acquire(&self.meta.join(LOCK_FILE))?))
    }

    fn read_index_file(&self) -> StorageResult<IndexEntries> {
        match std::fs::read(self.index_path()) {
            Ok(bytes) => decode_index(&bytes),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(IndexEntries::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn write_index_file(&self, entries: &IndexEntries) -> StorageResult<()> {
        write_atomic(&self.index_path(), &encode_index(entries)?)?;
        debug!(entries = entries.len(), "index written");
        Ok(())
    }
}

impl Storage for FileSystemStorage {
    fn initialize(&self, default_branch: &BranchName) -> StorageResult<()> {
        if self.meta.exists() {
            return Err(StorageError::AlreadyInitialized(self.meta.clone()));
        }

        std::fs::create_dir_all(self.meta.join(OBJECTS_DIR))?;
        std::fs::create_dir_all(self.heads_dir())?;
        write_atomic(
            &self.head_path(),
            Head::Symbolic(default_branch.clone()).to_file_content().as_bytes(),
        )?;
        write_atomic(&self.index_path(), EMPTY_INDEX)?;

        debug!(meta = %self.meta.display(), branch = %default_branch, "storage initialized");
        Ok(())
    }

    fn is_initialized(&self) -> StorageResult<bool> {
        Ok(self.meta.is_dir())
    }

    fn store_object(&self, object: &Object) -> StorageResult<ObjectId> {
        let encoded = object.encode();
        let id = ObjectId::hash_encoded(&encoded);
        let path = self.object_path(id);

        if path.exists() {
            return Ok(id);
        }

        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        write_atomic(&path, &encoded)?;
        debug!(%id, kind = %object.kind(), bytes = encoded.len(), "object stored");
        Ok(id)
    }

    fn get_object(&self, id: ObjectId) -> StorageResult<Object> {
        let raw = match std::fs::read(self.object_path(id)) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Err(StorageError::ObjectNotFound(id)),
            Err(e) => return Err(e.into()),
        };
        decode_stored(id, &raw)
    }

    fn has_object(&self, id: ObjectId) -> StorageResult<bool> {
        match std::fs::metadata(self.object_path(id)) {
            Ok(meta) => Ok(meta.is_file()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn update_ref(&self, name: &BranchName, commit: ObjectId) -> StorageResult<()> {
        let _lock = self.lock()?;
        let path = self.ref_path(name);
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        write_atomic(&path, commit.to_hex().as_bytes())?;
        debug!(branch = %name, commit = %commit, "ref updated");
        Ok(())
    }

    fn get_ref(&self, name: &BranchName) -> StorageResult<ObjectId> {
        match std::fs::read_to_string(self.ref_path(name)) {
            Ok(content) => parse_ref(name, &content),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(StorageError::RefNotFound(name.to_string())),
            Err(e) => Err(e.into()),
        }
    }

    fn list_refs(&self) -> StorageResult<BTreeMap<BranchName, ObjectId>> {
        let heads = self.heads_dir();
        let mut refs = BTreeMap::new();
        if !heads.is_dir() {
            return Ok(refs);
        }

        for entry in WalkDir::new(&heads).min_depth(1) {
            let entry = entry.map_err(|e| StorageError::Io(e.into()))?;
            if !entry.file_type().is_file() {
                continue;
            }
            let relative = entry
                .path()
                .strip_prefix(&heads)
                .map_err(|_| StorageError::InvalidHead(entry.path().display().to_string()))?;
            let name = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect::<Vec<_>>()
                .join("/");

            let branch = BranchName::new(name)?;
            let content = std::fs::read_to_string(entry.path())?;
            let id = parse_ref(&branch, &content)?;
            refs.insert(branch, id);
        }

        Ok(refs)
    }

    fn get_head(&self) -> StorageResult<Head> {
        match std::fs::read_to_string(self.head_path()) {
            Ok(content) => Head::parse(&content),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(StorageError::NotARepository(self.meta.clone())),
            Err(e) => Err(e.into()),
        }
    }

    fn set_head(&self, head: &Head) -> StorageResult<()> {
        let _lock = self.lock()?;
        write_atomic(&self.head_path(), head.to_file_content().as_bytes())?;
        debug!(head = %head.to_file_content(), "HEAD updated");
        Ok(())
    }

    fn get_index_entries(&self) -> StorageResult<IndexEntries> {
        self.read_index_file()
    }

    fn update_index(&self, path: &str, id: ObjectId) -> StorageResult<()> {
        let _lock = self.lock()?;
        let mut entries = self.read_index_file()?;
        entries.insert(path.to_string(), id);
        self.write_index_file(&entries)
    }

    fn update_index_entries(&self, entries: &IndexEntries) -> StorageResult<()> {
        let _lock = self.lock()?;
        self.write_index_file(entries)
    }

    fn remove_index_entry(&self, path: &str) -> StorageResult<Option<ObjectId>> {
        let _lock = self.lock()?;
        let mut entries = self.read_index_file()?;
        let removed = entries.remove(path);
        if removed.is_some() {
            self.write_index_file(&entries)?;
        }
        Ok(removed)
    }

    fn clear_index(&self) -> StorageResult<()> {
        let _lock = self.lock()?;
        write_atomic(&self.index_path(), EMPTY_INDEX)?;
        debug!("index cleared");
        Ok(())
    }

    fn atomically<T, E, F>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&Self) -> Result<T, E>,
        E: From<StorageError>,
    {
        if self.locked {
            return f(self);
        }

        let _lock = self.lock()?;
        let view = Self {
            meta: self.meta.clone(),
            locked: true,
        };
        f(&view)
    }
}
