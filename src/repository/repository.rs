//! The repository orchestrator.
//!
//! Implements the user-facing verbs on top of a [`Storage`] backend and the
//! tree builder. The working directory root is always explicit; nothing here
//! looks at the process's current directory.

use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use chrono::{DateTime, Utc};
use tracing::{debug, info, instrument, warn};
use walkdir::WalkDir;

use crate::object::{build_tree_from_paths, Blob, Commit, Object, ObjectId, Tree};
use crate::repository::config::RepositoryConfig;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::identity::{Clock, Identity, SystemClock, SystemIdentity};
use crate::repository::status::{RepositoryStatus, StagedChange, UnstagedChange};
use crate::storage::{BranchName, FileSystemStorage, Head, IndexEntries, Storage, StorageError};

/// information about a commit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitInfo {
    pub id: ObjectId,
    pub tree: ObjectId,
    pub parent: Option<ObjectId>,
    pub message: String,
    pub author: String,
    pub timestamp: DateTime<Utc>,
}

impl CommitInfo {
    pub fn from_commit(id: ObjectId, commit: &Commit) -> Self {
        Self {
            id,
            tree: commit.tree(),
            parent: commit.parent(),
            message: commit.message().to_string(),
            author: commit.author().to_string(),
            timestamp: commit.timestamp(),
        }
    }

    /// first line of the message
    pub fn summary(&self) -> &str {
        self.message.lines().next().unwrap_or(&self.message)
    }

    /// check if this is the first commit of its history
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }
}

/// A repository: a working directory plus its object store.
pub struct Repository<S: Storage = FileSystemStorage> {
    config: RepositoryConfig,
    storage: S,
    identity: Box<dyn Identity>,
    clock: Box<dyn Clock>,
}

impl Repository<FileSystemStorage> {
    /// Initialize a new repository under `config.root`.
    #[instrument(skip(config), fields(root = %config.root.display()))]
    pub fn init(config: RepositoryConfig) -> RepositoryResult<Self> {
        std::fs::create_dir_all(&config.root)?;
        let storage = FileSystemStorage::new(config.meta_path());
        let repo = Self::with_storage(config, storage);
        repo.initialize()?;
        Ok(repo)
    }

    /// Open an existing repository.
    pub fn open(config: RepositoryConfig) -> RepositoryResult<Self> {
        let storage = FileSystemStorage::new(config.meta_path());
        if !storage.is_initialized()? {
            return Err(StorageError::NotARepository(config.meta_path()).into());
        }
        Ok(Self::with_storage(config, storage))
    }

    /// Open or initialize a repository.
    pub fn open_or_init(config: RepositoryConfig) -> RepositoryResult<Self> {
        if config.meta_path().is_dir() {
            Self::open(config)
        } else {
            Self::init(config)
        }
    }
}

impl<S: Storage> Repository<S> {
    /// wrap an existing backend; call [`Repository::initialize`] if it is fresh
    pub fn with_storage(config: RepositoryConfig, storage: S) -> Self {
        Self {
            config,
            storage,
            identity: Box::new(SystemIdentity),
            clock: Box::new(SystemClock),
        }
    }

    /// Set the identity used for commit authors.
    pub fn with_identity(mut self, identity: impl Identity + 'static) -> Self {
        self.identity = Box::new(identity);
        self
    }

    /// Set the clock used for commit timestamps.
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    /// create the metadata layout with HEAD on the default branch
    pub fn initialize(&self) -> RepositoryResult<()> {
        let branch = branch_name(&self.config.default_branch)?;
        self.storage.initialize(&branch)?;
        info!(branch = %branch, "repository initialized");
        Ok(())
    }

    pub fn config(&self) -> &RepositoryConfig {
        &self.config
    }

    pub fn root(&self) -> &Path {
        &self.config.root
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    // ==================== Staging ====================

    /// Stage a file, or every file beneath a directory.
    ///
    /// Relative paths are resolved against the repository root. Returns the
    /// index keys that were written, in path order.
    pub fn add(&self, path: impl AsRef<Path>) -> RepositoryResult<Vec<String>> {
        self.add_path(path.as_ref())
    }

    #[instrument(skip(self, path), fields(path = %path.display()))]
    fn add_path(&self, path: &Path) -> RepositoryResult<Vec<String>> {
        let rel = self.relative_path(path)?;
        if self.is_meta(&rel) {
            warn!("refusing to stage repository metadata");
            return Ok(Vec::new());
        }

        let abs = self.config.root.join(&rel);
        let metadata = match std::fs::symlink_metadata(&abs) {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(RepositoryError::PathspecNotFound(path.display().to_string()));
            }
            Err(e) => return Err(e.into()),
        };

        if metadata.is_dir() {
            let mut added = Vec::new();
            for (key, file) in self.walk_files(&abs)? {
                self.stage_file(&key, &file)?;
                added.push(key);
            }
            info!(files = added.len(), "directory staged");
            Ok(added)
        } else if metadata.is_file() {
            let key = index_key(&rel).ok_or_else(|| RepositoryError::NonUtf8Path(abs.clone()))?;
            self.stage_file(&key, &abs)?;
            Ok(vec![key])
        } else {
            warn!("skipping entry that is not a regular file");
            Ok(Vec::new())
        }
    }

    fn stage_file(&self, key: &str, file: &Path) -> RepositoryResult<ObjectId> {
        let blob = Blob::from_file(file)?;
        let id = self.storage.store_object(&Object::Blob(blob))?;
        self.storage.update_index(key, id)?;
        debug!(path = key, blob = %id, "staged");
        Ok(id)
    }

    /// Remove one path from the index.
    ///
    /// The working copy is left alone. Fails with `PathspecNotFound` without
    /// touching the index when the path is not staged.
    pub fn unstage(&self, path: impl AsRef<Path>) -> RepositoryResult<ObjectId> {
        let path = path.as_ref();
        let key = index_key(&self.relative_path(path)?)
            .ok_or_else(|| RepositoryError::NonUtf8Path(path.to_path_buf()))?;
        match self.storage.remove_index_entry(&key)? {
            Some(id) => {
                debug!(path = %key, "unstaged");
                Ok(id)
            }
            None => Err(RepositoryError::PathspecNotFound(path.display().to_string())),
        }
    }

    /// current index entries
    pub fn staged(&self) -> RepositoryResult<IndexEntries> {
        Ok(self.storage.get_index_entries()?)
    }

    // ==================== History ====================

    /// Record the index as a new commit and advance HEAD.
    ///
    /// The commit's parent is whatever HEAD resolved to. On success the
    /// index is cleared. Reading the index, advancing the ref and clearing
    /// the index happen under one storage lock, so concurrent commits chain
    /// instead of overwriting each other and no staged entry is dropped.
    #[instrument(skip(self, message), fields(message_len = message.len()))]
    pub fn commit(&self, message: &str) -> RepositoryResult<ObjectId> {
        if message.trim().is_empty() {
            return Err(RepositoryError::EmptyMessage);
        }

        let author = match &self.config.author {
            Some(author) => author.clone(),
            None => self.identity.author(),
        };

        let (id, files) = self.storage.atomically(|storage| -> RepositoryResult<_> {
            let entries = storage.get_index_entries()?;
            if entries.is_empty() {
                return Err(RepositoryError::EmptyCommit);
            }

            let built = build_tree_from_paths(&entries)?;
            for tree in built.trees {
                storage.store_object(&Object::Tree(tree))?;
            }

            let head = storage.get_head()?;
            let parent = storage.resolve_head()?;
            let commit = Commit::new(built.root, parent, message, author, self.clock.now());
            let id = storage.store_object(&Object::Commit(commit))?;

            match &head {
                Head::Symbolic(branch) => storage.update_ref(branch, id)?,
                Head::Detached(_) => storage.set_head(&Head::Detached(id))?,
            }
            storage.clear_index()?;
            Ok((id, entries.len()))
        })?;

        info!(commit = %id, files, "commit created");
        Ok(id)
    }

    /// the commit HEAD resolves to, `None` before the first commit
    pub fn head(&self) -> RepositoryResult<Option<ObjectId>> {
        Ok(self.storage.resolve_head()?)
    }

    /// first-parent history from HEAD, newest first
    pub fn log(&self, limit: Option<usize>) -> RepositoryResult<Vec<CommitInfo>> {
        let mut history = Vec::new();
        let mut next = self.storage.resolve_head()?;

        while let Some(id) = next {
            if limit.is_some_and(|limit| history.len() >= limit) {
                break;
            }
            let commit = self.storage.get_commit(id)?;
            next = commit.parent();
            history.push(CommitInfo::from_commit(id, &commit));
        }

        Ok(history)
    }

    pub fn read_commit(&self, id: ObjectId) -> RepositoryResult<Commit> {
        Ok(self.storage.get_commit(id)?)
    }

    pub fn read_tree(&self, id: ObjectId) -> RepositoryResult<Tree> {
        Ok(self.storage.get_tree(id)?)
    }

    /// every file reachable from a tree, keyed by `/`-separated path
    pub fn tree_files(&self, tree: ObjectId) -> RepositoryResult<BTreeMap<String, ObjectId>> {
        let mut files = BTreeMap::new();
        let mut pending = vec![(String::new(), tree)];

        while let Some((prefix, id)) = pending.pop() {
            for entry in self.storage.get_tree(id)?.entries() {
                let path = if prefix.is_empty() {
                    entry.name.clone()
                } else {
                    format!("{}/{}", prefix, entry.name)
                };
                if entry.is_dir() {
                    pending.push((path, entry.hash));
                } else {
                    files.insert(path, entry.hash);
                }
            }
        }

        Ok(files)
    }

    fn head_files(&self) -> RepositoryResult<BTreeMap<String, ObjectId>> {
        match self.storage.get_head_commit()? {
            Some((_, commit)) => self.tree_files(commit.tree()),
            None => Ok(BTreeMap::new()),
        }
    }

    // ==================== Branches ====================

    /// Create a branch at the commit HEAD resolves to. HEAD does not move.
    #[instrument(skip(self))]
    pub fn create_branch(&self, name: &str) -> RepositoryResult<ObjectId> {
        let branch = branch_name(name)?;

        let head = self.storage.atomically(|storage| -> RepositoryResult<_> {
            let head = storage.resolve_head()?.ok_or(RepositoryError::NoCommitsYet)?;
            match storage.get_ref(&branch) {
                Ok(_) => return Err(RepositoryError::BranchAlreadyExists(name.to_string())),
                Err(StorageError::RefNotFound(_)) => {}
                Err(e) => return Err(e.into()),
            }
            storage.update_ref(&branch, head)?;
            Ok(head)
        })?;

        info!(branch = %branch, commit = %head, "branch created");
        Ok(head)
    }

    /// branches with at least one commit, sorted by name
    pub fn list_branches(&self) -> RepositoryResult<Vec<BranchName>> {
        Ok(self.storage.list_refs()?.into_keys().collect())
    }

    /// the branch HEAD follows, `None` when detached
    pub fn current_branch(&self) -> RepositoryResult<Option<BranchName>> {
        Ok(self.storage.get_head()?.branch().cloned())
    }

    /// Point HEAD at a branch.
    ///
    /// With `materialize_on_checkout` the branch's files are also written
    /// into the working directory; files not in the branch are left alone.
    /// A name that could never be a branch is reported as `UnknownBranch`.
    #[instrument(skip(self))]
    pub fn checkout(&self, name: &str) -> RepositoryResult<ObjectId> {
        let branch =
            BranchName::new(name).map_err(|_| RepositoryError::UnknownBranch(name.to_string()))?;
        let target = match self.storage.get_ref(&branch) {
            Ok(id) => id,
            Err(StorageError::RefNotFound(_)) => {
                return Err(RepositoryError::UnknownBranch(name.to_string()));
            }
            Err(e) => return Err(e.into()),
        };

        self.storage.set_head(&Head::Symbolic(branch.clone()))?;

        if self.config.materialize_on_checkout {
            let written = self.materialize(target)?;
            debug!(files = written, "working directory updated");
        }

        info!(branch = %branch, commit = %target, "checked out");
        Ok(target)
    }

    fn materialize(&self, commit: ObjectId) -> RepositoryResult<usize> {
        let files = self.tree_files(self.storage.get_commit(commit)?.tree())?;
        for (key, id) in &files {
            let blob = self.storage.get_blob(*id)?;
            let dest = key.split('/').fold(self.config.root.clone(), |path, part| path.join(part));
            if let Some(dir) = dest.parent() {
                std::fs::create_dir_all(dir)?;
            }
            std::fs::write(&dest, blob.content())?;
        }
        Ok(files.len())
    }

    // ==================== Status ====================

    /// Compare the working directory, the index and the HEAD tree.
    pub fn status(&self) -> RepositoryResult<RepositoryStatus> {
        let index = self.storage.get_index_entries()?;
        let head_files = self.head_files()?;
        let working = self.walk_files(&self.config.root)?;

        let mut status = RepositoryStatus::default();

        for (path, id) in &index {
            let change = match head_files.get(path) {
                None => StagedChange::New,
                Some(committed) if committed == id => StagedChange::Unchanged,
                Some(_) => StagedChange::Modified,
            };
            status.staged.push((path.clone(), change));
        }

        // the index wins over HEAD for the same path
        let mut tracked = head_files;
        tracked.extend(index.iter().map(|(path, id)| (path.clone(), *id)));

        for (path, file) in &working {
            match tracked.get(path) {
                None => status.untracked.push(path.clone()),
                Some(id) => {
                    if Blob::from_file(file)?.id() != *id {
                        status.unstaged.push((path.clone(), UnstagedChange::Modified));
                    }
                }
            }
        }

        for path in tracked.keys() {
            if !working.contains_key(path) {
                status.unstaged.push((path.clone(), UnstagedChange::Deleted));
            }
        }
        status.unstaged.sort();

        Ok(status)
    }

    // ==================== Paths ====================

    /// regular files under `start`, keyed by index path, metadata excluded
    fn walk_files(&self, start: &Path) -> RepositoryResult<BTreeMap<String, PathBuf>> {
        let root = &self.config.root;
        let mut files = BTreeMap::new();

        let walker = WalkDir::new(start)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| match entry.path().strip_prefix(root) {
                Ok(rel) => !self.is_meta(rel),
                Err(_) => true,
            });

        for entry in walker {
            let entry = entry?;
            let file_type = entry.file_type();
            if file_type.is_file() {
                let key = match entry.path().strip_prefix(root) {
                    Ok(rel) => index_key(rel),
                    Err(_) => return Err(RepositoryError::PathOutsideRepository(entry.path().to_path_buf())),
                };
                match key {
                    Some(key) => {
                        files.insert(key, entry.into_path());
                    }
                    None => warn!(path = %entry.path().display(), "skipping file with a non-UTF-8 name"),
                }
            } else if file_type.is_symlink() {
                warn!(path = %entry.path().display(), "skipping symlink");
            }
        }

        Ok(files)
    }

    fn is_meta(&self, rel: &Path) -> bool {
        match rel.components().next() {
            Some(Component::Normal(first)) => first == self.config.meta_dir.as_str(),
            _ => false,
        }
    }

    /// lexically normalize `path` to a path relative to the root
    fn relative_path(&self, path: &Path) -> RepositoryResult<PathBuf> {
        let outside = || RepositoryError::PathOutsideRepository(path.to_path_buf());

        let stripped = if path.is_absolute() {
            self.strip_root(path).ok_or_else(outside)?
        } else {
            path.to_path_buf()
        };

        let mut normal = PathBuf::new();
        for component in stripped.components() {
            match component {
                Component::CurDir => {}
                Component::Normal(part) => normal.push(part),
                Component::ParentDir => {
                    if !normal.pop() {
                        return Err(outside());
                    }
                }
                Component::RootDir | Component::Prefix(_) => return Err(outside()),
            }
        }

        Ok(normal)
    }

    fn strip_root(&self, path: &Path) -> Option<PathBuf> {
        if let Ok(rel) = path.strip_prefix(&self.config.root) {
            return Some(rel.to_path_buf());
        }
        let root = std::fs::canonicalize(&self.config.root).ok()?;
        if let Ok(rel) = path.strip_prefix(&root) {
            return Some(rel.to_path_buf());
        }
        let path = std::fs::canonicalize(path).ok()?;
        path.strip_prefix(&root).ok().map(Path::to_path_buf)
    }
}

/// `/`-joined form of a root-relative path, `None` if any part is not UTF-8
fn index_key(rel: &Path) -> Option<String> {
    let mut parts = Vec::new();
    for component in rel.components() {
        if let Component::Normal(part) = component {
            parts.push(part.to_str()?);
        }
    }
    Some(parts.join("/"))
}

fn branch_name(name: &str) -> RepositoryResult<BranchName> {
    BranchName::new(name).map_err(|source| RepositoryError::InvalidBranchName {
        name: name.to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::identity::{FixedClock, FixedIdentity};
    use crate::storage::MemoryStorage;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn fixed_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    fn setup() -> (TempDir, Repository) {
        let dir = TempDir::new().unwrap();
        let repo = Repository::init(RepositoryConfig::new(dir.path()))
            .unwrap()
            .with_identity(FixedIdentity::new("tester"))
            .with_clock(FixedClock(fixed_time()));
        (dir, repo)
    }

    fn write(dir: &TempDir, rel: &str, content: &str) {
        let path = dir.path().join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    fn commit_file(repo: &Repository, dir: &TempDir, rel: &str, content: &str, msg: &str) -> ObjectId {
        write(dir, rel, content);
        repo.add(rel).unwrap();
        repo.commit(msg).unwrap()
    }

    #[test]
    fn test_init_layout() {
        let (dir, repo) = setup();
        let head = std::fs::read_to_string(dir.path().join(".yag/HEAD")).unwrap();
        assert_eq!(head, "ref: refs/heads/master");
        assert_eq!(repo.current_branch().unwrap().unwrap().as_str(), "master");
        assert_eq!(repo.head().unwrap(), None);
        assert!(repo.list_branches().unwrap().is_empty());
    }

    #[test]
    fn test_init_twice_fails() {
        let (dir, _repo) = setup();
        let result = Repository::init(RepositoryConfig::new(dir.path()));
        assert!(matches!(
            result,
            Err(RepositoryError::Storage(StorageError::AlreadyInitialized(_)))
        ));
    }

    #[test]
    fn test_open_missing_repository() {
        let dir = TempDir::new().unwrap();
        let result = Repository::open(RepositoryConfig::new(dir.path()));
        assert!(matches!(
            result,
            Err(RepositoryError::Storage(StorageError::NotARepository(_)))
        ));
    }

    #[test]
    fn test_open_or_init() {
        let dir = TempDir::new().unwrap();
        let first = Repository::open_or_init(RepositoryConfig::new(dir.path())).unwrap();
        write(&dir, "a.txt", "a");
        first.add("a.txt").unwrap();
        first.commit("one").unwrap();

        let second = Repository::open_or_init(RepositoryConfig::new(dir.path())).unwrap();
        assert_eq!(second.head().unwrap(), first.head().unwrap());
    }

    #[test]
    fn test_add_file() {
        let (dir, repo) = setup();
        write(&dir, "file.txt", "hi");

        let added = repo.add("file.txt").unwrap();
        assert_eq!(added, vec!["file.txt"]);

        let index = repo.staged().unwrap();
        assert_eq!(index.get("file.txt"), Some(&Blob::new("hi").id()));
        assert!(repo.storage().has_object(Blob::new("hi").id()).unwrap());
    }

    #[test]
    fn test_add_directory_skips_metadata() {
        let (dir, repo) = setup();
        write(&dir, "a.txt", "a");
        write(&dir, "src/lib.rs", "lib");
        write(&dir, "src/deep/mod.rs", "deep");

        let added = repo.add(".").unwrap();
        assert_eq!(added, vec!["a.txt", "src/deep/mod.rs", "src/lib.rs"]);
        assert!(repo.staged().unwrap().keys().all(|k| !k.starts_with(".yag")));
    }

    #[test]
    fn test_add_absolute_and_dotted_paths() {
        let (dir, repo) = setup();
        write(&dir, "src/main.rs", "fn main() {}");

        assert_eq!(repo.add(dir.path().join("src/main.rs")).unwrap(), vec!["src/main.rs"]);
        assert_eq!(repo.add("./src/../src/main.rs").unwrap(), vec!["src/main.rs"]);
        assert_eq!(repo.staged().unwrap().len(), 1);
    }

    #[test]
    fn test_add_rejects_outside_and_missing() {
        let (_dir, repo) = setup();
        assert!(matches!(
            repo.add("../elsewhere.txt"),
            Err(RepositoryError::PathOutsideRepository(_))
        ));
        assert!(matches!(repo.add("nope.txt"), Err(RepositoryError::PathspecNotFound(_))));

        let other = TempDir::new().unwrap();
        std::fs::write(other.path().join("x.txt"), "x").unwrap();
        assert!(matches!(
            repo.add(other.path().join("x.txt")),
            Err(RepositoryError::PathOutsideRepository(_))
        ));
    }

    #[test]
    fn test_add_metadata_is_ignored() {
        let (_dir, repo) = setup();
        assert!(repo.add(".yag/HEAD").unwrap().is_empty());
        assert!(repo.staged().unwrap().is_empty());
    }

    #[test]
    fn test_commit_empty_message() {
        let (dir, repo) = setup();
        write(&dir, "file.txt", "hi");
        repo.add("file.txt").unwrap();
        let objects_before = std::fs::read_dir(dir.path().join(".yag/objects")).unwrap().count();

        assert!(matches!(repo.commit(""), Err(RepositoryError::EmptyMessage)));
        assert!(matches!(repo.commit("  \n"), Err(RepositoryError::EmptyMessage)));

        let objects_after = std::fs::read_dir(dir.path().join(".yag/objects")).unwrap().count();
        assert_eq!(objects_before, objects_after);
        assert_eq!(repo.staged().unwrap().len(), 1);
        assert_eq!(repo.head().unwrap(), None);
    }

    #[test]
    fn test_commit_nothing_staged() {
        let (_dir, repo) = setup();
        assert!(matches!(repo.commit("msg"), Err(RepositoryError::EmptyCommit)));
    }

    #[test]
    fn test_commit_chain() {
        let (dir, repo) = setup();
        let c1 = commit_file(&repo, &dir, "a.txt", "one", "first");
        let c2 = commit_file(&repo, &dir, "a.txt", "two", "second");

        let commit = repo.read_commit(c2).unwrap();
        assert_eq!(commit.parent(), Some(c1));
        assert_eq!(commit.author(), "tester");
        assert_eq!(commit.timestamp(), fixed_time());
        assert_eq!(repo.head().unwrap(), Some(c2));
        assert!(repo.staged().unwrap().is_empty());

        let ref_file = std::fs::read_to_string(dir.path().join(".yag/refs/heads/master")).unwrap();
        assert_eq!(ref_file.trim(), c2.to_hex());
    }

    #[test]
    fn test_commit_stores_every_subtree() {
        let (dir, repo) = setup();
        write(&dir, "a/b/c.txt", "c");
        write(&dir, "a/d.txt", "d");
        repo.add("a").unwrap();
        let id = repo.commit("nested").unwrap();

        let files = repo.tree_files(repo.read_commit(id).unwrap().tree()).unwrap();
        assert_eq!(files.len(), 2);
        assert_eq!(files.get("a/b/c.txt"), Some(&Blob::new("c").id()));
    }

    #[test]
    fn test_config_author_overrides_identity() {
        let dir = TempDir::new().unwrap();
        let repo = Repository::init(RepositoryConfig::new(dir.path()).author("configured"))
            .unwrap()
            .with_identity(FixedIdentity::new("ignored"));
        let id = commit_file(&repo, &dir, "f", "x", "msg");
        assert_eq!(repo.read_commit(id).unwrap().author(), "configured");
    }

    #[test]
    fn test_branch_before_commit() {
        let (_dir, repo) = setup();
        assert!(matches!(repo.create_branch("b"), Err(RepositoryError::NoCommitsYet)));
    }

    #[test]
    fn test_branch_and_checkout() {
        let (dir, repo) = setup();
        let c1 = commit_file(&repo, &dir, "file.txt", "hi", "init");

        assert_eq!(repo.create_branch("b").unwrap(), c1);
        assert_eq!(repo.current_branch().unwrap().unwrap().as_str(), "master");

        repo.checkout("b").unwrap();
        let head = std::fs::read_to_string(dir.path().join(".yag/HEAD")).unwrap();
        assert_eq!(head, "ref: refs/heads/b");

        let names: Vec<_> = repo.list_branches().unwrap().iter().map(|b| b.to_string()).collect();
        assert_eq!(names, vec!["b", "master"]);
    }

    #[test]
    fn test_branch_errors() {
        let (dir, repo) = setup();
        commit_file(&repo, &dir, "file.txt", "hi", "init");

        assert!(matches!(
            repo.create_branch("master"),
            Err(RepositoryError::BranchAlreadyExists(_))
        ));
        assert!(matches!(
            repo.create_branch("../x"),
            Err(RepositoryError::InvalidBranchName { .. })
        ));
        assert!(matches!(repo.checkout("ghost"), Err(RepositoryError::UnknownBranch(_))));
        assert!(matches!(repo.checkout("has space"), Err(RepositoryError::UnknownBranch(_))));
        assert!(matches!(repo.checkout(""), Err(RepositoryError::UnknownBranch(_))));
        assert_eq!(repo.current_branch().unwrap().unwrap().as_str(), "master");
    }

    #[test]
    fn test_checkout_leaves_files_by_default() {
        let (dir, repo) = setup();
        commit_file(&repo, &dir, "file.txt", "v1", "one");
        repo.create_branch("old").unwrap();
        commit_file(&repo, &dir, "file.txt", "v2", "two");

        repo.checkout("old").unwrap();
        assert_eq!(std::fs::read_to_string(dir.path().join("file.txt")).unwrap(), "v2");
    }

    #[test]
    fn test_checkout_materializes() {
        let dir = TempDir::new().unwrap();
        let repo = Repository::init(RepositoryConfig::new(dir.path()).materialize_on_checkout(true)).unwrap();
        write(&dir, "docs/readme.md", "v1");
        repo.add("docs").unwrap();
        repo.commit("one").unwrap();
        repo.create_branch("old").unwrap();

        write(&dir, "docs/readme.md", "v2");
        write(&dir, "extra.txt", "keep me");
        repo.add("docs/readme.md").unwrap();
        repo.commit("two").unwrap();

        repo.checkout("old").unwrap();
        assert_eq!(std::fs::read_to_string(dir.path().join("docs/readme.md")).unwrap(), "v1");
        assert!(dir.path().join("extra.txt").exists());
    }

    #[test]
    fn test_detached_commit_moves_head() {
        let (dir, repo) = setup();
        let c1 = commit_file(&repo, &dir, "a.txt", "1", "one");
        repo.storage().set_head(&Head::Detached(c1)).unwrap();
        assert_eq!(repo.current_branch().unwrap(), None);

        let c2 = commit_file(&repo, &dir, "a.txt", "2", "two");
        assert_eq!(repo.storage().get_head().unwrap(), Head::Detached(c2));
        // the branch stays where it was
        let master = BranchName::new("master").unwrap();
        assert_eq!(repo.storage().get_ref(&master).unwrap(), c1);
    }

    #[test]
    fn test_status_flow() {
        let (dir, repo) = setup();
        write(&dir, "a.txt", "a");
        write(&dir, "b.txt", "b");

        let status = repo.status().unwrap();
        assert_eq!(status.untracked, vec!["a.txt", "b.txt"]);
        assert!(status.staged.is_empty());

        repo.add("a.txt").unwrap();
        let status = repo.status().unwrap();
        assert_eq!(status.staged, vec![("a.txt".to_string(), StagedChange::New)]);
        assert_eq!(status.untracked, vec!["b.txt"]);

        write(&dir, "a.txt", "changed");
        let status = repo.status().unwrap();
        assert_eq!(status.unstaged, vec![("a.txt".to_string(), UnstagedChange::Modified)]);
    }

    #[test]
    fn test_status_clean_after_commit() {
        let (dir, repo) = setup();
        write(&dir, "a.txt", "a");
        write(&dir, "dir/b.txt", "b");
        repo.add(".").unwrap();
        repo.commit("all").unwrap();

        let status = repo.status().unwrap();
        assert!(status.unstaged.is_empty());
        assert!(status.untracked.is_empty());
        assert!(status.is_clean());
    }

    #[test]
    fn test_status_against_head() {
        let (dir, repo) = setup();
        commit_file(&repo, &dir, "a.txt", "a", "one");
        commit_file(&repo, &dir, "keep.txt", "k", "two");

        // re-adding unchanged content
        repo.add("keep.txt").unwrap();
        std::fs::remove_file(dir.path().join("keep.txt")).unwrap();

        let status = repo.status().unwrap();
        assert_eq!(status.staged, vec![("keep.txt".to_string(), StagedChange::Unchanged)]);
        assert_eq!(status.unstaged, vec![("keep.txt".to_string(), UnstagedChange::Deleted)]);
        assert_eq!(status.staged_changes().count(), 0);
        // a.txt is not in HEAD's tree anymore, the second commit only had keep.txt
        assert_eq!(status.untracked, vec!["a.txt"]);
    }

    #[test]
    fn test_unstage() {
        let (dir, repo) = setup();
        write(&dir, "a.txt", "a");
        repo.add("a.txt").unwrap();

        assert_eq!(repo.unstage("a.txt").unwrap(), Blob::new("a").id());
        assert!(repo.staged().unwrap().is_empty());
        assert!(dir.path().join("a.txt").exists());
        assert!(matches!(repo.unstage("a.txt"), Err(RepositoryError::PathspecNotFound(_))));
    }

    #[test]
    fn test_log() {
        let (dir, repo) = setup();
        assert!(repo.log(None).unwrap().is_empty());

        let c1 = commit_file(&repo, &dir, "a.txt", "1", "first\n\nbody");
        let c2 = commit_file(&repo, &dir, "a.txt", "2", "second");
        let c3 = commit_file(&repo, &dir, "a.txt", "3", "third");

        let log = repo.log(None).unwrap();
        let ids: Vec<_> = log.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![c3, c2, c1]);
        assert!(log[2].is_root());
        assert_eq!(log[2].summary(), "first");

        assert_eq!(repo.log(Some(2)).unwrap().len(), 2);
    }

    #[test]
    fn test_memory_backend() {
        let dir = TempDir::new().unwrap();
        let repo = Repository::with_storage(RepositoryConfig::new(dir.path()), MemoryStorage::new())
            .with_identity(FixedIdentity::new("mem"))
            .with_clock(FixedClock(fixed_time()));
        repo.initialize().unwrap();

        write(&dir, "file.txt", "hi");
        repo.add("file.txt").unwrap();
        let id = repo.commit("in memory").unwrap();

        // nothing written to disk besides the working file
        assert!(!dir.path().join(".yag").exists());
        assert_eq!(repo.head().unwrap(), Some(id));
        assert!(repo.status().unwrap().is_clean());
        assert_eq!(repo.storage().object_count(), 3);
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_non_utf8_names_are_not_merged() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let (dir, repo) = setup();
        let first = dir.path().join(OsStr::from_bytes(b"a\xff"));
        let second = dir.path().join(OsStr::from_bytes(b"a\xfe"));
        std::fs::write(&first, "one").unwrap();
        std::fs::write(&second, "two").unwrap();
        write(&dir, "ok.txt", "ok");

        // skipped while walking, never folded into one lossy key
        assert_eq!(repo.add(".").unwrap(), vec!["ok.txt"]);
        assert_eq!(repo.staged().unwrap().len(), 1);

        assert!(matches!(repo.add(&first), Err(RepositoryError::NonUtf8Path(_))));
        assert!(matches!(repo.unstage(&second), Err(RepositoryError::NonUtf8Path(_))));
        assert!(repo.staged().unwrap().keys().all(|k| !k.contains('\u{FFFD}')));
    }

    #[test]
    fn test_concurrent_commits_chain() {
        use std::sync::Arc;

        let dir = TempDir::new().unwrap();
        let repo = Repository::with_storage(RepositoryConfig::new(dir.path()), MemoryStorage::new());
        repo.initialize().unwrap();
        let repo = Arc::new(repo);

        let handles: Vec<_> = (0..4)
            .map(|worker| {
                let repo = Arc::clone(&repo);
                let root = dir.path().to_path_buf();
                std::thread::spawn(move || {
                    let mut committed = 0;
                    for n in 0..15 {
                        let name = format!("w{}-{}.txt", worker, n);
                        std::fs::write(root.join(&name), &name).unwrap();
                        repo.add(&name).unwrap();
                        match repo.commit("work") {
                            Ok(_) => committed += 1,
                            // another worker's commit already took our entry
                            Err(RepositoryError::EmptyCommit) => {}
                            Err(e) => panic!("commit failed: {}", e),
                        }
                    }
                    committed
                })
            })
            .collect();

        let committed: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
        assert_eq!(repo.log(None).unwrap().len(), committed);
    }
}
