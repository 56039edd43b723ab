//! repository layer for yag
//!
//! the user-facing verbs (add, commit, branch, checkout, status, unstage,
//! log) on top of the storage backend and the tree builder.
//!
//! # Usage
//!
//! ```no_run
//! use yag::repository::{Repository, RepositoryConfig};
//!
//! let repo = Repository::open_or_init(RepositoryConfig::new("./work")).unwrap();
//! repo.add("notes.txt").unwrap();
//! let commit = repo.commit("add notes").unwrap();
//!
//! repo.create_branch("draft").unwrap();
//! repo.checkout("draft").unwrap();
//! assert_eq!(repo.head().unwrap(), Some(commit));
//! ```

mod config;
mod error;
mod identity;
#[allow(clippy::module_inception)]
mod repository;
mod status;

pub use config::{RepositoryConfig, DEFAULT_BRANCH, DEFAULT_META_DIR};
pub use error::{RepositoryError, RepositoryResult};
pub use identity::{Clock, FixedClock, FixedIdentity, Identity, SystemClock, SystemIdentity};
pub use repository::{CommitInfo, Repository};
pub use status::{RepositoryStatus, StagedChange, UnstagedChange};
