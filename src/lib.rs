//! yag - a small content-addressed version control engine
//!
//! Files are stored as blobs, directories as trees, and snapshots as
//! commits, all keyed by the SHA-256 of their encoding and kept under
//! `<root>/.yag/`. Branches are named pointers to commits.
//!
//! # Example
//!
//! ```no_run
//! use yag::repository::{Repository, RepositoryConfig};
//!
//! let repo = Repository::init(RepositoryConfig::new("./project")).unwrap();
//! repo.add(".").unwrap();
//! repo.commit("initial import").unwrap();
//!
//! for change in repo.status().unwrap().untracked {
//!     println!("untracked: {}", change);
//! }
//! ```

pub mod object;
pub mod repository;
pub mod storage;

pub use object::{Blob, Commit, Object, ObjectId, ObjectKind, Tree};
pub use repository::{Repository, RepositoryConfig, RepositoryError, RepositoryResult};
pub use storage::{FileSystemStorage, MemoryStorage, Storage};
