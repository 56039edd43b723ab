//! storage layer for yag
//!
//! persists objects, refs, HEAD and the staging index. The repository layer
//! only talks to the [`Storage`] trait, so the filesystem backend can be
//! swapped for [`MemoryStorage`] without touching any verb.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        Repository                           │
//! │        (add, commit, branch, checkout, status, ...)         │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//!                    ┌───────────────────┐
//!                    │   trait Storage   │
//!                    └───────────────────┘
//!                     │                 │
//!                     ▼                 ▼
//!          ┌───────────────────┐  ┌───────────────────┐
//!          │ FileSystemStorage │  │   MemoryStorage   │
//!          │ (lock + rename)   │  │    (RwLock)       │
//!          └───────────────────┘  └───────────────────┘
//! ```
//!
//! # Usage
//!
//! ```no_run
//! use yag::object::Blob;
//! use yag::storage::{BranchName, FileSystemStorage, Storage};
//!
//! let storage = FileSystemStorage::new("./work/.yag");
//! storage.initialize(&BranchName::new("master").unwrap()).unwrap();
//!
//! let id = storage.store_object(&Blob::new("hi").into()).unwrap();
//! storage.update_index("file.txt", id).unwrap();
//! ```

mod backend;
mod error;
mod fs;
mod index;
mod lock;
mod memory;
mod refs;

pub use backend::Storage;
pub use error::{StorageError, StorageResult};
pub use fs::FileSystemStorage;
pub use index::{decode_index, encode_index, IndexEntries, EMPTY_INDEX};
pub use memory::MemoryStorage;
pub use refs::{BranchName, Head, InvalidNameError};
