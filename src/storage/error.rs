//! Storage layer error types
//!
//! All errors that can occur while reading or writing objects, refs, HEAD
//! and the index. I/O failures pass through unchanged.

use std::path::PathBuf;

use thiserror::Error;

use crate::object::{ObjectError, ObjectId, ObjectKind};
use crate::storage::refs::InvalidNameError;

/// the main error type for storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    /// the metadata directory does not exist
    #[error("not a yag repository: {0}")]
    NotARepository(PathBuf),

    /// init was called on a directory that already has metadata
    #[error("repository already initialized: {0}")]
    AlreadyInitialized(PathBuf),

    /// no object is stored under this hash
    #[error("object not found: {0}")]
    ObjectNotFound(ObjectId),

    /// stored bytes failed header/length validation
    #[error("corrupt object {id}: {source}")]
    CorruptObject {
        id: ObjectId,
        #[source]
        source: ObjectError,
    },

    /// stored bytes decode fine but hash to something else
    #[error("corrupt object {expected}: content hashes to {actual}")]
    HashMismatch { expected: ObjectId, actual: ObjectId },

    /// the object exists but is not the kind the caller asked for
    #[error("object {id} is a {found}, expected a {expected}")]
    UnexpectedObjectKind {
        id: ObjectId,
        expected: ObjectKind,
        found: ObjectKind,
    },

    /// the named ref file is absent
    #[error("ref not found: {0}")]
    RefNotFound(String),

    /// a ref name read from disk is not a valid branch name
    #[error("invalid ref name: {0}")]
    InvalidRefName(#[from] InvalidNameError),

    /// HEAD or a ref file holds something we can't parse
    #[error("invalid HEAD or ref content: {0:?}")]
    InvalidHead(String),

    /// the index file is not valid JSON
    #[error("index serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// hash parsing and other object-level failures
    #[error("object error: {0}")]
    Object(#[from] ObjectError),

    /// I/O error (filesystem level)
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl StorageError {
    /// check if this error indicates the resource doesn't exist
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            StorageError::ObjectNotFound(_) | StorageError::RefNotFound(_)
        )
    }

    /// check if this error indicates damaged on-disk data
    pub fn is_corruption(&self) -> bool {
        matches!(
            self,
            StorageError::CorruptObject { .. }
                | StorageError::HashMismatch { .. }
                | StorageError::InvalidHead(_)
                | StorageError::Serialization(_)
        )
    }
}

/// result type alias for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::Blob;

    #[test]
    fn test_error_classification() {
        let id = Blob::new("x").id();

        let not_found = StorageError::ObjectNotFound(id);
        assert!(not_found.is_not_found());
        assert!(!not_found.is_corruption());

        let corrupt = StorageError::CorruptObject {
            id,
            source: ObjectError::MissingSeparator,
        };
        assert!(!corrupt.is_not_found());
        assert!(corrupt.is_corruption());
    }
}
