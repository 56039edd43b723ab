//! Repository error types

use std::path::PathBuf;

use thiserror::Error;

use crate::object::ObjectError;
use crate::storage::{InvalidNameError, StorageError};

/// errors returned by repository verbs
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// commit message was empty or only whitespace
    #[error("aborting commit due to empty commit message")]
    EmptyMessage,

    /// nothing is staged
    #[error("nothing to commit")]
    EmptyCommit,

    /// the operation needs a commit on HEAD and there is none
    #[error("no commits yet")]
    NoCommitsYet,

    #[error("unknown branch: {0}")]
    UnknownBranch(String),

    #[error("branch already exists: {0}")]
    BranchAlreadyExists(String),

    #[error("invalid branch name {name:?}: {source}")]
    InvalidBranchName {
        name: String,
        #[source]
        source: InvalidNameError,
    },

    /// the path is neither staged nor present on disk
    #[error("pathspec '{0}' did not match any files")]
    PathspecNotFound(String),

    #[error("path is outside the repository: {0}")]
    PathOutsideRepository(PathBuf),

    /// index keys are UTF-8; such a file can't be staged
    #[error("path is not valid UTF-8: {}", .0.display())]
    NonUtf8Path(PathBuf),

    /// directory traversal failed
    #[error("walk error: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("object error: {0}")]
    Object(#[from] ObjectError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl RepositoryError {
    /// check if this error indicates the named thing doesn't exist
    pub fn is_not_found(&self) -> bool {
        match self {
            RepositoryError::UnknownBranch(_) | RepositoryError::PathspecNotFound(_) => true,
            RepositoryError::Storage(e) => e.is_not_found(),
            _ => false,
        }
    }

    /// check if this error indicates damaged repository data
    pub fn is_corruption(&self) -> bool {
        match self {
            RepositoryError::Storage(e) => e.is_corruption(),
            RepositoryError::Object(e) => e.is_format_error(),
            _ => false,
        }
    }
}

/// result type alias for repository operations
pub type RepositoryResult<T> = Result<T, RepositoryError>;
