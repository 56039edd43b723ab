//! Object model error types
//!
//! Everything that can go wrong while encoding, decoding or assembling
//! objects. Decoding failures double as corruption detection for the store.

use thiserror::Error;

/// the main error type for object operations
#[derive(Debug, Error)]
pub enum ObjectError {
    /// the `\0` between header and payload was not found
    #[error("invalid object format: missing header separator")]
    MissingSeparator,

    /// the header is not `<type> <decimal length>`
    #[error("invalid object header: {0:?}")]
    MalformedHeader(String),

    /// the header names a type we don't know
    #[error("unknown object type: {0}")]
    UnknownKind(String),

    /// declared payload length differs from the bytes that follow the header
    #[error("corrupt object: header declares {declared} bytes, found {actual}")]
    LengthMismatch { declared: usize, actual: usize },

    /// the payload of a tree or commit could not be decoded
    #[error("invalid {kind} payload: {reason}")]
    InvalidPayload { kind: &'static str, reason: String },

    /// a hash string is not 64 hex characters
    #[error("invalid object hash: {0:?}")]
    InvalidHash(String),

    /// a staged path cannot be placed in a tree
    #[error("invalid tree path: {0:?}")]
    InvalidPath(String),

    /// the same name is used as both a file and a directory
    #[error("path is both a file and a directory: {0}")]
    PathConflict(String),
}

impl ObjectError {
    /// check if this error came from a malformed encoding
    pub fn is_format_error(&self) -> bool {
        matches!(
            self,
            ObjectError::MissingSeparator
                | ObjectError::MalformedHeader(_)
                | ObjectError::UnknownKind(_)
                | ObjectError::LengthMismatch { .. }
                | ObjectError::InvalidPayload { .. }
        )
    }
}

/// result type alias for object operations
pub type ObjectResult<T> = Result<T, ObjectError>;
