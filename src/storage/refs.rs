//!  Branch names and HEAD.
//!
//!  refs are named pointers to commits, stored one file per branch under
//!  `refs/heads/`. HEAD is either symbolic (`ref: refs/heads/<branch>`) or,
//!  when detached, a raw commit hash.

use std::fmt;

use crate::object::ObjectId;
use crate::storage::error::{StorageError, StorageResult};

/// A validated branch name.
///
/// Branch names become paths under `refs/heads/`, so they are restricted
/// to keep them inside that directory:
/// - non-empty, at most 255 bytes
/// - no empty, `.` or `..` components, no leading or trailing `/`
/// - no whitespace, control characters, `\`, `:` or `\0`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BranchName(String);

impl BranchName {
    /// prefix of every branch ref path
    pub const REF_PREFIX: &'static str = "refs/heads/";

    /// create a new BranchName, validating the input
    pub fn new(name: impl Into<String>) -> Result<Self, InvalidNameError> {
        let name = name.into();
        Self::validate(&name)?;
        Ok(Self(name))
    }

    fn validate(name: &str) -> Result<(), InvalidNameError> {
        if name.is_empty() {
            return Err(InvalidNameError::Empty);
        }

        if name.len() > 255 {
            return Err(InvalidNameError::TooLong(name.len()));
        }

        for (i, c) in name.chars().enumerate() {
            if c.is_whitespace() || c.is_control() || c == '\\' || c == ':' {
                return Err(InvalidNameError::InvalidCharacter { char: c, position: i });
            }
        }

        let bad_component = name
            .split('/')
            .any(|part| part.is_empty() || part == "." || part == "..");
        if bad_component {
            return Err(InvalidNameError::InvalidPath(name.to_string()));
        }

        Ok(())
    }

    /// get the full ref path (e.g., "refs/heads/master")
    pub fn as_ref_path(&self) -> String {
        format!("{}{}", Self::REF_PREFIX, self.0)
    }

    /// get the short name
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BranchName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for BranchName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// error type for invalid branch names
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvalidNameError {
    Empty,
    TooLong(usize),
    InvalidCharacter { char: char, position: usize },
    InvalidPath(String),
}

impl fmt::Display for InvalidNameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "name cannot be empty"),
            Self::TooLong(len) => write!(f, "name too long: {} bytes", len),
            Self::InvalidCharacter { char, position } => {
                write!(f, "invalid character {:?} at position {}", char, position)
            }
            Self::InvalidPath(path) => write!(f, "invalid path: '{}'", path),
        }
    }
}

impl std::error::Error for InvalidNameError {}

/// where HEAD points
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Head {
    /// HEAD follows a branch; the branch may not have a commit yet
    Symbolic(BranchName),
    /// HEAD names a commit directly
    Detached(ObjectId),
}

impl Head {
    const SYMBOLIC_PREFIX: &'static str = "ref: ";

    /// parse the content of a HEAD file
    pub fn parse(content: &str) -> StorageResult<Self> {
        let content = content.trim();
        match content.strip_prefix(Self::SYMBOLIC_PREFIX) {
            Some(target) => {
                let name = target
                    .strip_prefix(BranchName::REF_PREFIX)
                    .ok_or_else(|| StorageError::InvalidHead(content.to_string()))?;
                Ok(Head::Symbolic(BranchName::new(name)?))
            }
            None => ObjectId::from_hex(content)
                .map(Head::Detached)
                .map_err(|_| StorageError::InvalidHead(content.to_string())),
        }
    }

    /// the exact bytes written to the HEAD file
    pub fn to_file_content(&self) -> String {
        match self {
            Head::Symbolic(branch) => format!("{}{}", Self::SYMBOLIC_PREFIX, branch.as_ref_path()),
            Head::Detached(id) => id.to_hex(),
        }
    }

    /// the branch HEAD follows, if attached
    pub fn branch(&self) -> Option<&BranchName> {
        match self {
            Head::Symbolic(branch) => Some(branch),
            Head::Detached(_) => None,
        }
    }
}

/// parse the content of a ref file
pub(crate) fn parse_ref(name: &BranchName, content: &str) -> StorageResult<ObjectId> {
    ObjectId::from_hex(content.trim()).map_err(|_| StorageError::InvalidHead(format!("{}: {}", name, content.trim())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::Blob;

    #[test]
    fn test_branch_name_valid() {
        assert!(BranchName::new("master").is_ok());
        assert!(BranchName::new("feature/login").is_ok());
        assert!(BranchName::new("fix-123_a.b").is_ok());
    }

    #[test]
    fn test_branch_name_invalid() {
        assert_eq!(BranchName::new(""), Err(InvalidNameError::Empty));
        assert!(BranchName::new("../escape").is_err());
        assert!(BranchName::new("a/../b").is_err());
        assert!(BranchName::new("/abs").is_err());
        assert!(BranchName::new("trailing/").is_err());
        assert!(BranchName::new("has space").is_err());
        assert!(BranchName::new("a".repeat(256)).is_err());
    }

    #[test]
    fn test_ref_path() {
        let branch = BranchName::new("dev").unwrap();
        assert_eq!(branch.as_ref_path(), "refs/heads/dev");
    }

    #[test]
    fn test_head_symbolic_roundtrip() {
        let head = Head::Symbolic(BranchName::new("master").unwrap());
        assert_eq!(head.to_file_content(), "ref: refs/heads/master");
        assert_eq!(Head::parse("ref: refs/heads/master\n").unwrap(), head);
        assert_eq!(head.branch().map(|b| b.as_str()), Some("master"));
    }

    #[test]
    fn test_head_detached_roundtrip() {
        let id = Blob::new("c").id();
        let head = Head::Detached(id);
        assert_eq!(Head::parse(&head.to_file_content()).unwrap(), head);
        assert!(head.branch().is_none());
    }

    #[test]
    fn test_head_garbage() {
        assert!(matches!(Head::parse("nonsense"), Err(StorageError::InvalidHead(_))));
        assert!(matches!(Head::parse("ref: refs/tags/v1"), Err(StorageError::InvalidHead(_))));
    }
}
