//! object model for yag
//!
//! three immutable, content-addressed object kinds make up the history:
//!
//! ```text
//!   commit ──► tree ──► blob
//!     │          └────► tree ──► blob
//!     ▼
//!   parent commit
//! ```
//!
//! Every object encodes as `<type> <len>\0<payload>` and is identified by
//! the SHA-256 of that whole byte sequence.

mod blob;
mod builder;
mod commit;
mod error;
mod tree;
mod types;

pub use blob::Blob;
pub use builder::{build_tree_from_paths, BuiltTree};
pub use commit::Commit;
pub use error::{ObjectError, ObjectResult};
pub use tree::{EntryKind, Tree, TreeEntry};
pub use types::{decode, encode, ObjectId, ObjectKind};

/// any stored object
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Object {
    Blob(Blob),
    Tree(Tree),
    Commit(Commit),
}

impl Object {
    pub fn kind(&self) -> ObjectKind {
        match self {
            Object::Blob(_) => ObjectKind::Blob,
            Object::Tree(_) => ObjectKind::Tree,
            Object::Commit(_) => ObjectKind::Commit,
        }
    }

    pub fn id(&self) -> ObjectId {
        match self {
            Object::Blob(b) => b.id(),
            Object::Tree(t) => t.id(),
            Object::Commit(c) => c.id(),
        }
    }

    /// canonical encoded form, header included
    pub fn encode(&self) -> Vec<u8> {
        match self {
            Object::Blob(b) => b.encode(),
            Object::Tree(t) => t.encode(),
            Object::Commit(c) => c.encode(),
        }
    }

    /// parse a full encoded object
    pub fn decode(raw: &[u8]) -> ObjectResult<Self> {
        let (kind, payload) = decode(raw)?;
        match kind {
            ObjectKind::Blob => Ok(Object::Blob(Blob::new(payload.to_vec()))),
            ObjectKind::Tree => Ok(Object::Tree(Tree::from_payload(payload)?)),
            ObjectKind::Commit => Ok(Object::Commit(Commit::from_payload(payload)?)),
        }
    }
}

impl From<Blob> for Object {
    fn from(blob: Blob) -> Self {
        Object::Blob(blob)
    }
}

impl From<Tree> for Object {
    fn from(tree: Tree) -> Self {
        Object::Tree(tree)
    }
}

impl From<Commit> for Object {
    fn from(commit: Commit) -> Self {
        Object::Commit(commit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_decode_dispatch() {
        let blob = Blob::new("data");
        let mut tree = Tree::new();
        tree.add_file("f", blob.id());
        let commit = Commit::new(tree.id(), None, "msg", "me", Utc::now());

        for object in [Object::from(blob), Object::from(tree), Object::from(commit)] {
            let decoded = Object::decode(&object.encode()).unwrap();
            assert_eq!(decoded.kind(), object.kind());
            assert_eq!(decoded.id(), object.id());
        }
    }

    #[test]
    fn test_decode_corrupt() {
        let mut raw = Blob::new("data").encode();
        raw.push(b'!');
        assert!(Object::decode(&raw).unwrap_err().is_format_error());
    }
}
