//! Blob objects: raw file content.
//!
//! A blob is identified by the hash of its encoded form, so identical
//! content always lands on the same id regardless of where it came from.

use std::path::Path;

use crate::object::types::{encode, ObjectId, ObjectKind};

/// immutable file content with its precomputed id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Blob {
    content: Vec<u8>,
    id: ObjectId,
}

impl Blob {
    /// create a blob from content, hashing it once
    pub fn new(content: impl Into<Vec<u8>>) -> Self {
        let content = content.into();
        let id = ObjectId::hash_encoded(&encode(ObjectKind::Blob, &content));
        Self { content, id }
    }

    /// read a file from disk into a blob
    pub fn from_file(path: impl AsRef<Path>) -> std::io::Result<Self> {
        Ok(Self::new(std::fs::read(path)?))
    }

    pub fn id(&self) -> ObjectId {
        self.id
    }

    pub fn content(&self) -> &[u8] {
        &self.content
    }

    /// size of the content in bytes
    pub fn size(&self) -> usize {
        self.content.len()
    }

    pub fn into_content(self) -> Vec<u8> {
        self.content
    }

    /// canonical encoded form
    pub fn encode(&self) -> Vec<u8> {
        encode(ObjectKind::Blob, &self.content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::types::decode;
    use proptest::prelude::*;

    #[test]
    fn test_identical_content_same_id() {
        let a = Blob::new(b"hello".to_vec());
        let b = Blob::new("hello");
        assert_eq!(a.id(), b.id());
        assert_ne!(a.id(), Blob::new("hello!").id());
    }

    #[test]
    fn test_id_covers_header() {
        // the id is the digest of the header too, not just the raw bytes
        let blob = Blob::new("hi");
        assert_eq!(blob.id(), ObjectId::hash_encoded(b"blob 2\0hi"));
    }

    #[test]
    fn test_empty_blob() {
        let blob = Blob::new(Vec::new());
        assert_eq!(blob.size(), 0);
        assert_eq!(blob.encode(), b"blob 0\0");
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("a.txt");
        std::fs::write(&path, "content").unwrap();

        let blob = Blob::from_file(&path).unwrap();
        assert_eq!(blob.content(), b"content");
        assert_eq!(blob.id(), Blob::new("content").id());
    }

    proptest! {
        #[test]
        fn test_blob_hash_deterministic(content in proptest::collection::vec(any::<u8>(), 0..512)) {
            let first = Blob::new(content.clone());
            let second = Blob::new(content.clone());
            prop_assert_eq!(first.id(), second.id());

            let encoded = first.encode();
            let (kind, payload) = decode(&encoded).unwrap();
            prop_assert_eq!(kind, ObjectKind::Blob);
            prop_assert_eq!(payload, content.as_slice());
        }
    }
}
