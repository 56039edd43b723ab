//! The staging index codec.
//!
//! The index is a JSON object mapping repository-relative paths (always `/`
//! separated) to blob hashes. It is rewritten wholesale on every change;
//! `BTreeMap` keeps the key order, and therefore the file bytes, stable.

use std::collections::BTreeMap;

use crate::object::ObjectId;
use crate::storage::error::StorageResult;

/// staged path -> blob hash
pub type IndexEntries = BTreeMap<String, ObjectId>;

/// content of a freshly initialized or cleared index
pub const EMPTY_INDEX: &[u8] = b"{}";

/// decode index file content; blank content is an empty index
pub fn decode_index(bytes: &[u8]) -> StorageResult<IndexEntries> {
    if bytes.iter().all(|b| b.is_ascii_whitespace()) {
        return Ok(IndexEntries::new());
    }
    Ok(serde_json::from_slice(bytes)?)
}

/// encode index entries for writing
pub fn encode_index(entries: &IndexEntries) -> StorageResult<Vec<u8>> {
    Ok(serde_json::to_vec(entries)?)
}
