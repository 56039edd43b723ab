//! tree objects: one directory level of the snapshot.
//!
//! A tree maps names to either blobs (files) or other trees (directories).
//! Entries live in a name-keyed map, so the encoding is always in name order
//! and the tree hash does not depend on the order entries were added.
//!
//! Payload layout, repeated per entry:
//!
//! ```text
//! <kind> <name>\0<32 raw digest bytes>
//! ```

use std::collections::BTreeMap;
use std::fmt;

use crate::object::error::{ObjectError, ObjectResult};
use crate::object::types::{encode, ObjectId, ObjectKind};

/// what a tree entry points at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryKind {
    File,
    Directory,
}

impl EntryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryKind::File => "file",
            EntryKind::Directory => "directory",
        }
    }

    fn parse(s: &str) -> ObjectResult<Self> {
        match s {
            "file" => Ok(EntryKind::File),
            "directory" => Ok(EntryKind::Directory),
            other => Err(invalid(format!("unknown entry kind {:?}", other))),
        }
    }
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// a single named entry in a tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeEntry {
    pub name: String,
    pub hash: ObjectId,
    pub kind: EntryKind,
}

impl TreeEntry {
    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Directory
    }
}

/// a directory listing, content-addressed over its sorted encoding
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tree {
    entries: BTreeMap<String, TreeEntry>,
}

impl Tree {
    pub fn new() -> Self {
        Self::default()
    }

    /// add or replace an entry
    pub fn add_entry(&mut self, name: impl Into<String>, hash: ObjectId, kind: EntryKind) {
        let name = name.into();
        self.entries.insert(name.clone(), TreeEntry { name, hash, kind });
    }

    pub fn add_file(&mut self, name: impl Into<String>, hash: ObjectId) {
        self.add_entry(name, hash, EntryKind::File);
    }

    pub fn add_directory(&mut self, name: impl Into<String>, hash: ObjectId) {
        self.add_entry(name, hash, EntryKind::Directory);
    }

    /// entries in name order
    pub fn entries(&self) -> impl Iterator<Item = &TreeEntry> {
        self.entries.values()
    }

    pub fn get(&self, name: &str) -> Option<&TreeEntry> {
        self.entries.get(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// the sorted entry list without the object header
    pub fn payload(&self) -> Vec<u8> {
        let mut out = Vec::new();
        for entry in self.entries.values() {
            out.extend_from_slice(entry.kind.as_str().as_bytes());
            out.push(b' ');
            out.extend_from_slice(entry.name.as_bytes());
            out.push(0);
            out.extend_from_slice(entry.hash.as_bytes());
        }
        out
    }

    /// canonical encoded form
    pub fn encode(&self) -> Vec<u8> {
        encode(ObjectKind::Tree, &self.payload())
    }

    /// hash of the encoded form
    pub fn id(&self) -> ObjectId {
        ObjectId::hash_encoded(&self.encode())
    }

    /// parse a tree payload (the bytes after the header)
    pub fn from_payload(mut payload: &[u8]) -> ObjectResult<Self> {
        let mut tree = Tree::new();
        let mut last: Option<String> = None;

        while !payload.is_empty() {
            let space = payload
                .iter()
                .position(|b| *b == b' ')
                .ok_or_else(|| invalid("entry without kind separator"))?;
            let kind = std::str::from_utf8(&payload[..space]).map_err(|_| invalid("non-utf8 entry kind"))?;
            let kind = EntryKind::parse(kind)?;
            payload = &payload[space + 1..];

            let nul = payload
                .iter()
                .position(|b| *b == 0)
                .ok_or_else(|| invalid("entry without name terminator"))?;
            let name = std::str::from_utf8(&payload[..nul])
                .map_err(|_| invalid("non-utf8 entry name"))?
                .to_string();
            payload = &payload[nul + 1..];

            if payload.len() < 32 {
                return Err(invalid("truncated entry hash"));
            }
            let mut digest = [0u8; 32];
            digest.copy_from_slice(&payload[..32]);
            payload = &payload[32..];

            if name.is_empty() || name == "." || name == ".." || name.contains('/') {
                return Err(invalid(format!("bad entry name {:?}", name)));
            }
            // the encoder always writes names in strictly ascending order
            if last.as_deref().is_some_and(|prev| prev >= name.as_str()) {
                return Err(invalid(format!("entries out of order at {:?}", name)));
            }
            last = Some(name.clone());

            tree.add_entry(name, ObjectId::from_bytes(digest), kind);
        }

        Ok(tree)
    }
}

fn invalid(reason: impl Into<String>) -> ObjectError {
    ObjectError::InvalidPayload {
        kind: "tree",
        reason: reason.into(),
    }
}
