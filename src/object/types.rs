//! core identifiers and the canonical object encoding.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::object::error::{ObjectError, ObjectResult};

/// SHA-256 digest of an encoded object.
///
/// Always rendered as 64 lowercase hex characters. Serializes as that
/// string so the index and ref files stay human readable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ObjectId([u8; 32]);

impl ObjectId {
    /// length of the hex form
    pub const HEX_LEN: usize = 64;

    /// hash a complete encoded object (header + payload)
    pub fn hash_encoded(encoded: &[u8]) -> Self {
        let digest = Sha256::digest(encoded);
        Self(digest.into())
    }

    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// parse an ObjectId from a hex string
    pub fn from_hex(hex: &str) -> ObjectResult<Self> {
        let hex = hex.trim();
        if hex.len() != Self::HEX_LEN {
            return Err(ObjectError::InvalidHash(hex.to_string()));
        }
        let mut bytes = [0u8; 32];
        hex::decode_to_slice(hex, &mut bytes).map_err(|_| ObjectError::InvalidHash(hex.to_string()))?;
        Ok(Self(bytes))
    }

    /// full lowercase hex form
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// short form of the id
    pub fn short(&self) -> String {
        self.to_hex()[..8].to_string()
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl FromStr for ObjectId {
    type Err = ObjectError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl TryFrom<String> for ObjectId {
    type Error = ObjectError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_hex(&value)
    }
}

impl From<ObjectId> for String {
    fn from(id: ObjectId) -> Self {
        id.to_hex()
    }
}

/// the three kinds of stored object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    Blob,
    Tree,
    Commit,
}

impl ObjectKind {
    /// the type tag used in the object header
    pub fn as_str(&self) -> &'static str {
        match self {
            ObjectKind::Blob => "blob",
            ObjectKind::Tree => "tree",
            ObjectKind::Commit => "commit",
        }
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ObjectKind {
    type Err = ObjectError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "blob" => Ok(ObjectKind::Blob),
            "tree" => Ok(ObjectKind::Tree),
            "commit" => Ok(ObjectKind::Commit),
            other => Err(ObjectError::UnknownKind(other.to_string())),
        }
    }
}

/// encode a payload as `<type> <len>\0<payload>`
pub fn encode(kind: ObjectKind, payload: &[u8]) -> Vec<u8> {
    let header = format!("{} {}\0", kind, payload.len());
    let mut out = Vec::with_capacity(header.len() + payload.len());
    out.extend_from_slice(header.as_bytes());
    out.extend_from_slice(payload);
    out
}

/// split an encoded object into its kind and payload
///
/// fails when the separator is missing, the header is malformed, or the
/// declared length does not match what follows it.
pub fn decode(raw: &[u8]) -> ObjectResult<(ObjectKind, &[u8])> {
    let nul = raw.iter().position(|b| *b == 0).ok_or(ObjectError::MissingSeparator)?;
    let (header, rest) = raw.split_at(nul);
    let payload = &rest[1..];

    let header = std::str::from_utf8(header)
        .map_err(|_| ObjectError::MalformedHeader(String::from_utf8_lossy(header).into_owned()))?;

    let (kind, len) = header
        .split_once(' ')
        .ok_or_else(|| ObjectError::MalformedHeader(header.to_string()))?;

    let kind = kind.parse::<ObjectKind>()?;

    // digits only: no sign, no whitespace
    if len.is_empty() || !len.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ObjectError::MalformedHeader(header.to_string()));
    }
    let declared: usize = len
        .parse()
        .map_err(|_| ObjectError::MalformedHeader(header.to_string()))?;

    if declared != payload.len() {
        return Err(ObjectError::LengthMismatch {
            declared,
            actual: payload.len(),
        });
    }

    Ok((kind, payload))
}
