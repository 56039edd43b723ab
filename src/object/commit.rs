//!  Commit objects
//!
//!  a commit snapshots one root tree and links to at most one parent, so the
//!  history is a simple chain through the DAG.
//!
//! payload format:
//!
//! ```text
//! tree <hex>
//! parent <hex>          (omitted for a root commit)
//! author <name>
//! timestamp <rfc3339>
//!
//! <message>
//! ```

use chrono::{DateTime, SecondsFormat, Utc};

use crate::object::error::{ObjectError, ObjectResult};
use crate::object::types::{encode, ObjectId, ObjectKind};

/// a single commit in the history
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Commit {
    tree: ObjectId,
    parent: Option<ObjectId>,
    message: String,
    author: String,
    timestamp: DateTime<Utc>,
}

impl Commit {
    /// create a commit
    ///
    /// newlines in the author are folded into spaces so the header
    /// stays one field per line
    pub fn new(
        tree: ObjectId,
        parent: Option<ObjectId>,
        message: impl Into<String>,
        author: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        let author = author.into().replace(['\n', '\r'], " ");
        Self {
            tree,
            parent,
            message: message.into(),
            author,
            timestamp,
        }
    }

    pub fn tree(&self) -> ObjectId {
        self.tree
    }

    pub fn parent(&self) -> Option<ObjectId> {
        self.parent
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn author(&self) -> &str {
        &self.author
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// first line of the message
    pub fn summary(&self) -> &str {
        self.message.lines().next().unwrap_or("")
    }

    pub fn payload(&self) -> Vec<u8> {
        let mut out = String::new();
        out.push_str(&format!("tree {}\n", self.tree));
        if let Some(parent) = self.parent {
            out.push_str(&format!("parent {}\n", parent));
        }
        out.push_str(&format!("author {}\n", self.author));
        out.push_str(&format!(
            "timestamp {}\n",
            self.timestamp.to_rfc3339_opts(SecondsFormat::Nanos, true)
        ));
        out.push('\n');
        out.push_str(&self.message);
        out.into_bytes()
    }

    /// canonical encoded form
    pub fn encode(&self) -> Vec<u8> {
        encode(ObjectKind::Commit, &self.payload())
    }

    pub fn id(&self) -> ObjectId {
        ObjectId::hash_encoded(&self.encode())
    }

    /// parse a commit payload (the bytes after the header)
    pub fn from_payload(payload: &[u8]) -> ObjectResult<Self> {
        let text = std::str::from_utf8(payload).map_err(|_| invalid("payload is not utf-8"))?;
        let (headers, message) = text
            .split_once("\n\n")
            .ok_or_else(|| invalid("missing blank line before message"))?;

        let mut lines = headers.lines().peekable();

        let tree = field(lines.next(), "tree")?;
        let tree = ObjectId::from_hex(tree)?;

        let parent = match lines.peek() {
            Some(line) if line.starts_with("parent ") => {
                let value = field(lines.next(), "parent")?;
                Some(ObjectId::from_hex(value)?)
            }
            _ => None,
        };

        let author = field(lines.next(), "author")?.to_string();

        let timestamp = field(lines.next(), "timestamp")?;
        let timestamp = DateTime::parse_from_rfc3339(timestamp)
            .map_err(|e| invalid(format!("bad timestamp: {}", e)))?
            .with_timezone(&Utc);

        if let Some(extra) = lines.next() {
            return Err(invalid(format!("unexpected header line {:?}", extra)));
        }

        Ok(Self {
            tree,
            parent,
            message: message.to_string(),
            author,
            timestamp,
        })
    }
}

fn field<'a>(line: Option<&'a str>, name: &str) -> ObjectResult<&'a str> {
    let line = line.ok_or_else(|| invalid(format!("missing {} line", name)))?;
    line.strip_prefix(name)
        .and_then(|rest| rest.strip_prefix(' '))
        .ok_or_else(|| invalid(format!("expected {} line, found {:?}", name, line)))
}

fn invalid(reason: impl Into<String>) -> ObjectError {
    ObjectError::InvalidPayload {
        kind: "commit",
        reason: reason.into(),
    }
}
