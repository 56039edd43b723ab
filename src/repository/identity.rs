//! Author identity and clock collaborators.
//!
//! commits take their author and timestamp from these instead of reading
//! process state directly, so tests can pin both.

use chrono::{DateTime, Utc};

/// who is committing
pub trait Identity: Send + Sync {
    fn author(&self) -> String;
}

/// wall clock used for commit timestamps
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// identity from the `USER` / `USERNAME` environment variables
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemIdentity;

impl SystemIdentity {
    pub const FALLBACK: &'static str = "unknown";
}

impl Identity for SystemIdentity {
    fn author(&self) -> String {
        ["USER", "USERNAME"]
            .iter()
            .filter_map(|var| std::env::var(var).ok())
            .map(|name| name.trim().to_string())
            .find(|name| !name.is_empty())
            .unwrap_or_else(|| Self::FALLBACK.to_string())
    }
}

/// a fixed author name
#[derive(Debug, Clone)]
pub struct FixedIdentity(pub String);

impl FixedIdentity {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }
}

impl Identity for FixedIdentity {
    fn author(&self) -> String {
        self.0.clone()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// a clock stuck at one instant
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}
