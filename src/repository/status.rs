//! working tree status
//!
//! three views are compared: files on disk, the staging index, and the tree
//! of the HEAD commit. A path is tracked when it is staged or in HEAD.

use std::fmt;

/// how a staged entry relates to the HEAD tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum StagedChange {
    /// not in the HEAD tree
    New,
    /// in the HEAD tree with different content
    Modified,
    /// identical to the HEAD tree entry
    Unchanged,
}

/// how a tracked file on disk differs from its tracked content
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum UnstagedChange {
    Modified,
    Deleted,
}

impl fmt::Display for StagedChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            StagedChange::New => "new file",
            StagedChange::Modified => "modified",
            StagedChange::Unchanged => "unchanged",
        })
    }
}

impl fmt::Display for UnstagedChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            UnstagedChange::Modified => "modified",
            UnstagedChange::Deleted => "deleted",
        })
    }
}

/// result of `Repository::status`, each list sorted by path
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepositoryStatus {
    /// every index entry
    pub staged: Vec<(String, StagedChange)>,
    /// tracked files whose working copy differs
    pub unstaged: Vec<(String, UnstagedChange)>,
    /// working files that are neither staged nor in HEAD
    pub untracked: Vec<String>,
}

impl RepositoryStatus {
    /// nothing staged, nothing modified, nothing untracked
    pub fn is_clean(&self) -> bool {
        self.staged.is_empty() && self.unstaged.is_empty() && self.untracked.is_empty()
    }

    /// staged entries that actually differ from HEAD
    pub fn staged_changes(&self) -> impl Iterator<Item = &(String, StagedChange)> {
        self.staged.iter().filter(|(_, change)| *change != StagedChange::Unchanged)
    }
}
