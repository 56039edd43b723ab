//! Repository configuration.

use std::path::{Path, PathBuf};

/// default name of the metadata directory under the root
pub const DEFAULT_META_DIR: &str = ".yag";

/// branch HEAD points at after init
pub const DEFAULT_BRANCH: &str = "master";

/// Repository configuration options.
#[derive(Debug, Clone)]
pub struct RepositoryConfig {
    /// Working directory root. Every relative path is resolved against it.
    pub root: PathBuf,
    /// Metadata directory name, relative to `root`.
    pub meta_dir: String,
    /// Branch HEAD points at after init.
    pub default_branch: String,
    /// Author recorded on commits; falls back to the identity collaborator.
    pub author: Option<String>,
    /// Write the target commit's files into the working directory on checkout.
    pub materialize_on_checkout: bool,
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            meta_dir: DEFAULT_META_DIR.to_string(),
            default_branch: DEFAULT_BRANCH.to_string(),
            author: None,
            materialize_on_checkout: false,
        }
    }
}

impl RepositoryConfig {
    /// Create a new configuration rooted at the given path.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Default::default()
        }
    }

    /// Set the metadata directory name.
    pub fn meta_dir(mut self, name: impl Into<String>) -> Self {
        self.meta_dir = name.into();
        self
    }

    /// Set the branch created by init.
    pub fn default_branch(mut self, name: impl Into<String>) -> Self {
        self.default_branch = name.into();
        self
    }

    /// Set the commit author.
    pub fn author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    /// Set materialize_on_checkout flag.
    pub fn materialize_on_checkout(mut self, value: bool) -> Self {
        self.materialize_on_checkout = value;
        self
    }

    /// absolute path of the metadata directory
    pub fn meta_path(&self) -> PathBuf {
        self.root.join(&self.meta_dir)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}
