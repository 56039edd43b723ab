//! Builds a Merkle tree from a flat map of staged paths.
//!
//! Paths are grouped by their parent directory, then each directory is
//! assembled post-order so a parent is only hashed once every child tree is
//! final. Each directory's hash is memoized for the duration of one build.

use std::collections::{BTreeMap, BTreeSet};

use crate::object::error::{ObjectError, ObjectResult};
use crate::object::tree::Tree;
use crate::object::types::ObjectId;

/// the output of one build
#[derive(Debug, Clone)]
pub struct BuiltTree {
    /// id of the root tree
    pub root: ObjectId,
    /// every tree produced, children before parents, root last
    pub trees: Vec<Tree>,
}

impl BuiltTree {
    pub fn root_tree(&self) -> Option<&Tree> {
        self.trees.last()
    }
}

/// build the directory hierarchy for `paths` (relative path -> blob id)
///
/// paths use `/` as the separator. An empty map yields a valid empty root;
/// rejecting empty commits is left to the caller.
pub fn build_tree_from_paths(paths: &BTreeMap<String, ObjectId>) -> ObjectResult<BuiltTree> {
    let mut builder = TreeBuilder::default();
    for (path, id) in paths {
        builder.insert(path, *id)?;
    }
    builder.finish()
}

/// directory key: "" for the root, otherwise the `/`-joined path
type DirKey = String;

#[derive(Default)]
struct TreeBuilder {
    files: BTreeMap<DirKey, BTreeMap<String, ObjectId>>,
    subdirs: BTreeMap<DirKey, BTreeSet<String>>,
}

impl TreeBuilder {
    fn insert(&mut self, path: &str, id: ObjectId) -> ObjectResult<()> {
        let components = split_path(path)?;
        let (file, dirs) = components
            .split_last()
            .ok_or_else(|| ObjectError::InvalidPath(path.to_string()))?;

        // register every ancestor so directories holding only
        // subdirectories are still reached from the root
        let mut parent = String::new();
        for dir in dirs {
            self.subdirs.entry(parent.clone()).or_default().insert(dir.to_string());
            parent = join(&parent, dir);
        }
        self.subdirs.entry(parent.clone()).or_default();

        self.files
            .entry(parent)
            .or_default()
            .insert(file.to_string(), id);
        Ok(())
    }

    fn finish(self) -> ObjectResult<BuiltTree> {
        let mut memo: BTreeMap<DirKey, ObjectId> = BTreeMap::new();
        let mut trees = Vec::new();
        let root = self.build_dir("", &mut memo, &mut trees)?;
        Ok(BuiltTree { root, trees })
    }

    fn build_dir(
        &self,
        dir: &str,
        memo: &mut BTreeMap<DirKey, ObjectId>,
        trees: &mut Vec<Tree>,
    ) -> ObjectResult<ObjectId> {
        if let Some(id) = memo.get(dir) {
            return Ok(*id);
        }

        let mut tree = Tree::new();

        if let Some(children) = self.subdirs.get(dir) {
            for child in children {
                let child_key = join(dir, child);
                let child_id = self.build_dir(&child_key, memo, trees)?;
                tree.add_directory(child.clone(), child_id);
            }
        }

        if let Some(files) = self.files.get(dir) {
            for (name, id) in files {
                if tree.get(name).is_some() {
                    return Err(ObjectError::PathConflict(join(dir, name)));
                }
                tree.add_file(name.clone(), *id);
            }
        }

        let id = tree.id();
        memo.insert(dir.to_string(), id);
        trees.push(tree);
        Ok(id)
    }
}

fn join(parent: &str, name: &str) -> String {
    if parent.is_empty() {
        name.to_string()
    } else {
        format!("{}/{}", parent, name)
    }
}

fn split_path(path: &str) -> ObjectResult<Vec<&str>> {
    let components: Vec<&str> = path.split('/').collect();
    let bad = components
        .iter()
        .any(|c| c.is_empty() || *c == "." || *c == ".." || c.contains('\0'));
    if bad {
        return Err(ObjectError::InvalidPath(path.to_string()));
    }
    Ok(components)
}
