//! Directory tree builder
//!
//! Consumes flat `(path, bytes)` entries, groups them into a directory
//! hierarchy and resolves every directory CID bottom-up.
//!
//! - File blocks are queued as soon as the file is added
//! - Directory blocks are queued in post-order, root last
//! - Sibling links are sorted by name, so the root CID only depends on
//!   the set of paths and contents, never on insertion order

use std::collections::HashMap;

use thiserror::Error;

use crate::cid::Cid;
use crate::codec::{encode_and_hash, DirLink};
use crate::types::{Block, SourceFile};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuilderError {
    #[error("Invalid path: {0:?}")]
    InvalidPath(String),
    #[error("Duplicate path: {0}")]
    DuplicatePath(String),
    #[error("Path conflicts with an existing file or directory: {0}")]
    PathConflict(String),
}

/// Index of a directory in the builder arena
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct DirId(usize);

#[derive(Debug, Clone)]
enum EntryKind {
    File { cid: Cid, size: u64 },
    Dir(DirId),
}

#[derive(Debug, Default)]
struct DirNode {
    entries: Vec<(String, EntryKind)>,
    by_name: HashMap<String, usize>,
}

impl DirNode {
    fn get(&self, name: &str) -> Option<&EntryKind> {
        self.by_name.get(name).map(|&i| &self.entries[i].1)
    }

    fn insert(&mut self, name: &str, kind: EntryKind) {
        self.by_name.insert(name.to_string(), self.entries.len());
        self.entries.push((name.to_string(), kind));
    }
}

/// Result of building a tree
#[derive(Debug, Clone)]
pub struct BuiltTree {
    /// CID of the root directory
    pub root: Cid,
    /// Cumulative DAG size of the root
    pub size: u64,
    /// Every block of the tree: files in input order, then directories
    /// bottom-up with the root last
    pub blocks: Vec<Block>,
}

/// TreeBuilder - builds a DAG-PB directory tree from flat file entries
#[derive(Debug)]
pub struct TreeBuilder {
    /// dirs[0] is the root; children are owned by exactly one parent
    dirs: Vec<DirNode>,
    blocks: Vec<Block>,
}

impl Default for TreeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

const ROOT: DirId = DirId(0);

/// Split a path into its non-empty segments
fn segments(path: &str) -> Result<Vec<&str>, BuilderError> {
    let mut out = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => continue,
            ".." => return Err(BuilderError::InvalidPath(path.to_string())),
            s => out.push(s),
        }
    }
    if out.is_empty() {
        return Err(BuilderError::InvalidPath(path.to_string()));
    }
    Ok(out)
}

impl TreeBuilder {
    pub fn new() -> Self {
        Self {
            dirs: vec![DirNode::default()],
            blocks: Vec::new(),
        }
    }

    /// Number of blocks queued so far
    pub fn queued(&self) -> usize {
        self.blocks.len()
    }

    /// Walk to the parent directory of `segments`' last element, creating
    /// directories on the way
    fn ensure_parent(&mut self, path: &str, segments: &[&str]) -> Result<DirId, BuilderError> {
        let mut current = ROOT;
        for segment in segments {
            let existing = self.dirs[current.0].get(segment).cloned();
            let next = match existing {
                Some(EntryKind::Dir(id)) => id,
                Some(EntryKind::File { .. }) => {
                    return Err(BuilderError::PathConflict(path.to_string()))
                }
                None => {
                    let id = DirId(self.dirs.len());
                    self.dirs.push(DirNode::default());
                    self.dirs[current.0].insert(segment, EntryKind::Dir(id));
                    id
                }
            };
            current = next;
        }
        Ok(current)
    }

    /// Add a file; its block is queued immediately
    /// Returns the file's CID
    pub fn add_file(&mut self, path: &str, content: Vec<u8>) -> Result<Cid, BuilderError> {
        let segments = segments(path)?;
        let (name, parents) = segments
            .split_last()
            .ok_or_else(|| BuilderError::InvalidPath(path.to_string()))?;

        let parent = self.ensure_parent(path, parents)?;
        match self.dirs[parent.0].get(name) {
            Some(EntryKind::File { .. }) => {
                return Err(BuilderError::DuplicatePath(path.to_string()))
            }
            Some(EntryKind::Dir(_)) => return Err(BuilderError::PathConflict(path.to_string())),
            None => {}
        }

        let block = Block::raw(content);
        let cid = block.cid;
        let size = block.len() as u64;
        self.dirs[parent.0].insert(name, EntryKind::File { cid, size });
        self.blocks.push(block);
        Ok(cid)
    }

    /// Resolve one directory, children first
    /// Returns (cid, cumulative size)
    fn resolve(&self, dir: DirId, blocks: &mut Vec<Block>) -> (Cid, u64) {
        let mut links = Vec::with_capacity(self.dirs[dir.0].entries.len());
        for (name, kind) in &self.dirs[dir.0].entries {
            let (cid, size) = match kind {
                EntryKind::File { cid, size } => (*cid, *size),
                EntryKind::Dir(child) => self.resolve(*child, blocks),
            };
            links.push(DirLink::new(name.clone(), cid, size));
        }
        links.sort_by(|a, b| a.name.as_bytes().cmp(b.name.as_bytes()));

        let (data, hash) = encode_and_hash(&links);
        let size = data.len() as u64 + links.iter().map(|l| l.size).sum::<u64>();
        let cid = Cid::directory(hash);
        blocks.push(Block::new(cid, data));
        (cid, size)
    }

    /// Resolve all directories and return the root CID with every block
    pub fn finish(mut self) -> BuiltTree {
        let mut blocks = std::mem::take(&mut self.blocks);
        let (root, size) = self.resolve(ROOT, &mut blocks);
        BuiltTree { root, size, blocks }
    }
}

/// Build a tree from a list of files
pub fn build_tree<I>(files: I) -> Result<BuiltTree, BuilderError>
where
    I: IntoIterator<Item = SourceFile>,
{
    let mut builder = TreeBuilder::new();
    for file in files {
        builder.add_file(&file.path, file.content)?;
    }
    Ok(builder.finish())
}
