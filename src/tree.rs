//! [`FileTree`]: the in-memory node graph plus the single exclusive lock
//! that serializes every metadata operation against it (spec.md 4.4, 5).
//!
//! A `FileTree` owns the *only* strong references to its [`File`]s, in a
//! central id-keyed table; every [`crate::directory::DirectoryTable`] entry
//! (including `.`/`..`) stores just the id. That indirection is what lets
//! this be a plain `HashMap` instead of something like the teacher
//! codebase's `whirlwind` concurrent map — all access already happens
//! behind one lock, so a concurrent map would buy nothing here.

use std::collections::HashMap;
use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::{Mutex, MutexGuard};

use crate::block::BlockPool;
use crate::error::{Error, Result};
use crate::file::{File, FileRef, IdAllocator};
use crate::path::Path;
use crate::path_type::PathType;

/// The tree's mutable state, guarded as one unit by [`FileTree`]'s lock.
/// Every operation in `crate::ops` acquires this once and holds it for the
/// operation's whole duration (spec.md 5, "single exclusive lock").
pub struct TreeState {
    pub roots: IndexMap<String, u64>,
    pub table: HashMap<u64, FileRef>,
    pub working_dir: Path,
}

impl TreeState {
    pub fn get(&self, id: u64) -> Option<&FileRef> {
        self.table.get(&id)
    }

    pub fn require(&self, id: u64, path_for_error: &str) -> Result<&FileRef> {
        self.table.get(&id).ok_or_else(|| Error::no_such_file(path_for_error.to_owned()))
    }

    /// Drops the tree's own reference to `id` if its link count has
    /// reached zero. The [`File`] itself survives as long as some other
    /// `FileRef` clone (e.g. an open channel) still exists.
    pub fn evict_if_unlinked(&mut self, id: u64) {
        let should_evict = matches!(self.table.get(&id), Some(file) if file.link_count() == 0);
        if should_evict {
            self.table.remove(&id);
        }
    }

    pub fn root_id(&self, root: &str) -> Option<u64> {
        self.roots.get(root).copied()
    }
}

pub struct FileTree {
    path_type: Arc<dyn PathType>,
    state: Mutex<TreeState>,
    id_alloc: IdAllocator,
    block_pool: Arc<BlockPool>,
}

impl FileTree {
    /// Builds a tree with one root directory per name in `root_names`
    /// (e.g. `["/"]` for Unix, `["C:\\"]` for Windows), with the working
    /// directory set to the first root.
    pub fn new(
        path_type: Arc<dyn PathType>,
        root_names: &[String],
        block_pool: Arc<BlockPool>,
    ) -> Result<FileTree> {
        if root_names.is_empty() {
            return Err(Error::invalid_argument("a file tree needs at least one root".to_owned()));
        }
        let id_alloc = IdAllocator::new();
        let mut roots = IndexMap::new();
        let mut table = HashMap::new();
        for root in root_names {
            let id = id_alloc.next_id();
            table.insert(id, Arc::new(File::new_directory(id, id, block_pool.clone())));
            roots.insert(root.clone(), id);
        }
        let working_dir = Path::from_parts(path_type.clone(), Some(root_names[0].clone()), Vec::new());
        Ok(FileTree { path_type, state: Mutex::new(TreeState { roots, table, working_dir }), id_alloc, block_pool })
    }

    pub fn path_type(&self) -> &Arc<dyn PathType> {
        &self.path_type
    }

    pub fn block_pool(&self) -> &Arc<BlockPool> {
        &self.block_pool
    }

    pub fn next_id(&self) -> u64 {
        self.id_alloc.next_id()
    }

    /// Acquires the tree lock. Every multi-step operation in `crate::ops`
    /// takes this once for its whole duration, not per-lookup-step.
    pub fn lock(&self) -> MutexGuard<'_, TreeState> {
        self.state.lock()
    }

    pub fn working_directory(&self) -> Path {
        self.lock().working_dir.clone()
    }

    pub fn set_working_directory(&self, path: Path) {
        self.lock().working_dir = path;
    }

    pub fn insert_file(&self, state: &mut TreeState, file: File) -> FileRef {
        let id = file.id();
        let file_ref = Arc::new(file);
        state.table.insert(id, file_ref.clone());
        file_ref
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path_type::UnixPathType;

    fn tree() -> FileTree {
        FileTree::new(Arc::new(UnixPathType), &["/".to_owned()], Arc::new(BlockPool::new(512, 4096))).unwrap()
    }

    #[test]
    fn new_tree_has_one_root_directory() {
        let t = tree();
        let state = t.lock();
        let root_id = state.root_id("/").unwrap();
        let root = state.get(root_id).unwrap();
        assert!(root.is_directory());
        assert_eq!(root.link_count(), 2);
    }

    #[test]
    fn working_directory_defaults_to_first_root() {
        let t = tree();
        assert_eq!(t.working_directory().root(), Some("/"));
    }

    #[test]
    fn ids_are_unique_and_increasing() {
        let t = tree();
        let a = t.next_id();
        let b = t.next_id();
        assert!(b > a);
    }
}
