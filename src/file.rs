//! [`File`]: the node every directory entry ultimately points to — what the
//! design notes call a file's "key" or inode (spec.md 4.3, 9). A `File` is
//! always owned through a [`FileRef`] held by its [`crate::tree::FileTree`];
//! directory tables store only numeric ids, not `FileRef` clones, so that a
//! directory's `.` entry pointing at itself (and `..` at its parent) never
//! forms a reference cycle. An open [`crate::channel::FileChannel`] holds
//! its own `FileRef` clone, which is what lets spec.md 4.5's "delete while
//! open" case keep working: once the tree drops its own clone the object
//! survives exactly as long as something else still references it, and its
//! blocks are released the moment the last reference goes away.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::SystemTime;

use indexmap::IndexMap;
use parking_lot::{Mutex, RwLock};

use crate::attr::AttrValue;
use crate::block::BlockPool;
use crate::byte_store::ByteStore;
use crate::directory::DirectoryTable;
use crate::path::Path;

pub type FileRef = Arc<File>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileType {
    Directory,
    Regular,
    Symlink,
}

enum Kind {
    Directory(RwLock<DirectoryTable>),
    Regular(RwLock<ByteStore>),
    Symlink(Path),
}

struct Times {
    created: SystemTime,
    last_access: SystemTime,
    last_modified: SystemTime,
}

/// A file system node: a directory table, a regular file's byte content, or
/// a symbolic link's target path, plus the metadata common to all three.
pub struct File {
    id: u64,
    kind: Kind,
    link_count: AtomicU64,
    times: Mutex<Times>,
    attributes: Mutex<IndexMap<String, AttrValue>>,
}

impl File {
    /// Builds a new directory whose table already contains `.` (pointing at
    /// `id`) and `..` (pointing at `parent_id`) — pass `id` for both on the
    /// root directory, whose parent is itself (spec.md 4.4).
    pub fn new_directory(id: u64, parent_id: u64, _pool: Arc<BlockPool>) -> File {
        File {
            id,
            kind: Kind::Directory(RwLock::new(DirectoryTable::new(id, parent_id))),
            link_count: AtomicU64::new(2),
            times: Mutex::new(Times::now()),
            attributes: Mutex::new(IndexMap::new()),
        }
    }

    pub fn new_regular(id: u64, pool: Arc<BlockPool>) -> File {
        File {
            id,
            kind: Kind::Regular(RwLock::new(ByteStore::new(pool))),
            link_count: AtomicU64::new(1),
            times: Mutex::new(Times::now()),
            attributes: Mutex::new(IndexMap::new()),
        }
    }

    pub fn new_symlink(id: u64, target: Path) -> File {
        File {
            id,
            kind: Kind::Symlink(target),
            link_count: AtomicU64::new(1),
            times: Mutex::new(Times::now()),
            attributes: Mutex::new(IndexMap::new()),
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn file_type(&self) -> FileType {
        match &self.kind {
            Kind::Directory(_) => FileType::Directory,
            Kind::Regular(_) => FileType::Regular,
            Kind::Symlink(_) => FileType::Symlink,
        }
    }

    pub fn is_directory(&self) -> bool {
        matches!(self.kind, Kind::Directory(_))
    }

    pub fn as_directory(&self) -> Option<&RwLock<DirectoryTable>> {
        match &self.kind {
            Kind::Directory(table) => Some(table),
            _ => None,
        }
    }

    pub fn as_regular(&self) -> Option<&RwLock<ByteStore>> {
        match &self.kind {
            Kind::Regular(store) => Some(store),
            _ => None,
        }
    }

    pub fn as_symlink(&self) -> Option<&Path> {
        match &self.kind {
            Kind::Symlink(target) => Some(target),
            _ => None,
        }
    }

    /// Current logical size: directories and symlinks report `0`.
    pub fn size(&self) -> u64 {
        match &self.kind {
            Kind::Regular(store) => store.read().size(),
            Kind::Directory(_) | Kind::Symlink(_) => 0,
        }
    }

    pub fn link_count(&self) -> u64 {
        self.link_count.load(Ordering::Relaxed)
    }

    pub fn increment_link_count(&self) {
        self.link_count.fetch_add(1, Ordering::Relaxed);
    }

    /// Decrements the link count and returns the new value. The caller
    /// (`crate::tree::FileTree`, already holding the tree lock) is
    /// responsible for evicting this id from the central table once the
    /// count reaches zero.
    pub fn decrement_link_count(&self) -> u64 {
        self.link_count.fetch_sub(1, Ordering::Relaxed) - 1
    }

    pub fn created(&self) -> SystemTime {
        self.times.lock().created
    }

    pub fn last_access(&self) -> SystemTime {
        self.times.lock().last_access
    }

    pub fn last_modified(&self) -> SystemTime {
        self.times.lock().last_modified
    }

    pub fn set_created(&self, time: SystemTime) {
        self.times.lock().created = time;
    }

    pub fn set_last_access(&self, time: SystemTime) {
        self.times.lock().last_access = time;
    }

    pub fn set_last_modified(&self, time: SystemTime) {
        self.times.lock().last_modified = time;
    }

    pub fn touch_access(&self) {
        self.times.lock().last_access = SystemTime::now();
    }

    pub fn touch_modified(&self) {
        let mut times = self.times.lock();
        times.last_modified = SystemTime::now();
        times.last_access = times.last_modified;
    }

    pub fn attributes(&self) -> parking_lot::MutexGuard<'_, IndexMap<String, AttrValue>> {
        self.attributes.lock()
    }

    pub fn attributes_mut(&self) -> parking_lot::MutexGuard<'_, IndexMap<String, AttrValue>> {
        self.attributes.lock()
    }

    pub fn attribute_keys(&self) -> Vec<String> {
        self.attributes.lock().keys().cloned().collect()
    }
}

impl Times {
    fn now() -> Times {
        let now = SystemTime::now();
        Times { created: now, last_access: now, last_modified: now }
    }
}

/// Monotonically increasing file-id allocator shared by a single
/// [`crate::tree::FileTree`].
pub struct IdAllocator {
    next: AtomicU64,
}

impl IdAllocator {
    pub fn new() -> IdAllocator {
        IdAllocator { next: AtomicU64::new(0) }
    }

    pub fn next_id(&self) -> u64 {
        self.next.fetch_add(1, Ordering::Relaxed)
    }
}

impl Default for IdAllocator {
    fn default() -> IdAllocator {
        IdAllocator::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pool() -> Arc<BlockPool> {
        Arc::new(BlockPool::new(64, 1024))
    }

    #[test]
    fn new_directory_starts_with_link_count_two() {
        let file = File::new_directory(1, 1, pool());
        assert_eq!(file.link_count(), 2);
        assert!(file.is_directory());
    }

    #[test]
    fn new_regular_starts_with_link_count_one_and_zero_size() {
        let file = File::new_regular(2, pool());
        assert_eq!(file.link_count(), 1);
        assert_eq!(file.size(), 0);
    }

    #[test]
    fn decrement_link_count_reaches_zero() {
        let file = File::new_regular(3, pool());
        assert_eq!(file.decrement_link_count(), 0);
    }

    #[test]
    fn id_allocator_increments() {
        let ids = IdAllocator::new();
        assert_eq!(ids.next_id(), 0);
        assert_eq!(ids.next_id(), 1);
    }
}
