//! [`DirectoryTable`]: a directory's name-to-file-id mapping (spec.md 4.3,
//! 4.4). Entries store the numeric file id rather than a [`crate::file::FileRef`]
//! so that the reserved `.` (self) and `..` (parent) entries never hold a
//! strong reference back into the tree — see [`crate::file`] for why that
//! matters. Iteration order follows insertion order (`indexmap`), matching
//! the stable `read_dir` ordering spec.md 4.4 asks for.

use indexmap::IndexMap;

use crate::error::{Error, Result};
use crate::name::Name;

/// Ordered name-to-file-id mapping for one directory.
pub struct DirectoryTable {
    entries: IndexMap<Name, u64>,
}

impl DirectoryTable {
    /// Builds a table pre-populated with `.` -> `self_id` and
    /// `..` -> `parent_id`. Pass the same id for both to build the root
    /// directory, whose parent is itself.
    pub fn new(self_id: u64, parent_id: u64) -> DirectoryTable {
        let mut entries = IndexMap::new();
        entries.insert(Name::self_name(), self_id);
        entries.insert(Name::parent_name(), parent_id);
        DirectoryTable { entries }
    }

    pub fn get(&self, name: &Name) -> Option<u64> {
        self.entries.get(name).copied()
    }

    /// Adds `name -> id`; fails with [`Error::FileExists`] if already
    /// occupied (callers are responsible for pre-checking when they want
    /// different behavior, e.g. `move` with `REPLACE_EXISTING`).
    pub fn insert(&mut self, name: Name, id: u64) -> Result<()> {
        if self.entries.contains_key(&name) {
            return Err(Error::file_exists(name.display().to_owned()));
        }
        self.entries.insert(name, id);
        Ok(())
    }

    /// Overwrites `name -> id` unconditionally, used by `move`'s
    /// `REPLACE_EXISTING` path.
    pub fn replace(&mut self, name: Name, id: u64) {
        self.entries.insert(name, id);
    }

    /// Removes `name`, returning its id. `.`/`..` can never be removed.
    pub fn remove(&mut self, name: &Name) -> Option<u64> {
        if name.is_dot_or_dot_dot() {
            return None;
        }
        self.entries.shift_remove(name)
    }

    pub fn set_parent(&mut self, parent_id: u64) {
        self.entries.insert(Name::parent_name(), parent_id);
    }

    pub fn self_id(&self) -> u64 {
        *self.entries.get(&Name::self_name()).expect("`.` entry always present")
    }

    pub fn parent_id(&self) -> u64 {
        *self.entries.get(&Name::parent_name()).expect("`..` entry always present")
    }

    /// Whether the directory has any entries besides `.` and `..`.
    pub fn is_empty(&self) -> bool {
        self.entries.len() <= 2
    }

    /// Number of real entries, excluding `.` and `..`.
    pub fn len(&self) -> usize {
        self.entries.len() - 2
    }

    /// Iterates real entries in insertion order, skipping `.` and `..`.
    pub fn iter(&self) -> impl Iterator<Item = (&Name, u64)> {
        self.entries.iter().filter(|(name, _)| !name.is_dot_or_dot_dot()).map(|(name, &id)| (name, id))
    }

    /// Number of subdirectory entries among the real entries — not tracked
    /// here directly; callers (`crate::tree::FileTree`) determine this by
    /// checking each entry's file type, since that requires resolving ids
    /// through the central table.
    pub fn names(&self) -> impl Iterator<Item = &Name> {
        self.iter().map(|(name, _)| name)
    }
}
