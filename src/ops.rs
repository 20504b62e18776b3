//! The file system operations (spec.md 4.5): create, delete, link, move,
//! copy, and the directory/attribute reads built on top of
//! [`crate::lookup`] and [`crate::tree::FileTree`]. Each function takes
//! the tree lock once and holds it for its entire body, so a caller never
//! observes a partially applied create/delete/move/copy (spec.md 5).

use std::sync::Arc;

use crate::attr::{AttrValue, AttributeRegistry};
use crate::config::Features;
use crate::error::{Error, Result};
use crate::file::{File, FileType};
use crate::lookup::{self, Resolution};
use crate::name::Name;
use crate::path::Path;
use crate::tree::{FileTree, TreeState};

/// One entry as reported by [`read_directory`].
#[derive(Debug, Clone)]
pub struct DirEntry {
    pub name: String,
    pub file_type: FileType,
}

pub fn create_file(tree: &FileTree, attrs: &AttributeRegistry, path: &Path) -> Result<u64> {
    let mut state = tree.lock();
    let (parent_id, name) = lookup::resolve_parent(&state, path)?;
    insert_new(&mut state, tree, attrs, parent_id, name, |id, pool| File::new_regular(id, pool))
}

pub fn create_directory(tree: &FileTree, attrs: &AttributeRegistry, path: &Path) -> Result<u64> {
    let mut state = tree.lock();
    let (parent_id, name) = lookup::resolve_parent(&state, path)?;
    let id = insert_new(&mut state, tree, attrs, parent_id, name, |id, pool| File::new_directory(id, parent_id, pool))?;
    state.require(parent_id, &path.display())?.increment_link_count();
    Ok(id)
}

pub fn create_symbolic_link(
    tree: &FileTree,
    attrs: &AttributeRegistry,
    features: Features,
    path: &Path,
    target: Path,
) -> Result<u64> {
    if !features.contains(Features::SYMBOLIC_LINKS) {
        return Err(Error::unsupported("symbolic links are disabled for this file system".to_owned()));
    }
    let mut state = tree.lock();
    let (parent_id, name) = lookup::resolve_parent(&state, path)?;
    insert_new(&mut state, tree, attrs, parent_id, name, move |id, _pool| File::new_symlink(id, target))
}

/// Shared insert-then-link sequence: allocate an id, build the file,
/// initialize its attributes, insert it into the tree's table, then link
/// it into the parent directory — rolling the table insert back if the
/// name is already taken, so the whole call is atomic from the caller's
/// perspective.
fn insert_new(
    state: &mut TreeState,
    tree: &FileTree,
    attrs: &AttributeRegistry,
    parent_id: u64,
    name: Name,
    build: impl FnOnce(u64, Arc<crate::block::BlockPool>) -> File,
) -> Result<u64> {
    let id = tree.next_id();
    let file = build(id, tree.block_pool().clone());
    attrs.initialize_all(&file);
    tree.insert_file(state, file);

    let parent = state.require(parent_id, "<parent>")?;
    let dir = parent.as_directory().ok_or_else(|| Error::not_directory(format!("file {parent_id}")))?;
    if let Err(e) = dir.write().insert(name, id) {
        state.table.remove(&id);
        return Err(e);
    }
    Ok(id)
}

pub fn create_link(tree: &FileTree, features: Features, path: &Path, existing: &Path) -> Result<()> {
    if !features.contains(Features::HARD_LINKS) {
        return Err(Error::unsupported("hard links are disabled for this file system".to_owned()));
    }
    let mut state = tree.lock();
    let target = lookup::resolve(&state, existing, false)?;
    let target_file = state.require(target.file_id, &existing.display())?;
    if target_file.is_directory() {
        return Err(Error::unsupported("cannot create a hard link to a directory".to_owned()));
    }

    let (parent_id, name) = lookup::resolve_parent(&state, path)?;
    let parent = state.require(parent_id, "<parent>")?;
    let dir = parent.as_directory().ok_or_else(|| Error::not_directory(format!("file {parent_id}")))?;
    dir.write().insert(name, target.file_id)?;
    state.require(target.file_id, &existing.display())?.increment_link_count();
    Ok(())
}

pub fn delete(tree: &FileTree, path: &Path) -> Result<()> {
    let mut state = tree.lock();
    let (parent_id, name) = lookup::resolve_parent(&state, path)?;
    unlink(&mut state, parent_id, &name, None)
}

/// Removes `name` from `parent_id`'s directory table, adjusting link
/// counts and evicting the target from the central table once unlinked.
/// When `expect_directory` is `Some`, the existing entry must be a
/// directory iff the flag is true (used by `move`/`copy` replacement),
/// and a non-empty directory is refused with [`Error::DirectoryNotEmpty`].
fn unlink(state: &mut TreeState, parent_id: u64, name: &Name, expect_directory: Option<bool>) -> Result<()> {
    let target_id = {
        let parent = state.require(parent_id, "<parent>")?;
        let dir = parent.as_directory().ok_or_else(|| Error::not_directory(format!("file {parent_id}")))?;
        match dir.read().get(name) {
            Some(id) => id,
            None if expect_directory.is_some() => return Ok(()),
            None => return Err(Error::no_such_file(name.display().to_owned())),
        }
    };

    let target_file = state.require(target_id, "<entry>")?;
    if let Some(want_directory) = expect_directory {
        if target_file.is_directory() != want_directory {
            return Err(Error::invalid_argument(
                "cannot replace a directory with a non-directory or vice versa".to_owned(),
            ));
        }
    }
    if target_file.is_directory() && !target_file.as_directory().expect("checked above").read().is_empty() {
        return Err(Error::directory_not_empty(name.display().to_owned()));
    }

    state.require(parent_id, "<parent>")?.as_directory().expect("checked above").write().remove(name);
    let is_dir = target_file.is_directory();
    let mut remaining = target_file.decrement_link_count();
    if is_dir {
        // The removed directory entry was the only thing keeping this
        // directory's own `.` self-reference meaningful (it's already
        // empty, so it has no subdirectories left either) — drop both at
        // once, or `link_count` never reaches zero and the directory
        // leaks in `TreeState::table` forever.
        remaining = target_file.decrement_link_count();
        state.require(parent_id, "<parent>")?.decrement_link_count();
    }
    if remaining == 0 {
        state.evict_if_unlinked(target_id);
    }
    Ok(())
}

/// True if `ancestor_id` is `start_id` itself or a directory somewhere
/// above it, walking `..` links. Used to refuse moving a directory into
/// its own subtree.
fn is_ancestor(state: &TreeState, ancestor_id: u64, start_id: u64) -> bool {
    let mut current = start_id;
    loop {
        if current == ancestor_id {
            return true;
        }
        let Some(file) = state.get(current) else { return false };
        let Some(dir) = file.as_directory() else { return false };
        let parent_id = dir.read().parent_id();
        if parent_id == current {
            return false;
        }
        current = parent_id;
    }
}

pub fn r#move(tree: &FileTree, from: &Path, to: &Path, replace_existing: bool) -> Result<()> {
    let mut state = tree.lock();
    let (from_parent_id, from_name) = lookup::resolve_parent(&state, from)?;
    let (to_parent_id, to_name) = lookup::resolve_parent(&state, to)?;

    let moved_id = {
        let from_parent = state.require(from_parent_id, &from.display())?;
        let dir = from_parent.as_directory().ok_or_else(|| Error::not_directory(from.display()))?;
        dir.read().get(&from_name).ok_or_else(|| Error::no_such_file(from.display()))?
    };
    let moved_is_directory = state.require(moved_id, &from.display())?.is_directory();
    if moved_is_directory && is_ancestor(&state, moved_id, to_parent_id) {
        return Err(Error::invalid_argument("cannot move a directory into its own subtree".to_owned()));
    }

    let destination_occupied = {
        let to_parent = state.require(to_parent_id, &to.display())?;
        let dir = to_parent.as_directory().ok_or_else(|| Error::not_directory(to.display()))?;
        dir.read().get(&to_name)
    };
    if let Some(dest_id) = destination_occupied {
        if dest_id == moved_id {
            return Ok(());
        }
        if !replace_existing {
            return Err(Error::file_exists(to.display()));
        }
        unlink(&mut state, to_parent_id, &to_name, Some(moved_is_directory))?;
    }

    state.require(from_parent_id, &from.display())?.as_directory().expect("checked above").write().remove(&from_name);
    state
        .require(to_parent_id, &to.display())?
        .as_directory()
        .ok_or_else(|| Error::not_directory(to.display()))?
        .write()
        .replace(to_name, moved_id);

    if from_parent_id != to_parent_id && moved_is_directory {
        state.require(moved_id, &from.display())?.as_directory().expect("checked above").write().set_parent(to_parent_id);
        state.require(from_parent_id, &from.display())?.decrement_link_count();
        state.require(to_parent_id, &to.display())?.increment_link_count();
    }
    Ok(())
}

pub fn copy(
    tree: &FileTree,
    attrs: &AttributeRegistry,
    from: &Path,
    to: &Path,
    replace_existing: bool,
    copy_attributes: bool,
) -> Result<u64> {
    let mut state = tree.lock();
    let source = lookup::resolve(&state, from, false)?;
    let (to_parent_id, to_name) = lookup::resolve_parent(&state, to)?;

    let source_file_type = state.require(source.file_id, &from.display())?.file_type();
    let destination_occupied = {
        let to_parent = state.require(to_parent_id, &to.display())?;
        let dir = to_parent.as_directory().ok_or_else(|| Error::not_directory(to.display()))?;
        dir.read().get(&to_name)
    };
    if let Some(dest_id) = destination_occupied {
        if !replace_existing {
            return Err(Error::file_exists(to.display()));
        }
        unlink(&mut state, to_parent_id, &to_name, Some(source_file_type == FileType::Directory))?;
    }

    let id = tree.next_id();
    let new_file = copy_kind(&state, source.file_id, id, to_parent_id, tree, from)?;
    if copy_attributes {
        let copied = state.require(source.file_id, &from.display())?.attributes().clone();
        *new_file.attributes_mut() = copied;
    } else {
        attrs.initialize_all(&new_file);
    }
    tree.insert_file(&mut state, new_file);

    let to_parent = state.require(to_parent_id, &to.display())?;
    let dir = to_parent.as_directory().ok_or_else(|| Error::not_directory(to.display()))?;
    if let Err(e) = dir.write().insert(to_name, id) {
        state.table.remove(&id);
        return Err(e);
    }
    if source_file_type == FileType::Directory {
        state.require(to_parent_id, &to.display())?.increment_link_count();
    }
    Ok(id)
}

/// Builds the copy's `File` payload per kind: a directory copy is
/// non-recursive (an empty directory with the same name, per spec.md 4.5a
/// — callers that want a recursive copy walk the tree themselves and call
/// `copy` per entry), a regular file's bytes are deep-copied, and a
/// symbolic link's target string is copied verbatim rather than followed.
fn copy_kind(
    state: &TreeState,
    source_id: u64,
    new_id: u64,
    new_parent_id: u64,
    tree: &FileTree,
    from: &Path,
) -> Result<File> {
    let source = state.require(source_id, &from.display())?;
    Ok(match source.file_type() {
        FileType::Directory => File::new_directory(new_id, new_parent_id, tree.block_pool().clone()),
        FileType::Regular => {
            let copied_store = source.as_regular().expect("checked above").read().deep_copy();
            let file = File::new_regular(new_id, tree.block_pool().clone());
            *file.as_regular().expect("just built as regular").write() = copied_store;
            file
        }
        FileType::Symlink => File::new_symlink(new_id, source.as_symlink().expect("checked above").clone()),
    })
}

/// Opens `path` as a byte channel, creating a new regular file when
/// `create` is set and nothing exists there yet (spec.md 6a). When
/// `create_new` is also set, an existing target is refused with
/// [`Error::FileExists`] instead of being reused (spec.md 4.5's
/// `CREATE_NEW` option) — `create_new` only has an effect when `create`
/// is also set, matching a plain create-if-missing call with nothing
/// extra to refuse.
pub fn open_channel(
    tree: &FileTree,
    attrs: &AttributeRegistry,
    path: &Path,
    readable: bool,
    writable: bool,
    create: bool,
    create_new: bool,
    truncate: bool,
    append: bool,
) -> Result<crate::channel::FileChannel> {
    let mut state = tree.lock();
    let file = match lookup::resolve(&state, path, true) {
        Ok(resolution) => {
            if create && create_new {
                return Err(Error::file_exists(path.display()));
            }
            let file = state.require(resolution.file_id, &path.display())?;
            if file.is_directory() {
                return Err(Error::is_directory(path.display()));
            }
            file.clone()
        }
        Err(Error::NoSuchFile { .. }) if create => {
            let (parent_id, name) = lookup::resolve_parent(&state, path)?;
            let id = insert_new(&mut state, tree, attrs, parent_id, name, |id, pool| File::new_regular(id, pool))?;
            state.require(id, &path.display())?.clone()
        }
        Err(e) => return Err(e),
    };

    if truncate {
        if let Some(store) = file.as_regular() {
            store.write().truncate(0);
        }
    }
    Ok(crate::channel::FileChannel::new(file, readable, writable, append))
}

pub fn read_directory(tree: &FileTree, path: &Path) -> Result<Vec<DirEntry>> {
    let state = tree.lock();
    let resolution = lookup::resolve(&state, path, true)?;
    let file = state.require(resolution.file_id, &path.display())?;
    let dir = file.as_directory().ok_or_else(|| Error::not_directory(path.display()))?;
    let mut entries = Vec::new();
    for (name, id) in dir.read().iter() {
        if let Some(entry_file) = state.get(id) {
            entries.push(DirEntry { name: name.display().to_owned(), file_type: entry_file.file_type() });
        }
    }
    Ok(entries)
}

pub fn read_symbolic_link(tree: &FileTree, path: &Path) -> Result<Path> {
    let state = tree.lock();
    let resolution = lookup::resolve(&state, path, false)?;
    let file = state.require(resolution.file_id, &path.display())?;
    file.as_symlink().cloned().ok_or_else(|| Error::invalid_argument(format!("{} is not a symbolic link", path.display())))
}

pub fn exists(tree: &FileTree, path: &Path, follow_symlinks: bool) -> bool {
    let state = tree.lock();
    lookup::resolve(&state, path, follow_symlinks).is_ok()
}

pub fn resolve_for_open(tree: &FileTree, path: &Path) -> Result<Resolution> {
    let state = tree.lock();
    lookup::resolve(&state, path, true)
}

pub fn get_attribute(tree: &FileTree, attrs: &AttributeRegistry, path: &Path, key: &str) -> Result<AttrValue> {
    let state = tree.lock();
    let resolution = lookup::resolve(&state, path, true)?;
    let file = state.require(resolution.file_id, &path.display())?;
    attrs.get(file, key)
}

pub fn set_attribute(
    tree: &FileTree,
    attrs: &AttributeRegistry,
    path: &Path,
    key: &str,
    value: AttrValue,
) -> Result<()> {
    let state = tree.lock();
    let resolution = lookup::resolve(&state, path, true)?;
    let file = state.require(resolution.file_id, &path.display())?;
    attrs.set_any(file, key, value)
}

pub fn read_attribute_view(
    tree: &FileTree,
    attrs: &AttributeRegistry,
    path: &Path,
    view: &str,
) -> Result<std::collections::HashMap<String, AttrValue>> {
    let state = tree.lock();
    let resolution = lookup::resolve(&state, path, true)?;
    let file = state.require(resolution.file_id, &path.display())?;
    attrs.read_view(file, view)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::BlockPool;
    use crate::path_type::UnixPathType;
    use std::sync::Arc as StdArc;

    fn tree() -> FileTree {
        FileTree::new(StdArc::new(UnixPathType), &["/".to_owned()], StdArc::new(BlockPool::new(64, 4096))).unwrap()
    }

    fn registry() -> AttributeRegistry {
        AttributeRegistry::with_views(&["unix"])
    }

    fn path(tree: &FileTree, s: &str) -> Path {
        Path::parse(tree.path_type().clone(), s, &[]).unwrap()
    }

    #[test]
    fn create_then_exists() {
        let tree = tree();
        let attrs = registry();
        create_file(&tree, &attrs, &path(&tree, "/a.txt")).unwrap();
        assert!(exists(&tree, &path(&tree, "/a.txt"), true));
    }

    #[test]
    fn create_duplicate_fails() {
        let tree = tree();
        let attrs = registry();
        create_file(&tree, &attrs, &path(&tree, "/a.txt")).unwrap();
        assert!(create_file(&tree, &attrs, &path(&tree, "/a.txt")).is_err());
    }

    #[test]
    fn create_directory_increments_parent_link_count() {
        let tree = tree();
        let attrs = registry();
        let root_id = tree.lock().root_id("/").unwrap();
        assert_eq!(tree.lock().get(root_id).unwrap().link_count(), 2);
        create_directory(&tree, &attrs, &path(&tree, "/sub")).unwrap();
        assert_eq!(tree.lock().get(root_id).unwrap().link_count(), 3);
    }

    #[test]
    fn delete_nonempty_directory_fails() {
        let tree = tree();
        let attrs = registry();
        create_directory(&tree, &attrs, &path(&tree, "/sub")).unwrap();
        create_file(&tree, &attrs, &path(&tree, "/sub/f.txt")).unwrap();
        assert!(delete(&tree, &path(&tree, "/sub")).is_err());
    }

    #[test]
    fn delete_then_recreate() {
        let tree = tree();
        let attrs = registry();
        create_file(&tree, &attrs, &path(&tree, "/a.txt")).unwrap();
        delete(&tree, &path(&tree, "/a.txt")).unwrap();
        assert!(!exists(&tree, &path(&tree, "/a.txt"), true));
        create_file(&tree, &attrs, &path(&tree, "/a.txt")).unwrap();
        assert!(exists(&tree, &path(&tree, "/a.txt"), true));
    }

    #[test]
    fn deleting_empty_directory_evicts_it_from_the_tree() {
        let tree = tree();
        let attrs = registry();
        let id = create_directory(&tree, &attrs, &path(&tree, "/sub")).unwrap();
        delete(&tree, &path(&tree, "/sub")).unwrap();
        assert!(tree.lock().get(id).is_none());
    }

    #[test]
    fn hard_link_shares_content_and_bumps_link_count() {
        let tree = tree();
        let attrs = registry();
        let features = Features::all();
        let id = create_file(&tree, &attrs, &path(&tree, "/a.txt")).unwrap();
        create_link(&tree, features, &path(&tree, "/b.txt"), &path(&tree, "/a.txt")).unwrap();
        assert_eq!(tree.lock().get(id).unwrap().link_count(), 2);
        delete(&tree, &path(&tree, "/a.txt")).unwrap();
        assert!(exists(&tree, &path(&tree, "/b.txt"), true));
    }

    #[test]
    fn move_to_new_name_within_same_directory() {
        let tree = tree();
        let attrs = registry();
        create_file(&tree, &attrs, &path(&tree, "/a.txt")).unwrap();
        r#move(&tree, &path(&tree, "/a.txt"), &path(&tree, "/b.txt"), false).unwrap();
        assert!(!exists(&tree, &path(&tree, "/a.txt"), true));
        assert!(exists(&tree, &path(&tree, "/b.txt"), true));
    }

    #[test]
    fn move_refuses_directory_into_its_own_subtree() {
        let tree = tree();
        let attrs = registry();
        create_directory(&tree, &attrs, &path(&tree, "/sub")).unwrap();
        create_directory(&tree, &attrs, &path(&tree, "/sub/child")).unwrap();
        assert!(r#move(&tree, &path(&tree, "/sub"), &path(&tree, "/sub/child/moved"), false).is_err());
    }

    #[test]
    fn copy_directory_is_shallow() {
        let tree = tree();
        let attrs = registry();
        create_directory(&tree, &attrs, &path(&tree, "/sub")).unwrap();
        create_file(&tree, &attrs, &path(&tree, "/sub/f.txt")).unwrap();
        copy(&tree, &attrs, &path(&tree, "/sub"), &path(&tree, "/copy"), false, false).unwrap();
        assert!(exists(&tree, &path(&tree, "/copy"), true));
        assert!(!exists(&tree, &path(&tree, "/copy/f.txt"), true));
    }

    #[test]
    fn copy_regular_file_is_independent() {
        let tree = tree();
        let attrs = registry();
        create_file(&tree, &attrs, &path(&tree, "/a.txt")).unwrap();
        copy(&tree, &attrs, &path(&tree, "/a.txt"), &path(&tree, "/b.txt"), false, false).unwrap();
        delete(&tree, &path(&tree, "/a.txt")).unwrap();
        assert!(exists(&tree, &path(&tree, "/b.txt"), true));
    }

    #[test]
    fn open_channel_create_new_fails_when_target_exists() {
        let tree = tree();
        let attrs = registry();
        create_file(&tree, &attrs, &path(&tree, "/a.txt")).unwrap();
        let result = open_channel(&tree, &attrs, &path(&tree, "/a.txt"), true, true, true, true, false, false);
        assert!(matches!(result, Err(Error::FileExists { .. })));
    }

    #[test]
    fn open_channel_create_new_succeeds_when_target_is_missing() {
        let tree = tree();
        let attrs = registry();
        open_channel(&tree, &attrs, &path(&tree, "/a.txt"), true, true, true, true, false, false).unwrap();
        assert!(exists(&tree, &path(&tree, "/a.txt"), true));
    }

    #[test]
    fn symlink_read_back_target() {
        let tree = tree();
        let attrs = registry();
        let features = Features::all();
        create_symbolic_link(&tree, &attrs, features, &path(&tree, "/link"), path(&tree, "/a.txt")).unwrap();
        let target = read_symbolic_link(&tree, &path(&tree, "/link")).unwrap();
        assert_eq!(target, path(&tree, "/a.txt"));
    }
}
