//! Path traversal (spec.md 4.4): walks a parsed, absolute [`Path`] through
//! [`crate::directory::DirectoryTable`]s, expanding symbolic links as it
//! goes. `.` and `..` need no special-casing here — every
//! [`crate::directory::DirectoryTable`] already carries real `.`/`..`
//! entries, so looking either up is just an ordinary table lookup.

use std::collections::VecDeque;

use crate::error::{Error, Result};
use crate::name::Name;
use crate::path::Path;
use crate::tree::TreeState;

/// Symbolic links nested deeper than this fail with
/// [`Error::TooManyLinks`], guarding against cycles (spec.md 4.4).
const MAX_LINK_DEPTH: u32 = 40;

/// The outcome of resolving a path: the target file's id, its containing
/// directory's id, and the name under which it was found in that
/// directory (the name actually looked up last, after any symlink
/// expansion — not necessarily `path`'s own last name).
pub struct Resolution {
    pub file_id: u64,
    pub parent_id: u64,
    pub name: Name,
}

/// Resolves `path` (which must be absolute) against `state`. When
/// `follow_final_symlink` is true and the last component is a symlink, it
/// is expanded too; otherwise the symlink file itself is the result.
pub fn resolve(state: &TreeState, path: &Path, follow_final_symlink: bool) -> Result<Resolution> {
    let root = path.root().ok_or_else(|| Error::invalid_argument("lookup requires an absolute path".to_owned()))?;
    let mut current_id =
        state.root_id(root).ok_or_else(|| Error::no_such_file(format!("unknown root {root:?}")))?;
    let mut parent_id = current_id;
    let mut last_name = Name::self_name();
    let mut queue: VecDeque<Name> = path.names().iter().cloned().collect();
    let mut link_depth = 0u32;

    while let Some(name) = queue.pop_front() {
        let is_last = queue.is_empty();

        let current_file = state.require(current_id, &path.display())?;
        let dir = current_file
            .as_directory()
            .ok_or_else(|| Error::not_directory(path.display()))?;
        let next_id = dir
            .read()
            .get(&name)
            .ok_or_else(|| Error::no_such_file(format!("{}{}", path.display(), name.display())))?;

        let next_file = state.require(next_id, &path.display())?;
        let expand = next_file.as_symlink().is_some() && (!is_last || follow_final_symlink);

        if expand {
            link_depth += 1;
            if link_depth > MAX_LINK_DEPTH {
                return Err(Error::too_many_links(path.display()));
            }
            let target = next_file.as_symlink().expect("checked above").clone();
            current_id = if target.is_absolute() {
                let target_root = target.root().expect("absolute path has a root");
                state
                    .root_id(target_root)
                    .ok_or_else(|| Error::no_such_file(format!("unknown root {target_root:?}")))?
            } else {
                // `current_id` is the directory the symlink entry itself was
                // just looked up in — the correct base for its relative
                // target. `parent_id` still holds the *previous* component's
                // directory at this point; it isn't updated until the
                // bottom of the loop.
                current_id
            };
            for n in target.names().iter().rev() {
                queue.push_front(n.clone());
            }
            continue;
        }

        parent_id = current_id;
        current_id = next_id;
        last_name = name;
    }

    Ok(Resolution { file_id: current_id, parent_id, name: last_name })
}

/// Resolves everything up to but not including `path`'s last name,
/// returning the containing directory's id and that final name —
/// convenient for operations that need to insert or remove an entry
/// (spec.md 4.5, create/delete/rename).
pub fn resolve_parent(state: &TreeState, path: &Path) -> Result<(u64, Name)> {
    let name = path
        .file_name()
        .ok_or_else(|| Error::invalid_argument("path has no final name component".to_owned()))?
        .clone();
    let parent_path = path
        .parent()
        .ok_or_else(|| Error::invalid_argument("path has no parent".to_owned()))?;
    let resolution = resolve(state, &parent_path, true)?;
    Ok((resolution.file_id, name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::BlockPool;
    use crate::file::File;
    use crate::name::CaseSensitivity;
    use crate::path_type::UnixPathType;
    use crate::tree::FileTree;
    use std::sync::Arc;

    fn name(s: &str) -> Name {
        Name::new(s, CaseSensitivity::Sensitive)
    }

    fn path(s: &str) -> Path {
        Path::parse(Arc::new(UnixPathType), s, &[]).unwrap()
    }

    fn tree_with_subdir() -> FileTree {
        let tree = FileTree::new(Arc::new(UnixPathType), &["/".to_owned()], Arc::new(BlockPool::new(64, 4096)))
            .unwrap();
        let mut state = tree.lock();
        let root_id = state.root_id("/").unwrap();
        let sub_id = tree.next_id();
        let sub = File::new_directory(sub_id, root_id, tree.block_pool().clone());
        state.table.insert(sub_id, Arc::new(sub));
        state.get(root_id).unwrap().as_directory().unwrap().write().insert(name("a"), sub_id).unwrap();

        let file_id = tree.next_id();
        let file = File::new_regular(file_id, tree.block_pool().clone());
        state.table.insert(file_id, Arc::new(file));
        state.get(sub_id).unwrap().as_directory().unwrap().write().insert(name("b.txt"), file_id).unwrap();
        drop(state);
        tree
    }

    #[test]
    fn resolves_nested_path() {
        let tree = tree_with_subdir();
        let state = tree.lock();
        let resolution = resolve(&state, &path("/a/b.txt"), true).unwrap();
        assert_eq!(resolution.name.display(), "b.txt");
        assert!(state.get(resolution.file_id).unwrap().as_regular().is_some());
    }

    #[test]
    fn resolves_dot_and_dot_dot() {
        let tree = tree_with_subdir();
        let state = tree.lock();
        let root_id = state.root_id("/").unwrap();
        let resolution = resolve(&state, &path("/a/../a/."), true).unwrap();
        let sub_id = state.get(root_id).unwrap().as_directory().unwrap().read().get(&name("a")).unwrap();
        assert_eq!(resolution.file_id, sub_id);
    }

    #[test]
    fn missing_component_is_no_such_file() {
        let tree = tree_with_subdir();
        let state = tree.lock();
        assert!(resolve(&state, &path("/a/missing"), true).is_err());
    }

    #[test]
    fn traversing_through_a_regular_file_is_not_directory() {
        let tree = tree_with_subdir();
        let state = tree.lock();
        assert!(resolve(&state, &path("/a/b.txt/oops"), true).is_err());
    }

    #[test]
    fn resolve_parent_splits_directory_and_name() {
        let tree = tree_with_subdir();
        let state = tree.lock();
        let (parent_id, last) = resolve_parent(&state, &path("/a/b.txt")).unwrap();
        assert_eq!(last.display(), "b.txt");
        assert!(state.get(parent_id).unwrap().is_directory());
    }

    #[test]
    fn symlink_expands_relative_target() {
        let tree = tree_with_subdir();
        let mut state = tree.lock();
        let root_id = state.root_id("/").unwrap();
        let link_id = tree.next_id();
        let link = File::new_symlink(link_id, path("a"));
        state.table.insert(link_id, Arc::new(link));
        state.get(root_id).unwrap().as_directory().unwrap().write().insert(name("link"), link_id).unwrap();
        drop(state);

        let state = tree.lock();
        let resolution = resolve(&state, &path("/link/b.txt"), true).unwrap();
        assert_eq!(resolution.name.display(), "b.txt");
    }

    #[test]
    fn relative_symlink_nested_two_levels_deep_resolves_against_its_own_directory() {
        // /a/target/foo.txt, with /a/link2 -> "target" (relative). Resolving
        // /a/link2/foo.txt must expand "target" against /a (the symlink's
        // own containing directory), not against `/` (the grandparent of
        // the path component that held the symlink).
        let tree = tree_with_subdir();
        let mut state = tree.lock();
        let root_id = state.root_id("/").unwrap();
        let a_id = state.get(root_id).unwrap().as_directory().unwrap().read().get(&name("a")).unwrap();

        let target_dir_id = tree.next_id();
        let target_dir = File::new_directory(target_dir_id, a_id, tree.block_pool().clone());
        state.table.insert(target_dir_id, Arc::new(target_dir));
        state.get(a_id).unwrap().as_directory().unwrap().write().insert(name("target"), target_dir_id).unwrap();

        let foo_id = tree.next_id();
        let foo = File::new_regular(foo_id, tree.block_pool().clone());
        state.table.insert(foo_id, Arc::new(foo));
        state.get(target_dir_id).unwrap().as_directory().unwrap().write().insert(name("foo.txt"), foo_id).unwrap();

        let link_id = tree.next_id();
        let link = File::new_symlink(link_id, path("target"));
        state.table.insert(link_id, Arc::new(link));
        state.get(a_id).unwrap().as_directory().unwrap().write().insert(name("link2"), link_id).unwrap();
        drop(state);

        let state = tree.lock();
        let resolution = resolve(&state, &path("/a/link2/foo.txt"), true).unwrap();
        assert_eq!(resolution.name.display(), "foo.txt");
        assert_eq!(resolution.file_id, foo_id);
    }
}
