//! [`Path`]: a structured, pure-data path value — optional root plus an
//! ordered sequence of [`Name`]s (spec.md 4.2). A `Path` owns no file
//! system state; it is produced and consumed by [`crate::path_type::PathType`].

use std::fmt;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::name::Name;
use crate::path_type::PathType;

/// A parsed, structured path value for one [`PathType`] flavor.
#[derive(Clone)]
pub struct Path {
    path_type: Arc<dyn PathType>,
    root: Option<String>,
    names: Vec<Name>,
}

impl Path {
    /// Parses `first`/`more` the way [`PathType::parse`] does and wraps the
    /// result as a `Path` bound to `path_type`.
    pub fn parse(path_type: Arc<dyn PathType>, first: &str, more: &[&str]) -> Result<Path> {
        let parsed = path_type.parse(first, more)?;
        Ok(Path { path_type, root: parsed.root, names: parsed.names })
    }

    pub fn from_parts(path_type: Arc<dyn PathType>, root: Option<String>, names: Vec<Name>) -> Path {
        Path { path_type, root, names }
    }

    /// An empty, rootless path (distinct from the root path itself).
    pub fn empty(path_type: Arc<dyn PathType>) -> Path {
        Path { path_type, root: None, names: Vec::new() }
    }

    pub fn path_type(&self) -> &Arc<dyn PathType> {
        &self.path_type
    }

    pub fn is_absolute(&self) -> bool {
        self.root.is_some()
    }

    pub fn root(&self) -> Option<&str> {
        self.root.as_deref()
    }

    pub fn names(&self) -> &[Name] {
        &self.names
    }

    pub fn name_count(&self) -> usize {
        self.names.len()
    }

    pub fn name(&self, index: usize) -> Option<&Name> {
        self.names.get(index)
    }

    pub fn file_name(&self) -> Option<&Name> {
        self.names.last()
    }

    pub fn parent(&self) -> Option<Path> {
        if self.names.is_empty() {
            return None;
        }
        let parent_names = self.names[..self.names.len() - 1].to_vec();
        if parent_names.is_empty() && self.root.is_none() {
            return None;
        }
        Some(Path { path_type: self.path_type.clone(), root: self.root.clone(), names: parent_names })
    }

    /// Returns the rootless subpath `[begin, end)`.
    pub fn subpath(&self, begin: usize, end: usize) -> Result<Path> {
        if begin >= end || end > self.names.len() {
            return Err(Error::invalid_argument(format!(
                "subpath range {begin}..{end} out of bounds for path with {} names",
                self.names.len()
            )));
        }
        Ok(Path { path_type: self.path_type.clone(), root: None, names: self.names[begin..end].to_vec() })
    }

    pub fn starts_with(&self, other: &Path) -> bool {
        if self.root != other.root {
            return false;
        }
        if other.names.len() > self.names.len() {
            return false;
        }
        self.names[..other.names.len()] == other.names[..]
    }

    pub fn ends_with(&self, other: &Path) -> bool {
        if other.is_absolute() && !self.is_absolute() {
            return false;
        }
        if other.is_absolute() {
            return self.root == other.root && self.names == other.names;
        }
        if other.names.len() > self.names.len() {
            return false;
        }
        let start = self.names.len() - other.names.len();
        self.names[start..] == other.names[..]
    }

    /// Removes `.` segments and collapses `name/..` pairs, purely
    /// syntactically — it never consults the file system, even across
    /// symbolic links (spec.md 4.2).
    pub fn normalize(&self) -> Path {
        let mut stack: Vec<Name> = Vec::with_capacity(self.names.len());
        for name in &self.names {
            if name.is_self() {
                continue;
            }
            if name.is_parent() {
                match stack.last() {
                    Some(top) if !top.is_parent() => {
                        stack.pop();
                    }
                    _ if self.root.is_none() => stack.push(name.clone()),
                    _ => {
                        // Root's parent is itself: a leading `..` under a
                        // root simply vanishes.
                    }
                }
                continue;
            }
            stack.push(name.clone());
        }
        Path { path_type: self.path_type.clone(), root: self.root.clone(), names: stack }
    }

    /// Resolves `other` against `self`: if `other` is absolute, it is
    /// returned verbatim (re-bound to this path's flavor); otherwise the
    /// two name sequences are concatenated.
    pub fn resolve(&self, other: &Path) -> Path {
        if other.is_absolute() {
            return other.clone();
        }
        let mut names = self.names.clone();
        names.extend(other.names.iter().cloned());
        Path { path_type: self.path_type.clone(), root: self.root.clone(), names }
    }

    /// Resolves `other` against `self`'s parent, as if by
    /// `self.parent().resolve(other)`.
    pub fn resolve_sibling(&self, other: &Path) -> Path {
        match self.parent() {
            Some(parent) => parent.resolve(other),
            None => other.clone(),
        }
    }

    /// Computes the relative path that, resolved against `self`, yields
    /// `other`. Both must share a root, or both must be rootless, else
    /// fails with [`Error::InvalidArgument`] (spec.md 4.2).
    pub fn relativize(&self, other: &Path) -> Result<Path> {
        if self.root != other.root {
            return Err(Error::invalid_argument(
                "cannot relativize paths with different roots".to_owned(),
            ));
        }
        let a = self.normalize();
        let b = other.normalize();

        let common = a.names.iter().zip(b.names.iter()).take_while(|(x, y)| x == y).count();

        if common < a.names.len() && a.names[common..].iter().any(Name::is_parent) {
            return Err(Error::invalid_argument(
                "cannot relativize paths that diverge below a `..` segment".to_owned(),
            ));
        }

        let mut names = Vec::new();
        for _ in common..a.names.len() {
            names.push(Name::parent_name());
        }
        names.extend(b.names[common..].iter().cloned());

        Ok(Path { path_type: self.path_type.clone(), root: None, names })
    }

    /// Returns an absolute path: `self` if already absolute, else
    /// `working_dir.resolve(self)`.
    pub fn to_absolute(&self, working_dir: &Path) -> Path {
        if self.is_absolute() {
            self.clone()
        } else {
            working_dir.resolve(self)
        }
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Name> {
        self.names.iter()
    }

    pub fn display(&self) -> String {
        self.path_type.format(self.root.as_deref(), &self.names)
    }
}

impl fmt::Debug for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Path")
            .field("root", &self.root)
            .field("names", &self.names.iter().map(Name::display).collect::<Vec<_>>())
            .finish()
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display())
    }
}

impl PartialEq for Path {
    fn eq(&self, other: &Self) -> bool {
        self.root == other.root && self.names == other.names
    }
}

impl Eq for Path {}
