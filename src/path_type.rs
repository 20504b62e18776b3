//! [`PathType`]: parses and formats path strings for one path flavor
//! (Unix or Windows), owning its separator set, root recognition, and case
//! rule (spec.md 4.1).

use crate::error::{Error, Result};
use crate::name::{CaseSensitivity, Name};

/// Parsed representation of a path string: an optional root display string
/// plus the ordered sequence of non-root names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedPath {
    pub root: Option<String>,
    pub names: Vec<Name>,
}

/// A path flavor: Unix, Windows, or a custom separator/case/root scheme.
pub trait PathType: Send + Sync + std::fmt::Debug {
    /// The primary separator character used when formatting a path.
    fn separator(&self) -> char;

    /// Every character treated as a separator while parsing, including
    /// [`PathType::separator`].
    fn all_separators(&self) -> &[char];

    /// The case rule applied to names of this flavor.
    fn case_sensitivity(&self) -> CaseSensitivity;

    /// Recognizes a root prefix at the start of `path`, returning the root
    /// display string (e.g. `"/"`, `"C:\\"`) and the remainder of the
    /// string after the root, or `None` if `path` has no root.
    fn root_prefix<'a>(&self, path: &'a str) -> Option<(String, &'a str)>;

    /// Formats a root display string into its canonical on-disk spelling
    /// (e.g. normalizing `c:` to `C:\`). Default: return as-is.
    fn canonicalize_root(&self, root: &str) -> String {
        root.to_owned()
    }

    /// Parses `first` followed by `more` (as in `Path::resolve`-style
    /// multi-argument construction) into an optional root and ordered
    /// sequence of [`Name`]s.
    ///
    /// Any character in [`PathType::all_separators`] splits segments;
    /// consecutive separators and a trailing separator are ignored, as is
    /// an empty segment between separators. The empty string parses to the
    /// rootless, nameless empty path.
    fn parse(&self, first: &str, more: &[&str]) -> Result<ParsedPath> {
        let mut combined = first.to_owned();
        for part in more {
            if !combined.is_empty() && !self.ends_with_separator(&combined) {
                combined.push(self.separator());
            }
            combined.push_str(part);
        }

        let (root, rest) = match self.root_prefix(&combined) {
            Some((root, rest)) => (Some(self.canonicalize_root(&root)), rest),
            None => (None, combined.as_str()),
        };

        let case = self.case_sensitivity();
        let names = rest
            .split(|c| self.all_separators().contains(&c))
            .filter(|segment| !segment.is_empty())
            .map(|segment| Name::new(segment, case))
            .collect();

        Ok(ParsedPath { root, names })
    }

    fn ends_with_separator(&self, s: &str) -> bool {
        s.chars().last().is_some_and(|c| self.all_separators().contains(&c))
    }

    /// Formats a root and ordered name sequence back into a display string.
    fn format(&self, root: Option<&str>, names: &[Name]) -> String {
        let mut out = String::new();
        if let Some(root) = root {
            out.push_str(root);
        }
        for (i, name) in names.iter().enumerate() {
            if i > 0 || (root.is_none() && i == 0) {
                if !out.is_empty() && !self.ends_with_separator(&out) {
                    out.push(self.separator());
                }
            } else if root.is_some() && !self.ends_with_separator(&out) {
                out.push(self.separator());
            }
            out.push_str(name.display());
        }
        out
    }
}

/// The Unix path flavor: `/`-separated, case sensitive, root `/`.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnixPathType;

impl PathType for UnixPathType {
    fn separator(&self) -> char {
        '/'
    }

    fn all_separators(&self) -> &[char] {
        &['/']
    }

    fn case_sensitivity(&self) -> CaseSensitivity {
        CaseSensitivity::Sensitive
    }

    fn root_prefix<'a>(&self, path: &'a str) -> Option<(String, &'a str)> {
        path.strip_prefix('/').map(|rest| ("/".to_owned(), rest))
    }
}

/// The Windows path flavor: `\`-separated (alt `/`), ASCII case insensitive,
/// root of the form `C:\`.
#[derive(Debug, Clone, Copy, Default)]
pub struct WindowsPathType;

impl PathType for WindowsPathType {
    fn separator(&self) -> char {
        '\\'
    }

    fn all_separators(&self) -> &[char] {
        &['\\', '/']
    }

    fn case_sensitivity(&self) -> CaseSensitivity {
        CaseSensitivity::AsciiFold
    }

    fn root_prefix<'a>(&self, path: &'a str) -> Option<(String, &'a str)> {
        let bytes = path.as_bytes();
        if bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':' {
            let drive = path[..2].to_owned();
            let rest = &path[2..];
            let rest = rest.strip_prefix(['\\', '/']).unwrap_or(rest);
            return Some((drive, rest));
        }
        None
    }

    fn canonicalize_root(&self, root: &str) -> String {
        let mut chars = root.chars();
        let letter = chars.next().unwrap_or_default().to_ascii_uppercase();
        format!("{letter}:\\")
    }
}

/// Validates that a user-chosen root-name string is well formed for the
/// given flavor (used when building [`crate::config::FileSystemConfiguration`]).
pub fn validate_root_name(path_type: &dyn PathType, root: &str) -> Result<()> {
    if path_type.root_prefix(root).is_none() {
        return Err(Error::invalid_argument(format!("{root:?} is not a valid root name")));
    }
    Ok(())
}
