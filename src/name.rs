//! [`Name`]: an immutable file-name value with a canonical form used for
//! equality and hashing, independent of how it is displayed.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// How two display strings are folded into a canonical key for comparison.
///
/// Unix names compare byte-for-byte; Windows names fold ASCII case before
/// comparing, matching `PathType`'s case rule (spec.md 4.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaseSensitivity {
    Sensitive,
    AsciiFold,
}

impl CaseSensitivity {
    fn canonicalize(self, display: &str) -> String {
        match self {
            CaseSensitivity::Sensitive => display.to_owned(),
            CaseSensitivity::AsciiFold => display.to_ascii_lowercase(),
        }
    }
}

/// A single path segment: the original display string plus an opaque
/// canonical key used for equality and hashing.
///
/// `.` and `..` are singleton names independent of the case rule in force;
/// they never go through [`CaseSensitivity::canonicalize`].
#[derive(Clone)]
pub struct Name(Arc<Inner>);

struct Inner {
    display: String,
    canonical: String,
}

impl Name {
    /// The singleton name for the current-directory entry `.`.
    pub fn self_name() -> Name {
        Name(Arc::new(Inner { display: ".".to_owned(), canonical: ".".to_owned() }))
    }

    /// The singleton name for the parent-directory entry `..`.
    pub fn parent_name() -> Name {
        Name(Arc::new(Inner { display: "..".to_owned(), canonical: "..".to_owned() }))
    }

    /// Builds a `Name` from a display string under the given case rule.
    ///
    /// `.` and `..` are recognized regardless of `case` and always map to
    /// the [`Name::self_name`] / [`Name::parent_name`] singletons.
    pub fn new(display: impl Into<String>, case: CaseSensitivity) -> Name {
        let display = display.into();
        if display == "." {
            return Name::self_name();
        }
        if display == ".." {
            return Name::parent_name();
        }
        let canonical = case.canonicalize(&display);
        Name(Arc::new(Inner { display, canonical }))
    }

    /// The original, display-preserving spelling of this name.
    pub fn display(&self) -> &str {
        &self.0.display
    }

    pub fn is_self(&self) -> bool {
        self.0.canonical == "."
    }

    pub fn is_parent(&self) -> bool {
        self.0.canonical == ".."
    }

    pub fn is_dot_or_dot_dot(&self) -> bool {
        self.is_self() || self.is_parent()
    }
}

impl fmt::Debug for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Name").field(&self.0.display).finish()
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.display)
    }
}

impl PartialEq for Name {
    fn eq(&self, other: &Self) -> bool {
        self.0.canonical == other.0.canonical
    }
}

impl Eq for Name {}

impl Hash for Name {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.canonical.hash(state);
    }
}

impl std::borrow::Borrow<str> for Name {
    fn borrow(&self) -> &str {
        &self.0.canonical
    }
}
