//! [`FileSystemConfiguration`]: the knobs a [`crate::fs::FileSystem`] is
//! built from (spec.md 6) — roots, working directory, path flavor,
//! attribute views, and the tunables that don't have an obvious home
//! elsewhere. Deserializable from TOML via `serde`, the way the teacher
//! crate's own NFS export configuration was (spec.md 2a).

use std::sync::Arc;

use bitflags::bitflags;
use serde::Deserialize;

use crate::error::{Error, Result};
use crate::path_type::{validate_root_name, PathType, UnixPathType, WindowsPathType};

bitflags! {
    /// Optional capabilities a configuration can turn on, mirroring the
    /// jimfs-style `Feature` set (spec.md 9, "Feature flags").
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Features: u32 {
        const SYMBOLIC_LINKS      = 0b0001;
        const HARD_LINKS          = 0b0010;
        const GROUPS              = 0b0100;
        const SECURE_DIRECTORY_STREAMS = 0b1000;
    }
}

/// Which path flavor a file system uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PathFlavor {
    Unix,
    Windows,
}

impl PathFlavor {
    pub fn build(self) -> Arc<dyn PathType> {
        match self {
            PathFlavor::Unix => Arc::new(UnixPathType),
            PathFlavor::Windows => Arc::new(WindowsPathType),
        }
    }
}

/// Raw, TOML-deserializable configuration. Use [`FileSystemConfiguration::build`]
/// (or one of the `unix`/`windows` presets) to turn this into a validated,
/// ready-to-use value.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FileSystemConfiguration {
    pub path_flavor: PathFlavor,
    pub roots: Vec<String>,
    pub working_directory: String,
    pub attribute_views: Vec<String>,
    pub supports_symbolic_links: bool,
    pub supports_hard_links: bool,
    pub supports_groups: bool,
    pub supports_secure_directory_streams: bool,
    pub default_owner: String,
    pub default_group: String,
    pub default_permissions: u32,
    pub default_acl_entries: Vec<String>,
    pub block_size: usize,
    pub max_cache_bytes: usize,
}

impl Default for FileSystemConfiguration {
    fn default() -> FileSystemConfiguration {
        FileSystemConfiguration {
            path_flavor: PathFlavor::Unix,
            roots: vec!["/".to_owned()],
            working_directory: "/work".to_owned(),
            attribute_views: vec!["basic".to_owned(), "owner".to_owned(), "posix".to_owned(), "unix".to_owned()],
            supports_symbolic_links: true,
            supports_hard_links: true,
            supports_groups: true,
            supports_secure_directory_streams: false,
            default_owner: "root".to_owned(),
            default_group: "root".to_owned(),
            default_permissions: 0o644,
            default_acl_entries: Vec::new(),
            block_size: 8192,
            max_cache_bytes: 8 * 1024 * 1024,
        }
    }
}

impl FileSystemConfiguration {
    /// A Unix-like preset: `/` root, `/work` working directory, `unix`
    /// attribute view enabled.
    pub fn unix() -> FileSystemConfiguration {
        FileSystemConfiguration::default()
    }

    /// A Windows-like preset: `C:\` root, `dos` attributes instead of
    /// POSIX ones, ASCII case-insensitive names.
    pub fn windows() -> FileSystemConfiguration {
        FileSystemConfiguration {
            path_flavor: PathFlavor::Windows,
            roots: vec!["C:\\".to_owned()],
            working_directory: "C:\\work".to_owned(),
            attribute_views: vec!["basic".to_owned(), "owner".to_owned(), "dos".to_owned(), "acl".to_owned()],
            supports_hard_links: false,
            ..FileSystemConfiguration::default()
        }
    }

    /// Parses a configuration from a TOML document.
    pub fn from_toml(text: &str) -> Result<FileSystemConfiguration> {
        toml::from_str(text).map_err(|e| Error::invalid_argument(format!("invalid configuration: {e}")))
    }

    pub fn features(&self) -> Features {
        let mut features = Features::empty();
        features.set(Features::SYMBOLIC_LINKS, self.supports_symbolic_links);
        features.set(Features::HARD_LINKS, self.supports_hard_links);
        features.set(Features::GROUPS, self.supports_groups);
        features.set(Features::SECURE_DIRECTORY_STREAMS, self.supports_secure_directory_streams);
        features
    }

    pub fn attribute_view_names(&self) -> Vec<&str> {
        self.attribute_views.iter().map(String::as_str).collect()
    }

    /// Validates internal consistency: at least one root, a working
    /// directory under one of the roots, and root names well formed for
    /// the chosen path flavor.
    pub fn validate(&self) -> Result<()> {
        if self.roots.is_empty() {
            return Err(Error::invalid_argument("configuration must declare at least one root".to_owned()));
        }
        if self.block_size == 0 {
            return Err(Error::invalid_argument("block_size must be non-zero".to_owned()));
        }
        let path_type = self.path_flavor.build();
        for root in &self.roots {
            validate_root_name(path_type.as_ref(), root)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_configuration_validates() {
        FileSystemConfiguration::default().validate().unwrap();
    }

    #[test]
    fn windows_preset_disables_hard_links() {
        let config = FileSystemConfiguration::windows();
        assert!(!config.features().contains(Features::HARD_LINKS));
        config.validate().unwrap();
    }

    #[test]
    fn empty_roots_fail_validation() {
        let config = FileSystemConfiguration { roots: vec![], ..FileSystemConfiguration::default() };
        assert!(config.validate().is_err());
    }

    #[test]
    fn parses_from_toml() {
        let config = FileSystemConfiguration::from_toml(
            r#"
            path_flavor = "unix"
            roots = ["/"]
            working_directory = "/work"
            block_size = 4096
            max_cache_bytes = 1048576
            "#,
        )
        .unwrap();
        assert_eq!(config.block_size, 4096);
        assert_eq!(config.roots, vec!["/".to_owned()]);
    }
}
