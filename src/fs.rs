//! [`FileSystem`]: the façade tying a [`FileTree`], an [`AttributeRegistry`],
//! and a [`WatchService`] together behind the small set of operations a
//! caller actually needs (spec.md 6, 6a).

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use crate::attr::{AttrValue, AttributeDefaults, AttributeRegistry};
use crate::channel::FileChannel;
use crate::config::{Features, FileSystemConfiguration};
use crate::error::{Error, Result};
use crate::ops::{self, DirEntry};
use crate::path::Path;
use crate::tree::FileTree;
use crate::watch::{WatchKey, WatchService};

/// Default period between watch-service polls (spec.md 4.7a).
const DEFAULT_WATCH_POLL_PERIOD: Duration = Duration::from_secs(5);

pub struct FileSystem {
    tree: Arc<FileTree>,
    attrs: AttributeRegistry,
    watch: WatchService,
    features: Features,
}

impl FileSystem {
    pub fn new(config: FileSystemConfiguration) -> Result<FileSystem> {
        config.validate()?;
        let path_type = config.path_flavor.build();
        let block_pool = Arc::new(crate::block::BlockPool::new(config.block_size, config.max_cache_bytes));
        let tree = Arc::new(FileTree::new(path_type, &config.roots, block_pool)?);
        let features = config.features();
        let defaults = AttributeDefaults {
            owner: config.default_owner.clone(),
            group: config.default_group.clone(),
            permissions: config.default_permissions as i64,
            acl_entries: config.default_acl_entries.clone(),
        };
        let attrs = AttributeRegistry::with_views_and_defaults(&config.attribute_view_names(), &defaults, features);
        let watch = WatchService::new(tree.clone(), DEFAULT_WATCH_POLL_PERIOD);

        let fs = FileSystem { tree, attrs, watch, features };
        let working_dir = Path::parse(fs.tree.path_type().clone(), &config.working_directory, &[])?;
        fs.create_directories(&working_dir)?;
        fs.tree.set_working_directory(working_dir);
        Ok(fs)
    }

    /// A ready-to-use Unix-flavored file system: `/` root, `unix`
    /// attributes, working directory `/work`.
    pub fn unix_like() -> Result<FileSystem> {
        FileSystem::new(FileSystemConfiguration::unix())
    }

    /// A ready-to-use Windows-flavored file system: `C:\` root, `dos`
    /// attributes, no hard links.
    pub fn windows_like() -> Result<FileSystem> {
        FileSystem::new(FileSystemConfiguration::windows())
    }

    /// Parses `s` into a [`Path`] of this file system's flavor — the
    /// entry point for callers outside the crate, which have no other way
    /// to name a [`crate::path_type::PathType`].
    pub fn path(&self, s: &str) -> Result<Path> {
        Path::parse(self.tree.path_type().clone(), s, &[])
    }

    pub fn working_directory(&self) -> Path {
        self.tree.working_directory()
    }

    pub fn set_working_directory(&self, path: &Path) -> Result<()> {
        let absolute = self.absolute(path);
        if !self.exists(&absolute) {
            return Err(Error::no_such_file(absolute.display()));
        }
        self.tree.set_working_directory(absolute);
        Ok(())
    }

    fn absolute(&self, path: &Path) -> Path {
        path.to_absolute(&self.tree.working_directory())
    }

    pub fn create_file(&self, path: &Path) -> Result<()> {
        ops::create_file(&self.tree, &self.attrs, &self.absolute(path)).map(|_| ())
    }

    pub fn create_directory(&self, path: &Path) -> Result<()> {
        ops::create_directory(&self.tree, &self.attrs, &self.absolute(path)).map(|_| ())
    }

    /// Creates `path` and every missing ancestor directory, the way
    /// `mkdir -p` does. Existing directories along the way are left alone.
    pub fn create_directories(&self, path: &Path) -> Result<()> {
        let absolute = self.absolute(path);
        for i in 1..=absolute.name_count() {
            let prefix =
                Path::from_parts(absolute.path_type().clone(), absolute.root().map(str::to_owned), absolute.names()[..i].to_vec());
            match ops::create_directory(&self.tree, &self.attrs, &prefix) {
                Ok(_) | Err(Error::FileExists { .. }) => {}
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }

    pub fn create_symbolic_link(&self, path: &Path, target: Path) -> Result<()> {
        ops::create_symbolic_link(&self.tree, &self.attrs, self.features, &self.absolute(path), target).map(|_| ())
    }

    pub fn create_link(&self, path: &Path, existing: &Path) -> Result<()> {
        ops::create_link(&self.tree, self.features, &self.absolute(path), &self.absolute(existing))
    }

    pub fn delete(&self, path: &Path) -> Result<()> {
        ops::delete(&self.tree, &self.absolute(path))
    }

    pub fn move_file(&self, from: &Path, to: &Path, replace_existing: bool) -> Result<()> {
        ops::r#move(&self.tree, &self.absolute(from), &self.absolute(to), replace_existing)
    }

    pub fn copy(&self, from: &Path, to: &Path, replace_existing: bool, copy_attributes: bool) -> Result<()> {
        ops::copy(&self.tree, &self.attrs, &self.absolute(from), &self.absolute(to), replace_existing, copy_attributes)
            .map(|_| ())
    }

    pub fn exists(&self, path: &Path) -> bool {
        ops::exists(&self.tree, &self.absolute(path), true)
    }

    pub fn read_directory(&self, path: &Path) -> Result<Vec<DirEntry>> {
        ops::read_directory(&self.tree, &self.absolute(path))
    }

    pub fn read_symbolic_link(&self, path: &Path) -> Result<Path> {
        ops::read_symbolic_link(&self.tree, &self.absolute(path))
    }

    pub fn get_attribute(&self, path: &Path, key: &str) -> Result<AttrValue> {
        ops::get_attribute(&self.tree, &self.attrs, &self.absolute(path), key)
    }

    pub fn set_attribute(&self, path: &Path, key: &str, value: AttrValue) -> Result<()> {
        ops::set_attribute(&self.tree, &self.attrs, &self.absolute(path), key, value)
    }

    pub fn read_attribute_view(&self, path: &Path, view: &str) -> Result<HashMap<String, AttrValue>> {
        ops::read_attribute_view(&self.tree, &self.attrs, &self.absolute(path), view)
    }

    pub fn open_read(&self, path: &Path) -> Result<FileChannel> {
        ops::open_channel(&self.tree, &self.attrs, &self.absolute(path), true, false, false, false, false, false)
    }

    pub fn open_write(&self, path: &Path, truncate: bool, append: bool) -> Result<FileChannel> {
        ops::open_channel(&self.tree, &self.attrs, &self.absolute(path), false, true, true, false, truncate, append)
    }

    /// Opens `path` for writing, failing with [`Error::FileExists`] if it
    /// already exists instead of reusing it (spec.md 4.5's `CREATE_NEW`).
    pub fn open_write_new(&self, path: &Path) -> Result<FileChannel> {
        ops::open_channel(&self.tree, &self.attrs, &self.absolute(path), false, true, true, true, false, false)
    }

    pub fn open_read_write(&self, path: &Path, create: bool) -> Result<FileChannel> {
        ops::open_channel(&self.tree, &self.attrs, &self.absolute(path), true, true, create, false, false, false)
    }

    /// Opens `path` for reading and writing, failing with
    /// [`Error::FileExists`] if it already exists instead of reusing it
    /// (spec.md 4.5's `CREATE_NEW`).
    pub fn open_read_write_new(&self, path: &Path) -> Result<FileChannel> {
        ops::open_channel(&self.tree, &self.attrs, &self.absolute(path), true, true, true, true, false, false)
    }

    /// Registers a watch on `path` (which must name a directory),
    /// returning a key whose `take`/`poll` report subsequent changes
    /// (spec.md 4.7).
    pub fn watch(&self, path: &Path) -> Result<WatchKey> {
        let absolute = self.absolute(path);
        let resolution = ops::resolve_for_open(&self.tree, &absolute)?;
        self.watch.register(&self.tree, resolution.file_id)
    }
}
