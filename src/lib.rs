//! vfsmem - an in-memory virtual file system.
//!
//! [`FileSystem`] is the entry point: build one with [`FileSystem::unix_like`],
//! [`FileSystem::windows_like`], or [`FileSystem::new`] from a
//! [`FileSystemConfiguration`], then create, read, and link files through
//! it exactly as you would against a real one, with a [`Path`] standing in
//! for `std::path::Path`.

mod attr;
mod block;
mod byte_store;
mod channel;
mod config;
mod directory;
mod error;
mod file;
mod fs;
mod logging;
mod lookup;
mod name;
mod ops;
mod path;
mod path_type;
mod tree;
mod watch;

pub use attr::{
    AclAttributeProvider, AttrDescriptor, AttrValue, AttributeDefaults, AttributeProvider, AttributeRegistry,
    BasicAttributeProvider, DosAttributeProvider, OwnerAttributeProvider, PosixAttributeProvider,
    UnixAttributeProvider, UserAttributeProvider,
};
pub use channel::FileChannel;
pub use config::{Features, FileSystemConfiguration, PathFlavor};
pub use error::{Error, Result};
pub use file::FileType;
pub use fs::FileSystem;
pub use logging::init_test_logging;
pub use name::{CaseSensitivity, Name};
pub use ops::DirEntry;
pub use path::Path;
pub use path_type::{ParsedPath, PathType, UnixPathType, WindowsPathType};
pub use watch::{EventKind, WatchEvent, WatchKey};
