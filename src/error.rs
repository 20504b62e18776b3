//! Error taxonomy shared by every layer of the virtual file system.

/// Convenient result alias used by all public operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by [`crate::FileSystem`] operations.
///
/// Variants mirror the POSIX-shaped error kinds a real file system would
/// report; no variant implies privilege checking actually took place,
/// since mode bits are stored but never enforced (see [`crate::attr`]).
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Any name along the path (except possibly the last, for create) is missing.
    #[error("no such file or directory: {path}")]
    NoSuchFile { path: String },

    /// Create/link/move-without-replace found the target name occupied.
    #[error("file already exists: {path}")]
    FileExists { path: String },

    /// An intermediate path name resolved to a non-directory, or a
    /// directory-only operation was called on a non-directory.
    #[error("not a directory: {path}")]
    NotDirectory { path: String },

    /// A regular-file-only operation was called on a directory.
    #[error("is a directory: {path}")]
    IsDirectory { path: String },

    /// Delete or replace-move found a non-empty directory target.
    #[error("directory not empty: {path}")]
    DirectoryNotEmpty { path: String },

    /// The symlink-follow count exceeded the configured limit.
    #[error("too many levels of symbolic links: {path}")]
    TooManyLinks { path: String },

    /// The operation refers to a feature not enabled by configuration.
    #[error("unsupported operation: {reason}")]
    Unsupported { reason: String },

    /// A malformed path, incompatible `relativize`, or an attribute value
    /// of the wrong type.
    #[error("invalid argument: {reason}")]
    InvalidArgument { reason: String },

    /// The file system, channel, or watch key this operation targets is closed.
    #[error("resource is closed")]
    Closed,

    /// Channel I/O observed the calling thread being interrupted.
    #[error("operation interrupted")]
    Interrupted,
}

impl Error {
    pub fn no_such_file(path: impl Into<String>) -> Self {
        Error::NoSuchFile { path: path.into() }
    }

    pub fn file_exists(path: impl Into<String>) -> Self {
        Error::FileExists { path: path.into() }
    }

    pub fn not_directory(path: impl Into<String>) -> Self {
        Error::NotDirectory { path: path.into() }
    }

    pub fn is_directory(path: impl Into<String>) -> Self {
        Error::IsDirectory { path: path.into() }
    }

    pub fn directory_not_empty(path: impl Into<String>) -> Self {
        Error::DirectoryNotEmpty { path: path.into() }
    }

    pub fn too_many_links(path: impl Into<String>) -> Self {
        Error::TooManyLinks { path: path.into() }
    }

    pub fn unsupported(reason: impl Into<String>) -> Self {
        Error::Unsupported { reason: reason.into() }
    }

    pub fn invalid_argument(reason: impl Into<String>) -> Self {
        Error::InvalidArgument { reason: reason.into() }
    }
}
