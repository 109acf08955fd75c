use std::path::PathBuf;

use zip::result::ZipError;

/// The primary error type for all operations in the `mbpack` crate.
///
/// Every variant carries the path of the file or the logical name of the
/// archive member it concerns, so a failure in the middle of a large tree can
/// be traced back to the entry that caused it.
#[derive(Debug, thiserror::Error)]
pub enum ArchiverError {
    /// The output archive could not be created or truncated.
    #[error("{}: failed to open for writing: {source}", .path.display())]
    CreateArchive { path: PathBuf, source: std::io::Error },

    /// A source file could not be opened for reading.
    #[error("{}: failed to open for reading: {source}", .path.display())]
    OpenSource { path: PathBuf, source: std::io::Error },

    /// The metadata of an open source file could not be read.
    #[error("{}: failed to stat: {source}", .path.display())]
    Stat { path: PathBuf, source: std::io::Error },

    /// The archive refused to open a new member record.
    #[error("{name}: failed to add file: {source}")]
    StartEntry { name: String, source: ZipError },

    /// The logical name is not a relative, forward-slash separated path.
    #[error("{name}: invalid entry name: {reason}")]
    InvalidName { name: String, reason: &'static str },

    /// A member with the same logical name was already written.
    #[error("{name}: duplicate entry")]
    DuplicateEntry { name: String },

    /// Compressed data could not be written into the current member.
    #[error("{name}: failed to write data: {source}")]
    Write { name: String, source: std::io::Error },

    /// A source file failed while being streamed into the archive.
    #[error("{}: failed to read file: {source}", .path.display())]
    Read { path: PathBuf, source: std::io::Error },

    /// The central directory could not be written.
    #[error("{}: failed to finalize archive: {source}", .path.display())]
    Finish { path: PathBuf, source: ZipError },

    /// An existing archive could not be parsed.
    #[error("{}: failed to read archive: {source}", .path.display())]
    ReadArchive { path: PathBuf, source: ZipError },

    /// A generic I/O error outside of member streaming, with the path involved.
    #[error("I/O error on path '{}': {source}", .path.display())]
    Io { path: PathBuf, source: std::io::Error },

    /// Traversal of the template tree failed.
    #[error("Walk error: {0}")]
    Walk(#[from] walkdir::Error),

    /// A visited path does not live under the traversal root.
    #[error("Could not strip prefix '{}' from path '{}'", .prefix.display(), .path.display())]
    StripPrefix { prefix: PathBuf, path: PathBuf },
}

impl ArchiverError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ArchiverError::Io { path: path.into(), source }
    }
}
