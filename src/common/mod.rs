//! Common types shared by the walker, the generator and the archive builder.

use std::path::Path;

use zip::write::FileOptions;
use zip::CompressionMethod;

/// Content lengths at or above this value are written with zip64 records.
///
/// This is one byte below the real 32-bit limit. Extractors built against the
/// same threshold expect the extended record for a member of exactly
/// `u32::MAX` bytes, so the boundary is kept as is.
pub const ZIP64_THRESHOLD: u64 = (1u64 << 32) - 1;

/// Only the permission bits of a source mode are stored.
pub const PERMISSION_MASK: u32 = 0o777;

/// Whether a member of `len` bytes needs the extended (zip64) record variant.
pub fn requires_zip64(len: u64) -> bool {
    len >= ZIP64_THRESHOLD
}

/// Where the bytes of an archive member come from.
#[derive(Debug, Clone, Copy)]
pub enum ContentSource<'a> {
    /// A file on disk, streamed in bounded chunks.
    Path(&'a Path),
    /// An in-memory buffer, written in one call. Used for generated text.
    Bytes(&'a [u8]),
}

/// Metadata for a single member about to be written into the archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// Forward-slash separated path relative to the tree root.
    pub name: String,
    /// Uncompressed content length.
    pub size: u64,
    /// Permission bits of the originating file, if there is one.
    pub mode: Option<u32>,
}

impl Entry {
    pub fn new(name: impl Into<String>, size: u64, mode: Option<u32>) -> Self {
        Self {
            name: name.into(),
            size,
            mode: mode.map(|m| m & PERMISSION_MASK),
        }
    }

    pub fn is_zip64(&self) -> bool {
        requires_zip64(self.size)
    }

    /// Record options for this member: always deflate at the default level,
    /// zip64 decided from this member's size alone.
    pub fn file_options(&self) -> FileOptions {
        let options = FileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .large_file(self.is_zip64());
        match self.mode {
            Some(mode) => options.unix_permissions(mode),
            None => options,
        }
    }
}

/// Checks that `name` is usable as a member name: non-empty, relative,
/// forward-slash separated and free of `.`/`..` components.
pub fn validate_entry_name(name: &str) -> Result<(), &'static str> {
    if name.is_empty() {
        return Err("empty name");
    }
    if name.starts_with('/') {
        return Err("absolute path");
    }
    if name.contains('\\') {
        return Err("backslash separator");
    }
    for component in name.split('/') {
        match component {
            "" => return Err("empty path component"),
            "." | ".." => return Err("relative path component"),
            _ => {}
        }
    }
    Ok(())
}
