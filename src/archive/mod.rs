//! # Zip Archive Builder
//!
//! This module owns the lifetime of one output zip: it is opened once, receives a
//! stream of members (either files on disk or in-memory buffers) and writes the
//! central directory when closed.
//!
//! Every member is deflated at the default level. The zip64 record variant is
//! chosen per member from its size (see [`crate::common::requires_zip64`]), so a
//! single huge file does not widen the records of its neighbours.
//!
//! Closing is guaranteed: if an [`ArchiveBuilder`] goes out of scope without an
//! explicit [`ArchiveBuilder::close`], its destructor finalizes the archive so
//! the output is always a structurally valid (possibly incomplete) zip.

use std::collections::HashSet;
use std::fs::{File, OpenOptions};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, error, warn};
use zip::{ZipArchive, ZipWriter};

use crate::common::{validate_entry_name, ContentSource, Entry, PERMISSION_MASK};
use crate::fsx;
use crate::ArchiverError;

/// Chunk size used when streaming a source file into the compressor.
pub const READ_BUF_SIZE: usize = 32 * 1024;

/// A writer responsible for constructing one zip archive.
pub struct ArchiveBuilder {
    path: PathBuf,
    writer: ZipWriter<File>,
    names: HashSet<String>,
    entries_written: usize,
    closed: bool,
}

impl ArchiveBuilder {
    /// Creates (or truncates) `output_path` and prepares it for writing.
    pub fn open(output_path: impl AsRef<Path>) -> Result<Self, ArchiverError> {
        let path = output_path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&path)
            .map_err(|source| ArchiverError::CreateArchive { path: path.clone(), source })?;

        debug!("{}: opened for writing", path.display());

        Ok(Self {
            path,
            writer: ZipWriter::new(file),
            names: HashSet::new(),
            entries_written: 0,
            closed: false,
        })
    }

    /// Path of the archive being written.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of members fully written so far.
    pub fn entries_written(&self) -> usize {
        self.entries_written
    }

    /// Writes one member and returns the number of uncompressed bytes stored.
    ///
    /// For [`ContentSource::Path`] a `mode` of `None` means "use the source
    /// file's permission bits". For [`ContentSource::Bytes`] there is no
    /// originating file, so `None` leaves the writer's default mode in place.
    ///
    /// If the source fails mid-stream the member stays in the archive with
    /// whatever was written so far; it is finalized by the next member or by
    /// [`close`](Self::close).
    pub fn add_entry(
        &mut self,
        name: &str,
        source: ContentSource<'_>,
        mode: Option<u32>,
    ) -> Result<u64, ArchiverError> {
        match source {
            ContentSource::Path(path) => self.stream_file(name, path, mode),
            ContentSource::Bytes(data) => self.write_buffer(name, data, mode),
        }
    }

    /// Adds a file from disk, keeping its permission bits.
    pub fn add_path(&mut self, name: &str, path: &Path) -> Result<u64, ArchiverError> {
        self.add_entry(name, ContentSource::Path(path), None)
    }

    /// Adds an in-memory buffer.
    ///
    /// The member carries no permission bits of its own. The zip writer
    /// still records a regular-file mode of `0o644` for it, since it has no
    /// way to leave the Unix attributes unset.
    pub fn add_bytes(&mut self, name: &str, data: &[u8]) -> Result<u64, ArchiverError> {
        self.add_entry(name, ContentSource::Bytes(data), None)
    }

    /// Writes the central directory and flushes the archive to disk.
    pub fn close(mut self) -> Result<(), ArchiverError> {
        self.finish()
    }

    fn stream_file(
        &mut self,
        name: &str,
        path: &Path,
        mode: Option<u32>,
    ) -> Result<u64, ArchiverError> {
        let mut file = File::open(path)
            .map_err(|source| ArchiverError::OpenSource { path: path.to_path_buf(), source })?;
        let metadata = file
            .metadata()
            .map_err(|source| ArchiverError::Stat { path: path.to_path_buf(), source })?;

        let entry = Entry::new(name, metadata.len(), mode.or_else(|| fsx::unix_mode(&metadata)));
        let writer = self.start_entry(&entry)?;

        let mut buf = vec![0u8; READ_BUF_SIZE];
        let mut copied: u64 = 0;
        loop {
            let n = match file.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(source) => {
                    return Err(ArchiverError::Read { path: path.to_path_buf(), source });
                }
            };
            writer
                .write_all(&buf[..n])
                .map_err(|source| ArchiverError::Write { name: entry.name.clone(), source })?;
            copied += n as u64;
        }

        if copied != entry.size {
            warn!(
                "{}: size changed while archiving ({} bytes expected, {} bytes read)",
                path.display(),
                entry.size,
                copied
            );
        }

        self.entries_written += 1;
        Ok(copied)
    }

    fn write_buffer(
        &mut self,
        name: &str,
        data: &[u8],
        mode: Option<u32>,
    ) -> Result<u64, ArchiverError> {
        let entry = Entry::new(name, data.len() as u64, mode);
        let writer = self.start_entry(&entry)?;
        writer
            .write_all(data)
            .map_err(|source| ArchiverError::Write { name: entry.name.clone(), source })?;

        self.entries_written += 1;
        Ok(entry.size)
    }

    /// Opens a new member record. Finalizes the previous member, if any.
    fn start_entry(&mut self, entry: &Entry) -> Result<&mut ZipWriter<File>, ArchiverError> {
        validate_entry_name(&entry.name)
            .map_err(|reason| ArchiverError::InvalidName { name: entry.name.clone(), reason })?;
        if self.names.contains(&entry.name) {
            return Err(ArchiverError::DuplicateEntry { name: entry.name.clone() });
        }

        if entry.is_zip64() {
            debug!("{}: using zip64 records ({} bytes)", entry.name, entry.size);
        }

        self.writer
            .start_file(entry.name.as_str(), entry.file_options())
            .map_err(|source| ArchiverError::StartEntry { name: entry.name.clone(), source })?;
        self.names.insert(entry.name.clone());

        Ok(&mut self.writer)
    }

    fn finish(&mut self) -> Result<(), ArchiverError> {
        self.closed = true;
        let file = self
            .writer
            .finish()
            .map_err(|source| ArchiverError::Finish { path: self.path.clone(), source })?;
        file.sync_all().map_err(|source| ArchiverError::io(&self.path, source))?;

        debug!("{}: closed with {} entries", self.path.display(), self.entries_written);
        Ok(())
    }
}

impl Drop for ArchiveBuilder {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        warn!("{}: archive dropped without being closed, finalizing", self.path.display());
        if let Err(e) = self.finish() {
            error!("{}", e);
        }
    }
}

/// A member as seen when reading an archive back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListedEntry {
    pub name: String,
    pub size: u64,
    pub compressed_size: u64,
    pub mode: Option<u32>,
}

/// Reads the central directory of an existing archive.
pub fn list_entries(archive_path: &Path) -> Result<Vec<ListedEntry>, ArchiverError> {
    let file = File::open(archive_path).map_err(|e| ArchiverError::io(archive_path, e))?;
    let mut archive = ZipArchive::new(file).map_err(|source| ArchiverError::ReadArchive {
        path: archive_path.to_path_buf(),
        source,
    })?;

    let mut entries = Vec::with_capacity(archive.len());
    for i in 0..archive.len() {
        let member = archive.by_index(i).map_err(|source| ArchiverError::ReadArchive {
            path: archive_path.to_path_buf(),
            source,
        })?;
        entries.push(ListedEntry {
            name: member.name().to_string(),
            size: member.size(),
            compressed_size: member.compressed_size(),
            mode: member.unix_mode().map(|m| m & PERMISSION_MASK),
        });
    }

    Ok(entries)
}
