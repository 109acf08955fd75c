//! Cross-platform filesystem helpers.
//!
//! Permission bits only exist on Unix. Elsewhere the archive falls back to the
//! zip writer's default mode and these helpers become no-ops.

use std::fs::Metadata;
use std::io;
use std::path::Path;

use crate::common::PERMISSION_MASK;

#[cfg(unix)]
/// POSIX permission bits (`st_mode & 0777`) of a file.
pub fn unix_mode(metadata: &Metadata) -> Option<u32> {
    use std::os::unix::fs::PermissionsExt;
    Some(metadata.permissions().mode() & PERMISSION_MASK)
}

#[cfg(not(unix))]
pub fn unix_mode(_metadata: &Metadata) -> Option<u32> {
    None
}

#[cfg(unix)]
/// Set POSIX permission bits on Unix.
pub fn set_unix_permissions(path: &Path, mode: u32) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(mode))
}

#[cfg(not(unix))]
/// No-op: POSIX permission bits are not preserved.
pub fn set_unix_permissions(_path: &Path, _mode: u32) -> io::Result<()> {
    Ok(())
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn reads_back_permission_bits() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("script.sh");
        std::fs::write(&path, b"#!/bin/sh\n").unwrap();

        set_unix_permissions(&path, 0o750).unwrap();
        let metadata = std::fs::metadata(&path).unwrap();
        assert_eq!(unix_mode(&metadata), Some(0o750));
    }
}
