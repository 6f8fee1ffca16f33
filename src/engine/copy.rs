//! Atomic file copy into the replica

use crate::types::MirraError;
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

/// Copy `source` to `replica` using the write-then-rename strategy.
///
/// Data is streamed into a sibling staging file, flushed to disk, stamped
/// with the source mtime, and renamed into place. A reader of the replica
/// never observes a torn file, and a crash mid-copy leaves only a staging
/// file that the next pass removes as an orphan.
///
/// Returns the number of bytes copied.
pub fn copy_file(source: &Path, replica: &Path) -> Result<u64, MirraError> {
    let staging = staging_path(replica);

    let mut src_file = File::open(source).map_err(|e| MirraError::io(source, e))?;
    let mut out_file = File::create(&staging).map_err(|e| MirraError::io(&staging, e))?;

    let mut buffer = vec![0u8; 128 * 1024];
    let mut total_bytes = 0u64;

    loop {
        let bytes_read = src_file
            .read(&mut buffer)
            .map_err(|e| MirraError::io(source, e))?;
        if bytes_read == 0 {
            break;
        }
        out_file
            .write_all(&buffer[..bytes_read])
            .map_err(|e| MirraError::io(&staging, e))?;
        total_bytes += bytes_read as u64;
    }

    out_file.sync_all().map_err(|e| MirraError::io(&staging, e))?;

    // Windows cannot rename a file with an open handle.
    drop(out_file);

    // Carry the source mtime over so the replica timestamps mirror the
    // source. Permissions are deliberately not replicated.
    let mtime = fs::metadata(source)
        .and_then(|m| m.modified())
        .map_err(|e| MirraError::io(source, e))?;
    filetime::set_file_mtime(&staging, filetime::FileTime::from_system_time(mtime))
        .map_err(|e| MirraError::io(&staging, e))?;

    fs::rename(&staging, replica).map_err(|e| MirraError::io(replica, e))?;

    Ok(total_bytes)
}

/// Staging name with `.part` appended (not substituted): `a.txt` stages as
/// `a.txt.part`, so two source files differing only in extension can never
/// share a staging path.
fn staging_path(replica: &Path) -> PathBuf {
    let mut name = replica.as_os_str().to_os_string();
    name.push(".part");
    PathBuf::from(name)
}
