//! Content digesting

use crate::types::MirraError;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Compute the BLAKE3 digest of a file.
///
/// The file is streamed in 64KB chunks so arbitrarily large files digest in
/// constant memory.
///
/// # Errors
/// Returns `MirraError` carrying the failing path if the file cannot be
/// opened or read.
pub fn file_digest(path: &Path) -> Result<blake3::Hash, MirraError> {
    let mut file = File::open(path).map_err(|e| MirraError::io(path, e))?;
    let mut hasher = blake3::Hasher::new();
    let mut buffer = vec![0u8; 64 * 1024];

    loop {
        let bytes_read = file.read(&mut buffer).map_err(|e| MirraError::io(path, e))?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }

    Ok(hasher.finalize())
}
