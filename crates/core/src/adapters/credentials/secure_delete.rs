use std::{
    fs::OpenOptions,
    io::{self, Seek, SeekFrom, Write},
    path::Path,
};

use error_stack::ResultExt;
use rand::RngCore;
use thiserror::Error;

const CHUNK_SIZE: usize = 8 * 1024;

#[derive(Error, Debug)]
pub enum SecureDeleteError {
    #[error("Failed to overwrite file contents")]
    OverwriteFailed,
    #[error("Failed to unlink file")]
    UnlinkFailed,
}

/// Overwrites `path` with `passes` rounds of random bytes followed by a zero pass, flushes to
/// disk, truncates and unlinks it.
///
/// Returns `Ok(false)` when there was nothing to delete. Anything other than a regular file
/// (a symlink in particular) is unlinked without touching what it points to.
pub fn secure_delete(path: &Path, passes: u32) -> error_stack::Result<bool, SecureDeleteError> {
    let metadata = match std::fs::symlink_metadata(path) {
        Ok(metadata) => metadata,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(false),
        Err(err) => {
            return Err(err)
                .change_context(SecureDeleteError::OverwriteFailed)
                .attach_printable_lazy(|| format!("path: {}", path.display()))
        }
    };

    if !metadata.file_type().is_file() {
        tracing::warn!(
            "⚠️ {} is not a regular file, unlinking without overwrite",
            path.display()
        );
        return unlink(path);
    }

    let mut file = match OpenOptions::new().write(true).open(path) {
        Ok(file) => file,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(false),
        Err(err) => {
            return Err(err)
                .change_context(SecureDeleteError::OverwriteFailed)
                .attach_printable_lazy(|| format!("path: {}", path.display()))
        }
    };

    let opened = file
        .metadata()
        .change_context(SecureDeleteError::OverwriteFailed)?;

    // The path must still name the file that was checked above.
    #[cfg(unix)]
    {
        use std::os::unix::fs::MetadataExt;
        if opened.dev() != metadata.dev() || opened.ino() != metadata.ino() {
            drop(file);
            tracing::warn!("⚠️ {} changed while shredding, unlinking only", path.display());
            return unlink(path);
        }
    }

    let len = opened.len();

    let mut rng = rand::thread_rng();
    let mut buffer = vec![0u8; CHUNK_SIZE];
    for pass in 0..=passes {
        let zero_pass = pass == passes;
        file.seek(SeekFrom::Start(0))
            .change_context(SecureDeleteError::OverwriteFailed)?;

        let mut remaining = len;
        while remaining > 0 {
            let chunk = remaining.min(CHUNK_SIZE as u64) as usize;
            if zero_pass {
                buffer[..chunk].fill(0);
            } else {
                rng.fill_bytes(&mut buffer[..chunk]);
            }
            file.write_all(&buffer[..chunk])
                .change_context(SecureDeleteError::OverwriteFailed)?;
            remaining -= chunk as u64;
        }
        file.sync_all()
            .change_context(SecureDeleteError::OverwriteFailed)?;
    }

    file.set_len(0)
        .change_context(SecureDeleteError::OverwriteFailed)?;
    drop(file);

    unlink(path)
}

fn unlink(path: &Path) -> error_stack::Result<bool, SecureDeleteError> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(true),
        Err(err) => Err(err)
            .change_context(SecureDeleteError::UnlinkFailed)
            .attach_printable_lazy(|| format!("path: {}", path.display())),
    }
}
