use std::{
    fs::OpenOptions,
    io::Write,
    path::{Path, PathBuf},
};

use error_stack::ResultExt;
use thiserror::Error;
use tracing::instrument;

use super::secure_delete::{secure_delete, SecureDeleteError};

#[derive(Error, Debug)]
pub enum CredentialError {
    #[error("Failed to write credential file")]
    WriteFailed,
    #[error("Credential file is not a valid service account key")]
    InvalidServiceAccountKey,
    #[error("Failed to remove credential file")]
    RemoveFailed,
}

/// A secret materialized on disk for the lifetime of a job.
///
/// The file is created owner read/write only. [`CredentialFile::release`] securely deletes it;
/// if the guard is dropped without being released (early return, panic) the same deletion is
/// attempted on drop.
#[derive(Debug)]
pub struct CredentialFile {
    path: PathBuf,
    overwrite_passes: u32,
    armed: bool,
}

impl CredentialFile {
    #[instrument(skip(contents), name = "CredentialFile::materialize")]
    pub fn materialize(
        path: &Path,
        contents: &[u8],
        overwrite_passes: u32,
    ) -> error_stack::Result<Self, CredentialError> {
        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .change_context(CredentialError::WriteFailed)
                .attach_printable_lazy(|| format!("directory: {}", parent.display()))?;
        }

        // A leftover from a previous run may have looser permissions; never reuse it.
        if secure_delete(path, overwrite_passes).change_context(CredentialError::WriteFailed)? {
            tracing::warn!("🧹 Removed stale credential file at {}", path.display());
        }

        // Armed before the first write so a partial file is still removed on drop.
        let guard = Self {
            path: path.to_path_buf(),
            overwrite_passes,
            armed: true,
        };

        let mut options = OpenOptions::new();
        options.write(true).create_new(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }

        let mut file = options
            .open(path)
            .change_context(CredentialError::WriteFailed)
            .attach_printable_lazy(|| format!("path: {}", path.display()))?;
        file.write_all(contents)
            .change_context(CredentialError::WriteFailed)?;
        file.sync_all()
            .change_context(CredentialError::WriteFailed)?;

        tracing::debug!("🔑 Credential file written to {}", path.display());
        Ok(guard)
    }

    /// Securely deletes the file. Returns whether a file was actually present.
    #[instrument(name = "CredentialFile::release")]
    pub fn release(mut self) -> error_stack::Result<bool, CredentialError> {
        self.armed = false;
        self.remove().change_context(CredentialError::RemoveFailed)
    }

    fn remove(&self) -> error_stack::Result<bool, SecureDeleteError> {
        secure_delete(&self.path, self.overwrite_passes)
    }
}

impl Drop for CredentialFile {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        if let Err(report) = self.remove() {
            tracing::warn!(
                "⚠️ Could not remove credential file {} on drop: {:?}",
                self.path.display(),
                report
            );
            let _ = std::fs::remove_file(&self.path);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_materialize_writes_contents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("gcp_credentials.json");

        let file = CredentialFile::materialize(&path, b"{\"type\":\"service_account\"}", 1).unwrap();
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "{\"type\":\"service_account\"}"
        );
        file.release().unwrap();
    }

    #[cfg(unix)]
    #[test]
    fn test_materialize_restricts_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gcp_credentials.json");

        let file = CredentialFile::materialize(&path, b"secret", 1).unwrap();
        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
        file.release().unwrap();
    }

    #[test]
    fn test_materialize_replaces_stale_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gcp_credentials.json");
        std::fs::write(&path, b"stale").unwrap();

        let file = CredentialFile::materialize(&path, b"fresh", 1).unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"fresh");
        file.release().unwrap();
    }

    #[cfg(unix)]
    #[test]
    fn test_materialize_replaces_stale_symlink_without_following_it() {
        let dir = tempfile::tempdir().unwrap();
        let victim = dir.path().join("victim.txt");
        let path = dir.path().join("gcp_credentials.json");
        std::fs::write(&victim, b"important data").unwrap();
        std::os::unix::fs::symlink(&victim, &path).unwrap();

        let file = CredentialFile::materialize(&path, b"secret", 1).unwrap();
        assert!(!std::fs::symlink_metadata(&path)
            .unwrap()
            .file_type()
            .is_symlink());
        assert_eq!(std::fs::read(&path).unwrap(), b"secret");
        file.release().unwrap();

        assert!(!path.exists());
        assert_eq!(std::fs::read(&victim).unwrap(), b"important data");
    }

    #[test]
    fn test_release_removes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gcp_credentials.json");

        let file = CredentialFile::materialize(&path, b"secret", 2).unwrap();
        assert!(file.release().unwrap());
        assert!(!path.exists());
    }

    #[test]
    fn test_release_when_already_gone() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gcp_credentials.json");

        let file = CredentialFile::materialize(&path, b"secret", 1).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert!(!file.release().unwrap());
    }

    #[test]
    fn test_drop_removes_unreleased_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gcp_credentials.json");

        {
            let _file = CredentialFile::materialize(&path, b"secret", 1).unwrap();
            assert!(path.exists());
        }
        assert!(!path.exists());
    }
}
