use std::{fmt, path::PathBuf, sync::Arc};

use tracing::instrument;

use crate::{
    adapters::credentials::{credential_file::CredentialFile, secure_delete::secure_delete},
    domain::job::{CleanupReport, CredentialRemoval, ReapOutcome},
    ports::process_reaper::ProcessReaper,
};

/// Best-effort teardown that runs after every job. Failures are logged and recorded in the
/// [`CleanupReport`], never returned.
pub struct CleanupRoutine {
    credentials_path: PathBuf,
    overwrite_passes: u32,
    process_patterns: Vec<String>,
    reaper: Arc<dyn ProcessReaper>,
}

impl fmt::Debug for CleanupRoutine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CleanupRoutine")
            .field("credentials_path", &self.credentials_path)
            .field("process_patterns", &self.process_patterns)
            .finish()
    }
}

impl CleanupRoutine {
    pub fn new(
        credentials_path: PathBuf,
        overwrite_passes: u32,
        process_patterns: Vec<String>,
        reaper: Arc<dyn ProcessReaper>,
    ) -> Self {
        Self {
            credentials_path,
            overwrite_passes,
            process_patterns,
            reaper,
        }
    }

    /// `credential` is the guard from this job, if materialization got that far. The configured
    /// path is scrubbed either way so leftovers from an interrupted run do not survive.
    #[instrument(skip(self, credential), name = "CleanupRoutine::run")]
    pub async fn run(&self, credential: Option<CredentialFile>) -> CleanupReport {
        let credential = self.remove_credential(credential);
        let mut processes = Vec::with_capacity(self.process_patterns.len());

        for pattern in &self.process_patterns {
            let outcome = match self.reaper.kill_matching(pattern).await {
                Ok(true) => {
                    tracing::warn!("🔪 Killed lingering processes matching '{}'", pattern);
                    ReapOutcome::Killed
                }
                Ok(false) => {
                    tracing::trace!("No processes matching '{}'", pattern);
                    ReapOutcome::NoMatch
                }
                Err(report) => {
                    tracing::warn!("⚠️ Ignoring pkill failure for '{}': {:?}", pattern, report);
                    ReapOutcome::Failed {
                        details: report.current_context().to_string(),
                    }
                }
            };
            processes.push((pattern.clone(), outcome));
        }

        tracing::info!("🧹 Cleanup finished");
        CleanupReport {
            credential,
            processes,
        }
    }

    fn remove_credential(&self, credential: Option<CredentialFile>) -> CredentialRemoval {
        let result = match credential {
            Some(file) => file.release().map_err(|report| format!("{:?}", report)),
            None => secure_delete(&self.credentials_path, self.overwrite_passes)
                .map_err(|report| format!("{:?}", report)),
        };

        match result {
            Ok(true) => {
                tracing::info!(
                    "🔒 Credential file {} shredded",
                    self.credentials_path.display()
                );
                CredentialRemoval::Shredded
            }
            Ok(false) => CredentialRemoval::NotPresent,
            Err(details) => {
                tracing::warn!(
                    "⚠️ Secure delete of {} failed, unlinking: {}",
                    self.credentials_path.display(),
                    details
                );
                match std::fs::remove_file(&self.credentials_path) {
                    Ok(()) => CredentialRemoval::Shredded,
                    Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                        CredentialRemoval::NotPresent
                    }
                    Err(err) => CredentialRemoval::Failed {
                        details: format!("{}; unlink: {}", details, err),
                    },
                }
            }
        }
    }
}
