use error_stack::report;
use tokio::process::Command;
use tracing::instrument;

use crate::ports::process_reaper::{ProcessReaper, ReapError};

/// Terminates lingering processes with `pkill -9 -f <pattern>`.
#[derive(Debug, Clone)]
pub struct PkillReaper {
    program: String,
}

impl Default for PkillReaper {
    fn default() -> Self {
        Self {
            program: "pkill".to_string(),
        }
    }
}

impl PkillReaper {
    pub fn with_program<S: Into<String>>(program: S) -> Self {
        Self {
            program: program.into(),
        }
    }
}

#[async_trait::async_trait]
impl ProcessReaper for PkillReaper {
    #[instrument(skip(self), name = "PkillReaper::kill_matching")]
    async fn kill_matching(&self, pattern: &str) -> error_stack::Result<bool, ReapError> {
        let output = Command::new(&self.program)
            .args(["-9", "-f", pattern])
            .output()
            .await
            .map_err(|err| {
                report!(ReapError::KillFailed {
                    pattern: pattern.to_string(),
                    details: err.to_string(),
                })
            })?;

        // pkill: 0 = something matched, 1 = nothing matched, anything else is an error.
        match output.status.code() {
            Some(0) => Ok(true),
            Some(1) => Ok(false),
            code => Err(report!(ReapError::KillFailed {
                pattern: pattern.to_string(),
                details: format!(
                    "{} exited with {:?}: {}",
                    self.program,
                    code,
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            })),
        }
    }
}
