use std::process::Stdio;

use error_stack::ResultExt;
use tokio::process::Command;
use tracing::instrument;

use crate::ports::process_runner::{ProcessError, ProcessExit, ProcessInvocation, ProcessRunner};

/// Spawns children with inherited stdout/stderr so their own logging reaches the job output.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioProcessRunner;

#[async_trait::async_trait]
impl ProcessRunner for TokioProcessRunner {
    #[instrument(skip(self), name = "TokioProcessRunner::run")]
    async fn run(
        &self,
        invocation: &ProcessInvocation,
    ) -> error_stack::Result<ProcessExit, ProcessError> {
        let program = invocation.command.program.clone();

        let mut command = Command::new(&invocation.command.program);
        command
            .args(&invocation.command.args)
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .kill_on_drop(true);
        for name in &invocation.env_remove {
            command.env_remove(name);
        }
        for var in &invocation.env {
            command.env(var.name, var.value.as_str());
        }
        if let Some(dir) = &invocation.working_dir {
            command.current_dir(dir);
        }

        tracing::trace!("🚀 Spawning {}", invocation.command);
        let mut child = command
            .spawn()
            .change_context_lazy(|| ProcessError::SpawnFailed {
                program: program.clone(),
            })
            .attach_printable_lazy(|| format!("command: {}", invocation.command))?;

        let status = child
            .wait()
            .await
            .change_context_lazy(|| ProcessError::WaitFailed {
                program: program.clone(),
            })?;

        tracing::trace!("🏁 {} exited with {:?}", program, status.code());
        Ok(ProcessExit {
            code: status.code(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{extractor::CommandSpec, run_context::EnvVar};

    fn sh(script: &str) -> ProcessInvocation {
        ProcessInvocation::new(CommandSpec::new("sh", &["-c", script]))
    }

    #[tokio::test]
    async fn test_reports_exit_code() {
        let exit = TokioProcessRunner.run(&sh("exit 3")).await.unwrap();
        assert_eq!(exit.code, Some(3));
        assert!(!exit.success());

        let exit = TokioProcessRunner.run(&sh("true")).await.unwrap();
        assert!(exit.success());
    }

    #[tokio::test]
    async fn test_passes_environment() {
        let invocation = sh(r#"test "$SHEET_NAME" = "Sheet1" && test "$SHEET_ID" = "abc""#)
            .with_env(vec![
                EnvVar::new("SHEET_NAME", "Sheet1"),
                EnvVar::new("SHEET_ID", "abc"),
            ]);
        let exit = TokioProcessRunner.run(&invocation).await.unwrap();
        assert!(exit.success());
    }

    #[tokio::test]
    async fn test_removes_inherited_variables() {
        std::env::set_var("BALANCE_SYNC_TEST_SCRUBBED", "raw-key");
        let invocation = sh(r#"test -z "$BALANCE_SYNC_TEST_SCRUBBED""#)
            .with_env_removed(vec!["BALANCE_SYNC_TEST_SCRUBBED".to_string()]);
        let exit = TokioProcessRunner.run(&invocation).await.unwrap();
        assert!(exit.success());
    }

    #[tokio::test]
    async fn test_uses_working_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("marker"), b"").unwrap();
        let invocation = sh("test -f marker").with_working_dir(Some(dir.path().to_path_buf()));
        let exit = TokioProcessRunner.run(&invocation).await.unwrap();
        assert!(exit.success());
    }

    #[tokio::test]
    async fn test_spawn_failure() {
        let invocation = ProcessInvocation::new(CommandSpec::new(
            "/nonexistent/balance-sync-extractor",
            &[],
        ));
        let err = TokioProcessRunner.run(&invocation).await.unwrap_err();
        assert!(matches!(
            err.current_context(),
            ProcessError::SpawnFailed { .. }
        ));
    }
}
