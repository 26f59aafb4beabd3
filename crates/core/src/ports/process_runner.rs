use std::{fmt, path::PathBuf};

use thiserror::Error;

use crate::domain::{extractor::CommandSpec, run_context::EnvVar};

#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("Failed to spawn '{program}'")]
    SpawnFailed { program: String },
    #[error("Failed waiting for '{program}'")]
    WaitFailed { program: String },
}

/// Everything needed to start one child process.
pub struct ProcessInvocation {
    pub command: CommandSpec,
    pub env: Vec<EnvVar>,
    /// Variables of the runner's own environment that the child must not inherit.
    pub env_remove: Vec<String>,
    pub working_dir: Option<PathBuf>,
}

impl ProcessInvocation {
    pub fn new(command: CommandSpec) -> Self {
        Self {
            command,
            env: Vec::new(),
            env_remove: Vec::new(),
            working_dir: None,
        }
    }

    pub fn with_env(mut self, env: Vec<EnvVar>) -> Self {
        self.env = env;
        self
    }

    pub fn with_env_removed(mut self, names: Vec<String>) -> Self {
        self.env_remove = names;
        self
    }

    pub fn with_working_dir(mut self, working_dir: Option<PathBuf>) -> Self {
        self.working_dir = working_dir;
        self
    }
}

impl fmt::Debug for ProcessInvocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProcessInvocation")
            .field("command", &self.command.to_string())
            .field("env", &self.env)
            .field("env_remove", &self.env_remove)
            .field("working_dir", &self.working_dir)
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessExit {
    /// `None` when the process was terminated by a signal.
    pub code: Option<i32>,
}

impl ProcessExit {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

#[async_trait::async_trait]
pub trait ProcessRunner: Send + Sync {
    /// Runs the process to completion. Dropping the returned future must terminate the child.
    async fn run(
        &self,
        invocation: &ProcessInvocation,
    ) -> error_stack::Result<ProcessExit, ProcessError>;
}
