use thiserror::Error;

#[derive(Error, Debug)]
pub enum RoutineError {
    #[error("Routine failed: {details}")]
    RoutineFailure { details: String },
    #[error("Process exited unsuccessfully (exit code: {exit_code:?})")]
    ProcessExited { exit_code: Option<i32> },
}

impl RoutineError {
    pub fn routine_failure<S: Into<String>>(details: S) -> Self {
        RoutineError::RoutineFailure {
            details: details.into(),
        }
    }

    /// Exit code carried by the error, if the failure came from a process that ran to completion.
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            RoutineError::ProcessExited { exit_code } => *exit_code,
            RoutineError::RoutineFailure { .. } => None,
        }
    }
}

#[async_trait::async_trait]
pub trait Routine: Send + Sync {
    fn name(&self) -> &str;

    async fn run(&self) -> error_stack::Result<(), RoutineError>;
}
