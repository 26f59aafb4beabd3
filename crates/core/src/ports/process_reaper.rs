use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReapError {
    #[error("Failed to terminate processes matching '{pattern}': {details}")]
    KillFailed { pattern: String, details: String },
}

#[async_trait::async_trait]
pub trait ProcessReaper: Send + Sync {
    /// Forcibly terminates every process whose command line matches `pattern`.
    /// Returns whether anything matched.
    async fn kill_matching(&self, pattern: &str) -> error_stack::Result<bool, ReapError>;
}
