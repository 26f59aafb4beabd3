use std::{fmt, time::Duration};

use chrono::{DateTime, Utc};

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum StepKind {
    #[strum(serialize = "setup")]
    Setup,
    #[strum(serialize = "credential")]
    Credential,
    #[strum(serialize = "extractor")]
    Extractor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepStatus {
    Succeeded,
    /// `exit_code` is `None` when the process could not be spawned or was killed by a signal.
    Failed { exit_code: Option<i32> },
    Skipped,
    TimedOut,
    Cancelled,
}

impl StepStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, StepStatus::Succeeded)
    }
}

impl fmt::Display for StepStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StepStatus::Succeeded => write!(f, "OK"),
            StepStatus::Failed {
                exit_code: Some(code),
            } => write!(f, "failed (exit code {})", code),
            StepStatus::Failed { exit_code: None } => write!(f, "failed"),
            StepStatus::Skipped => write!(f, "skipped"),
            StepStatus::TimedOut => write!(f, "timed out"),
            StepStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct StepReport {
    pub name: String,
    pub kind: StepKind,
    pub status: StepStatus,
    pub duration: Duration,
}

impl StepReport {
    pub fn skipped<N: Into<String>>(name: N, kind: StepKind) -> Self {
        Self {
            name: name.into(),
            kind,
            status: StepStatus::Skipped,
            duration: Duration::ZERO,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    Succeeded,
    /// A required secret was missing; nothing was spawned or written.
    PreflightFailed { details: String },
    SetupFailed,
    CredentialFailed,
    ExtractionFailed { step: String },
    TimedOut,
    /// Interrupted by a shutdown signal.
    Cancelled,
}

impl fmt::Display for JobOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobOutcome::Succeeded => write!(f, "succeeded"),
            JobOutcome::PreflightFailed { details } => write!(f, "preflight failed: {}", details),
            JobOutcome::SetupFailed => write!(f, "dependency setup failed"),
            JobOutcome::CredentialFailed => write!(f, "credential materialization failed"),
            JobOutcome::ExtractionFailed { step } => write!(f, "extractor '{}' failed", step),
            JobOutcome::TimedOut => write!(f, "timed out"),
            JobOutcome::Cancelled => write!(f, "cancelled"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialRemoval {
    Shredded,
    NotPresent,
    Failed { details: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReapOutcome {
    Killed,
    NoMatch,
    Failed { details: String },
}

#[derive(Debug, Clone)]
pub struct CleanupReport {
    pub credential: CredentialRemoval,
    pub processes: Vec<(String, ReapOutcome)>,
}

impl CleanupReport {
    /// Cleanup never fails the job, whatever happened underneath.
    pub fn status(&self) -> StepStatus {
        StepStatus::Succeeded
    }

    pub fn warnings(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        if let CredentialRemoval::Failed { details } = &self.credential {
            warnings.push(format!("credential removal: {}", details));
        }
        for (pattern, outcome) in &self.processes {
            if let ReapOutcome::Failed { details } = outcome {
                warnings.push(format!("pkill '{}': {}", pattern, details));
            }
        }
        warnings
    }
}

#[derive(Debug, Clone)]
pub struct JobReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub steps: Vec<StepReport>,
    pub outcome: JobOutcome,
    pub cleanup: CleanupReport,
}

impl JobReport {
    pub fn is_success(&self) -> bool {
        self.outcome == JobOutcome::Succeeded
    }

    pub fn step(&self, name: &str) -> Option<&StepReport> {
        self.steps.iter().find(|step| step.name == name)
    }
}

impl fmt::Display for JobReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "\nStep Results:")?;
        let mut success_count = 0;
        let mut failure_count = 0;
        for step in &self.steps {
            let icon = match step.status {
                StepStatus::Succeeded => {
                    success_count += 1;
                    "✅"
                }
                StepStatus::Skipped => "⏭️ ",
                StepStatus::Failed { .. } | StepStatus::TimedOut | StepStatus::Cancelled => {
                    failure_count += 1;
                    "❌"
                }
            };
            writeln!(
                f,
                "{} [{}] {}: {} ({:.1?})",
                icon, step.kind, step.name, step.status, step.duration
            )?;
        }
        writeln!(f, "🧹 cleanup: {}", self.cleanup.status())?;
        for warning in self.cleanup.warnings() {
            writeln!(f, "   ⚠️  {}", warning)?;
        }
        write!(
            f,
            "\nSummary: {} successful, {} failed, job {}",
            success_count, failure_count, self.outcome
        )
    }
}
