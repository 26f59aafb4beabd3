use std::path::PathBuf;

use crate::domain::{extractor::CommandSpec, schedule::DailySchedule, schedule::ScheduleError};

#[derive(serde::Deserialize, Debug, Clone)]
pub struct ScheduleConfig {
    /// Daily cron expression (`"M H * * *"`) or `"HH:MM"`, always UTC.
    #[serde(default = "default_cron")]
    pub cron: String,
}

fn default_cron() -> String {
    "0 0 * * *".to_string()
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            cron: default_cron(),
        }
    }
}

impl ScheduleConfig {
    pub fn schedule(&self) -> error_stack::Result<DailySchedule, ScheduleError> {
        DailySchedule::parse(&self.cron)
    }
}

#[derive(serde::Deserialize, Debug, Clone)]
pub struct JobConfig {
    /// Wall-clock ceiling for setup, credential materialization and extractors together.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Working directory for extractors that do not set their own.
    #[serde(default)]
    pub working_dir: Option<PathBuf>,
}

fn default_timeout_secs() -> u64 {
    30 * 60
}

impl Default for JobConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            working_dir: None,
        }
    }
}

#[derive(serde::Deserialize, Debug, Clone)]
pub struct SetupConfig {
    #[serde(default = "default_setup_commands")]
    pub commands: Vec<CommandSpec>,
}

fn default_setup_commands() -> Vec<CommandSpec> {
    vec![
        CommandSpec::new("python", &["-m", "pip", "install", "--upgrade", "pip"]),
        CommandSpec::new(
            "python",
            &[
                "-m",
                "pip",
                "install",
                "cryptography",
                "gspread",
                "oauth2client",
                "requests",
            ],
        ),
    ]
}

impl Default for SetupConfig {
    fn default() -> Self {
        Self {
            commands: default_setup_commands(),
        }
    }
}
