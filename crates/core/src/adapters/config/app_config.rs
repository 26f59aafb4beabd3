use std::collections::HashSet;

use config::{Config, FileFormat};
use error_stack::{report, ResultExt};
use serde::Deserialize;
use serde_path_to_error::{Deserializer as PathDeserializer, Segment, Track};
use thiserror::Error;

use crate::domain::extractor::ExtractorSpec;

use super::{
    cleanup_config::CleanupConfig,
    credentials_config::{CredentialsConfig, SecretsConfig},
    job_config::{JobConfig, ScheduleConfig, SetupConfig},
    telemetry_config::TelemetryConfig,
};

pub const CONFIG_PATH_ENV: &str = "CONFIG_PATH";
pub const ENV_PREFIX: &str = "BALANCE_SYNC";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Error reading config '{origin}'")]
    Load { origin: String },
    #[error("Failed to deserialize config '{origin}' at field '{field}'")]
    Deserialize { origin: String, field: String },
    #[error("Invalid config: {details}")]
    Invalid { details: String },
}

#[derive(serde::Deserialize, Debug, Clone)]
pub struct AppConfig {
    #[serde(default)]
    pub schedule: ScheduleConfig,
    #[serde(default)]
    pub job: JobConfig,
    #[serde(default)]
    pub setup: SetupConfig,
    #[serde(default)]
    pub credentials: CredentialsConfig,
    #[serde(default)]
    pub secrets: SecretsConfig,
    #[serde(default = "default_extractors")]
    pub extractors: Vec<ExtractorSpec>,
    #[serde(default)]
    pub cleanup: CleanupConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

fn default_extractors() -> Vec<ExtractorSpec> {
    vec![ExtractorSpec::binance(), ExtractorSpec::bybit()]
}

impl AppConfig {
    /// Loads the file named by `CONFIG_PATH` (default `Config`, any extension the `config`
    /// crate understands) and applies `BALANCE_SYNC__SECTION__KEY` overrides. A missing file
    /// leaves every section at its default.
    pub fn load() -> error_stack::Result<Self, ConfigError> {
        let config_path = std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| "Config".to_string());
        let config = Config::builder()
            .add_source(config::File::with_name(&config_path).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .change_context_lazy(|| ConfigError::Load {
                origin: config_path.clone(),
            })?;

        Self::from_config(config, &config_path)
    }

    pub fn from_toml_str(contents: &str) -> error_stack::Result<Self, ConfigError> {
        let config = Config::builder()
            .add_source(config::File::from_str(contents, FileFormat::Toml))
            .build()
            .change_context(ConfigError::Load {
                origin: "<inline>".to_string(),
            })?;

        Self::from_config(config, "<inline>")
    }

    fn from_config(config: Config, origin: &str) -> error_stack::Result<Self, ConfigError> {
        let value = config
            .try_deserialize::<serde_json::Value>()
            .change_context(ConfigError::Load {
                origin: origin.to_string(),
            })?;

        use serde::de::IntoDeserializer;
        let mut track = Track::new();
        let path_de = PathDeserializer::new(value.into_deserializer(), &mut track);
        let app_config = match AppConfig::deserialize(path_de) {
            Ok(val) => val,
            Err(e) => {
                let path_str = track
                    .path()
                    .iter()
                    .map(|seg| match seg {
                        Segment::Seq { index } => format!("[{}]", index),
                        Segment::Map { key } => format!(".{}", key),
                        Segment::Enum { variant } => format!("::{}", variant),
                        Segment::Unknown => String::from("<?>"),
                    })
                    .collect::<String>();
                return Err(report!(ConfigError::Deserialize {
                    origin: origin.to_string(),
                    field: path_str.trim_start_matches('.').to_string(),
                })
                .attach_printable(e.to_string()));
            }
        };

        app_config.validate()?;
        Ok(app_config)
    }

    pub fn validate(&self) -> error_stack::Result<(), ConfigError> {
        self.schedule
            .schedule()
            .change_context(ConfigError::Invalid {
                details: format!("schedule.cron '{}'", self.schedule.cron),
            })?;

        if self.job.timeout_secs == 0 {
            return Err(invalid("job.timeout_secs must be at least 1"));
        }

        if self.credentials.overwrite_passes == 0 {
            return Err(invalid("credentials.overwrite_passes must be at least 1"));
        }

        if self.extractors.is_empty() {
            return Err(invalid("at least one extractor must be configured"));
        }

        let mut names = HashSet::new();
        for extractor in &self.extractors {
            if extractor.name.trim().is_empty() {
                return Err(invalid("extractor names must not be empty"));
            }
            if !names.insert(extractor.name.as_str()) {
                return Err(invalid(format!(
                    "extractor '{}' is configured twice",
                    extractor.name
                )));
            }
        }

        for pattern in &self.cleanup.process_patterns {
            if pattern.trim().is_empty() {
                return Err(invalid("cleanup.process_patterns must not contain empty patterns"));
            }
            regex::Regex::new(pattern)
                .change_context(ConfigError::Invalid {
                    details: format!("cleanup pattern '{}' is not a valid regex", pattern),
                })?;
        }

        Ok(())
    }
}

fn invalid<S: Into<String>>(details: S) -> error_stack::Report<ConfigError> {
    report!(ConfigError::Invalid {
        details: details.into(),
    })
}
