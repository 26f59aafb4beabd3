use std::path::PathBuf;

#[derive(serde::Deserialize, Debug, Clone)]
pub struct TelemetryConfig {
    #[serde(default = "default_level")]
    pub level: String,
    #[serde(default = "default_log_file")]
    pub log_file: Option<PathBuf>,
    /// OTLP gRPC endpoint, e.g. `http://localhost:4317`. Tracing export is off when unset.
    #[serde(default)]
    pub otlp_endpoint: Option<String>,
    #[serde(default = "default_service_name")]
    pub service_name: String,
}

fn default_level() -> String {
    "info".to_string()
}

fn default_log_file() -> Option<PathBuf> {
    Some(PathBuf::from("balance_sync.log"))
}

fn default_service_name() -> String {
    "balance_sync".to_string()
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            log_file: default_log_file(),
            otlp_endpoint: None,
            service_name: default_service_name(),
        }
    }
}
