#[derive(serde::Deserialize, Debug, Clone)]
pub struct CleanupConfig {
    /// `pkill -f` patterns for processes that must not outlive a job.
    #[serde(default = "default_process_patterns")]
    pub process_patterns: Vec<String>,
}

fn default_process_patterns() -> Vec<String> {
    vec!["binance_script.py".to_string(), "bybit_script.py".to_string()]
}

impl Default for CleanupConfig {
    fn default() -> Self {
        Self {
            process_patterns: default_process_patterns(),
        }
    }
}
