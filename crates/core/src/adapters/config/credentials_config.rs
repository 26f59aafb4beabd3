use std::path::PathBuf;

#[derive(serde::Deserialize, Debug, Clone)]
pub struct CredentialsConfig {
    /// Where the service-account key is materialized for the duration of a job.
    #[serde(default = "default_path")]
    pub path: PathBuf,
    #[serde(default = "default_overwrite_passes")]
    pub overwrite_passes: u32,
    /// Parse the materialized file as a Google service-account key before running extractors.
    #[serde(default = "default_validate")]
    pub validate: bool,
}

fn default_path() -> PathBuf {
    PathBuf::from("/tmp/gcp_credentials.json")
}

fn default_overwrite_passes() -> u32 {
    3
}

fn default_validate() -> bool {
    true
}

impl Default for CredentialsConfig {
    fn default() -> Self {
        Self {
            path: default_path(),
            overwrite_passes: default_overwrite_passes(),
            validate: default_validate(),
        }
    }
}

/// Names of the runner's own environment variables holding each secret.
#[derive(serde::Deserialize, Debug, Clone)]
pub struct SecretsConfig {
    #[serde(default = "default_credentials_env")]
    pub credentials_env: String,
    #[serde(default = "default_encryption_key_env")]
    pub encryption_key_env: String,
    #[serde(default = "default_sheet_id_env")]
    pub sheet_id_env: String,
    #[serde(default = "default_proxy_http_env")]
    pub proxy_http_env: String,
    #[serde(default = "default_proxy_https_env")]
    pub proxy_https_env: String,
}

fn default_credentials_env() -> String {
    "GCP_CREDENTIALS".to_string()
}

fn default_encryption_key_env() -> String {
    "ENCRYPTION_KEY".to_string()
}

fn default_sheet_id_env() -> String {
    "SHEET_ID".to_string()
}

fn default_proxy_http_env() -> String {
    "PROXY_HTTP".to_string()
}

fn default_proxy_https_env() -> String {
    "PROXY_HTTPS".to_string()
}

impl Default for SecretsConfig {
    fn default() -> Self {
        Self {
            credentials_env: default_credentials_env(),
            encryption_key_env: default_encryption_key_env(),
            sheet_id_env: default_sheet_id_env(),
            proxy_http_env: default_proxy_http_env(),
            proxy_https_env: default_proxy_https_env(),
        }
    }
}

impl SecretsConfig {
    pub fn required(&self) -> [&str; 3] {
        [
            self.credentials_env.as_str(),
            self.encryption_key_env.as_str(),
            self.sheet_id_env.as_str(),
        ]
    }
}
