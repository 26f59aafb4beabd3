use std::{fmt, path::PathBuf};

use zeroize::Zeroizing;

pub const GOOGLE_APPLICATION_CREDENTIALS: &str = "GOOGLE_APPLICATION_CREDENTIALS";
/// Alias for the credential path, read by the extraction scripts' own environment validation.
pub const GCP_CREDENTIALS_PATH: &str = "GCP_CREDENTIALS_PATH";
pub const ENCRYPTION_KEY: &str = "ENCRYPTION_KEY";
pub const PROXY_HTTP: &str = "PROXY_HTTP";
pub const PROXY_HTTPS: &str = "PROXY_HTTPS";
pub const SHEET_ID: &str = "SHEET_ID";
pub const SHEET_NAME: &str = "SHEET_NAME";

/// One environment variable handed to a child process. The value is wiped from memory on drop.
pub struct EnvVar {
    pub name: &'static str,
    pub value: Zeroizing<String>,
}

impl EnvVar {
    pub fn new(name: &'static str, value: &str) -> Self {
        Self {
            name,
            value: Zeroizing::new(value.to_string()),
        }
    }

    /// Proxy URLs may embed credentials.
    fn is_secret(&self) -> bool {
        matches!(self.name, ENCRYPTION_KEY | PROXY_HTTP | PROXY_HTTPS)
    }
}

impl fmt::Debug for EnvVar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_secret() {
            write!(f, "{}=<redacted>", self.name)
        } else {
            write!(f, "{}={}", self.name, self.value.as_str())
        }
    }
}

/// Values shared by every extractor invocation of a single job.
pub struct RunContext {
    sheet_id: String,
    encryption_key: Zeroizing<String>,
    proxy_http: Option<String>,
    proxy_https: Option<String>,
    credentials_path: PathBuf,
}

impl RunContext {
    pub fn new(
        sheet_id: impl Into<String>,
        encryption_key: Zeroizing<String>,
        credentials_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            sheet_id: sheet_id.into(),
            encryption_key,
            proxy_http: None,
            proxy_https: None,
            credentials_path: credentials_path.into(),
        }
    }

    /// Empty proxy values are treated as unset.
    pub fn with_proxies(mut self, http: Option<String>, https: Option<String>) -> Self {
        self.proxy_http = http.filter(|value| !value.trim().is_empty());
        self.proxy_https = https.filter(|value| !value.trim().is_empty());
        self
    }

    /// Environment for one extractor writing into `sheet_name`.
    pub fn environment_for(&self, sheet_name: &str) -> Vec<EnvVar> {
        let credentials_path = self.credentials_path.to_string_lossy();

        let mut env = vec![
            EnvVar::new(GOOGLE_APPLICATION_CREDENTIALS, &credentials_path),
            EnvVar::new(GCP_CREDENTIALS_PATH, &credentials_path),
            EnvVar::new(ENCRYPTION_KEY, &self.encryption_key),
            EnvVar::new(SHEET_ID, &self.sheet_id),
            EnvVar::new(SHEET_NAME, sheet_name),
        ];
        if let Some(proxy) = &self.proxy_http {
            env.push(EnvVar::new(PROXY_HTTP, proxy));
        }
        if let Some(proxy) = &self.proxy_https {
            env.push(EnvVar::new(PROXY_HTTPS, proxy));
        }
        env
    }
}

impl fmt::Debug for RunContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunContext")
            .field("sheet_id", &self.sheet_id)
            .field("encryption_key", &"<redacted>")
            .field("proxy_http", &self.proxy_http.as_ref().map(|_| "<redacted>"))
            .field("proxy_https", &self.proxy_https.as_ref().map(|_| "<redacted>"))
            .field("credentials_path", &self.credentials_path)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context() -> RunContext {
        RunContext::new(
            "sheet-123",
            Zeroizing::new("s3cr3t".to_string()),
            "/tmp/gcp_credentials.json",
        )
    }

    fn lookup<'a>(env: &'a [EnvVar], name: &str) -> Option<&'a str> {
        env.iter()
            .find(|var| var.name == name)
            .map(|var| var.value.as_str())
    }

    #[test]
    fn test_environment_contains_contract_variables() {
        let env = context().environment_for("Sheet1");
        assert_eq!(
            lookup(&env, GOOGLE_APPLICATION_CREDENTIALS),
            Some("/tmp/gcp_credentials.json")
        );
        assert_eq!(
            lookup(&env, GCP_CREDENTIALS_PATH),
            Some("/tmp/gcp_credentials.json")
        );
        assert_eq!(lookup(&env, ENCRYPTION_KEY), Some("s3cr3t"));
        assert_eq!(lookup(&env, SHEET_ID), Some("sheet-123"));
        assert_eq!(lookup(&env, SHEET_NAME), Some("Sheet1"));
    }

    #[test]
    fn test_sheet_name_differs_and_sheet_id_is_shared() {
        let context = context();
        let first = context.environment_for("Sheet1");
        let second = context.environment_for("Sheet2");
        assert_eq!(lookup(&first, SHEET_NAME), Some("Sheet1"));
        assert_eq!(lookup(&second, SHEET_NAME), Some("Sheet2"));
        assert_eq!(lookup(&first, SHEET_ID), lookup(&second, SHEET_ID));
    }

    #[test]
    fn test_proxies_omitted_when_unset_or_empty() {
        let env = context()
            .with_proxies(None, Some("  ".to_string()))
            .environment_for("Sheet1");
        assert_eq!(lookup(&env, PROXY_HTTP), None);
        assert_eq!(lookup(&env, PROXY_HTTPS), None);
    }

    #[test]
    fn test_proxies_forwarded_when_set() {
        let env = context()
            .with_proxies(
                Some("http://proxy:8080".to_string()),
                Some("http://proxy:8443".to_string()),
            )
            .environment_for("Sheet2");
        assert_eq!(lookup(&env, PROXY_HTTP), Some("http://proxy:8080"));
        assert_eq!(lookup(&env, PROXY_HTTPS), Some("http://proxy:8443"));
    }

    #[test]
    fn test_debug_redacts_encryption_key() {
        let context = context();
        assert!(!format!("{:?}", context).contains("s3cr3t"));
        assert!(!format!("{:?}", context.environment_for("Sheet1")).contains("s3cr3t"));
    }
}
