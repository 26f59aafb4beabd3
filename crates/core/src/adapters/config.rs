pub mod app_config;
pub mod cleanup_config;
pub mod credentials_config;
pub mod job_config;
pub mod telemetry_config;
