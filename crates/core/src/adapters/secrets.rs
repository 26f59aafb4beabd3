pub mod env_secret_source;
