pub mod config;
pub mod credentials;
pub mod process;
pub mod secrets;
pub mod sheets;
