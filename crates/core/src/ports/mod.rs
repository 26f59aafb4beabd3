pub mod application_service;
pub mod command_handler;
pub mod process_reaper;
pub mod process_runner;
pub mod routine;
pub mod secret_source;
