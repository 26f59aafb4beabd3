pub mod cleanup;
pub mod extraction;
pub mod scheduler;
pub mod service;
pub mod setup;
pub mod shutdown;
