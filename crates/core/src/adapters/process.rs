pub mod pkill_reaper;
pub mod tokio_process_runner;
