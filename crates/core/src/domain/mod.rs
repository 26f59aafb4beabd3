pub mod extractor;
pub mod job;
pub mod run_context;
pub mod schedule;

// Re-export commonly used types
pub use extractor::*;
pub use job::*;
pub use run_context::RunContext;
pub use schedule::DailySchedule;
