pub mod monitor;
pub mod record;

pub use monitor::ExecutionMonitor;
pub use record::{ExecutionRecord, ExecutionStatus, JobStatistics, StepRecord};
