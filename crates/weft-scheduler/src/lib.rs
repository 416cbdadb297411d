pub mod capability;
pub mod cron;
pub mod job;
pub mod scheduler;

pub use capability::{MonitoringExecutor, PipelineExecutor};
pub use cron::{parse_cron, CronSchedule};
pub use job::{new_monitoring_job, new_pipeline_job, ScheduledJob};
pub use scheduler::Scheduler;
