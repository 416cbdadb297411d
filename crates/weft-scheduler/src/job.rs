//! The scheduler's job model is the persisted row itself
//! ([`weft_storage::ScheduledJobRow`]) — every visible field the scheduler
//! cares about is already in that shape, so this module just adds the
//! constructors and the invariant the scheduler enforces on it.

use chrono::Utc;

pub use weft_storage::JobType;
pub use weft_storage::ScheduledJobRow as ScheduledJob;

pub fn new_pipeline_job(
    id: impl Into<String>,
    name: impl Into<String>,
    pipeline_ref: impl Into<String>,
    cron_expr: impl Into<String>,
) -> ScheduledJob {
    let now = Utc::now();
    ScheduledJob {
        id: id.into(),
        name: name.into(),
        job_type: JobType::Pipeline,
        pipeline_ref: Some(pipeline_ref.into()),
        monitoring_job_id: None,
        cron_expr: cron_expr.into(),
        enabled: true,
        next_run: None,
        last_run: None,
        last_result: None,
        created_at: now,
        updated_at: now,
    }
}

pub fn new_monitoring_job(
    id: impl Into<String>,
    name: impl Into<String>,
    monitoring_job_id: impl Into<String>,
    cron_expr: impl Into<String>,
) -> ScheduledJob {
    let now = Utc::now();
    ScheduledJob {
        id: id.into(),
        name: name.into(),
        job_type: JobType::Monitoring,
        pipeline_ref: None,
        monitoring_job_id: Some(monitoring_job_id.into()),
        cron_expr: cron_expr.into(),
        enabled: true,
        next_run: None,
        last_run: None,
        last_result: None,
        created_at: now,
        updated_at: now,
    }
}
