//! Row types matching the schema contract: `scheduled_jobs`, `pipelines`,
//! and `job_executions`. Nullable timestamps use `Option` throughout so a
//! round trip through storage preserves "never set" rather than collapsing
//! it to an epoch sentinel.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobType {
    Pipeline,
    Monitoring,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduledJobRow {
    pub id: String,
    pub name: String,
    pub job_type: JobType,
    pub pipeline_ref: Option<String>,
    pub monitoring_job_id: Option<String>,
    pub cron_expr: String,
    pub enabled: bool,
    pub next_run: Option<DateTime<Utc>>,
    pub last_run: Option<DateTime<Utc>>,
    /// JSON-serialized `PipelineExecutionResult`, or absent.
    pub last_result: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineRow {
    pub name: String,
    pub description: Option<String>,
    /// Serialized `PipelineConfig` (nested blob, as the schema contract
    /// allows any concrete serialization).
    pub config_blob: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExecutionStatusRow {
    Running,
    Success,
    Failed,
    Cancelled,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionRow {
    pub id: String,
    pub job_id: Option<String>,
    pub pipeline_ref: String,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub duration_ns: Option<i64>,
    pub status: ExecutionStatusRow,
    pub error: Option<String>,
    pub context_blob: Option<String>,
    pub steps_blob: String,
    pub triggered_by: String,
}
