use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

use weft_pipeline::PluginContext;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExecutionStatus {
    Running,
    Success,
    Failed,
    Cancelled,
}

/// The account of a single pipeline run, with a per-step breakdown.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionRecord {
    pub id: String,
    pub job_id: Option<String>,
    pub pipeline_ref: String,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub duration: Option<Duration>,
    pub status: ExecutionStatus,
    pub error: Option<String>,
    pub context: Option<PluginContext>,
    pub steps: Vec<StepRecord>,
    pub triggered_by: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepRecord {
    pub step_name: String,
    pub plugin_ref: String,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub duration: Option<Duration>,
    pub status: ExecutionStatus,
    pub error: Option<String>,
    pub input_snapshot: Value,
    pub output_snapshot: Option<Value>,
}

/// Aggregate statistics derived from the live set of execution records.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobStatistics {
    pub total: usize,
    pub running: usize,
    pub successful: usize,
    pub failed: usize,
    pub avg_duration: Duration,
    pub success_rate: f64,
    pub last_updated: Option<DateTime<Utc>>,
}
