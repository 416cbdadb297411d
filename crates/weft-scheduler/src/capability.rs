//! Narrow capability traits the scheduler depends on, avoiding a cyclic
//! dependency between the scheduler and whatever owns plugin registries,
//! pipeline definitions, or monitoring checks — per the design's note on
//! breaking the Scheduler ↔ Persistence ↔ MonitoringExecutor cycle by
//! passing a narrow interface rather than the full concrete type in either
//! direction.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use weft_pipeline::PipelineExecutionResult;

/// Resolves a `pipeline_ref` to a pipeline definition and runs it.
///
/// The scheduler never sees a `PluginRegistry` or a `PipelineConfig`
/// directly: a caller-supplied implementation hides the lookup and the
/// `PipelineRuntime` invocation behind this single async call, so an
/// unknown `pipeline_ref` is reported the same fail-soft way any other
/// step failure is — as a `PipelineExecutionResult` with `success=false`,
/// never as a thrown error.
#[async_trait]
pub trait PipelineExecutor: Send + Sync {
    async fn execute_pipeline(
        &self,
        cancellation: &CancellationToken,
        pipeline_ref: &str,
    ) -> PipelineExecutionResult;
}

/// Runs a monitoring check identified by `monitoring_job_id`.
#[async_trait]
pub trait MonitoringExecutor: Send + Sync {
    async fn execute_monitoring_job(&self, monitoring_job_id: &str) -> anyhow::Result<()>;
}
