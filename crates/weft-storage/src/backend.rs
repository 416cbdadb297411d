use async_trait::async_trait;
use chrono::{DateTime, Utc};

use weft_core::error::PersistenceError;

use crate::schema::{ExecutionRow, PipelineRow, ScheduledJobRow};

pub type StorageResult<T> = Result<T, PersistenceError>;

/// Synchronous-semantics, ambient-context-aware persistence interface.
///
/// "Synchronous" here describes the contract (callers get a definitive
/// answer, no fire-and-forget), not the Rust signature — every method is
/// `async` so a concrete backend can use non-blocking I/O underneath.
#[async_trait]
pub trait PersistenceBackend: Send + Sync {
    async fn save_job(&self, job: &ScheduledJobRow) -> StorageResult<()>;
    async fn get_job(&self, id: &str) -> StorageResult<Option<ScheduledJobRow>>;
    async fn list_jobs(&self) -> StorageResult<Vec<ScheduledJobRow>>;
    async fn update_job(&self, job: &ScheduledJobRow) -> StorageResult<()>;
    async fn delete_job(&self, id: &str) -> StorageResult<()>;

    async fn save_pipeline(&self, pipeline: &PipelineRow) -> StorageResult<()>;
    async fn get_pipeline(&self, name: &str) -> StorageResult<Option<PipelineRow>>;
    async fn list_pipelines(&self) -> StorageResult<Vec<PipelineRow>>;
    async fn update_pipeline(&self, pipeline: &PipelineRow) -> StorageResult<()>;
    async fn delete_pipeline(&self, name: &str) -> StorageResult<()>;

    async fn save_execution(&self, execution: &ExecutionRow) -> StorageResult<()>;
    async fn get_execution(&self, id: &str) -> StorageResult<Option<ExecutionRow>>;
    /// Newest first, bounded by `limit`.
    async fn list_executions_by_job(&self, job_id: &str, limit: usize) -> StorageResult<Vec<ExecutionRow>>;
    async fn delete_executions_older_than(&self, cutoff: DateTime<Utc>) -> StorageResult<usize>;

    async fn health(&self) -> StorageResult<()>;
    async fn close(&self) -> StorageResult<()>;
}
