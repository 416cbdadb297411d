//! In-memory persistence backend for tests, paralleling the teacher's
//! `MemoryStateStore` sitting alongside its file/SQLite-backed stores.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use weft_core::error::PersistenceError;

use crate::backend::{PersistenceBackend, StorageResult};
use crate::schema::{ExecutionRow, PipelineRow, ScheduledJobRow};

#[derive(Default)]
pub struct MemoryPersistenceBackend {
    jobs: RwLock<HashMap<String, ScheduledJobRow>>,
    pipelines: RwLock<HashMap<String, PipelineRow>>,
    executions: RwLock<HashMap<String, ExecutionRow>>,
}

impl MemoryPersistenceBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PersistenceBackend for MemoryPersistenceBackend {
    async fn save_job(&self, job: &ScheduledJobRow) -> StorageResult<()> {
        let mut jobs = self.jobs.write().await;
        if jobs.contains_key(&job.id) {
            return Err(PersistenceError::Backend(format!(
                "job '{}' already exists",
                job.id
            )));
        }
        jobs.insert(job.id.clone(), job.clone());
        Ok(())
    }

    async fn get_job(&self, id: &str) -> StorageResult<Option<ScheduledJobRow>> {
        Ok(self.jobs.read().await.get(id).cloned())
    }

    async fn list_jobs(&self) -> StorageResult<Vec<ScheduledJobRow>> {
        Ok(self.jobs.read().await.values().cloned().collect())
    }

    async fn update_job(&self, job: &ScheduledJobRow) -> StorageResult<()> {
        let mut jobs = self.jobs.write().await;
        jobs.insert(job.id.clone(), job.clone());
        Ok(())
    }

    async fn delete_job(&self, id: &str) -> StorageResult<()> {
        self.jobs.write().await.remove(id);
        // Cascade-delete executions for this job, mirroring the
        // `job_executions.job_id` foreign key's cascade-delete behavior.
        self.executions
            .write()
            .await
            .retain(|_, execution| execution.job_id.as_deref() != Some(id));
        Ok(())
    }

    async fn save_pipeline(&self, pipeline: &PipelineRow) -> StorageResult<()> {
        let mut pipelines = self.pipelines.write().await;
        if pipelines.contains_key(&pipeline.name) {
            return Err(PersistenceError::Backend(format!(
                "pipeline '{}' already exists",
                pipeline.name
            )));
        }
        pipelines.insert(pipeline.name.clone(), pipeline.clone());
        Ok(())
    }

    async fn get_pipeline(&self, name: &str) -> StorageResult<Option<PipelineRow>> {
        Ok(self.pipelines.read().await.get(name).cloned())
    }

    async fn list_pipelines(&self) -> StorageResult<Vec<PipelineRow>> {
        Ok(self.pipelines.read().await.values().cloned().collect())
    }

    async fn update_pipeline(&self, pipeline: &PipelineRow) -> StorageResult<()> {
        self.pipelines
            .write()
            .await
            .insert(pipeline.name.clone(), pipeline.clone());
        Ok(())
    }

    async fn delete_pipeline(&self, name: &str) -> StorageResult<()> {
        self.pipelines.write().await.remove(name);
        Ok(())
    }

    async fn save_execution(&self, execution: &ExecutionRow) -> StorageResult<()> {
        self.executions
            .write()
            .await
            .insert(execution.id.clone(), execution.clone());
        Ok(())
    }

    async fn get_execution(&self, id: &str) -> StorageResult<Option<ExecutionRow>> {
        Ok(self.executions.read().await.get(id).cloned())
    }

    async fn list_executions_by_job(
        &self,
        job_id: &str,
        limit: usize,
    ) -> StorageResult<Vec<ExecutionRow>> {
        let executions = self.executions.read().await;
        let mut matching: Vec<ExecutionRow> = executions
            .values()
            .filter(|e| e.job_id.as_deref() == Some(job_id))
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.start_time.cmp(&a.start_time));
        matching.truncate(limit);
        Ok(matching)
    }

    async fn delete_executions_older_than(&self, cutoff: DateTime<Utc>) -> StorageResult<usize> {
        let mut executions = self.executions.write().await;
        let before = executions.len();
        executions.retain(|_, e| e.start_time >= cutoff);
        Ok(before - executions.len())
    }

    async fn health(&self) -> StorageResult<()> {
        Ok(())
    }

    async fn close(&self) -> StorageResult<()> {
        Ok(())
    }
}
