//! Thread-safe, bounded-history execution monitor.
//!
//! A single `RwLock`-guarded `IndexMap` holds every live record in
//! insertion order, so cleanup can evict the oldest completed entries
//! first without a separate index. Aggregate counters are also tracked in
//! `AtomicUsize`s for lock-free reads, per the design's concurrency model.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::RwLock;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use chrono::Utc;
use indexmap::IndexMap;
use serde_json::Value;
use tracing::debug;

use crate::record::{ExecutionRecord, ExecutionStatus, JobStatistics, StepRecord};

pub struct ExecutionMonitor {
    executions: RwLock<IndexMap<String, ExecutionRecord>>,
    max_history: usize,
    running_count: AtomicUsize,
    successful_count: AtomicUsize,
    failed_count: AtomicUsize,
}

impl ExecutionMonitor {
    /// `max_history` values of `0` are clamped to the default of 1000.
    pub fn new(max_history: usize) -> Self {
        Self {
            executions: RwLock::new(IndexMap::new()),
            max_history: if max_history == 0 { 1000 } else { max_history },
            running_count: AtomicUsize::new(0),
            successful_count: AtomicUsize::new(0),
            failed_count: AtomicUsize::new(0),
        }
    }

    fn lock_read(&self) -> std::sync::RwLockReadGuard<'_, IndexMap<String, ExecutionRecord>> {
        self.executions.read().expect("execution monitor lock poisoned")
    }

    fn lock_write(&self) -> std::sync::RwLockWriteGuard<'_, IndexMap<String, ExecutionRecord>> {
        self.executions.write().expect("execution monitor lock poisoned")
    }

    /// Begin tracking a new run. Returns the execution id `"<job_id>_<ns>"`.
    pub fn start_job(
        &self,
        job_id: &str,
        pipeline_ref: &str,
        triggered_by: &str,
    ) -> String {
        let ns = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos();
        let execution_id = format!("{}_{}", job_id, ns);

        let record = ExecutionRecord {
            id: execution_id.clone(),
            job_id: if job_id.is_empty() {
                None
            } else {
                Some(job_id.to_string())
            },
            pipeline_ref: pipeline_ref.to_string(),
            start_time: Utc::now(),
            end_time: None,
            duration: None,
            status: ExecutionStatus::Running,
            error: None,
            context: None,
            steps: Vec::new(),
            triggered_by: triggered_by.to_string(),
        };

        self.lock_write().insert(execution_id.clone(), record);
        self.running_count.fetch_add(1, Ordering::SeqCst);
        execution_id
    }

    pub fn start_step(
        &self,
        execution_id: &str,
        step_name: &str,
        plugin_ref: &str,
        input_snapshot: Value,
    ) {
        let mut executions = self.lock_write();
        if let Some(record) = executions.get_mut(execution_id) {
            record.steps.push(StepRecord {
                step_name: step_name.to_string(),
                plugin_ref: plugin_ref.to_string(),
                start_time: Utc::now(),
                end_time: None,
                duration: None,
                status: ExecutionStatus::Running,
                error: None,
                input_snapshot,
                output_snapshot: None,
            });
        }
    }

    /// Finalize the most recently started running step record matching
    /// `step_name` — steps may be retried, so there can be more than one
    /// record with that name; only the latest running one is closed.
    pub fn complete_step(
        &self,
        execution_id: &str,
        step_name: &str,
        success: bool,
        error: Option<String>,
        output_snapshot: Option<Value>,
    ) {
        let mut executions = self.lock_write();
        if let Some(record) = executions.get_mut(execution_id) {
            if let Some(step) = record
                .steps
                .iter_mut()
                .rev()
                .find(|s| s.step_name == step_name && s.status == ExecutionStatus::Running)
            {
                let end_time = Utc::now();
                step.duration = (end_time - step.start_time).to_std().ok();
                step.end_time = Some(end_time);
                step.status = if success {
                    ExecutionStatus::Success
                } else {
                    ExecutionStatus::Failed
                };
                step.error = error;
                step.output_snapshot = output_snapshot;
            }
        }
    }

    pub fn complete_job(
        &self,
        execution_id: &str,
        success: bool,
        error: Option<String>,
        context: Option<weft_pipeline::PluginContext>,
    ) {
        let mut over_budget = false;
        {
            let mut executions = self.lock_write();
            if let Some(record) = executions.get_mut(execution_id) {
                if record.status == ExecutionStatus::Running {
                    self.running_count.fetch_sub(1, Ordering::SeqCst);
                }

                let end_time = Utc::now();
                record.duration = (end_time - record.start_time).to_std().ok();
                record.end_time = Some(end_time);
                record.status = if success {
                    ExecutionStatus::Success
                } else {
                    ExecutionStatus::Failed
                };
                record.error = error;
                record.context = context;

                if success {
                    self.successful_count.fetch_add(1, Ordering::SeqCst);
                } else {
                    self.failed_count.fetch_add(1, Ordering::SeqCst);
                }
            }
            over_budget = executions.len() > self.max_history;
        }

        if over_budget {
            self.evict_to_budget();
        }
    }

    pub fn cancel_job(&self, execution_id: &str) {
        let mut executions = self.lock_write();
        if let Some(record) = executions.get_mut(execution_id) {
            if record.status == ExecutionStatus::Running {
                self.running_count.fetch_sub(1, Ordering::SeqCst);
            }
            let end_time = Utc::now();
            record.duration = (end_time - record.start_time).to_std().ok();
            record.end_time = Some(end_time);
            record.status = ExecutionStatus::Cancelled;
        }
    }

    /// Evict completed (non-running) records oldest-insertion-first until
    /// the map is back within `max_history`. Running jobs are never
    /// evicted, even if that leaves the map over budget.
    fn evict_to_budget(&self) {
        let mut executions = self.lock_write();
        let evictable: Vec<String> = executions
            .iter()
            .filter(|(_, record)| record.status != ExecutionStatus::Running)
            .map(|(id, _)| id.clone())
            .collect();

        let mut to_remove = executions.len().saturating_sub(self.max_history);
        for id in evictable {
            if to_remove == 0 {
                break;
            }
            executions.shift_remove(&id);
            to_remove -= 1;
        }

        debug!(remaining = executions.len(), max_history = self.max_history, "execution history evicted");
    }

    pub fn get_execution(&self, execution_id: &str) -> Option<ExecutionRecord> {
        self.lock_read().get(execution_id).cloned()
    }

    /// Defensive copies only: the internal map is never leaked.
    pub fn list_executions(&self) -> Vec<ExecutionRecord> {
        self.lock_read().values().cloned().collect()
    }

    pub fn stats(&self) -> JobStatistics {
        let executions = self.lock_read();
        let total = executions.len();

        let completed: Vec<&ExecutionRecord> = executions
            .values()
            .filter(|r| r.status != ExecutionStatus::Running)
            .collect();

        let successful = completed
            .iter()
            .filter(|r| r.status == ExecutionStatus::Success)
            .count();
        let failed = completed
            .iter()
            .filter(|r| r.status == ExecutionStatus::Failed)
            .count();
        let running = executions
            .values()
            .filter(|r| r.status == ExecutionStatus::Running)
            .count();

        let durations: Vec<Duration> = completed.iter().filter_map(|r| r.duration).collect();
        let avg_duration = if durations.is_empty() {
            Duration::default()
        } else {
            let total_nanos: u128 = durations.iter().map(|d| d.as_nanos()).sum();
            Duration::from_nanos((total_nanos / durations.len() as u128) as u64)
        };

        let success_rate = if successful + failed > 0 {
            successful as f64 / (successful + failed) as f64
        } else {
            0.0
        };

        JobStatistics {
            total,
            running,
            successful,
            failed,
            avg_duration,
            success_rate,
            last_updated: Some(Utc::now()),
        }
    }
}
