//! The pipeline runtime: executes a parsed `PipelineConfig` against a
//! `PluginRegistry`, threading a single shared `PluginContext` through every
//! step in declared order.
//!
//! Mirrors the step-by-step loop in
//! `fluent-engines::pipeline_executor::PipelineExecutor`, generalized from
//! the teacher's closed set of `PipelineStep` variants to registry-resolved
//! `Plugin` trait objects.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::debug;
use weft_core::error::ValidationError;

use crate::context::PluginContext;
use crate::pipeline_config::PipelineConfig;
use crate::plugin::{split_plugin_ref, StepConfig};
use crate::registry::PluginRegistry;

/// The outcome of executing a pipeline. `success = false` always carries a
/// non-empty `error`, never propagated as a thrown fault — this is the
/// "fail-soft" contract from the design.
///
/// `Serialize`/`Deserialize` so a scheduler or persistence layer can store
/// this directly as the `last_result` blob on a scheduled job row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineExecutionResult {
    pub success: bool,
    pub error: String,
    pub context: PluginContext,
    pub executed_at: DateTime<Utc>,
}

impl PipelineExecutionResult {
    fn ok(context: PluginContext) -> Self {
        Self {
            success: true,
            error: String::new(),
            context,
            executed_at: Utc::now(),
        }
    }

    fn failed(error: String, context: PluginContext) -> Self {
        Self {
            success: false,
            error,
            context,
            executed_at: Utc::now(),
        }
    }
}

/// Executes pipelines against a registry. Stateless beyond the registry
/// reference: one runtime instance can drive any number of concurrent
/// executions, since each call owns its own shared context.
pub struct PipelineRuntime<'a> {
    registry: &'a PluginRegistry,
}

impl<'a> PipelineRuntime<'a> {
    pub fn new(registry: &'a PluginRegistry) -> Self {
        Self { registry }
    }

    /// Run every step of `pipeline` in order, threading a shared context
    /// that starts empty. Returns a result even on failure; only
    /// cancellation that prevents the call from returning at all would
    /// escape this fail-soft contract, and the runtime checks the token
    /// before each step specifically to avoid that.
    pub async fn execute(
        &self,
        cancellation: &CancellationToken,
        pipeline: &PipelineConfig,
    ) -> PipelineExecutionResult {
        self.execute_with_context(cancellation, pipeline, PluginContext::new()).await
    }

    /// As `execute`, but the shared context starts pre-seeded rather than
    /// empty — used by reactive handlers that trigger a pipeline with
    /// caller-supplied context (e.g. an anomaly's fields under `anomaly.*`)
    /// already in place before the first step runs.
    pub async fn execute_with_context(
        &self,
        cancellation: &CancellationToken,
        pipeline: &PipelineConfig,
        mut shared_context: PluginContext,
    ) -> PipelineExecutionResult {
        for (index, step) in pipeline.steps.iter().enumerate() {
            if cancellation.is_cancelled() {
                return PipelineExecutionResult::failed(
                    format!(
                        "step {} ({}) failed: pipeline execution was cancelled",
                        index, step.name
                    ),
                    shared_context,
                );
            }

            if let Err(error) = self
                .execute_step(cancellation, index, step, &mut shared_context)
                .await
            {
                return PipelineExecutionResult::failed(error, shared_context);
            }
        }

        PipelineExecutionResult::ok(shared_context)
    }

    async fn execute_step(
        &self,
        cancellation: &CancellationToken,
        index: usize,
        step: &StepConfig,
        shared_context: &mut PluginContext,
    ) -> Result<(), String> {
        let (plugin_type, plugin_name) = split_plugin_ref(&step.plugin_ref).ok_or_else(|| {
            format!(
                "step {} ({}) failed: {}",
                index,
                step.name,
                ValidationError::InvalidPluginReference {
                    reference: step.plugin_ref.clone(),
                }
            )
        })?;

        let plugin = self
            .registry
            .get(plugin_type, plugin_name)
            .map_err(|e| format!("step {} ({}) failed: {}", index, step.name, e))?;

        plugin
            .validate_config(&step.config)
            .map_err(|e| format!("step {} ({}) failed: {}", index, step.name, e))?;

        debug!(step = %step.name, plugin = %step.plugin_ref, "executing pipeline step");

        let step_context = plugin
            .execute_step(cancellation, step, shared_context)
            .await
            .map_err(|e| format!("step {} ({}) failed: {}", index, step.name, e))?;

        match &step.output {
            Some(output_key) => {
                let value = serde_json::Value::Object(step_context.to_json_map());
                shared_context.set(output_key.clone(), value);
            }
            None => shared_context.merge_overwrite(&step_context),
        }

        Ok(())
    }
}
