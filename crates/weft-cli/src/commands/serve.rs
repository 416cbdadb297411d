use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::info;

use weft_core::config::RuntimeConfig;
use weft_events::EventBus;
use weft_monitor::ExecutionMonitor;
use weft_pipeline::{PipelineExecutionResult, PipelineRuntime, PluginContext, PluginRegistry};
use weft_scheduler::{PipelineExecutor, Scheduler};
use weft_storage::SqliteBackend;

use crate::demo_plugins::{EchoPlugin, LogPlugin};

/// Resolves a `pipeline_ref` as a filesystem path to a YAML pipeline
/// document and runs it against the demonstration registry. A real
/// deployment would resolve against a pipeline store instead.
struct FilePipelineExecutor {
    registry: Arc<PluginRegistry>,
}

#[async_trait]
impl PipelineExecutor for FilePipelineExecutor {
    async fn execute_pipeline(
        &self,
        cancellation: &CancellationToken,
        pipeline_ref: &str,
    ) -> PipelineExecutionResult {
        let document = match tokio::fs::read_to_string(pipeline_ref).await {
            Ok(doc) => doc,
            Err(e) => {
                return PipelineExecutionResult {
                    success: false,
                    error: format!("failed to read pipeline file '{pipeline_ref}': {e}"),
                    context: PluginContext::new(),
                    executed_at: chrono::Utc::now(),
                }
            }
        };

        let format = if pipeline_ref.ends_with(".json") {
            weft_pipeline::DocumentFormat::Json
        } else {
            weft_pipeline::DocumentFormat::Yaml
        };

        let pipeline = match weft_pipeline::parse_pipeline(&document, format) {
            Ok(p) => p,
            Err(e) => {
                return PipelineExecutionResult {
                    success: false,
                    error: format!("pipeline validation failed: {e}"),
                    context: PluginContext::new(),
                    executed_at: chrono::Utc::now(),
                }
            }
        };

        let runtime = PipelineRuntime::new(&self.registry);
        runtime.execute(cancellation, &pipeline).await
    }
}

pub async fn run(config: RuntimeConfig, database_override: Option<String>) -> Result<()> {
    let database_path = database_override.unwrap_or(config.database.path.clone());
    let persistence = Arc::new(SqliteBackend::open(&database_path).await?);

    let registry = Arc::new(PluginRegistry::new());
    registry.register(Arc::new(EchoPlugin))?;
    registry.register(Arc::new(LogPlugin))?;

    let monitor = Arc::new(ExecutionMonitor::new(config.monitor.effective_max_history()));
    let events = EventBus::global().clone();

    let scheduler = Scheduler::new(
        Arc::new(FilePipelineExecutor { registry }),
        monitor,
        events,
    )
    .with_persistence(persistence)
    .with_tick_interval(std::time::Duration::from_secs(config.scheduler.tick_interval_secs))
    .with_stop_drain_timeout(std::time::Duration::from_secs(config.scheduler.stop_drain_timeout_secs));

    scheduler.recover().await?;
    scheduler.start().await?;
    info!("scheduler started, serving until interrupted");

    tokio::signal::ctrl_c().await?;
    info!("interrupt received, draining in-flight jobs");
    scheduler.stop().await?;

    Ok(())
}
