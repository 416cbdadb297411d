//! Minimal `Plugin` implementations so `weft run`/`validate` have something
//! to resolve against without pulling in a real plugin ecosystem — the
//! individual plugin implementations are out of scope per the design, but a
//! demonstration binary needs at least a toy one to exercise end to end.

use async_trait::async_trait;
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use weft_pipeline::{Plugin, PluginContext, StepConfig};

/// Echoes its `config` map back as step output, unchanged.
pub struct EchoPlugin;

#[async_trait]
impl Plugin for EchoPlugin {
    async fn execute_step(
        &self,
        _cancellation: &CancellationToken,
        step_config: &StepConfig,
        _shared_context: &PluginContext,
    ) -> anyhow::Result<PluginContext> {
        let mut ctx = PluginContext::new();
        for (key, value) in &step_config.config {
            ctx.set(key.clone(), value.clone());
        }
        Ok(ctx)
    }

    fn validate_config(&self, _config: &serde_json::Map<String, Value>) -> anyhow::Result<()> {
        Ok(())
    }

    fn plugin_type(&self) -> &str {
        "Echo"
    }

    fn plugin_name(&self) -> &str {
        "identity"
    }
}

/// Logs a message from `config["message"]` at info level and produces no
/// output of its own.
pub struct LogPlugin;

#[async_trait]
impl Plugin for LogPlugin {
    async fn execute_step(
        &self,
        _cancellation: &CancellationToken,
        step_config: &StepConfig,
        _shared_context: &PluginContext,
    ) -> anyhow::Result<PluginContext> {
        let message = step_config
            .config
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("(no message)");
        tracing::info!(step = %step_config.name, "{message}");
        Ok(PluginContext::new())
    }

    fn validate_config(&self, _config: &serde_json::Map<String, Value>) -> anyhow::Result<()> {
        Ok(())
    }

    fn plugin_type(&self) -> &str {
        "Log"
    }

    fn plugin_name(&self) -> &str {
        "message"
    }
}
