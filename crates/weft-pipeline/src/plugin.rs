//! The `Plugin` trait: a self-contained unit that executes one pipeline
//! step, mirroring `fluent-engines::modular_pipeline_executor::StepExecutor`
//! generalized from "step type" dispatch to the `(type, name)` identity the
//! design requires.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use crate::context::PluginContext;

/// A step's resolved configuration, as parsed from a pipeline spec.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepConfig {
    pub name: String,
    #[serde(alias = "plugin")]
    pub plugin_ref: String,
    #[serde(default)]
    pub config: serde_json::Map<String, Value>,
    #[serde(default)]
    pub output: Option<String>,
}

/// A self-contained pipeline step implementation, identified by the pair
/// `(plugin_type(), plugin_name())`.
#[async_trait]
pub trait Plugin: Send + Sync {
    /// Execute this step. `shared_context` is the context accumulated by
    /// prior steps; the returned context holds only this step's produced
    /// entries, which the runtime merges into the shared context afterward.
    async fn execute_step(
        &self,
        cancellation: &CancellationToken,
        step_config: &StepConfig,
        shared_context: &PluginContext,
    ) -> anyhow::Result<PluginContext>;

    /// Validate a step's raw config before `execute_step` is invoked.
    fn validate_config(&self, config: &serde_json::Map<String, Value>) -> anyhow::Result<()>;

    fn plugin_type(&self) -> &str;

    fn plugin_name(&self) -> &str;
}

/// Split a `plugin_ref` of the form `"<Type>.<Name>"` into its two parts.
///
/// Splits on the *first* dot only, so a name containing dots (e.g.
/// `"Output.report.v2"`) still parses as `("Output", "report.v2")`.
pub fn split_plugin_ref(plugin_ref: &str) -> Option<(&str, &str)> {
    let idx = plugin_ref.find('.')?;
    let (type_part, rest) = plugin_ref.split_at(idx);
    let name_part = &rest[1..];
    if type_part.is_empty() || name_part.is_empty() {
        return None;
    }
    Some((type_part, name_part))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_simple_reference() {
        assert_eq!(split_plugin_ref("Input.csv"), Some(("Input", "csv")));
    }

    #[test]
    fn splits_on_first_dot_only() {
        assert_eq!(
            split_plugin_ref("Output.report.v2"),
            Some(("Output", "report.v2"))
        );
    }

    #[test]
    fn rejects_missing_separator() {
        assert_eq!(split_plugin_ref("invalid"), None);
    }

    #[test]
    fn rejects_empty_parts() {
        assert_eq!(split_plugin_ref(".Name"), None);
        assert_eq!(split_plugin_ref("Type."), None);
        assert_eq!(split_plugin_ref("."), None);
    }
}
