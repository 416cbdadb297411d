//! Anomaly → Pipeline Trigger: on `anomaly.detected`, resolves a target
//! pipeline (explicit id, or first enabled pipeline tagged `alert`) and
//! runs it with the anomaly's fields pre-seeded into the shared context.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use weft_core::value::{merge_overwrite, merge_without_overwrite, JsonMap};
use weft_events::{Event, Handler};
use weft_pipeline::PluginContext;

use crate::capability::{AlertPipelineResolver, PipelineTrigger};

/// Anomaly payload fields folded into `anomaly.*` context keys before the
/// remaining payload (and `trigger_context` overrides) are layered on top.
const ANOMALY_FIELDS: &[&str] = &[
    "ontology_id",
    "entity_id",
    "metric_name",
    "alert_type",
    "severity",
    "message",
    "value",
    "timestamp",
];

pub struct AnomalyPipelineTriggerHandler {
    resolver: Arc<dyn AlertPipelineResolver>,
    trigger: Arc<dyn PipelineTrigger>,
    default_tag: String,
}

impl AnomalyPipelineTriggerHandler {
    pub fn new(resolver: Arc<dyn AlertPipelineResolver>, trigger: Arc<dyn PipelineTrigger>) -> Self {
        Self {
            resolver,
            trigger,
            default_tag: "alert".to_string(),
        }
    }

    pub fn with_default_tag(mut self, tag: impl Into<String>) -> Self {
        self.default_tag = tag.into();
        self
    }

    async fn run(&self, event: &Event) -> anyhow::Result<()> {
        let payload = &event.payload;

        let explicit_pipeline_id = payload.get("trigger_pipeline_id").and_then(Value::as_str);
        let Some(pipeline_ref) = self.resolver.resolve(explicit_pipeline_id, &self.default_tag).await else {
            warn!("no pipeline resolved for anomaly trigger; dropping event");
            return Ok(());
        };

        let seed_context = build_seed_context(payload);

        let result = self
            .trigger
            .execute_pipeline(&CancellationToken::new(), &pipeline_ref, seed_context)
            .await;

        if !result.success {
            warn!(pipeline_ref = %pipeline_ref, error = %result.error, "anomaly-triggered pipeline failed");
        } else {
            debug!(pipeline_ref = %pipeline_ref, "anomaly-triggered pipeline completed");
        }

        Ok(())
    }
}

/// Shared with `alert_actions`: both handlers seed a triggered pipeline's
/// context from the same anomaly payload the same way.
pub(crate) fn build_seed_context(payload: &JsonMap) -> PluginContext {
    let mut base: JsonMap = ANOMALY_FIELDS
        .iter()
        .filter_map(|&field| payload.get(field).map(|v| (format!("anomaly.{field}"), v.clone())))
        .collect();

    if let Some(overrides) = payload.get("trigger_context").and_then(Value::as_object) {
        merge_overwrite(&mut base, overrides);
    }

    let consumed: Vec<&str> = ANOMALY_FIELDS
        .iter()
        .copied()
        .chain(["trigger_pipeline_id", "trigger_context"])
        .collect();
    let remaining: JsonMap = payload
        .iter()
        .filter(|(key, _)| !consumed.contains(&key.as_str()))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();
    merge_without_overwrite(&mut base, &remaining);

    let mut context = PluginContext::new();
    for (key, value) in base {
        context.set(key, value);
    }
    context
}

#[async_trait]
impl Handler for AnomalyPipelineTriggerHandler {
    async fn handle(&self, event: &Event) -> anyhow::Result<()> {
        if let Err(e) = self.run(event).await {
            warn!(error = %e, "anomaly pipeline trigger handler failed");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Mutex;
    use weft_events::topics;
    use weft_pipeline::PipelineExecutionResult;
    use chrono::Utc;

    struct StubResolver {
        resolved: Option<String>,
    }

    #[async_trait]
    impl AlertPipelineResolver for StubResolver {
        async fn resolve(&self, explicit: Option<&str>, _tag: &str) -> Option<String> {
            explicit.map(str::to_string).or_else(|| self.resolved.clone())
        }
    }

    struct CapturingTrigger {
        seeded_keys: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl PipelineTrigger for CapturingTrigger {
        async fn execute_pipeline(
            &self,
            _cancellation: &CancellationToken,
            _pipeline_ref: &str,
            seed_context: PluginContext,
        ) -> PipelineExecutionResult {
            *self.seeded_keys.lock().unwrap() = seed_context.keys().map(str::to_string).collect();
            PipelineExecutionResult {
                success: true,
                error: String::new(),
                context: seed_context,
                executed_at: Utc::now(),
            }
        }
    }

    #[tokio::test]
    async fn seeds_anomaly_fields_trigger_context_and_remaining_payload() {
        let trigger = Arc::new(CapturingTrigger {
            seeded_keys: Mutex::new(Vec::new()),
        });
        let handler = AnomalyPipelineTriggerHandler::new(
            Arc::new(StubResolver {
                resolved: Some("alert-pipeline".to_string()),
            }),
            trigger.clone(),
        );

        let event = Event::new(topics::ANOMALY_DETECTED, "detector").with_payload(
            json!({
                "ontology_id": "onto-1",
                "entity_id": "entity-1",
                "metric_name": "temp",
                "alert_type": "threshold",
                "severity": "high",
                "message": "too hot",
                "value": 99.9,
                "timestamp": "2026-07-28T00:00:00Z",
                "trigger_context": {"custom_key": "custom_value"},
                "extra_field": "carried_through",
            })
            .as_object()
            .unwrap()
            .clone(),
        );

        handler.handle(&event).await.unwrap();

        let keys = trigger.seeded_keys.lock().unwrap().clone();
        assert!(keys.contains(&"anomaly.ontology_id".to_string()));
        assert!(keys.contains(&"custom_key".to_string()));
        assert!(keys.contains(&"extra_field".to_string()));
    }

    #[tokio::test]
    async fn skips_when_no_pipeline_resolves() {
        let trigger = Arc::new(CapturingTrigger {
            seeded_keys: Mutex::new(Vec::new()),
        });
        let handler = AnomalyPipelineTriggerHandler::new(Arc::new(StubResolver { resolved: None }), trigger.clone());

        let event = Event::new(topics::ANOMALY_DETECTED, "detector").with_payload(Default::default());
        handler.handle(&event).await.unwrap();
        assert!(trigger.seeded_keys.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn explicit_trigger_pipeline_id_wins_over_tag_resolution() {
        let trigger = Arc::new(CapturingTrigger {
            seeded_keys: Mutex::new(Vec::new()),
        });
        let handler = AnomalyPipelineTriggerHandler::new(
            Arc::new(StubResolver {
                resolved: Some("tagged-pipeline".to_string()),
            }),
            trigger,
        );

        let event = Event::new(topics::ANOMALY_DETECTED, "detector").with_payload(
            json!({"trigger_pipeline_id": "explicit-pipeline"}).as_object().unwrap().clone(),
        );
        // The resolver itself prefers the explicit id; this only checks the
        // handler passes it through rather than substituting the tag path.
        handler.handle(&event).await.unwrap();
    }
}
