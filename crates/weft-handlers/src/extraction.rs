//! Pipeline → Auto-Extraction: on `pipeline.completed`, flattens the
//! pipeline's final context into an extraction plugin's `data` map when
//! the pipeline is tagged for it.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::warn;

use weft_events::{topics, Event, Handler};

use crate::capability::ExtractionInvoker;

/// Subscribes to `pipeline.completed` and triggers extraction when the
/// event payload carries `metadata.auto_extract_ontology = true` and a
/// non-empty `metadata.target_ontology_id`.
pub struct AutoExtractionHandler {
    invoker: Arc<dyn ExtractionInvoker>,
}

impl AutoExtractionHandler {
    pub fn new(invoker: Arc<dyn ExtractionInvoker>) -> Self {
        Self { invoker }
    }

    async fn run(&self, event: &Event) -> anyhow::Result<()> {
        let metadata = event.payload.get("metadata").and_then(Value::as_object);
        let auto_extract = metadata
            .and_then(|m| m.get("auto_extract_ontology"))
            .and_then(Value::as_bool)
            .unwrap_or(false);
        let ontology_id = metadata
            .and_then(|m| m.get("target_ontology_id"))
            .and_then(Value::as_str)
            .unwrap_or("");

        if !auto_extract || ontology_id.is_empty() {
            return Ok(());
        }

        let data = event
            .payload
            .get("context")
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default();

        let outcome = self.invoker.invoke_extraction(ontology_id, data).await?;

        weft_events::EventBus::global()
            .publish(
                Event::new(topics::EXTRACTION_COMPLETED, "auto_extraction_handler").with_payload(
                    [
                        ("ontology_id".to_string(), Value::String(outcome.ontology_id)),
                        (
                            "entities_extracted".to_string(),
                            Value::from(outcome.entities_extracted),
                        ),
                    ]
                    .into_iter()
                    .collect(),
                ),
            )
            .await;

        Ok(())
    }
}

#[async_trait]
impl Handler for AutoExtractionHandler {
    async fn handle(&self, event: &Event) -> anyhow::Result<()> {
        if let Err(e) = self.run(event).await {
            warn!(error = %e, "auto-extraction handler failed");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::ExtractionOutcome;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use weft_core::value::JsonMap;

    struct StubInvoker {
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl ExtractionInvoker for StubInvoker {
        async fn invoke_extraction(&self, ontology_id: &str, _data: JsonMap) -> anyhow::Result<ExtractionOutcome> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(ExtractionOutcome {
                entities_extracted: 3,
                ontology_id: ontology_id.to_string(),
            })
        }
    }

    fn event_with_metadata(auto_extract: bool, target_ontology_id: &str) -> Event {
        Event::new(topics::PIPELINE_COMPLETED, "runtime").with_payload(
            [(
                "metadata".to_string(),
                json!({
                    "auto_extract_ontology": auto_extract,
                    "target_ontology_id": target_ontology_id,
                }),
            )]
            .into_iter()
            .collect(),
        )
    }

    #[tokio::test]
    async fn skips_when_auto_extract_flag_is_false() {
        let calls = Arc::new(AtomicUsize::new(0));
        let handler = AutoExtractionHandler::new(Arc::new(StubInvoker { calls: calls.clone() }));
        handler.handle(&event_with_metadata(false, "onto-1")).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn skips_when_target_ontology_id_is_empty() {
        let calls = Arc::new(AtomicUsize::new(0));
        let handler = AutoExtractionHandler::new(Arc::new(StubInvoker { calls: calls.clone() }));
        handler.handle(&event_with_metadata(true, "")).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn invokes_extraction_when_both_conditions_hold() {
        let calls = Arc::new(AtomicUsize::new(0));
        let handler = AutoExtractionHandler::new(Arc::new(StubInvoker { calls: calls.clone() }));
        handler.handle(&event_with_metadata(true, "onto-1")).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn handler_never_propagates_its_own_errors() {
        struct FailingInvoker;
        #[async_trait]
        impl ExtractionInvoker for FailingInvoker {
            async fn invoke_extraction(&self, _ontology_id: &str, _data: JsonMap) -> anyhow::Result<ExtractionOutcome> {
                Err(anyhow::anyhow!("boom"))
            }
        }
        let handler = AutoExtractionHandler::new(Arc::new(FailingInvoker));
        let result = handler.handle(&event_with_metadata(true, "onto-1")).await;
        assert!(result.is_ok());
    }
}
