//! Model → Twin Auto-Creation: on `model.training.completed`, creates a
//! digital twin for the trained model when the owning ontology opts in,
//! installing default monitoring rules and simulation scenarios.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::warn;

use weft_events::{topics, Event, Handler};

use crate::capability::{CreateTwinRequest, TwinStore};

pub struct TwinAutoCreationHandler {
    store: Arc<dyn TwinStore>,
}

impl TwinAutoCreationHandler {
    pub fn new(store: Arc<dyn TwinStore>) -> Self {
        Self { store }
    }

    async fn run(&self, event: &Event) -> anyhow::Result<()> {
        let payload = &event.payload;
        let field = |key: &str| -> anyhow::Result<String> {
            payload
                .get(key)
                .and_then(Value::as_str)
                .map(str::to_string)
                .ok_or_else(|| anyhow::anyhow!("model.training.completed payload missing '{key}'"))
        };

        let ontology_id = field("ontology_id")?;
        let model_id = field("model_id")?;
        let model_type = field("model_type")?;
        let target_property = field("target_property")?;

        if !self.store.auto_create_twins_enabled(&ontology_id).await? {
            return Ok(());
        }
        if self.store.twin_exists(&ontology_id, &model_id).await? {
            return Ok(());
        }

        let twin_id = self
            .store
            .create_twin(&CreateTwinRequest {
                ontology_id: ontology_id.clone(),
                model_id: model_id.clone(),
                model_type: model_type.clone(),
                target_property,
            })
            .await?;

        if let Err(e) = self.store.install_default_monitoring_rules(&twin_id).await {
            warn!(twin_id = %twin_id, error = %e, "default monitoring rules unavailable for twin");
        }

        self.store.generate_simulation_scenarios(&twin_id, &model_type).await?;

        weft_events::EventBus::global()
            .publish(
                Event::new(topics::TWIN_CREATED, "twin_auto_creation_handler").with_payload(
                    [
                        ("twin_id".to_string(), Value::String(twin_id)),
                        ("ontology_id".to_string(), Value::String(ontology_id)),
                        ("model_id".to_string(), Value::String(model_id)),
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
impl Handler for TwinAutoCreationHandler {
    async fn handle(&self, event: &Event) -> anyhow::Result<()> {
        if let Err(e) = self.run(event).await {
            warn!(error = %e, "twin auto-creation handler failed");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Mutex;

    struct StubStore {
        auto_create: bool,
        existing: bool,
        created: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl TwinStore for StubStore {
        async fn auto_create_twins_enabled(&self, _ontology_id: &str) -> anyhow::Result<bool> {
            Ok(self.auto_create)
        }

        async fn twin_exists(&self, _ontology_id: &str, _model_id: &str) -> anyhow::Result<bool> {
            Ok(self.existing)
        }

        async fn create_twin(&self, request: &CreateTwinRequest) -> anyhow::Result<String> {
            let twin_id = format!("twin-{}-{}", request.ontology_id, request.model_id);
            self.created.lock().unwrap().push(twin_id.clone());
            Ok(twin_id)
        }

        async fn install_default_monitoring_rules(&self, _twin_id: &str) -> anyhow::Result<()> {
            Err(anyhow::anyhow!("monitoring_rules table absent"))
        }

        async fn generate_simulation_scenarios(&self, _twin_id: &str, _model_type: &str) -> anyhow::Result<()> {
            Ok(())
        }
    }

    fn event() -> Event {
        Event::new(topics::MODEL_TRAINING_COMPLETED, "trainer").with_payload(
            json!({
                "ontology_id": "onto-1",
                "model_id": "model-1",
                "model_type": "regression",
                "target_property": "temperature",
            })
            .as_object()
            .unwrap()
            .clone(),
        )
    }

    #[tokio::test]
    async fn creates_twin_when_enabled_and_not_already_present() {
        let store = Arc::new(StubStore {
            auto_create: true,
            existing: false,
            created: Mutex::new(Vec::new()),
        });
        let handler = TwinAutoCreationHandler::new(store.clone());
        handler.handle(&event()).await.unwrap();
        assert_eq!(store.created.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn skips_when_auto_create_disabled() {
        let store = Arc::new(StubStore {
            auto_create: false,
            existing: false,
            created: Mutex::new(Vec::new()),
        });
        let handler = TwinAutoCreationHandler::new(store.clone());
        handler.handle(&event()).await.unwrap();
        assert!(store.created.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn skips_when_twin_already_exists() {
        let store = Arc::new(StubStore {
            auto_create: true,
            existing: true,
            created: Mutex::new(Vec::new()),
        });
        let handler = TwinAutoCreationHandler::new(store.clone());
        handler.handle(&event()).await.unwrap();
        assert!(store.created.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn table_absent_monitoring_rules_error_does_not_abort_creation() {
        let store = Arc::new(StubStore {
            auto_create: true,
            existing: false,
            created: Mutex::new(Vec::new()),
        });
        let handler = TwinAutoCreationHandler::new(store.clone());
        let result = handler.handle(&event()).await;
        assert!(result.is_ok());
        assert_eq!(store.created.lock().unwrap().len(), 1);
    }
}
