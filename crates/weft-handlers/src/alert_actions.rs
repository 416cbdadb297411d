//! Anomaly → Alert Actions: on `anomaly.detected`, runs every enabled alert
//! action matching the alert's rule/type/severity, sequentially, never
//! aborting on an individual action's failure, and records each outcome.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;
use tracing::warn;

use weft_events::{Event, Handler};

use crate::anomaly_trigger::build_seed_context;
use crate::capability::{
    AlertActionExecution, AlertActionStatus, AlertActionStore, AlertActionType, EmailSender, PipelineTrigger,
    WebhookCaller,
};

pub struct AlertActionsHandler {
    store: Arc<dyn AlertActionStore>,
    pipeline_trigger: Arc<dyn PipelineTrigger>,
    email_sender: Option<Arc<dyn EmailSender>>,
    webhook_caller: Option<Arc<dyn WebhookCaller>>,
}

impl AlertActionsHandler {
    pub fn new(store: Arc<dyn AlertActionStore>, pipeline_trigger: Arc<dyn PipelineTrigger>) -> Self {
        Self {
            store,
            pipeline_trigger,
            email_sender: None,
            webhook_caller: None,
        }
    }

    pub fn with_email_sender(mut self, sender: Arc<dyn EmailSender>) -> Self {
        self.email_sender = Some(sender);
        self
    }

    pub fn with_webhook_caller(mut self, caller: Arc<dyn WebhookCaller>) -> Self {
        self.webhook_caller = Some(caller);
        self
    }

    async fn run(&self, event: &Event) -> anyhow::Result<()> {
        let payload = &event.payload;
        let rule_id = payload.get("rule_id").and_then(Value::as_str);
        let alert_type = payload.get("alert_type").and_then(Value::as_str).unwrap_or("");
        let severity = payload.get("severity").and_then(Value::as_str).unwrap_or("");

        let actions = self.store.find_matching_actions(rule_id, alert_type, severity).await?;

        for action in actions.into_iter().filter(|a| a.enabled) {
            let started = Instant::now();
            let (status, error, result) = self.execute_one(&action.action_type, payload).await;
            let duration = started.elapsed();

            if let AlertActionStatus::Failed = status {
                warn!(action_id = %action.id, error = ?error, "alert action execution failed");
            }

            if let Err(e) = self
                .store
                .record_execution(AlertActionExecution {
                    action_id: action.id.clone(),
                    status,
                    error,
                    result,
                    duration,
                })
                .await
            {
                warn!(action_id = %action.id, error = %e, "failed to record alert action execution");
            }
        }

        Ok(())
    }

    async fn execute_one(
        &self,
        action_type: &AlertActionType,
        payload: &weft_core::value::JsonMap,
    ) -> (AlertActionStatus, Option<String>, Option<Value>) {
        match action_type {
            AlertActionType::ExecutePipeline { pipeline_ref } => {
                let seed_context = build_seed_context(payload);
                let result = self
                    .pipeline_trigger
                    .execute_pipeline(&CancellationToken::new(), pipeline_ref, seed_context)
                    .await;
                if result.success {
                    (AlertActionStatus::Success, None, Some(json!({"steps_ok": true})))
                } else {
                    (AlertActionStatus::Failed, Some(result.error), None)
                }
            }
            AlertActionType::SendEmail { to, subject } => match &self.email_sender {
                Some(sender) => match sender.send_email(to, subject, &Value::Object(payload.clone())).await {
                    Ok(()) => (AlertActionStatus::Success, None, None),
                    Err(e) => (AlertActionStatus::Failed, Some(e.to_string()), None),
                },
                None => (
                    AlertActionStatus::Failed,
                    Some("no email sender configured".to_string()),
                    None,
                ),
            },
            AlertActionType::Webhook { url } => match &self.webhook_caller {
                Some(caller) => match caller.call_webhook(url, &Value::Object(payload.clone())).await {
                    Ok(response) => (AlertActionStatus::Success, None, Some(response)),
                    Err(e) => (AlertActionStatus::Failed, Some(e.to_string()), None),
                },
                None => (
                    AlertActionStatus::Failed,
                    Some("no webhook caller configured".to_string()),
                    None,
                ),
            },
        }
    }
}

#[async_trait]
impl Handler for AlertActionsHandler {
    async fn handle(&self, event: &Event) -> anyhow::Result<()> {
        if let Err(e) = self.run(event).await {
            warn!(error = %e, "alert actions handler failed");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::sync::Mutex;
    use weft_events::topics;
    use weft_pipeline::{PipelineExecutionResult, PluginContext};

    use crate::capability::AlertAction;

    struct StubStore {
        actions: Vec<AlertAction>,
        recorded: Mutex<Vec<AlertActionExecution>>,
    }

    #[async_trait]
    impl AlertActionStore for StubStore {
        async fn find_matching_actions(
            &self,
            _rule_id: Option<&str>,
            _alert_type: &str,
            _severity: &str,
        ) -> anyhow::Result<Vec<AlertAction>> {
            Ok(self.actions.clone())
        }

        async fn record_execution(&self, execution: AlertActionExecution) -> anyhow::Result<()> {
            self.recorded.lock().unwrap().push(execution);
            Ok(())
        }
    }

    struct AlwaysSucceedsTrigger;
    #[async_trait]
    impl PipelineTrigger for AlwaysSucceedsTrigger {
        async fn execute_pipeline(
            &self,
            _cancellation: &CancellationToken,
            _pipeline_ref: &str,
            seed_context: PluginContext,
        ) -> PipelineExecutionResult {
            PipelineExecutionResult {
                success: true,
                error: String::new(),
                context: seed_context,
                executed_at: Utc::now(),
            }
        }
    }

    struct AlwaysFailsTrigger;
    #[async_trait]
    impl PipelineTrigger for AlwaysFailsTrigger {
        async fn execute_pipeline(
            &self,
            _cancellation: &CancellationToken,
            _pipeline_ref: &str,
            seed_context: PluginContext,
        ) -> PipelineExecutionResult {
            PipelineExecutionResult {
                success: false,
                error: "action pipeline failed".to_string(),
                context: seed_context,
                executed_at: Utc::now(),
            }
        }
    }

    fn anomaly_event() -> Event {
        Event::new(topics::ANOMALY_DETECTED, "detector")
            .with_payload(json!({"alert_type": "threshold", "severity": "high"}).as_object().unwrap().clone())
    }

    #[tokio::test]
    async fn runs_every_enabled_action_and_never_aborts_on_failure() {
        let store = Arc::new(StubStore {
            actions: vec![
                AlertAction {
                    id: "a1".to_string(),
                    action_type: AlertActionType::ExecutePipeline {
                        pipeline_ref: "fails".to_string(),
                    },
                    enabled: true,
                    rule_id: None,
                    alert_type: None,
                    severity: None,
                },
                AlertAction {
                    id: "a2".to_string(),
                    action_type: AlertActionType::ExecutePipeline {
                        pipeline_ref: "succeeds".to_string(),
                    },
                    enabled: true,
                    rule_id: None,
                    alert_type: None,
                    severity: None,
                },
            ],
            recorded: Mutex::new(Vec::new()),
        });

        // The stub always fails regardless of pipeline_ref; this asserts
        // both actions still run despite the first one failing.
        let handler = AlertActionsHandler::new(store.clone(), Arc::new(AlwaysFailsTrigger));
        handler.handle(&anomaly_event()).await.unwrap();

        let recorded = store.recorded.lock().unwrap();
        assert_eq!(recorded.len(), 2);
        assert!(recorded.iter().all(|e| e.status == AlertActionStatus::Failed));
    }

    #[tokio::test]
    async fn disabled_actions_are_skipped() {
        let store = Arc::new(StubStore {
            actions: vec![AlertAction {
                id: "a1".to_string(),
                action_type: AlertActionType::ExecutePipeline {
                    pipeline_ref: "p".to_string(),
                },
                enabled: false,
                rule_id: None,
                alert_type: None,
                severity: None,
            }],
            recorded: Mutex::new(Vec::new()),
        });
        let handler = AlertActionsHandler::new(store.clone(), Arc::new(AlwaysSucceedsTrigger));
        handler.handle(&anomaly_event()).await.unwrap();
        assert!(store.recorded.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn send_email_without_a_configured_sender_is_recorded_as_failed() {
        let store = Arc::new(StubStore {
            actions: vec![AlertAction {
                id: "a1".to_string(),
                action_type: AlertActionType::SendEmail {
                    to: "oncall@example.com".to_string(),
                    subject: "alert".to_string(),
                },
                enabled: true,
                rule_id: None,
                alert_type: None,
                severity: None,
            }],
            recorded: Mutex::new(Vec::new()),
        });
        let handler = AlertActionsHandler::new(store.clone(), Arc::new(AlwaysSucceedsTrigger));
        handler.handle(&anomaly_event()).await.unwrap();

        let recorded = store.recorded.lock().unwrap();
        assert_eq!(recorded[0].status, AlertActionStatus::Failed);
    }
}
