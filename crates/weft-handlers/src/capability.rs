//! Narrow capability traits each reactive handler depends on, instead of
//! the concrete ontology/twin/alert stores or the pipeline registry
//! directly — the same cyclic-reference-avoidance pattern used by
//! `weft_scheduler::capability`.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use weft_core::value::JsonMap;
use weft_pipeline::{PipelineExecutionResult, PluginContext};

/// Resolves a `pipeline_ref` and runs it, optionally with a pre-seeded
/// shared context. Mirrors `weft_scheduler::capability::PipelineExecutor`
/// but adds the context-seeding hook the anomaly trigger handler needs.
#[async_trait]
pub trait PipelineTrigger: Send + Sync {
    async fn execute_pipeline(
        &self,
        cancellation: &CancellationToken,
        pipeline_ref: &str,
        seed_context: PluginContext,
    ) -> PipelineExecutionResult;
}

/// Invokes the extraction plugin on behalf of the auto-extraction handler.
#[async_trait]
pub trait ExtractionInvoker: Send + Sync {
    async fn invoke_extraction(&self, ontology_id: &str, data: JsonMap) -> anyhow::Result<ExtractionOutcome>;
}

#[derive(Debug, Clone, Default)]
pub struct ExtractionOutcome {
    pub entities_extracted: usize,
    pub ontology_id: String,
}

/// Ontology/twin bookkeeping the model-training-completion handler needs.
/// `install_default_monitoring_rules` is table-absence tolerant per the
/// design: a `NotFound`-shaped error from this call is logged and ignored
/// rather than aborting twin creation.
#[async_trait]
pub trait TwinStore: Send + Sync {
    async fn auto_create_twins_enabled(&self, ontology_id: &str) -> anyhow::Result<bool>;
    async fn twin_exists(&self, ontology_id: &str, model_id: &str) -> anyhow::Result<bool>;
    async fn create_twin(&self, request: &CreateTwinRequest) -> anyhow::Result<String>;
    async fn install_default_monitoring_rules(&self, twin_id: &str) -> anyhow::Result<()>;
    async fn generate_simulation_scenarios(&self, twin_id: &str, model_type: &str) -> anyhow::Result<()>;
}

#[derive(Debug, Clone)]
pub struct CreateTwinRequest {
    pub ontology_id: String,
    pub model_id: String,
    pub model_type: String,
    pub target_property: String,
}

/// Resolves which pipeline an anomaly should trigger: either the explicit
/// `trigger_pipeline_id` from the event payload, or the first enabled
/// pipeline carrying `tag`.
#[async_trait]
pub trait AlertPipelineResolver: Send + Sync {
    async fn resolve(&self, explicit_pipeline_id: Option<&str>, tag: &str) -> Option<String>;
}

/// The alert-actions store: which actions match an alert, and where to
/// record each execution's outcome.
#[async_trait]
pub trait AlertActionStore: Send + Sync {
    async fn find_matching_actions(
        &self,
        rule_id: Option<&str>,
        alert_type: &str,
        severity: &str,
    ) -> anyhow::Result<Vec<AlertAction>>;

    async fn record_execution(&self, execution: AlertActionExecution) -> anyhow::Result<()>;
}

#[derive(Debug, Clone)]
pub struct AlertAction {
    pub id: String,
    pub action_type: AlertActionType,
    pub enabled: bool,
    pub rule_id: Option<String>,
    pub alert_type: Option<String>,
    pub severity: Option<String>,
}

#[derive(Debug, Clone)]
pub enum AlertActionType {
    ExecutePipeline { pipeline_ref: String },
    SendEmail { to: String, subject: String },
    Webhook { url: String },
}

#[derive(Debug, Clone)]
pub struct AlertActionExecution {
    pub action_id: String,
    pub status: AlertActionStatus,
    pub error: Option<String>,
    pub result: Option<serde_json::Value>,
    pub duration: std::time::Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertActionStatus {
    Success,
    Failed,
}

/// The out-of-scope email/webhook collaborators: only their call shape is
/// specified here (spec.md §1 lists the SMTP client as an external
/// collaborator), so these traits have no bundled implementation — a host
/// binary wires in a real mailer/HTTP client.
#[async_trait]
pub trait EmailSender: Send + Sync {
    async fn send_email(&self, to: &str, subject: &str, body: &serde_json::Value) -> anyhow::Result<()>;
}

#[async_trait]
pub trait WebhookCaller: Send + Sync {
    async fn call_webhook(&self, url: &str, body: &serde_json::Value) -> anyhow::Result<serde_json::Value>;
}
