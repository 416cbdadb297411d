pub mod alert_actions;
pub mod anomaly_trigger;
pub mod capability;
pub mod extraction;
pub mod twin;

pub use alert_actions::AlertActionsHandler;
pub use anomaly_trigger::AnomalyPipelineTriggerHandler;
pub use extraction::AutoExtractionHandler;
pub use twin::TwinAutoCreationHandler;

pub use capability::{
    AlertAction, AlertActionExecution, AlertActionStatus, AlertActionStore, AlertActionType, AlertPipelineResolver,
    CreateTwinRequest, EmailSender, ExtractionInvoker, ExtractionOutcome, PipelineTrigger, TwinStore, WebhookCaller,
};
