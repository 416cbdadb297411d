use thiserror::Error;

/// Top-level error taxonomy shared across the orchestration engine.
///
/// `StepFailure`, `HandlerError`, and `Cancellation` from the design's error
/// table are deliberately *not* variants here: those are fail-soft outcomes
/// recorded as data (on `PipelineExecutionResult`, or logged from inside a
/// handler) rather than faults that unwind a call.
#[derive(Debug, Error)]
pub enum WeftError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    NotFound(#[from] NotFoundError),

    #[error(transparent)]
    AlreadyExists(#[from] AlreadyExistsError),

    #[error(transparent)]
    State(#[from] StateError),

    #[error(transparent)]
    Persistence(#[from] PersistenceError),

    #[error(transparent)]
    Timeout(#[from] TimeoutError),
}

pub type WeftResult<T> = Result<T, WeftError>;

/// Bad input from a caller: empty id, invalid cron expression, malformed
/// plugin reference, duplicate id passed to an `Add*` call, etc.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("{field} must not be empty")]
    EmptyField { field: String },

    #[error("invalid cron expression format")]
    InvalidCron,

    #[error("wildcard minutes not supported")]
    WildcardMinute,

    #[error("invalid plugin reference format: {reference}, expected 'Type.Name'")]
    InvalidPluginReference { reference: String },

    #[error("pipeline '{name}' must have at least one step")]
    EmptyPipeline { name: String },

    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },
}

/// An unknown job, pipeline, execution, or plugin was requested.
#[derive(Debug, Error)]
pub enum NotFoundError {
    #[error("plugin type '{plugin_type}' is not registered")]
    PluginType { plugin_type: String },

    #[error("plugin '{plugin_type}.{name}' is not registered")]
    Plugin { plugin_type: String, name: String },

    #[error("job '{id}' not found")]
    Job { id: String },
}

/// Duplicate identity on an `Add`/`register` call.
#[derive(Debug, Error)]
pub enum AlreadyExistsError {
    #[error("plugin '{plugin_type}.{name}' is already registered")]
    Plugin { plugin_type: String, name: String },

    #[error("job '{id}' already exists")]
    Job { id: String },
}

/// Illegal lifecycle transition (Start-when-running, Stop-when-not-running).
#[derive(Debug, Error)]
pub enum StateError {
    #[error("scheduler is already running")]
    AlreadyRunning,

    #[error("scheduler is not running")]
    NotRunning,
}

/// Storage failure. Per the design, mutation paths (`Add`/`Update`) log and
/// continue on this error; `Get`/`List` paths propagate it to the caller.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("storage backend error: {0}")]
    Backend(String),

    #[error("failed to serialize row: {0}")]
    Serialization(String),

    #[error("failed to deserialize row: {0}")]
    Deserialization(String),
}

/// The scheduler's graceful-shutdown drain exceeded its budget.
#[derive(Debug, Error)]
#[error("stop timed out after {waited_secs}s with in-flight jobs still running")]
pub struct TimeoutError {
    pub waited_secs: u64,
}

impl From<serde_json::Error> for PersistenceError {
    fn from(err: serde_json::Error) -> Self {
        PersistenceError::Serialization(err.to_string())
    }
}
