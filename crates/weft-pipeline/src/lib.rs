pub mod context;
pub mod pipeline_config;
pub mod plugin;
pub mod registry;
pub mod runtime;

pub use context::PluginContext;
pub use pipeline_config::{parse_pipeline, DocumentFormat, PipelineConfig};
pub use plugin::{split_plugin_ref, Plugin, StepConfig};
pub use registry::PluginRegistry;
pub use runtime::{PipelineExecutionResult, PipelineRuntime};
