//! Pipeline spec parsing: the YAML/JSON external interface described in the
//! design's §6, grounded in `fluent-engines::pipeline_executor::Pipeline`
//! and the config-validation style of
//! `fluent-cli::commands::pipeline::PipelineCommand::validate_pipeline_yaml`.

use serde::{Deserialize, Serialize};

use weft_core::error::{ValidationError, WeftError, WeftResult};

use crate::plugin::StepConfig;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub name: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub description: Option<String>,
    pub steps: Vec<StepConfig>,
}

fn default_enabled() -> bool {
    true
}

/// The config-file shape: a bag of pipelines, used when the single-pipeline
/// shape fails to parse.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct PipelineFile {
    pipelines: Vec<PipelineConfig>,
}

impl PipelineConfig {
    /// Validate the structural invariants from the design's data model:
    /// non-empty name, at least one step, non-empty step names and
    /// plugin references.
    pub fn validate(&self) -> WeftResult<()> {
        if self.name.trim().is_empty() {
            return Err(WeftError::Validation(ValidationError::EmptyField {
                field: "pipeline name".to_string(),
            }));
        }
        if self.steps.is_empty() {
            return Err(WeftError::Validation(ValidationError::EmptyPipeline {
                name: self.name.clone(),
            }));
        }
        for step in &self.steps {
            if step.name.trim().is_empty() {
                return Err(WeftError::Validation(ValidationError::EmptyField {
                    field: format!("step name in pipeline '{}'", self.name),
                }));
            }
            if step.plugin_ref.trim().is_empty() {
                return Err(WeftError::Validation(ValidationError::EmptyField {
                    field: format!("plugin_ref for step '{}'", step.name),
                }));
            }
        }
        Ok(())
    }
}

/// Parse a pipeline document, trying the single-pipeline shape first and
/// falling back to the config-file (`pipelines: [...]`) shape.
///
/// For the config-file shape, returns the first enabled pipeline, or the
/// first pipeline if none are enabled, or an error when the list is empty —
/// exactly the selection rule the design specifies for ambiguous input.
pub fn parse_pipeline(document: &str, format: DocumentFormat) -> WeftResult<PipelineConfig> {
    if let Ok(pipeline) = deserialize::<PipelineConfig>(document, format) {
        pipeline.validate()?;
        return Ok(pipeline);
    }

    let file: PipelineFile = deserialize(document, format).map_err(|e| {
        WeftError::Validation(ValidationError::InvalidValue {
            field: "pipeline document".to_string(),
            reason: e.to_string(),
        })
    })?;

    let chosen = file
        .pipelines
        .iter()
        .find(|p| p.enabled)
        .or_else(|| file.pipelines.first())
        .ok_or_else(|| {
            WeftError::Validation(ValidationError::InvalidValue {
                field: "pipelines".to_string(),
                reason: "config file contains no pipelines".to_string(),
            })
        })?
        .clone();

    chosen.validate()?;
    Ok(chosen)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Yaml,
    Json,
}

fn deserialize<T: for<'de> Deserialize<'de>>(
    document: &str,
    format: DocumentFormat,
) -> anyhow::Result<T> {
    match format {
        DocumentFormat::Yaml => Ok(serde_yaml::from_str(document)?),
        DocumentFormat::Json => Ok(serde_json::from_str(document)?),
    }
}
