use std::sync::Arc;

use anyhow::{anyhow, Result};
use tokio_util::sync::CancellationToken;

use weft_pipeline::{parse_pipeline, DocumentFormat, PipelineRuntime, PluginRegistry};

use crate::demo_plugins::{EchoPlugin, LogPlugin};

pub async fn run(file: &str, json: bool) -> Result<()> {
    let document = tokio::fs::read_to_string(file)
        .await
        .map_err(|e| anyhow!("failed to read pipeline file '{file}': {e}"))?;

    let format = if json { DocumentFormat::Json } else { DocumentFormat::Yaml };
    let pipeline = parse_pipeline(&document, format).map_err(|e| anyhow!("pipeline validation failed: {e}"))?;

    let registry = PluginRegistry::new();
    registry.register(Arc::new(EchoPlugin))?;
    registry.register(Arc::new(LogPlugin))?;

    let runtime = PipelineRuntime::new(&registry);
    let result = runtime.execute(&CancellationToken::new(), &pipeline).await;

    if result.success {
        println!("pipeline '{}' completed", pipeline.name);
        println!("{}", serde_json::to_string_pretty(&result.context)?);
        Ok(())
    } else {
        Err(anyhow!("pipeline '{}' failed: {}", pipeline.name, result.error))
    }
}
