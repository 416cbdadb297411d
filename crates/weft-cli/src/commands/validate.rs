use anyhow::{anyhow, Result};

use weft_pipeline::{parse_pipeline, DocumentFormat};

pub async fn run(file: &str, json: bool) -> Result<()> {
    let document = tokio::fs::read_to_string(file)
        .await
        .map_err(|e| anyhow!("failed to read pipeline file '{file}': {e}"))?;

    let format = if json { DocumentFormat::Json } else { DocumentFormat::Yaml };
    let pipeline = parse_pipeline(&document, format).map_err(|e| anyhow!("pipeline validation failed: {e}"))?;

    println!("pipeline '{}' is valid ({} step(s))", pipeline.name, pipeline.steps.len());
    Ok(())
}
