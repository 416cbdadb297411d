mod args;
mod commands;
mod demo_plugins;

use anyhow::Result;
use clap::Parser;

use args::{Command, WeftArgs};
use weft_core::config::{load_config, RuntimeConfig};

#[tokio::main]
async fn main() -> Result<()> {
    weft_core::logging::init_tracing();

    let args = WeftArgs::parse();
    let config = load_runtime_config(args.config.as_deref()).await?;

    match args.command {
        Command::Run { file, json } => commands::run::run(&file, json).await,
        Command::Validate { file, json } => commands::validate::run(&file, json).await,
        Command::Serve { database } => commands::serve::run(config, database).await,
    }
}

async fn load_runtime_config(path: Option<&str>) -> Result<RuntimeConfig> {
    let document = match path {
        Some(path) => tokio::fs::read_to_string(path).await?,
        None => String::new(),
    };
    Ok(load_config(&document)?)
}
