use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "weft", about = "Run and schedule pipelines against the weft orchestration engine")]
pub struct WeftArgs {
    #[arg(long, value_name = "FILE", global = true, help = "TOML config file; falls back to built-in defaults")]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    #[command(about = "Validate and run a single pipeline document to completion")]
    Run {
        #[arg(short, long, help = "Path to a YAML or JSON pipeline document")]
        file: String,

        #[arg(long, help = "Parse the file as JSON instead of YAML")]
        json: bool,
    },

    #[command(about = "Validate a pipeline document without running it")]
    Validate {
        #[arg(short, long, help = "Path to a YAML or JSON pipeline document")]
        file: String,

        #[arg(long, help = "Parse the file as JSON instead of YAML")]
        json: bool,
    },

    #[command(about = "Run the scheduler loop, dispatching due jobs until interrupted")]
    Serve {
        #[arg(long, help = "SQLite database path; defaults to the config file's setting")]
        database: Option<String>,
    },
}
