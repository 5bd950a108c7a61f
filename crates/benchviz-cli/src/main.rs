//! Benchviz CLI entrypoint.

use clap::Parser;

mod commands;
mod config;
mod handlers;
mod render;
mod telemetry;

use commands::{CacheCommands, Commands, ConfigCommands};
use config::CliConfig;

#[derive(Parser)]
#[command(name = "benchviz")]
#[command(author, version, about = "Benchmark chart-data command-line interface", long_about = None)]
struct Cli {
    /// Emit JSON log lines instead of human-readable ones
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    telemetry::init_tracing(cli.json_logs);

    let config = CliConfig::load().unwrap_or_default();

    match cli.command {
        Commands::Fetch {
            path,
            schema,
            no_cache,
            base_url,
            format,
        } => handlers::fetch(&config, &path, schema, no_cache, base_url, format).await?,
        Commands::Validate { dir, schema_file } => {
            handlers::validate(&dir, schema_file.as_deref())?
        }
        Commands::Cache { command } => match command {
            CacheCommands::List => handlers::list_cache(&config)?,
            CacheCommands::Clear { path } => handlers::clear_cache(&config, path.as_deref())?,
        },
        Commands::Config { command } => match command {
            ConfigCommands::Show => handlers::show_config(&config)?,
            ConfigCommands::Set { key, value } => handlers::set_config(&key, &value)?,
        },
    }

    Ok(())
}
