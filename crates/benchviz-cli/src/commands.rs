//! CLI command definitions.

use crate::config::OutputFormat;
use benchviz_core::SchemaKind;
use clap::Subcommand;
use std::path::PathBuf;

#[derive(Subcommand)]
pub enum Commands {
    /// Fetch and validate a chart-data document
    Fetch {
        /// Logical data path, e.g. /benchmarks/atlas-4096.json
        path: String,

        /// Schema the document must satisfy (chart or benchmark)
        #[arg(short, long, default_value_t = SchemaKind::Chart)]
        schema: SchemaKind,

        /// Bypass the local cache
        #[arg(long)]
        no_cache: bool,

        /// Override the configured site URL
        #[arg(long)]
        base_url: Option<String>,

        /// Output format (defaults to the configured one)
        #[arg(short, long, value_enum)]
        format: Option<OutputFormat>,
    },

    /// Validate benchmark datasets on disk
    Validate {
        /// Directory holding the dataset files
        #[arg(default_value = "static/data/benchmarks")]
        dir: PathBuf,

        /// JSON schema document to validate against instead of the built-in one
        #[arg(long)]
        schema_file: Option<PathBuf>,
    },

    /// Manage the local chart-data cache
    Cache {
        #[command(subcommand)]
        command: CacheCommands,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
pub enum CacheCommands {
    /// List cached paths
    List,

    /// Clear one path, or the whole cache
    Clear {
        /// Logical data path
        path: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show current configuration
    Show,

    /// Set a configuration value
    Set {
        /// Configuration key
        key: String,

        /// Configuration value
        value: String,
    },
}
