//! CLI configuration management.

use benchviz_core::ColorMode;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// CLI configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CliConfig {
    /// Site the data files are served from.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Cache directory. Defaults to the platform cache dir.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_dir: Option<PathBuf>,
    /// Output format.
    #[serde(default)]
    pub output_format: OutputFormat,
    /// Palette used for chart output.
    #[serde(default)]
    pub theme: ColorMode,
}

fn default_base_url() -> String {
    "http://localhost:3000".to_string()
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            cache_dir: None,
            output_format: OutputFormat::default(),
            theme: ColorMode::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
    Yaml,
    /// Themed chart configuration
    Chart,
}

fn project_dirs() -> Result<directories::ProjectDirs, Box<dyn std::error::Error>> {
    Ok(directories::ProjectDirs::from("dev", "benchviz", "benchviz")
        .ok_or("Could not determine config directory")?)
}

impl CliConfig {
    /// Load configuration from file.
    pub fn load() -> Result<Self, Box<dyn std::error::Error>> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            Ok(serde_yaml::from_str(&content)?)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to file.
    pub fn save(&self) -> Result<(), Box<dyn std::error::Error>> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_yaml::to_string(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the configuration file path.
    pub fn config_path() -> Result<PathBuf, Box<dyn std::error::Error>> {
        Ok(project_dirs()?.config_dir().join("config.yaml"))
    }

    /// Directory the filesystem cache lives in.
    pub fn cache_dir(&self) -> Result<PathBuf, Box<dyn std::error::Error>> {
        match &self.cache_dir {
            Some(dir) => Ok(dir.clone()),
            None => Ok(project_dirs()?.cache_dir().join("chart-data")),
        }
    }

    /// Set a configuration value.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), String> {
        match key {
            "base_url" => self.base_url = value.to_string(),
            "cache_dir" => self.cache_dir = Some(PathBuf::from(value)),
            "output_format" => {
                self.output_format = match value {
                    "table" => OutputFormat::Table,
                    "json" => OutputFormat::Json,
                    "yaml" => OutputFormat::Yaml,
                    "chart" => OutputFormat::Chart,
                    _ => return Err(format!("Invalid output format: {}", value)),
                };
            }
            "theme" => {
                self.theme = match value {
                    "light" => ColorMode::Light,
                    "dark" => ColorMode::Dark,
                    _ => return Err(format!("Invalid theme: {}", value)),
                };
            }
            _ => return Err(format!("Unknown config key: {}", key)),
        }
        Ok(())
    }
}
