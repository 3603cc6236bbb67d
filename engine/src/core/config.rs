use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::query::{BuilderOptions, DEFAULT_COMPARISON};

use super::cli::CliConfig;
use super::constants::CONFIG_FILE_NAME;

/// Compiler configuration section (from JSON config file)
#[derive(Debug, Default, Clone, Deserialize)]
pub struct CompilerFileConfig {
    pub comparison: Option<String>,
}

/// Output configuration section (from JSON config file)
#[derive(Debug, Default, Clone, Deserialize)]
pub struct OutputFileConfig {
    pub pretty: Option<bool>,
}

/// File-based configuration (JSON)
#[derive(Debug, Default, Deserialize)]
pub struct FileConfig {
    pub compiler: Option<CompilerFileConfig>,
    pub output: Option<OutputFileConfig>,
    #[serde(flatten)]
    pub extra: serde_json::Value,
}

impl FileConfig {
    /// Load configuration from a JSON file
    fn load_from_file(path: &Path) -> Result<Self> {
        tracing::debug!(path = %path.display(), "Loading config file");
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        tracing::trace!(config = ?config, "Parsed config file");
        Ok(config)
    }

    /// Warn about unknown fields in the config
    fn warn_unknown_fields(&self) {
        if let serde_json::Value::Object(map) = &self.extra
            && !map.is_empty()
        {
            let keys_str: String = map
                .keys()
                .map(|k| k.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            tracing::warn!(
                fields = %keys_str,
                "Unknown fields in config file (possible typos)"
            );
        }
    }
}

/// Compiler settings
#[derive(Debug, Clone)]
pub struct CompilerConfig {
    pub comparison: String,
}

/// Output settings
#[derive(Debug, Clone)]
pub struct OutputConfig {
    pub pretty: bool,
}

/// Final merged application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub compiler: CompilerConfig,
    pub output: OutputConfig,
}

impl AppConfig {
    /// Load configuration from all sources
    ///
    /// Priority (lowest to highest):
    /// 1. Defaults
    /// 2. Local directory config OR CLI-specified config path
    /// 3. CLI arguments (which include env var fallbacks via clap)
    pub fn load(cli: &CliConfig) -> Result<Self> {
        tracing::debug!("Loading application configuration");
        tracing::trace!(cli = ?cli, "CLI config");

        let config_path = if let Some(ref path) = cli.config {
            if !path.exists() {
                anyhow::bail!("Config file not found: {}", path.display());
            }
            Some(path.clone())
        } else {
            let local = PathBuf::from(CONFIG_FILE_NAME);
            if local.exists() { Some(local) } else { None }
        };

        let file_config = match config_path {
            Some(path) => {
                let config = FileConfig::load_from_file(&path)?;
                config.warn_unknown_fields();
                config
            }
            None => FileConfig::default(),
        };

        let file_compiler = file_config.compiler.unwrap_or_default();
        let file_output = file_config.output.unwrap_or_default();

        let comparison = cli
            .comparison
            .clone()
            .or(file_compiler.comparison)
            .unwrap_or_else(|| DEFAULT_COMPARISON.to_string());
        let pretty = cli.pretty || file_output.pretty.unwrap_or(false);

        let config = Self {
            compiler: CompilerConfig { comparison },
            output: OutputConfig { pretty },
        };
        tracing::debug!(config = ?config, "Configuration loaded");
        Ok(config)
    }

    /// Options for expression builders created by the application
    pub fn builder_options(&self) -> BuilderOptions {
        BuilderOptions {
            comparison: self.compiler.comparison.clone(),
        }
    }
}
