//! Core application

use std::fs;
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::core::cli::{self, CliConfig, Commands};
use crate::core::config::AppConfig;
use crate::core::constants::{CRATE_TARGET, ENV_LOG, EXIT_INVALID_FILTER};
use crate::query::{
    ExpressionBuilder, OperatorRegistry, QueryGroup, ScalarValue, is_valid_group, load_group,
};

/// Output of `sieve compile`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompileReport {
    pub expression: String,
    pub parameters: Vec<ScalarValue>,
    pub valid: bool,
}

pub struct CoreApp {
    pub config: AppConfig,
    pub registry: Arc<OperatorRegistry>,
}

impl CoreApp {
    /// Run the application with CLI argument parsing
    pub fn run() -> Result<ExitCode> {
        Self::init_logging();

        tracing::debug!("Application starting");

        let (cli_config, command) = cli::parse();
        tracing::trace!(command = ?command, "Parsed command");

        let app = Self::init(&cli_config)?;
        match command {
            Commands::Check { file } => app.check(&file).map(ExitCode::from),
            Commands::Compile { file, .. } => app.print_compiled(&file),
            Commands::Operators => {
                println!("{}", app.operator_listing());
                Ok(ExitCode::SUCCESS)
            }
        }
    }

    pub fn init(cli: &CliConfig) -> Result<Self> {
        let config = AppConfig::load(cli)?;
        Ok(Self {
            config,
            registry: Arc::new(OperatorRegistry::default()),
        })
    }

    fn init_logging() {
        let default_filter = format!("warn,{}=info", CRATE_TARGET);

        let filter = std::env::var(ENV_LOG)
            .or_else(|_| std::env::var("RUST_LOG"))
            .unwrap_or(default_filter);

        tracing_subscriber::fmt()
            .with_target(false)
            .with_thread_ids(false)
            .with_level(true)
            .with_ansi(true)
            .compact()
            .with_writer(std::io::stderr)
            .with_env_filter(filter)
            .init();
    }

    /// Read and validate a saved filter document
    pub fn load_document(path: &Path) -> Result<QueryGroup> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read filter document: {}", path.display()))?;
        load_group(&content)
            .with_context(|| format!("Failed to load filter document: {}", path.display()))
    }

    /// Compile a filter tree with the configured builder options
    pub fn compile(&self, group: &QueryGroup) -> CompileReport {
        let mut builder =
            ExpressionBuilder::with_options(Arc::clone(&self.registry), self.config.builder_options());
        builder.build_group(group);
        let compiled = builder.into_compiled();

        CompileReport {
            expression: compiled.text,
            parameters: compiled.parameters,
            valid: is_valid_group(group),
        }
    }

    /// Validate a saved filter document and return the process exit status
    pub fn check(&self, path: &Path) -> Result<u8> {
        let group = Self::load_document(path)?;
        if is_valid_group(&group) {
            println!("valid");
            Ok(0)
        } else {
            println!("invalid");
            Ok(EXIT_INVALID_FILTER)
        }
    }

    /// Registered operator codes, one per line
    pub fn operator_listing(&self) -> String {
        self.registry.codes().join("\n")
    }

    fn print_compiled(&self, path: &Path) -> Result<ExitCode> {
        let group = Self::load_document(path)?;
        let report = self.compile(&group);
        tracing::debug!(
            parameters = report.parameters.len(),
            valid = report.valid,
            "Compiled filter document"
        );

        let output = if self.config.output.pretty {
            serde_json::to_string_pretty(&report)?
        } else {
            serde_json::to_string(&report)?
        };
        println!("{}", output);
        Ok(ExitCode::SUCCESS)
    }
}
