use clap::{Parser, Subcommand};

use std::path::PathBuf;

use super::constants::{ENV_COMPARISON, ENV_CONFIG};

#[derive(Parser)]
#[command(name = "sieve")]
#[command(version, about = "Compile saved query filters into predicate expressions", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to config file
    #[arg(long, short = 'c', global = true, env = ENV_CONFIG)]
    pub config: Option<PathBuf>,

    /// Token passed as the comparison argument of string methods
    #[arg(long, global = true, env = ENV_COMPARISON)]
    pub comparison: Option<String>,
}

#[derive(Subcommand, Clone, Debug)]
pub enum Commands {
    /// Report whether a saved filter has at least one usable condition
    Check {
        /// Saved filter document (JSON)
        file: PathBuf,
    },
    /// Print the compiled expression and its parameters
    Compile {
        /// Saved filter document (JSON)
        file: PathBuf,

        /// Pretty-print the JSON output
        #[arg(long)]
        pretty: bool,
    },
    /// List registered operator codes
    Operators,
}

/// Configuration derived from CLI arguments
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub config: Option<PathBuf>,
    pub comparison: Option<String>,
    pub pretty: bool,
}

/// Parse CLI arguments and return config with command
pub fn parse() -> (CliConfig, Commands) {
    let cli = Cli::parse();
    let pretty = matches!(cli.command, Commands::Compile { pretty: true, .. });
    let config = CliConfig {
        config: cli.config,
        comparison: cli.comparison,
        pretty,
    };
    (config, cli.command)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_compile_command() {
        let cli = Cli::try_parse_from([
            "sieve",
            "compile",
            "filter.json",
            "--pretty",
            "--comparison",
            "true",
        ])
        .unwrap();

        assert_eq!(cli.comparison.as_deref(), Some("true"));
        match cli.command {
            Commands::Compile { file, pretty } => {
                assert_eq!(file, PathBuf::from("filter.json"));
                assert!(pretty);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn parses_check_with_config() {
        let cli =
            Cli::try_parse_from(["sieve", "-c", "custom.json", "check", "saved.json"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("custom.json")));
        assert!(matches!(cli.command, Commands::Check { .. }));
    }

    #[test]
    fn requires_subcommand() {
        assert!(Cli::try_parse_from(["sieve"]).is_err());
    }
}
