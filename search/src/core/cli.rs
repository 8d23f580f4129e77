use clap::{Parser, Subcommand};

use std::path::PathBuf;

use super::constants::{ENV_CONFIG, ENV_ENFORCE_REQUIRED, ENV_HISTORY_CAPACITY, ENV_RULES_PATH};
use crate::domain::monitor::OperationKind;

#[derive(Parser, Debug)]
#[command(name = "advisor-search")]
#[command(version, about = "Advisor search filter validation and store cost estimation", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Path to config file
    #[arg(long, short = 'c', global = true, env = ENV_CONFIG)]
    pub config: Option<PathBuf>,

    /// Path to a filter rule table (JSON). Defaults to the built-in table.
    #[arg(long, global = true, env = ENV_RULES_PATH)]
    pub rules: Option<PathBuf>,

    /// Report missing required filters instead of skipping them
    #[arg(long, global = true, env = ENV_ENFORCE_REQUIRED)]
    pub enforce_required: Option<bool>,

    /// Number of store operations kept in the monitor history
    #[arg(long, global = true, env = ENV_HISTORY_CAPACITY)]
    pub history_capacity: Option<usize>,
}

/// Parse operation kind from CLI string
fn parse_operation_kind(s: &str) -> Result<OperationKind, String> {
    s.parse()
}

#[derive(Subcommand, Clone, Debug, PartialEq)]
pub enum Commands {
    /// Validate a filter object and print the prepared search (default reads stdin)
    Check {
        /// JSON file with the filter object, or `-` for stdin
        #[arg(default_value = "-")]
        input: PathBuf,
    },
    /// Print the active filter rule table
    Rules,
    /// Estimate the store cost of an operation
    Estimate {
        /// Operation kind (read, write or query)
        #[arg(long, short = 'k', value_parser = parse_operation_kind)]
        kind: OperationKind,

        /// Number of documents touched
        #[arg(long, short = 'd')]
        documents: u64,
    },
}

/// Configuration derived from CLI arguments
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub config: Option<PathBuf>,
    pub rules: Option<PathBuf>,
    pub enforce_required: Option<bool>,
    pub history_capacity: Option<usize>,
}

fn split(cli: Cli) -> (CliConfig, Option<Commands>) {
    let config = CliConfig {
        config: cli.config,
        rules: cli.rules,
        enforce_required: cli.enforce_required,
        history_capacity: cli.history_capacity,
    };
    (config, cli.command)
}

/// Parse CLI arguments and return config with command
pub fn parse() -> (CliConfig, Option<Commands>) {
    split(Cli::parse())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_check_with_file() {
        let cli = Cli::try_parse_from(["advisor-search", "check", "filters.json"]).unwrap();
        assert_eq!(
            cli.command,
            Some(Commands::Check {
                input: PathBuf::from("filters.json")
            })
        );
    }

    #[test]
    fn parse_check_defaults_to_stdin() {
        let cli = Cli::try_parse_from(["advisor-search", "check"]).unwrap();
        assert_eq!(
            cli.command,
            Some(Commands::Check {
                input: PathBuf::from("-")
            })
        );
    }

    #[test]
    fn parse_estimate() {
        let cli = Cli::try_parse_from([
            "advisor-search",
            "estimate",
            "--kind",
            "Query",
            "--documents",
            "250",
        ])
        .unwrap();
        assert_eq!(
            cli.command,
            Some(Commands::Estimate {
                kind: OperationKind::Query,
                documents: 250
            })
        );
    }

    #[test]
    fn parse_estimate_rejects_unknown_kind() {
        let result = Cli::try_parse_from([
            "advisor-search",
            "estimate",
            "--kind",
            "delete",
            "--documents",
            "1",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn global_options_after_subcommand() {
        let cli = Cli::try_parse_from([
            "advisor-search",
            "rules",
            "--rules",
            "/tmp/rules.json",
            "--enforce-required",
            "true",
            "--history-capacity",
            "50",
        ])
        .unwrap();
        let (config, command) = split(cli);
        assert_eq!(command, Some(Commands::Rules));
        assert_eq!(config.rules, Some(PathBuf::from("/tmp/rules.json")));
        assert_eq!(config.enforce_required, Some(true));
        assert_eq!(config.history_capacity, Some(50));
    }
}
