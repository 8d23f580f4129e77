//! Core application

use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::CommandFactory;
use tokio::io::AsyncReadExt;

use crate::core::cli::{self, Cli, CliConfig, Commands};
use crate::core::config::AppConfig;
use crate::core::constants::{APP_NAME, APP_NAME_LOWER, ENV_LOG};
use crate::domain::filters::{FilterService, FilterSet, RuleTable};
use crate::domain::monitor::{
    OperationKind, OperationMetadata, PerformanceMonitor, estimate_cost,
};

/// Exit code for a filter object that failed validation
const EXIT_INVALID_FILTERS: u8 = 2;

/// Collection name the monitor records input loading under
const INPUT_COLLECTION: &str = "filter_input";

pub struct CoreApp {
    pub config: AppConfig,
    pub filters: Arc<FilterService>,
    pub monitor: Arc<PerformanceMonitor>,
}

impl CoreApp {
    /// Run the application with CLI argument parsing
    pub async fn run() -> Result<ExitCode> {
        dotenvy::dotenv().ok();
        Self::init_logging();

        tracing::debug!(app = APP_NAME, "Application starting");

        let (cli_config, command) = cli::parse();
        tracing::trace!(command = ?command, "Parsed command");

        let Some(command) = command else {
            Cli::command().print_help()?;
            return Ok(ExitCode::SUCCESS);
        };

        let app = Self::init(&cli_config)?;
        let code = app.dispatch(command).await?;

        tracing::debug!(summary = ?app.monitor.summary(), "Session store metrics");
        Ok(code)
    }

    /// Build services from layered configuration
    pub fn init(cli: &CliConfig) -> Result<Self> {
        let config = AppConfig::load(cli)?;

        let mut rules = RuleTable::load(config.rules.path.as_deref())
            .context("Failed to load filter rule table")?;
        if let Some(enforce) = config.rules.enforce_required {
            rules = rules.with_enforce_required(enforce);
        }

        let filters = Arc::new(FilterService::new(rules));
        let monitor = Arc::new(PerformanceMonitor::new(config.monitor.history_capacity));

        Ok(Self {
            config,
            filters,
            monitor,
        })
    }

    async fn dispatch(&self, command: Commands) -> Result<ExitCode> {
        match command {
            Commands::Check { input } => self.check(&input).await,
            Commands::Rules => {
                print_json(&self.filters.rules().to_config())?;
                Ok(ExitCode::SUCCESS)
            }
            Commands::Estimate { kind, documents } => {
                print_json(&estimate_report(kind, documents))?;
                Ok(ExitCode::SUCCESS)
            }
        }
    }

    async fn check(&self, input: &Path) -> Result<ExitCode> {
        let metadata =
            OperationMetadata::default().with_field("source", input.display().to_string());
        let content = self
            .monitor
            .monitor_read(INPUT_COLLECTION, Some(metadata), || read_input(input))
            .await
            .with_context(|| format!("Failed to read filter input: {}", input.display()))?;

        let filters = FilterSet::from_json_str(&content)
            .with_context(|| format!("Invalid filter object in {}", input.display()))?;

        let prepared = self.filters.prepare(&filters);
        print_json(&prepared)?;

        if prepared.is_ready() {
            Ok(ExitCode::SUCCESS)
        } else {
            tracing::info!(
                errors = prepared.validation.errors.len(),
                "Filter object failed validation"
            );
            Ok(ExitCode::from(EXIT_INVALID_FILTERS))
        }
    }

    fn init_logging() {
        let default_filter = format!("warn,{}=info", APP_NAME_LOWER);

        let filter = std::env::var(ENV_LOG)
            .or_else(|_| std::env::var("RUST_LOG"))
            .unwrap_or(default_filter);

        // stdout carries command output
        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_thread_ids(false)
            .with_level(true)
            .with_ansi(true)
            .compact()
            .with_env_filter(filter)
            .init();
    }
}

/// Read a file, or stdin for `-`
async fn read_input(input: &Path) -> std::io::Result<String> {
    if input == Path::new("-") {
        let mut buf = String::new();
        tokio::io::stdin().read_to_string(&mut buf).await?;
        Ok(buf)
    } else {
        tokio::fs::read_to_string(input).await
    }
}

fn estimate_report(kind: OperationKind, documents: u64) -> serde_json::Value {
    serde_json::json!({
        "kind": kind,
        "documents": documents,
        "unitCost": kind.unit_cost(),
        "estimatedCost": estimate_cost(kind, documents),
    })
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    let out = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{}", out);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn estimate_report_for_query() {
        let report = estimate_report(OperationKind::Query, 1000);
        assert_eq!(report["kind"], "query");
        assert_eq!(report["documents"], 1000);
        let cost = report["estimatedCost"].as_f64().unwrap();
        assert!((cost - 0.00036).abs() < 1e-12);
    }

    #[test]
    fn init_with_cli_overrides() {
        let cli = CliConfig {
            enforce_required: Some(true),
            history_capacity: Some(5),
            ..Default::default()
        };
        let app = CoreApp::init(&cli).unwrap();
        assert!(app.filters.rules().enforce_required());
        assert_eq!(app.monitor.capacity(), 5);
    }

    #[tokio::test]
    async fn check_valid_file_records_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("filters.json");
        std::fs::write(
            &path,
            r#"{"principalOfficeCity":"Austin","custodians":["Fidelity"]}"#,
        )
        .unwrap();

        let app = CoreApp::init(&CliConfig::default()).unwrap();
        let code = app.check(&path).await.unwrap();
        assert_eq!(code, ExitCode::SUCCESS);

        let stats = app
            .monitor
            .stats(OperationKind::Read, INPUT_COLLECTION)
            .unwrap();
        assert_eq!(stats.count, 1);
        assert_eq!(stats.error_count, 0);
    }

    #[tokio::test]
    async fn check_invalid_file_exits_with_code_two() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("filters.json");
        std::fs::write(&path, r#"{"custodians":["Bank of Nowhere"]}"#).unwrap();

        let app = CoreApp::init(&CliConfig::default()).unwrap();
        let code = app.check(&path).await.unwrap();
        assert_eq!(code, ExitCode::from(EXIT_INVALID_FILTERS));
    }

    #[tokio::test]
    async fn check_missing_file_records_failure() {
        let app = CoreApp::init(&CliConfig::default()).unwrap();
        let err = app
            .check(Path::new("/nonexistent/filters.json"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Failed to read filter input"));

        let stats = app
            .monitor
            .stats(OperationKind::Read, INPUT_COLLECTION)
            .unwrap();
        assert_eq!(stats.error_count, 1);
    }
}
