use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::utils::file::expand_path;

use super::cli::CliConfig;
use super::constants::{
    APP_DOT_FOLDER, CONFIG_FILE_NAME, DEFAULT_HISTORY_CAPACITY, MAX_HISTORY_CAPACITY,
};

// =============================================================================
// File Config (all fields optional, merged across files)
// =============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RulesFileConfig {
    pub path: Option<String>,
    pub enforce_required: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MonitorFileConfig {
    pub history_capacity: Option<usize>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FileConfig {
    pub rules: Option<RulesFileConfig>,
    pub monitor: Option<MonitorFileConfig>,
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

    /// Merge another FileConfig into this one (other takes precedence)
    fn merge(&mut self, other: FileConfig) {
        if let Some(rules) = other.rules {
            let current = self.rules.get_or_insert_with(RulesFileConfig::default);
            if rules.path.is_some() {
                tracing::trace!(path = ?rules.path, "Merging rules.path");
                current.path = rules.path;
            }
            if rules.enforce_required.is_some() {
                tracing::trace!(
                    enforce_required = ?rules.enforce_required,
                    "Merging rules.enforce_required"
                );
                current.enforce_required = rules.enforce_required;
            }
        }

        if let Some(monitor) = other.monitor {
            let current = self.monitor.get_or_insert_with(MonitorFileConfig::default);
            if monitor.history_capacity.is_some() {
                tracing::trace!(
                    history_capacity = ?monitor.history_capacity,
                    "Merging monitor.history_capacity"
                );
                current.history_capacity = monitor.history_capacity;
            }
        }
    }
}

// =============================================================================
// Resolved Config
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RulesConfig {
    /// External rule table; `None` uses the embedded table
    pub path: Option<PathBuf>,
    /// Overrides the table's own `enforce_required` when set
    pub enforce_required: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorConfig {
    pub history_capacity: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub rules: RulesConfig,
    pub monitor: MonitorConfig,
}

impl AppConfig {
    /// Load configuration from all sources
    ///
    /// Priority (lowest to highest):
    /// 1. Defaults
    /// 2. Profile directory config (~/.advisor-search/advisor-search.json)
    /// 3. Local directory config OR CLI-specified config path
    /// 4. CLI arguments (which include env var fallbacks via clap)
    pub fn load(cli: &CliConfig) -> Result<Self> {
        tracing::debug!("Loading application configuration");
        tracing::trace!(cli = ?cli, "CLI config");

        let mut file_config = FileConfig::default();
        let mut found_configs: Vec<String> = Vec::new();

        if let Some(profile_path) = get_profile_config_path()
            && profile_path.exists()
        {
            let profile_config = FileConfig::load_from_file(&profile_path)?;
            profile_config.warn_unknown_fields();
            file_config.merge(profile_config);
            found_configs.push(profile_path.display().to_string());
        }

        let overlay_path = if let Some(ref path) = cli.config {
            let expanded = expand_path(&path.to_string_lossy());
            if !expanded.exists() {
                anyhow::bail!("Config file not found: {}", expanded.display());
            }
            Some(expanded)
        } else {
            let local = PathBuf::from(CONFIG_FILE_NAME);
            if local.exists() { Some(local) } else { None }
        };

        if let Some(path) = overlay_path {
            let overlay_config = FileConfig::load_from_file(&path)?;
            overlay_config.warn_unknown_fields();
            file_config.merge(overlay_config);
            found_configs.push(path.display().to_string());
        }

        tracing::debug!(configs = ?found_configs, "Config files loaded");

        Self::from_layers(file_config, cli)
    }

    /// Layer defaults -> file config -> CLI/env overrides
    fn from_layers(file_config: FileConfig, cli: &CliConfig) -> Result<Self> {
        let file_rules = file_config.rules.unwrap_or_default();
        let file_monitor = file_config.monitor.unwrap_or_default();

        let rules_path = cli
            .rules
            .as_ref()
            .map(|p| expand_path(&p.to_string_lossy()))
            .or_else(|| file_rules.path.as_deref().map(expand_path));

        let config = Self {
            rules: RulesConfig {
                path: rules_path,
                enforce_required: cli.enforce_required.or(file_rules.enforce_required),
            },
            monitor: MonitorConfig {
                history_capacity: cli
                    .history_capacity
                    .or(file_monitor.history_capacity)
                    .unwrap_or(DEFAULT_HISTORY_CAPACITY),
            },
        };

        config.validate()?;
        tracing::debug!(config = ?config, "Configuration resolved");
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        let capacity = self.monitor.history_capacity;
        if capacity == 0 || capacity > MAX_HISTORY_CAPACITY {
            anyhow::bail!(
                "Configuration error: monitor.history_capacity must be between 1 and {} (got {})",
                MAX_HISTORY_CAPACITY,
                capacity
            );
        }

        if let Some(path) = &self.rules.path
            && !path.is_file()
        {
            anyhow::bail!(
                "Configuration error: rules.path does not point to a file: {}",
                path.display()
            );
        }

        Ok(())
    }
}

/// Get the profile config path (~/.advisor-search/advisor-search.json)
fn get_profile_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(APP_DOT_FOLDER).join(CONFIG_FILE_NAME))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_config_parse_full() {
        let json = r#"{
            "rules": { "path": "/etc/advisor/rules.json", "enforce_required": true },
            "monitor": { "history_capacity": 500 }
        }"#;
        let config: FileConfig = serde_json::from_str(json).unwrap();

        let rules = config.rules.as_ref().unwrap();
        assert_eq!(rules.path.as_deref(), Some("/etc/advisor/rules.json"));
        assert_eq!(rules.enforce_required, Some(true));
        assert_eq!(config.monitor.unwrap().history_capacity, Some(500));
    }

    #[test]
    fn test_file_config_parse_empty() {
        let config: FileConfig = serde_json::from_str("{}").unwrap();
        assert!(config.rules.is_none());
        assert!(config.monitor.is_none());
    }

    #[test]
    fn test_file_config_parse_extra_fields() {
        let json = r#"{ "monitor": { "history_capacity": 10 }, "unknown_field": 123 }"#;
        let config: FileConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.extra.get("unknown_field").unwrap(), 123);
    }

    #[test]
    fn test_file_config_merge() {
        let mut base = FileConfig {
            rules: Some(RulesFileConfig {
                path: Some("base.json".to_string()),
                enforce_required: Some(false),
            }),
            monitor: Some(MonitorFileConfig {
                history_capacity: Some(100),
            }),
            ..Default::default()
        };
        let overlay = FileConfig {
            rules: Some(RulesFileConfig {
                path: None,
                enforce_required: Some(true),
            }),
            ..Default::default()
        };
        base.merge(overlay);

        let rules = base.rules.unwrap();
        assert_eq!(rules.path.as_deref(), Some("base.json"));
        assert_eq!(rules.enforce_required, Some(true));
        assert_eq!(base.monitor.unwrap().history_capacity, Some(100));
    }

    #[test]
    fn test_app_config_defaults() {
        let config = AppConfig::from_layers(FileConfig::default(), &CliConfig::default()).unwrap();
        assert_eq!(config.rules, RulesConfig::default());
        assert_eq!(config.monitor.history_capacity, DEFAULT_HISTORY_CAPACITY);
    }

    #[test]
    fn test_app_config_cli_override() {
        let file = FileConfig {
            rules: Some(RulesFileConfig {
                path: None,
                enforce_required: Some(false),
            }),
            monitor: Some(MonitorFileConfig {
                history_capacity: Some(200),
            }),
            ..Default::default()
        };
        let cli = CliConfig {
            enforce_required: Some(true),
            history_capacity: Some(300),
            ..Default::default()
        };
        let config = AppConfig::from_layers(file, &cli).unwrap();
        assert_eq!(config.rules.enforce_required, Some(true));
        assert_eq!(config.monitor.history_capacity, 300);
    }

    #[test]
    fn test_app_config_validation_zero_capacity() {
        let cli = CliConfig {
            history_capacity: Some(0),
            ..Default::default()
        };
        let err = AppConfig::from_layers(FileConfig::default(), &cli).unwrap_err();
        assert!(err.to_string().contains("history_capacity"));
    }

    #[test]
    fn test_app_config_validation_missing_rules_file() {
        let cli = CliConfig {
            rules: Some(PathBuf::from("/nonexistent/rules.json")),
            ..Default::default()
        };
        let err = AppConfig::from_layers(FileConfig::default(), &cli).unwrap_err();
        assert!(err.to_string().contains("rules.path"));
    }

    #[test]
    fn test_app_config_rules_path_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let rules_path = dir.path().join("rules.json");
        std::fs::write(&rules_path, "{}").unwrap();

        let config_path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(
            &config_path,
            format!(
                r#"{{ "rules": {{ "path": {} }} }}"#,
                serde_json::to_string(&rules_path.display().to_string()).unwrap()
            ),
        )
        .unwrap();

        let file = FileConfig::load_from_file(&config_path).unwrap();
        let config = AppConfig::from_layers(file, &CliConfig::default()).unwrap();
        assert_eq!(config.rules.path, Some(rules_path));
    }

    #[test]
    fn test_load_with_explicit_missing_config() {
        let cli = CliConfig {
            config: Some(PathBuf::from("/nonexistent/advisor-search.json")),
            ..Default::default()
        };
        let err = AppConfig::load(&cli).unwrap_err();
        assert!(err.to_string().contains("Config file not found"));
    }
}
