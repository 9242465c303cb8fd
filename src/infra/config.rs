//! Configuration loading from TOML files
//!
//! Config file is selected via:
//! 1. --config <path> command line argument
//! 2. CONFIG_FILE environment variable
//! 3. Default: config/dev.toml

use crate::io::LoaderOptions;
use crate::services::demographics::DEFAULT_UNKNOWN_LABEL;
use crate::services::AnalysisOptions;
use anyhow::{bail, Context};
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::Path;
use tracing::warn;

pub const DEFAULT_CONFIG_PATH: &str = "config/dev.toml";

#[derive(Debug, Clone, Deserialize)]
pub struct InputConfig {
    /// CSV field delimiter (single ASCII character)
    #[serde(default = "default_delimiter")]
    pub delimiter: String,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self { delimiter: default_delimiter() }
    }
}

fn default_delimiter() -> String {
    ",".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct DemographicsConfig {
    /// Reserved label for unclassified gender/age values
    #[serde(default = "default_unknown_label")]
    pub unknown_label: String,
}

impl Default for DemographicsConfig {
    fn default() -> Self {
        Self { unknown_label: default_unknown_label() }
    }
}

fn default_unknown_label() -> String {
    DEFAULT_UNKNOWN_LABEL.to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    /// Run aggregators concurrently
    #[serde(default = "default_parallel")]
    pub parallel: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self { parallel: default_parallel() }
    }
}

fn default_parallel() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct OutputConfig {
    /// Pretty-print JSON output
    #[serde(default)]
    pub pretty: bool,
    /// Also emit the chart bundle
    #[serde(default)]
    pub charts: bool,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct TomlConfig {
    #[serde(default)]
    pub input: InputConfig,
    #[serde(default)]
    pub demographics: DemographicsConfig,
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Main configuration struct used throughout the application
#[derive(Debug, Clone)]
pub struct Config {
    delimiter: u8,
    unknown_label: String,
    parallel: bool,
    pretty: bool,
    charts: bool,
    config_file: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            delimiter: b',',
            unknown_label: DEFAULT_UNKNOWN_LABEL.to_string(),
            parallel: true,
            pretty: false,
            charts: false,
            config_file: "default".to_string(),
        }
    }
}

fn parse_delimiter(value: &str) -> anyhow::Result<u8> {
    match value.as_bytes() {
        [byte] if byte.is_ascii() => Ok(*byte),
        _ => bail!("delimiter must be a single ASCII character, got {:?}", value),
    }
}

impl Config {
    /// Determine config file path: explicit CLI value, then `CONFIG_FILE`, then the default
    pub fn resolve_config_path(cli_path: Option<&str>) -> String {
        if let Some(path) = cli_path {
            return path.to_string();
        }

        if let Ok(path) = env::var("CONFIG_FILE") {
            return path;
        }

        DEFAULT_CONFIG_PATH.to_string()
    }

    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        let toml_config: TomlConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;

        let delimiter = parse_delimiter(&toml_config.input.delimiter)
            .with_context(|| format!("Invalid [input] section in {}", path.display()))?;

        Ok(Self {
            delimiter,
            unknown_label: toml_config.demographics.unknown_label,
            parallel: toml_config.engine.parallel,
            pretty: toml_config.output.pretty,
            charts: toml_config.output.charts,
            config_file: path.display().to_string(),
        })
    }

    /// Load configuration - tries TOML file first, falls back to defaults
    pub fn load_from_path(path: &str) -> Self {
        match Self::from_file(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(error = %format!("{e:#}"), "config_load_failed_using_defaults");
                Self::default()
            }
        }
    }

    /// Load configuration using the resolved path from CLI/environment
    pub fn load(cli_path: Option<&str>) -> Self {
        Self::load_from_path(&Self::resolve_config_path(cli_path))
    }

    /// Engine options derived from this config
    pub fn analysis_options(&self) -> AnalysisOptions {
        AnalysisOptions { unknown_label: self.unknown_label.clone(), parallel: self.parallel }
    }

    /// Loader options derived from this config
    pub fn loader_options(&self) -> LoaderOptions {
        LoaderOptions { delimiter: self.delimiter }
    }

    pub fn delimiter(&self) -> u8 {
        self.delimiter
    }

    pub fn unknown_label(&self) -> &str {
        &self.unknown_label
    }

    pub fn parallel(&self) -> bool {
        self.parallel
    }

    pub fn pretty(&self) -> bool {
        self.pretty
    }

    pub fn charts(&self) -> bool {
        self.charts
    }

    pub fn config_file(&self) -> &str {
        &self.config_file
    }

    /// Builder method for CLI overrides
    pub fn with_charts(mut self, charts: bool) -> Self {
        self.charts = charts;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.delimiter(), b',');
        assert_eq!(config.unknown_label(), "unknown");
        assert!(config.parallel());
        assert!(!config.pretty());
        assert!(!config.charts());
        assert_eq!(config.config_file(), "default");
    }

    #[test]
    fn test_analysis_options() {
        let options = Config::default().analysis_options();
        assert_eq!(options, AnalysisOptions::default());
    }

    #[test]
    fn test_parse_delimiter() {
        assert_eq!(parse_delimiter(";").unwrap(), b';');
        assert_eq!(parse_delimiter("\t").unwrap(), b'\t');
        assert!(parse_delimiter("").is_err());
        assert!(parse_delimiter(",,").is_err());
        assert!(parse_delimiter("é").is_err());
    }

    #[test]
    fn test_resolve_config_path_default() {
        if env::var("CONFIG_FILE").is_err() {
            assert_eq!(Config::resolve_config_path(None), DEFAULT_CONFIG_PATH);
        }
    }

    #[test]
    fn test_resolve_config_path_cli_wins() {
        assert_eq!(Config::resolve_config_path(Some("config/store.toml")), "config/store.toml");
    }

    #[test]
    fn test_with_charts() {
        assert!(Config::default().with_charts(true).charts());
    }
}
