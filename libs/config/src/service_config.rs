//! Service Configuration Module
//!
//! Provides layered configuration loading for SuperTrend services.
//! A TOML base file is overlaid by an optional environment file and then by
//! prefixed environment variables.

use anyhow::{Context, Result};
use config_crate::{Config, Environment, File};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::service::sources;

/// Global configuration settings
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct GlobalConfig {
    pub log_level: String,
    pub log_format: LogFormat,
}

/// Output format of the log subscriber
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Market data source settings
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct SourceSettings {
    /// Symbol the engine is bound to at startup
    pub symbol: String,

    /// Directory the terminal bridge writes its JSON files into
    pub files_path: Option<PathBuf>,

    /// Name of the OHLC file inside `files_path`
    pub ohlc_file: String,

    /// Polling interval in milliseconds
    pub poll_interval_ms: u64,

    /// Fall back to generated demo candles when no bridge is reachable
    pub enable_synthetic: bool,

    /// Fixed seed for the demo generator (random when absent)
    pub synthetic_seed: Option<u64>,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
        }
    }
}

impl Default for SourceSettings {
    fn default() -> Self {
        Self {
            symbol: sources::DEFAULT_SYMBOL.to_string(),
            files_path: None,
            ohlc_file: sources::DEFAULT_OHLC_FILE.to_string(),
            poll_interval_ms: sources::DEFAULT_POLL_INTERVAL_MS,
            enable_synthetic: true,
            synthetic_seed: None,
        }
    }
}

impl SourceSettings {
    /// Expand `~` and `$VARS` in the bridge directory
    pub fn expand_env_vars(&mut self) -> Result<()> {
        if let Some(path) = &self.files_path {
            let raw = path.to_string_lossy();
            let expanded = shellexpand::full(&raw).context("Failed to expand files path")?;
            self.files_path = Some(PathBuf::from(expanded.as_ref()));
        }
        Ok(())
    }

    /// Full path of the OHLC bridge file, if a bridge directory is configured
    pub fn ohlc_path(&self) -> Option<PathBuf> {
        self.files_path.as_ref().map(|dir| dir.join(&self.ohlc_file))
    }
}

/// Load a configuration of type `T` from `base`, then overlay
/// `config/environments/<environment>.toml` (when present) and finally
/// environment variables named `<PREFIX>__SECTION__KEY`.
pub fn load_layered<T: DeserializeOwned>(
    base: impl AsRef<Path>,
    environment: Option<&str>,
    env_prefix: &str,
) -> Result<T> {
    let base = base.as_ref();
    debug!("Loading base config: {:?}", base);

    let mut builder = Config::builder().add_source(File::from(base).required(true));

    // Add environment-specific overrides if specified
    if let Some(env) = environment {
        let env_file = PathBuf::from("config/environments").join(format!("{}.toml", env));

        if env_file.exists() {
            info!("Loading environment config: {:?}", env_file);
            builder = builder.add_source(File::from(env_file));
        } else {
            warn!("Environment config not found: {:?}", env_file);
        }
    }

    builder = builder.add_source(
        Environment::with_prefix(env_prefix)
            .prefix_separator("__")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder.build().context("Failed to build configuration")?;

    config
        .try_deserialize()
        .context("Failed to deserialize configuration")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[derive(Debug, Deserialize)]
    struct TestConfig {
        #[serde(default)]
        global: GlobalConfig,
        #[serde(default)]
        source: SourceSettings,
    }

    #[test]
    fn test_load_base_config() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("supertrend.toml");

        let config_content = r#"
[global]
log_level = "debug"
log_format = "json"

[source]
symbol = "GBPUSD"
poll_interval_ms = 250
enable_synthetic = false
"#;

        fs::write(&config_path, config_content).unwrap();

        let config: TestConfig =
            load_layered(&config_path, None, "SUPERTREND_TEST_BASE").unwrap();

        assert_eq!(config.global.log_level, "debug");
        assert_eq!(config.global.log_format, LogFormat::Json);
        assert_eq!(config.source.symbol, "GBPUSD");
        assert_eq!(config.source.poll_interval_ms, 250);
        assert!(!config.source.enable_synthetic);
        // Unspecified keys keep their defaults
        assert_eq!(config.source.ohlc_file, sources::DEFAULT_OHLC_FILE);
    }

    #[test]
    fn test_missing_base_file_is_an_error() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("absent.toml");

        let result: Result<TestConfig> = load_layered(&missing, None, "SUPERTREND_TEST_MISSING");
        assert!(result.is_err());
    }

    #[test]
    fn test_ohlc_path_joins_bridge_directory() {
        let settings = SourceSettings {
            files_path: Some(PathBuf::from("/data/bridge")),
            ..SourceSettings::default()
        };
        assert_eq!(
            settings.ohlc_path(),
            Some(PathBuf::from("/data/bridge/ohlc_data.json"))
        );
        assert_eq!(SourceSettings::default().ohlc_path(), None);
    }

    #[test]
    fn test_expand_env_vars_in_files_path() {
        std::env::set_var("SUPERTREND_TEST_BRIDGE_DIR", "/srv/mt5");
        let mut settings = SourceSettings {
            files_path: Some(PathBuf::from("$SUPERTREND_TEST_BRIDGE_DIR/Files")),
            ..SourceSettings::default()
        };

        settings.expand_env_vars().unwrap();

        assert_eq!(settings.files_path, Some(PathBuf::from("/srv/mt5/Files")));
    }
}
