//! CLI configuration
//!
//! Sources, lowest precedence first: built-in defaults, `tessera.toml` (or the
//! file given with `--config`), then `TESSERA__`-prefixed environment
//! variables such as `TESSERA__CODEGEN__SCHEMA_DIR=schemas`.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use tessera_codegen::CodegenConfig;

pub const DEFAULT_CONFIG_FILE: &str = "tessera.toml";
const ENV_PREFIX: &str = "TESSERA";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub codegen: CodegenConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Level for tessera's own targets, overridden by `RUST_LOG`
    pub level: String,
    /// JSON lines instead of human-readable output
    pub json: bool,
    /// Also write the log to a file
    pub file_enabled: bool,
    pub file_directory: PathBuf,
    pub file_name: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            file_enabled: true,
            file_directory: PathBuf::from("."),
            file_name: "tessera.log".to_string(),
        }
    }
}

impl Config {
    /// Load configuration. An explicit `path` must exist; the default file is optional.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let (file, required) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => (PathBuf::from(DEFAULT_CONFIG_FILE), false),
        };

        let settings = config::Config::builder()
            .add_source(config::File::from(file.as_path()).required(required))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .with_context(|| format!("reading configuration from {}", file.display()))?;

        let mut config: Config = settings
            .try_deserialize()
            .context("deserializing configuration")?;

        if config.codegen.source_date_epoch.is_none() {
            config.codegen.source_date_epoch = source_date_epoch_from_env()?;
        }

        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.codegen.validate()?;
        if self.logging.file_enabled && self.logging.file_name.trim().is_empty() {
            anyhow::bail!("logging.file_name must not be empty when file logging is enabled");
        }
        Ok(())
    }
}

fn source_date_epoch_from_env() -> Result<Option<i64>> {
    match std::env::var("SOURCE_DATE_EPOCH") {
        Ok(value) => value
            .trim()
            .parse()
            .map(Some)
            .with_context(|| format!("SOURCE_DATE_EPOCH `{}` is not a number of seconds", value)),
        Err(_) => Ok(None),
    }
}
