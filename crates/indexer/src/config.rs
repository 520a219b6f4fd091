//! Configuration for the query node projector.
//!
//! Loaded from a TOML file. Values may reference environment variables with
//! `${VAR_NAME}`; missing sections fall back to defaults.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration for the projector.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Database configuration
    pub database: DatabaseConfig,

    /// Event source configuration
    #[serde(default)]
    pub source: SourceConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Database configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite database URL
    pub url: String,

    /// Maximum pool connections
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Minimum pool connections
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

/// Event source configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Newline-delimited JSON file of block events
    #[serde(default = "default_events_path")]
    pub events_path: PathBuf,

    /// First block to project; earlier blocks in the feed are skipped
    #[serde(default)]
    pub start_block: u64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            events_path: default_events_path(),
            start_block: 0,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g. `info`, `querynode_indexer=debug`)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format: `pretty` or `json`
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_max_connections() -> u32 {
    5
}

fn default_min_connections() -> u32 {
    1
}

fn default_events_path() -> PathBuf {
    PathBuf::from("blocks.ndjson")
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    ///
    /// # Example
    /// ```no_run
    /// # use querynode_indexer::config::Config;
    /// let config = Config::from_file("querynode.toml")?;
    /// # Ok::<(), anyhow::Error>(())
    /// ```
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let expanded = Self::expand_env_vars(&contents)?;

        let config: Config = toml::from_str(&expanded)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        config.validate()?;

        Ok(config)
    }

    /// Load configuration from a TOML string.
    pub fn from_toml_str(toml: &str) -> Result<Self> {
        let expanded = Self::expand_env_vars(toml)?;
        let config: Config =
            toml::from_str(&expanded).context("Failed to parse TOML configuration")?;

        config.validate()?;

        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.database.url.is_empty() {
            anyhow::bail!("Database URL cannot be empty");
        }
        if !self.database.url.starts_with("sqlite:") {
            anyhow::bail!(
                "Database URL must be a sqlite URL, got: {}",
                self.database.url
            );
        }

        if self.database.max_connections == 0 {
            anyhow::bail!("Database max_connections must be at least 1");
        }
        if self.database.min_connections > self.database.max_connections {
            anyhow::bail!(
                "Database min_connections ({}) cannot exceed max_connections ({})",
                self.database.min_connections,
                self.database.max_connections
            );
        }

        if self.source.events_path.as_os_str().is_empty() {
            anyhow::bail!("Source events_path cannot be empty");
        }

        match self.logging.format.as_str() {
            "pretty" | "json" => {}
            other => anyhow::bail!(
                "Invalid log format '{}': expected 'pretty' or 'json'",
                other
            ),
        }

        Ok(())
    }

    /// Expand `${VAR_NAME}` placeholders.
    ///
    /// Placeholders after a `#` that starts a comment are left alone.
    ///
    /// # Errors
    /// Returns an error for unclosed or empty placeholders and for variables
    /// that are not set.
    fn expand_env_vars(input: &str) -> Result<String> {
        let mut result = String::with_capacity(input.len());

        for (line_number, line) in input.split_inclusive('\n').enumerate() {
            let (code, comment) = split_comment(line);
            let mut rest = code;

            while let Some(start) = rest.find("${") {
                result.push_str(&rest[..start]);
                let after = &rest[start + 2..];
                let end = after.find('}').with_context(|| {
                    format!(
                        "Unclosed environment variable placeholder on line {}",
                        line_number + 1
                    )
                })?;

                let var_name = &after[..end];
                if var_name.is_empty() {
                    anyhow::bail!(
                        "Empty environment variable name on line {}",
                        line_number + 1
                    );
                }

                let value = std::env::var(var_name).with_context(|| {
                    format!(
                        "Environment variable '{}' is not set (referenced on line {})",
                        var_name,
                        line_number + 1
                    )
                })?;
                result.push_str(&value);
                rest = &after[end + 1..];
            }

            result.push_str(rest);
            result.push_str(comment);
        }

        Ok(result)
    }
}

/// Split a TOML line at the first `#` outside a string.
fn split_comment(line: &str) -> (&str, &str) {
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for (i, ch) in line.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match (quote, ch) {
            (Some('"'), '\\') => escaped = true,
            (Some(q), c) if c == q => quote = None,
            (None, '"') | (None, '\'') => quote = Some(ch),
            (None, '#') => return line.split_at(i),
            _ => {}
        }
    }

    (line, "")
}
