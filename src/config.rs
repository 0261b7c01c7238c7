//! Configuration loading for query derivation and result shaping.
//!
//! Settings live in a TOML file. An explicit path wins; otherwise the
//! platform config directory is consulted (`<config_dir>/quarry/quarry.toml`).
//! A missing file yields the defaults.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default prefix for synthetic bind parameters produced by the
/// expression rewriter.
pub const DEFAULT_SYNTHETIC_PREFIX: &str = "__$synthetic$__";

/// Options that control result post-processing.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ResultOptions {
    /// Turns the lenient container fallthrough into an error.
    pub strict_shapes: bool,
}

/// Options that control embedded-expression rewriting.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExpressionOptions {
    /// Prefix of synthetic parameter names (`<prefix><counter>`).
    pub synthetic_prefix: String,
}

impl Default for ExpressionOptions {
    fn default() -> Self {
        Self {
            synthetic_prefix: DEFAULT_SYNTHETIC_PREFIX.to_string(),
        }
    }
}

/// Loaded configuration.
#[derive(Debug, Default)]
pub struct QuarryConfig {
    path: Option<PathBuf>,
    results: ResultOptions,
    expressions: ExpressionOptions,
}

impl QuarryConfig {
    /// Loads configuration from `explicit` or the default location.
    pub fn load(explicit: Option<PathBuf>) -> Result<Self, ConfigError> {
        let path = explicit.or_else(default_config_path);
        let data = match path.as_ref() {
            Some(config_path) if config_path.exists() => read_file(config_path)?,
            _ => RawConfig::default(),
        };
        let mut config = Self::from_raw(data)?;
        config.path = path;
        Ok(config)
    }

    /// Parses configuration from TOML text.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let data: RawConfig =
            toml::from_str(contents).map_err(|source| ConfigError::Parse {
                path: None,
                source,
            })?;
        Self::from_raw(data)
    }

    fn from_raw(data: RawConfig) -> Result<Self, ConfigError> {
        let mut expressions = ExpressionOptions::default();
        if let Some(prefix) = data.expressions.synthetic_prefix {
            if prefix.trim().is_empty() {
                return Err(ConfigError::InvalidValue {
                    key: "expressions.synthetic_prefix",
                    value: prefix,
                });
            }
            expressions.synthetic_prefix = prefix;
        }
        let results = ResultOptions {
            strict_shapes: data.results.strict_shapes.unwrap_or(false),
        };
        Ok(Self {
            path: None,
            results,
            expressions,
        })
    }

    /// Path the configuration was looked up at, if any.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Result processing options.
    pub fn results(&self) -> &ResultOptions {
        &self.results
    }

    /// Expression rewriting options.
    pub fn expressions(&self) -> &ExpressionOptions {
        &self.expressions
    }
}

fn read_file(path: &Path) -> Result<RawConfig, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: Some(path.to_path_buf()),
        source,
    })
}

#[derive(Debug, Default, Deserialize, Serialize)]
struct RawConfig {
    #[serde(default)]
    results: ResultsSection,
    #[serde(default)]
    expressions: ExpressionsSection,
}

#[derive(Debug, Default, Deserialize, Serialize)]
struct ResultsSection {
    strict_shapes: Option<bool>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
struct ExpressionsSection {
    synthetic_prefix: Option<String>,
}

/// Configuration loading failures.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// File could not be read.
    #[error("failed to read config {path}: {source}")]
    Read {
        /// Config path.
        path: PathBuf,
        /// I/O failure.
        source: std::io::Error,
    },
    /// File is not valid TOML for this schema.
    #[error("failed to parse config: {source}")]
    Parse {
        /// Config path, when read from disk.
        path: Option<PathBuf>,
        /// Parser failure.
        source: toml::de::Error,
    },
    /// A setting holds an unusable value.
    #[error("config value '{value}' for {key} is invalid")]
    InvalidValue {
        /// Setting key.
        key: &'static str,
        /// Offending value.
        value: String,
    },
}

/// Default configuration path under the platform config directory.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|base| base.join("quarry").join("quarry.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = QuarryConfig::load(Some(dir.path().join("absent.toml"))).unwrap();
        assert_eq!(config.results(), &ResultOptions::default());
        assert_eq!(config.expressions().synthetic_prefix, DEFAULT_SYNTHETIC_PREFIX);
        assert!(config.path().is_some());
    }

    #[test]
    fn file_overrides_sections() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[results]\nstrict_shapes = true\n\n[expressions]\nsynthetic_prefix = \"__p\"\n"
        )
        .unwrap();
        let config = QuarryConfig::load(Some(file.path().to_path_buf())).unwrap();
        assert!(config.results().strict_shapes);
        assert_eq!(config.expressions().synthetic_prefix, "__p");
    }

    #[test]
    fn blank_prefix_is_rejected() {
        let err = QuarryConfig::from_toml_str("[expressions]\nsynthetic_prefix = \" \"\n")
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }

    #[test]
    fn malformed_toml_reports_parse_error() {
        let err = QuarryConfig::from_toml_str("[results\nstrict_shapes = 1").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { path: None, .. }));
    }
}
