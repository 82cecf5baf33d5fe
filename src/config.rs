//! Run and render configuration.
//!
//! Both sections have sensible defaults, so an empty configuration file (or
//! none at all) is valid. Hosts may load them from YAML:
//!
//! ```yaml
//! run:
//!   filter: "database"
//!   catch_panics: true
//! render:
//!   format: json
//!   use_colors: false
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use termcolor::ColorChoice;

use crate::errors::ConfigError;

/// Settings that change what the scheduler runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunConfig {
    /// Case-insensitive substring matched against full case titles.
    pub filter: Option<String>,
    /// Report a panicking unit as an error instead of unwinding through the run.
    pub catch_panics: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            filter: None,
            catch_panics: true,
        }
    }
}

impl RunConfig {
    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Settings for turning a report into output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RenderConfig {
    pub format: OutputFormat,
    pub use_colors: bool,
    /// List every hook invocation under its case, not only the failing ones.
    pub show_hooks: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::Text,
            use_colors: atty::is(atty::Stream::Stdout),
            show_hooks: false,
        }
    }
}

impl RenderConfig {
    pub fn color_choice(&self) -> ColorChoice {
        if self.use_colors {
            ColorChoice::Auto
        } else {
            ColorChoice::Never
        }
    }
}

/// Complete host configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ArborConfig {
    pub run: RunConfig,
    pub render: RenderConfig,
}

impl ArborConfig {
    pub fn from_yaml_str(source: &str, origin: &str) -> Result<Self, ConfigError> {
        if source.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(source).map_err(|source| ConfigError::Parse {
            path: origin.to_string(),
            source,
        })
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let origin = path.display().to_string();
        let source = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: origin.clone(),
            source,
        })?;
        Self::from_yaml_str(&source, &origin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_source_yields_defaults() {
        let config = ArborConfig::from_yaml_str("  \n", "inline").unwrap();
        assert_eq!(config.run, RunConfig::default());
        assert!(config.run.catch_panics);
    }

    #[test]
    fn sections_are_optional() {
        let config = ArborConfig::from_yaml_str(
            "run:\n  filter: cache\nrender:\n  format: json\n  use_colors: false\n",
            "inline",
        )
        .unwrap();
        assert_eq!(config.run.filter.as_deref(), Some("cache"));
        assert!(config.run.catch_panics);
        assert_eq!(config.render.format, OutputFormat::Json);
        assert_eq!(config.render.color_choice(), ColorChoice::Never);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = ArborConfig::from_yaml_str("run:\n  retries: 3\n", "arbor.yaml").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { ref path, .. } if path == "arbor.yaml"));
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let err = ArborConfig::load(Path::new("does/not/exist.yaml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
