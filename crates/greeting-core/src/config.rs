//! Configuration loading and typed config structures for the greeting widget.
//!
//! Configuration lives in `greeting-config.yaml` next to the binary. Every
//! field has a default, so an empty or missing file yields the stock widget:
//! slot `greeting`, hourly refresh, 300 ms fade, observer on port 8080.
//!
//! Environment variables override a few deployment-facing values:
//! - `GREETING_SLOT_ID` overrides `widget.slot_id`
//! - `GREETING_OBSERVER_PORT` overrides `observer.port`
//! - `GREETING_LOG_LEVEL` overrides `logging.level`

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::selector::GreetingTable;
use crate::updater::TransitionSettings;

/// Default config file name, resolved against the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "greeting-config.yaml";

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// The configuration parsed but holds unusable values.
    #[error("invalid configuration: {reason}")]
    Invalid {
        /// Explanation of what is wrong.
        reason: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level widget configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct WidgetConfig {
    /// Display slot and transition timing.
    #[serde(default)]
    pub widget: SlotConfig,

    /// Greeting texts per bucket.
    #[serde(default)]
    pub greetings: GreetingTable,

    /// Observer HTTP server settings.
    #[serde(default)]
    pub observer: ObserverConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl WidgetConfig {
    /// Load configuration from a YAML file, apply environment overrides,
    /// and validate.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let mut config: Self = serde_yml::from_str(&contents)?;
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Load `path` if it exists, otherwise start from defaults. Environment
    /// overrides and validation apply either way.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        Self::load_with(path, |key| std::env::var(key).ok())
    }

    /// Like [`load_or_default`](Self::load_or_default), with overrides read
    /// from `lookup` instead of the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read or parsed, an
    /// override is malformed, or validation fails.
    pub fn load_with<F>(path: &Path, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config: Self = if path.exists() {
            serde_yml::from_str(&std::fs::read_to_string(path)?)?
        } else {
            Self::default()
        };
        config.apply_overrides_from(lookup)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from a YAML string and validate it. Environment
    /// overrides are not applied.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from the process environment.
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary key lookup.
    pub fn apply_overrides_from<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(val) = lookup("GREETING_SLOT_ID") {
            self.widget.slot_id = val;
        }
        if let Some(val) = lookup("GREETING_OBSERVER_PORT") {
            self.observer.port = val.trim().parse().map_err(|e| ConfigError::Invalid {
                reason: format!("GREETING_OBSERVER_PORT `{val}` is not a port: {e}"),
            })?;
        }
        if let Some(val) = lookup("GREETING_LOG_LEVEL") {
            self.logging.level = val;
        }
        Ok(())
    }

    /// Reject values the widget cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.widget.slot_id.trim().is_empty() {
            return Err(ConfigError::Invalid {
                reason: "widget.slot_id must not be empty".to_owned(),
            });
        }
        if self.widget.refresh_interval_ms == 0 {
            return Err(ConfigError::Invalid {
                reason: "widget.refresh_interval_ms must be at least 1".to_owned(),
            });
        }
        Ok(())
    }
}

/// Display slot and transition timing.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SlotConfig {
    /// Id of the slot the greeting is written into.
    #[serde(default = "default_slot_id")]
    pub slot_id: String,

    /// Milliseconds between refreshes.
    #[serde(default = "default_refresh_interval_ms")]
    pub refresh_interval_ms: u64,

    /// Milliseconds between hiding the slot and revealing the new text.
    #[serde(default = "default_transition_delay_ms")]
    pub transition_delay_ms: u64,

    /// Downward offset, in pixels, applied while hidden.
    #[serde(default = "default_hidden_offset_px")]
    pub hidden_offset_px: i32,
}

impl SlotConfig {
    /// Refresh period as a [`Duration`].
    pub const fn refresh_interval(&self) -> Duration {
        Duration::from_millis(self.refresh_interval_ms)
    }

    /// Transition timing for the updater.
    pub const fn transition(&self) -> TransitionSettings {
        TransitionSettings {
            delay: Duration::from_millis(self.transition_delay_ms),
            hidden_offset_px: self.hidden_offset_px,
        }
    }
}

impl Default for SlotConfig {
    fn default() -> Self {
        Self {
            slot_id: default_slot_id(),
            refresh_interval_ms: default_refresh_interval_ms(),
            transition_delay_ms: default_transition_delay_ms(),
            hidden_offset_px: default_hidden_offset_px(),
        }
    }
}

/// Observer HTTP server settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ObserverConfig {
    /// Whether to serve the greeting page at all.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Bind address.
    #[serde(default = "default_observer_host")]
    pub host: String,

    /// Bind port.
    #[serde(default = "default_observer_port")]
    pub port: u16,
}

impl Default for ObserverConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            host: default_observer_host(),
            port: default_observer_port(),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Pretty,
    /// One JSON object per line.
    Json,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format.
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

fn default_slot_id() -> String {
    "greeting".to_owned()
}

const fn default_refresh_interval_ms() -> u64 {
    3_600_000
}

const fn default_transition_delay_ms() -> u64 {
    300
}

const fn default_hidden_offset_px() -> i32 {
    10
}

const fn default_true() -> bool {
    true
}

fn default_observer_host() -> String {
    "0.0.0.0".to_owned()
}

const fn default_observer_port() -> u16 {
    8080
}

fn default_log_level() -> String {
    "info".to_owned()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::selector::{AFTERNOON_GREETING, MORNING_GREETING};

    #[test]
    fn default_config_matches_stock_widget() {
        let config = WidgetConfig::default();
        assert_eq!(config.widget.slot_id, "greeting");
        assert_eq!(config.widget.refresh_interval(), Duration::from_millis(3_600_000));
        assert_eq!(config.widget.transition().delay, Duration::from_millis(300));
        assert_eq!(config.widget.transition().hidden_offset_px, 10);
        assert_eq!(config.greetings.morning, MORNING_GREETING);
        assert!(config.observer.enabled);
        assert_eq!(config.observer.port, 8080);
        assert_eq!(config.logging.format, LogFormat::Pretty);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn parse_full_yaml() {
        let yaml = r#"
widget:
  slot_id: "banner"
  refresh_interval_ms: 60000
  transition_delay_ms: 150
  hidden_offset_px: 20

greetings:
  morning: "Morning, team!"

observer:
  enabled: false
  host: "127.0.0.1"
  port: 9090

logging:
  level: "debug"
  format: "json"
"#;
        let config = WidgetConfig::parse(yaml).unwrap();
        assert_eq!(config.widget.slot_id, "banner");
        assert_eq!(config.widget.refresh_interval_ms, 60_000);
        assert_eq!(config.widget.transition().delay, Duration::from_millis(150));
        assert_eq!(config.widget.hidden_offset_px, 20);
        assert_eq!(config.greetings.morning, "Morning, team!");
        assert_eq!(config.greetings.afternoon, AFTERNOON_GREETING);
        assert!(!config.observer.enabled);
        assert_eq!(config.observer.host, "127.0.0.1");
        assert_eq!(config.observer.port, 9090);
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.format, LogFormat::Json);
    }

    #[test]
    fn parse_minimal_yaml() {
        let config = WidgetConfig::parse("observer:\n  port: 3000\n").unwrap();
        assert_eq!(config.observer.port, 3000);
        assert_eq!(config.widget, SlotConfig::default());
    }

    #[test]
    fn parse_empty_yaml() {
        assert!(WidgetConfig::parse("").is_ok());
    }

    #[test]
    fn zero_refresh_interval_is_invalid() {
        let err = WidgetConfig::parse("widget:\n  refresh_interval_ms: 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));
    }

    #[test]
    fn empty_slot_id_is_invalid() {
        let err = WidgetConfig::parse("widget:\n  slot_id: \"  \"\n").unwrap_err();
        assert!(err.to_string().contains("slot_id"));
    }

    #[test]
    fn malformed_yaml_is_reported() {
        let err = WidgetConfig::parse("widget: [unterminated").unwrap_err();
        assert!(matches!(err, ConfigError::Yaml { .. }));
    }

    #[test]
    fn overrides_replace_values() {
        let env: BTreeMap<&str, &str> = [
            ("GREETING_SLOT_ID", "hero"),
            ("GREETING_OBSERVER_PORT", "8181"),
            ("GREETING_LOG_LEVEL", "warn"),
        ]
        .into_iter()
        .collect();

        let mut config = WidgetConfig::default();
        config
            .apply_overrides_from(|key| env.get(key).map(|v| (*v).to_owned()))
            .unwrap();
        assert_eq!(config.widget.slot_id, "hero");
        assert_eq!(config.observer.port, 8181);
        assert_eq!(config.logging.level, "warn");
    }

    #[test]
    fn bad_port_override_is_invalid() {
        let mut config = WidgetConfig::default();
        let err = config
            .apply_overrides_from(|key| (key == "GREETING_OBSERVER_PORT").then(|| "http".to_owned()))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));
        assert_eq!(config.observer.port, 8080);
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("does-not-exist.yaml");
        let config = WidgetConfig::load_with(&path, |_| None).unwrap();
        assert_eq!(config, WidgetConfig::default());
    }

    #[test]
    fn missing_file_still_takes_overrides() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("does-not-exist.yaml");
        let config =
            WidgetConfig::load_with(&path, |key| (key == "GREETING_OBSERVER_PORT").then(|| "9090".to_owned()))
                .unwrap();
        assert_eq!(config.observer.port, 9090);
    }
}
