//! Configuration management for typeahead widgets
//!
//! Every widget instance owns an immutable, resolved [`Config`]. It is derived
//! by overlaying instance-level [`ConfigOverrides`] onto the process-wide
//! default record:
//!
//! 1. Instance overrides (attributes, builder calls)
//! 2. Process-wide defaults (built-in values, optionally replaced at startup
//!    from the settings file or through the `set_default_*` setters)
//!
//! The default record is read once per instance at construction; changing it
//! later never affects instances that already exist.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::{LazyLock, PoisonError, RwLock};
use std::time::Duration;

use crate::error::{ConfigError, Result};

/// Resolved configuration of one widget instance
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Config {
    /// Whether local matching of candidate texts is case-sensitive
    #[serde(default = "default_case_sensitive")]
    pub case_sensitive: bool,

    /// Expected maximum number of candidates a lookup returns.
    ///
    /// When fewer candidates are displayed than this, narrowing the query
    /// is served by filtering locally instead of asking the source again.
    #[serde(default = "default_item_max")]
    pub item_max: usize,

    /// Debounce in milliseconds for text changes not going to/from empty text
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// Class applied to the highlighted candidate
    #[serde(default = "default_active_class")]
    pub active_class: String,

    /// Class applied to the surrounding container
    #[serde(default = "default_container_class")]
    pub container_class: String,

    /// Class applied to the input element
    #[serde(default = "default_input_class")]
    pub input_class: String,

    /// Class applied to the dropdown list
    #[serde(default = "default_list_class")]
    pub list_class: String,
}

/// Instance-level overrides, overlaid onto the process-wide defaults
///
/// Integer fields are signed so that negative values coming from attributes
/// or settings files can be reported instead of wrapping around.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ConfigOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub case_sensitive: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item_max: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debounce_ms: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active_class: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub container_class: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_class: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub list_class: Option<String>,
}

/// Settings file layout (TOML)
///
/// ```toml
/// [defaults]
/// case_sensitive = false
/// item_max = 20
///
/// [logging]
/// level = "debug"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    /// Overrides applied to the process-wide defaults at startup
    #[serde(default)]
    pub defaults: ConfigOverrides,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub level: LogLevel,

    /// Enable timestamps in logs
    #[serde(default = "default_log_timestamps")]
    pub timestamps: bool,
}

/// Log level options
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

// Default value functions
fn default_case_sensitive() -> bool {
    true
}

fn default_item_max() -> usize {
    10
}

fn default_debounce_ms() -> u64 {
    100
}

fn default_active_class() -> String {
    "typeahead__item--active".to_string()
}

fn default_container_class() -> String {
    "typeahead".to_string()
}

fn default_input_class() -> String {
    "typeahead__input".to_string()
}

fn default_list_class() -> String {
    "typeahead__dropdown".to_string()
}

fn default_log_level() -> LogLevel {
    LogLevel::Warn
}

fn default_log_timestamps() -> bool {
    false
}

impl Default for Config {
    fn default() -> Self {
        Self {
            case_sensitive: default_case_sensitive(),
            item_max: default_item_max(),
            debounce_ms: default_debounce_ms(),
            active_class: default_active_class(),
            container_class: default_container_class(),
            input_class: default_input_class(),
            list_class: default_list_class(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            timestamps: default_log_timestamps(),
        }
    }
}

impl Config {
    /// Validate the configuration
    ///
    /// # Returns
    /// * `Result<()>` - Ok if valid, error otherwise
    pub fn validate(&self) -> Result<()> {
        if self.item_max == 0 {
            return Err(
                ConfigError::invalid("item_max", self.item_max, "must be greater than zero").into(),
            );
        }
        Ok(())
    }

    /// Get the debounce delay as Duration
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

impl ConfigOverrides {
    /// Resolve the overrides onto the current process-wide defaults
    ///
    /// # Returns
    /// * `Result<Config>` - Resolved configuration or the first invalid value
    pub fn resolve(&self) -> Result<Config> {
        self.resolve_onto(&defaults())
    }

    /// Resolve the overrides onto an explicit base record
    ///
    /// Invalid values are rejected, never clamped.
    ///
    /// # Arguments
    /// * `base` - Record supplying every value not overridden
    ///
    /// # Returns
    /// * `Result<Config>` - Resolved configuration or error
    pub fn resolve_onto(&self, base: &Config) -> Result<Config> {
        let mut config = base.clone();

        if let Some(case_sensitive) = self.case_sensitive {
            config.case_sensitive = case_sensitive;
        }
        if let Some(item_max) = self.item_max {
            if item_max <= 0 {
                return Err(
                    ConfigError::invalid("item_max", item_max, "must be greater than zero").into(),
                );
            }
            config.item_max = usize::try_from(item_max)
                .map_err(|_| ConfigError::invalid("item_max", item_max, "out of range"))?;
        }
        if let Some(debounce_ms) = self.debounce_ms {
            config.debounce_ms = u64::try_from(debounce_ms)
                .map_err(|_| ConfigError::invalid("debounce_ms", debounce_ms, "must not be negative"))?;
        }
        if let Some(class) = &self.active_class {
            config.active_class = class.clone();
        }
        if let Some(class) = &self.container_class {
            config.container_class = class.clone();
        }
        if let Some(class) = &self.input_class {
            config.input_class = class.clone();
        }
        if let Some(class) = &self.list_class {
            config.list_class = class.clone();
        }

        config.validate()?;
        Ok(config)
    }

    /// Parse overrides from widget attributes
    ///
    /// Recognized keys: `case-sensitive`, `item-max`, `debounce`,
    /// `active-class`, `element-class`, `input-class`, `dropdown-class`.
    /// Unknown keys belong to the host and are ignored. Boolean attributes are
    /// lenient: anything other than `true`/`false` keeps the default.
    ///
    /// # Arguments
    /// * `attrs` - Attribute name/value pairs
    ///
    /// # Returns
    /// * `Result<Self>` - Parsed overrides, or an error for a malformed integer
    pub fn from_attributes<I, K, V>(attrs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut overrides = Self::default();

        for (key, value) in attrs {
            let value = value.as_ref();
            match key.as_ref() {
                "case-sensitive" => overrides.case_sensitive = parse_bool_attr(value),
                "item-max" => overrides.item_max = Some(parse_int_attr("item_max", value)?),
                "debounce" => overrides.debounce_ms = Some(parse_int_attr("debounce_ms", value)?),
                "active-class" => overrides.active_class = Some(value.to_string()),
                "element-class" => overrides.container_class = Some(value.to_string()),
                "input-class" => overrides.input_class = Some(value.to_string()),
                "dropdown-class" => overrides.list_class = Some(value.to_string()),
                _ => {}
            }
        }

        Ok(overrides)
    }
}

fn parse_bool_attr(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
    }
}

fn parse_int_attr(field: &str, value: &str) -> Result<i64> {
    value
        .trim()
        .parse::<i64>()
        .map_err(|_| ConfigError::invalid(field, value, "not an integer").into())
}

/* ========================= Process-wide defaults ========================= */

static DEFAULTS: LazyLock<RwLock<Config>> = LazyLock::new(|| RwLock::new(Config::default()));

/// Snapshot of the process-wide default record
pub fn defaults() -> Config {
    DEFAULTS
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .clone()
}

/// Replace the process-wide default record
///
/// # Arguments
/// * `config` - New defaults, validated before they are stored
pub fn set_defaults(config: Config) -> Result<()> {
    config.validate()?;
    *DEFAULTS.write().unwrap_or_else(PoisonError::into_inner) = config;
    Ok(())
}

/// Edit the process-wide default record in place
///
/// The edit is applied to a copy and only stored if the result validates.
pub fn update_defaults(edit: impl FnOnce(&mut Config)) -> Result<()> {
    let mut guard = DEFAULTS.write().unwrap_or_else(PoisonError::into_inner);
    let mut next = guard.clone();
    edit(&mut next);
    next.validate()?;
    *guard = next;
    Ok(())
}

/// Restore the built-in defaults
pub fn reset_defaults() {
    *DEFAULTS.write().unwrap_or_else(PoisonError::into_inner) = Config::default();
}

/// Set the default case-sensitivity for local matching
pub fn set_default_case_sensitive(value: bool) -> Result<()> {
    update_defaults(|c| c.case_sensitive = value)
}

/// Set the default expected maximum number of candidates per lookup
pub fn set_default_item_max(value: usize) -> Result<()> {
    update_defaults(|c| c.item_max = value)
}

/// Set the default debounce timeout in milliseconds
pub fn set_default_debounce_ms(value: u64) -> Result<()> {
    update_defaults(|c| c.debounce_ms = value)
}

/// Set the default class of the highlighted candidate
pub fn set_default_active_class(class: impl Into<String>) -> Result<()> {
    let class = class.into();
    update_defaults(|c| c.active_class = class)
}

/// Set the default class of the surrounding container
pub fn set_default_container_class(class: impl Into<String>) -> Result<()> {
    let class = class.into();
    update_defaults(|c| c.container_class = class)
}

/// Set the default class of the input element
pub fn set_default_input_class(class: impl Into<String>) -> Result<()> {
    let class = class.into();
    update_defaults(|c| c.input_class = class)
}

/// Set the default class of the dropdown list
pub fn set_default_list_class(class: impl Into<String>) -> Result<()> {
    let class = class.into();
    update_defaults(|c| c.list_class = class)
}

/* ========================= Settings file ========================= */

impl Settings {
    /// Get the default settings file path
    ///
    /// # Returns
    /// * `PathBuf` - `~/.typeahead/config.toml`
    pub fn default_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".typeahead")
            .join("config.toml")
    }

    /// Load settings from a file
    ///
    /// An explicitly given path must exist. When no path is given the default
    /// location is tried and a missing file yields default settings.
    ///
    /// # Arguments
    /// * `path` - Optional path to the settings file (TOML format)
    ///
    /// # Returns
    /// * `Result<Settings>` - Loaded settings or error
    pub fn load_from_file(path: Option<&Path>) -> Result<Self> {
        let (path, explicit) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => (Self::default_path(), false),
        };

        if !path.exists() {
            if explicit {
                return Err(ConfigError::FileNotFound(path.display().to_string()).into());
            }
            return Ok(Self::default());
        }

        let text = std::fs::read_to_string(&path)?;
        Self::from_toml(&text)
    }

    /// Parse settings from TOML text
    pub fn from_toml(text: &str) -> Result<Self> {
        let settings: Settings = toml::from_str(text)?;
        Ok(settings)
    }

    /// Resolve the `[defaults]` section onto the built-in defaults and install
    /// the result as the process-wide default record
    ///
    /// # Returns
    /// * `Result<Config>` - The installed defaults
    pub fn install_defaults(&self) -> Result<Config> {
        let config = self.defaults.resolve_onto(&Config::default())?;
        set_defaults(config.clone())?;
        Ok(config)
    }
}

impl LogLevel {
    /// Convert to tracing::Level
    pub fn to_tracing_level(&self) -> tracing::Level {
        match self {
            LogLevel::Error => tracing::Level::ERROR,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Trace => tracing::Level::TRACE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TypeaheadError;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.case_sensitive);
        assert_eq!(config.item_max, 10);
        assert_eq!(config.debounce(), Duration::from_millis(100));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_overrides_resolve_onto_base() {
        let overrides = ConfigOverrides {
            case_sensitive: Some(false),
            item_max: Some(25),
            list_class: Some("menu".to_string()),
            ..Default::default()
        };
        let config = overrides.resolve_onto(&Config::default()).unwrap();
        assert!(!config.case_sensitive);
        assert_eq!(config.item_max, 25);
        assert_eq!(config.debounce_ms, 100);
        assert_eq!(config.list_class, "menu");
    }

    #[test]
    fn test_non_positive_item_max_is_rejected() {
        for value in [0, -3] {
            let overrides = ConfigOverrides {
                item_max: Some(value),
                ..Default::default()
            };
            let err = overrides.resolve_onto(&Config::default()).unwrap_err();
            assert!(matches!(
                err,
                TypeaheadError::Config(ConfigError::InvalidValue { ref field, .. }) if field == "item_max"
            ));
        }
    }

    #[test]
    fn test_negative_debounce_is_rejected() {
        let overrides = ConfigOverrides {
            debounce_ms: Some(-1),
            ..Default::default()
        };
        let err = overrides.resolve_onto(&Config::default()).unwrap_err();
        assert!(err.to_string().contains("debounce_ms"));
    }

    #[test]
    fn test_zero_debounce_is_allowed() {
        let overrides = ConfigOverrides {
            debounce_ms: Some(0),
            ..Default::default()
        };
        let config = overrides.resolve_onto(&Config::default()).unwrap();
        assert_eq!(config.debounce(), Duration::ZERO);
    }

    #[test]
    fn test_from_attributes() {
        let overrides = ConfigOverrides::from_attributes([
            ("case-sensitive", " FALSE "),
            ("item-max", "5"),
            ("debounce", "250"),
            ("dropdown-class", "list"),
            ("ng-model", "selectedUser"),
        ])
        .unwrap();
        assert_eq!(overrides.case_sensitive, Some(false));
        assert_eq!(overrides.item_max, Some(5));
        assert_eq!(overrides.debounce_ms, Some(250));
        assert_eq!(overrides.list_class.as_deref(), Some("list"));
    }

    #[test]
    fn test_unparsable_bool_attribute_keeps_default() {
        let overrides = ConfigOverrides::from_attributes([("case-sensitive", "yes")]).unwrap();
        assert_eq!(overrides.case_sensitive, None);
    }

    #[test]
    fn test_malformed_integer_attribute_is_rejected() {
        let err = ConfigOverrides::from_attributes([("item-max", "ten")]).unwrap_err();
        assert!(err.to_string().contains("not an integer"));
    }

    #[test]
    fn test_settings_from_toml() {
        let settings = Settings::from_toml(
            r#"
            [defaults]
            case_sensitive = false
            item_max = 20

            [logging]
            level = "debug"
            "#,
        )
        .unwrap();
        assert_eq!(settings.defaults.case_sensitive, Some(false));
        assert_eq!(settings.defaults.item_max, Some(20));
        assert_eq!(settings.logging.level, LogLevel::Debug);
    }

    #[test]
    fn test_settings_rejects_bad_toml() {
        let err = Settings::from_toml("[defaults]\nitem_max = \"many\"").unwrap_err();
        assert!(matches!(err, TypeaheadError::Config(ConfigError::InvalidFormat(_))));
    }

    #[test]
    fn test_missing_explicit_settings_file() {
        let path = std::env::temp_dir().join("typeahead-does-not-exist.toml");
        let err = Settings::load_from_file(Some(&path)).unwrap_err();
        assert!(matches!(err, TypeaheadError::Config(ConfigError::FileNotFound(_))));
    }

    // The only test touching the process-wide record; every other test
    // resolves onto `Config::default()` explicitly.
    #[test]
    fn test_process_wide_defaults_setters() {
        set_default_case_sensitive(false).unwrap();
        set_default_item_max(3).unwrap();
        set_default_debounce_ms(0).unwrap();
        set_default_active_class("hl").unwrap();
        assert!(set_default_item_max(0).is_err());

        let snapshot = defaults();
        assert!(!snapshot.case_sensitive);
        assert_eq!(snapshot.item_max, 3);
        assert_eq!(snapshot.debounce_ms, 0);
        assert_eq!(snapshot.active_class, "hl");

        let resolved = ConfigOverrides {
            item_max: Some(7),
            ..Default::default()
        }
        .resolve()
        .unwrap();
        assert_eq!(resolved.item_max, 7);
        assert!(!resolved.case_sensitive);

        reset_defaults();
        assert_eq!(defaults(), Config::default());
    }

    #[test]
    fn test_log_level_conversion() {
        assert_eq!(LogLevel::Debug.to_tracing_level(), tracing::Level::DEBUG);
        assert_eq!(LogLevel::Warn.to_tracing_level(), tracing::Level::WARN);
    }
}
