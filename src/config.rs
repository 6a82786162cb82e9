//! Runtime settings.
//!
//! Every field has a default, so an empty TOML document (or no file at all)
//! is a valid configuration. Unknown keys are rejected.

use std::path::Path;

use serde::Deserialize;

use crate::SettingKey;
use crate::bag::Arg;
use crate::rules::helpers::parse_interval;

/// Environment variable naming a TOML settings file.
pub const CONFIG_ENV: &str = "ADSBOT_CONFIG";

/// What to do when a flag appears more than once in one command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FlagPolicy {
    FirstWins,
    #[default]
    LastWins,
    /// Fail the command with `InvalidCommandFlag`.
    Reject,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Interval used when a command omits one.
    pub default_time_interval: String,
    /// Identifier token meaning "every campaign / widget".
    pub all_alias: String,
    /// Threshold assumed by `widgets-low-cpa` when none is given.
    pub low_cpa_threshold: f64,
    /// Result count assumed by `widgets-top` when none is given.
    pub default_filter_number: i64,
    /// Upper bound, in characters, of one transport message.
    pub max_message_size: usize,
    pub flag_policy: FlagPolicy,
    /// Fail the command, instead of reporting it, when a platform record
    /// cannot be joined to the tracker.
    pub strict_join: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            default_time_interval: "360d".to_string(),
            all_alias: "all".to_string(),
            low_cpa_threshold: 5.0,
            default_filter_number: 5,
            max_message_size: 2000,
            flag_policy: FlagPolicy::LastWins,
            strict_join: false,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Invalid config value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

impl Settings {
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let settings: Settings = toml::from_str(source)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let source = std::fs::read_to_string(path)?;
        Self::from_toml_str(&source)
    }

    /// Load from `path`, else from `$ADSBOT_CONFIG`, else defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = path {
            return Self::load(path);
        }
        match std::env::var_os(CONFIG_ENV) {
            Some(path) => Self::load(Path::new(&path)),
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_message_size == 0 {
            return Err(ConfigError::InvalidValue { field: "max_message_size", reason: "must be positive".into() });
        }
        if self.all_alias.trim().is_empty() {
            return Err(ConfigError::InvalidValue { field: "all_alias", reason: "must not be empty".into() });
        }
        if parse_interval(&self.default_time_interval).is_none() {
            return Err(ConfigError::InvalidValue {
                field: "default_time_interval",
                reason: format!("'{}' is not an interval", self.default_time_interval),
            });
        }
        if self.default_filter_number <= 0 {
            return Err(ConfigError::InvalidValue {
                field: "default_filter_number",
                reason: "must be positive".into(),
            });
        }
        Ok(())
    }

    /// Configured value behind a grammar default.
    pub(crate) fn value_for(&self, key: SettingKey) -> Arg {
        match key {
            SettingKey::DefaultTimeInterval => Arg::Text(self.default_time_interval.to_ascii_lowercase()),
            SettingKey::LowCpaThreshold => Arg::Number(self.low_cpa_threshold),
            SettingKey::DefaultFilterNumber => Arg::Integer(self.default_filter_number),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_yields_defaults() {
        let settings = Settings::from_toml_str("").unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.default_time_interval, "360d");
        assert_eq!(settings.flag_policy, FlagPolicy::LastWins);
    }

    #[test]
    fn partial_document_overrides_fields() {
        let settings = Settings::from_toml_str(
            r#"
            all_alias = "every"
            flag_policy = "reject"
            strict_join = true
            "#,
        )
        .unwrap();

        assert_eq!(settings.all_alias, "every");
        assert_eq!(settings.flag_policy, FlagPolicy::Reject);
        assert!(settings.strict_join);
        assert_eq!(settings.max_message_size, 2000);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = Settings::from_toml_str("colour = true").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn invalid_values_are_rejected() {
        let err = Settings::from_toml_str("max_message_size = 0").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { field: "max_message_size", .. }));

        let err = Settings::from_toml_str("default_time_interval = \"7x\"").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { field: "default_time_interval", .. }));
    }

    #[test]
    fn value_for_maps_setting_keys() {
        let settings = Settings::default();
        assert_eq!(settings.value_for(SettingKey::DefaultTimeInterval), Arg::Text("360d".into()));
        assert_eq!(settings.value_for(SettingKey::LowCpaThreshold), Arg::Number(5.0));
        assert_eq!(settings.value_for(SettingKey::DefaultFilterNumber), Arg::Integer(5));
    }
}
