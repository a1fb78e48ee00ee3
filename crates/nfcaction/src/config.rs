//! Configuration management for nfcaction.
//!
//! This module provides configuration loading and validation using figment,
//! supporting TOML config files, environment variables, and defaults.

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::action::DEFAULT_TIMER_MESSAGE;
use crate::error::{Error, Result};
use crate::ndef::MAX_LANGUAGE_CODE_LEN;

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Default configuration directory name.
const CONFIG_DIR_NAME: &str = "nfcaction";

/// Usable NDEF bytes of an NTAG213 once the TLV header is accounted for.
pub const DEFAULT_TAG_CAPACITY: usize = 137;

/// Pattern for IANA language tags as accepted in text records.
const LANGUAGE_PATTERN: &str = r"^[A-Za-z]{2,8}(-[A-Za-z0-9]{1,8})*$";

/// Application configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. Environment variables (prefixed with `NFCACTION_`)
/// 2. TOML config file at `~/.config/nfcaction/config.toml`
/// 3. Default values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Tag configuration.
    pub tag: TagConfig,
    /// Action form configuration.
    pub action: ActionConfig,
    /// Dispatch configuration.
    pub dispatch: DispatchConfig,
    /// Watch configuration.
    pub watch: WatchConfig,
}

/// Tag-related configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TagConfig {
    /// Language code written into new text records.
    pub language: String,
    /// Largest NDEF message, in bytes, a tag image accepts.
    pub capacity: usize,
    /// Create missing tag image files when writing.
    pub create_missing: bool,
}

/// Rules applied when building an action from user input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActionConfig {
    /// Label for timers written or read without one.
    pub default_timer_message: String,
    /// Only accept `https://` URLs when writing.
    pub require_https: bool,
}

/// Dispatch-related configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// Log intents instead of launching them.
    pub dry_run: bool,
    /// Start timers without announcing them. Expiry is always announced.
    pub skip_ui: bool,
    /// Program used to open URLs.
    /// Defaults to the platform opener (`xdg-open` or `open`).
    pub opener: Option<String>,
}

/// Tag watch configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchConfig {
    /// Interval between tag image checks in milliseconds.
    pub poll_interval_ms: u64,
}

impl Default for TagConfig {
    fn default() -> Self {
        Self {
            language: "en".to_string(),
            capacity: DEFAULT_TAG_CAPACITY,
            create_missing: true,
        }
    }
}

impl Default for ActionConfig {
    fn default() -> Self {
        Self {
            default_timer_message: DEFAULT_TIMER_MESSAGE.to_string(),
            require_https: true,
        }
    }
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            dry_run: false,
            skip_ui: true,
            opener: None,
        }
    }
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 500,
        }
    }
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// Configuration is loaded in this order (later sources override earlier):
    /// 1. Default values
    /// 2. TOML config file (if exists)
    /// 3. Environment variables (prefixed with `NFCACTION_`)
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration with an optional custom config path.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);

        let figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&config_file))
            .merge(Env::prefixed("NFCACTION_").split("__"));

        let config: Config = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default configuration file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(CONFIG_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<()> {
        let language = &self.tag.language;
        let pattern = Regex::new(LANGUAGE_PATTERN)
            .map_err(|e| Error::internal(format!("language pattern: {e}")))?;
        if language.len() > MAX_LANGUAGE_CODE_LEN || !pattern.is_match(language) {
            return Err(Error::ConfigValidation {
                message: format!("invalid language code: '{language}'"),
            });
        }

        if self.tag.capacity == 0 {
            return Err(Error::ConfigValidation {
                message: "tag capacity must be greater than 0".to_string(),
            });
        }

        if self.watch.poll_interval_ms == 0 {
            return Err(Error::ConfigValidation {
                message: "poll_interval_ms must be greater than 0".to_string(),
            });
        }

        if self
            .dispatch
            .opener
            .as_ref()
            .is_some_and(|opener| opener.trim().is_empty())
        {
            return Err(Error::ConfigValidation {
                message: "opener must not be blank".to_string(),
            });
        }

        Ok(())
    }

    /// Get the poll interval as a Duration.
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.watch.poll_interval_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert_eq!(config.tag.language, "en");
        assert_eq!(config.tag.capacity, DEFAULT_TAG_CAPACITY);
        assert!(config.tag.create_missing);
        assert!(config.action.require_https);
        assert!(!config.dispatch.dry_run);
        assert!(config.dispatch.skip_ui);
        assert!(config.dispatch.opener.is_none());
    }

    #[test]
    fn test_default_action_config() {
        let action = ActionConfig::default();
        assert_eq!(action.default_timer_message, DEFAULT_TIMER_MESSAGE);
    }

    #[test]
    fn test_validate_valid_config() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_language_with_region() {
        let mut config = Config::default();
        config.tag.language = "pt-BR".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_invalid_language() {
        for language in ["", "e", "en_US", "fr-", "日本"] {
            let mut config = Config::default();
            config.tag.language = language.to_string();

            let result = config.validate();
            assert!(result.is_err(), "accepted {language:?}");
            let err = result.unwrap_err().to_string();
            assert!(err.contains("invalid language code"));
        }
    }

    #[test]
    fn test_validate_language_too_long() {
        let mut config = Config::default();
        config.tag.language = format!("en{}", "-abcdefgh".repeat(7));
        assert!(config.tag.language.len() > MAX_LANGUAGE_CODE_LEN);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_zero_capacity() {
        let mut config = Config::default();
        config.tag.capacity = 0;

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("capacity"));
    }

    #[test]
    fn test_validate_zero_poll_interval() {
        let mut config = Config::default();
        config.watch.poll_interval_ms = 0;

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("poll_interval_ms"));
    }

    #[test]
    fn test_validate_blank_opener() {
        let mut config = Config::default();
        config.dispatch.opener = Some("  ".to_string());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_poll_interval() {
        let config = Config::default();
        assert_eq!(config.poll_interval(), Duration::from_millis(500));
    }

    #[test]
    fn test_default_config_path() {
        let path = Config::default_config_path();
        assert!(path.to_string_lossy().contains("nfcaction"));
        assert!(path.to_string_lossy().contains("config.toml"));
    }

    #[test]
    fn test_load_nonexistent_config() {
        // Loading from a nonexistent path should work (uses defaults)
        let result = Config::load_from(Some(PathBuf::from("/nonexistent/config.toml")));
        assert!(result.is_ok());

        let config = result.unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_load_from_toml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[tag]\nlanguage = \"fr\"\ncapacity = 492\n\n[action]\nrequire_https = false\n",
        )
        .unwrap();

        let config = Config::load_from(Some(path)).unwrap();
        assert_eq!(config.tag.language, "fr");
        assert_eq!(config.tag.capacity, 492);
        assert!(!config.action.require_https);
        assert_eq!(config.watch, WatchConfig::default());
    }

    #[test]
    fn test_load_rejects_invalid_file_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[tag]\ncapacity = 0\n").unwrap();

        let err = Config::load_from(Some(path)).unwrap_err();
        assert!(err.is_config_error());
    }

    #[test]
    fn test_tag_config_deserialize() {
        let json = r#"{"language": "de", "capacity": 868}"#;
        let tag: TagConfig = serde_json::from_str(json).unwrap();
        assert_eq!(tag.language, "de");
        assert_eq!(tag.capacity, 868);
        assert!(tag.create_missing);
    }

    #[test]
    fn test_dispatch_config_serialize() {
        let dispatch = DispatchConfig::default();
        let json = serde_json::to_string(&dispatch).unwrap();
        assert!(json.contains("dry_run"));
        assert!(json.contains("skip_ui"));
    }

    #[test]
    fn test_config_clone() {
        let config = Config::default();
        let cloned = config.clone();
        assert_eq!(config, cloned);
    }
}
