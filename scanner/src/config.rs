//! Scan configuration
//!
//! Loaded once from a JSON file before the run and treated as read-only
//! afterwards. Keys are camelCase; everything except `username` has a default.

use crate::catalog::DEFAULT_CATALOG_URL;
use crate::error::ConfigError;
use crate::policy::PolicyFlags;
use prober::classifier::ClassifierSettings;
use prober::matcher::ReasonMatcher;
use serde::Deserialize;
use shared::{AuthMode, DEFAULT_WATCH_MARKER};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ScanConfig {
    /// Account used by both passes
    pub username: String,

    /// `true` deletes allow-listed servers, `false` tags them, absent skips the pass
    #[serde(default, alias = "removeWhitelisted")]
    pub whitelist_intent: Option<bool>,
    /// `true` deletes servers that reject offline sessions, `false` tags
    /// servers that accept them, absent skips the pass
    #[serde(default)]
    pub cracked_intent: Option<bool>,

    #[serde(default)]
    pub delete_offline: bool,
    #[serde(default)]
    pub delete_unsupported: bool,
    #[serde(default)]
    pub ignore_rescanned: bool,

    #[serde(default = "default_watch_marker")]
    pub watch_marker: String,
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
    #[serde(default = "default_confirm_window_ms")]
    pub confirm_window_ms: u64,
    #[serde(default = "default_ping_timeout_ms")]
    pub ping_timeout_ms: u64,

    #[serde(default)]
    pub reasons: ReasonMatcher,

    #[serde(default = "default_store_path")]
    pub store_path: PathBuf,
    #[serde(default = "default_catalog_url")]
    pub catalog_url: String,
    #[serde(default)]
    pub client_command: Vec<String>,
}

fn default_watch_marker() -> String {
    DEFAULT_WATCH_MARKER.to_string()
}

fn default_concurrency() -> usize {
    5
}

fn default_retry_delay_ms() -> u64 {
    1000
}

fn default_connect_timeout_ms() -> u64 {
    6000
}

fn default_confirm_window_ms() -> u64 {
    3000
}

fn default_ping_timeout_ms() -> u64 {
    5000
}

fn default_store_path() -> PathBuf {
    PathBuf::from("servers.bin")
}

fn default_catalog_url() -> String {
    DEFAULT_CATALOG_URL.to_string()
}

impl ScanConfig {
    /// Config with every default and the given account.
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            whitelist_intent: None,
            cracked_intent: None,
            delete_offline: false,
            delete_unsupported: false,
            ignore_rescanned: false,
            watch_marker: default_watch_marker(),
            concurrency: default_concurrency(),
            retry_delay_ms: default_retry_delay_ms(),
            connect_timeout_ms: default_connect_timeout_ms(),
            confirm_window_ms: default_confirm_window_ms(),
            ping_timeout_ms: default_ping_timeout_ms(),
            reasons: ReasonMatcher::default(),
            store_path: default_store_path(),
            catalog_url: default_catalog_url(),
            client_command: Vec::new(),
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: ScanConfig = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.username.trim().is_empty() {
            return Err(ConfigError::Invalid("username must not be empty".into()));
        }
        if self.watch_marker.is_empty() {
            return Err(ConfigError::Invalid("watchMarker must not be empty".into()));
        }
        if self.concurrency == 0 {
            return Err(ConfigError::Invalid("concurrency must be at least 1".into()));
        }
        Ok(())
    }

    /// Intent for the pass that probes with `mode`; None disables the pass.
    pub fn intent(&self, mode: AuthMode) -> Option<bool> {
        match mode {
            AuthMode::Offline => self.cracked_intent,
            AuthMode::Authenticated => self.whitelist_intent,
        }
    }

    pub fn any_pass_enabled(&self) -> bool {
        self.cracked_intent.is_some() || self.whitelist_intent.is_some()
    }

    pub fn policy_flags(&self) -> PolicyFlags {
        PolicyFlags {
            delete_offline: self.delete_offline,
            delete_unsupported: self.delete_unsupported,
        }
    }

    pub fn classifier_settings(&self) -> ClassifierSettings {
        ClassifierSettings {
            connect_timeout: Duration::from_millis(self.connect_timeout_ms),
            confirm_window: Duration::from_millis(self.confirm_window_ms),
            retry_delay: Duration::from_millis(self.retry_delay_ms),
        }
    }

    pub fn ping_timeout(&self) -> Duration {
        Duration::from_millis(self.ping_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_config_defaults() {
        let config = ScanConfig::from_json(r#"{"username":"Prober"}"#).unwrap();
        assert_eq!(config, ScanConfig::new("Prober"));
        assert_eq!(config.concurrency, 5);
        assert_eq!(config.watch_marker, "Re:SS");
        assert!(!config.any_pass_enabled());

        let settings = config.classifier_settings();
        assert_eq!(settings.retry_delay, Duration::from_millis(1000));
        assert_eq!(settings.connect_timeout, Duration::from_millis(6000));
        assert_eq!(settings.confirm_window, Duration::from_millis(3000));
    }

    #[test]
    fn test_full_config() {
        let config = ScanConfig::from_json(
            r#"{
                "username": "Prober",
                "whitelistIntent": true,
                "crackedIntent": false,
                "deleteOffline": true,
                "deleteUnsupported": true,
                "ignoreRescanned": true,
                "watchMarker": "[scan]",
                "concurrency": 12,
                "retryDelayMs": 250,
                "storePath": "/tmp/servers.bin",
                "clientCommand": ["node", "probe.js"],
                "reasons": { "rateLimited": ["slow down"] }
            }"#,
        )
        .unwrap();

        assert_eq!(config.intent(AuthMode::Authenticated), Some(true));
        assert_eq!(config.intent(AuthMode::Offline), Some(false));
        assert!(config.policy_flags().delete_offline);
        assert!(config.policy_flags().delete_unsupported);
        assert_eq!(config.concurrency, 12);
        assert_eq!(config.watch_marker, "[scan]");
        assert_eq!(config.store_path, PathBuf::from("/tmp/servers.bin"));
        assert_eq!(config.client_command, vec!["node", "probe.js"]);
        assert_eq!(config.reasons.rate_limited, vec!["slow down"]);
        assert_eq!(
            config.classifier_settings().retry_delay,
            Duration::from_millis(250)
        );
    }

    #[test]
    fn test_legacy_remove_whitelisted_key() {
        let config =
            ScanConfig::from_json(r#"{"username":"Prober","removeWhitelisted":false}"#).unwrap();
        assert_eq!(config.whitelist_intent, Some(false));
    }

    #[test]
    fn test_null_intent_disables_pass() {
        let config =
            ScanConfig::from_json(r#"{"username":"Prober","crackedIntent":null}"#).unwrap();
        assert_eq!(config.intent(AuthMode::Offline), None);
    }

    #[test]
    fn test_invalid_configs() {
        assert!(matches!(
            ScanConfig::from_json(r#"{"username":"  "}"#),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            ScanConfig::from_json(r#"{"username":"Prober","concurrency":0}"#),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            ScanConfig::from_json(r#"{"username":"Prober","watchMarker":""}"#),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            ScanConfig::from_json(r#"{"crackedIntent":true}"#),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_missing_file() {
        let result = ScanConfig::from_file(Path::new("/nonexistent/config.json"));
        assert!(matches!(result, Err(ConfigError::Read { .. })));
    }
}
