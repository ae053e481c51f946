use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use url::Url;

pub const DEFAULT_API_BASE: &str = "https://gmail.googleapis.com/gmail/v1/users/me";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppConfig {
    pub version: u32,
    pub service: ServiceConfig,
    pub ui: UiConfig,
    #[serde(default)]
    pub fixtures: FixtureConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServiceConfig {
    pub api_base: Url,
    pub max_thread_results: usize,
    /// Name of the environment variable holding the OAuth bearer token.
    pub access_token_env: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UiConfig {
    pub default_label_ids: Vec<String>,
    pub refresh_interval_secs: u64,
    pub relative_date_window_days: i64,
}

/// Debug mode: serve labels, threads and users from JSON files on disk.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct FixtureConfig {
    pub enabled: bool,
    pub directory: Option<PathBuf>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            api_base: Url::parse(DEFAULT_API_BASE).expect("valid default api base"),
            max_thread_results: 10,
            access_token_env: "CAIRN_ACCESS_TOKEN".to_string(),
        }
    }
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            default_label_ids: vec!["INBOX".to_string()],
            refresh_interval_secs: 60,
            relative_date_window_days: 30,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            version: 1,
            service: ServiceConfig::default(),
            ui: UiConfig::default(),
            fixtures: FixtureConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_round_trips_through_toml() {
        let config = AppConfig::default();
        let text = toml::to_string_pretty(&config).expect("serialize");
        assert!(text.contains("max_thread_results = 10"));
        let parsed: AppConfig = toml::from_str(&text).expect("parse");
        assert_eq!(parsed, config);
    }

    #[test]
    fn missing_fixture_section_defaults_to_disabled() {
        let text = r#"
            version = 1

            [service]
            api_base = "https://example.test/v1/users/me"
            max_thread_results = 25
            access_token_env = "TOKEN"

            [ui]
            default_label_ids = ["STARRED"]
            refresh_interval_secs = 30
            relative_date_window_days = 7
        "#;
        let parsed: AppConfig = toml::from_str(text).expect("parse");
        assert!(!parsed.fixtures.enabled);
        assert_eq!(parsed.service.max_thread_results, 25);
        assert_eq!(parsed.ui.default_label_ids, vec!["STARRED".to_string()]);
    }
}
