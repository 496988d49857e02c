//! Shared types used across all ZacAI crates.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Default session ID when not specified (single-session mode).
pub const DEFAULT_SESSION_ID: &str = "default";

/// Unix timestamp in milliseconds; 0 if the clock is before the epoch.
pub fn now_ms() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

/// Runtime knobs the orchestrator needs; projected from [`CoreConfig`].
#[derive(Debug, Clone)]
pub struct AssistantSettings {
    /// Soft timeout for a single lookup collaborator call.
    pub lookup_timeout: Duration,
    /// Maximum number of conversation turns kept in memory.
    pub max_history: usize,
    /// Minimum confidence for a pathway result to be considered useful.
    pub min_confidence: f32,
}

impl Default for AssistantSettings {
    fn default() -> Self {
        Self {
            lookup_timeout: Duration::from_millis(3000),
            max_history: 50,
            min_confidence: 0.3,
        }
    }
}

/// Global application configuration (gateway + assistant). Load from TOML or env.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoreConfig {
    /// Assistant display name.
    pub app_name: String,
    /// HTTP port for the gateway.
    pub port: u16,
    /// Base directory for the sled knowledge vault.
    pub storage_path: String,
    /// Soft timeout (ms) for dictionary/encyclopedia lookups.
    #[serde(default = "default_lookup_timeout_ms")]
    pub lookup_timeout_ms: u64,
    /// When false, the vocabulary pathway never calls the network (tiers 1–2 only).
    #[serde(default = "default_true")]
    pub online_lookups: bool,
    /// Base URL of the dictionary API (word is appended as a path segment).
    #[serde(default = "default_dictionary_url")]
    pub dictionary_url: String,
    /// Base URL of the encyclopedia (MediaWiki) site.
    #[serde(default = "default_encyclopedia_url")]
    pub encyclopedia_url: String,
    /// Conversation log capacity per session.
    #[serde(default = "default_max_history")]
    pub max_history: usize,
    /// Minimum usefulness threshold for the synthesizer.
    #[serde(default = "default_min_confidence")]
    pub min_confidence: f32,
    /// Sessions kept open in memory by the gateway; the least recently used is dropped beyond this.
    #[serde(default = "default_max_sessions")]
    pub max_sessions: usize,
}

fn default_true() -> bool {
    true
}

fn default_lookup_timeout_ms() -> u64 {
    3000
}

fn default_dictionary_url() -> String {
    "https://api.dictionaryapi.dev/api/v2/entries/en".to_string()
}

fn default_encyclopedia_url() -> String {
    "https://en.wikipedia.org".to_string()
}

fn default_max_history() -> usize {
    50
}

fn default_min_confidence() -> f32 {
    0.3
}

fn default_max_sessions() -> usize {
    crate::session::DEFAULT_MAX_SESSIONS
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            app_name: "ZacAI".to_string(),
            port: 8001,
            storage_path: "./data".to_string(),
            lookup_timeout_ms: default_lookup_timeout_ms(),
            online_lookups: true,
            dictionary_url: default_dictionary_url(),
            encyclopedia_url: default_encyclopedia_url(),
            max_history: default_max_history(),
            min_confidence: default_min_confidence(),
            max_sessions: default_max_sessions(),
        }
    }
}

impl CoreConfig {
    /// Load config from file and environment.
    /// Precedence: env `ZACAI_*` > file (`ZACAI_CONFIG` path or `config/zacai`) > defaults.
    pub fn load() -> Result<Self, config::ConfigError> {
        let config_path = std::env::var("ZACAI_CONFIG").unwrap_or_else(|_| "config/zacai".to_string());
        let defaults = Self::default();
        let builder = config::Config::builder()
            .set_default("app_name", defaults.app_name)?
            .set_default("port", defaults.port as i64)?
            .set_default("storage_path", defaults.storage_path)?
            .set_default("lookup_timeout_ms", defaults.lookup_timeout_ms as i64)?
            .set_default("online_lookups", defaults.online_lookups)?
            .set_default("dictionary_url", defaults.dictionary_url)?
            .set_default("encyclopedia_url", defaults.encyclopedia_url)?
            .set_default("max_history", defaults.max_history as i64)?
            .set_default("min_confidence", defaults.min_confidence as f64)?
            .set_default("max_sessions", defaults.max_sessions as i64)?;

        let path = Path::new(&config_path);
        let builder = if path.exists() {
            builder.add_source(config::File::from(path))
        } else {
            builder.add_source(config::File::with_name(&config_path).required(false))
        };

        let built = builder
            .add_source(config::Environment::with_prefix("ZACAI").separator("__"))
            .build()?;

        built.try_deserialize()
    }

    /// Orchestrator settings derived from this config.
    pub fn assistant_settings(&self) -> AssistantSettings {
        AssistantSettings {
            lookup_timeout: Duration::from_millis(self.lookup_timeout_ms),
            max_history: self.max_history.max(1),
            min_confidence: self.min_confidence.clamp(0.0, 1.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assistant_settings_clamp_out_of_range_values() {
        let config = CoreConfig {
            max_history: 0,
            min_confidence: 1.7,
            lookup_timeout_ms: 250,
            ..CoreConfig::default()
        };
        let settings = config.assistant_settings();
        assert_eq!(settings.max_history, 1);
        assert_eq!(settings.min_confidence, 1.0);
        assert_eq!(settings.lookup_timeout, Duration::from_millis(250));
    }
}
