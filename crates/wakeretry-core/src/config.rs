use crate::retry::{RetryPolicy, DEFAULT_DELAYS, DEFAULT_JITTER_MAX, DEFAULT_MESSAGE_PATTERNS, DEFAULT_RETRYABLE_CODES};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Invalid retry configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid message pattern `{pattern}`: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

/// Retry policy parameters (optional `[retry]` section in config.toml).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Delay before each retry in milliseconds; its length is the retry count.
    pub delays_ms: Vec<u64>,
    /// Exclusive upper bound of random jitter added to each delay, in milliseconds.
    pub jitter_max_ms: u64,
    /// Client error codes treated as transient.
    pub retryable_codes: Vec<String>,
    /// Case-insensitive regexes matched against messages of uncoded failures.
    pub message_patterns: Vec<String>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            delays_ms: DEFAULT_DELAYS.iter().map(|d| d.as_millis() as u64).collect(),
            jitter_max_ms: DEFAULT_JITTER_MAX.as_millis() as u64,
            retryable_codes: DEFAULT_RETRYABLE_CODES.iter().map(|c| c.to_string()).collect(),
            message_patterns: DEFAULT_MESSAGE_PATTERNS.iter().map(|p| p.to_string()).collect(),
        }
    }
}

impl RetryConfig {
    /// The single fixed-delay policy: one retry after `delay_ms`, no jitter.
    pub fn fixed(delay_ms: u64) -> Self {
        Self {
            delays_ms: vec![delay_ms],
            jitter_max_ms: 0,
            ..Self::default()
        }
    }
}

/// Global configuration loaded from `~/.config/wakeretry/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WakeretryConfig {
    /// Optional retry policy; if missing, built-in defaults are used.
    #[serde(default)]
    pub retry: Option<RetryConfig>,
}

impl WakeretryConfig {
    pub fn retry_config(&self) -> RetryConfig {
        self.retry.clone().unwrap_or_default()
    }

    pub fn retry_policy(&self) -> Result<RetryPolicy, ConfigError> {
        RetryPolicy::from_config(&self.retry_config())
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("wakeretry")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<WakeretryConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = WakeretryConfig {
            retry: Some(RetryConfig::default()),
        };
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    load_from(&path)
}

/// Load configuration from an explicit path.
pub fn load_from(path: &Path) -> Result<WakeretryConfig> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    let cfg: WakeretryConfig =
        toml::from_str(&data).with_context(|| format!("parsing config {}", path.display()))?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn default_config_values() {
        let cfg = RetryConfig::default();
        assert_eq!(cfg.delays_ms, vec![1000, 2000, 3000]);
        assert_eq!(cfg.jitter_max_ms, 250);
        assert!(cfg.retryable_codes.iter().any(|c| c == "P1001"));
        assert_eq!(cfg.message_patterns.len(), DEFAULT_MESSAGE_PATTERNS.len());
    }

    #[test]
    fn config_toml_roundtrip() {
        let cfg = WakeretryConfig {
            retry: Some(RetryConfig::default()),
        };
        let toml = toml::to_string_pretty(&cfg).unwrap();
        let parsed: WakeretryConfig = toml::from_str(&toml).unwrap();
        assert_eq!(parsed.retry, cfg.retry);
    }

    #[test]
    fn missing_retry_section_uses_defaults() {
        let cfg: WakeretryConfig = toml::from_str("").unwrap();
        assert!(cfg.retry.is_none());
        let policy = cfg.retry_policy().unwrap();
        assert_eq!(policy.total_attempts(), 4);
    }

    #[test]
    fn partial_retry_section_fills_defaults() {
        let toml = r#"
            [retry]
            delays_ms = [2000]
            jitter_max_ms = 0
        "#;
        let cfg: WakeretryConfig = toml::from_str(toml).unwrap();
        let retry = cfg.retry.as_ref().unwrap();
        assert_eq!(retry.delays_ms, vec![2000]);
        assert_eq!(retry.retryable_codes, RetryConfig::default().retryable_codes);

        let policy = cfg.retry_policy().unwrap();
        assert_eq!(policy.schedule.jittered(0), Some(Duration::from_millis(2000)));
        assert_eq!(policy.total_attempts(), 2);
    }

    #[test]
    fn fixed_policy_matches_single_retry() {
        let cfg = RetryConfig::fixed(2000);
        assert_eq!(cfg.delays_ms, vec![2000]);
        assert_eq!(cfg.jitter_max_ms, 0);
    }

    #[test]
    fn bad_pattern_rejected() {
        let toml = r#"
            [retry]
            message_patterns = ["[unterminated"]
        "#;
        let cfg: WakeretryConfig = toml::from_str(toml).unwrap();
        let err = cfg.retry_policy().unwrap_err();
        assert!(err.to_string().contains("[unterminated"));
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            "[retry]\ndelays_ms = [10, 20]\nretryable_codes = [\"57P01\"]\n",
        )
        .unwrap();
        let cfg = load_from(&path).unwrap();
        let retry = cfg.retry_config();
        assert_eq!(retry.delays_ms, vec![10, 20]);
        assert_eq!(retry.retryable_codes, vec!["57P01".to_string()]);
    }

    #[test]
    fn load_from_missing_file_errors() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_from(&dir.path().join("nope.toml")).unwrap_err();
        assert!(format!("{:#}", err).contains("reading config"));
    }
}
