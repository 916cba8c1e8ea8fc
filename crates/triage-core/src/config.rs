//! Environment-driven configuration.
//!
//! Every knob has a default that works with the in-memory wiring, so the
//! demo binary runs with zero environment. Reads go through a lookup
//! function so tests never touch the process environment.

use std::env;
use std::str::FromStr;
use std::time::Duration as StdDuration;

use chrono::Duration;
use thiserror::Error;

use crate::domain::TargetKind;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value {value:?} for {key}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone)]
pub struct TriageConfig {
    pub llm_api_url: String,
    pub llm_api_key: String,
    pub llm_model: String,
    pub llm_timeout_secs: u64,

    pub monitor_interval_secs: u64,
    pub cooldown_secs: i64,
    pub concurrency: usize,
    pub page_limit: usize,

    pub replay_target: TargetKind,
    pub replay_base_url: Option<String>,
    pub replay_timeout_secs: u64,
}

impl TriageConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        Ok(Self {
            llm_api_url: lookup("TRIAGE_LLM_API_URL").unwrap_or_else(|| {
                "https://api.openai.com/v1/chat/completions".to_string()
            }),
            llm_api_key: lookup("TRIAGE_LLM_API_KEY").unwrap_or_default(),
            llm_model: lookup("TRIAGE_LLM_MODEL").unwrap_or_else(|| "gpt-4o-mini".to_string()),
            llm_timeout_secs: parse(&lookup, "TRIAGE_LLM_TIMEOUT_SECS", 20)?,

            monitor_interval_secs: parse(&lookup, "TRIAGE_MONITOR_INTERVAL_SECS", 300)?,
            cooldown_secs: parse(&lookup, "TRIAGE_COOLDOWN_SECS", 1800)?,
            concurrency: parse(&lookup, "TRIAGE_CONCURRENCY", 4)?,
            page_limit: parse(&lookup, "TRIAGE_PAGE_LIMIT", 100)?,

            replay_target: parse_target(lookup("TRIAGE_REPLAY_TARGET"))?,
            replay_base_url: lookup("TRIAGE_REPLAY_BASE_URL"),
            replay_timeout_secs: parse(&lookup, "TRIAGE_REPLAY_TIMEOUT_SECS", 10)?,
        })
    }

    pub fn monitor_interval(&self) -> StdDuration {
        StdDuration::from_secs(self.monitor_interval_secs)
    }

    pub fn cooldown(&self) -> Duration {
        Duration::seconds(self.cooldown_secs)
    }

    pub fn llm_timeout(&self) -> StdDuration {
        StdDuration::from_secs(self.llm_timeout_secs)
    }

    pub fn replay_timeout(&self) -> StdDuration {
        StdDuration::from_secs(self.replay_timeout_secs)
    }
}

fn parse<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: T,
) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw.parse().map_err(|e: T::Err| ConfigError::Invalid {
            key,
            value: raw,
            reason: e.to_string(),
        }),
        None => Ok(default),
    }
}

fn parse_target(raw: Option<String>) -> Result<TargetKind, ConfigError> {
    match raw.as_deref() {
        None | Some("mock") => Ok(TargetKind::Mock),
        Some("sandbox") => Ok(TargetKind::Sandbox),
        Some("direct") => Ok(TargetKind::Direct),
        Some(other) => Err(ConfigError::Invalid {
            key: "TRIAGE_REPLAY_TARGET",
            value: other.to_string(),
            reason: "expected mock, sandbox, or direct".to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_need_no_environment() {
        let config = TriageConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config.monitor_interval_secs, 300);
        assert_eq!(config.cooldown_secs, 1800);
        assert_eq!(config.replay_target, TargetKind::Mock);
        assert!(config.replay_base_url.is_none());
    }

    #[test]
    fn values_override_defaults() {
        let config = TriageConfig::from_lookup(lookup_from(&[
            ("TRIAGE_MONITOR_INTERVAL_SECS", "60"),
            ("TRIAGE_REPLAY_TARGET", "sandbox"),
            ("TRIAGE_REPLAY_BASE_URL", "http://sandbox.local"),
        ]))
        .unwrap();
        assert_eq!(config.monitor_interval_secs, 60);
        assert_eq!(config.replay_target, TargetKind::Sandbox);
        assert_eq!(config.replay_base_url.as_deref(), Some("http://sandbox.local"));
    }

    #[test]
    fn unparsable_number_is_rejected_with_the_key_named() {
        let err = TriageConfig::from_lookup(lookup_from(&[(
            "TRIAGE_CONCURRENCY",
            "many",
        )]))
        .unwrap_err();
        assert!(err.to_string().contains("TRIAGE_CONCURRENCY"));
    }

    #[test]
    fn unknown_replay_target_is_rejected() {
        let err = TriageConfig::from_lookup(lookup_from(&[(
            "TRIAGE_REPLAY_TARGET",
            "production",
        )]))
        .unwrap_err();
        assert!(err.to_string().contains("production"));
    }
}
