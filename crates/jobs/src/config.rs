//! Client configuration loaded from environment variables.

use std::str::FromStr;
use std::time::Duration;

use atelier_core::error::CoreError;

/// Seconds slept before each status check.
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 3;
/// Status checks allowed before a generation times out.
pub const DEFAULT_MAX_POLL_ATTEMPTS: u32 = 60;
/// Per-request HTTP timeout.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Tunable parameters of the poll loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollConfig {
    /// Delay before every status check.
    pub interval: Duration,
    /// Upper bound on status checks per generation.
    pub max_attempts: u32,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS),
            max_attempts: DEFAULT_MAX_POLL_ATTEMPTS,
        }
    }
}

impl PollConfig {
    /// Load from the process environment.
    ///
    /// | Env Var              | Default |
    /// |----------------------|---------|
    /// | `POLL_INTERVAL_SECS` | `3`     |
    /// | `POLL_MAX_ATTEMPTS`  | `60`    |
    pub fn from_env() -> Result<Self, CoreError> {
        Self::from_lookup(env_lookup)
    }

    /// Load through an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, CoreError> {
        let interval_secs: u64 =
            parse_var(&lookup, "POLL_INTERVAL_SECS", DEFAULT_POLL_INTERVAL_SECS)?;
        let max_attempts: u32 = parse_var(&lookup, "POLL_MAX_ATTEMPTS", DEFAULT_MAX_POLL_ATTEMPTS)?;

        if max_attempts == 0 {
            return Err(CoreError::Config(
                "POLL_MAX_ATTEMPTS must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            interval: Duration::from_secs(interval_secs),
            max_attempts,
        })
    }

    /// Longest time a generation may spend polling.
    pub fn budget(&self) -> Duration {
        self.interval * self.max_attempts
    }
}

/// Connection settings for the hosted backend.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Project base URL, e.g. `https://xyz.supabase.co`.
    pub supabase_url: String,
    /// Public (anon) API key sent with every request.
    pub anon_key: String,
    pub request_timeout: Duration,
    pub poll: PollConfig,
}

impl ClientConfig {
    /// Load from the process environment.
    ///
    /// | Env Var                | Default    |
    /// |------------------------|------------|
    /// | `SUPABASE_URL`         | (required) |
    /// | `SUPABASE_ANON_KEY`    | (required) |
    /// | `REQUEST_TIMEOUT_SECS` | `30`       |
    ///
    /// Poll settings follow [`PollConfig::from_env`].
    pub fn from_env() -> Result<Self, CoreError> {
        Self::from_lookup(env_lookup)
    }

    /// Load through an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, CoreError> {
        let supabase_url = require_var(&lookup, "SUPABASE_URL")?
            .trim_end_matches('/')
            .to_string();
        let anon_key = require_var(&lookup, "SUPABASE_ANON_KEY")?;
        let timeout_secs: u64 =
            parse_var(&lookup, "REQUEST_TIMEOUT_SECS", DEFAULT_REQUEST_TIMEOUT_SECS)?;
        let poll = PollConfig::from_lookup(&lookup)?;

        Ok(Self {
            supabase_url,
            anon_key,
            request_timeout: Duration::from_secs(timeout_secs),
            poll,
        })
    }
}

// ---- lookup helpers ----

/// Read a variable from the process environment.
pub fn env_lookup(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Read a non-empty variable or fail with [`CoreError::Config`].
pub fn require_var(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Result<String, CoreError> {
    lookup(key)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| CoreError::Config(format!("{key} must be set")))
}

/// Parse a variable, falling back to `default` when unset or blank.
pub fn parse_var<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> Result<T, CoreError> {
    match lookup(key).map(|v| v.trim().to_string()) {
        Some(raw) if !raw.is_empty() => raw
            .parse()
            .map_err(|_| CoreError::Config(format!("{key} has an invalid value '{raw}'"))),
        _ => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use assert_matches::assert_matches;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn default_budget_is_three_minutes() {
        let config = PollConfig::default();
        assert_eq!(config.interval, Duration::from_secs(3));
        assert_eq!(config.max_attempts, 60);
        assert_eq!(config.budget(), Duration::from_secs(180));
    }

    #[test]
    fn poll_overrides_are_read() {
        let config = PollConfig::from_lookup(lookup(&[
            ("POLL_INTERVAL_SECS", "1"),
            ("POLL_MAX_ATTEMPTS", "10"),
        ]))
        .unwrap();
        assert_eq!(config.interval, Duration::from_secs(1));
        assert_eq!(config.max_attempts, 10);
    }

    #[test]
    fn zero_attempts_rejected() {
        let result = PollConfig::from_lookup(lookup(&[("POLL_MAX_ATTEMPTS", "0")]));
        assert_matches!(result, Err(CoreError::Config(_)));
    }

    #[test]
    fn malformed_number_rejected() {
        let result = PollConfig::from_lookup(lookup(&[("POLL_INTERVAL_SECS", "soon")]));
        assert_matches!(result, Err(CoreError::Config(msg)) if msg.contains("POLL_INTERVAL_SECS"));
    }

    #[test]
    fn client_config_requires_url_and_key() {
        let result = ClientConfig::from_lookup(lookup(&[("SUPABASE_URL", "https://x.supabase.co")]));
        assert_matches!(result, Err(CoreError::Config(msg)) if msg.contains("SUPABASE_ANON_KEY"));
    }

    #[test]
    fn client_config_trims_trailing_slash() {
        let config = ClientConfig::from_lookup(lookup(&[
            ("SUPABASE_URL", "https://x.supabase.co/"),
            ("SUPABASE_ANON_KEY", "anon"),
        ]))
        .unwrap();
        assert_eq!(config.supabase_url, "https://x.supabase.co");
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert_eq!(config.poll, PollConfig::default());
    }
}
