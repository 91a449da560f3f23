use std::time::Duration;

pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8000/int/v1";
pub const DEFAULT_SOCKET_URL: &str = "ws://127.0.0.1:38000/socketcluster/";
const DEFAULT_SUBSCRIBE_TIMEOUT_SECS: u64 = 10;
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;

/// Console settings, read from `DEVCONSOLE_*` environment variables.
///
/// Unparseable values fall back to their defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub api_url: String,
    pub socket_url: String,
    pub token: Option<String>,
    pub company_id: Option<String>,
    /// Retained live viewer entries; `None` keeps everything.
    pub log_limit: Option<usize>,
    /// `None` waits for the subscription acknowledgment forever.
    pub subscribe_timeout: Option<Duration>,
    pub http_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            socket_url: DEFAULT_SOCKET_URL.to_string(),
            token: None,
            company_id: None,
            log_limit: None,
            subscribe_timeout: Some(Duration::from_secs(DEFAULT_SUBSCRIBE_TIMEOUT_SECS)),
            http_timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let subscribe_timeout = match non_empty("DEVCONSOLE_SUBSCRIBE_TIMEOUT")
            .and_then(|s| s.trim().parse::<u64>().ok())
        {
            Some(0) => None,
            Some(secs) => Some(Duration::from_secs(secs)),
            None => defaults.subscribe_timeout,
        };

        Self {
            api_url: non_empty("DEVCONSOLE_API_URL").unwrap_or(defaults.api_url),
            socket_url: non_empty("DEVCONSOLE_SOCKET_URL").unwrap_or(defaults.socket_url),
            token: non_empty("DEVCONSOLE_TOKEN"),
            company_id: non_empty("DEVCONSOLE_COMPANY_ID"),
            log_limit: non_empty("DEVCONSOLE_LOG_LIMIT")
                .and_then(|s| s.trim().parse::<usize>().ok())
                .filter(|l| *l > 0),
            subscribe_timeout,
            http_timeout: non_empty("DEVCONSOLE_HTTP_TIMEOUT")
                .and_then(|s| s.trim().parse::<u64>().ok())
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs)
                .unwrap_or(defaults.http_timeout),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_without_variables() {
        assert_eq!(config(&[]), Config::default());
    }

    #[test]
    fn reads_overrides() {
        let cfg = config(&[
            ("DEVCONSOLE_API_URL", "https://api.example.com/int/v1"),
            ("DEVCONSOLE_TOKEN", "secret"),
            ("DEVCONSOLE_LOG_LIMIT", "200"),
            ("DEVCONSOLE_SUBSCRIBE_TIMEOUT", "0"),
            ("DEVCONSOLE_HTTP_TIMEOUT", "3"),
        ]);

        assert_eq!(cfg.api_url, "https://api.example.com/int/v1");
        assert_eq!(cfg.token.as_deref(), Some("secret"));
        assert_eq!(cfg.log_limit, Some(200));
        assert_eq!(cfg.subscribe_timeout, None);
        assert_eq!(cfg.http_timeout, Duration::from_secs(3));
    }

    #[test]
    fn invalid_values_fall_back() {
        let cfg = config(&[
            ("DEVCONSOLE_LOG_LIMIT", "lots"),
            ("DEVCONSOLE_SUBSCRIBE_TIMEOUT", "-1"),
            ("DEVCONSOLE_TOKEN", "  "),
        ]);

        assert_eq!(cfg.log_limit, None);
        assert_eq!(cfg.subscribe_timeout, Some(Duration::from_secs(10)));
        assert_eq!(cfg.token, None);
    }
}
