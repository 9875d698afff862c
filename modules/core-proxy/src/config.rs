//! Core proxy module configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

/// Configuration errors detected before the gateway starts serving.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("core_base_url '{value}' is not a valid absolute URL: {source}")]
    InvalidBaseUrl {
        value: String,
        #[source]
        source: url::ParseError,
    },
    #[error("core_base_url must use http or https, got '{scheme}'")]
    UnsupportedScheme { scheme: String },
    #[error("api_prefix must start with '/' and not be '/' alone, got '{value}'")]
    InvalidApiPrefix { value: String },
    #[error("{field} must be greater than zero")]
    ZeroValue { field: &'static str },
}

/// Core proxy module configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct CoreProxyConfig {
    // === Core service ===
    /// Base URL of the core service; resolved paths are appended to it.
    pub core_base_url: String,
    /// Prefix under which the gateway operations are served.
    pub api_prefix: String,

    // === Timeout Defaults ===
    /// Connection timeout towards the core service in milliseconds.
    pub connect_timeout_ms: u64,
    /// Total timeout of one forward call in milliseconds.
    pub request_timeout_ms: u64,

    // === Sessions ===
    pub session_cookie_name: String,
    /// Idle lifetime of a session in seconds.
    pub session_ttl_sec: u64,

    // === Audit Logging ===
    /// Upper bound on time spent persisting one audit record.
    pub audit_max_latency_ms: u64,
    /// Bodies larger than this are truncated in the audit record.
    pub audit_max_body_bytes: usize,
    /// Serve `GET {api_prefix}/admin/logs`.
    pub audit_admin_enabled: bool,
}

impl Default for CoreProxyConfig {
    fn default() -> Self {
        Self {
            core_base_url: "http://127.0.0.1:8000/api/v1".to_owned(),
            api_prefix: "/api/v1".to_owned(),

            connect_timeout_ms: 5_000,
            request_timeout_ms: 30_000,

            session_cookie_name: "sessionid".to_owned(),
            session_ttl_sec: 1_209_600, // two weeks

            audit_max_latency_ms: 500,
            audit_max_body_bytes: 65_536, // 64 KiB
            audit_admin_enabled: false,
        }
    }
}

impl CoreProxyConfig {
    /// Validate the configuration and return the parsed core base URL.
    ///
    /// # Errors
    /// Returns `ConfigError` when the base URL, prefix or a limit is unusable.
    pub fn validate(&self) -> Result<Url, ConfigError> {
        let url = Url::parse(&self.core_base_url).map_err(|source| ConfigError::InvalidBaseUrl {
            value: self.core_base_url.clone(),
            source,
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::UnsupportedScheme {
                scheme: url.scheme().to_owned(),
            });
        }

        if !self.api_prefix.starts_with('/') || self.api_prefix.trim_end_matches('/').is_empty() {
            return Err(ConfigError::InvalidApiPrefix {
                value: self.api_prefix.clone(),
            });
        }

        for (field, value) in [
            ("connect_timeout_ms", self.connect_timeout_ms),
            ("request_timeout_ms", self.request_timeout_ms),
            ("session_ttl_sec", self.session_ttl_sec),
            ("audit_max_latency_ms", self.audit_max_latency_ms),
        ] {
            if value == 0 {
                return Err(ConfigError::ZeroValue { field });
            }
        }

        Ok(url)
    }

    /// The API prefix without a trailing slash, e.g. `/api/v1`.
    #[must_use]
    pub fn normalized_prefix(&self) -> &str {
        self.api_prefix.trim_end_matches('/')
    }

    #[must_use]
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    #[must_use]
    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session_ttl_sec)
    }

    #[must_use]
    pub fn audit_max_latency(&self) -> Duration {
        Duration::from_millis(self.audit_max_latency_ms)
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let cfg = CoreProxyConfig::default();
        let url = cfg.validate().unwrap();
        assert_eq!(url.host_str(), Some("127.0.0.1"));
        assert_eq!(cfg.normalized_prefix(), "/api/v1");
    }

    #[test]
    fn rejects_relative_base_url() {
        let cfg = CoreProxyConfig {
            core_base_url: "core.internal/api".to_owned(),
            ..Default::default()
        };
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::InvalidBaseUrl { .. })
        ));
    }

    #[test]
    fn rejects_non_http_scheme() {
        let cfg = CoreProxyConfig {
            core_base_url: "ftp://core.internal/".to_owned(),
            ..Default::default()
        };
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::UnsupportedScheme { .. })
        ));
    }

    #[test]
    fn rejects_bare_slash_prefix() {
        let cfg = CoreProxyConfig {
            api_prefix: "/".to_owned(),
            ..Default::default()
        };
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::InvalidApiPrefix { .. })
        ));
    }

    #[test]
    fn rejects_zero_timeout() {
        let cfg = CoreProxyConfig {
            request_timeout_ms: 0,
            ..Default::default()
        };
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::ZeroValue {
                field: "request_timeout_ms"
            })
        ));
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let raw = serde_json::json!({ "core_base_url": "http://x", "retries": 3 });
        assert!(serde_json::from_value::<CoreProxyConfig>(raw).is_err());
    }

    #[test]
    fn partial_config_keeps_defaults() {
        let raw = serde_json::json!({ "core_base_url": "https://core.example.com/api" });
        let cfg: CoreProxyConfig = serde_json::from_value(raw).unwrap();
        assert_eq!(cfg.core_base_url, "https://core.example.com/api");
        assert_eq!(cfg.request_timeout_ms, 30_000);
        assert_eq!(cfg.session_cookie_name, "sessionid");
    }
}
