//! Server configuration.
//!
//! All configuration is loaded from environment variables. Every value
//! has a default, so a bare `heartbeat-server` listens on `0.0.0.0:8080`
//! and emits one event every 2 seconds for at most 10 minutes per client.

use std::str::FromStr;
use std::time::Duration;

use heartbeat_core::EmitterConfig;

use crate::error::ConfigError;

/// Output format of the log subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Text,
    /// One JSON object per line.
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("text") {
            Ok(Self::Text)
        } else if s.eq_ignore_ascii_case("json") {
            Ok(Self::Json)
        } else {
            Err(format!("expected `text` or `json`, got `{s}`"))
        }
    }
}

/// Complete server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// The host address to bind to (e.g. `0.0.0.0`).
    pub host: String,
    /// The TCP port to listen on.
    pub port: u16,
    /// Timing of each heartbeat stream.
    pub emitter: EmitterConfig,
    /// Log output format.
    pub log_format: LogFormat,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: String::from("0.0.0.0"),
            port: 8080,
            emitter: EmitterConfig::default(),
            log_format: LogFormat::default(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// Optional variables:
    /// - `HEARTBEAT_HOST` -- bind host (default `0.0.0.0`)
    /// - `HEARTBEAT_PORT` -- bind port (default 8080)
    /// - `HEARTBEAT_INTERVAL_MS` -- time between events (default 2000)
    /// - `HEARTBEAT_MAX_DURATION_SECS` -- per-connection ceiling (default 600)
    /// - `HEARTBEAT_LOG_FORMAT` -- `text` or `json` (default `text`)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let host = lookup("HEARTBEAT_HOST").unwrap_or(defaults.host);
        let port = parse_or(&lookup, "HEARTBEAT_PORT", defaults.port)?;

        let interval_ms = parse_or(
            &lookup,
            "HEARTBEAT_INTERVAL_MS",
            duration_millis(defaults.emitter.interval),
        )?;
        let max_duration_secs = parse_or(
            &lookup,
            "HEARTBEAT_MAX_DURATION_SECS",
            defaults.emitter.max_duration.as_secs(),
        )?;

        let emitter = EmitterConfig {
            interval: Duration::from_millis(interval_ms),
            max_duration: Duration::from_secs(max_duration_secs),
        };
        emitter.validate()?;

        let log_format = parse_or(&lookup, "HEARTBEAT_LOG_FORMAT", defaults.log_format)?;

        Ok(Self {
            host,
            port,
            emitter,
            log_format,
        })
    }

    /// The `host:port` string the server binds to.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Parse an optional variable, falling back to `default` when unset.
fn parse_or<F, T>(lookup: &F, name: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    lookup(name).map_or(Ok(default), |raw| {
        raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            name,
            reason: e.to_string(),
        })
    })
}

fn duration_millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        move |name: &str| map.get(name).cloned()
    }

    #[test]
    fn defaults_when_nothing_set() {
        let config = ServerConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 8080);
        assert_eq!(config.emitter.interval, Duration::from_secs(2));
        assert_eq!(config.emitter.max_duration, Duration::from_secs(600));
        assert_eq!(config.bind_address(), "0.0.0.0:8080");
        assert_eq!(config.log_format, LogFormat::Text);
    }

    #[test]
    fn overrides_are_applied() {
        let config = ServerConfig::from_lookup(lookup_from(&[
            ("HEARTBEAT_HOST", "127.0.0.1"),
            ("HEARTBEAT_PORT", "9000"),
            ("HEARTBEAT_INTERVAL_MS", "250"),
            ("HEARTBEAT_MAX_DURATION_SECS", " 30 "),
            ("HEARTBEAT_LOG_FORMAT", "JSON"),
        ]))
        .unwrap();
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.bind_address(), "127.0.0.1:9000");
        assert_eq!(config.emitter.interval, Duration::from_millis(250));
        assert_eq!(config.emitter.max_duration, Duration::from_secs(30));
    }

    #[test]
    fn unparsable_port_rejected() {
        let err = ServerConfig::from_lookup(lookup_from(&[("HEARTBEAT_PORT", "eighty")]))
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                name: "HEARTBEAT_PORT",
                ..
            }
        ));
    }

    #[test]
    fn zero_interval_rejected() {
        let err = ServerConfig::from_lookup(lookup_from(&[("HEARTBEAT_INTERVAL_MS", "0")]))
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Emitter {
                source: heartbeat_core::ConfigError::ZeroInterval
            }
        ));
    }

    #[test]
    fn zero_ceiling_rejected() {
        let err =
            ServerConfig::from_lookup(lookup_from(&[("HEARTBEAT_MAX_DURATION_SECS", "0")]))
                .unwrap_err();
        assert!(matches!(err, ConfigError::Emitter { .. }));
    }

    #[test]
    fn ceiling_beyond_limit_rejected() {
        let err = ServerConfig::from_lookup(lookup_from(&[(
            "HEARTBEAT_MAX_DURATION_SECS",
            "18446744073709551615",
        )]))
        .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Emitter {
                source: heartbeat_core::ConfigError::MaxDurationTooLong { .. }
            }
        ));
    }

    #[test]
    fn unknown_log_format_rejected() {
        let err = ServerConfig::from_lookup(lookup_from(&[("HEARTBEAT_LOG_FORMAT", "yaml")]))
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                name: "HEARTBEAT_LOG_FORMAT",
                ..
            }
        ));
    }
}
