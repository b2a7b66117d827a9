//! Environment-driven service configuration

use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),

    #[error("invalid value for {name}: {value}")]
    Invalid { name: &'static str, value: String },
}

/// Service configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// HMAC secret for signing bearer tokens. Env var: `JWT_SECRET`.
    pub jwt_secret: String,
    /// Host name or IP to bind (default `0.0.0.0`). Env var: `BIND_ADDR`.
    pub bind_addr: String,
    /// TCP port to listen on (default 5000). Env var: `PORT`.
    pub port: u16,
    /// Emit JSON log lines instead of the human format. Env var: `LOG_FORMAT=json`.
    pub json_logs: bool,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let jwt_secret = lookup("JWT_SECRET")
            .filter(|s| !s.trim().is_empty())
            .ok_or(ConfigError::Missing("JWT_SECRET"))?;

        let port = match lookup("PORT") {
            Some(raw) => raw.parse().map_err(|_| ConfigError::Invalid {
                name: "PORT",
                value: raw,
            })?,
            None => 5000,
        };

        Ok(Self {
            jwt_secret,
            bind_addr: lookup("BIND_ADDR").unwrap_or_else(|| "0.0.0.0".to_string()),
            port,
            json_logs: lookup("LOG_FORMAT").is_some_and(|f| f.eq_ignore_ascii_case("json")),
        })
    }

    /// Host and port for `TcpListener::bind`, which resolves host names.
    pub fn listen_on(&self) -> (&str, u16) {
        (self.bind_addr.as_str(), self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn secret_is_required() {
        assert_eq!(load(&[]).unwrap_err(), ConfigError::Missing("JWT_SECRET"));
        assert_eq!(
            load(&[("JWT_SECRET", "  ")]).unwrap_err(),
            ConfigError::Missing("JWT_SECRET")
        );
    }

    #[test]
    fn defaults_apply() {
        let config = load(&[("JWT_SECRET", "s3cret")]).unwrap();
        assert_eq!(config.port, 5000);
        assert_eq!(config.bind_addr, "0.0.0.0");
        assert!(!config.json_logs);
        assert_eq!(config.listen_on(), ("0.0.0.0", 5000));
    }

    #[test]
    fn bind_addr_may_be_a_host_name() {
        let config = load(&[("JWT_SECRET", "s3cret"), ("BIND_ADDR", "localhost")]).unwrap();
        assert_eq!(config.listen_on(), ("localhost", 5000));
    }

    #[tokio::test]
    async fn host_name_resolves_when_binding() {
        let config = load(&[
            ("JWT_SECRET", "s3cret"),
            ("BIND_ADDR", "localhost"),
            ("PORT", "0"),
        ])
        .unwrap();
        let listener = tokio::net::TcpListener::bind(config.listen_on()).await.unwrap();
        assert!(listener.local_addr().unwrap().ip().is_loopback());
    }

    #[test]
    fn bad_port_is_rejected() {
        let err = load(&[("JWT_SECRET", "s3cret"), ("PORT", "http")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: "PORT", .. }));
    }

    #[test]
    fn json_logs_flag() {
        let config = load(&[("JWT_SECRET", "s3cret"), ("LOG_FORMAT", "JSON")]).unwrap();
        assert!(config.json_logs);
    }
}
