use cyt_auth::SessionConfig;
use cyt_database::DatabaseConfig;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    pub max_attempts: u32,
    pub window: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            window: Duration::from_secs(60),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub server_host: String,
    pub server_port: u16,
    pub database: DatabaseConfig,
    pub session: SessionConfig,
    pub login_rate_limit: RateLimitConfig,
    pub cleanup_interval: Duration,
    /// Empty means any origin.
    pub cors_allowed_origins: Vec<String>,
}

impl Config {
    pub fn from_env() -> Self {
        let defaults = RateLimitConfig::default();

        Self {
            server_host: std::env::var("SERVER_HOST")
                .unwrap_or_else(|_| "0.0.0.0".to_string()),
            server_port: env_parse("SERVER_PORT").unwrap_or(3000),
            database: DatabaseConfig::from_env(),
            session: SessionConfig::from_env(),
            login_rate_limit: RateLimitConfig {
                max_attempts: env_parse("LOGIN_RATE_LIMIT").unwrap_or(defaults.max_attempts),
                window: positive_secs(env_parse("LOGIN_RATE_WINDOW_SECS"))
                    .unwrap_or(defaults.window),
            },
            cleanup_interval: positive_secs(env_parse("SESSION_CLEANUP_INTERVAL_SECS"))
                .unwrap_or(Duration::from_secs(3600)),
            cors_allowed_origins: std::env::var("CORS_ALLOWED_ORIGINS")
                .map(|v| parse_origins(&v))
                .unwrap_or_default(),
        }
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}

/// Zero periods are rejected; `tokio::time::interval` panics on them.
fn positive_secs(secs: Option<u64>) -> Option<Duration> {
    secs.filter(|s| *s > 0).map(Duration::from_secs)
}

fn parse_origins(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|o| !o.is_empty() && *o != "*")
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_origins() {
        assert_eq!(
            parse_origins("https://cieloytierra.pe, http://localhost:5173,"),
            vec!["https://cieloytierra.pe", "http://localhost:5173"]
        );
        assert!(parse_origins("*").is_empty());
    }

    #[test]
    fn test_zero_interval_falls_back() {
        assert_eq!(positive_secs(Some(0)), None);
        assert_eq!(positive_secs(None), None);
        assert_eq!(positive_secs(Some(90)), Some(Duration::from_secs(90)));
    }

    #[test]
    fn test_rate_limit_defaults() {
        let config = RateLimitConfig::default();
        assert_eq!(config.max_attempts, 10);
        assert_eq!(config.window, Duration::from_secs(60));
    }
}
