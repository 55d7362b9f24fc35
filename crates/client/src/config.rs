use std::time::Duration;

#[derive(Debug, Clone)]
pub struct AgentConfig {
    pub base_url: String,
    /// Time between keepalive verifications.
    pub poll_interval: Duration,
    /// Bound on each keepalive verify call.
    pub verify_timeout: Duration,
    /// Bound on the single verify made when a protected view loads.
    pub initial_check_timeout: Duration,
    /// Bound on login and logout calls.
    pub request_timeout: Duration,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000".to_string(),
            poll_interval: Duration::from_secs(30),
            verify_timeout: Duration::from_secs(5),
            initial_check_timeout: Duration::from_secs(4),
            request_timeout: Duration::from_secs(10),
        }
    }
}

impl AgentConfig {
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            ..Default::default()
        }
    }
}
