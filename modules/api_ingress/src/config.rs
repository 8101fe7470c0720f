use serde::{de, Deserialize, Deserializer, Serialize};

/// `modules.api_ingress` section.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ApiIngressConfig {
    /// Overrides `server.host:server.port` when set.
    #[serde(default)]
    pub bind_addr: Option<String>,
    /// Browser origins allowed to call the API with credentials. `"*"` allows
    /// any origin (credentials are then disabled).
    #[serde(default = "default_cors_origins")]
    pub cors_allowed_origins: Vec<String>,
    #[serde(default = "default_cors_max_age_secs")]
    pub cors_max_age_secs: u64,
    #[serde(default = "default_body_limit_bytes")]
    pub body_limit_bytes: usize,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_true")]
    pub security_headers: bool,
    /// Take the client address from the first `X-Forwarded-For` entry.
    #[serde(default)]
    pub trust_proxy: bool,
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
    #[serde(default)]
    pub slow_down: SlowDownConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RateLimitConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_rate_window_secs", deserialize_with = "window_secs")]
    pub window_secs: u64,
    #[serde(default = "default_max_requests")]
    pub max_requests: u32,
    #[serde(default = "default_rate_message")]
    pub message: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SlowDownConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_slow_window_secs", deserialize_with = "window_secs")]
    pub window_secs: u64,
    #[serde(default = "default_delay_after")]
    pub delay_after: u32,
    #[serde(default = "default_delay_step_ms")]
    pub delay_step_ms: u64,
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
}

impl Default for ApiIngressConfig {
    fn default() -> Self {
        Self {
            bind_addr: None,
            cors_allowed_origins: default_cors_origins(),
            cors_max_age_secs: default_cors_max_age_secs(),
            body_limit_bytes: default_body_limit_bytes(),
            request_timeout_secs: default_request_timeout_secs(),
            security_headers: true,
            trust_proxy: false,
            rate_limit: RateLimitConfig::default(),
            slow_down: SlowDownConfig::default(),
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            window_secs: default_rate_window_secs(),
            max_requests: default_max_requests(),
            message: default_rate_message(),
        }
    }
}

impl Default for SlowDownConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            window_secs: default_slow_window_secs(),
            delay_after: default_delay_after(),
            delay_step_ms: default_delay_step_ms(),
            max_delay_ms: default_max_delay_ms(),
        }
    }
}

/// Windows must be at least one second long.
fn window_secs<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    match u64::deserialize(deserializer)? {
        0 => Err(de::Error::custom("window_secs must be greater than 0")),
        secs => Ok(secs),
    }
}

fn default_true() -> bool {
    true
}

fn default_cors_origins() -> Vec<String> {
    vec![
        "http://localhost:5173".to_string(),
        "http://localhost:3000".to_string(),
    ]
}

fn default_cors_max_age_secs() -> u64 {
    86_400
}

fn default_body_limit_bytes() -> usize {
    10 * 1024
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_rate_window_secs() -> u64 {
    15 * 60
}

fn default_max_requests() -> u32 {
    100
}

fn default_rate_message() -> String {
    "Too many requests from this IP, please try again after 15 minutes".to_string()
}

fn default_slow_window_secs() -> u64 {
    5 * 60
}

fn default_delay_after() -> u32 {
    10
}

fn default_delay_step_ms() -> u64 {
    200
}

fn default_max_delay_ms() -> u64 {
    5_000
}
