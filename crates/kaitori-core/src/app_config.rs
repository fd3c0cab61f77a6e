use std::net::SocketAddr;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    pub http_timeout_secs: u64,
    /// Requests per minute accepted on routes that call upstream APIs; 0 disables the limit.
    pub rate_limit_per_minute: u32,
    pub estat_api_key: Option<String>,
    pub estat_stats_data_id: String,
    pub estat_cache_ttl_secs: u64,
    pub estat_cache_max_entries: usize,
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub google_maps_api_key: Option<String>,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("http_timeout_secs", &self.http_timeout_secs)
            .field("rate_limit_per_minute", &self.rate_limit_per_minute)
            .field(
                "estat_api_key",
                &self.estat_api_key.as_ref().map(|_| "[redacted]"),
            )
            .field("estat_stats_data_id", &self.estat_stats_data_id)
            .field("estat_cache_ttl_secs", &self.estat_cache_ttl_secs)
            .field("estat_cache_max_entries", &self.estat_cache_max_entries)
            .field(
                "gemini_api_key",
                &self.gemini_api_key.as_ref().map(|_| "[redacted]"),
            )
            .field("gemini_model", &self.gemini_model)
            .field(
                "google_maps_api_key",
                &self.google_maps_api_key.as_ref().map(|_| "[redacted]"),
            )
            .finish()
    }
}
