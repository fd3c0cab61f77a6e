use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

/// Population by sex and age class, 2020 census, municipality level.
pub const DEFAULT_ESTAT_STATS_DATA_ID: &str = "0003445139";

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Every external data source is optional: an absent key disables that
/// source rather than failing startup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    // Empty strings count as unset so `.env` templates with blank keys work.
    let optional = |var: &str| -> Option<String> {
        lookup(var)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };

    let parse_addr = |var: &str, default: &str| -> Result<SocketAddr, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u32>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<usize>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    };

    let env = parse_environment(&or_default("KAITORI_ENV", "development"))?;
    let bind_addr = parse_addr("KAITORI_BIND_ADDR", "0.0.0.0:3000")?;
    let log_level = or_default("KAITORI_LOG_LEVEL", "info");
    let http_timeout_secs = parse_u64("KAITORI_HTTP_TIMEOUT_SECS", "30")?;
    let rate_limit_per_minute = parse_u32("KAITORI_RATE_LIMIT_PER_MINUTE", "120")?;

    let estat_api_key = optional("ESTAT_API_KEY");
    let estat_stats_data_id = or_default("ESTAT_STATS_DATA_ID", DEFAULT_ESTAT_STATS_DATA_ID);
    let estat_cache_ttl_secs = parse_u64("KAITORI_ESTAT_CACHE_TTL_SECS", "3600")?;
    let estat_cache_max_entries = parse_usize("KAITORI_ESTAT_CACHE_MAX_ENTRIES", "1000")?;

    let gemini_api_key = optional("GEMINI_API_KEY");
    let gemini_model = or_default("GEMINI_MODEL", "gemini-2.0-flash");

    let google_maps_api_key =
        optional("GOOGLE_MAPS_API_KEY").or_else(|| optional("VITE_GOOGLE_MAPS_API_KEY"));

    Ok(AppConfig {
        env,
        bind_addr,
        log_level,
        http_timeout_secs,
        rate_limit_per_minute,
        estat_api_key,
        estat_stats_data_id,
        estat_cache_ttl_secs,
        estat_cache_max_entries,
        gemini_api_key,
        gemini_model,
        google_maps_api_key,
    })
}

fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "KAITORI_ENV".to_string(),
            reason: format!("expected development, test or production, got '{other}'"),
        }),
    }
}
