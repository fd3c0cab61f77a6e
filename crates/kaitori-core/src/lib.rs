//! Shared domain types for the buyback-event site scoring service.
//!
//! Holds application config, the region demographics model and its merge
//! rules, the static municipality table, and the pure market-power / rank
//! calculator. Nothing in this crate performs I/O beyond reading env vars.

pub mod app_config;
pub mod config;
pub mod demographics;
pub mod market_power;
pub mod municipality;
pub mod rank;

use thiserror::Error;

pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env};
pub use demographics::{
    AgeBucket, DemographicField, GenderRatio, RegionDemographics, RegionMetricSource, SourceType,
    Sourced, AGE_BUCKET_LABELS,
};
pub use market_power::{
    calculate_market_power, BreakdownItem, MarketPowerInput, MarketPowerResult, SiteProfile,
};
pub use municipality::{find_municipality_in_text, resolve_municipality, Municipality};
pub use rank::{rank_from_score, Rank};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CoreError {
    #[error("unknown region: {0}")]
    UnknownRegion(String),
}
