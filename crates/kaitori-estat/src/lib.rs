//! Client for the e-Stat (政府統計の総合窓口) statistics API.
//!
//! Resolves a region name to a municipality code, fetches census population
//! by sex and age class via `getStatsData`, and turns the categorical value
//! array into a partial [`kaitori_core::RegionDemographics`] tagged as
//! official data. Responses are cached in-process with a TTL.

mod cache;
pub mod client;
pub mod error;
pub mod parse;

pub use client::{EstatClient, SOURCE_NAME};
pub use error::EstatError;
pub use parse::demographics_from_payload;
