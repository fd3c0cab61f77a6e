//! Demographics resolution: official statistics first, AI for the gaps.

pub mod error;
pub mod service;

pub use error::ResolverError;
pub use service::DemographicsService;
