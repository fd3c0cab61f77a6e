//! Gemini-backed estimation for regions the census cannot describe, plus the
//! narrative analysis endpoints.

pub mod analysis;
pub mod client;
pub mod demographics;
pub mod error;
pub mod prompt;
pub mod util;

pub use analysis::{analyze_region, recommend_stores, CandidateSummary, RegionAnalysis};
pub use client::GeminiClient;
pub use demographics::{enrich_demographics, estimate_demographics, DEFAULT_SOURCE_NAME};
pub use error::GeminiError;
pub use util::strip_code_fences;
