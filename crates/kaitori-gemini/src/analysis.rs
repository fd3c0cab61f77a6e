//! Narrative outputs: regional market analysis and candidate-site commentary.

use kaitori_core::{Rank, RegionDemographics};
use serde::{Deserialize, Serialize};

use crate::client::GeminiClient;
use crate::error::GeminiError;
use crate::prompt::{region_analysis_prompt, store_commentary_prompt};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegionAnalysis {
    pub summary: String,
    #[serde(default)]
    pub strengths: Vec<String>,
    #[serde(default)]
    pub concerns: Vec<String>,
    #[serde(default)]
    pub recommended_categories: Vec<String>,
}

/// A scored candidate site as presented to the model.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateSummary {
    pub name: String,
    pub archetype: Option<String>,
    pub score: f64,
    pub rank: Rank,
}

#[derive(Debug, Deserialize)]
struct Commentary {
    commentary: String,
}

/// Asks the model for a buyback-market reading of `demographics`.
///
/// # Errors
///
/// Any [`GeminiError`] from the request, or [`GeminiError::Deserialize`] if
/// the reply lacks a `summary`.
pub async fn analyze_region(
    client: &GeminiClient,
    demographics: &RegionDemographics,
) -> Result<RegionAnalysis, GeminiError> {
    let prompt = region_analysis_prompt(demographics);
    client.generate_json(&prompt, "region analysis").await
}

/// Asks the model to comment on candidates already sorted by score.
///
/// # Errors
///
/// Any [`GeminiError`] from the request, or [`GeminiError::EmptyResponse`]
/// when the commentary is blank.
pub async fn recommend_stores(
    client: &GeminiClient,
    region: &str,
    candidates: &[CandidateSummary],
) -> Result<String, GeminiError> {
    let prompt = store_commentary_prompt(region, candidates);
    let reply: Commentary = client.generate_json(&prompt, "store commentary").await?;
    let text = reply.commentary.trim();
    if text.is_empty() {
        return Err(GeminiError::EmptyResponse);
    }
    Ok(text.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn analysis_tolerates_missing_lists() {
        let analysis: RegionAnalysis =
            serde_json::from_str(r#"{"summary": "高齢女性が多い住宅地"}"#).expect("parse");
        assert_eq!(analysis.summary, "高齢女性が多い住宅地");
        assert!(analysis.strengths.is_empty());
        assert!(analysis.recommended_categories.is_empty());
    }

    #[test]
    fn analysis_serializes_camel_case() {
        let analysis = RegionAnalysis {
            summary: "s".into(),
            strengths: vec![],
            concerns: vec![],
            recommended_categories: vec!["着物".into()],
        };
        let value = serde_json::to_value(&analysis).expect("serialize");
        assert_eq!(value["recommendedCategories"][0], "着物");
    }
}
