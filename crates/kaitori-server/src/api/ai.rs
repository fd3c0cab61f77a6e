//! AI narrative endpoints built on the demographics pipeline.

use axum::{extract::State, Extension, Json};
use kaitori_core::{MarketPowerResult, Rank, RegionDemographics, SiteProfile};
use kaitori_gemini::{analyze_region, recommend_stores, CandidateSummary, RegionAnalysis};
use serde::{Deserialize, Serialize};

use crate::middleware::RequestId;

use super::{
    map_resolver_error, score_site, unavailable, validate_region, ApiError, ApiResponse, AppState,
};

const MAX_CANDIDATES: usize = 50;

#[derive(Debug, Deserialize)]
pub(super) struct AnalysisRequest {
    pub region: String,
}

#[derive(Debug, Serialize)]
pub(super) struct AnalysisResponse {
    pub demographics: RegionDemographics,
    pub analysis: RegionAnalysis,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct CandidateSite {
    pub name: String,
    #[serde(flatten)]
    pub profile: SiteProfile,
}

#[derive(Debug, Deserialize)]
pub(super) struct RecommendationRequest {
    pub region: String,
    pub candidates: Vec<CandidateSite>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct ScoredCandidate {
    pub name: String,
    #[serde(flatten)]
    pub profile: SiteProfile,
    pub market_power: MarketPowerResult,
    pub rank: Rank,
}

#[derive(Debug, Serialize)]
pub(super) struct RecommendationResponse {
    pub demographics: RegionDemographics,
    pub recommendations: Vec<ScoredCandidate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub commentary: Option<String>,
}

/// POST /api/ai-region-analysis
pub(super) async fn ai_region_analysis(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<AnalysisRequest>,
) -> Result<Json<ApiResponse<AnalysisResponse>>, ApiError> {
    let rid = &req_id.0;
    let region = validate_region(rid, &body.region)?;
    let gemini = state
        .demographics
        .gemini()
        .ok_or_else(|| unavailable(rid, "AI analysis"))?;

    let demographics = state
        .demographics
        .resolve(&region)
        .await
        .map_err(|e| map_resolver_error(rid, &e))?;

    let analysis = analyze_region(gemini, &demographics).await.map_err(|e| {
        tracing::error!(region = %demographics.region, error = %e, "AI region analysis failed");
        ApiError::new(rid, "internal_error", "AI analysis failed")
    })?;

    Ok(Json(ApiResponse::new(
        AnalysisResponse {
            demographics,
            analysis,
        },
        req_id.0,
    )))
}

/// POST /api/ai-store-recommendations
///
/// Candidates come back sorted by score, highest first. Commentary is
/// omitted when the AI call fails.
pub(super) async fn ai_store_recommendations(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<RecommendationRequest>,
) -> Result<Json<ApiResponse<RecommendationResponse>>, ApiError> {
    let rid = &req_id.0;
    let region = validate_region(rid, &body.region)?;
    if body.candidates.is_empty() || body.candidates.len() > MAX_CANDIDATES {
        return Err(ApiError::new(
            rid,
            "validation_error",
            format!("candidates must contain 1–{MAX_CANDIDATES} sites"),
        ));
    }
    let gemini = state
        .demographics
        .gemini()
        .ok_or_else(|| unavailable(rid, "AI recommendations"))?;

    let demographics = state
        .demographics
        .resolve(&region)
        .await
        .map_err(|e| map_resolver_error(rid, &e))?;

    let mut recommendations: Vec<ScoredCandidate> = body
        .candidates
        .into_iter()
        .map(|c| {
            let (market_power, rank) = score_site(&c.profile, &demographics);
            ScoredCandidate {
                name: c.name,
                profile: c.profile,
                market_power,
                rank,
            }
        })
        .collect();
    recommendations.sort_by(|a, b| b.market_power.score.total_cmp(&a.market_power.score));

    let summaries: Vec<CandidateSummary> = recommendations
        .iter()
        .map(|c| CandidateSummary {
            name: c.name.clone(),
            archetype: c.profile.archetype.clone(),
            score: c.market_power.score,
            rank: c.rank,
        })
        .collect();
    let commentary = match recommend_stores(gemini, &demographics.region, &summaries).await {
        Ok(text) => Some(text),
        Err(e) => {
            tracing::warn!(region = %demographics.region, error = %e, "AI commentary omitted");
            None
        }
    };

    Ok(Json(ApiResponse::new(
        RecommendationResponse {
            demographics,
            recommendations,
            commentary,
        },
        req_id.0,
    )))
}
