use axum::{extract::State, Extension, Json};
use kaitori_core::{
    calculate_market_power, MarketPowerInput, MarketPowerResult, Rank, RegionDemographics,
};
use serde::{Deserialize, Serialize};

use crate::middleware::RequestId;

use super::{map_resolver_error, validate_region, ApiError, ApiResponse, AppState};

#[derive(Debug, Deserialize)]
pub(super) struct RegionRequest {
    pub region: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct MarketPowerResponse {
    #[serde(flatten)]
    pub result: MarketPowerResult,
    pub rank: Rank,
}

/// POST /api/region-info
pub(super) async fn region_info(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<RegionRequest>,
) -> Result<Json<ApiResponse<RegionDemographics>>, ApiError> {
    let region = validate_region(&req_id.0, &body.region)?;
    let demographics = state
        .demographics
        .resolve(&region)
        .await
        .map_err(|e| map_resolver_error(&req_id.0, &e))?;
    Ok(Json(ApiResponse::new(demographics, req_id.0)))
}

/// POST /api/market-power
pub(super) async fn market_power(
    Extension(req_id): Extension<RequestId>,
    Json(input): Json<MarketPowerInput>,
) -> Json<ApiResponse<MarketPowerResponse>> {
    let result = calculate_market_power(&input);
    let rank = result.rank();
    Json(ApiResponse::new(MarketPowerResponse { result, rank }, req_id.0))
}
