//! Supermarket search annotated with regional demographics and market power.

use std::collections::HashMap;

use axum::{extract::State, Extension, Json};
use futures::future::join_all;
use kaitori_core::{
    find_municipality_in_text, MarketPowerResult, Municipality, Rank, RegionDemographics,
    SiteProfile,
};
use kaitori_places::{infer_archetype, LatLng, Place};
use serde::{Deserialize, Serialize};

use crate::middleware::RequestId;

use super::{score_site, unavailable, ApiError, ApiResponse, AppState};

const PLACE_TYPE: &str = "supermarket";
const MAX_RADIUS_M: u32 = 50_000;

#[derive(Debug, Deserialize)]
pub(super) struct SearchRequest {
    pub lat: f64,
    pub lng: f64,
    pub radius: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct SupermarketResult {
    #[serde(flatten)]
    pub place: Place,
    pub municipality: Option<String>,
    pub archetype: Option<&'static str>,
    pub demographics: Option<RegionDemographics>,
    pub market_power: Option<MarketPowerResult>,
    pub rank: Option<Rank>,
}

fn validate(req_id: &str, body: &SearchRequest) -> Result<(), ApiError> {
    let invalid = |message: &str| Err(ApiError::new(req_id, "validation_error", message));
    if !(-90.0..=90.0).contains(&body.lat) {
        return invalid("lat must be between -90 and 90");
    }
    if !(-180.0..=180.0).contains(&body.lng) {
        return invalid("lng must be between -180 and 180");
    }
    if !(1..=MAX_RADIUS_M).contains(&body.radius) {
        return invalid("radius must be between 1 and 50000 metres");
    }
    Ok(())
}

/// POST /api/search-supermarkets
pub(super) async fn search_supermarkets(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<SearchRequest>,
) -> Result<Json<ApiResponse<Vec<SupermarketResult>>>, ApiError> {
    let rid = &req_id.0;
    validate(rid, &body)?;
    let places = state
        .places
        .as_ref()
        .ok_or_else(|| unavailable(rid, "place search"))?;

    let location = LatLng {
        lat: body.lat,
        lng: body.lng,
    };
    let found = places
        .nearby_search(location, body.radius, PLACE_TYPE)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "place search failed");
            ApiError::new(rid, "internal_error", "place search failed")
        })?;

    let municipalities: Vec<Option<&'static Municipality>> = found
        .iter()
        .map(|p| p.vicinity.as_deref().and_then(find_municipality_in_text))
        .collect();

    // One resolution per distinct municipality, run concurrently.
    let mut unique: Vec<&'static Municipality> = Vec::new();
    for &m in municipalities.iter().flatten() {
        if !unique.iter().any(|u| u.code == m.code) {
            unique.push(m);
        }
    }
    let resolved = join_all(unique.iter().map(|m| {
        let service = &state.demographics;
        async move {
            let full_name = m.full_name();
            match service.resolve(&full_name).await {
                Ok(record) => Some((m.code, record)),
                Err(e) => {
                    tracing::warn!(region = %full_name, error = %e, "region annotation skipped");
                    None
                }
            }
        }
    }))
    .await;
    let by_code: HashMap<&str, RegionDemographics> = resolved.into_iter().flatten().collect();

    tracing::info!(
        results = found.len(),
        regions = by_code.len(),
        "supermarket search complete"
    );

    let results = found
        .into_iter()
        .zip(municipalities)
        .map(|(place, municipality)| {
            let archetype = infer_archetype(&place.types);
            let demographics = municipality.and_then(|m| by_code.get(m.code).cloned());
            let scored = demographics.as_ref().map(|d| {
                let profile = SiteProfile {
                    archetype: archetype.map(str::to_owned),
                    ..SiteProfile::default()
                };
                score_site(&profile, d)
            });
            let (market_power, rank) = match scored {
                Some((result, rank)) => (Some(result), Some(rank)),
                None => (None, None),
            };
            SupermarketResult {
                place,
                municipality: municipality.map(Municipality::full_name),
                archetype,
                demographics,
                market_power,
                rank,
            }
        })
        .collect();

    Ok(Json(ApiResponse::new(results, req_id.0)))
}
