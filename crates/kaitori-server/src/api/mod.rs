mod ai;
mod region;
mod search;

use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, HeaderName, Method, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use kaitori_core::{
    calculate_market_power, resolve_municipality, MarketPowerInput, MarketPowerResult, Rank,
    RegionDemographics, SiteProfile,
};
use kaitori_places::PlacesClient;
use kaitori_resolver::{DemographicsService, ResolverError};
use serde::Serialize;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::middleware::{
    guard_upstream_quota, request_id, QuotaGuard, RequestId, REQUEST_ID_HEADER,
};

const MAX_REGION_CHARS: usize = 100;

#[derive(Clone)]
pub struct AppState {
    pub demographics: Arc<DemographicsService>,
    pub places: Option<Arc<PlacesClient>>,
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ResponseMeta {
    pub request_id: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: ErrorBody,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct HealthData {
    status: &'static str,
    official_source: bool,
    ai_source: bool,
    places_search: bool,
}

impl ResponseMeta {
    pub(super) fn new(request_id: String) -> Self {
        Self {
            request_id,
            timestamp: Utc::now(),
        }
    }
}

impl<T: Serialize> ApiResponse<T> {
    pub(super) fn new(data: T, request_id: String) -> Self {
        Self {
            data,
            meta: ResponseMeta::new(request_id),
        }
    }
}

impl ApiError {
    pub fn new(
        request_id: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            error: ErrorBody {
                code: code.into(),
                message: message.into(),
            },
            meta: ResponseMeta::new(request_id.into()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = match self.error.code.as_str() {
            "validation_error" => StatusCode::BAD_REQUEST,
            "rate_limited" => StatusCode::TOO_MANY_REQUESTS,
            "unavailable" => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(self)).into_response()
    }
}

/// Trims `region` and checks it is 1 to 100 characters.
pub(super) fn validate_region(req_id: &str, region: &str) -> Result<String, ApiError> {
    let region = region.trim();
    if region.is_empty() || region.chars().count() > MAX_REGION_CHARS {
        return Err(ApiError::new(
            req_id,
            "validation_error",
            format!("region must be 1–{MAX_REGION_CHARS} characters"),
        ));
    }
    Ok(region.to_owned())
}

pub(super) fn unavailable(req_id: &str, what: &str) -> ApiError {
    ApiError::new(req_id, "unavailable", format!("{what} is not configured"))
}

pub(super) fn map_resolver_error(req_id: &str, error: &ResolverError) -> ApiError {
    tracing::error!(error = %error, "demographics resolution failed");
    ApiError::new(req_id, "internal_error", error.to_string())
}

/// Market power and rank for a site in the region described by
/// `demographics`.
///
/// Catchment populations need the municipality's area, so regions outside
/// the table are scored on site facts and income alone.
pub(super) fn score_site(
    profile: &SiteProfile,
    demographics: &RegionDemographics,
) -> (MarketPowerResult, Rank) {
    let input = match resolve_municipality(&demographics.region) {
        Ok(municipality) => profile.estimate(municipality, demographics),
        Err(_) => MarketPowerInput {
            archetype: profile.archetype.clone(),
            parking_size: profile.parking_size.clone(),
            parking_capacity: profile.parking_capacity,
            average_income: demographics.average_income.as_ref().map(|s| s.value),
            ..MarketPowerInput::default()
        },
    };
    let result = calculate_market_power(&input);
    let rank = result.rank();
    (result, rank)
}

fn build_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static(REQUEST_ID_HEADER),
        ])
}

/// Routes that call e-Stat, Gemini or Places share the quota guard.
fn upstream_router(quota: Option<QuotaGuard>) -> Router<AppState> {
    let router = Router::new()
        .route(
            "/api/search-supermarkets",
            post(search::search_supermarkets),
        )
        .route("/api/region-info", post(region::region_info))
        .route("/api/ai-region-analysis", post(ai::ai_region_analysis))
        .route(
            "/api/ai-store-recommendations",
            post(ai::ai_store_recommendations),
        );
    match quota {
        Some(guard) => router.layer(axum::middleware::from_fn_with_state(
            guard,
            guard_upstream_quota,
        )),
        None => router,
    }
}

pub fn build_app(state: AppState, quota: Option<QuotaGuard>) -> Router {
    let local_routes = Router::new()
        .route("/api/v1/health", get(health))
        .route("/api/market-power", post(region::market_power));

    Router::new()
        .merge(local_routes)
        .merge(upstream_router(quota))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(build_cors())
                .layer(axum::middleware::from_fn(request_id)),
        )
        .with_state(state)
}

async fn health(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> impl IntoResponse {
    Json(ApiResponse::new(
        HealthData {
            status: "ok",
            official_source: state.demographics.official_enabled(),
            ai_source: state.demographics.gemini().is_some(),
            places_search: state.places.is_some(),
        },
        req_id.0,
    ))
}
