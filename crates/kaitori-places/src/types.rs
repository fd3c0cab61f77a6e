use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

/// A venue returned by nearby search, flattened for API consumers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Place {
    pub place_id: String,
    pub name: String,
    /// Short address; usually begins with the municipality name.
    pub vicinity: Option<String>,
    pub location: LatLng,
    pub types: Vec<String>,
    pub rating: Option<f64>,
    pub user_ratings_total: Option<u32>,
}

// Wire types for the `nearbysearch/json` response.

#[derive(Debug, Deserialize)]
pub(crate) struct NearbySearchResponse {
    pub status: String,
    #[serde(default)]
    pub error_message: Option<String>,
    #[serde(default)]
    pub results: Vec<PlaceResult>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PlaceResult {
    pub place_id: String,
    pub name: String,
    #[serde(default)]
    pub vicinity: Option<String>,
    pub geometry: Geometry,
    #[serde(default)]
    pub types: Vec<String>,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub user_ratings_total: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Geometry {
    pub location: LatLng,
}

impl From<PlaceResult> for Place {
    fn from(r: PlaceResult) -> Self {
        Self {
            place_id: r.place_id,
            name: r.name,
            vicinity: r.vicinity,
            location: r.geometry.location,
            types: r.types,
            rating: r.rating,
            user_ratings_total: r.user_ratings_total,
        }
    }
}
