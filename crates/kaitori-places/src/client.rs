use std::time::Duration;

use reqwest::{Client, Url};

use crate::error::PlacesError;
use crate::types::{LatLng, NearbySearchResponse, Place};

const DEFAULT_BASE_URL: &str = "https://maps.googleapis.com/maps/api/place/";

/// Client for the Places `nearbysearch` endpoint.
pub struct PlacesClient {
    client: Client,
    api_key: String,
    base_url: Url,
}

impl PlacesClient {
    /// Creates a client pointed at the production Places API.
    ///
    /// # Errors
    ///
    /// Returns [`PlacesError::Http`] if the `reqwest::Client` cannot be built.
    pub fn new(api_key: &str, timeout_secs: u64) -> Result<Self, PlacesError> {
        Self::with_base_url(api_key, timeout_secs, DEFAULT_BASE_URL)
    }

    /// Creates a client with a custom base URL (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`PlacesError::Http`] if the `reqwest::Client` cannot be built,
    /// or [`PlacesError::InvalidBaseUrl`] if `base_url` does not parse.
    pub fn with_base_url(
        api_key: &str,
        timeout_secs: u64,
        base_url: &str,
    ) -> Result<Self, PlacesError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("kaitori/0.1 (site-scoring)")
            .build()?;

        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalised)
            .map_err(|e| PlacesError::InvalidBaseUrl(format!("{base_url}: {e}")))?;

        Ok(Self {
            client,
            api_key: api_key.to_owned(),
            base_url,
        })
    }

    /// Lists venues of `place_type` within `radius_m` metres of `location`.
    ///
    /// Results come back in Japanese. `ZERO_RESULTS` is an empty list.
    ///
    /// # Errors
    ///
    /// - [`PlacesError::Http`] on network failure or non-2xx HTTP status.
    /// - [`PlacesError::Deserialize`] if the body does not match the schema.
    /// - [`PlacesError::ApiError`] for any status other than `OK` or
    ///   `ZERO_RESULTS`.
    pub async fn nearby_search(
        &self,
        location: LatLng,
        radius_m: u32,
        place_type: &str,
    ) -> Result<Vec<Place>, PlacesError> {
        let url = self.build_url(location, radius_m, place_type);
        tracing::debug!(
            lat = location.lat,
            lng = location.lng,
            radius_m,
            place_type,
            "Places nearby search"
        );

        let response = self.client.get(url).send().await?.error_for_status()?;
        let body = response.text().await?;
        let parsed: NearbySearchResponse =
            serde_json::from_str(&body).map_err(|e| PlacesError::Deserialize {
                context: "nearbysearch response".to_string(),
                source: e,
            })?;

        match parsed.status.as_str() {
            "OK" | "ZERO_RESULTS" => Ok(parsed.results.into_iter().map(Place::from).collect()),
            _ => Err(PlacesError::ApiError {
                message: parsed.error_message.unwrap_or_default(),
                status: parsed.status,
            }),
        }
    }

    fn build_url(&self, location: LatLng, radius_m: u32, place_type: &str) -> Url {
        let mut url = self
            .base_url
            .join("nearbysearch/json")
            .unwrap_or_else(|_| self.base_url.clone());
        url.query_pairs_mut()
            .append_pair("location", &format!("{},{}", location.lat, location.lng))
            .append_pair("radius", &radius_m.to_string())
            .append_pair("type", place_type)
            .append_pair("language", "ja")
            .append_pair("key", &self.api_key);
        url
    }
}
