//! HTTP client for the e-Stat `getStatsData` endpoint.
//!
//! Official data is best effort: transport failures and API-level error
//! statuses are logged and reported as "no official data" rather than
//! propagated. Only an unresolvable region name is an error.

use std::time::Duration;

use kaitori_core::{resolve_municipality, RegionDemographics, RegionMetricSource};
use reqwest::{Client, Url};
use serde_json::Value;

use crate::cache::{cache_key, TtlCache};
use crate::error::EstatError;
use crate::parse::demographics_from_payload;

const DEFAULT_BASE_URL: &str = "https://api.e-stat.go.jp/rest/3.0/app/json/";
const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(3600);
const DEFAULT_CACHE_MAX_ENTRIES: usize = 1000;

/// Provenance label attached to every official metric.
pub const SOURCE_NAME: &str = "e-Stat 政府統計の総合窓口";

/// Client for the e-Stat REST API.
///
/// Use [`EstatClient::new`] for production or [`EstatClient::with_base_url`]
/// to point at a mock server in tests.
pub struct EstatClient {
    client: Client,
    app_id: String,
    stats_data_id: String,
    base_url: Url,
    cache: TtlCache<Value>,
}

impl EstatClient {
    /// Creates a client pointed at the production e-Stat API.
    ///
    /// # Errors
    ///
    /// Returns [`EstatError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(app_id: &str, stats_data_id: &str, timeout_secs: u64) -> Result<Self, EstatError> {
        Self::with_base_url(app_id, stats_data_id, timeout_secs, DEFAULT_BASE_URL)
    }

    /// Creates a client with a custom base URL (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`EstatError::Http`] if the `reqwest::Client` cannot be built,
    /// or [`EstatError::InvalidBaseUrl`] if `base_url` does not parse.
    pub fn with_base_url(
        app_id: &str,
        stats_data_id: &str,
        timeout_secs: u64,
        base_url: &str,
    ) -> Result<Self, EstatError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("kaitori/0.1 (site-scoring)")
            .build()?;

        // Exactly one trailing slash so `join("getStatsData")` appends rather
        // than replacing the last path segment.
        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalised)
            .map_err(|e| EstatError::InvalidBaseUrl(format!("{base_url}: {e}")))?;

        Ok(Self {
            client,
            app_id: app_id.to_owned(),
            stats_data_id: stats_data_id.to_owned(),
            base_url,
            cache: TtlCache::new(DEFAULT_CACHE_TTL, DEFAULT_CACHE_MAX_ENTRIES),
        })
    }

    /// Replaces the response cache with one using the given TTL and
    /// eviction threshold.
    #[must_use]
    pub fn with_cache_policy(mut self, ttl: Duration, max_entries: usize) -> Self {
        self.cache = TtlCache::new(ttl, max_entries);
        self
    }

    /// Fetches official demographics for `region`.
    ///
    /// The returned record's `region` is the prefecture-qualified name of the
    /// matched municipality. When e-Stat is unreachable or reports an error
    /// the record is returned with no metrics set.
    ///
    /// # Errors
    ///
    /// Returns [`EstatError::Region`] if `region` does not resolve to a known
    /// municipality.
    pub async fn get_region_demographics(
        &self,
        region: &str,
    ) -> Result<RegionDemographics, EstatError> {
        let municipality = resolve_municipality(region)?;
        let full_name = municipality.full_name();

        match self.get_stats_data(&[("cdArea", municipality.code)]).await {
            Ok(payload) => {
                let source = RegionMetricSource::official(SOURCE_NAME, Some(self.dataset_url()));
                Ok(demographics_from_payload(&full_name, &payload, &source))
            }
            Err(e) => {
                tracing::warn!(
                    region = %full_name,
                    code = municipality.code,
                    error = %e,
                    "e-Stat lookup failed; continuing without official data"
                );
                Ok(RegionDemographics::new(full_name))
            }
        }
    }

    /// Calls `getStatsData` for the configured dataset, serving repeated
    /// queries from the cache.
    ///
    /// # Errors
    ///
    /// - [`EstatError::Http`] on network failure or non-2xx HTTP status.
    /// - [`EstatError::Deserialize`] if the body is not JSON.
    /// - [`EstatError::ApiError`] if `RESULT.STATUS` is non-zero.
    pub async fn get_stats_data(&self, params: &[(&str, &str)]) -> Result<Value, EstatError> {
        let key = cache_key(&self.stats_data_id, params);
        if let Some(cached) = self.cache.get(&key).await {
            tracing::debug!(key = %key, "e-Stat cache hit");
            return Ok(cached);
        }

        let url = self.build_url("getStatsData", params);
        let body = self.request_json(&url).await?;
        Self::check_api_error(&body)?;

        self.cache.insert(key, body.clone()).await;
        Ok(body)
    }

    fn dataset_url(&self) -> String {
        format!("https://www.e-stat.go.jp/dbview?sid={}", self.stats_data_id)
    }

    /// Builds the request URL; `appId` and `statsDataId` are always first.
    fn build_url(&self, endpoint: &str, extra: &[(&str, &str)]) -> Url {
        let mut url = self
            .base_url
            .join(endpoint)
            .unwrap_or_else(|_| self.base_url.clone());
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("appId", &self.app_id);
            pairs.append_pair("statsDataId", &self.stats_data_id);
            for (k, v) in extra {
                pairs.append_pair(k, v);
            }
        }
        url
    }

    async fn request_json(&self, url: &Url) -> Result<Value, EstatError> {
        tracing::debug!(endpoint = url.path(), "e-Stat request");
        let response = self.client.get(url.clone()).send().await?;
        let response = response.error_for_status()?;
        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| EstatError::Deserialize {
            context: url.path().to_string(),
            source: e,
        })
    }

    /// e-Stat reports success as `RESULT.STATUS == 0`; anything else carries
    /// an `ERROR_MSG`.
    fn check_api_error(body: &Value) -> Result<(), EstatError> {
        let status = body
            .pointer("/GET_STATS_DATA/RESULT/STATUS")
            .and_then(Value::as_i64)
            .unwrap_or(-1);
        if status != 0 {
            let message = body
                .pointer("/GET_STATS_DATA/RESULT/ERROR_MSG")
                .and_then(Value::as_str)
                .unwrap_or("missing RESULT section")
                .to_string();
            return Err(EstatError::ApiError { status, message });
        }
        Ok(())
    }
}
