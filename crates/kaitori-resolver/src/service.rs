//! Demographics orchestration across the official and AI sources.

use std::time::Duration;

use kaitori_core::{resolve_municipality, AppConfig, RegionDemographics};
use kaitori_estat::EstatClient;
use kaitori_gemini::{enrich_demographics, estimate_demographics, GeminiClient};

use crate::error::ResolverError;

/// Resolves a region name to a [`RegionDemographics`] record.
///
/// Either source may be absent; an absent source is skipped.
pub struct DemographicsService {
    estat: Option<EstatClient>,
    gemini: Option<GeminiClient>,
}

impl DemographicsService {
    #[must_use]
    pub fn new(estat: Option<EstatClient>, gemini: Option<GeminiClient>) -> Self {
        Self { estat, gemini }
    }

    /// Builds whichever clients have credentials in `config`.
    ///
    /// # Errors
    ///
    /// Returns [`ResolverError`] if a configured client cannot be built.
    pub fn from_config(config: &AppConfig) -> Result<Self, ResolverError> {
        let timeout = config.http_timeout_secs;

        let estat = config
            .estat_api_key
            .as_deref()
            .map(|key| {
                EstatClient::new(key, &config.estat_stats_data_id, timeout).map(|client| {
                    client.with_cache_policy(
                        Duration::from_secs(config.estat_cache_ttl_secs),
                        config.estat_cache_max_entries,
                    )
                })
            })
            .transpose()?;

        let gemini = config
            .gemini_api_key
            .as_deref()
            .map(|key| GeminiClient::new(key, &config.gemini_model, timeout))
            .transpose()?;

        tracing::info!(
            official = estat.is_some(),
            ai = gemini.is_some(),
            "demographic sources configured"
        );
        Ok(Self::new(estat, gemini))
    }

    #[must_use]
    pub fn official_enabled(&self) -> bool {
        self.estat.is_some()
    }

    /// The AI client, shared with the narrative endpoints.
    #[must_use]
    pub fn gemini(&self) -> Option<&GeminiClient> {
        self.gemini.as_ref()
    }

    /// Runs the pipeline for `region`.
    ///
    /// 1. Official lookup, when e-Stat is configured.
    /// 2. If that produced no metrics, a full AI estimate.
    /// 3. Otherwise AI enrichment of the supplementary metrics.
    ///
    /// Steps 2 and 3 run only when Gemini is configured. Official values are
    /// never overwritten.
    ///
    /// # Errors
    ///
    /// Returns [`ResolverError::Estat`] when e-Stat is configured and `region`
    /// is not a known municipality. Upstream outages degrade instead.
    pub async fn resolve(&self, region: &str) -> Result<RegionDemographics, ResolverError> {
        let official = match &self.estat {
            Some(estat) => estat.get_region_demographics(region).await?,
            None => {
                let name = resolve_municipality(region)
                    .map_or_else(|_| region.to_string(), |m| m.full_name());
                RegionDemographics::new(name)
            }
        };

        let Some(gemini) = &self.gemini else {
            return Ok(official);
        };

        if official.has_any_data() {
            Ok(enrich_demographics(gemini, official).await)
        } else {
            tracing::info!(region = %official.region, "no official data; using AI estimate");
            Ok(estimate_demographics(gemini, &official.region).await)
        }
    }
}
