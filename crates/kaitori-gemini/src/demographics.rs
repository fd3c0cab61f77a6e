//! AI-estimated demographics: full fallback estimates and gap-filling
//! enrichment of official records.
//!
//! Both entry points are infallible from the caller's view. Any failure is
//! logged and the caller gets back the least-informed valid record: the bare
//! region for a fallback, the untouched input for enrichment.

use kaitori_core::{
    AgeBucket, DemographicField, GenderRatio, RegionDemographics, RegionMetricSource, Sourced,
};
use serde::Deserialize;

use crate::client::GeminiClient;
use crate::error::GeminiError;
use crate::prompt::{enrichment_prompt, estimate_prompt};

/// Source name used when the model cites nothing.
pub const DEFAULT_SOURCE_NAME: &str = "Gemini AI推定";

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AiDemographics {
    average_age: Option<f64>,
    age_distribution: Option<Vec<AgeBucket>>,
    gender_ratio: Option<GenderRatio>,
    average_income: Option<f64>,
    foreigner_ratio: Option<f64>,
    population: Option<f64>,
    #[serde(default)]
    sources: Vec<Citation>,
}

#[derive(Debug, Deserialize)]
struct Citation {
    name: Option<String>,
    url: Option<String>,
}

fn non_blank(value: Option<&String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty()).cloned()
}

impl AiDemographics {
    /// Provenance from the first citation, if any.
    fn source(&self) -> RegionMetricSource {
        let first = self.sources.first();
        let name = non_blank(first.and_then(|c| c.name.as_ref()))
            .unwrap_or_else(|| DEFAULT_SOURCE_NAME.to_string());
        let url = non_blank(first.and_then(|c| c.url.as_ref()));
        RegionMetricSource::ai_estimated(name, url)
    }

    /// Maps the requested `fields` onto a record; everything else is dropped.
    fn into_record(self, region: &str, fields: &[DemographicField]) -> RegionDemographics {
        let source = self.source();
        let wanted = |f: DemographicField| fields.contains(&f);
        let finite = |v: f64| v.is_finite().then_some(v);
        let mut record = RegionDemographics::new(region);

        if wanted(DemographicField::AverageAge) {
            record.average_age = self
                .average_age
                .and_then(finite)
                .map(|v| Sourced::new(v, source.clone()));
        }
        if wanted(DemographicField::AgeDistribution) {
            record.age_distribution = self
                .age_distribution
                .filter(|b| !b.is_empty())
                .map(|v| Sourced::new(v, source.clone()));
        }
        if wanted(DemographicField::GenderRatio) {
            record.gender_ratio = self.gender_ratio.map(|v| Sourced::new(v, source.clone()));
        }
        if wanted(DemographicField::AverageIncome) {
            record.average_income = self
                .average_income
                .and_then(finite)
                .map(|v| Sourced::new(v, source.clone()));
        }
        if wanted(DemographicField::ForeignerRatio) {
            record.foreigner_ratio = self
                .foreigner_ratio
                .and_then(finite)
                .map(|v| Sourced::new(v, source.clone()));
        }
        if wanted(DemographicField::Population) {
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let population = self
                .population
                .and_then(finite)
                .filter(|p| *p >= 0.0)
                .map(|p| p.round() as u64);
            record.population = population.map(|v| Sourced::new(v, source.clone()));
        }
        record
    }
}

async fn request(
    client: &GeminiClient,
    prompt: &str,
    region: &str,
    fields: &[DemographicField],
) -> Result<RegionDemographics, GeminiError> {
    let payload: AiDemographics = client.generate_json(prompt, "AI demographics").await?;
    Ok(payload.into_record(region, fields))
}

/// Estimates every metric for a region that has no official data.
///
/// On any failure the result is a record carrying only `region`.
pub async fn estimate_demographics(client: &GeminiClient, region: &str) -> RegionDemographics {
    let prompt = estimate_prompt(region);
    match request(client, &prompt, region, &DemographicField::ALL).await {
        Ok(record) => {
            tracing::info!(region, model = client.model(), "AI demographic estimate complete");
            record
        }
        Err(e) => {
            tracing::error!(region, error = %e, "AI demographic estimate failed");
            RegionDemographics::new(region)
        }
    }
}

/// Fills the supplementary metrics missing from an official record.
///
/// Existing metrics are never replaced. When nothing supplementary is
/// missing no request is made; on failure the input is returned unchanged.
pub async fn enrich_demographics(
    client: &GeminiClient,
    mut existing: RegionDemographics,
) -> RegionDemographics {
    let missing = existing.missing_fields(&DemographicField::SUPPLEMENTARY);
    if missing.is_empty() {
        return existing;
    }

    let prompt = enrichment_prompt(&existing.region, &missing);
    match request(client, &prompt, &existing.region, &missing).await {
        Ok(extra) => {
            tracing::info!(
                region = %existing.region,
                requested = missing.len(),
                "AI enrichment complete"
            );
            existing.fill_missing(extra);
            existing
        }
        Err(e) => {
            tracing::error!(region = %existing.region, error = %e, "AI enrichment failed");
            existing
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kaitori_core::SourceType;

    fn parse(json: &str) -> AiDemographics {
        serde_json::from_str(json).expect("valid payload")
    }

    #[test]
    fn first_citation_becomes_source() {
        let payload = parse(
            r#"{"averageAge": 44.1, "sources": [
                {"name": "総務省 住民基本台帳", "url": "https://www.soumu.go.jp/"},
                {"name": "other", "url": "https://example.com"}
            ]}"#,
        );
        let record = payload.into_record("横浜市", &DemographicField::ALL);
        let age = record.average_age.expect("age");
        assert_eq!(age.source.name, "総務省 住民基本台帳");
        assert_eq!(age.source.url.as_deref(), Some("https://www.soumu.go.jp/"));
        assert_eq!(age.source.source_type, SourceType::AiEstimated);
    }

    #[test]
    fn missing_citations_use_default_source() {
        let payload = parse(r#"{"averageIncome": 420, "sources": [{"name": " ", "url": null}]}"#);
        let record = payload.into_record("横浜市", &DemographicField::ALL);
        let income = record.average_income.expect("income");
        assert_eq!(income.source.name, DEFAULT_SOURCE_NAME);
        assert!(income.source.url.is_none());
    }

    #[test]
    fn unrequested_fields_are_dropped() {
        let payload = parse(
            r#"{"averageAge": 50, "averageIncome": 380, "foreignerRatio": 2.5, "population": 1000}"#,
        );
        let record = payload.into_record("金沢市", &[DemographicField::ForeignerRatio]);
        assert!(record.foreigner_ratio.is_some());
        assert!(record.average_age.is_none());
        assert!(record.average_income.is_none());
        assert!(record.population.is_none());
    }

    #[test]
    fn nulls_and_negative_population_are_ignored() {
        let payload = parse(r#"{"averageAge": null, "population": -5, "ageDistribution": []}"#);
        let record = payload.into_record("金沢市", &DemographicField::ALL);
        assert!(!record.has_any_data());
    }

    #[test]
    fn population_is_rounded() {
        let record = parse(r#"{"population": 1234.6}"#).into_record("x", &DemographicField::ALL);
        assert_eq!(record.population.expect("population").value, 1235);
    }

    #[test]
    fn enrichment_merge_preserves_official_values() {
        let official = RegionMetricSource::official("e-Stat", None);
        let mut existing = RegionDemographics::new("東京都渋谷区");
        existing.average_age = Some(Sourced::new(42.0, official.clone()));
        existing.average_income = Some(Sourced::new(600.0, official));

        let extra = parse(r#"{"averageAge": 30, "averageIncome": 300, "foreignerRatio": 4.2}"#)
            .into_record("東京都渋谷区", &[DemographicField::ForeignerRatio]);
        existing.fill_missing(extra);

        assert!((existing.average_age.as_ref().unwrap().value - 42.0).abs() < f64::EPSILON);
        assert_eq!(
            existing.average_income.as_ref().unwrap().source.source_type,
            SourceType::Official
        );
        assert!((existing.foreigner_ratio.unwrap().value - 4.2).abs() < f64::EPSILON);
    }
}
