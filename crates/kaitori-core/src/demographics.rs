//! Per-region demographic snapshot with field-level provenance.
//!
//! Every metric is independently optional and carries the source it came
//! from. Records are assembled per request from the official statistics API
//! and, for gaps, from AI estimation; they are never persisted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    Official,
    AiEstimated,
}

/// Where a single metric came from and when it was fetched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegionMetricSource {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub retrieved_at: DateTime<Utc>,
    #[serde(rename = "type")]
    pub source_type: SourceType,
}

impl RegionMetricSource {
    #[must_use]
    pub fn official(name: impl Into<String>, url: Option<String>) -> Self {
        Self {
            name: name.into(),
            url,
            retrieved_at: Utc::now(),
            source_type: SourceType::Official,
        }
    }

    #[must_use]
    pub fn ai_estimated(name: impl Into<String>, url: Option<String>) -> Self {
        Self {
            name: name.into(),
            url,
            retrieved_at: Utc::now(),
            source_type: SourceType::AiEstimated,
        }
    }
}

/// A metric value paired with its provenance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sourced<T> {
    pub value: T,
    pub source: RegionMetricSource,
}

impl<T> Sourced<T> {
    pub fn new(value: T, source: RegionMetricSource) -> Self {
        Self { value, source }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgeBucket {
    /// Display label, e.g. `"20-34歳"`.
    pub range: String,
    pub percentage: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GenderRatio {
    pub male: f64,
    pub female: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegionDemographics {
    pub region: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub average_age: Option<Sourced<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age_distribution: Option<Sourced<Vec<AgeBucket>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender_ratio: Option<Sourced<GenderRatio>>,
    /// Average annual income in man-yen (10,000 JPY).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub average_income: Option<Sourced<f64>>,
    /// Foreign residents as a percentage of the population.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub foreigner_ratio: Option<Sourced<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub population: Option<Sourced<u64>>,
}

/// Names of the optional metrics on [`RegionDemographics`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DemographicField {
    AverageAge,
    AgeDistribution,
    GenderRatio,
    AverageIncome,
    ForeignerRatio,
    Population,
}

impl DemographicField {
    pub const ALL: [DemographicField; 6] = [
        DemographicField::AverageAge,
        DemographicField::AgeDistribution,
        DemographicField::GenderRatio,
        DemographicField::AverageIncome,
        DemographicField::ForeignerRatio,
        DemographicField::Population,
    ];

    /// Metrics the census dataset never carries; only these are requested
    /// during enrichment.
    pub const SUPPLEMENTARY: [DemographicField; 2] = [
        DemographicField::AverageIncome,
        DemographicField::ForeignerRatio,
    ];

    /// JSON key used on the wire and in AI prompts.
    #[must_use]
    pub fn key(self) -> &'static str {
        match self {
            DemographicField::AverageAge => "averageAge",
            DemographicField::AgeDistribution => "ageDistribution",
            DemographicField::GenderRatio => "genderRatio",
            DemographicField::AverageIncome => "averageIncome",
            DemographicField::ForeignerRatio => "foreignerRatio",
            DemographicField::Population => "population",
        }
    }

    /// Japanese description used when asking the model for this field.
    #[must_use]
    pub fn prompt_description(self) -> &'static str {
        match self {
            DemographicField::AverageAge => "平均年齢（歳、数値）",
            DemographicField::AgeDistribution => {
                "年齢構成（\"0-19歳\", \"20-34歳\", \"35-49歳\", \"50-64歳\", \"65歳以上\" の5区分をこの順で、\
                 [{\"range\": 区分名, \"percentage\": 数値}, ...] の配列）"
            }
            DemographicField::GenderRatio => {
                "男女比（{\"male\": 男性%, \"female\": 女性%} のオブジェクト）"
            }
            DemographicField::AverageIncome => "平均年収（万円、数値）",
            DemographicField::ForeignerRatio => "外国人住民比率（%、数値）",
            DemographicField::Population => "人口（人、整数）",
        }
    }
}

/// Age buckets used for every age distribution, youngest first.
pub const AGE_BUCKET_LABELS: [&str; 5] = ["0-19歳", "20-34歳", "35-49歳", "50-64歳", "65歳以上"];

const ELDERLY_AGE: u32 = 65;

/// Lower age bound of a bucket label such as `"35-49歳"` or `"65歳以上"`.
/// Full-width digits are accepted. `"15歳未満"`-style labels start at zero.
fn lower_age_bound(label: &str) -> Option<u32> {
    let label = label.trim();
    if label.contains("未満") {
        return Some(0);
    }
    let mut bound: Option<u32> = None;
    for c in label.chars() {
        let digit = match c {
            '0'..='9' => u32::from(c) - u32::from('0'),
            '０'..='９' => u32::from(c) - u32::from('０'),
            _ => break,
        };
        bound = Some(bound.unwrap_or(0).checked_mul(10)?.checked_add(digit)?);
    }
    bound
}

impl RegionDemographics {
    /// An empty record for `region` with no metrics.
    #[must_use]
    pub fn new(region: impl Into<String>) -> Self {
        Self {
            region: region.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn has(&self, field: DemographicField) -> bool {
        match field {
            DemographicField::AverageAge => self.average_age.is_some(),
            DemographicField::AgeDistribution => self.age_distribution.is_some(),
            DemographicField::GenderRatio => self.gender_ratio.is_some(),
            DemographicField::AverageIncome => self.average_income.is_some(),
            DemographicField::ForeignerRatio => self.foreigner_ratio.is_some(),
            DemographicField::Population => self.population.is_some(),
        }
    }

    /// `true` when at least one metric is present.
    #[must_use]
    pub fn has_any_data(&self) -> bool {
        DemographicField::ALL.iter().any(|f| self.has(*f))
    }

    /// The subset of `fields` that is absent on this record, in input order.
    #[must_use]
    pub fn missing_fields(&self, fields: &[DemographicField]) -> Vec<DemographicField> {
        fields.iter().copied().filter(|f| !self.has(*f)).collect()
    }

    /// Copies metrics from `other` into every slot that is still empty.
    ///
    /// Present metrics are never replaced, so calling this with an
    /// AI-derived record preserves all official values.
    pub fn fill_missing(&mut self, other: RegionDemographics) {
        if self.average_age.is_none() {
            self.average_age = other.average_age;
        }
        if self.age_distribution.is_none() {
            self.age_distribution = other.age_distribution;
        }
        if self.gender_ratio.is_none() {
            self.gender_ratio = other.gender_ratio;
        }
        if self.average_income.is_none() {
            self.average_income = other.average_income;
        }
        if self.foreigner_ratio.is_none() {
            self.foreigner_ratio = other.foreigner_ratio;
        }
        if self.population.is_none() {
            self.population = other.population;
        }
    }

    /// Share (0.0–1.0) of the population aged 65 and over, if known.
    ///
    /// Sums every bucket whose lower bound is 65 or more, so finer splits
    /// such as `"65-74歳"` + `"75歳以上"` count in full.
    #[must_use]
    pub fn elderly_share(&self) -> Option<f64> {
        let elderly: Vec<f64> = self
            .age_distribution
            .as_ref()?
            .value
            .iter()
            .filter(|b| lower_age_bound(&b.range).is_some_and(|age| age >= ELDERLY_AGE))
            .map(|b| b.percentage)
            .collect();
        if elderly.is_empty() {
            None
        } else {
            Some(elderly.iter().sum::<f64>() / 100.0)
        }
    }
}
