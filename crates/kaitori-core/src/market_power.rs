//! Market-power scoring for candidate buyback-event sites.
//!
//! A pure function of site attributes: no I/O, no errors. Every input is
//! optional and falls back to a neutral value, so a partially known site
//! still gets a (lower-confidence) score.

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

use crate::demographics::RegionDemographics;
use crate::municipality::Municipality;
use crate::rank::{rank_from_score, Rank};

/// Site archetype multipliers. Unknown keys score 1.0.
pub const ARCHETYPE_COEFFICIENTS: &[(&str, f64)] = &[
    ("station_front", 1.3),
    ("shopping_mall", 1.2),
    ("roadside", 1.0),
    ("suburban", 0.9),
    ("residential", 0.7),
];

/// Parking lot size multipliers. Unknown keys score 1.0.
pub const PARKING_COEFFICIENTS: &[(&str, f64)] = &[
    ("large", 1.2),
    ("medium", 1.0),
    ("small", 0.8),
    ("none", 0.6),
];

/// Assumed parking spaces when the capacity is not known.
pub const DEFAULT_PARKING_CAPACITY: &[(&str, u32)] =
    &[("large", 100), ("medium", 40), ("small", 15), ("none", 0)];

/// Cars per space during the peak hour.
pub const PARKING_ROTATION: &[(&str, f64)] = &[
    ("large", 1.5),
    ("medium", 1.3),
    ("small", 1.1),
    ("none", 0.8),
];

const NEUTRAL_PARKING_SIZE: &str = "medium";
const POPULATION_1KM_WEIGHT: f64 = 0.7;
const POPULATION_2KM_WEIGHT: f64 = 0.3;
const SENIOR_FEMALE_WEIGHT: f64 = 2.0;

fn lookup<T: Copy>(table: &[(&str, T)], key: &str) -> Option<T> {
    table.iter().find(|(k, _)| *k == key).map(|(_, v)| *v)
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketPowerInput {
    #[serde(default)]
    pub archetype: Option<String>,
    #[serde(default)]
    pub parking_size: Option<String>,
    #[serde(default)]
    pub parking_capacity: Option<u32>,
    #[serde(default)]
    pub population_1km: Option<f64>,
    #[serde(default)]
    pub population_2km: Option<f64>,
    #[serde(default)]
    pub senior_female_population: Option<f64>,
    /// Average annual income in man-yen.
    #[serde(default)]
    pub average_income: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BreakdownItem {
    pub label: String,
    pub value: f64,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketPowerResult {
    /// Rounded to two decimals.
    pub score: f64,
    pub archetype_coefficient: f64,
    pub parking_coefficient: f64,
    pub population_score: f64,
    pub income_score: f64,
    pub senior_female_score: f64,
    pub estimated_peak_visitors: f64,
    pub breakdown: Vec<BreakdownItem>,
}

impl MarketPowerResult {
    #[must_use]
    pub fn rank(&self) -> Rank {
        rank_from_score(self.score)
    }
}

fn non_negative(value: Option<f64>) -> f64 {
    value.filter(|v| v.is_finite()).unwrap_or(0.0).max(0.0)
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Income tiers in man-yen. Zero or negative means "unset" and is neutral.
fn income_coefficient(average_income: Option<f64>) -> f64 {
    match average_income.filter(|v| v.is_finite()) {
        None => 1.0,
        Some(v) if v <= 0.0 => 1.0,
        Some(v) if v >= 500.0 => 1.3,
        Some(v) if v >= 400.0 => 1.1,
        Some(v) if v >= 300.0 => 1.0,
        Some(_) => 0.8,
    }
}

fn peak_visitors(parking_size: Option<&str>, parking_capacity: Option<u32>) -> f64 {
    let size = parking_size
        .filter(|s| lookup(PARKING_ROTATION, s).is_some())
        .unwrap_or(NEUTRAL_PARKING_SIZE);
    let capacity = parking_capacity
        .or_else(|| lookup(DEFAULT_PARKING_CAPACITY, size))
        .unwrap_or(0);
    let rotation = lookup(PARKING_ROTATION, size).unwrap_or(1.0);
    f64::from(capacity) * rotation
}

/// Scores a site.
///
/// `score = population/10000 × archetype × parking × income
///        + seniorFemale/1000 × archetype`, rounded to two decimals, where
/// population is 70% of the 1 km ring plus 30% of the 2 km ring and the
/// senior-female count is weighted ×2.
#[must_use]
pub fn calculate_market_power(input: &MarketPowerInput) -> MarketPowerResult {
    let archetype_coefficient = input
        .archetype
        .as_deref()
        .and_then(|a| lookup(ARCHETYPE_COEFFICIENTS, a))
        .unwrap_or(1.0);
    let parking_coefficient = input
        .parking_size
        .as_deref()
        .and_then(|p| lookup(PARKING_COEFFICIENTS, p))
        .unwrap_or(1.0);

    let population_score = non_negative(input.population_1km) * POPULATION_1KM_WEIGHT
        + non_negative(input.population_2km) * POPULATION_2KM_WEIGHT;
    let senior_female_score = non_negative(input.senior_female_population) * SENIOR_FEMALE_WEIGHT;
    let income_score = income_coefficient(input.average_income);
    let estimated_peak_visitors =
        peak_visitors(input.parking_size.as_deref(), input.parking_capacity);

    let base = population_score / 10_000.0
        * archetype_coefficient
        * parking_coefficient
        * income_score;
    let senior_bonus = senior_female_score / 1_000.0 * archetype_coefficient;
    let score = round2(base + senior_bonus);

    let breakdown = vec![
        BreakdownItem {
            label: "立地タイプ係数".to_string(),
            value: archetype_coefficient,
            description: format!(
                "立地タイプ: {}",
                input.archetype.as_deref().unwrap_or("未設定")
            ),
        },
        BreakdownItem {
            label: "駐車場係数".to_string(),
            value: parking_coefficient,
            description: format!(
                "駐車場規模: {}",
                input.parking_size.as_deref().unwrap_or("未設定")
            ),
        },
        BreakdownItem {
            label: "人口スコア".to_string(),
            value: round2(population_score),
            description: "1km圏人口×70% + 2km圏人口×30%".to_string(),
        },
        BreakdownItem {
            label: "高齢女性スコア".to_string(),
            value: round2(senior_female_score),
            description: "65歳以上女性人口×2.0".to_string(),
        },
        BreakdownItem {
            label: "所得係数".to_string(),
            value: income_score,
            description: match input.average_income.filter(|v| *v > 0.0) {
                Some(v) => format!("平均年収: {v}万円"),
                None => "平均年収: 未設定".to_string(),
            },
        },
        BreakdownItem {
            label: "ピーク時推定来客数".to_string(),
            value: round2(estimated_peak_visitors),
            description: "駐車台数×回転率".to_string(),
        },
    ];

    MarketPowerResult {
        score,
        archetype_coefficient,
        parking_coefficient,
        population_score,
        income_score,
        senior_female_score,
        estimated_peak_visitors,
        breakdown,
    }
}

/// Site facts known independently of the surrounding region.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteProfile {
    #[serde(default)]
    pub archetype: Option<String>,
    #[serde(default)]
    pub parking_size: Option<String>,
    #[serde(default)]
    pub parking_capacity: Option<u32>,
}

impl SiteProfile {
    /// Builds calculator input by estimating the catchment from municipal
    /// density.
    ///
    /// The 1 km ring is density × π km², the 2 km ring is the 1–2 km annulus
    /// (density × 3π km²). Senior women in the 1 km ring are derived from the
    /// 65+ share and the female share when both are known.
    #[must_use]
    pub fn estimate(
        &self,
        municipality: &Municipality,
        demographics: &RegionDemographics,
    ) -> MarketPowerInput {
        #[allow(clippy::cast_precision_loss)]
        let density = demographics
            .population
            .as_ref()
            .filter(|_| municipality.area_km2 > 0.0)
            .map(|p| p.value as f64 / municipality.area_km2);

        let population_1km = density.map(|d| (d * PI).round());
        let population_2km = density.map(|d| (d * 3.0 * PI).round());

        let female_share = demographics
            .gender_ratio
            .as_ref()
            .map(|g| g.value.female / 100.0);
        let senior_female_population =
            match (population_1km, demographics.elderly_share(), female_share) {
                (Some(pop), Some(elderly), Some(female)) => Some((pop * elderly * female).round()),
                _ => None,
            };

        MarketPowerInput {
            archetype: self.archetype.clone(),
            parking_size: self.parking_size.clone(),
            parking_capacity: self.parking_capacity,
            population_1km,
            population_2km,
            senior_female_population,
            average_income: demographics.average_income.as_ref().map(|s| s.value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::demographics::{AgeBucket, GenderRatio, RegionMetricSource, Sourced};
    use crate::municipality::resolve_municipality;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn default_input_is_neutral() {
        let result = calculate_market_power(&MarketPowerInput::default());
        assert!(approx(result.archetype_coefficient, 1.0));
        assert!(approx(result.parking_coefficient, 1.0));
        assert!(approx(result.income_score, 1.0));
        assert!(approx(result.population_score, 0.0));
        assert!(approx(result.score, 0.0));
        assert_eq!(result.rank(), Rank::C);
        // Absent parking size is treated as medium: 40 spaces × 1.3.
        assert!(approx(result.estimated_peak_visitors, 52.0));
    }

    #[test]
    fn station_front_worked_example() {
        let input = MarketPowerInput {
            archetype: Some("station_front".to_string()),
            parking_size: Some("large".to_string()),
            parking_capacity: Some(80),
            population_1km: Some(20_000.0),
            population_2km: Some(10_000.0),
            senior_female_population: Some(3_000.0),
            average_income: Some(550.0),
        };
        let result = calculate_market_power(&input);

        assert!(approx(result.population_score, 17_000.0));
        assert!(approx(result.income_score, 1.3));
        assert!(approx(result.senior_female_score, 6_000.0));
        // base 1.7 × 1.3 × 1.2 × 1.3 = 3.4476, senior bonus 6000 / 1000 × 1.3 = 7.8
        let expected = ((17_000.0 / 10_000.0 * 1.3 * 1.2 * 1.3 + 6_000.0 / 1_000.0 * 1.3)
            * 100.0_f64)
            .round()
            / 100.0;
        assert!(approx(result.score, expected));
        assert!(approx(result.score, 11.25));
        assert_eq!(result.rank(), Rank::S);
        assert!(approx(result.estimated_peak_visitors, 120.0));
    }

    #[test]
    fn unknown_keys_fall_back_to_neutral_coefficients() {
        let input = MarketPowerInput {
            archetype: Some("airport".to_string()),
            parking_size: Some("gigantic".to_string()),
            population_1km: Some(10_000.0),
            ..MarketPowerInput::default()
        };
        let result = calculate_market_power(&input);
        assert!(approx(result.archetype_coefficient, 1.0));
        assert!(approx(result.parking_coefficient, 1.0));
        assert!(approx(result.score, 0.7));
    }

    #[test]
    fn income_tiers() {
        assert!(approx(income_coefficient(None), 1.0));
        assert!(approx(income_coefficient(Some(0.0)), 1.0));
        assert!(approx(income_coefficient(Some(-5.0)), 1.0));
        assert!(approx(income_coefficient(Some(299.9)), 0.8));
        assert!(approx(income_coefficient(Some(300.0)), 1.0));
        assert!(approx(income_coefficient(Some(400.0)), 1.1));
        assert!(approx(income_coefficient(Some(500.0)), 1.3));
    }

    #[test]
    fn peak_visitors_uses_default_capacity_per_size() {
        assert!(approx(peak_visitors(Some("large"), None), 150.0));
        assert!(approx(peak_visitors(Some("small"), None), 16.5));
        assert!(approx(peak_visitors(Some("none"), None), 0.0));
        assert!(approx(peak_visitors(Some("none"), Some(10)), 8.0));
    }

    #[test]
    fn calculation_is_deterministic() {
        let input = MarketPowerInput {
            archetype: Some("roadside".to_string()),
            parking_size: Some("small".to_string()),
            population_1km: Some(12_345.0),
            population_2km: Some(54_321.0),
            senior_female_population: Some(987.0),
            average_income: Some(410.0),
            ..MarketPowerInput::default()
        };
        let first = calculate_market_power(&input);
        let second = calculate_market_power(&input);
        assert_eq!(first, second);
        let labels: Vec<&str> = first.breakdown.iter().map(|b| b.label.as_str()).collect();
        assert_eq!(
            labels,
            vec![
                "立地タイプ係数",
                "駐車場係数",
                "人口スコア",
                "高齢女性スコア",
                "所得係数",
                "ピーク時推定来客数"
            ]
        );
    }

    #[test]
    fn input_deserializes_from_camel_case() {
        let input: MarketPowerInput = serde_json::from_str(
            r#"{"archetype":"suburban","population1km":5000,"seniorFemalePopulation":100}"#,
        )
        .expect("deserialize");
        assert_eq!(input.archetype.as_deref(), Some("suburban"));
        assert_eq!(input.population_1km, Some(5_000.0));
        assert_eq!(input.senior_female_population, Some(100.0));
        assert!(input.population_2km.is_none());
    }

    #[test]
    fn site_profile_estimates_rings_from_density() {
        let shibuya = resolve_municipality("渋谷区").unwrap();
        let source = RegionMetricSource::official("e-Stat", None);
        let mut demographics = RegionDemographics::new("渋谷区");
        demographics.population = Some(Sourced::new(243_883, source.clone()));
        demographics.gender_ratio = Some(Sourced::new(
            GenderRatio {
                male: 47.0,
                female: 53.0,
            },
            source.clone(),
        ));
        demographics.age_distribution = Some(Sourced::new(
            vec![AgeBucket {
                range: "65歳以上".to_string(),
                percentage: 20.0,
            }],
            source,
        ));

        let profile = SiteProfile {
            archetype: Some("station_front".to_string()),
            ..SiteProfile::default()
        };
        let input = profile.estimate(shibuya, &demographics);

        let density = 243_883.0 / shibuya.area_km2;
        assert_eq!(input.population_1km, Some((density * PI).round()));
        assert_eq!(input.population_2km, Some((density * 3.0 * PI).round()));
        let pop_1km = input.population_1km.unwrap();
        assert_eq!(
            input.senior_female_population,
            Some((pop_1km * 0.2 * 0.53).round())
        );
        assert!(input.average_income.is_none());
        assert_eq!(input.archetype.as_deref(), Some("station_front"));
    }

    #[test]
    fn site_profile_without_population_leaves_rings_empty() {
        let sapporo = resolve_municipality("札幌市").unwrap();
        let input = SiteProfile::default().estimate(sapporo, &RegionDemographics::new("札幌市"));
        assert!(input.population_1km.is_none());
        assert!(input.senior_female_population.is_none());
    }
}
