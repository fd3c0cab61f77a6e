//! Turns a `getStatsData` payload into demographic metrics.
//!
//! Values are addressed by their `@cat01` category code. The age classes
//! used here are coarse: only the youngest (0–19) and oldest (65+) groups
//! are read directly; the 20–64 working-age total is split into three
//! buckets by fixed proportions, so the middle of the distribution and the
//! derived average age are approximations.

use kaitori_core::{
    AgeBucket, GenderRatio, RegionDemographics, RegionMetricSource, Sourced, AGE_BUCKET_LABELS,
};
use serde::Deserialize;
use serde_json::Value;

const CODE_TOTAL: &str = "000";
const CODE_MALE: &str = "001";
const CODE_FEMALE: &str = "002";
const PREFIX_YOUTH: &str = "01";
const PREFIX_WORKING_AGE: &str = "02";
const PREFIX_ELDERLY: &str = "03";

/// Split of the 20–64 total into 20–34 / 35–49 / 50–64.
const WORKING_AGE_SPLIT: [f64; 3] = [0.34, 0.33, 0.33];

/// Representative age per bucket, used to weight the average-age estimate.
const BUCKET_MIDPOINTS: [f64; 5] = [9.0, 26.0, 42.0, 57.0, 75.0];

#[derive(Debug, Deserialize)]
struct StatsValue {
    #[serde(rename = "@cat01")]
    cat01: Option<String>,
    #[serde(rename = "$")]
    value: String,
}

#[derive(Debug, Default)]
struct CensusTotals {
    total: Option<f64>,
    male: Option<f64>,
    female: Option<f64>,
    youth: Option<f64>,
    working_age: Option<f64>,
    elderly: Option<f64>,
}

fn add(slot: &mut Option<f64>, value: f64) {
    *slot = Some(slot.unwrap_or(0.0) + value);
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Extracts the `VALUE` entries. e-Stat returns a bare object instead of an
/// array when a query matches exactly one cell.
fn stats_values(payload: &Value) -> Vec<StatsValue> {
    let Some(raw) = payload.pointer("/GET_STATS_DATA/STATISTICAL_DATA/DATA_INF/VALUE") else {
        return Vec::new();
    };
    let items: Vec<&Value> = match raw {
        Value::Array(items) => items.iter().collect(),
        Value::Object(_) => vec![raw],
        _ => Vec::new(),
    };
    items
        .into_iter()
        .filter_map(|v| serde_json::from_value::<StatsValue>(v.clone()).ok())
        .collect()
}

fn accumulate(values: &[StatsValue]) -> CensusTotals {
    let mut totals = CensusTotals::default();
    for item in values {
        let Some(code) = item.cat01.as_deref() else {
            continue;
        };
        // Suppressed cells are reported as "-", "***", "X" etc.
        let Ok(value) = item.value.trim().replace(',', "").parse::<f64>() else {
            continue;
        };
        match code {
            CODE_TOTAL => add(&mut totals.total, value),
            CODE_MALE => add(&mut totals.male, value),
            CODE_FEMALE => add(&mut totals.female, value),
            c if c.starts_with(PREFIX_YOUTH) => add(&mut totals.youth, value),
            c if c.starts_with(PREFIX_WORKING_AGE) => add(&mut totals.working_age, value),
            c if c.starts_with(PREFIX_ELDERLY) => add(&mut totals.elderly, value),
            _ => {}
        }
    }
    totals
}

fn age_buckets(totals: &CensusTotals) -> Option<[f64; 5]> {
    let (youth, working, elderly) = (totals.youth?, totals.working_age?, totals.elderly?);
    let buckets = [
        youth,
        working * WORKING_AGE_SPLIT[0],
        working * WORKING_AGE_SPLIT[1],
        working * WORKING_AGE_SPLIT[2],
        elderly,
    ];
    (buckets.iter().sum::<f64>() > 0.0).then_some(buckets)
}

/// Builds a partial record from a `getStatsData` payload.
///
/// Only metrics that can be computed from the payload are set; every set
/// metric carries a clone of `source`.
#[must_use]
pub fn demographics_from_payload(
    region: &str,
    payload: &Value,
    source: &RegionMetricSource,
) -> RegionDemographics {
    let totals = accumulate(&stats_values(payload));
    let mut record = RegionDemographics::new(region);

    if let Some(buckets) = age_buckets(&totals) {
        let sum: f64 = buckets.iter().sum();
        let weighted: f64 = buckets
            .iter()
            .zip(BUCKET_MIDPOINTS)
            .map(|(count, age)| count * age)
            .sum();
        record.average_age = Some(Sourced::new(round1(weighted / sum), source.clone()));

        let distribution = buckets
            .iter()
            .zip(AGE_BUCKET_LABELS)
            .map(|(count, label)| AgeBucket {
                range: label.to_string(),
                percentage: round1(count / sum * 100.0),
            })
            .collect();
        record.age_distribution = Some(Sourced::new(distribution, source.clone()));
    }

    if let (Some(male), Some(female)) = (totals.male, totals.female) {
        let both = male + female;
        if both > 0.0 {
            record.gender_ratio = Some(Sourced::new(
                GenderRatio {
                    male: round1(male / both * 100.0),
                    female: round1(female / both * 100.0),
                },
                source.clone(),
            ));
        }
    }

    let population = totals
        .total
        .or_else(|| Some(totals.male? + totals.female?))
        .filter(|p| *p > 0.0);
    if let Some(population) = population {
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let count = population.round() as u64;
        record.population = Some(Sourced::new(count, source.clone()));
    }

    record
}
