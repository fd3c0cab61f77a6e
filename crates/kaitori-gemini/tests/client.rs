//! Integration tests for the Gemini client and AI demographics using wiremock.

use kaitori_core::{
    DemographicField, RegionDemographics, RegionMetricSource, SourceType, Sourced,
};
use kaitori_gemini::{
    analyze_region, enrich_demographics, estimate_demographics, recommend_stores, GeminiClient,
    GeminiError, DEFAULT_SOURCE_NAME,
};
use std::sync::{Arc, Mutex};

use serde_json::json;
use tracing_subscriber::fmt::MakeWriter;
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const GENERATE_PATH: &str = "/models/gemini-2.0-flash:generateContent";

fn test_client(base_url: &str) -> GeminiClient {
    GeminiClient::with_base_url("test-key", "gemini-2.0-flash", 5, base_url)
        .expect("client construction should not fail")
}

/// Wraps model text in a `generateContent` response envelope.
fn candidate(text: &str) -> serde_json::Value {
    json!({
        "candidates": [
            { "content": { "role": "model", "parts": [ { "text": text } ] }, "finishReason": "STOP" }
        ]
    })
}

async fn mount_text(server: &MockServer, text: &str) {
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(candidate(text)))
        .mount(server)
        .await;
}

fn official_record() -> RegionDemographics {
    let source = RegionMetricSource::official("e-Stat 政府統計の総合窓口", None);
    let mut record = RegionDemographics::new("東京都渋谷区");
    record.population = Some(Sourced::new(243_883, source.clone()));
    record.average_age = Some(Sourced::new(42.3, source.clone()));
    record.average_income = Some(Sourced::new(650.0, source));
    record
}

#[tokio::test]
async fn generate_sends_key_and_json_mime_type() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .and(query_param("key", "test-key"))
        .and(body_partial_json(json!({
            "contents": [ { "parts": [ { "text": "こんにちは" } ] } ],
            "generationConfig": { "responseMimeType": "application/json" }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(candidate("{\"ok\": true}")))
        .expect(1)
        .mount(&server)
        .await;

    let text = test_client(&server.uri())
        .generate("こんにちは")
        .await
        .expect("should succeed");
    assert_eq!(text, "{\"ok\": true}");
}

#[tokio::test]
async fn generate_reports_non_success_status() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(429).set_body_string("quota exceeded"))
        .mount(&server)
        .await;

    let err = test_client(&server.uri())
        .generate("x")
        .await
        .expect_err("429 should fail");
    match err {
        GeminiError::UnexpectedStatus { status, body } => {
            assert_eq!(status, 429);
            assert_eq!(body, "quota exceeded");
        }
        other => panic!("expected UnexpectedStatus, got {other:?}"),
    }
}

#[tokio::test]
async fn generate_without_candidates_is_empty_response() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "candidates": [] })))
        .mount(&server)
        .await;

    let err = test_client(&server.uri()).generate("x").await.unwrap_err();
    assert!(matches!(err, GeminiError::EmptyResponse));
}

#[tokio::test]
async fn estimate_maps_fields_and_first_citation() {
    let server = MockServer::start().await;
    mount_text(
        &server,
        r#"```json
{
  "averageAge": 47.5,
  "ageDistribution": [
    {"range": "0-19歳", "percentage": 15.0},
    {"range": "65歳以上", "percentage": 35.0}
  ],
  "genderRatio": {"male": 47.0, "female": 53.0},
  "averageIncome": 380,
  "foreignerRatio": 0.8,
  "population": 52000,
  "sources": [{"name": "町勢要覧", "url": "https://example.jp/youran.pdf"}]
}
```"#,
    )
    .await;

    let record = estimate_demographics(&test_client(&server.uri()), "どこか町").await;

    assert_eq!(record.region, "どこか町");
    for field in DemographicField::ALL {
        assert!(record.has(field), "{} should be set", field.key());
    }
    let population = record.population.expect("population");
    assert_eq!(population.value, 52_000);
    assert_eq!(population.source.source_type, SourceType::AiEstimated);
    assert_eq!(population.source.name, "町勢要覧");
    assert_eq!(
        population.source.url.as_deref(),
        Some("https://example.jp/youran.pdf")
    );
}

#[tokio::test]
async fn estimate_without_citations_uses_default_name() {
    let server = MockServer::start().await;
    mount_text(&server, r#"{"averageAge": 40}"#).await;

    let record = estimate_demographics(&test_client(&server.uri()), "どこか町").await;
    let age = record.average_age.expect("age");
    assert_eq!(age.source.name, DEFAULT_SOURCE_NAME);
    assert!(age.source.url.is_none());
}

#[tokio::test]
async fn estimate_failure_returns_bare_region() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let record = estimate_demographics(&test_client(&server.uri()), "どこか町").await;
    assert_eq!(record, RegionDemographics::new("どこか町"));
}

#[tokio::test]
async fn estimate_with_invalid_json_returns_bare_region() {
    let server = MockServer::start().await;
    mount_text(&server, "申し訳ありませんが推定できません。").await;

    let record = estimate_demographics(&test_client(&server.uri()), "どこか町").await;
    assert_eq!(record, RegionDemographics::new("どこか町"));
}

#[tokio::test]
async fn enrichment_is_skipped_when_supplementary_fields_present() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(candidate("{}")))
        .expect(0)
        .mount(&server)
        .await;

    let mut record = official_record();
    record.foreigner_ratio = Some(Sourced::new(
        3.1,
        RegionMetricSource::official("e-Stat", None),
    ));
    let expected = record.clone();

    let enriched = enrich_demographics(&test_client(&server.uri()), record).await;
    assert_eq!(enriched, expected);
}

#[tokio::test]
async fn enrichment_fills_gaps_without_touching_official_values() {
    let server = MockServer::start().await;
    mount_text(
        &server,
        r#"{"averageAge": 25, "averageIncome": 100, "population": 1,
            "foreignerRatio": 5.4,
            "sources": [{"name": "区の統計", "url": "https://example.jp/stat"}]}"#,
    )
    .await;

    let before = official_record();
    let enriched = enrich_demographics(&test_client(&server.uri()), before.clone()).await;

    assert_eq!(enriched.population, before.population);
    assert_eq!(enriched.average_age, before.average_age);
    assert_eq!(enriched.average_income, before.average_income);

    let foreigner = enriched.foreigner_ratio.expect("foreigner ratio filled");
    assert!((foreigner.value - 5.4).abs() < f64::EPSILON);
    assert_eq!(foreigner.source.source_type, SourceType::AiEstimated);
    assert_eq!(foreigner.source.name, "区の統計");

    // Only supplementary fields are requested during enrichment.
    assert!(enriched.gender_ratio.is_none());
}

#[tokio::test]
async fn enrichment_failure_returns_input_unchanged() {
    let server = MockServer::start().await;
    mount_text(&server, "not json").await;

    let before = official_record();
    let enriched = enrich_demographics(&test_client(&server.uri()), before.clone()).await;
    assert_eq!(enriched, before);
}

/// In-memory log sink for asserting on emitted events.
#[derive(Clone, Default)]
struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    fn text(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().expect("log buffer")).into_owned()
    }
}

impl std::io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().expect("log buffer").extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for CapturedLogs {
    type Writer = CapturedLogs;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

#[tokio::test]
async fn enrichment_failure_is_logged_at_error_level() {
    let logs = CapturedLogs::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(logs.clone())
        .with_ansi(false)
        .without_time()
        .with_max_level(tracing::Level::TRACE)
        .finish();
    let _guard = tracing::subscriber::set_default(subscriber);

    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let before = official_record();
    let enriched = enrich_demographics(&test_client(&server.uri()), before.clone()).await;
    assert_eq!(enriched, before);

    let text = logs.text();
    let line = text
        .lines()
        .find(|l| l.contains("AI enrichment failed"))
        .expect("enrichment failure should be logged");
    assert!(line.contains("ERROR"), "unexpected level: {line}");
}

#[tokio::test]
async fn analyze_region_parses_fenced_reply() {
    let server = MockServer::start().await;
    mount_text(
        &server,
        "```json\n{\"summary\": \"住宅街\", \"strengths\": [\"高齢者が多い\"], \"concerns\": [], \"recommendedCategories\": [\"貴金属\", \"着物\"]}\n```",
    )
    .await;

    let analysis = analyze_region(&test_client(&server.uri()), &official_record())
        .await
        .expect("should parse");
    assert_eq!(analysis.summary, "住宅街");
    assert_eq!(analysis.strengths, vec!["高齢者が多い"]);
    assert_eq!(analysis.recommended_categories, vec!["貴金属", "着物"]);
}

#[tokio::test]
async fn recommend_stores_rejects_blank_commentary() {
    let server = MockServer::start().await;
    mount_text(&server, r#"{"commentary": "   "}"#).await;

    let err = recommend_stores(&test_client(&server.uri()), "渋谷区", &[])
        .await
        .unwrap_err();
    assert!(matches!(err, GeminiError::EmptyResponse));
}
