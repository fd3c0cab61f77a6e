//! Integration tests for `EstatClient` using wiremock HTTP mocks.

use kaitori_core::SourceType;
use kaitori_estat::{EstatClient, EstatError, SOURCE_NAME};
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_client(base_url: &str) -> EstatClient {
    EstatClient::with_base_url("test-app", "0003445139", 5, base_url)
        .expect("client construction should not fail")
}

fn census_body() -> serde_json::Value {
    json!({
        "GET_STATS_DATA": {
            "RESULT": { "STATUS": 0, "ERROR_MSG": "正常に終了しました。" },
            "STATISTICAL_DATA": {
                "DATA_INF": {
                    "VALUE": [
                        { "@area": "13113", "@cat01": "000", "$": "243883" },
                        { "@area": "13113", "@cat01": "001", "$": "116500" },
                        { "@area": "13113", "@cat01": "002", "$": "127383" },
                        { "@area": "13113", "@cat01": "0100", "$": "35000" },
                        { "@area": "13113", "@cat01": "0200", "$": "165000" },
                        { "@area": "13113", "@cat01": "0300", "$": "43883" }
                    ]
                }
            }
        }
    })
}

#[tokio::test]
async fn get_region_demographics_returns_official_fields() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/getStatsData"))
        .and(query_param("appId", "test-app"))
        .and(query_param("statsDataId", "0003445139"))
        .and(query_param("cdArea", "13113"))
        .respond_with(ResponseTemplate::new(200).set_body_json(census_body()))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let record = client
        .get_region_demographics("渋谷区")
        .await
        .expect("should resolve");

    assert_eq!(record.region, "東京都渋谷区");
    let population = record.population.expect("population");
    assert_eq!(population.value, 243_883);
    assert_eq!(population.source.source_type, SourceType::Official);
    assert_eq!(population.source.name, SOURCE_NAME);
    assert!(population
        .source
        .url
        .as_deref()
        .is_some_and(|u| u.contains("0003445139")));
    assert!(record.gender_ratio.is_some());
    assert!(record.age_distribution.is_some());
    assert!(record.average_age.is_some());
    assert!(record.average_income.is_none());
    assert!(record.foreigner_ratio.is_none());
}

#[tokio::test]
async fn repeated_lookup_is_served_from_cache() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/getStatsData"))
        .respond_with(ResponseTemplate::new(200).set_body_json(census_body()))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let first = client.get_region_demographics("渋谷区").await.unwrap();
    let second = client.get_region_demographics("東京都渋谷区").await.unwrap();

    assert_eq!(
        first.population.map(|p| p.value),
        second.population.map(|p| p.value)
    );
}

#[tokio::test]
async fn api_error_status_degrades_to_empty_record() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/getStatsData"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "GET_STATS_DATA": {
                "RESULT": { "STATUS": 100, "ERROR_MSG": "認証に失敗しました。" }
            }
        })))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let record = client
        .get_region_demographics("横浜市")
        .await
        .expect("API errors are not propagated");

    assert_eq!(record.region, "神奈川県横浜市");
    assert!(!record.has_any_data());
}

#[tokio::test]
async fn http_failure_degrades_and_is_not_cached() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/getStatsData"))
        .respond_with(ResponseTemplate::new(503))
        .expect(2)
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    for _ in 0..2 {
        let record = client.get_region_demographics("大阪市").await.unwrap();
        assert!(!record.has_any_data());
    }
}

#[tokio::test]
async fn unknown_region_fails_without_request() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(census_body()))
        .expect(0)
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let result = client.get_region_demographics("存在しない村").await;
    assert!(matches!(result, Err(EstatError::Region(_))));
}

#[tokio::test]
async fn get_stats_data_surfaces_api_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/getStatsData"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "GET_STATS_DATA": { "RESULT": { "STATUS": 101, "ERROR_MSG": "パラメータ不正" } }
        })))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let err = client
        .get_stats_data(&[("cdArea", "99999")])
        .await
        .expect_err("status 101 should be an error");
    assert!(matches!(err, EstatError::ApiError { status: 101, .. }));
}
