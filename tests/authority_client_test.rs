//! Authority HTTP sources against mock servers.

mod common;

use std::sync::Arc;
use std::time::Duration;

use carrier_registry::adapters::authority::{shared_rate_limiter, FallbackAuthorityClient, QcApiClient, SnapshotPageClient};
use carrier_registry::domain::models::{
    AuthorityQuery, OperatingStatus, RiskLevel, VerificationConfig, VerificationFailure,
};
use carrier_registry::domain::ports::{AuthorityLookup, AuthoritySource, SourceError};
use carrier_registry::services::{RiskAssessor, VerificationService};
use common::TestRegistry;
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const SNAPSHOT_PAGE: &str = r#"<html><body><table>
    <tr><th>Operating Status:</th><td>AUTHORIZED FOR Property</td></tr>
    <tr><th>Legal Name:</th><td>ACME FREIGHT LLC</td></tr>
    <tr><th>USDOT Number:</th><td>1234567</td>
        <th>MC/MX/FF Number(s):</th><td>MC-778899</td></tr>
    </table></body></html>"#;

fn qc_body() -> serde_json::Value {
    json!({
        "content": {
            "carrier": {
                "legalName": "ACME FREIGHT LLC",
                "dotNumber": 1234567,
                "allowedToOperate": "Y",
                "bipdInsuranceOnFile": "1000",
                "bipdInsuranceRequired": "750",
                "cargoInsuranceOnFile": "100",
                "crashTotal": 0,
                "fatalCrash": 0
            }
        }
    })
}

fn primary(server: &MockServer, timeout: Duration) -> Arc<dyn AuthoritySource> {
    Arc::new(
        QcApiClient::new(server.uri(), Some("secret".to_string()), timeout, shared_rate_limiter(50)).unwrap(),
    )
}

fn secondary(server: &MockServer) -> Arc<dyn AuthoritySource> {
    Arc::new(SnapshotPageClient::new(server.uri(), Duration::from_secs(5), shared_rate_limiter(50)).unwrap())
}

fn mc(number: &str) -> AuthorityQuery {
    AuthorityQuery::Mc(number.to_string())
}

#[tokio::test]
async fn test_primary_lookup_by_mc() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/carriers/docket-number/778899"))
        .and(query_param("webKey", "secret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(qc_body()))
        .expect(1)
        .mount(&server)
        .await;

    let lookup = primary(&server, Duration::from_secs(5)).lookup(&mc("778899")).await.unwrap();
    let AuthorityLookup::Found(snapshot) = lookup else {
        panic!("expected a record");
    };
    assert_eq!(snapshot.legal_name.as_deref(), Some("ACME FREIGHT LLC"));
    assert_eq!(snapshot.mc_number.as_deref(), Some("778899"));
    assert_eq!(snapshot.dot_number.as_deref(), Some("1234567"));
    assert_eq!(snapshot.operating_status, OperatingStatus::Authorized);
}

#[tokio::test]
async fn test_primary_lookup_by_dot() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/carriers/1234567"))
        .respond_with(ResponseTemplate::new(200).set_body_json(qc_body()))
        .expect(1)
        .mount(&server)
        .await;

    let lookup = primary(&server, Duration::from_secs(5))
        .lookup(&AuthorityQuery::Dot("1234567".to_string()))
        .await
        .unwrap();
    assert!(matches!(lookup, AuthorityLookup::Found(_)));
}

#[tokio::test]
async fn test_not_found_does_not_fall_back() {
    let primary_server = MockServer::start().await;
    let secondary_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&primary_server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string(SNAPSHOT_PAGE))
        .expect(0)
        .mount(&secondary_server)
        .await;

    let client = FallbackAuthorityClient::new(
        primary(&primary_server, Duration::from_secs(5)),
        Some(secondary(&secondary_server)),
    );
    let lookup = client.lookup(&mc("000001")).await.unwrap();
    assert_eq!(lookup, AuthorityLookup::NotFound);
}

#[tokio::test]
async fn test_empty_content_is_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"content": []})))
        .mount(&server)
        .await;

    let lookup = primary(&server, Duration::from_secs(5)).lookup(&mc("000002")).await.unwrap();
    assert_eq!(lookup, AuthorityLookup::NotFound);
}

#[tokio::test]
async fn test_server_error_falls_back_to_snapshot_page() {
    let primary_server = MockServer::start().await;
    let secondary_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&primary_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/query.asp"))
        .and(query_param("query_param", "MC_MX"))
        .and(query_param("query_string", "778899"))
        .respond_with(ResponseTemplate::new(200).set_body_string(SNAPSHOT_PAGE))
        .expect(1)
        .mount(&secondary_server)
        .await;

    let client = FallbackAuthorityClient::new(
        primary(&primary_server, Duration::from_secs(5)),
        Some(secondary(&secondary_server)),
    );
    let AuthorityLookup::Found(snapshot) = client.lookup(&mc("778899")).await.unwrap() else {
        panic!("expected fallback record");
    };
    assert_eq!(snapshot.source, "snapshot_page");
    assert_eq!(snapshot.legal_name.as_deref(), Some("ACME FREIGHT LLC"));
}

#[tokio::test]
async fn test_slow_primary_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(qc_body()).set_delay(Duration::from_secs(3)))
        .mount(&server)
        .await;

    let err = primary(&server, Duration::from_millis(200)).lookup(&mc("778899")).await.unwrap_err();
    assert_eq!(err, SourceError::Timeout);
}

#[tokio::test]
async fn test_error_messages_do_not_leak_web_key() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let err = primary(&server, Duration::from_secs(5)).lookup(&mc("778899")).await.unwrap_err();
    assert!(matches!(err, SourceError::Parse(_)));
    assert!(!err.to_string().contains("secret"));
}

async fn verification_service(registry: &TestRegistry, config: &VerificationConfig) -> VerificationService {
    VerificationService::new(
        registry.verifications.clone(),
        Arc::new(FallbackAuthorityClient::from_config(config).unwrap()),
        registry.carriers.clone(),
        RiskAssessor::default(),
        chrono::Duration::hours(24),
    )
}

#[tokio::test]
async fn test_both_sources_down_is_unverified_high_risk() {
    let primary_server = MockServer::start().await;
    let secondary_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&primary_server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&secondary_server)
        .await;

    let registry = TestRegistry::in_memory().await;
    let config = VerificationConfig {
        primary_base_url: primary_server.uri(),
        secondary_base_url: secondary_server.uri(),
        web_key: Some("secret".to_string()),
        timeout_secs: 5,
        ..VerificationConfig::default()
    };
    let service = verification_service(&registry, &config).await;

    let outcome = service.verify_carrier(Some("778899"), None, false).await.unwrap();
    assert!(!outcome.verified);
    assert_eq!(outcome.risk_level, RiskLevel::High);
    assert_eq!(outcome.risk_score, 0);
    assert!(matches!(outcome.failure, Some(VerificationFailure::Unavailable(_))));
    assert_eq!(outcome.warnings.len(), 1);
}

#[tokio::test]
async fn test_verification_is_cached_after_first_lookup() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/carriers/docket-number/778899"))
        .respond_with(ResponseTemplate::new(200).set_body_json(qc_body()))
        .expect(2)
        .mount(&server)
        .await;

    let registry = TestRegistry::in_memory().await;
    let config = VerificationConfig {
        primary_base_url: server.uri(),
        secondary_enabled: false,
        ..VerificationConfig::default()
    };
    let service = verification_service(&registry, &config).await;

    let first = service.verify_carrier(Some("MC-778899"), None, false).await.unwrap();
    assert!(first.verified);
    assert!(!first.cached);
    assert_eq!(first.risk_level, RiskLevel::Low);

    let second = service.verify_carrier(Some("778899"), None, false).await.unwrap();
    assert!(second.cached);
    assert_eq!(second.risk_score, first.risk_score);

    let forced = service.verify_carrier(Some("778899"), None, true).await.unwrap();
    assert!(!forced.cached);
}
