#![cfg(test)]
use super::{HybridAnalysisAdapter, ProviderAdapter, UrlVoidAdapter, VirusTotalAdapter};
use crate::config::{AppConfig, ProviderConfig};
use crate::types::{Category, ScanTarget};
use httpmock::prelude::*;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

const API_KEY: &str = "test-api-key";

// Helper function to point a provider config at the mock server
fn configured(base_url: &str, retries: u32) -> ProviderConfig {
    ProviderConfig {
        api_key: Some(API_KEY.to_string()),
        base_url: base_url.to_string(),
        retries,
        ..AppConfig::default().providers.virustotal
    }
}

fn file_target() -> ScanTarget {
    ScanTarget::file("a".repeat(64), 4096, "application/octet-stream").unwrap()
}

fn url_target() -> ScanTarget {
    ScanTarget::url("https://login.example.net/verify").unwrap()
}

fn file_path() -> String {
    format!("/files/{}", "a".repeat(64))
}

fn virustotal_report() -> serde_json::Value {
    json!({
        "data": {"attributes": {
            "last_analysis_stats": {"malicious": 2, "suspicious": 0, "undetected": 3, "harmless": 0},
            "last_analysis_results": {
                "Kaspersky": {"category": "malicious", "result": "Trojan.Win32.Agent"},
                "ESET": {"category": "malicious", "result": "Win32/Agent"},
                "ClamAV": {"category": "undetected", "result": null}
            },
            "popular_threat_classification": {
                "popular_threat_category": [{"value": "trojan", "count": 2}]
            }
        }}
    })
}

#[tokio::test]
async fn test_virustotal_sends_api_key_and_parses_report() {
    let server = MockServer::start_async().await;
    let adapter = VirusTotalAdapter::new(configured(&server.base_url(), 0), false).unwrap();
    assert!(adapter.is_configured());
    assert!(adapter.timeout().is_some());

    let mock = server
        .mock_async(|when, then| {
            when.method(GET)
                .path(file_path())
                .header("x-apikey", API_KEY);
            then.status(200)
                .header("Content-Type", "application/json")
                .json_body(virustotal_report());
        })
        .await;

    let result = adapter.query(&file_target()).await;
    mock.assert_async().await;

    assert!(result.succeeded);
    assert!(!result.synthetic);
    assert_eq!(result.positives, 2);
    assert_eq!(result.total, 5);
    assert!(result.categories.contains(&Category::Malware));
}

#[tokio::test]
async fn test_not_found_is_empty_success() {
    let server = MockServer::start_async().await;
    let adapter = VirusTotalAdapter::new(configured(&server.base_url(), 0), false).unwrap();

    server
        .mock_async(|when, then| {
            when.method(GET).path(file_path());
            then.status(404);
        })
        .await;

    let result = adapter.query(&file_target()).await;
    assert!(result.succeeded);
    assert!(!result.synthetic);
    assert_eq!(result.total, 0);
    assert!(result.records.is_empty());
}

#[tokio::test]
async fn test_error_statuses_become_failed_results() {
    let cases = [
        (401, "Authentication failed"),
        (403, "Authentication failed"),
        (429, "rate limit"),
        (500, "Server error: 500"),
    ];

    for (status, expected) in cases {
        let server = MockServer::start_async().await;
        let adapter = VirusTotalAdapter::new(configured(&server.base_url(), 0), false).unwrap();
        let mock = server
            .mock_async(|when, then| {
                when.method(GET).path(file_path());
                then.status(status);
            })
            .await;

        let result = adapter.query(&file_target()).await;
        mock.assert_async().await;

        assert!(!result.succeeded, "status {} should fail", status);
        assert!(!result.synthetic);
        assert_eq!(result.total, 0);
        let error = result.error.unwrap();
        assert!(error.contains(expected), "status {}: {}", status, error);
    }
}

#[tokio::test]
async fn test_non_transient_error_is_not_retried() {
    let server = MockServer::start_async().await;
    let adapter = VirusTotalAdapter::new(configured(&server.base_url(), 2), false).unwrap();
    let mock = server
        .mock_async(|when, then| {
            when.method(GET).path(file_path());
            then.status(401);
        })
        .await;

    let result = adapter.query(&file_target()).await;
    assert!(!result.succeeded);
    mock.assert_hits_async(1).await;
}

#[tokio::test]
async fn test_transient_error_retried_until_budget_spent() {
    let server = MockServer::start_async().await;
    let adapter = VirusTotalAdapter::new(configured(&server.base_url(), 1), false).unwrap();
    let mock = server
        .mock_async(|when, then| {
            when.method(GET).path(file_path());
            then.status(503);
        })
        .await;

    let result = adapter.query(&file_target()).await;
    assert!(!result.succeeded);
    assert!(result.error.unwrap().contains("503"));
    // 首次请求 + 1 次重试
    mock.assert_hits_async(2).await;
}

#[tokio::test]
async fn test_transient_error_then_success() {
    let server = MockServer::start_async().await;
    let adapter = Arc::new(VirusTotalAdapter::new(configured(&server.base_url(), 1), false).unwrap());

    let failing = server
        .mock_async(|when, then| {
            when.method(GET).path(file_path());
            then.status(503);
        })
        .await;

    let task = tokio::spawn({
        let adapter = adapter.clone();
        async move { adapter.query(&file_target()).await }
    });

    // 第一次请求失败后（退避期间）换成正常响应
    let mut waited = 0;
    while failing.hits_async().await == 0 {
        assert!(waited < 500, "first request never arrived");
        tokio::time::sleep(Duration::from_millis(10)).await;
        waited += 1;
    }
    failing.delete_async().await;
    let healthy = server
        .mock_async(|when, then| {
            when.method(GET).path(file_path());
            then.status(200).json_body(virustotal_report());
        })
        .await;

    let result = task.await.unwrap();
    assert!(result.succeeded, "{:?}", result.error);
    assert_eq!(result.positives, 2);
    healthy.assert_async().await;
}

#[tokio::test]
async fn test_malformed_body_is_failed_result() {
    let server = MockServer::start_async().await;
    let adapter = VirusTotalAdapter::new(configured(&server.base_url(), 0), false).unwrap();
    server
        .mock_async(|when, then| {
            when.method(GET).path(file_path());
            then.status(200)
                .header("Content-Type", "application/json")
                .body("{ this is not json");
        })
        .await;

    let result = adapter.query(&file_target()).await;
    assert!(!result.succeeded);
    assert!(result.error.unwrap().contains("parsing failed"));
}

#[tokio::test]
async fn test_hybrid_analysis_headers_and_form() {
    let server = MockServer::start_async().await;
    let adapter = HybridAnalysisAdapter::new(configured(&server.base_url(), 0), false).unwrap();

    let hash_search = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/search/hash")
                .header("api-key", API_KEY)
                .header("User-Agent", "Falcon Sandbox")
                .body_contains(format!("hash={}", "a".repeat(64)));
            then.status(200).json_body(json!([
                {"threat_score": 90, "verdict": "malicious"}
            ]));
        })
        .await;

    let result = adapter.query(&file_target()).await;
    hash_search.assert_async().await;
    assert!(result.succeeded);
    assert_eq!(result.positives, 9);
    assert_eq!(result.total, 10);
    assert!(result.categories.contains(&Category::Malware));

    let quick_scan = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/quick-scan/url")
                .header("api-key", API_KEY)
                .body_contains("scan_type=all");
            then.status(200)
                .json_body(json!({"threat_score": 70, "verdict": "phishing"}));
        })
        .await;

    let result = adapter.query(&url_target()).await;
    quick_scan.assert_async().await;
    assert!(result.succeeded);
    assert!(result.categories.contains(&Category::Phishing));
}

#[tokio::test]
async fn test_hybrid_analysis_bad_score_is_failed_result() {
    let server = MockServer::start_async().await;
    let adapter = HybridAnalysisAdapter::new(configured(&server.base_url(), 0), false).unwrap();
    server
        .mock_async(|when, then| {
            when.method(POST).path("/search/hash");
            then.status(200)
                .json_body(json!([{"threat_score": "high"}]));
        })
        .await;

    let result = adapter.query(&file_target()).await;
    assert!(!result.succeeded);
    assert!(result.error.unwrap().contains("threat_score"));
}

#[tokio::test]
async fn test_urlvoid_sends_key_and_host() {
    let server = MockServer::start_async().await;
    let adapter = UrlVoidAdapter::new(configured(&server.base_url(), 0), false).unwrap();

    let mock = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/domainbl/v1/pay-as-you-go/")
                .query_param("key", API_KEY)
                .query_param("host", "login.example.net");
            then.status(200).json_body(json!({
                "data": {"report": {"blacklists": {"engines": {
                    "0": {"engine": "SpamhausDBL", "detected": true},
                    "1": {"engine": "PhishTank", "detected": true},
                    "2": {"engine": "SURBL", "detected": false}
                }}}}
            }));
        })
        .await;

    let result = adapter.query(&url_target()).await;
    mock.assert_async().await;

    assert!(result.succeeded);
    assert_eq!(result.positives, 2);
    assert_eq!(result.total, 3);
    assert!(result.categories.contains(&Category::Suspicious));
}

#[tokio::test]
async fn test_urlvoid_rejected_key_is_failed_result() {
    let server = MockServer::start_async().await;
    let adapter = UrlVoidAdapter::new(configured(&server.base_url(), 0), false).unwrap();
    server
        .mock_async(|when, then| {
            when.method(GET).path("/domainbl/v1/pay-as-you-go/");
            then.status(200)
                .json_body(json!({"error": "API key is not valid"}));
        })
        .await;

    let result = adapter.query(&url_target()).await;
    assert!(!result.succeeded);
    assert!(result.error.unwrap().contains("Authentication failed"));
}

#[tokio::test]
async fn test_offline_never_touches_network() {
    let server = MockServer::start_async().await;
    let adapter = VirusTotalAdapter::new(configured(&server.base_url(), 0), true).unwrap();
    let mock = server
        .mock_async(|when, then| {
            when.any_request();
            then.status(200).json_body(virustotal_report());
        })
        .await;

    assert!(!adapter.is_configured());
    let result = adapter.query(&file_target()).await;
    assert!(result.synthetic);
    assert!(result.succeeded);
    mock.assert_hits_async(0).await;
}
