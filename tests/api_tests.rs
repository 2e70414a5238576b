//! Integration tests for the clicklink HTTP API.
//!
//! The router is driven in-process through `axum_test::TestServer`, with rate
//! limiting disabled and a manual clock so expiry can be stepped over.

use axum::http::{header, HeaderName, HeaderValue, StatusCode};
use axum_test::TestServer;
use chrono::{Duration, TimeZone, Utc};
use clicklink::activity::{create_activity_channel, LogEntry};
use clicklink::config::{Config, CorsConfig, RateLimitConfig};
use clicklink::routes::create_router;
use clicklink::server::build_state;
use clicklink::services::{ManualClock, Registry, RegistrySettings};
use serde_json::{json, Value};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::mpsc;

struct TestApp {
    server: TestServer,
    clock: Arc<ManualClock>,
    registry: Arc<Registry>,
    // Held so activity entries have somewhere to go
    _activity: mpsc::UnboundedReceiver<LogEntry>,
}

fn test_config() -> Config {
    let mut config = Config::default();
    config.url.base_url = "https://sho.rt".to_string();
    config
}

fn spawn_app() -> TestApp {
    let config = test_config();
    let clock = Arc::new(ManualClock::new(
        Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0).unwrap(),
    ));
    let registry = Arc::new(Registry::with_clock(
        RegistrySettings::from(&config.url),
        clock.clone(),
    ));
    let (activity, receiver) = create_activity_channel();
    let state = build_state(&config, registry.clone(), activity);

    let rate_limit = RateLimitConfig {
        enabled: false,
        ..RateLimitConfig::default()
    };
    let router = create_router(state, &CorsConfig::default(), &rate_limit);

    TestApp {
        server: TestServer::new(router).unwrap(),
        clock,
        registry,
        _activity: receiver,
    }
}

fn shortcode_of(body: &Value) -> String {
    body["shortLink"]
        .as_str()
        .unwrap()
        .rsplit('/')
        .next()
        .unwrap()
        .to_string()
}

mod create_tests {
    use super::*;

    #[tokio::test]
    async fn test_create_returns_short_link_and_expiry() {
        let app = spawn_app();

        let response = app
            .server
            .post("/shorturls")
            .json(&json!({ "url": "https://example.com/a", "validity": 10 }))
            .await;

        response.assert_status(StatusCode::CREATED);
        let body: Value = response.json();
        let link = body["shortLink"].as_str().unwrap();
        assert!(link.starts_with("https://sho.rt/"));

        let code = shortcode_of(&body);
        assert_eq!(code.len(), 6);
        assert!(code.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_eq!(body["expiry"], "2026-01-01T12:10:00Z");
    }

    #[tokio::test]
    async fn test_create_uses_default_validity() {
        let app = spawn_app();

        let response = app
            .server
            .post("/shorturls")
            .json(&json!({ "url": "https://example.com" }))
            .await;

        response.assert_status(StatusCode::CREATED);
        let body: Value = response.json();
        assert_eq!(body["expiry"], "2026-01-01T12:30:00Z");
    }

    #[tokio::test]
    async fn test_create_with_custom_shortcode() {
        let app = spawn_app();

        let response = app
            .server
            .post("/shorturls")
            .json(&json!({ "url": "https://example.com/b", "shortcode": "promo2026" }))
            .await;

        response.assert_status(StatusCode::CREATED);
        let body: Value = response.json();
        assert_eq!(body["shortLink"], "https://sho.rt/promo2026");
    }

    #[tokio::test]
    async fn test_blank_shortcode_gets_generated_code() {
        let app = spawn_app();

        for blank in ["", "   "] {
            let response = app
                .server
                .post("/shorturls")
                .json(&json!({ "url": "https://example.com/blank", "shortcode": blank }))
                .await;

            response.assert_status(StatusCode::CREATED);
            let code = shortcode_of(&response.json::<Value>());
            assert_eq!(code.len(), 6);
            assert!(code.chars().all(|c| c.is_ascii_alphanumeric()));
        }

        assert_eq!(app.registry.len(), 2);
    }

    #[tokio::test]
    async fn test_duplicate_custom_shortcode_rejected() {
        let app = spawn_app();

        app.server
            .post("/shorturls")
            .json(&json!({ "url": "https://example.com/first", "shortcode": "promo" }))
            .await
            .assert_status(StatusCode::CREATED);

        let response = app
            .server
            .post("/shorturls")
            .json(&json!({ "url": "https://example.com/second", "shortcode": "promo" }))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        let body: Value = response.json();
        assert_eq!(body["error"], "SHORTCODE_TAKEN");

        // The first registration is untouched
        let record = app.registry.lookup("promo").unwrap();
        assert_eq!(record.original_url, "https://example.com/first");
    }

    #[tokio::test]
    async fn test_validation_errors() {
        let app = spawn_app();

        let cases = [
            (json!({ "url": "" }), "INVALID_URL"),
            (json!({ "url": "not a url" }), "INVALID_URL"),
            (json!({ "url": "ftp://example.com/file" }), "INVALID_URL"),
            (json!({ "url": "https://example.com", "validity": 0 }), "INVALID_VALIDITY"),
            (json!({ "url": "https://example.com", "validity": -5 }), "INVALID_VALIDITY"),
            (json!({ "url": "https://example.com", "shortcode": "a!" }), "INVALID_SHORTCODE"),
            (json!({ "url": "https://example.com", "shortcode": "bad code" }), "INVALID_SHORTCODE"),
            (json!({ "url": "https://example.com", "shortcode": "admin" }), "INVALID_SHORTCODE"),
        ];

        for (payload, expected) in cases {
            let response = app.server.post("/shorturls").json(&payload).await;
            response.assert_status(StatusCode::BAD_REQUEST);
            let body: Value = response.json();
            assert_eq!(body["error"], expected, "payload: {}", payload);
        }

        assert!(app.registry.is_empty());
    }

    #[tokio::test]
    async fn test_malformed_json_is_bad_request() {
        let app = spawn_app();

        let response = app
            .server
            .post("/shorturls")
            .content_type("application/json")
            .text("{\"url\": ")
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        let body: Value = response.json();
        assert_eq!(body["error"], "BAD_REQUEST");
    }

    #[tokio::test]
    async fn test_missing_url_field_is_bad_request() {
        let app = spawn_app();

        let response = app
            .server
            .post("/shorturls")
            .json(&json!({ "validity": 5 }))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
    }
}

mod redirect_tests {
    use super::*;

    #[tokio::test]
    async fn test_redirect_records_click() {
        let app = spawn_app();

        app.server
            .post("/shorturls")
            .json(&json!({ "url": "https://example.com/target", "shortcode": "go123" }))
            .await
            .assert_status(StatusCode::CREATED);

        let response = app
            .server
            .get("/go123")
            .add_header(
                header::REFERER,
                HeaderValue::from_static("https://news.example/post"),
            )
            .add_header(header::USER_AGENT, HeaderValue::from_static("test-agent/1.0"))
            .add_header(
                HeaderName::from_static("x-forwarded-for"),
                HeaderValue::from_static("203.0.113.7, 10.0.0.1"),
            )
            .await;

        response.assert_status(StatusCode::FOUND);
        assert_eq!(
            response.header(header::LOCATION),
            HeaderValue::from_static("https://example.com/target")
        );

        let stats: Value = app.server.get("/shorturls/go123").await.json();
        assert_eq!(stats["totalClicks"], 1);
        assert_eq!(stats["originalUrl"], "https://example.com/target");
        assert_eq!(stats["expired"], false);

        let click = &stats["clicks"][0];
        assert_eq!(click["referrer"], "https://news.example/post");
        assert_eq!(click["sourceMeta"]["userAgent"], "test-agent/1.0");
        assert_eq!(click["sourceMeta"]["ip"], "203.0.113.7");
    }

    #[tokio::test]
    async fn test_click_without_referrer_is_direct() {
        let app = spawn_app();
        app.registry
            .create("https://example.com", Some("direct1"), 5)
            .unwrap();

        app.server
            .get("/direct1")
            .await
            .assert_status(StatusCode::FOUND);

        let stats: Value = app.server.get("/shorturls/direct1").await.json();
        assert_eq!(stats["clicks"][0]["referrer"], "Direct");
        assert_eq!(stats["clicks"][0]["sourceMeta"]["userAgent"], "Unknown");
    }

    #[tokio::test]
    async fn test_unknown_shortcode_is_not_found() {
        let app = spawn_app();

        let response = app.server.get("/nosuchcode").await;

        response.assert_status(StatusCode::NOT_FOUND);
        let body: Value = response.json();
        assert_eq!(body["error"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_reserved_path_is_not_redirected() {
        let app = spawn_app();

        app.server.get("/admin").await.assert_status(StatusCode::NOT_FOUND);
        app.server
            .get("/favicon.ico")
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_expired_link_is_gone_and_not_counted() {
        let app = spawn_app();
        app.registry
            .create("https://example.com/old", Some("brief"), 1)
            .unwrap();

        app.server.get("/brief").await.assert_status(StatusCode::FOUND);

        // Exactly at expiry the link still resolves
        app.clock.advance(Duration::minutes(1));
        app.server.get("/brief").await.assert_status(StatusCode::FOUND);

        app.clock.advance(Duration::seconds(1));
        let response = app.server.get("/brief").await;
        response.assert_status(StatusCode::GONE);
        let body: Value = response.json();
        assert_eq!(body["error"], "EXPIRED");

        let stats: Value = app.server.get("/shorturls/brief").await.json();
        assert_eq!(stats["expired"], true);
        assert_eq!(stats["totalClicks"], 2);
        assert_eq!(stats["clicks"].as_array().unwrap().len(), 2);
    }
}

mod statistics_tests {
    use super::*;

    #[tokio::test]
    async fn test_statistics_for_fresh_link() {
        let app = spawn_app();
        app.registry
            .create("https://example.com/stats", Some("fresh"), 15)
            .unwrap();

        let response = app.server.get("/shorturls/fresh").await;

        response.assert_status(StatusCode::OK);
        let body: Value = response.json();
        assert_eq!(body["shortcode"], "fresh");
        assert_eq!(body["totalClicks"], 0);
        assert_eq!(body["clicks"], json!([]));
        assert_eq!(body["createdAt"], "2026-01-01T12:00:00Z");
        assert_eq!(body["expiry"], "2026-01-01T12:15:00Z");
    }

    #[tokio::test]
    async fn test_statistics_unknown_shortcode() {
        let app = spawn_app();

        let response = app.server.get("/shorturls/missing").await;

        response.assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_clicks_are_chronological() {
        let app = spawn_app();
        app.registry
            .create("https://example.com", Some("order"), 60)
            .unwrap();

        for _ in 0..3 {
            app.server.get("/order").await.assert_status(StatusCode::FOUND);
            app.clock.advance(Duration::minutes(1));
        }

        let stats: Value = app.server.get("/shorturls/order").await.json();
        let stamps: Vec<&str> = stats["clicks"]
            .as_array()
            .unwrap()
            .iter()
            .map(|c| c["timestamp"].as_str().unwrap())
            .collect();

        assert_eq!(
            stamps,
            vec![
                "2026-01-01T12:00:00Z",
                "2026-01-01T12:01:00Z",
                "2026-01-01T12:02:00Z"
            ]
        );
        assert_eq!(stats["totalClicks"], 3);
    }
}

mod listing_tests {
    use super::*;

    #[tokio::test]
    async fn test_list_newest_first_with_pagination() {
        let app = spawn_app();
        for code in ["first", "second", "third"] {
            app.registry
                .create("https://example.com", Some(code), 30)
                .unwrap();
            app.clock.advance(Duration::seconds(1));
        }

        let body: Value = app
            .server
            .get("/shorturls")
            .add_query_param("limit", 2)
            .await
            .json();

        assert_eq!(body["total"], 3);
        assert_eq!(body["limit"], 2);
        assert_eq!(body["items"][0]["shortcode"], "third");
        assert_eq!(body["items"][1]["shortcode"], "second");

        let rest: Value = app
            .server
            .get("/shorturls")
            .add_query_param("limit", 2)
            .add_query_param("offset", 2)
            .await
            .json();
        assert_eq!(rest["items"].as_array().unwrap().len(), 1);
        assert_eq!(rest["items"][0]["shortcode"], "first");
    }

    #[tokio::test]
    async fn test_bad_query_parameters_get_json_error() {
        let app = spawn_app();

        for (key, value) in [("limit", "-1"), ("offset", "abc")] {
            let response = app
                .server
                .get("/shorturls")
                .add_query_param(key, value)
                .await;

            response.assert_status(StatusCode::BAD_REQUEST);
            let body: Value = response.json();
            assert_eq!(body["error"], "BAD_REQUEST");
            assert!(body["message"].is_string());
        }
    }

    #[tokio::test]
    async fn test_health_reports_registry_summary() {
        let app = spawn_app();
        app.registry
            .create("https://example.com", Some("live1"), 30)
            .unwrap();
        app.registry
            .create("https://example.com", Some("gone1"), 1)
            .unwrap();
        app.registry.record_click("live1", None, Default::default());
        app.clock.advance(Duration::minutes(5));

        let response = app.server.get("/health").await;

        response.assert_status(StatusCode::OK);
        let body: Value = response.json();
        assert_eq!(body["status"], "OK");
        assert_eq!(body["registry"]["totalUrls"], 2);
        assert_eq!(body["registry"]["activeUrls"], 1);
        assert_eq!(body["registry"]["expiredUrls"], 1);
        assert_eq!(body["registry"]["totalClicks"], 1);
    }

    #[tokio::test]
    async fn test_request_id_header_set() {
        let app = spawn_app();

        let response = app.server.get("/health").await;

        assert!(!response.header("x-request-id").is_empty());
    }
}

mod concurrency_tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_concurrent_creates_get_distinct_codes() {
        let registry = Arc::new(Registry::new(RegistrySettings::default()));

        let codes: HashSet<String> = thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|t| {
                    let registry = registry.clone();
                    scope.spawn(move || {
                        (0..50)
                            .map(|i| {
                                registry
                                    .create(&format!("https://example.com/{}/{}", t, i), None, 30)
                                    .unwrap()
                                    .shortcode
                            })
                            .collect::<Vec<_>>()
                    })
                })
                .collect();

            handles
                .into_iter()
                .flat_map(|h| h.join().unwrap())
                .collect()
        });

        assert_eq!(codes.len(), 400);
        assert_eq!(registry.len(), 400);
    }

    #[test]
    fn test_same_custom_code_has_single_winner() {
        let registry = Arc::new(Registry::new(RegistrySettings::default()));

        let winners: usize = thread::scope(|scope| {
            let handles: Vec<_> = (0..16)
                .map(|i| {
                    let registry = registry.clone();
                    scope.spawn(move || {
                        registry
                            .create(&format!("https://example.com/{}", i), Some("contested"), 30)
                            .is_ok()
                    })
                })
                .collect();

            handles
                .into_iter()
                .map(|h| h.join().unwrap() as usize)
                .sum()
        });

        assert_eq!(winners, 1);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_concurrent_clicks_all_counted() {
        let registry = Arc::new(Registry::new(RegistrySettings::default()));
        registry
            .create("https://example.com", Some("busy"), 30)
            .unwrap();

        thread::scope(|scope| {
            for _ in 0..8 {
                let registry = registry.clone();
                scope.spawn(move || {
                    for _ in 0..25 {
                        assert!(registry
                            .record_click("busy", None, Default::default())
                            .is_some());
                    }
                });
            }
        });

        let stats = registry.statistics("busy").unwrap();
        assert_eq!(stats.total_clicks, 200);
        assert_eq!(stats.clicks.len(), 200);
        assert_eq!(stats.record.click_count, 200);
    }
}
