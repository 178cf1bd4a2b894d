//! Common test utilities for API testing with mock sources.
//!
//! This module provides a test fixture that creates an in-process server
//! backed by mock museum sources, enabling end-to-end API tests without
//! network access.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use advisor_core::{
    testing::MockSource, Aggregator, ArtSource, Config, SourceSlot, SourceTag, TieringPolicy,
};

/// Re-export fixtures for test convenience
pub use advisor_core::testing::fixtures;

/// Deadline given to every mock source.
pub const SOURCE_DEADLINE: Duration = Duration::from_millis(200);

/// Test fixture for API testing with mock sources.
///
/// # Example
///
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_initial_fetch() {
///     let fixture = TestFixture::new();
///     fixture.source(SourceTag::Met).set_artworks(fixtures::artworks(SourceTag::Met, 5)).await;
///
///     let response = fixture.get("/api/artworks?count=5").await;
///     assert_eq!(response.status, 200);
/// }
/// ```
pub struct TestFixture {
    /// The Axum router for testing
    pub router: Router,
    /// Mock sources, in the order the aggregator calls them
    pub sources: Vec<Arc<MockSource>>,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
    pub text: String,
}

impl TestResponse {
    /// Ids of the artworks in an `{ "artworks": [...] }` body.
    pub fn artwork_ids(&self) -> Vec<String> {
        self.body["artworks"]
            .as_array()
            .map(|artworks| {
                artworks
                    .iter()
                    .filter_map(|a| a["id"].as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default()
    }
}

impl TestFixture {
    /// Create a fixture with empty Met (fast), Art Institute (fast) and
    /// Rijksmuseum (slow) sources.
    pub fn new() -> Self {
        Self::with_sources(
            vec![
                MockSource::new(SourceTag::Met).with_search(),
                MockSource::new(SourceTag::Artic).with_search(),
                MockSource::new(SourceTag::Rijks),
            ],
            TestConfig::default(),
        )
    }

    /// Create a fixture with the given sources and configuration.
    pub fn with_sources(sources: Vec<MockSource>, test_config: TestConfig) -> Self {
        let mut config = Config::default();
        config.aggregator.default_count = test_config.default_count;
        config.aggregator.max_count = test_config.max_count;
        config.aggregator.enable_tiering = test_config.enable_tiering;

        let sources: Vec<Arc<MockSource>> = sources.into_iter().map(Arc::new).collect();
        let slots = sources
            .iter()
            .map(|source| {
                SourceSlot::new(Arc::clone(source) as Arc<dyn ArtSource>, SOURCE_DEADLINE)
            })
            .collect();
        let aggregator = Aggregator::new(slots, TieringPolicy::from_config(&config.aggregator));

        let state = Arc::new(advisor_server::state::AppState::new(config, aggregator));
        let router = advisor_server::api::create_router(state);

        Self { router, sources }
    }

    /// The mock for `tag`.
    pub fn source(&self, tag: SourceTag) -> &MockSource {
        self.sources
            .iter()
            .find(|s| s.tag() == tag)
            .expect("No mock source for tag")
    }

    /// Send a GET request to the test server.
    pub async fn get(&self, path: &str) -> TestResponse {
        let request = Request::builder()
            .method("GET")
            .uri(path)
            .body(Body::empty())
            .unwrap();

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        let text = String::from_utf8_lossy(&body_bytes).to_string();
        let body: Value = if body_bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body_bytes).unwrap_or(Value::Null)
        };

        TestResponse { status, body, text }
    }
}

/// Configuration for test fixture.
#[derive(Debug, Clone)]
pub struct TestConfig {
    pub default_count: usize,
    pub max_count: usize,
    pub enable_tiering: bool,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            default_count: 30,
            max_count: 100,
            enable_tiering: true,
        }
    }
}

/// Helper to assert a response has expected status.
#[macro_export]
macro_rules! assert_status {
    ($response:expr, $status:expr) => {
        assert_eq!(
            $response.status, $status,
            "Expected status {:?}, got {:?}. Body: {}",
            $status, $response.status, $response.text
        );
    };
}

/// Helper to assert a JSON path equals expected value.
#[macro_export]
macro_rules! assert_json_path {
    ($json:expr, $path:expr, $expected:expr) => {
        let actual = &$json[$path];
        assert_eq!(
            actual, &$expected,
            "Path '{}' expected {:?}, got {:?}",
            $path, $expected, actual
        );
    };
}
