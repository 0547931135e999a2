//! Environment selection

use crate::helpers::*;
use std::sync::Arc;
use tpie::environments::EnvironmentError;
use tpie::{Application, RunnerConfig};

const ENVIRONMENTS: &str = r#"{"$shared": {"host": "https://shared.test"}, "dev": {"host": "https://dev.test"}}"#;

fn collection() -> Collection {
    Collection::new("env")
        .file("env-env.json", ENVIRONMENTS)
        .file("ping-req.http", "GET {{host}}/ping\n")
}

fn client() -> Arc<MockHttpClient> {
    Arc::new(
        MockHttpClient::new()
            .route("https://shared.test/ping", 200, "")
            .route("https://dev.test/ping", 200, ""),
    )
}

#[tokio::test]
async fn test_shared_environment_used_by_default() {
    let collection = collection();
    let client = client();

    let report = run(
        &collection.root(),
        collection.config(),
        client.clone(),
        Arc::new(RecordingReporter::default()),
    )
    .await;

    assert_eq!(report.exit_code, 0);
    assert_eq!(client.sent_urls(), ["https://shared.test/ping"]);
}

#[tokio::test]
async fn test_unknown_environment_fails_before_requests() {
    let collection = collection();
    let client = client();
    let mut config = collection.config();
    config.environment = Some("staging".to_string());

    let report = run(
        &collection.root(),
        config,
        client.clone(),
        Arc::new(RecordingReporter::default()),
    )
    .await;

    assert_eq!(report.exit_code, 1);
    assert!(client.sent_urls().is_empty());
}

#[tokio::test]
async fn test_explicit_environment_file_overrides_discovered_one() {
    let collection = collection().file(
        "other/custom.json",
        r#"{"$shared": {"host": "https://custom.test"}}"#,
    );
    let client = Arc::new(MockHttpClient::new().route("https://custom.test/ping", 200, ""));
    let mut config = collection.config();
    config.environment_file = Some(collection.path("other/custom.json"));

    let report = run(
        &collection.root(),
        config,
        client.clone(),
        Arc::new(RecordingReporter::default()),
    )
    .await;

    assert_eq!(report.exit_code, 0);
    assert_eq!(client.sent_urls(), ["https://custom.test/ping"]);
}

#[tokio::test]
async fn test_missing_environment_file_is_an_error() {
    let collection = collection();
    let config = RunnerConfig {
        environment_file: Some(collection.path("nope.json")),
        ..collection.config()
    };

    let error = Application::new(collection.root(), config)
        .run(tpie::CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(
        error.downcast_ref::<EnvironmentError>(),
        Some(EnvironmentError::FileNotFound(_))
    ));
}
