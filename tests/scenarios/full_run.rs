//! A collection with environments, top-level scripts and per-case scripts

use crate::helpers::*;
use std::sync::Arc;
use tpie::reporting::TestOutcome;

fn shop() -> Collection {
    Collection::new("shop")
        .file(
            "shop-env.json",
            r#"{"$shared": {"host": "https://api.test", "retries": 3}, "dev": {"host": "https://dev.api.test"}}"#,
        )
        .file("setup.tps", "set-global token abc\nlog \"setup done\"\n")
        .file("orders-req.http", "GET {{host}}/orders\n")
        .file("orders-test.tps", "test \"orders ok\" status == 200\n")
        .file("users/get-init.tps", "set-testcase user-id 42\n")
        .file(
            "users/get-req.http",
            "# fetch one user\nGET {{host}}/users/{{user-id}} HTTP/1.1\nAuthorization: Bearer {{token}}\n",
        )
        .file(
            "users/get-test.tps",
            concat!(
                "test \"status\" status == 200\n",
                "test \"name\" json:name == \"tpie\"\n",
                "test \"content type\" header:Content-Type contains json\n",
                "test \"retries from shared\" var:retries == 3\n",
                "skip \"admin fields\"\n",
            ),
        )
}

fn client() -> MockHttpClient {
    MockHttpClient::new()
        .route("https://dev.api.test/orders", 200, "[]")
        .route("https://dev.api.test/users/42", 200, r#"{"name": "tpie"}"#)
}

#[tokio::test]
async fn test_full_run_passes_with_selected_environment() {
    let collection = shop();
    let client = Arc::new(client());
    let reporter = Arc::new(RecordingReporter::default());
    let mut config = collection.config();
    config.environment = Some("dev".to_string());

    let report = run(&collection.root(), config, client.clone(), reporter.clone()).await;

    assert_eq!(report.exit_code, 0);
    assert_eq!(
        client.sent_urls(),
        ["https://dev.api.test/orders", "https://dev.api.test/users/42"]
    );
    let sent = client.sent.lock().unwrap();
    assert_eq!(sent[1].header("authorization"), Some("Bearer abc"));
    drop(sent);

    let users = reporter.case("users/get-req.http");
    assert_eq!(users.tests.len(), 5);
    assert!(users.tests.iter().filter(|t| !t.is_skipped()).all(|t| t.outcome == TestOutcome::Passed));
    assert_eq!(users.tests[4].name, "admin fields");
    assert!(users.tests[4].is_skipped());

    assert_eq!(report.summary.total_tests(), 6);
    assert_eq!(report.summary.passed_tests(), 5);
    assert_eq!(report.summary.skipped_tests(), 1);
    assert_eq!(*reporter.summaries.lock().unwrap(), 1);
}

#[tokio::test]
async fn test_temp_folder_removed_after_run() {
    let collection = shop();
    let reporter = Arc::new(RecordingReporter::default());
    let mut config = collection.config();
    config.environment = Some("dev".to_string());

    let report = run(&collection.root(), config, Arc::new(client()), reporter).await;

    assert_eq!(report.exit_code, 0);
    let leftovers = std::fs::read_dir(collection.temp())
        .map(|entries| entries.count())
        .unwrap_or(0);
    assert_eq!(leftovers, 0);
}

#[tokio::test]
async fn test_captured_value_feeds_later_request() {
    let collection = Collection::new("flow")
        .file("a-login-req.http", "POST https://api.test/login\n\n{\"user\": \"tpie\"}\n")
        .file("a-login-test.tps", "capture session json:session\n")
        .file("b-me-req.http", "GET https://api.test/me?session={{session}}\n")
        .file("b-me-test.tps", "test \"me\" body contains tpie\n");
    let client = Arc::new(
        MockHttpClient::new()
            .route("https://api.test/login", 200, r#"{"session": "s-1"}"#)
            .route("https://api.test/me?session=s-1", 200, r#"{"user": "tpie"}"#),
    );
    let reporter = Arc::new(RecordingReporter::default());

    let report = run(&collection.root(), collection.config(), client.clone(), reporter).await;

    assert_eq!(report.exit_code, 0);
    let sent = client.sent.lock().unwrap();
    assert_eq!(sent[0].method, "POST");
    assert_eq!(sent[0].body.as_deref(), Some("{\"user\": \"tpie\"}"));
    assert_eq!(sent[1].url, "https://api.test/me?session=s-1");
}

#[tokio::test]
async fn test_single_request_file_runs_alone() {
    let collection = Collection::new("solo")
        .file("ping-req.http", "GET https://api.test/ping\n")
        .file("ping-test.tps", "test \"pong\" body == pong\n")
        .file("other-req.http", "GET https://api.test/other\n");
    let client = Arc::new(MockHttpClient::new().route("https://api.test/ping", 200, "pong"));
    let reporter = Arc::new(RecordingReporter::default());

    let report = run(
        &collection.path("ping-req.http"),
        collection.config(),
        client.clone(),
        reporter.clone(),
    )
    .await;

    assert_eq!(report.exit_code, 0);
    assert_eq!(client.sent_urls(), ["https://api.test/ping"]);
    assert_eq!(report.summary.test_cases.len(), 1);
}
