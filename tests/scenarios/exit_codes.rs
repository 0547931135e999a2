//! How failures, skips and explicit exits map to the process exit code

use crate::helpers::*;
use std::sync::Arc;

fn ok_client() -> Arc<MockHttpClient> {
    Arc::new(
        MockHttpClient::new()
            .route("https://api.test/a", 200, r#"{"id": 1}"#)
            .route("https://api.test/b", 500, "boom"),
    )
}

#[tokio::test]
async fn test_failed_assertion_completes_run_with_exit_one() {
    let collection = Collection::new("api")
        .file("a-req.http", "GET https://api.test/a\n")
        .file("a-test.tps", "test \"id\" json:id == 2\n")
        .file("b-req.http", "GET https://api.test/b\n")
        .file("b-test.tps", "test \"server error\" status == 500\n");
    let client = ok_client();
    let reporter = Arc::new(RecordingReporter::default());

    let report = run(&collection.root(), collection.config(), client.clone(), reporter.clone()).await;

    assert_eq!(report.exit_code, 1);
    // later cases still run after a failed assertion
    assert_eq!(client.sent_urls().len(), 2);
    assert!(reporter.case("a-req.http").is_failed());
    assert!(!reporter.case("b-req.http").is_failed());
    assert_eq!(report.summary.failed_tests(), 1);
}

#[tokio::test]
async fn test_exit_statement_sets_code_and_stops() {
    let collection = Collection::new("api")
        .file("a-init.tps", "exit 12\n")
        .file("a-req.http", "GET https://api.test/a\n")
        .file("b-req.http", "GET https://api.test/b\n");
    let client = ok_client();
    let reporter = Arc::new(RecordingReporter::default());

    let report = run(&collection.root(), collection.config(), client.clone(), reporter.clone()).await;

    assert_eq!(report.exit_code, 12);
    assert!(client.sent_urls().is_empty());
    assert_eq!(*reporter.summaries.lock().unwrap(), 0);
}

#[tokio::test]
async fn test_skip_case_skips_request_and_post_scripts() {
    let collection = Collection::new("api")
        .file("a-init.tps", "skip-case \"not deployed yet\"\n")
        .file("a-req.http", "GET https://api.test/a\n")
        .file("a-test.tps", "test \"never\" status == 200\n")
        .file("b-req.http", "GET https://api.test/b\n");
    let client = ok_client();
    let reporter = Arc::new(RecordingReporter::default());

    let report = run(&collection.root(), collection.config(), client.clone(), reporter.clone()).await;

    assert_eq!(report.exit_code, 0);
    assert_eq!(client.sent_urls(), ["https://api.test/b"]);
    let skipped = reporter.case("a-req.http");
    assert_eq!(skipped.skip_reason.as_deref(), Some("not deployed yet"));
    assert!(skipped.tests.is_empty());
}

#[tokio::test]
async fn test_transport_error_fails_run() {
    let collection = Collection::new("api").file("c-req.http", "GET https://api.test/unknown\n");
    let reporter = Arc::new(RecordingReporter::default());

    let report = run(&collection.root(), collection.config(), ok_client(), reporter).await;

    assert_eq!(report.exit_code, 1);
    assert!(report.summary.test_cases.is_empty());
}

#[tokio::test]
async fn test_script_compile_error_fails_run() {
    let collection = Collection::new("api")
        .file("setup.tps", "set token\n")
        .file("a-req.http", "GET https://api.test/a\n");
    let client = ok_client();
    let reporter = Arc::new(RecordingReporter::default());

    let report = run(&collection.root(), collection.config(), client.clone(), reporter).await;

    assert_eq!(report.exit_code, 1);
    assert!(client.sent_urls().is_empty());
}
