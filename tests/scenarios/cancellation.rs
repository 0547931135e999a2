//! Cancelling a run from outside

use crate::helpers::*;
use std::sync::Arc;
use std::time::Duration;
use tpie::CancellationToken;

#[tokio::test]
async fn test_cancelled_run_exits_130_and_cleans_up() {
    let collection = Collection::new("slow")
        .file("a-req.http", "GET https://api.test/a\n")
        .file("a-test.tps", "test \"ok\" status == 200\n")
        .file("b-req.http", "GET https://api.test/b\n");
    let client = Arc::new(
        MockHttpClient::new()
            .route("https://api.test/a", 200, "")
            .route("https://api.test/b", 200, "")
            .with_delay(Duration::from_millis(300)),
    );
    let reporter = Arc::new(RecordingReporter::default());
    let token = CancellationToken::new();

    let canceller = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        canceller.cancel();
    });

    let report = run_with_token(
        &collection.root(),
        collection.config(),
        client.clone(),
        reporter.clone(),
        token,
    )
    .await;

    assert_eq!(report.exit_code, 130);
    assert!(client.sent_urls().is_empty());
    assert!(reporter.cases.lock().unwrap().is_empty());
    let leftovers = std::fs::read_dir(collection.temp())
        .map(|entries| entries.count())
        .unwrap_or(0);
    assert_eq!(leftovers, 0);
}

#[tokio::test]
async fn test_run_cancelled_before_start() {
    let collection = Collection::new("slow").file("a-req.http", "GET https://api.test/a\n");
    let token = CancellationToken::new();
    token.cancel();

    let report = run_with_token(
        &collection.root(),
        collection.config(),
        Arc::new(MockHttpClient::new()),
        Arc::new(RecordingReporter::default()),
        token,
    )
    .await;

    assert_eq!(report.exit_code, 130);
    assert!(report.summary.test_cases.is_empty());
}
