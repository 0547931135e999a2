//! JUnit report written alongside the console output

use crate::helpers::*;
use std::sync::Arc;

#[tokio::test]
async fn test_report_file_written_with_results() {
    let collection = Collection::new("report")
        .file("a-req.http", "GET https://api.test/a\n")
        .file(
            "a-test.tps",
            "test \"ok\" status == 200\ntest \"wrong\" status == 201\nskip \"later\"\n",
        )
        .file("b-init.tps", "skip-case \"flaky\"\n")
        .file("b-req.http", "GET https://api.test/b\n");
    let report_file = collection.temp().join("reports/junit.xml");
    let mut config = collection.config();
    config.report_file = Some(report_file.clone());
    std::fs::create_dir_all(report_file.parent().unwrap()).unwrap();

    let report = run(
        &collection.root(),
        config,
        Arc::new(MockHttpClient::new().route("https://api.test/a", 200, "")),
        Arc::new(RecordingReporter::default()),
    )
    .await;

    assert_eq!(report.exit_code, 1);
    let xml = std::fs::read_to_string(&report_file).unwrap();
    assert!(xml.contains("<testsuites"));
    assert!(xml.contains(r#"classname="a-req.http""#));
    assert!(xml.contains(r#"name="wrong""#));
    assert!(xml.contains("<failure"));
    assert!(xml.contains(r#"message="flaky""#));
    assert_eq!(xml.matches("<testcase").count(), 4);
}
