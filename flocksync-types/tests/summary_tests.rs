use flocksync_types::{DEFAULT_MAX_REPORTED_ERRORS, SyncFailure, SyncSummary};
use pretty_assertions::assert_eq;
use serde_json::json;

#[test]
fn new_summary_is_clean() {
    let summary = SyncSummary::new(5);
    assert_eq!(summary.fetched, 5);
    assert_eq!(summary.upserted, 0);
    assert_eq!(summary.failed, 0);
    assert!(summary.errors.is_empty());
    assert!(summary.is_clean());
}

#[test]
fn record_success_and_failure() {
    let mut summary = SyncSummary::new(3);
    summary.record_success();
    summary.record_failure("x@y.org", "http 400", DEFAULT_MAX_REPORTED_ERRORS);

    assert_eq!(summary.upserted, 1);
    assert_eq!(summary.failed, 1);
    assert_eq!(
        summary.errors,
        vec![SyncFailure {
            email: "x@y.org".to_string(),
            error: "http 400".to_string(),
        }]
    );
    assert_eq!(summary.dropped(), 1);
    assert!(!summary.is_clean());
}

#[test]
fn error_list_is_capped_but_count_is_not() {
    let mut summary = SyncSummary::new(25);
    for i in 0..25 {
        summary.record_failure(format!("{i}@y.org"), "boom", DEFAULT_MAX_REPORTED_ERRORS);
    }
    assert_eq!(summary.failed, 25);
    assert_eq!(summary.errors.len(), 10);
    assert_eq!(summary.errors[0].email, "0@y.org");
    assert_eq!(summary.errors[9].email, "9@y.org");
}

#[test]
fn summary_serializes_counts() {
    let mut summary = SyncSummary::new(2);
    summary.record_success();
    let value = serde_json::to_value(&summary).unwrap();
    assert_eq!(
        value,
        json!({"fetched": 2, "upserted": 1, "failed": 0, "errors": []})
    );
}
