//! Batch sizing across removal and update paths.

use std::sync::Arc;

use dpr_core::ExpiryConfig;

use crate::support::*;

fn names(n: usize) -> Vec<String> {
    (0..n).map(|i| format!("t{i}")).collect()
}

#[tokio::test]
async fn removals_split_at_batch_size() {
    let expired = names(501);
    let refs: Vec<&str> = expired.iter().map(String::as_str).collect();
    let service = Arc::new(catalog(name_rows(&refs), vec![]));
    let resolver = Arc::new(MockResolver::new());

    let report = reconciler(&service, &resolver, ExpiryConfig::with_expiry(200))
        .run_at(NOW)
        .await
        .expect("pass completes");

    assert_eq!(batch_sizes(&service, DROP), vec![1, 500]);
    assert_eq!(report.batches_succeeded, 2);

    // Batching neither drops nor duplicates statements.
    let mut dropped = statements(&service, DROP);
    dropped.sort();
    let mut expected: Vec<String> = expired
        .iter()
        .map(|t| format!("DROP TABLE IF EXISTS reports.{t};"))
        .collect();
    expected.sort();
    assert_eq!(dropped, expected);
}

#[tokio::test]
async fn updates_use_their_own_batch_size() {
    let tables: Vec<(String, String)> = names(5)
        .into_iter()
        .map(|t| (t.clone(), format!("s3://b/{t}")))
        .collect();
    let rows: Vec<(&str, &str)> = tables.iter().map(|(t, l)| (t.as_str(), l.as_str())).collect();

    let mut resolver = MockResolver::new();
    for (_, location) in &tables {
        resolver = resolver.with(location, Some(NOW));
    }
    let resolver = Arc::new(resolver);
    let service = Arc::new(catalog(vec![], location_rows(&rows)));
    let config = ExpiryConfig {
        update_batch_size: 2,
        ..ExpiryConfig::with_expiry(200)
    };

    reconciler(&service, &resolver, config).run_at(NOW).await.expect("pass completes");

    assert_eq!(batch_sizes(&service, UPDATE), vec![1, 2, 2]);
    assert!(batch_sizes(&service, DROP).is_empty());
}

#[tokio::test]
async fn invalid_removals_get_their_own_batches() {
    let service = Arc::new(catalog(
        name_rows(&["a", "b", "c"]),
        location_rows(&[("x", "s3://b/x"), ("y", "s3://b/y")]),
    ));
    let resolver = Arc::new(MockResolver::new());
    let config = ExpiryConfig {
        removal_batch_size: 2,
        ..ExpiryConfig::with_expiry(200)
    };

    let report = reconciler(&service, &resolver, config)
        .run_at(NOW)
        .await
        .expect("pass completes");

    // Expired: [a, b] + [c]; invalid: [x, y].
    assert_eq!(batch_sizes(&service, DROP), vec![1, 2, 2]);
    assert_eq!(report.batches_succeeded, 3);
}
