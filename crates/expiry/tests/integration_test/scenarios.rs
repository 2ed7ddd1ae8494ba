//! End-to-end passes over a scripted catalog.

use std::sync::Arc;

use dpr_core::ExpiryConfig;

use crate::support::*;

#[tokio::test]
async fn expired_table_is_dropped() {
    let service = Arc::new(catalog(name_rows(&["t1"]), vec![]));
    let resolver = Arc::new(MockResolver::new());

    let report = reconciler(&service, &resolver, ExpiryConfig::with_expiry(200))
        .run_at(NOW)
        .await
        .expect("pass completes");

    assert_eq!(statements(&service, DROP), vec!["DROP TABLE IF EXISTS reports.t1;"]);
    assert!(statements(&service, UPDATE).is_empty());
    assert!(resolver.calls().is_empty());
    assert_eq!(report.expired_found, 1);
    assert_eq!(report.batches_succeeded, 1);
    assert_eq!(report.batches_failed, 0);
}

#[tokio::test]
async fn fresh_invalid_table_gets_its_ddl_time() {
    let service = Arc::new(catalog(vec![], location_rows(&[("t2", "loc2")])));
    let resolver = Arc::new(MockResolver::new().with("loc2", Some(NOW)));

    let report = reconciler(&service, &resolver, ExpiryConfig::with_expiry(200))
        .run_at(NOW)
        .await
        .expect("pass completes");

    assert_eq!(
        statements(&service, UPDATE),
        vec!["ALTER TABLE reports.t2 SET TABLE PROPERTIES ('transient_lastDdlTime'='1700000000');"]
    );
    assert!(statements(&service, DROP).is_empty());
    assert_eq!(resolver.calls(), vec!["loc2".to_string()]);
    assert_eq!(report.invalid_found, 1);
    assert_eq!(report.invalid_updated, 1);
    assert_eq!(report.invalid_removed, 0);
}

#[tokio::test]
async fn invalid_table_without_backing_data_is_dropped() {
    let service = Arc::new(catalog(vec![], location_rows(&[("t3", "loc3")])));
    let resolver = Arc::new(MockResolver::new().with("loc3", None));

    let report = reconciler(&service, &resolver, ExpiryConfig::with_expiry(200))
        .run_at(NOW)
        .await
        .expect("pass completes");

    assert_eq!(statements(&service, DROP), vec!["DROP TABLE IF EXISTS reports.t3;"]);
    assert!(statements(&service, UPDATE).is_empty());
    assert_eq!(resolver.calls(), vec!["loc3".to_string()]);
    assert_eq!(report.invalid_removed, 1);
}

#[tokio::test]
async fn stale_backing_data_is_dropped_not_updated() {
    let created = NOW - 200_000;
    let service = Arc::new(catalog(vec![], location_rows(&[("t4", "loc4")])));
    let resolver = Arc::new(MockResolver::new().with("loc4", Some(created)));

    reconciler(&service, &resolver, ExpiryConfig::with_expiry(200))
        .run_at(NOW)
        .await
        .expect("pass completes");

    assert_eq!(statements(&service, DROP), vec!["DROP TABLE IF EXISTS reports.t4;"]);
    assert!(statements(&service, UPDATE).is_empty());
}

#[tokio::test]
async fn mixed_invalid_tables_are_partitioned() {
    let service = Arc::new(catalog(
        vec![],
        location_rows(&[("fresh", "s3://b/fresh"), ("gone", "s3://b/gone"), ("old", "s3://b/old")]),
    ));
    let resolver = Arc::new(
        MockResolver::new()
            .with("s3://b/fresh", Some(NOW - 1_000))
            .with("s3://b/old", Some(NOW - 10_000_000)),
    );

    let report = reconciler(&service, &resolver, ExpiryConfig::with_expiry(200))
        .run_at(NOW)
        .await
        .expect("pass completes");

    let mut drops = statements(&service, DROP);
    drops.sort();
    assert_eq!(
        drops,
        vec!["DROP TABLE IF EXISTS reports.gone;", "DROP TABLE IF EXISTS reports.old;"]
    );
    let updates = statements(&service, UPDATE);
    assert_eq!(updates.len(), 1);
    assert!(updates[0].contains("reports.fresh"));
    // Every invalid table lands in exactly one path.
    assert_eq!(report.invalid_removed + report.invalid_updated, report.invalid_found);
    // One resolver call per descriptor, in catalog order.
    assert_eq!(resolver.calls(), vec!["s3://b/fresh", "s3://b/gone", "s3://b/old"]);
}

#[tokio::test]
async fn table_in_both_queries_is_dropped_twice() {
    let service = Arc::new(catalog(name_rows(&["dup"]), location_rows(&[("dup", "s3://b/dup")])));
    let resolver = Arc::new(MockResolver::new());

    reconciler(&service, &resolver, ExpiryConfig::with_expiry(200))
        .run_at(NOW)
        .await
        .expect("pass completes");

    assert_eq!(statements(&service, DROP).len(), 2);
}

#[tokio::test]
async fn empty_catalog_submits_only_the_queries() {
    let service = Arc::new(catalog(vec![], vec![]));
    let resolver = Arc::new(MockResolver::new());

    let report = reconciler(&service, &resolver, ExpiryConfig::with_expiry(200))
        .run_at(NOW)
        .await
        .expect("pass completes");

    assert_eq!(service.submitted().len(), 2);
    assert_eq!(report, dpr_expiry::PassReport::default());
}

#[tokio::test]
async fn custom_schema_is_used_everywhere() {
    let service = Arc::new(catalog(name_rows(&["t1"]), vec![]));
    let resolver = Arc::new(MockResolver::new());
    let config = ExpiryConfig {
        schema: "curated".to_string(),
        ..ExpiryConfig::with_expiry(60)
    };

    reconciler(&service, &resolver, config).run_at(NOW).await.expect("pass completes");

    assert_eq!(service.submitted_matching("schemaname = 'curated'").len(), 2);
    assert_eq!(statements(&service, DROP), vec!["DROP TABLE IF EXISTS curated.t1;"]);
}
