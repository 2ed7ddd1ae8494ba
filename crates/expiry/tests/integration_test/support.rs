//! Shared fixtures: a recording resolver and reconciler builders.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use dpr_core::ExpiryConfig;
use dpr_expiry::{MetadataResolver, ResolveError, TableExpiryReconciler};
use dpr_redshift::{FieldValue, MockResponse, MockStatementService, Row, StatementGateway};

pub const NOW: i64 = 1_700_000_000_000;

/// Matches only the expired-by-age query.
pub const EXPIRED_QUERY: &str = "::bigint <";
/// Matches only the invalid-metadata query.
pub const INVALID_QUERY: &str = "IS NULL";

pub const DROP: &str = "DROP TABLE IF EXISTS";
pub const UPDATE: &str = "SET TABLE PROPERTIES";

#[derive(Default)]
pub struct MockResolver {
    created: HashMap<String, Option<i64>>,
    failing: HashSet<String>,
    calls: Mutex<Vec<String>>,
}

impl MockResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, location: &str, created: Option<i64>) -> Self {
        self.created.insert(location.to_string(), created);
        self
    }

    pub fn failing(mut self, location: &str) -> Self {
        self.failing.insert(location.to_string());
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl MetadataResolver for MockResolver {
    async fn resolve(&self, location: &str) -> Result<Option<i64>, ResolveError> {
        self.calls.lock().unwrap().push(location.to_string());
        if self.failing.contains(location) {
            return Err(ResolveError::AwsSdk(format!("access denied for {location}")));
        }
        Ok(self.created.get(location).copied().flatten())
    }
}

pub fn name_rows(names: &[&str]) -> Vec<Row> {
    names.iter().map(|n| vec![FieldValue::from(*n)]).collect()
}

pub fn location_rows(tables: &[(&str, &str)]) -> Vec<Row> {
    tables
        .iter()
        .map(|(name, location)| vec![FieldValue::from(*name), FieldValue::from(*location)])
        .collect()
}

/// A service answering both classification queries with the given rows.
pub fn catalog(expired: Vec<Row>, invalid: Vec<Row>) -> MockStatementService {
    MockStatementService::new()
        .on(EXPIRED_QUERY, MockResponse::finished().with_rows(expired))
        .on(INVALID_QUERY, MockResponse::finished().with_rows(invalid))
}

pub fn reconciler(
    service: &Arc<MockStatementService>,
    resolver: &Arc<MockResolver>,
    config: ExpiryConfig,
) -> TableExpiryReconciler {
    let gateway =
        StatementGateway::new(service.clone()).with_poll_interval(Duration::from_millis(1));
    TableExpiryReconciler::new(gateway, resolver.clone(), config)
}

/// Statement counts of every submission containing `pattern`, ascending.
pub fn batch_sizes(service: &MockStatementService, pattern: &str) -> Vec<usize> {
    let mut sizes: Vec<usize> = service
        .submitted_matching(pattern)
        .iter()
        .map(|sql| sql.lines().count())
        .collect();
    sizes.sort_unstable();
    sizes
}

/// Every individual statement containing `pattern`, across all submissions.
pub fn statements(service: &MockStatementService, pattern: &str) -> Vec<String> {
    service
        .submitted()
        .iter()
        .flat_map(|sql| sql.lines().map(str::to_string).collect::<Vec<_>>())
        .filter(|line| line.contains(pattern))
        .collect()
}
