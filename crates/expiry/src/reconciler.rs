//! External table lifecycle reconciliation.
//!
//! One pass classifies the external tables of a schema and drives the
//! statement gateway to drop expired definitions and back-fill the DDL time
//! of definitions created without a usable one:
//!
//! 1. submit the expired-by-age and invalid-metadata queries together
//! 2. collect expired names (failure here ends the pass)
//! 3. start dropping expired tables
//! 4. collect invalid tables and resolve each backing location
//! 5. drop the stale or missing ones, update the rest
//! 6. wait for every batch from steps 3 and 5

use std::sync::Arc;

use chrono::Utc;
use tracing::{error, info, warn};

use dpr_core::{ExpiryConfig, ExternalTableDescriptor, ExternalTableMetadata};
use dpr_redshift::{
    string_column, BatchKind, BatchOutcome, PendingBatch, StatementGateway, StatementHandle,
};

use crate::error::ExpiryError;
use crate::resolver::MetadataResolver;
use crate::statements;

/// What to do with a table whose catalog DDL time was missing or unparsable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    Remove,
    /// Write this creation time (epoch millis) back to the catalog.
    Update(i64),
}

/// Decide the fate of a resolved table at `now_millis`.
///
/// Timestamps are compared in milliseconds: `expiry_seconds` is scaled up,
/// never the resolved time scaled down.
pub fn classify(
    table: &ExternalTableMetadata,
    now_millis: i64,
    expiry_seconds: u64,
) -> Disposition {
    let expiry_millis = i64::try_from(expiry_seconds)
        .unwrap_or(i64::MAX)
        .saturating_mul(1000);

    match table.created_epoch_millis {
        Some(created) if created.saturating_add(expiry_millis) > now_millis => {
            Disposition::Update(created)
        }
        _ => Disposition::Remove,
    }
}

/// Counts gathered over one pass, for the summary log line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PassReport {
    pub expired_found: usize,
    pub invalid_found: usize,
    /// Invalid tables routed to removal.
    pub invalid_removed: usize,
    /// Invalid tables routed to a DDL-time update.
    pub invalid_updated: usize,
    pub batches_succeeded: usize,
    pub batches_failed: usize,
}

impl PassReport {
    fn record(&mut self, outcomes: &[BatchOutcome]) {
        for outcome in outcomes {
            if outcome.succeeded {
                self.batches_succeeded += 1;
            } else {
                self.batches_failed += 1;
            }
        }
    }
}

pub struct TableExpiryReconciler {
    gateway: StatementGateway,
    resolver: Arc<dyn MetadataResolver>,
    config: ExpiryConfig,
}

impl TableExpiryReconciler {
    pub fn new(
        gateway: StatementGateway,
        resolver: Arc<dyn MetadataResolver>,
        config: ExpiryConfig,
    ) -> Self {
        Self {
            gateway,
            resolver,
            config,
        }
    }

    /// Run one pass at the current time. Never fails: errors are logged.
    pub async fn run(&self) -> Option<PassReport> {
        self.run_at(Utc::now().timestamp_millis()).await
    }

    /// Run one pass treating `now_millis` as the current time.
    pub async fn run_at(&self, now_millis: i64) -> Option<PassReport> {
        match self.reconcile(now_millis).await {
            Ok(report) => {
                info!(
                    expired = report.expired_found,
                    invalid = report.invalid_found,
                    invalid_removed = report.invalid_removed,
                    invalid_updated = report.invalid_updated,
                    batches_succeeded = report.batches_succeeded,
                    batches_failed = report.batches_failed,
                    "Expired table removal complete"
                );
                Some(report)
            }
            Err(e) => {
                error!(error = %e, "Failed to remove tables");
                None
            }
        }
    }

    /// The pass itself. Batch failures are counted in the report; only the
    /// expired-by-age query failing or an unexpected error returns `Err`.
    pub async fn reconcile(&self, now_millis: i64) -> Result<PassReport, ExpiryError> {
        let schema = &self.config.schema;
        let expired_sql = statements::expired_tables_query(schema, self.config.expiry_seconds);
        let invalid_sql = statements::invalid_tables_query(schema);

        info!("Getting expired and invalid table names");
        let (expired_query, invalid_query) = tokio::join!(
            self.gateway.submit(&expired_sql),
            self.gateway.submit(&invalid_sql),
        );
        let expired_query = expired_query?;
        let invalid_query = match invalid_query {
            Ok(handle) => Some(handle),
            Err(e) => {
                warn!(error = %e, "Invalid table query was not accepted, skipping repair");
                None
            }
        };

        let expired = self.expired_table_names(&expired_query).await?;
        info!(count = expired.len(), "Found {} expired tables to remove", expired.len());

        let mut report = PassReport {
            expired_found: expired.len(),
            ..PassReport::default()
        };
        let mut pending = self.remove_tables(&expired);

        match self
            .repair_invalid_tables(invalid_query.as_ref(), now_millis, &mut report)
            .await
        {
            Ok(more) => pending.extend(more),
            Err(e) => {
                // Removals already in flight still run to completion.
                let outcomes = StatementGateway::await_batches(pending).await;
                report.record(&outcomes);
                return Err(e);
            }
        }

        let outcomes = StatementGateway::await_batches(pending).await;
        report.record(&outcomes);
        if report.batches_failed > 0 {
            warn!(failed = report.batches_failed, "Some statement batches failed");
        }
        Ok(report)
    }

    async fn expired_table_names(
        &self,
        query: &StatementHandle,
    ) -> Result<Vec<String>, ExpiryError> {
        let rows = self
            .gateway
            .collect(query)
            .await?
            .ok_or(ExpiryError::ExpiredQueryFailed)?;

        rows.iter()
            .map(|row| string_column(row, 0).map_err(ExpiryError::from))
            .collect()
    }

    /// A rejected or failed invalid-metadata query is treated as empty.
    async fn invalid_tables(
        &self,
        query: Option<&StatementHandle>,
    ) -> Result<Vec<ExternalTableDescriptor>, ExpiryError> {
        let Some(query) = query else {
            return Ok(Vec::new());
        };
        let Some(rows) = self.gateway.collect(query).await? else {
            warn!("Invalid table query did not complete, skipping repair");
            return Ok(Vec::new());
        };

        rows.iter()
            .map(|row| -> Result<ExternalTableDescriptor, ExpiryError> {
                Ok(ExternalTableDescriptor::new(
                    string_column(row, 0)?,
                    string_column(row, 1)?,
                ))
            })
            .collect()
    }

    async fn repair_invalid_tables(
        &self,
        query: Option<&StatementHandle>,
        now_millis: i64,
        report: &mut PassReport,
    ) -> Result<Vec<PendingBatch>, ExpiryError> {
        let invalid = self.invalid_tables(query).await?;
        report.invalid_found = invalid.len();
        if invalid.is_empty() {
            return Ok(Vec::new());
        }
        info!(count = invalid.len(), "Found {} tables without a DDL time", invalid.len());

        let mut resolved = Vec::with_capacity(invalid.len());
        for descriptor in invalid {
            let created = self.resolver.resolve(&descriptor.backing_location).await?;
            resolved.push(descriptor.with_created(created));
        }

        let mut to_remove = Vec::new();
        let mut updates = Vec::new();
        for table in &resolved {
            match classify(table, now_millis, self.config.expiry_seconds) {
                Disposition::Remove => to_remove.push(table.table_name().to_string()),
                Disposition::Update(created) => updates.push(statements::set_last_ddl_time(
                    &self.config.schema,
                    table.table_name(),
                    created,
                )),
            }
        }

        report.invalid_removed = to_remove.len();
        report.invalid_updated = updates.len();
        info!(
            remove = to_remove.len(),
            update = updates.len(),
            "Classified tables without a DDL time"
        );

        let mut pending = self.remove_tables(&to_remove);
        if !updates.is_empty() {
            pending.extend(self.gateway.submit_batches(
                BatchKind::Update,
                &updates,
                self.config.update_batch_size,
            ));
        }
        Ok(pending)
    }

    fn remove_tables(&self, table_names: &[String]) -> Vec<PendingBatch> {
        if table_names.is_empty() {
            return Vec::new();
        }

        let drops: Vec<String> = table_names
            .iter()
            .map(|name| statements::drop_table(&self.config.schema, name))
            .collect();
        self.gateway
            .submit_batches(BatchKind::Removal, &drops, self.config.removal_batch_size)
    }
}
