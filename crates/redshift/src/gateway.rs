//! Statement execution gateway.
//!
//! Provides [`StatementGateway`] for submitting SQL to a
//! [`StatementService`], polling each statement to a terminal status at a
//! fixed interval, and fanning batched statements out as independent tasks.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use dpr_core::config::DEFAULT_POLL_INTERVAL_MS;

use crate::error::RedshiftError;
use crate::service::StatementService;
use crate::statement::{Row, StatementHandle, StatementStatus};

// ---------------------------------------------------------------------------
// Batches
// ---------------------------------------------------------------------------

/// What a batch of statements does; batch sizes are configured per kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BatchKind {
    Removal,
    Update,
}

impl fmt::Display for BatchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Removal => f.write_str("removal"),
            Self::Update => f.write_str("update"),
        }
    }
}

/// A contiguous slice of statements submitted as one unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch {
    /// Zero-based position among the batches of one submission.
    pub index: usize,
    /// Position of the first statement in the original list.
    pub offset: usize,
    pub statements: Vec<String>,
}

impl Batch {
    /// The single submission text: statements joined by newlines.
    pub fn sql(&self) -> String {
        self.statements.join("\n")
    }
}

/// Split `statements` into `ceil(N / batch_size)` contiguous batches.
///
/// A `batch_size` of zero is treated as one. An empty input yields no batches.
pub fn batch_statements(statements: &[String], batch_size: usize) -> Vec<Batch> {
    let size = batch_size.max(1);
    statements
        .chunks(size)
        .enumerate()
        .map(|(index, chunk)| Batch {
            index,
            offset: index * size,
            statements: chunk.to_vec(),
        })
        .collect()
}

/// A batch whose submit-and-poll task is still running.
pub struct PendingBatch {
    pub kind: BatchKind,
    pub index: usize,
    pub statement_count: usize,
    handle: JoinHandle<bool>,
}

/// How one batch ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchOutcome {
    pub kind: BatchKind,
    pub index: usize,
    pub statement_count: usize,
    /// `true` only when the batch reached `FINISHED`.
    pub succeeded: bool,
}

// ---------------------------------------------------------------------------
// Gateway
// ---------------------------------------------------------------------------

/// Submits statements and tracks them to completion.
///
/// Cloning is cheap; clones share the underlying service.
#[derive(Clone)]
pub struct StatementGateway {
    service: Arc<dyn StatementService>,
    poll_interval: Duration,
}

impl StatementGateway {
    pub fn new(service: Arc<dyn StatementService>) -> Self {
        Self {
            service,
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
        }
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Submit `sql` as-is.
    pub async fn submit(&self, sql: &str) -> Result<StatementHandle, RedshiftError> {
        let handle = self.service.execute_statement(sql).await?;
        debug!(statement_id = %handle, "Statement submitted");
        Ok(handle)
    }

    /// Poll until the statement reaches a terminal status.
    ///
    /// Returns `true` only for `FINISHED`. Failures are logged with the
    /// service's error text rather than returned, so one failed statement
    /// never aborts its siblings. There is no timeout; wrap the call in
    /// `tokio::time::timeout` when an upper bound is needed.
    pub async fn await_completion(&self, handle: &StatementHandle) -> bool {
        loop {
            let description = match self.service.describe_statement(handle).await {
                Ok(description) => description,
                Err(e) => {
                    error!(statement_id = %handle, error = %e, "Could not describe statement");
                    return false;
                }
            };

            if description.status.is_terminal() {
                return if description.status == StatementStatus::Finished {
                    info!(statement_id = %handle, "Query completed successfully");
                    true
                } else {
                    error!(
                        statement_id = %handle,
                        status = %description.status,
                        reason = description.error.as_deref().unwrap_or("unknown"),
                        "Query failed"
                    );
                    false
                };
            }

            info!(statement_id = %handle, status = %description.status, "Query status");
            tokio::time::sleep(self.poll_interval).await;
        }
    }

    /// Rows of a finished statement; empty when the result set is empty.
    pub async fn fetch_results(
        &self,
        handle: &StatementHandle,
    ) -> Result<Vec<Row>, RedshiftError> {
        self.service.get_statement_result(handle).await
    }

    /// Submit, wait, and fetch. `None` when the statement did not finish.
    pub async fn query(&self, sql: &str) -> Result<Option<Vec<Row>>, RedshiftError> {
        let handle = self.submit(sql).await?;
        if !self.await_completion(&handle).await {
            return Ok(None);
        }
        self.fetch_results(&handle).await.map(Some)
    }

    /// Wait for an already-submitted statement and fetch its rows.
    pub async fn collect(
        &self,
        handle: &StatementHandle,
    ) -> Result<Option<Vec<Row>>, RedshiftError> {
        if !self.await_completion(handle).await {
            return Ok(None);
        }
        self.fetch_results(handle).await.map(Some)
    }

    /// Partition `statements` into batches and spawn one submit-and-poll task
    /// per batch. Returns as soon as the tasks are spawned.
    pub fn submit_batches(
        &self,
        kind: BatchKind,
        statements: &[String],
        batch_size: usize,
    ) -> Vec<PendingBatch> {
        batch_statements(statements, batch_size)
            .into_iter()
            .map(|batch| {
                info!(
                    kind = %kind,
                    batch = batch.index,
                    "Executing {} batch for statements {} to {}",
                    kind,
                    batch.offset + 1,
                    batch.offset + batch.statements.len()
                );

                let gateway = self.clone();
                let index = batch.index;
                let statement_count = batch.statements.len();
                let sql = batch.sql();
                debug!(kind = %kind, batch = index, sql = %sql, "Batch statements");

                let handle = tokio::spawn(async move {
                    match gateway.submit(&sql).await {
                        Ok(handle) => gateway.await_completion(&handle).await,
                        Err(e) => {
                            error!(
                                kind = %kind,
                                batch = index,
                                error = %e,
                                "Batch submission failed"
                            );
                            false
                        }
                    }
                });

                PendingBatch {
                    kind,
                    index,
                    statement_count,
                    handle,
                }
            })
            .collect()
    }

    /// Wait for every pending batch. A task that panicked or was cancelled
    /// counts as a failed batch.
    pub async fn await_batches(pending: Vec<PendingBatch>) -> Vec<BatchOutcome> {
        join_all(pending.into_iter().map(|batch| async move {
            let succeeded = match batch.handle.await {
                Ok(succeeded) => succeeded,
                Err(e) => {
                    error!(
                        kind = %batch.kind,
                        batch = batch.index,
                        error = %e,
                        "Batch task did not complete"
                    );
                    false
                }
            };

            BatchOutcome {
                kind: batch.kind,
                index: batch.index,
                statement_count: batch.statement_count,
                succeeded,
            }
        }))
        .await
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
