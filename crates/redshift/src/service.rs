//! The statement-execution service seam and its Redshift Data API adapter.

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_redshiftdata::types::{Field, StatusString};
use aws_types::region::Region;
use aws_types::SdkConfig;
use tracing::{debug, info, warn};

use dpr_core::RedshiftConfig;

use crate::error::RedshiftError;
use crate::statement::{FieldValue, Row, StatementDescription, StatementHandle, StatementStatus};

/// The three calls the gateway needs from a remote statement service.
#[async_trait]
pub trait StatementService: Send + Sync {
    /// Start executing `sql`. The service is authoritative on syntax.
    async fn execute_statement(&self, sql: &str) -> Result<StatementHandle, RedshiftError>;

    /// Report the current status of a statement.
    async fn describe_statement(
        &self,
        handle: &StatementHandle,
    ) -> Result<StatementDescription, RedshiftError>;

    /// Fetch every result row of a finished statement, across all pages.
    async fn get_statement_result(&self, handle: &StatementHandle)
        -> Result<Vec<Row>, RedshiftError>;
}

/// Load the shared AWS SDK config for `region`.
pub async fn load_sdk_config(region: &str) -> SdkConfig {
    aws_config::defaults(BehaviorVersion::latest())
        .region(Region::new(region.to_string()))
        .load()
        .await
}

/// [`StatementService`] backed by the Redshift Data API.
///
/// Every request carries the cluster identifier, database and credential
/// secret from [`RedshiftConfig`].
pub struct RedshiftDataService {
    client: aws_sdk_redshiftdata::Client,
    cluster_id: String,
    database: String,
    secret_arn: String,
}

impl RedshiftDataService {
    pub fn new(client: aws_sdk_redshiftdata::Client, config: &RedshiftConfig) -> Self {
        info!(
            cluster = %config.cluster_id,
            database = %config.database,
            "RedshiftDataService initialised"
        );

        Self {
            client,
            cluster_id: config.cluster_id.clone(),
            database: config.database.clone(),
            secret_arn: config.secret_arn.clone(),
        }
    }
}

#[async_trait]
impl StatementService for RedshiftDataService {
    async fn execute_statement(&self, sql: &str) -> Result<StatementHandle, RedshiftError> {
        let resp = self
            .client
            .execute_statement()
            .cluster_identifier(&self.cluster_id)
            .database(&self.database)
            .secret_arn(&self.secret_arn)
            .sql(sql)
            .send()
            .await
            .map_err(|e| RedshiftError::AwsSdk(e.to_string()))?;

        let id = resp.id().ok_or(RedshiftError::MissingStatementId)?;
        Ok(StatementHandle::new(id))
    }

    async fn describe_statement(
        &self,
        handle: &StatementHandle,
    ) -> Result<StatementDescription, RedshiftError> {
        let resp = self
            .client
            .describe_statement()
            .id(&handle.id)
            .send()
            .await
            .map_err(|e| RedshiftError::AwsSdk(e.to_string()))?;

        // A missing status means the service has not picked the statement up yet.
        let status = match resp.status() {
            Some(status) => convert_status(status),
            None => StatementStatus::Submitted,
        };

        Ok(StatementDescription {
            status,
            error: resp.error().map(|e| e.to_string()),
        })
    }

    async fn get_statement_result(
        &self,
        handle: &StatementHandle,
    ) -> Result<Vec<Row>, RedshiftError> {
        let mut rows = Vec::new();
        let mut next_token: Option<String> = None;

        loop {
            let resp = self
                .client
                .get_statement_result()
                .id(&handle.id)
                .set_next_token(next_token.take())
                .send()
                .await
                .map_err(|e| RedshiftError::AwsSdk(e.to_string()))?;

            rows.extend(
                resp.records()
                    .iter()
                    .map(|record| record.iter().map(convert_field).collect::<Row>()),
            );

            match resp.next_token() {
                Some(token) if !token.is_empty() => next_token = Some(token.to_string()),
                _ => break,
            }
        }

        debug!(statement_id = %handle, rows = rows.len(), "Fetched statement result");
        Ok(rows)
    }
}

fn convert_status(status: &StatusString) -> StatementStatus {
    match status {
        StatusString::Submitted => StatementStatus::Submitted,
        StatusString::Picked => StatementStatus::Picked,
        StatusString::Started => StatementStatus::Started,
        StatusString::Finished => StatementStatus::Finished,
        StatusString::Failed => StatementStatus::Failed,
        StatusString::Aborted => StatementStatus::Aborted,
        // `ALL` is a filter value and anything newer is unknown to us: keep polling.
        other => {
            warn!(status = %other.as_str(), "Unrecognised statement status");
            StatementStatus::Submitted
        }
    }
}

fn convert_field(field: &Field) -> FieldValue {
    match field {
        Field::StringValue(s) => FieldValue::String(s.clone()),
        Field::LongValue(v) => FieldValue::Long(*v),
        Field::DoubleValue(v) => FieldValue::Double(*v),
        Field::BooleanValue(v) => FieldValue::Boolean(*v),
        Field::BlobValue(b) => FieldValue::Blob(b.as_ref().to_vec()),
        _ => FieldValue::Null,
    }
}
