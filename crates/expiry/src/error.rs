use thiserror::Error;

use dpr_redshift::RedshiftError;

/// Errors from resolving a backing location's timestamp.
#[derive(Error, Debug)]
pub enum ResolveError {
    #[error("invalid backing location: {0}")]
    InvalidLocation(String),

    #[error("AWS SDK error: {0}")]
    AwsSdk(String),
}

/// Errors that end a reconciliation pass early.
#[derive(Error, Debug)]
pub enum ExpiryError {
    /// Without the expired-by-age list there is nothing safe to do.
    #[error("expired table query did not complete")]
    ExpiredQueryFailed,

    #[error("statement error: {0}")]
    Statement(#[from] RedshiftError),

    #[error("resolver error: {0}")]
    Resolve(#[from] ResolveError),
}
