/// Errors that can occur while talking to the Redshift Data API.
#[derive(Debug, thiserror::Error)]
pub enum RedshiftError {
    /// An AWS SDK error (stringified).
    #[error("AWS SDK error: {0}")]
    AwsSdk(String),

    /// The service accepted a statement but returned no identifier.
    #[error("No statement ID returned")]
    MissingStatementId,

    /// A result cell did not have the shape the caller asked for.
    #[error("Unexpected field in column {column}: expected {expected}, found {found}")]
    UnexpectedField {
        column: usize,
        expected: &'static str,
        found: &'static str,
    },
}
