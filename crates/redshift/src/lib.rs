pub mod error;
pub mod gateway;
#[cfg(any(test, feature = "test-utils"))]
pub mod mock;
pub mod service;
pub mod statement;

pub use error::RedshiftError;
pub use gateway::{
    batch_statements, Batch, BatchKind, BatchOutcome, PendingBatch, StatementGateway,
};
#[cfg(any(test, feature = "test-utils"))]
pub use mock::{MockResponse, MockStatementService};
pub use service::{load_sdk_config, RedshiftDataService, StatementService};
pub use statement::{
    string_column, FieldValue, Row, StatementDescription, StatementHandle, StatementStatus,
};
