pub mod error;
pub mod reconciler;
pub mod resolver;
pub mod statements;

pub use error::{ExpiryError, ResolveError};
pub use reconciler::{classify, Disposition, PassReport, TableExpiryReconciler};
pub use resolver::{parse_s3_location, MetadataResolver, S3MetadataResolver};
