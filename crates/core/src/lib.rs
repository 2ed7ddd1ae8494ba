pub mod config;
pub mod error;
pub mod table;

pub use config::{DprConfig, ExpiryConfig, RedshiftConfig};
pub use error::ConfigError;
pub use table::{ExternalTableDescriptor, ExternalTableMetadata};
