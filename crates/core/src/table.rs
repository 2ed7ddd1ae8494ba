use serde::{Deserialize, Serialize};

/// An external table whose catalog entry lacks a usable modification time.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExternalTableDescriptor {
    pub table_name: String,
    /// Where the table's data lives, e.g. `s3://bucket/prefix/table`.
    pub backing_location: String,
}

impl ExternalTableDescriptor {
    pub fn new(table_name: impl Into<String>, backing_location: impl Into<String>) -> Self {
        Self {
            table_name: table_name.into(),
            backing_location: backing_location.into(),
        }
    }

    /// Attach the resolved backing-data timestamp.
    pub fn with_created(self, created_epoch_millis: Option<i64>) -> ExternalTableMetadata {
        ExternalTableMetadata {
            descriptor: self,
            created_epoch_millis,
        }
    }
}

/// A descriptor plus the backing data's last-modified time in epoch millis.
///
/// `created_epoch_millis` is `None` when the backing data could not be found.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalTableMetadata {
    #[serde(flatten)]
    pub descriptor: ExternalTableDescriptor,
    pub created_epoch_millis: Option<i64>,
}

impl ExternalTableMetadata {
    pub fn table_name(&self) -> &str {
        &self.descriptor.table_name
    }

    pub fn backing_location(&self) -> &str {
        &self.descriptor.backing_location
    }
}
