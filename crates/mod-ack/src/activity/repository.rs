use super::domain::{AckRecord, InstanceId};

/// Record store contract for the `ack` table.
pub trait AckRepository: Send + Sync {
    /// Stores a new row and returns the generated identifier. The `id` of
    /// the given record is ignored.
    fn insert(&self, record: AckRecord) -> Result<InstanceId, RepositoryError>;
    /// Replaces the row carrying `record.id`. `Ok(false)` when no such row
    /// exists.
    fn update(&self, record: AckRecord) -> Result<bool, RepositoryError>;
    fn fetch(&self, id: InstanceId) -> Result<Option<AckRecord>, RepositoryError>;
    fn delete(&self, id: InstanceId) -> Result<(), RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record violates a table constraint: {0}")]
    Constraint(String),
    #[error("update requires a record id")]
    MissingId,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}
