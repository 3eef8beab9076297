use crate::params::ValidationError;
use crate::store::StoreError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalyticsError {
    #[error("Invalid query parameter: {0}")]
    Validation(#[from] ValidationError),

    #[error("Record store failure: {0}")]
    Store(#[from] StoreError),

    #[error("Failed to encode or decode a cached result: {0}")]
    Serialization(#[from] serde_json::Error),
}
