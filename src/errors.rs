use thiserror::Error;

/// A required numeric field is missing, non-finite or out of range.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InvalidMetricError {
    #[error("{field} is missing")]
    Missing { field: &'static str },

    #[error("{field} is not a finite number: {value}")]
    NotFinite { field: &'static str, value: f64 },

    #[error("{field} must be positive, got {value}")]
    NotPositive { field: &'static str, value: f64 },

    #[error("{field} must be a whole number, got {value}")]
    NotWhole { field: &'static str, value: f64 },
}

impl InvalidMetricError {
    pub fn field(&self) -> &'static str {
        match self {
            InvalidMetricError::Missing { field }
            | InvalidMetricError::NotFinite { field, .. }
            | InvalidMetricError::NotPositive { field, .. }
            | InvalidMetricError::NotWhole { field, .. } => field,
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeolocationUnavailableError {
    #[error("no location source is configured")]
    Unsupported,

    #[error("location request was denied: {0}")]
    Denied(String),
}

/// Stored workout data could not be turned back into workouts.
#[derive(Error, Debug)]
pub enum PersistenceParseError {
    #[error("stored workouts are not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("stored workouts could not be read: {0}")]
    Read(#[from] StoreError),

    #[error("stored workouts repeat the id {0}")]
    DuplicateId(String),
}

/// The durable store rejected a write.
#[derive(Error, Debug)]
pub enum PersistenceWriteError {
    #[error("failed to encode workouts: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("failed to write workouts: {0}")]
    Store(#[from] StoreError),
}

/// Failure reported by a key-value backend.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}
