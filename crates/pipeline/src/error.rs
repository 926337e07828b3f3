use std::path::PathBuf;

/// Failure of a [`RegulationStore`](crate::store::RegulationStore) call.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A uniqueness constraint rejected the write.
    #[error("Duplicate key violation: {0}")]
    UniqueViolation(String),

    #[error("Database error: {0}")]
    Database(sqlx::Error),

    /// Failure reported by a non-Postgres store.
    #[error("Storage error: {0}")]
    Other(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if regwatch_db::is_unique_violation(&err) {
            Self::UniqueViolation(err.to_string())
        } else {
            Self::Database(err)
        }
    }
}

/// Fatal failure of a write cycle. Duplicate-key races and component-link
/// failures are not errors; they are reported in the
/// [`InsertionReport`](regwatch_core::report::InsertionReport).
#[derive(Debug, thiserror::Error)]
pub enum WriteError {
    #[error("Failed to load existing regulations for entity {entity}: {source}")]
    ExistingKeys {
        entity: String,
        #[source]
        source: StoreError,
    },

    #[error("Error inserting regulations for entity {entity}: {source}")]
    Insert {
        entity: String,
        #[source]
        source: StoreError,
    },
}

/// Failure of a [`RegulationSource`](crate::source::RegulationSource).
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse scraped pages: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Extraction failed: {0}")]
    Other(String),
}

/// Failure that ends an ingestion run early. Reported in
/// [`PipelineReport`](crate::pipeline::PipelineReport) with `success: false`.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Invalid run options: {0}")]
    InvalidOptions(#[from] validator::ValidationErrors),

    #[error(transparent)]
    Source(#[from] SourceError),

    #[error("Database connection error: {0}")]
    Connect(#[source] StoreError),

    #[error(transparent)]
    Write(#[from] WriteError),
}
