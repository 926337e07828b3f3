//! Write-cycle reporting.

use serde::Serialize;

use crate::dedup::Resolution;

/// Outcome of the secondary `regulations_component` insert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ComponentOutcome {
    /// No identifiers were recovered, so nothing was linked.
    Skipped,
    Inserted { count: u64 },
    Failed { error: String },
}

impl ComponentOutcome {
    pub fn message(&self) -> String {
        match self {
            Self::Skipped => "No new regulation IDs provided".to_string(),
            Self::Inserted { count } => {
                format!("Successfully inserted {count} regulation components")
            }
            Self::Failed { error } => format!("Error inserting regulation components: {error}"),
        }
    }
}

/// Result of one write cycle for one entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InsertionReport {
    pub entity: String,
    pub inserted_count: u64,
    pub message: String,
    pub processed: usize,
    pub existing: usize,
    pub duplicates_found: usize,
    pub internal_duplicates: usize,
    pub components: ComponentOutcome,
}

impl InsertionReport {
    /// A cycle that inserted nothing, explained by `message`.
    pub fn unchanged(resolution: &Resolution, message: impl Into<String>) -> Self {
        Self {
            entity: resolution.entity.clone(),
            inserted_count: 0,
            message: message.into(),
            processed: resolution.candidates,
            existing: resolution.existing,
            duplicates_found: resolution.duplicates_found,
            internal_duplicates: resolution.internal_duplicates,
            components: ComponentOutcome::Skipped,
        }
    }

    /// A cycle that inserted `inserted_count` rows.
    pub fn inserted(
        resolution: &Resolution,
        inserted_count: u64,
        components: ComponentOutcome,
    ) -> Self {
        let message = format!(
            "Entity {}: Processed: {} | Existing: {} | Duplicates skipped: {} | New inserted: {}. {}",
            resolution.entity,
            resolution.candidates,
            resolution.existing,
            resolution.duplicates_skipped(),
            inserted_count,
            components.message()
        );
        Self {
            entity: resolution.entity.clone(),
            inserted_count,
            message,
            processed: resolution.candidates,
            existing: resolution.existing,
            duplicates_found: resolution.duplicates_found,
            internal_duplicates: resolution.internal_duplicates,
            components,
        }
    }

    pub fn duplicates_skipped(&self) -> usize {
        self.duplicates_found + self.internal_duplicates
    }
}
