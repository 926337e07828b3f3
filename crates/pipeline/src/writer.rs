//! Duplicate-safe write cycle.
//!
//! One cycle reads the stored keys for an entity, drops candidates that are
//! already stored or repeated in the batch, inserts the rest in a single
//! transaction and links the new rows to the component marker. Running the
//! same batch twice inserts it once.

use regwatch_core::constants::REGULATION_COMPONENT_ID;
use regwatch_core::dedup::{resolve_duplicates, Resolution};
use regwatch_core::report::{ComponentOutcome, InsertionReport};
use regwatch_core::types::{DbId, Record};

use crate::error::{StoreError, WriteError};
use crate::store::RegulationStore;

/// Writes validated regulations through a [`RegulationStore`].
pub struct RegulationWriter<'a, S: ?Sized> {
    store: &'a S,
    component_id: DbId,
}

impl<'a, S: RegulationStore + ?Sized> RegulationWriter<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self {
            store,
            component_id: REGULATION_COMPONENT_ID,
        }
    }

    /// Override the marker written to `regulations_component.components_id`.
    pub fn with_component_id(mut self, component_id: DbId) -> Self {
        self.component_id = component_id;
        self
    }

    /// Run a full write cycle for `entity`: resolve duplicates, then write.
    pub async fn write_new_records(
        &self,
        records: Vec<Record>,
        entity: &str,
    ) -> Result<InsertionReport, WriteError> {
        let resolution = self.resolve(records, entity).await?;
        self.write(&resolution).await
    }

    /// Partition `records` against the keys currently stored for `entity`.
    ///
    /// Keys are re-read on every call; concurrent writers may have added rows.
    pub async fn resolve(
        &self,
        records: Vec<Record>,
        entity: &str,
    ) -> Result<Resolution, WriteError> {
        let existing =
            self.store
                .existing_keys(entity)
                .await
                .map_err(|source| WriteError::ExistingKeys {
                    entity: entity.to_string(),
                    source,
                })?;
        tracing::info!(entity, existing = existing.rows(), "Loaded existing regulation keys");

        let resolution = resolve_duplicates(records, entity, &existing);
        tracing::info!(
            entity,
            candidates = resolution.candidates,
            duplicates_found = resolution.duplicates_found,
            internal_duplicates = resolution.internal_duplicates,
            new_records = resolution.new_records.len(),
            "Duplicate validation complete"
        );
        Ok(resolution)
    }

    /// Insert the new records of `resolution` and link their components.
    ///
    /// A uniqueness violation means another writer stored some of these
    /// rows first; it is reported as zero inserted rather than an error.
    pub async fn write(&self, resolution: &Resolution) -> Result<InsertionReport, WriteError> {
        let entity = resolution.entity.as_str();

        if resolution.new_records.is_empty() {
            return Ok(InsertionReport::unchanged(resolution, resolution.message()));
        }

        tracing::info!(entity, rows = resolution.new_records.len(), "Inserting regulations");
        let inserted = match self.store.insert_regulations(&resolution.new_records).await {
            Ok(0) => {
                return Ok(InsertionReport::unchanged(
                    resolution,
                    format!("No records were actually inserted for entity {entity}"),
                ));
            }
            Ok(n) => n,
            Err(StoreError::UniqueViolation(detail)) => {
                tracing::warn!(
                    entity,
                    error = %detail,
                    "Duplicate key on insert, another writer stored these rows first"
                );
                return Ok(InsertionReport::unchanged(
                    resolution,
                    format!("Some records for entity {entity} were duplicates and skipped"),
                ));
            }
            Err(source) => {
                return Err(WriteError::Insert {
                    entity: entity.to_string(),
                    source,
                });
            }
        };

        let components = self.link_components(entity, inserted).await;
        let report = InsertionReport::inserted(resolution, inserted, components);
        tracing::info!(entity, inserted, message = %report.message, "Write cycle complete");
        Ok(report)
    }

    /// Best-effort: failures are reported, the inserted regulations stay.
    async fn link_components(&self, entity: &str, inserted: u64) -> ComponentOutcome {
        // Assumes nobody else inserted rows for this entity since our commit.
        // An INSERT ... RETURNING id would make this exact.
        let ids = match self.store.latest_ids(entity, inserted).await {
            Ok(ids) => ids,
            Err(e) => {
                tracing::error!(entity, error = %e, "Failed to recover inserted regulation IDs");
                return ComponentOutcome::Failed {
                    error: e.to_string(),
                };
            }
        };

        if ids.is_empty() {
            return ComponentOutcome::Skipped;
        }

        match self.store.insert_components(&ids, self.component_id).await {
            Ok(count) => ComponentOutcome::Inserted { count },
            Err(e) => {
                tracing::error!(entity, error = %e, "Failed to insert regulation components");
                ComponentOutcome::Failed {
                    error: e.to_string(),
                }
            }
        }
    }
}
