//! Batch validation and statistics.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::record::{validate_record, RecordOutcome};
use super::rules::RuleSet;
use crate::error::CoreError;
use crate::types::{value_kind, Record};

/// Counters for one batch run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationStats {
    pub total_records: usize,
    pub valid_records: usize,
    pub discarded_records: usize,
    /// Failure count per field, across discarded and kept records.
    pub field_errors: BTreeMap<String, usize>,
}

/// Applies a fixed [`RuleSet`] to batches of records.
#[derive(Debug, Clone)]
pub struct BatchValidator {
    rules: RuleSet,
}

impl BatchValidator {
    pub fn new(rules: RuleSet) -> Self {
        Self { rules }
    }

    /// Build a validator from a YAML rule file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, CoreError> {
        RuleSet::from_file(path).map(Self::new)
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// Validate every record, keeping admitted ones in input order.
    pub fn validate_batch(&self, records: Vec<Record>) -> (Vec<Record>, ValidationStats) {
        let mut stats = ValidationStats {
            total_records: records.len(),
            ..ValidationStats::default()
        };
        let mut validated = Vec::with_capacity(records.len());

        for record in records {
            let outcome = validate_record(record, &self.rules);
            for field in outcome.diagnostics().iter().filter_map(|d| d.field()) {
                *stats.field_errors.entry(field.to_string()).or_default() += 1;
            }
            match outcome {
                RecordOutcome::Kept { record, .. } => validated.push(record),
                RecordOutcome::Discarded { .. } => stats.discarded_records += 1,
            }
        }

        stats.valid_records = validated.len();
        (validated, stats)
    }

    /// Validate a raw extraction frame.
    ///
    /// Every element must be a JSON object; otherwise the whole frame is
    /// rejected with [`CoreError::MalformedFrame`] and nothing is validated.
    pub fn validate_frame(
        &self,
        frame: &[Value],
    ) -> Result<(Vec<Record>, ValidationStats), CoreError> {
        let records = frame
            .iter()
            .enumerate()
            .map(|(index, value)| match value {
                Value::Object(map) => Ok(map.clone()),
                other => Err(CoreError::MalformedFrame {
                    index,
                    kind: value_kind(other),
                }),
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(self.validate_batch(records))
    }
}
