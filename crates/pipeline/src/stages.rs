//! Validation stage with the degrade-gracefully fallback.

use regwatch_core::types::{value_kind, Record};
use regwatch_core::validation::{BatchValidator, ValidationStats};
use serde::Serialize;
use serde_json::Value;

/// Output of the validation stage.
#[derive(Debug, Clone, Serialize)]
pub struct ValidationOutcome {
    pub records: Vec<Record>,
    pub stats: ValidationStats,
    /// Set when the frame could not be validated and `records` passed
    /// through unvalidated. Holds the reason.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validation_skipped: Option<String>,
}

/// Validate a raw extraction frame.
///
/// If the frame is malformed the whole batch passes through unvalidated
/// (objects only) and the outcome is tagged with the reason, so downstream
/// stages know validation was skipped.
pub fn validate_stage(validator: &BatchValidator, frame: Vec<Value>) -> ValidationOutcome {
    match validator.validate_frame(&frame) {
        Ok((records, stats)) => {
            tracing::info!(
                total = stats.total_records,
                valid = stats.valid_records,
                discarded = stats.discarded_records,
                "Validation complete"
            );
            for (field, count) in &stats.field_errors {
                tracing::debug!(field = %field, count, "Field validation failures");
            }
            ValidationOutcome {
                records,
                stats,
                validation_skipped: None,
            }
        }
        Err(e) => {
            tracing::warn!(error = %e, "Validation failed, continuing with unvalidated records");
            let total = frame.len();
            let records: Vec<Record> = frame
                .into_iter()
                .filter_map(|value| match value {
                    Value::Object(record) => Some(record),
                    other => {
                        tracing::warn!(
                            kind = value_kind(&other),
                            "Dropping non-object element from unvalidated frame"
                        );
                        None
                    }
                })
                .collect();
            let stats = ValidationStats {
                total_records: total,
                valid_records: records.len(),
                discarded_records: 0,
                field_errors: Default::default(),
            };
            ValidationOutcome {
                records,
                stats,
                validation_skipped: Some(e.to_string()),
            }
        }
    }
}
