//! Record-level validation policy.
//!
//! Required fields gate admission of the whole record. Every other field
//! with rules degrades on failure: its value is replaced with `null` and
//! the record is kept.

use std::fmt;

use serde::Serialize;
use serde_json::Value;

use super::field::{validate_field, FieldCheck};
use super::rules::RuleSet;
use crate::types::Record;

/// A rule failure attributed to one field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldFailure {
    pub field: String,
    pub message: String,
    /// `true` when the field is required and the failure discarded the record.
    pub required: bool,
}

/// One entry in a record's diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    Field(FieldFailure),
    /// Final marker on a record dropped for required-field failures.
    Discarded,
}

impl Diagnostic {
    /// The field this diagnostic is about, if any.
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::Field(failure) => Some(&failure.field),
            Self::Discarded => None,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Field(failure) if failure.required => {
                write!(f, "{}: {}", failure.field, failure.message)
            }
            Self::Field(failure) => {
                write!(f, "{}: {} (set to null)", failure.field, failure.message)
            }
            Self::Discarded => f.write_str("Record discarded: required fields invalid"),
        }
    }
}

/// Outcome of validating one record.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordOutcome {
    /// Record admitted; failing optional fields are `null` in `record`.
    Kept {
        record: Record,
        diagnostics: Vec<Diagnostic>,
    },
    /// A required field failed; nothing of the record survives.
    Discarded { diagnostics: Vec<Diagnostic> },
}

impl RecordOutcome {
    pub fn is_kept(&self) -> bool {
        matches!(self, Self::Kept { .. })
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        match self {
            Self::Kept { diagnostics, .. } | Self::Discarded { diagnostics } => diagnostics,
        }
    }

    /// The sanitized record, or `None` if it was discarded.
    pub fn into_record(self) -> Option<Record> {
        match self {
            Self::Kept { record, .. } => Some(record),
            Self::Discarded { .. } => None,
        }
    }
}

/// Validate one record against `rule_set`.
///
/// A required field that is absent or `null` fails even when no rule is
/// configured for it. Fields without rules are passed through verbatim.
pub fn validate_record(mut record: Record, rule_set: &RuleSet) -> RecordOutcome {
    let mut diagnostics = Vec::new();

    for field in rule_set.required_fields() {
        let value = record.get(field);
        let check = match value {
            None | Some(Value::Null) => FieldCheck::Invalid("Missing required value".to_string()),
            Some(_) => validate_field(field, value, rule_set),
        };
        if let FieldCheck::Invalid(message) = check {
            diagnostics.push(Diagnostic::Field(FieldFailure {
                field: field.clone(),
                message,
                required: true,
            }));
        }
    }

    if !diagnostics.is_empty() {
        diagnostics.push(Diagnostic::Discarded);
        return RecordOutcome::Discarded { diagnostics };
    }

    for (field, value) in record.iter_mut() {
        if rule_set.field(field).is_none() {
            continue;
        }
        if let FieldCheck::Invalid(message) = validate_field(field, Some(&*value), rule_set) {
            *value = Value::Null;
            diagnostics.push(Diagnostic::Field(FieldFailure {
                field: field.clone(),
                message,
                required: false,
            }));
        }
    }

    RecordOutcome::Kept {
        record,
        diagnostics,
    }
}
