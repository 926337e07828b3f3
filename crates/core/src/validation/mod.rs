//! Record validation engine.
//!
//! Rule set loading, a per-field evaluator, the record-level
//! required/soft-fail policy and batch statistics. No database access.

pub mod batch;
pub mod field;
pub mod record;
pub mod rules;

pub use batch::{BatchValidator, ValidationStats};
pub use field::{validate_field, FieldCheck};
pub use record::{validate_record, Diagnostic, FieldFailure, RecordOutcome};
pub use rules::{FieldRules, Rule, RuleDescriptor, RuleSet, ValueType};
