//! Pure domain logic for regulation ingestion.
//!
//! Rule-driven record validation and duplicate resolution. Nothing in this
//! crate touches the database; storage lives in `regwatch-db` and the
//! orchestration in `regwatch-pipeline`.

pub mod constants;
pub mod dedup;
pub mod error;
pub mod report;
pub mod types;
pub mod validation;
