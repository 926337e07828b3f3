//! Scheduled ingestion worker.
//!
//! Loads its settings from the environment, then runs the ingestion
//! pipeline on a fixed interval with a bounded retry per run.

pub mod config;
pub mod schedule;
