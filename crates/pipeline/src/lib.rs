//! Regulation ingestion pipeline.
//!
//! This crate wires the pure logic in `regwatch-core` to storage and to the
//! external scraper:
//!
//! - [`RegulationStore`]: storage seam, implemented over Postgres by [`PgStore`].
//! - [`RegulationWriter`]: duplicate-safe write cycle for one entity.
//! - [`validate_stage`]: batch validation with the unvalidated fallback.
//! - [`IngestPipeline`]: one extract → validate → write invocation.
//! - [`RegulationSource`]: extraction seam; [`JsonPageSource`] reads scraper dumps.

pub mod error;
pub mod pipeline;
pub mod source;
pub mod stages;
pub mod store;
pub mod writer;

pub use error::{PipelineError, SourceError, StoreError, WriteError};
pub use pipeline::{ContentCheck, IngestPipeline, PipelineReport, RunOptions};
pub use source::{JsonPageSource, RegulationSource};
pub use stages::{validate_stage, ValidationOutcome};
pub use store::{PgConnector, PgStore, RegulationStore, StoreConnector};
pub use writer::RegulationWriter;
