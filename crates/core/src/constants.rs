//! Fixed values of the deployed ingestion target.

use crate::types::DbId;

/// Issuing agency whose regulations are scraped and stored.
pub const ENTITY_VALUE: &str = "Agencia Nacional de Infraestructura";

/// Marker written to `regulations_component.components_id` for each new regulation.
pub const REGULATION_COMPONENT_ID: DbId = 7;

/// Pages scraped per run when the caller does not say otherwise.
pub const DEFAULT_PAGES_TO_SCRAPE: u32 = 9;

/// Upper bound on pages fetched by the new-content check.
pub const CONTENT_CHECK_PAGES: u32 = 3;

