//! Models for `regulations` and `regulations_component`.

use chrono::NaiveDate;
use regwatch_core::dedup::RegulationKey;
use regwatch_core::types::DbId;
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `regulations` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Regulation {
    pub id: DbId,
    pub title: String,
    pub created_at: Option<NaiveDate>,
    pub update_at: Option<NaiveDate>,
    pub is_active: Option<bool>,
    pub gtype: Option<String>,
    pub entity: String,
    pub external_link: Option<String>,
    pub rtype_id: Option<i64>,
    pub summary: Option<String>,
    pub classification_id: Option<i64>,
}

/// The duplicate-key columns of a stored regulation, as text.
#[derive(Debug, Clone, FromRow)]
pub struct RegulationKeyRow {
    pub title: String,
    pub created_at: Option<String>,
    pub external_link: Option<String>,
}

impl From<RegulationKeyRow> for RegulationKey {
    fn from(row: RegulationKeyRow) -> Self {
        RegulationKey::new(
            &row.title,
            row.created_at.as_deref(),
            row.external_link.as_deref(),
        )
    }
}

/// A row from the `regulations_component` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct RegulationComponent {
    pub id: DbId,
    pub regulations_id: DbId,
    pub components_id: DbId,
}
