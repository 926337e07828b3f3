//! Repository for the `regulations_component` link table.

use regwatch_core::types::DbId;
use sqlx::PgPool;

use crate::models::regulation::RegulationComponent;

/// Provides insert and lookup operations for regulation components.
pub struct RegulationComponentRepo;

impl RegulationComponentRepo {
    /// Link every regulation in `regulation_ids` to `component_id`.
    ///
    /// Uses a single `UNNEST` insert. Does not check for existing links.
    pub async fn insert_batch(
        pool: &PgPool,
        regulation_ids: &[DbId],
        component_id: DbId,
    ) -> Result<u64, sqlx::Error> {
        if regulation_ids.is_empty() {
            return Ok(0);
        }

        let result = sqlx::query(
            "INSERT INTO regulations_component (regulations_id, components_id) \
             SELECT id, $2 FROM UNNEST($1::BIGINT[]) AS t(id)",
        )
        .bind(regulation_ids)
        .bind(component_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// List component links for the given regulations.
    pub async fn list_for_regulations(
        pool: &PgPool,
        regulation_ids: &[DbId],
    ) -> Result<Vec<RegulationComponent>, sqlx::Error> {
        sqlx::query_as::<_, RegulationComponent>(
            "SELECT id, regulations_id, components_id \
             FROM regulations_component \
             WHERE regulations_id = ANY($1) \
             ORDER BY regulations_id",
        )
        .bind(regulation_ids)
        .fetch_all(pool)
        .await
    }
}
