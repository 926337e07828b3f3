//! Repository for the `regulations` table.

use regwatch_core::types::{DbId, Record};
use sqlx::types::Json;
use sqlx::PgPool;

use crate::models::regulation::{Regulation, RegulationKeyRow};

/// Column list for `regulations` SELECT queries.
const COLUMNS: &str = "\
    id, title, created_at, update_at, is_active, gtype, entity, \
    external_link, rtype_id, summary, classification_id";

/// Provides query and insert operations for regulations.
pub struct RegulationRepo;

impl RegulationRepo {
    /// Load the duplicate-key columns of every stored regulation for `entity`.
    ///
    /// `created_at` is rendered as text and a missing `external_link` as the
    /// empty string, matching how incoming records are normalized.
    pub async fn existing_keys(
        pool: &PgPool,
        entity: &str,
    ) -> Result<Vec<RegulationKeyRow>, sqlx::Error> {
        sqlx::query_as::<_, RegulationKeyRow>(
            "SELECT title, created_at::text AS created_at, \
                    COALESCE(external_link, '') AS external_link \
             FROM regulations \
             WHERE entity = $1",
        )
        .bind(entity)
        .fetch_all(pool)
        .await
    }

    /// Insert all `records` in one transaction, returning the number of rows written.
    ///
    /// The column list is the union of the records' keys in first-seen
    /// order; keys missing from a record insert `NULL`. Values are coerced
    /// to column types by `jsonb_populate_recordset`, so a key that is not
    /// a `regulations` column fails the whole batch.
    pub async fn insert_batch(pool: &PgPool, records: &[Record]) -> Result<u64, sqlx::Error> {
        if records.is_empty() {
            return Ok(0);
        }

        let mut columns: Vec<&str> = Vec::new();
        for record in records {
            for key in record.keys() {
                if !columns.contains(&key.as_str()) {
                    columns.push(key);
                }
            }
        }
        let column_list = columns
            .iter()
            .map(|c| quote_ident(c))
            .collect::<Vec<_>>()
            .join(", ");

        let query = format!(
            "INSERT INTO regulations ({column_list}) \
             SELECT {column_list} \
             FROM jsonb_populate_recordset(NULL::regulations, $1)"
        );

        tracing::debug!(
            rows = records.len(),
            columns = columns.len(),
            "Inserting regulation batch"
        );

        let mut tx = pool.begin().await?;
        let result = sqlx::query(&query)
            .bind(Json(records))
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        Ok(result.rows_affected())
    }

    /// IDs of the `limit` most recently inserted regulations for `entity`,
    /// newest first.
    pub async fn latest_ids(
        pool: &PgPool,
        entity: &str,
        limit: i64,
    ) -> Result<Vec<DbId>, sqlx::Error> {
        let rows: Vec<(DbId,)> = sqlx::query_as(
            "SELECT id FROM regulations \
             WHERE entity = $1 \
             ORDER BY id DESC \
             LIMIT $2",
        )
        .bind(entity)
        .bind(limit)
        .fetch_all(pool)
        .await?;
        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    /// List all regulations for `entity`, oldest first.
    pub async fn list_by_entity(
        pool: &PgPool,
        entity: &str,
    ) -> Result<Vec<Regulation>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM regulations WHERE entity = $1 ORDER BY id");
        sqlx::query_as::<_, Regulation>(&query)
            .bind(entity)
            .fetch_all(pool)
            .await
    }

    /// Count regulations stored for `entity`.
    pub async fn count_by_entity(pool: &PgPool, entity: &str) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM regulations WHERE entity = $1")
            .bind(entity)
            .fetch_one(pool)
            .await?;
        Ok(count)
    }
}

/// Quote a column name as a PostgreSQL identifier.
fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
