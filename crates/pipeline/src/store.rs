//! Storage seam for the write cycle.

use std::sync::Arc;

use async_trait::async_trait;
use regwatch_core::dedup::{ExistingKeySet, RegulationKey};
use regwatch_core::types::{DbId, Record};
use regwatch_db::repositories::{RegulationComponentRepo, RegulationRepo};
use regwatch_db::DbPool;
use sqlx::postgres::PgConnectOptions;

use crate::error::StoreError;

/// Storage operations the writer needs.
#[async_trait]
pub trait RegulationStore: Send + Sync {
    /// Duplicate keys of every stored regulation for `entity`.
    async fn existing_keys(&self, entity: &str) -> Result<ExistingKeySet, StoreError>;

    /// Insert `records` atomically, returning the number of rows written.
    async fn insert_regulations(&self, records: &[Record]) -> Result<u64, StoreError>;

    /// IDs of the `limit` newest regulations for `entity`, newest first.
    async fn latest_ids(&self, entity: &str, limit: u64) -> Result<Vec<DbId>, StoreError>;

    /// Link each regulation to `component_id`, returning rows written.
    async fn insert_components(
        &self,
        regulation_ids: &[DbId],
        component_id: DbId,
    ) -> Result<u64, StoreError>;
}

#[async_trait]
impl<T: RegulationStore + ?Sized> RegulationStore for Arc<T> {
    async fn existing_keys(&self, entity: &str) -> Result<ExistingKeySet, StoreError> {
        (**self).existing_keys(entity).await
    }

    async fn insert_regulations(&self, records: &[Record]) -> Result<u64, StoreError> {
        (**self).insert_regulations(records).await
    }

    async fn latest_ids(&self, entity: &str, limit: u64) -> Result<Vec<DbId>, StoreError> {
        (**self).latest_ids(entity, limit).await
    }

    async fn insert_components(
        &self,
        regulation_ids: &[DbId],
        component_id: DbId,
    ) -> Result<u64, StoreError> {
        (**self).insert_components(regulation_ids, component_id).await
    }
}

/// Opens and closes a store for one pipeline invocation.
#[async_trait]
pub trait StoreConnector: Send + Sync {
    type Store: RegulationStore;

    async fn connect(&self) -> Result<Self::Store, StoreError>;

    /// Release the store. Called on every path after a successful connect.
    async fn close(&self, store: Self::Store);
}

#[async_trait]
impl<T: StoreConnector + ?Sized> StoreConnector for Arc<T> {
    type Store = T::Store;

    async fn connect(&self) -> Result<Self::Store, StoreError> {
        (**self).connect().await
    }

    async fn close(&self, store: Self::Store) {
        (**self).close(store).await
    }
}

/// [`RegulationStore`] over a Postgres pool.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: DbPool,
}

impl PgStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Open a single-connection pool and verify it with a health check.
    pub async fn connect(options: PgConnectOptions) -> Result<Self, StoreError> {
        let pool = regwatch_db::connect_single(options).await?;
        regwatch_db::health_check(&pool).await?;
        Ok(Self { pool })
    }

    pub async fn close(self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl RegulationStore for PgStore {
    async fn existing_keys(&self, entity: &str) -> Result<ExistingKeySet, StoreError> {
        let rows = RegulationRepo::existing_keys(&self.pool, entity).await?;
        Ok(rows.into_iter().map(RegulationKey::from).collect())
    }

    async fn insert_regulations(&self, records: &[Record]) -> Result<u64, StoreError> {
        Ok(RegulationRepo::insert_batch(&self.pool, records).await?)
    }

    async fn latest_ids(&self, entity: &str, limit: u64) -> Result<Vec<DbId>, StoreError> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        Ok(RegulationRepo::latest_ids(&self.pool, entity, limit).await?)
    }

    async fn insert_components(
        &self,
        regulation_ids: &[DbId],
        component_id: DbId,
    ) -> Result<u64, StoreError> {
        Ok(RegulationComponentRepo::insert_batch(&self.pool, regulation_ids, component_id).await?)
    }
}

/// Connects a fresh [`PgStore`] per invocation.
#[derive(Debug, Clone)]
pub struct PgConnector {
    options: PgConnectOptions,
}

impl PgConnector {
    pub fn new(options: PgConnectOptions) -> Self {
        Self { options }
    }
}

#[async_trait]
impl StoreConnector for PgConnector {
    type Store = PgStore;

    async fn connect(&self) -> Result<PgStore, StoreError> {
        PgStore::connect(self.options.clone()).await
    }

    async fn close(&self, store: PgStore) {
        store.close().await;
    }
}
