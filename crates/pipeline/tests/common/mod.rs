#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use regwatch_core::constants::ENTITY_VALUE;
use regwatch_core::dedup::{ExistingKeySet, RegulationKey};
use regwatch_core::types::{DbId, Record};
use regwatch_core::validation::{BatchValidator, RuleSet};
use regwatch_pipeline::{RegulationSource, RegulationStore, SourceError, StoreConnector, StoreError};
use serde_json::{json, Value};

pub const RULES: &str = r#"
required_fields: [title, entity]
fields:
  title:
    type: str
    min_length: 1
    max_length: 500
  entity:
    type: str
  created_at:
    type: str
    regex: '\d{4}-\d{2}-\d{2}'
  classification_id:
    type: int
    min_value: 1
"#;

pub fn validator() -> BatchValidator {
    BatchValidator::new(RuleSet::from_yaml(RULES).unwrap())
}

/// A scraped regulation for the default entity.
pub fn regulation(title: &str, created_at: &str, link: &str) -> Value {
    json!({
        "title": title,
        "created_at": created_at,
        "external_link": link,
        "entity": ENTITY_VALUE,
        "classification_id": 13,
    })
}

pub fn record(value: Value) -> Record {
    match value {
        Value::Object(map) => map,
        other => panic!("not an object: {other}"),
    }
}

// ---------------------------------------------------------------------------
// In-memory store
// ---------------------------------------------------------------------------

/// [`RegulationStore`] over a vector, enforcing the same per-entity key
/// uniqueness as the `regulations` table.
#[derive(Default)]
pub struct MemoryStore {
    rows: Mutex<Vec<(DbId, Record)>>,
    components: Mutex<Vec<(DbId, DbId)>>,
    fail_existing_keys: AtomicBool,
    fail_insert: AtomicBool,
    fail_latest_ids: AtomicBool,
    fail_components: AtomicBool,
    /// Report success without storing anything.
    drop_inserts: AtomicBool,
    /// Simulate a concurrent writer that stores every record first.
    lose_race: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Store `values` directly, as a previous run would have.
    pub fn seed(&self, values: &[Value]) {
        let mut rows = self.rows.lock().unwrap();
        for value in values {
            let id = rows.len() as DbId + 1;
            rows.push((id, record(value.clone())));
        }
    }

    pub fn rows(&self) -> Vec<(DbId, Record)> {
        self.rows.lock().unwrap().clone()
    }

    pub fn titles(&self) -> Vec<String> {
        self.rows()
            .into_iter()
            .filter_map(|(_, r)| r.get("title").and_then(Value::as_str).map(str::to_string))
            .collect()
    }

    pub fn components(&self) -> Vec<(DbId, DbId)> {
        self.components.lock().unwrap().clone()
    }

    pub fn fail_existing_keys(&self) {
        self.fail_existing_keys.store(true, Ordering::SeqCst);
    }

    pub fn fail_insert(&self) {
        self.fail_insert.store(true, Ordering::SeqCst);
    }

    pub fn fail_latest_ids(&self) {
        self.fail_latest_ids.store(true, Ordering::SeqCst);
    }

    pub fn drop_inserts(&self) {
        self.drop_inserts.store(true, Ordering::SeqCst);
    }

    pub fn fail_components(&self) {
        self.fail_components.store(true, Ordering::SeqCst);
    }

    pub fn lose_race(&self) {
        self.lose_race.store(true, Ordering::SeqCst);
    }

    fn stored_key(record: &Record) -> (String, RegulationKey) {
        let entity = record
            .get("entity")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        (entity, RegulationKey::from_record(record))
    }
}

#[async_trait]
impl RegulationStore for MemoryStore {
    async fn existing_keys(&self, entity: &str) -> Result<ExistingKeySet, StoreError> {
        if self.fail_existing_keys.load(Ordering::SeqCst) {
            return Err(StoreError::Other("existing keys unavailable".into()));
        }
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .map(|(_, r)| Self::stored_key(r))
            .filter(|(e, _)| e == entity)
            .map(|(_, key)| key)
            .collect())
    }

    async fn insert_regulations(&self, records: &[Record]) -> Result<u64, StoreError> {
        if self.fail_insert.load(Ordering::SeqCst) {
            return Err(StoreError::Other("insert rejected".into()));
        }
        if self.drop_inserts.load(Ordering::SeqCst) {
            return Ok(0);
        }
        if self.lose_race.load(Ordering::SeqCst) {
            self.seed(&records.iter().cloned().map(Value::Object).collect::<Vec<_>>());
        }

        let mut rows = self.rows.lock().unwrap();
        let mut stored: Vec<_> = rows.iter().map(|(_, r)| Self::stored_key(r)).collect();
        for record in records {
            let key = Self::stored_key(record);
            if stored.contains(&key) {
                return Err(StoreError::UniqueViolation(format!(
                    "duplicate key for title {:?}",
                    key.1.title
                )));
            }
            stored.push(key);
        }
        for record in records {
            let id = rows.len() as DbId + 1;
            rows.push((id, record.clone()));
        }
        Ok(records.len() as u64)
    }

    async fn latest_ids(&self, entity: &str, limit: u64) -> Result<Vec<DbId>, StoreError> {
        if self.fail_latest_ids.load(Ordering::SeqCst) {
            return Err(StoreError::Other("id lookup timed out".into()));
        }
        let rows = self.rows.lock().unwrap();
        Ok(rows
            .iter()
            .rev()
            .filter(|(_, r)| Self::stored_key(r).0 == entity)
            .map(|(id, _)| *id)
            .take(limit as usize)
            .collect())
    }

    async fn insert_components(
        &self,
        regulation_ids: &[DbId],
        component_id: DbId,
    ) -> Result<u64, StoreError> {
        if self.fail_components.load(Ordering::SeqCst) {
            return Err(StoreError::Other("component table missing".into()));
        }
        let mut components = self.components.lock().unwrap();
        components.extend(regulation_ids.iter().map(|id| (*id, component_id)));
        Ok(regulation_ids.len() as u64)
    }
}

// ---------------------------------------------------------------------------
// Connector and source
// ---------------------------------------------------------------------------

pub struct MemoryConnector {
    pub store: Arc<MemoryStore>,
    available: AtomicBool,
    connects: AtomicUsize,
    closes: AtomicUsize,
}

impl MemoryConnector {
    pub fn new(store: Arc<MemoryStore>) -> Self {
        Self {
            store,
            available: AtomicBool::new(true),
            connects: AtomicUsize::new(0),
            closes: AtomicUsize::new(0),
        }
    }

    pub fn unavailable(store: Arc<MemoryStore>) -> Self {
        let connector = Self::new(store);
        connector.available.store(false, Ordering::SeqCst);
        connector
    }

    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    pub fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StoreConnector for MemoryConnector {
    type Store = Arc<MemoryStore>;

    async fn connect(&self) -> Result<Arc<MemoryStore>, StoreError> {
        if !self.available.load(Ordering::SeqCst) {
            return Err(StoreError::Other("connection refused".into()));
        }
        self.connects.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::clone(&self.store))
    }

    async fn close(&self, _store: Arc<MemoryStore>) {
        self.closes.fetch_add(1, Ordering::SeqCst);
    }
}

/// Serves fixed pages, recording each `(page_count, start_page)` request.
pub struct StaticSource {
    pages: Vec<Vec<Value>>,
    pub requests: Mutex<Vec<(u32, u32)>>,
}

impl StaticSource {
    pub fn new(pages: Vec<Vec<Value>>) -> Self {
        Self {
            pages,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<(u32, u32)> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl RegulationSource for StaticSource {
    async fn fetch(&self, page_count: u32, start_page: u32) -> Result<Vec<Value>, SourceError> {
        self.requests.lock().unwrap().push((page_count, start_page));
        Ok(self
            .pages
            .iter()
            .skip(start_page as usize)
            .take(page_count as usize)
            .flatten()
            .cloned()
            .collect())
    }
}
