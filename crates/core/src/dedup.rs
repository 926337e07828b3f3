//! Duplicate resolution for regulation records.
//!
//! A regulation is identified within its entity by the normalized triple
//! (title, created_at, external_link). Incoming candidates are split into
//! rows already stored (cross-batch duplicates), repeats of an earlier
//! candidate in the same batch (internal duplicates) and new records.

use std::collections::HashSet;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::Serialize;
use serde_json::Value;

use crate::types::{scalar_text, Record};

/// Composite business key of a regulation within one entity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct RegulationKey {
    pub title: String,
    pub created_at: String,
    pub external_link: String,
}

impl RegulationKey {
    /// Build a key from stored column values. `title` is trimmed,
    /// `created_at` goes through [`canonical_date`] and a missing
    /// `external_link` or `created_at` becomes the empty string.
    pub fn new(title: &str, created_at: Option<&str>, external_link: Option<&str>) -> Self {
        Self {
            title: title.trim().to_string(),
            created_at: canonical_date(created_at.unwrap_or_default()),
            external_link: external_link.unwrap_or_default().to_string(),
        }
    }

    /// Build a key from a record, normalizing exactly like [`RegulationKey::new`].
    pub fn from_record(record: &Record) -> Self {
        let text = |field: &str| {
            record
                .get(field)
                .map(|v| scalar_text(v).into_owned())
                .unwrap_or_default()
        };
        Self {
            title: text("title").trim().to_string(),
            created_at: canonical_date(&text("created_at")),
            external_link: text("external_link"),
        }
    }
}

/// Render a date or timestamp the way a `DATE` column reads back as text
/// (`YYYY-MM-DD`), so scraped and stored values compare equal.
///
/// Accepts plain dates, naive timestamps (`T` or space separated) and
/// RFC 3339 timestamps, whose local date is kept. Anything else is returned
/// unchanged.
pub fn canonical_date(raw: &str) -> String {
    let value = raw.trim();
    let date = NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .or_else(|| {
            ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
                .map(|dt| dt.date())
        })
        .or_else(|| {
            DateTime::parse_from_rfc3339(value)
                .ok()
                .map(|dt| dt.naive_local().date())
        });

    match date {
        Some(date) => date.format("%Y-%m-%d").to_string(),
        None => raw.to_string(),
    }
}

/// Whether `record` belongs to `entity`.
pub fn belongs_to_entity(record: &Record, entity: &str) -> bool {
    matches!(record.get("entity"), Some(Value::String(e)) if e == entity)
}

/// Keys already stored for one entity, read at the start of a write cycle.
#[derive(Debug, Clone, Default)]
pub struct ExistingKeySet {
    keys: HashSet<RegulationKey>,
    rows: usize,
}

impl ExistingKeySet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one stored row.
    pub fn insert(&mut self, key: RegulationKey) {
        self.rows += 1;
        self.keys.insert(key);
    }

    pub fn contains(&self, key: &RegulationKey) -> bool {
        self.keys.contains(key)
    }

    /// Number of stored rows read, including rows sharing a key.
    pub fn rows(&self) -> usize {
        self.rows
    }
}

impl FromIterator<RegulationKey> for ExistingKeySet {
    fn from_iter<I: IntoIterator<Item = RegulationKey>>(iter: I) -> Self {
        let mut set = Self::new();
        for key in iter {
            set.insert(key);
        }
        set
    }
}

/// Which of the three resolution outcomes a [`Resolution`] represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionOutcome {
    /// No candidate belonged to the entity.
    NoCandidates,
    /// Candidates existed but all were duplicates.
    NothingNew,
    NewRecords,
}

/// Result of partitioning a candidate batch against stored keys.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub entity: String,
    /// New records in input order, first occurrence of each key.
    pub new_records: Vec<Record>,
    /// Candidates belonging to the entity.
    pub candidates: usize,
    /// Stored rows read for the entity.
    pub existing: usize,
    /// Candidates whose key is already stored.
    pub duplicates_found: usize,
    /// Candidates repeating an earlier candidate's key.
    pub internal_duplicates: usize,
}

impl Resolution {
    pub fn outcome(&self) -> ResolutionOutcome {
        if self.candidates == 0 {
            ResolutionOutcome::NoCandidates
        } else if self.new_records.is_empty() {
            ResolutionOutcome::NothingNew
        } else {
            ResolutionOutcome::NewRecords
        }
    }

    pub fn duplicates_skipped(&self) -> usize {
        self.duplicates_found + self.internal_duplicates
    }

    /// Human-readable explanation for the two empty outcomes.
    pub fn message(&self) -> String {
        match self.outcome() {
            ResolutionOutcome::NoCandidates => {
                format!("No records found for entity {}", self.entity)
            }
            ResolutionOutcome::NothingNew => format!(
                "No new records found for entity {} after duplicate validation",
                self.entity
            ),
            ResolutionOutcome::NewRecords => format!(
                "{} new records found for entity {}",
                self.new_records.len(),
                self.entity
            ),
        }
    }
}

/// Partition `candidates` for `entity` into new records and duplicates.
///
/// Candidates of other entities are ignored. Among candidates sharing a
/// key, the first in input order is kept.
pub fn resolve_duplicates(
    candidates: Vec<Record>,
    entity: &str,
    existing: &ExistingKeySet,
) -> Resolution {
    let mut resolution = Resolution {
        entity: entity.to_string(),
        new_records: Vec::new(),
        candidates: 0,
        existing: existing.rows(),
        duplicates_found: 0,
        internal_duplicates: 0,
    };
    let mut seen = HashSet::new();

    for record in candidates {
        if !belongs_to_entity(&record, entity) {
            continue;
        }
        resolution.candidates += 1;

        let key = RegulationKey::from_record(&record);
        if existing.contains(&key) {
            resolution.duplicates_found += 1;
        } else if !seen.insert(key) {
            resolution.internal_duplicates += 1;
        } else {
            resolution.new_records.push(record);
        }
    }

    resolution
}
