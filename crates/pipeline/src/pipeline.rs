//! One ingestion invocation: content check, extract, validate, write.

use chrono::Utc;
use regwatch_core::constants::{CONTENT_CHECK_PAGES, DEFAULT_PAGES_TO_SCRAPE, ENTITY_VALUE};
use regwatch_core::dedup::{resolve_duplicates, ResolutionOutcome};
use regwatch_core::report::InsertionReport;
use regwatch_core::types::{Record, Timestamp};
use regwatch_core::validation::{BatchValidator, ValidationStats};
use serde::{Deserialize, Serialize};
use tracing::Instrument;
use uuid::Uuid;
use validator::Validate;

use crate::error::PipelineError;
use crate::source::RegulationSource;
use crate::stages::validate_stage;
use crate::store::{RegulationStore, StoreConnector};
use crate::writer::RegulationWriter;

/// Parameters of one run.
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
#[serde(default)]
pub struct RunOptions {
    #[validate(range(min = 1, max = 100))]
    pub page_count: u32,
    #[validate(range(max = 10_000))]
    pub start_page: u32,
    /// Skip the new-content check and always scrape.
    pub force_scrape: bool,
    #[validate(length(min = 1))]
    pub entity: String,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            page_count: DEFAULT_PAGES_TO_SCRAPE,
            start_page: 0,
            force_scrape: false,
            entity: ENTITY_VALUE.to_string(),
        }
    }
}

impl RunOptions {
    /// Inclusive page range in `start-end` form.
    pub fn pages_processed(&self) -> String {
        let end = self
            .start_page
            .saturating_add(self.page_count.saturating_sub(1));
        format!("{}-{}", self.start_page, end)
    }
}

/// Result of the new-content check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentCheck {
    /// `force_scrape` was set; no check ran.
    Forced,
    NewContentFound,
    NoNewContent,
    /// Storage could not be reached for the check; the run proceeds.
    Unavailable,
}

/// Outcome of one [`IngestPipeline::run`].
#[derive(Debug, Clone, Serialize)]
pub struct PipelineReport {
    pub run_id: Uuid,
    pub started_at: Timestamp,
    pub finished_at: Timestamp,
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_check: Option<ContentCheck>,
    pub records_scraped: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validation: Option<ValidationStats>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validation_skipped: Option<String>,
    pub records_validated: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub insertion: Option<InsertionReport>,
    pub pages_processed: String,
}

impl PipelineReport {
    fn start(run_id: Uuid) -> Self {
        let now = Utc::now();
        Self {
            run_id,
            started_at: now,
            finished_at: now,
            success: false,
            message: String::new(),
            content_check: None,
            records_scraped: 0,
            validation: None,
            validation_skipped: None,
            records_validated: 0,
            insertion: None,
            pages_processed: String::new(),
        }
    }

    pub fn records_inserted(&self) -> u64 {
        self.insertion.as_ref().map_or(0, |i| i.inserted_count)
    }
}

/// Extract → validate → write for one entity.
pub struct IngestPipeline<Src, C> {
    source: Src,
    validator: BatchValidator,
    connector: C,
}

impl<Src, C> IngestPipeline<Src, C>
where
    Src: RegulationSource,
    C: StoreConnector,
{
    pub fn new(source: Src, validator: BatchValidator, connector: C) -> Self {
        Self {
            source,
            validator,
            connector,
        }
    }

    /// Run one invocation. Never fails: every failure is reported with
    /// `success: false` and a message.
    pub async fn run(&self, options: &RunOptions) -> PipelineReport {
        let run_id = Uuid::new_v4();
        let span = tracing::info_span!("ingest", %run_id, entity = %options.entity);

        async move {
            let mut report = PipelineReport::start(run_id);
            tracing::info!(
                start_page = options.start_page,
                page_count = options.page_count,
                force_scrape = options.force_scrape,
                "Starting ingestion run"
            );

            match self.execute(options, &mut report).await {
                Ok(message) => {
                    report.success = true;
                    report.message = message;
                    tracing::info!(
                        scraped = report.records_scraped,
                        validated = report.records_validated,
                        inserted = report.records_inserted(),
                        message = %report.message,
                        "Ingestion run complete"
                    );
                }
                Err(e) => {
                    tracing::error!(error = %e, "Ingestion run failed");
                    report.success = false;
                    report.message = e.to_string();
                }
            }
            report.finished_at = Utc::now();
            report
        }
        .instrument(span)
        .await
    }

    async fn execute(
        &self,
        options: &RunOptions,
        report: &mut PipelineReport,
    ) -> Result<String, PipelineError> {
        options.validate()?;
        report.pages_processed = options.pages_processed();

        let check = if options.force_scrape {
            ContentCheck::Forced
        } else {
            self.check_content(options).await?
        };
        report.content_check = Some(check);
        if check == ContentCheck::NoNewContent {
            return Ok("No new content detected. Scraping skipped".to_string());
        }

        // --- Extract ---
        let frame = self
            .source
            .fetch(options.page_count, options.start_page)
            .await?;
        report.records_scraped = frame.len();
        tracing::info!(records = frame.len(), "Extraction complete");
        if frame.is_empty() {
            return Ok("No records found during scraping".to_string());
        }

        // --- Validate ---
        let outcome = validate_stage(&self.validator, frame);
        report.records_validated = outcome.records.len();
        report.validation = Some(outcome.stats);
        report.validation_skipped = outcome.validation_skipped;
        if outcome.records.is_empty() {
            return Ok("All records were discarded during validation".to_string());
        }

        // --- Write ---
        let store = self
            .connector
            .connect()
            .await
            .map_err(PipelineError::Connect)?;
        let result = RegulationWriter::new(&store)
            .write_new_records(outcome.records, &options.entity)
            .await;
        self.connector.close(store).await;

        let insertion = result?;
        let message = insertion.message.clone();
        report.insertion = Some(insertion);
        Ok(message)
    }

    /// Sample the newest pages and report whether any entity record is not
    /// stored yet. Storage is checked first so an unreachable store costs
    /// no scraping.
    async fn check_content(&self, options: &RunOptions) -> Result<ContentCheck, PipelineError> {
        let store = match self.connector.connect().await {
            Ok(store) => store,
            Err(e) => {
                tracing::warn!(error = %e, "Storage unavailable, skipping content check");
                return Ok(ContentCheck::Unavailable);
            }
        };
        let existing = store.existing_keys(&options.entity).await;
        self.connector.close(store).await;

        let existing = match existing {
            Ok(existing) => existing,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read stored keys, skipping content check");
                return Ok(ContentCheck::Unavailable);
            }
        };

        let sample_pages = options.page_count.min(CONTENT_CHECK_PAGES);
        let sample = self.source.fetch(sample_pages, options.start_page).await?;
        let candidates: Vec<Record> = sample
            .into_iter()
            .filter_map(|value| match value {
                serde_json::Value::Object(record) => Some(record),
                _ => None,
            })
            .collect();
        let resolution = resolve_duplicates(candidates, &options.entity, &existing);

        let check = if resolution.outcome() == ResolutionOutcome::NewRecords {
            ContentCheck::NewContentFound
        } else {
            ContentCheck::NoNewContent
        };
        tracing::info!(
            sample_pages,
            candidates = resolution.candidates,
            new_records = resolution.new_records.len(),
            result = ?check,
            "Content check complete"
        );
        Ok(check)
    }
}
