//! End-to-end invocation tests with a static source and the in-memory store.

mod common;

use std::sync::Arc;

use assert_matches::assert_matches;
use regwatch_core::constants::ENTITY_VALUE;
use regwatch_pipeline::{ContentCheck, IngestPipeline, RunOptions};
use serde_json::{json, Value};

use common::{regulation, validator, MemoryConnector, MemoryStore, StaticSource};

fn forced() -> RunOptions {
    RunOptions {
        force_scrape: true,
        ..RunOptions::default()
    }
}

fn pipeline(
    pages: Vec<Vec<Value>>,
    connector: MemoryConnector,
) -> (
    IngestPipeline<Arc<StaticSource>, Arc<MemoryConnector>>,
    Arc<StaticSource>,
    Arc<MemoryConnector>,
) {
    let source = Arc::new(StaticSource::new(pages));
    let connector = Arc::new(connector);
    let pipeline = IngestPipeline::new(Arc::clone(&source), validator(), Arc::clone(&connector));
    (pipeline, source, connector)
}

// ---------------------------------------------------------------------------
// Happy path
// ---------------------------------------------------------------------------

#[tokio::test]
async fn forced_run_extracts_validates_and_writes() {
    let store = MemoryStore::new();
    let (pipeline, source, connector) = pipeline(
        vec![
            vec![
                regulation("Decreto 1", "2024-01-01", "http://x/1"),
                regulation("Decreto 2", "2024-01-02", "http://x/2"),
            ],
            vec![regulation("Decreto 3", "2024-01-03", "http://x/3")],
        ],
        MemoryConnector::new(Arc::clone(&store)),
    );

    let report = pipeline.run(&forced()).await;

    assert!(report.success, "{}", report.message);
    assert_eq!(report.content_check, Some(ContentCheck::Forced));
    assert_eq!(report.records_scraped, 3);
    assert_eq!(report.records_validated, 3);
    assert_eq!(report.records_inserted(), 3);
    assert_eq!(report.pages_processed, "0-8");
    assert!(report.validation_skipped.is_none());
    assert!(report.message.starts_with(&format!("Entity {ENTITY_VALUE}: Processed: 3")));
    assert_eq!(source.requests(), vec![(9, 0)]);
    assert_eq!(connector.connects(), 1);
    assert_eq!(connector.closes(), 1);
    assert!(report.finished_at >= report.started_at);
}

#[tokio::test]
async fn soft_failures_are_stored_as_null() {
    let store = MemoryStore::new();
    let mut bad_class = regulation("Decreto 123", "2024-01-01", "http://x/123");
    bad_class["classification_id"] = json!("abc");
    let mut no_title = regulation("", "2024-01-02", "http://x/124");
    no_title["classification_id"] = json!(3);

    let (pipeline, _, _) = pipeline(
        vec![vec![bad_class, no_title]],
        MemoryConnector::new(Arc::clone(&store)),
    );
    let report = pipeline.run(&forced()).await;

    assert!(report.success);
    let stats = report.validation.expect("validation ran");
    assert_eq!(stats.valid_records, 1);
    assert_eq!(stats.discarded_records, 1);
    let rows = store.rows();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].1["title"], "Decreto 123");
    assert_eq!(rows[0].1["classification_id"], Value::Null);
}

#[tokio::test]
async fn second_run_inserts_nothing_new() {
    let store = MemoryStore::new();
    let (pipeline, _, _) = pipeline(
        vec![vec![regulation("Decreto 1", "2024-01-01", "http://x/1")]],
        MemoryConnector::new(Arc::clone(&store)),
    );

    assert_eq!(pipeline.run(&forced()).await.records_inserted(), 1);
    let second = pipeline.run(&forced()).await;
    assert!(second.success);
    assert_eq!(second.records_inserted(), 0);
    assert_eq!(store.rows().len(), 1);
}

// ---------------------------------------------------------------------------
// Content check
// ---------------------------------------------------------------------------

#[tokio::test]
async fn run_is_skipped_when_newest_pages_hold_nothing_new() {
    let store = MemoryStore::new();
    let page = vec![regulation("Decreto 1", "2024-01-01", "http://x/1")];
    store.seed(&page);
    let (pipeline, source, connector) =
        pipeline(vec![page], MemoryConnector::new(Arc::clone(&store)));

    let report = pipeline.run(&RunOptions::default()).await;

    assert!(report.success);
    assert_eq!(report.content_check, Some(ContentCheck::NoNewContent));
    assert_eq!(report.records_scraped, 0);
    assert!(report.insertion.is_none());
    assert_eq!(source.requests(), vec![(3, 0)]);
    assert_eq!(connector.closes(), connector.connects());
}

#[tokio::test]
async fn new_record_on_newest_pages_proceeds_to_full_run() {
    let store = MemoryStore::new();
    store.seed(&[regulation("Decreto 1", "2024-01-01", "http://x/1")]);
    let (pipeline, source, _) = pipeline(
        vec![vec![
            regulation("Decreto 2", "2024-01-02", "http://x/2"),
            regulation("Decreto 1", "2024-01-01", "http://x/1"),
        ]],
        MemoryConnector::new(Arc::clone(&store)),
    );

    let options = RunOptions {
        page_count: 2,
        ..RunOptions::default()
    };
    let report = pipeline.run(&options).await;

    assert!(report.success);
    assert_eq!(report.content_check, Some(ContentCheck::NewContentFound));
    assert_eq!(report.records_inserted(), 1);
    assert_eq!(source.requests(), vec![(2, 0), (2, 0)]);
}

#[tokio::test]
async fn unreachable_storage_skips_check_and_fails_run() {
    let store = MemoryStore::new();
    let (pipeline, source, connector) = pipeline(
        vec![vec![regulation("Decreto 1", "2024-01-01", "http://x/1")]],
        MemoryConnector::unavailable(store),
    );

    let report = pipeline.run(&RunOptions::default()).await;

    assert!(!report.success);
    assert_eq!(report.content_check, Some(ContentCheck::Unavailable));
    assert!(report.message.starts_with("Database connection error"));
    assert!(report.insertion.is_none());
    assert_eq!(connector.connects(), 0);
    // Only the full extraction ran; the content check fetched nothing.
    assert_eq!(source.requests(), vec![(9, 0)]);
}

// ---------------------------------------------------------------------------
// Short circuits and fallbacks
// ---------------------------------------------------------------------------

#[tokio::test]
async fn empty_extraction_succeeds_without_connecting() {
    let store = MemoryStore::new();
    let (pipeline, _, connector) = pipeline(Vec::new(), MemoryConnector::new(store));

    let report = pipeline.run(&forced()).await;

    assert!(report.success);
    assert_eq!(report.message, "No records found during scraping");
    assert!(report.validation.is_none());
    assert_eq!(connector.connects(), 0);
}

#[tokio::test]
async fn fully_discarded_batch_succeeds_without_connecting() {
    let store = MemoryStore::new();
    let (pipeline, _, connector) = pipeline(
        vec![vec![json!({"title": "", "entity": ENTITY_VALUE})]],
        MemoryConnector::new(store),
    );

    let report = pipeline.run(&forced()).await;

    assert!(report.success);
    assert_eq!(report.message, "All records were discarded during validation");
    assert_eq!(report.records_validated, 0);
    assert_eq!(connector.connects(), 0);
}

#[tokio::test]
async fn malformed_frame_is_written_unvalidated() {
    let store = MemoryStore::new();
    let mut invalid = regulation("Decreto 8", "08/01/2024", "http://x/8");
    invalid["classification_id"] = json!("abc");
    let (pipeline, _, _) = pipeline(
        vec![vec![invalid, json!("not a record")]],
        MemoryConnector::new(Arc::clone(&store)),
    );

    let report = pipeline.run(&forced()).await;

    assert!(report.success);
    assert_matches!(report.validation_skipped, Some(ref reason) if reason.contains("element 1"));
    assert_eq!(report.records_scraped, 2);
    assert_eq!(report.records_validated, 1);
    // Nothing was nulled: the record went through as scraped.
    assert_eq!(store.rows()[0].1["classification_id"], "abc");
}

#[tokio::test]
async fn write_failure_fails_run_and_closes_store() {
    let store = MemoryStore::new();
    store.fail_insert();
    let (pipeline, _, connector) = pipeline(
        vec![vec![regulation("Decreto 1", "2024-01-01", "http://x/1")]],
        MemoryConnector::new(Arc::clone(&store)),
    );

    let report = pipeline.run(&forced()).await;

    assert!(!report.success);
    assert!(report
        .message
        .starts_with(&format!("Error inserting regulations for entity {ENTITY_VALUE}")));
    assert_eq!(connector.connects(), 1);
    assert_eq!(connector.closes(), 1);
}

#[tokio::test]
async fn invalid_options_fail_before_extraction() {
    let store = MemoryStore::new();
    let (pipeline, source, _) = pipeline(Vec::new(), MemoryConnector::new(store));

    let report = pipeline
        .run(&RunOptions {
            page_count: 0,
            ..forced()
        })
        .await;

    assert!(!report.success);
    assert!(report.message.starts_with("Invalid run options"));
    assert!(source.requests().is_empty());
}

#[tokio::test]
async fn out_of_range_start_page_fails_validation() {
    let store = MemoryStore::new();
    let (pipeline, source, _) = pipeline(Vec::new(), MemoryConnector::new(store));

    let report = pipeline
        .run(&RunOptions {
            start_page: u32::MAX,
            ..forced()
        })
        .await;

    assert!(!report.success);
    assert!(report.message.starts_with("Invalid run options"));
    assert!(report.pages_processed.is_empty());
    assert!(source.requests().is_empty());
}
