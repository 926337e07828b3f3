//! `regwatch-worker` -- scheduled regulation ingestion.
//!
//! Applies migrations, then runs extract → validate → write against the
//! scraper dump every `SCRAPE_INTERVAL_SECS`, retrying a failed run up to
//! `RETRIES` times. Set `RUN_ONCE=true` for a single invocation whose
//! exit status reflects the run. See [`WorkerConfig`] for all variables;
//! `LOG_FORMAT=json` switches to JSON log lines.

use anyhow::Context;
use regwatch_core::validation::{BatchValidator, RuleSet};
use regwatch_pipeline::{IngestPipeline, JsonPageSource, PgConnector, PipelineReport};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use regwatch_worker::config::WorkerConfig;
use regwatch_worker::schedule::run_with_retry;

type Pipeline = IngestPipeline<JsonPageSource, PgConnector>;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "regwatch_worker=debug,regwatch_pipeline=debug".into());
    let json = std::env::var("LOG_FORMAT").is_ok_and(|f| f.eq_ignore_ascii_case("json"));
    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    // --- Configuration ---
    let config = WorkerConfig::from_env()?;
    tracing::info!(
        rules = %config.rules_path.display(),
        source = %config.source_path.display(),
        entity = %config.run.entity,
        pages = config.run.page_count,
        interval_secs = config.scrape_interval.as_secs(),
        "Loaded worker configuration"
    );

    let rules = RuleSet::from_file(&config.rules_path)
        .context("Failed to load validation rules")?;
    tracing::info!(
        fields = rules.fields().count(),
        required = rules.required_fields().len(),
        "Validation rules loaded"
    );

    // --- Database ---
    let pool = regwatch_db::create_pool(config.database.clone())
        .await
        .context("Failed to connect to database")?;
    regwatch_db::run_migrations(&pool)
        .await
        .context("Failed to run database migrations")?;
    pool.close().await;
    tracing::info!("Database migrations applied");

    let pipeline = IngestPipeline::new(
        JsonPageSource::new(&config.source_path),
        BatchValidator::new(rules),
        PgConnector::new(config.database.clone()),
    );

    if config.run_once {
        let report = run_scheduled(&pipeline, &config).await;
        anyhow::ensure!(report.success, "Ingestion failed: {}", report.message);
        return Ok(());
    }

    // --- Schedule ---
    let mut ticker = tokio::time::interval(config.scrape_interval);
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                run_scheduled(&pipeline, &config).await;
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Shutdown signal received, stopping worker");
                break;
            }
        }
    }

    Ok(())
}

async fn run_scheduled(pipeline: &Pipeline, config: &WorkerConfig) -> PipelineReport {
    let report = run_with_retry(config.retries, config.retry_delay, move |_| {
        pipeline.run(&config.run)
    })
    .await;

    match serde_json::to_string(&report) {
        Ok(body) => tracing::info!(success = report.success, report = %body, "Run finished"),
        Err(e) => tracing::warn!(error = %e, "Failed to serialize run report"),
    }
    report
}
