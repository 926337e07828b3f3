use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use regwatch_core::constants::{DEFAULT_PAGES_TO_SCRAPE, ENTITY_VALUE};
use regwatch_pipeline::RunOptions;
use sqlx::postgres::PgConnectOptions;

/// An environment variable held a value that could not be parsed.
#[derive(Debug, thiserror::Error)]
#[error("{var} has invalid value {value:?}: {reason}")]
pub struct ConfigError {
    pub var: &'static str,
    pub value: String,
    pub reason: String,
}

/// Worker configuration loaded from environment variables.
///
/// | Env Var                | Default                          |
/// |------------------------|----------------------------------|
/// | `DATABASE_URL`         | built from the `DB_*` variables  |
/// | `DB_HOST`              | `postgres`                       |
/// | `DB_PORT`              | `5432`                           |
/// | `DB_NAME`              | `airflow`                        |
/// | `DB_USERNAME`          | `airflow`                        |
/// | `DB_PASSWORD`          | `airflow`                        |
/// | `RULES_PATH`           | `configs/validation_rules.yaml`  |
/// | `SOURCE_PATH`          | `data/scraped_pages.json`        |
/// | `ENTITY`               | `Agencia Nacional de Infraestructura` |
/// | `PAGES_TO_SCRAPE`      | `9`                              |
/// | `START_PAGE`           | `0`                              |
/// | `FORCE_SCRAPE`         | `false`                          |
/// | `SCRAPE_INTERVAL_SECS` | `21600`                          |
/// | `RETRIES`              | `1`                              |
/// | `RETRY_DELAY_SECS`     | `300`                            |
/// | `RUN_ONCE`             | `false`                          |
///
/// The `DB_*` parts are passed to the driver as-is, so passwords may contain
/// URL-reserved characters. A `DATABASE_URL` must be percent-encoded.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub database: PgConnectOptions,
    pub rules_path: PathBuf,
    /// Scraper dump read by each run.
    pub source_path: PathBuf,
    pub run: RunOptions,
    pub scrape_interval: Duration,
    /// Extra attempts after a failed run.
    pub retries: u32,
    pub retry_delay: Duration,
    /// Run a single invocation and exit instead of scheduling.
    pub run_once: bool,
}

impl WorkerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Load configuration through `lookup`, which returns the value of an
    /// environment variable if it is set.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str, default: &str| lookup(name).unwrap_or_else(|| default.to_string());

        let database = match lookup("DATABASE_URL") {
            Some(url) => url
                .trim()
                .parse::<PgConnectOptions>()
                .map_err(|e| ConfigError {
                    var: "DATABASE_URL",
                    reason: e.to_string(),
                    value: url.clone(),
                })?,
            None => PgConnectOptions::new()
                .host(&var("DB_HOST", "postgres"))
                .port(parse(&lookup, "DB_PORT", 5432)?)
                .username(&var("DB_USERNAME", "airflow"))
                .password(&var("DB_PASSWORD", "airflow"))
                .database(&var("DB_NAME", "airflow")),
        };

        let run = RunOptions {
            page_count: parse(&lookup, "PAGES_TO_SCRAPE", DEFAULT_PAGES_TO_SCRAPE)?,
            start_page: parse(&lookup, "START_PAGE", 0)?,
            force_scrape: flag(&lookup, "FORCE_SCRAPE")?,
            entity: var("ENTITY", ENTITY_VALUE),
        };

        Ok(Self {
            database,
            rules_path: var("RULES_PATH", "configs/validation_rules.yaml").into(),
            source_path: var("SOURCE_PATH", "data/scraped_pages.json").into(),
            run,
            scrape_interval: Duration::from_secs(parse(&lookup, "SCRAPE_INTERVAL_SECS", 21_600)?),
            retries: parse(&lookup, "RETRIES", 1)?,
            retry_delay: Duration::from_secs(parse(&lookup, "RETRY_DELAY_SECS", 300)?),
            run_once: flag(&lookup, "RUN_ONCE")?,
        })
    }
}

fn parse<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
    default: T,
) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(var) {
        None => Ok(default),
        Some(value) => value.trim().parse().map_err(|e: T::Err| ConfigError {
            var,
            reason: e.to_string(),
            value,
        }),
    }
}

fn flag(lookup: &impl Fn(&str) -> Option<String>, var: &'static str) -> Result<bool, ConfigError> {
    let Some(value) = lookup(var) else {
        return Ok(false);
    };
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(ConfigError {
            var,
            value,
            reason: "expected true or false".to_string(),
        }),
    }
}
