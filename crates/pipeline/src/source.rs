//! Extraction seam.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::SourceError;

/// Produces raw scraped records, one JSON value per record.
#[async_trait]
pub trait RegulationSource: Send + Sync {
    /// Fetch `page_count` listing pages starting at `start_page` and return
    /// their records in page order.
    async fn fetch(&self, page_count: u32, start_page: u32) -> Result<Vec<Value>, SourceError>;
}

#[async_trait]
impl<T: RegulationSource + ?Sized> RegulationSource for Arc<T> {
    async fn fetch(&self, page_count: u32, start_page: u32) -> Result<Vec<Value>, SourceError> {
        (**self).fetch(page_count, start_page).await
    }
}

/// Reads pages dumped by the external scraper.
///
/// The file holds a JSON array with one element per listing page, newest
/// first; each page is an array of records. Pages past the end of the file
/// are treated as empty.
#[derive(Debug, Clone)]
pub struct JsonPageSource {
    path: PathBuf,
}

impl JsonPageSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl RegulationSource for JsonPageSource {
    async fn fetch(&self, page_count: u32, start_page: u32) -> Result<Vec<Value>, SourceError> {
        let raw = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|source| SourceError::Io {
                path: self.path.clone(),
                source,
            })?;
        let pages: Vec<Vec<Value>> = serde_json::from_str(&raw)?;

        let records: Vec<Value> = pages
            .into_iter()
            .skip(start_page as usize)
            .take(page_count as usize)
            .flatten()
            .collect();

        tracing::debug!(
            path = %self.path.display(),
            start_page,
            page_count,
            records = records.len(),
            "Read scraped pages"
        );
        Ok(records)
    }
}
