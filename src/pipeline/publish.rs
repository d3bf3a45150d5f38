// src/pipeline/publish.rs

//! Sink adapter: writes crawl output to a blob store.
//!
//! Raw pages land under the raw prefix, one object per page URL. The course
//! aggregate is a single JSON document at a fixed key, rewritten every run.

use std::collections::BTreeMap;

use futures::stream::{self, StreamExt};

use crate::error::{AppError, Result};
use crate::models::{CourseDataset, CourseRecord, StorageConfig};
use crate::pipeline::crawl::RawPage;
use crate::storage::{BlobStore, HTML_CONTENT_TYPE, JSON_CONTENT_TYPE};
use crate::utils::url::page_key;

/// What a successful publish wrote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishReport {
    pub pages_written: usize,
    pub aggregate_key: String,
    pub aggregate_location: String,
}

/// Publishes raw pages and the course aggregate.
pub struct Publisher<'a> {
    store: &'a dyn BlobStore,
    raw_prefix: String,
    aggregate_key: String,
    concurrency: usize,
}

impl<'a> Publisher<'a> {
    pub fn new(store: &'a dyn BlobStore, config: &StorageConfig) -> Self {
        Self {
            store,
            raw_prefix: config.raw_prefix.clone(),
            aggregate_key: config.aggregate_key.clone(),
            concurrency: config.upload_concurrency.max(1),
        }
    }

    /// Write every raw page, then the aggregate.
    ///
    /// All writes are attempted even when some fail; the returned
    /// `AppError::Publish` names every key that could not be written.
    pub async fn publish(
        &self,
        pages: &[RawPage],
        records: &[CourseRecord],
    ) -> Result<PublishReport> {
        // The same URL fetched twice maps to one key; keep a single upload.
        let uploads: BTreeMap<String, &RawPage> = pages
            .iter()
            .map(|page| (page_key(&self.raw_prefix, &page.url), page))
            .collect();

        log::info!(
            "Publishing {} raw page(s) and {} course(s)",
            uploads.len(),
            records.len()
        );

        let mut failed = Vec::new();
        let mut first_error: Option<AppError> = None;
        let mut pages_written = 0;

        let mut upload_stream = stream::iter(uploads)
            .map(|(key, page)| async move {
                let result = self
                    .store
                    .put(&key, page.body.clone(), HTML_CONTENT_TYPE)
                    .await;
                (key, result)
            })
            .buffer_unordered(self.concurrency);

        while let Some((key, result)) = upload_stream.next().await {
            match result {
                Ok(()) => pages_written += 1,
                Err(e) => {
                    log::error!("Failed to write {}: {}", self.store.location(&key), e);
                    failed.push(key);
                    first_error.get_or_insert(e);
                }
            }
        }

        let dataset = CourseDataset::new(records.to_vec());
        let body = serde_json::to_vec_pretty(&dataset)?;
        if let Err(e) = self
            .store
            .put(&self.aggregate_key, body, JSON_CONTENT_TYPE)
            .await
        {
            log::error!(
                "Failed to write aggregate {}: {}",
                self.store.location(&self.aggregate_key),
                e
            );
            failed.push(self.aggregate_key.clone());
            first_error.get_or_insert(e);
        }

        if let Some(error) = first_error {
            failed.sort();
            return Err(AppError::publish(failed, error));
        }

        Ok(PublishReport {
            pages_written,
            aggregate_key: self.aggregate_key.clone(),
            aggregate_location: self.store.location(&self.aggregate_key),
        })
    }
}
