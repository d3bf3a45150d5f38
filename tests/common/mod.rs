//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::Mutex;

use async_trait::async_trait;
use catalog_crawler::error::{AppError, Result};
use catalog_crawler::models::CourseRecord;
use catalog_crawler::storage::{BlobStore, CacheEntry, ContentCache, Fingerprint};

/// One object written to a [`MemoryStore`].
#[derive(Debug, Clone)]
pub struct StoredObject {
    pub body: Vec<u8>,
    pub content_type: String,
}

/// Blob store that keeps every object in memory.
#[derive(Default)]
pub struct MemoryStore {
    objects: Mutex<BTreeMap<String, StoredObject>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<StoredObject> {
        self.objects.lock().unwrap().get(key).cloned()
    }

    pub fn keys(&self) -> Vec<String> {
        self.objects.lock().unwrap().keys().cloned().collect()
    }
}

#[async_trait]
impl BlobStore for MemoryStore {
    async fn put(&self, key: &str, body: Vec<u8>, content_type: &str) -> Result<()> {
        self.objects.lock().unwrap().insert(
            key.to_string(),
            StoredObject {
                body,
                content_type: content_type.to_string(),
            },
        );
        Ok(())
    }

    fn location(&self, key: &str) -> String {
        format!("memory://{key}")
    }
}

/// Blob store that rejects every write.
pub struct FailingStore;

#[async_trait]
impl BlobStore for FailingStore {
    async fn put(&self, key: &str, _body: Vec<u8>, _content_type: &str) -> Result<()> {
        Err(AppError::S3(format!("access denied: {key}")))
    }

    fn location(&self, key: &str) -> String {
        format!("failing://{key}")
    }
}

/// Content cache whose every operation fails.
pub struct FailingCache;

impl ContentCache for FailingCache {
    fn lookup(&self, fingerprint: &Fingerprint) -> Result<Option<CacheEntry>> {
        Err(AppError::cache(fingerprint.as_str(), "disk unavailable"))
    }

    fn store(&self, fingerprint: &Fingerprint, _records: &[CourseRecord]) -> Result<()> {
        Err(AppError::cache(fingerprint.as_str(), "disk unavailable"))
    }

    fn len(&self) -> Result<usize> {
        Err(AppError::cache("*", "disk unavailable"))
    }
}

/// Course block markup as the catalog renders it.
pub fn course_block(title: &str, description: &str) -> String {
    format!(
        r#"<div class="courseblock">
             <p class="courseblocktitle"><strong>{title}</strong></p>
             <p class="courseblockdesc">{description}</p>
           </div>"#
    )
}

/// A catalog page with the given course blocks and outgoing links.
pub fn catalog_page(blocks: &[String], links: &[&str]) -> String {
    let anchors: String = links
        .iter()
        .map(|href| format!(r#"<li><a href="{href}">{href}</a></li>"#))
        .collect();
    format!(
        r#"<html><body>
             <ul id="nav">{anchors}</ul>
             <div id="coursestextcontainer">{}</div>
           </body></html>"#,
        blocks.concat()
    )
}
