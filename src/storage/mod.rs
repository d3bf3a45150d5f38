//! Storage abstractions.
//!
//! - [`BlobStore`]: write-only object store receiving raw pages and the
//!   aggregated course dataset
//! - [`cache`]: fingerprint-keyed content cache
//!
//! ## Key Layout
//!
//! ```text
//! course_data/
//! ├── all_courses.json                      # Aggregated dataset (fixed key)
//! ├── sections.json                         # Section schedule
//! └── pages/                                # Raw HTML, one object per fetch
//!     └── catalog.example.edu_ug_cs_.html
//! ```

pub mod cache;
pub mod local;
#[cfg(feature = "s3")]
pub mod s3;

use async_trait::async_trait;

use crate::error::Result;

// Re-export for convenience
pub use cache::{CacheEntry, ContentCache, DiskCache, Fingerprint, MemoryCache};
pub use local::LocalBlobStore;

/// Content type of raw catalog pages.
pub const HTML_CONTENT_TYPE: &str = "text/html";

/// Content type of JSON documents.
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// Trait for object storage backends.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store `body` under `key`, replacing any existing object.
    async fn put(&self, key: &str, body: Vec<u8>, content_type: &str) -> Result<()>;

    /// Human-readable location of a key, for logs.
    fn location(&self, key: &str) -> String;
}
