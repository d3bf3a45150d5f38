//! Service layer for the crawler application.
//!
//! - Page fetching (`PageFetcher`)
//! - Course block extraction (`CourseExtractor`)
//! - Link discovery (`discover_links`)
//! - Section schedule parsing (`parse_sections`)

pub mod extractor;
pub mod fetcher;
pub mod links;
pub mod sections;

pub use extractor::CourseExtractor;
pub use fetcher::{Page, PageFetcher};
pub use links::{discover_document_links, discover_links, same_origin};
pub use sections::parse_sections;
