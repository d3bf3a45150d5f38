// src/pipeline/sections.rs

//! Section schedule export.

use url::Url;

use crate::error::Result;
use crate::models::{SectionCatalog, SectionsConfig};
use crate::services::{PageFetcher, parse_sections};
use crate::storage::{BlobStore, JSON_CONTENT_TYPE};
use crate::utils::report;

/// Fetch the section data service, parse it, and write it as one JSON object.
///
/// Unlike the catalog crawl, a fetch failure here is fatal: there is only one
/// unit of work.
pub async fn run_sections(
    config: &SectionsConfig,
    fetcher: &PageFetcher,
    store: &dyn BlobStore,
) -> Result<SectionCatalog> {
    report::header("Section schedule export");

    let url = Url::parse(&config.url)?;
    let page = fetcher.fetch(&url).await?;
    let catalog = parse_sections(&page.text)?;

    let body = serde_json::to_vec_pretty(&catalog)?;
    store
        .put(&config.output_key, body, JSON_CONTENT_TYPE)
        .await?;

    report::summary(
        "Sections",
        &[
            ("Term", catalog.term.clone()),
            ("Updated", catalog.update.clone()),
            ("Sections", catalog.sections.len().to_string()),
            ("Output", store.location(&config.output_key)),
        ],
    );

    Ok(catalog)
}
