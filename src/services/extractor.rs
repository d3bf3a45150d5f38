// src/services/extractor.rs

//! Course block extractor.
//!
//! Turns one catalog page into structured [`CourseRecord`]s. Pure: HTML in,
//! records out, no I/O. Blocks lacking a title or description are skipped,
//! and a page with no blocks yields an empty list.

use regex::Regex;
use scraper::{ElementRef, Html, Selector};

use crate::error::{AppError, Result};
use crate::models::{CourseRecord, ExtractorConfig, NONE_VALUE};

/// Extracts course records using configured selectors.
#[derive(Debug, Clone)]
pub struct CourseExtractor {
    block: Selector,
    title: Selector,
    description: Selector,
    container: Option<Selector>,
    requisites: RequisitePatterns,
}

/// Case-insensitive "Label: value." patterns pulled out of descriptions.
#[derive(Debug, Clone)]
struct RequisitePatterns {
    prerequisites: Regex,
    corequisites: Regex,
    restrictions: Regex,
}

impl RequisitePatterns {
    fn new() -> Result<Self> {
        Ok(Self {
            prerequisites: Regex::new(r"(?i)Prerequisites?:\s*(.*?)(?:\.|$)")?,
            corequisites: Regex::new(r"(?i)Corequisites?:\s*(.*?)(?:\.|$)")?,
            restrictions: Regex::new(r"(?i)Restrictions?:\s*(.*?)(?:\.|$)")?,
        })
    }
}

impl CourseExtractor {
    /// Build an extractor, failing on invalid selectors.
    pub fn new(config: &ExtractorConfig) -> Result<Self> {
        Ok(Self {
            block: parse_selector(&config.block_selector)?,
            title: parse_selector(&config.title_selector)?,
            description: parse_selector(&config.description_selector)?,
            container: config
                .container_selector
                .as_deref()
                .map(parse_selector)
                .transpose()?,
            requisites: RequisitePatterns::new()?,
        })
    }

    /// Extract all course records from an HTML string, in document order.
    pub fn extract(&self, html: &str) -> Vec<CourseRecord> {
        let document = Html::parse_document(html);
        self.extract_document(&document)
    }

    /// Extract from an already parsed document.
    pub fn extract_document(&self, document: &Html) -> Vec<CourseRecord> {
        if let Some(container) = &self.container {
            if document.select(container).next().is_none() {
                log::debug!("No course container on page, skipping extraction");
                return Vec::new();
            }
        }

        let records: Vec<CourseRecord> = document
            .select(&self.block)
            .filter_map(|block| self.parse_block(&block))
            .collect();

        log::debug!("Extracted {} course record(s)", records.len());
        records
    }

    fn parse_block(&self, block: &ElementRef) -> Option<CourseRecord> {
        let title_text = element_text(&block.select(&self.title).next()?);
        let description = element_text(&block.select(&self.description).next()?);

        let (course_id, title) = split_title(&title_text);

        let mut remaining = description.clone();
        let prerequisites =
            take_requisite(&self.requisites.prerequisites, &description, &mut remaining);
        let corequisites =
            take_requisite(&self.requisites.corequisites, &description, &mut remaining);
        let restrictions =
            take_requisite(&self.requisites.restrictions, &description, &mut remaining);

        Some(CourseRecord {
            course_id,
            title,
            description: normalize_whitespace(&remaining),
            prerequisites,
            corequisites,
            restrictions,
        })
    }
}

/// Collect an element's text with whitespace (including non-breaking spaces) collapsed.
fn element_text(element: &ElementRef) -> String {
    let raw: String = element.text().collect();
    normalize_whitespace(&raw.replace('\u{a0}', " "))
}

fn normalize_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Split "CS 100. Intro to Computing." into ("CS 100", "Intro to Computing").
fn split_title(title_text: &str) -> (String, String) {
    match title_text.split_once('.') {
        Some((code, rest)) => (
            code.trim().to_string(),
            rest.trim().trim_end_matches('.').trim_end().to_string(),
        ),
        None => (title_text.trim().to_string(), String::new()),
    }
}

/// Match a requisite pattern against the original description, strip the full
/// match from `remaining`, and return the captured value or "None".
fn take_requisite(pattern: &Regex, description: &str, remaining: &mut String) -> String {
    match pattern.captures(description) {
        Some(caps) => {
            let full = caps.get(0).map_or("", |m| m.as_str());
            if !full.is_empty() {
                *remaining = remaining.replace(full, "");
            }
            caps.get(1)
                .map_or(String::new(), |m| m.as_str().trim().to_string())
        }
        None => NONE_VALUE.to_string(),
    }
}

fn parse_selector(s: &str) -> Result<Selector> {
    Selector::parse(s).map_err(|e| AppError::selector(s, format!("{e:?}")))
}
