// src/services/sections.rs

//! Section schedule parser.
//!
//! The schedule-builder data service answers with a script-like payload:
//!
//! ```text
//! <?php ... ?>
//! term: "Fall 2024",
//! update: "2024-08-01 10:00",
//! data: [["CS 100","Roadmap to Computing",3,["001","001","12345",30,"Smith",...]]],
//! ```

use regex::Regex;
use serde_json::Value;

use crate::error::{AppError, Result};
use crate::models::{SectionCatalog, SectionRow};

const DAYS: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];

/// Parse the data service payload into a section catalog.
pub fn parse_sections(content: &str) -> Result<SectionCatalog> {
    let content = content.replace("<?php", "").replace("?>", "");
    let content = content.trim();

    let data_re = Regex::new(r"(?s)data:\s*(\[\[.*\]\]),")?;
    let term_re = Regex::new(r#"term:\s*"(.*)""#)?;
    let update_re = Regex::new(r#"update:\s*"(.*)""#)?;

    let (Some(data), Some(term), Some(update)) = (
        data_re.captures(content),
        term_re.captures(content),
        update_re.captures(content),
    ) else {
        return Err(AppError::parse(
            "section payload is missing data, term, or update",
        ));
    };

    let courses: Vec<Value> = serde_json::from_str(&data[1])
        .map_err(|e| AppError::parse(format!("section data is not a valid array: {e}")))?;

    let mut sections = Vec::new();
    for course in &courses {
        let Some(fields) = course.as_array() else {
            return Err(AppError::parse("course entry is not an array"));
        };
        if fields.len() < 3 {
            return Err(AppError::parse(format!(
                "course entry has {} fields, expected at least 3",
                fields.len()
            )));
        }

        for section in &fields[3..] {
            sections.push(parse_section(fields, section)?);
        }
    }

    Ok(SectionCatalog {
        term: term[1].to_string(),
        update: update[1].to_string(),
        sections,
    })
}

fn parse_section(course: &[Value], section: &Value) -> Result<SectionRow> {
    let Some(fields) = section.as_array() else {
        return Err(AppError::parse("section entry is not an array"));
    };
    if fields.len() < 10 {
        return Err(AppError::parse(format!(
            "section entry has {} fields, expected 10",
            fields.len()
        )));
    }

    let meetings = fields[9]
        .as_array()
        .map(|entries| entries.iter().filter_map(format_meeting).collect::<Vec<_>>())
        .unwrap_or_default();

    Ok(SectionRow {
        course_code: value_text(&course[0]),
        course_name: value_text(&course[1]),
        credits: value_text(&course[2]),
        section_code: value_text(&fields[0]),
        section_number: value_text(&fields[1]),
        crn: value_text(&fields[2]),
        enrollment: value_text(&fields[3]),
        professor: value_text(&fields[4]),
        notes: value_text(&fields[7]),
        schedule: meetings.join("; "),
    })
}

/// Format `[day, start_secs, end_secs, location]` as "Mon 10:00-11:20 at KUPF 207".
fn format_meeting(meeting: &Value) -> Option<String> {
    let parts = meeting.as_array()?;
    let day = day_name(parts.first()?.as_u64()?)?;
    let start = clock_time(parts.get(1)?.as_u64()?);
    let end = clock_time(parts.get(2)?.as_u64()?);
    let location = parts.get(3).map(value_text).unwrap_or_default();
    Some(format!("{day} {start}-{end} at {location}"))
}

/// Day numbers run 1 (Sunday) through 7 (Saturday).
fn day_name(day: u64) -> Option<&'static str> {
    let idx = usize::try_from(day).ok()?.checked_sub(1)?;
    DAYS.get(idx).copied()
}

/// Seconds since midnight as HH:MM.
fn clock_time(seconds: u64) -> String {
    format!("{:02}:{:02}", seconds / 3600, (seconds % 3600) / 60)
}

fn value_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.trim().to_string(),
        other => other.to_string(),
    }
}
