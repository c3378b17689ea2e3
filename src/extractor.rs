//! Heuristic field extraction
//!
//! This module resolves the fields the engine cares about out of a record whose
//! column headers are unknown ahead of time:
//! - Entry date (from a small set of exact header names)
//! - Pain level (exact header variants, then any header mentioning "pain")
//! - Medication (exact header variants, then any header mentioning a drug keyword)
//!
//! Every concern is resolved independently. Nothing here fails: a value that
//! cannot be found or parsed is simply absent.

use crate::types::{is_metadata_key, ExtractedFields, RawRecord};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

/// Date headers in precedence order
pub const DATE_FIELDS: &[&str] = &["Date", "date", "Timestamp", "timestamp"];

/// Pain headers in precedence order
pub const PAIN_FIELDS: &[&str] = &[
    "Pain Level",
    "pain_level",
    "Pain level",
    "pain level",
    "PAIN LEVEL",
    "PainLevel",
    "painLevel",
    "Pain Scale",
    "pain_scale",
    "Pain scale",
    "pain scale",
    "Pain Intensity",
    "pain_intensity",
    "Pain",
    "pain",
    "PAIN",
];

/// Substring that marks a pain column in the fallback scan (case-insensitive)
pub const PAIN_KEYWORD: &str = "pain";

/// Medication headers in precedence order
pub const DRUG_FIELDS: &[&str] = &[
    "Medication",
    "medication",
    "MEDICATION",
    "Medications",
    "medications",
    "Medication Name",
    "medication_name",
    "What medication did you take?",
    "Drug",
    "drug",
    "DRUG",
    "Drugs",
    "drugs",
    "Drug Name",
    "drug_name",
    "Medicine",
    "medicine",
    "MEDICINE",
];

/// Substrings that mark a medication column in the fallback scan (case-insensitive)
pub const DRUG_KEYWORDS: &[&str] = &["drug", "medication", "medicine", "med"];

/// Extractor for resolving heuristically-named fields
pub struct FieldExtractor;

impl FieldExtractor {
    /// Resolve every concern of a record
    pub fn extract(record: &RawRecord) -> ExtractedFields {
        let date = Self::resolve_date(record);
        if date.is_none() {
            log::trace!(
                "row {:?}: no parseable date, excluded from windows",
                record.row_number()
            );
        }

        ExtractedFields {
            date,
            pain_level: Self::resolve_pain_level(record),
            drug: Self::resolve_drug(record),
        }
    }

    /// The first date header with a non-empty value decides the date.
    pub fn resolve_date(record: &RawRecord) -> Option<NaiveDateTime> {
        let raw = DATE_FIELDS
            .iter()
            .filter_map(|name| record.get(name))
            .map(str::trim)
            .find(|value| !value.is_empty())?;

        parse_sheet_date(raw).map(|date| date.and_time(NaiveTime::MIN))
    }

    pub fn resolve_pain_level(record: &RawRecord) -> Option<f64> {
        let exact = PAIN_FIELDS
            .iter()
            .filter_map(|name| record.get(name))
            .find_map(parse_pain_level);

        exact.or_else(|| {
            record
                .fields()
                .filter(|(key, _)| key.to_lowercase().contains(PAIN_KEYWORD))
                .find_map(|(_, value)| parse_pain_level(value))
        })
    }

    pub fn resolve_drug(record: &RawRecord) -> Option<String> {
        let exact = DRUG_FIELDS
            .iter()
            .filter_map(|name| record.get(name))
            .find_map(non_empty_trimmed);

        exact.or_else(|| {
            record
                .fields()
                .filter(|(key, _)| is_drug_header(key))
                .find_map(|(_, value)| non_empty_trimmed(value))
        })
    }
}

/// Parse the date portion of a sheet cell such as `11/5/2025 9:14 PM`.
///
/// Only the text before the first space is read and it must be exactly three
/// `/`-separated integers in month/day/year order. Years are taken as written.
pub fn parse_sheet_date(raw: &str) -> Option<NaiveDate> {
    let date_part = raw.trim().split(' ').next()?;
    let parts: Vec<&str> = date_part.split('/').collect();
    if parts.len() != 3 {
        return None;
    }

    let month: u32 = parts[0].parse().ok()?;
    let day: u32 = parts[1].parse().ok()?;
    let year: i32 = parts[2].parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

fn parse_pain_level(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed
        .parse::<f64>()
        .ok()
        .filter(|level| level.is_finite() && *level >= 0.0)
}

fn non_empty_trimmed(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn is_drug_header(key: &str) -> bool {
    if is_metadata_key(key) {
        return false;
    }
    let lower = key.to_lowercase();
    DRUG_KEYWORDS.iter().any(|keyword| lower.contains(keyword))
}
