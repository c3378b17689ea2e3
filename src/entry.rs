//! New tracking entries
//!
//! Builds the row a new headache entry appends to the tracking sheet, in the
//! sheet's fixed column order, and validates the entry before it is written.

use crate::types::{RawRecord, ROW_NUMBER_KEY};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

/// Column headers of the tracking sheet, in order
pub const SHEET_COLUMNS: [&str; 10] = [
    "Timestamp",
    "Date",
    "Start Time",
    "Pain Scale",
    "Pain location",
    "Possible triggers",
    "What medication did you take?",
    "How many did you take?",
    "Note",
    "Headache?",
];

/// Upper end of the pain scale
pub const MAX_PAIN_LEVEL: f64 = 10.0;

/// Format of the `Timestamp` column
pub const TIMESTAMP_FORMAT: &str = "%m/%d/%Y %H:%M:%S";

/// A headache entry as entered by the user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewEntry {
    /// `YYYY-MM-DD`, or any text to store verbatim
    pub date: String,
    /// 24-hour `HH:MM`, or any text to store verbatim
    #[serde(default)]
    pub start_time: String,
    pub pain_level: String,
    #[serde(default)]
    pub pain_location: String,
    #[serde(default)]
    pub triggers: String,
    #[serde(default)]
    pub medication: String,
    #[serde(default)]
    pub medication_count: String,
    #[serde(default = "default_headache")]
    pub headache: String,
    #[serde(default)]
    pub notes: String,
}

fn default_headache() -> String {
    "Yes".to_string()
}

impl NewEntry {
    pub fn new(date: impl Into<String>, pain_level: impl Into<String>) -> Self {
        Self {
            date: date.into(),
            start_time: String::new(),
            pain_level: pain_level.into(),
            pain_location: String::new(),
            triggers: String::new(),
            medication: String::new(),
            medication_count: String::new(),
            headache: default_headache(),
            notes: String::new(),
        }
    }

    /// Validate the entry before writing it
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.date.trim().is_empty() {
            return Err(ValidationError::MissingField("date"));
        }

        let pain = self.pain_level.trim();
        if pain.is_empty() {
            return Err(ValidationError::MissingField("pain_level"));
        }
        let value: f64 = pain
            .parse()
            .map_err(|_| ValidationError::InvalidPainLevel(pain.to_string()))?;
        if !(0.0..=MAX_PAIN_LEVEL).contains(&value) {
            return Err(ValidationError::PainLevelOutOfRange {
                value: pain.to_string(),
                max: MAX_PAIN_LEVEL,
            });
        }

        let count = self.medication_count.trim();
        if !count.is_empty() && count.parse::<u32>().is_err() {
            return Err(ValidationError::InvalidMedicationCount(count.to_string()));
        }

        Ok(())
    }

    /// Cells for [`SHEET_COLUMNS`], stamped with `now`
    pub fn to_row(&self, now: NaiveDateTime) -> Vec<String> {
        vec![
            now.format(TIMESTAMP_FORMAT).to_string(),
            sheet_date(&self.date),
            sheet_time(&self.start_time),
            self.pain_level.clone(),
            self.pain_location.clone(),
            self.triggers.clone(),
            self.medication.clone(),
            self.medication_count.clone(),
            self.notes.clone(),
            self.headache.clone(),
        ]
    }

    /// The row as it will read back from the sheet
    pub fn to_record(&self, now: NaiveDateTime, row_number: usize) -> RawRecord {
        let mut record: RawRecord = SHEET_COLUMNS.into_iter().zip(self.to_row(now)).collect();
        record.insert(ROW_NUMBER_KEY, row_number.to_string());
        record
    }
}

/// `2025-11-05` becomes `11/05/2025`; anything else is kept as is
fn sheet_date(raw: &str) -> String {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map(|d| d.format("%m/%d/%Y").to_string())
        .unwrap_or_else(|_| raw.to_string())
}

/// `21:14` becomes `09:14 PM`; anything else is kept as is
fn sheet_time(raw: &str) -> String {
    NaiveTime::parse_from_str(raw, "%H:%M")
        .map(|t| t.format("%I:%M %p").to_string())
        .unwrap_or_else(|_| raw.to_string())
}

/// Validation errors for new entries
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Pain level is not a number: {0}")]
    InvalidPainLevel(String),

    #[error("Pain level {value} is outside 0-{max}")]
    PainLevelOutOfRange { value: String, max: f64 },

    #[error("Medication count is not a whole number: {0}")]
    InvalidMedicationCount(String),
}
