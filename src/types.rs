//! Core types for the headache-trends engine
//!
//! This module defines the data structures that flow through each stage of the
//! engine: raw spreadsheet records, extracted fields, day and week buckets, and
//! the window aggregates handed to the dashboard.

use chrono::{NaiveDate, NaiveDateTime};
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

/// Keys starting with this character are metadata, never user fields
pub const METADATA_PREFIX: char = '_';

/// Reserved key holding the 1-based source row number
pub const ROW_NUMBER_KEY: &str = "_row_number";

/// Returns true for reserved metadata keys
pub fn is_metadata_key(key: &str) -> bool {
    key.starts_with(METADATA_PREFIX)
}

/// One spreadsheet row: column header → cell text.
///
/// Headers are free-form and may differ between captures of the same sheet.
/// Insertion order is preserved so that scans over the fields and rendered
/// context are deterministic. Inserting an existing header replaces its value
/// in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawRecord {
    entries: Vec<(String, String)>,
}

impl RawRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty record tagged with its source row
    pub fn with_row_number(row_number: usize) -> Self {
        let mut record = Self::new();
        record.insert(ROW_NUMBER_KEY, row_number.to_string());
        record
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    /// Exact-name lookup, metadata keys included
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn row_number(&self) -> Option<usize> {
        self.get(ROW_NUMBER_KEY).and_then(|v| v.trim().parse().ok())
    }

    /// User fields in column order (metadata skipped)
    pub fn fields(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries().filter(|(k, _)| !is_metadata_key(k))
    }

    /// All entries in column order, metadata included
    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn field_count(&self) -> usize {
        self.fields().count()
    }

    /// True when the record carries no user fields
    pub fn is_empty(&self) -> bool {
        self.fields().next().is_none()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for RawRecord {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut record = RawRecord::new();
        for (key, value) in iter {
            record.insert(key, value);
        }
        record
    }
}

impl Serialize for RawRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, value) in &self.entries {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for RawRecord {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(RawRecordVisitor)
    }
}

struct RawRecordVisitor;

impl<'de> Visitor<'de> for RawRecordVisitor {
    type Value = RawRecord;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a map of column headers to cell values")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<RawRecord, A::Error> {
        let mut record = RawRecord::new();
        while let Some((key, value)) = access.next_entry::<String, serde_json::Value>()? {
            record.insert(key, cell_text(&value));
        }
        Ok(record)
    }
}

/// Render a JSON cell as the text a spreadsheet would show
pub fn cell_text(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::Null => String::new(),
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Fields resolved from one record. Each is independently optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedFields {
    /// Calendar date of the entry (midnight; time-of-day is not parsed)
    pub date: Option<NaiveDateTime>,
    /// Pain intensity, never negative
    pub pain_level: Option<f64>,
    /// Medication name, trimmed and non-empty
    pub drug: Option<String>,
}

/// Extracted fields tagged with their source row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordFields {
    pub row_number: Option<usize>,
    #[serde(flatten)]
    pub fields: ExtractedFields,
}

/// Aggregation policy selector
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum View {
    #[default]
    Weekly,
    Monthly,
}

impl View {
    pub fn as_str(&self) -> &'static str {
        match self {
            View::Weekly => "weekly",
            View::Monthly => "monthly",
        }
    }

    /// Map a dashboard selector to a view. Anything unrecognised is weekly.
    pub fn from_selector(selector: &str) -> Self {
        match selector {
            "weekly" => View::Weekly,
            "monthly" => View::Monthly,
            other => {
                log::debug!("unknown view selector {other:?}, using weekly");
                View::Weekly
            }
        }
    }
}

/// One calendar day of the weekly view
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayBucket {
    pub date: NaiveDate,
    /// Short weekday label ("Mon", "Tue", ...)
    pub day: String,
    pub count: u32,
    pub has_headache: bool,
    /// Records on this day with a resolved medication
    pub drug_count: u32,
    pub pain_levels: Vec<f64>,
    /// Mean of `pain_levels`, one decimal; 0 when the day has none
    pub avg_pain: f64,
}

/// One week-of-month bucket of the monthly view (weeks 1-4)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeekBucket {
    pub week: u32,
    /// Display label ("Week 1", ...)
    pub label: String,
    pub count: u32,
    /// Distinct days in this week with at least one record
    pub headache_days: u32,
    pub drug_count: u32,
    pub avg_pain: f64,
}

/// Aggregate over the trailing seven days
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyStats {
    pub total_headaches: u32,
    pub headache_days: u32,
    pub avg_pain: f64,
    pub consistency: f64,
    pub total_drugs: u32,
    pub drugs_by_type: BTreeMap<String, u32>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub week_start: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub week_end: Option<NaiveDate>,
    /// Day buckets, oldest first (charts)
    pub daily_data: Vec<DayBucket>,
    /// Same buckets, newest first (tables)
    pub daily_data_sorted: Vec<DayBucket>,
}

/// Aggregate over the current calendar month to date
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyStats {
    pub total_headaches: u32,
    pub headache_days: u32,
    pub avg_pain: f64,
    pub consistency: f64,
    pub total_drugs: u32,
    pub drugs_by_type: BTreeMap<String, u32>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub month_start: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub days_in_month: Option<u32>,
    pub weekly_data: Vec<WeekBucket>,
}

/// Result of one aggregation pass, shaped by its view
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum WindowAggregate {
    Weekly(WeeklyStats),
    Monthly(MonthlyStats),
}

impl WindowAggregate {
    pub fn view(&self) -> View {
        match self {
            WindowAggregate::Weekly(_) => View::Weekly,
            WindowAggregate::Monthly(_) => View::Monthly,
        }
    }

    pub fn total_headaches(&self) -> u32 {
        match self {
            WindowAggregate::Weekly(s) => s.total_headaches,
            WindowAggregate::Monthly(s) => s.total_headaches,
        }
    }

    pub fn consistency(&self) -> f64 {
        match self {
            WindowAggregate::Weekly(s) => s.consistency,
            WindowAggregate::Monthly(s) => s.consistency,
        }
    }
}

// Dashboard output structures

/// Dashboard payload handed to the rendering layer
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardPayload {
    pub producer: DashboardProducer,
    pub view: View,
    /// False when the row source reported itself unavailable
    pub data_available: bool,
    /// Reference time the window was computed against
    pub computed_at: NaiveDateTime,
    pub stats: WindowAggregate,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardProducer {
    pub name: String,
    pub version: String,
    pub instance_id: String,
}
