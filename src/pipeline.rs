//! Pipeline orchestration
//!
//! This module provides the public API for headache-trends.
//! It orchestrates the full path from a row payload to dashboard JSON or to
//! the plain-text assistant context.

use crate::adapters::{RowAdapter, RowFormat, RowMapAdapter, ValueGridAdapter};
use crate::aggregator::TemporalAggregator;
use crate::context::ContextFormatter;
use crate::encoder::DashboardEncoder;
use crate::error::ComputeError;
use crate::extractor::FieldExtractor;
use crate::types::{
    DashboardPayload, MonthlyStats, RawRecord, RecordFields, View, WeeklyStats, WindowAggregate,
};
use chrono::{Local, NaiveDate, NaiveDateTime, NaiveTime};

/// Accepted layouts for an explicit reference time
const REFERENCE_TIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
];

/// Weekly statistics; `None` (source unavailable) is treated as no records
pub fn weekly_stats(
    records: Option<&[RawRecord]>,
    now: NaiveDateTime,
) -> Result<WeeklyStats, ComputeError> {
    TemporalAggregator::weekly(records.unwrap_or_default(), now)
}

/// Monthly statistics; `None` (source unavailable) is treated as no records
pub fn monthly_stats(
    records: Option<&[RawRecord]>,
    now: NaiveDateTime,
) -> Result<MonthlyStats, ComputeError> {
    TemporalAggregator::monthly(records.unwrap_or_default(), now)
}

/// Aggregate under the given view; `None` is treated as no records
pub fn aggregate(
    view: View,
    records: Option<&[RawRecord]>,
    now: NaiveDateTime,
) -> Result<WindowAggregate, ComputeError> {
    TemporalAggregator::aggregate(view, records.unwrap_or_default(), now)
}

/// Convert a JSON array of row maps to a dashboard payload.
///
/// # Arguments
/// * `raw_json` - JSON array of row objects, or `null` when the source is unavailable
/// * `view` - View selector (`"weekly"` or `"monthly"`; anything else is weekly)
/// * `now` - Reference instant the window is anchored to
///
/// # Example
/// ```ignore
/// let json = rows_to_dashboard(rows_json, "weekly".to_string(), now)?;
/// ```
pub fn rows_to_dashboard(
    raw_json: String,
    view: String,
    now: NaiveDateTime,
) -> Result<String, ComputeError> {
    let adapter = RowMapAdapter;
    process_row_payload(&adapter, &DashboardEncoder::new(), &raw_json, &view, now)
}

/// Convert a spreadsheet value grid to a dashboard payload.
///
/// # Arguments
/// * `raw_json` - Values response (`{"values": [[...]]}` or a bare grid), header row first
/// * `view` - View selector (`"weekly"` or `"monthly"`; anything else is weekly)
/// * `now` - Reference instant the window is anchored to
pub fn grid_to_dashboard(
    raw_json: String,
    view: String,
    now: NaiveDateTime,
) -> Result<String, ComputeError> {
    let adapter = ValueGridAdapter;
    process_row_payload(&adapter, &DashboardEncoder::new(), &raw_json, &view, now)
}

/// Render the assistant context block for a payload
pub fn rows_to_context(raw_json: String, format: RowFormat) -> Result<String, ComputeError> {
    let records = format.adapter().parse(&raw_json)?;
    Ok(ContextFormatter::format(records.as_deref()))
}

/// Parse an explicit reference time, or read the local wall clock once.
///
/// Accepts `YYYY-MM-DDTHH:MM[:SS[.fff]]`, the same with a space separator, or a
/// bare `YYYY-MM-DD` (midnight).
pub fn parse_reference_time(raw: Option<&str>) -> Result<NaiveDateTime, ComputeError> {
    let Some(raw) = raw else {
        return Ok(Local::now().naive_local());
    };
    let raw = raw.trim();

    REFERENCE_TIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .map(|d| d.and_time(NaiveTime::MIN))
        })
        .ok_or_else(|| ComputeError::InvalidReferenceTime(raw.to_string()))
}

/// Process a row payload through the full pipeline.
///
/// Pipeline stages:
/// 1. RowAdapter - Parse the payload into records
/// 2. TemporalAggregator - Extract, window, bucket and summarise
/// 3. DashboardEncoder - Wrap the aggregate and encode to JSON
fn process_row_payload(
    adapter: &dyn RowAdapter,
    encoder: &DashboardEncoder,
    raw_json: &str,
    view: &str,
    now: NaiveDateTime,
) -> Result<String, ComputeError> {
    let payload = build_payload(adapter, encoder, raw_json, View::from_selector(view), now)?;
    serde_json::to_string_pretty(&payload).map_err(ComputeError::JsonError)
}

fn build_payload(
    adapter: &dyn RowAdapter,
    encoder: &DashboardEncoder,
    raw_json: &str,
    view: View,
    now: NaiveDateTime,
) -> Result<DashboardPayload, ComputeError> {
    // Stage 1: Parse payload
    let records = adapter.parse(raw_json)?;

    // Stage 2: Aggregate
    let stats = aggregate(view, records.as_deref(), now)?;

    // Stage 3: Encode
    Ok(encoder.encode(stats, records.is_some(), now))
}

/// Processor that keeps one producer identity across calls.
///
/// Use this when repeated calls should be attributable to the same instance,
/// or when output must be byte-identical for identical input.
pub struct TrendsProcessor {
    encoder: DashboardEncoder,
}

impl Default for TrendsProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl TrendsProcessor {
    /// Create a new processor with a random instance ID
    pub fn new() -> Self {
        Self {
            encoder: DashboardEncoder::new(),
        }
    }

    /// Create a processor with a specific instance ID
    pub fn with_instance_id(instance_id: String) -> Self {
        Self {
            encoder: DashboardEncoder::with_instance_id(instance_id),
        }
    }

    pub fn instance_id(&self) -> &str {
        self.encoder.instance_id()
    }

    /// Dashboard payload for a row payload of the given shape
    pub fn payload(
        &self,
        format: RowFormat,
        raw_json: &str,
        view: View,
        now: NaiveDateTime,
    ) -> Result<DashboardPayload, ComputeError> {
        build_payload(format.adapter(), &self.encoder, raw_json, view, now)
    }

    /// Dashboard JSON for a row payload of the given shape
    pub fn process(
        &self,
        format: RowFormat,
        raw_json: &str,
        view: &str,
        now: NaiveDateTime,
    ) -> Result<String, ComputeError> {
        process_row_payload(format.adapter(), &self.encoder, raw_json, view, now)
    }

    /// Assistant context block for a row payload of the given shape
    pub fn context(&self, format: RowFormat, raw_json: &str) -> Result<String, ComputeError> {
        let records = format.adapter().parse(raw_json)?;
        Ok(ContextFormatter::format(records.as_deref()))
    }

    /// Per-record extraction results, in input order
    pub fn extract(
        &self,
        format: RowFormat,
        raw_json: &str,
    ) -> Result<Vec<RecordFields>, ComputeError> {
        let records = format.adapter().parse(raw_json)?.unwrap_or_default();
        Ok(records
            .iter()
            .map(|record| RecordFields {
                row_number: record.row_number(),
                fields: FieldExtractor::extract(record),
            })
            .collect())
    }
}
