//! Plain-text record context
//!
//! Renders the full record list as a flat text block for a conversational
//! assistant. Headers are written exactly as they appear in the sheet so that
//! the same names reach the field extractor if the text is parsed back.

use crate::types::RawRecord;

/// Text used when there is nothing to render
pub const NO_DATA_CONTEXT: &str = "No data available.";

/// Formatter for the assistant context block
pub struct ContextFormatter;

impl ContextFormatter {
    /// Render every record, metadata keys omitted.
    ///
    /// `None` (source unavailable) and an empty list render the same way.
    pub fn format(records: Option<&[RawRecord]>) -> String {
        match records {
            Some(records) if !records.is_empty() => Self::format_records(records),
            _ => NO_DATA_CONTEXT.to_string(),
        }
    }

    fn format_records(records: &[RawRecord]) -> String {
        let mut out = format!("User has {} headache records:\n\n", records.len());

        for (i, record) in records.iter().enumerate() {
            out.push_str(&format!("Record {}:\n", i + 1));
            for (key, value) in record.fields() {
                out.push_str(&format!("{key}: {value}\n"));
            }
            out.push('\n');
        }

        out
    }
}
