//! Spreadsheet value-grid adapter
//!
//! Parses the values response of a spreadsheet API: a list of rows, each a list
//! of cells, with the first row holding the column headers.

use crate::error::ComputeError;
use crate::types::{cell_text, RawRecord, ROW_NUMBER_KEY};
use serde::Deserialize;

use super::RowAdapter;

/// Value grid payload adapter
pub struct ValueGridAdapter;

impl RowAdapter for ValueGridAdapter {
    fn parse(&self, raw_json: &str) -> Result<Option<Vec<RawRecord>>, ComputeError> {
        let payload: Option<GridPayload> = serde_json::from_str(raw_json)
            .map_err(|e| ComputeError::ParseError(format!("value grid: {e}")))?;

        let Some(payload) = payload else {
            return Ok(None);
        };

        let cells = match payload {
            GridPayload::Bare(values) => values,
            GridPayload::Response { values } => values.unwrap_or_default(),
        };

        let rows: Vec<Vec<String>> = cells
            .iter()
            .map(|row| row.iter().map(cell_text).collect())
            .collect();

        Ok(Some(records_from_grid(&rows)))
    }
}

/// Turn a header row plus data rows into records.
///
/// Each record gets `_row_number` set to its 1-based sheet row (the first data
/// row is row 2). Rows without any cells are skipped; short rows are padded
/// with empty values and cells past the last header are ignored.
pub fn records_from_grid(rows: &[Vec<String>]) -> Vec<RawRecord> {
    let Some((headers, data)) = rows.split_first() else {
        return Vec::new();
    };

    data.iter()
        .enumerate()
        .filter(|(_, row)| !row.is_empty())
        .map(|(i, row)| {
            let mut record = RawRecord::new();
            for (j, header) in headers.iter().enumerate() {
                record.insert(header.clone(), row.get(j).cloned().unwrap_or_default());
            }
            record.insert(ROW_NUMBER_KEY, (i + 2).to_string());
            record
        })
        .collect()
}

// Sheets API response structures

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum GridPayload {
    Bare(Vec<Vec<serde_json::Value>>),
    /// `{"range": ..., "values": [[...]]}`; `values` is omitted for an empty sheet
    Response {
        values: Option<Vec<Vec<serde_json::Value>>>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_values_response() {
        let json = r#"{
            "range": "Form Responses 1!A1:J4",
            "majorDimension": "ROWS",
            "values": [
                ["Timestamp", "Date", "Pain Scale", "What medication did you take?"],
                ["11/5/2025 21:14:00", "11/5/2025", "7", "Ibuprofen"],
                [],
                ["11/7/2025 08:02:11", "11/7/2025", 4]
            ]
        }"#;

        let records = ValueGridAdapter.parse(json).unwrap().unwrap();
        assert_eq!(records.len(), 2);

        assert_eq!(records[0].row_number(), Some(2));
        assert_eq!(records[0].get("Pain Scale"), Some("7"));
        assert_eq!(records[0].field_count(), 4);

        // Row 3 was empty and skipped; numbering still follows the sheet
        assert_eq!(records[1].row_number(), Some(4));
        assert_eq!(records[1].get("Pain Scale"), Some("4"));
        assert_eq!(records[1].get("What medication did you take?"), Some(""));
    }

    #[test]
    fn test_parse_bare_grid() {
        let json = r#"[["Date", "Pain"], ["11/5/2025", "3", "extra"]]"#;
        let records = ValueGridAdapter.parse(json).unwrap().unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].field_count(), 2);
        assert_eq!(records[0].get("Pain"), Some("3"));
    }

    #[test]
    fn test_empty_sheet_and_unavailable() {
        let empty = ValueGridAdapter
            .parse(r#"{"range": "Sheet1!A1:Z1000", "majorDimension": "ROWS"}"#)
            .unwrap();
        assert_eq!(empty, Some(Vec::new()));

        let headers_only = ValueGridAdapter.parse(r#"[["Date", "Pain"]]"#).unwrap();
        assert_eq!(headers_only, Some(Vec::new()));

        assert_eq!(ValueGridAdapter.parse("null").unwrap(), None);
    }

    #[test]
    fn test_duplicate_header_keeps_last_value() {
        let rows = vec![
            vec!["Pain".to_string(), "Pain".to_string()],
            vec!["2".to_string(), "5".to_string()],
        ];
        let records = records_from_grid(&rows);
        assert_eq!(records[0].field_count(), 1);
        assert_eq!(records[0].get("Pain"), Some("5"));
    }

    #[test]
    fn test_invalid_grid() {
        let result = ValueGridAdapter.parse(r#"{"values": "nope"}"#);
        assert!(matches!(result, Err(ComputeError::ParseError(_))));
    }
}
