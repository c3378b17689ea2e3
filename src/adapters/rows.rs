//! Row-map adapter
//!
//! Parses a JSON array of row objects, the shape a row source produces after
//! pairing each data row with the header row.

use crate::error::ComputeError;
use crate::types::RawRecord;

use super::RowAdapter;

/// Row map payload adapter
pub struct RowMapAdapter;

impl RowAdapter for RowMapAdapter {
    fn parse(&self, raw_json: &str) -> Result<Option<Vec<RawRecord>>, ComputeError> {
        let records: Option<Vec<RawRecord>> = serde_json::from_str(raw_json)?;
        Ok(records)
    }
}
