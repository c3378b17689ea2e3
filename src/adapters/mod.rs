//! Row source adapters
//!
//! This module provides adapters that parse the payloads a spreadsheet row
//! source hands over and map them to [`RawRecord`]s. Two shapes are accepted:
//! row maps (one JSON object per row) and the raw value grid whose first row
//! holds the headers.

mod grid;
mod rows;

pub use grid::{records_from_grid, ValueGridAdapter};
pub use rows::RowMapAdapter;

use crate::error::ComputeError;
use crate::types::RawRecord;
use serde::{Deserialize, Serialize};

/// Trait for row payload adapters
pub trait RowAdapter {
    /// Parse a payload into records.
    ///
    /// `Ok(None)` means the source reported itself unavailable (a JSON `null`);
    /// `Ok(Some(vec![]))` means it was reachable but held no rows.
    fn parse(&self, raw_json: &str) -> Result<Option<Vec<RawRecord>>, ComputeError>;
}

/// Payload shape selector
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RowFormat {
    /// JSON array of row objects
    #[default]
    Rows,
    /// Spreadsheet value grid, header row first
    Grid,
}

impl RowFormat {
    pub fn adapter(&self) -> &'static dyn RowAdapter {
        match self {
            RowFormat::Rows => &RowMapAdapter,
            RowFormat::Grid => &ValueGridAdapter,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RowFormat::Rows => "rows",
            RowFormat::Grid => "grid",
        }
    }
}
