//! headache-trends - Temporal aggregation engine for self-tracked headache logs
//!
//! The engine turns loosely-structured spreadsheet rows into dashboard statistics
//! through a deterministic pipeline: row adaptation → heuristic field extraction
//! → windowing and bucketing → aggregation → dashboard encoding.
//!
//! Every windowing call takes the reference instant explicitly, so results depend
//! only on the input rows and that instant.
//!
//! ## Views
//!
//! - **Weekly**: trailing seven days, one bucket per calendar day
//! - **Monthly**: current calendar month, one bucket per week of the month (1-4)

pub mod adapters;
pub mod aggregator;
pub mod context;
pub mod encoder;
pub mod entry;
pub mod error;
pub mod extractor;
pub mod pipeline;
pub mod types;
pub mod window;

// FFI bindings for C interop (always available for cdylib/staticlib builds)
pub mod ffi;

pub use adapters::{RowAdapter, RowFormat};
pub use aggregator::TemporalAggregator;
pub use context::ContextFormatter;
pub use encoder::DashboardEncoder;
pub use entry::{NewEntry, ValidationError};
pub use error::ComputeError;
pub use extractor::FieldExtractor;
pub use pipeline::{
    aggregate, grid_to_dashboard, monthly_stats, parse_reference_time, rows_to_context,
    rows_to_dashboard, weekly_stats, TrendsProcessor,
};
pub use types::{RawRecord, View, WindowAggregate};

/// Engine version embedded in all dashboard payloads
pub const TRENDS_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name for dashboard payloads
pub const PRODUCER_NAME: &str = "headache-trends";
