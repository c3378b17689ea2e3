//! Error types for headache-trends

use thiserror::Error;

/// Errors that can occur during computation
///
/// Per-record heuristics never produce these; an unresolvable field is simply
/// absent. Only malformed payloads and window arithmetic surface here.
#[derive(Debug, Error)]
pub enum ComputeError {
    #[error("Failed to parse row payload: {0}")]
    ParseError(String),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Invalid reference time: {0}")]
    InvalidReferenceTime(String),

    #[error("Window arithmetic out of range: {0}")]
    WindowArithmetic(String),
}
