// Error types for SWMM output (.out) file access

use std::io;

use thiserror::Error;

use super::types::ObjectKind;

#[derive(Debug, Error)]
pub enum OutError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Corrupt output file: {0}")]
    CorruptFile(&'static str),

    #[error("Simulation run failed with error code {0}")]
    RunFailed(i32),

    #[error("Output file contains no reporting periods")]
    EmptyResults,

    #[error("Truncated output file: {0}")]
    TruncatedFile(String),

    #[error("Variable count mismatch for {kind}: file declares {declared}, expected {expected}")]
    SchemaMismatch {
        kind: ObjectKind,
        declared: i32,
        expected: usize,
    },

    #[error("Unknown {kind} label: {label:?}")]
    UnknownLabel { kind: ObjectKind, label: String },

    #[error("Unknown {kind} variable: {variable:?}")]
    UnknownVariable { kind: ObjectKind, variable: String },

    #[error("{0} objects have no time series of their own")]
    NoSeries(ObjectKind),

    #[error("Period out of bounds: {period} >= {n_periods}")]
    PeriodOutOfRange { period: usize, n_periods: usize },

    #[error("Output file handle is closed")]
    ClosedHandle,
}

pub type Result<T> = std::result::Result<T, OutError>;

impl OutError {
    /// Classify an I/O failure, treating a short read as truncation.
    pub(crate) fn from_read(err: io::Error, what: impl std::fmt::Display) -> Self {
        match err.kind() {
            io::ErrorKind::UnexpectedEof => Self::TruncatedFile(format!("short read of {what}")),
            _ => Self::Io(err),
        }
    }
}
