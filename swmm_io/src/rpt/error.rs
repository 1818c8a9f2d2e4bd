// Error types for SWMM report (.rpt) access

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Report has no part named {0:?}")]
    UnknownPart(String),
}

pub type Result<T> = std::result::Result<T, ReportError>;
