//! Error handling for SoundFix
//!
//! Two layers of severity: fatal errors abort a batch run before any file is
//! touched (malformed rule tables, uncreatable output directories), everything
//! else is isolated to the file that caused it and recorded in the summary.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for SoundFix operations
pub type Result<T> = std::result::Result<T, SoundFixError>;

/// Main error type for SoundFix operations
#[derive(Error, Debug)]
pub enum SoundFixError {
    // Rule-source errors (fatal)
    #[error("Invalid rule table: {detail}")]
    Config { detail: String },

    // Filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Per-file decode errors
    #[error("Cannot decode '{path}': {reason}")]
    Decode { path: PathBuf, reason: String },

    // Per-file DSP errors
    #[error("Processing produced non-finite samples for '{path}'")]
    Numeric { path: PathBuf },

    // Per-file encode errors (container has no write path)
    #[error("Cannot encode '{path}': {reason}")]
    Encode { path: PathBuf, reason: String },

    // Engine-selection errors (batch start)
    #[error("Unknown engine: '{name}'")]
    UnknownEngine { name: String },

    // Packaging errors (reported, non-fatal)
    #[error("Archive error: {reason}")]
    Archive { reason: String },
}

impl SoundFixError {
    /// Get the error code for this error type
    pub fn error_code(&self) -> &'static str {
        match self {
            SoundFixError::Config { .. } => "CONFIG_ERROR",
            SoundFixError::Io(_) => "IO_ERROR",
            SoundFixError::Decode { .. } => "DECODE_ERROR",
            SoundFixError::Numeric { .. } => "NUMERIC_ERROR",
            SoundFixError::Encode { .. } => "ENCODE_ERROR",
            SoundFixError::UnknownEngine { .. } => "UNKNOWN_ENGINE",
            SoundFixError::Archive { .. } => "ARCHIVE_ERROR",
        }
    }

    /// Whether this error aborts a batch run.
    ///
    /// Fatal errors occur before any file is processed; all other kinds are
    /// caught per file and the run continues.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            SoundFixError::Config { .. } | SoundFixError::UnknownEngine { .. }
        )
    }

    /// Shorthand for a rule-table error naming the offending row.
    pub fn config_row(row: usize, detail: impl Into<String>) -> Self {
        SoundFixError::Config {
            detail: format!("row {}: {}", row, detail.into()),
        }
    }
}
