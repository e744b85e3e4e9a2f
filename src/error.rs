use std::{io, path::PathBuf};

use thiserror::Error;

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, CsvError>;

#[derive(Error, Debug)]
/// Errors raised while configuring, reading or writing CSV streams.
pub enum CsvError {
    /// A construction argument was rejected (separator, path, buffer, encoding...).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The input file does not exist.
    #[error("file not found: {}", .0.display())]
    NotFound(PathBuf),

    /// The output file exists and neither overwrite nor append was requested.
    #[error("file already exists: {}", .0.display())]
    AlreadyExists(PathBuf),

    #[error("overwrite_existing and append_existing cannot both be enabled")]
    ConflictingOptions,

    /// Quote parsing failed on a raw line.
    #[error("malformed row at line {line}, offset {offset}: {raw:?}")]
    MalformedRow {
        /// Line index of the reader when the row was tokenized.
        line: usize,
        /// 0-based character offset of the offending character.
        offset: usize,
        /// The raw line text.
        raw: String,
    },

    #[error("operation attempted on a closed instance")]
    UseAfterDispose,

    /// A resolver refused a row or a record.
    #[error("resolver: {0}")]
    Resolver(String),

    #[error(transparent)]
    Io(#[from] io::Error),
}

impl CsvError {
    /// Returns `true` for row-level data errors, after which reading may continue.
    pub fn is_row_error(&self) -> bool {
        matches!(self, CsvError::MalformedRow { .. } | CsvError::Resolver(_))
    }
}
