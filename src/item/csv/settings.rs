use super::encoding::Encoding;
use crate::error::{CsvError, Result};

/// Smallest accepted decode buffer, in bytes.
pub const MIN_BUFFER_SIZE: usize = 4 * 1024;

/// Largest accepted decode buffer, in bytes.
pub const MAX_BUFFER_SIZE: usize = 4 * 1024 * 1024;

/// Decode buffer used when none is configured.
pub const DEFAULT_BUFFER_SIZE: usize = 64 * 1024;

/// Line terminator emitted by the writer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineTerminator {
    /// `\r\n`
    CrLf,
    /// `\n`
    Lf,
    /// `\r`
    Cr,
}

impl LineTerminator {
    pub fn as_str(&self) -> &'static str {
        match self {
            LineTerminator::CrLf => "\r\n",
            LineTerminator::Lf => "\n",
            LineTerminator::Cr => "\r",
        }
    }
}

impl Default for LineTerminator {
    /// The platform line ending: CRLF on Windows, LF elsewhere.
    fn default() -> Self {
        if cfg!(windows) {
            LineTerminator::CrLf
        } else {
            LineTerminator::Lf
        }
    }
}

/// Reader configuration.
///
/// A reader copies its settings at construction; changing a settings value
/// afterwards has no effect on readers already built from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReaderSettings {
    pub separator: char,
    pub encoding: Encoding,
    /// Decode buffer size in bytes, clamped by [`ReaderSettings::effective_buffer_size`].
    pub buffer_size: usize,
    pub skip_empty_lines: bool,
    /// Lines starting with this prefix are discarded.
    pub comment_prefix: Option<String>,
    /// The first surviving line is a header and is never returned as a row.
    pub has_header: bool,
    pub use_cache: bool,
    /// Drop lines whose raw text was already seen. Implies `use_cache`.
    pub skip_duplicates: bool,
    /// Lenient mode: tolerate malformed quoting instead of failing.
    pub ignore_errors: bool,
}

impl Default for ReaderSettings {
    fn default() -> Self {
        Self {
            separator: ',',
            encoding: Encoding::default(),
            buffer_size: DEFAULT_BUFFER_SIZE,
            skip_empty_lines: false,
            comment_prefix: None,
            has_header: false,
            use_cache: false,
            skip_duplicates: false,
            ignore_errors: false,
        }
    }
}

impl ReaderSettings {
    pub fn effective_buffer_size(&self) -> usize {
        clamp_buffer_size(self.buffer_size)
    }

    /// Whether the row cache is active, explicitly or through `skip_duplicates`.
    pub fn caching(&self) -> bool {
        self.use_cache || self.skip_duplicates
    }

    pub fn validate(&self) -> Result<()> {
        validate_separator(self.separator)?;
        if let Some(prefix) = &self.comment_prefix {
            if prefix.is_empty() {
                return Err(CsvError::InvalidArgument(
                    "comment prefix must not be empty".to_string(),
                ));
            }
        }
        Ok(())
    }
}

/// Writer configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriterSettings {
    pub separator: char,
    pub encoding: Encoding,
    pub buffer_size: usize,
    /// Lines that render to nothing are not written.
    pub skip_empty_lines: bool,
    pub terminator: LineTerminator,
    /// Truncate an existing destination file.
    pub overwrite_existing: bool,
    /// Append to an existing destination file.
    pub append_existing: bool,
}

impl Default for WriterSettings {
    fn default() -> Self {
        Self {
            separator: ',',
            encoding: Encoding::default(),
            buffer_size: DEFAULT_BUFFER_SIZE,
            skip_empty_lines: false,
            terminator: LineTerminator::default(),
            overwrite_existing: false,
            append_existing: false,
        }
    }
}

impl WriterSettings {
    pub fn effective_buffer_size(&self) -> usize {
        clamp_buffer_size(self.buffer_size)
    }

    pub fn validate(&self) -> Result<()> {
        validate_separator(self.separator)?;
        if self.overwrite_existing && self.append_existing {
            return Err(CsvError::ConflictingOptions);
        }
        Ok(())
    }
}

fn clamp_buffer_size(size: usize) -> usize {
    size.clamp(MIN_BUFFER_SIZE, MAX_BUFFER_SIZE)
}

fn validate_separator(separator: char) -> Result<()> {
    match separator {
        '"' | '\r' | '\n' => Err(CsvError::InvalidArgument(format!(
            "separator {separator:?} is reserved"
        ))),
        _ => Ok(()),
    }
}
