use std::{
    cell::{Cell, RefCell},
    fs::{File, OpenOptions},
    io::{self, BufWriter, Write},
    path::Path,
};

use log::{debug, error, trace};

use super::{
    encoding::Encoding,
    escape::escape_field,
    settings::{LineTerminator, WriterSettings},
};
use crate::{
    core::{
        item::{ItemWriter, ItemWriterResult},
        resolver::{IdentityResolver, Resolver},
    },
    error::{CsvError, Result},
};

/// A CSV writer that implements the `ItemWriter` trait.
///
/// Every record goes through the [`Resolver`], each cell is quoted when it
/// contains the separator, a quote or a line break, and the line is encoded
/// and buffered. The sink is flushed on [`close`](Self::close), on
/// [`flush`](Self::flush) and, best-effort, when the writer is dropped.
///
/// # Examples
///
/// ```
/// use stream_csv_rs::item::csv::{csv_writer::CsvItemWriterBuilder, settings::LineTerminator};
///
/// let writer = CsvItemWriterBuilder::new()
///     .terminator(LineTerminator::Lf)
///     .from_writer(Vec::new())
///     .unwrap();
///
/// writer
///     .write_row(&vec!["city".to_string(), "motto".to_string()])
///     .unwrap()
///     .write_row(&vec!["Boston".to_string(), "Sicut patribus, sit Deus nobis".to_string()])
///     .unwrap();
///
/// let data = String::from_utf8(writer.into_inner().unwrap()).unwrap();
/// assert_eq!(data, "city,motto\nBoston,\"Sicut patribus, sit Deus nobis\"\n");
/// ```
pub struct CsvItemWriter<W: Write, Res = IdentityResolver> {
    settings: WriterSettings,
    resolver: Res,
    /// `None` once the writer is closed.
    stream: RefCell<Option<BufWriter<W>>>,
    line: RefCell<String>,
    encoded: RefCell<Vec<u8>>,
    rows_written: Cell<usize>,
}

impl<W: Write, Res> CsvItemWriter<W, Res> {
    fn new(wtr: W, settings: WriterSettings, resolver: Res) -> Self {
        let capacity = settings.effective_buffer_size();
        Self {
            settings,
            resolver,
            stream: RefCell::new(Some(BufWriter::with_capacity(capacity, wtr))),
            line: RefCell::new(String::new()),
            encoded: RefCell::new(Vec::new()),
            rows_written: Cell::new(0),
        }
    }

    /// Number of lines written so far. Suppressed empty lines are not counted.
    pub fn rows_written(&self) -> usize {
        self.rows_written.get()
    }

    pub fn settings(&self) -> &WriterSettings {
        &self.settings
    }

    pub fn is_closed(&self) -> bool {
        self.stream.borrow().is_none()
    }

    /// Flushes buffered lines to the underlying sink.
    pub fn flush(&self) -> Result<()> {
        let mut guard = self.stream.borrow_mut();
        let stream = guard.as_mut().ok_or(CsvError::UseAfterDispose)?;
        if let Err(error) = stream.flush() {
            // Drop the lines the sink refused so no later flush writes them again.
            if let Some(stream) = guard.take() {
                let capacity = stream.capacity();
                let (inner, _) = stream.into_parts();
                *guard = Some(BufWriter::with_capacity(capacity, inner));
            }
            return Err(error.into());
        }
        Ok(())
    }

    /// Flushes and releases the underlying sink. Calling it again has no effect.
    pub fn close(&self) -> Result<()> {
        let Some(stream) = self.stream.borrow_mut().take() else {
            return Ok(());
        };

        let mut inner = unwrap_stream(stream)?;
        inner.flush()?;
        debug!("CSV writer closed after {} rows", self.rows_written.get());
        Ok(())
    }

    /// Flushes and returns the underlying sink.
    pub fn into_inner(self) -> Result<W> {
        let stream = self
            .stream
            .borrow_mut()
            .take()
            .ok_or(CsvError::UseAfterDispose)?;
        let mut inner = unwrap_stream(stream)?;
        inner.flush()?;
        Ok(inner)
    }

    fn write_cells(&self, cells: &[String]) -> Result<()> {
        let mut stream = self.stream.borrow_mut();
        let stream = stream.as_mut().ok_or(CsvError::UseAfterDispose)?;

        let mut line = self.line.borrow_mut();
        line.clear();
        for (index, cell) in cells.iter().enumerate() {
            if index > 0 {
                line.push(self.settings.separator);
            }
            line.push_str(&escape_field(cell, self.settings.separator));
        }

        if self.settings.skip_empty_lines && line.is_empty() {
            trace!("suppressed empty line");
            return Ok(());
        }
        line.push_str(self.settings.terminator.as_str());

        let mut encoded = self.encoded.borrow_mut();
        encoded.clear();
        self.settings.encoding.encode(&line, &mut encoded)?;
        stream.write_all(&encoded)?;

        self.rows_written.set(self.rows_written.get() + 1);
        Ok(())
    }
}

/// Flushes the buffer and returns the sink. On failure the unwritten lines are
/// discarded rather than flushed again when the buffer is dropped.
fn unwrap_stream<W: Write>(stream: BufWriter<W>) -> Result<W> {
    match stream.into_inner() {
        Ok(inner) => Ok(inner),
        Err(error) => {
            let (error, stream) = error.into_parts();
            let _ = stream.into_parts();
            Err(error.into())
        }
    }
}

impl<W: Write, Res: Resolver> CsvItemWriter<W, Res> {
    /// Serializes `record` and writes it as one line.
    pub fn write_row(&self, record: &Res::Record) -> Result<&Self> {
        let cells = self.resolver.serialize(record)?;
        self.write_cells(&cells)?;
        Ok(self)
    }

    /// Writes every record of `records`, stopping at the first error.
    pub fn write_rows<'a, I>(&self, records: I) -> Result<&Self>
    where
        I: IntoIterator<Item = &'a Res::Record>,
        Res::Record: 'a,
    {
        for record in records {
            self.write_row(record)?;
        }
        Ok(self)
    }
}

impl<W: Write, Res: Resolver> ItemWriter<Res::Record> for CsvItemWriter<W, Res> {
    fn write(&self, items: &[Res::Record]) -> ItemWriterResult {
        self.write_rows(items)?;
        Ok(())
    }

    /// Flush the contents of the internal buffer to the underlying writer.
    ///
    /// Note that this also flushes the underlying writer.
    fn flush(&self) -> ItemWriterResult {
        CsvItemWriter::flush(self)
    }

    fn close(&self) -> ItemWriterResult {
        CsvItemWriter::close(self)
    }
}

impl<W: Write, Res> Drop for CsvItemWriter<W, Res> {
    fn drop(&mut self) {
        if let Some(stream) = self.stream.get_mut().as_mut() {
            if let Err(error) = stream.flush() {
                error!("Unable to flush CSV writer on drop: {}", error);
            }
        }
    }
}

/// A builder for configuring CSV item writing.
///
/// # Default Configuration
///
/// - Delimiter: comma (,)
/// - Encoding: UTF-8
/// - Terminator: the platform line ending
/// - Existing files are neither overwritten nor appended to
pub struct CsvItemWriterBuilder<Res = IdentityResolver> {
    settings: WriterSettings,
    resolver: Res,
}

impl Default for CsvItemWriterBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl CsvItemWriterBuilder {
    pub fn new() -> Self {
        Self {
            settings: WriterSettings::default(),
            resolver: IdentityResolver,
        }
    }
}

impl<Res> CsvItemWriterBuilder<Res> {
    /// Replaces every setting at once.
    pub fn settings(mut self, settings: WriterSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn delimiter(mut self, delimiter: char) -> Self {
        self.settings.separator = delimiter;
        self
    }

    pub fn encoding(mut self, encoding: Encoding) -> Self {
        self.settings.encoding = encoding;
        self
    }

    pub fn buffer_size(mut self, buffer_size: usize) -> Self {
        self.settings.buffer_size = buffer_size;
        self
    }

    /// Suppresses lines that render to nothing.
    pub fn skip_empty_lines(mut self, yes: bool) -> Self {
        self.settings.skip_empty_lines = yes;
        self
    }

    pub fn terminator(mut self, terminator: LineTerminator) -> Self {
        self.settings.terminator = terminator;
        self
    }

    /// Truncates the destination file if it exists.
    pub fn overwrite_existing(mut self, yes: bool) -> Self {
        self.settings.overwrite_existing = yes;
        self
    }

    /// Appends to the destination file if it exists.
    pub fn append_existing(mut self, yes: bool) -> Self {
        self.settings.append_existing = yes;
        self
    }

    /// Uses `resolver` to turn records into rows.
    pub fn resolver<N: Resolver>(self, resolver: N) -> CsvItemWriterBuilder<N> {
        CsvItemWriterBuilder {
            settings: self.settings,
            resolver,
        }
    }

    /// Creates a `CsvItemWriter` over any byte sink.
    pub fn from_writer<W: Write>(self, wtr: W) -> Result<CsvItemWriter<W, Res>> {
        self.settings.validate()?;
        debug!(
            "Opening CSV writer (separator {:?}, encoding {:?})",
            self.settings.separator, self.settings.encoding
        );
        Ok(CsvItemWriter::new(wtr, self.settings, self.resolver))
    }

    /// Creates a `CsvItemWriter` on a file path.
    ///
    /// A missing file is created. An existing file is truncated with
    /// `overwrite_existing`, extended with `append_existing`, and refused otherwise.
    ///
    /// # Errors
    /// - [`CsvError::ConflictingOptions`] when both overwrite and append are set
    /// - [`CsvError::AlreadyExists`] when the file exists and neither is set
    /// - [`CsvError::InvalidArgument`] for an empty path, a directory or invalid settings
    pub fn from_path<P: AsRef<Path>>(self, path: P) -> Result<CsvItemWriter<File, Res>> {
        let path = path.as_ref();
        self.settings.validate()?;

        if path.as_os_str().is_empty() {
            return Err(CsvError::InvalidArgument("path must not be empty".to_string()));
        }
        if path.is_dir() {
            return Err(CsvError::InvalidArgument(format!(
                "{} is a directory",
                path.display()
            )));
        }

        let mut options = OpenOptions::new();
        if path.exists() {
            if self.settings.overwrite_existing {
                options.write(true).truncate(true);
            } else if self.settings.append_existing {
                options.append(true);
            } else {
                return Err(CsvError::AlreadyExists(path.to_path_buf()));
            }
        } else {
            options.write(true).create_new(true);
        }

        let file = options.open(path).map_err(|error| match error.kind() {
            io::ErrorKind::AlreadyExists => CsvError::AlreadyExists(path.to_path_buf()),
            _ => CsvError::Io(error),
        })?;

        debug!("Opening CSV writer on {}", path.display());
        Ok(CsvItemWriter::new(file, self.settings, self.resolver))
    }
}
