use std::{
    cell::{Cell, RefCell},
    fs::File,
    io::{self, Read},
    path::Path,
};

use log::{debug, trace};

use super::{
    encoding::Encoding, row_cache::RowCache, settings::ReaderSettings, splitter::LineSplitter,
    tokenizer::Tokenizer,
};
use crate::{
    core::{
        item::{ItemReader, ItemReaderResult},
        resolver::{IdentityResolver, Resolver, Row},
    },
    error::{CsvError, Result},
};

/// A streaming CSV reader that implements the `ItemReader` trait.
///
/// Each call pulls one logical line from the source, runs it through the skip
/// filters, the header rule and the row cache, tokenizes it and finally hands
/// the row to the configured [`Resolver`].
///
/// # Counters
///
/// - [`line_index`](Self::line_index): every line fetched from the source
/// - [`row_index`](Self::row_index): lines surviving the empty/comment filters,
///   the header included
/// - [`record_index`](Self::record_index): lines actually tokenized; cache hits
///   and the header are not counted
///
/// # Examples
///
/// ```
/// use stream_csv_rs::item::csv::csv_reader::CsvItemReaderBuilder;
///
/// let data = "h1,h2\n1,2\n";
/// let reader = CsvItemReaderBuilder::new()
///     .has_headers(true)
///     .from_reader(data.as_bytes())
///     .unwrap();
///
/// assert_eq!(reader.read_row().unwrap(), Some(vec!["1".to_string(), "2".to_string()]));
/// assert_eq!(reader.read_row().unwrap(), None);
/// assert_eq!(reader.header().as_deref(), Some("h1,h2"));
/// assert_eq!(reader.row_index(), 2);
/// assert_eq!(reader.record_index(), 1);
/// ```
pub struct CsvItemReader<R, Res = IdentityResolver> {
    settings: ReaderSettings,
    tokenizer: Tokenizer,
    resolver: Res,
    state: RefCell<ReaderState<R>>,
    line_index: Cell<usize>,
    row_index: Cell<usize>,
    record_index: Cell<usize>,
}

struct ReaderState<R> {
    /// `None` once the reader is closed.
    splitter: Option<LineSplitter<R>>,
    cache: RowCache,
    header: Option<String>,
    header_consumed: bool,
}

impl<R: Read, Res> CsvItemReader<R, Res> {
    fn new(source: R, settings: ReaderSettings, resolver: Res) -> Self {
        let splitter = LineSplitter::new(
            source,
            settings.encoding,
            settings.effective_buffer_size(),
        );

        Self {
            tokenizer: Tokenizer::new(settings.separator, settings.ignore_errors),
            settings,
            resolver,
            state: RefCell::new(ReaderState {
                splitter: Some(splitter),
                cache: RowCache::new(),
                header: None,
                header_consumed: false,
            }),
            line_index: Cell::new(0),
            row_index: Cell::new(0),
            record_index: Cell::new(0),
        }
    }

    /// Reads the next row of cells, or `None` once the source is exhausted.
    ///
    /// A [`CsvError::MalformedRow`] consumes the offending logical line and the
    /// next call continues after it. A stray quote outside a quoted cell opens
    /// a quoted span while lines are split, so that logical line runs up to the
    /// next closing quote, or to the end of input when there is none.
    pub fn read_row(&self) -> Result<Option<Row>> {
        let mut guard = self.state.borrow_mut();
        let state = &mut *guard;
        let splitter = state.splitter.as_mut().ok_or(CsvError::UseAfterDispose)?;
        let caching = self.settings.caching();

        loop {
            let Some(raw) = splitter.next_line()? else {
                return Ok(None);
            };
            let line = inc(&self.line_index);

            if self.settings.skip_empty_lines && raw.is_empty() {
                trace!("line {line}: skipped empty line");
                continue;
            }

            if let Some(prefix) = &self.settings.comment_prefix {
                if raw.starts_with(prefix.as_str()) {
                    trace!("line {line}: skipped comment");
                    continue;
                }
            }

            inc(&self.row_index);

            if self.settings.has_header && !state.header_consumed {
                debug!("line {line}: header consumed");
                state.header_consumed = true;
                state.header = Some(raw);
                continue;
            }

            if caching {
                if self.settings.skip_duplicates && state.cache.contains(&raw) {
                    trace!("line {line}: skipped duplicate");
                    continue;
                }
                if let Some(row) = state.cache.get(&raw) {
                    trace!("line {line}: served from cache");
                    return Ok(Some(row.clone()));
                }
            }

            let row = self.tokenizer.parse_row(&raw, line)?;
            inc(&self.record_index);

            if caching {
                state.cache.insert(raw, row.clone());
            }
            return Ok(Some(row));
        }
    }

    /// Iterates over the remaining rows.
    pub fn rows(&self) -> Rows<'_, R, Res> {
        Rows { reader: self }
    }

    /// Releases the underlying source. Calling it again has no effect.
    pub fn close(&self) {
        if self.state.borrow_mut().splitter.take().is_some() {
            debug!(
                "CSV reader closed after {} lines, {} records",
                self.line_index.get(),
                self.record_index.get()
            );
        }
    }

    pub fn is_closed(&self) -> bool {
        self.state.borrow().splitter.is_none()
    }
}

impl<R, Res> CsvItemReader<R, Res> {
    pub fn line_index(&self) -> usize {
        self.line_index.get()
    }

    pub fn row_index(&self) -> usize {
        self.row_index.get()
    }

    pub fn record_index(&self) -> usize {
        self.record_index.get()
    }

    /// Raw text of the header line, once it has been consumed.
    pub fn header(&self) -> Option<String> {
        self.state.borrow().header.clone()
    }

    /// Number of distinct raw lines held by the row cache.
    pub fn cached_rows(&self) -> usize {
        self.state.borrow().cache.len()
    }

    pub fn settings(&self) -> &ReaderSettings {
        &self.settings
    }

    pub fn resolver(&self) -> &Res {
        &self.resolver
    }
}

impl<R: Read, Res: Resolver> CsvItemReader<R, Res> {
    /// Reads the next row and resolves it into a record.
    pub fn read_record(&self) -> Result<Option<Res::Record>> {
        self.read_row()?
            .map(|row| self.resolver.deserialize(row))
            .transpose()
    }

    /// Iterates over the remaining records.
    pub fn records(&self) -> Records<'_, R, Res> {
        Records { reader: self }
    }
}

impl<R: Read, Res: Resolver> ItemReader<Res::Record> for CsvItemReader<R, Res> {
    /// Reads the next record.
    ///
    /// # Returns
    /// - `Ok(Some(record))` if a record is successfully read
    /// - `Ok(None)` if there are no more records to read
    /// - `Err(error)` if the line is malformed, the resolver rejects the row,
    ///   the source fails or the reader is closed
    fn read(&self) -> ItemReaderResult<Res::Record> {
        self.read_record()
    }
}

/// Iterator over raw rows, see [`CsvItemReader::rows`].
pub struct Rows<'a, R, Res> {
    reader: &'a CsvItemReader<R, Res>,
}

impl<R: Read, Res> Iterator for Rows<'_, R, Res> {
    type Item = Result<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        self.reader.read_row().transpose()
    }
}

/// Iterator over resolved records, see [`CsvItemReader::records`].
pub struct Records<'a, R, Res> {
    reader: &'a CsvItemReader<R, Res>,
}

impl<R: Read, Res: Resolver> Iterator for Records<'_, R, Res> {
    type Item = Result<Res::Record>;

    fn next(&mut self) -> Option<Self::Item> {
        self.reader.read_record().transpose()
    }
}

fn inc(counter: &Cell<usize>) -> usize {
    let next = counter.get() + 1;
    counter.set(next);
    next
}

/// A builder for configuring CSV item reading.
///
/// # Default Configuration
///
/// - Delimiter: comma (,)
/// - Encoding: UTF-8
/// - Headers: disabled
/// - Cache, duplicate skipping, empty line skipping: disabled
/// - Strict quote parsing
///
/// # Examples
///
/// ```
/// use stream_csv_rs::item::csv::csv_reader::CsvItemReaderBuilder;
///
/// let reader = CsvItemReaderBuilder::new()
///     .delimiter(';')
///     .comment_prefix("#")
///     .skip_empty_lines(true)
///     .from_reader("# generated\nname;age\n\nAlice;30".as_bytes())
///     .unwrap();
///
/// let rows: Vec<_> = reader.rows().collect::<Result<_, _>>().unwrap();
/// assert_eq!(rows, vec![vec!["name", "age"], vec!["Alice", "30"]]);
/// ```
pub struct CsvItemReaderBuilder<Res = IdentityResolver> {
    settings: ReaderSettings,
    resolver: Res,
}

impl Default for CsvItemReaderBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl CsvItemReaderBuilder {
    pub fn new() -> Self {
        Self {
            settings: ReaderSettings::default(),
            resolver: IdentityResolver,
        }
    }
}

impl<Res> CsvItemReaderBuilder<Res> {
    /// Replaces every setting at once.
    pub fn settings(mut self, settings: ReaderSettings) -> Self {
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

    /// Sets the decode buffer size in bytes, clamped to 4 KiB..=4 MiB.
    pub fn buffer_size(mut self, buffer_size: usize) -> Self {
        self.settings.buffer_size = buffer_size;
        self
    }

    pub fn skip_empty_lines(mut self, yes: bool) -> Self {
        self.settings.skip_empty_lines = yes;
        self
    }

    /// Discards lines starting with `prefix`.
    pub fn comment_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.settings.comment_prefix = Some(prefix.into());
        self
    }

    /// When enabled, the first surviving line is kept as the header and is not
    /// returned as a row.
    pub fn has_headers(mut self, yes: bool) -> Self {
        self.settings.has_header = yes;
        self
    }

    pub fn use_cache(mut self, yes: bool) -> Self {
        self.settings.use_cache = yes;
        self
    }

    /// Drops lines whose raw text was already read. Enables the cache.
    pub fn skip_duplicates(mut self, yes: bool) -> Self {
        self.settings.skip_duplicates = yes;
        self
    }

    /// Tolerates malformed quoting instead of failing the row.
    pub fn ignore_errors(mut self, yes: bool) -> Self {
        self.settings.ignore_errors = yes;
        self
    }

    /// Uses `resolver` to turn rows into records.
    pub fn resolver<N: Resolver>(self, resolver: N) -> CsvItemReaderBuilder<N> {
        CsvItemReaderBuilder {
            settings: self.settings,
            resolver,
        }
    }

    /// Creates a `CsvItemReader` over any byte source.
    ///
    /// # Errors
    /// [`CsvError::InvalidArgument`] when the settings are invalid.
    pub fn from_reader<R: Read>(self, rdr: R) -> Result<CsvItemReader<R, Res>> {
        self.settings.validate()?;
        debug!(
            "Opening CSV reader (separator {:?}, encoding {:?})",
            self.settings.separator, self.settings.encoding
        );
        Ok(CsvItemReader::new(rdr, self.settings, self.resolver))
    }

    /// Creates a `CsvItemReader` from a file path.
    ///
    /// # Errors
    /// - [`CsvError::InvalidArgument`] for an empty path, a directory or invalid settings
    /// - [`CsvError::NotFound`] when the file does not exist
    pub fn from_path<P: AsRef<Path>>(self, path: P) -> Result<CsvItemReader<File, Res>> {
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

        let file = File::open(path).map_err(|error| match error.kind() {
            io::ErrorKind::NotFound => CsvError::NotFound(path.to_path_buf()),
            _ => CsvError::Io(error),
        })?;

        debug!("Opening CSV reader on {}", path.display());
        Ok(CsvItemReader::new(file, self.settings, self.resolver))
    }
}
