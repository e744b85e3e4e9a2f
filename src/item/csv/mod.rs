//! Streaming CSV support for reading and writing tabular data.
//!
//! # Module Architecture
//!
//! The read side is a pipeline:
//!
//! 1. **LineSplitter** pulls bytes through a fixed-size buffer, decodes them and
//!    yields one logical line at a time, keeping line breaks that sit inside
//!    quoted cells.
//! 2. **CsvItemReader** applies the empty-line, comment, header and duplicate
//!    filters, consults the **RowCache**, and asks the **Tokenizer** to split
//!    the line into cells.
//! 3. The configured [`Resolver`](crate::core::resolver::Resolver) turns the
//!    cells into a record.
//!
//! The write side is independent: **CsvItemWriter** serializes a record into
//! cells, quotes the cells that need it and appends one encoded line to the sink.
//!
//! Both components follow the builder pattern for configuration.
//!
//! # Examples
//!
//! ## Round trip
//!
//! ```
//! use stream_csv_rs::item::csv::csv_reader::CsvItemReaderBuilder;
//! use stream_csv_rs::item::csv::csv_writer::CsvItemWriterBuilder;
//!
//! let rows = vec![
//!     vec!["id".to_string(), "comment".to_string()],
//!     vec!["1".to_string(), "multi\nline, \"quoted\"".to_string()],
//! ];
//!
//! let writer = CsvItemWriterBuilder::new().from_writer(Vec::new()).unwrap();
//! writer.write_rows(&rows).unwrap();
//! let bytes = writer.into_inner().unwrap();
//!
//! let reader = CsvItemReaderBuilder::new().from_reader(bytes.as_slice()).unwrap();
//! let read: Vec<_> = reader.rows().collect::<Result<_, _>>().unwrap();
//! assert_eq!(read, rows);
//! ```
//!
//! ## Typed records
//!
//! ```
//! use stream_csv_rs::core::item::ItemReader;
//! use stream_csv_rs::core::resolver::{Resolver, Row};
//! use stream_csv_rs::error::CsvError;
//! use stream_csv_rs::item::csv::csv_reader::CsvItemReaderBuilder;
//!
//! struct Temperature(f64);
//!
//! struct TemperatureResolver;
//!
//! impl Resolver for TemperatureResolver {
//!     type Record = Temperature;
//!
//!     fn serialize(&self, record: &Temperature) -> Result<Row, CsvError> {
//!         Ok(vec![record.0.to_string()])
//!     }
//!
//!     fn deserialize(&self, row: Row) -> Result<Temperature, CsvError> {
//!         let cell = row.first().ok_or_else(|| CsvError::Resolver("empty row".into()))?;
//!         cell.parse()
//!             .map(Temperature)
//!             .map_err(|_| CsvError::Resolver(format!("not a number: {cell}")))
//!     }
//! }
//!
//! let reader = CsvItemReaderBuilder::new()
//!     .has_headers(true)
//!     .resolver(TemperatureResolver)
//!     .from_reader("celsius\n21.5\n-3\n".as_bytes())
//!     .unwrap();
//!
//! let mut total = 0.0;
//! while let Some(temperature) = reader.read().unwrap() {
//!     total += temperature.0;
//! }
//! assert_eq!(total, 18.5);
//! ```

/// Text encodings and the incremental decoder.
pub mod encoding;

/// Field quoting rules shared by the writer and callers.
pub mod escape;

/// Reader and writer configuration records.
pub mod settings;

/// Logical line splitting over a buffered byte source.
pub mod splitter;

/// Cell splitting of one logical line.
pub mod tokenizer;

/// Memo of tokenized rows keyed by raw line text.
pub mod row_cache;

/// A module providing facilities for reading CSV data records.
pub mod csv_reader;

/// A module providing facilities for writing CSV data records.
pub mod csv_writer;
