//! Bridges between rows of cells and caller-defined record types.
//!
//! The reader and writer never look inside a record: they hand every tokenized
//! [`Row`] to [`Resolver::deserialize`] and every outgoing record to
//! [`Resolver::serialize`]. Shape validation (cell count, cell content) is the
//! resolver's job.
//!
//! # Examples
//!
//! ```
//! use stream_csv_rs::core::resolver::{Resolver, Row};
//! use stream_csv_rs::error::CsvError;
//!
//! struct Point {
//!     x: i64,
//!     y: i64,
//! }
//!
//! struct PointResolver;
//!
//! impl Resolver for PointResolver {
//!     type Record = Point;
//!
//!     fn serialize(&self, record: &Point) -> Result<Row, CsvError> {
//!         Ok(vec![record.x.to_string(), record.y.to_string()])
//!     }
//!
//!     fn deserialize(&self, row: Row) -> Result<Point, CsvError> {
//!         match row.as_slice() {
//!             [x, y] => Ok(Point {
//!                 x: x.parse().map_err(|_| CsvError::Resolver(format!("bad x: {x}")))?,
//!                 y: y.parse().map_err(|_| CsvError::Resolver(format!("bad y: {y}")))?,
//!             }),
//!             _ => Err(CsvError::Resolver(format!("expected 2 cells, got {}", row.len()))),
//!         }
//!     }
//! }
//!
//! let point = PointResolver.deserialize(vec!["3".into(), "4".into()]).unwrap();
//! assert_eq!(point.x + point.y, 7);
//! assert!(PointResolver.deserialize(vec!["3".into()]).is_err());
//! ```

use crate::error::CsvError;

/// An ordered sequence of cells. Rows may be ragged.
pub type Row = Vec<String>;

/// Converts records to rows and back.
pub trait Resolver {
    /// The record type produced by [`deserialize`](Resolver::deserialize).
    type Record;

    fn serialize(&self, record: &Self::Record) -> Result<Row, CsvError>;

    fn deserialize(&self, row: Row) -> Result<Self::Record, CsvError>;
}

impl<Res: Resolver + ?Sized> Resolver for &Res {
    type Record = Res::Record;

    fn serialize(&self, record: &Self::Record) -> Result<Row, CsvError> {
        (**self).serialize(record)
    }

    fn deserialize(&self, row: Row) -> Result<Self::Record, CsvError> {
        (**self).deserialize(row)
    }
}

/// Passes rows through untouched.
#[derive(Debug, Default, Clone, Copy)]
pub struct IdentityResolver;

impl Resolver for IdentityResolver {
    type Record = Row;

    fn serialize(&self, record: &Row) -> Result<Row, CsvError> {
        Ok(record.clone())
    }

    fn deserialize(&self, row: Row) -> Result<Row, CsvError> {
        Ok(row)
    }
}

/// Rows whose cells may be absent.
///
/// Absent cells are written as empty strings; cells read back are always present.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullableResolver;

impl Resolver for NullableResolver {
    type Record = Vec<Option<String>>;

    fn serialize(&self, record: &Self::Record) -> Result<Row, CsvError> {
        Ok(record
            .iter()
            .map(|cell| cell.clone().unwrap_or_default())
            .collect())
    }

    fn deserialize(&self, row: Row) -> Result<Self::Record, CsvError> {
        Ok(row.into_iter().map(Some).collect())
    }
}

#[cfg(feature = "typed")]
pub use serde_resolver::SerdeResolver;

#[cfg(feature = "typed")]
mod serde_resolver {
    use std::marker::PhantomData;

    use csv::{ReaderBuilder, StringRecord, WriterBuilder};
    use serde::{Serialize, de::DeserializeOwned};

    use super::{Resolver, Row};
    use crate::error::CsvError;

    /// Maps rows to serde types by position.
    ///
    /// Struct fields are matched to cells in declaration order; the header line is
    /// never consulted. Nested containers are not supported by the flat cell model.
    ///
    /// ```
    /// use serde::{Deserialize, Serialize};
    /// use stream_csv_rs::core::resolver::{Resolver, SerdeResolver};
    ///
    /// #[derive(Debug, PartialEq, Serialize, Deserialize)]
    /// struct City {
    ///     name: String,
    ///     pop: u32,
    /// }
    ///
    /// let resolver = SerdeResolver::<City>::new();
    /// let city = resolver.deserialize(vec!["Boston".into(), "4628910".into()]).unwrap();
    /// assert_eq!(city, City { name: "Boston".into(), pop: 4628910 });
    /// assert_eq!(resolver.serialize(&city).unwrap(), vec!["Boston", "4628910"]);
    /// ```
    pub struct SerdeResolver<T> {
        _pd: PhantomData<fn() -> T>,
    }

    impl<T> SerdeResolver<T> {
        pub fn new() -> Self {
            Self { _pd: PhantomData }
        }
    }

    impl<T> Default for SerdeResolver<T> {
        fn default() -> Self {
            Self::new()
        }
    }

    impl<T: Serialize + DeserializeOwned> Resolver for SerdeResolver<T> {
        type Record = T;

        fn serialize(&self, record: &T) -> Result<Row, CsvError> {
            // The csv crate only serializes into a byte sink, so render the record
            // once and read the single line back as a record.
            let mut wtr = WriterBuilder::new()
                .has_headers(false)
                .flexible(true)
                .from_writer(Vec::new());
            wtr.serialize(record)
                .map_err(|error| CsvError::Resolver(error.to_string()))?;
            let bytes = wtr
                .into_inner()
                .map_err(|error| CsvError::Resolver(error.to_string()))?;

            let mut rdr = ReaderBuilder::new()
                .has_headers(false)
                .flexible(true)
                .from_reader(bytes.as_slice());
            let mut string_record = StringRecord::new();
            let found = rdr
                .read_record(&mut string_record)
                .map_err(|error| CsvError::Resolver(error.to_string()))?;

            if !found {
                return Ok(Row::new());
            }
            Ok(string_record.iter().map(str::to_owned).collect())
        }

        fn deserialize(&self, row: Row) -> Result<T, CsvError> {
            StringRecord::from(row)
                .deserialize(None)
                .map_err(|error| CsvError::Resolver(error.to_string()))
        }
    }
}
