#![cfg_attr(docsrs, feature(doc_cfg))]

/*!
 # Stream CSV for Rust

 A streaming CSV codec: a reader that turns a byte stream into rows of string
 cells (or typed records through a pluggable resolver), and a writer that
 performs the inverse transform.

 ## Core Concepts

- **ItemReader / ItemWriter:** the pull/push contracts every source and sink implements.
- **Resolver:** converts between a row of cells and a caller-defined record.
  `IdentityResolver` keeps raw rows.
- **CsvItemReader:** splits the stream into logical lines (line breaks inside
  quotes are kept), filters empty, comment, header and duplicate lines,
  tokenizes the rest and resolves them.
- **CsvItemWriter:** quotes cells containing the separator, a quote or a line
  break, joins them and writes one line per record.

 ## Features

| **Feature** | **Description**                                               |
|-------------|---------------------------------------------------------------|
| typed       | Enables `SerdeResolver`, mapping rows to serde types          |
| full        | Enables all available features                                |

 ## Getting Started

```rust
# use stream_csv_rs::{
#     error::CsvError,
#     item::csv::{csv_reader::CsvItemReaderBuilder, csv_writer::CsvItemWriterBuilder},
# };
fn main() -> Result<(), CsvError> {
    let csv = "year,make,model\n1948,Porsche,356\n1995,Peugeot,\"205, GTI\"\n";

    let reader = CsvItemReaderBuilder::new()
        .has_headers(true)
        .from_reader(csv.as_bytes())?;

    let writer = CsvItemWriterBuilder::new()
        .delimiter(';')
        .from_writer(Vec::new())?;

    for row in reader.rows() {
        let mut row = row?;
        row.reverse();
        writer.write_row(&row)?;
    }

    let output = String::from_utf8(writer.into_inner()?).unwrap();
    assert!(output.contains("205, GTI;Peugeot;1995"));
    Ok(())
}
```

 ## License
 Licensed under either of

 -   Apache License, Version 2.0
     ([LICENSE-APACHE](LICENSE-APACHE) or <http://www.apache.org/licenses/LICENSE-2.0>)
 -   MIT license
     ([LICENSE-MIT](LICENSE-MIT) or <http://opensource.org/licenses/MIT>)

 at your option.
 */

/// Core contracts: item readers/writers and resolvers
pub mod core;

/// Error types for CSV operations
pub mod error;

#[doc(inline)]
pub use error::*;

/// Readers and writers of items (the CSV codec)
pub mod item;
