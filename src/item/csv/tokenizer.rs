use std::{
    iter::{Enumerate, Peekable},
    str::Chars,
};

use log::warn;

use crate::{
    core::resolver::Row,
    error::{CsvError, Result},
};

type Cursor<'a> = Peekable<Enumerate<Chars<'a>>>;

enum CellEnd {
    Separator,
    End,
}

/// Splits one raw line into cells.
///
/// Quoted cells have their surrounding quotes stripped and `""` collapsed to
/// `"`. In strict mode malformed quoting fails with [`CsvError::MalformedRow`];
/// in lenient mode the offending character is kept as data.
#[derive(Debug, Clone, Copy)]
pub struct Tokenizer {
    separator: char,
    lenient: bool,
}

impl Tokenizer {
    pub fn new(separator: char, lenient: bool) -> Self {
        Self { separator, lenient }
    }

    /// Tokenizes `text`. `line` is only used to locate errors.
    ///
    /// ```
    /// use stream_csv_rs::item::csv::tokenizer::Tokenizer;
    ///
    /// let tokenizer = Tokenizer::new(',', false);
    /// assert_eq!(tokenizer.parse_row(r#"a,"b,c",d"#, 1).unwrap(), vec!["a", "b,c", "d"]);
    /// assert_eq!(tokenizer.parse_row("a,b,", 1).unwrap(), vec!["a", "b", ""]);
    /// assert!(tokenizer.parse_row("", 1).unwrap().is_empty());
    /// ```
    pub fn parse_row(&self, text: &str, line: usize) -> Result<Row> {
        let mut cells = Row::new();
        if text.is_empty() {
            return Ok(cells);
        }

        let mut chars = text.chars().enumerate().peekable();
        loop {
            let mut cell = String::new();

            let end = match chars.peek() {
                Some(&(start, '"')) => {
                    chars.next();
                    self.quoted(&mut chars, &mut cell, start, text, line)?
                }
                _ => self.unquoted(&mut chars, &mut cell, text, line)?,
            };

            cells.push(cell);

            if let CellEnd::End = end {
                return Ok(cells);
            }
        }
    }

    fn unquoted(
        &self,
        chars: &mut Cursor<'_>,
        cell: &mut String,
        text: &str,
        line: usize,
    ) -> Result<CellEnd> {
        while let Some((offset, c)) = chars.next() {
            if c == self.separator {
                return Ok(CellEnd::Separator);
            }
            if c == '"' {
                self.tolerate(text, offset, line)?;
            }
            cell.push(c);
        }
        Ok(CellEnd::End)
    }

    fn quoted(
        &self,
        chars: &mut Cursor<'_>,
        cell: &mut String,
        start: usize,
        text: &str,
        line: usize,
    ) -> Result<CellEnd> {
        while let Some((offset, c)) = chars.next() {
            if c != '"' {
                cell.push(c);
                continue;
            }

            match chars.peek() {
                Some(&(_, '"')) => {
                    chars.next();
                    cell.push('"');
                }
                Some(&(_, next)) if next == self.separator => {
                    chars.next();
                    return Ok(CellEnd::Separator);
                }
                None => return Ok(CellEnd::End),
                Some(_) => {
                    // Closing quote followed by data: keep the quote and finish
                    // the cell as unquoted text.
                    self.tolerate(text, offset, line)?;
                    cell.push('"');
                    return self.unquoted(chars, cell, text, line);
                }
            }
        }

        // Unterminated quote: the opening quote is the offending character.
        self.tolerate(text, start, line)?;
        cell.insert(0, '"');
        Ok(CellEnd::End)
    }

    fn tolerate(&self, text: &str, offset: usize, line: usize) -> Result<()> {
        if self.lenient {
            warn!("Tolerating malformed quoting at line {line}, offset {offset}");
            Ok(())
        } else {
            Err(CsvError::MalformedRow {
                line,
                offset,
                raw: text.to_string(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strict(text: &str) -> Result<Row> {
        Tokenizer::new(',', false).parse_row(text, 7)
    }

    fn lenient(text: &str) -> Row {
        Tokenizer::new(',', true).parse_row(text, 7).unwrap()
    }

    #[test]
    fn plain_cells_are_split() {
        assert_eq!(strict("a,b,c").unwrap(), vec!["a", "b", "c"]);
        assert_eq!(strict("a").unwrap(), vec!["a"]);
        assert_eq!(strict(",").unwrap(), vec!["", ""]);
    }

    #[test]
    fn quoted_cells_are_unescaped() {
        assert_eq!(strict(r#"a,"b,c",d"#).unwrap(), vec!["a", "b,c", "d"]);
        assert_eq!(strict(r#"a,"b""c",d"#).unwrap(), vec!["a", "b\"c", "d"]);
        assert_eq!(strict(r#""""#).unwrap(), vec![""]);
        assert_eq!(strict("\"x\r\ny\",z").unwrap(), vec!["x\r\ny", "z"]);
    }

    #[test]
    fn trailing_separator_adds_an_empty_cell() {
        assert_eq!(strict("a,b,").unwrap(), vec!["a", "b", ""]);
        assert_eq!(strict("a,b").unwrap(), vec!["a", "b"]);
        assert_eq!(strict(r#"a,"b","#).unwrap(), vec!["a", "b", ""]);
    }

    #[test]
    fn other_separators_are_honored() {
        let tokenizer = Tokenizer::new(';', false);
        assert_eq!(
            tokenizer.parse_row(r#"a;"b;c";d,e"#, 1).unwrap(),
            vec!["a", "b;c", "d,e"]
        );
    }

    #[test]
    fn quote_inside_unquoted_cell_is_malformed() {
        match strict(r#"ab"c,d"#) {
            Err(CsvError::MalformedRow { line, offset, raw }) => {
                assert_eq!(line, 7);
                assert_eq!(offset, 2);
                assert_eq!(raw, r#"ab"c,d"#);
            }
            other => panic!("unexpected result: {other:?}"),
        }
        assert_eq!(lenient(r#"ab"c,d"#), vec![r#"ab"c"#, "d"]);
    }

    #[test]
    fn data_after_closing_quote_is_malformed() {
        assert!(matches!(
            strict(r#""ab"c,d"#),
            Err(CsvError::MalformedRow { offset: 3, .. })
        ));
        assert_eq!(lenient(r#""ab"c,d"#), vec![r#"ab"c"#, "d"]);
    }

    #[test]
    fn unterminated_quote_is_malformed() {
        assert!(matches!(
            strict(r#"a,"bc"#),
            Err(CsvError::MalformedRow { offset: 2, .. })
        ));
        assert_eq!(lenient(r#"a,"bc"#), vec!["a", "\"bc"]);
        assert_eq!(lenient(r#""x""y"#), vec![r#""x"y"#]);
    }

    #[test]
    fn offsets_count_characters_not_bytes() {
        assert!(matches!(
            strict(r#"é,ü"x"#),
            Err(CsvError::MalformedRow { offset: 3, .. })
        ));
    }
}
