use std::io::{self, Read};

use super::encoding::{Decoder, Encoding};

/// Splits a byte stream into logical CSV lines.
///
/// Bytes are pulled through a fixed-size buffer and decoded into a reusable
/// character buffer. A line is only returned once its terminator (or the end of
/// input) has been seen, so lines never break at buffer boundaries.
///
/// Quote tracking follows the tokenizer rules: an unescaped `"` toggles the
/// quoted span, `""` inside a span is kept as-is, and line terminators inside a
/// span are part of the line.
pub struct LineSplitter<R> {
    source: R,
    decoder: Decoder,
    bytes: Vec<u8>,
    chars: Vec<char>,
    pos: usize,
    eof: bool,
    line: String,
}

impl<R: Read> LineSplitter<R> {
    /// Creates a splitter reading `buffer_size` bytes at a time.
    pub fn new(source: R, encoding: Encoding, buffer_size: usize) -> Self {
        let buffer_size = buffer_size.max(1);
        Self {
            source,
            decoder: encoding.decoder(),
            bytes: vec![0; buffer_size],
            chars: Vec::with_capacity(buffer_size),
            pos: 0,
            eof: false,
            line: String::new(),
        }
    }

    /// Returns the next logical line without its terminator, or `None` at end of input.
    ///
    /// Terminators are `\r\n`, a lone `\n` or a lone `\r`.
    pub fn next_line(&mut self) -> io::Result<Option<String>> {
        self.line.clear();
        let mut in_quotes = false;

        while let Some(c) = self.peek()? {
            self.pos += 1;

            match c {
                '"' if in_quotes => {
                    if self.peek()? == Some('"') {
                        self.pos += 1;
                        self.line.push_str("\"\"");
                    } else {
                        in_quotes = false;
                        self.line.push('"');
                    }
                }
                '"' => {
                    in_quotes = true;
                    self.line.push('"');
                }
                '\r' if !in_quotes => {
                    if self.peek()? == Some('\n') {
                        self.pos += 1;
                    }
                    return Ok(Some(std::mem::take(&mut self.line)));
                }
                '\n' if !in_quotes => return Ok(Some(std::mem::take(&mut self.line))),
                _ => self.line.push(c),
            }
        }

        if self.line.is_empty() {
            Ok(None)
        } else {
            Ok(Some(std::mem::take(&mut self.line)))
        }
    }

    fn peek(&mut self) -> io::Result<Option<char>> {
        if self.fill()? {
            Ok(Some(self.chars[self.pos]))
        } else {
            Ok(None)
        }
    }

    /// Refills the character buffer once the cursor reaches its end.
    ///
    /// Returns `false` when the source is exhausted.
    fn fill(&mut self) -> io::Result<bool> {
        while self.pos >= self.chars.len() {
            if self.eof {
                return Ok(false);
            }

            self.chars.clear();
            self.pos = 0;

            let read = self.source.read(&mut self.bytes)?;
            if read == 0 {
                self.eof = true;
                self.decoder.decode(&[], &mut self.chars, true)?;
            } else {
                self.decoder
                    .decode(&self.bytes[..read], &mut self.chars, false)?;
            }
        }
        Ok(true)
    }
}

impl<R: Read> Iterator for LineSplitter<R> {
    type Item = io::Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_line().transpose()
    }
}
