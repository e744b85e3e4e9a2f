use std::{io, mem, str};

use crate::error::{CsvError, Result};

const BOM: char = '\u{FEFF}';

/// Text encoding of a CSV byte stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Encoding {
    #[default]
    Utf8,
    Utf16Le,
    Utf16Be,
    /// ISO-8859-1: every byte is the code point of the same value.
    Latin1,
}

impl Encoding {
    /// Resolves an encoding from a label such as `"utf-8"`, `"UTF16LE"` or `"iso-8859-1"`.
    ///
    /// ```
    /// use stream_csv_rs::item::csv::encoding::Encoding;
    ///
    /// assert_eq!(Encoding::from_label("UTF-8").unwrap(), Encoding::Utf8);
    /// assert_eq!(Encoding::from_label("latin1").unwrap(), Encoding::Latin1);
    /// assert!(Encoding::from_label("ebcdic").is_err());
    /// ```
    pub fn from_label(label: &str) -> Result<Self> {
        let normalized: String = label
            .chars()
            .filter(|c| *c != '-' && *c != '_')
            .flat_map(char::to_lowercase)
            .collect();

        match normalized.trim() {
            "utf8" => Ok(Encoding::Utf8),
            "utf16" | "utf16le" => Ok(Encoding::Utf16Le),
            "utf16be" => Ok(Encoding::Utf16Be),
            "latin1" | "iso88591" => Ok(Encoding::Latin1),
            _ => Err(CsvError::InvalidArgument(format!(
                "unsupported encoding: {label}"
            ))),
        }
    }

    pub fn decoder(&self) -> Decoder {
        Decoder::new(*self)
    }

    /// Appends the encoded form of `text` to `out`.
    pub fn encode(&self, text: &str, out: &mut Vec<u8>) -> io::Result<()> {
        match self {
            Encoding::Utf8 => out.extend_from_slice(text.as_bytes()),
            Encoding::Utf16Le => text
                .encode_utf16()
                .for_each(|unit| out.extend_from_slice(&unit.to_le_bytes())),
            Encoding::Utf16Be => text
                .encode_utf16()
                .for_each(|unit| out.extend_from_slice(&unit.to_be_bytes())),
            Encoding::Latin1 => {
                for c in text.chars() {
                    let byte = u8::try_from(u32::from(c)).map_err(|_| {
                        io::Error::new(
                            io::ErrorKind::InvalidData,
                            format!("{c:?} cannot be encoded as latin-1"),
                        )
                    })?;
                    out.push(byte);
                }
            }
        }
        Ok(())
    }
}

/// Incremental decoder turning byte chunks into characters.
///
/// Multi-byte sequences split across chunks are held back until the next chunk
/// completes them. A byte-order mark at the very start of a Unicode stream is
/// dropped.
#[derive(Debug)]
pub struct Decoder {
    encoding: Encoding,
    pending: Vec<u8>,
    started: bool,
}

impl Decoder {
    fn new(encoding: Encoding) -> Self {
        Self {
            encoding,
            pending: Vec::with_capacity(4),
            started: false,
        }
    }

    /// Decodes `bytes` into `out`. Pass `last = true` once the source is exhausted
    /// so that an incomplete trailing sequence is reported.
    pub fn decode(&mut self, bytes: &[u8], out: &mut Vec<char>, last: bool) -> io::Result<()> {
        let before = out.len();

        match self.encoding {
            Encoding::Utf8 => self.decode_utf8(bytes, out, last)?,
            Encoding::Utf16Le => self.decode_utf16(bytes, out, last, u16::from_le_bytes)?,
            Encoding::Utf16Be => self.decode_utf16(bytes, out, last, u16::from_be_bytes)?,
            Encoding::Latin1 => out.extend(bytes.iter().map(|b| char::from(*b))),
        }

        if !self.started && out.len() > before {
            self.started = true;
            if self.encoding != Encoding::Latin1 && out[before] == BOM {
                out.remove(before);
            }
        }
        Ok(())
    }

    fn decode_utf8(&mut self, bytes: &[u8], out: &mut Vec<char>, last: bool) -> io::Result<()> {
        let joined;
        let data = if self.pending.is_empty() {
            bytes
        } else {
            let mut pending = mem::take(&mut self.pending);
            pending.extend_from_slice(bytes);
            joined = pending;
            &joined[..]
        };

        match str::from_utf8(data) {
            Ok(text) => out.extend(text.chars()),
            Err(error) => {
                let valid = error.valid_up_to();
                if let Ok(text) = str::from_utf8(&data[..valid]) {
                    out.extend(text.chars());
                }
                match error.error_len() {
                    None if !last => self.pending.extend_from_slice(&data[valid..]),
                    _ => {
                        return Err(invalid_data(format!(
                            "invalid utf-8 sequence after {} decoded characters",
                            out.len()
                        )));
                    }
                }
            }
        }
        Ok(())
    }

    fn decode_utf16(
        &mut self,
        bytes: &[u8],
        out: &mut Vec<char>,
        last: bool,
        unit: fn([u8; 2]) -> u16,
    ) -> io::Result<()> {
        let mut data = mem::take(&mut self.pending);
        data.extend_from_slice(bytes);

        let mut units: Vec<u16> = data
            .chunks_exact(2)
            .map(|pair| unit([pair[0], pair[1]]))
            .collect();
        let odd = data.len() % 2 == 1;

        if !last {
            if odd {
                self.pending.push(data[data.len() - 1]);
            }
            // A high surrogate waits for its partner in the next chunk.
            if let Some(&tail) = units.last() {
                if (0xD800..=0xDBFF).contains(&tail) {
                    units.pop();
                    let mut held = match self.encoding {
                        Encoding::Utf16Be => tail.to_be_bytes().to_vec(),
                        _ => tail.to_le_bytes().to_vec(),
                    };
                    held.append(&mut self.pending);
                    self.pending = held;
                }
            }
        } else if odd {
            return Err(invalid_data("truncated utf-16 code unit".to_string()));
        }

        for decoded in char::decode_utf16(units) {
            let c = decoded.map_err(|error| {
                invalid_data(format!(
                    "unpaired utf-16 surrogate {:#06x}",
                    error.unpaired_surrogate()
                ))
            })?;
            out.push(c);
        }
        Ok(())
    }
}

fn invalid_data(message: String) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, message)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode_in_chunks(encoding: Encoding, bytes: &[u8], chunk: usize) -> io::Result<String> {
        let mut decoder = encoding.decoder();
        let mut out = Vec::new();
        let mut chunks = bytes.chunks(chunk).peekable();
        while let Some(part) = chunks.next() {
            decoder.decode(part, &mut out, chunks.peek().is_none())?;
        }
        Ok(out.into_iter().collect())
    }

    #[test]
    fn utf8_sequences_survive_chunk_boundaries() {
        let text = "é,ü,€,𝄞\n";
        for chunk in 1..6 {
            assert_eq!(
                decode_in_chunks(Encoding::Utf8, text.as_bytes(), chunk).unwrap(),
                text
            );
        }
    }

    #[test]
    fn utf16_surrogates_survive_chunk_boundaries() {
        let text = "a,𝄞,b";
        let mut le = Vec::new();
        Encoding::Utf16Le.encode(text, &mut le).unwrap();
        let mut be = Vec::new();
        Encoding::Utf16Be.encode(text, &mut be).unwrap();

        for chunk in 1..5 {
            assert_eq!(decode_in_chunks(Encoding::Utf16Le, &le, chunk).unwrap(), text);
            assert_eq!(decode_in_chunks(Encoding::Utf16Be, &be, chunk).unwrap(), text);
        }
    }

    #[test]
    fn leading_bom_is_dropped() {
        let bytes = b"\xEF\xBB\xBFa,b";
        assert_eq!(decode_in_chunks(Encoding::Utf8, bytes, 2).unwrap(), "a,b");
    }

    #[test]
    fn truncated_utf8_at_end_is_an_error() {
        let error = decode_in_chunks(Encoding::Utf8, b"a,\xE2\x82", 8).unwrap_err();
        assert_eq!(error.kind(), io::ErrorKind::InvalidData);
    }

    #[test]
    fn latin1_round_trips_high_bytes() {
        let mut out = Vec::new();
        Encoding::Latin1.encode("café", &mut out).unwrap();
        assert_eq!(out, b"caf\xE9");
        assert_eq!(decode_in_chunks(Encoding::Latin1, &out, 3).unwrap(), "café");

        let error = Encoding::Latin1.encode("€", &mut out).unwrap_err();
        assert_eq!(error.kind(), io::ErrorKind::InvalidData);
    }

    #[test]
    fn labels_are_normalized() {
        assert_eq!(Encoding::from_label("utf_16_be").unwrap(), Encoding::Utf16Be);
        assert_eq!(Encoding::from_label("ISO-8859-1").unwrap(), Encoding::Latin1);
        assert!(matches!(
            Encoding::from_label("shift-jis"),
            Err(CsvError::InvalidArgument(_))
        ));
    }
}
