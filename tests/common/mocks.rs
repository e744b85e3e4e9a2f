//! Mock version of std::fs::File;
use mockall::mock;

use std::io::{self, Read, Write};

mock! {
    pub File {}
    impl Write for File {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize>;
        fn flush(&mut self) -> io::Result<()>;
    }
}

/// A source that yields `data` once and then fails with `kind`.
pub struct FailingSource {
    data: Option<Vec<u8>>,
    kind: io::ErrorKind,
}

impl FailingSource {
    pub fn new(data: &str, kind: io::ErrorKind) -> Self {
        Self {
            data: Some(data.as_bytes().to_vec()),
            kind,
        }
    }
}

impl Read for FailingSource {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self.data.take() {
            Some(data) => {
                assert!(data.len() <= buf.len(), "test data must fit in one read");
                buf[..data.len()].copy_from_slice(&data);
                Ok(data.len())
            }
            None => Err(io::Error::from(self.kind)),
        }
    }
}
