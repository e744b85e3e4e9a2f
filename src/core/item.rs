use crate::error::CsvError;

/// Result of a single [`ItemReader::read`] call.
///
/// - `Ok(Some(item))`: an item was read
/// - `Ok(None)`: the source is exhausted
/// - `Err(error)`: the item could not be produced
pub type ItemReaderResult<R> = Result<Option<R>, CsvError>;

/// Result of an [`ItemWriter`] operation.
pub type ItemWriterResult = Result<(), CsvError>;

/// Pulls items one at a time from a source.
///
/// Readers take `&self` and keep their cursor behind interior mutability, so a
/// reader can be shared by reference with whatever drives it.
pub trait ItemReader<R> {
    fn read(&self) -> ItemReaderResult<R>;
}

/// Pushes items to a sink.
pub trait ItemWriter<W> {
    fn write(&self, items: &[W]) -> ItemWriterResult;

    fn flush(&self) -> ItemWriterResult {
        Ok(())
    }

    fn open(&self) -> ItemWriterResult {
        Ok(())
    }

    fn close(&self) -> ItemWriterResult {
        Ok(())
    }
}

/// Drains a reader into a writer, one item at a time, then flushes the writer.
///
/// Returns the number of items transferred. The first error stops the transfer.
pub fn transfer<T>(
    reader: &dyn ItemReader<T>,
    writer: &dyn ItemWriter<T>,
) -> Result<usize, CsvError> {
    writer.open()?;

    let mut count = 0;
    while let Some(item) = reader.read()? {
        writer.write(std::slice::from_ref(&item))?;
        count += 1;
    }

    writer.flush()?;
    Ok(count)
}
