mod common;

use std::{
    error::Error,
    fs,
    io::{self, ErrorKind},
};

use common::{FailingSource, MockFile, random_name};

use stream_csv_rs::{
    CsvError,
    core::item::ItemWriter,
    item::csv::{
        csv_reader::CsvItemReaderBuilder, csv_writer::CsvItemWriterBuilder, encoding::Encoding,
        settings::LineTerminator,
    },
};

fn row(cells: &[&str]) -> Vec<String> {
    cells.iter().map(|cell| cell.to_string()).collect()
}

#[test]
fn missing_input_file_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(random_name());

    let result = CsvItemReaderBuilder::new().from_path(&path);
    assert!(matches!(result, Err(CsvError::NotFound(p)) if p == path));
}

#[test]
fn directories_and_empty_paths_are_invalid() {
    let dir = tempfile::tempdir().unwrap();

    assert!(matches!(
        CsvItemReaderBuilder::new().from_path(dir.path()),
        Err(CsvError::InvalidArgument(_))
    ));
    assert!(matches!(
        CsvItemReaderBuilder::new().from_path(""),
        Err(CsvError::InvalidArgument(_))
    ));
    assert!(matches!(
        CsvItemWriterBuilder::new().from_path(dir.path()),
        Err(CsvError::InvalidArgument(_))
    ));
}

#[test]
fn unknown_encoding_label_is_invalid() {
    assert!(matches!(
        Encoding::from_label("klingon"),
        Err(CsvError::InvalidArgument(_))
    ));
}

#[test]
fn existing_output_requires_overwrite_or_append() -> Result<(), Box<dyn Error>> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("out.csv");
    fs::write(&path, "old\n")?;

    let result = CsvItemWriterBuilder::new().from_path(&path);
    assert!(matches!(result, Err(CsvError::AlreadyExists(_))));
    assert_eq!(fs::read_to_string(&path)?, "old\n");
    Ok(())
}

#[test]
fn overwrite_and_append_together_conflict() -> Result<(), Box<dyn Error>> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("out.csv");
    fs::write(&path, "old\n")?;

    let result = CsvItemWriterBuilder::new()
        .overwrite_existing(true)
        .append_existing(true)
        .from_path(&path);
    assert!(matches!(result, Err(CsvError::ConflictingOptions)));

    let result = CsvItemWriterBuilder::new()
        .overwrite_existing(true)
        .append_existing(true)
        .from_writer(Vec::new());
    assert!(matches!(result, Err(CsvError::ConflictingOptions)));
    Ok(())
}

#[test]
fn overwrite_truncates_existing_file() -> Result<(), Box<dyn Error>> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("out.csv");
    fs::write(&path, "a much longer previous content\n")?;

    let writer = CsvItemWriterBuilder::new()
        .overwrite_existing(true)
        .terminator(LineTerminator::Lf)
        .from_path(&path)?;
    writer.write_row(&row(&["new"]))?;
    writer.close()?;

    assert_eq!(fs::read_to_string(&path)?, "new\n");
    Ok(())
}

#[test]
fn append_extends_existing_file() -> Result<(), Box<dyn Error>> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("out.csv");
    fs::write(&path, "old\n")?;

    let writer = CsvItemWriterBuilder::new()
        .append_existing(true)
        .terminator(LineTerminator::Lf)
        .from_path(&path)?;
    writer.write_row(&row(&["new", "x,y"]))?;
    drop(writer);

    assert_eq!(fs::read_to_string(&path)?, "old\nnew,\"x,y\"\n");
    Ok(())
}

#[test]
fn missing_output_file_is_created() -> Result<(), Box<dyn Error>> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join(format!("{}.csv", random_name()));

    let writer = CsvItemWriterBuilder::new()
        .terminator(LineTerminator::CrLf)
        .from_path(&path)?;
    writer.write_row(&row(&["a", "b"]))?;
    writer.close()?;
    writer.close()?;

    assert_eq!(fs::read_to_string(&path)?, "a,b\r\n");
    Ok(())
}

#[test]
fn write_failures_propagate_unchanged() {
    let mut file = MockFile::default();
    file.expect_write().times(1).returning(|_buf| {
        let err = io::Error::from(ErrorKind::PermissionDenied);
        Result::Err(err)
    });
    file.expect_flush().returning(|| Ok(()));

    let writer = CsvItemWriterBuilder::new()
        .buffer_size(0)
        .from_writer(file)
        .unwrap();

    // The line is buffered; the failure shows up on flush.
    writer.write_row(&row(&["a"])).unwrap();
    match ItemWriter::flush(&writer) {
        Err(CsvError::Io(error)) => assert_eq!(error.kind(), ErrorKind::PermissionDenied),
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn failed_close_does_not_write_again() {
    let mut file = MockFile::default();
    file.expect_write().times(1).returning(|_buf| {
        let err = io::Error::from(ErrorKind::BrokenPipe);
        Result::Err(err)
    });
    file.expect_flush().never();

    let writer = CsvItemWriterBuilder::new().from_writer(file).unwrap();
    writer.write_row(&row(&["a", "b"])).unwrap();

    match writer.close() {
        Err(CsvError::Io(error)) => assert_eq!(error.kind(), ErrorKind::BrokenPipe),
        other => panic!("unexpected result: {other:?}"),
    }
    assert!(writer.is_closed());
    writer.close().unwrap();
}

#[test]
fn failed_into_inner_does_not_write_again() {
    let mut file = MockFile::default();
    file.expect_write().times(1).returning(|_buf| {
        let err = io::Error::from(ErrorKind::BrokenPipe);
        Result::Err(err)
    });

    let writer = CsvItemWriterBuilder::new().from_writer(file).unwrap();
    writer.write_row(&row(&["a"])).unwrap();

    assert!(matches!(writer.into_inner(), Err(CsvError::Io(_))));
}

#[test]
fn close_flushes_the_sink_once() {
    let mut file = MockFile::default();
    file.expect_write().times(1).returning(|buf| Ok(buf.len()));
    file.expect_flush().times(1).returning(|| Ok(()));

    let writer = CsvItemWriterBuilder::new().from_writer(file).unwrap();
    writer.write_row(&row(&["a", "b"])).unwrap();

    writer.close().unwrap();
    writer.close().unwrap();
    assert_eq!(writer.rows_written(), 1);
}

#[test]
fn read_failures_propagate_unchanged() {
    let reader = CsvItemReaderBuilder::new()
        .from_reader(FailingSource::new("a,b\nc", ErrorKind::ConnectionReset))
        .unwrap();

    assert_eq!(reader.read_row().unwrap(), Some(row(&["a", "b"])));
    match reader.read_row() {
        Err(CsvError::Io(error)) => assert_eq!(error.kind(), ErrorKind::ConnectionReset),
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn invalid_utf8_is_reported_as_io_error() {
    let reader = CsvItemReaderBuilder::new()
        .from_reader(&b"a,\xFF\xFE\n"[..])
        .unwrap();

    match reader.read_row() {
        Err(CsvError::Io(error)) => assert_eq!(error.kind(), ErrorKind::InvalidData),
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn latin1_cannot_encode_euro_sign() {
    let writer = CsvItemWriterBuilder::new()
        .encoding(Encoding::Latin1)
        .from_writer(Vec::new())
        .unwrap();

    assert!(matches!(
        writer.write_row(&row(&["5 €"])),
        Err(CsvError::Io(_))
    ));
    assert_eq!(writer.rows_written(), 0);
}

#[test]
fn malformed_rows_carry_their_position() {
    let reader = CsvItemReaderBuilder::new()
        .from_reader("ok\nstill,ok\nbad,\"quote\n".as_bytes())
        .unwrap();

    let results: Vec<_> = reader.rows().collect();
    assert_eq!(results.len(), 3);
    match &results[2] {
        Err(CsvError::MalformedRow { line, offset, raw }) => {
            assert_eq!(*line, 3);
            assert_eq!(*offset, 4);
            assert_eq!(raw, "bad,\"quote\n");
        }
        other => panic!("unexpected result: {other:?}"),
    }
}
