use crate::error::DecodeError;
use csv::{ReaderBuilder, StringRecord, Terminator, WriterBuilder};
use serde::de::DeserializeOwned;
use std::fs::File;
use std::io::Read;
use std::marker::PhantomData;
use std::path::Path;

/// Lazily decodes the data lines of a delimited file into `T`.
///
/// The first line is always discarded as the header. Fields are bound to `T` by
/// position against the declared column names, so a header with different
/// titles (or a different language) still imports. Each call to `next` reads one
/// line: a malformed line yields an `Err` for that line only and iteration goes on
/// with the following one. The sequence cannot be restarted.
pub struct CsvRecordReader<T, R = File> {
    inner: csv::Reader<R>,
    columns: StringRecord,
    record: StringRecord,
    exhausted: bool,
    _marker: PhantomData<T>,
}

impl<T: DeserializeOwned> CsvRecordReader<T, File> {
    pub fn open(path: impl AsRef<Path>, columns: &[&str]) -> Result<Self, DecodeError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| DecodeError::Open {
            path: path.to_path_buf(),
            source: e.into(),
        })?;
        Ok(Self::from_reader(file, columns))
    }
}

impl<T: DeserializeOwned, R: Read> CsvRecordReader<T, R> {
    pub fn from_reader(rdr: R, columns: &[&str]) -> Self {
        Self {
            inner: builder().from_reader(rdr),
            columns: StringRecord::from(columns.to_vec()),
            record: StringRecord::new(),
            exhausted: false,
            _marker: PhantomData,
        }
    }

    fn decode_current(&self) -> Result<T, DecodeError> {
        let line = self.record.position().map_or(0, |p| p.line());
        let raw = raw_line(&self.record);

        if self.record.len() != self.columns.len() {
            return Err(DecodeError::ColumnCount {
                line,
                expected: self.columns.len(),
                found: self.record.len(),
                raw,
            });
        }

        self.record
            .deserialize(Some(&self.columns))
            .map_err(|e| DecodeError::Field {
                line,
                message: e.to_string(),
                raw,
            })
    }
}

/// Writes the record back as one delimited line, quoting fields where needed.
fn raw_line(record: &StringRecord) -> String {
    let mut wtr = WriterBuilder::new()
        .flexible(true)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(Vec::new());
    let bytes = wtr
        .write_record(record)
        .ok()
        .and_then(|()| wtr.into_inner().ok())
        .unwrap_or_default();
    String::from_utf8_lossy(&bytes).trim_end_matches('\n').to_string()
}

fn builder() -> ReaderBuilder {
    let mut builder = ReaderBuilder::new();
    // Column counts are checked per line against the declared columns, not
    // against the header.
    builder.has_headers(true).flexible(true);
    builder
}

impl<T: DeserializeOwned, R: Read> Iterator for CsvRecordReader<T, R> {
    type Item = Result<T, DecodeError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.exhausted {
            return None;
        }
        match self.inner.read_record(&mut self.record) {
            Ok(true) => Some(self.decode_current()),
            Ok(false) => {
                self.exhausted = true;
                None
            }
            Err(e) => {
                // A broken stream cannot be resumed; anything else (bad UTF-8 on
                // one line) only spoils that line.
                if e.is_io_error() {
                    self.exhausted = true;
                }
                Some(Err(DecodeError::Read(e)))
            }
        }
    }
}
