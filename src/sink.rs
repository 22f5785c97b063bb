// Output sinks. Rows are written with minimal quoting and CRLF record terminators;
// record lengths are not checked, so a row whose field count differs from the
// header is written as-is.

use crate::error::{ConvertError, Result};
use csv::{QuoteStyle, Terminator, WriterBuilder};
use std::fs::File;
use std::io::Write;
use std::path::Path;

const WRITE_BUFFER: usize = 1024 * 1024;

// Destination for completed rows of the table currently being converted.
pub trait RowSink {
    fn write_row(&mut self, row: &[String]) -> Result<()>;
}

pub struct CsvTableSink<W: Write> {
    writer: csv::Writer<W>,
    rows: u64,
}

impl CsvTableSink<File> {
    // Create (or truncate) the output file.
    pub fn create(path: &Path) -> Result<Self> {
        let file = File::create(path)?;
        Ok(Self::from_writer(file))
    }
}

impl<W: Write> CsvTableSink<W> {
    pub fn from_writer(inner: W) -> Self {
        let writer = WriterBuilder::new()
            .flexible(true)
            .quote_style(QuoteStyle::Necessary)
            .terminator(Terminator::CRLF)
            .buffer_capacity(WRITE_BUFFER)
            .from_writer(inner);
        Self { writer, rows: 0 }
    }

    // The header row does not count towards rows_written. A table without columns
    // gets an empty line; csv would write `""` for an empty record.
    pub fn write_header(&mut self, header: &[String]) -> Result<()> {
        if header.is_empty() {
            self.writer.flush()?;
            self.writer.get_mut().write_all(b"\r\n")?;
            return Ok(());
        }
        self.writer.write_record(header)?;
        Ok(())
    }

    pub fn rows_written(&self) -> u64 {
        self.rows
    }

    // Flush buffered rows and hand back the underlying writer.
    pub fn into_inner(self) -> Result<W> {
        self.writer
            .into_inner()
            .map_err(|e| ConvertError::Io(e.into_error()))
    }
}

impl<W: Write> RowSink for CsvTableSink<W> {
    fn write_row(&mut self, row: &[String]) -> Result<()> {
        self.writer.write_record(row)?;
        self.rows += 1;
        Ok(())
    }
}

#[cfg(test)]
impl RowSink for Vec<Vec<String>> {
    fn write_row(&mut self, row: &[String]) -> Result<()> {
        self.push(row.to_vec());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn quotes_only_when_needed() {
        let mut sink = CsvTableSink::from_writer(Vec::new());
        sink.write_header(&strings(&["id:INTEGER", "note:STRING"]))
            .unwrap();
        sink.write_row(&strings(&["1", "plain"])).unwrap();
        sink.write_row(&strings(&["2", "a,b"])).unwrap();
        sink.write_row(&strings(&["3", "say \"hi\""])).unwrap();
        sink.write_row(&strings(&["4", "\0"])).unwrap();
        assert_eq!(sink.rows_written(), 4);

        let out = String::from_utf8(sink.into_inner().unwrap()).unwrap();
        assert_eq!(
            out,
            "id:INTEGER,note:STRING\r\n\
             1,plain\r\n\
             2,\"a,b\"\r\n\
             3,\"say \"\"hi\"\"\"\r\n\
             4,\0\r\n"
        );
    }

    #[test]
    fn ragged_rows_are_written_unchanged() {
        let mut sink = CsvTableSink::from_writer(Vec::new());
        sink.write_header(&strings(&["a:STRING", "b:STRING"])).unwrap();
        sink.write_row(&strings(&["1", "2", "3"])).unwrap();
        sink.write_row(&strings(&["only"])).unwrap();
        let out = String::from_utf8(sink.into_inner().unwrap()).unwrap();
        assert_eq!(out, "a:STRING,b:STRING\r\n1,2,3\r\nonly\r\n");
    }

    #[test]
    fn table_without_columns_gets_an_empty_header_line() {
        let mut sink = CsvTableSink::from_writer(Vec::new());
        sink.write_header(&[]).unwrap();
        sink.write_row(&strings(&["1"])).unwrap();
        let out = String::from_utf8(sink.into_inner().unwrap()).unwrap();
        assert_eq!(out, "\r\n1\r\n");
    }
}
