// Row assembler: groups tokenizer fields into rows.
//
// Commas between tuples and commas between values look the same once quoting is
// resolved, so tuple boundaries are inferred from the fields themselves: a field
// starting with `(` right after a field ending with `)` starts a new row, and a
// field ending with `);` closes the statement. This misfires when quoted text
// itself sits at a tuple edge and starts with `(` or ends with `)`.

use crate::error::Result;
use crate::parser::NULL_SENTINEL;
use crate::sink::RowSink;

// Decides where tuples start and end. Each method returns the field with the
// boundary marker removed, or None when the field does not carry that marker.
pub trait RowBoundary {
    fn strip_tuple_open<'a>(&self, field: &'a str) -> Option<&'a str>;
    fn strip_tuple_close<'a>(&self, field: &'a str) -> Option<&'a str>;
    fn strip_statement_end<'a>(&self, field: &'a str) -> Option<&'a str>;
}

// mysqldump extended inserts: `(a,b),(c,d);`
#[derive(Debug, Clone, Copy, Default)]
pub struct ParenAdjacency;

impl RowBoundary for ParenAdjacency {
    fn strip_tuple_open<'a>(&self, field: &'a str) -> Option<&'a str> {
        field.strip_prefix('(')
    }

    fn strip_tuple_close<'a>(&self, field: &'a str) -> Option<&'a str> {
        field.strip_suffix(')')
    }

    fn strip_statement_end<'a>(&self, field: &'a str) -> Option<&'a str> {
        field.strip_suffix(");")
    }
}

pub struct RowAssembler<B: RowBoundary = ParenAdjacency> {
    boundary: B,
    row: Vec<String>,
    rows_emitted: u64,
}

impl RowAssembler {
    pub fn new() -> Self {
        Self::with_boundary(ParenAdjacency)
    }
}

impl Default for RowAssembler {
    fn default() -> Self {
        Self::new()
    }
}

impl<B: RowBoundary> RowAssembler<B> {
    pub fn with_boundary(boundary: B) -> Self {
        Self {
            boundary,
            row: Vec::new(),
            rows_emitted: 0,
        }
    }

    // Add one decoded field, emitting the previous row first if this field opens a new tuple.
    pub fn push_field<S: RowSink + ?Sized>(
        &mut self,
        mut field: String,
        sink: &mut S,
    ) -> Result<()> {
        if field.is_empty() || field == "NULL" {
            self.row.push(NULL_SENTINEL.to_string());
            return Ok(());
        }

        if self.boundary.strip_tuple_open(&field).is_some() {
            let closed_len = self
                .row
                .last()
                .and_then(|last| self.boundary.strip_tuple_close(last))
                .map(str::len);
            if let Some(len) = closed_len {
                if let Some(last) = self.row.last_mut() {
                    last.truncate(len);
                }
                self.flush(sink)?;
            }
            if self.row.is_empty() {
                if let Some(rest) = self.boundary.strip_tuple_open(&field) {
                    let marker = field.len() - rest.len();
                    field.drain(..marker);
                }
            }
        }

        self.row.push(field);
        Ok(())
    }

    // Called once the fields of a complete line are in. Emits the final row and
    // returns true when the last field closes the statement.
    pub fn finish_statement<S: RowSink + ?Sized>(&mut self, sink: &mut S) -> Result<bool> {
        let end_len = self
            .row
            .last()
            .and_then(|last| self.boundary.strip_statement_end(last))
            .map(str::len);
        match end_len {
            Some(len) => {
                if let Some(last) = self.row.last_mut() {
                    last.truncate(len);
                }
                self.flush(sink)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    // Drop the row in progress, returning how many fields it held.
    pub fn discard(&mut self) -> usize {
        let n = self.row.len();
        self.row.clear();
        n
    }

    pub fn rows_emitted(&self) -> u64 {
        self.rows_emitted
    }

    fn flush<S: RowSink + ?Sized>(&mut self, sink: &mut S) -> Result<()> {
        if self.row.is_empty() {
            return Ok(());
        }
        sink.write_row(&self.row)?;
        self.row.clear();
        self.rows_emitted += 1;
        Ok(())
    }
}
