// INSERT parser: pulls the value list out of an INSERT line and streams its rows
// into the open table sink.
// A value list normally fits on its INSERT line. A line ending right after a comma
// continues on the next input line, and the driver feeds that line back here.

use crate::cursor::Line;
use crate::error::{ConvertError, Location, Result};
use crate::parser::rows::RowAssembler;
use crate::parser::tokenizer::{LineEnd, ValueTokenizer};
use crate::sink::RowSink;
use regex::Regex;

const VALUES_MARKER: &str = "` VALUES ";

// What happened to the statement after feeding it one line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementEnd {
    // `);` seen; every row has been written.
    Finished,
    // Line ended after a delimiter; the next line belongs to this statement.
    Continues,
    // Line ended without `);`; the row in progress was dropped.
    Unterminated { dropped_fields: usize },
}

pub struct InsertParser {
    table_name_re: Regex,
    tokenizer: ValueTokenizer,
    assembler: RowAssembler,
    fields: Vec<String>,
    open_at: Option<Location>,
    statements_processed: u64,
}

impl InsertParser {
    pub fn new() -> Self {
        let table_name_re =
            Regex::new(r"^INSERT INTO[^`]*`([^`]*)`").expect("valid insert table regex");
        Self {
            table_name_re,
            tokenizer: ValueTokenizer::mysql(),
            assembler: RowAssembler::new(),
            fields: Vec::new(),
            open_at: None,
            statements_processed: 0,
        }
    }

    // Table named by an INSERT line, if it is backtick-quoted.
    pub fn table_name<'a>(&self, line: &'a str) -> Option<&'a str> {
        self.table_name_re
            .captures(line)
            .and_then(|cap| cap.get(1))
            .map(|m| m.as_str())
    }

    // Start a new statement from an INSERT line. The value list is checked before
    // anything is tokenized, so a malformed statement writes no rows.
    pub fn begin<S: RowSink + ?Sized>(
        &mut self,
        line: &Line,
        sink: &mut S,
    ) -> Result<StatementEnd> {
        let values = insert_values(&line.text);
        values_sanity_check(values, &line.at)?;

        self.tokenizer.reset();
        self.assembler.discard();
        self.open_at = Some(line.at.clone());
        self.feed(values, &line.at, sink)
    }

    // Feed the next physical line of a wrapped value list.
    pub fn resume<S: RowSink + ?Sized>(
        &mut self,
        line: &Line,
        sink: &mut S,
    ) -> Result<StatementEnd> {
        self.feed(&line.text, &line.at, sink)
    }

    // Where the statement awaiting its next line started.
    pub fn open_statement(&self) -> Option<&Location> {
        if self.tokenizer.is_pending() {
            self.open_at.as_ref()
        } else {
            None
        }
    }

    pub fn statements_processed(&self) -> u64 {
        self.statements_processed
    }

    pub fn rows_emitted(&self) -> u64 {
        self.assembler.rows_emitted()
    }

    fn feed<S: RowSink + ?Sized>(
        &mut self,
        text: &str,
        at: &Location,
        sink: &mut S,
    ) -> Result<StatementEnd> {
        self.fields.clear();
        let fields = &mut self.fields;
        let end = self
            .tokenizer
            .tokenize_line(text, |f| fields.push(f))
            .map_err(|source| ConvertError::Tokenize {
                at: at.clone(),
                source,
            })?;

        for field in self.fields.drain(..) {
            self.assembler.push_field(field, sink)?;
        }

        if end == LineEnd::Continues {
            return Ok(StatementEnd::Continues);
        }

        self.statements_processed += 1;
        self.open_at = None;
        if self.assembler.finish_statement(sink)? {
            Ok(StatementEnd::Finished)
        } else {
            Ok(StatementEnd::Unterminated {
                dropped_fields: self.assembler.discard(),
            })
        }
    }
}

impl Default for InsertParser {
    fn default() -> Self {
        Self::new()
    }
}

// Everything after the first "` VALUES ", or "" when the marker is missing.
pub fn insert_values(line: &str) -> &str {
    line.split_once(VALUES_MARKER)
        .map(|(_, values)| values)
        .unwrap_or("")
}

pub fn values_sanity_check(values: &str, at: &Location) -> Result<()> {
    if values.starts_with('(') {
        Ok(())
    } else {
        Err(ConvertError::MalformedValues { at: at.clone() })
    }
}
