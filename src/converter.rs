// Conversion pipeline: one pass over the dump, one CSV file per CREATE TABLE block.
// The driver owns the single open table context; rows from INSERT lines always go
// to the table defined most recently.

use crate::cursor::{Line, LineCursor};
use crate::error::{ConvertError, Result};
use crate::parser::insert::{InsertParser, StatementEnd};
use crate::parser::schema::SchemaParser;
use crate::parser::{is_create_table, is_insert, TableSchema};
use crate::sink::CsvTableSink;
use std::collections::HashSet;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

pub const OUTPUT_EXTENSION: &str = "csv";

#[derive(Debug, Clone)]
pub struct ConvertOptions {
    pub output_dir: PathBuf,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
        }
    }
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct TableSummary {
    pub table: String,
    pub path: String,
    pub columns: usize,
    pub rows: u64,
}

#[derive(Debug, Default, serde::Serialize)]
pub struct ConversionSummary {
    pub tables: Vec<TableSummary>,
    pub statements: u64,
    pub rows: u64,
    pub dropped_rows: u64,
    pub lines_read: u64,
    pub elapsed_ms: u128,
    pub interrupted: bool,
}

// The table currently receiving rows, with its open output file.
struct TableContext {
    schema: TableSchema,
    path: PathBuf,
    sink: CsvTableSink<File>,
}

impl TableContext {
    fn open(schema: TableSchema, output_dir: &Path) -> Result<Self> {
        let path = output_dir.join(format!("{}.{}", schema.name, OUTPUT_EXTENSION));
        let mut sink = CsvTableSink::create(&path)?;
        sink.write_header(&schema.header())?;
        debug!(
            "Convert: opened {} for table {} ({} columns)",
            path.display(),
            schema.name,
            schema.columns.len()
        );
        Ok(Self { schema, path, sink })
    }

    // Flush and close the output file.
    fn close(self) -> Result<TableSummary> {
        let rows = self.sink.rows_written();
        drop(self.sink.into_inner()?);
        debug!(
            "Convert: closed {} after {} rows",
            self.path.display(),
            rows
        );
        Ok(TableSummary {
            table: self.schema.name,
            path: self.path.to_string_lossy().to_string(),
            columns: self.schema.columns.len(),
            rows,
        })
    }
}

pub struct Converter {
    options: ConvertOptions,
    schema_parser: SchemaParser,
    insert_parser: InsertParser,
    stop: Arc<AtomicBool>,
}

impl Converter {
    pub fn new(options: ConvertOptions) -> Self {
        Self {
            options,
            schema_parser: SchemaParser::new(),
            insert_parser: InsertParser::new(),
            stop: Arc::new(AtomicBool::new(false)),
        }
    }

    // Checked before each line; once raised, the open table is closed and the
    // run ends early with what was converted so far.
    pub fn with_stop_flag(mut self, stop: Arc<AtomicBool>) -> Self {
        self.stop = stop;
        self
    }

    // Main pipeline: read every line once, dispatching on its prefix.
    pub fn run(&mut self, cursor: &mut LineCursor) -> Result<ConversionSummary> {
        let start = Instant::now();
        fs::create_dir_all(&self.options.output_dir)?;

        let mut summary = ConversionSummary::default();
        let mut current: Option<TableContext> = None;
        let mut seen_tables: HashSet<String> = HashSet::new();

        loop {
            if self.stop.load(Ordering::SeqCst) {
                summary.interrupted = true;
                break;
            }
            let Some(line) = cursor.advance()? else {
                break;
            };

            // A wrapped value list swallows lines until it ends.
            if self.insert_parser.open_statement().is_some() {
                let ctx = current
                    .as_mut()
                    .ok_or_else(|| ConvertError::InsertWithoutTable {
                        at: line.at.clone(),
                    })?;
                let end = self.insert_parser.resume(&line, &mut ctx.sink)?;
                record_statement_end(end, &line, ctx, &mut summary);
                continue;
            }

            if is_create_table(&line.text) {
                if let Some(ctx) = current.take() {
                    summary.tables.push(ctx.close()?);
                }
                let schema = self.schema_parser.parse_create_table(&line, cursor)?;
                if !seen_tables.insert(schema.name.clone()) {
                    warn!(
                        "{}: table {} is defined again; its earlier output is overwritten",
                        line.at, schema.name
                    );
                }
                current = Some(TableContext::open(schema, &self.options.output_dir)?);
            } else if is_insert(&line.text) {
                let Some(ctx) = current.as_mut() else {
                    return Err(ConvertError::InsertWithoutTable { at: line.at });
                };
                if let Some(target) = self.insert_parser.table_name(&line.text) {
                    if target != ctx.schema.name {
                        warn!(
                            "{}: INSERT into {} while table {} is open; rows go to {}",
                            line.at,
                            target,
                            ctx.schema.name,
                            ctx.path.display()
                        );
                    }
                }
                let end = self.insert_parser.begin(&line, &mut ctx.sink)?;
                record_statement_end(end, &line, ctx, &mut summary);
            }
        }

        if let Some(at) = self.insert_parser.open_statement() {
            if !summary.interrupted {
                return Err(ConvertError::UnterminatedStatement { at: at.clone() });
            }
            warn!("Convert: interrupted inside the INSERT started at {}", at);
        }
        if let Some(ctx) = current.take() {
            summary.tables.push(ctx.close()?);
        }
        cursor.finish();

        summary.statements = self.insert_parser.statements_processed();
        summary.rows = self.insert_parser.rows_emitted();
        summary.lines_read = cursor.lines_read();
        summary.elapsed_ms = start.elapsed().as_millis();
        if summary.interrupted {
            info!("Convert: interrupted after {} lines", summary.lines_read);
        }
        info!(
            "Convert: wrote {} rows to {} tables from {} INSERT statements",
            summary.rows,
            summary.tables.len(),
            summary.statements
        );
        Ok(summary)
    }
}

fn record_statement_end(
    end: StatementEnd,
    line: &Line,
    ctx: &TableContext,
    summary: &mut ConversionSummary,
) {
    if let StatementEnd::Unterminated { dropped_fields } = end {
        if dropped_fields > 0 {
            warn!(
                "{}: INSERT into {} does not end with ');', dropped a row of {} values",
                line.at, ctx.schema.name, dropped_fields
            );
            summary.dropped_rows += 1;
        }
    }
}
