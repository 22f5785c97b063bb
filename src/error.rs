// Error types for the dump converter.
// Every failure is fatal: the driver stops at the first error and main exits non-zero.

use std::io;
use thiserror::Error;

pub type Result<T, E = ConvertError> = std::result::Result<T, E>;

// Where in the concatenated input a problem was found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub source: String,
    pub line: usize,
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.source, self.line)
    }
}

// Strict-mode failures raised by the value tokenizer.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenizeError {
    #[error("line ends inside a quoted value")]
    UnterminatedQuote,

    #[error("line ends with a dangling escape character")]
    DanglingEscape,
}

#[derive(Error, Debug)]
pub enum ConvertError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("CSV write error: {0}")]
    Csv(#[from] csv::Error),

    #[error("cannot open input {path}: {source}")]
    OpenInput {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("{at}: cannot read line: {source}")]
    Read {
        at: Location,
        #[source]
        source: io::Error,
    },

    #[error("{at}: INSERT value list is missing or does not start with '('")]
    MalformedValues { at: Location },

    #[error("{at}: {source}")]
    Tokenize {
        at: Location,
        #[source]
        source: TokenizeError,
    },

    #[error("{at}: INSERT statement before any CREATE TABLE")]
    InsertWithoutTable { at: Location },

    #[error("{at}: CREATE TABLE line has no backtick-quoted table name")]
    MalformedCreateTable { at: Location },

    #[error("{at}: table name {name:?} cannot be used as an output file name")]
    InvalidTableName { at: Location, name: String },

    #[error("{at}: column definition {line:?} has no type")]
    MalformedColumn { at: Location, line: String },

    #[error("input ended inside the definition of table {table}")]
    UnterminatedTable { table: String },

    #[error("input ended inside a wrapped INSERT statement started at {at}")]
    UnterminatedStatement { at: Location },
}
