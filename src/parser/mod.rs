// Parser module: CREATE TABLE column extraction and INSERT value-list parsing.
// Only the two statement shapes written by mysqldump are recognized, by line prefix.

pub mod insert;
pub mod rows;
pub mod schema;
pub mod tokenizer;

use std::fmt;

pub const CREATE_TABLE: &str = "CREATE TABLE";
pub const INSERT_INTO: &str = "INSERT INTO";

// Lines that end the column list of a CREATE TABLE block.
pub const SCHEMA_TERMINATORS: [&str; 4] = ["  PRIMARY KEY", "  KEY", ") ENGINE", "  UNIQUE KEY"];

// Written in place of SQL NULL and of the empty string.
pub const NULL_SENTINEL: &str = "\0";

pub fn is_create_table(line: &str) -> bool {
    line.starts_with(CREATE_TABLE)
}

pub fn is_insert(line: &str) -> bool {
    line.starts_with(INSERT_INTO)
}

pub fn is_schema_terminator(line: &str) -> bool {
    SCHEMA_TERMINATORS.iter().any(|m| line.starts_with(m))
}

// Output type written next to each column name in the CSV header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    String,
    Integer,
    Timestamp,
    Datetime,
    Date,
    Float64,
    Bool,
}

impl ColumnType {
    // Map a raw SQL type token (e.g. "varchar(50)", "int(11)") to an output type.
    // Order matters: "datetime" must be tested before "date".
    pub fn from_sql(raw: &str) -> Self {
        if raw.starts_with("int") || raw.starts_with("bigint") {
            ColumnType::Integer
        } else if raw.starts_with("timestamp") {
            ColumnType::Timestamp
        } else if raw.starts_with("datetime") {
            ColumnType::Datetime
        } else if raw.starts_with("date") {
            ColumnType::Date
        } else if raw.starts_with("decimal") {
            ColumnType::Float64
        } else if raw.starts_with("bit(1)") {
            ColumnType::Bool
        } else {
            ColumnType::String
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ColumnType::String => "STRING",
            ColumnType::Integer => "INTEGER",
            ColumnType::Timestamp => "TIMESTAMP",
            ColumnType::Datetime => "DATETIME",
            ColumnType::Date => "DATE",
            ColumnType::Float64 => "FLOAT64",
            ColumnType::Bool => "BOOL",
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDef {
    pub name: String,
    pub column_type: ColumnType,
}

impl ColumnDef {
    // Header cell, e.g. "created_at:TIMESTAMP".
    pub fn header(&self) -> String {
        format!("{}:{}", self.name, self.column_type)
    }
}

// Table name plus its ordered columns, as read from one CREATE TABLE block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSchema {
    pub name: String,
    pub columns: Vec<ColumnDef>,
}

impl TableSchema {
    pub fn header(&self) -> Vec<String> {
        self.columns.iter().map(ColumnDef::header).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_prefixes_follow_precedence() {
        let cases = [
            ("int(11)", ColumnType::Integer),
            ("bigint(20)", ColumnType::Integer),
            ("integer", ColumnType::Integer),
            ("tinyint(1)", ColumnType::String),
            ("timestamp", ColumnType::Timestamp),
            ("datetime(6)", ColumnType::Datetime),
            ("date", ColumnType::Date),
            ("decimal(10,2)", ColumnType::Float64),
            ("bit(1)", ColumnType::Bool),
            ("bit(8)", ColumnType::String),
            ("varchar(50)", ColumnType::String),
            ("double", ColumnType::String),
        ];
        for (raw, expected) in cases {
            assert_eq!(ColumnType::from_sql(raw), expected, "type {}", raw);
        }
    }

    #[test]
    fn markers_are_anchored_and_case_sensitive() {
        assert!(is_create_table("CREATE TABLE `users` ("));
        assert!(!is_create_table("create table `users` ("));
        assert!(is_insert("INSERT INTO `users` VALUES (1);"));
        assert!(!is_insert("  INSERT INTO `users` VALUES (1);"));

        assert!(is_schema_terminator("  PRIMARY KEY (`id`),"));
        assert!(is_schema_terminator("  KEY `idx_name` (`name`)"));
        assert!(is_schema_terminator("  UNIQUE KEY `uniq` (`email`)"));
        assert!(is_schema_terminator(") ENGINE=InnoDB DEFAULT CHARSET=utf8mb4;"));
        assert!(!is_schema_terminator("  `key` varchar(10) NOT NULL,"));
        assert!(!is_schema_terminator("   KEY indented too far"));
    }

    #[test]
    fn header_cells_join_name_and_type() {
        let schema = TableSchema {
            name: "t".into(),
            columns: vec![
                ColumnDef {
                    name: "id".into(),
                    column_type: ColumnType::Integer,
                },
                ColumnDef {
                    name: "flag".into(),
                    column_type: ColumnType::Bool,
                },
            ],
        };
        assert_eq!(schema.header(), vec!["id:INTEGER", "flag:BOOL"]);
    }
}
