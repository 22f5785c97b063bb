// Schema parser: extracts the table name and typed column list from a CREATE TABLE block.
// Column lines are read until the first key or ENGINE line; the rest of the block is left
// for the driver, which ignores it.

use crate::cursor::{Line, LineCursor};
use crate::error::{ConvertError, Result};
use crate::parser::{is_schema_terminator, ColumnDef, ColumnType, TableSchema};
use regex::Regex;

pub struct SchemaParser {
    table_name_re: Regex,
}

impl SchemaParser {
    // Build regexes once for reuse.
    pub fn new() -> Self {
        // First and second backtick on the line delimit the table name.
        let table_name_re =
            Regex::new(r"^CREATE TABLE[^`]*`([^`]*)`").expect("valid create table regex");
        Self { table_name_re }
    }

    // Parse the block opened by `opener`, consuming column lines and the terminator
    // from the cursor.
    pub fn parse_create_table(
        &self,
        opener: &Line,
        cursor: &mut LineCursor,
    ) -> Result<TableSchema> {
        let name = self.table_name(opener)?;
        tracing::debug!("ParseCreateTable: found CREATE TABLE for {}", name);

        let mut columns = Vec::new();
        loop {
            let terminated = match cursor.peek()? {
                Some(line) => is_schema_terminator(&line.text),
                None => return Err(ConvertError::UnterminatedTable { table: name }),
            };
            let Some(line) = cursor.advance()? else {
                return Err(ConvertError::UnterminatedTable { table: name });
            };
            if terminated {
                break;
            }
            columns.push(parse_column(&line)?);
        }

        tracing::debug!(
            "ParseCreateTable: table {} has {} columns",
            name,
            columns.len()
        );
        Ok(TableSchema { name, columns })
    }

    fn table_name(&self, opener: &Line) -> Result<String> {
        let name = self
            .table_name_re
            .captures(&opener.text)
            .and_then(|cap| cap.get(1))
            .map(|m| m.as_str().to_string())
            .ok_or_else(|| ConvertError::MalformedCreateTable {
                at: opener.at.clone(),
            })?;

        // The name becomes a file name in the output directory.
        if name.is_empty() || name == "." || name == ".." || name.contains(['/', '\\']) {
            return Err(ConvertError::InvalidTableName {
                at: opener.at.clone(),
                name,
            });
        }
        Ok(name)
    }
}

impl Default for SchemaParser {
    fn default() -> Self {
        Self::new()
    }
}

// "  `name` varchar(50) NOT NULL," -> name:STRING
fn parse_column(line: &Line) -> Result<ColumnDef> {
    let mut parts = line.text.split_whitespace();
    match (parts.next(), parts.next()) {
        (Some(name), Some(raw_type)) => Ok(ColumnDef {
            name: name.trim_matches('`').to_string(),
            column_type: ColumnType::from_sql(raw_type),
        }),
        _ => Err(ConvertError::MalformedColumn {
            at: line.at.clone(),
            line: line.text.clone(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn parse(dump: &str) -> (Result<TableSchema>, LineCursor) {
        let mut cursor =
            LineCursor::from_readers([("dump.sql".to_string(), Cursor::new(dump.to_string()))]);
        let opener = cursor.advance().unwrap().unwrap();
        let result = SchemaParser::new().parse_create_table(&opener, &mut cursor);
        (result, cursor)
    }

    #[test]
    fn extracts_typed_columns_until_primary_key() {
        let dump = "CREATE TABLE `users` (\n\
                    \x20 `id` int(11) NOT NULL AUTO_INCREMENT,\n\
                    \x20 `name` varchar(50) DEFAULT NULL,\n\
                    \x20 `created_at` timestamp NOT NULL DEFAULT CURRENT_TIMESTAMP,\n\
                    \x20 PRIMARY KEY (`id`),\n\
                    \x20 KEY `idx_name` (`name`)\n\
                    ) ENGINE=InnoDB DEFAULT CHARSET=utf8mb4;\n";
        let (schema, mut cursor) = parse(dump);
        let schema = schema.unwrap();
        assert_eq!(schema.name, "users");
        assert_eq!(
            schema.header(),
            vec!["id:INTEGER", "name:STRING", "created_at:TIMESTAMP"]
        );
        // The terminator was consumed; the next line is left for the caller.
        assert_eq!(
            cursor.advance().unwrap().unwrap().text,
            "  KEY `idx_name` (`name`)"
        );
    }

    #[test]
    fn engine_line_ends_a_table_without_keys() {
        let dump = "CREATE TABLE `flags` (\n\
                    \x20 `enabled` bit(1) NOT NULL,\n\
                    \x20 `price` decimal(10,2) DEFAULT NULL,\n\
                    \x20 `day` date,\n\
                    \x20 `seen` datetime\n\
                    ) ENGINE=InnoDB;\n\
                    INSERT INTO `flags` VALUES (1);\n";
        let (schema, mut cursor) = parse(dump);
        let schema = schema.unwrap();
        assert_eq!(
            schema.header(),
            vec!["enabled:BOOL", "price:FLOAT64", "day:DATE", "seen:DATETIME"]
        );
        assert!(cursor.advance().unwrap().unwrap().text.starts_with("INSERT INTO"));
    }

    #[test]
    fn unique_key_terminates() {
        let dump = "CREATE TABLE IF NOT EXISTS `t` (\n\
                    \x20 `email` varchar(255),\n\
                    \x20 UNIQUE KEY `email` (`email`)\n";
        let schema = parse(dump).0.unwrap();
        assert_eq!(schema.name, "t");
        assert_eq!(schema.header(), vec!["email:STRING"]);
    }

    #[test]
    fn end_of_input_inside_block_is_fatal() {
        let dump = "CREATE TABLE `half` (\n  `id` int(11) NOT NULL,\n";
        match parse(dump).0 {
            Err(ConvertError::UnterminatedTable { table }) => assert_eq!(table, "half"),
            other => panic!("expected UnterminatedTable, got {:?}", other),
        }
    }

    #[test]
    fn column_without_type_is_fatal() {
        let dump = "CREATE TABLE `t` (\n  `id`\n) ENGINE=InnoDB;\n";
        match parse(dump).0 {
            Err(ConvertError::MalformedColumn { at, .. }) => assert_eq!(at.line, 2),
            other => panic!("expected MalformedColumn, got {:?}", other),
        }
    }

    #[test]
    fn table_name_needs_backticks_and_a_safe_file_name() {
        assert!(matches!(
            parse("CREATE TABLE users (\n) ENGINE=InnoDB;\n").0,
            Err(ConvertError::MalformedCreateTable { .. })
        ));
        assert!(matches!(
            parse("CREATE TABLE `../etc` (\n) ENGINE=InnoDB;\n").0,
            Err(ConvertError::InvalidTableName { .. })
        ));
        assert!(matches!(
            parse("CREATE TABLE `` (\n) ENGINE=InnoDB;\n").0,
            Err(ConvertError::InvalidTableName { .. })
        ));
    }
}
