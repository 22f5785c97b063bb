// Value tokenizer: splits an INSERT value list into decoded fields.
//
// The rules are those of a CSV reader configured with `,` as delimiter, `'` as quote,
// `\` as escape and no doubled-quote escaping:
// - a quote only opens a quoted value at the start of a field, or right after the
//   `(` that opens a tuple;
// - text after the closing quote stays in the same field (`'b');` -> `b);`);
// - an escape makes the next character literal, quoted or not;
// - otherwise tuple parens are ordinary characters; rows::RowAssembler deals with them.
//
// The tuple-paren case is where this differs from a stock CSV reader with the same
// settings. That reader only opens a quote at the very start of a field, so for
// `('abc',1),('x,y',2);` it keeps `('abc'` with its quotes and splits `('x` from `y'`.
// Here the fields are `(abc` and `(x,y`, and the assembler strips the parens.
//
// The tokenizer does not track tuples or rows. It only reports whether a line ended
// cleanly or right after a delimiter, in which case the next line continues the same
// value list.

use crate::error::TokenizeError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    StartField,
    TupleOpen,
    InField,
    InQuoted,
    Escape,
    EscapeInQuoted,
}

// How a line ended from the tokenizer's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineEnd {
    // The last field was emitted; the line holds no open value.
    Complete,
    // The line ended after a delimiter; the next line starts the next field.
    Continues,
}

pub struct ValueTokenizer {
    delimiter: char,
    quote: char,
    escape: char,
    state: State,
    after_delimiter: bool,
    field: String,
}

impl ValueTokenizer {
    // Quoting rules used by mysqldump value lists.
    pub fn mysql() -> Self {
        Self {
            delimiter: ',',
            quote: '\'',
            escape: '\\',
            state: State::StartField,
            after_delimiter: false,
            field: String::new(),
        }
    }

    // Tokenize one line (without its terminator), handing each completed field to
    // `on_field`. State carries over to the next call only when Continues is returned.
    pub fn tokenize_line<F>(
        &mut self,
        line: &str,
        mut on_field: F,
    ) -> Result<LineEnd, TokenizeError>
    where
        F: FnMut(String),
    {
        for c in line.chars() {
            match self.state {
                State::StartField => {
                    self.after_delimiter = false;
                    if c == self.quote {
                        self.state = State::InQuoted;
                    } else if c == self.escape {
                        self.state = State::Escape;
                    } else if c == self.delimiter {
                        // Two delimiters in a row: an empty field.
                        on_field(String::new());
                        self.after_delimiter = true;
                    } else if c == '(' {
                        self.field.push(c);
                        self.state = State::TupleOpen;
                    } else {
                        self.field.push(c);
                        self.state = State::InField;
                    }
                }
                State::TupleOpen => {
                    if c == self.quote {
                        self.state = State::InQuoted;
                    } else if c == self.escape {
                        self.state = State::Escape;
                    } else if c == self.delimiter {
                        on_field(std::mem::take(&mut self.field));
                        self.state = State::StartField;
                        self.after_delimiter = true;
                    } else {
                        self.field.push(c);
                        self.state = State::InField;
                    }
                }
                State::InField => {
                    if c == self.escape {
                        self.state = State::Escape;
                    } else if c == self.delimiter {
                        on_field(std::mem::take(&mut self.field));
                        self.state = State::StartField;
                        self.after_delimiter = true;
                    } else {
                        self.field.push(c);
                    }
                }
                State::InQuoted => {
                    if c == self.escape {
                        self.state = State::EscapeInQuoted;
                    } else if c == self.quote {
                        self.state = State::InField;
                    } else {
                        self.field.push(c);
                    }
                }
                State::Escape => {
                    self.field.push(c);
                    self.state = State::InField;
                }
                State::EscapeInQuoted => {
                    self.field.push(c);
                    self.state = State::InQuoted;
                }
            }
        }

        match self.state {
            State::StartField if self.after_delimiter => Ok(LineEnd::Continues),
            State::StartField => Ok(LineEnd::Complete),
            State::InField | State::TupleOpen => {
                on_field(std::mem::take(&mut self.field));
                self.state = State::StartField;
                Ok(LineEnd::Complete)
            }
            State::InQuoted => {
                self.reset();
                Err(TokenizeError::UnterminatedQuote)
            }
            State::Escape | State::EscapeInQuoted => {
                self.reset();
                Err(TokenizeError::DanglingEscape)
            }
        }
    }

    // True while a value list wrapped onto the next line is awaited.
    pub fn is_pending(&self) -> bool {
        self.state == State::StartField && self.after_delimiter
    }

    pub fn reset(&mut self) {
        self.state = State::StartField;
        self.after_delimiter = false;
        self.field.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(line: &str) -> (Vec<String>, LineEnd) {
        let mut out = Vec::new();
        let end = ValueTokenizer::mysql()
            .tokenize_line(line, |f| out.push(f))
            .unwrap();
        (out, end)
    }

    #[test]
    fn splits_tuples_into_raw_fields() {
        let (out, end) = fields("(1,'a'),(2,'b');");
        assert_eq!(out, vec!["(1", "a)", "(2", "b);"]);
        assert_eq!(end, LineEnd::Complete);
    }

    #[test]
    fn escaped_quote_stays_in_one_field() {
        let (out, _) = fields(r"(1,'O\'Brien');");
        assert_eq!(out, vec!["(1", "O'Brien);"]);
    }

    #[test]
    fn escape_makes_next_character_literal() {
        let (out, _) = fields(r"('a\,b','c\\d',e\,f,'g\nh')");
        assert_eq!(out, vec!["(a,b", r"c\d", "e,f", "gnh)"]);
    }

    #[test]
    fn quote_after_tuple_paren_opens_a_quoted_value() {
        let (out, _) = fields(r"('O\'Brien'),('x','y');");
        assert_eq!(out, vec!["(O'Brien)", "(x", "y);"]);

        let (out, _) = fields("('abc',1),('x,y',2);");
        assert_eq!(out, vec!["(abc", "1)", "(x,y", "2);"]);

        // Anywhere else inside an unquoted field a quote is literal.
        let (out, _) = fields("(1,a'b')");
        assert_eq!(out, vec!["(1", "a'b')"]);
    }

    #[test]
    fn delimiters_and_parens_inside_quotes_are_text() {
        let (out, _) = fields("(1,'x, (y)'),(2,'');");
        assert_eq!(out, vec!["(1", "x, (y))", "(2", ");"]);
    }

    #[test]
    fn empty_fields_and_doubled_quotes() {
        let (out, _) = fields("(,'',NULL,'it''s')");
        // No doubled-quote escaping: the second quote closes, the rest is literal.
        assert_eq!(out, vec!["(", "", "NULL", "it's')"]);
    }

    #[test]
    fn trailing_delimiter_continues_on_next_line() {
        let mut tokenizer = ValueTokenizer::mysql();
        let mut out = Vec::new();
        let end = tokenizer
            .tokenize_line("(1,'a'),", |f| out.push(f))
            .unwrap();
        assert_eq!(end, LineEnd::Continues);
        assert!(tokenizer.is_pending());

        let end = tokenizer.tokenize_line("(2,'b');", |f| out.push(f)).unwrap();
        assert_eq!(end, LineEnd::Complete);
        assert!(!tokenizer.is_pending());
        assert_eq!(out, vec!["(1", "a)", "(2", "b);"]);
    }

    #[test]
    fn strict_mode_rejects_open_quote_and_dangling_escape() {
        let mut tokenizer = ValueTokenizer::mysql();
        assert_eq!(
            tokenizer.tokenize_line("(1,'never closed", |_| {}),
            Err(TokenizeError::UnterminatedQuote)
        );
        assert_eq!(
            tokenizer.tokenize_line(r"(1,'a'),(2,\", |_| {}),
            Err(TokenizeError::DanglingEscape)
        );
        assert_eq!(
            tokenizer.tokenize_line(r"('x\", |_| {}),
            Err(TokenizeError::DanglingEscape)
        );
        // The tokenizer is usable again after an error.
        assert!(!tokenizer.is_pending());
    }
}
