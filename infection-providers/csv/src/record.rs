//! Minimal comma-separated record codec.
//!
//! Fields may be wrapped in double quotes, in which case commas, line breaks
//! and doubled quotes (`""`) are taken literally. Blank lines are skipped and
//! `\r\n` line endings are accepted.

use std::io::{self, Write};
use std::iter::Peekable;
use std::str::Chars;

use crate::CsvProviderError;

/// One parsed record and the line it started on (1-based).
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Record {
    pub(crate) line: usize,
    pub(crate) fields: Vec<String>,
}

pub(crate) fn parse_records(input: &str) -> Result<Vec<Record>, CsvProviderError> {
    let mut parser = Parser {
        chars: input.chars().peekable(),
        line: 1,
    };
    let mut records = Vec::new();
    while parser.chars.peek().is_some() {
        if let Some(record) = parser.next_record()? {
            records.push(record);
        }
    }
    Ok(records)
}

struct Parser<'a> {
    chars: Peekable<Chars<'a>>,
    line: usize,
}

impl Parser<'_> {
    /// Parses up to and including the next unquoted line break. Returns `None`
    /// for blank lines.
    fn next_record(&mut self) -> Result<Option<Record>, CsvProviderError> {
        let start = self.line;
        let mut fields = Vec::new();
        let mut field = String::new();
        let mut quoted = false;
        let mut in_quotes = false;
        let mut any_quoted = false;

        loop {
            let Some(ch) = self.chars.next() else {
                if in_quotes {
                    return Err(malformed(start, "unterminated quoted field"));
                }
                fields.push(field);
                break;
            };
            match ch {
                '"' if in_quotes => {
                    if self.chars.peek() == Some(&'"') {
                        self.chars.next();
                        field.push('"');
                    } else {
                        in_quotes = false;
                    }
                }
                '"' if field.is_empty() && !quoted => {
                    quoted = true;
                    in_quotes = true;
                    any_quoted = true;
                }
                '"' => return Err(malformed(self.line, "unexpected quote")),
                '\n' if in_quotes => {
                    self.line += 1;
                    field.push(ch);
                }
                '\n' => {
                    self.line += 1;
                    fields.push(field);
                    break;
                }
                '\r' if !in_quotes && self.chars.peek() == Some(&'\n') => {}
                ',' if !in_quotes => {
                    fields.push(std::mem::take(&mut field));
                    quoted = false;
                }
                _ if quoted && !in_quotes => {
                    return Err(malformed(self.line, "text after closing quote"));
                }
                _ => field.push(ch),
            }
        }

        let blank = !any_quoted && matches!(fields.as_slice(), [only] if only.is_empty());
        if blank {
            return Ok(None);
        }
        Ok(Some(Record {
            line: start,
            fields,
        }))
    }
}

fn malformed(line: usize, reason: &str) -> CsvProviderError {
    CsvProviderError::MalformedRow {
        line,
        reason: reason.to_owned(),
    }
}

pub(crate) fn write_record(mut writer: impl Write, fields: &[&str]) -> io::Result<()> {
    for (index, field) in fields.iter().enumerate() {
        if index > 0 {
            writer.write_all(b",")?;
        }
        write_field(&mut writer, field)?;
    }
    writer.write_all(b"\n")
}

fn write_field(mut writer: impl Write, field: &str) -> io::Result<()> {
    let needs_quotes = field.is_empty()
        || field
            .chars()
            .any(|ch| matches!(ch, ',' | '"' | '\n' | '\r'));
    if !needs_quotes {
        return writer.write_all(field.as_bytes());
    }
    write!(writer, "\"{}\"", field.replace('"', "\"\""))
}
