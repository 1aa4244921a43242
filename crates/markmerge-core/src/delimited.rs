//! Lenient delimited-text parsing and encoding.
//!
//! The parser is tuned for hand-exported spreadsheet data: it never fails,
//! folds `""` inside a quoted field into a literal quote, keeps delimiters
//! and line breaks inside quotes, and normalizes CRLF row endings.

/// Default field delimiter.
pub const DEFAULT_DELIMITER: char = ',';

/// Quote character for fields containing delimiters or line breaks.
pub const QUOTE: char = '"';

/// A single-pass parser over delimited text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DelimitedParser {
    delimiter: char,
}

impl Default for DelimitedParser {
    fn default() -> Self {
        Self {
            delimiter: DEFAULT_DELIMITER,
        }
    }
}

impl DelimitedParser {
    pub fn new(delimiter: char) -> Self {
        Self { delimiter }
    }

    pub fn delimiter(&self) -> char {
        self.delimiter
    }

    /// Split `text` into rows of fields.
    ///
    /// Unterminated quotes swallow the rest of the input into the current
    /// field. The last row is always emitted, so empty input yields one row
    /// holding one empty field.
    pub fn parse(&self, text: &str) -> Vec<Vec<String>> {
        let mut rows = Vec::new();
        let mut row = Vec::new();
        let mut field = String::new();
        let mut in_quotes = false;
        // Reset at field and row boundaries so `,""` does not read as an escape.
        let mut prev: Option<char> = None;

        for c in text.chars() {
            if c == QUOTE {
                if !in_quotes && prev == Some(QUOTE) {
                    field.push(QUOTE);
                }
                in_quotes = !in_quotes;
                prev = Some(c);
            } else if c == self.delimiter && !in_quotes {
                row.push(std::mem::take(&mut field));
                prev = None;
            } else if c == '\n' && !in_quotes {
                if prev == Some('\r') {
                    field.pop();
                }
                row.push(std::mem::take(&mut field));
                rows.push(std::mem::take(&mut row));
                prev = None;
            } else {
                field.push(c);
                prev = Some(c);
            }
        }

        row.push(field);
        rows.push(row);
        rows
    }

    /// Quote `field` if it needs it, doubling embedded quotes.
    pub fn encode_field(&self, field: &str) -> String {
        let needs_quotes = field
            .chars()
            .any(|c| c == self.delimiter || c == QUOTE || c == '\n' || c == '\r');
        if !needs_quotes {
            return field.to_string();
        }

        let mut out = String::with_capacity(field.len() + 2);
        out.push(QUOTE);
        for c in field.chars() {
            if c == QUOTE {
                out.push(QUOTE);
            }
            out.push(c);
        }
        out.push(QUOTE);
        out
    }

    pub fn encode_row<S: AsRef<str>>(&self, fields: &[S]) -> String {
        let delimiter = self.delimiter.to_string();
        fields
            .iter()
            .map(|f| self.encode_field(f.as_ref()))
            .collect::<Vec<_>>()
            .join(&delimiter)
    }

    /// Encode rows joined by `\n`, without a trailing newline.
    pub fn encode_table<S: AsRef<str>>(&self, rows: &[Vec<S>]) -> String {
        rows.iter()
            .map(|r| self.encode_row(r))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Parse comma-delimited text.
pub fn parse(text: &str) -> Vec<Vec<String>> {
    DelimitedParser::default().parse(text)
}

/// Whether every field of a row is empty.
pub fn is_blank_row(row: &[String]) -> bool {
    row.iter().all(|f| f.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(raw: &[&[&str]]) -> Vec<Vec<String>> {
        raw.iter()
            .map(|r| r.iter().map(|f| f.to_string()).collect())
            .collect()
    }

    #[test]
    fn parse_simple_rows() {
        assert_eq!(
            parse("a,b,c\n1,2,3"),
            rows(&[&["a", "b", "c"], &["1", "2", "3"]])
        );
    }

    #[test]
    fn parse_quoted_delimiter_and_newline() {
        let parsed = parse("\"Smith, John\",\"line one\nline two\",x");
        assert_eq!(
            parsed,
            rows(&[&["Smith, John", "line one\nline two", "x"]])
        );
    }

    #[test]
    fn parse_escaped_quotes() {
        let parsed = parse("\"He said \"\"hi\"\"\"");
        assert_eq!(parsed, rows(&[&["He said \"hi\""]]));
    }

    #[test]
    fn parse_empty_quoted_field_is_empty() {
        assert_eq!(parse("a,\"\",b"), rows(&[&["a", "", "b"]]));
    }

    #[test]
    fn quote_after_delimiter_is_not_an_escape() {
        assert_eq!(parse("\"x\",\"y\""), rows(&[&["x", "y"]]));
    }

    #[test]
    fn parse_crlf_line_endings() {
        assert_eq!(
            parse("a,b\r\nc,d\r\n"),
            rows(&[&["a", "b"], &["c", "d"], &[""]])
        );
    }

    #[test]
    fn crlf_inside_quotes_is_preserved() {
        assert_eq!(parse("\"a\r\nb\",c"), rows(&[&["a\r\nb", "c"]]));
    }

    #[test]
    fn unterminated_quote_consumes_rest() {
        assert_eq!(
            parse("a,\"b,c\nd,e"),
            rows(&[&["a", "b,c\nd,e"]])
        );
    }

    #[test]
    fn empty_input_is_one_empty_field() {
        assert_eq!(parse(""), rows(&[&[""]]));
    }

    #[test]
    fn custom_delimiter() {
        let parser = DelimitedParser::new(';');
        assert_eq!(
            parser.parse("a;\"b;c\",d"),
            rows(&[&["a", "b;c,d"]])
        );
    }

    #[test]
    fn parse_is_deterministic() {
        let text = "\"q\"\"x\",y\r\n1,\"2\n3\"";
        assert_eq!(parse(text), parse(text));
    }

    #[test]
    fn encode_quotes_only_when_needed() {
        let parser = DelimitedParser::default();
        assert_eq!(parser.encode_field("plain"), "plain");
        assert_eq!(parser.encode_field("Smith, John"), "\"Smith, John\"");
        assert_eq!(parser.encode_field("say \"hi\""), "\"say \"\"hi\"\"\"");
        assert_eq!(parser.encode_field("two\nlines"), "\"two\nlines\"");
    }

    #[test]
    fn encode_then_parse_reproduces_table() {
        let parser = DelimitedParser::default();
        let table = rows(&[
            &["Student", "ID", "Notes"],
            &["Smith, John", "0042", "said \"present\""],
            &["", "\"", "multi\nline, with comma"],
            &["trailing space ", " leading", "crlf\r\ninside"],
        ]);
        let encoded = parser.encode_table(&table);
        assert_eq!(parser.parse(&encoded), table);
    }

    #[test]
    fn blank_rows() {
        assert!(is_blank_row(&["".to_string(), "  ".to_string()]));
        assert!(!is_blank_row(&["".to_string(), "x".to_string()]));
    }
}
