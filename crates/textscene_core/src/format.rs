// SPDX-License-Identifier: MIT OR Apache-2.0
//! Line-level text primitives shared by the codecs.
//!
//! Documents are UTF-8, one record per line, indented two spaces per
//! nesting level. Floats carry five fractional digits.

use crate::error::FormatError;
use std::fmt::Display;

/// One level of indentation
pub const INDENT: &str = "  ";

/// Format a float with five fractional digits
pub fn format_float(value: f32) -> String {
    if value.is_nan() {
        "NaN".to_string()
    } else if value == f32::INFINITY {
        "Infinity".to_string()
    } else if value == f32::NEG_INFINITY {
        "-Infinity".to_string()
    } else {
        format!("{value:.5}")
    }
}

/// Parse a float, unparsable text yields NaN
pub fn parse_float(token: &str) -> f32 {
    let token = token.trim();
    if token.eq_ignore_ascii_case("infinity") {
        return f32::INFINITY;
    }
    if token.eq_ignore_ascii_case("-infinity") {
        return f32::NEG_INFINITY;
    }
    token.parse().unwrap_or(f32::NAN)
}

/// Split a vector-like on space, comma and parentheses
pub fn split_components(text: &str) -> Vec<&str> {
    text.split([' ', ',', '(', ')'])
        .filter(|part| !part.is_empty())
        .collect()
}

/// Parse every component of a vector-like
pub fn parse_floats(text: &str) -> Vec<f32> {
    split_components(text).into_iter().map(parse_float).collect()
}

/// Space-separated floats, as on placement lines
pub fn float_line(values: &[f32]) -> String {
    values.iter().map(|v| format_float(*v)).collect::<Vec<_>>().join(" ")
}

/// Parenthesized comma-separated floats, as in vector values
pub fn float_tuple(values: &[f32]) -> String {
    let inner = values.iter().map(|v| format_float(*v)).collect::<Vec<_>>().join(", ");
    format!("({inner})")
}

/// Escape a string so it stays on one line.
///
/// Trailing spaces and tabs are escaped as well, since lines are trimmed
/// on read. Other trailing Unicode whitespace is not preserved.
pub fn escape(text: &str) -> String {
    let body = text.trim_end_matches([' ', '\t']);
    let mut out = String::with_capacity(text.len());
    for c in body.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            _ => out.push(c),
        }
    }
    for c in text[body.len()..].chars() {
        out.push_str(if c == ' ' { "\\s" } else { "\\t" });
    }
    out
}

/// Reverse [`escape`], unknown escapes are kept verbatim
pub fn unescape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('\\') => out.push('\\'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('s') => out.push(' '),
            Some('t') => out.push('\t'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

/// Indented line output
#[derive(Debug, Default)]
pub struct LineWriter {
    buf: String,
}

impl LineWriter {
    /// Create an empty writer
    pub fn new() -> Self {
        Self::default()
    }

    /// Write one line at a nesting depth
    pub fn line(&mut self, depth: usize, text: impl Display) {
        for _ in 0..depth {
            self.buf.push_str(INDENT);
        }
        self.buf.push_str(&text.to_string());
        self.buf.push('\n');
    }

    /// Write an empty line
    pub fn blank(&mut self) {
        self.buf.push('\n');
    }

    /// Append text that is already laid out
    pub fn append(&mut self, block: &str) {
        self.buf.push_str(block);
    }

    /// Take the written text
    pub fn finish(self) -> String {
        self.buf
    }
}

/// Sequential reader over the lines of a document
#[derive(Debug)]
pub struct LineReader<'a> {
    lines: Vec<&'a str>,
    pos: usize,
}

impl<'a> LineReader<'a> {
    /// Split a document into lines
    pub fn new(text: &'a str) -> Self {
        Self {
            lines: text.lines().collect(),
            pos: 0,
        }
    }

    /// One-based number of the next line
    pub fn line_number(&self) -> usize {
        self.pos + 1
    }

    /// Skip empty lines, true if any line remains
    pub fn skip_blank(&mut self) -> bool {
        while self.pos < self.lines.len() && self.lines[self.pos].trim().is_empty() {
            self.pos += 1;
        }
        self.pos < self.lines.len()
    }

    /// Take the next line, trimmed
    pub fn next_line(&mut self, expected: &str) -> Result<(usize, &'a str), FormatError> {
        let line = self.lines.get(self.pos).ok_or_else(|| FormatError::UnexpectedEof {
            line: self.line_number(),
            expected: expected.to_string(),
        })?;
        self.pos += 1;
        Ok((self.pos, line.trim()))
    }

    /// Take the next line and strip a required keyword
    pub fn expect_keyword(&mut self, keyword: &str) -> Result<(usize, &'a str), FormatError> {
        let (line, text) = self.next_line(keyword)?;
        match text.strip_prefix(keyword) {
            Some(rest) if rest.is_empty() => Ok((line, rest)),
            Some(rest) if rest.starts_with(' ') => Ok((line, &rest[1..])),
            _ => Err(FormatError::Expected {
                line,
                expected: keyword.to_string(),
                found: text.to_string(),
            }),
        }
    }

    /// Read `keyword N` and return N
    pub fn expect_count(&mut self, keyword: &str) -> Result<usize, FormatError> {
        let (line, rest) = self.expect_keyword(keyword)?;
        parse_count(line, rest)
    }

    /// Read a line of exactly `arity` floats
    pub fn expect_floats(&mut self, arity: usize) -> Result<Vec<f32>, FormatError> {
        let (line, text) = self.next_line("placement values")?;
        let values = parse_floats(text);
        if values.len() != arity {
            return Err(FormatError::Arity {
                line,
                expected: arity,
                found: values.len(),
            });
        }
        Ok(values)
    }
}

/// Parse a non-negative count
pub fn parse_count(line: usize, text: &str) -> Result<usize, FormatError> {
    text.trim().parse().map_err(|_| FormatError::InvalidNumber {
        line,
        text: text.trim().to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_float_formatting() {
        assert_eq!(format_float(1.0), "1.00000");
        assert_eq!(format_float(-2.5), "-2.50000");
        assert_eq!(format_float(0.1), "0.10000");
        assert_eq!(format_float(f32::INFINITY), "Infinity");
        assert_eq!(format_float(f32::NEG_INFINITY), "-Infinity");
        assert_eq!(float_line(&[1.0, 2.0, 3.0]), "1.00000 2.00000 3.00000");
        assert_eq!(float_tuple(&[0.0, 1.0]), "(0.00000, 1.00000)");
    }

    #[test]
    fn test_float_parsing() {
        assert_eq!(parse_float("INFINITY"), f32::INFINITY);
        assert_eq!(parse_float("-Infinity"), f32::NEG_INFINITY);
        assert_eq!(parse_float("0.25000"), 0.25);
        assert!(parse_float("garbage").is_nan());
        assert_eq!(parse_floats("(1.0, 2.0,3.0)"), vec![1.0, 2.0, 3.0]);
        assert_eq!(parse_floats("1 2  3 4"), vec![1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_escape() {
        let text = "line one\nline two \\ end\r";
        let escaped = escape(text);
        assert!(!escaped.contains('\n'));
        assert_eq!(unescape(&escaped), text);
        assert_eq!(unescape("C:\\data"), "C:\\data");
    }

    #[test]
    fn test_escape_trailing_whitespace() {
        assert_eq!(escape("pad  "), "pad\\s\\s");
        assert_eq!(escape("a b\t"), "a b\\t");
        assert_eq!(escape("   "), "\\s\\s\\s");
        for text in ["pad  ", "tab\t", "   ", " lead"] {
            assert_eq!(unescape(&escape(text)), text);
        }
    }

    #[test]
    fn test_reader_keywords() {
        let mut reader = LineReader::new("children 2\n  components x\n");
        assert_eq!(reader.expect_count("children"), Ok(2));
        assert_eq!(
            reader.expect_count("components"),
            Err(FormatError::InvalidNumber {
                line: 2,
                text: "x".into()
            })
        );
        assert!(matches!(
            reader.next_line("anything"),
            Err(FormatError::UnexpectedEof { line: 3, .. })
        ));
    }

    #[test]
    fn test_reader_rejects_prefix_match() {
        let mut reader = LineReader::new("childrenX 2");
        assert!(matches!(
            reader.expect_count("children"),
            Err(FormatError::Expected { .. })
        ));
    }

    #[test]
    fn test_placement_arity() {
        let mut reader = LineReader::new("1.0 2.0\n");
        assert_eq!(
            reader.expect_floats(3),
            Err(FormatError::Arity {
                line: 1,
                expected: 3,
                found: 2
            })
        );
    }

    #[test]
    fn test_writer_indents() {
        let mut writer = LineWriter::new();
        writer.line(0, "components 1");
        writer.line(1, "BoxCollider 0");
        writer.blank();
        assert_eq!(writer.finish(), "components 1\n  BoxCollider 0\n\n");
    }
}
