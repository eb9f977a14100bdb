//! Line reader and field tokenizer for the legacy line-record format.
//!
//! The input buffer is never modified: fields are slices of the line (or an
//! owned copy when a quoted field contains escapes) together with their
//! byte offset, which ends up in error locations.

use std::borrow::Cow;

/// One significant line of input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Line<'a> {
    /// 1-based line number in the file.
    pub number: usize,
    pub text: &'a str,
}

impl<'a> Line<'a> {
    /// First whitespace separated token.
    pub fn keyword(&self) -> &'a str {
        self.text.split_whitespace().next().unwrap_or("")
    }

    /// Case-insensitive keyword test. The keyword must be followed by
    /// whitespace or the end of the line.
    pub fn is(&self, keyword: &str) -> bool {
        let text = self.text.trim_start();
        text.len() >= keyword.len()
            && text.is_char_boundary(keyword.len())
            && text[..keyword.len()].eq_ignore_ascii_case(keyword)
            && text[keyword.len()..]
                .chars()
                .next()
                .map_or(true, char::is_whitespace)
    }

    /// Case-insensitive prefix test without the word boundary check.
    pub fn starts_with(&self, prefix: &str) -> bool {
        let text = self.text.trim_start();
        text.len() >= prefix.len()
            && text.is_char_boundary(prefix.len())
            && text[..prefix.len()].eq_ignore_ascii_case(prefix)
    }

    /// All fields of the line, keyword included.
    pub fn fields(&self) -> Fields<'a> {
        Fields::new(self.text)
    }

    /// Fields after the keyword.
    pub fn args(&self) -> Fields<'a> {
        let mut fields = self.fields();
        fields.next();
        fields
    }

    /// Raw text after the keyword, with surrounding whitespace trimmed.
    pub fn rest(&self) -> &'a str {
        let text = self.text.trim_start();
        let keyword = self.keyword();
        text[keyword.len()..].trim()
    }
}

/// A token of a legacy line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field<'a> {
    pub text: Cow<'a, str>,
    /// Byte offset of the token within its line.
    pub offset: usize,
    pub quoted: bool,
}

impl Field<'_> {
    pub fn as_str(&self) -> &str {
        &self.text
    }
}

/// Non-destructive tokenizer over one line: whitespace separated fields and
/// `"quoted"` fields with `\"` and `\\` escapes.
#[derive(Debug, Clone)]
pub struct Fields<'a> {
    line: &'a str,
    pos: usize,
}

impl<'a> Fields<'a> {
    pub fn new(line: &'a str) -> Self {
        Self { line, pos: 0 }
    }

    /// Offset where the next field would start, or the line length.
    pub fn offset(&self) -> usize {
        let rest = &self.line[self.pos..];
        self.pos + (rest.len() - rest.trim_start().len())
    }

    /// Remaining raw text.
    pub fn remainder(&self) -> &'a str {
        self.line[self.pos..].trim()
    }
}

impl<'a> Iterator for Fields<'a> {
    type Item = Field<'a>;

    fn next(&mut self) -> Option<Field<'a>> {
        let start = self.offset();
        let bytes = self.line.as_bytes();
        if start >= bytes.len() {
            self.pos = bytes.len();
            return None;
        }
        if bytes[start] != b'"' {
            let end = self.line[start..]
                .find(char::is_whitespace)
                .map_or(self.line.len(), |i| start + i);
            self.pos = end;
            return Some(Field {
                text: Cow::Borrowed(&self.line[start..end]),
                offset: start,
                quoted: false,
            });
        }

        let body = start + 1;
        let mut i = body;
        let mut escaped = false;
        while i < bytes.len() {
            match bytes[i] {
                b'\\' if i + 1 < bytes.len() && matches!(bytes[i + 1], b'"' | b'\\') => {
                    escaped = true;
                    i += 2;
                }
                b'"' => break,
                _ => i += 1,
            }
        }
        // An unterminated quote runs to the end of the line.
        let end = i.min(bytes.len());
        self.pos = (end + 1).min(bytes.len());
        let raw = &self.line[body..end];
        let text = if escaped {
            let mut out = String::with_capacity(raw.len());
            let mut chars = raw.chars().peekable();
            while let Some(c) = chars.next() {
                if c == '\\' && matches!(chars.peek(), Some('"') | Some('\\')) {
                    if let Some(next) = chars.next() {
                        out.push(next);
                    }
                } else {
                    out.push(c);
                }
            }
            Cow::Owned(out)
        } else {
            Cow::Borrowed(raw)
        };
        Some(Field {
            text,
            offset: start,
            quoted: true,
        })
    }
}

/// Reads significant lines: blank lines and `#` comment lines are skipped.
#[derive(Debug, Clone)]
pub struct LineReader<'a> {
    lines: Vec<&'a str>,
    next: usize,
    current: usize,
}

impl<'a> LineReader<'a> {
    pub fn new(text: &'a str) -> Self {
        Self {
            lines: text.lines().collect(),
            next: 0,
            current: 0,
        }
    }

    /// Number of the most recently returned line, 0 before the first.
    pub fn line_number(&self) -> usize {
        self.current
    }

    pub fn total_lines(&self) -> usize {
        self.lines.len()
    }

    pub fn next_line(&mut self) -> Option<Line<'a>> {
        while self.next < self.lines.len() {
            let text = self.lines[self.next].trim_end_matches('\r');
            self.next += 1;
            let trimmed = text.trim_start();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            self.current = self.next;
            return Some(Line {
                number: self.current,
                text,
            });
        }
        self.current = self.lines.len();
        None
    }
}
