//! S-expression tokenizer and tree builder.
//!
//! Numbers are kept as symbol text; converting them is the job of
//! [`crate::parser::values`]. Every node remembers where it started so that
//! later semantic errors can point back into the file.

use std::fmt;
use thiserror::Error;

/// Start of a node in the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Position {
    /// 1-based line.
    pub line: usize,
    /// 1-based column, counted in characters.
    pub column: usize,
    /// 0-based byte offset from the start of the input.
    pub offset: usize,
}

impl Position {
    /// 0-based character offset within the line, as used in
    /// [`SourceLocation`](crate::error::SourceLocation).
    pub fn line_offset(&self) -> usize {
        self.column.saturating_sub(1)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("unexpected end of input at {0}")]
    UnexpectedEof(Position),
    #[error("list opened at {0} is never closed")]
    UnclosedList(Position),
    #[error("string starting at {0} is never terminated")]
    UnterminatedString(Position),
    #[error("unexpected '{token}' at {position}")]
    UnexpectedToken { position: Position, token: String },
    #[error("unexpected data after the root list at {0}")]
    TrailingInput(Position),
}

impl ParseError {
    pub fn position(&self) -> Position {
        match self {
            ParseError::UnexpectedEof(p)
            | ParseError::UnclosedList(p)
            | ParseError::UnterminatedString(p)
            | ParseError::TrailingInput(p) => *p,
            ParseError::UnexpectedToken { position, .. } => *position,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SExpKind {
    /// Bare token: keyword, number or unquoted name.
    Symbol(String),
    /// Quoted string with escapes resolved.
    Str(String),
    List(Vec<SExp>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SExp {
    pub kind: SExpKind,
    pub pos: Position,
}

impl SExp {
    pub fn symbol(text: impl Into<String>) -> Self {
        Self {
            kind: SExpKind::Symbol(text.into()),
            pos: Position::default(),
        }
    }

    pub fn string(text: impl Into<String>) -> Self {
        Self {
            kind: SExpKind::Str(text.into()),
            pos: Position::default(),
        }
    }

    pub fn list(items: Vec<SExp>) -> Self {
        Self {
            kind: SExpKind::List(items),
            pos: Position::default(),
        }
    }

    /// Text of a symbol or string.
    pub fn as_atom(&self) -> Option<&str> {
        match &self.kind {
            SExpKind::Symbol(s) | SExpKind::Str(s) => Some(s),
            SExpKind::List(_) => None,
        }
    }

    pub fn as_symbol(&self) -> Option<&str> {
        match &self.kind {
            SExpKind::Symbol(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[SExp]> {
        match &self.kind {
            SExpKind::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn is_list(&self) -> bool {
        matches!(self.kind, SExpKind::List(_))
    }

    /// Keyword of a list: its first element when that is a symbol.
    pub fn head(&self) -> Option<&str> {
        self.as_list()?.first()?.as_symbol()
    }

    /// Elements of a list after the keyword.
    pub fn args(&self) -> &[SExp] {
        match self.as_list() {
            Some(items) if !items.is_empty() => &items[1..],
            _ => &[],
        }
    }

    /// First child list whose keyword is `key`.
    pub fn get(&self, key: &str) -> Option<&SExp> {
        self.args().iter().find(|item| item.head() == Some(key))
    }

    /// All child lists whose keyword is `key`.
    pub fn get_all<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a SExp> + 'a {
        self.args().iter().filter(move |item| item.head() == Some(key))
    }

    /// First argument of the child list `key`, as text.
    pub fn get_atom(&self, key: &str) -> Option<&str> {
        self.get(key)?.args().first()?.as_atom()
    }

    /// True when a bare symbol `flag` appears among the arguments.
    pub fn has_flag(&self, flag: &str) -> bool {
        self.args().iter().any(|item| item.as_symbol() == Some(flag))
    }
}

fn needs_quotes(s: &str) -> bool {
    s.is_empty()
        || s.chars()
            .any(|c| c.is_whitespace() || matches!(c, '(' | ')' | '"' | '\\' | ';'))
}

/// Quote a string the way the tokenizer reads it back.
pub fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            _ => out.push(c),
        }
    }
    out.push('"');
    out
}

impl fmt::Display for SExp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            SExpKind::Symbol(s) if !needs_quotes(s) => f.write_str(s),
            SExpKind::Symbol(s) | SExpKind::Str(s) => f.write_str(&quote(s)),
            SExpKind::List(items) => {
                f.write_str("(")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str(")")
            }
        }
    }
}

pub struct SExpParser<'a> {
    input: &'a [u8],
    pos: usize,
    line: usize,
    column: usize,
}

impl<'a> SExpParser<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            input: input.as_bytes(),
            pos: 0,
            line: 1,
            column: 1,
        }
    }

    /// Parse exactly one root expression. Anything but whitespace and
    /// comments after it is an error.
    pub fn parse(&mut self) -> Result<SExp, ParseError> {
        self.skip_whitespace();
        if self.is_eof() {
            return Err(ParseError::UnexpectedEof(self.position()));
        }
        let root = self.parse_sexp()?;
        self.skip_whitespace();
        if !self.is_eof() {
            return Err(ParseError::TrailingInput(self.position()));
        }
        tracing::trace!(lines = self.line, "s-expression tree built");
        Ok(root)
    }

    fn position(&self) -> Position {
        Position {
            line: self.line,
            column: self.column,
            offset: self.pos,
        }
    }

    fn parse_sexp(&mut self) -> Result<SExp, ParseError> {
        self.skip_whitespace();
        match self.peek() {
            None => Err(ParseError::UnexpectedEof(self.position())),
            Some(b'(') => self.parse_list(),
            Some(b')') => Err(ParseError::UnexpectedToken {
                position: self.position(),
                token: ")".to_string(),
            }),
            Some(b'"') => self.parse_string(),
            Some(_) => self.parse_symbol(),
        }
    }

    fn parse_list(&mut self) -> Result<SExp, ParseError> {
        let start = self.position();
        self.advance();
        let mut items = Vec::new();
        loop {
            self.skip_whitespace();
            match self.peek() {
                None => return Err(ParseError::UnclosedList(start)),
                Some(b')') => {
                    self.advance();
                    break;
                }
                Some(_) => items.push(self.parse_sexp()?),
            }
        }
        Ok(SExp {
            kind: SExpKind::List(items),
            pos: start,
        })
    }

    fn parse_string(&mut self) -> Result<SExp, ParseError> {
        let start = self.position();
        self.advance();
        let mut bytes = Vec::new();
        loop {
            match self.peek() {
                None => return Err(ParseError::UnterminatedString(start)),
                Some(b'"') => {
                    self.advance();
                    break;
                }
                Some(b'\\') => {
                    self.advance();
                    let Some(escaped) = self.peek() else {
                        return Err(ParseError::UnterminatedString(start));
                    };
                    bytes.push(match escaped {
                        b'n' => b'\n',
                        b't' => b'\t',
                        b'r' => b'\r',
                        other => other,
                    });
                    self.advance();
                }
                Some(b) => {
                    bytes.push(b);
                    self.advance();
                }
            }
        }
        Ok(SExp {
            kind: SExpKind::Str(String::from_utf8_lossy(&bytes).into_owned()),
            pos: start,
        })
    }

    fn parse_symbol(&mut self) -> Result<SExp, ParseError> {
        let start = self.position();
        let begin = self.pos;
        while let Some(b) = self.peek() {
            if b.is_ascii_whitespace() || matches!(b, b'(' | b')' | b'"') {
                break;
            }
            self.advance();
        }
        let text = String::from_utf8_lossy(&self.input[begin..self.pos]).into_owned();
        Ok(SExp {
            kind: SExpKind::Symbol(text),
            pos: start,
        })
    }

    fn skip_whitespace(&mut self) {
        while let Some(b) = self.peek() {
            if b.is_ascii_whitespace() {
                self.advance();
            } else if b == b';' {
                while let Some(c) = self.peek() {
                    if c == b'\n' {
                        break;
                    }
                    self.advance();
                }
            } else {
                break;
            }
        }
    }

    fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    fn advance(&mut self) {
        if let Some(b) = self.peek() {
            self.pos += 1;
            if b == b'\n' {
                self.line += 1;
                self.column = 1;
            } else if b & 0xC0 != 0x80 {
                self.column += 1;
            }
        }
    }

    fn is_eof(&self) -> bool {
        self.pos >= self.input.len()
    }
}

/// Parse a whole document.
pub fn parse(input: &str) -> Result<SExp, ParseError> {
    SExpParser::new(input).parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_symbol_and_string() {
        let sexp = parse("(net 1 \"GND\")").unwrap();
        assert_eq!(sexp.head(), Some("net"));
        assert_eq!(sexp.args()[0].as_symbol(), Some("1"));
        assert_eq!(sexp.args()[1].kind, SExpKind::Str("GND".to_string()));
    }

    #[test]
    fn test_parse_escapes() {
        let sexp = parse(r#"(descr "a \"quoted\" \\ line\nnext")"#).unwrap();
        assert_eq!(sexp.args()[0].as_atom(), Some("a \"quoted\" \\ line\nnext"));
    }

    #[test]
    fn test_parse_nested_positions() {
        let sexp = parse("(kicad_pcb\n  (version 20211014)\n)").unwrap();
        let version = sexp.get("version").unwrap();
        assert_eq!(version.pos.line, 2);
        assert_eq!(version.pos.column, 3);
        assert_eq!(version.pos.offset, 13);
        assert_eq!(sexp.get_atom("version"), Some("20211014"));
    }

    #[test]
    fn test_comments_and_hash() {
        let sexp = parse("; header\n(a #b) ; trailing").unwrap();
        assert_eq!(sexp.args()[0].as_symbol(), Some("#b"));
    }

    #[test]
    fn test_unclosed_list() {
        let err = parse("(a (b c)").unwrap_err();
        assert_eq!(err, ParseError::UnclosedList(Position { line: 1, column: 1, offset: 0 }));
    }

    #[test]
    fn test_unterminated_string() {
        let err = parse("(a \"b)").unwrap_err();
        assert!(matches!(err, ParseError::UnterminatedString(p) if p.offset == 3));
    }

    #[test]
    fn test_trailing_input() {
        let err = parse("(a) (b)").unwrap_err();
        assert!(matches!(err, ParseError::TrailingInput(p) if p.column == 5));
    }

    #[test]
    fn test_flags_and_get_all() {
        let sexp = parse("(via blind locked (net 1) (net 2))").unwrap();
        assert!(sexp.has_flag("blind"));
        assert!(!sexp.has_flag("micro"));
        assert_eq!(sexp.get_all("net").count(), 2);
    }

    #[test]
    fn test_display_round_trip() {
        let text = "(gr_text \"a b\" (at 1 2) (layer F.Cu))";
        assert_eq!(parse(text).unwrap().to_string(), text);
    }
}
