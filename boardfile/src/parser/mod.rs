//! Board file readers and format routing.
//!
//! Two grammars are understood: the line-oriented legacy board format and
//! the S-expression board and footprint formats. [`read_document`] picks the
//! reader from the first significant token.

pub mod context;
pub mod legacy;
pub mod lines;
pub mod pcb;
pub mod sexp;
pub mod values;

use serde::Serialize;
use std::path::Path;

use crate::board::footprint::Footprint;
use crate::board::Board;
use crate::error::{BoardError, SourceLocation, Warning};
use crate::options::LoadPolicy;

use self::legacy::LegacyParser;
use self::pcb::PcbParser;

/// Grammar of a board or footprint file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FileFormat {
    /// `PCBNEW-BOARD` line format.
    LegacyBoard,
    /// `(kicad_pcb ...)`.
    Board,
    /// `(footprint ...)` or the older `(module ...)`.
    Footprint,
}

impl FileFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            FileFormat::LegacyBoard => "legacy board",
            FileFormat::Board => "board",
            FileFormat::Footprint => "footprint",
        }
    }
}

/// Identify the grammar from the first significant line or token.
pub fn detect_format(text: &str) -> Option<FileFormat> {
    let text = text.trim_start_matches('\u{feff}').trim_start();
    if text.starts_with("PCBNEW-BOARD") {
        return Some(FileFormat::LegacyBoard);
    }
    let rest = text.strip_prefix('(')?.trim_start();
    let keyword: String = rest
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric() || *c == '_')
        .collect();
    match keyword.as_str() {
        "kicad_pcb" => Some(FileFormat::Board),
        "footprint" | "module" => Some(FileFormat::Footprint),
        _ => None,
    }
}

/// What a file turned out to hold.
#[derive(Debug, Clone)]
pub enum Document {
    Board(Board),
    Footprint(Footprint),
}

/// A loaded value together with the grammar it came from and every
/// recoverable problem met on the way.
#[derive(Debug, Clone)]
pub struct Loaded<T> {
    pub value: T,
    pub format: FileFormat,
    pub warnings: Vec<Warning>,
}

impl<T> Loaded<T> {
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Loaded<U> {
        Loaded {
            value: f(self.value),
            format: self.format,
            warnings: self.warnings,
        }
    }
}

/// Read a board or footprint from `text`. `source` names the input in
/// diagnostics.
pub fn read_document(
    text: &str,
    source: &str,
    policy: &mut dyn LoadPolicy,
) -> Result<Loaded<Document>, BoardError> {
    let format = detect_format(text).ok_or(BoardError::UnknownFormat)?;
    tracing::debug!(source, format = format.as_str(), "reading");

    let (value, warnings) = match format {
        FileFormat::LegacyBoard => {
            let (board, warnings) = LegacyParser::new(text, source, policy).parse()?;
            (Document::Board(board), warnings)
        }
        FileFormat::Board => {
            let root = parse_tree(text, source)?;
            let (board, warnings) = PcbParser::new(text, source, policy).parse_board(&root)?;
            (Document::Board(board), warnings)
        }
        FileFormat::Footprint => {
            let root = parse_tree(text, source)?;
            let (footprint, warnings) =
                PcbParser::new(text, source, policy).parse_footprint_file(&root)?;
            (Document::Footprint(footprint), warnings)
        }
    };
    tracing::debug!(source, warnings = warnings.len(), "read complete");
    Ok(Loaded {
        value,
        format,
        warnings,
    })
}

/// Load a board in either grammar from disk.
pub fn load_board(
    path: impl AsRef<Path>,
    policy: &mut dyn LoadPolicy,
) -> Result<Loaded<Board>, BoardError> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)?;
    load_board_str(&text, &path.display().to_string(), policy)
}

/// Load a board from text. A footprint file is rejected.
pub fn load_board_str(
    text: &str,
    source: &str,
    policy: &mut dyn LoadPolicy,
) -> Result<Loaded<Board>, BoardError> {
    let loaded = read_document(text, source, policy)?;
    match loaded.value {
        Document::Board(board) => Ok(Loaded {
            value: board,
            format: loaded.format,
            warnings: loaded.warnings,
        }),
        Document::Footprint(_) => Err(BoardError::syntax(
            SourceLocation::new(source, 1, 0),
            "expected a board, found a footprint",
        )),
    }
}

/// Load a standalone S-expression footprint from text.
pub fn load_footprint_str(
    text: &str,
    source: &str,
    policy: &mut dyn LoadPolicy,
) -> Result<Loaded<Footprint>, BoardError> {
    let loaded = read_document(text, source, policy)?;
    match loaded.value {
        Document::Footprint(footprint) => Ok(Loaded {
            value: footprint,
            format: loaded.format,
            warnings: loaded.warnings,
        }),
        Document::Board(_) => Err(BoardError::syntax(
            SourceLocation::new(source, 1, 0),
            "expected a footprint, found a board",
        )),
    }
}

fn parse_tree(text: &str, source: &str) -> Result<sexp::SExp, BoardError> {
    sexp::parse(text).map_err(|err| {
        let at = err.position();
        BoardError::syntax(
            SourceLocation::new(source, at.line, at.line_offset()),
            err.to_string(),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::LoadOptions;

    #[test]
    fn test_detect_format() {
        assert_eq!(
            detect_format("PCBNEW-BOARD Version 1 date 01/01/2020\n"),
            Some(FileFormat::LegacyBoard)
        );
        assert_eq!(detect_format("\n  (kicad_pcb (version 1))"), Some(FileFormat::Board));
        assert_eq!(detect_format("(footprint \"R\")"), Some(FileFormat::Footprint));
        assert_eq!(detect_format("( module R)"), Some(FileFormat::Footprint));
        assert_eq!(detect_format("(kicad_sch (version 1))"), None);
        assert_eq!(detect_format("EESchema Schematic File Version 4"), None);
        assert_eq!(detect_format(""), None);
    }

    #[test]
    fn test_unknown_format() {
        let err = read_document("hello", "x.txt", &mut LoadOptions::default()).unwrap_err();
        assert!(matches!(err, BoardError::UnknownFormat));
    }

    #[test]
    fn test_tokenizer_error_has_location() {
        let err = load_board_str(
            "(kicad_pcb\n (version 20211014)\n (net 0 \"x",
            "bad.kicad_pcb",
            &mut LoadOptions::default(),
        )
        .unwrap_err();
        let location = err.location().unwrap();
        assert_eq!(location.source, "bad.kicad_pcb");
        assert_eq!(location.line, 3);
    }

    #[test]
    fn test_footprint_is_not_a_board() {
        let text = "(footprint \"R\" (layer \"F.Cu\"))";
        assert!(load_board_str(text, "r.kicad_mod", &mut LoadOptions::default()).is_err());
        let loaded = load_footprint_str(text, "r.kicad_mod", &mut LoadOptions::default()).unwrap();
        assert_eq!(loaded.format, FileFormat::Footprint);
        assert_eq!(loaded.value.lib_id, "R");
    }
}
