//! Error and warning types shared by both board grammars.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Where in the input a problem was found.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceLocation {
    pub source: String,
    /// 1-based line number.
    pub line: usize,
    /// 0-based character offset within the line.
    pub offset: usize,
}

impl SourceLocation {
    pub fn new(source: impl Into<String>, line: usize, offset: usize) -> Self {
        Self {
            source: source.into(),
            line,
            offset,
        }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.source, self.line, self.offset)
    }
}

/// Fatal load/save errors. A load that returns one of these never hands out
/// a partially built board.
#[derive(Debug, thiserror::Error)]
pub enum BoardError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{location}: {message}")]
    Syntax {
        location: SourceLocation,
        message: String,
    },

    #[error(
        "file format version {found} is newer than the supported version {supported}; \
         a newer reader is required"
    )]
    Version { found: u32, supported: u32 },

    #[error("{location}: duplicate {kind} name '{name}'")]
    DuplicateName {
        kind: &'static str,
        name: String,
        location: SourceLocation,
    },

    #[error("load cancelled: {reason}")]
    Cancelled { reason: String },

    #[error("group '{group}' is part of a group membership cycle")]
    GroupCycle { group: String },

    #[error("unrecognized board file format")]
    UnknownFormat,
}

impl BoardError {
    pub fn syntax(location: SourceLocation, message: impl Into<String>) -> Self {
        BoardError::Syntax {
            location,
            message: message.into(),
        }
    }

    pub fn cancelled(reason: impl Into<String>) -> Self {
        BoardError::Cancelled {
            reason: reason.into(),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, BoardError::Cancelled { .. })
    }

    /// Location of the failure, when the error is tied to the input text.
    pub fn location(&self) -> Option<&SourceLocation> {
        match self {
            BoardError::Syntax { location, .. } | BoardError::DuplicateName { location, .. } => {
                Some(location)
            }
            _ => None,
        }
    }
}

/// Category of a recoverable problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningKind {
    /// Net code and written net name disagree.
    NetMismatch,
    /// Net code not present in the net table.
    UnknownNet,
    /// Item dropped because it cannot exist on this board.
    DroppedItem,
    /// Item referenced a layer name that could not be resolved.
    UndefinedLayer,
    /// Obsolete construct converted or skipped.
    Deprecated,
    /// Two items share the same stable id.
    DuplicateId,
    /// A value was out of range and replaced.
    Adjusted,
}

/// A recoverable per-item problem. The load continues.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Warning {
    pub kind: WarningKind,
    pub location: Option<SourceLocation>,
    pub message: String,
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.location {
            Some(location) => write!(f, "{}: {}", location, self.message),
            None => f.write_str(&self.message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_syntax_error_display_carries_location() {
        let err = BoardError::syntax(SourceLocation::new("demo.brd", 12, 4), "bad number");
        assert_eq!(err.to_string(), "demo.brd:12:4: bad number");
        assert_eq!(err.location().map(|l| l.line), Some(12));
    }

    #[test]
    fn test_version_error_mentions_both_versions() {
        let err = BoardError::Version {
            found: 99999999,
            supported: 20211014,
        };
        let text = err.to_string();
        assert!(text.contains("99999999"));
        assert!(text.contains("20211014"));
    }

    #[test]
    fn test_cancelled_is_distinct() {
        assert!(BoardError::cancelled("user declined").is_cancelled());
        assert!(!BoardError::UnknownFormat.is_cancelled());
    }
}
