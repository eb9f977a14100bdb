//! Strict number parsers shared by both grammars.
//!
//! Every parser takes a [`Site`] describing where the text came from; the
//! location is only materialized when parsing fails.

use crate::error::{BoardError, SourceLocation};
use crate::geometry::round_angle;
use crate::units::{clamp_biu, Biu};

/// Where a value was read from.
#[derive(Debug, Clone, Copy)]
pub struct Site<'a> {
    pub source: &'a str,
    pub line: usize,
    pub offset: usize,
}

impl<'a> Site<'a> {
    pub fn new(source: &'a str, line: usize, offset: usize) -> Self {
        Self {
            source,
            line,
            offset,
        }
    }

    pub fn location(&self) -> SourceLocation {
        SourceLocation::new(self.source, self.line, self.offset)
    }

    pub fn error(&self, message: impl Into<String>) -> BoardError {
        BoardError::syntax(self.location(), message)
    }
}

fn require<'t>(text: &'t str, what: &str, site: Site<'_>) -> Result<&'t str, BoardError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(site.error(format!("missing {what}")));
    }
    Ok(text)
}

pub fn parse_int(text: &str, site: Site<'_>) -> Result<i64, BoardError> {
    let text = require(text, "integer", site)?;
    text.strip_prefix('+')
        .unwrap_or(text)
        .parse::<i64>()
        .map_err(|_| site.error(format!("invalid integer '{text}'")))
}

/// Hex integer with or without a `0x` prefix.
pub fn parse_hex(text: &str, site: Site<'_>) -> Result<u64, BoardError> {
    let text = require(text, "hex number", site)?;
    let digits = text
        .strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
        .unwrap_or(text);
    u64::from_str_radix(digits, 16).map_err(|_| site.error(format!("invalid hex number '{text}'")))
}

pub fn parse_double(text: &str, site: Site<'_>) -> Result<f64, BoardError> {
    let text = require(text, "number", site)?;
    let value: f64 = text
        .parse()
        .map_err(|_| site.error(format!("invalid number '{text}'")))?;
    if !value.is_finite() {
        return Err(site.error(format!("number '{text}' is not finite")));
    }
    Ok(value)
}

/// Length in file units, scaled to board units, rounded and clamped.
pub fn parse_board_units(text: &str, scale: f64, site: Site<'_>) -> Result<Biu, BoardError> {
    let value = parse_double(text, site)? * scale;
    if !value.is_finite() {
        return Err(site.error(format!("length '{}' is out of range", text.trim())));
    }
    Ok(clamp_biu(value))
}

/// Angle in file units (tenths of a degree for legacy files, degrees for
/// modern ones), returned in degrees.
pub fn parse_angle(text: &str, scale: f64, site: Site<'_>) -> Result<f64, BoardError> {
    Ok(round_angle(parse_double(text, site)? * scale))
}

pub fn parse_bool_yes_no(text: &str, site: Site<'_>) -> Result<bool, BoardError> {
    match require(text, "yes/no", site)? {
        "yes" | "true" => Ok(true),
        "no" | "false" => Ok(false),
        other => Err(site.error(format!("expected yes or no, found '{other}'"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn site() -> Site<'static> {
        Site::new("test.brd", 7, 3)
    }

    #[test]
    fn test_parse_int() {
        assert_eq!(parse_int("42", site()).unwrap(), 42);
        assert_eq!(parse_int("-3", site()).unwrap(), -3);
        assert_eq!(parse_int("+5", site()).unwrap(), 5);
        assert!(parse_int("4x", site()).is_err());
    }

    #[test]
    fn test_missing_value_reports_location() {
        let err = parse_int("", site()).unwrap_err();
        assert_eq!(err.to_string(), "test.brd:7:3: missing integer");
    }

    #[test]
    fn test_parse_hex() {
        assert_eq!(parse_hex("00E0FFFF", site()).unwrap(), 0x00E0_FFFF);
        assert_eq!(parse_hex("0x1F", site()).unwrap(), 0x1F);
        assert!(parse_hex("XYZ", site()).is_err());
    }

    #[test]
    fn test_parse_double_rejects_non_finite() {
        assert_eq!(parse_double("1.5", site()).unwrap(), 1.5);
        assert!(parse_double("inf", site()).is_err());
        assert!(parse_double("NaN", site()).is_err());
        assert!(parse_double("1e400", site()).is_err());
    }

    #[test]
    fn test_board_units_scaled_and_clamped() {
        assert_eq!(parse_board_units("100", 2540.0, site()).unwrap(), 254_000);
        assert_eq!(parse_board_units("1.27", 1e6, site()).unwrap(), 1_270_000);
        assert_eq!(
            parse_board_units("1e9", 1e6, site()).unwrap(),
            crate::units::MAX_BIU
        );
    }

    #[test]
    fn test_angles() {
        assert_eq!(parse_angle("900", 0.1, site()).unwrap(), 90.0);
        assert_eq!(parse_angle("45.00001", 1.0, site()).unwrap(), 45.0);
    }
}
