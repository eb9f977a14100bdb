//! Board and footprint text.

use serde::{Deserialize, Serialize};

use crate::geometry::{Point, Size};
use crate::kiid::Kiid;
use crate::layers::PcbLayerId;
use crate::units::{mm_to_biu, Biu};

/// Size given to text whose font record has no size.
pub const DEFAULT_TEXT_SIZE: Biu = 1_524_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HorizontalJustify {
    Left,
    #[default]
    Center,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerticalJustify {
    Top,
    #[default]
    Center,
    Bottom,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextEffects {
    pub size: Size,
    pub thickness: Biu,
    pub bold: bool,
    pub italic: bool,
    pub horizontal: HorizontalJustify,
    pub vertical: VerticalJustify,
    pub mirrored: bool,
    pub hidden: bool,
}

impl Default for TextEffects {
    fn default() -> Self {
        Self {
            size: Size::square(DEFAULT_TEXT_SIZE),
            thickness: mm_to_biu(0.15),
            bold: false,
            italic: false,
            horizontal: HorizontalJustify::Center,
            vertical: VerticalJustify::Center,
            mirrored: false,
            hidden: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoardText {
    pub id: Kiid,
    pub text: String,
    pub position: Point,
    pub angle: f64,
    pub layer: PcbLayerId,
    pub effects: TextEffects,
    pub knockout: bool,
    pub locked: bool,
}

impl BoardText {
    pub fn new(text: impl Into<String>, layer: PcbLayerId) -> Self {
        Self {
            id: Kiid::new(),
            text: text.into(),
            position: Point::default(),
            angle: 0.0,
            layer,
            effects: TextEffects::default(),
            knockout: false,
            locked: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FootprintTextKind {
    Reference,
    Value,
    User,
}

impl FootprintTextKind {
    pub fn as_str(self) -> &'static str {
        match self {
            FootprintTextKind::Reference => "reference",
            FootprintTextKind::Value => "value",
            FootprintTextKind::User => "user",
        }
    }
}

/// Text owned by a footprint. `angle` is absolute, `local_angle` is relative
/// to the footprint orientation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FootprintText {
    pub id: Kiid,
    pub kind: FootprintTextKind,
    pub text: String,
    pub local_position: Point,
    pub position: Point,
    pub angle: f64,
    pub local_angle: f64,
    pub layer: PcbLayerId,
    pub effects: TextEffects,
    pub keep_upright: bool, // false when the file says "unlocked"
    pub locked: bool,
}

impl FootprintText {
    pub fn new(kind: FootprintTextKind, layer: PcbLayerId) -> Self {
        Self {
            id: Kiid::new(),
            kind,
            text: String::new(),
            local_position: Point::default(),
            position: Point::default(),
            angle: 0.0,
            local_angle: 0.0,
            layer,
            effects: TextEffects::default(),
            keep_upright: true,
            locked: false,
        }
    }
}

/// Convert the old `~text~` overbar notation to `~{text}`.
///
/// `~~` stays a literal tilde, and a space or closing bracket ends an open
/// overbar. Text that already uses the new notation is returned untouched.
pub fn convert_overbar_notation(old: &str) -> String {
    if old == "~" {
        return old.to_string();
    }
    let chars: Vec<char> = old.chars().collect();
    let mut out = String::with_capacity(old.len() + 4);
    let mut in_overbar = false;
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        if c == '~' {
            match chars.get(i + 1) {
                Some('~') => {
                    if chars.get(i + 2) == Some(&'{') {
                        out.push_str("~~{}");
                        i += 3;
                        continue;
                    }
                    out.push('~');
                    i += 2;
                    continue;
                }
                Some('{') => return old.to_string(),
                _ => {
                    out.push_str(if in_overbar { "}" } else { "~{" });
                    in_overbar = !in_overbar;
                    i += 1;
                    continue;
                }
            }
        }
        if in_overbar && matches!(c, ' ' | '}' | ')') {
            out.push('}');
            in_overbar = false;
        }
        out.push(c);
        i += 1;
    }
    if in_overbar {
        out.push('}');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overbar_pair() {
        assert_eq!(convert_overbar_notation("~RESET~"), "~{RESET}");
        assert_eq!(convert_overbar_notation("A~B~C"), "A~{B}C");
    }

    #[test]
    fn test_overbar_unterminated() {
        assert_eq!(convert_overbar_notation("~CS"), "~{CS}");
        assert_eq!(convert_overbar_notation("~CS EN"), "~{CS} EN");
    }

    #[test]
    fn test_overbar_literal_tilde() {
        assert_eq!(convert_overbar_notation("a~~b"), "a~b");
        assert_eq!(convert_overbar_notation("~"), "~");
    }

    #[test]
    fn test_overbar_already_converted() {
        assert_eq!(convert_overbar_notation("~{WR}"), "~{WR}");
        assert_eq!(convert_overbar_notation("plain"), "plain");
    }
}
