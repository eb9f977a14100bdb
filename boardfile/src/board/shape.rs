//! Graphic shapes, board level and footprint level.

use serde::{Deserialize, Serialize};

use crate::geometry::Point;
use crate::kiid::Kiid;
use crate::layers::PcbLayerId;
use crate::units::Biu;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ShapeKind {
    Segment { start: Point, end: Point },
    Rect { start: Point, end: Point },
    Arc { start: Point, mid: Point, end: Point },
    Circle { center: Point, end: Point },
    Polygon { points: Vec<Point> },
    Curve { start: Point, control1: Point, control2: Point, end: Point },
}

impl ShapeKind {
    /// Apply `f` to every defining point.
    pub fn map_points(&self, f: impl Fn(Point) -> Point) -> ShapeKind {
        match self {
            ShapeKind::Segment { start, end } => ShapeKind::Segment {
                start: f(*start),
                end: f(*end),
            },
            ShapeKind::Rect { start, end } => ShapeKind::Rect {
                start: f(*start),
                end: f(*end),
            },
            ShapeKind::Arc { start, mid, end } => ShapeKind::Arc {
                start: f(*start),
                mid: f(*mid),
                end: f(*end),
            },
            ShapeKind::Circle { center, end } => ShapeKind::Circle {
                center: f(*center),
                end: f(*end),
            },
            ShapeKind::Polygon { points } => ShapeKind::Polygon {
                points: points.iter().map(|p| f(*p)).collect(),
            },
            ShapeKind::Curve {
                start,
                control1,
                control2,
                end,
            } => ShapeKind::Curve {
                start: f(*start),
                control1: f(*control1),
                control2: f(*control2),
                end: f(*end),
            },
        }
    }

    /// Keyword suffix used by the modern grammar (`gr_line`, `fp_arc`, ...).
    pub fn keyword(&self) -> &'static str {
        match self {
            ShapeKind::Segment { .. } => "line",
            ShapeKind::Rect { .. } => "rect",
            ShapeKind::Arc { .. } => "arc",
            ShapeKind::Circle { .. } => "circle",
            ShapeKind::Polygon { .. } => "poly",
            ShapeKind::Curve { .. } => "curve",
        }
    }

    pub fn can_fill(&self) -> bool {
        matches!(
            self,
            ShapeKind::Rect { .. } | ShapeKind::Circle { .. } | ShapeKind::Polygon { .. }
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineStyle {
    #[default]
    Default,
    Solid,
    Dash,
    Dot,
    DashDot,
}

impl LineStyle {
    pub fn parse(text: &str) -> Option<Self> {
        match text {
            "default" => Some(LineStyle::Default),
            "solid" => Some(LineStyle::Solid),
            "dash" => Some(LineStyle::Dash),
            "dot" => Some(LineStyle::Dot),
            "dash_dot" => Some(LineStyle::DashDot),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            LineStyle::Default => "default",
            LineStyle::Solid => "solid",
            LineStyle::Dash => "dash",
            LineStyle::Dot => "dot",
            LineStyle::DashDot => "dash_dot",
        }
    }
}

/// A drawn shape. For footprint shapes the geometry is in board coordinates
/// and [`FootprintShape::local`] keeps the footprint-relative copy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shape {
    pub id: Kiid,
    pub kind: ShapeKind,
    pub layer: PcbLayerId,
    pub width: Biu,
    pub style: LineStyle,
    pub filled: bool,
    pub locked: bool,
}

impl Shape {
    pub fn new(kind: ShapeKind, layer: PcbLayerId, width: Biu) -> Self {
        Self {
            id: Kiid::new(),
            kind,
            layer,
            width,
            style: LineStyle::Default,
            filled: false,
            locked: false,
        }
    }
}

/// A shape owned by a footprint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FootprintShape {
    pub shape: Shape,
    pub local: ShapeKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetShape {
    Plus,
    X,
}

/// Alignment target used by board fabrication.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Target {
    pub id: Kiid,
    pub shape: TargetShape,
    pub position: Point,
    pub size: Biu,
    pub width: Biu,
    pub layer: PcbLayerId,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_points_moves_every_point() {
        let kind = ShapeKind::Curve {
            start: Point::new(0, 0),
            control1: Point::new(1, 0),
            control2: Point::new(2, 0),
            end: Point::new(3, 0),
        };
        let moved = kind.map_points(|p| p + Point::new(10, 5));
        assert_eq!(
            moved,
            ShapeKind::Curve {
                start: Point::new(10, 5),
                control1: Point::new(11, 5),
                control2: Point::new(12, 5),
                end: Point::new(13, 5),
            }
        );
    }

    #[test]
    fn test_keywords() {
        let seg = ShapeKind::Segment {
            start: Point::default(),
            end: Point::default(),
        };
        assert_eq!(seg.keyword(), "line");
        assert!(!seg.can_fill());
        assert!(ShapeKind::Polygon { points: vec![] }.can_fill());
    }
}
