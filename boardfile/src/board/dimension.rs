//! Dimension annotations.

use serde::{Deserialize, Serialize};

use crate::geometry::Point;
use crate::kiid::Kiid;
use crate::layers::PcbLayerId;
use crate::units::{mm_to_biu, Biu};

use super::text::BoardText;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DimensionUnits {
    Inches,
    Mils,
    #[default]
    Millimetres,
    Automatic,
}

impl DimensionUnits {
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(DimensionUnits::Inches),
            1 => Some(DimensionUnits::Mils),
            2 => Some(DimensionUnits::Millimetres),
            3 => Some(DimensionUnits::Automatic),
            _ => None,
        }
    }

    pub fn code(self) -> i64 {
        match self {
            DimensionUnits::Inches => 0,
            DimensionUnits::Mils => 1,
            DimensionUnits::Millimetres => 2,
            DimensionUnits::Automatic => 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DimensionFormat {
    pub prefix: String,
    pub suffix: String,
    pub units: DimensionUnits,
    pub units_format: i64, // 0 no suffix, 1 bare suffix, 2 wrapped in parens
    pub precision: i64,
    pub override_value: Option<String>,
    pub suppress_zeroes: bool,
}

impl Default for DimensionFormat {
    fn default() -> Self {
        Self {
            prefix: String::new(),
            suffix: String::new(),
            units: DimensionUnits::Millimetres,
            units_format: 1,
            precision: 4,
            override_value: None,
            suppress_zeroes: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DimensionStyle {
    pub thickness: Biu,
    pub arrow_length: Biu,
    pub text_position_mode: i64, // 0 outside, 1 inline, 2 manual
    pub extension_height: Biu,
    pub extension_offset: Biu,
    pub keep_text_aligned: bool,
    pub text_frame: Option<i64>, // leader only
}

impl Default for DimensionStyle {
    fn default() -> Self {
        Self {
            thickness: mm_to_biu(0.15),
            arrow_length: mm_to_biu(1.27),
            text_position_mode: 0,
            extension_height: mm_to_biu(0.58642),
            extension_offset: 0,
            keep_text_aligned: true,
            text_frame: None,
        }
    }
}

/// Fields every dimension kind carries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DimensionCommon {
    pub id: Kiid,
    pub layer: PcbLayerId,
    pub start: Point,
    pub end: Point,
    pub text: BoardText,
    pub format: DimensionFormat,
    pub style: DimensionStyle,
    pub locked: bool,
}

impl DimensionCommon {
    pub fn new(layer: PcbLayerId) -> Self {
        Self {
            id: Kiid::new(),
            layer,
            start: Point::default(),
            end: Point::default(),
            text: BoardText::new("", layer),
            format: DimensionFormat::default(),
            style: DimensionStyle::default(),
            locked: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrthogonalAxis {
    #[default]
    Horizontal,
    Vertical,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Dimension {
    Aligned {
        common: DimensionCommon,
        height: Biu,
    },
    Orthogonal {
        common: DimensionCommon,
        height: Biu,
        axis: OrthogonalAxis,
    },
    Leader {
        common: DimensionCommon,
    },
    Center {
        common: DimensionCommon,
    },
}

impl Dimension {
    pub fn common(&self) -> &DimensionCommon {
        match self {
            Dimension::Aligned { common, .. }
            | Dimension::Orthogonal { common, .. }
            | Dimension::Leader { common }
            | Dimension::Center { common } => common,
        }
    }

    pub fn common_mut(&mut self) -> &mut DimensionCommon {
        match self {
            Dimension::Aligned { common, .. }
            | Dimension::Orthogonal { common, .. }
            | Dimension::Leader { common }
            | Dimension::Center { common } => common,
        }
    }

    pub fn id(&self) -> Kiid {
        self.common().id
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Dimension::Aligned { .. } => "aligned",
            Dimension::Orthogonal { .. } => "orthogonal",
            Dimension::Leader { .. } => "leader",
            Dimension::Center { .. } => "center",
        }
    }

    /// Measured length between the feature points.
    pub fn measured_length(&self) -> f64 {
        let c = self.common();
        match self {
            Dimension::Orthogonal { axis, .. } => match axis {
                OrthogonalAxis::Horizontal => (c.end.x - c.start.x).abs() as f64,
                OrthogonalAxis::Vertical => (c.end.y - c.start.y).abs() as f64,
            },
            _ => c.start.distance(c.end),
        }
    }
}

/// Signed height of an aligned dimension whose crossbar runs from
/// `crossbar_start` to `crossbar_end`. Negative when the crossbar lies on the
/// left of the measured direction.
pub fn height_from_crossbar(start: Point, crossbar_start: Point, crossbar_end: Point) -> Biu {
    let offset = crossbar_start - start;
    let direction = crossbar_end - crossbar_start;
    let height = (offset.x as f64).hypot(offset.y as f64).round() as Biu;
    let cross = offset.x as f64 * direction.y as f64 - offset.y as f64 * direction.x as f64;
    if cross > 0.0 {
        -height
    } else {
        height
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crossbar_height_sign() {
        let start = Point::new(0, 0);
        let above = height_from_crossbar(start, Point::new(0, -1000), Point::new(5000, -1000));
        let below = height_from_crossbar(start, Point::new(0, 1000), Point::new(5000, 1000));
        assert_eq!(above.abs(), 1000);
        assert_eq!(below.abs(), 1000);
        assert_eq!(above, -below);
    }

    #[test]
    fn test_orthogonal_measures_one_axis() {
        let mut common = DimensionCommon::new(PcbLayerId::DWGS_USER);
        common.start = Point::new(0, 0);
        common.end = Point::new(3_000_000, 4_000_000);
        let aligned = Dimension::Aligned {
            common: common.clone(),
            height: 0,
        };
        let vertical = Dimension::Orthogonal {
            common,
            height: 0,
            axis: OrthogonalAxis::Vertical,
        };
        assert_eq!(aligned.measured_length(), 5_000_000.0);
        assert_eq!(vertical.measured_length(), 4_000_000.0);
        assert_eq!(vertical.type_name(), "orthogonal");
    }
}
