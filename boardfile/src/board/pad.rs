//! Footprint pads.

use serde::{Deserialize, Serialize};

use crate::geometry::{Point, Size};
use crate::kiid::Kiid;
use crate::layers::{LayerSet, PcbLayerId};
use crate::units::Biu;

use super::shape::Shape;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PadShape {
    Circle,
    Rect,
    Oval,
    Trapezoid,
    RoundRect,
    ChamferedRect,
    Custom,
}

impl PadShape {
    pub fn parse(text: &str) -> Option<Self> {
        match text {
            "circle" => Some(PadShape::Circle),
            "rect" => Some(PadShape::Rect),
            "oval" => Some(PadShape::Oval),
            "trapezoid" => Some(PadShape::Trapezoid),
            "roundrect" => Some(PadShape::RoundRect),
            "custom" => Some(PadShape::Custom),
            _ => None,
        }
    }

    /// Name written to files. Chamfered rectangles are stored as `roundrect`
    /// plus chamfer settings.
    pub fn as_str(self) -> &'static str {
        match self {
            PadShape::Circle => "circle",
            PadShape::Rect => "rect",
            PadShape::Oval => "oval",
            PadShape::Trapezoid => "trapezoid",
            PadShape::RoundRect | PadShape::ChamferedRect => "roundrect",
            PadShape::Custom => "custom",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PadAttribute {
    Pth,
    Smd,
    Conn,
    Npth,
}

impl PadAttribute {
    pub fn parse(text: &str) -> Option<Self> {
        match text {
            "thru_hole" => Some(PadAttribute::Pth),
            "smd" => Some(PadAttribute::Smd),
            "connect" => Some(PadAttribute::Conn),
            "np_thru_hole" => Some(PadAttribute::Npth),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PadAttribute::Pth => "thru_hole",
            PadAttribute::Smd => "smd",
            PadAttribute::Conn => "connect",
            PadAttribute::Npth => "np_thru_hole",
        }
    }

    pub fn has_hole(self) -> bool {
        matches!(self, PadAttribute::Pth | PadAttribute::Npth)
    }
}

/// Fabrication property of a pad.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PadProperty {
    #[default]
    None,
    Bga,
    FiducialGlobal,
    FiducialLocal,
    Testpoint,
    Heatsink,
    Castellated,
}

impl PadProperty {
    pub fn parse(text: &str) -> Option<Self> {
        match text {
            "pad_prop_bga" => Some(PadProperty::Bga),
            "pad_prop_fiducial_glob" => Some(PadProperty::FiducialGlobal),
            "pad_prop_fiducial_loc" => Some(PadProperty::FiducialLocal),
            "pad_prop_testpoint" => Some(PadProperty::Testpoint),
            "pad_prop_heatsink" => Some(PadProperty::Heatsink),
            "pad_prop_castellated" => Some(PadProperty::Castellated),
            _ => None,
        }
    }

    pub fn as_str(self) -> Option<&'static str> {
        match self {
            PadProperty::None => None,
            PadProperty::Bga => Some("pad_prop_bga"),
            PadProperty::FiducialGlobal => Some("pad_prop_fiducial_glob"),
            PadProperty::FiducialLocal => Some("pad_prop_fiducial_loc"),
            PadProperty::Testpoint => Some("pad_prop_testpoint"),
            PadProperty::Heatsink => Some("pad_prop_heatsink"),
            PadProperty::Castellated => Some("pad_prop_castellated"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DrillShape {
    #[default]
    Circle,
    Oblong,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Drill {
    pub shape: DrillShape,
    pub size: Size,
    pub offset: Point,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ChamferCorners {
    pub top_left: bool,
    pub top_right: bool,
    pub bottom_left: bool,
    pub bottom_right: bool,
}

impl ChamferCorners {
    pub fn any(&self) -> bool {
        self.top_left || self.top_right || self.bottom_left || self.bottom_right
    }

    /// Set the corner named by a file token. Returns false for unknown names.
    pub fn set(&mut self, token: &str) -> bool {
        match token {
            "top_left" => self.top_left = true,
            "top_right" => self.top_right = true,
            "bottom_left" => self.bottom_left = true,
            "bottom_right" => self.bottom_right = true,
            _ => return false,
        }
        true
    }

    pub fn names(&self) -> Vec<&'static str> {
        let mut out = Vec::new();
        if self.top_left {
            out.push("top_left");
        }
        if self.top_right {
            out.push("top_right");
        }
        if self.bottom_left {
            out.push("bottom_left");
        }
        if self.bottom_right {
            out.push("bottom_right");
        }
        out
    }
}

/// How copper zones connect to a pad.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZoneConnection {
    #[default]
    Inherited,
    None,
    Thermal,
    Full,
    ThermalThroughHoleOnly,
}

impl ZoneConnection {
    /// Numeric code used by both grammars (`zone_connect 2`, `.ZoneConnection 2`).
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            -1 => Some(ZoneConnection::Inherited),
            0 => Some(ZoneConnection::None),
            1 => Some(ZoneConnection::Thermal),
            2 => Some(ZoneConnection::Full),
            3 => Some(ZoneConnection::ThermalThroughHoleOnly),
            _ => None,
        }
    }

    pub fn code(self) -> i64 {
        match self {
            ZoneConnection::Inherited => -1,
            ZoneConnection::None => 0,
            ZoneConnection::Thermal => 1,
            ZoneConnection::Full => 2,
            ZoneConnection::ThermalThroughHoleOnly => 3,
        }
    }
}

/// Clearance and margin settings that override the board or footprint
/// defaults. Used by footprints and pads.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LocalOverrides {
    pub clearance: Option<Biu>,
    pub solder_mask_margin: Option<Biu>,
    pub solder_paste_margin: Option<Biu>,
    pub solder_paste_ratio: Option<f64>,
    pub zone_connection: Option<ZoneConnection>,
    pub thermal_width: Option<Biu>,
    pub thermal_gap: Option<Biu>,
}

impl LocalOverrides {
    pub fn is_empty(&self) -> bool {
        *self == LocalOverrides::default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CustomAnchor {
    #[default]
    Circle,
    Rect,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CustomClearance {
    #[default]
    Outline,
    ConvexHull,
}

/// Extra geometry of a custom-shaped pad, in pad-local coordinates.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CustomPad {
    pub anchor: CustomAnchor,
    pub clearance: CustomClearance,
    pub primitives: Vec<Shape>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pad {
    pub id: Kiid,
    pub number: String,
    pub shape: PadShape,
    pub attribute: PadAttribute,
    pub property: PadProperty,
    pub local_position: Point,
    pub position: Point,
    /// Absolute orientation in degrees.
    pub angle: f64,
    pub local_angle: f64,
    pub size: Size,
    pub delta: Size, // trapezoid deformation
    pub drill: Option<Drill>,
    pub layers: LayerSet,
    pub net: i32,
    pub roundrect_ratio: f64,
    pub chamfer_ratio: f64,
    pub chamfers: ChamferCorners,
    pub custom: Option<CustomPad>,
    pub overrides: LocalOverrides,
    pub die_length: Biu,
    pub pin_function: Option<String>,
    pub pin_type: Option<String>,
    pub remove_unused_layers: bool,
    pub keep_end_layers: bool,
    pub locked: bool,
}

impl Pad {
    pub fn new(number: impl Into<String>, shape: PadShape, attribute: PadAttribute) -> Self {
        let layers = match attribute {
            PadAttribute::Smd | PadAttribute::Conn => LayerSet::from_layers(&[
                PcbLayerId::F_CU,
                PcbLayerId::F_PASTE,
                PcbLayerId::F_MASK,
            ]),
            _ => LayerSet::all_copper()
                .with(PcbLayerId::F_MASK)
                .with(PcbLayerId::B_MASK),
        };
        Self {
            id: Kiid::new(),
            number: number.into(),
            shape,
            attribute,
            property: PadProperty::None,
            local_position: Point::default(),
            position: Point::default(),
            angle: 0.0,
            local_angle: 0.0,
            size: Size::default(),
            delta: Size::default(),
            drill: None,
            layers,
            net: super::nets::UNCONNECTED,
            roundrect_ratio: 0.25,
            chamfer_ratio: 0.2,
            chamfers: ChamferCorners::default(),
            custom: None,
            overrides: LocalOverrides::default(),
            die_length: 0,
            pin_function: None,
            pin_type: None,
            remove_unused_layers: false,
            keep_end_layers: false,
            locked: false,
        }
    }

    pub fn is_orphaned(&self) -> bool {
        self.net == super::nets::ORPHANED
    }

    /// Apply the chamfer rule: a round rectangle with chamfered corners and
    /// a non-zero ratio becomes a chamfered rectangle.
    pub fn normalize_shape(&mut self) {
        if matches!(self.shape, PadShape::RoundRect | PadShape::Rect)
            && self.chamfers.any()
            && self.chamfer_ratio > 0.0
        {
            self.shape = PadShape::ChamferedRect;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_smd_default_layers() {
        let pad = Pad::new("1", PadShape::Rect, PadAttribute::Smd);
        assert!(pad.layers.contains(PcbLayerId::F_CU));
        assert!(!pad.layers.contains(PcbLayerId::B_CU));
    }

    #[test]
    fn test_chamfer_makes_chamfered_rect() {
        let mut pad = Pad::new("1", PadShape::RoundRect, PadAttribute::Smd);
        pad.normalize_shape();
        assert_eq!(pad.shape, PadShape::RoundRect);
        assert!(pad.chamfers.set("top_left"));
        pad.normalize_shape();
        assert_eq!(pad.shape, PadShape::ChamferedRect);
        assert_eq!(pad.shape.as_str(), "roundrect");
    }

    #[test]
    fn test_zone_connection_codes() {
        for code in -1..=3 {
            let conn = ZoneConnection::from_code(code).unwrap();
            assert_eq!(conn.code(), code);
        }
        assert_eq!(ZoneConnection::from_code(7), None);
    }
}
