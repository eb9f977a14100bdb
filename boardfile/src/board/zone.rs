//! Copper zones and rule areas.

use serde::{Deserialize, Serialize};

use crate::geometry::Point;
use crate::kiid::Kiid;
use crate::layers::{LayerSet, PcbLayerId};
use crate::units::{mm_to_biu, Biu};

use super::pad::ZoneConnection;

/// Drop the repeated closing point of a ring, if present.
pub fn close_ring(mut points: Vec<Point>) -> Vec<Point> {
    while points.len() > 1 && points.first() == points.last() {
        points.pop();
    }
    points
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HatchStyle {
    None,
    #[default]
    Edge,
    Full,
}

impl HatchStyle {
    pub fn parse(text: &str) -> Option<Self> {
        match text {
            "none" => Some(HatchStyle::None),
            "edge" => Some(HatchStyle::Edge),
            "full" => Some(HatchStyle::Full),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            HatchStyle::None => "none",
            HatchStyle::Edge => "edge",
            HatchStyle::Full => "full",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZoneFillMode {
    #[default]
    Polygons,
    Hatched,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Smoothing {
    #[default]
    None,
    Chamfer,
    Fillet,
}

impl Smoothing {
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(Smoothing::None),
            1 => Some(Smoothing::Chamfer),
            2 => Some(Smoothing::Fillet),
            _ => None,
        }
    }

    pub fn parse(text: &str) -> Option<Self> {
        match text {
            "none" => Some(Smoothing::None),
            "chamfer" => Some(Smoothing::Chamfer),
            "fillet" => Some(Smoothing::Fillet),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Smoothing::None => "none",
            Smoothing::Chamfer => "chamfer",
            Smoothing::Fillet => "fillet",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IslandRemoval {
    #[default]
    Always,
    Never,
    BelowArea,
}

impl IslandRemoval {
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(IslandRemoval::Always),
            1 => Some(IslandRemoval::Never),
            2 => Some(IslandRemoval::BelowArea),
            _ => None,
        }
    }

    pub fn code(self) -> i64 {
        match self {
            IslandRemoval::Always => 0,
            IslandRemoval::Never => 1,
            IslandRemoval::BelowArea => 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneFill {
    pub filled: bool,
    pub mode: ZoneFillMode,
    pub thermal_gap: Biu,
    pub thermal_bridge_width: Biu,
    pub smoothing: Smoothing,
    pub smoothing_radius: Biu,
    pub island_removal: IslandRemoval,
    pub island_area_min: i64, // square BIU
    pub hatch_thickness: Biu,
    pub hatch_gap: Biu,
    pub hatch_orientation: f64,
    pub hatch_smoothing_level: i64,
    pub hatch_smoothing_value: f64,
    pub hatch_border_algorithm: i64,
    pub hatch_min_hole_area: f64,
}

impl Default for ZoneFill {
    fn default() -> Self {
        Self {
            filled: false,
            mode: ZoneFillMode::Polygons,
            thermal_gap: mm_to_biu(0.508),
            thermal_bridge_width: mm_to_biu(0.508),
            smoothing: Smoothing::None,
            smoothing_radius: 0,
            island_removal: IslandRemoval::Always,
            island_area_min: 0,
            hatch_thickness: 0,
            hatch_gap: 0,
            hatch_orientation: 0.0,
            hatch_smoothing_level: 0,
            hatch_smoothing_value: 0.0,
            hatch_border_algorithm: 0,
            hatch_min_hole_area: 0.0,
        }
    }
}

/// What a rule area forbids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct KeepoutRules {
    pub no_tracks: bool,
    pub no_vias: bool,
    pub no_pads: bool,
    pub no_copper_pour: bool,
    pub no_footprints: bool,
}

/// Fill result on one layer: a polygon of the computed copper.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilledPolygon {
    pub layer: PcbLayerId,
    pub island: bool,
    pub points: Vec<Point>,
}

/// Fill stroke segments on one layer, from the old segment fill mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FillSegments {
    pub layer: PcbLayerId,
    pub segments: Vec<(Point, Point)>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Zone {
    pub id: Kiid,
    pub name: String,
    pub net: i32,
    pub net_name: String,
    pub layers: LayerSet,
    pub hatch_style: HatchStyle,
    pub hatch_pitch: Biu,
    pub priority: u32,
    pub connection: ZoneConnection,
    pub clearance: Biu,
    pub min_thickness: Biu,
    pub filled_areas_thickness: bool,
    /// Set for rule areas (keepouts). Rule areas never carry a net.
    pub rule_area: Option<KeepoutRules>,
    pub fill: ZoneFill,
    /// Main contour, a closed ring without repeated closing point.
    pub outline: Vec<Point>,
    pub holes: Vec<Vec<Point>>,
    pub filled_polygons: Vec<FilledPolygon>,
    pub fill_segments: Vec<FillSegments>,
    pub locked: bool,
}

impl Default for Zone {
    fn default() -> Self {
        Self {
            id: Kiid::new(),
            name: String::new(),
            net: super::nets::UNCONNECTED,
            net_name: String::new(),
            layers: LayerSet::single(PcbLayerId::F_CU),
            hatch_style: HatchStyle::Edge,
            hatch_pitch: mm_to_biu(0.508),
            priority: 0,
            connection: ZoneConnection::Thermal,
            clearance: mm_to_biu(0.508),
            min_thickness: mm_to_biu(0.254),
            filled_areas_thickness: false,
            rule_area: None,
            fill: ZoneFill::default(),
            outline: Vec::new(),
            holes: Vec::new(),
            filled_polygons: Vec::new(),
            fill_segments: Vec::new(),
            locked: false,
        }
    }
}

impl Zone {
    /// Add a ring: the first becomes the outline, later ones become holes.
    pub fn add_ring(&mut self, points: Vec<Point>) {
        let ring = close_ring(points);
        if ring.is_empty() {
            return;
        }
        if self.outline.is_empty() {
            self.outline = ring;
        } else {
            self.holes.push(ring);
        }
    }

    pub fn corner_count(&self) -> usize {
        self.outline.len() + self.holes.iter().map(Vec::len).sum::<usize>()
    }

    pub fn is_rule_area(&self) -> bool {
        self.rule_area.is_some()
    }

    pub fn is_on_copper(&self) -> bool {
        self.layers.has_copper()
    }

    /// First layer of the zone, used where a single layer is expected.
    pub fn layer(&self) -> PcbLayerId {
        self.layers.first().unwrap_or(PcbLayerId::F_CU)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square() -> Vec<Point> {
        vec![
            Point::new(0, 0),
            Point::new(10, 0),
            Point::new(10, 10),
            Point::new(0, 10),
        ]
    }

    #[test]
    fn test_close_ring_strips_duplicate_end() {
        let mut pts = square();
        pts.push(Point::new(0, 0));
        assert_eq!(close_ring(pts), square());
        assert_eq!(close_ring(square()), square());
    }

    #[test]
    fn test_first_ring_is_outline() {
        let mut zone = Zone::default();
        zone.add_ring(square());
        zone.add_ring(vec![Point::new(2, 2), Point::new(4, 2), Point::new(4, 4)]);
        assert_eq!(zone.outline.len(), 4);
        assert_eq!(zone.holes.len(), 1);
        assert_eq!(zone.corner_count(), 7);
    }

    #[test]
    fn test_rule_area_flags() {
        let mut zone = Zone::default();
        assert!(!zone.is_rule_area());
        zone.rule_area = Some(KeepoutRules {
            no_tracks: true,
            ..Default::default()
        });
        assert!(zone.is_rule_area());
    }
}
