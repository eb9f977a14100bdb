//! Footprints and the items they own.

use serde::{Deserialize, Serialize};

use crate::geometry::{round_angle, Point};
use crate::kiid::Kiid;
use crate::layers::PcbLayerId;

use super::dimension::Dimension;
use super::group::Group;
use super::pad::{LocalOverrides, Pad};
use super::shape::FootprintShape;
use super::text::{FootprintText, FootprintTextKind};
use super::zone::Zone;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FootprintType {
    #[default]
    Unspecified,
    Smd,
    ThroughHole,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FootprintAttributes {
    pub kind: FootprintType,
    pub board_only: bool,
    pub exclude_from_pos_files: bool,
    pub exclude_from_bom: bool,
}

impl FootprintAttributes {
    /// The old "virtual" attribute: nothing to place and nothing to buy.
    pub fn set_virtual(&mut self) {
        self.exclude_from_pos_files = true;
        self.exclude_from_bom = true;
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Model3d {
    pub path: String,
    pub offset: [f64; 3], // mm
    pub scale: [f64; 3],
    pub rotate: [f64; 3], // degrees
    pub hidden: bool,
    pub opacity: Option<f64>,
}

impl Model3d {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            offset: [0.0; 3],
            scale: [1.0; 3],
            rotate: [0.0; 3],
            hidden: false,
            opacity: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Property {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Footprint {
    pub id: Kiid,
    pub lib_id: String,
    pub position: Point,
    pub orientation: f64,
    /// F.Cu or B.Cu.
    pub layer: PcbLayerId,
    pub locked: bool,
    pub placed: bool,
    pub attributes: FootprintAttributes,
    pub description: String,
    pub keywords: String,
    pub properties: Vec<Property>,
    pub path: Option<String>,
    pub last_edit: Option<u32>,
    pub autoplace_cost90: i64,
    pub autoplace_cost180: i64,
    pub overrides: LocalOverrides,
    pub texts: Vec<FootprintText>,
    pub pads: Vec<Pad>,
    pub shapes: Vec<FootprintShape>,
    pub zones: Vec<Zone>,
    pub dimensions: Vec<Dimension>,
    pub groups: Vec<Group>,
    pub models: Vec<Model3d>,
}

impl Default for Footprint {
    fn default() -> Self {
        Self {
            id: Kiid::new(),
            lib_id: String::new(),
            position: Point::default(),
            orientation: 0.0,
            layer: PcbLayerId::F_CU,
            locked: false,
            placed: false,
            attributes: FootprintAttributes::default(),
            description: String::new(),
            keywords: String::new(),
            properties: Vec::new(),
            path: None,
            last_edit: None,
            autoplace_cost90: 0,
            autoplace_cost180: 0,
            overrides: LocalOverrides::default(),
            texts: Vec::new(),
            pads: Vec::new(),
            shapes: Vec::new(),
            zones: Vec::new(),
            dimensions: Vec::new(),
            groups: Vec::new(),
            models: Vec::new(),
        }
    }
}

impl Footprint {
    fn text_of(&self, kind: FootprintTextKind) -> Option<&FootprintText> {
        self.texts.iter().find(|t| t.kind == kind)
    }

    pub fn reference(&self) -> &str {
        self.text_of(FootprintTextKind::Reference)
            .map(|t| t.text.as_str())
            .unwrap_or("")
    }

    pub fn value(&self) -> &str {
        self.text_of(FootprintTextKind::Value)
            .map(|t| t.text.as_str())
            .unwrap_or("")
    }

    pub fn is_flipped(&self) -> bool {
        self.layer == PcbLayerId::B_CU
    }

    pub fn property(&self, name: &str) -> Option<&str> {
        self.properties
            .iter()
            .find(|p| p.name == name)
            .map(|p| p.value.as_str())
    }

    /// Set a property, replacing an existing value of the same name.
    pub fn set_property(&mut self, name: &str, value: &str) {
        match self.properties.iter_mut().find(|p| p.name == name) {
            Some(p) => p.value = value.to_string(),
            None => self.properties.push(Property {
                name: name.to_string(),
                value: value.to_string(),
            }),
        }
    }

    /// Compute board coordinates of pads, texts and shapes from their
    /// footprint-local positions, and the local angle of pads and texts from
    /// their absolute angle.
    ///
    /// Zones and dimensions are stored in board coordinates and are left
    /// alone.
    pub fn place_children(&mut self) {
        let origin = self.position;
        let orientation = self.orientation;
        let to_board = |local: Point| origin + local.rotated(orientation);

        for pad in &mut self.pads {
            pad.position = to_board(pad.local_position);
            pad.local_angle = round_angle(pad.angle - orientation);
        }
        for text in &mut self.texts {
            text.position = to_board(text.local_position);
            text.local_angle = round_angle(text.angle - orientation);
        }
        for shape in &mut self.shapes {
            shape.shape.kind = shape.local.map_points(to_board);
        }
    }

    pub fn pad_count(&self) -> usize {
        self.pads.len()
    }
}
