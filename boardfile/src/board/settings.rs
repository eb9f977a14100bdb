//! Board-wide settings: design rules, per layer class defaults, stackup,
//! page and title block.

use serde::{Deserialize, Serialize};

use crate::geometry::{Point, Size};
use crate::layers::PcbLayerId;
use crate::units::{mm_to_biu, Biu};

/// Layer families that share default line widths and text sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayerClass {
    Silkscreen,
    Copper,
    Edges,
    Courtyard,
    Fab,
    Other,
}

impl LayerClass {
    pub const ALL: [LayerClass; 6] = [
        LayerClass::Silkscreen,
        LayerClass::Copper,
        LayerClass::Edges,
        LayerClass::Courtyard,
        LayerClass::Fab,
        LayerClass::Other,
    ];

    pub fn of(layer: PcbLayerId) -> LayerClass {
        match layer {
            l if l.is_copper() => LayerClass::Copper,
            PcbLayerId::F_SILKS | PcbLayerId::B_SILKS => LayerClass::Silkscreen,
            PcbLayerId::EDGE_CUTS | PcbLayerId::MARGIN => LayerClass::Edges,
            PcbLayerId::F_CRTYD | PcbLayerId::B_CRTYD => LayerClass::Courtyard,
            PcbLayerId::F_FAB | PcbLayerId::B_FAB => LayerClass::Fab,
            _ => LayerClass::Other,
        }
    }

    pub fn index(self) -> usize {
        self as usize
    }
}

/// Default line width and text style for one [`LayerClass`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LayerClassDefaults {
    pub line_width: Biu,
    pub text_size: Size,
    pub text_thickness: Biu,
    pub italic: bool,
    pub keep_upright: bool,
}

impl LayerClassDefaults {
    fn new(line_mm: f64, text_mm: f64, thickness_mm: f64) -> Self {
        Self {
            line_width: mm_to_biu(line_mm),
            text_size: Size::square(mm_to_biu(text_mm)),
            text_thickness: mm_to_biu(thickness_mm),
            italic: false,
            keep_upright: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViaDimension {
    pub diameter: Biu,
    pub drill: Biu,
}

/// Design rules and defaults stored in the file's setup section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DesignSettings {
    pub board_thickness: Biu,
    pub track_widths: Vec<Biu>,          // user track width list
    pub via_sizes: Vec<ViaDimension>,    // user via size list
    pub min_track_width: Biu,
    pub min_via_diameter: Biu,
    pub min_via_drill: Biu,
    pub micro_vias_allowed: bool,
    pub min_micro_via_diameter: Biu,
    pub min_micro_via_drill: Biu,
    pub zone_clearance: Biu,
    pub zone_45_only: bool,
    pub solder_mask_margin: Biu,
    pub solder_mask_min_width: Biu,
    pub solder_paste_margin: Biu,
    pub solder_paste_ratio: f64,
    pub allow_soldermask_bridges_in_footprints: bool,
    pub aux_axis_origin: Point,
    pub grid_origin: Point,
    pub pad_size: Size,
    pub pad_drill: Biu,
    pub layer_defaults: [LayerClassDefaults; 6], // indexed by LayerClass
    pub stackup: Option<Stackup>,
    pub visible_elements: Option<u64>,
    pub plot_params: Option<String>, // kept verbatim, never interpreted
}

impl Default for DesignSettings {
    fn default() -> Self {
        Self {
            board_thickness: mm_to_biu(1.6),
            track_widths: Vec::new(),
            via_sizes: Vec::new(),
            min_track_width: mm_to_biu(0.2),
            min_via_diameter: mm_to_biu(0.4),
            min_via_drill: mm_to_biu(0.3),
            micro_vias_allowed: false,
            min_micro_via_diameter: mm_to_biu(0.2),
            min_micro_via_drill: mm_to_biu(0.1),
            zone_clearance: mm_to_biu(0.508),
            zone_45_only: false,
            solder_mask_margin: 0,
            solder_mask_min_width: 0,
            solder_paste_margin: 0,
            solder_paste_ratio: 0.0,
            allow_soldermask_bridges_in_footprints: false,
            aux_axis_origin: Point::default(),
            grid_origin: Point::default(),
            pad_size: Size::new(mm_to_biu(1.524), mm_to_biu(1.524)),
            pad_drill: mm_to_biu(0.762),
            layer_defaults: [
                LayerClassDefaults::new(0.12, 1.0, 0.15),
                LayerClassDefaults::new(0.2, 1.5, 0.3),
                LayerClassDefaults::new(0.05, 1.0, 0.15),
                LayerClassDefaults::new(0.05, 1.0, 0.15),
                LayerClassDefaults::new(0.1, 1.0, 0.15),
                LayerClassDefaults::new(0.1, 1.0, 0.15),
            ],
            stackup: None,
            visible_elements: None,
            plot_params: None,
        }
    }
}

impl DesignSettings {
    pub fn defaults_for(&self, class: LayerClass) -> &LayerClassDefaults {
        &self.layer_defaults[class.index()]
    }

    pub fn defaults_for_mut(&mut self, class: LayerClass) -> &mut LayerClassDefaults {
        &mut self.layer_defaults[class.index()]
    }
}

/// Physical properties of one (sub)layer of a stackup entry.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StackupSublayer {
    pub thickness: Option<Biu>,
    pub thickness_locked: bool,
    pub material: Option<String>,
    pub epsilon_r: Option<f64>,
    pub loss_tangent: Option<f64>,
}

/// One entry of the board stackup, from top to bottom.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StackupItem {
    pub name: String,                    // layer name, or "dielectric N"
    pub layer: Option<PcbLayerId>,       // None for dielectrics
    pub kind: String,                    // "copper", "core", "prepreg", "Top Silk Screen", ...
    pub color: Option<String>,
    pub sublayers: Vec<StackupSublayer>, // at least one
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeConnector {
    #[default]
    None,
    Yes,
    Bevelled,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Stackup {
    pub items: Vec<StackupItem>,
    pub copper_finish: Option<String>,
    pub dielectric_constraints: bool,
    pub edge_connector: EdgeConnector,
    pub castellated_pads: bool,
    pub edge_plating: bool,
}

/// Paper sizes a file may name.
pub const PAPER_TYPES: &[&str] = &[
    "A5", "A4", "A3", "A2", "A1", "A0", "A", "B", "C", "D", "E", "GERBER", "USLetter", "USLegal",
    "USLedger", "User",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageInfo {
    pub paper: String,
    /// Width and height in mils, only for the "User" paper type.
    pub custom_size_mils: Option<(i64, i64)>,
    pub portrait: bool,
}

impl Default for PageInfo {
    fn default() -> Self {
        Self {
            paper: "A4".to_string(),
            custom_size_mils: None,
            portrait: false,
        }
    }
}

impl PageInfo {
    pub fn is_known_paper(name: &str) -> bool {
        PAPER_TYPES.contains(&name)
    }

    pub fn is_custom(&self) -> bool {
        self.paper == "User"
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TitleBlock {
    pub title: String,
    pub date: String,
    pub revision: String,
    pub company: String,
    pub comments: [String; 9],
}

impl TitleBlock {
    pub fn is_empty(&self) -> bool {
        self.title.is_empty()
            && self.date.is_empty()
            && self.revision.is_empty()
            && self.company.is_empty()
            && self.comments.iter().all(String::is_empty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layer_class_of() {
        assert_eq!(LayerClass::of(PcbLayerId::F_CU), LayerClass::Copper);
        assert_eq!(LayerClass::of(PcbLayerId::B_SILKS), LayerClass::Silkscreen);
        assert_eq!(LayerClass::of(PcbLayerId::EDGE_CUTS), LayerClass::Edges);
        assert_eq!(LayerClass::of(PcbLayerId::F_CRTYD), LayerClass::Courtyard);
        assert_eq!(LayerClass::of(PcbLayerId::B_FAB), LayerClass::Fab);
        assert_eq!(LayerClass::of(PcbLayerId::CMTS_USER), LayerClass::Other);
    }

    #[test]
    fn test_defaults_indexed_by_class() {
        let settings = DesignSettings::default();
        assert_eq!(settings.defaults_for(LayerClass::Copper).text_size.width, 1_500_000);
        assert_eq!(settings.defaults_for(LayerClass::Silkscreen).line_width, 120_000);
    }

    #[test]
    fn test_paper_types() {
        assert!(PageInfo::is_known_paper("A3"));
        assert!(PageInfo::is_known_paper("User"));
        assert!(!PageInfo::is_known_paper("A9"));
    }
}
