//! In-memory board model.
//!
//! Items live in plain `Vec` arenas owned by [`Board`] (or by their
//! [`Footprint`]) and are addressed through [`ItemRef`] handles. The id
//! index maps every [`Kiid`] to its handle and is rebuilt whenever items are
//! removed.

pub mod builder;
pub mod dimension;
pub mod footprint;
pub mod group;
pub mod nets;
pub mod pad;
pub mod settings;
pub mod shape;
pub mod text;
pub mod track;
pub mod zone;

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::kiid::Kiid;
use crate::layers::{LayerTable, PcbLayerId};

pub use builder::{BoardBuilder, BuildState};
pub use dimension::{Dimension, DimensionCommon};
pub use footprint::{Footprint, FootprintAttributes, FootprintType, Model3d, Property};
pub use group::{Group, GroupInfo, GroupParent};
pub use nets::{NetClass, NetClasses, NetCodeMap, NetInfo, NetTable, ORPHANED, UNCONNECTED};
pub use pad::{Pad, PadAttribute, PadShape, ZoneConnection};
pub use settings::{DesignSettings, PageInfo, Stackup, TitleBlock};
pub use shape::{FootprintShape, Shape, ShapeKind, Target, TargetShape};
pub use text::{BoardText, FootprintText, FootprintTextKind, TextEffects};
pub use track::{Track, TrackArc, TrackSegment, Via, ViaType};
pub use zone::Zone;

/// Highest modern file version this crate reads and the version it writes.
pub const SEXPR_BOARD_FILE_VERSION: u32 = 20211014;

/// A board-level graphic item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "item", rename_all = "lowercase")]
pub enum Drawing {
    Shape(Shape),
    Text(BoardText),
    Dimension(Dimension),
    Target(Target),
}

impl Drawing {
    pub fn id(&self) -> Kiid {
        match self {
            Drawing::Shape(s) => s.id,
            Drawing::Text(t) => t.id,
            Drawing::Dimension(d) => d.id(),
            Drawing::Target(t) => t.id,
        }
    }

    pub fn layer(&self) -> PcbLayerId {
        match self {
            Drawing::Shape(s) => s.layer,
            Drawing::Text(t) => t.layer,
            Drawing::Dimension(d) => d.common().layer,
            Drawing::Target(t) => t.layer,
        }
    }

    pub fn set_layer(&mut self, layer: PcbLayerId) {
        match self {
            Drawing::Shape(s) => s.layer = layer,
            Drawing::Text(t) => t.layer = layer,
            Drawing::Dimension(d) => {
                let common = d.common_mut();
                common.layer = layer;
                common.text.layer = layer;
            }
            Drawing::Target(t) => t.layer = layer,
        }
    }
}

/// Handle to an item of a [`Board`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemRef {
    Footprint(usize),
    Drawing(usize),
    Track(usize),
    Zone(usize),
    Group(usize),
    Pad { footprint: usize, index: usize },
    FootprintText { footprint: usize, index: usize },
    FootprintShape { footprint: usize, index: usize },
    FootprintZone { footprint: usize, index: usize },
    FootprintDimension { footprint: usize, index: usize },
    FootprintGroup { footprint: usize, index: usize },
}

impl ItemRef {
    /// The owning footprint, for footprint children.
    pub fn footprint(&self) -> Option<usize> {
        match *self {
            ItemRef::Pad { footprint, .. }
            | ItemRef::FootprintText { footprint, .. }
            | ItemRef::FootprintShape { footprint, .. }
            | ItemRef::FootprintZone { footprint, .. }
            | ItemRef::FootprintDimension { footprint, .. }
            | ItemRef::FootprintGroup { footprint, .. } => Some(footprint),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Board {
    pub version: u32,
    pub generator: Option<String>,
    pub host: Option<(String, String)>,
    pub layers: LayerTable,
    pub nets: NetTable,
    pub net_classes: NetClasses,
    pub settings: DesignSettings,
    pub page: PageInfo,
    pub title_block: TitleBlock,
    pub footprints: Vec<Footprint>,
    pub drawings: Vec<Drawing>,
    pub tracks: Vec<Track>,
    pub zones: Vec<Zone>,
    pub groups: Vec<Group>,
    #[serde(skip)]
    index: HashMap<Kiid, ItemRef>,
    #[serde(skip)]
    loaded: bool,
}

impl Board {
    pub fn new() -> Self {
        Self {
            version: SEXPR_BOARD_FILE_VERSION,
            ..Default::default()
        }
    }

    pub fn copper_count(&self) -> usize {
        self.layers.copper_count()
    }

    /// True once finalization has completed.
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub(crate) fn mark_loaded(&mut self) {
        self.loaded = true;
    }

    pub fn find_item(&self, id: &Kiid) -> Option<ItemRef> {
        self.index.get(id).copied()
    }

    pub fn indexed_len(&self) -> usize {
        self.index.len()
    }

    /// Rebuild the id index from scratch. Returns the ids that were already
    /// held by an earlier item, with the handle that lost; the first holder
    /// keeps the id.
    pub fn rebuild_index(&mut self) -> Vec<(Kiid, ItemRef)> {
        let mut index = HashMap::new();
        let mut duplicates = Vec::new();
        for (id, item) in self.item_ids() {
            if index.contains_key(&id) {
                duplicates.push((id, item));
            } else {
                index.insert(id, item);
            }
        }
        self.index = index;
        duplicates
    }

    /// Every identified item in a stable order: footprints with their
    /// children, drawings, tracks, zones, then board groups.
    pub fn item_ids(&self) -> Vec<(Kiid, ItemRef)> {
        let mut out = Vec::new();
        for (f, fp) in self.footprints.iter().enumerate() {
            out.push((fp.id, ItemRef::Footprint(f)));
            for (index, pad) in fp.pads.iter().enumerate() {
                out.push((pad.id, ItemRef::Pad { footprint: f, index }));
            }
            for (index, text) in fp.texts.iter().enumerate() {
                out.push((text.id, ItemRef::FootprintText { footprint: f, index }));
            }
            for (index, shape) in fp.shapes.iter().enumerate() {
                out.push((shape.shape.id, ItemRef::FootprintShape { footprint: f, index }));
            }
            for (index, zone) in fp.zones.iter().enumerate() {
                out.push((zone.id, ItemRef::FootprintZone { footprint: f, index }));
            }
            for (index, dim) in fp.dimensions.iter().enumerate() {
                out.push((dim.id(), ItemRef::FootprintDimension { footprint: f, index }));
            }
            for (index, group) in fp.groups.iter().enumerate() {
                out.push((group.id, ItemRef::FootprintGroup { footprint: f, index }));
            }
        }
        for (i, drawing) in self.drawings.iter().enumerate() {
            out.push((drawing.id(), ItemRef::Drawing(i)));
        }
        for (i, track) in self.tracks.iter().enumerate() {
            out.push((track.id(), ItemRef::Track(i)));
        }
        for (i, zone) in self.zones.iter().enumerate() {
            out.push((zone.id, ItemRef::Zone(i)));
        }
        for (i, group) in self.groups.iter().enumerate() {
            out.push((group.id, ItemRef::Group(i)));
        }
        out
    }

    pub fn group(&self, item: ItemRef) -> Option<&Group> {
        match item {
            ItemRef::Group(i) => self.groups.get(i),
            ItemRef::FootprintGroup { footprint, index } => {
                self.footprints.get(footprint)?.groups.get(index)
            }
            _ => None,
        }
    }

    pub(crate) fn group_mut(&mut self, item: ItemRef) -> Option<&mut Group> {
        match item {
            ItemRef::Group(i) => self.groups.get_mut(i),
            ItemRef::FootprintGroup { footprint, index } => {
                self.footprints.get_mut(footprint)?.groups.get_mut(index)
            }
            _ => None,
        }
    }

    /// The group that lists `id` as a member, if any.
    pub fn parent_group(&self, id: &Kiid) -> Option<&Group> {
        self.groups
            .iter()
            .chain(self.footprints.iter().flat_map(|fp| fp.groups.iter()))
            .find(|g| g.members.contains(id))
    }

    pub fn pad_count(&self) -> usize {
        self.footprints.iter().map(|fp| fp.pads.len()).sum()
    }

    pub fn via_count(&self) -> usize {
        self.tracks.iter().filter(|t| t.is_via()).count()
    }

    pub fn group_count(&self) -> usize {
        self.groups.len() + self.footprints.iter().map(|fp| fp.groups.len()).sum::<usize>()
    }

    pub fn find_footprint(&self, reference: &str) -> Option<&Footprint> {
        self.footprints.iter().find(|fp| fp.reference() == reference)
    }
}
