//! Canonical layer enumeration, layer sets, the board layer table and the
//! translation tables for legacy layer numbers and historical layer names.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashMap;
use std::fmt;

/// Position of a layer in the canonical enumeration.
///
/// Copper comes first (F.Cu, In1.Cu .. In30.Cu, B.Cu), followed by the
/// technical and user layers, and finally the `Rescue` layer that holds
/// items whose layer name could not be resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PcbLayerId(u8);

const LAYER_NAMES: [&str; PcbLayerId::COUNT] = [
    "F.Cu", "In1.Cu", "In2.Cu", "In3.Cu", "In4.Cu", "In5.Cu", "In6.Cu", "In7.Cu", "In8.Cu",
    "In9.Cu", "In10.Cu", "In11.Cu", "In12.Cu", "In13.Cu", "In14.Cu", "In15.Cu", "In16.Cu",
    "In17.Cu", "In18.Cu", "In19.Cu", "In20.Cu", "In21.Cu", "In22.Cu", "In23.Cu", "In24.Cu",
    "In25.Cu", "In26.Cu", "In27.Cu", "In28.Cu", "In29.Cu", "In30.Cu", "B.Cu", "B.Adhes",
    "F.Adhes", "B.Paste", "F.Paste", "B.SilkS", "F.SilkS", "B.Mask", "F.Mask", "Dwgs.User",
    "Cmts.User", "Eco1.User", "Eco2.User", "Edge.Cuts", "Margin", "B.CrtYd", "F.CrtYd", "B.Fab",
    "F.Fab", "User.1", "User.2", "User.3", "User.4", "User.5", "User.6", "User.7", "User.8",
    "User.9", "Rescue",
];

impl PcbLayerId {
    pub const COUNT: usize = 60;
    pub const MAX_COPPER: usize = 32;

    pub const F_CU: Self = Self(0);
    pub const B_CU: Self = Self(31);
    pub const B_ADHES: Self = Self(32);
    pub const F_ADHES: Self = Self(33);
    pub const B_PASTE: Self = Self(34);
    pub const F_PASTE: Self = Self(35);
    pub const B_SILKS: Self = Self(36);
    pub const F_SILKS: Self = Self(37);
    pub const B_MASK: Self = Self(38);
    pub const F_MASK: Self = Self(39);
    pub const DWGS_USER: Self = Self(40);
    pub const CMTS_USER: Self = Self(41);
    pub const ECO1_USER: Self = Self(42);
    pub const ECO2_USER: Self = Self(43);
    pub const EDGE_CUTS: Self = Self(44);
    pub const MARGIN: Self = Self(45);
    pub const B_CRTYD: Self = Self(46);
    pub const F_CRTYD: Self = Self(47);
    pub const B_FAB: Self = Self(48);
    pub const F_FAB: Self = Self(49);
    pub const USER_1: Self = Self(50);
    pub const RESCUE: Self = Self(59);

    /// Inner copper layer `In{n}.Cu`, n in 1..=30.
    pub fn inner(n: usize) -> Option<Self> {
        (1..=30).contains(&n).then(|| Self(n as u8))
    }

    pub fn from_index(index: usize) -> Option<Self> {
        (index < Self::COUNT).then(|| Self(index as u8))
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }

    pub fn is_copper(self) -> bool {
        self.0 <= Self::B_CU.0
    }

    pub fn is_inner_copper(self) -> bool {
        self.0 > Self::F_CU.0 && self.0 < Self::B_CU.0
    }

    pub fn is_back(self) -> bool {
        matches!(
            self,
            Self::B_CU
                | Self::B_ADHES
                | Self::B_PASTE
                | Self::B_SILKS
                | Self::B_MASK
                | Self::B_CRTYD
                | Self::B_FAB
        )
    }

    /// Canonical English name.
    pub fn name(self) -> &'static str {
        LAYER_NAMES[self.index()]
    }

    pub fn from_name(name: &str) -> Option<Self> {
        LAYER_NAMES
            .iter()
            .position(|candidate| *candidate == name)
            .map(|i| Self(i as u8))
    }

    pub fn all() -> impl Iterator<Item = PcbLayerId> {
        (0..Self::COUNT as u8).map(Self)
    }
}

impl fmt::Display for PcbLayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Serialize for PcbLayerId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

impl<'de> Deserialize<'de> for PcbLayerId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        PcbLayerId::from_name(&name)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown layer '{name}'")))
    }
}

/// Set of canonical layers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct LayerSet(u64);

impl LayerSet {
    pub const fn empty() -> Self {
        LayerSet(0)
    }

    pub fn single(layer: PcbLayerId) -> Self {
        LayerSet(1 << layer.index())
    }

    pub fn from_layers(layers: &[PcbLayerId]) -> Self {
        layers.iter().fold(Self::empty(), |set, l| set.with(*l))
    }

    /// Every copper layer the enumeration knows about.
    pub fn all_copper() -> Self {
        LayerSet((1u64 << PcbLayerId::MAX_COPPER) - 1)
    }

    /// The copper layers that exist on a board with `copper_count` layers.
    pub fn copper_for_count(copper_count: usize) -> Self {
        let mut set = Self::single(PcbLayerId::F_CU).with(PcbLayerId::B_CU);
        for n in 1..copper_count.saturating_sub(1) {
            if let Some(layer) = PcbLayerId::inner(n) {
                set.insert(layer);
            }
        }
        set
    }

    pub fn internal_copper() -> Self {
        let mut set = Self::all_copper();
        set.remove(PcbLayerId::F_CU);
        set.remove(PcbLayerId::B_CU);
        set
    }

    pub fn with(mut self, layer: PcbLayerId) -> Self {
        self.insert(layer);
        self
    }

    pub fn insert(&mut self, layer: PcbLayerId) {
        self.0 |= 1 << layer.index();
    }

    pub fn remove(&mut self, layer: PcbLayerId) {
        self.0 &= !(1 << layer.index());
    }

    pub fn contains(&self, layer: PcbLayerId) -> bool {
        self.0 & (1 << layer.index()) != 0
    }

    pub fn union(self, other: LayerSet) -> LayerSet {
        LayerSet(self.0 | other.0)
    }

    pub fn intersection(self, other: LayerSet) -> LayerSet {
        LayerSet(self.0 & other.0)
    }

    pub fn is_superset(&self, other: LayerSet) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn has_copper(&self) -> bool {
        !self.intersection(Self::all_copper()).is_empty()
    }

    pub fn bits(&self) -> u64 {
        self.0
    }

    /// Layers in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = PcbLayerId> + '_ {
        PcbLayerId::all().filter(move |l| self.contains(*l))
    }

    pub fn first(&self) -> Option<PcbLayerId> {
        self.iter().next()
    }
}

impl FromIterator<PcbLayerId> for LayerSet {
    fn from_iter<I: IntoIterator<Item = PcbLayerId>>(iter: I) -> Self {
        iter.into_iter().fold(Self::empty(), |set, l| set.with(l))
    }
}

impl Serialize for LayerSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.iter())
    }
}

impl<'de> Deserialize<'de> for LayerSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let layers = Vec::<PcbLayerId>::deserialize(deserializer)?;
        Ok(layers.into_iter().collect())
    }
}

/// Electrical role of a layer in the layer table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayerType {
    Signal,
    Power,
    Mixed,
    Jumper,
    User,
}

impl LayerType {
    pub fn parse(text: &str) -> Option<Self> {
        match text {
            "signal" => Some(LayerType::Signal),
            "power" => Some(LayerType::Power),
            "mixed" => Some(LayerType::Mixed),
            "jumper" => Some(LayerType::Jumper),
            "user" => Some(LayerType::User),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            LayerType::Signal => "signal",
            LayerType::Power => "power",
            LayerType::Mixed => "mixed",
            LayerType::Jumper => "jumper",
            LayerType::User => "user",
        }
    }

    pub fn is_copper(self) -> bool {
        !matches!(self, LayerType::User)
    }
}

/// One row of the board layer table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layer {
    pub id: PcbLayerId,
    /// Name given by the user, when it differs from the canonical one.
    pub user_name: Option<String>,
    pub layer_type: LayerType,
    pub visible: bool,
}

impl Layer {
    fn standard(id: PcbLayerId) -> Self {
        Self {
            id,
            user_name: None,
            layer_type: if id.is_copper() {
                LayerType::Signal
            } else {
                LayerType::User
            },
            visible: true,
        }
    }

    pub fn name(&self) -> &str {
        self.user_name.as_deref().unwrap_or_else(|| self.id.name())
    }
}

/// The board's layer table: a descriptor per canonical layer plus the set of
/// layers the board actually uses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerTable {
    layers: Vec<Layer>,
    copper_count: usize,
    enabled: LayerSet,
    visible: LayerSet,
}

impl Default for LayerTable {
    fn default() -> Self {
        let mut table = Self {
            layers: PcbLayerId::all().map(Layer::standard).collect(),
            copper_count: 2,
            enabled: LayerSet::empty(),
            visible: LayerSet::empty(),
        };
        let mut enabled = LayerSet::copper_for_count(2);
        for id in PcbLayerId::all().filter(|l| !l.is_copper() && *l != PcbLayerId::RESCUE) {
            if id.index() < PcbLayerId::USER_1.index() {
                enabled.insert(id);
            }
        }
        table.set_enabled(enabled);
        table.set_visible(enabled);
        table
    }
}

impl LayerTable {
    pub fn copper_count(&self) -> usize {
        self.copper_count
    }

    /// Copper layer counts are even and at least two; callers validate before
    /// calling this.
    pub fn set_copper_count(&mut self, count: usize) {
        self.copper_count = count.clamp(2, PcbLayerId::MAX_COPPER);
        let non_copper = self.enabled.intersection(LayerSet(!LayerSet::all_copper().0));
        self.enabled = non_copper.union(LayerSet::copper_for_count(self.copper_count));
    }

    pub fn enabled(&self) -> LayerSet {
        self.enabled
    }

    pub fn set_enabled(&mut self, set: LayerSet) {
        self.enabled = set;
    }

    pub fn visible(&self) -> LayerSet {
        self.visible
    }

    pub fn set_visible(&mut self, set: LayerSet) {
        self.visible = set;
        for layer in &mut self.layers {
            layer.visible = set.contains(layer.id);
        }
    }

    pub fn is_enabled(&self, layer: PcbLayerId) -> bool {
        self.enabled.contains(layer)
    }

    pub fn get(&self, layer: PcbLayerId) -> &Layer {
        &self.layers[layer.index()]
    }

    pub fn set_descriptor(&mut self, layer: Layer) {
        let id = layer.id;
        if layer.visible {
            self.visible.insert(id);
        } else {
            self.visible.remove(id);
        }
        self.layers[id.index()] = layer;
    }

    pub fn set_user_name(&mut self, layer: PcbLayerId, name: &str) {
        let entry = &mut self.layers[layer.index()];
        entry.user_name = (name != layer.name()).then(|| name.to_string());
    }

    pub fn set_layer_type(&mut self, layer: PcbLayerId, layer_type: LayerType) {
        self.layers[layer.index()].layer_type = layer_type;
    }

    /// Enabled layers in canonical order.
    pub fn iter_enabled(&self) -> impl Iterator<Item = &Layer> + '_ {
        self.layers.iter().filter(move |l| self.enabled.contains(l.id))
    }

    /// Whether `layer` is a copper layer that exists with the current count.
    pub fn is_valid_copper(&self, layer: PcbLayerId) -> bool {
        LayerSet::copper_for_count(self.copper_count).contains(layer)
    }
}

// Legacy layer numbering: copper is numbered back (0) to front (15),
// technical layers follow.
pub const LEGACY_BACK: u32 = 0;
pub const LEGACY_FRONT: u32 = 15;
pub const LEGACY_ADHESIVE_BACK: u32 = 16;
pub const LEGACY_SILKSCREEN_BACK: u32 = 20;
pub const LEGACY_SILKSCREEN_FRONT: u32 = 21;
pub const LEGACY_DRAW: u32 = 24;
pub const LEGACY_COMMENT: u32 = 25;
pub const LEGACY_EDGE: u32 = 28;
pub const LEGACY_FIRST_NON_COPPER: u32 = 16;
pub const LEGACY_LAST_NON_COPPER: u32 = 28;
pub const LEGACY_ALL_COPPER_MASK: u32 = 0x0000_FFFF;

const LEGACY_TECHNICAL: [PcbLayerId; 13] = [
    PcbLayerId::B_ADHES,
    PcbLayerId::F_ADHES,
    PcbLayerId::B_PASTE,
    PcbLayerId::F_PASTE,
    PcbLayerId::B_SILKS,
    PcbLayerId::F_SILKS,
    PcbLayerId::B_MASK,
    PcbLayerId::F_MASK,
    PcbLayerId::DWGS_USER,
    PcbLayerId::CMTS_USER,
    PcbLayerId::ECO1_USER,
    PcbLayerId::ECO2_USER,
    PcbLayerId::EDGE_CUTS,
];

/// Map a legacy layer number to the canonical layer.
pub fn legacy_layer_to_canonical(raw: u32, copper_count: usize) -> PcbLayerId {
    match raw {
        LEGACY_FRONT => PcbLayerId::F_CU,
        LEGACY_BACK => PcbLayerId::B_CU,
        1..=14 => {
            let inner = copper_count as i64 - 1 - raw as i64;
            if inner <= 0 {
                PcbLayerId::F_CU
            } else {
                PcbLayerId::inner(inner as usize).unwrap_or(PcbLayerId::F_CU)
            }
        }
        LEGACY_FIRST_NON_COPPER..=LEGACY_LAST_NON_COPPER => {
            LEGACY_TECHNICAL[(raw - LEGACY_FIRST_NON_COPPER) as usize]
        }
        _ => PcbLayerId::CMTS_USER,
    }
}

/// Inverse of [`legacy_layer_to_canonical`] over the layers a legacy file can
/// express.
pub fn canonical_to_legacy_layer(layer: PcbLayerId, copper_count: usize) -> Option<u32> {
    if layer == PcbLayerId::F_CU {
        return Some(LEGACY_FRONT);
    }
    if layer == PcbLayerId::B_CU {
        return Some(LEGACY_BACK);
    }
    if layer.is_inner_copper() {
        let raw = copper_count as i64 - 1 - layer.index() as i64;
        return (1..=14).contains(&raw).then_some(raw as u32);
    }
    LEGACY_TECHNICAL
        .iter()
        .position(|l| *l == layer)
        .map(|i| LEGACY_FIRST_NON_COPPER + i as u32)
}

/// Map a legacy 32-bit layer mask to a layer set.
pub fn legacy_mask_to_layer_set(mask: u32, copper_count: usize) -> LayerSet {
    let mut set = LayerSet::empty();
    let mut mask = mask;
    if mask & LEGACY_ALL_COPPER_MASK == LEGACY_ALL_COPPER_MASK {
        set = LayerSet::all_copper();
        mask &= !LEGACY_ALL_COPPER_MASK;
    }
    for bit in 0..32 {
        if mask & (1 << bit) != 0 {
            set.insert(legacy_layer_to_canonical(bit, copper_count));
        }
    }
    set
}

/// A legacy copper layer number is usable when it is the front layer or
/// below the copper count.
pub fn legacy_copper_layer_valid(raw: u32, copper_count: usize) -> bool {
    raw == LEGACY_FRONT || (raw as usize) < copper_count
}

/// Historical and localized names seen in old files, mapped to their
/// canonical layers. Best effort: only the common defaults are listed.
const LAYER_ALIASES: &[(&str, PcbLayerId)] = &[
    // legacy English defaults
    ("Front", PcbLayerId::F_CU),
    ("Back", PcbLayerId::B_CU),
    ("Component", PcbLayerId::F_CU),
    ("Copper", PcbLayerId::B_CU),
    ("Adhes_Cmp", PcbLayerId::F_ADHES),
    ("Adhes_Cop", PcbLayerId::B_ADHES),
    ("SoldP_Cmp", PcbLayerId::F_PASTE),
    ("SoldP_Cop", PcbLayerId::B_PASTE),
    ("SilkS_Cmp", PcbLayerId::F_SILKS),
    ("SilkS_Cop", PcbLayerId::B_SILKS),
    ("Mask_Cmp", PcbLayerId::F_MASK),
    ("Mask_Cop", PcbLayerId::B_MASK),
    ("Drawings", PcbLayerId::DWGS_USER),
    ("Comments", PcbLayerId::CMTS_USER),
    ("Eco1", PcbLayerId::ECO1_USER),
    ("Eco2", PcbLayerId::ECO2_USER),
    ("PCB_Edges", PcbLayerId::EDGE_CUTS),
    ("Edges_Pcb", PcbLayerId::EDGE_CUTS),
    // French
    ("Composant", PcbLayerId::F_CU),
    ("Cuivre", PcbLayerId::B_CU),
    ("Dessus", PcbLayerId::F_CU),
    ("Dessous", PcbLayerId::B_CU),
    ("Dessus.SilkS", PcbLayerId::F_SILKS),
    ("Dessous.SilkS", PcbLayerId::B_SILKS),
    ("Contours_Ci", PcbLayerId::EDGE_CUTS),
    // German
    ("Oben", PcbLayerId::F_CU),
    ("Unten", PcbLayerId::B_CU),
    ("Bestückungsseite", PcbLayerId::F_CU),
    ("Lötseite", PcbLayerId::B_CU),
    ("Kommentare", PcbLayerId::CMTS_USER),
    ("Zeichnungen", PcbLayerId::DWGS_USER),
    // Spanish
    ("Superior", PcbLayerId::F_CU),
    ("Inferior", PcbLayerId::B_CU),
    ("Comentarios", PcbLayerId::CMTS_USER),
    ("Dibujos", PcbLayerId::DWGS_USER),
];

pub fn layer_alias(name: &str) -> Option<PcbLayerId> {
    LAYER_ALIASES
        .iter()
        .find(|(alias, _)| *alias == name)
        .map(|(_, id)| *id)
}

/// Name to layer lookup used while parsing modern files.
///
/// Starts with the canonical names, the layer-set wildcards and the
/// `Inner<n>.Cu` names of the first S-expression format, and learns the
/// names declared by the file's own layer table.
#[derive(Debug, Clone)]
pub struct LayerLookup {
    indices: HashMap<String, PcbLayerId>,
    masks: HashMap<String, LayerSet>,
}

impl Default for LayerLookup {
    fn default() -> Self {
        let mut lookup = Self {
            indices: HashMap::new(),
            masks: HashMap::new(),
        };
        for id in PcbLayerId::all() {
            lookup.indices.insert(id.name().to_string(), id);
            lookup.masks.insert(id.name().to_string(), LayerSet::single(id));
        }
        let pairs = [
            ("*.Adhes", PcbLayerId::B_ADHES, PcbLayerId::F_ADHES),
            ("*.Paste", PcbLayerId::B_PASTE, PcbLayerId::F_PASTE),
            ("*.Mask", PcbLayerId::B_MASK, PcbLayerId::F_MASK),
            ("*.SilkS", PcbLayerId::B_SILKS, PcbLayerId::F_SILKS),
            ("*.Fab", PcbLayerId::B_FAB, PcbLayerId::F_FAB),
            ("*.CrtYd", PcbLayerId::B_CRTYD, PcbLayerId::F_CRTYD),
            ("F&B.Cu", PcbLayerId::F_CU, PcbLayerId::B_CU),
        ];
        for (name, a, b) in pairs {
            lookup.masks.insert(name.to_string(), LayerSet::from_layers(&[a, b]));
        }
        lookup.masks.insert("*.Cu".to_string(), LayerSet::all_copper());
        lookup.masks.insert("*In.Cu".to_string(), LayerSet::internal_copper());
        // The first S-expression format numbered inner layers the other way.
        for i in 1..=14 {
            if let Some(layer) = PcbLayerId::inner(15 - i) {
                lookup.masks.insert(format!("Inner{i}.Cu"), LayerSet::single(layer));
                lookup.indices.insert(format!("Inner{i}.Cu"), layer);
            }
        }
        lookup
    }
}

impl LayerLookup {
    pub fn register(&mut self, name: &str, layer: PcbLayerId) {
        self.indices.insert(name.to_string(), layer);
        self.masks.insert(name.to_string(), LayerSet::single(layer));
    }

    /// Resolve a single layer name, falling back to the alias table.
    pub fn layer(&self, name: &str) -> Option<PcbLayerId> {
        self.indices.get(name).copied().or_else(|| layer_alias(name))
    }

    /// Resolve a layer name or wildcard to a set.
    pub fn layer_set(&self, name: &str) -> Option<LayerSet> {
        self.masks
            .get(name)
            .copied()
            .or_else(|| layer_alias(name).map(LayerSet::single))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_names() {
        assert_eq!(PcbLayerId::F_CU.name(), "F.Cu");
        assert_eq!(PcbLayerId::B_CU.name(), "B.Cu");
        assert_eq!(PcbLayerId::inner(3).map(|l| l.name()), Some("In3.Cu"));
        assert_eq!(PcbLayerId::EDGE_CUTS.name(), "Edge.Cuts");
        assert_eq!(PcbLayerId::RESCUE.name(), "Rescue");
        assert_eq!(PcbLayerId::from_name("F.SilkS"), Some(PcbLayerId::F_SILKS));
        assert_eq!(PcbLayerId::from_name("Nope"), None);
    }

    #[test]
    fn test_legacy_front_back_special_cases() {
        for count in [2, 4, 16] {
            assert_eq!(legacy_layer_to_canonical(15, count), PcbLayerId::F_CU);
            assert_eq!(legacy_layer_to_canonical(0, count), PcbLayerId::B_CU);
        }
    }

    #[test]
    fn test_legacy_inner_layers_are_flipped() {
        // 4 layer board: legacy 1 is the inner layer next to the back side.
        assert_eq!(legacy_layer_to_canonical(1, 4), PcbLayerId::inner(2).unwrap());
        assert_eq!(legacy_layer_to_canonical(2, 4), PcbLayerId::inner(1).unwrap());
    }

    #[test]
    fn test_legacy_out_of_range_goes_to_comments() {
        assert_eq!(legacy_layer_to_canonical(29, 2), PcbLayerId::CMTS_USER);
        assert_eq!(legacy_layer_to_canonical(31, 2), PcbLayerId::CMTS_USER);
        assert_eq!(legacy_layer_to_canonical(28, 2), PcbLayerId::EDGE_CUTS);
        assert_eq!(legacy_layer_to_canonical(21, 2), PcbLayerId::F_SILKS);
    }

    #[test]
    fn test_legacy_layer_mapping_round_trips() {
        for count in (2..=16).step_by(2) {
            let mut raws: Vec<u32> = (1..count as u32 - 1).collect();
            raws.extend([LEGACY_FRONT, LEGACY_BACK]);
            raws.extend(LEGACY_FIRST_NON_COPPER..=LEGACY_LAST_NON_COPPER);
            for raw in raws {
                let canonical = legacy_layer_to_canonical(raw, count);
                assert_eq!(
                    canonical_to_legacy_layer(canonical, count),
                    Some(raw),
                    "count {count} raw {raw}"
                );
            }
        }
    }

    #[test]
    fn test_legacy_mask_all_copper() {
        let set = legacy_mask_to_layer_set(0x00E0_FFFF, 2);
        assert!(set.is_superset(LayerSet::all_copper()));
        assert!(set.contains(PcbLayerId::F_SILKS));
        assert!(set.contains(PcbLayerId::B_MASK));
        assert!(set.contains(PcbLayerId::F_MASK));
    }

    #[test]
    fn test_legacy_mask_smd_front() {
        // front copper, front paste, front mask
        let set = legacy_mask_to_layer_set(0x0088_8000, 2);
        assert_eq!(
            set,
            LayerSet::from_layers(&[PcbLayerId::F_CU, PcbLayerId::F_PASTE, PcbLayerId::F_MASK])
        );
    }

    #[test]
    fn test_legacy_copper_validity() {
        assert!(legacy_copper_layer_valid(15, 2));
        assert!(legacy_copper_layer_valid(0, 2));
        assert!(legacy_copper_layer_valid(1, 2));
        assert!(!legacy_copper_layer_valid(2, 2));
        assert!(legacy_copper_layer_valid(3, 4));
    }

    #[test]
    fn test_layer_set_ops() {
        let set = LayerSet::copper_for_count(4);
        assert_eq!(set.len(), 4);
        assert!(set.contains(PcbLayerId::inner(2).unwrap()));
        assert!(!set.contains(PcbLayerId::inner(3).unwrap()));
        assert_eq!(set.first(), Some(PcbLayerId::F_CU));
        assert!(set.has_copper());
        assert!(!LayerSet::single(PcbLayerId::F_SILKS).has_copper());
    }

    #[test]
    fn test_lookup_wildcards_and_aliases() {
        let lookup = LayerLookup::default();
        assert_eq!(lookup.layer_set("*.Cu"), Some(LayerSet::all_copper()));
        assert_eq!(
            lookup.layer_set("*.Mask"),
            Some(LayerSet::from_layers(&[PcbLayerId::F_MASK, PcbLayerId::B_MASK]))
        );
        assert_eq!(lookup.layer("Inner1.Cu"), PcbLayerId::inner(14));
        assert_eq!(lookup.layer("Composant"), Some(PcbLayerId::F_CU));
        assert_eq!(lookup.layer("Lötseite"), Some(PcbLayerId::B_CU));
        assert_eq!(lookup.layer("Superior"), Some(PcbLayerId::F_CU));
        assert_eq!(lookup.layer("Bogus.Layer"), None);
    }

    #[test]
    fn test_layer_table_defaults() {
        let table = LayerTable::default();
        assert_eq!(table.copper_count(), 2);
        assert!(table.is_enabled(PcbLayerId::F_CU));
        assert!(table.is_enabled(PcbLayerId::EDGE_CUTS));
        assert!(!table.is_enabled(PcbLayerId::inner(1).unwrap()));
        assert!(!table.is_enabled(PcbLayerId::RESCUE));
    }

    #[test]
    fn test_layer_table_user_names() {
        let mut table = LayerTable::default();
        table.set_user_name(PcbLayerId::F_CU, "Top");
        assert_eq!(table.get(PcbLayerId::F_CU).name(), "Top");
        table.set_user_name(PcbLayerId::F_CU, "F.Cu");
        assert_eq!(table.get(PcbLayerId::F_CU).user_name, None);
    }
}
