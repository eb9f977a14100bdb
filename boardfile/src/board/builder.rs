//! Board assembly and the finalization pass.

use std::collections::BTreeSet;

use crate::error::{BoardError, SourceLocation, Warning, WarningKind};
use crate::layers::PcbLayerId;
use crate::options::{LoadPolicy, UndefinedLayerAction};

use super::footprint::Footprint;
use super::group::{resolve_groups, GroupInfo, GroupParent};
use super::nets::UNCONNECTED;
use super::track::{Track, ViaType};
use super::zone::Zone;
use super::{Board, Drawing};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildState {
    Accumulating,
    Finalizing,
}

/// Collects parsed items into a [`Board`] and finalizes it once the input
/// is exhausted. Finalization consumes the builder, so a board is either
/// handed out complete or dropped.
#[derive(Debug)]
pub struct BoardBuilder {
    board: Board,
    state: BuildState,
    groups: Vec<GroupInfo>,
    undefined_layers: BTreeSet<String>,
}

impl Default for BoardBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl BoardBuilder {
    pub fn new() -> Self {
        Self {
            board: Board::new(),
            state: BuildState::Accumulating,
            groups: Vec::new(),
            undefined_layers: BTreeSet::new(),
        }
    }

    pub fn state(&self) -> BuildState {
        self.state
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn board_mut(&mut self) -> &mut Board {
        &mut self.board
    }

    /// Add a footprint and return its index.
    pub fn add_footprint(&mut self, footprint: Footprint) -> usize {
        self.board.footprints.push(footprint);
        self.board.footprints.len() - 1
    }

    pub fn add_drawing(&mut self, drawing: Drawing) {
        self.board.drawings.push(drawing);
    }

    pub fn add_track(&mut self, track: Track) {
        self.board.tracks.push(track);
    }

    pub fn add_zone(&mut self, zone: Zone) {
        self.board.zones.push(zone);
    }

    pub fn add_group(&mut self, info: GroupInfo) {
        self.groups.push(info);
    }

    /// Record a layer name that resolved to [`PcbLayerId::RESCUE`].
    pub fn note_undefined_layer(&mut self, name: &str) {
        self.undefined_layers.insert(name.to_string());
    }

    pub fn undefined_layers(&self) -> impl Iterator<Item = &str> {
        self.undefined_layers.iter().map(String::as_str)
    }

    /// Run the finalization steps in order: id index, undefined-layer
    /// policy, group resolution, zone net forcing. Returns the finished
    /// board and the warnings raised along the way.
    pub fn finalize(
        mut self,
        policy: &mut dyn LoadPolicy,
    ) -> Result<(Board, Vec<Warning>), BoardError> {
        self.state = BuildState::Finalizing;
        let mut warnings = Vec::new();
        let board = &mut self.board;

        for (id, _) in board.rebuild_index() {
            warnings.push(Warning {
                kind: WarningKind::DuplicateId,
                location: None,
                message: format!("duplicate item id {id}; the first item keeps it"),
            });
        }

        if !self.undefined_layers.is_empty() {
            let names: Vec<String> = self.undefined_layers.iter().cloned().collect();
            match policy.undefined_layers(&names) {
                UndefinedLayerAction::Rescue => {
                    let moved = rescue_items(board);
                    warnings.push(Warning {
                        kind: WarningKind::UndefinedLayer,
                        location: None,
                        message: format!(
                            "{moved} item(s) on undefined layer(s) {} moved to {}",
                            names.join(", "),
                            PcbLayerId::CMTS_USER
                        ),
                    });
                }
                UndefinedLayerAction::Delete => {
                    let surviving = surviving_footprints(board);
                    let removed = delete_rescued_items(board);
                    reparent_groups(&mut self.groups, &surviving);
                    board.rebuild_index();
                    warnings.push(Warning {
                        kind: WarningKind::UndefinedLayer,
                        location: None,
                        message: format!(
                            "{removed} item(s) on undefined layer(s) {} deleted",
                            names.join(", ")
                        ),
                    });
                }
                UndefinedLayerAction::Abort => {
                    return Err(BoardError::cancelled(format!(
                        "items on undefined layer(s): {}",
                        names.join(", ")
                    )));
                }
            }
        }

        resolve_groups(board, &self.groups, &mut warnings)?;

        for zone in board
            .zones
            .iter_mut()
            .chain(board.footprints.iter_mut().flat_map(|fp| fp.zones.iter_mut()))
        {
            if zone.is_rule_area() || !zone.is_on_copper() {
                zone.net = UNCONNECTED;
                zone.net_name.clear();
            }
        }

        board.mark_loaded();
        tracing::debug!(
            footprints = board.footprints.len(),
            tracks = board.tracks.len(),
            zones = board.zones.len(),
            groups = board.group_count(),
            "board finalized"
        );
        Ok((self.board, warnings))
    }

    /// Finalize a standalone footprint file: the footprint goes through the
    /// same passes as if it sat on an otherwise empty board.
    pub fn finalize_footprint(
        self,
        policy: &mut dyn LoadPolicy,
    ) -> Result<(Footprint, Vec<Warning>), BoardError> {
        let (mut board, warnings) = self.finalize(policy)?;
        let footprint = board
            .footprints
            .pop()
            .ok_or_else(|| {
                BoardError::syntax(SourceLocation::new("", 0, 0), "footprint file holds no footprint")
            })?;
        Ok((footprint, warnings))
    }
}

const RESCUE: PcbLayerId = PcbLayerId::RESCUE;

fn rescue_layer(layer: &mut PcbLayerId, target: PcbLayerId) -> usize {
    if *layer == RESCUE {
        *layer = target;
        1
    } else {
        0
    }
}

/// Move every item on the rescue layer to Cmts.User. Via ends go to the
/// outer copper layers instead; footprints go to the front.
fn rescue_items(board: &mut Board) -> usize {
    let mut moved = 0;
    for drawing in &mut board.drawings {
        if drawing.layer() == RESCUE {
            drawing.set_layer(PcbLayerId::CMTS_USER);
            moved += 1;
        }
    }
    for track in &mut board.tracks {
        moved += match track {
            Track::Segment(t) => rescue_layer(&mut t.layer, PcbLayerId::CMTS_USER),
            Track::Arc(a) => rescue_layer(&mut a.layer, PcbLayerId::CMTS_USER),
            Track::Via(v) if v.via_type == ViaType::Through => 0,
            Track::Via(v) => {
                rescue_layer(&mut v.top, PcbLayerId::F_CU)
                    + rescue_layer(&mut v.bottom, PcbLayerId::B_CU)
            }
        };
    }
    for zone in &mut board.zones {
        moved += rescue_zone(zone);
    }
    for fp in &mut board.footprints {
        moved += rescue_layer(&mut fp.layer, PcbLayerId::F_CU);
        for pad in &mut fp.pads {
            if pad.layers.contains(RESCUE) {
                pad.layers.remove(RESCUE);
                pad.layers.insert(PcbLayerId::CMTS_USER);
                moved += 1;
            }
        }
        for text in &mut fp.texts {
            moved += rescue_layer(&mut text.layer, PcbLayerId::CMTS_USER);
        }
        for shape in &mut fp.shapes {
            moved += rescue_layer(&mut shape.shape.layer, PcbLayerId::CMTS_USER);
        }
        for zone in &mut fp.zones {
            moved += rescue_zone(zone);
        }
        for dim in &mut fp.dimensions {
            let common = dim.common_mut();
            if common.layer == RESCUE {
                common.layer = PcbLayerId::CMTS_USER;
                common.text.layer = PcbLayerId::CMTS_USER;
                moved += 1;
            }
        }
    }
    moved
}

/// A zone counts once however many of its layers and fill pieces moved.
fn rescue_zone(zone: &mut Zone) -> usize {
    let mut moved = false;
    if zone.layers.contains(RESCUE) {
        zone.layers.remove(RESCUE);
        zone.layers.insert(PcbLayerId::CMTS_USER);
        moved = true;
    }
    for polygon in &mut zone.filled_polygons {
        moved |= rescue_layer(&mut polygon.layer, PcbLayerId::CMTS_USER) > 0;
    }
    for segments in &mut zone.fill_segments {
        moved |= rescue_layer(&mut segments.layer, PcbLayerId::CMTS_USER) > 0;
    }
    usize::from(moved)
}

/// New index of each footprint once those on the rescue layer are deleted.
fn surviving_footprints(board: &Board) -> Vec<Option<usize>> {
    let mut next = 0;
    board
        .footprints
        .iter()
        .map(|fp| {
            (fp.layer != RESCUE).then(|| {
                next += 1;
                next - 1
            })
        })
        .collect()
}

/// Point footprint groups at the footprint indices left after deletion. A
/// group whose footprint was deleted goes with it.
fn reparent_groups(groups: &mut Vec<GroupInfo>, surviving: &[Option<usize>]) {
    groups.retain_mut(|info| match info.parent {
        GroupParent::Board => true,
        GroupParent::Footprint(index) => match surviving.get(index).copied().flatten() {
            Some(new_index) => {
                info.parent = GroupParent::Footprint(new_index);
                true
            }
            None => false,
        },
    });
}

/// Remove every item on the rescue layer. Returns the number removed.
fn delete_rescued_items(board: &mut Board) -> usize {
    let before = count_items(board);
    board.drawings.retain(|d| d.layer() != RESCUE);
    board.tracks.retain(|t| match t {
        Track::Segment(s) => s.layer != RESCUE,
        Track::Arc(a) => a.layer != RESCUE,
        Track::Via(v) => v.via_type == ViaType::Through || (v.top != RESCUE && v.bottom != RESCUE),
    });
    board.zones.retain(|z| !z.layers.contains(RESCUE));
    for zone in &mut board.zones {
        drop_rescued_fill(zone);
    }
    board.footprints.retain(|fp| fp.layer != RESCUE);
    for fp in &mut board.footprints {
        fp.pads.retain(|p| !p.layers.contains(RESCUE));
        fp.texts.retain(|t| t.layer != RESCUE);
        fp.shapes.retain(|s| s.shape.layer != RESCUE);
        fp.zones.retain(|z| !z.layers.contains(RESCUE));
        for zone in &mut fp.zones {
            drop_rescued_fill(zone);
        }
        fp.dimensions.retain(|d| d.common().layer != RESCUE);
    }
    before - count_items(board)
}

fn drop_rescued_fill(zone: &mut Zone) {
    zone.filled_polygons.retain(|p| p.layer != RESCUE);
    zone.fill_segments.retain(|s| s.layer != RESCUE);
}

fn count_items(board: &Board) -> usize {
    board.drawings.len()
        + board.tracks.len()
        + board.zones.len()
        + board
            .footprints
            .iter()
            .map(|fp| {
                1 + fp.pads.len()
                    + fp.texts.len()
                    + fp.shapes.len()
                    + fp.zones.len()
                    + fp.dimensions.len()
            })
            .sum::<usize>()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::group::GroupParent;
    use crate::board::shape::{Shape, ShapeKind};
    use crate::board::zone::{KeepoutRules, Zone};
    use crate::geometry::Point;
    use crate::kiid::Kiid;
    use crate::options::LoadOptions;

    fn line_on(layer: PcbLayerId) -> Drawing {
        Drawing::Shape(Shape::new(
            ShapeKind::Segment {
                start: Point::new(0, 0),
                end: Point::new(1_000_000, 0),
            },
            layer,
            100_000,
        ))
    }

    fn group(id: Kiid, name: &str, members: Vec<Kiid>) -> GroupInfo {
        GroupInfo {
            parent: GroupParent::Board,
            id,
            name: name.to_string(),
            locked: false,
            member_ids: members,
            location: None,
        }
    }

    #[test]
    fn test_rescue_moves_to_comments() {
        let mut builder = BoardBuilder::new();
        builder.add_drawing(line_on(RESCUE));
        builder.note_undefined_layer("Mystery.Layer");
        let mut options = LoadOptions::default();
        let (board, warnings) = builder.finalize(&mut options).unwrap();
        assert_eq!(board.drawings[0].layer(), PcbLayerId::CMTS_USER);
        assert!(warnings.iter().any(|w| w.kind == WarningKind::UndefinedLayer));
        assert!(board.is_loaded());
    }

    #[test]
    fn test_delete_removes_and_reindexes() {
        let mut builder = BoardBuilder::new();
        let doomed = line_on(RESCUE);
        let doomed_id = doomed.id();
        builder.add_drawing(doomed);
        builder.add_drawing(line_on(PcbLayerId::F_SILKS));
        builder.note_undefined_layer("Mystery.Layer");
        let mut options = LoadOptions {
            undefined_layers: UndefinedLayerAction::Delete,
            ..Default::default()
        };
        let (board, _) = builder.finalize(&mut options).unwrap();
        assert_eq!(board.drawings.len(), 1);
        assert_eq!(board.find_item(&doomed_id), None);
        assert_eq!(board.indexed_len(), 1);
    }

    #[test]
    fn test_delete_keeps_footprint_groups_with_their_footprint() {
        use crate::board::text::{FootprintText, FootprintTextKind};

        let mut builder = BoardBuilder::new();
        builder.add_footprint(Footprint {
            layer: RESCUE,
            ..Default::default()
        });
        let label = FootprintText::new(FootprintTextKind::User, PcbLayerId::F_SILKS);
        let label_id = label.id;
        let mut kept = Footprint::default();
        kept.texts.push(label);
        let kept_id = kept.id;
        builder.add_footprint(kept);
        builder.add_group(GroupInfo {
            parent: GroupParent::Footprint(1),
            ..group(Kiid::new(), "labels", vec![label_id])
        });
        builder.note_undefined_layer("Mystery.Layer");

        let mut options = LoadOptions {
            undefined_layers: UndefinedLayerAction::Delete,
            ..Default::default()
        };
        let (board, _) = builder.finalize(&mut options).unwrap();
        assert_eq!(board.footprints.len(), 1);
        assert_eq!(board.footprints[0].id, kept_id);
        assert!(board.groups.is_empty());
        assert_eq!(board.footprints[0].groups.len(), 1);
        assert_eq!(board.footprints[0].groups[0].members, vec![label_id]);
    }

    #[test]
    fn test_delete_drops_groups_of_deleted_footprints() {
        let mut builder = BoardBuilder::new();
        builder.add_footprint(Footprint {
            layer: RESCUE,
            ..Default::default()
        });
        builder.add_group(GroupInfo {
            parent: GroupParent::Footprint(0),
            ..group(Kiid::new(), "orphan", Vec::new())
        });
        builder.note_undefined_layer("Mystery.Layer");

        let mut options = LoadOptions {
            undefined_layers: UndefinedLayerAction::Delete,
            ..Default::default()
        };
        let (board, _) = builder.finalize(&mut options).unwrap();
        assert!(board.footprints.is_empty());
        assert!(board.groups.is_empty());
    }

    #[test]
    fn test_rescue_moves_zone_fill() {
        use crate::board::zone::{FillSegments, FilledPolygon};

        let mut builder = BoardBuilder::new();
        builder.add_zone(Zone {
            filled_polygons: vec![FilledPolygon {
                layer: RESCUE,
                island: false,
                points: vec![Point::new(0, 0), Point::new(1, 0), Point::new(0, 1)],
            }],
            fill_segments: vec![FillSegments {
                layer: RESCUE,
                segments: vec![(Point::new(0, 0), Point::new(1, 0))],
            }],
            ..Default::default()
        });
        builder.note_undefined_layer("Mystery.Layer");
        let (board, _) = builder.finalize(&mut LoadOptions::default()).unwrap();

        let zone = &board.zones[0];
        assert!(zone.layers.contains(PcbLayerId::F_CU));
        assert_eq!(zone.filled_polygons[0].layer, PcbLayerId::CMTS_USER);
        assert_eq!(zone.fill_segments[0].layer, PcbLayerId::CMTS_USER);
    }

    #[test]
    fn test_abort_cancels() {
        let mut builder = BoardBuilder::new();
        builder.add_drawing(line_on(RESCUE));
        builder.note_undefined_layer("Mystery.Layer");
        let mut options = LoadOptions {
            undefined_layers: UndefinedLayerAction::Abort,
            ..Default::default()
        };
        let err = builder.finalize(&mut options).unwrap_err();
        assert!(err.is_cancelled());
    }

    #[test]
    fn test_group_resolution_is_order_independent() {
        let line = line_on(PcbLayerId::F_SILKS);
        let line_id = line.id();
        let inner = Kiid::new();
        let outer = Kiid::new();

        let mut builder = BoardBuilder::new();
        // outer is declared before the group it contains
        builder.add_group(group(outer, "outer", vec![inner]));
        builder.add_group(group(inner, "inner", vec![line_id]));
        builder.add_drawing(line);
        let (board, _) = builder.finalize(&mut LoadOptions::default()).unwrap();

        assert_eq!(board.groups.len(), 2);
        assert_eq!(board.groups[0].members, vec![inner]);
        assert_eq!(board.groups[1].members, vec![line_id]);
        assert_eq!(board.parent_group(&line_id).map(|g| g.name.as_str()), Some("inner"));
    }

    #[test]
    fn test_later_group_takes_member() {
        let line = line_on(PcbLayerId::F_SILKS);
        let line_id = line.id();
        let mut builder = BoardBuilder::new();
        builder.add_drawing(line);
        builder.add_group(group(Kiid::new(), "a", vec![line_id]));
        builder.add_group(group(Kiid::new(), "b", vec![line_id, Kiid::new()]));
        let (board, _) = builder.finalize(&mut LoadOptions::default()).unwrap();
        assert!(board.groups[0].members.is_empty());
        assert_eq!(board.groups[1].members, vec![line_id]);
    }

    #[test]
    fn test_group_cycle_is_fatal() {
        let a = Kiid::new();
        let b = Kiid::new();
        let mut builder = BoardBuilder::new();
        builder.add_group(group(a, "a", vec![b]));
        builder.add_group(group(b, "b", vec![a]));
        let err = builder.finalize(&mut LoadOptions::default()).unwrap_err();
        assert!(matches!(err, BoardError::GroupCycle { .. }));
    }

    #[test]
    fn test_group_self_membership_is_fatal() {
        let a = Kiid::new();
        let mut builder = BoardBuilder::new();
        builder.add_group(group(a, "self", vec![a]));
        let err = builder.finalize(&mut LoadOptions::default()).unwrap_err();
        assert!(matches!(err, BoardError::GroupCycle { group } if group == "self"));
    }

    #[test]
    fn test_rule_area_and_non_copper_zones_lose_net() {
        let mut builder = BoardBuilder::new();
        builder.add_zone(Zone {
            net: 3,
            net_name: "GND".to_string(),
            rule_area: Some(KeepoutRules::default()),
            ..Default::default()
        });
        builder.add_zone(Zone {
            net: 3,
            net_name: "GND".to_string(),
            layers: crate::layers::LayerSet::single(PcbLayerId::F_SILKS),
            ..Default::default()
        });
        builder.add_zone(Zone {
            net: 3,
            net_name: "GND".to_string(),
            ..Default::default()
        });
        let (board, _) = builder.finalize(&mut LoadOptions::default()).unwrap();
        assert_eq!(board.zones[0].net, UNCONNECTED);
        assert_eq!(board.zones[1].net, UNCONNECTED);
        assert_eq!(board.zones[2].net, 3);
    }
}
