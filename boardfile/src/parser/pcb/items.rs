//! Tracks, vias, zones and groups.

use crate::board::group::{GroupInfo, GroupParent};
use crate::board::pad::ZoneConnection;
use crate::board::track::{Track, TrackArc, TrackSegment, Via, ViaType};
use crate::board::zone::{
    FillSegments, FilledPolygon, HatchStyle, IslandRemoval, KeepoutRules, Smoothing, Zone,
    ZoneFillMode,
};
use crate::error::{BoardError, WarningKind};
use crate::kiid::Kiid;
use crate::layers::{LayerSet, PcbLayerId};
use crate::parser::sexp::SExp;

use super::PcbParser;

/// `island_area_min` is written in mm² and kept in square BIU.
const BIU2_PER_MM2: f64 = 1e12;

impl<'p> PcbParser<'p> {
    /// `(segment ...)` or `(arc ...)`. Tracks on copper layers this board
    /// does not have are dropped.
    pub(super) fn parse_track(&mut self, node: &SExp) -> Result<Option<Track>, BoardError> {
        let layer = self.item_layer(node)?;
        if layer.is_copper() && !self.builder.board().layers.is_valid_copper(layer) {
            self.warn(
                WarningKind::DroppedItem,
                node,
                format!("track on layer {} that this board lacks was removed", layer.name()),
            );
            return Ok(None);
        }
        let start = self.child_point(node, "start")?;
        let end = self.child_point(node, "end")?;
        let width = self.child_biu(node, "width")?.unwrap_or(0);
        let net = self.track_net(node, "track")?;
        let id = self.item_id(node);
        let locked = self.is_locked(node);

        let track = if node.head() == Some("arc") {
            Track::Arc(TrackArc {
                id,
                start,
                mid: self.child_point(node, "mid")?,
                end,
                width,
                layer,
                net,
                locked,
            })
        } else {
            Track::Segment(TrackSegment {
                id,
                start,
                end,
                width,
                layer,
                net,
                locked,
            })
        };
        Ok(Some(track))
    }

    /// `(via [blind|micro] (at) (size) (drill) (layers top bottom) (net) ...)`.
    /// A via that ends on a copper layer this board lacks is dropped.
    pub(super) fn parse_via(&mut self, node: &SExp) -> Result<Option<Track>, BoardError> {
        let mut via = Via {
            id: self.item_id(node),
            position: self.child_point(node, "at")?,
            diameter: self.child_biu(node, "size")?.unwrap_or(0),
            drill: self.child_biu(node, "drill")?,
            top: PcbLayerId::F_CU,
            bottom: PcbLayerId::B_CU,
            via_type: ViaType::Through,
            net: 0,
            locked: self.is_locked(node),
            free: node.has_flag("free"),
            remove_unused_layers: node.has_flag("remove_unused_layers"),
            keep_end_layers: node.has_flag("keep_end_layers"),
        };
        if node.has_flag("blind") {
            via.via_type = ViaType::BlindBuried;
        } else if node.has_flag("micro") {
            via.via_type = ViaType::Micro;
        }
        if let Some(layers) = node.get("layers") {
            let top = self.atom_at(layers, 0)?;
            let bottom = self.atom_at(layers, 1)?;
            let top = self.resolve_layer(top);
            let bottom = self.resolve_layer(bottom);
            let layers = &self.builder.board().layers;
            let missing = [top, bottom]
                .into_iter()
                .find(|l| l.is_copper() && !layers.is_valid_copper(*l));
            if let Some(missing) = missing {
                self.warn(
                    WarningKind::DroppedItem,
                    node,
                    format!("via on layer {} that this board lacks was removed", missing.name()),
                );
                return Ok(None);
            }
            via.set_layer_pair(top, bottom);
        }
        via.net = self.track_net(node, "via")?;
        Ok(Some(Track::Via(via)))
    }

    fn track_net(&mut self, node: &SExp, what: &str) -> Result<i32, BoardError> {
        let Some(net) = node.get("net") else {
            return Ok(0);
        };
        let file_code = self.int_at(net, 0)?;
        Ok(self.ctx.item_net(
            &self.builder.board().nets,
            file_code,
            what,
            net.pos.line,
            net.pos.line_offset(),
        ))
    }

    /// A copper zone or rule area. Zones without a usable outline are
    /// dropped.
    pub(super) fn parse_zone(&mut self, node: &SExp) -> Result<Option<Zone>, BoardError> {
        let mut zone = Zone {
            id: self.item_id(node),
            locked: self.is_locked(node),
            ..Zone::default()
        };

        if let Some(layers) = node.get("layers") {
            zone.layers = self.layer_set(layers);
        } else {
            zone.layers = LayerSet::single(self.item_layer(node)?);
        }

        for child in node.args() {
            let Some(key) = child.head() else {
                continue;
            };
            match key {
                "net" => {
                    let file_code = self.int_at(child, 0)?;
                    zone.net = self.ctx.net_codes.map(file_code);
                }
                "net_name" => zone.net_name = self.text(self.atom_at(child, 0)?),
                "name" => zone.name = self.atom_at(child, 0)?.to_string(),
                "hatch" => {
                    let style = self.atom_at(child, 0)?;
                    zone.hatch_style = HatchStyle::parse(style)
                        .ok_or_else(|| self.error(child, format!("unknown hatch style '{style}'")))?;
                    zone.hatch_pitch = self.biu_at(child, 1)?;
                }
                "priority" => {
                    let priority = self.int_at(child, 0)?;
                    zone.priority = u32::try_from(priority)
                        .map_err(|_| self.error(child, format!("invalid zone priority {priority}")))?;
                }
                "connect_pads" => {
                    zone.connection = match child.args().first().and_then(SExp::as_symbol) {
                        Some("yes") => ZoneConnection::Full,
                        Some("no") => ZoneConnection::None,
                        Some("thru_hole_only") => ZoneConnection::ThermalThroughHoleOnly,
                        _ => ZoneConnection::Thermal,
                    };
                    if let Some(clearance) = self.child_biu(child, "clearance")? {
                        zone.clearance = clearance;
                    }
                }
                "min_thickness" => zone.min_thickness = self.biu_at(child, 0)?,
                "filled_areas_thickness" => zone.filled_areas_thickness = self.yes_no_at(child, 0)?,
                "keepout" => zone.rule_area = Some(self.parse_keepout(child)?),
                "fill" => self.parse_zone_fill(child, &mut zone)?,
                "polygon" => {
                    let pts = child
                        .get("pts")
                        .ok_or_else(|| self.error(child, "polygon without 'pts'"))?;
                    zone.add_ring(self.points(pts)?);
                }
                "filled_polygon" => {
                    let layer = match child.get("layer") {
                        Some(layer) => self.resolve_layer(self.atom_at(layer, 0)?),
                        None => zone.layer(),
                    };
                    let pts = child
                        .get("pts")
                        .ok_or_else(|| self.error(child, "filled polygon without 'pts'"))?;
                    zone.filled_polygons.push(FilledPolygon {
                        layer,
                        island: child.has_flag("island") || child.get("island").is_some(),
                        points: self.points(pts)?,
                    });
                }
                "fill_segments" => {
                    let layer = match child.get("layer") {
                        Some(layer) => self.resolve_layer(self.atom_at(layer, 0)?),
                        None => zone.layer(),
                    };
                    let pts = child
                        .get("pts")
                        .ok_or_else(|| self.error(child, "fill segments without 'pts'"))?;
                    let points = self.points(pts)?;
                    let segments = points.chunks_exact(2).map(|pair| (pair[0], pair[1])).collect();
                    zone.fill_segments.push(FillSegments { layer, segments });
                }
                _ => {}
            }
        }

        if zone.corner_count() < 3 {
            self.warn(
                WarningKind::DroppedItem,
                node,
                format!("zone with {} corner(s) removed", zone.corner_count()),
            );
            return Ok(None);
        }
        self.ctx
            .zone_net(&mut self.builder.board_mut().nets, &mut zone, node.pos.line);
        Ok(Some(zone))
    }

    /// `(keepout (tracks not_allowed) (vias allowed) ...)`.
    fn parse_keepout(&self, node: &SExp) -> Result<KeepoutRules, BoardError> {
        let mut rules = KeepoutRules::default();
        for child in node.args() {
            let Some(key) = child.head() else {
                continue;
            };
            let forbidden = match self.atom_at(child, 0)? {
                "not_allowed" => true,
                "allowed" => false,
                other => return Err(self.error(child, format!("expected allowed or not_allowed, found '{other}'"))),
            };
            match key {
                "tracks" => rules.no_tracks = forbidden,
                "vias" => rules.no_vias = forbidden,
                "pads" => rules.no_pads = forbidden,
                "copperpour" => rules.no_copper_pour = forbidden,
                "footprints" => rules.no_footprints = forbidden,
                _ => {}
            }
        }
        Ok(rules)
    }

    /// `(fill [yes] (mode hatch|segment) (thermal_gap) (thermal_bridge_width) ...)`.
    fn parse_zone_fill(&mut self, node: &SExp, zone: &mut Zone) -> Result<(), BoardError> {
        let fill = &mut zone.fill;
        fill.filled = node.has_flag("yes");
        for child in node.args() {
            let Some(key) = child.head() else {
                continue;
            };
            match key {
                "mode" => match self.atom_at(child, 0)? {
                    "hatch" => fill.mode = ZoneFillMode::Hatched,
                    "segment" => {
                        self.ctx.confirm_segment_fill()?;
                        self.warn(
                            WarningKind::Deprecated,
                            child,
                            "segment zone fill converted to polygons; refill required".to_string(),
                        );
                        fill.mode = ZoneFillMode::Polygons;
                        fill.filled = false;
                    }
                    _ => fill.mode = ZoneFillMode::Polygons,
                },
                "arc_segments" => {}
                "thermal_gap" => fill.thermal_gap = self.biu_at(child, 0)?,
                "thermal_bridge_width" => fill.thermal_bridge_width = self.biu_at(child, 0)?,
                "smoothing" => {
                    let name = self.atom_at(child, 0)?;
                    fill.smoothing = Smoothing::parse(name)
                        .ok_or_else(|| self.error(child, format!("unknown smoothing '{name}'")))?;
                }
                "radius" => fill.smoothing_radius = self.biu_at(child, 0)?,
                "island_removal_mode" => {
                    let code = self.int_at(child, 0)?;
                    fill.island_removal = IslandRemoval::from_code(code)
                        .ok_or_else(|| self.error(child, format!("invalid island removal mode {code}")))?;
                }
                "island_area_min" => {
                    fill.island_area_min =
                        (self.double_at(child, 0)? * BIU2_PER_MM2).round() as i64;
                }
                "hatch_thickness" => fill.hatch_thickness = self.biu_at(child, 0)?,
                "hatch_gap" => fill.hatch_gap = self.biu_at(child, 0)?,
                "hatch_orientation" => fill.hatch_orientation = self.double_at(child, 0)?,
                "hatch_smoothing_level" => fill.hatch_smoothing_level = self.int_at(child, 0)?,
                "hatch_smoothing_value" => fill.hatch_smoothing_value = self.double_at(child, 0)?,
                "hatch_border_algorithm" => {
                    fill.hatch_border_algorithm = match self.atom_at(child, 0)? {
                        "hatch_thickness" => 1,
                        "min_thickness" => 0,
                        _ => self.int_at(child, 0)?,
                    };
                }
                "hatch_min_hole_area" => fill.hatch_min_hole_area = self.double_at(child, 0)?,
                _ => {}
            }
        }
        Ok(())
    }

    /// `(group "name" (id ...) (members ...))`. Members are resolved after
    /// the whole file is read.
    pub(super) fn parse_group(
        &mut self,
        node: &SExp,
        parent: GroupParent,
    ) -> Result<(), BoardError> {
        let name = self.atom_at(node, 0)?.to_string();
        let id = node
            .get_atom("id")
            .map(Kiid::parse)
            .unwrap_or_else(|| self.item_id(node));
        let member_ids = node
            .get("members")
            .map(|members| {
                members
                    .args()
                    .iter()
                    .filter_map(SExp::as_atom)
                    .map(Kiid::parse)
                    .collect()
            })
            .unwrap_or_default();
        let info = GroupInfo {
            parent,
            id,
            name,
            locked: self.is_locked(node),
            member_ids,
            location: Some(self.site(node).location()),
        };
        self.builder.add_group(info);
        Ok(())
    }
}
