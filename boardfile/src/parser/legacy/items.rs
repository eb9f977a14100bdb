//! Board items: graphics, texts, tracks and vias, zones, dimensions and
//! targets.

use crate::board::dimension::{height_from_crossbar, Dimension, DimensionCommon};
use crate::board::pad::ZoneConnection;
use crate::board::shape::{Shape, ShapeKind, Target, TargetShape};
use crate::board::text::{BoardText, HorizontalJustify};
use crate::board::track::{Track, TrackSegment, Via, ViaType};
use crate::board::zone::{
    close_ring, FillSegments, FilledPolygon, HatchStyle, KeepoutRules, Smoothing, Zone,
};
use crate::board::Drawing;
use crate::error::{BoardError, WarningKind};
use crate::geometry::{arc_from_center, Point};
use crate::layers::{legacy_copper_layer_valid, LayerSet, PcbLayerId, LEGACY_LAST_NON_COPPER};
use crate::units::Biu;

use super::super::lines::Line;
use super::LegacyParser;

/// Bit of the legacy status word that marks a locked item.
const LEGACY_LOCKED: u64 = 1 << 18;

/// A track or via record is a `Po` line followed by a `De` line.
struct TrackRecord {
    shape: i64,
    start: Point,
    end: Point,
    width: Biu,
    drill: Option<Biu>,
    line: usize,
}

impl<'a, 'p> LegacyParser<'a, 'p> {
    /// `$DRAWSEGMENT`: a `Po` line with the geometry and a `De` line with
    /// layer, kind-specific angle and id.
    pub(super) fn parse_drawsegment(&mut self) -> Result<(), BoardError> {
        let mut code = 0;
        let mut first = Point::default();
        let mut second = Point::default();
        let mut width = 0;
        let mut layer = PcbLayerId::DWGS_USER;
        let mut sweep = 0.0;
        let mut id = None;
        let mut controls = (Point::default(), Point::default());
        let mut points = Vec::new();

        loop {
            let line = self.section_line("$EndDRAWSEGMENT")?;
            let mut args = self.args(&line);
            match line.keyword().to_ascii_lowercase().as_str() {
                "$enddrawsegment" => break,
                "po" => {
                    code = args.int()?;
                    first = args.point()?;
                    second = args.point()?;
                    width = args.biu()?;
                }
                "de" => {
                    let raw = args.int()?;
                    layer = self.technical_layer(raw);
                    args.opt_int()?;
                    sweep = args.opt_angle()?.unwrap_or(0.0);
                    id = args.opt_kiid();
                    args.opt_field();
                    if let (Some(c1x), Some(c1y), Some(c2x), Some(c2y)) =
                        (args.opt_biu()?, args.opt_biu()?, args.opt_biu()?, args.opt_biu()?)
                    {
                        controls = (Point::new(c1x, c1y), Point::new(c2x, c2y));
                    }
                }
                "dl" => points.push(args.point()?),
                _ => {}
            }
        }

        let kind = match code {
            1 => ShapeKind::Rect {
                start: first,
                end: second,
            },
            2 => {
                let (start, mid, end) = arc_from_center(first, second, sweep);
                ShapeKind::Arc { start, mid, end }
            }
            3 => ShapeKind::Circle {
                center: first,
                end: second,
            },
            4 => ShapeKind::Polygon { points },
            5 => ShapeKind::Curve {
                start: first,
                control1: controls.0,
                control2: controls.1,
                end: second,
            },
            _ => ShapeKind::Segment {
                start: first,
                end: second,
            },
        };
        let mut shape = Shape::new(kind, layer, width);
        shape.filled = matches!(shape.kind, ShapeKind::Polygon { .. });
        if let Some(id) = id {
            shape.id = id;
        }
        self.builder.add_drawing(Drawing::Shape(shape));
        Ok(())
    }

    /// `$TEXTPCB`: `Te` and `nl` carry the lines of text, `Po` the
    /// placement, `De` the layer and style.
    pub(super) fn parse_textpcb(&mut self) -> Result<(), BoardError> {
        let mut text = BoardText::new("", PcbLayerId::CMTS_USER);
        loop {
            let line = self.section_line("$EndTEXTPCB")?;
            let mut args = self.args(&line);
            match line.keyword().to_ascii_lowercase().as_str() {
                "$endtextpcb" => break,
                "te" => text.text = args.opt_text().unwrap_or_default(),
                "nl" => {
                    text.text.push('\n');
                    text.text.push_str(&args.opt_text().unwrap_or_default());
                }
                "po" => {
                    text.position = args.point()?;
                    text.effects.size = args.size()?;
                    text.effects.thickness = args.biu()?;
                    text.angle = args.angle()?;
                }
                "de" => {
                    let raw = args.int()?.clamp(0, i64::from(LEGACY_LAST_NON_COPPER));
                    let not_mirrored = args.opt_int()?.unwrap_or(1);
                    if let Some(id) = args.opt_kiid() {
                        text.id = id;
                    }
                    let style = args.opt_text().unwrap_or_default();
                    let justify = args.opt_text().unwrap_or_default();
                    text.layer = self.layer(raw);
                    text.effects.mirrored = not_mirrored == 0;
                    text.effects.italic = style.eq_ignore_ascii_case("Italic");
                    text.effects.horizontal = match justify.as_str() {
                        "L" => HorizontalJustify::Left,
                        "R" => HorizontalJustify::Right,
                        _ => HorizontalJustify::Center,
                    };
                }
                _ => {}
            }
        }
        self.builder.add_drawing(Drawing::Text(text));
        Ok(())
    }

    /// `$TRACK`: pairs of `Po` and `De` lines. `De` type 1 is a via.
    pub(super) fn parse_tracks(&mut self, end: &str) -> Result<(), BoardError> {
        let end_lower = end.to_ascii_lowercase();
        let mut pending: Option<TrackRecord> = None;
        let mut count = 0usize;
        loop {
            let line = self.section_line(end)?;
            let keyword = line.keyword().to_ascii_lowercase();
            if keyword == end_lower {
                break;
            }
            match keyword.as_str() {
                "po" => {
                    let mut args = self.args(&line);
                    let shape = args.int()?;
                    let start = args.point()?;
                    let end = args.point()?;
                    let width = args.biu()?;
                    let drill = args.opt_biu()?.filter(|d| *d >= 0);
                    pending = Some(TrackRecord {
                        shape,
                        start,
                        end,
                        width,
                        drill,
                        line: line.number,
                    });
                }
                "de" => {
                    let Some(record) = pending.take() else {
                        return Err(self.ctx.error(line.number, 0, "'De' without preceding 'Po'"));
                    };
                    if self.parse_track_de(&line, record)? {
                        count += 1;
                    }
                }
                _ => {}
            }
        }
        tracing::debug!(count, "legacy tracks");
        Ok(())
    }

    /// Returns whether the item was kept.
    fn parse_track_de(&mut self, line: &Line<'a>, record: TrackRecord) -> Result<bool, BoardError> {
        let mut args = self.args(line);
        let raw_layer = args.int()?;
        let kind = args.int()?;
        let net_code = args.int()?;
        let id = args.opt_kiid().unwrap_or_default();
        let flags = args.opt_hex()?.unwrap_or(0);
        let locked = flags & LEGACY_LOCKED != 0;
        let copper_count = self.copper_count();

        let track = if kind == 1 {
            let via_type = ViaType::from_legacy(record.shape);
            let (top, bottom) = if via_type == ViaType::Through {
                (PcbLayerId::F_CU, PcbLayerId::B_CU)
            } else {
                let front = (raw_layer & 0x0F) as u32;
                let back = ((raw_layer >> 4) & 0x0F) as u32;
                if !legacy_copper_layer_valid(front, copper_count)
                    || !legacy_copper_layer_valid(back, copper_count)
                {
                    self.warn(
                        WarningKind::DroppedItem,
                        record.line,
                        format!("via on copper layers {front}/{back} that this board lacks was removed"),
                    );
                    return Ok(false);
                }
                (self.layer(i64::from(front)), self.layer(i64::from(back)))
            };
            let net = self
                .ctx
                .item_net(&self.builder.board().nets, net_code, "via", line.number, 0);
            let mut via = Via {
                id,
                position: record.start,
                diameter: record.width,
                drill: record.drill,
                top: PcbLayerId::F_CU,
                bottom: PcbLayerId::B_CU,
                via_type,
                net,
                locked,
                free: false,
                remove_unused_layers: false,
                keep_end_layers: false,
            };
            via.set_layer_pair(top, bottom);
            Track::Via(via)
        } else {
            let valid = u32::try_from(raw_layer)
                .is_ok_and(|raw| legacy_copper_layer_valid(raw, copper_count));
            if !valid {
                self.warn(
                    WarningKind::DroppedItem,
                    record.line,
                    format!("track on layer {raw_layer} that this board lacks was removed"),
                );
                return Ok(false);
            }
            let net = self
                .ctx
                .item_net(&self.builder.board().nets, net_code, "track", line.number, 0);
            Track::Segment(TrackSegment {
                id,
                start: record.start,
                end: record.end,
                width: record.width,
                layer: self.layer(raw_layer),
                net,
                locked,
            })
        };
        self.builder.add_track(track);
        Ok(true)
    }

    /// Zone fill segments from very old files. They carry no outline, so
    /// there is nothing to convert.
    pub(super) fn skip_obsolete_zone(&mut self, start: &Line<'a>) -> Result<(), BoardError> {
        let mut segments = 0usize;
        loop {
            let line = self.section_line("$EndZONE")?;
            if line.is("$EndZONE") {
                break;
            }
            if line.is("Po") {
                segments += 1;
            }
        }
        self.warn(
            WarningKind::Deprecated,
            start.number,
            format!("obsolete $ZONE section with {segments} fill segment(s) skipped"),
        );
        Ok(())
    }

    pub(super) fn parse_zone_outline(&mut self, start: &Line<'a>) -> Result<(), BoardError> {
        let mut zone = Zone::default();
        let mut file_net = 0;
        let mut ring: Vec<Point> = Vec::new();

        loop {
            let line = self.section_line("$endCZONE_OUTLINE")?;
            let keyword = line.keyword().to_ascii_lowercase();
            match keyword.as_str() {
                "$endczone_outline" => break,
                "zinfo" => {
                    let mut args = self.args(&line);
                    zone.id = args.kiid()?;
                    file_net = args.int()?;
                    zone.net_name = args.opt_text().unwrap_or_default();
                }
                "zlayer" => {
                    let raw = self.args(&line).int()?;
                    zone.layers = LayerSet::single(self.layer(raw));
                }
                "zaux" => {
                    let mut args = self.args(&line);
                    args.int()?;
                    let style = args.text()?;
                    zone.hatch_style = match style.as_str() {
                        "N" => HatchStyle::None,
                        "E" => HatchStyle::Edge,
                        "F" => HatchStyle::Full,
                        other => return Err(args.error(format!("invalid hatch style '{other}'"))),
                    };
                }
                "zsmoothing" => {
                    let mut args = self.args(&line);
                    let code = args.int()?;
                    zone.fill.smoothing = Smoothing::from_code(code)
                        .ok_or_else(|| args.error(format!("invalid smoothing type {code}")))?;
                    zone.fill.smoothing_radius = args.opt_biu()?.unwrap_or(0);
                }
                "zclearance" => {
                    let mut args = self.args(&line);
                    zone.clearance = args.biu()?;
                    let letter = args.text()?;
                    zone.connection = match letter.as_str() {
                        "I" => ZoneConnection::Full,
                        "T" => ZoneConnection::Thermal,
                        "H" => ZoneConnection::ThermalThroughHoleOnly,
                        "X" => ZoneConnection::None,
                        other => return Err(args.error(format!("invalid pad connection '{other}'"))),
                    };
                }
                "zminthickness" => zone.min_thickness = self.args(&line).biu()?,
                "zpriority" => {
                    let priority = self.args(&line).int()?;
                    zone.priority = u32::try_from(priority).unwrap_or(0);
                }
                "zoptions" => {
                    let mut args = self.args(&line);
                    let mode = args.int()?;
                    args.opt_int()?;
                    let state = args.opt_text().unwrap_or_default();
                    let gap = args.opt_biu()?;
                    let bridge = args.opt_biu()?;
                    zone.fill.filled = state == "S";
                    if let Some(gap) = gap {
                        zone.fill.thermal_gap = gap;
                    }
                    if let Some(bridge) = bridge {
                        zone.fill.thermal_bridge_width = bridge;
                    }
                    if mode == 1 {
                        self.ctx.confirm_segment_fill()?;
                        // Segment fills are recomputed as polygons.
                        zone.fill.filled = false;
                    }
                }
                "zkeepout" => {
                    let mut rules = KeepoutRules::default();
                    let mut fields = line.args();
                    while let (Some(what), Some(allowed)) = (fields.next(), fields.next()) {
                        let forbidden = allowed.text == "N";
                        match what.text.to_ascii_lowercase().as_str() {
                            "tracks" => rules.no_tracks = forbidden,
                            "vias" => rules.no_vias = forbidden,
                            "copperpour" => rules.no_copper_pour = forbidden,
                            "pads" => rules.no_pads = forbidden,
                            "footprints" => rules.no_footprints = forbidden,
                            _ => {}
                        }
                    }
                    zone.rule_area = Some(rules);
                }
                "zcorner" => {
                    let mut args = self.args(&line);
                    ring.push(args.point()?);
                    if args.opt_int()?.unwrap_or(0) != 0 {
                        zone.add_ring(std::mem::take(&mut ring));
                    }
                }
                "$polyscorners" => {
                    let polygons = self.parse_fill_polygons(zone.layer())?;
                    zone.filled_polygons.extend(polygons);
                }
                "$fillsegments" => {
                    let segments = self.parse_fill_segments(zone.layer())?;
                    zone.fill_segments.push(segments);
                }
                _ => {}
            }
        }
        if !ring.is_empty() {
            zone.add_ring(ring);
        }

        if zone.corner_count() < 3 {
            self.warn(
                WarningKind::DroppedItem,
                start.number,
                format!("zone with {} corner(s) removed", zone.corner_count()),
            );
            return Ok(());
        }

        zone.net = self.ctx.net_codes.map(file_net);
        let nets = &mut self.builder.board_mut().nets;
        self.ctx.zone_net(nets, &mut zone, start.number);
        self.builder.add_zone(zone);
        Ok(())
    }

    /// `x y end-of-contour utility` lines up to `$endPOLYSCORNERS`.
    fn parse_fill_polygons(&mut self, layer: PcbLayerId) -> Result<Vec<FilledPolygon>, BoardError> {
        let mut polygons = Vec::new();
        let mut points = Vec::new();
        loop {
            let line = self.section_line("$endPOLYSCORNERS")?;
            if line.is("$endPOLYSCORNERS") {
                break;
            }
            let mut args = self.args(&line);
            let x = args.biu()?;
            let y = args.biu()?;
            let end = args.opt_int()?.unwrap_or(0);
            points.push(Point::new(x, y));
            if end != 0 {
                polygons.push(FilledPolygon {
                    layer,
                    island: false,
                    points: close_ring(std::mem::take(&mut points)),
                });
            }
        }
        if !points.is_empty() {
            polygons.push(FilledPolygon {
                layer,
                island: false,
                points: close_ring(points),
            });
        }
        Ok(polygons)
    }

    fn parse_fill_segments(&mut self, layer: PcbLayerId) -> Result<FillSegments, BoardError> {
        let mut segments = Vec::new();
        loop {
            let line = self.section_line("$endFILLSEGMENTS")?;
            if line.is("$endFILLSEGMENTS") {
                break;
            }
            let mut fields = self.args(&line);
            let start = fields.point()?;
            let end = fields.point()?;
            segments.push((start, end));
        }
        Ok(FillSegments { layer, segments })
    }

    /// `$DIMENSION` (also spelled `$COTATION`). The legacy form always
    /// describes an aligned dimension.
    pub(super) fn parse_dimension(&mut self) -> Result<(), BoardError> {
        let mut common = DimensionCommon::new(PcbLayerId::DWGS_USER);
        let mut crossbar = (Point::default(), Point::default());

        loop {
            let line = self.section_line("$EndDIMENSION")?;
            let keyword = line.keyword().to_ascii_lowercase();
            let mut args = self.args(&line);
            match keyword.as_str() {
                "$enddimension" | "$endcotation" => break,
                "ge" => {
                    args.int()?;
                    let raw = args.int()?;
                    common.layer = self.technical_layer(raw);
                    if let Some(id) = args.opt_kiid() {
                        common.id = id;
                    }
                }
                "va" => {
                    // The value is recomputed from the geometry.
                    args.opt_field();
                }
                "te" => common.text.text = args.opt_text().unwrap_or_default(),
                "po" => {
                    common.text.position = args.point()?;
                    common.text.effects.size = args.size()?;
                    common.text.effects.thickness = args.biu()?;
                    common.text.angle = args.angle()?;
                    common.text.effects.mirrored = args.opt_int()?.is_some_and(|n| n == 0);
                }
                "sb" => {
                    args.int()?;
                    crossbar = (args.point()?, args.point()?);
                    common.style.thickness = args.biu()?;
                }
                "sd" => {
                    args.int()?;
                    common.start = args.point()?;
                }
                "sg" => {
                    args.int()?;
                    common.end = args.point()?;
                }
                _ => {}
            }
        }

        common.text.layer = common.layer;
        let height = height_from_crossbar(common.start, crossbar.0, crossbar.1);
        self.builder.add_drawing(Drawing::Dimension(Dimension::Aligned { common, height }));
        Ok(())
    }

    /// `$PCB_TARGET` (also spelled `$MIREPCB`):
    /// `Po shape layer x y size width id`.
    pub(super) fn parse_target(&mut self, start: &Line<'a>) -> Result<(), BoardError> {
        let end = if start.is("$MIREPCB") {
            "$EndMIREPCB"
        } else {
            "$EndPCB_TARGET"
        };
        let mut target = None;
        loop {
            let line = self.section_line(end)?;
            if line.is(end) {
                break;
            }
            if !line.is("Po") {
                continue;
            }
            let mut args = self.args(&line);
            let shape = if args.int()? == 1 {
                TargetShape::X
            } else {
                TargetShape::Plus
            };
            let raw = args.int()?;
            let position = args.point()?;
            let size = args.biu()?;
            let width = args.biu()?;
            let id = args.opt_kiid().unwrap_or_default();
            target = Some(Target {
                id,
                shape,
                position,
                size,
                width,
                layer: self.technical_layer(raw),
            });
        }
        if let Some(target) = target {
            self.builder.add_drawing(Drawing::Target(target));
        }
        Ok(())
    }
}
