//! Footprints, graphics, tracks, zones and groups.

use crate::board::dimension::{Dimension, OrthogonalAxis};
use crate::board::footprint::{Footprint, FootprintType, Model3d};
use crate::board::group::Group;
use crate::board::pad::{
    CustomAnchor, CustomClearance, DrillShape, LocalOverrides, Pad, PadShape, ZoneConnection,
};
use crate::board::shape::{LineStyle, Shape, ShapeKind, Target, TargetShape};
use crate::board::text::{
    BoardText, FootprintText, HorizontalJustify, TextEffects, VerticalJustify,
};
use crate::board::track::{Track, ViaType};
use crate::board::zone::{IslandRemoval, Smoothing, Zone, ZoneFillMode};
use crate::board::{Drawing, SEXPR_BOARD_FILE_VERSION, UNCONNECTED};
use crate::geometry::{round_angle, Point};
use crate::kiid::Kiid;

use super::format::{at, layer, layers, mm, num, pts, quoted, size, xy, yes_no};
use super::{BoardWriter, GENERATOR};

const BIU2_PER_MM2: f64 = 1e12;
const DEFAULT_ROUNDRECT_RATIO: f64 = 0.25;
const DEFAULT_CHAMFER_RATIO: f64 = 0.2;

fn tstamp(id: &Kiid) -> String {
    format!("(tstamp {id})")
}

fn effects(effects: &TextEffects, with_hide: bool) -> String {
    let mut font = format!(
        "(font (size {} {}) (thickness {})",
        mm(effects.size.height),
        mm(effects.size.width),
        mm(effects.thickness)
    );
    if effects.bold {
        font.push_str(" bold");
    }
    if effects.italic {
        font.push_str(" italic");
    }
    font.push(')');

    let mut justify = Vec::new();
    match effects.horizontal {
        HorizontalJustify::Left => justify.push("left"),
        HorizontalJustify::Right => justify.push("right"),
        HorizontalJustify::Center => {}
    }
    match effects.vertical {
        VerticalJustify::Top => justify.push("top"),
        VerticalJustify::Bottom => justify.push("bottom"),
        VerticalJustify::Center => {}
    }
    if effects.mirrored {
        justify.push("mirror");
    }

    let mut out = format!("(effects {font}");
    if !justify.is_empty() {
        out.push_str(&format!(" (justify {})", justify.join(" ")));
    }
    if with_hide && effects.hidden {
        out.push_str(" hide");
    }
    out.push(')');
    out
}

fn locked_flag(locked: bool) -> &'static str {
    if locked {
        " locked"
    } else {
        ""
    }
}

impl<'b> BoardWriter<'b> {
    pub(super) fn footprint(&mut self, fp: &Footprint, depth: usize, standalone: bool) {
        let inner = depth + 1;
        let mut head = format!("(footprint {}", quoted(&fp.lib_id));
        if standalone {
            head.push_str(&format!(
                " (version {SEXPR_BOARD_FILE_VERSION}) (generator {GENERATOR})"
            ));
        }
        head.push_str(locked_flag(fp.locked));
        if fp.placed {
            head.push_str(" placed");
        }
        head.push(' ');
        head.push_str(&layer(fp.layer));
        self.out.line(depth, head);

        if let Some(stamp) = fp.last_edit {
            self.out.line(inner, format!("(tedit {stamp:08X}) {}", tstamp(&fp.id)));
        } else {
            self.out.line(inner, tstamp(&fp.id));
        }
        if !standalone || fp.position != Point::default() || fp.orientation != 0.0 {
            self.out.line(inner, at(fp.position, fp.orientation));
        }
        if !fp.description.is_empty() {
            self.out.line(inner, format!("(descr {})", quoted(&fp.description)));
        }
        if !fp.keywords.is_empty() {
            self.out.line(inner, format!("(tags {})", quoted(&fp.keywords)));
        }
        for property in &fp.properties {
            self.out.line(
                inner,
                format!("(property {} {})", quoted(&property.name), quoted(&property.value)),
            );
        }
        if let Some(path) = &fp.path {
            self.out.line(inner, format!("(path {})", quoted(path)));
        }
        if fp.autoplace_cost90 != 0 {
            self.out.line(inner, format!("(autoplace_cost90 {})", fp.autoplace_cost90));
        }
        if fp.autoplace_cost180 != 0 {
            self.out.line(inner, format!("(autoplace_cost180 {})", fp.autoplace_cost180));
        }
        for line in overrides(&fp.overrides) {
            self.out.line(inner, line);
        }
        self.footprint_attributes(fp, inner);

        for text in &fp.texts {
            self.footprint_text(text, inner);
        }
        for shape in &fp.shapes {
            self.shape("fp_", &shape.shape, &shape.local, inner);
        }
        for pad in &fp.pads {
            self.pad(pad, inner);
        }
        for zone in &fp.zones {
            self.zone(zone, inner);
        }
        for dimension in &fp.dimensions {
            self.dimension(dimension, inner);
        }
        for group in &fp.groups {
            self.group(group, inner);
        }
        for model in &fp.models {
            self.model(model, inner);
        }
        self.out.line(depth, ")");
    }

    fn footprint_attributes(&mut self, fp: &Footprint, depth: usize) {
        let attributes = &fp.attributes;
        let mut tokens = Vec::new();
        match attributes.kind {
            FootprintType::Smd => tokens.push("smd"),
            FootprintType::ThroughHole => tokens.push("through_hole"),
            FootprintType::Unspecified => {}
        }
        if attributes.board_only {
            tokens.push("board_only");
        }
        if attributes.exclude_from_pos_files {
            tokens.push("exclude_from_pos_files");
        }
        if attributes.exclude_from_bom {
            tokens.push("exclude_from_bom");
        }
        if !tokens.is_empty() {
            self.out.line(depth, format!("(attr {})", tokens.join(" ")));
        }
    }

    fn footprint_text(&mut self, text: &FootprintText, depth: usize) {
        let mut position = format!("(at {}", xy(text.local_position));
        let angle = round_angle(text.angle);
        if angle != 0.0 {
            position.push_str(&format!(" {}", num(angle)));
        }
        if !text.keep_upright {
            position.push_str(" unlocked");
        }
        position.push(')');

        let mut line = format!(
            "(fp_text {} {}{} {position} {}",
            text.kind.as_str(),
            quoted(&text.text),
            locked_flag(text.locked),
            layer(text.layer)
        );
        if text.effects.hidden {
            line.push_str(" hide");
        }
        self.out.line(depth, line);
        self.out.line(depth + 1, effects(&text.effects, false));
        self.out.line(depth + 1, tstamp(&text.id));
        self.out.line(depth, ")");
    }

    /// A `gr_*` or `fp_*` shape. `kind` is the geometry to write, which for
    /// footprint shapes is the footprint-local one.
    fn shape(&mut self, prefix: &str, shape: &Shape, kind: &ShapeKind, depth: usize) {
        let line = format!(
            "({prefix}{}{} {} {} {} {})",
            kind.keyword(),
            locked_flag(shape.locked),
            geometry(kind),
            layer(shape.layer),
            stroke_and_fill(shape, kind),
            tstamp(&shape.id)
        );
        self.out.line(depth, line);
    }

    fn pad(&mut self, pad: &Pad, depth: usize) {
        let inner = depth + 1;
        let mut head = format!(
            "(pad {} {} {}{}",
            quoted(&pad.number),
            pad.attribute.as_str(),
            pad.shape.as_str(),
            locked_flag(pad.locked)
        );
        head.push(' ');
        head.push_str(&at(pad.local_position, pad.angle));
        head.push(' ');
        head.push_str(&size(pad.size));
        self.out.line(depth, head);

        if pad.delta != Default::default() {
            self.out.line(
                inner,
                format!("(rect_delta {} {})", mm(pad.delta.width), mm(pad.delta.height)),
            );
        }
        if let Some(drill) = &pad.drill {
            let mut text = String::from("(drill");
            match drill.shape {
                DrillShape::Oblong => text.push_str(&format!(
                    " oval {} {}",
                    mm(drill.size.width),
                    mm(drill.size.height)
                )),
                DrillShape::Circle => text.push_str(&format!(" {}", mm(drill.size.width))),
            }
            if drill.offset != Point::default() {
                text.push_str(&format!(" (offset {})", xy(drill.offset)));
            }
            text.push(')');
            self.out.line(inner, text);
        }
        if let Some(property) = pad.property.as_str() {
            self.out.line(inner, format!("(property {property})"));
        }

        let mut layer_line = layers(pad.layers);
        if pad.remove_unused_layers {
            layer_line.push_str(" remove_unused_layers");
        }
        if pad.keep_end_layers {
            layer_line.push_str(" keep_end_layers");
        }
        self.out.line(inner, layer_line);

        let rounded = matches!(pad.shape, PadShape::RoundRect | PadShape::ChamferedRect);
        if rounded || pad.roundrect_ratio != DEFAULT_ROUNDRECT_RATIO {
            self.out.line(inner, format!("(roundrect_rratio {})", num(pad.roundrect_ratio)));
        }
        if pad.chamfers.any() || pad.chamfer_ratio != DEFAULT_CHAMFER_RATIO {
            self.out.line(inner, format!("(chamfer_ratio {})", num(pad.chamfer_ratio)));
        }
        if pad.chamfers.any() {
            self.out.line(inner, format!("(chamfer {})", pad.chamfers.names().join(" ")));
        }
        if let Some(nets) = self.nets {
            if !pad.is_orphaned() && pad.net != UNCONNECTED {
                self.out.line(
                    inner,
                    format!("(net {} {})", pad.net, quoted(nets.name(pad.net))),
                );
            }
        }
        if let Some(function) = &pad.pin_function {
            self.out.line(inner, format!("(pinfunction {})", quoted(function)));
        }
        if let Some(pin_type) = &pad.pin_type {
            self.out.line(inner, format!("(pintype {})", quoted(pin_type)));
        }
        if pad.die_length != 0 {
            self.out.line(inner, format!("(die_length {})", mm(pad.die_length)));
        }
        for line in overrides(&pad.overrides) {
            self.out.line(inner, line);
        }

        if let Some(custom) = &pad.custom {
            let clearance = match custom.clearance {
                CustomClearance::Outline => "outline",
                CustomClearance::ConvexHull => "convexhull",
            };
            let anchor = match custom.anchor {
                CustomAnchor::Circle => "circle",
                CustomAnchor::Rect => "rect",
            };
            self.out.line(inner, format!("(options (clearance {clearance}) (anchor {anchor}))"));
            if !custom.primitives.is_empty() {
                self.out.line(inner, "(primitives");
                for primitive in &custom.primitives {
                    self.out.line(
                        inner + 1,
                        format!(
                            "(gr_{} {} {})",
                            primitive.kind.keyword(),
                            geometry(&primitive.kind),
                            stroke_and_fill(primitive, &primitive.kind)
                        ),
                    );
                }
                self.out.line(inner, ")");
            }
        }
        self.out.line(inner, tstamp(&pad.id));
        self.out.line(depth, ")");
    }

    fn model(&mut self, model: &Model3d, depth: usize) {
        let xyz = |v: &[f64; 3]| format!("(xyz {} {} {})", num(v[0]), num(v[1]), num(v[2]));
        let mut head = format!("(model {}", quoted(&model.path));
        if model.hidden {
            head.push_str(" hide");
        }
        if let Some(opacity) = model.opacity {
            head.push_str(&format!(" (opacity {})", num(opacity)));
        }
        self.out.line(depth, head);
        self.out.line(depth + 1, format!("(offset {})", xyz(&model.offset)));
        self.out.line(depth + 1, format!("(scale {})", xyz(&model.scale)));
        self.out.line(depth + 1, format!("(rotate {})", xyz(&model.rotate)));
        self.out.line(depth, ")");
    }

    pub(super) fn drawing(&mut self, drawing: &Drawing, depth: usize) {
        match drawing {
            Drawing::Shape(shape) => self.shape("gr_", shape, &shape.kind, depth),
            Drawing::Text(text) => self.board_text(text, depth),
            Drawing::Dimension(dimension) => self.dimension(dimension, depth),
            Drawing::Target(target) => self.target(target, depth),
        }
    }

    fn board_text(&mut self, text: &BoardText, depth: usize) {
        let mut layer_text = layer(text.layer);
        if text.knockout {
            layer_text.insert_str(layer_text.len() - 1, " knockout");
        }
        self.out.line(
            depth,
            format!(
                "(gr_text {}{} {} {layer_text} {}",
                quoted(&text.text),
                locked_flag(text.locked),
                at(text.position, text.angle),
                tstamp(&text.id)
            ),
        );
        self.out.line(depth + 1, effects(&text.effects, true));
        self.out.line(depth, ")");
    }

    fn dimension(&mut self, dimension: &Dimension, depth: usize) {
        let inner = depth + 1;
        let common = dimension.common();
        self.out.line(
            depth,
            format!(
                "(dimension{} (type {}) {} {}",
                locked_flag(common.locked),
                dimension.type_name(),
                layer(common.layer),
                tstamp(&common.id)
            ),
        );
        self.out.line(inner, pts(&[common.start, common.end]));
        match dimension {
            Dimension::Aligned { height, .. } => {
                self.out.line(inner, format!("(height {})", mm(*height)));
            }
            Dimension::Orthogonal { height, axis, .. } => {
                self.out.line(inner, format!("(height {})", mm(*height)));
                let orientation = match axis {
                    OrthogonalAxis::Horizontal => 0,
                    OrthogonalAxis::Vertical => 1,
                };
                self.out.line(inner, format!("(orientation {orientation})"));
            }
            Dimension::Leader { .. } | Dimension::Center { .. } => {}
        }
        if !matches!(dimension, Dimension::Center { .. }) {
            self.board_text(&common.text, inner);
        }

        let f = &common.format;
        let mut format_line = format!(
            "(format (prefix {}) (suffix {}) (units {}) (units_format {}) (precision {})",
            quoted(&f.prefix),
            quoted(&f.suffix),
            f.units.code(),
            f.units_format,
            f.precision
        );
        if let Some(value) = &f.override_value {
            format_line.push_str(&format!(" (override_value {})", quoted(value)));
        }
        if f.suppress_zeroes {
            format_line.push_str(" suppress_zeroes");
        }
        format_line.push(')');
        self.out.line(inner, format_line);

        let s = &common.style;
        let mut style_line = format!(
            "(style (thickness {}) (arrow_length {}) (text_position_mode {}) (extension_height {}) (extension_offset {})",
            mm(s.thickness),
            mm(s.arrow_length),
            s.text_position_mode,
            mm(s.extension_height),
            mm(s.extension_offset)
        );
        if let Some(frame) = s.text_frame {
            style_line.push_str(&format!(" (text_frame {frame})"));
        }
        if s.keep_text_aligned {
            style_line.push_str(" keep_text_aligned");
        }
        style_line.push(')');
        self.out.line(inner, style_line);
        self.out.line(depth, ")");
    }

    fn target(&mut self, target: &Target, depth: usize) {
        let shape = match target.shape {
            TargetShape::Plus => "plus",
            TargetShape::X => "x",
        };
        self.out.line(
            depth,
            format!(
                "(target {shape} (at {}) (size {}) (width {}) {} {})",
                xy(target.position),
                mm(target.size),
                mm(target.width),
                layer(target.layer),
                tstamp(&target.id)
            ),
        );
    }

    pub(super) fn track(&mut self, track: &Track, depth: usize) {
        let line = match track {
            Track::Segment(t) => format!(
                "(segment{} (start {}) (end {}) (width {}) {} (net {}) {})",
                locked_flag(t.locked),
                xy(t.start),
                xy(t.end),
                mm(t.width),
                layer(t.layer),
                t.net,
                tstamp(&t.id)
            ),
            Track::Arc(a) => format!(
                "(arc{} (start {}) (mid {}) (end {}) (width {}) {} (net {}) {})",
                locked_flag(a.locked),
                xy(a.start),
                xy(a.mid),
                xy(a.end),
                mm(a.width),
                layer(a.layer),
                a.net,
                tstamp(&a.id)
            ),
            Track::Via(v) => {
                let mut line = String::from("(via");
                match v.via_type {
                    ViaType::BlindBuried => line.push_str(" blind"),
                    ViaType::Micro => line.push_str(" micro"),
                    ViaType::Through => {}
                }
                line.push_str(locked_flag(v.locked));
                line.push_str(&format!(" (at {}) (size {})", xy(v.position), mm(v.diameter)));
                if let Some(drill) = v.drill {
                    line.push_str(&format!(" (drill {})", mm(drill)));
                }
                line.push_str(&format!(
                    " (layers {} {})",
                    quoted(v.top.name()),
                    quoted(v.bottom.name())
                ));
                if v.remove_unused_layers {
                    line.push_str(" remove_unused_layers");
                }
                if v.keep_end_layers {
                    line.push_str(" keep_end_layers");
                }
                if v.free {
                    line.push_str(" free");
                }
                line.push_str(&format!(" (net {}) {})", v.net, tstamp(&v.id)));
                line
            }
        };
        self.out.line(depth, line);
    }

    pub(super) fn zone(&mut self, zone: &Zone, depth: usize) {
        let inner = depth + 1;
        let layer_text = if zone.layers.len() == 1 {
            layer(zone.layer())
        } else {
            layers(zone.layers)
        };
        self.out.line(
            depth,
            format!(
                "(zone{} (net {}) (net_name {}) {layer_text} {}",
                locked_flag(zone.locked),
                zone.net,
                quoted(&zone.net_name),
                tstamp(&zone.id)
            ),
        );
        if !zone.name.is_empty() {
            self.out.line(inner, format!("(name {})", quoted(&zone.name)));
        }
        self.out.line(
            inner,
            format!("(hatch {} {})", zone.hatch_style.as_str(), mm(zone.hatch_pitch)),
        );
        if zone.priority != 0 {
            self.out.line(inner, format!("(priority {})", zone.priority));
        }
        let connection = match zone.connection {
            ZoneConnection::Full => "yes ",
            ZoneConnection::None => "no ",
            ZoneConnection::ThermalThroughHoleOnly => "thru_hole_only ",
            ZoneConnection::Thermal | ZoneConnection::Inherited => "",
        };
        self.out.line(
            inner,
            format!("(connect_pads {connection}(clearance {}))", mm(zone.clearance)),
        );
        self.out.line(inner, format!("(min_thickness {})", mm(zone.min_thickness)));
        self.out.line(
            inner,
            format!("(filled_areas_thickness {})", yes_no(zone.filled_areas_thickness)),
        );
        if let Some(rules) = &zone.rule_area {
            let rule = |forbidden: bool| if forbidden { "not_allowed" } else { "allowed" };
            self.out.line(
                inner,
                format!(
                    "(keepout (tracks {}) (vias {}) (pads {}) (copperpour {}) (footprints {}))",
                    rule(rules.no_tracks),
                    rule(rules.no_vias),
                    rule(rules.no_pads),
                    rule(rules.no_copper_pour),
                    rule(rules.no_footprints)
                ),
            );
        }
        self.zone_fill(zone, inner);

        let rings = std::iter::once(&zone.outline).chain(zone.holes.iter());
        for ring in rings {
            self.out.line(inner, "(polygon");
            self.out.line(inner + 1, pts(ring));
            self.out.line(inner, ")");
        }
        for polygon in &zone.filled_polygons {
            let island = if polygon.island { " (island)" } else { "" };
            self.out.line(inner, format!("(filled_polygon {}{island}", layer(polygon.layer)));
            self.out.line(inner + 1, pts(&polygon.points));
            self.out.line(inner, ")");
        }
        for segments in &zone.fill_segments {
            let points: Vec<Point> = segments.segments.iter().flat_map(|(a, b)| [*a, *b]).collect();
            self.out.line(inner, format!("(fill_segments {}", layer(segments.layer)));
            self.out.line(inner + 1, pts(&points));
            self.out.line(inner, ")");
        }
        self.out.line(depth, ")");
    }

    fn zone_fill(&mut self, zone: &Zone, depth: usize) {
        let fill = &zone.fill;
        let mut line = String::from("(fill");
        if fill.filled {
            line.push_str(" yes");
        }
        if fill.mode == ZoneFillMode::Hatched {
            line.push_str(" (mode hatch)");
        }
        line.push_str(&format!(
            " (thermal_gap {}) (thermal_bridge_width {})",
            mm(fill.thermal_gap),
            mm(fill.thermal_bridge_width)
        ));
        if fill.smoothing != Smoothing::None {
            line.push_str(&format!(
                " (smoothing {}) (radius {})",
                fill.smoothing.as_str(),
                mm(fill.smoothing_radius)
            ));
        }
        if fill.island_removal != IslandRemoval::Always {
            line.push_str(&format!(" (island_removal_mode {})", fill.island_removal.code()));
        }
        if fill.island_removal == IslandRemoval::BelowArea {
            line.push_str(&format!(
                " (island_area_min {})",
                num(fill.island_area_min as f64 / BIU2_PER_MM2)
            ));
        }
        self.out.line(depth, line);
        if fill.mode == ZoneFillMode::Hatched {
            let border = if fill.hatch_border_algorithm == 1 {
                "hatch_thickness"
            } else {
                "min_thickness"
            };
            self.out.line(
                depth + 1,
                format!(
                    "(hatch_thickness {}) (hatch_gap {}) (hatch_orientation {})",
                    mm(fill.hatch_thickness),
                    mm(fill.hatch_gap),
                    num(fill.hatch_orientation)
                ),
            );
            self.out.line(
                depth + 1,
                format!(
                    "(hatch_smoothing_level {}) (hatch_smoothing_value {})",
                    fill.hatch_smoothing_level,
                    num(fill.hatch_smoothing_value)
                ),
            );
            self.out.line(
                depth + 1,
                format!(
                    "(hatch_border_algorithm {border}) (hatch_min_hole_area {})",
                    num(fill.hatch_min_hole_area)
                ),
            );
        }
        self.out.line(depth, ")");
    }

    pub(super) fn group(&mut self, group: &Group, depth: usize) {
        self.out.line(
            depth,
            format!(
                "(group {}{} (id {})",
                quoted(&group.name),
                locked_flag(group.locked),
                group.id
            ),
        );
        let members: String = group.members.iter().map(|m| format!(" {m}")).collect();
        self.out.line(depth + 1, format!("(members{members})"));
        self.out.line(depth, ")");
    }
}

fn geometry(kind: &ShapeKind) -> String {
    match kind {
        ShapeKind::Segment { start, end } | ShapeKind::Rect { start, end } => {
            format!("(start {}) (end {})", xy(*start), xy(*end))
        }
        ShapeKind::Arc { start, mid, end } => {
            format!("(start {}) (mid {}) (end {})", xy(*start), xy(*mid), xy(*end))
        }
        ShapeKind::Circle { center, end } => {
            format!("(center {}) (end {})", xy(*center), xy(*end))
        }
        ShapeKind::Polygon { points } => pts(points),
        ShapeKind::Curve {
            start,
            control1,
            control2,
            end,
        } => pts(&[*start, *control1, *control2, *end]),
    }
}

fn stroke_and_fill(shape: &Shape, kind: &ShapeKind) -> String {
    let mut out = if shape.style == LineStyle::Default {
        format!("(width {})", mm(shape.width))
    } else {
        format!("(stroke (width {}) (type {}))", mm(shape.width), shape.style.as_str())
    };
    if kind.can_fill() {
        out.push_str(if shape.filled { " (fill solid)" } else { " (fill none)" });
    }
    out
}

fn overrides(overrides: &LocalOverrides) -> Vec<String> {
    let mut lines = Vec::new();
    if let Some(margin) = overrides.solder_mask_margin {
        lines.push(format!("(solder_mask_margin {})", mm(margin)));
    }
    if let Some(margin) = overrides.solder_paste_margin {
        lines.push(format!("(solder_paste_margin {})", mm(margin)));
    }
    if let Some(ratio) = overrides.solder_paste_ratio {
        lines.push(format!("(solder_paste_margin_ratio {})", num(ratio)));
    }
    if let Some(clearance) = overrides.clearance {
        lines.push(format!("(clearance {})", mm(clearance)));
    }
    if let Some(connection) = overrides.zone_connection {
        lines.push(format!("(zone_connect {})", connection.code()));
    }
    if let Some(width) = overrides.thermal_width {
        lines.push(format!("(thermal_width {})", mm(width)));
    }
    if let Some(gap) = overrides.thermal_gap {
        lines.push(format!("(thermal_gap {})", mm(gap)));
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::super::{write_board, write_footprint};
    use crate::board::pad::{CustomPad, Drill, PadAttribute, PadShape};
    use crate::board::shape::{FootprintShape, LineStyle, Shape, ShapeKind};
    use crate::board::text::{FootprintText, FootprintTextKind};
    use crate::board::track::{Track, TrackArc, TrackSegment, Via, ViaType};
    use crate::board::zone::{FilledPolygon, Zone};
    use crate::board::{Board, Drawing, Footprint, Pad};
    use crate::geometry::{Point, Size};
    use crate::kiid::Kiid;
    use crate::layers::{LayerSet, PcbLayerId};
    use crate::options::LoadOptions;
    use crate::parser::{load_board_str, load_footprint_str};

    fn resistor() -> Footprint {
        let mut fp = Footprint {
            lib_id: "Resistor_SMD:R_0603".to_string(),
            position: Point::new(10_000_000, 20_000_000),
            orientation: 90.0,
            last_edit: Some(0x5F0C_8A2B),
            ..Footprint::default()
        };
        let mut reference = FootprintText::new(FootprintTextKind::Reference, PcbLayerId::F_SILKS);
        reference.text = "R1".to_string();
        reference.local_position = Point::new(0, -1_430_000);
        reference.angle = 90.0;
        fp.texts.push(reference);
        let mut value = FootprintText::new(FootprintTextKind::Value, PcbLayerId::F_FAB);
        value.text = "10k".to_string();
        value.keep_upright = false;
        value.effects.hidden = true;
        fp.texts.push(value);

        let outline = ShapeKind::Rect {
            start: Point::new(-800_000, -400_000),
            end: Point::new(800_000, 400_000),
        };
        fp.shapes.push(FootprintShape {
            shape: Shape::new(outline.clone(), PcbLayerId::F_FAB, 100_000),
            local: outline,
        });

        for (number, x) in [("1", -825_000), ("2", 825_000)] {
            let mut pad = Pad::new(number, PadShape::RoundRect, PadAttribute::Smd);
            pad.local_position = Point::new(x, 0);
            pad.angle = 90.0;
            pad.size = Size::new(800_000, 950_000);
            fp.pads.push(pad);
        }
        fp.place_children();
        fp
    }

    #[test]
    fn test_footprint_reloads_in_place() {
        let mut board = Board::new();
        let gnd = board.nets.add("GND");
        let mut fp = resistor();
        fp.pads[0].net = gnd;
        board.footprints.push(fp.clone());

        let text = write_board(&board);
        assert!(text.contains("(tedit 5F0C8A2B)"));
        assert!(text.contains("(net 1 \"GND\")"));
        let back = load_board_str(&text, "w.kicad_pcb", &mut LoadOptions::default())
            .unwrap()
            .value;
        let loaded = &back.footprints[0];
        assert_eq!(loaded.id, fp.id);
        assert_eq!(loaded.position, fp.position);
        assert_eq!(loaded.orientation, 90.0);
        assert_eq!(loaded.last_edit, Some(0x5F0C_8A2B));
        assert_eq!(loaded.reference(), "R1");
        assert_eq!(loaded.texts[0].angle, 90.0);
        assert!(!loaded.texts[1].keep_upright);
        assert!(loaded.texts[1].effects.hidden);
        assert_eq!(loaded.pads.len(), 2);
        assert_eq!(loaded.pads[0].net, gnd);
        assert_eq!(loaded.pads[1].net, 0);
        assert_eq!(loaded.pads[0].position, fp.pads[0].position);
        assert_eq!(loaded.pads[0].layers, fp.pads[0].layers);
        assert_eq!(loaded.shapes[0].local, fp.shapes[0].local);
        assert_eq!(loaded.shapes[0].shape.kind, fp.shapes[0].shape.kind);
    }

    #[test]
    fn test_standalone_footprint_with_custom_pad() {
        let mut fp = resistor();
        let mut pad = Pad::new("3", PadShape::Custom, PadAttribute::Smd);
        pad.size = Size::square(500_000);
        let mut primitive = Shape::new(
            ShapeKind::Polygon {
                points: vec![Point::new(0, 0), Point::new(1_000_000, 0), Point::new(0, 1_000_000)],
            },
            PcbLayerId::F_CU,
            0,
        );
        primitive.filled = true;
        pad.custom = Some(CustomPad {
            primitives: vec![primitive],
            ..CustomPad::default()
        });
        fp.pads.push(pad);

        let text = write_footprint(&fp);
        assert!(text.starts_with("(footprint \"Resistor_SMD:R_0603\" (version 20211014)"));
        assert!(!text.contains("(net "));
        let back = load_footprint_str(&text, "r.kicad_mod", &mut LoadOptions::default())
            .unwrap()
            .value;
        let custom = back.pads[2].custom.as_ref().unwrap();
        assert_eq!(custom.primitives.len(), 1);
        assert!(custom.primitives[0].filled);
        assert_eq!(back.pads[0].shape, PadShape::RoundRect);
    }

    #[test]
    fn test_tracks_and_drawings_reload() {
        let mut board = Board::new();
        let net = board.nets.add("SIG");
        board.tracks.push(Track::Segment(TrackSegment {
            id: Kiid::new(),
            start: Point::new(0, 0),
            end: Point::new(5_000_000, 0),
            width: 250_000,
            layer: PcbLayerId::B_CU,
            net,
            locked: true,
        }));
        board.tracks.push(Track::Arc(TrackArc {
            id: Kiid::new(),
            start: Point::new(0, 0),
            mid: Point::new(1_000_000, 1_000_000),
            end: Point::new(2_000_000, 0),
            width: 200_000,
            layer: PcbLayerId::F_CU,
            net,
            locked: false,
        }));
        board.tracks.push(Track::Via(Via {
            id: Kiid::new(),
            position: Point::new(5_000_000, 0),
            diameter: 800_000,
            drill: Some(400_000),
            top: PcbLayerId::F_CU,
            bottom: PcbLayerId::B_CU,
            via_type: ViaType::Through,
            net,
            locked: false,
            free: true,
            remove_unused_layers: false,
            keep_end_layers: false,
        }));
        let mut edge = Shape::new(
            ShapeKind::Segment {
                start: Point::new(0, 0),
                end: Point::new(30_000_000, 0),
            },
            PcbLayerId::EDGE_CUTS,
            50_000,
        );
        edge.style = LineStyle::Dash;
        board.drawings.push(Drawing::Shape(edge));

        let text = write_board(&board);
        assert!(text.contains("(stroke (width 0.05) (type dash))"));
        let back = load_board_str(&text, "w.kicad_pcb", &mut LoadOptions::default())
            .unwrap()
            .value;
        assert_eq!(back.tracks, board.tracks);
        assert_eq!(back.drawings, board.drawings);
    }

    #[test]
    fn test_zone_with_hole_reloads() {
        let mut board = Board::new();
        let net = board.nets.add("GND");
        let mut zone = Zone {
            net,
            net_name: "GND".to_string(),
            layers: LayerSet::from_layers(&[PcbLayerId::F_CU, PcbLayerId::B_CU]),
            priority: 2,
            ..Zone::default()
        };
        zone.outline = vec![
            Point::new(0, 0),
            Point::new(10_000_000, 0),
            Point::new(10_000_000, 10_000_000),
            Point::new(0, 10_000_000),
        ];
        zone.holes.push(vec![
            Point::new(4_000_000, 4_000_000),
            Point::new(6_000_000, 4_000_000),
            Point::new(5_000_000, 6_000_000),
        ]);
        zone.fill.filled = true;
        zone.filled_polygons.push(FilledPolygon {
            layer: PcbLayerId::B_CU,
            island: false,
            points: zone.outline.clone(),
        });
        board.zones.push(zone);

        let text = write_board(&board);
        assert!(text.contains("(layers \"F.Cu\" \"B.Cu\")"));
        let back = load_board_str(&text, "w.kicad_pcb", &mut LoadOptions::default())
            .unwrap()
            .value;
        assert_eq!(back.zones, board.zones);
    }

    #[test]
    fn test_oval_drill_written() {
        let mut fp = Footprint::default();
        let mut pad = Pad::new("1", PadShape::Oval, PadAttribute::Pth);
        pad.size = Size::new(1_700_000, 2_000_000);
        pad.drill = Some(Drill {
            size: Size::new(1_000_000, 1_300_000),
            shape: crate::board::pad::DrillShape::Oblong,
            offset: Point::new(0, 100_000),
        });
        fp.pads.push(pad);
        let text = write_footprint(&fp);
        assert!(text.contains("(drill oval 1 1.3 (offset 0 0.1))"));
        assert!(text.contains("(layers \"*.Cu\" \"*.Mask\")"));
    }
}
