//! `(footprint ...)` / `(module ...)` blocks and their pads.

use crate::board::footprint::{Footprint, FootprintType, Model3d};
use crate::board::group::GroupParent;
use crate::board::pad::{
    CustomAnchor, CustomClearance, CustomPad, Drill, DrillShape, LocalOverrides, Pad,
    PadAttribute, PadProperty, PadShape, ZoneConnection,
};
use crate::board::shape::FootprintShape;
use crate::board::text::{FootprintText, FootprintTextKind};
use crate::error::BoardError;
use crate::geometry::Size;
use crate::kiid::Kiid;
use crate::layers::PcbLayerId;
use crate::parser::sexp::SExp;

use super::PcbParser;

/// Older files give model offsets in inches under `(at (xyz ...))`.
const MM_PER_INCH: f64 = 25.4;

impl<'p> PcbParser<'p> {
    pub(super) fn parse_footprint(
        &mut self,
        node: &SExp,
        parent: GroupParent,
    ) -> Result<Footprint, BoardError> {
        let mut fp = Footprint {
            lib_id: self.atom_at(node, 0)?.to_string(),
            ..Footprint::default()
        };

        for child in node.args().iter().skip(1) {
            self.ctx.checkpoint(child.pos.line)?;
            let Some(key) = child.head() else {
                match child.as_symbol() {
                    Some("locked") => fp.locked = true,
                    Some("placed") => fp.placed = true,
                    other => return Err(self.unknown_token(child, other.unwrap_or("list"))),
                }
                continue;
            };
            match key {
                "version" => self.parse_version(child)?,
                "generator" => {}
                "locked" => fp.locked = self.is_locked(node),
                "placed" => fp.placed = true,
                "layer" => {
                    let layer = self.resolve_layer(self.atom_at(child, 0)?);
                    if !matches!(layer, PcbLayerId::F_CU | PcbLayerId::B_CU) {
                        return Err(self.error(child, "footprint layer must be F.Cu or B.Cu"));
                    }
                    fp.layer = layer;
                }
                "tedit" | "last_edit" => {
                    let stamp = self.hex_at(child, 0)?;
                    fp.last_edit = u32::try_from(stamp).ok();
                }
                "tstamp" | "uuid" => fp.id = Kiid::parse(self.atom_at(child, 0)?),
                "at" => {
                    fp.position = self.point(child)?;
                    fp.orientation = self.opt_angle_at(child, 2)?.unwrap_or(0.0);
                }
                "descr" => fp.description = self.atom_at(child, 0)?.to_string(),
                "tags" => fp.keywords = self.atom_at(child, 0)?.to_string(),
                "property" => {
                    let name = self.atom_at(child, 0)?;
                    let value = self.atom_at(child, 1)?;
                    fp.set_property(name, value);
                }
                "path" => fp.path = Some(self.atom_at(child, 0)?.to_string()),
                "autoplace_cost90" => fp.autoplace_cost90 = self.int_at(child, 0)?,
                "autoplace_cost180" => fp.autoplace_cost180 = self.int_at(child, 0)?,
                "attr" => self.parse_footprint_attributes(child, &mut fp),
                "fp_text" => {
                    let text = self.parse_footprint_text(child)?;
                    fp.texts.push(text);
                }
                "fp_line" | "fp_arc" | "fp_circle" | "fp_rect" | "fp_poly" | "fp_curve" => {
                    let shape = self.parse_shape(child)?;
                    fp.shapes.push(FootprintShape {
                        local: shape.kind.clone(),
                        shape,
                    });
                }
                "pad" => {
                    let pad = self.parse_pad(child)?;
                    fp.pads.push(pad);
                }
                "model" => {
                    let model = self.parse_model(child)?;
                    fp.models.push(model);
                }
                "zone" => {
                    if let Some(zone) = self.parse_zone(child)? {
                        fp.zones.push(zone);
                    }
                }
                "dimension" => {
                    let dimension = self.parse_dimension(child)?;
                    fp.dimensions.push(dimension);
                }
                "group" => self.parse_group(child, parent)?,
                _ => {
                    if !self.parse_override(child, &mut fp.overrides)? {
                        return Err(self.unknown_token(child, key));
                    }
                }
            }
        }

        fp.place_children();
        tracing::trace!(lib_id = %fp.lib_id, pads = fp.pads.len(), "footprint read");
        Ok(fp)
    }

    fn parse_footprint_attributes(&self, node: &SExp, fp: &mut Footprint) {
        for token in node.args().iter().filter_map(SExp::as_symbol) {
            match token {
                "smd" => fp.attributes.kind = FootprintType::Smd,
                "through_hole" => fp.attributes.kind = FootprintType::ThroughHole,
                "virtual" => fp.attributes.set_virtual(),
                "board_only" => fp.attributes.board_only = true,
                "exclude_from_pos_files" => fp.attributes.exclude_from_pos_files = true,
                "exclude_from_bom" => fp.attributes.exclude_from_bom = true,
                _ => {}
            }
        }
    }

    /// Clearance and margin overrides shared by footprints and pads. Returns
    /// false when `node` is not one of them.
    fn parse_override(
        &self,
        node: &SExp,
        overrides: &mut LocalOverrides,
    ) -> Result<bool, BoardError> {
        match node.head().unwrap_or_default() {
            "clearance" => overrides.clearance = Some(self.biu_at(node, 0)?),
            "solder_mask_margin" => overrides.solder_mask_margin = Some(self.biu_at(node, 0)?),
            "solder_paste_margin" => overrides.solder_paste_margin = Some(self.biu_at(node, 0)?),
            "solder_paste_ratio" | "solder_paste_margin_ratio" => {
                overrides.solder_paste_ratio = Some(self.double_at(node, 0)?)
            }
            "zone_connect" => {
                let code = self.int_at(node, 0)?;
                let connection = ZoneConnection::from_code(code)
                    .ok_or_else(|| self.error(node, format!("invalid zone connection {code}")))?;
                overrides.zone_connection = Some(connection);
            }
            "thermal_width" => overrides.thermal_width = Some(self.biu_at(node, 0)?),
            "thermal_gap" => overrides.thermal_gap = Some(self.biu_at(node, 0)?),
            _ => return Ok(false),
        }
        Ok(true)
    }

    /// `(fp_text reference|value|user "text" (at x y [angle] [unlocked]) (layer) [hide] (effects))`.
    fn parse_footprint_text(&mut self, node: &SExp) -> Result<FootprintText, BoardError> {
        let kind_node = self.arg(node, 0)?;
        let kind = match kind_node.as_atom() {
            Some("reference") => FootprintTextKind::Reference,
            Some("value") => FootprintTextKind::Value,
            Some("user") => FootprintTextKind::User,
            other => {
                return Err(self.error(
                    kind_node,
                    format!("unknown footprint text type '{}'", other.unwrap_or("list")),
                ))
            }
        };
        let layer = self.item_layer(node)?;
        let mut text = FootprintText::new(kind, layer);
        text.text = self.text(self.atom_at(node, 1)?);
        text.id = self.item_id(node);
        text.locked = self.is_locked(node);
        if let Some(at) = node.get("at") {
            text.local_position = self.point(at)?;
            text.angle = self.opt_angle_at(at, 2)?.unwrap_or(0.0);
            text.keep_upright = !at.has_flag("unlocked");
        }
        if let Some(effects) = node.get("effects") {
            text.effects = self.parse_effects(effects)?;
        }
        if node.has_flag("hide") {
            text.effects.hidden = true;
        }
        Ok(text)
    }

    fn parse_pad(&mut self, node: &SExp) -> Result<Pad, BoardError> {
        let number = self.atom_at(node, 0)?;
        let attribute_node = self.arg(node, 1)?;
        let attribute = attribute_node
            .as_symbol()
            .and_then(PadAttribute::parse)
            .ok_or_else(|| self.error(attribute_node, "unknown pad type"))?;
        let shape_node = self.arg(node, 2)?;
        let shape = shape_node
            .as_symbol()
            .and_then(PadShape::parse)
            .ok_or_else(|| self.error(shape_node, "unknown pad shape"))?;

        let mut pad = Pad::new(number, shape, attribute);
        let mut primitives = Vec::new();
        for child in node.args().iter().skip(3) {
            let Some(key) = child.head() else {
                match child.as_symbol() {
                    Some("locked") => pad.locked = true,
                    Some("remove_unused_layers") => pad.remove_unused_layers = true,
                    Some("keep_end_layers") => pad.keep_end_layers = true,
                    other => return Err(self.unknown_token(child, other.unwrap_or("list"))),
                }
                continue;
            };
            match key {
                "at" => {
                    pad.local_position = self.point(child)?;
                    pad.angle = self.opt_angle_at(child, 2)?.unwrap_or(0.0);
                }
                "size" => pad.size = self.size(child)?,
                "rect_delta" => pad.delta = self.size(child)?,
                "drill" => pad.drill = Some(self.parse_drill(child)?),
                "layers" => pad.layers = self.layer_set(child),
                "net" => {
                    let file_code = self.int_at(child, 0)?;
                    let name = child
                        .args()
                        .get(1)
                        .and_then(SExp::as_atom)
                        .map(|n| self.text(n))
                        .unwrap_or_default();
                    pad.net = self.ctx.pad_net(
                        &self.builder.board().nets,
                        file_code,
                        &name,
                        child.pos.line,
                        child.pos.line_offset(),
                    );
                }
                "property" => {
                    let value = self.atom_at(child, 0)?;
                    pad.property = PadProperty::parse(value)
                        .ok_or_else(|| self.error(child, format!("unknown pad property '{value}'")))?;
                }
                "roundrect_rratio" => pad.roundrect_ratio = self.double_at(child, 0)?,
                "chamfer_ratio" => pad.chamfer_ratio = self.double_at(child, 0)?,
                "chamfer" => {
                    for token in child.args().iter().filter_map(SExp::as_atom) {
                        if !pad.chamfers.set(token) {
                            return Err(self.error(child, format!("unknown chamfer corner '{token}'")));
                        }
                    }
                }
                "die_length" => pad.die_length = self.biu_at(child, 0)?,
                "pinfunction" => pad.pin_function = Some(self.atom_at(child, 0)?.to_string()),
                "pintype" => pad.pin_type = Some(self.atom_at(child, 0)?.to_string()),
                "options" => {
                    let custom = pad.custom.get_or_insert_with(CustomPad::default);
                    if child.get_atom("anchor") == Some("rect") {
                        custom.anchor = CustomAnchor::Rect;
                    }
                    if child.get_atom("clearance") == Some("convexhull") {
                        custom.clearance = CustomClearance::ConvexHull;
                    }
                }
                "primitives" => {
                    for primitive in child.args() {
                        match primitive.head() {
                            Some("gr_line" | "gr_arc" | "gr_circle" | "gr_rect" | "gr_poly" | "gr_curve") => {
                                primitives.push(self.shape_on(primitive, PcbLayerId::F_CU)?);
                            }
                            other => {
                                return Err(self.unknown_token(primitive, other.unwrap_or("list")))
                            }
                        }
                    }
                }
                "locked" => pad.locked = self.is_locked(node),
                "remove_unused_layers" => pad.remove_unused_layers = true,
                "keep_end_layers" => pad.keep_end_layers = true,
                "tstamp" | "uuid" => pad.id = Kiid::parse(self.atom_at(child, 0)?),
                _ => {
                    if !self.parse_override(child, &mut pad.overrides)? {
                        return Err(self.unknown_token(child, key));
                    }
                }
            }
        }

        if pad.shape == PadShape::Custom || !primitives.is_empty() {
            let layer = pad.layers.iter().find(|l| l.is_copper()).unwrap_or(PcbLayerId::F_CU);
            for primitive in &mut primitives {
                primitive.layer = layer;
            }
            pad.custom.get_or_insert_with(CustomPad::default).primitives = primitives;
        }
        pad.normalize_shape();
        Ok(pad)
    }

    /// `(drill [oval] d [d2] (offset x y))`.
    fn parse_drill(&self, node: &SExp) -> Result<Drill, BoardError> {
        let mut drill = Drill::default();
        let mut sizes = Vec::new();
        for (index, arg) in node.args().iter().enumerate() {
            match arg.as_symbol() {
                Some("oval") => drill.shape = DrillShape::Oblong,
                Some(_) => sizes.push(self.biu_at(node, index)?),
                None if arg.head() == Some("offset") => drill.offset = self.point(arg)?,
                None => {}
            }
        }
        let width = sizes.first().copied().unwrap_or(0);
        let height = sizes.get(1).copied().unwrap_or(width);
        drill.size = Size::new(width, height);
        Ok(drill)
    }

    /// `(model "path" (offset|at (xyz ...)) (scale (xyz ...)) (rotate (xyz ...)) [hide] [(opacity o)])`.
    fn parse_model(&self, node: &SExp) -> Result<Model3d, BoardError> {
        let mut model = Model3d::new(self.atom_at(node, 0)?);
        let xyz = |parent: &SExp| -> Result<[f64; 3], BoardError> {
            let xyz = parent
                .get("xyz")
                .ok_or_else(|| self.error(parent, "missing 'xyz'"))?;
            Ok([
                self.double_at(xyz, 0)?,
                self.double_at(xyz, 1)?,
                self.double_at(xyz, 2)?,
            ])
        };
        if let Some(offset) = node.get("offset") {
            model.offset = xyz(offset)?;
        } else if let Some(at) = node.get("at") {
            model.offset = xyz(at)?.map(|inches| inches * MM_PER_INCH);
        }
        if let Some(scale) = node.get("scale") {
            model.scale = xyz(scale)?;
        }
        if let Some(rotate) = node.get("rotate") {
            model.rotate = xyz(rotate)?;
        }
        model.hidden = node.has_flag("hide");
        model.opacity = self.child_double(node, "opacity")?;
        Ok(model)
    }
}

#[cfg(test)]
mod tests {
    use crate::board::footprint::FootprintType;
    use crate::board::nets::ORPHANED;
    use crate::board::pad::{DrillShape, PadShape, ZoneConnection};
    use crate::board::shape::ShapeKind;
    use crate::error::WarningKind;
    use crate::geometry::Point;
    use crate::layers::PcbLayerId;
    use crate::options::LoadOptions;
    use crate::parser::pcb::PcbParser;
    use crate::parser::sexp;

    const BOARD: &str = r#"(kicad_pcb (version 20211014) (generator pcbnew)
  (net 0 "")
  (net 1 "GND")
  (footprint "Resistor_SMD:R_0603" (layer "F.Cu") (tedit 5F68FEEE)
    (tstamp 0d9b2e4c-1111-4b7a-9c1e-000000000001)
    (at 100 50 90)
    (descr "Resistor SMD 0603")
    (tags "resistor")
    (property "Sheetfile" "main.kicad_sch")
    (attr smd)
    (solder_mask_margin 0.05)
    (zone_connect 2)
    (fp_text reference "R1" (at 0 -1.5 90) (layer "F.SilkS")
      (effects (font (size 1 1) (thickness 0.15))))
    (fp_text value "10k" (at 0 1.5 90 unlocked) (layer "F.Fab") hide
      (effects (font (size 1 1) (thickness 0.15))))
    (fp_line (start -1 0) (end 1 0) (layer "F.SilkS") (width 0.12))
    (pad "1" smd roundrect (at -0.8 0 90) (size 0.8 0.95) (layers "F.Cu" "F.Paste" "F.Mask")
      (roundrect_rratio 0.25) (chamfer_ratio 0.2) (chamfer top_left) (net 1 "GND"))
    (pad "2" smd rect (at 0.8 0 90) (size 0.8 0.95) (layers "F.Cu" "F.Paste" "F.Mask")
      (net 1 "VCC"))
    (pad "" np_thru_hole oval (at 0 0 90) (size 1 2) (drill oval 1 2) (layers *.Cu *.Mask))
    (model "${KICAD6_3DMODEL_DIR}/R_0603.wrl"
      (at (xyz 0.1 0 0)) (scale (xyz 1 1 1)) (rotate (xyz 0 0 0)))))
"#;

    #[test]
    fn test_footprint_fields_and_placement() {
        let root = sexp::parse(BOARD).unwrap();
        let mut options = LoadOptions::default();
        let (board, warnings) = PcbParser::new(BOARD, "fp.kicad_pcb", &mut options)
            .parse_board(&root)
            .unwrap();
        let fp = &board.footprints[0];
        assert_eq!(fp.lib_id, "Resistor_SMD:R_0603");
        assert_eq!(fp.orientation, 90.0);
        assert_eq!(fp.reference(), "R1");
        assert_eq!(fp.value(), "10k");
        assert_eq!(fp.attributes.kind, FootprintType::Smd);
        assert_eq!(fp.property("Sheetfile"), Some("main.kicad_sch"));
        assert_eq!(fp.overrides.solder_mask_margin, Some(50_000));
        assert_eq!(fp.overrides.zone_connection, Some(ZoneConnection::Full));
        assert_eq!(fp.last_edit, Some(0x5F68_FEEE));

        let value = &fp.texts[1];
        assert!(value.effects.hidden);
        assert!(!value.keep_upright);
        assert_eq!(value.local_angle, 0.0);

        let pad = &fp.pads[0];
        assert_eq!(pad.shape, PadShape::ChamferedRect);
        assert_eq!(pad.local_angle, 0.0);
        assert_eq!(pad.position, Point::new(100_000_000, 50_800_000));
        assert_eq!(pad.net, 1);
        assert!(pad.layers.contains(PcbLayerId::F_PASTE));

        // name disagrees with the code
        assert_eq!(fp.pads[1].net, ORPHANED);
        assert!(warnings.iter().any(|w| w.kind == WarningKind::NetMismatch));

        let hole = &fp.pads[2];
        let drill = hole.drill.unwrap();
        assert_eq!(drill.shape, DrillShape::Oblong);
        assert_eq!(drill.size.height, 2_000_000);
        assert!(hole.layers.contains(PcbLayerId::B_CU));

        let ShapeKind::Segment { start, .. } = fp.shapes[0].shape.kind else {
            panic!("expected a segment");
        };
        assert_eq!(start, Point::new(100_000_000, 51_000_000));

        let model = &fp.models[0];
        assert!((model.offset[0] - 2.54).abs() < 1e-9);
    }

    #[test]
    fn test_standalone_footprint_file() {
        let text = r#"(footprint "TestPoint" (version 20211014) (generator pcbnew) (layer "F.Cu")
  (attr exclude_from_pos_files exclude_from_bom)
  (fp_text reference "REF**" (at 0 -2) (layer "F.SilkS") (effects (font (size 1 1) (thickness 0.15))))
  (fp_circle (center 0 0) (end 1 0) (layer "F.CrtYd") (width 0.05) (fill none))
  (pad "1" smd custom (at 0 0) (size 0.5 0.5) (layers "F.Cu" "F.Mask")
    (options (clearance outline) (anchor circle))
    (primitives (gr_poly (pts (xy -1 -1) (xy 1 -1) (xy 0 1)) (width 0) (fill yes)))))
"#;
        let root = sexp::parse(text).unwrap();
        let mut options = LoadOptions::default();
        let (fp, warnings) = PcbParser::new(text, "tp.kicad_mod", &mut options)
            .parse_footprint_file(&root)
            .unwrap();
        assert!(warnings.is_empty());
        assert_eq!(fp.reference(), "REF**");
        assert!(fp.attributes.exclude_from_bom);
        let custom = fp.pads[0].custom.as_ref().unwrap();
        assert_eq!(custom.primitives.len(), 1);
        assert!(custom.primitives[0].filled);
        assert_eq!(custom.primitives[0].layer, PcbLayerId::F_CU);
    }

    #[test]
    fn test_bad_pad_type_is_an_error() {
        let text = r#"(footprint "X" (layer "F.Cu") (pad "1" glued rect (at 0 0) (size 1 1) (layers "F.Cu")))"#;
        let root = sexp::parse(text).unwrap();
        let mut options = LoadOptions::default();
        let err = PcbParser::new(text, "x.kicad_mod", &mut options)
            .parse_footprint_file(&root)
            .unwrap_err();
        assert!(err.to_string().contains("unknown pad type"));
    }
}
