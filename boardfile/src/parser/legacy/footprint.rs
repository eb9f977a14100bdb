//! `$MODULE` blocks with their texts, shapes, pads and 3D models.

use crate::board::footprint::{Footprint, FootprintType, Model3d};
use crate::board::pad::{
    Drill, DrillShape, LocalOverrides, Pad, PadAttribute, PadShape, ZoneConnection,
};
use crate::board::shape::{FootprintShape, Shape, ShapeKind};
use crate::board::text::{FootprintText, FootprintTextKind, HorizontalJustify, VerticalJustify};
use crate::error::BoardError;
use crate::geometry::{arc_from_center, Point, Size};
use crate::layers::{legacy_mask_to_layer_set, PcbLayerId, LEGACY_BACK, LEGACY_FRONT};

use super::super::lines::{Fields, Line};
use super::super::values::{parse_int, Site};
use super::{Args, LegacyParser};

/// 3D model offsets are stored in inches.
const MM_PER_INCH: f64 = 25.4;

impl<'a, 'p> LegacyParser<'a, 'p> {
    pub(super) fn parse_module(&mut self, start: &Line<'a>) -> Result<Footprint, BoardError> {
        let mut fp = Footprint {
            lib_id: start.rest().to_string(),
            ..Footprint::default()
        };

        loop {
            let line = self.section_line("$EndMODULE")?;
            let keyword = line.keyword().to_ascii_lowercase();
            match keyword.as_str() {
                "$endmodule" => break,
                "$pad" => {
                    let pad = self.parse_pad()?;
                    fp.pads.push(pad);
                }
                "$shape3d" => {
                    let model = self.parse_shape3d()?;
                    fp.models.push(model);
                }
                "po" => self.parse_module_position(&line, &mut fp)?,
                "li" => fp.lib_id = line.rest().to_string(),
                "cd" => fp.description = line.rest().to_string(),
                "kw" => fp.keywords = line.rest().to_string(),
                "sc" => fp.id = self.args(&line).kiid()?,
                "ar" => {
                    let path = line.rest();
                    fp.path = (!path.is_empty()).then(|| path.to_string());
                }
                "op" => {
                    let mut args = self.args(&line);
                    let rot90 = args.hex()?;
                    let rot180 = args.hex()?;
                    let (cost90, cost180) = autoplace_costs(rot90, rot180);
                    fp.autoplace_cost90 = cost90;
                    fp.autoplace_cost180 = cost180;
                }
                "at" => {
                    for field in line.args() {
                        match field.text.to_ascii_uppercase().as_str() {
                            "SMD" => fp.attributes.kind = FootprintType::Smd,
                            "VIRTUAL" => fp.attributes.set_virtual(),
                            _ => {}
                        }
                    }
                    if fp.attributes.kind == FootprintType::Unspecified
                        && !fp.attributes.exclude_from_bom
                    {
                        fp.attributes.kind = FootprintType::ThroughHole;
                    }
                }
                "ds" | "dc" | "da" => {
                    let shape = self.parse_module_shape(&line, &keyword)?;
                    fp.shapes.push(shape);
                }
                "dp" => {
                    let shape = self.parse_module_polygon(&line)?;
                    fp.shapes.push(shape);
                }
                k if k.len() > 1
                    && k.starts_with('t')
                    && k[1..].bytes().all(|b| b.is_ascii_digit()) =>
                {
                    let text = self.parse_module_text(&line)?;
                    fp.texts.push(text);
                }
                k if k.starts_with('.') => {
                    let mut args = self.args(&line);
                    if !parse_override(&mut args, k, &mut fp.overrides)? {
                        tracing::trace!(line = line.number, keyword = k, "ignoring footprint key");
                    }
                }
                _ => {}
            }
        }

        fp.place_children();
        tracing::debug!(
            footprint = %fp.reference(),
            pads = fp.pads.len(),
            "legacy footprint"
        );
        Ok(fp)
    }

    fn parse_module_position(&self, line: &Line<'a>, fp: &mut Footprint) -> Result<(), BoardError> {
        let mut args = self.args(line);
        fp.position = args.point()?;
        fp.orientation = args.angle()?;
        let raw_layer = args.int()?;
        fp.last_edit = args.opt_hex()?.and_then(|stamp| u32::try_from(stamp).ok());
        if let Some(id) = args.opt_kiid() {
            fp.id = id;
        }
        let flags = args.opt_text().unwrap_or_default();
        let mut flags = flags.chars();
        fp.locked = flags.next() == Some('F');
        fp.placed = flags.next() == Some('P');
        fp.layer = if raw_layer == i64::from(LEGACY_BACK) {
            PcbLayerId::B_CU
        } else {
            PcbLayerId::F_CU
        };
        Ok(())
    }

    /// `T<n> x y size-y size-x angle thickness mirror visibility layer italic "text" [hjust vjust]`
    fn parse_module_text(&self, line: &Line<'a>) -> Result<FootprintText, BoardError> {
        let keyword = line.keyword();
        let code = parse_int(&keyword[1..], Site::new(&self.source, line.number, 1))?;
        let kind = match code {
            0 => FootprintTextKind::Reference,
            1 => FootprintTextKind::Value,
            _ => FootprintTextKind::User,
        };

        let mut args = self.args(line);
        let local_position = args.point()?;
        let height = args.biu()?;
        let width = args.biu()?;
        let angle = args.angle()?;
        let thickness = args.biu()?;
        let mirrored = args.opt_text().is_some_and(|m| m.eq_ignore_ascii_case("M"));
        let hidden = args.opt_text().is_some_and(|v| v.eq_ignore_ascii_case("I"));
        let raw_layer = args.int()?;

        // Old writers glue the italic flag to the quoted text.
        let tail = args.remainder();
        let italic = tail.starts_with('I');
        let mut rest = Fields::new(tail.find('"').map_or("", |i| &tail[i..]));
        let text = rest.next().map(|f| f.text.into_owned()).unwrap_or_default();
        let horizontal = match rest.next().as_ref().map(|f| f.as_str()) {
            Some("L") => HorizontalJustify::Left,
            Some("R") => HorizontalJustify::Right,
            _ => HorizontalJustify::Center,
        };
        let vertical = match rest.next().as_ref().map(|f| f.as_str()) {
            Some("T") => VerticalJustify::Top,
            Some("B") => VerticalJustify::Bottom,
            _ => VerticalJustify::Center,
        };

        // Footprint text never lives on copper.
        let layer = if (0..=i64::from(LEGACY_FRONT)).contains(&raw_layer) {
            if raw_layer == i64::from(LEGACY_BACK) {
                PcbLayerId::B_SILKS
            } else {
                PcbLayerId::F_SILKS
            }
        } else {
            self.layer(raw_layer)
        };

        let mut item = FootprintText::new(kind, layer);
        item.text = match kind {
            FootprintTextKind::User => text.replace("%R", "${REFERENCE}").replace("%V", "${VALUE}"),
            _ => text,
        };
        item.local_position = local_position;
        item.angle = angle;
        item.effects.size = Size::new(width, height);
        item.effects.thickness = thickness;
        item.effects.italic = italic;
        item.effects.mirrored = mirrored;
        item.effects.hidden = hidden;
        item.effects.horizontal = horizontal;
        item.effects.vertical = vertical;
        Ok(item)
    }

    /// `DS`, `DC` and `DA` lines. Coordinates are footprint-local.
    fn parse_module_shape(
        &self,
        line: &Line<'a>,
        keyword: &str,
    ) -> Result<FootprintShape, BoardError> {
        let mut args = self.args(line);
        let kind = match keyword {
            "ds" => ShapeKind::Segment {
                start: args.point()?,
                end: args.point()?,
            },
            "dc" => ShapeKind::Circle {
                center: args.point()?,
                end: args.point()?,
            },
            _ => {
                let center = args.point()?;
                let start = args.point()?;
                let sweep = args.angle()?;
                let (start, mid, end) = arc_from_center(center, start, sweep);
                ShapeKind::Arc { start, mid, end }
            }
        };
        let width = args.biu()?;
        let layer = self.layer(args.int()?);
        Ok(footprint_shape(kind, layer, width))
    }

    /// `DP x0 y0 x1 y1 count width layer` followed by `count` `Dl x y` lines.
    fn parse_module_polygon(&mut self, line: &Line<'a>) -> Result<FootprintShape, BoardError> {
        let mut args = self.args(line);
        args.point()?;
        args.point()?;
        let count = args.int()?;
        let width = args.biu()?;
        let raw_layer = args.int()?;
        let layer = self.layer(raw_layer);

        let mut points = Vec::with_capacity(usize::try_from(count).unwrap_or(0));
        for _ in 0..count.max(0) {
            let corner = self.section_line("$EndMODULE")?;
            if !corner.is("Dl") {
                return Err(self.ctx.error(corner.number, 0, "expected 'Dl' polygon point"));
            }
            points.push(self.args(&corner).point()?);
        }
        let mut shape = footprint_shape(ShapeKind::Polygon { points }, layer, width);
        shape.shape.filled = true;
        Ok(shape)
    }

    fn parse_pad(&mut self) -> Result<Pad, BoardError> {
        let mut pad = Pad::new("", PadShape::Circle, PadAttribute::Pth);

        loop {
            let line = self.section_line("$EndPAD")?;
            let keyword = line.keyword().to_ascii_lowercase();
            match keyword.as_str() {
                "$endpad" => break,
                "sh" => {
                    let mut args = self.args(&line);
                    pad.number = args.text()?;
                    let letter = args.text()?;
                    pad.shape = match letter.to_ascii_uppercase().as_str() {
                        "C" => PadShape::Circle,
                        "R" => PadShape::Rect,
                        "O" => PadShape::Oval,
                        "T" => PadShape::Trapezoid,
                        other => return Err(args.error(format!("unknown pad shape '{other}'"))),
                    };
                    pad.size = args.size()?;
                    pad.delta = args.size()?;
                    pad.angle = args.angle()?;
                }
                "dr" => {
                    let mut args = self.args(&line);
                    let diameter = args.biu()?;
                    let offset = args.point()?;
                    let mut drill = Drill {
                        shape: DrillShape::Circle,
                        size: Size::square(diameter),
                        offset,
                    };
                    if args.opt_field().is_some_and(|f| f.text == "O") {
                        drill.shape = DrillShape::Oblong;
                        drill.size = args.size()?;
                    }
                    let has_hole = drill.size.width > 0 || drill.size.height > 0;
                    pad.drill = (has_hole || offset != Point::default()).then_some(drill);
                }
                "at" => {
                    let mut args = self.args(&line);
                    let attribute = args.text()?;
                    args.opt_field();
                    let mask = args.hex()?;
                    pad.attribute = match attribute.to_ascii_uppercase().as_str() {
                        "SMD" => PadAttribute::Smd,
                        "CONN" => PadAttribute::Conn,
                        "HOLE" => PadAttribute::Npth,
                        _ => PadAttribute::Pth,
                    };
                    pad.layers = legacy_mask_to_layer_set(mask as u32, self.copper_count());
                }
                "ne" => {
                    let mut args = self.args(&line);
                    let code = args.int()?;
                    let name = args.opt_text().unwrap_or_default();
                    pad.net = self
                        .ctx
                        .pad_net(&self.builder.board().nets, code, &name, line.number, 0);
                }
                "po" => pad.local_position = self.args(&line).point()?,
                "le" => pad.die_length = self.args(&line).biu()?,
                k if k.starts_with('.') => {
                    let mut args = self.args(&line);
                    parse_override(&mut args, k, &mut pad.overrides)?;
                }
                _ => {}
            }
        }

        Ok(pad)
    }

    fn parse_shape3d(&mut self) -> Result<Model3d, BoardError> {
        let mut model = Model3d::new("");
        loop {
            let line = self.section_line("$EndSHAPE3D")?;
            let mut args = self.args(&line);
            match line.keyword().to_ascii_lowercase().as_str() {
                "$endshape3d" => break,
                "na" => model.path = args.text()?,
                "sc" => model.scale = [args.double()?, args.double()?, args.double()?],
                "of" => {
                    let mut offset = [args.double()?, args.double()?, args.double()?];
                    for v in &mut offset {
                        *v *= MM_PER_INCH;
                    }
                    model.offset = offset;
                }
                "ro" => model.rotate = [args.double()?, args.double()?, args.double()?],
                _ => {}
            }
        }
        Ok(model)
    }
}

fn footprint_shape(
    local: ShapeKind,
    layer: PcbLayerId,
    width: crate::units::Biu,
) -> FootprintShape {
    FootprintShape {
        shape: Shape::new(local.clone(), layer, width),
        local,
    }
}

/// Decode the packed `Op` autoplace costs.
fn autoplace_costs(rot90: u64, rot180: u64) -> (i64, i64) {
    let mut cost180 = (rot180 & 0x0F) as i64;
    if cost180 > 10 {
        cost180 = 10;
    }
    let mut low = (rot90 & 0x0F) as i64;
    if low > 10 {
        low = 0;
    }
    let mut high = ((rot90 >> 4) & 0x0F) as i64;
    if high > 10 {
        high = 0;
    }
    ((high << 4) | low, cost180)
}

/// Local clearance keys shared by `$MODULE` and `$PAD`. Returns false when
/// `keyword` is not one of them.
fn parse_override(
    args: &mut Args<'_, '_>,
    keyword: &str,
    overrides: &mut LocalOverrides,
) -> Result<bool, BoardError> {
    match keyword {
        ".soldermask" => overrides.solder_mask_margin = Some(args.biu()?),
        ".solderpaste" => overrides.solder_paste_margin = Some(args.biu()?),
        ".solderpasteratio" => overrides.solder_paste_ratio = Some(args.double()?),
        ".localclearance" => overrides.clearance = Some(args.biu()?),
        ".zoneconnection" => {
            let code = args.int()?;
            let connection = ZoneConnection::from_code(code)
                .ok_or_else(|| args.error(format!("invalid zone connection {code}")))?;
            overrides.zone_connection = Some(connection);
        }
        ".thermalwidth" => overrides.thermal_width = Some(args.biu()?),
        ".thermalgap" => overrides.thermal_gap = Some(args.biu()?),
        _ => return Ok(false),
    }
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_autoplace_costs_are_clamped() {
        assert_eq!(autoplace_costs(0x00, 0x00), (0, 0));
        assert_eq!(autoplace_costs(0x35, 0x0C), (0x35, 10));
        assert_eq!(autoplace_costs(0xBC, 0x04), (0, 4));
    }
}
