//! Graphic items: `gr_*` / `fp_*` shapes, texts and their effects,
//! dimensions and targets.

use crate::board::dimension::{
    height_from_crossbar, Dimension, DimensionCommon, DimensionUnits, OrthogonalAxis,
};
use crate::board::shape::{LineStyle, Shape, ShapeKind, Target, TargetShape};
use crate::board::text::{BoardText, HorizontalJustify, TextEffects, VerticalJustify};
use crate::error::BoardError;
use crate::geometry::{arc_from_center, Point, Size};
use crate::layers::PcbLayerId;
use crate::parser::sexp::SExp;

use super::PcbParser;

impl<'p> PcbParser<'p> {
    /// Any `gr_*` or `fp_*` shape. Coordinates are returned as written.
    pub(super) fn parse_shape(&mut self, node: &SExp) -> Result<Shape, BoardError> {
        let layer = self.item_layer(node)?;
        self.shape_on(node, layer)
    }

    /// Shape geometry and stroke, placed on `layer`. Pad primitives carry no
    /// layer of their own.
    pub(super) fn shape_on(&self, node: &SExp, layer: PcbLayerId) -> Result<Shape, BoardError> {
        let keyword = node.head().unwrap_or_default();
        let kind_name = keyword
            .strip_prefix("gr_")
            .or_else(|| keyword.strip_prefix("fp_"))
            .unwrap_or(keyword);
        let kind = match kind_name {
            "line" => ShapeKind::Segment {
                start: self.child_point(node, "start")?,
                end: self.child_point(node, "end")?,
            },
            "rect" => ShapeKind::Rect {
                start: self.child_point(node, "start")?,
                end: self.child_point(node, "end")?,
            },
            "circle" => ShapeKind::Circle {
                center: self.child_point(node, "center")?,
                end: self.child_point(node, "end")?,
            },
            "arc" => self.parse_arc_geometry(node)?,
            "poly" => {
                let pts = node
                    .get("pts")
                    .ok_or_else(|| self.error(node, "polygon without 'pts'"))?;
                ShapeKind::Polygon {
                    points: self.points(pts)?,
                }
            }
            "curve" => {
                let pts = node
                    .get("pts")
                    .ok_or_else(|| self.error(node, "curve without 'pts'"))?;
                let points = self.points(pts)?;
                let [start, control1, control2, end] = points[..] else {
                    return Err(self.error(pts, format!("curve needs 4 points, found {}", points.len())));
                };
                ShapeKind::Curve {
                    start,
                    control1,
                    control2,
                    end,
                }
            }
            other => return Err(self.error(node, format!("unknown shape '{other}'"))),
        };

        let mut shape = Shape::new(kind, layer, 0);
        shape.id = self.item_id(node);
        shape.locked = self.is_locked(node);
        if let Some(width) = self.child_biu(node, "width")? {
            shape.width = width;
        }
        if let Some(stroke) = node.get("stroke") {
            if let Some(width) = self.child_biu(stroke, "width")? {
                shape.width = width;
            }
            if let Some(style) = stroke.get_atom("type") {
                shape.style = LineStyle::parse(style).unwrap_or_default();
            }
        }
        if let Some(fill) = node.get_atom("fill") {
            shape.filled = matches!(fill, "solid" | "yes") && shape.kind.can_fill();
        } else if matches!(shape.kind, ShapeKind::Polygon { .. }) && self.version < 20210606 {
            // Older files always filled polygons.
            shape.filled = true;
        }
        Ok(shape)
    }

    /// `(start)(mid)(end)`, or the older `(start center)(end arc-start)(angle)`.
    fn parse_arc_geometry(&self, node: &SExp) -> Result<ShapeKind, BoardError> {
        if let Some(mid) = node.get("mid") {
            return Ok(ShapeKind::Arc {
                start: self.child_point(node, "start")?,
                mid: self.point(mid)?,
                end: self.child_point(node, "end")?,
            });
        }
        let center = self.child_point(node, "start")?;
        let arc_start = self.child_point(node, "end")?;
        let sweep = self.child_double(node, "angle")?.unwrap_or(0.0);
        let (start, mid, end) = arc_from_center(center, arc_start, sweep);
        Ok(ShapeKind::Arc { start, mid, end })
    }

    pub(super) fn parse_board_text(&mut self, node: &SExp) -> Result<BoardText, BoardError> {
        let raw = self.atom_at(node, 0)?;
        let layer = self.item_layer(node)?;
        let mut text = BoardText::new(self.text(raw), layer);
        text.id = self.item_id(node);
        text.locked = self.is_locked(node);
        if let Some(at) = node.get("at") {
            text.position = self.point(at)?;
            text.angle = self.opt_angle_at(at, 2)?.unwrap_or(0.0);
        }
        text.knockout = node
            .get("layer")
            .is_some_and(|layer| layer.has_flag("knockout"));
        if let Some(effects) = node.get("effects") {
            text.effects = self.parse_effects(effects)?;
        }
        Ok(text)
    }

    /// `(effects (font (size h w) (thickness t) bold italic) (justify ...) hide)`.
    pub(super) fn parse_effects(&self, node: &SExp) -> Result<TextEffects, BoardError> {
        let mut effects = TextEffects::default();
        if let Some(font) = node.get("font") {
            if let Some(size) = font.get("size") {
                let height = self.biu_at(size, 0)?;
                let width = self.biu_at(size, 1)?;
                effects.size = Size::new(width, height);
            }
            if let Some(thickness) = self.child_biu(font, "thickness")? {
                effects.thickness = thickness;
            }
            effects.bold = font.has_flag("bold");
            effects.italic = font.has_flag("italic");
        }
        if let Some(justify) = node.get("justify") {
            for token in justify.args().iter().filter_map(SExp::as_symbol) {
                match token {
                    "left" => effects.horizontal = HorizontalJustify::Left,
                    "right" => effects.horizontal = HorizontalJustify::Right,
                    "top" => effects.vertical = VerticalJustify::Top,
                    "bottom" => effects.vertical = VerticalJustify::Bottom,
                    "mirror" => effects.mirrored = true,
                    _ => {}
                }
            }
        }
        effects.hidden = node.has_flag("hide");
        Ok(effects)
    }

    pub(super) fn parse_dimension(&mut self, node: &SExp) -> Result<Dimension, BoardError> {
        let Some(kind) = node.get("type") else {
            return self.parse_old_dimension(node);
        };
        let kind_name = self.atom_at(kind, 0)?;
        let layer = self.item_layer(node)?;
        let mut common = DimensionCommon::new(layer);
        common.id = self.item_id(node);
        common.locked = self.is_locked(node);

        let pts = node
            .get("pts")
            .ok_or_else(|| self.error(node, "dimension without 'pts'"))?;
        let points = self.points(pts)?;
        let [start, end] = points[..] else {
            return Err(self.error(pts, format!("dimension needs 2 points, found {}", points.len())));
        };
        common.start = start;
        common.end = end;

        if let Some(text) = node.get("gr_text") {
            common.text = self.parse_board_text(text)?;
        } else {
            common.text.layer = layer;
        }
        if let Some(format) = node.get("format") {
            self.parse_dimension_format(format, &mut common)?;
        }
        if let Some(style) = node.get("style") {
            self.parse_dimension_style(style, &mut common)?;
        }

        let height = self.child_biu(node, "height")?.unwrap_or(0);
        let dimension = match kind_name {
            "aligned" => Dimension::Aligned { common, height },
            "orthogonal" => {
                let axis = match self.child_int(node, "orientation")? {
                    Some(1) => OrthogonalAxis::Vertical,
                    _ => OrthogonalAxis::Horizontal,
                };
                Dimension::Orthogonal {
                    common,
                    height,
                    axis,
                }
            }
            "leader" => Dimension::Leader { common },
            "center" => Dimension::Center { common },
            other => return Err(self.error(kind, format!("unknown dimension type '{other}'"))),
        };
        Ok(dimension)
    }

    fn parse_dimension_format(
        &self,
        node: &SExp,
        common: &mut DimensionCommon,
    ) -> Result<(), BoardError> {
        let format = &mut common.format;
        if let Some(prefix) = node.get_atom("prefix") {
            format.prefix = prefix.to_string();
        }
        if let Some(suffix) = node.get_atom("suffix") {
            format.suffix = suffix.to_string();
        }
        if let Some(units) = node.get("units") {
            let code = self.int_at(units, 0)?;
            format.units = DimensionUnits::from_code(code)
                .ok_or_else(|| self.error(units, format!("invalid dimension units {code}")))?;
        }
        if let Some(units_format) = self.child_int(node, "units_format")? {
            format.units_format = units_format;
        }
        if let Some(precision) = self.child_int(node, "precision")? {
            format.precision = precision;
        }
        format.override_value = node.get_atom("override_value").map(str::to_string);
        format.suppress_zeroes = node.has_flag("suppress_zeroes");
        Ok(())
    }

    fn parse_dimension_style(
        &self,
        node: &SExp,
        common: &mut DimensionCommon,
    ) -> Result<(), BoardError> {
        let style = &mut common.style;
        if let Some(thickness) = self.child_biu(node, "thickness")? {
            style.thickness = thickness;
        }
        if let Some(length) = self.child_biu(node, "arrow_length")? {
            style.arrow_length = length;
        }
        if let Some(mode) = self.child_int(node, "text_position_mode")? {
            style.text_position_mode = mode;
        }
        if let Some(height) = self.child_biu(node, "extension_height")? {
            style.extension_height = height;
        }
        if let Some(offset) = self.child_biu(node, "extension_offset")? {
            style.extension_offset = offset;
        }
        style.text_frame = self.child_int(node, "text_frame")?;
        style.keep_text_aligned = node.has_flag("keep_text_aligned");
        Ok(())
    }

    /// The form written before dimension types existed:
    /// `(dimension value (width) (layer) (gr_text) (feature1) (feature2) (crossbar) ...)`.
    fn parse_old_dimension(&mut self, node: &SExp) -> Result<Dimension, BoardError> {
        let layer = self.item_layer(node)?;
        let mut common = DimensionCommon::new(layer);
        common.id = self.item_id(node);
        if let Some(width) = self.child_biu(node, "width")? {
            common.style.thickness = width;
        }
        if let Some(text) = node.get("gr_text") {
            common.text = self.parse_board_text(text)?;
        }

        let first_point = |key: &str| -> Result<Option<Vec<Point>>, BoardError> {
            match node.get(key).and_then(|f| f.get("pts")) {
                Some(pts) => self.points(pts).map(Some),
                None => Ok(None),
            }
        };
        if let Some(points) = first_point("feature2")? {
            common.start = points.first().copied().unwrap_or_default();
        }
        if let Some(points) = first_point("feature1")? {
            common.end = points.first().copied().unwrap_or_default();
        }
        let height = match first_point("crossbar")?.as_deref() {
            Some([bar_start, bar_end, ..]) => {
                height_from_crossbar(common.start, *bar_start, *bar_end)
            }
            _ => 0,
        };
        Ok(Dimension::Aligned { common, height })
    }

    /// `(target plus|x (at x y) (size s) (width w) (layer l) (tstamp))`.
    pub(super) fn parse_target(&mut self, node: &SExp) -> Result<Target, BoardError> {
        let shape = match node.args().first().and_then(SExp::as_symbol) {
            Some("x") => TargetShape::X,
            _ => TargetShape::Plus,
        };
        let layer = self.item_layer(node)?;
        Ok(Target {
            id: self.item_id(node),
            shape,
            position: self.child_point(node, "at")?,
            size: self.child_biu(node, "size")?.unwrap_or(0),
            width: self.child_biu(node, "width")?.unwrap_or(0),
            layer,
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::board::dimension::{Dimension, OrthogonalAxis};
    use crate::board::shape::ShapeKind;
    use crate::board::text::HorizontalJustify;
    use crate::board::{Board, Drawing};
    use crate::geometry::Point;
    use crate::layers::PcbLayerId;
    use crate::options::LoadOptions;
    use crate::parser::pcb::PcbParser;
    use crate::parser::sexp;

    fn load(version: u32, body: &str) -> Board {
        let text = format!("(kicad_pcb (version {version}) {body})");
        let root = sexp::parse(&text).unwrap();
        let mut options = LoadOptions::default();
        PcbParser::new(&text, "t.kicad_pcb", &mut options)
            .parse_board(&root)
            .unwrap()
            .0
    }

    #[test]
    fn test_old_arc_converted_to_three_points() {
        let board = load(
            20171130,
            "(gr_arc (start 0 0) (end 10 0) (angle 90) (layer Edge.Cuts) (width 0.1))",
        );
        let Drawing::Shape(shape) = &board.drawings[0] else {
            panic!("expected a shape");
        };
        let ShapeKind::Arc { start, end, .. } = shape.kind else {
            panic!("expected an arc");
        };
        assert_eq!(start, Point::new(10_000_000, 0));
        assert_eq!(end.x.abs(), 0);
        assert_eq!(end.y.abs(), 10_000_000);
        assert_eq!(shape.width, 100_000);
    }

    #[test]
    fn test_stroke_and_fill() {
        let board = load(
            20211014,
            r#"(gr_rect (start 0 0) (end 5 5) (layer "F.SilkS") (stroke (width 0.2) (type dash)) (fill solid))
               (gr_line (start 0 0) (end 5 5) (layer "F.SilkS") (width 0.15) (fill solid))"#,
        );
        let Drawing::Shape(rect) = &board.drawings[0] else {
            panic!("expected a shape");
        };
        assert!(rect.filled);
        assert_eq!(rect.width, 200_000);
        assert_eq!(rect.style, crate::board::shape::LineStyle::Dash);
        let Drawing::Shape(line) = &board.drawings[1] else {
            panic!("expected a shape");
        };
        assert!(!line.filled);
    }

    #[test]
    fn test_text_effects_and_overbar() {
        let board = load(
            20200101,
            r#"(gr_text "~RESET~" (at 10 20 90) (layer F.SilkS)
                 (effects (font (size 1.5 1.2) (thickness 0.3) italic) (justify left mirror)))"#,
        );
        let Drawing::Text(text) = &board.drawings[0] else {
            panic!("expected a text");
        };
        assert_eq!(text.text, "~{RESET}");
        assert_eq!(text.angle, 90.0);
        assert_eq!(text.effects.size.height, 1_500_000);
        assert_eq!(text.effects.size.width, 1_200_000);
        assert!(text.effects.italic);
        assert!(text.effects.mirrored);
        assert_eq!(text.effects.horizontal, HorizontalJustify::Left);
    }

    #[test]
    fn test_orthogonal_dimension() {
        let board = load(
            20211014,
            r#"(dimension (type orthogonal) (layer "Dwgs.User") (tstamp 5e6b1b53-2cc4-4d3e-b2c1-1a1a1a1a1a1a)
                 (pts (xy 0 0) (xy 10 5)) (height 3) (orientation 1)
                 (gr_text "5 mm" (at 5 3) (layer "Dwgs.User"))
                 (format (units 2) (units_format 1) (precision 2))
                 (style (thickness 0.12) (arrow_length 1.27) (text_position_mode 0) keep_text_aligned))"#,
        );
        let Drawing::Dimension(Dimension::Orthogonal { common, height, axis }) = &board.drawings[0]
        else {
            panic!("expected an orthogonal dimension");
        };
        assert_eq!(*axis, OrthogonalAxis::Vertical);
        assert_eq!(*height, 3_000_000);
        assert_eq!(common.end, Point::new(10_000_000, 5_000_000));
        assert_eq!(common.format.precision, 2);
        assert_eq!(common.style.thickness, 120_000);
        assert_eq!(common.text.text, "5 mm");
    }

    #[test]
    fn test_old_dimension_is_aligned() {
        let board = load(
            20171130,
            r#"(dimension 10 (width 0.15) (layer Dwgs.User)
                 (gr_text "10 mm" (at 5 -2) (layer Dwgs.User))
                 (feature1 (pts (xy 10 0) (xy 10 -2)))
                 (feature2 (pts (xy 0 0) (xy 0 -2)))
                 (crossbar (pts (xy 0 -2) (xy 10 -2))))"#,
        );
        let Drawing::Dimension(Dimension::Aligned { common, height }) = &board.drawings[0] else {
            panic!("expected an aligned dimension");
        };
        assert_eq!(common.start, Point::new(0, 0));
        assert_eq!(common.end, Point::new(10_000_000, 0));
        assert_eq!(height.abs(), 2_000_000);
        assert_eq!(common.style.thickness, 150_000);
    }

    #[test]
    fn test_target() {
        let board = load(
            20211014,
            r#"(target x (at 1 2) (size 5) (width 0.1) (layer "Edge.Cuts"))"#,
        );
        let Drawing::Target(target) = &board.drawings[0] else {
            panic!("expected a target");
        };
        assert_eq!(target.layer, PcbLayerId::EDGE_CUTS);
        assert_eq!(target.size, 5_000_000);
    }
}
