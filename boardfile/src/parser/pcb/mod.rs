//! Reader for the S-expression board (`.kicad_pcb`) and footprint
//! (`.kicad_mod`) formats.
//!
//! The tokenizer builds the whole tree first; this module then walks it and
//! feeds a [`BoardBuilder`]. Lengths are millimetres and angles degrees.

mod footprint;
mod graphics;
mod items;
mod sections;

use crate::board::footprint::Footprint;
use crate::board::group::GroupParent;
use crate::board::text::convert_overbar_notation;
use crate::board::{Board, BoardBuilder, Drawing, SEXPR_BOARD_FILE_VERSION};
use crate::error::{BoardError, Warning, WarningKind};
use crate::geometry::{Point, Size};
use crate::kiid::Kiid;
use crate::layers::{LayerLookup, LayerSet, PcbLayerId};
use crate::options::LoadPolicy;
use crate::units::{Biu, IU_PER_MM};

use super::context::ParseContext;
use super::sexp::SExp;
use super::values::{parse_angle, parse_board_units, parse_double, parse_hex, parse_int, Site};

/// Files older than this wrote overbars as `~text~`.
const OVERBAR_NOTATION_VERSION: u32 = 20210606;

pub struct PcbParser<'p> {
    ctx: ParseContext<'p>,
    builder: BoardBuilder,
    lookup: LayerLookup,
    version: u32,
}

impl<'p> PcbParser<'p> {
    pub fn new(text: &str, source: &str, policy: &'p mut dyn LoadPolicy) -> Self {
        let mut ctx = ParseContext::new(source, policy);
        ctx.set_total_lines(text.lines().count());
        Self {
            ctx,
            builder: BoardBuilder::new(),
            lookup: LayerLookup::default(),
            version: SEXPR_BOARD_FILE_VERSION,
        }
    }

    /// Walk a `(kicad_pcb ...)` tree and finalize the board.
    pub fn parse_board(mut self, root: &SExp) -> Result<(Board, Vec<Warning>), BoardError> {
        if root.head() != Some("kicad_pcb") {
            return Err(self.error(root, "expected 'kicad_pcb'"));
        }
        let mut items = 0usize;
        for item in root.args() {
            self.ctx.report(item.pos.line)?;
            let Some(keyword) = item.head() else {
                return Err(self.error(item, "expected a list"));
            };
            match keyword {
                "version" => self.parse_version(item)?,
                "generator" => {
                    let generator = self.atom_at(item, 0)?.to_string();
                    self.builder.board_mut().generator = Some(generator);
                }
                "host" => self.parse_host(item),
                "general" => self.parse_general(item)?,
                "paper" | "page" => self.parse_paper(item)?,
                "title_block" => self.parse_title_block(item)?,
                "layers" => self.parse_layers(item)?,
                "setup" => self.parse_setup(item)?,
                "net" => self.parse_net(item)?,
                "net_class" => self.parse_net_class(item)?,
                "gr_line" | "gr_arc" | "gr_circle" | "gr_rect" | "gr_poly" | "gr_curve" => {
                    let shape = self.parse_shape(item)?;
                    self.builder.add_drawing(Drawing::Shape(shape));
                }
                "gr_text" => {
                    let text = self.parse_board_text(item)?;
                    self.builder.add_drawing(Drawing::Text(text));
                }
                "dimension" => {
                    let dimension = self.parse_dimension(item)?;
                    self.builder.add_drawing(Drawing::Dimension(dimension));
                }
                "target" => {
                    let target = self.parse_target(item)?;
                    self.builder.add_drawing(Drawing::Target(target));
                }
                "footprint" | "module" => {
                    let index = self.builder.board().footprints.len();
                    let footprint = self.parse_footprint(item, GroupParent::Footprint(index))?;
                    self.builder.add_footprint(footprint);
                }
                "segment" | "arc" => {
                    if let Some(track) = self.parse_track(item)? {
                        self.builder.add_track(track);
                    }
                }
                "via" => {
                    if let Some(via) = self.parse_via(item)? {
                        self.builder.add_track(via);
                    }
                }
                "zone" => {
                    if let Some(zone) = self.parse_zone(item)? {
                        self.builder.add_zone(zone);
                    }
                }
                "group" => self.parse_group(item, GroupParent::Board)?,
                other => return Err(self.unknown_token(item, other)),
            }
            items += 1;
        }
        tracing::debug!(items, version = self.version, "board items read");

        let PcbParser {
            mut ctx, builder, ..
        } = self;
        let (board, finalize_warnings) = builder.finalize(ctx.policy())?;
        let mut warnings = ctx.take_warnings();
        warnings.extend(finalize_warnings);
        Ok((board, warnings))
    }

    /// Walk a standalone `(footprint ...)` or `(module ...)` tree.
    pub fn parse_footprint_file(
        mut self,
        root: &SExp,
    ) -> Result<(Footprint, Vec<Warning>), BoardError> {
        if !matches!(root.head(), Some("footprint") | Some("module")) {
            return Err(self.error(root, "expected 'footprint' or 'module'"));
        }
        self.ctx.report(root.pos.line)?;
        let footprint = self.parse_footprint(root, GroupParent::Footprint(0))?;
        self.builder.add_footprint(footprint);

        let PcbParser {
            mut ctx, builder, ..
        } = self;
        let (footprint, finalize_warnings) = builder.finalize_footprint(ctx.policy())?;
        let mut warnings = ctx.take_warnings();
        warnings.extend(finalize_warnings);
        Ok((footprint, warnings))
    }

    fn parse_version(&mut self, node: &SExp) -> Result<(), BoardError> {
        let version = self.int_at(node, 0)?;
        let version = u32::try_from(version)
            .map_err(|_| self.error(node, format!("invalid version {version}")))?;
        if version > SEXPR_BOARD_FILE_VERSION {
            return Err(BoardError::Version {
                found: version,
                supported: SEXPR_BOARD_FILE_VERSION,
            });
        }
        self.version = version;
        self.builder.board_mut().version = version;
        Ok(())
    }

    fn parse_host(&mut self, node: &SExp) {
        let mut atoms = node.args().iter().filter_map(SExp::as_atom);
        if let Some(name) = atoms.next() {
            let build = atoms.next().unwrap_or_default().to_string();
            self.builder.board_mut().host = Some((name.to_string(), build));
        }
    }

    // Value helpers. Errors point at the node that holds the bad value.

    fn site<'s>(&'s self, node: &SExp) -> Site<'s> {
        Site::new(&self.ctx.source, node.pos.line, node.pos.line_offset())
    }

    fn error(&self, node: &SExp, message: impl Into<String>) -> BoardError {
        self.site(node).error(message)
    }

    fn unknown_token(&self, node: &SExp, token: &str) -> BoardError {
        self.error(node, format!("unknown token '{token}'"))
    }

    fn arg<'n>(&self, node: &'n SExp, index: usize) -> Result<&'n SExp, BoardError> {
        node.args().get(index).ok_or_else(|| {
            let keyword = node.head().unwrap_or("list");
            self.error(node, format!("'{keyword}' is missing argument {}", index + 1))
        })
    }

    fn atom_at<'n>(&self, node: &'n SExp, index: usize) -> Result<&'n str, BoardError> {
        let arg = self.arg(node, index)?;
        arg.as_atom()
            .ok_or_else(|| self.error(arg, "expected a symbol or string, found a list"))
    }

    fn int_at(&self, node: &SExp, index: usize) -> Result<i64, BoardError> {
        let arg = self.arg(node, index)?;
        parse_int(arg.as_atom().unwrap_or_default(), self.site(arg))
    }

    fn hex_at(&self, node: &SExp, index: usize) -> Result<u64, BoardError> {
        let arg = self.arg(node, index)?;
        parse_hex(arg.as_atom().unwrap_or_default(), self.site(arg))
    }

    fn double_at(&self, node: &SExp, index: usize) -> Result<f64, BoardError> {
        let arg = self.arg(node, index)?;
        parse_double(arg.as_atom().unwrap_or_default(), self.site(arg))
    }

    fn biu_at(&self, node: &SExp, index: usize) -> Result<Biu, BoardError> {
        let arg = self.arg(node, index)?;
        parse_board_units(arg.as_atom().unwrap_or_default(), IU_PER_MM, self.site(arg))
    }

    /// Optional angle at `index`; a symbol such as `unlocked` counts as absent.
    fn opt_angle_at(&self, node: &SExp, index: usize) -> Result<Option<f64>, BoardError> {
        match node.args().get(index).and_then(SExp::as_symbol) {
            Some(text) if looks_numeric(text) => {
                let arg = &node.args()[index];
                parse_angle(text, 1.0, self.site(arg)).map(Some)
            }
            _ => Ok(None),
        }
    }

    fn yes_no_at(&self, node: &SExp, index: usize) -> Result<bool, BoardError> {
        let arg = self.arg(node, index)?;
        super::values::parse_bool_yes_no(arg.as_atom().unwrap_or_default(), self.site(arg))
    }

    /// `(key x y)` as a point.
    fn point(&self, node: &SExp) -> Result<Point, BoardError> {
        Ok(Point::new(self.biu_at(node, 0)?, self.biu_at(node, 1)?))
    }

    fn size(&self, node: &SExp) -> Result<Size, BoardError> {
        Ok(Size::new(self.biu_at(node, 0)?, self.biu_at(node, 1)?))
    }

    /// Point of the child `(key x y)`.
    fn child_point(&self, parent: &SExp, key: &str) -> Result<Point, BoardError> {
        let node = parent
            .get(key)
            .ok_or_else(|| self.error(parent, format!("missing '{key}'")))?;
        self.point(node)
    }

    fn child_biu(&self, parent: &SExp, key: &str) -> Result<Option<Biu>, BoardError> {
        parent.get(key).map(|n| self.biu_at(n, 0)).transpose()
    }

    fn child_double(&self, parent: &SExp, key: &str) -> Result<Option<f64>, BoardError> {
        parent.get(key).map(|n| self.double_at(n, 0)).transpose()
    }

    fn child_int(&self, parent: &SExp, key: &str) -> Result<Option<i64>, BoardError> {
        parent.get(key).map(|n| self.int_at(n, 0)).transpose()
    }

    fn child_text(&self, parent: &SExp, key: &str) -> Option<String> {
        parent.get_atom(key).map(|t| self.text(t))
    }

    /// `(pts (xy x y) ...)`.
    fn points(&self, pts: &SExp) -> Result<Vec<Point>, BoardError> {
        pts.get_all("xy").map(|xy| self.point(xy)).collect()
    }

    /// `tstamp` or `uuid` child; a fresh id when neither is present.
    fn item_id(&self, node: &SExp) -> Kiid {
        node.get_atom("uuid")
            .or_else(|| node.get_atom("tstamp"))
            .map(Kiid::parse)
            .unwrap_or_default()
    }

    /// Either the bare `locked` flag or a `(locked)` / `(locked yes)` list.
    fn is_locked(&self, node: &SExp) -> bool {
        node.has_flag("locked")
            || node
                .get("locked")
                .is_some_and(|l| l.args().first().and_then(SExp::as_atom) != Some("no"))
    }

    /// Text read from the file, upgraded to the current overbar notation.
    fn text(&self, raw: &str) -> String {
        if self.version < OVERBAR_NOTATION_VERSION {
            convert_overbar_notation(raw)
        } else {
            raw.to_string()
        }
    }

    // Layer resolution.

    /// Layer named by `name`; an unknown name lands on the rescue layer and
    /// is remembered for finalization.
    fn resolve_layer(&mut self, name: &str) -> PcbLayerId {
        match self.lookup.layer(name) {
            Some(layer) => layer,
            None => {
                tracing::debug!(layer = name, "undefined layer");
                self.builder.note_undefined_layer(name);
                PcbLayerId::RESCUE
            }
        }
    }

    /// `(layer "name")` child of `node`.
    fn item_layer(&mut self, node: &SExp) -> Result<PcbLayerId, BoardError> {
        let layer = node
            .get("layer")
            .ok_or_else(|| self.error(node, "missing 'layer'"))?;
        let name = self.atom_at(layer, 0)?;
        Ok(self.resolve_layer(name))
    }

    /// Arguments of a `(layers ...)` list, wildcards included.
    fn layer_set(&mut self, layers: &SExp) -> LayerSet {
        let mut set = LayerSet::empty();
        for name in layers.args().iter().filter_map(SExp::as_atom) {
            match self.lookup.layer_set(name) {
                Some(resolved) => set = set.union(resolved),
                None => {
                    self.builder.note_undefined_layer(name);
                    set.insert(PcbLayerId::RESCUE);
                }
            }
        }
        set
    }

    fn warn(&mut self, kind: WarningKind, node: &SExp, message: String) {
        self.ctx.warn_at(kind, node.pos.line, node.pos.line_offset(), message);
    }
}

fn looks_numeric(text: &str) -> bool {
    text.starts_with(|c: char| c.is_ascii_digit() || matches!(c, '-' | '+' | '.'))
}
