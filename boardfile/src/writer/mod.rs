//! Writer for the S-expression board and footprint formats.
//!
//! Output is always the current file version with millimetre lengths, so a
//! board loaded from either grammar is saved in the modern one. Reading the
//! written text back yields the same layers, nets and items.

mod format;
mod items;

use std::path::Path;

use crate::board::footprint::Footprint;
use crate::board::nets::NetTable;
use crate::board::settings::{EdgeConnector, LayerClass, Stackup};
use crate::board::{Board, SEXPR_BOARD_FILE_VERSION};
use crate::error::BoardError;
use crate::units::mils_to_biu;

use self::format::{mm, num, quoted, xy, yes_no, Output};

/// Name written in the `generator` token.
pub const GENERATOR: &str = "boardfile";

/// Render `board` as a `(kicad_pcb ...)` document.
pub fn write_board(board: &Board) -> String {
    let mut writer = BoardWriter::new(Some(&board.nets));
    writer.board(board);
    writer.out.finish()
}

/// Render a standalone `(footprint ...)` document. Pad nets are not written.
pub fn write_footprint(footprint: &Footprint) -> String {
    let mut writer = BoardWriter::new(None);
    writer.footprint(footprint, 0, true);
    writer.out.finish()
}

/// Write `board` to `path`.
pub fn save_board(path: impl AsRef<Path>, board: &Board) -> Result<(), BoardError> {
    let path = path.as_ref();
    let text = write_board(board);
    std::fs::write(path, &text)?;
    tracing::info!(path = %path.display(), bytes = text.len(), "board saved");
    Ok(())
}

pub(crate) struct BoardWriter<'b> {
    out: Output,
    nets: Option<&'b NetTable>,
}

impl<'b> BoardWriter<'b> {
    fn new(nets: Option<&'b NetTable>) -> Self {
        Self {
            out: Output::default(),
            nets,
        }
    }

    fn board(&mut self, board: &Board) {
        self.out.line(
            0,
            format!("(kicad_pcb (version {SEXPR_BOARD_FILE_VERSION}) (generator {GENERATOR})"),
        );
        self.out.blank();
        self.out.line(1, "(general");
        self.out.line(2, format!("(thickness {})", mm(board.settings.board_thickness)));
        self.out.line(1, ")");
        self.out.blank();
        self.page(board);
        self.title_block(board);
        self.layers(board);
        self.out.blank();
        self.setup(board);
        self.out.blank();
        self.nets(board);
        self.out.blank();
        self.net_classes(board);

        for footprint in &board.footprints {
            self.out.blank();
            self.footprint(footprint, 1, false);
        }
        if !board.drawings.is_empty() {
            self.out.blank();
        }
        for drawing in &board.drawings {
            self.drawing(drawing, 1);
        }
        if !board.tracks.is_empty() {
            self.out.blank();
        }
        for track in &board.tracks {
            self.track(track, 1);
        }
        for zone in &board.zones {
            self.out.blank();
            self.zone(zone, 1);
        }
        for group in &board.groups {
            self.out.blank();
            self.group(group, 1);
        }
        self.out.line(0, ")");
    }

    fn page(&mut self, board: &Board) {
        let page = &board.page;
        let mut text = format!("(paper {}", quoted(&page.paper));
        if let Some((width, height)) = page.custom_size_mils.filter(|_| page.is_custom()) {
            text.push_str(&format!(" {} {}", mm(mils_to_biu(width as f64)), mm(mils_to_biu(height as f64))));
        }
        if page.portrait {
            text.push_str(" portrait");
        }
        text.push(')');
        self.out.line(1, text);
    }

    fn title_block(&mut self, board: &Board) {
        let title = &board.title_block;
        if title.is_empty() {
            return;
        }
        self.out.line(1, "(title_block");
        for (key, value) in [
            ("title", &title.title),
            ("date", &title.date),
            ("rev", &title.revision),
            ("company", &title.company),
        ] {
            if !value.is_empty() {
                self.out.line(2, format!("({key} {})", quoted(value)));
            }
        }
        for (i, comment) in title.comments.iter().enumerate() {
            if !comment.is_empty() {
                self.out.line(2, format!("(comment {} {})", i + 1, quoted(comment)));
            }
        }
        self.out.line(1, ")");
        self.out.blank();
    }

    fn layers(&mut self, board: &Board) {
        self.out.line(1, "(layers");
        for layer in board.layers.iter_enabled() {
            let mut text = format!(
                "({} {} {}",
                layer.id.index(),
                quoted(layer.id.name()),
                layer.layer_type.as_str()
            );
            if let Some(user_name) = &layer.user_name {
                text.push(' ');
                text.push_str(&quoted(user_name));
            }
            if !layer.visible {
                text.push_str(" hide");
            }
            text.push(')');
            self.out.line(2, text);
        }
        self.out.line(1, ")");
    }

    fn setup(&mut self, board: &Board) {
        let s = &board.settings;
        self.out.line(1, "(setup");
        if let Some(stackup) = &s.stackup {
            self.stackup(stackup);
        }
        self.out.line(2, format!("(pad_to_mask_clearance {})", mm(s.solder_mask_margin)));
        if s.solder_mask_min_width != 0 {
            self.out.line(2, format!("(solder_mask_min_width {})", mm(s.solder_mask_min_width)));
        }
        if s.solder_paste_margin != 0 {
            self.out.line(2, format!("(pad_to_paste_clearance {})", mm(s.solder_paste_margin)));
        }
        if s.solder_paste_ratio != 0.0 {
            self.out.line(2, format!("(pad_to_paste_clearance_ratio {})", num(s.solder_paste_ratio)));
        }
        if s.allow_soldermask_bridges_in_footprints {
            self.out.line(2, "(allow_soldermask_bridges_in_footprints yes)");
        }
        if s.aux_axis_origin != Default::default() {
            self.out.line(2, format!("(aux_axis_origin {})", xy(s.aux_axis_origin)));
        }
        if s.grid_origin != Default::default() {
            self.out.line(2, format!("(grid_origin {})", xy(s.grid_origin)));
        }
        if let Some(visible) = s.visible_elements {
            self.out.line(2, format!("(visible_elements {visible:X})"));
        }
        for width in &s.track_widths {
            self.out.line(2, format!("(user_trace_width {})", mm(*width)));
        }
        for via in &s.via_sizes {
            self.out.line(2, format!("(user_via {} {})", mm(via.diameter), mm(via.drill)));
        }
        for (key, value) in [
            ("zone_clearance", s.zone_clearance),
            ("trace_min", s.min_track_width),
            ("via_min_size", s.min_via_diameter),
            ("via_min_drill", s.min_via_drill),
            ("uvia_min_size", s.min_micro_via_diameter),
            ("uvia_min_drill", s.min_micro_via_drill),
            ("pad_drill", s.pad_drill),
        ] {
            self.out.line(2, format!("({key} {})", mm(value)));
        }
        self.out.line(2, format!("(zone_45_only {})", yes_no(s.zone_45_only)));
        self.out.line(2, format!("(uvias_allowed {})", yes_no(s.micro_vias_allowed)));
        self.out.line(2, format!("(pad_size {} {})", mm(s.pad_size.width), mm(s.pad_size.height)));

        self.out.line(2, "(defaults");
        for (prefix, class) in [
            ("edge_cuts", LayerClass::Edges),
            ("courtyard", LayerClass::Courtyard),
            ("copper", LayerClass::Copper),
            ("silk", LayerClass::Silkscreen),
            ("fab_layers", LayerClass::Fab),
            ("other_layers", LayerClass::Other),
        ] {
            let d = s.defaults_for(class);
            self.out.line(3, format!("({prefix}_line_width {})", mm(d.line_width)));
            let mut dims = format!(
                "({prefix}_text_dims (size {} {}) (thickness {})",
                mm(d.text_size.width),
                mm(d.text_size.height),
                mm(d.text_thickness)
            );
            if d.italic {
                dims.push_str(" italic");
            }
            if d.keep_upright {
                dims.push_str(" keep_upright");
            }
            dims.push(')');
            self.out.line(3, dims);
        }
        self.out.line(2, ")");

        if let Some(plot_params) = &s.plot_params {
            self.out.line(2, plot_params);
        }
        self.out.line(1, ")");
    }

    fn stackup(&mut self, stackup: &Stackup) {
        self.out.line(2, "(stackup");
        for item in &stackup.items {
            let mut text = format!("(layer {} (type {})", quoted(&item.name), quoted(&item.kind));
            if let Some(color) = &item.color {
                text.push_str(&format!(" (color {})", quoted(color)));
            }
            for (i, sub) in item.sublayers.iter().enumerate() {
                if i > 0 {
                    text.push_str(" addsublayer");
                }
                if let Some(thickness) = sub.thickness {
                    text.push_str(&format!(" (thickness {}", mm(thickness)));
                    if sub.thickness_locked {
                        text.push_str(" locked");
                    }
                    text.push(')');
                }
                if let Some(material) = &sub.material {
                    text.push_str(&format!(" (material {})", quoted(material)));
                }
                if let Some(epsilon_r) = sub.epsilon_r {
                    text.push_str(&format!(" (epsilon_r {})", num(epsilon_r)));
                }
                if let Some(loss_tangent) = sub.loss_tangent {
                    text.push_str(&format!(" (loss_tangent {})", num(loss_tangent)));
                }
            }
            text.push(')');
            self.out.line(3, text);
        }
        if let Some(finish) = &stackup.copper_finish {
            self.out.line(3, format!("(copper_finish {})", quoted(finish)));
        }
        self.out.line(
            3,
            format!("(dielectric_constraints {})", yes_no(stackup.dielectric_constraints)),
        );
        match stackup.edge_connector {
            EdgeConnector::None => {}
            EdgeConnector::Yes => self.out.line(3, "(edge_connector yes)"),
            EdgeConnector::Bevelled => self.out.line(3, "(edge_connector bevelled)"),
        }
        if stackup.castellated_pads {
            self.out.line(3, "(castellated_pads yes)");
        }
        if stackup.edge_plating {
            self.out.line(3, "(edge_plating yes)");
        }
        self.out.line(2, ")");
    }

    fn nets(&mut self, board: &Board) {
        for net in board.nets.iter() {
            self.out.line(1, format!("(net {} {})", net.code, quoted(&net.name)));
        }
    }

    fn net_classes(&mut self, board: &Board) {
        let classes = std::iter::once(&board.net_classes.default).chain(board.net_classes.iter());
        for class in classes {
            self.out.line(
                1,
                format!("(net_class {} {}", quoted(&class.name), quoted(&class.description)),
            );
            for (key, value) in [
                ("clearance", Some(class.clearance)),
                ("trace_width", Some(class.track_width)),
                ("via_dia", Some(class.via_diameter)),
                ("via_drill", Some(class.via_drill)),
                ("uvia_dia", Some(class.micro_via_diameter)),
                ("uvia_drill", Some(class.micro_via_drill)),
                ("diff_pair_width", class.diff_pair_width),
                ("diff_pair_gap", class.diff_pair_gap),
            ] {
                if let Some(value) = value {
                    self.out.line(2, format!("({key} {})", mm(value)));
                }
            }
            for net in &class.nets {
                self.out.line(2, format!("(add_net {})", quoted(net)));
            }
            self.out.line(1, ")");
        }
    }
}
