//! Board-level sections: general, page, title block, layer table, setup,
//! stackup, nets and net classes.

use crate::board::nets::{NetClass, UNCONNECTED};
use crate::board::settings::{
    EdgeConnector, LayerClass, PageInfo, Stackup, StackupItem, StackupSublayer, ViaDimension,
};
use crate::error::BoardError;
use crate::layers::{LayerSet, LayerType, PcbLayerId};
use crate::parser::sexp::SExp;

use super::PcbParser;

/// Entry of the `layers` section before copper renumbering.
struct LayerEntry<'n> {
    node: &'n SExp,
    name: &'n str,
    layer_type: LayerType,
    user_name: Option<&'n str>,
    hidden: bool,
}

impl<'p> PcbParser<'p> {
    pub(super) fn parse_general(&mut self, node: &SExp) -> Result<(), BoardError> {
        // Item counters of older files are recomputed, only the thickness matters.
        if let Some(thickness) = self.child_biu(node, "thickness")? {
            self.builder.board_mut().settings.board_thickness = thickness;
        }
        Ok(())
    }

    pub(super) fn parse_paper(&mut self, node: &SExp) -> Result<(), BoardError> {
        let paper = self.atom_at(node, 0)?;
        if !PageInfo::is_known_paper(paper) {
            return Err(self.error(node, format!("unknown paper type '{paper}'")));
        }
        let mut page = PageInfo {
            paper: paper.to_string(),
            ..PageInfo::default()
        };
        if page.is_custom() {
            let width = self.double_at(node, 1)?;
            let height = self.double_at(node, 2)?;
            page.custom_size_mils = Some((mm_to_mils(width), mm_to_mils(height)));
        }
        page.portrait = node.has_flag("portrait");
        self.builder.board_mut().page = page;
        Ok(())
    }

    pub(super) fn parse_title_block(&mut self, node: &SExp) -> Result<(), BoardError> {
        for child in node.args() {
            let Some(key) = child.head() else {
                continue;
            };
            if key == "comment" {
                let n = self.int_at(child, 0)?;
                if !(1..=9).contains(&n) {
                    return Err(self.error(child, format!("comment number {n} out of range")));
                }
                let value = self.text(self.atom_at(child, 1)?);
                self.builder.board_mut().title_block.comments[n as usize - 1] = value;
                continue;
            }
            let value = self.text(self.atom_at(child, 0)?);
            let title = &mut self.builder.board_mut().title_block;
            match key {
                "title" => title.title = value,
                "date" => title.date = value,
                "rev" => title.revision = value,
                "company" => title.company = value,
                _ => {}
            }
        }
        Ok(())
    }

    /// The layer table. Copper layers come first in the file and are
    /// renumbered by position so that the last one is always B.Cu.
    pub(super) fn parse_layers(&mut self, node: &SExp) -> Result<(), BoardError> {
        let mut entries = Vec::new();
        for entry in node.args() {
            let name = self.atom_at(entry, 0)?;
            let type_text = self.atom_at(entry, 1)?;
            let layer_type = LayerType::parse(type_text)
                .ok_or_else(|| self.error(entry, format!("unknown layer type '{type_text}'")))?;
            let mut user_name = None;
            let mut hidden = false;
            for extra in entry.args().iter().skip(2) {
                match extra.as_symbol() {
                    Some("hide") => hidden = true,
                    _ => user_name = extra.as_atom(),
                }
            }
            entries.push(LayerEntry {
                node: entry,
                name,
                layer_type,
                user_name,
                hidden,
            });
        }

        let copper_count = entries.iter().filter(|e| e.layer_type.is_copper()).count();
        if copper_count < 2 || copper_count % 2 != 0 || copper_count > PcbLayerId::MAX_COPPER {
            return Err(self.error(node, format!("invalid copper layer count {copper_count}")));
        }

        let mut enabled = LayerSet::empty();
        let mut visible = LayerSet::empty();
        let mut copper_index = 0;
        for entry in &entries {
            let layer = if entry.layer_type.is_copper() {
                let layer = match copper_index {
                    0 => Some(PcbLayerId::F_CU),
                    i if i == copper_count - 1 => Some(PcbLayerId::B_CU),
                    i => PcbLayerId::inner(i),
                };
                copper_index += 1;
                layer
            } else {
                self.lookup.layer(entry.name).filter(|l| !l.is_copper())
            };
            let Some(layer) = layer else {
                return Err(self.error(entry.node, format!("unknown layer '{}'", entry.name)));
            };

            self.lookup.register(entry.name, layer);
            let table = &mut self.builder.board_mut().layers;
            table.set_layer_type(layer, entry.layer_type);
            if let Some(user_name) = entry.user_name {
                table.set_user_name(layer, user_name);
                self.lookup.register(user_name, layer);
            }
            enabled.insert(layer);
            if !entry.hidden {
                visible.insert(layer);
            }
        }

        let table = &mut self.builder.board_mut().layers;
        table.set_copper_count(copper_count);
        table.set_enabled(enabled);
        table.set_visible(visible);
        tracing::debug!(copper_count, layers = entries.len(), "layer table");
        Ok(())
    }

    pub(super) fn parse_setup(&mut self, node: &SExp) -> Result<(), BoardError> {
        for child in node.args() {
            let Some(key) = child.head() else {
                continue;
            };
            match key {
                "stackup" => {
                    let stackup = self.parse_stackup(child)?;
                    self.builder.board_mut().settings.stackup = Some(stackup);
                }
                "defaults" => self.parse_defaults(child)?,
                "pcbplotparams" => {
                    self.builder.board_mut().settings.plot_params = Some(child.to_string())
                }
                "pad_to_mask_clearance" => {
                    self.builder.board_mut().settings.solder_mask_margin = self.biu_at(child, 0)?
                }
                "solder_mask_min_width" => {
                    self.builder.board_mut().settings.solder_mask_min_width = self.biu_at(child, 0)?
                }
                "pad_to_paste_clearance" => {
                    self.builder.board_mut().settings.solder_paste_margin = self.biu_at(child, 0)?
                }
                "pad_to_paste_clearance_ratio" => {
                    self.builder.board_mut().settings.solder_paste_ratio = self.double_at(child, 0)?
                }
                "aux_axis_origin" => {
                    self.builder.board_mut().settings.aux_axis_origin = self.point(child)?
                }
                "grid_origin" => self.builder.board_mut().settings.grid_origin = self.point(child)?,
                "allow_soldermask_bridges_in_footprints" => {
                    self.builder
                        .board_mut()
                        .settings
                        .allow_soldermask_bridges_in_footprints = self.yes_no_at(child, 0)?
                }
                "visible_elements" => {
                    let elements = self.hex_at(child, 0)?;
                    self.builder.board_mut().settings.visible_elements = Some(elements);
                }
                _ => self.parse_setup_rule(child, key)?,
            }
        }
        Ok(())
    }

    /// Design rule tokens that older files kept in the setup section.
    fn parse_setup_rule(&mut self, child: &SExp, key: &str) -> Result<(), BoardError> {
        match key {
            "user_trace_width" => {
                let width = self.biu_at(child, 0)?;
                self.builder.board_mut().settings.track_widths.push(width);
            }
            "user_via" => {
                let diameter = self.biu_at(child, 0)?;
                let drill = self.biu_at(child, 1)?;
                let via = ViaDimension { diameter, drill };
                self.builder.board_mut().settings.via_sizes.push(via);
            }
            "trace_clearance" | "via_size" | "via_drill" | "uvia_size" | "uvia_drill" => {
                let value = self.biu_at(child, 0)?;
                let class = &mut self.builder.board_mut().net_classes.default;
                match key {
                    "trace_clearance" => class.clearance = value,
                    "via_size" => class.via_diameter = value,
                    "via_drill" => class.via_drill = value,
                    "uvia_size" => class.micro_via_diameter = value,
                    _ => class.micro_via_drill = value,
                }
            }
            "zone_clearance" | "trace_min" | "via_min_size" | "via_min_drill" | "uvia_min_size"
            | "uvia_min_drill" | "pad_drill" => {
                let value = self.biu_at(child, 0)?;
                let settings = &mut self.builder.board_mut().settings;
                match key {
                    "zone_clearance" => settings.zone_clearance = value,
                    "trace_min" => settings.min_track_width = value,
                    "via_min_size" => settings.min_via_diameter = value,
                    "via_min_drill" => settings.min_via_drill = value,
                    "uvia_min_size" => settings.min_micro_via_diameter = value,
                    "uvia_min_drill" => settings.min_micro_via_drill = value,
                    _ => settings.pad_drill = value,
                }
            }
            "zone_45_only" | "uvias_allowed" => {
                let value = self.yes_no_at(child, 0)?;
                let settings = &mut self.builder.board_mut().settings;
                if key == "zone_45_only" {
                    settings.zone_45_only = value;
                } else {
                    settings.micro_vias_allowed = value;
                }
            }
            "segment_width" | "edge_width" | "mod_edge_width" => {
                let width = self.biu_at(child, 0)?;
                let class = match key {
                    "segment_width" => LayerClass::Copper,
                    "edge_width" => LayerClass::Edges,
                    _ => LayerClass::Silkscreen,
                };
                self.builder.board_mut().settings.defaults_for_mut(class).line_width = width;
            }
            "pcb_text_width" | "mod_text_width" => {
                let thickness = self.biu_at(child, 0)?;
                let class = if key == "pcb_text_width" {
                    LayerClass::Copper
                } else {
                    LayerClass::Silkscreen
                };
                let settings = &mut self.builder.board_mut().settings;
                settings.defaults_for_mut(class).text_thickness = thickness;
            }
            "pcb_text_size" | "mod_text_size" => {
                let size = self.size(child)?;
                let class = if key == "pcb_text_size" {
                    LayerClass::Copper
                } else {
                    LayerClass::Silkscreen
                };
                self.builder.board_mut().settings.defaults_for_mut(class).text_size = size;
            }
            "pad_size" => self.builder.board_mut().settings.pad_size = self.size(child)?,
            _ => {
                tracing::trace!(line = child.pos.line, key, "ignoring setup token");
            }
        }
        Ok(())
    }

    /// `(defaults ...)`: line width and text dimensions per layer class.
    fn parse_defaults(&mut self, node: &SExp) -> Result<(), BoardError> {
        const CLASSES: [(&str, LayerClass); 6] = [
            ("edge_cuts", LayerClass::Edges),
            ("courtyard", LayerClass::Courtyard),
            ("copper", LayerClass::Copper),
            ("silk", LayerClass::Silkscreen),
            ("fab_layers", LayerClass::Fab),
            ("other_layers", LayerClass::Other),
        ];
        for child in node.args() {
            let Some(key) = child.head() else {
                continue;
            };
            let Some((prefix, class)) = CLASSES.iter().find(|(p, _)| key.starts_with(*p)) else {
                continue;
            };
            match &key[prefix.len()..] {
                "_line_width" => {
                    let width = self.biu_at(child, 0)?;
                    self.builder.board_mut().settings.defaults_for_mut(*class).line_width = width;
                }
                "_text_dims" => {
                    let size = child.get("size").map(|s| self.size(s)).transpose()?;
                    let thickness = self.child_biu(child, "thickness")?;
                    let italic = child.has_flag("italic");
                    let keep_upright = child.has_flag("keep_upright");
                    let defaults = self.builder.board_mut().settings.defaults_for_mut(*class);
                    if let Some(size) = size {
                        defaults.text_size = size;
                    }
                    if let Some(thickness) = thickness {
                        defaults.text_thickness = thickness;
                    }
                    defaults.italic = italic;
                    defaults.keep_upright = keep_upright;
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn parse_stackup(&mut self, node: &SExp) -> Result<Stackup, BoardError> {
        let mut stackup = Stackup::default();
        for child in node.args() {
            match child.head() {
                Some("layer") => {
                    let item = self.parse_stackup_item(child)?;
                    stackup.items.push(item);
                }
                Some("copper_finish") => {
                    stackup.copper_finish = Some(self.atom_at(child, 0)?.to_string())
                }
                Some("dielectric_constraints") => {
                    stackup.dielectric_constraints = self.yes_no_at(child, 0)?
                }
                Some("edge_connector") => {
                    stackup.edge_connector = match self.atom_at(child, 0)? {
                        "yes" => EdgeConnector::Yes,
                        "bevelled" => EdgeConnector::Bevelled,
                        _ => EdgeConnector::None,
                    }
                }
                Some("castellated_pads") => stackup.castellated_pads = self.yes_no_at(child, 0)?,
                Some("edge_plating") => stackup.edge_plating = self.yes_no_at(child, 0)?,
                _ => {}
            }
        }
        Ok(stackup)
    }

    /// `(layer "name" (type ..) (thickness t [locked]) ... [addsublayer ...])`.
    fn parse_stackup_item(&mut self, node: &SExp) -> Result<StackupItem, BoardError> {
        let name = self.atom_at(node, 0)?.to_string();
        let mut item = StackupItem {
            layer: self.lookup.layer(&name),
            name,
            kind: String::new(),
            color: None,
            sublayers: Vec::new(),
        };
        let mut current = StackupSublayer::default();
        for child in node.args().iter().skip(1) {
            if child.as_symbol() == Some("addsublayer") {
                item.sublayers.push(std::mem::take(&mut current));
                continue;
            }
            match child.head() {
                Some("type") => item.kind = self.atom_at(child, 0)?.to_string(),
                Some("color") => item.color = Some(self.atom_at(child, 0)?.to_string()),
                Some("thickness") => {
                    current.thickness = Some(self.biu_at(child, 0)?);
                    current.thickness_locked = child.has_flag("locked");
                }
                Some("material") => current.material = Some(self.atom_at(child, 0)?.to_string()),
                Some("epsilon_r") => current.epsilon_r = Some(self.double_at(child, 0)?),
                Some("loss_tangent") => current.loss_tangent = Some(self.double_at(child, 0)?),
                _ => {}
            }
        }
        item.sublayers.push(current);
        Ok(item)
    }

    /// `(net code "name")`. Net 0 always exists; a repeated name shares the
    /// code it already has.
    pub(super) fn parse_net(&mut self, node: &SExp) -> Result<(), BoardError> {
        let file_code = self.int_at(node, 0)?;
        let name = node
            .args()
            .get(1)
            .and_then(SExp::as_atom)
            .map(|n| self.text(n))
            .unwrap_or_default();
        if file_code == i64::from(UNCONNECTED) {
            return Ok(());
        }
        let code = self.builder.board_mut().nets.add(&name);
        self.ctx.net_codes.insert(file_code, code);
        Ok(())
    }

    pub(super) fn parse_net_class(&mut self, node: &SExp) -> Result<(), BoardError> {
        let mut class = NetClass::new(self.atom_at(node, 0)?);
        if let Some(description) = node.args().get(1).and_then(SExp::as_atom) {
            class.description = description.to_string();
        }
        for child in node.args().iter().skip(1) {
            let Some(key) = child.head() else {
                continue;
            };
            match key {
                "add_net" => class.nets.push(self.text(self.atom_at(child, 0)?)),
                "clearance" => class.clearance = self.biu_at(child, 0)?,
                "trace_width" => class.track_width = self.biu_at(child, 0)?,
                "via_dia" => class.via_diameter = self.biu_at(child, 0)?,
                "via_drill" => class.via_drill = self.biu_at(child, 0)?,
                "uvia_dia" => class.micro_via_diameter = self.biu_at(child, 0)?,
                "uvia_drill" => class.micro_via_drill = self.biu_at(child, 0)?,
                "diff_pair_width" => class.diff_pair_width = Some(self.biu_at(child, 0)?),
                "diff_pair_gap" => class.diff_pair_gap = Some(self.biu_at(child, 0)?),
                _ => {}
            }
        }

        tracing::debug!(class = %class.name, nets = class.nets.len(), "net class");
        if let Err(duplicate) = self.builder.board_mut().net_classes.add(class) {
            return Err(BoardError::DuplicateName {
                kind: "net class",
                name: duplicate.name,
                location: self.site(node).location(),
            });
        }
        Ok(())
    }
}

fn mm_to_mils(mm: f64) -> i64 {
    (mm * 1000.0 / 25.4).round() as i64
}

#[cfg(test)]
mod tests {
    use crate::board::Board;
    use crate::error::BoardError;
    use crate::layers::PcbLayerId;
    use crate::options::LoadOptions;
    use crate::parser::pcb::PcbParser;
    use crate::parser::sexp;

    fn load(body: &str) -> Result<Board, BoardError> {
        let text = format!("(kicad_pcb (version 20211014) {body})");
        let root = sexp::parse(&text).unwrap();
        let mut options = LoadOptions::default();
        PcbParser::new(&text, "t.kicad_pcb", &mut options)
            .parse_board(&root)
            .map(|(board, _)| board)
    }

    const FOUR_LAYERS: &str = r#"(layers
        (0 "F.Cu" signal)
        (1 "In1.Cu" power "GND plane")
        (2 "In2.Cu" signal)
        (31 "B.Cu" signal)
        (36 "B.SilkS" user "B.Silkscreen")
        (44 "Edge.Cuts" user)
        (41 "Cmts.User" user hide))"#;

    #[test]
    fn test_layers_renumber_copper() {
        let board = load(FOUR_LAYERS).unwrap();
        assert_eq!(board.copper_count(), 4);
        let layers = &board.layers;
        assert!(layers.is_enabled(PcbLayerId::B_CU));
        assert!(layers.is_enabled(PcbLayerId::inner(2).unwrap()));
        assert!(!layers.is_enabled(PcbLayerId::F_SILKS));
        assert_eq!(layers.get(PcbLayerId::inner(1).unwrap()).name(), "GND plane");
        assert!(!layers.get(PcbLayerId::CMTS_USER).visible);
    }

    #[test]
    fn test_user_layer_name_resolves_items() {
        let body = format!(
            "{FOUR_LAYERS} (gr_line (start 0 0) (end 1 1) (layer \"B.Silkscreen\") (width 0.12))"
        );
        let board = load(&body).unwrap();
        assert_eq!(board.drawings[0].layer(), PcbLayerId::B_SILKS);
    }

    #[test]
    fn test_odd_copper_count_rejected() {
        let err = load(r#"(layers (0 "F.Cu" signal) (1 "In1.Cu" signal) (31 "B.Cu" signal))"#)
            .unwrap_err();
        assert!(err.to_string().contains("copper layer count 3"));
    }

    #[test]
    fn test_unknown_technical_layer_is_fatal() {
        let err = load(r#"(layers (0 "F.Cu" signal) (31 "B.Cu" signal) (40 "Nonsense" user))"#)
            .unwrap_err();
        assert!(err.to_string().contains("unknown layer 'Nonsense'"));
    }

    #[test]
    fn test_duplicate_net_class() {
        let err = load(
            r#"(net_class "Power" "" (clearance 0.3)) (net_class "Power" "" (clearance 0.4))"#,
        )
        .unwrap_err();
        assert!(matches!(err, BoardError::DuplicateName { kind: "net class", .. }));
    }

    #[test]
    fn test_nets_and_classes() {
        let board = load(
            r#"(net 0 "") (net 1 "GND") (net 2 "VCC")
               (net_class "Default" "default" (clearance 0.25) (trace_width 0.3) (add_net "GND"))
               (net_class "Power" "" (diff_pair_width 0.2) (add_net "VCC"))"#,
        )
        .unwrap();
        assert_eq!(board.nets.len(), 3);
        assert_eq!(board.nets.find_by_name("VCC").map(|n| n.code), Some(2));
        assert_eq!(board.net_classes.default.clearance, 250_000);
        assert_eq!(board.net_classes.default.nets, vec!["GND".to_string()]);
        let power = board.net_classes.find("Power").unwrap();
        assert_eq!(power.diff_pair_width, Some(200_000));
    }

    #[test]
    fn test_setup_and_stackup() {
        let board = load(
            r#"(setup
                 (stackup
                   (layer "F.Cu" (type "copper") (thickness 0.035))
                   (layer "dielectric 1" (type "prepreg") (thickness 0.1 locked) (material "FR4")
                      addsublayer (thickness 0.2) (material "FR4"))
                   (copper_finish "ENIG") (edge_connector bevelled))
                 (pad_to_mask_clearance 0.05)
                 (user_via 0.6 0.3)
                 (defaults (silk_line_width 0.15) (silk_text_dims (size 1.2 1.0) (thickness 0.18) italic))
                 (pcbplotparams (layerselection 0x010fc_ffffffff)))"#,
        )
        .unwrap();
        let settings = &board.settings;
        assert_eq!(settings.solder_mask_margin, 50_000);
        assert_eq!(settings.via_sizes[0].drill, 300_000);
        let stackup = settings.stackup.as_ref().unwrap();
        assert_eq!(stackup.items.len(), 2);
        assert_eq!(stackup.items[0].layer, Some(PcbLayerId::F_CU));
        assert_eq!(stackup.items[1].layer, None);
        assert_eq!(stackup.items[1].sublayers.len(), 2);
        assert!(stackup.items[1].sublayers[0].thickness_locked);
        assert_eq!(stackup.copper_finish.as_deref(), Some("ENIG"));
        let silk = settings.defaults_for(crate::board::settings::LayerClass::Silkscreen);
        assert_eq!(silk.line_width, 150_000);
        assert_eq!(silk.text_size.width, 1_200_000);
        assert!(silk.italic);
        assert!(settings.plot_params.as_deref().unwrap().starts_with("(pcbplotparams"));
    }

    #[test]
    fn test_custom_paper() {
        let board = load(r#"(paper "User" 254 127 portrait)"#).unwrap();
        assert_eq!(board.page.custom_size_mils, Some((10_000, 5_000)));
        assert!(board.page.portrait);
        assert!(load(r#"(paper "Z9")"#).is_err());
    }
}
