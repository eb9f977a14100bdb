//! Board-level sections: `$GENERAL`, `$SHEETDESCR`, `$SETUP`, `$EQUIPOT`
//! and `$NCLASS`.

use crate::board::nets::{NetClass, UNCONNECTED};
use crate::board::settings::{LayerClass, PageInfo, ViaDimension};
use crate::error::BoardError;
use crate::geometry::Size;
use crate::layers::{legacy_mask_to_layer_set, LayerSet, LayerType, PcbLayerId};
use crate::units::LegacyUnits;

use super::super::lines::Line;
use super::super::values::{parse_int, Site};
use super::{Args, LegacyParser};

impl<'a, 'p> LegacyParser<'a, 'p> {
    pub(super) fn parse_general(&mut self) -> Result<(), BoardError> {
        loop {
            let line = self.section_line("$EndGENERAL")?;
            match line.keyword().to_ascii_lowercase().as_str() {
                "$endgeneral" => return Ok(()),
                "units" => {
                    if line.rest().eq_ignore_ascii_case("mm") {
                        self.scale = LegacyUnits::Millimetres.scale();
                        tracing::debug!(line = line.number, "legacy file uses millimetres");
                    }
                }
                "layercount" => {
                    let count = self.args(&line).int()?;
                    if !(2..=PcbLayerId::MAX_COPPER as i64).contains(&count) || count % 2 != 0 {
                        return Err(self.ctx.error(
                            line.number,
                            0,
                            format!("invalid copper layer count {count}"),
                        ));
                    }
                    self.builder.board_mut().layers.set_copper_count(count as usize);
                }
                "ly" | "enabledlayers" => {
                    let mask = self.args(&line).hex()?;
                    let count = self.copper_count();
                    let enabled =
                        keep_board_copper(legacy_mask_to_layer_set(mask as u32, count), count);
                    self.builder.board_mut().layers.set_enabled(enabled);
                }
                "visiblelayers" => {
                    let mask = self.args(&line).hex()?;
                    let visible = legacy_mask_to_layer_set(mask as u32, self.copper_count());
                    self.builder.board_mut().layers.set_visible(visible);
                }
                "boardthickness" => {
                    let thickness = self.args(&line).biu()?;
                    self.builder.board_mut().settings.board_thickness = thickness;
                }
                // Net and item counters are recomputed from the content.
                _ => {}
            }
        }
    }

    pub(super) fn parse_sheet(&mut self) -> Result<(), BoardError> {
        loop {
            let line = self.section_line("$EndSHEETDESCR")?;
            let keyword = line.keyword().to_ascii_lowercase();
            match keyword.as_str() {
                "$endsheetdescr" => return Ok(()),
                "sheet" => {
                    let page = self.parse_page(&line)?;
                    self.builder.board_mut().page = page;
                }
                "title" | "date" | "rev" | "comp" => {
                    let value = self.args(&line).opt_text().unwrap_or_default();
                    let title = &mut self.builder.board_mut().title_block;
                    match keyword.as_str() {
                        "title" => title.title = value,
                        "date" => title.date = value,
                        "rev" => title.revision = value,
                        _ => title.company = value,
                    }
                }
                other => {
                    let slot = other
                        .strip_prefix("comment")
                        .and_then(|n| n.parse::<usize>().ok())
                        .filter(|n| (1..=9).contains(n));
                    if let Some(n) = slot {
                        let value = self.args(&line).opt_text().unwrap_or_default();
                        self.builder.board_mut().title_block.comments[n - 1] = value;
                    }
                }
            }
        }
    }

    fn parse_page(&self, line: &Line<'a>) -> Result<PageInfo, BoardError> {
        let mut args = self.args(line);
        let paper = args.text()?;
        if !PageInfo::is_known_paper(&paper) {
            return Err(args.error(format!("unknown paper type '{paper}'")));
        }
        let mut page = PageInfo {
            paper,
            ..PageInfo::default()
        };
        let width = args.opt_int()?;
        let height = args.opt_int()?;
        if page.is_custom() {
            if let (Some(w), Some(h)) = (width, height) {
                page.custom_size_mils = Some((w, h));
            }
        }
        if let Some(flag) = args.opt_field() {
            page.portrait = flag.text.eq_ignore_ascii_case("portrait");
        }
        Ok(page)
    }

    pub(super) fn parse_setup(&mut self) -> Result<(), BoardError> {
        loop {
            let line = self.section_line("$EndSETUP")?;
            let keyword = line.keyword().to_ascii_lowercase();
            if keyword == "$endsetup" {
                return Ok(());
            }
            if let Some(index) = keyword
                .strip_prefix("layer[")
                .and_then(|rest| rest.strip_suffix(']'))
            {
                self.parse_setup_layer(&line, index)?;
                continue;
            }
            self.parse_setup_line(&line, &keyword)?;
        }
    }

    fn parse_setup_layer(&mut self, line: &Line<'a>, index: &str) -> Result<(), BoardError> {
        let site = Site::new(&self.source, line.number, 0);
        let raw = parse_int(index, site)?;
        let mut args = self.args(line);
        let name = args.text()?;
        let layer_type = args.opt_text().and_then(|t| LayerType::parse(&t));
        if !(0..16).contains(&raw) {
            return Ok(());
        }
        let layer = self.layer(raw);
        let layers = &mut self.builder.board_mut().layers;
        layers.set_user_name(layer, &name);
        if let Some(layer_type) = layer_type {
            layers.set_layer_type(layer, layer_type);
        }
        Ok(())
    }

    fn parse_setup_line(&mut self, line: &Line<'a>, keyword: &str) -> Result<(), BoardError> {
        let mut args = Args::new(line.args(), line.number, &self.source, self.scale);
        let board = self.builder.board_mut();
        let settings = &mut board.settings;
        let default_class = &mut board.net_classes.default;
        match keyword {
            "trackwidth" => default_class.track_width = args.biu()?,
            "trackclearence" => default_class.clearance = args.biu()?,
            "viasize" => default_class.via_diameter = args.biu()?,
            "viadrill" => default_class.via_drill = args.biu()?,
            "microviasize" => default_class.micro_via_diameter = args.biu()?,
            "microviadrill" => default_class.micro_via_drill = args.biu()?,
            "trackminwidth" => settings.min_track_width = args.biu()?,
            "viaminsize" => settings.min_via_diameter = args.biu()?,
            "viamindrill" => settings.min_via_drill = args.biu()?,
            "microviaminsize" => settings.min_micro_via_diameter = args.biu()?,
            "microviamindrill" => settings.min_micro_via_drill = args.biu()?,
            "microviasallowed" => settings.micro_vias_allowed = args.int()? != 0,
            "trackwidthlist" => settings.track_widths.push(args.biu()?),
            "viasizelist" => {
                let diameter = args.biu()?;
                let drill = args.opt_biu()?.unwrap_or(0);
                settings.via_sizes.push(ViaDimension { diameter, drill });
            }
            "zoneclearence" => settings.zone_clearance = args.biu()?,
            "zone_45_only" => settings.zone_45_only = args.int()? != 0,
            "drawsegmwidth" => settings.defaults_for_mut(LayerClass::Copper).line_width = args.biu()?,
            "edgesegmwidth" => settings.defaults_for_mut(LayerClass::Edges).line_width = args.biu()?,
            "textpcbwidth" => {
                settings.defaults_for_mut(LayerClass::Copper).text_thickness = args.biu()?
            }
            "textpcbsize" => {
                let size = Size::new(args.biu()?, args.biu()?);
                settings.defaults_for_mut(LayerClass::Copper).text_size = size;
            }
            "edgemodwidth" => {
                settings.defaults_for_mut(LayerClass::Silkscreen).line_width = args.biu()?
            }
            "textmodwidth" => {
                settings.defaults_for_mut(LayerClass::Silkscreen).text_thickness = args.biu()?
            }
            "textmodsize" => {
                let size = Size::new(args.biu()?, args.biu()?);
                settings.defaults_for_mut(LayerClass::Silkscreen).text_size = size;
            }
            "padsize" => settings.pad_size = args.size()?,
            "paddrill" => settings.pad_drill = args.biu()?,
            "pad2maskclearance" => settings.solder_mask_margin = args.biu()?,
            "soldermaskminwidth" => settings.solder_mask_min_width = args.biu()?,
            "pad2pasteclearance" => settings.solder_paste_margin = args.biu()?,
            "pad2pasteclearanceratio" => settings.solder_paste_ratio = args.double()?,
            "auxiliaryaxisorg" => settings.aux_axis_origin = args.point()?,
            "gridorigin" => settings.grid_origin = args.point()?,
            "visibleelements" => settings.visible_elements = Some(args.hex()?),
            "pcbplotparams" => settings.plot_params = Some(line.rest().to_string()),
            _ => {
                tracing::trace!(line = line.number, keyword, "ignoring setup key");
            }
        }
        Ok(())
    }

    pub(super) fn parse_equipot(&mut self) -> Result<(), BoardError> {
        let mut declared: Option<(i64, String)> = None;
        loop {
            let line = self.section_line("$EndEQUIPOT")?;
            match line.keyword().to_ascii_lowercase().as_str() {
                "$endequipot" => break,
                "na" => {
                    if declared.is_some() {
                        return Err(self.ctx.error(
                            line.number,
                            0,
                            "two net definitions in one $EQUIPOT section",
                        ));
                    }
                    let mut args = self.args(&line);
                    let code = args.int()?;
                    let name = args.opt_text().unwrap_or_default();
                    declared = Some((code, name));
                }
                _ => {}
            }
        }

        let Some((file_code, name)) = declared else {
            return Ok(());
        };
        if file_code == i64::from(UNCONNECTED) {
            return Ok(());
        }
        let code = self.builder.board_mut().nets.add(&name);
        self.ctx.net_codes.insert(file_code, code);
        Ok(())
    }

    pub(super) fn parse_netclass(&mut self, start: &Line<'a>) -> Result<(), BoardError> {
        let mut class = NetClass::new(NetClass::DEFAULT_NAME);
        loop {
            let line = self.section_line("$EndNCLASS")?;
            let mut args = self.args(&line);
            match line.keyword().to_ascii_lowercase().as_str() {
                "$endnclass" => break,
                "name" => class.name = args.text()?,
                "desc" => class.description = args.opt_text().unwrap_or_default(),
                "clearance" => class.clearance = args.biu()?,
                "trackwidth" => class.track_width = args.biu()?,
                "viadia" => class.via_diameter = args.biu()?,
                "viadrill" => class.via_drill = args.biu()?,
                "uviadia" => class.micro_via_diameter = args.biu()?,
                "uviadrill" => class.micro_via_drill = args.biu()?,
                "addnet" => class.nets.push(args.text()?),
                _ => {}
            }
        }

        tracing::debug!(class = %class.name, nets = class.nets.len(), "net class");
        if let Err(duplicate) = self.builder.board_mut().net_classes.add(class) {
            return Err(BoardError::DuplicateName {
                kind: "net class",
                name: duplicate.name,
                location: self.ctx.location(start.number, 0),
            });
        }
        Ok(())
    }
}

fn non_copper() -> LayerSet {
    PcbLayerId::all().filter(|l| !l.is_copper()).collect()
}

/// Copper bits in a legacy mask may cover layers the board does not have.
fn keep_board_copper(set: LayerSet, copper_count: usize) -> LayerSet {
    set.intersection(non_copper())
        .union(LayerSet::copper_for_count(copper_count))
}
