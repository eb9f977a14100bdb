//! Tests for the S-expression board and footprint readers

use boardfile::board::{FootprintType, Track, ViaType};
use boardfile::geometry::Point;
use boardfile::{
    detect_format, load_board, load_board_str, load_footprint_str, read_document, BoardError,
    Document, FileFormat, LoadOptions, PcbLayerId, UndefinedLayerAction, WarningKind,
};
use std::path::PathBuf;

fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn fixture_text(name: &str) -> String {
    std::fs::read_to_string(fixture_path(name)).expect("fixture should be readable")
}

/// The sensor board with `extra` inserted before its closing parenthesis.
fn sensor_with(extra: &str) -> String {
    let text = fixture_text("sensor_node.kicad_pcb");
    let end = text.rfind(')').expect("board should be closed");
    format!("{}{}\n)\n", &text[..end], extra)
}

#[test]
fn test_detect_all_formats() {
    assert_eq!(
        detect_format(&fixture_text("legacy_two_layer.brd")),
        Some(FileFormat::LegacyBoard)
    );
    assert_eq!(
        detect_format(&fixture_text("sensor_node.kicad_pcb")),
        Some(FileFormat::Board)
    );
    assert_eq!(
        detect_format(&fixture_text("pin_header.kicad_mod")),
        Some(FileFormat::Footprint)
    );
    assert_eq!(
        detect_format("(module R_0603 (layer F.Cu) (tedit 5B301BBE))"),
        Some(FileFormat::Footprint)
    );
    assert_eq!(detect_format("(kicad_sch (version 20211123))"), None);
}

#[test]
fn test_load_modern_board() {
    let loaded = load_board(fixture_path("sensor_node.kicad_pcb"), &mut LoadOptions::default())
        .expect("Should load modern board");
    assert_eq!(loaded.format, FileFormat::Board);
    assert!(loaded.warnings.is_empty(), "unexpected warnings: {:?}", loaded.warnings);

    let board = &loaded.value;
    assert_eq!(board.version, 20211014);
    assert_eq!(board.generator.as_deref(), Some("pcbnew"));
    assert_eq!(board.copper_count(), 2);
    assert_eq!(board.settings.board_thickness, 1_600_000);
    assert_eq!(board.title_block.revision, "B");
    assert_eq!(board.title_block.comments[0], "modern fixture");
    assert_eq!(board.layers.get(PcbLayerId::B_CU).name(), "Ground");
    assert_eq!(board.settings.aux_axis_origin, Point::new(100_000_000, 60_000_000));

    let stackup = board.settings.stackup.as_ref().expect("Should have a stackup");
    assert_eq!(stackup.items.len(), 3);
    assert_eq!(stackup.copper_finish.as_deref(), Some("ENIG"));

    assert_eq!(board.nets.len(), 4);
    let power = board.net_classes.find("Power").expect("Should have Power class");
    assert_eq!(power.track_width, 500_000);
    assert_eq!(power.nets.len(), 2);
}

#[test]
fn test_modern_footprints() {
    let board = load_board(fixture_path("sensor_node.kicad_pcb"), &mut LoadOptions::default())
        .expect("Should load")
        .value;
    assert_eq!(board.footprints.len(), 2);

    let r1 = board.find_footprint("R1").expect("Should find R1");
    assert_eq!(r1.orientation, 90.0);
    assert_eq!(r1.value(), "10k");
    assert_eq!(r1.attributes.kind, FootprintType::Smd);
    assert_eq!(r1.property("Sheetfile"), Some("sensor.kicad_sch"));
    assert_eq!(r1.texts[0].local_angle, 0.0);
    let pad = &r1.pads[0];
    assert_eq!(pad.local_angle, 0.0);
    assert_eq!(pad.position, Point::new(120_000_000, 80_775_000));
    assert_eq!(board.nets.name(pad.net), "+3V3");
    assert_eq!(pad.pin_type.as_deref(), Some("passive"));

    let j1 = board.find_footprint("J1").expect("Should find J1");
    assert!(j1.locked);
    assert_eq!(j1.attributes.kind, FootprintType::ThroughHole);
    assert!(j1.texts[1].effects.hidden);
    let pin = &j1.pads[1];
    assert_eq!(pin.position, Point::new(105_000_000, 77_540_000));
    assert!(pin.layers.contains(PcbLayerId::B_CU));
    assert!(pin.layers.contains(PcbLayerId::F_MASK));
    assert_eq!(board.nets.name(pin.net), "GND");
}

#[test]
fn test_modern_tracks_zone_and_group() {
    let board = load_board(fixture_path("sensor_node.kicad_pcb"), &mut LoadOptions::default())
        .expect("Should load")
        .value;

    assert_eq!(board.tracks.len(), 4);
    assert_eq!(board.via_count(), 1);
    let Track::Via(via) = &board.tracks[2] else {
        panic!("expected a via");
    };
    assert_eq!(via.via_type, ViaType::Through);
    assert_eq!(via.top, PcbLayerId::F_CU);
    assert_eq!(via.bottom, PcbLayerId::B_CU);
    assert_eq!(via.drill, Some(400_000));
    assert!(matches!(board.tracks[3], Track::Arc(_)));

    let zone = &board.zones[0];
    assert_eq!(board.nets.name(zone.net), "GND");
    assert_eq!(zone.layer(), PcbLayerId::B_CU);
    assert!(zone.fill.filled);
    assert_eq!(zone.clearance, 300_000);

    assert_eq!(board.groups.len(), 1);
    let group = &board.groups[0];
    assert_eq!(group.name, "outline");
    assert_eq!(group.members.len(), 4);
    let edge = board.drawings[0].id();
    assert_eq!(board.parent_group(&edge).map(|g| g.name.as_str()), Some("outline"));
    assert!(board.find_item(&edge).is_some());
}

#[test]
fn test_standalone_footprint() {
    let text = fixture_text("pin_header.kicad_mod");
    let loaded = load_footprint_str(&text, "pin_header.kicad_mod", &mut LoadOptions::default())
        .expect("Should load footprint");
    assert_eq!(loaded.format, FileFormat::Footprint);

    let fp = &loaded.value;
    assert_eq!(fp.lib_id, "PinHeader_1x03_P2.54mm_Vertical");
    assert_eq!(fp.reference(), "REF**");
    assert_eq!(fp.pads.len(), 3);
    assert_eq!(fp.pads[2].position, Point::new(0, 5_080_000));
    assert!(fp.pads.iter().all(|p| p.net == 0));
    assert_eq!(fp.texts[2].text, "${REFERENCE}");

    let document = read_document(&text, "pin_header.kicad_mod", &mut LoadOptions::default())
        .expect("Should read");
    assert!(matches!(document.value, Document::Footprint(_)));
    assert!(load_board_str(&text, "pin_header.kicad_mod", &mut LoadOptions::default()).is_err());
}

#[test]
fn test_future_version_rejected() {
    let err = load_board(fixture_path("future_version.kicad_pcb"), &mut LoadOptions::default())
        .unwrap_err();
    match err {
        BoardError::Version { found, supported } => {
            assert_eq!(found, 99999999);
            assert_eq!(supported, 20211014);
        }
        other => panic!("expected a version error, got {other}"),
    }
}

#[test]
fn test_missing_file() {
    let err = load_board(fixture_path("no_such_board.kicad_pcb"), &mut LoadOptions::default())
        .unwrap_err();
    assert!(matches!(err, BoardError::Io(_)));
}

#[test]
fn test_undefined_layer_policies() {
    let text = sensor_with(
        r#"  (gr_line (start 0 0) (end 5 0) (layer "Mystery") (width 0.1) (tstamp 4c5d6e7f-8091-4a2b-b3c4-d5e6f7080001))"#,
    );

    let loaded = load_board_str(&text, "mystery.kicad_pcb", &mut LoadOptions::default())
        .expect("Rescue keeps the item");
    let board = &loaded.value;
    assert_eq!(board.drawings.len(), 6);
    assert_eq!(board.drawings[5].layer(), PcbLayerId::CMTS_USER);
    assert!(loaded
        .warnings
        .iter()
        .any(|w| w.kind == WarningKind::UndefinedLayer && w.message.contains("Mystery")));

    let mut delete = LoadOptions {
        undefined_layers: UndefinedLayerAction::Delete,
        ..LoadOptions::default()
    };
    let board = load_board_str(&text, "mystery.kicad_pcb", &mut delete)
        .expect("Delete drops the item")
        .value;
    assert_eq!(board.drawings.len(), 5);
    assert!(board
        .drawings
        .iter()
        .all(|d| d.layer() != PcbLayerId::CMTS_USER));

    let mut abort = LoadOptions {
        undefined_layers: UndefinedLayerAction::Abort,
        ..LoadOptions::default()
    };
    let err = load_board_str(&text, "mystery.kicad_pcb", &mut abort).unwrap_err();
    assert!(err.is_cancelled());
}

#[test]
fn test_group_cycle_rejected() {
    let text = sensor_with(
        r#"  (group "a" (id 5d6e7f80-91a2-4b3c-84d5-e6f708190001) (members 5d6e7f80-91a2-4b3c-84d5-e6f708190002))
  (group "b" (id 5d6e7f80-91a2-4b3c-84d5-e6f708190002) (members 5d6e7f80-91a2-4b3c-84d5-e6f708190001))"#,
    );
    let err = load_board_str(&text, "cycle.kicad_pcb", &mut LoadOptions::default()).unwrap_err();
    assert!(matches!(err, BoardError::GroupCycle { .. }));
}

#[test]
fn test_duplicate_net_class_rejected() {
    let text = sensor_with(r#"  (net_class "Power" "again" (clearance 0.3))"#);
    let err = load_board_str(&text, "dup.kicad_pcb", &mut LoadOptions::default()).unwrap_err();
    assert!(matches!(err, BoardError::DuplicateName { kind: "net class", .. }));
}

#[test]
fn test_syntax_error_location() {
    let text = fixture_text("sensor_node.kicad_pcb").replacen("(thickness 1.6)", "(thickness)", 1);
    let err = load_board_str(&text, "broken.kicad_pcb", &mut LoadOptions::default()).unwrap_err();
    let location = err.location().expect("Syntax errors carry a location");
    assert_eq!(location.source, "broken.kicad_pcb");
    assert_eq!(location.line, 4);
}

#[test]
fn test_unknown_token_rejected() {
    let text = "(kicad_pcb (version 20211014) (generator pcbnew) (bogus_item 1 2))";
    let err = load_board_str(text, "bogus.kicad_pcb", &mut LoadOptions::default()).unwrap_err();
    assert!(matches!(err, BoardError::Syntax { .. }));
    assert!(err.to_string().contains("unknown token 'bogus_item'"));
    assert_eq!(err.location().expect("Syntax errors carry a location").line, 1);

    let footprint = fixture_text("sensor_node.kicad_pcb")
        .replacen("(attr smd)", "(attr smd) (bogus_field 1)", 1);
    let err = load_board_str(&footprint, "bogus.kicad_pcb", &mut LoadOptions::default())
        .unwrap_err();
    assert!(err.to_string().contains("unknown token 'bogus_field'"));

    let pad = fixture_text("sensor_node.kicad_pcb")
        .replacen("(pintype \"passive\")", "(pintype \"passive\") (bogus_pad 2)", 1);
    let err = load_board_str(&pad, "bogus.kicad_pcb", &mut LoadOptions::default()).unwrap_err();
    assert!(err.to_string().contains("unknown token 'bogus_pad'"));
}

#[test]
fn test_via_on_missing_copper_dropped() {
    let text = sensor_with(
        r#"  (via blind (at 5 5) (size 0.6) (drill 0.3) (layers "F.Cu" "In4.Cu") (net 1) (tstamp 1f2e3d4c-5b6a-4978-8695-a4b3c2d10009))"#,
    );
    let loaded = load_board_str(&text, "blind.kicad_pcb", &mut LoadOptions::default())
        .expect("A stray via is not fatal");
    assert_eq!(loaded.value.tracks.len(), 4);
    assert_eq!(loaded.value.via_count(), 1);
    assert!(loaded
        .warnings
        .iter()
        .any(|w| w.kind == WarningKind::DroppedItem && w.message.contains("In4.Cu")));
}

#[test]
fn test_delete_policy_keeps_footprint_groups() {
    let text = sensor_with(
        r#"  (gr_line (start 0 0) (end 5 0) (layer "Mystery") (width 0.1) (tstamp 4c5d6e7f-8091-4a2b-b3c4-d5e6f7080002))
  (footprint "TestPoint:Pad_1mm" (layer "F.Cu") (tstamp 6e7f8091-a2b3-4c4d-95e6-f70819200001)
    (at 140 70)
    (fp_text reference "TP1" (at 0 -1.5) (layer "F.SilkS")
      (effects (font (size 1 1) (thickness 0.15)))
      (tstamp 6e7f8091-a2b3-4c4d-95e6-f70819200002)
    )
    (group "marker" (id 6e7f8091-a2b3-4c4d-95e6-f70819200003)
      (members 6e7f8091-a2b3-4c4d-95e6-f70819200002)
    )
  )"#,
    );
    let mut delete = LoadOptions {
        undefined_layers: UndefinedLayerAction::Delete,
        ..LoadOptions::default()
    };
    let board = load_board_str(&text, "groups.kicad_pcb", &mut delete)
        .expect("Delete drops the stray line")
        .value;

    assert_eq!(board.drawings.len(), 5);
    assert_eq!(board.footprints.len(), 3);
    let tp = &board.footprints[2];
    assert_eq!(tp.groups.len(), 1);
    assert_eq!(tp.groups[0].name, "marker");
    assert_eq!(tp.groups[0].members, vec![tp.texts[0].id]);
    assert_eq!(board.groups.len(), 1);
}
