//! Load, write and reload: the writer output must read back to the same model

use boardfile::board::Track;
use boardfile::{
    load_board, load_board_str, load_footprint_str, save_board, write_board, write_footprint,
    FileFormat, LoadOptions, PcbLayerId,
};
use std::path::PathBuf;
use tempfile::TempDir;

fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

#[test]
fn test_modern_board_roundtrip() {
    let original = load_board(fixture_path("sensor_node.kicad_pcb"), &mut LoadOptions::default())
        .expect("Should load")
        .value;
    let written = write_board(&original);
    assert!(written.starts_with("(kicad_pcb (version 20211014) (generator boardfile)"));

    let reloaded = load_board_str(&written, "written.kicad_pcb", &mut LoadOptions::default())
        .expect("Writer output should load");
    assert!(reloaded.warnings.is_empty(), "unexpected warnings: {:?}", reloaded.warnings);
    let reloaded = reloaded.value;

    assert_eq!(reloaded.nets, original.nets);
    assert_eq!(reloaded.footprints, original.footprints);
    assert_eq!(reloaded.drawings, original.drawings);
    assert_eq!(reloaded.tracks, original.tracks);
    assert_eq!(reloaded.zones, original.zones);
    assert_eq!(reloaded.groups, original.groups);
    assert_eq!(reloaded.title_block, original.title_block);
    assert_eq!(reloaded.settings.stackup, original.settings.stackup);
    assert_eq!(
        reloaded.layers.get(PcbLayerId::B_CU).name(),
        original.layers.get(PcbLayerId::B_CU).name()
    );

    // a second pass is stable
    assert_eq!(write_board(&reloaded), written);
}

#[test]
fn test_legacy_board_converts() {
    let legacy = load_board(fixture_path("legacy_two_layer.brd"), &mut LoadOptions::default())
        .expect("Should load")
        .value;
    let written = write_board(&legacy);

    let converted = load_board_str(&written, "converted.kicad_pcb", &mut LoadOptions::default())
        .expect("Converted board should load");
    assert_eq!(converted.format, FileFormat::Board);
    let converted = converted.value;

    assert_eq!(converted.tracks, legacy.tracks);
    assert_eq!(converted.zones, legacy.zones);
    assert_eq!(converted.nets, legacy.nets);
    assert_eq!(converted.footprints.len(), 1);
    assert_eq!(converted.footprints[0].reference(), "R1");
    assert_eq!(converted.footprints[0].pads, legacy.footprints[0].pads);
    assert_eq!(
        converted.net_classes.find("Power").map(|c| c.track_width),
        Some(250 * 2540)
    );
    assert_eq!(converted.layers.get(PcbLayerId::B_CU).name(), "Bottom");

    let Track::Via(via) = &converted.tracks[1] else {
        panic!("expected a via");
    };
    assert_eq!(via.top, PcbLayerId::F_CU);
    assert_eq!(via.bottom, PcbLayerId::B_CU);

    assert_eq!(write_board(&converted), written);
}

#[test]
fn test_footprint_roundtrip() {
    let text = std::fs::read_to_string(fixture_path("pin_header.kicad_mod")).expect("fixture");
    let original = load_footprint_str(&text, "pin_header.kicad_mod", &mut LoadOptions::default())
        .expect("Should load")
        .value;

    let written = write_footprint(&original);
    assert!(written.starts_with("(footprint \"PinHeader_1x03_P2.54mm_Vertical\""));
    let reloaded = load_footprint_str(&written, "written.kicad_mod", &mut LoadOptions::default())
        .expect("Writer output should load")
        .value;
    assert_eq!(reloaded, original);
}

#[test]
fn test_save_board_to_disk() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("saved.kicad_pcb");

    let board = load_board(fixture_path("legacy_mm.brd"), &mut LoadOptions::default())
        .expect("Should load")
        .value;
    save_board(&path, &board).expect("Should save");

    let saved = load_board(&path, &mut LoadOptions::default()).expect("Saved board should load");
    assert_eq!(saved.format, FileFormat::Board);
    assert_eq!(saved.value.tracks, board.tracks);
    assert_eq!(saved.value.page, board.page);
    assert_eq!(saved.value.settings.board_thickness, 1_600_000);
}

#[test]
fn test_board_serializes_to_json() {
    let board = load_board(fixture_path("sensor_node.kicad_pcb"), &mut LoadOptions::default())
        .expect("Should load")
        .value;
    let json = serde_json::to_value(&board).expect("Board should serialize");

    assert_eq!(json["footprints"].as_array().map(Vec::len), Some(2));
    assert_eq!(json["nets"].as_array().map(Vec::len), Some(4));
    assert_eq!(json["nets"][1]["name"], "GND");
    assert_eq!(json["drawings"][0]["item"], "shape");
}
