//! Board summary example: load a board in either grammar and print what it holds.

use boardfile::prelude::*;
use std::path::Path;

fn main() -> Result<(), BoardError> {
    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "tests/fixtures/sensor_node.kicad_pcb".to_string());
    let path = Path::new(&path);

    if !path.exists() {
        eprintln!("File not found: {}", path.display());
        eprintln!("Usage: cargo run --example board_summary [path/to/board.kicad_pcb|.brd]");
        std::process::exit(1);
    }

    let loaded = load_board(path, &mut LoadOptions::default())?;
    let board = &loaded.value;

    println!("Board: {} ({})", path.display(), loaded.format.as_str());
    println!("Copper layers: {}", board.copper_count());
    println!("Nets: {}", board.nets.len());
    println!("Footprints: {}", board.footprints.len());
    for fp in &board.footprints {
        println!("  - {} {} ({} pads)", fp.reference(), fp.value(), fp.pads.len());
    }
    println!("Tracks: {} ({} vias)", board.tracks.len(), board.via_count());
    println!("Zones: {}", board.zones.len());

    if !loaded.warnings.is_empty() {
        println!();
        println!("Warnings:");
        for warning in &loaded.warnings {
            println!("  - {warning}");
        }
    }
    Ok(())
}
