use boardfile::prelude::*;
use boardfile::{load_board_str, write_board};
use criterion::{black_box, criterion_group, criterion_main, Criterion};
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

fn bench_load_legacy(c: &mut Criterion) {
    let text = fixture_text("legacy_two_layer.brd");
    c.bench_function("load_legacy_board", |b| {
        b.iter(|| {
            load_board_str(
                black_box(&text),
                "legacy_two_layer.brd",
                &mut LoadOptions::default(),
            )
        });
    });
}

fn bench_load_modern(c: &mut Criterion) {
    let text = fixture_text("sensor_node.kicad_pcb");
    c.bench_function("load_modern_board", |b| {
        b.iter(|| {
            load_board_str(
                black_box(&text),
                "sensor_node.kicad_pcb",
                &mut LoadOptions::default(),
            )
        });
    });
}

fn bench_write(c: &mut Criterion) {
    let board = load_board(fixture_path("sensor_node.kicad_pcb"), &mut LoadOptions::default())
        .expect("fixture should load")
        .value;
    c.bench_function("write_board", |b| {
        b.iter(|| write_board(black_box(&board)));
    });
}

criterion_group!(benches, bench_load_legacy, bench_load_modern, bench_write);
criterion_main!(benches);
