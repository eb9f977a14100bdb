//! boardfile - KiCad board file reader and writer
//!
//! Loads printed circuit boards from the legacy `.brd` line format and the
//! S-expression `.kicad_pcb` / `.kicad_mod` formats into one in-memory
//! model, and writes that model back out in the S-expression grammar.
//!
//! # Quick Start
//!
//! ```no_run
//! use boardfile::{load_board, LoadOptions};
//!
//! let loaded = load_board("design.kicad_pcb", &mut LoadOptions::default()).unwrap();
//! let board = &loaded.value;
//! println!("{} copper layers, {} footprints", board.copper_count(), board.footprints.len());
//!
//! for warning in &loaded.warnings {
//!     println!("{warning}");
//! }
//! ```
//!
//! # Features
//!
//! - **Legacy boards**: `PCBNEW-BOARD` files in decimils or millimetres
//! - **S-expression boards and footprints**: every version up to 20211014
//! - **Writer**: current-version output from either source grammar
//! - **Caller policies**: undefined layers, segment fills and cancellation

pub mod board;
pub mod error;
pub mod geometry;
pub mod kiid;
pub mod layers;
pub mod options;
pub mod parser;
pub mod units;
pub mod writer;

pub use board::{Board, Drawing, Footprint, ItemRef};
pub use error::{BoardError, SourceLocation, Warning, WarningKind};
pub use kiid::Kiid;
pub use layers::{LayerSet, PcbLayerId};
pub use options::{LoadOptions, LoadPolicy, Progress, UndefinedLayerAction};
pub use parser::{
    detect_format, load_board, load_board_str, load_footprint_str, read_document, Document,
    FileFormat, Loaded,
};
pub use writer::{save_board, write_board, write_footprint};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::{
        load_board, save_board, Board, BoardError, FileFormat, LoadOptions, LoadPolicy, Loaded,
        PcbLayerId, Warning,
    };
}
