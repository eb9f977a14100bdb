//! boardfile CLI - inspect, check and convert KiCad board files from the command line.

use anyhow::{Context, Result};
use boardfile::{
    read_document, write_board, write_footprint, Board, Document, LoadOptions, Loaded,
    UndefinedLayerAction, Warning,
};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use std::process;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "boardfile")]
#[command(about = "KiCad board file inspection and conversion tool", long_about = None)]
#[command(version)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Summarize a board or footprint file
    Info {
        /// Path to .brd, .kicad_pcb or .kicad_mod file
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Output format
        #[arg(short, long, value_enum, default_value = "human")]
        format: OutputFormat,
    },

    /// Load a file and report every recoverable problem
    Check {
        /// Path to .brd, .kicad_pcb or .kicad_mod file
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// What to do with items on layers the board does not define
        #[arg(long, value_enum, default_value = "rescue")]
        undefined_layers: UndefinedLayers,

        /// Refuse legacy zones filled with segments instead of converting them
        #[arg(long)]
        no_segment_fill_conversion: bool,

        /// Exit with code 2 when any warning is reported
        #[arg(long)]
        deny_warnings: bool,

        /// Output format
        #[arg(short, long, value_enum, default_value = "human")]
        format: OutputFormat,
    },

    /// Write a file of either grammar in the current S-expression format
    Convert {
        /// Path to .brd, .kicad_pcb or .kicad_mod file
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Output path
        #[arg(short, long, value_name = "OUT")]
        output: PathBuf,
    },

    /// Print the layer table of a board
    Layers {
        /// Path to .brd or .kicad_pcb file
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Human-readable output
    Human,
    /// JSON output for scripts
    Json,
}

#[derive(Clone, Copy, ValueEnum)]
enum UndefinedLayers {
    /// Move the items to a spare user layer
    Rescue,
    /// Drop the items
    Delete,
    /// Stop loading
    Abort,
}

impl From<UndefinedLayers> for UndefinedLayerAction {
    fn from(value: UndefinedLayers) -> Self {
        match value {
            UndefinedLayers::Rescue => UndefinedLayerAction::Rescue,
            UndefinedLayers::Delete => UndefinedLayerAction::Delete,
            UndefinedLayers::Abort => UndefinedLayerAction::Abort,
        }
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Info { file, format } => handle_info(&file, format),
        Commands::Check {
            file,
            undefined_layers,
            no_segment_fill_conversion,
            deny_warnings,
            format,
        } => {
            let mut options = LoadOptions {
                undefined_layers: undefined_layers.into(),
                convert_segment_fills: !no_segment_fill_conversion,
                ..LoadOptions::default()
            };
            handle_check(&file, &mut options, deny_warnings, format)
        }
        Commands::Convert { file, output } => handle_convert(&file, &output),
        Commands::Layers { file } => handle_layers(&file),
    };

    let exit_code = match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e:#}");
            1
        }
    };
    process::exit(exit_code);
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn load(file: &Path, options: &mut LoadOptions) -> Result<Loaded<Document>> {
    let text = std::fs::read_to_string(file)
        .with_context(|| format!("failed to read {}", file.display()))?;
    let loaded = read_document(&text, &file.display().to_string(), options)
        .with_context(|| format!("failed to load {}", file.display()))?;
    tracing::debug!(
        file = %file.display(),
        format = loaded.format.as_str(),
        warnings = loaded.warnings.len(),
        "loaded"
    );
    Ok(loaded)
}

fn load_board_only(file: &Path) -> Result<Board> {
    match load(file, &mut LoadOptions::default())?.value {
        Document::Board(board) => Ok(board),
        Document::Footprint(_) => {
            anyhow::bail!("{} is a footprint, not a board", file.display())
        }
    }
}

fn handle_info(file: &Path, format: OutputFormat) -> Result<i32> {
    let loaded = load(file, &mut LoadOptions::default())?;
    let summary = summarize(&loaded);

    match format {
        OutputFormat::Human => {
            println!("File: {}", file.display());
            println!("{}", "─".repeat(60));
            if let Some(object) = summary.as_object() {
                for (key, value) in object {
                    let value = match value {
                        serde_json::Value::String(s) => s.clone(),
                        other => other.to_string(),
                    };
                    println!("  {:<14} {}", format!("{}:", key.replace('_', " ")), value);
                }
            }
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
    }
    Ok(0)
}

fn summarize(loaded: &Loaded<Document>) -> serde_json::Value {
    match &loaded.value {
        Document::Board(board) => serde_json::json!({
            "format": loaded.format.as_str(),
            "version": board.version,
            "copper_layers": board.copper_count(),
            "nets": board.nets.len(),
            "footprints": board.footprints.len(),
            "pads": board.pad_count(),
            "tracks": board.tracks.len() - board.via_count(),
            "vias": board.via_count(),
            "zones": board.zones.len(),
            "drawings": board.drawings.len(),
            "groups": board.group_count(),
            "warnings": loaded.warnings.len(),
        }),
        Document::Footprint(footprint) => serde_json::json!({
            "format": loaded.format.as_str(),
            "name": footprint.lib_id,
            "pads": footprint.pad_count(),
            "shapes": footprint.shapes.len(),
            "texts": footprint.texts.len(),
            "zones": footprint.zones.len(),
            "groups": footprint.groups.len(),
            "warnings": loaded.warnings.len(),
        }),
    }
}

fn handle_check(
    file: &Path,
    options: &mut LoadOptions,
    deny_warnings: bool,
    format: OutputFormat,
) -> Result<i32> {
    let loaded = load(file, options)?;

    match format {
        OutputFormat::Human => output_human(file, &loaded.warnings),
        OutputFormat::Json => output_json(file, &loaded)?,
    }

    if deny_warnings && !loaded.warnings.is_empty() {
        return Ok(2);
    }
    Ok(0)
}

fn output_human(file: &Path, warnings: &[Warning]) {
    println!("\nFile: {}", file.display());
    println!("{}", "─".repeat(60));

    if warnings.is_empty() {
        println!("  No warnings");
        return;
    }
    for warning in warnings {
        println!("  - {warning}");
    }
    println!("\n  Total: {} warning(s)", warnings.len());
}

fn output_json(file: &Path, loaded: &Loaded<Document>) -> Result<()> {
    let output = serde_json::json!({
        "file": file.display().to_string(),
        "format": loaded.format.as_str(),
        "warnings": loaded.warnings,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn handle_convert(file: &Path, output: &Path) -> Result<i32> {
    let loaded = load(file, &mut LoadOptions::default())?;
    for warning in &loaded.warnings {
        tracing::warn!("{warning}");
    }

    let text = match &loaded.value {
        Document::Board(board) => write_board(board),
        Document::Footprint(footprint) => write_footprint(footprint),
    };
    std::fs::write(output, &text)
        .with_context(|| format!("failed to write {}", output.display()))?;

    println!(
        "Converted {} ({}) to {}",
        file.display(),
        loaded.format.as_str(),
        output.display()
    );
    Ok(0)
}

fn handle_layers(file: &Path) -> Result<i32> {
    let board = load_board_only(file)?;

    println!("Layers of {} ({} copper):\n", file.display(), board.copper_count());
    for layer in board.layers.iter_enabled() {
        println!(
            "  {:>2}  {:<12} {:<16} {:<7}{}",
            layer.id.index(),
            layer.id.name(),
            layer.name(),
            layer.layer_type.as_str(),
            if layer.visible { "" } else { " hidden" }
        );
    }
    Ok(0)
}
