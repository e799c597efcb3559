/// `vusb` command-line tool: follow capture logs and decode binary records.
///
/// # Command overview
///
/// ```text
/// vusb <COMMAND> [OPTIONS]
///
/// Commands:
///   follow     Stream a capture log (plain or .gz) to stdout
///   decode     Decode hex bytes against a record layout
///   help       Print help information
///
/// Global options:
///   -v, --verbose    Log follower lifecycle at debug level
///   -h, --help       Print help
///   -V, --version    Print version
/// ```
///
/// # Exit codes
///
/// | Code | Meaning                                        |
/// |------|------------------------------------------------|
/// | 0    | Success, including a Ctrl-C during `follow`    |
/// | 1    | Error (unreadable file, bad layout, bad hex)   |
///
/// Events go to stdout. Progress, logs and errors go to stderr.
use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod cmd_decode;
mod cmd_follow;
mod render;

// ── CLI root ──────────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "vusb", version, about = "Follow and decode USB capture logs")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug logging (overridden by `RUST_LOG`).
    #[arg(short, long, global = true)]
    verbose: bool,
}

// ── Sub-commands ──────────────────────────────────────────────────────────────

#[derive(Subcommand)]
enum Commands {
    /// Stream a capture log to stdout, optionally following appended data.
    Follow(FollowArgs),
    /// Decode hex bytes against a record layout.
    Decode(DecodeArgs),
}

// ── Argument structs ──────────────────────────────────────────────────────────

/// Arguments for `vusb follow`.
///
/// Without `--layout` every line of the file is printed. With it, the
/// file is read as back-to-back fixed-size records and each decoded
/// record is printed.
///
/// ```text
/// ┌────────────────┬───────────────────────────────────────────────────┐
/// │ Flag           │ Effect                                            │
/// ├────────────────┼───────────────────────────────────────────────────┤
/// │ --tail         │ Start at end of file and wait for appended data   │
/// │ --layout L     │ Decode records, e.g. "len:u16,kind:u8_hex"        │
/// │ --json         │ One JSON object per record (needs --layout)       │
/// │ --chunk-size N │ Bytes per read in record mode (default 16384)     │
/// └────────────────┴───────────────────────────────────────────────────┘
/// ```
#[derive(clap::Args)]
pub struct FollowArgs {
    /// Capture file to follow. Files ending in `.gz` are decompressed.
    pub file: PathBuf,

    /// Only show data appended after start-up; run until Ctrl-C.
    #[arg(long)]
    pub tail: bool,

    /// Record layout; switches from line mode to record mode.
    #[arg(long)]
    pub layout: Option<String>,

    /// Print records as JSON.
    #[arg(long, requires = "layout")]
    pub json: bool,

    /// Bytes per read in record mode.
    #[arg(long, default_value_t = vusb_follow::DEFAULT_CHUNK_SIZE)]
    pub chunk_size: usize,
}

/// Arguments for `vusb decode`.
///
/// The layout is a comma-separated list of `name:kind` entries. Kinds
/// are `u8`, `u16`, `u32` with optional `_be` (big-endian, not for
/// `u8`) and `_hex` suffixes, plus `utf16`, `utf16z` and `utf16[N]`.
#[derive(clap::Args)]
pub struct DecodeArgs {
    /// Record layout, e.g. `"bmRequestType:u8_hex,wValue:u16_hex"`.
    #[arg(long)]
    pub layout: String,

    /// Bytes to decode as hex; spaces are ignored.
    pub hex: String,

    /// Print the record as JSON.
    #[arg(long)]
    pub json: bool,
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Follow(args) => cmd_follow::run(&args),
        Commands::Decode(args) => cmd_decode::run(&args),
    };

    if let Err(e) = result {
        eprintln!("error: {e:#}");
        process::exit(1);
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
