//! Ping Log CLI Application
//!
//! Command-line interface for converting Ping Viewer sonar recordings.
//! It uses the ping-log-decoder library and adds:
//! - Argument parsing and TOML configuration
//! - Auto-detection of the device type per file
//! - JSON batch summaries

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use ping_log_decoder::{
    resolve_output_path, BatchDispatcher, BatchReport, ConvertMode, Decoder, DeviceType, FileStatus,
};
use std::fs;
use std::path::{Path, PathBuf};

mod config;

/// Ping Log CLI - Convert Ping1D / Ping360 recordings to CSV
#[derive(Parser, Debug)]
#[command(name = "ping-log-cli")]
#[command(about = "Convert Ping Viewer sonar logs (Ping1D, Ping360) to CSV", long_about = None)]
#[command(version)]
struct Args {
    /// Path to configuration file (config.toml)
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Verbosity level (can be repeated: -v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Convert a single recording
    Decode {
        /// Recording to convert (.bin)
        #[arg(value_name = "FILE")]
        input: PathBuf,

        #[arg(short, long, value_enum, default_value_t = DeviceArg::Auto)]
        device: DeviceArg,

        /// Output table (default: ../csv/<name>.csv for files in a bin/ folder)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Output used when neither --output nor the bin/ layout applies
        #[arg(long, value_name = "FILE")]
        default_output: Option<PathBuf>,
    },

    /// Convert every recording of a directory
    Batch {
        #[arg(value_name = "DIR")]
        dir: PathBuf,

        #[arg(short, long, value_enum, default_value_t = DeviceArg::Auto)]
        device: DeviceArg,

        /// Write per-file outcomes as JSON
        #[arg(long, value_name = "FILE")]
        summary: Option<PathBuf>,
    },

    /// Move recordings into per-device folders
    Sort {
        /// Directory to scan (default: [sort].input_dir)
        #[arg(value_name = "DIR")]
        input_dir: Option<PathBuf>,

        #[arg(long, value_name = "DIR")]
        ping1d_dir: Option<PathBuf>,

        #[arg(long, value_name = "DIR")]
        ping360_dir: Option<PathBuf>,
    },
}

/// Device selection on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum DeviceArg {
    Ping1d,
    Ping360,
    /// Classify each file by its first recognized message
    Auto,
}

impl From<DeviceArg> for ConvertMode {
    fn from(arg: DeviceArg) -> Self {
        match arg {
            DeviceArg::Ping1d => ConvertMode::Fixed(DeviceType::Ping1D),
            DeviceArg::Ping360 => ConvertMode::Fixed(DeviceType::Ping360),
            DeviceArg::Auto => ConvertMode::Auto,
        }
    }
}

fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Initialize logging
    init_logging(args.verbose, args.quiet);

    log::info!("Ping Log CLI v{}", env!("CARGO_PKG_VERSION"));
    log::info!("Using decoder library v{}", ping_log_decoder::VERSION);

    let app_config = match &args.config {
        Some(path) => {
            log::info!("Loading configuration from: {:?}", path);
            config::load_config(path)?
        }
        None => config::AppConfig::default(),
    };
    let decoder = Decoder::with_config(app_config.decoder.clone())?;

    match args.command {
        Command::Decode {
            input,
            device,
            output,
            default_output,
        } => decode_mode(&decoder, &input, device, output, default_output),
        Command::Batch {
            dir,
            device,
            summary,
        } => batch_mode(&decoder, &dir, device, summary.as_deref()),
        Command::Sort {
            input_dir,
            ping1d_dir,
            ping360_dir,
        } => {
            let sort = config::resolve_sort(app_config.sort.as_ref(), input_dir, ping1d_dir, ping360_dir)?;
            sort_mode(&decoder, &sort)
        }
    }
}

/// Decode mode - convert one file, failing loudly
fn decode_mode(
    decoder: &Decoder,
    input: &Path,
    device: DeviceArg,
    output: Option<PathBuf>,
    default_output: Option<PathBuf>,
) -> Result<()> {
    let device = match ConvertMode::from(device) {
        ConvertMode::Fixed(device) => device,
        ConvertMode::Auto => match decoder.classify_file(input).device_type() {
            Some(device) => {
                log::info!("Detected {} recording", device);
                device
            }
            None => bail!("Could not determine device type for {:?}", input),
        },
    };

    let output = resolve_output_path(input, output.as_deref(), default_output.as_deref());
    let summary = decoder
        .convert(device, input, &output)
        .with_context(|| format!("Failed to convert {:?}", input))?;

    println!(
        "✓ {:?} -> {:?} ({}, {} messages, {} rows)",
        summary.input, summary.output, summary.device, summary.messages, summary.rows
    );
    Ok(())
}

/// Batch mode - convert a directory, reporting failures per file
fn batch_mode(decoder: &Decoder, dir: &Path, device: DeviceArg, summary: Option<&Path>) -> Result<()> {
    let report = BatchDispatcher::new(decoder)
        .convert_all(dir, device.into(), |input| resolve_output_path(input, None, None))
        .with_context(|| format!("Failed to read directory {:?}", dir))?;

    print_report(&report);
    if let Some(path) = summary {
        write_summary(&report, path)?;
    }
    Ok(())
}

/// Sort mode - move recordings into per-device folders
fn sort_mode(decoder: &Decoder, sort: &ping_log_decoder::SortConfig) -> Result<()> {
    let report = BatchDispatcher::new(decoder)
        .sort_all(sort)
        .with_context(|| format!("Failed to read directory {:?}", sort.input_dir))?;

    print_report(&report);
    Ok(())
}

fn print_report(report: &BatchReport) {
    for outcome in &report.outcomes {
        match &outcome.status {
            FileStatus::Converted { output, rows, .. } => {
                println!("✓ {:?} -> {:?} ({} rows)", outcome.path, output, rows)
            }
            FileStatus::Moved { destination, .. } => println!("✓ {:?} -> {:?}", outcome.path, destination),
            FileStatus::Unclassified => println!("- {:?} (unknown device, skipped)", outcome.path),
            FileStatus::Failed { error, .. } => println!("✗ {:?}: {}", outcome.path, error),
        }
    }
    println!(
        "\n{} succeeded, {} skipped, {} failed",
        report.succeeded(),
        report.unclassified(),
        report.failed()
    );
}

fn write_summary(report: &BatchReport, path: &Path) -> Result<()> {
    let json = report.to_json()?;
    fs::write(path, json).with_context(|| format!("Failed to write summary: {:?}", path))?;
    log::info!("Summary written to {:?}", path);
    Ok(())
}

/// Initialize logging based on verbosity level
fn init_logging(verbose: u8, quiet: bool) {
    use env_logger::Builder;
    use log::LevelFilter;
    use std::io::Write;

    let level = if quiet {
        LevelFilter::Error
    } else {
        match verbose {
            0 => LevelFilter::Info,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    };

    Builder::new()
        .filter_level(level)
        .format(|buf, record| {
            writeln!(
                buf,
                "[{} {}] {}",
                record.level(),
                record.target(),
                record.args()
            )
        })
        .init();
}
