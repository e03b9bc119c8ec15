//! Artifact Scanner command line.
//!
//! Finds the game window, scans the open artifact inventory and writes the
//! encoded records to a JSON file.

use anyhow::{Context, Result};
use chrono::Local;
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info, warn};

use artifact_scanner::artifact::{FieldMapper, Localization};
use artifact_scanner::calibration::LayoutRepository;
use artifact_scanner::config::{ScannerConfig, load_config};
use artifact_scanner::export::{ExportFormat, write_output};
use artifact_scanner::scan::event_channel;
use artifact_scanner::{ScanContext, ScanEvent, ScanRequest, Scanner, capture, logging, ocr, paths};

#[derive(Parser, Debug)]
#[command(version, about = "Scan the artifact inventory of the game window")]
struct Args {
    /// Lowest rarity to keep
    #[arg(long, default_value_t = 4)]
    min_star: i32,

    /// Highest rarity to keep
    #[arg(long, default_value_t = 5)]
    max_star: i32,

    /// Lowest enhancement level to keep
    #[arg(long, default_value_t = 0)]
    min_level: i32,

    /// Highest enhancement level to keep
    #[arg(long, default_value_t = 20)]
    max_level: i32,

    /// Output schema (defaults to the configured one)
    #[arg(long, value_enum)]
    format: Option<ExportFormat>,

    /// Configuration file (defaults to config.json next to the executable)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Output file (defaults to a timestamped file in the export directory)
    #[arg(long)]
    output: Option<PathBuf>,

    /// Debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();

    if let Err(e) = paths::ensure_directories() {
        eprintln!("Failed to create output directories: {}", e);
        return ExitCode::FAILURE;
    }
    if let Err(e) = logging::init_logging(&paths::get_logs_dir(), args.verbose) {
        eprintln!("{:#}", e);
        return ExitCode::FAILURE;
    }
    logging::install_panic_hook();

    match run(args) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

/// Runs one scan; `Ok(false)` when it ended with a fatal event.
fn run(args: Args) -> Result<bool> {
    let config_path = args.config.clone().unwrap_or_else(paths::get_config_path);
    let config = load_config(&config_path).resolve_paths(paths::get_exe_dir());
    let format = args.format.unwrap_or(config.export_format);

    let scanner = build_scanner(&config)?;
    let request = ScanRequest {
        min_star: args.min_star,
        max_star: args.max_star,
        min_level: args.min_level,
        max_level: args.max_level,
        format,
    };

    let (tx, rx) = event_channel();
    let handle = match scanner.scan(request, move |event| {
        let _ = tx.send(event);
    }) {
        Ok(handle) => handle,
        Err(e) => {
            error!("{}", e);
            return Ok(false);
        }
    };

    let output = args.output.unwrap_or_else(|| default_output_path(format));
    let mut succeeded = false;

    for event in rx {
        match event {
            ScanEvent::ArtifactCount { count } => info!("Artifacts in inventory: {}", count),
            ScanEvent::Progress { percent } => info!("Progress: {}%", percent),
            ScanEvent::RecognizeWarning { raw_fields } => {
                warn!("Skipped an unreadable artifact: {:?}", raw_fields)
            }
            ScanEvent::Finished { records } | ScanEvent::InterruptedByUser { records } => {
                write_output(&records, &output)?;
                info!("Wrote {} records to {}", records.len(), output.display());
                succeeded = true;
            }
            fatal => error!("Scan failed: {:?}", fatal),
        }
    }

    if let Err(e) = handle.join() {
        warn!("Scan worker ended with: {}", e);
    }
    Ok(succeeded)
}

/// `<export_dir>/artifacts_<timestamp>_<format>.json`
fn default_output_path(format: ExportFormat) -> PathBuf {
    let timestamp = Local::now().format("%Y%m%d_%H%M%S");
    paths::get_export_dir().join(format!("artifacts_{}_{}.json", timestamp, format.tag()))
}

fn build_scanner(config: &ScannerConfig) -> Result<Scanner> {
    let localization = match &config.localization_path {
        Some(path) => Localization::from_file(path)?,
        None => Localization::zh_cn(),
    };
    let mapper = FieldMapper::new(localization).context("Invalid localization strings")?;
    let layouts = LayoutRepository::load_dir(&config.layouts_dir)?;
    let recognizer = ocr::load_recognizer(&config.model_path, &config.dict_path)?;
    let connector = capture::platform_connector(&config.window_titles)
        .context("No game window backend")?;

    info!(
        "Loaded {} layouts, model {}",
        layouts.definitions().len(),
        config.model_path.display()
    );

    let context = ScanContext {
        recognizer: Box::new(recognizer),
        mapper,
        layouts,
        timing: config.timing.clone(),
        thresholds: config.thresholds.clone(),
        mapper_dir: Some(config.mapper_dir.clone()),
    };
    Ok(Scanner::new(context, connector))
}
