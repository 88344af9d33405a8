use std::collections::HashMap;
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};

use imgclass_config::{load_config, validate_config, BackendKind};
use imgclass_engine::{create_backend, BatchDriver, BatchPolicy, CategoryTable};
use imgclass_observability::{init_logging, parse_debug_flags};

/// Classify images with a pretrained network and print `<path>,<label>` lines
#[derive(Parser, Debug)]
#[command(name = "imgclass", version, author, long_about = None)]
#[command(after_help = imgclass_observability::debug_flags_help())]
struct Args {
    /// Images to classify, processed in order
    #[arg(required = true, value_name = "IMAGE")]
    images: Vec<PathBuf>,

    /// Path to the configuration file (default: search for imgclass.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Inference backend to use
    #[arg(long, value_parser = ["fixed", "reference"])]
    backend: Option<String>,

    /// Stop at the first image that fails
    #[arg(long, default_value_t = false)]
    fail_fast: bool,

    /// Also write JSON logs under this directory (needs the `file-logging` feature)
    #[arg(long, value_name = "DIR")]
    log_dir: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, default_value_t = false)]
    verbose: bool,
}

impl Args {
    fn overrides(&self) -> HashMap<String, String> {
        let mut overrides = HashMap::new();
        if let Some(backend) = &self.backend {
            overrides.insert("backend".to_string(), backend.clone());
        }
        if self.fail_fast {
            overrides.insert("fail_fast".to_string(), "true".to_string());
        }
        if self.verbose {
            overrides.insert("log_level".to_string(), "debug".to_string());
        }
        overrides
    }
}

/// Main entry point
fn main() -> ExitCode {
    // Per-crate debug flags are read separately by the observability crate
    let args = Args::parse_from(
        std::env::args_os().filter(|arg| !arg.to_str().is_some_and(|arg| arg.starts_with("--debug-"))),
    );

    match run(&args) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            eprintln!("Error: {:#}", err);
            ExitCode::from(2)
        }
    }
}

/// Returns whether every image was classified
fn run(args: &Args) -> Result<bool> {
    let config = load_config(args.config.as_deref(), Some(&args.overrides()))
        .context("Failed to load configuration")?;
    validate_config(&config).context("Invalid configuration")?;

    let debug_flags = parse_debug_flags();
    let logging = init_logging(&debug_flags, &config.logging.level, args.log_dir.clone())?;

    info!("imgclass v{}", imgclass_engine::VERSION);
    if debug_flags.any_enabled() {
        info!("Debug logging: {}", debug_flags.to_filter_string(&config.logging.level));
    }
    if let Some(dir) = logging.log_dir() {
        info!("Writing logs to {}", dir.display());
    }

    let categories = CategoryTable::from_config(&config.categories)?;
    info!("Category table: {} labels", categories.len());

    if config.engine.backend == BackendKind::Fixed {
        info!("Fixed backend selected; weights will not be read");
    }
    let mut backend = create_backend(&config.engine);
    let policy = BatchPolicy {
        fail_fast: config.batch.fail_fast,
    };

    let mut driver = BatchDriver::start(
        backend.as_mut(),
        &config.engine.weights_path,
        &categories,
        policy,
    )?;

    let stdout = io::stdout();
    let report = driver.run(&args.images, &mut stdout.lock())?;

    if !report.is_success() {
        error!(
            "{} of {} image(s) were not classified",
            report.failures.len() + report.skipped,
            args.images.len()
        );
    }
    Ok(report.is_success())
}
