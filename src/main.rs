//! BigMart sales command line

use std::fs::{self, OpenOptions};
use std::path::Path;
use std::process::ExitCode;
use std::sync::Mutex;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use tracing_subscriber::EnvFilter;

use bigmart_sales::{pipeline, Mode, Settings};

#[derive(Parser, Debug)]
#[command(name = "bigmart-sales", version, about = "Train the BigMart sales model or predict with it")]
struct Cli {
    /// Which run to perform
    #[arg(value_enum)]
    mode: ModeArg,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum ModeArg {
    /// Prepare the training table and fit the model
    Train,
    /// Prepare the test table and write predictions
    Test,
}

impl From<ModeArg> for Mode {
    fn from(arg: ModeArg) -> Self {
        match arg {
            ModeArg::Train => Mode::Train,
            ModeArg::Test => Mode::Test,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let settings = Settings::load();
    let log_file = settings.as_ref().ok().and_then(|s| s.log_file.as_deref());
    if let Err(e) = init_logging(log_file) {
        eprintln!("failed to initialize logging: {e:#}");
        return ExitCode::FAILURE;
    }

    let result = settings
        .map_err(|e| anyhow::anyhow!("{e}"))
        .context("failed to load settings")
        .and_then(|settings| run(cli.mode.into(), &settings));

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(mode: Mode, settings: &Settings) -> Result<()> {
    pipeline::run(mode, settings).with_context(|| format!("{mode} run failed"))
}

fn init_logging(log_file: Option<&Path>) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match log_file {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)
                    .with_context(|| format!("cannot create {}", parent.display()))?;
            }
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("cannot open log file {}", path.display()))?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .init();
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
    Ok(())
}
