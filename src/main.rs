use clap::Parser;
use tracing_subscriber::EnvFilter;

use trickle::cli::args::{file_arg, Cli};
use trickle::config::load_config;
use trickle::config::types::Verbosity;
use trickle::progress::bar::create_transfer_progress;
use trickle::transfer::copy::copy_throttled;
use trickle::transfer::stats::TransferStats;
use trickle::TrickleError;

fn main() {
    let cli = Cli::parse();

    // Convert CLI flags to verbosity level
    let verbosity = Verbosity::from((cli.quiet, cli.verbose));

    // RUST_LOG env var overrides CLI flags
    let filter = verbosity.as_tracing_filter();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr) // Keep stdout clean for output
        .init();

    tracing::debug!("Verbosity level: {:?}", verbosity);

    if let Err(err) = run(cli) {
        display_error(&err);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), TrickleError> {
    let file_config = load_config(cli.config.as_deref())?;
    let settings = file_config.merge(cli.throttle_overrides()).resolve()?;

    let source = file_arg(&cli.source);
    let dest = file_arg(&cli.dest);
    tracing::info!(
        source = %source.map(|p| p.display().to_string()).unwrap_or_else(|| "stdin".into()),
        dest = %dest.map(|p| p.display().to_string()).unwrap_or_else(|| "stdout".into()),
        limit = %settings.limit,
        side = ?settings.side,
        "Starting throttled copy"
    );

    let total = source
        .and_then(|p| std::fs::metadata(p).ok())
        .map(|m| m.len());
    let progress = create_transfer_progress(total, cli.progress && !cli.quiet);
    let mut stats = TransferStats::start();
    let bytes = copy_throttled(
        source.map(|p| p.as_path()),
        dest.map(|p| p.as_path()),
        &settings,
        &progress,
    )?;
    stats.add_bytes(bytes);
    stats.print_summary(cli.quiet);
    Ok(())
}

/// Display a TrickleError with optional suggestion hint to stderr.
fn display_error(err: &TrickleError) {
    eprintln!("error: {}", err);
    if let Some(suggestion) = err.suggestion() {
        eprintln!("  hint: {}", suggestion);
    }
}
