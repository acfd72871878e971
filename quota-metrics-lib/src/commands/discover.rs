//! The discovery command: classify, reconcile, and persist.

use super::config::Config;
use super::{Host, ProgressReporter};
use crate::Result;
use crate::catalog::{Progress, store};
use crate::source::{CloudWatchApi, MetricSource, MetricsApi, ProbeWindow};
use camino::{Utf8Path, Utf8PathBuf};
use chrono::{DateTime, Utc};
use clap::{Args, ValueEnum};
use core::time::Duration;
use std::io::Write;

const LOG_TARGET: &str = "  discover";

/// How long a run must last before the progress bar shows up.
const PROGRESS_DELAY: Duration = Duration::from_millis(300);

/// Color mode configuration for progress output
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ColorMode {
    /// Always use colors
    Always,

    /// Never use colors
    Never,

    /// Use colors if stderr is a terminal, otherwise don't use colors
    Auto,
}

#[derive(Args, Debug, Clone)]
pub struct DiscoverArgs {
    /// Catalog file to update
    #[arg(long, value_name = "PATH", default_value = "supported-metrics.yaml")]
    pub output_file: Utf8PathBuf,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,

    /// Replace the catalog file instead of merging into it
    #[arg(long)]
    pub overwrite: bool,

    /// Path to configuration file (default is `quota-metrics.toml`)
    #[arg(long, short = 'c', value_name = "PATH")]
    pub config: Option<Utf8PathBuf>,

    /// AWS region to query
    #[arg(long, value_name = "REGION", env = "AWS_REGION")]
    pub region: Option<String>,

    /// Control when to use colored progress output
    #[arg(long, value_name = "WHEN", default_value = "auto")]
    pub color: ColorMode,
}

impl DiscoverArgs {
    /// Arguments for a run writing to `output_file`, with every other option at its default.
    #[must_use]
    pub const fn for_output(output_file: Utf8PathBuf) -> Self {
        Self {
            output_file,
            debug: false,
            overwrite: false,
            config: None,
            region: None,
            color: ColorMode::Never,
        }
    }
}

/// Run a discovery against CloudWatch and update the catalog file.
///
/// # Errors
///
/// Returns an error if the configuration is invalid, the remote listing fails, a metric
/// lacks a required dimension, or the catalog cannot be read or written
pub async fn discover<H: Host>(host: &mut H, args: &DiscoverArgs) -> Result<()> {
    init_logging(args.debug);

    let config = Config::load(Utf8Path::new("."), args.config.as_deref())?;
    let region = args.region.as_deref().or(config.region.as_deref());
    let api = CloudWatchApi::from_env(region, config.endpoint_url.as_deref()).await;

    let use_colors = match args.color {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => {
            use std::io::{IsTerminal, stderr};
            stderr().is_terminal()
        }
    };

    let delay = if args.debug { Duration::from_hours(365 * 24) } else { PROGRESS_DELAY };
    let progress = ProgressReporter::new(delay, use_colors);

    discover_with(host, args, &config, &MetricSource::new(api), &progress, Utc::now()).await
}

/// Run a discovery against any metrics service and update the catalog file.
///
/// `now` ends the window used by quota probes. Nothing is written unless every namespace
/// was classified successfully.
///
/// # Errors
///
/// Same as [`discover`]
pub async fn discover_with<H: Host, A: MetricsApi>(
    host: &mut H,
    args: &DiscoverArgs,
    config: &Config,
    source: &MetricSource<A>,
    progress: &dyn Progress,
    now: DateTime<Utc>,
) -> Result<()> {
    let window = ProbeWindow::ending_at(now);
    let result = config.classifier().discover(source, &window, progress).await;
    progress.done();
    let (fresh, stats) = result?;

    log::info!(target: LOG_TARGET, "Discovered {}", fresh.counts());

    let catalog = store::reconcile_with_file(&args.output_file, fresh, args.overwrite)?;
    store::save(&catalog, &args.output_file)?;

    let _ = writeln!(host.output(), "Supported metrics written to '{}': {}", args.output_file, catalog.counts());

    for (namespace, ns_stats) in &stats {
        let _ = writeln!(
            host.output(),
            "  {namespace}: {} listed, {} supported",
            ns_stats.listed,
            ns_stats.accepted
        );

        if ns_stats.probe_failures > 0 {
            let _ = writeln!(
                host.error(),
                "{} quota probe(s) in {namespace} failed unexpectedly; those metrics were left out",
                ns_stats.probe_failures
            );
        }
    }

    Ok(())
}

/// Initialize logging for the process.
///
/// Logs at info level by default, or debug with `--debug`; `RUST_LOG` overrides both.
/// Later calls are ignored.
fn init_logging(debug: bool) {
    let level = if debug { "debug" } else { "info" };
    let env = env_logger::Env::default().filter_or("RUST_LOG", level);

    let _ = env_logger::Builder::from_env(env)
        .format_timestamp(None)
        .format_module_path(false)
        .format_target(debug)
        .try_init();
}
