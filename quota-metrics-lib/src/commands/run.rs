//! Command-line parsing for quota-metrics

use super::{DiscoverArgs, discover};
use crate::{Host, Result};
use clap::Parser;
use clap::builder::Styles;
use clap::builder::styling::{AnsiColor, Effects};

const CLAP_STYLES: Styles = Styles::styled()
    .header(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .usage(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .literal(AnsiColor::Cyan.on_default().effects(Effects::BOLD))
    .placeholder(AnsiColor::Cyan.on_default());

#[derive(Parser, Debug)]
#[command(name = "quota-metrics", version, author, long_about = None)]
#[command(about = "Discover the CloudWatch metrics usable for service quota monitoring")]
#[command(styles = CLAP_STYLES)]
struct Cli {
    #[command(flatten)]
    discover: DiscoverArgs,
}

/// Parse command-line arguments and run a discovery
///
/// # Arguments
///
/// * `args` - An iterator of command-line arguments (typically from `std::env::args()`)
///
/// # Errors
///
/// Returns an error if the discovery fails
pub async fn run<I, T, H>(host: &mut H, args: I) -> Result<()>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
    H: Host,
{
    let cli = Cli::parse_from(args);
    discover(host, &cli.discover).await
}
