//! Command-line interface and orchestration for quota-metrics
//!
//! This module parses the command line, loads the configuration, and drives a
//! discovery run from the remote listing through to the updated catalog file.
//!
//! # Execution Flow
//!
//! The `run` function parses command-line arguments using clap and hands them to
//! `discover`, which:
//!
//! 1. Sets up logging and loads the TOML configuration
//! 2. Builds a CloudWatch client from the standard AWS configuration chain
//! 3. Classifies the metrics of every supported namespace into a fresh catalog
//! 4. Merges the fresh catalog into the existing file, unless asked to overwrite it
//! 5. Writes the catalog and prints a summary
//!
//! `discover_with` performs steps 3 to 5 against any [`crate::source::MetricsApi`],
//! which is how the whole flow is exercised without network access.

mod config;
mod discover;
mod host;
mod progress_reporter;
mod run;

#[cfg(debug_assertions)]
pub use config::{Config, DEFAULT_CONFIG_TOML};

pub use discover::{ColorMode, DiscoverArgs, discover, discover_with};
pub use host::Host;
pub use progress_reporter::ProgressReporter;
pub use run::run;
