#![doc(hidden)]
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Core library for quota-metrics
//!
//! This library holds all functionality of the quota-metrics tool, which discovers the
//! CloudWatch metrics able to track service quota utilization and keeps a catalog of
//! them in a YAML file.
//!
//! # Module Organization
//!
//! - [`commands`]: Command-line interface and orchestration
//! - [`source`]: Access to the CloudWatch listing and query APIs
//! - [`catalog`]: Metric classification, catalog reconciliation, and persistence

pub type Result<T, E = ohno::AppError> = core::result::Result<T, E>;

#[cfg(any(debug_assertions, test))]
pub mod catalog;
#[cfg(not(any(debug_assertions, test)))]
mod catalog;

#[cfg(any(debug_assertions, test))]
pub mod commands;
#[cfg(not(any(debug_assertions, test)))]
mod commands;

#[cfg(any(debug_assertions, test))]
pub mod source;
#[cfg(not(any(debug_assertions, test)))]
mod source;

pub use crate::commands::{Host, run};
