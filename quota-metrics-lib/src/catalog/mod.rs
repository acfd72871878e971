//! Metric classification and catalog reconciliation
//!
//! This module decides which CloudWatch metrics are usable for quota monitoring and
//! maintains the persisted catalog of those metrics.
//!
//! # Implementation Model
//!
//! Raw records coming out of [`crate::source`] are normalized into [`Metric`] values.
//! Each [`Namespace`] carries a fixed table of [`NamespaceRules`] describing how its
//! metrics are admitted, which [`Statistic`] they get, and which [`Group`] of the
//! catalog they land in. The [`Classifier`] applies those rules one metric at a time,
//! probing the remote service where a namespace requires it.
//!
//! The classified metrics form a fresh [`Catalog`], which is then reconciled with the
//! catalog already on disk: fresh entries replace existing entries with the same
//! [`MetricId`], and entries that were not rediscovered are kept. The [`store`] module
//! reads and writes the YAML document, including the derived per-service
//! [`DashboardData`] view.

mod classifier;
mod dashboard;
mod document;
mod group;
mod metric;
mod namespace;
mod progress;
pub mod store;

pub use classifier::{Classification, ClassificationStats, Classifier, ProbeErrorPolicy, Rejection, StatisticOverrides, builtin_statistic_overrides};
pub use dashboard::DashboardData;
pub use document::Catalog;
pub use group::Group;
pub use metric::{MAX_ID_CHARS, Metric, MetricId, Statistic};
pub use namespace::{Eligibility, GroupRule, Namespace, NamespaceRules, StatisticRule};
pub use progress::Progress;
