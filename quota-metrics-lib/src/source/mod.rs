//! Access to the CloudWatch metric listing and query APIs
//!
//! [`MetricsApi`] is the seam between the tool and the remote service: one call lists a
//! single page of metrics, another runs the quota-ratio query for one metric.
//! [`CloudWatchApi`] implements it on top of the AWS SDK, while [`MetricSource`] layers
//! the behavior the rest of the tool relies on: exhausting pagination, and turning query
//! failures into a [`QuotaSupport`] verdict.

mod api;
mod cloudwatch;
mod metric_source;

pub use api::{MetricPage, MetricsApi, ProbeWindow, RawDimension, RawMetric};
pub use cloudwatch::CloudWatchApi;
pub use metric_source::{MetricSource, QuotaSupport};
