use crate::Result;
use chrono::{DateTime, Duration, Utc};

/// How far back the quota-ratio probe looks.
const PROBE_LOOKBACK_HOURS: i64 = 1;

/// A dimension of a listed metric.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawDimension {
    pub name: String,
    pub value: String,
}

impl RawDimension {
    #[must_use]
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// A metric as returned by the listing API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawMetric {
    pub namespace: String,
    pub metric_name: String,
    pub dimensions: Vec<RawDimension>,
}

/// One page of listing results.
#[derive(Debug, Clone, Default)]
pub struct MetricPage {
    pub metrics: Vec<RawMetric>,

    /// Token to request the following page, absent on the last page.
    pub next_token: Option<String>,
}

/// Time range covered by a quota-ratio probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl ProbeWindow {
    /// The trailing one-hour window ending at `end`.
    #[must_use]
    pub fn ending_at(end: DateTime<Utc>) -> Self {
        Self {
            start: end - Duration::hours(PROBE_LOOKBACK_HOURS),
            end,
        }
    }
}

/// The remote metrics service.
pub trait MetricsApi: Send + Sync {
    /// Fetch one page of the metrics in `namespace`.
    fn list_metrics_page(&self, namespace: &str, next_token: Option<String>) -> impl Future<Output = Result<MetricPage>> + Send;

    /// Ask the service to compute the metric's usage as a percentage of its quota.
    ///
    /// Succeeds when the service could compute the ratio. The error of a failed query must
    /// carry the service's message verbatim; [`super::MetricSource`] matches on it.
    fn query_quota_ratio(&self, metric: &RawMetric, window: &ProbeWindow) -> impl Future<Output = Result<()>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_probe_window_is_one_hour() {
        let end = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let window = ProbeWindow::ending_at(end);

        assert_eq!(window.end, end);
        assert_eq!(window.start, Utc.with_ymd_and_hms(2024, 5, 1, 11, 0, 0).unwrap());
    }
}
