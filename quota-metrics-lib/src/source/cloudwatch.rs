//! CloudWatch implementation of [`MetricsApi`]

use super::{MetricPage, MetricsApi, ProbeWindow, RawDimension, RawMetric};
use crate::Result;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_cloudwatch::Client;
use aws_sdk_cloudwatch::error::DisplayErrorContext;
use aws_sdk_cloudwatch::operation::get_metric_data::GetMetricDataInput;
use aws_sdk_cloudwatch::primitives::DateTime;
use aws_sdk_cloudwatch::types::{Dimension, Metric, MetricDataQuery, MetricStat};
use ohno::{IntoAppError, app_err};

const LOG_TARGET: &str = "cloudwatch";

/// Aggregation period of the probe query, in seconds.
const PROBE_PERIOD_SECS: i32 = 300;

/// Statistic of the raw series the probe divides by its quota.
const PROBE_STATISTIC: &str = "Sum";

const USAGE_QUERY_ID: &str = "m1";
const QUOTA_RATIO_QUERY_ID: &str = "e1";
const QUOTA_RATIO_EXPRESSION: &str = "m1/SERVICE_QUOTA(m1)*100";

/// CloudWatch client wrapper.
#[derive(Debug, Clone)]
pub struct CloudWatchApi {
    client: Client,
}

impl CloudWatchApi {
    #[must_use]
    pub const fn new(client: Client) -> Self {
        Self { client }
    }

    /// Build a client from the standard AWS configuration chain (environment, profile, instance metadata).
    ///
    /// `region` and `endpoint_url` override what the chain would pick.
    pub async fn from_env(region: Option<&str>, endpoint_url: Option<&str>) -> Self {
        let mut loader = aws_config::defaults(BehaviorVersion::latest());

        if let Some(region) = region {
            loader = loader.region(Region::new(region.to_string()));
        }

        if let Some(url) = endpoint_url {
            loader = loader.endpoint_url(url);
        }

        let sdk_config = loader.load().await;
        log::debug!(
            target: LOG_TARGET,
            "Using region {}",
            sdk_config.region().map_or_else(|| "<unset>".to_string(), ToString::to_string)
        );

        Self::new(Client::new(&sdk_config))
    }
}

impl MetricsApi for CloudWatchApi {
    async fn list_metrics_page(&self, namespace: &str, next_token: Option<String>) -> Result<MetricPage> {
        let output = self
            .client
            .list_metrics()
            .namespace(namespace)
            .set_next_token(next_token)
            .send()
            .await
            .map_err(|e| app_err!("ListMetrics failed: {}", DisplayErrorContext(&e)))?;

        Ok(MetricPage {
            metrics: output.metrics().iter().filter_map(|m| to_raw_metric(m, namespace)).collect(),
            next_token: output.next_token().map(str::to_string),
        })
    }

    async fn query_quota_ratio(&self, metric: &RawMetric, window: &ProbeWindow) -> Result<()> {
        let request = quota_ratio_request(metric, window)?;

        let _ = self
            .client
            .get_metric_data()
            .set_metric_data_queries(request.metric_data_queries)
            .set_start_time(request.start_time)
            .set_end_time(request.end_time)
            .set_max_datapoints(request.max_datapoints)
            .send()
            .await
            .map_err(|e| app_err!("GetMetricData failed: {}", DisplayErrorContext(&e)))?;

        Ok(())
    }
}

/// Build the query dividing a metric's `Sum` by its service quota over the probe window.
fn quota_ratio_request(metric: &RawMetric, window: &ProbeWindow) -> Result<GetMetricDataInput> {
    let dimensions: Vec<Dimension> = metric
        .dimensions
        .iter()
        .map(|d| Dimension::builder().name(&d.name).value(&d.value).build())
        .collect();

    let sdk_metric = Metric::builder()
        .namespace(&metric.namespace)
        .metric_name(&metric.metric_name)
        .set_dimensions(Some(dimensions))
        .build();

    let usage_query = MetricDataQuery::builder()
        .id(USAGE_QUERY_ID)
        .metric_stat(
            MetricStat::builder()
                .metric(sdk_metric)
                .period(PROBE_PERIOD_SECS)
                .stat(PROBE_STATISTIC)
                .build(),
        )
        .build();

    let ratio_query = MetricDataQuery::builder()
        .id(QUOTA_RATIO_QUERY_ID)
        .expression(QUOTA_RATIO_EXPRESSION)
        .build();

    GetMetricDataInput::builder()
        .metric_data_queries(usage_query)
        .metric_data_queries(ratio_query)
        .start_time(DateTime::from_secs(window.start.timestamp()))
        .end_time(DateTime::from_secs(window.end.timestamp()))
        .max_datapoints(1)
        .build()
        .into_app_err("building GetMetricData request")
}

/// Convert a listed SDK metric, dropping records without a name and dimensions without a name or value.
fn to_raw_metric(metric: &Metric, listed_namespace: &str) -> Option<RawMetric> {
    let Some(metric_name) = metric.metric_name() else {
        log::warn!(target: LOG_TARGET, "Ignoring a metric without a name in namespace {listed_namespace}");
        return None;
    };

    Some(RawMetric {
        namespace: metric.namespace().unwrap_or(listed_namespace).to_string(),
        metric_name: metric_name.to_string(),
        dimensions: metric
            .dimensions()
            .iter()
            .filter_map(|d| match (d.name(), d.value()) {
                (Some(name), Some(value)) => Some(RawDimension::new(name, value)),
                _ => {
                    log::warn!(target: LOG_TARGET, "Ignoring an incomplete dimension of metric {metric_name} in namespace {listed_namespace}");
                    None
                }
            })
            .collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_to_raw_metric_copies_fields() {
        let sdk_metric = Metric::builder()
            .namespace("AWS/Usage")
            .metric_name("ResourceCount")
            .dimensions(Dimension::builder().name("Service").value("EC2").build())
            .dimensions(Dimension::builder().name("Resource").value("vCPU").build())
            .build();

        let raw = to_raw_metric(&sdk_metric, "AWS/Usage").unwrap();
        assert_eq!(raw.namespace, "AWS/Usage");
        assert_eq!(raw.metric_name, "ResourceCount");
        assert_eq!(raw.dimensions, vec![RawDimension::new("Service", "EC2"), RawDimension::new("Resource", "vCPU")]);
    }

    #[test]
    fn test_to_raw_metric_defaults_namespace() {
        let sdk_metric = Metric::builder().metric_name("ServiceLimitUsage").build();
        let raw = to_raw_metric(&sdk_metric, "AWS/TrustedAdvisor").unwrap();
        assert_eq!(raw.namespace, "AWS/TrustedAdvisor");
        assert!(raw.dimensions.is_empty());
    }

    #[test]
    fn test_to_raw_metric_requires_name() {
        let sdk_metric = Metric::builder().namespace("AWS/Usage").build();
        assert!(to_raw_metric(&sdk_metric, "AWS/Usage").is_none());
    }

    #[test]
    fn test_to_raw_metric_skips_incomplete_dimensions() {
        let sdk_metric = Metric::builder()
            .namespace("AWS/Usage")
            .metric_name("ResourceCount")
            .dimensions(Dimension::builder().name("Service").value("EC2").build())
            .dimensions(Dimension::builder().name("Resource").build())
            .dimensions(Dimension::builder().value("orphan").build())
            .build();

        let raw = to_raw_metric(&sdk_metric, "AWS/Usage").unwrap();
        assert_eq!(raw.dimensions, vec![RawDimension::new("Service", "EC2")]);
    }

    fn usage_metric() -> RawMetric {
        RawMetric {
            namespace: "AWS/Usage".to_string(),
            metric_name: "ResourceCount".to_string(),
            dimensions: vec![RawDimension::new("Service", "EC2"), RawDimension::new("Resource", "vCPU")],
        }
    }

    #[test]
    fn test_quota_ratio_request_queries() {
        let window = ProbeWindow::ending_at(Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap());
        let request = quota_ratio_request(&usage_metric(), &window).unwrap();

        let queries = request.metric_data_queries();
        assert_eq!(queries.len(), 2);

        let usage = &queries[0];
        assert_eq!(usage.id(), Some("m1"));
        assert_eq!(usage.expression(), None);
        let stat = usage.metric_stat().unwrap();
        assert_eq!(stat.stat(), Some("Sum"));
        assert_eq!(stat.period(), Some(300));

        let metric = stat.metric().unwrap();
        assert_eq!(metric.namespace(), Some("AWS/Usage"));
        assert_eq!(metric.metric_name(), Some("ResourceCount"));
        let dimensions: Vec<_> = metric.dimensions().iter().map(|d| (d.name(), d.value())).collect();
        assert_eq!(dimensions, [(Some("Service"), Some("EC2")), (Some("Resource"), Some("vCPU"))]);

        let ratio = &queries[1];
        assert_eq!(ratio.id(), Some("e1"));
        assert_eq!(ratio.expression(), Some("m1/SERVICE_QUOTA(m1)*100"));
        assert!(ratio.metric_stat().is_none());
    }

    #[test]
    fn test_quota_ratio_request_window() {
        let end = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        let request = quota_ratio_request(&usage_metric(), &ProbeWindow::ending_at(end)).unwrap();

        assert_eq!(request.end_time(), Some(&DateTime::from_secs(end.timestamp())));
        assert_eq!(request.start_time(), Some(&DateTime::from_secs(end.timestamp() - 3600)));
        assert_eq!(request.max_datapoints(), Some(1));
    }
}
