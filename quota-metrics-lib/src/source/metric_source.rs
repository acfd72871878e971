use super::{MetricsApi, ProbeWindow, RawMetric};
use crate::Result;
use ohno::{EnrichableExt, bail};
use std::collections::HashSet;

const LOG_TARGET: &str = "    source";

/// Service messages identifying metrics that have no quota to compare against.
const UNSUPPORTED_MESSAGES: [&str; 2] = [
    "There is no service quota associated to this metric",
    "does not support quota retrieval for resource",
];

/// Whether a metric can be expressed as a percentage of its service quota.
#[derive(Debug)]
pub enum QuotaSupport {
    Supported,

    /// The service reported that the metric has no associated quota.
    Unsupported,

    /// The probe failed for some other reason.
    Failed(ohno::AppError),
}

/// The metric listing and probing operations used by classification.
#[derive(Debug, Clone)]
pub struct MetricSource<A> {
    api: A,
}

impl<A: MetricsApi> MetricSource<A> {
    #[must_use]
    pub const fn new(api: A) -> Self {
        Self { api }
    }

    #[must_use]
    pub const fn api(&self) -> &A {
        &self.api
    }

    /// List every metric of a namespace, following pagination to the end.
    ///
    /// Any failing page fails the whole listing.
    pub async fn list_metrics(&self, namespace: &str) -> Result<Vec<RawMetric>> {
        let mut metrics = Vec::new();
        let mut next_token: Option<String> = None;
        let mut seen_tokens = HashSet::new();
        let mut pages = 0_usize;

        loop {
            let page = self
                .api
                .list_metrics_page(namespace, next_token.clone())
                .await
                .map_err(|e| e.enrich_with(|| format!("listing metrics in namespace '{namespace}'")))?;

            pages += 1;
            metrics.extend(page.metrics);

            match page.next_token {
                None => break,
                Some(token) if token.is_empty() => break,
                Some(token) => {
                    if !seen_tokens.insert(token.clone()) {
                        bail!("listing metrics in namespace '{namespace}' returned continuation token '{token}' more than once");
                    }
                    next_token = Some(token);
                }
            }
        }

        log::debug!(target: LOG_TARGET, "Got {} metrics for namespace {namespace} in {pages} page(s)", metrics.len());

        Ok(metrics)
    }

    /// Probe whether the service can compute a quota percentage for a metric.
    pub async fn supports_quota_ratio(&self, metric: &RawMetric, window: &ProbeWindow) -> QuotaSupport {
        match self.api.query_quota_ratio(metric, window).await {
            Ok(()) => QuotaSupport::Supported,
            Err(e) => {
                let message = format!("{e:#}");
                if UNSUPPORTED_MESSAGES.iter().any(|m| message.contains(m)) {
                    QuotaSupport::Unsupported
                } else {
                    QuotaSupport::Failed(e)
                }
            }
        }
    }
}
