use super::{Catalog, Eligibility, Group, Metric, MetricId, Namespace, Progress, Statistic, StatisticRule};
use crate::Result;
use crate::source::{MetricSource, MetricsApi, ProbeWindow, QuotaSupport, RawMetric};
use core::sync::atomic::{AtomicU64, Ordering};
use ohno::{EnrichableExt, app_err};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use strum::IntoEnumIterator;

const LOG_TARGET: &str = "classifier";

const SERVICE_DIMENSION: &str = "Service";
const RESOURCE_DIMENSION: &str = "Resource";

/// Statistics to use for specific usage metrics, keyed by service and then by resource.
pub type StatisticOverrides = BTreeMap<String, BTreeMap<String, Statistic>>;

/// Usage metrics that must be summed rather than maximized.
#[must_use]
pub fn builtin_statistic_overrides() -> StatisticOverrides {
    let entries = [
        ("SNS", "NumberOfMessagesPublishedPerAccount", Statistic::Sum),
        ("KMS", "CryptographicOperationsRsa", Statistic::Sum),
        ("KMS", "CryptographicOperationsSymmetric", Statistic::Sum),
    ];

    let mut overrides = StatisticOverrides::new();
    for (service, resource, statistic) in entries {
        let _ = overrides
            .entry(service.to_string())
            .or_default()
            .insert(resource.to_string(), statistic);
    }

    overrides
}

/// What to do when a quota probe fails for a reason other than a missing quota.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProbeErrorPolicy {
    /// Leave the metric out of the catalog and keep going.
    #[default]
    Skip,

    /// Abort the run.
    Fail,
}

/// Why a metric was left out of the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    NameMismatch,
    QuotaUnsupported,
    ProbeFailed,
}

/// The verdict for one metric.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    Accepted { group: Group, id: MetricId, metric: Metric },
    Rejected { id: MetricId, reason: Rejection },
}

/// Counters for one classification pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClassificationStats {
    pub listed: usize,
    pub accepted: usize,
    pub rejected: usize,
    pub probe_failures: usize,

    /// Accepted metrics whose id was already taken earlier in the same run.
    pub replaced: usize,
}

/// Applies the per-namespace rules to discovered metrics.
#[derive(Debug, Clone)]
pub struct Classifier {
    default_usage_statistic: Statistic,
    overrides: StatisticOverrides,
    probe_errors: ProbeErrorPolicy,
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new(Statistic::Maximum, builtin_statistic_overrides(), ProbeErrorPolicy::Skip)
    }
}

impl Classifier {
    #[must_use]
    pub const fn new(default_usage_statistic: Statistic, overrides: StatisticOverrides, probe_errors: ProbeErrorPolicy) -> Self {
        Self {
            default_usage_statistic,
            overrides,
            probe_errors,
        }
    }

    /// Classify one metric of `namespace`.
    ///
    /// `quota` is the probe verdict, required by namespaces whose eligibility depends on it.
    /// Fails when the namespace's grouping rule needs a dimension the metric lacks.
    pub fn classify(&self, namespace: Namespace, mut metric: Metric, quota: Option<&QuotaSupport>) -> Result<Classification> {
        let rules = namespace.rules();
        let id = metric.id();

        if let Some(reason) = check_eligibility(rules.eligibility, &metric, quota) {
            return Ok(Classification::Rejected { id, reason });
        }

        metric.statistic = self.statistic_for(rules.statistic, &metric);

        let group = rules
            .group
            .resolve(&metric)
            .map_err(|dimension| app_err!("dimension '{dimension}' not found in {namespace} metric {id}"))?;

        Ok(Classification::Accepted { group, id, metric })
    }

    fn statistic_for(&self, rule: StatisticRule, metric: &Metric) -> Statistic {
        match rule {
            StatisticRule::Fixed(statistic) => statistic,
            StatisticRule::ServiceResourceOverrides => metric
                .dimension(SERVICE_DIMENSION)
                .and_then(|service| self.overrides.get(service))
                .and_then(|resources| resources.get(metric.dimension(RESOURCE_DIMENSION)?))
                .copied()
                .unwrap_or(self.default_usage_statistic),
        }
    }

    /// Discover and classify the metrics of every known namespace into a fresh catalog.
    pub async fn discover<A: MetricsApi>(
        &self,
        source: &MetricSource<A>,
        window: &ProbeWindow,
        progress: &dyn Progress,
    ) -> Result<(Catalog, Vec<(Namespace, ClassificationStats)>)> {
        let mut catalog = Catalog::default();
        let mut stats = Vec::new();

        for namespace in Namespace::iter() {
            let ns_stats = self
                .classify_namespace(source, namespace, window, &mut catalog, progress)
                .await
                .map_err(|e| e.enrich_with(|| format!("getting supported {namespace} metrics")))?;
            stats.push((namespace, ns_stats));
        }

        Ok((catalog, stats))
    }

    /// List the metrics of one namespace and add the accepted ones to `catalog`.
    ///
    /// Metrics are probed one at a time. An accepted metric whose id is already present in its
    /// group replaces the earlier entry.
    pub async fn classify_namespace<A: MetricsApi>(
        &self,
        source: &MetricSource<A>,
        namespace: Namespace,
        window: &ProbeWindow,
        catalog: &mut Catalog,
        progress: &dyn Progress,
    ) -> Result<ClassificationStats> {
        progress.set_phase("Listing");
        progress.set_indeterminate(Box::new(move || format!("{namespace} metrics")));

        let raw_metrics = source.list_metrics(namespace.as_ref()).await?;

        let total = raw_metrics.len() as u64;
        let processed = Arc::new(AtomicU64::new(0));
        progress.set_phase("Classifying");
        progress.set_determinate({
            let processed = Arc::clone(&processed);
            Box::new(move || (total, processed.load(Ordering::Relaxed), format!("{namespace} metrics")))
        });

        let needs_probe = namespace.rules().eligibility == Eligibility::QuotaProbe;
        let mut stats = ClassificationStats {
            listed: raw_metrics.len(),
            ..ClassificationStats::default()
        };

        for raw in &raw_metrics {
            let quota = if needs_probe {
                Some(self.probe(source, raw, window).await?)
            } else {
                None
            };

            match self.classify(namespace, Metric::from_raw(raw), quota.as_ref())? {
                Classification::Accepted { group, id, metric } => {
                    log::debug!(target: LOG_TARGET, "Metric supported: {id}");
                    stats.accepted += 1;

                    if catalog.insert(group, id.clone(), metric).is_some() {
                        log::debug!(target: LOG_TARGET, "Metric {id} appeared more than once in {group}, keeping the last one");
                        stats.replaced += 1;
                    }
                }

                Classification::Rejected { id, reason } => {
                    log::debug!(target: LOG_TARGET, "Metric unsupported: {id} ({reason:?})");
                    stats.rejected += 1;
                    if reason == Rejection::ProbeFailed {
                        stats.probe_failures += 1;
                    }
                }
            }

            let _ = processed.fetch_add(1, Ordering::Relaxed);
        }

        log::info!(
            target: LOG_TARGET,
            "{namespace}: {} listed, {} supported, {} unsupported",
            stats.listed,
            stats.accepted,
            stats.rejected
        );

        Ok(stats)
    }

    /// Run the quota probe for one metric, applying the probe error policy.
    async fn probe<A: MetricsApi>(&self, source: &MetricSource<A>, raw: &RawMetric, window: &ProbeWindow) -> Result<QuotaSupport> {
        match source.supports_quota_ratio(raw, window).await {
            QuotaSupport::Failed(e) => {
                let id = Metric::from_raw(raw).id();
                match self.probe_errors {
                    ProbeErrorPolicy::Fail => Err(e.enrich_with(|| format!("probing quota support of metric {id}"))),
                    ProbeErrorPolicy::Skip => {
                        log::warn!(target: LOG_TARGET, "Unexpected error probing metric {id}, leaving it out: {e:#}");
                        Ok(QuotaSupport::Failed(e))
                    }
                }
            }
            verdict => Ok(verdict),
        }
    }
}

fn check_eligibility(eligibility: Eligibility, metric: &Metric, quota: Option<&QuotaSupport>) -> Option<Rejection> {
    match eligibility {
        Eligibility::MetricName(name) => (metric.metric_name != name).then_some(Rejection::NameMismatch),
        Eligibility::QuotaProbe => match quota {
            Some(QuotaSupport::Supported) => None,
            Some(QuotaSupport::Failed(_)) => Some(Rejection::ProbeFailed),
            Some(QuotaSupport::Unsupported) | None => Some(Rejection::QuotaUnsupported),
        },
    }
}
