use super::{Catalog, Group, Metric, MetricId};
use serde::Serialize;
use std::collections::BTreeMap;

/// Metrics of one group bucketed by service name.
pub type ServiceBuckets<'a> = BTreeMap<&'a str, BTreeMap<&'a MetricId, &'a Metric>>;

/// Per-service view of a catalog, consumed by dashboard generators.
///
/// This view is derived from the groups and written next to them; it is never read back.
#[derive(Debug, Default, PartialEq, Eq, Serialize)]
pub struct DashboardData<'a> {
    pub usage: ServiceBuckets<'a>,
    pub trusted_advisor_regional: ServiceBuckets<'a>,
    pub trusted_advisor_global: ServiceBuckets<'a>,
}

impl<'a> DashboardData<'a> {
    #[must_use]
    pub fn from_catalog(catalog: &'a Catalog) -> Self {
        Self {
            usage: bucket(catalog, Group::Usage),
            trusted_advisor_regional: bucket(catalog, Group::TrustedAdvisorRegional),
            trusted_advisor_global: bucket(catalog, Group::TrustedAdvisorGlobal),
        }
    }
}

fn bucket(catalog: &Catalog, group: Group) -> ServiceBuckets<'_> {
    let service_dimension = group.service_dimension();
    let mut buckets = ServiceBuckets::new();

    for (id, metric) in catalog.group(group) {
        let service = metric.dimension(service_dimension).unwrap_or_default();
        let _ = buckets.entry(service).or_default().insert(id, metric);
    }

    buckets
}
