use super::Namespace;
use crate::source::RawMetric;
use core::borrow::Borrow;
use core::fmt::{Display, Formatter};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use strum::{AsRefStr, EnumString};

/// Maximum length of a metric identifier, in characters.
pub const MAX_ID_CHARS: usize = 230;

/// Characters removed from metric identifiers.
const STRIPPED_ID_CHARS: [char; 4] = ['/', ' ', '(', ')'];

/// Aggregation applied when querying a metric's values.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display, EnumString, AsRefStr)]
pub enum Statistic {
    SampleCount,
    Average,
    Sum,
    Minimum,
    #[default]
    Maximum,
}

/// A CloudWatch metric as recorded in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metric {
    pub namespace: String,
    pub metric_name: String,

    /// An empty value in a catalog file reads as the default statistic.
    #[serde(deserialize_with = "deserialize_statistic")]
    pub statistic: Statistic,
    #[serde(default)]
    pub dimensions: BTreeMap<String, String>,
}

impl Metric {
    /// Build a metric from a record returned by the listing API.
    ///
    /// The statistic is left at its default; classification assigns the real one.
    #[must_use]
    pub fn from_raw(raw: &RawMetric) -> Self {
        Self {
            namespace: raw.namespace.clone(),
            metric_name: raw.metric_name.clone(),
            statistic: Statistic::default(),
            dimensions: raw
                .dimensions
                .iter()
                .map(|d| (d.name.clone(), d.value.clone()))
                .collect(),
        }
    }

    /// Derive the catalog identifier of this metric.
    ///
    /// The identifier is `{namespace}-{metric_name}-` followed by the dimension values in
    /// dimension-name order, minus any dimension the namespace excludes. Slashes, spaces and
    /// parentheses are removed and the result is capped at [`MAX_ID_CHARS`] characters.
    #[must_use]
    pub fn id(&self) -> MetricId {
        let excluded = Namespace::from_name(&self.namespace).map_or(&[][..], |ns| ns.rules().id_excluded_dimensions);

        let mut id = format!("{}-{}-", self.namespace, self.metric_name);
        for (name, value) in &self.dimensions {
            if !excluded.contains(&name.as_str()) {
                id.push_str(value);
            }
        }

        id.retain(|c| !STRIPPED_ID_CHARS.contains(&c));
        if let Some((cut, _)) = id.char_indices().nth(MAX_ID_CHARS) {
            id.truncate(cut);
        }

        MetricId(id)
    }

    /// Look up a dimension value by name.
    #[must_use]
    pub fn dimension(&self, name: &str) -> Option<&str> {
        self.dimensions.get(name).map(String::as_str)
    }
}

fn deserialize_statistic<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Statistic, D::Error> {
    let text = String::deserialize(deserializer)?;
    if text.is_empty() {
        return Ok(Statistic::default());
    }

    text.parse().map_err(|e| D::Error::custom(format!("invalid statistic '{text}': {e}")))
}

/// Key of a metric within a catalog group.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MetricId(String);

impl MetricId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for MetricId {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for MetricId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::RawDimension;

    fn metric(namespace: &str, name: &str, dimensions: &[(&str, &str)]) -> Metric {
        Metric {
            namespace: namespace.to_string(),
            metric_name: name.to_string(),
            statistic: Statistic::Maximum,
            dimensions: dimensions.iter().map(|(k, v)| ((*k).to_string(), (*v).to_string())).collect(),
        }
    }

    #[test]
    fn test_id_is_deterministic() {
        let m = metric("AWS/Usage", "ResourceCount", &[("Service", "EC2"), ("Resource", "vCPU")]);
        assert_eq!(m.id(), m.id());
        assert_eq!(m.id(), m.clone().id());
    }

    #[test]
    fn test_id_orders_values_by_dimension_name() {
        let m = metric(
            "AWS/Usage",
            "ResourceCount",
            &[("Type", "Resource"), ("Service", "EC2"), ("Resource", "vCPU"), ("Class", "Standard/OnDemand")],
        );

        // Class, Resource, Service, Type
        assert_eq!(m.id().as_str(), "AWSUsage-ResourceCount-StandardOnDemandvCPUEC2Resource");
    }

    #[test]
    fn test_id_ignores_dimension_insertion_order() {
        let raw_a = RawMetric {
            namespace: "AWS/Usage".to_string(),
            metric_name: "CallCount".to_string(),
            dimensions: vec![
                RawDimension::new("Service", "Logs"),
                RawDimension::new("Resource", "PutLogEvents"),
                RawDimension::new("Type", "API"),
            ],
        };
        let mut raw_b = raw_a.clone();
        raw_b.dimensions.reverse();

        assert_eq!(Metric::from_raw(&raw_a).id(), Metric::from_raw(&raw_b).id());
    }

    #[test]
    fn test_id_strips_separators() {
        let m = metric("AWS/Usage", "Resource Count", &[("Resource", "Lambda (Concurrent) Executions")]);
        assert_eq!(m.id().as_str(), "AWSUsage-ResourceCount-LambdaConcurrentExecutions");
    }

    #[test]
    fn test_id_without_dimensions() {
        let m = metric("AWS/Usage", "CallCount", &[]);
        assert_eq!(m.id().as_str(), "AWSUsage-CallCount-");
    }

    #[test]
    fn test_advisory_id_excludes_region() {
        let east = metric(
            "AWS/TrustedAdvisor",
            "ServiceLimitUsage",
            &[("Region", "us-east-1"), ("ServiceName", "EC2"), ("ServiceLimit", "On-Demand instances")],
        );
        let west = metric(
            "AWS/TrustedAdvisor",
            "ServiceLimitUsage",
            &[("Region", "eu-west-1"), ("ServiceName", "EC2"), ("ServiceLimit", "On-Demand instances")],
        );

        assert_eq!(east.id(), west.id());
        assert_eq!(east.id().as_str(), "AWSTrustedAdvisor-ServiceLimitUsage-On-DemandinstancesEC2");
    }

    #[test]
    fn test_usage_id_keeps_region() {
        let east = metric("AWS/Usage", "ResourceCount", &[("Region", "us-east-1"), ("Service", "EC2")]);
        let west = metric("AWS/Usage", "ResourceCount", &[("Region", "eu-west-1"), ("Service", "EC2")]);
        assert_ne!(east.id(), west.id());
    }

    #[test]
    fn test_unknown_namespace_excludes_nothing() {
        let m = metric("Custom/Thing", "Count", &[("Region", "us-east-1")]);
        assert_eq!(m.id().as_str(), "CustomThing-Count-us-east-1");
    }

    #[test]
    fn test_id_truncated_to_limit() {
        let long_value = "x".repeat(500);
        let m = metric("AWS/Usage", "ResourceCount", &[("Resource", &long_value)]);
        let id = m.id();

        assert_eq!(id.as_str().chars().count(), MAX_ID_CHARS);
        assert!(id.as_str().starts_with("AWSUsage-ResourceCount-xxx"));
    }

    #[test]
    fn test_id_truncation_respects_char_boundaries() {
        let long_value = "é".repeat(400);
        let m = metric("AWS/Usage", "ResourceCount", &[("Resource", &long_value)]);
        let id = m.id();

        assert_eq!(id.as_str().chars().count(), MAX_ID_CHARS);
        assert!(id.as_str().len() > MAX_ID_CHARS);
        assert!(id.as_str().ends_with('é'));
    }

    #[test]
    fn test_id_at_limit_is_not_truncated() {
        let prefix_len = "AWSUsage-ResourceCount-".len();
        let value = "y".repeat(MAX_ID_CHARS - prefix_len);
        let m = metric("AWS/Usage", "ResourceCount", &[("Resource", &value)]);
        assert_eq!(m.id().as_str().len(), MAX_ID_CHARS);
        assert!(m.id().as_str().ends_with('y'));
    }

    #[test]
    fn test_from_raw_copies_fields() {
        let raw = RawMetric {
            namespace: "AWS/Usage".to_string(),
            metric_name: "ResourceCount".to_string(),
            dimensions: vec![RawDimension::new("Service", "SNS"), RawDimension::new("Resource", "TopicCount")],
        };

        let m = Metric::from_raw(&raw);
        assert_eq!(m.namespace, "AWS/Usage");
        assert_eq!(m.metric_name, "ResourceCount");
        assert_eq!(m.statistic, Statistic::Maximum);
        assert_eq!(m.dimension("Service"), Some("SNS"));
        assert_eq!(m.dimension("Resource"), Some("TopicCount"));
        assert_eq!(m.dimension("Type"), None);
    }

    #[test]
    fn test_from_raw_later_duplicate_dimension_wins() {
        let raw = RawMetric {
            namespace: "AWS/Usage".to_string(),
            metric_name: "ResourceCount".to_string(),
            dimensions: vec![RawDimension::new("Service", "SNS"), RawDimension::new("Service", "SQS")],
        };

        let m = Metric::from_raw(&raw);
        assert_eq!(m.dimensions.len(), 1);
        assert_eq!(m.dimension("Service"), Some("SQS"));
    }

    #[test]
    fn test_statistic_parse_and_display() {
        assert_eq!("Sum".parse::<Statistic>().unwrap(), Statistic::Sum);
        assert_eq!(Statistic::SampleCount.to_string(), "SampleCount");
        assert!("sum".parse::<Statistic>().is_err());
    }

    #[test]
    fn test_metric_id_display() {
        let id = MetricId::new("AWSUsage-CallCount-");
        assert_eq!(id.to_string(), "AWSUsage-CallCount-");
    }
}
