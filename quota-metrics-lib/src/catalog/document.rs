use super::{Group, Metric, MetricId};
use serde::Deserialize;
use std::collections::BTreeMap;
use strum::IntoEnumIterator;

const LOG_TARGET: &str = "   catalog";

/// The grouped collection of classified metrics.
///
/// Deserialization accepts documents with missing groups and ignores the derived
/// `dashboard_data` section; see [`super::store`] for the written form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    pub usage: BTreeMap<MetricId, Metric>,

    #[serde(default)]
    pub trusted_advisor_regional: BTreeMap<MetricId, Metric>,

    #[serde(default)]
    pub trusted_advisor_global: BTreeMap<MetricId, Metric>,
}

impl Catalog {
    #[must_use]
    pub const fn group(&self, group: Group) -> &BTreeMap<MetricId, Metric> {
        match group {
            Group::Usage => &self.usage,
            Group::TrustedAdvisorRegional => &self.trusted_advisor_regional,
            Group::TrustedAdvisorGlobal => &self.trusted_advisor_global,
        }
    }

    pub const fn group_mut(&mut self, group: Group) -> &mut BTreeMap<MetricId, Metric> {
        match group {
            Group::Usage => &mut self.usage,
            Group::TrustedAdvisorRegional => &mut self.trusted_advisor_regional,
            Group::TrustedAdvisorGlobal => &mut self.trusted_advisor_global,
        }
    }

    /// Insert a metric, returning the entry it replaced.
    pub fn insert(&mut self, group: Group, id: MetricId, metric: Metric) -> Option<Metric> {
        self.group_mut(group).insert(id, metric)
    }

    /// Total number of metrics across all groups.
    #[must_use]
    pub fn len(&self) -> usize {
        Group::iter().map(|g| self.group(g).len()).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        Group::iter().all(|g| self.group(g).is_empty())
    }

    /// Merge this freshly discovered catalog into a previously persisted one.
    ///
    /// Every fresh entry is inserted into the matching group of `existing`, replacing any
    /// entry with the same id. Entries only present in `existing` are kept. Without an
    /// existing catalog, the fresh catalog is returned unchanged.
    #[must_use]
    pub fn reconcile(self, existing: Option<Self>) -> Self {
        let Some(mut merged) = existing else {
            return self;
        };

        let mut fresh = self;
        for group in Group::iter() {
            let target = merged.group_mut(group);
            let before = target.len();
            let incoming = core::mem::take(fresh.group_mut(group));
            let incoming_len = incoming.len();
            target.extend(incoming);

            log::debug!(
                target: LOG_TARGET,
                "Merged {group}: {incoming_len} fresh, {before} existing, {} after merge",
                target.len()
            );
        }

        merged
    }

    /// Render the per-group counts for log and console messages.
    #[must_use]
    pub fn counts(&self) -> String {
        format!(
            "{} (AWS/TrustedAdvisor regional), {} (AWS/TrustedAdvisor global), {} (AWS/Usage)",
            self.trusted_advisor_regional.len(),
            self.trusted_advisor_global.len(),
            self.usage.len()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Statistic;

    fn metric(name: &str, statistic: Statistic) -> Metric {
        Metric {
            namespace: "AWS/Usage".to_string(),
            metric_name: name.to_string(),
            statistic,
            dimensions: BTreeMap::new(),
        }
    }

    fn catalog(entries: &[(Group, &str, Statistic)]) -> Catalog {
        let mut c = Catalog::default();
        for (group, name, statistic) in entries {
            let _ = c.insert(*group, MetricId::new(*name), metric(name, *statistic));
        }
        c
    }

    #[test]
    fn test_reconcile_without_existing_returns_fresh() {
        let fresh = catalog(&[(Group::Usage, "a", Statistic::Sum)]);
        assert_eq!(fresh.clone().reconcile(None), fresh);
    }

    #[test]
    fn test_reconcile_keeps_entries_missing_from_fresh() {
        let existing = catalog(&[
            (Group::Usage, "x", Statistic::Maximum),
            (Group::TrustedAdvisorRegional, "y", Statistic::Maximum),
            (Group::TrustedAdvisorGlobal, "z", Statistic::Maximum),
        ]);
        let fresh = catalog(&[(Group::Usage, "a", Statistic::Sum)]);

        let merged = fresh.reconcile(Some(existing.clone()));

        for group in Group::iter() {
            for (id, m) in existing.group(group) {
                assert_eq!(merged.group(group).get(id), Some(m), "lost {id} from {group}");
            }
        }
        assert!(merged.usage.contains_key("a"));
        assert_eq!(merged.len(), 4);
    }

    #[test]
    fn test_reconcile_fresh_replaces_conflicting_ids() {
        let existing = catalog(&[(Group::Usage, "a", Statistic::Maximum)]);
        let fresh = catalog(&[(Group::Usage, "a", Statistic::Sum)]);

        let merged = fresh.reconcile(Some(existing));
        assert_eq!(merged.usage.len(), 1);
        assert_eq!(merged.usage["a"].statistic, Statistic::Sum);
    }

    #[test]
    fn test_reconcile_does_not_move_entries_between_groups() {
        let existing = catalog(&[(Group::TrustedAdvisorRegional, "a", Statistic::Maximum)]);
        let fresh = catalog(&[(Group::TrustedAdvisorGlobal, "a", Statistic::Maximum)]);

        let merged = fresh.reconcile(Some(existing));
        assert!(merged.trusted_advisor_regional.contains_key("a"));
        assert!(merged.trusted_advisor_global.contains_key("a"));
    }

    #[test]
    fn test_reconcile_is_idempotent() {
        let existing = catalog(&[
            (Group::Usage, "x", Statistic::Maximum),
            (Group::TrustedAdvisorGlobal, "g", Statistic::Maximum),
        ]);
        let fresh = catalog(&[
            (Group::Usage, "a", Statistic::Sum),
            (Group::Usage, "x", Statistic::Sum),
            (Group::TrustedAdvisorRegional, "r", Statistic::Maximum),
        ]);

        let once = fresh.clone().reconcile(Some(existing));
        let twice = fresh.reconcile(Some(once.clone()));
        assert_eq!(once, twice);
    }

    #[test]
    fn test_len_and_is_empty() {
        let empty = Catalog::default();
        assert!(empty.is_empty());
        assert_eq!(empty.len(), 0);

        let c = catalog(&[(Group::Usage, "a", Statistic::Sum), (Group::TrustedAdvisorGlobal, "b", Statistic::Maximum)]);
        assert!(!c.is_empty());
        assert_eq!(c.len(), 2);
    }

    #[test]
    fn test_counts() {
        let c = catalog(&[
            (Group::Usage, "a", Statistic::Sum),
            (Group::Usage, "b", Statistic::Sum),
            (Group::TrustedAdvisorGlobal, "g", Statistic::Maximum),
        ]);
        assert_eq!(c.counts(), "0 (AWS/TrustedAdvisor regional), 1 (AWS/TrustedAdvisor global), 2 (AWS/Usage)");
    }
}
