use super::{Group, Metric, Statistic};
use strum::{AsRefStr, Display, EnumIter, EnumString};

/// Name of the only advisory metric that tracks a service limit.
const SERVICE_LIMIT_USAGE: &str = "ServiceLimitUsage";

/// Dimension carrying the region of an advisory metric.
const REGION_DIMENSION: &str = "Region";

/// Region value the advisory namespace uses for limits that are not region-scoped.
const GLOBAL_REGION: &str = "-";

/// A CloudWatch namespace the tool knows how to classify.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, AsRefStr, EnumIter)]
pub enum Namespace {
    #[strum(serialize = "AWS/Usage")]
    Usage,

    #[strum(serialize = "AWS/TrustedAdvisor")]
    TrustedAdvisor,
}

/// How a metric earns a place in the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Eligibility {
    /// The remote service must be able to compute a quota percentage for the metric.
    QuotaProbe,

    /// The metric name must match exactly.
    MetricName(&'static str),
}

/// How the statistic of an admitted metric is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatisticRule {
    /// Look `(Service, Resource)` up in the configured override table, falling back to the
    /// configured default statistic.
    ServiceResourceOverrides,

    /// Always use this statistic.
    Fixed(Statistic),
}

/// Which catalog group an admitted metric belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupRule {
    Fixed(Group),

    /// Split on a dimension that must be present: `global_value` selects `global`, anything
    /// else selects `regional`.
    SplitByDimension {
        dimension: &'static str,
        global_value: &'static str,
        global: Group,
        regional: Group,
    },
}

impl GroupRule {
    /// Resolve the group of a metric.
    ///
    /// Returns the name of the missing dimension when the rule cannot be applied.
    pub fn resolve(self, metric: &Metric) -> Result<Group, &'static str> {
        match self {
            Self::Fixed(group) => Ok(group),
            Self::SplitByDimension {
                dimension,
                global_value,
                global,
                regional,
            } => match metric.dimension(dimension) {
                Some(value) if value == global_value => Ok(global),
                Some(_) => Ok(regional),
                None => Err(dimension),
            },
        }
    }
}

/// The classification strategy of one namespace.
#[derive(Debug)]
pub struct NamespaceRules {
    pub eligibility: Eligibility,
    pub statistic: StatisticRule,
    pub group: GroupRule,

    /// Dimensions left out when deriving metric identifiers.
    pub id_excluded_dimensions: &'static [&'static str],
}

static USAGE_RULES: NamespaceRules = NamespaceRules {
    eligibility: Eligibility::QuotaProbe,
    statistic: StatisticRule::ServiceResourceOverrides,
    group: GroupRule::Fixed(Group::Usage),
    id_excluded_dimensions: &[],
};

static TRUSTED_ADVISOR_RULES: NamespaceRules = NamespaceRules {
    eligibility: Eligibility::MetricName(SERVICE_LIMIT_USAGE),
    statistic: StatisticRule::Fixed(Statistic::Maximum),
    group: GroupRule::SplitByDimension {
        dimension: REGION_DIMENSION,
        global_value: GLOBAL_REGION,
        global: Group::TrustedAdvisorGlobal,
        regional: Group::TrustedAdvisorRegional,
    },
    id_excluded_dimensions: &[REGION_DIMENSION],
};

impl Namespace {
    #[must_use]
    pub const fn rules(self) -> &'static NamespaceRules {
        match self {
            Self::Usage => &USAGE_RULES,
            Self::TrustedAdvisor => &TRUSTED_ADVISOR_RULES,
        }
    }

    /// Map a CloudWatch namespace name to a known namespace.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        name.parse().ok()
    }
}
