use strum::{AsRefStr, Display, EnumIter};

/// A logical section of the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display, AsRefStr, EnumIter)]
#[strum(serialize_all = "snake_case")]
pub enum Group {
    /// Metrics from the usage namespace.
    Usage,

    /// Region-scoped advisory limits.
    TrustedAdvisorRegional,

    /// Advisory limits that are not tied to a region.
    TrustedAdvisorGlobal,
}

impl Group {
    /// Dimension naming the service a metric of this group belongs to.
    #[must_use]
    pub const fn service_dimension(self) -> &'static str {
        match self {
            Self::Usage => "Service",
            Self::TrustedAdvisorRegional | Self::TrustedAdvisorGlobal => "ServiceName",
        }
    }
}
