//! Technique table configuration.

/// What a table does when no row matches a key exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MissPolicy {
    /// Use the row with the most features that are all requested.
    /// Ties go to the row declared first.
    #[default]
    NearestSubset,
    /// Use row 0.
    DefaultRow,
    /// Return [`GraphicsError::TechniqueNotFound`](crate::GraphicsError::TechniqueNotFound).
    Strict,
}

/// Options applied when a technique table is built.
///
/// # Example
///
/// ```ignore
/// let config = TechniqueConfig::default().with_miss_policy(MissPolicy::Strict);
/// let table = TechniqueTable::<StandardFeatures>::build("Test", rows, config)?;
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TechniqueConfig {
    /// Lookup miss handling.
    pub miss_policy: MissPolicy,
    /// Log a warning the first time each missing key is resolved.
    pub warn_on_miss: bool,
}

impl TechniqueConfig {
    #[must_use]
    pub fn with_miss_policy(mut self, miss_policy: MissPolicy) -> Self {
        self.miss_policy = miss_policy;
        self
    }

    #[must_use]
    pub fn with_warn_on_miss(mut self, warn_on_miss: bool) -> Self {
        self.warn_on_miss = warn_on_miss;
        self
    }
}

impl Default for TechniqueConfig {
    fn default() -> Self {
        Self {
            miss_policy: MissPolicy::default(),
            warn_on_miss: true,
        }
    }
}
