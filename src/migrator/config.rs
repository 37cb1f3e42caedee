/// What `migrate` does when the stored marker is not a version number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CorruptVersionPolicy {
    /// Return [`MigrationError::CorruptVersion`](crate::MigrationError::CorruptVersion).
    #[default]
    Fail,
    /// Log a warning and report success without touching the store.
    Ignore,
}

/// What `migrate` does when the requested version is older than the recorded one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DowngradePolicy {
    /// Succeed without running steps or writing.
    #[default]
    Ignore,
    /// Return [`MigrationError::Downgrade`](crate::MigrationError::Downgrade).
    Fail,
}

/// Migrator configuration
///
/// ```
/// use stepwise_migrate::{CorruptVersionPolicy, DowngradePolicy, MigratorConfig};
///
/// let config = MigratorConfig::new()
///     .corrupt_version_policy(CorruptVersionPolicy::Ignore)
///     .downgrade_policy(DowngradePolicy::Fail);
/// assert_eq!(config.downgrade_policy, DowngradePolicy::Fail);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigratorConfig {
    pub corrupt_version_policy: CorruptVersionPolicy,
    pub downgrade_policy: DowngradePolicy,
}

impl MigratorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the policy for unreadable stored markers
    pub fn corrupt_version_policy(mut self, policy: CorruptVersionPolicy) -> Self {
        self.corrupt_version_policy = policy;
        self
    }

    /// Set the policy for downgrades
    pub fn downgrade_policy(mut self, policy: DowngradePolicy) -> Self {
        self.downgrade_policy = policy;
        self
    }
}
