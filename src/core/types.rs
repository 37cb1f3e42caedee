use serde::{Deserialize, Serialize};

/// Schema/data version of one migration key.
pub type Version = u32;

/// What a store holds under a migration's storage key, once decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoredVersion {
    /// Nothing recorded yet (absent value, empty string or JSON `null`).
    Absent,
    /// A recorded version number.
    Recorded(Version),
    /// Valid JSON that is not a version number. Carries the raw stored text.
    Corrupt(String),
}

impl StoredVersion {
    pub fn version(&self) -> Option<Version> {
        match self {
            Self::Recorded(version) => Some(*version),
            _ => None,
        }
    }
}

/// Which of the migration cases applied to a `migrate` call.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MigrationCase {
    FirstRun,
    Unchanged,
    Upgrade,
    Downgrade,
    Corrupt,
}

impl MigrationCase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FirstRun => "first_run",
            Self::Unchanged => "unchanged",
            Self::Upgrade => "upgrade",
            Self::Downgrade => "downgrade",
            Self::Corrupt => "corrupt",
        }
    }
}

impl std::fmt::Display for MigrationCase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Report returned by a successful `migrate` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MigrationOutcome {
    /// No previous version existed; `version` was recorded and no steps ran.
    FirstRun { version: Version },
    /// The recorded version already matched.
    Unchanged { version: Version },
    /// Steps in `(from, to]` ran and `to` was recorded.
    Upgraded {
        from: Version,
        to: Version,
        steps_run: Vec<Version>,
    },
    /// The recorded version is newer than the requested one. Nothing changed.
    Downgraded { from: Version, to: Version },
    /// The stored marker was unreadable and the migrator was told to ignore it.
    CorruptIgnored { raw: String },
}

impl MigrationOutcome {
    pub fn case(&self) -> MigrationCase {
        match self {
            Self::FirstRun { .. } => MigrationCase::FirstRun,
            Self::Unchanged { .. } => MigrationCase::Unchanged,
            Self::Upgraded { .. } => MigrationCase::Upgrade,
            Self::Downgraded { .. } => MigrationCase::Downgrade,
            Self::CorruptIgnored { .. } => MigrationCase::Corrupt,
        }
    }

    /// Versions of the upgrade steps that ran, in execution order.
    pub fn steps_run(&self) -> &[Version] {
        match self {
            Self::Upgraded { steps_run, .. } => steps_run,
            _ => &[],
        }
    }
}

/// Dry-run view of what `migrate` would do, computed without side effects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationPlan {
    pub storage_key: String,
    pub stored: StoredVersion,
    pub current_version: Version,
    pub case: MigrationCase,
    /// Versions of the registered steps that an upgrade would run.
    pub pending_steps: Vec<Version>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcome_reports_case_and_steps() {
        let upgraded = MigrationOutcome::Upgraded {
            from: 0,
            to: 3,
            steps_run: vec![1, 3],
        };
        assert_eq!(upgraded.case(), MigrationCase::Upgrade);
        assert_eq!(upgraded.steps_run(), &[1, 3]);

        let first = MigrationOutcome::FirstRun { version: 3 };
        assert_eq!(first.case(), MigrationCase::FirstRun);
        assert!(first.steps_run().is_empty());
    }

    #[test]
    fn stored_version_only_exposes_recorded_numbers() {
        assert_eq!(StoredVersion::Recorded(0).version(), Some(0));
        assert_eq!(StoredVersion::Absent.version(), None);
        assert_eq!(StoredVersion::Corrupt("\"x\"".into()).version(), None);
    }

    #[test]
    fn case_serializes_snake_case() {
        let json = serde_json::to_string(&MigrationCase::FirstRun).unwrap();
        assert_eq!(json, "\"first_run\"");
    }
}
