//! Version decision and upgrade execution for one migration key.

pub mod config;
mod pipeline;

pub use config::{CorruptVersionPolicy, DowngradePolicy, MigratorConfig};

use crate::core::{
    MigrationCase, MigrationError, MigrationOutcome, MigrationPlan, Result, StoredVersion, Version,
};
use crate::registry::MigrationRegistry;
use crate::storage::{KeyValueStore, read_version, write_version};
use pipeline::UpgradePipeline;

use std::cmp::Ordering;
use std::sync::Arc;
use tracing::{Instrument, Level, event, info_span};

/// Runs the registered upgrade steps of one migration key against a store.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use stepwise_migrate::{InMemoryStore, KeyValueStore, MigrationRegistry, Migrator};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> stepwise_migrate::Result<()> {
/// let registry = Arc::new(MigrationRegistry::new());
/// registry.register_sync_upgrade_step("settings", 2, || Ok(()))?;
///
/// let store = Arc::new(InMemoryStore::new());
/// store.set("BeautifulMigration.settings", "1".to_string()).await?;
///
/// let migrator = Migrator::new("settings", registry, store.clone());
/// let outcome = migrator.migrate(2).await?;
/// assert_eq!(outcome.steps_run(), &[2]);
/// assert_eq!(store.get("BeautifulMigration.settings").await?, Some("2".to_string()));
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Migrator {
    key: String,
    registry: Arc<MigrationRegistry>,
    store: Arc<dyn KeyValueStore>,
    config: MigratorConfig,
}

impl std::fmt::Debug for Migrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Migrator")
            .field("key", &self.key)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Migrator {
    pub fn new(
        key: impl Into<String>,
        registry: Arc<MigrationRegistry>,
        store: Arc<dyn KeyValueStore>,
    ) -> Self {
        Self::with_config(key, registry, store, MigratorConfig::default())
    }

    pub fn with_config(
        key: impl Into<String>,
        registry: Arc<MigrationRegistry>,
        store: Arc<dyn KeyValueStore>,
        config: MigratorConfig,
    ) -> Self {
        Self {
            key: key.into(),
            registry,
            store,
            config,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn config(&self) -> &MigratorConfig {
        &self.config
    }

    /// Reads the version recorded for this key.
    pub async fn previous_version(&self) -> Result<StoredVersion> {
        let storage_key = self.registry.storage_key(&self.key)?;
        read_version(self.store.as_ref(), &storage_key).await
    }

    /// Reports what [`migrate`](Self::migrate) would do, without running or writing anything.
    pub async fn plan(&self, current_version: Version) -> Result<MigrationPlan> {
        let storage_key = self.registry.storage_key(&self.key)?;
        let stored = read_version(self.store.as_ref(), &storage_key).await?;
        let case = decide(&stored, current_version);
        let pending_steps = match (&stored, case) {
            (StoredVersion::Recorded(previous), MigrationCase::Upgrade) => self
                .registry
                .pending_steps(&self.key, *previous, current_version)?
                .into_iter()
                .map(|(version, _)| version)
                .collect(),
            _ => Vec::new(),
        };

        Ok(MigrationPlan {
            storage_key,
            stored,
            current_version,
            case,
            pending_steps,
        })
    }

    /// Brings this key's data up to `current_version`.
    ///
    /// - nothing recorded: records `current_version`, runs no steps
    /// - same version: does nothing
    /// - newer version: runs the steps registered for `(previous, current]`
    ///   in ascending order, then records `current_version`
    /// - older version: handled by [`DowngradePolicy`]
    ///
    /// Step and storage errors are returned unchanged. When a step fails the
    /// recorded version stays at the previous one, so a retry runs the same
    /// range again.
    pub async fn migrate(&self, current_version: Version) -> Result<MigrationOutcome> {
        let span = info_span!(
            "migration.migrate",
            key = %self.key,
            current_version
        );
        self.migrate_inner(current_version).instrument(span).await
    }

    async fn migrate_inner(&self, current_version: Version) -> Result<MigrationOutcome> {
        let storage_key = self.registry.storage_key(&self.key)?;
        let stored = read_version(self.store.as_ref(), &storage_key).await?;
        let case = decide(&stored, current_version);
        event!(Level::INFO, case = %case, stored = ?stored, "migration case decided");

        match stored {
            StoredVersion::Absent => {
                write_version(self.store.as_ref(), &storage_key, current_version).await?;
                Ok(MigrationOutcome::FirstRun {
                    version: current_version,
                })
            }
            StoredVersion::Corrupt(raw) => match self.config.corrupt_version_policy {
                CorruptVersionPolicy::Fail => {
                    event!(
                        Level::ERROR,
                        storage_key = %storage_key,
                        raw = %raw,
                        "stored version is corrupt"
                    );
                    Err(MigrationError::CorruptVersion { storage_key, raw })
                }
                CorruptVersionPolicy::Ignore => {
                    event!(
                        Level::WARN,
                        storage_key = %storage_key,
                        raw = %raw,
                        "ignoring corrupt stored version"
                    );
                    Ok(MigrationOutcome::CorruptIgnored { raw })
                }
            },
            StoredVersion::Recorded(previous) => match current_version.cmp(&previous) {
                Ordering::Equal => Ok(MigrationOutcome::Unchanged {
                    version: previous,
                }),
                Ordering::Greater => {
                    let steps = self
                        .registry
                        .pending_steps(&self.key, previous, current_version)?;
                    let pipeline = UpgradePipeline::new(
                        &self.key,
                        &storage_key,
                        previous,
                        current_version,
                        steps,
                    );
                    let steps_run = pipeline.run(self.store.as_ref()).await?;
                    Ok(MigrationOutcome::Upgraded {
                        from: previous,
                        to: current_version,
                        steps_run,
                    })
                }
                Ordering::Less => match self.config.downgrade_policy {
                    DowngradePolicy::Ignore => Ok(MigrationOutcome::Downgraded {
                        from: previous,
                        to: current_version,
                    }),
                    DowngradePolicy::Fail => Err(MigrationError::Downgrade {
                        key: self.key.clone(),
                        previous,
                        current: current_version,
                    }),
                },
            },
        }
    }
}

fn decide(stored: &StoredVersion, current_version: Version) -> MigrationCase {
    match stored {
        StoredVersion::Absent => MigrationCase::FirstRun,
        StoredVersion::Corrupt(_) => MigrationCase::Corrupt,
        StoredVersion::Recorded(previous) => match current_version.cmp(previous) {
            Ordering::Equal => MigrationCase::Unchanged,
            Ordering::Greater => MigrationCase::Upgrade,
            Ordering::Less => MigrationCase::Downgrade,
        },
    }
}
