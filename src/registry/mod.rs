//! Registered upgrade steps and the storage-key retriever.
//!
//! A registry maps each migration key to its steps, indexed by the version
//! each step upgrades *to*. Versions without a step are simply missing from
//! the map. Registration and retriever swaps take `&self`, so a registry
//! shared as `Arc<MigrationRegistry>` can still be extended; later `migrate`
//! calls see the change.

use crate::core::{Result, Version};

use futures::FutureExt;
use futures::future::{self, BoxFuture};
use std::collections::{BTreeMap, HashMap};
use std::future::Future;
use std::ops::Bound;
use std::sync::{Arc, RwLock};

/// Namespace used by the default storage-key retriever.
pub const DEFAULT_STORAGE_KEY_PREFIX: &str = "BeautifulMigration";

/// Maps a migration key to the key its version is stored under.
pub type StorageKeyRetriever = Arc<dyn Fn(&str) -> String + Send + Sync>;

type UpgradeStepFn = Arc<dyn Fn() -> BoxFuture<'static, Result<()>> + Send + Sync>;

/// One unit of upgrade work. Cheap to clone.
#[derive(Clone)]
pub struct UpgradeStep {
    run: UpgradeStepFn,
}

impl std::fmt::Debug for UpgradeStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpgradeStep").finish_non_exhaustive()
    }
}

impl UpgradeStep {
    /// Wraps an async step. The future is created when the step starts.
    pub fn from_async<F, Fut>(step: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        Self {
            run: Arc::new(move || step().boxed()),
        }
    }

    /// Wraps a synchronous step; its result is handed on as an already-complete future.
    pub fn from_sync<F>(step: F) -> Self
    where
        F: Fn() -> Result<()> + Send + Sync + 'static,
    {
        Self {
            run: Arc::new(move || future::ready(step()).boxed()),
        }
    }

    /// Starts the step.
    pub fn run(&self) -> BoxFuture<'static, Result<()>> {
        (self.run)()
    }
}

/// Builds the default retriever: `"<prefix>.<key>"`.
pub fn prefixed_storage_key_retriever(prefix: impl Into<String>) -> StorageKeyRetriever {
    let prefix = prefix.into();
    Arc::new(move |key: &str| format!("{}.{}", prefix, key))
}

pub struct MigrationRegistry {
    steps: RwLock<HashMap<String, BTreeMap<Version, UpgradeStep>>>,
    retriever: RwLock<StorageKeyRetriever>,
}

impl Default for MigrationRegistry {
    fn default() -> Self {
        Self::with_key_prefix(DEFAULT_STORAGE_KEY_PREFIX)
    }
}

impl std::fmt::Debug for MigrationRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let keys = self
            .steps
            .read()
            .map(|steps| steps.keys().cloned().collect::<Vec<_>>())
            .unwrap_or_default();
        f.debug_struct("MigrationRegistry")
            .field("keys", &keys)
            .finish_non_exhaustive()
    }
}

impl MigrationRegistry {
    /// Creates an empty registry with the default `BeautifulMigration.<key>` retriever.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty registry whose default retriever uses `prefix` as namespace.
    pub fn with_key_prefix(prefix: impl Into<String>) -> Self {
        Self {
            steps: RwLock::new(HashMap::new()),
            retriever: RwLock::new(prefixed_storage_key_retriever(prefix)),
        }
    }

    /// Registers `step` as the upgrade to `version` for `key`.
    ///
    /// Registering the same `(key, version)` again replaces the earlier step.
    pub fn register(
        &self,
        key: impl Into<String>,
        version: Version,
        step: UpgradeStep,
    ) -> Result<()> {
        let mut steps = self.steps.write()?;
        steps.entry(key.into()).or_default().insert(version, step);
        Ok(())
    }

    /// Registers an async upgrade step.
    pub fn register_upgrade_step<F, Fut>(
        &self,
        key: impl Into<String>,
        version: Version,
        step: F,
    ) -> Result<()>
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        self.register(key, version, UpgradeStep::from_async(step))
    }

    /// Registers a synchronous upgrade step.
    pub fn register_sync_upgrade_step<F>(
        &self,
        key: impl Into<String>,
        version: Version,
        step: F,
    ) -> Result<()>
    where
        F: Fn() -> Result<()> + Send + Sync + 'static,
    {
        self.register(key, version, UpgradeStep::from_sync(step))
    }

    /// Replaces the storage-key retriever for every later lookup.
    pub fn set_storage_key_retriever<F>(&self, retriever: F) -> Result<()>
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        *self.retriever.write()? = Arc::new(retriever);
        Ok(())
    }

    /// Storage key for `key` under the current retriever.
    pub fn storage_key(&self, key: &str) -> Result<String> {
        let retriever = self.retriever.read()?.clone();
        Ok(retriever(key))
    }

    /// Steps for `key` with a version in `(previous, current]`, ascending.
    pub fn pending_steps(
        &self,
        key: &str,
        previous: Version,
        current: Version,
    ) -> Result<Vec<(Version, UpgradeStep)>> {
        if current <= previous {
            return Ok(Vec::new());
        }

        let steps = self.steps.read()?;
        let pending = steps
            .get(key)
            .map(|by_version| {
                by_version
                    .range((Bound::Excluded(previous), Bound::Included(current)))
                    .map(|(version, step)| (*version, step.clone()))
                    .collect()
            })
            .unwrap_or_default();
        Ok(pending)
    }

    /// Registered versions for `key`, ascending.
    pub fn registered_versions(&self, key: &str) -> Result<Vec<Version>> {
        let steps = self.steps.read()?;
        Ok(steps
            .get(key)
            .map(|by_version| by_version.keys().copied().collect())
            .unwrap_or_default())
    }

    pub fn has_steps(&self, key: &str) -> Result<bool> {
        let steps = self.steps.read()?;
        Ok(steps.get(key).is_some_and(|by_version| !by_version.is_empty()))
    }
}
