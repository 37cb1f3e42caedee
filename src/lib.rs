// ============================================================================
// stepwise-migrate Library
// ============================================================================
//
// Versioned upgrade steps for persisted key-value state. Steps are registered
// per migration key and target version; a `Migrator` compares the recorded
// version with the one the running code expects, runs the pending steps in
// order and records the new version only after all of them succeed.

pub mod core;
pub mod migrator;
pub mod registry;
pub mod storage;

// Re-export main types for convenience
pub use crate::core::{
    MigrationCase, MigrationError, MigrationOutcome, MigrationPlan, Result, StoredVersion,
    Version,
};
pub use migrator::{CorruptVersionPolicy, DowngradePolicy, Migrator, MigratorConfig};
pub use registry::{
    DEFAULT_STORAGE_KEY_PREFIX, MigrationRegistry, StorageKeyRetriever, UpgradeStep,
    prefixed_storage_key_retriever,
};
pub use storage::{FileStore, InMemoryStore, KeyValueStore};
