use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use stepwise_migrate::{
    DEFAULT_STORAGE_KEY_PREFIX, FileStore, KeyValueStore, MigrationCase, MigrationRegistry,
    Migrator, StoredVersion, storage::write_version,
};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "marker-tool")]
#[command(about = "Inspect and edit recorded migration versions in a file-backed store")]
struct Cli {
    /// Path of the JSON store file
    #[arg(long, global = true, default_value = "migrations.json")]
    store: PathBuf,

    /// Namespace used to derive storage keys
    #[arg(long, global = true, default_value = DEFAULT_STORAGE_KEY_PREFIX)]
    prefix: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the recorded version of a key, or of every key in the store
    Show {
        #[arg(long)]
        key: Option<String>,
    },
    /// Overwrite the recorded version of a key
    Set {
        #[arg(long)]
        key: String,
        #[arg(long)]
        version: u32,
    },
    /// Forget the recorded version so the next migrate is a first run
    Clear {
        #[arg(long)]
        key: String,
    },
    /// Report which case a migrate to `current` would take
    Check {
        #[arg(long)]
        key: String,
        #[arg(long)]
        current: u32,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let store = Arc::new(
        FileStore::open(&cli.store)
            .await
            .with_context(|| format!("Failed to open store '{}'", cli.store.display()))?,
    );
    let registry = Arc::new(MigrationRegistry::with_key_prefix(cli.prefix.clone()));

    match cli.command {
        Command::Show { key: Some(key) } => show_key(&registry, store, &key).await,
        Command::Show { key: None } => show_all(&store).await,
        Command::Set { key, version } => {
            let storage_key = registry.storage_key(&key)?;
            write_version(&*store, &storage_key, version)
                .await
                .with_context(|| format!("Failed to record version for '{}'", key))?;
            println!("{} = {}", storage_key, version);
            Ok(())
        }
        Command::Clear { key } => {
            let storage_key = registry.storage_key(&key)?;
            store
                .remove(&storage_key)
                .await
                .with_context(|| format!("Failed to clear '{}'", storage_key))?;
            println!("Cleared {}", storage_key);
            Ok(())
        }
        Command::Check { key, current } => check(registry, store, &key, current).await,
    }
}

async fn show_key(
    registry: &Arc<MigrationRegistry>,
    store: Arc<FileStore>,
    key: &str,
) -> Result<()> {
    let migrator = Migrator::new(key, registry.clone(), store);
    let stored = migrator.previous_version().await?;
    let storage_key = registry.storage_key(key)?;
    println!("{} = {}", storage_key, describe(&stored));
    Ok(())
}

async fn show_all(store: &FileStore) -> Result<()> {
    let entries = store.entries().await;
    if entries.is_empty() {
        println!("No versions recorded in '{}'", store.path().display());
        return Ok(());
    }
    for (storage_key, raw) in entries {
        println!("{} = {}", storage_key, raw);
    }
    Ok(())
}

async fn check(
    registry: Arc<MigrationRegistry>,
    store: Arc<FileStore>,
    key: &str,
    current: u32,
) -> Result<()> {
    let plan = Migrator::new(key, registry, store).plan(current).await?;
    let summary = match plan.case {
        MigrationCase::FirstRun => format!("first run: would record {}", current),
        MigrationCase::Unchanged => "unchanged: nothing to do".to_string(),
        MigrationCase::Upgrade => format!(
            "upgrade: {} -> {}",
            describe(&plan.stored),
            current
        ),
        MigrationCase::Downgrade => format!(
            "downgrade: recorded {} is newer than {}",
            describe(&plan.stored),
            current
        ),
        MigrationCase::Corrupt => {
            return Err(anyhow!(
                "{} holds a value that is not a version: {}",
                plan.storage_key,
                describe(&plan.stored)
            ));
        }
    };
    println!("{}: {}", plan.storage_key, summary);
    Ok(())
}

fn describe(stored: &StoredVersion) -> String {
    match stored {
        StoredVersion::Absent => "<none>".to_string(),
        StoredVersion::Recorded(version) => version.to_string(),
        StoredVersion::Corrupt(raw) => raw.clone(),
    }
}
