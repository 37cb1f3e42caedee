use crate::core::{Result, Version};
use crate::registry::UpgradeStep;
use crate::storage::{KeyValueStore, write_version};

use tracing::{Level, event};

enum Stage {
    /// Already satisfied; the chain starts from here.
    Start,
    Step { version: Version, step: UpgradeStep },
    /// Records the target version once every step has finished.
    Persist,
}

/// The linear chain run for one upgrade: start, each pending step in
/// ascending version order, then the write of the new version.
pub(crate) struct UpgradePipeline<'a> {
    key: &'a str,
    storage_key: &'a str,
    previous: Version,
    current: Version,
    stages: Vec<Stage>,
}

impl<'a> UpgradePipeline<'a> {
    /// `steps` must already be limited to `(previous, current]` and sorted.
    pub(crate) fn new(
        key: &'a str,
        storage_key: &'a str,
        previous: Version,
        current: Version,
        steps: Vec<(Version, UpgradeStep)>,
    ) -> Self {
        let mut stages = Vec::with_capacity(steps.len() + 2);
        stages.push(Stage::Start);
        stages.extend(
            steps
                .into_iter()
                .map(|(version, step)| Stage::Step { version, step }),
        );
        stages.push(Stage::Persist);

        Self {
            key,
            storage_key,
            previous,
            current,
            stages,
        }
    }

    /// Runs every stage strictly in order and returns the versions of the steps that ran.
    ///
    /// Stops at the first failing stage; nothing after it runs and the
    /// stored version is left as it was.
    pub(crate) async fn run(self, store: &dyn KeyValueStore) -> Result<Vec<Version>> {
        let mut steps_run = Vec::new();

        for stage in self.stages {
            match stage {
                Stage::Start => {}
                Stage::Step { version, step } => {
                    event!(Level::INFO, key = %self.key, version, "running upgrade step");
                    if let Err(err) = step.run().await {
                        event!(
                            Level::ERROR,
                            key = %self.key,
                            version,
                            error = %err,
                            "upgrade step failed"
                        );
                        return Err(err);
                    }
                    steps_run.push(version);
                }
                Stage::Persist => {
                    event!(
                        Level::INFO,
                        key = %self.key,
                        previous_version = self.previous,
                        current_version = self.current,
                        "recording migrated version"
                    );
                    if let Err(err) = write_version(store, self.storage_key, self.current).await {
                        event!(
                            Level::ERROR,
                            key = %self.key,
                            error = %err,
                            "recording migrated version failed"
                        );
                        return Err(err);
                    }
                }
            }
        }

        Ok(steps_run)
    }
}
