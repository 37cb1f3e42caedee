pub mod error;
pub mod types;

pub use error::{MigrationError, Result};
pub use types::{MigrationCase, MigrationOutcome, MigrationPlan, StoredVersion, Version};
