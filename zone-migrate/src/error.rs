use thiserror::Error;

use crate::config::ConfigError;

/// Errors that stop a migration run.
///
/// Per-rule problems that only need a human to look at them are not errors;
/// they are returned as [`crate::review::ReviewEntry`] values instead.
#[derive(Debug, Error)]
pub enum MigrateError {
    /// A rule field is not a plain member list, which is how uncommitted
    /// candidate configuration shows up in exports.
    #[error(
        "rule '{rule}' has a malformed '{field}' field ({reason}); candidate config detected, commit or revert pending changes on the device before migrating"
    )]
    MalformedRuleStructure {
        rule: String,
        field: String,
        reason: String,
    },
    #[error(transparent)]
    Config(#[from] ConfigError),
}
