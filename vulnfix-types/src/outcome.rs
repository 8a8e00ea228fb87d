use crate::entity::EntityToFix;
use crate::error::FixError;
use serde::{Deserialize, Serialize};

/// Outcome of attempting one remediation instruction.
///
/// Records are appended as changes are applied and never edited afterwards.
/// `from`/`to` are `name@version` pairs using the casing found in the
/// manifest; they are absent on the aggregated record an entity receives
/// when a shared file was already fixed earlier in the run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeRecord {
    pub success: bool,
    pub user_message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
    #[serde(default)]
    pub issue_ids: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// An entity whose advice was applied, with the changes made.
#[derive(Debug, Clone)]
pub struct FixedEntity {
    pub original: EntityToFix,
    pub changes: Vec<ChangeRecord>,
}

/// An entity that could not be fixed, with the cause attached.
#[derive(Debug)]
pub struct FailedEntity {
    pub original: EntityToFix,
    pub error: FixError,
}

/// An entity this engine does not handle, with the reason.
#[derive(Debug, Clone)]
pub struct SkippedEntity {
    pub original: EntityToFix,
    pub reason: String,
}

/// The unit merged across handlers and ecosystems. Lists are append-only;
/// ancestors concatenate, never mutate, child results.
#[derive(Debug, Default)]
pub struct EcosystemResult {
    pub succeeded: Vec<FixedEntity>,
    pub failed: Vec<FailedEntity>,
    pub skipped: Vec<SkippedEntity>,
}

impl EcosystemResult {
    /// Concatenate another result into this one.
    pub fn merge(&mut self, other: EcosystemResult) {
        self.succeeded.extend(other.succeeded);
        self.failed.extend(other.failed);
        self.skipped.extend(other.skipped);
    }

    pub fn is_empty(&self) -> bool {
        self.succeeded.is_empty() && self.failed.is_empty() && self.skipped.is_empty()
    }
}

/// An ecosystem that could not be attempted at all, as opposed to individual
/// fixes failing: the whole group is captured with one user-facing message.
#[derive(Debug)]
pub struct FailedToFix {
    pub originals: Vec<EntityToFix>,
    pub user_message: String,
}

/// Entity-level totals for one fix run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FixMeta {
    pub fixed: usize,
    pub failed: usize,
}
