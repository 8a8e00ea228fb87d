use crate::remediation::RemediationAdvice;
use crate::workspace::Workspace;
use camino::Utf8PathBuf;
use std::sync::Arc;

/// Bucket for entities whose scan result carries no ecosystem type.
pub const MISSING_TYPE: &str = "missing-type";

/// How a scanned project identifies itself: the ecosystem the scanner
/// reported and the manifest it was scanned from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Identity {
    pub ecosystem: Option<String>,
    pub target_file: Option<Utf8PathBuf>,
}

/// One project/manifest to act on.
///
/// Owned by the caller for the duration of one fix run and handed back inside
/// the outcome records. All file access goes through `workspace`, which is
/// rooted at the project's base directory.
#[derive(Debug, Clone)]
pub struct EntityToFix {
    pub workspace: Arc<dyn Workspace>,
    pub identity: Identity,
    pub remediation: Option<RemediationAdvice>,
}

impl EntityToFix {
    pub fn new(workspace: Arc<dyn Workspace>, identity: Identity) -> Self {
        Self {
            workspace,
            identity,
            remediation: None,
        }
    }

    pub fn with_remediation(mut self, remediation: RemediationAdvice) -> Self {
        self.remediation = Some(remediation);
        self
    }

    /// The target file for display purposes, e.g. in summaries and skip
    /// reasons.
    pub fn display_target(&self) -> &str {
        self.identity
            .target_file
            .as_ref()
            .map(|p| p.as_str())
            .unwrap_or("unknown target")
    }
}

/// Run-wide options, supplied by the (out of scope) CLI layer.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixOptions {
    /// Compute and report changes without writing any file.
    pub dry_run: bool,
    /// Suppress progress UI only; result data is never suppressed.
    pub quiet: bool,
}
