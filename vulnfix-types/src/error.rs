use thiserror::Error;

/// Why one entity (or one handler group) could not be fixed.
///
/// Errors narrow to the smallest affected unit: an entity-level error fails
/// that entity, a handler-level error fails the entities routed to that
/// handler, and neither aborts sibling entities or ecosystems.
#[derive(Debug, Error)]
pub enum FixError {
    /// The entity carries no remediation advice.
    #[error("remediation data is required to apply fixes")]
    MissingRemediationData,

    /// The entity's identity names no target file.
    #[error("a target file name is required to apply fixes")]
    MissingFileName,

    /// The project classified to a handler that lives outside this engine.
    #[error("no handler available for {handler} projects")]
    HandlerUnavailable { handler: &'static str },

    /// A workspace read or write failed. Never retried; local file I/O is
    /// not treated as transient.
    #[error(transparent)]
    Workspace(#[from] anyhow::Error),
}

impl FixError {
    /// A remediation hint for the user, where one exists.
    pub fn tip(&self) -> Option<String> {
        match self {
            FixError::HandlerUnavailable { handler } => Some(format!(
                "{handler} projects are re-locked with the {handler} CLI, outside this engine"
            )),
            _ => None,
        }
    }
}
