//! Npm ecosystem dispatch contract.
//!
//! No npm remediation happens in-engine: manifests classify to a handler
//! that lives in external tooling, so routed entities fail loudly instead of
//! being dropped, and anything else is skipped. This keeps multi-ecosystem
//! batches honest about what was and was not attempted.

use tracing::{debug, warn};
use vulnfix_types::{
    EcosystemResult, EntityToFix, FailedEntity, FixError, FixOptions, SkippedEntity,
};

pub async fn fix_npm(entities: Vec<EntityToFix>, _options: &FixOptions) -> EcosystemResult {
    debug!("preparing to fix {} npm projects", entities.len());
    let mut result = EcosystemResult::default();

    for entity in entities {
        let is_npm_manifest = entity
            .identity
            .target_file
            .as_deref()
            .and_then(|t| t.file_name())
            .is_some_and(|name| name == "package.json" || name == "package-lock.json");
        if is_npm_manifest {
            warn!("no handler available for npm projects; {} not fixed", entity.display_target());
            result.failed.push(FailedEntity {
                original: entity,
                error: FixError::HandlerUnavailable { handler: "npm" },
            });
        } else {
            let reason = format!("{} is not supported", entity.display_target());
            result.skipped.push(SkippedEntity {
                original: entity,
                reason,
            });
        }
    }
    result
}
