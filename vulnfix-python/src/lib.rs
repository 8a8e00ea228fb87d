//! Python ecosystem dispatch for vulnfix.
//!
//! Classifies entities by their target manifest, routes each group to its
//! handler, and merges the per-handler outcomes into one ecosystem result.
//! Only the requirements family is fixed in-engine; Pipfile and poetry
//! projects are re-locked by external package managers and fail loudly
//! rather than being dropped.

mod classify;
mod requirements;
mod resolve;

pub use classify::{HandlerKind, classify, is_requirements_txt};
pub use requirements::fix_requirements;
pub use resolve::{PinningFile, select_file_for_pinning};

use std::collections::BTreeMap;
use tracing::{debug, warn};
use vulnfix_types::{EcosystemResult, EntityToFix, FailedEntity, FixError, FixOptions, SkippedEntity};

/// Fix all python entities: classify, dispatch per handler, merge.
pub async fn fix_python(entities: Vec<EntityToFix>, options: &FixOptions) -> EcosystemResult {
    debug!("preparing to fix {} python projects", entities.len());
    let mut result = EcosystemResult::default();

    let mut groups: BTreeMap<HandlerKind, Vec<EntityToFix>> = BTreeMap::new();
    for entity in entities {
        match classify(&entity) {
            Some(kind) => groups.entry(kind).or_default().push(entity),
            None => {
                debug!(
                    "skipping {}: not a supported python project",
                    entity.display_target()
                );
                let reason = format!("{} is not supported", entity.display_target());
                result.skipped.push(SkippedEntity {
                    original: entity,
                    reason,
                });
            }
        }
    }

    for (kind, group) in groups {
        match kind {
            HandlerKind::Requirements => {
                result.merge(fix_requirements(group, options).await);
            }
            // A handler that cannot start must not silently drop entities:
            // the whole group is recorded failed.
            HandlerKind::Pipenv | HandlerKind::Poetry => {
                warn!(
                    "no handler available for {} projects; {} entities not fixed",
                    kind.as_str(),
                    group.len()
                );
                for entity in group {
                    result.failed.push(FailedEntity {
                        original: entity,
                        error: FixError::HandlerUnavailable {
                            handler: kind.as_str(),
                        },
                    });
                }
            }
        }
    }
    result
}
