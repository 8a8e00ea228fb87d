//! The pip requirements fix handler.
//!
//! Entities are processed sequentially, root manifests first, against one
//! shared `FileState`: that ordering is what guarantees a physical file
//! referenced by several entities is rewritten once, with later entities
//! seeing (and crediting) the fix instead of repeating it.

use crate::classify::is_requirements_txt;
use crate::resolve::{FileState, fixed_file_name, resolve_targets};
use camino::Utf8Path;
use tracing::debug;
use vulnfix_rewrite::{
    Rewritten, normalize_package_name, parse_requirements, update_dependencies,
    upgrade_dependencies,
};
use vulnfix_types::{
    ChangeRecord, EcosystemResult, EntityToFix, FailedEntity, FixError, FixOptions, FixedEntity,
    RemediationAdvice, SkippedEntity,
};

/// Fix every requirements-family entity in the group. Entities that are not
/// `*.txt` manifests are skipped; a failure in one entity never aborts the
/// rest.
pub async fn fix_requirements(entities: Vec<EntityToFix>, options: &FixOptions) -> EcosystemResult {
    debug!(
        "preparing to fix {} requirements.txt projects",
        entities.len()
    );
    let mut result = EcosystemResult::default();

    let mut fixable: Vec<EntityToFix> = Vec::new();
    for entity in entities {
        match &entity.identity.target_file {
            Some(target) if is_requirements_txt(target) => fixable.push(entity),
            _ => {
                let reason = format!("{} is not supported", entity.display_target());
                result.skipped.push(SkippedEntity {
                    original: entity,
                    reason,
                });
            }
        }
    }
    sort_root_first(&mut fixable);

    let mut state = FileState::default();
    for entity in fixable {
        match fix_entity(&entity, options, &mut state).await {
            Ok(changes) => result.succeeded.push(FixedEntity {
                original: entity,
                changes,
            }),
            Err(error) => {
                debug!("failed to fix {}: {error}", entity.display_target());
                result.failed.push(FailedEntity {
                    original: entity,
                    error,
                });
            }
        }
    }
    result
}

/// Entry manifests claim shared files before the projects that include
/// them: ascending path depth, ties broken lexicographically.
fn sort_root_first(entities: &mut [EntityToFix]) {
    entities.sort_by_key(|entity| {
        entity
            .identity
            .target_file
            .as_ref()
            .map(|target| (target.components().count(), target.to_string()))
            .unwrap_or((usize::MAX, String::new()))
    });
}

async fn fix_entity(
    entity: &EntityToFix,
    options: &FixOptions,
    state: &mut FileState,
) -> Result<Vec<ChangeRecord>, FixError> {
    let target = entity
        .identity
        .target_file
        .clone()
        .ok_or(FixError::MissingFileName)?;
    let advice = entity
        .remediation
        .as_ref()
        .ok_or(FixError::MissingRemediationData)?;
    let workspace = entity.workspace.as_ref();

    // An earlier entity already fixed this manifest this run; credit the
    // shared fix instead of processing again.
    if state.was_written(&target) {
        return Ok(vec![fixed_through_record(&target, advice.issue_ids())]);
    }

    let resolved = resolve_targets(workspace, &target, advice, state).await?;

    let mut upgrades = Vec::new();
    let mut pins = Vec::new();
    let mut shared_refs = Vec::new();
    for file in resolved.files {
        let current = state.read(workspace, &file.path).await?;
        let rewritten = if file.allow_pins {
            update_dependencies(&current, &file.advice)
        } else {
            upgrade_dependencies(&current, &file.advice)
        };
        if rewritten.is_unchanged() {
            if state.was_written(&file.path)
                && let Some(record) = reflected_record(&current, &file.path, advice)
            {
                shared_refs.push(record);
            }
            continue;
        }

        let Rewritten {
            manifest,
            upgrades: file_upgrades,
            pins: file_pins,
        } = rewritten;
        if !options.dry_run {
            workspace
                .write_file(&fixed_file_name(&file.path), &manifest)
                .await?;
        } else {
            debug!("dry-run: not writing {}", fixed_file_name(&file.path));
        }
        state.record_written(file.path.clone(), manifest);

        let own_file = file.path == target;
        upgrades.extend(annotate(file_upgrades, own_file, &file.path));
        pins.extend(annotate(file_pins, own_file, &file.path));
    }

    let mut changes = upgrades;
    changes.extend(shared_refs);
    changes.extend(pins);
    Ok(changes)
}

/// Suffix records for files other than the entity's own target with the
/// path the change actually landed in.
fn annotate(records: Vec<ChangeRecord>, own_file: bool, path: &Utf8Path) -> Vec<ChangeRecord> {
    if own_file {
        return records;
    }
    records
        .into_iter()
        .map(|mut record| {
            record.user_message = format!("{} in {path}", record.user_message);
            record
        })
        .collect()
}

fn fixed_through_record(path: &Utf8Path, issue_ids: Vec<String>) -> ChangeRecord {
    ChangeRecord {
        success: true,
        user_message: format!("Fixed through {path}"),
        from: None,
        to: None,
        issue_ids,
        reason: None,
    }
}

/// The record an entity gets for a shared file fixed earlier in the run, if
/// any of its advice is actually reflected there: an upgraded declaration at
/// the advised version, or a pin for one of its transitive entries.
fn reflected_record(
    contents: &str,
    path: &Utf8Path,
    advice: &RemediationAdvice,
) -> Option<ChangeRecord> {
    let declared: std::collections::BTreeMap<String, Vec<String>> = parse_requirements(contents)
        .into_iter()
        .fold(Default::default(), |mut map, req| {
            map.entry(normalize_package_name(&req.name))
                .or_default()
                .push(req.version);
            map
        });

    let mut issue_ids = Vec::new();
    let mut reflected = false;
    for entry in advice.iter() {
        let name = normalize_package_name(&entry.installed.name);
        let Some(versions) = declared.get(&name) else {
            continue;
        };
        let upgraded = versions
            .iter()
            .any(|v| v == &entry.instruction.upgrade_to.version);
        if upgraded || entry.instruction.is_transitive {
            reflected = true;
            issue_ids.extend(entry.instruction.vulns.iter().cloned());
        }
    }
    reflected.then(|| fixed_through_record(path, issue_ids))
}
