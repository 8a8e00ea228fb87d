use crate::ecosystems::EcosystemKind;
use futures::StreamExt;
use futures::stream;
use std::collections::BTreeMap;
use tracing::debug;
use vulnfix_render::render_fix_summary;
use vulnfix_types::{
    EcosystemResult, EntityToFix, FailedToFix, FixMeta, FixOptions, MISSING_TYPE, SkippedEntity,
};

/// Ecosystem dispatches running at once; further groups queue for a slot.
pub const ECOSYSTEM_CONCURRENCY: usize = 3;

/// Everything one fix run produced, as handed to the CLI layer.
#[derive(Debug)]
pub struct FixReport {
    /// Per-plugin outcomes, keyed by plugin id.
    pub results: BTreeMap<String, EcosystemResult>,
    /// Ecosystems that could not be attempted at all, keyed by the scanned
    /// ecosystem string.
    pub exceptions: BTreeMap<String, FailedToFix>,
    pub meta: FixMeta,
    pub fix_summary: String,
}

/// Fix a batch of entities.
///
/// Entities group by scanned ecosystem; groups dispatch concurrently (at
/// most [`ECOSYSTEM_CONCURRENCY`] in flight) and share no mutable state.
/// Each dispatch returns an immutable partial result; everything is folded
/// only after the stream drains. A failing ecosystem never disturbs its
/// siblings.
pub async fn fix(entities: Vec<EntityToFix>, options: FixOptions) -> FixReport {
    let groups = group_entities_by_ecosystem(entities);
    debug!("fixing {} ecosystem groups", groups.len());

    let options = &options;
    let mut settled: Vec<(String, Dispatched)> = stream::iter(
        groups.into_iter().map(|(ecosystem, group)| async move {
            let outcome = dispatch_group(&ecosystem, group, options).await;
            (ecosystem, outcome)
        }),
    )
    .buffer_unordered(ECOSYSTEM_CONCURRENCY)
    .collect()
    .await;
    // Completion order is whatever it is; fold in group order so the report
    // is reproducible.
    settled.sort_by(|(a, _), (b, _)| a.cmp(b));

    let mut results: BTreeMap<String, EcosystemResult> = BTreeMap::new();
    let mut exceptions: BTreeMap<String, FailedToFix> = BTreeMap::new();
    for (ecosystem, outcome) in settled {
        match outcome {
            Dispatched::Fixed { plugin_id, result } => {
                results.entry(plugin_id).or_default().merge(result);
            }
            Dispatched::Exception { failure } => {
                exceptions.insert(ecosystem, failure);
            }
        }
    }

    let meta = compute_meta(&results, &exceptions);
    let fix_summary = render_fix_summary(&results, &exceptions, &meta);
    FixReport {
        results,
        exceptions,
        meta,
        fix_summary,
    }
}

enum Dispatched {
    Fixed {
        plugin_id: String,
        result: EcosystemResult,
    },
    Exception {
        failure: FailedToFix,
    },
}

async fn dispatch_group(
    ecosystem: &str,
    group: Vec<EntityToFix>,
    options: &FixOptions,
) -> Dispatched {
    if ecosystem == MISSING_TYPE {
        let mut result = EcosystemResult::default();
        for entity in group {
            result.skipped.push(SkippedEntity {
                original: entity,
                reason: "project type is missing".to_string(),
            });
        }
        return Dispatched::Fixed {
            plugin_id: MISSING_TYPE.to_string(),
            result,
        };
    }

    match ecosystem.parse::<EcosystemKind>() {
        Ok(kind) => Dispatched::Fixed {
            plugin_id: kind.plugin_id().to_string(),
            result: kind.dispatch(group, options).await,
        },
        Err(err) => {
            debug!("failed to process {ecosystem}: {err}");
            Dispatched::Exception {
                failure: FailedToFix {
                    originals: group,
                    user_message: err.to_string(),
                },
            }
        }
    }
}

/// Group input entities by their scanned ecosystem string, preserving
/// submission order within each group. Entities with no ecosystem land in
/// the [`MISSING_TYPE`] bucket.
pub fn group_entities_by_ecosystem(
    entities: Vec<EntityToFix>,
) -> BTreeMap<String, Vec<EntityToFix>> {
    let mut groups: BTreeMap<String, Vec<EntityToFix>> = BTreeMap::new();
    for entity in entities {
        let ecosystem = entity
            .identity
            .ecosystem
            .clone()
            .unwrap_or_else(|| MISSING_TYPE.to_string());
        groups.entry(ecosystem).or_default().push(entity);
    }
    groups
}

fn compute_meta(
    results: &BTreeMap<String, EcosystemResult>,
    exceptions: &BTreeMap<String, FailedToFix>,
) -> FixMeta {
    let fixed = results.values().map(|r| r.succeeded.len()).sum();
    let failed = results.values().map(|r| r.failed.len()).sum::<usize>()
        + exceptions.values().map(|f| f.originals.len()).sum::<usize>();
    FixMeta { fixed, failed }
}
