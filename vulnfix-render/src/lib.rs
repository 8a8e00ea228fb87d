//! Rendering of the human-readable fix summary.
//!
//! Plain deterministic text: colorization and spinners belong to the CLI
//! layer, not here. Every outcome category is always enumerated; silence on
//! failures or skips is not acceptable output for this engine.

use std::collections::{BTreeMap, BTreeSet};
use vulnfix_types::{EcosystemResult, FailedToFix, FixMeta};

/// Build the `fix_summary` string for one run.
///
/// Sections appear in a fixed order (successes, unresolved, skipped,
/// counts); within a section, ecosystems iterate in map order and entities
/// in result order, so the output is reproducible.
pub fn render_fix_summary(
    results: &BTreeMap<String, EcosystemResult>,
    exceptions: &BTreeMap<String, FailedToFix>,
    meta: &FixMeta,
) -> String {
    let mut out = String::new();

    let fixed: Vec<_> = results.values().flat_map(|r| r.succeeded.iter()).collect();
    if !fixed.is_empty() {
        out.push_str("Successful fixes:\n\n");
        for entity in &fixed {
            out.push_str(&format!("  {}\n", entity.original.display_target()));
            for change in &entity.changes {
                let symbol = if change.success { '✔' } else { '✖' };
                out.push_str(&format!("    {symbol} {}\n", change.user_message));
            }
            out.push('\n');
        }
    }

    let failed: Vec<_> = results.values().flat_map(|r| r.failed.iter()).collect();
    if !failed.is_empty() || !exceptions.is_empty() {
        out.push_str("Unresolved items:\n\n");
        for entity in &failed {
            out.push_str(&format!("  {}\n", entity.original.display_target()));
            out.push_str(&format!("    ✖ {}\n", entity.error));
            if let Some(tip) = entity.error.tip() {
                out.push_str(&format!("    Tip: {tip}\n"));
            }
            out.push('\n');
        }
        for failure in exceptions.values() {
            for entity in &failure.originals {
                out.push_str(&format!("  {}\n", entity.display_target()));
                out.push_str(&format!("    ✖ {}\n", failure.user_message));
                out.push('\n');
            }
        }
    }

    let skipped: Vec<_> = results.values().flat_map(|r| r.skipped.iter()).collect();
    if !skipped.is_empty() {
        out.push_str("Skipped items:\n\n");
        for entity in &skipped {
            out.push_str(&format!("  {}\n", entity.original.display_target()));
            out.push_str(&format!("    {}\n", entity.reason));
            out.push('\n');
        }
    }

    out.push_str("Summary:\n\n");
    for (ecosystem, failure) in exceptions {
        out.push_str(&format!(
            "  {} {ecosystem} {} not fixed: {}\n",
            failure.originals.len(),
            plural(failure.originals.len(), "item was", "items were"),
            failure.user_message
        ));
    }
    if meta.failed > 0 {
        out.push_str(&format!(
            "  {} {} not fixed\n",
            meta.failed,
            plural(meta.failed, "item was", "items were")
        ));
    }
    out.push_str(&format!(
        "  {} {} successfully fixed\n",
        meta.fixed,
        plural(meta.fixed, "item was", "items were")
    ));
    out.push_str(&format!(
        "  {} {} successfully fixed\n",
        count_fixed_issues(results),
        plural(count_fixed_issues(results), "issue was", "issues were")
    ));

    out
}

/// Distinct issue ids across all successful change records.
fn count_fixed_issues(results: &BTreeMap<String, EcosystemResult>) -> usize {
    let ids: BTreeSet<&str> = results
        .values()
        .flat_map(|r| r.succeeded.iter())
        .flat_map(|entity| entity.changes.iter())
        .filter(|change| change.success)
        .flat_map(|change| change.issue_ids.iter().map(String::as_str))
        .collect();
    ids.len()
}

fn plural<'a>(count: usize, one: &'a str, many: &'a str) -> &'a str {
    if count == 1 { one } else { many }
}
