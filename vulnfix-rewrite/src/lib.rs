//! Pure text rewriting for pip requirements manifests.
//!
//! Responsibilities:
//! - Parse dependency declarations out of requirements-family files.
//! - Substitute version tokens for upgrade instructions, preserving the
//!   comparator, extras, markers and comments as written.
//! - Append pin lines for transitive dependencies with no declaration.
//!
//! Output reproduces the input byte-for-byte except for touched declaration
//! lines and appended pins; the trailing newline is preserved if and only if
//! the input had one. No I/O happens here.

mod parse;

pub use parse::{Requirement, normalize_package_name, parse_requirements};

use std::collections::BTreeSet;
use vulnfix_types::{ChangeRecord, PinEntry, RemediationAdvice};

/// Marker appended to generated pin lines. Kept byte-for-byte compatible
/// with the annotation Snyk tooling writes, so fixed manifests diff cleanly
/// against ones annotated upstream.
pub const PIN_COMMENT: &str = "# not directly required, pinned by Snyk to avoid a vulnerability";

/// Result of one rewrite: the new manifest plus the change records, split by
/// kind so callers can order upgrades before pins across several files.
#[derive(Debug, Clone, Default)]
pub struct Rewritten {
    pub manifest: String,
    pub upgrades: Vec<ChangeRecord>,
    pub pins: Vec<ChangeRecord>,
}

impl Rewritten {
    pub fn is_unchanged(&self) -> bool {
        self.upgrades.is_empty() && self.pins.is_empty()
    }

    /// All change records, upgrades first.
    pub fn into_changes(self) -> Vec<ChangeRecord> {
        let mut changes = self.upgrades;
        changes.extend(self.pins);
        changes
    }
}

/// Apply upgrades and pins to one manifest.
///
/// Upgrades rewrite every declaration matching an entry's installed
/// `name@version` (names compared PEP-503-insensitively, file casing kept).
/// Transitive entries whose package is declared nowhere in this manifest are
/// appended as pin lines, in advice declaration order, after all upgrades.
pub fn update_dependencies(manifest: &str, advice: &RemediationAdvice) -> Rewritten {
    rewrite(manifest, advice, true)
}

/// Apply upgrades only. Used for `-r`/`-c` referenced files, where a missing
/// declaration belongs to the pinning file instead.
pub fn upgrade_dependencies(manifest: &str, advice: &RemediationAdvice) -> Rewritten {
    rewrite(manifest, advice, false)
}

fn rewrite(manifest: &str, advice: &RemediationAdvice, allow_pins: bool) -> Rewritten {
    let (mut lines, had_newline) = split_lines(manifest);
    let requirements = parse_requirements(manifest);

    let mut upgrades = Vec::new();
    for entry in advice.iter() {
        let wanted = normalize_package_name(&entry.installed.name);
        for req in &requirements {
            if normalize_package_name(&req.name) == wanted
                && req.version == entry.installed.version
            {
                let to_version = &entry.instruction.upgrade_to.version;
                lines[req.line] = req.with_version(to_version);
                upgrades.push(upgrade_record(req, entry));
            }
        }
    }

    let mut pins = Vec::new();
    if allow_pins {
        let declared: BTreeSet<String> = requirements
            .iter()
            .map(|r| normalize_package_name(&r.name))
            .collect();
        for entry in advice.iter() {
            if !entry.instruction.is_transitive {
                continue;
            }
            if declared.contains(&normalize_package_name(&entry.installed.name)) {
                continue;
            }
            lines.push(pin_line(entry));
            pins.push(pin_record(entry));
        }
    }

    Rewritten {
        manifest: join_lines(lines, had_newline),
        upgrades,
        pins,
    }
}

fn upgrade_record(req: &Requirement, entry: &PinEntry) -> ChangeRecord {
    let to_version = &entry.instruction.upgrade_to.version;
    ChangeRecord {
        success: true,
        user_message: format!(
            "Upgraded {} from {} to {}",
            req.name, req.version, to_version
        ),
        from: Some(format!("{}@{}", req.name, req.version)),
        to: Some(format!("{}@{}", req.name, to_version)),
        issue_ids: entry.instruction.vulns.clone(),
        reason: None,
    }
}

fn pin_line(entry: &PinEntry) -> String {
    let pinned = &entry.instruction.upgrade_to;
    format!("{}>={} {}", pinned.name, pinned.version, PIN_COMMENT)
}

fn pin_record(entry: &PinEntry) -> ChangeRecord {
    let pinned = &entry.instruction.upgrade_to;
    ChangeRecord {
        success: true,
        user_message: format!(
            "Pinned {} from {} to {}",
            pinned.name, entry.installed.version, pinned.version
        ),
        from: Some(entry.installed.to_string()),
        to: Some(pinned.to_string()),
        issue_ids: entry.instruction.vulns.clone(),
        reason: None,
    }
}

/// Split into physical lines, remembering whether a trailing newline must be
/// restored. `join_lines(split_lines(s))` reproduces `s` exactly.
fn split_lines(manifest: &str) -> (Vec<String>, bool) {
    if manifest.is_empty() {
        return (Vec::new(), false);
    }
    let had_newline = manifest.ends_with('\n');
    let mut lines: Vec<String> = manifest.split('\n').map(str::to_string).collect();
    if had_newline {
        lines.pop();
    }
    (lines, had_newline)
}

fn join_lines(lines: Vec<String>, had_newline: bool) -> String {
    let mut out = lines.join("\n");
    if had_newline {
        out.push('\n');
    }
    out
}
