//! Include-directive resolution and the per-run file state.
//!
//! A requirements manifest can pull in sibling files via `-r` (nested
//! requirements) and `-c` (constraints). Upgrades belong in every file that
//! declares the vulnerable version; pins belong where they can actually
//! constrain the resolver: the constraints file when one is declared, else
//! the target file itself. Only the target file's own directives are
//! honored; deeper `-r` chains are not followed.

use camino::{Utf8Path, Utf8PathBuf};
use regex::Regex;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::LazyLock;
use vulnfix_rewrite::{normalize_package_name, parse_requirements};
use vulnfix_types::{EntityToFix, FixError, RemediationAdvice, Workspace};

static DIRECTIVE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*-(?<kind>[rc])\s+(?<path>\S+)").expect("directive grammar"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DirectiveKind {
    Require,
    Constraint,
}

#[derive(Debug, Clone)]
pub(crate) struct Directive {
    pub kind: DirectiveKind,
    /// Referenced file, resolved relative to the including file's directory.
    pub path: Utf8PathBuf,
}

pub(crate) fn parse_directives(target: &Utf8Path, manifest: &str) -> Vec<Directive> {
    let base = target.parent().unwrap_or(Utf8Path::new(""));
    manifest
        .split('\n')
        .filter_map(|line| {
            let caps = DIRECTIVE_RE.captures(line)?;
            let kind = match &caps["kind"] {
                "r" => DirectiveKind::Require,
                _ => DirectiveKind::Constraint,
            };
            Some(Directive {
                kind,
                path: base.join(&caps["path"]),
            })
        })
        .collect()
}

/// The sibling file a rewrite is written to; originals are never overwritten.
pub(crate) fn fixed_file_name(path: &Utf8Path) -> Utf8PathBuf {
    let base = path.parent().unwrap_or(Utf8Path::new(""));
    let name = path.file_name().unwrap_or(path.as_str());
    base.join(format!("fixed-{name}"))
}

/// The file a transitive pin for this entity would be appended to, with its
/// current content: the `-c` constraints file when the target declares one,
/// else the target file itself. `-r` never redirects pins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PinningFile {
    pub file_name: Utf8PathBuf,
    pub contents: String,
}

/// Resolve where pins belong for one entity, reading through its workspace.
pub async fn select_file_for_pinning(entity: &EntityToFix) -> Result<PinningFile, FixError> {
    let target = entity
        .identity
        .target_file
        .as_deref()
        .ok_or(FixError::MissingFileName)?;
    let workspace = entity.workspace.as_ref();
    let contents = workspace
        .read_file(target)
        .await
        .map_err(FixError::Workspace)?;

    let constraints = parse_directives(target, &contents)
        .into_iter()
        .find(|d| d.kind == DirectiveKind::Constraint);
    match constraints {
        Some(directive) => {
            let contents = workspace
                .read_file(&directive.path)
                .await
                .map_err(FixError::Workspace)?;
            Ok(PinningFile {
                file_name: directive.path,
                contents,
            })
        }
        None => Ok(PinningFile {
            file_name: target.to_path_buf(),
            contents,
        }),
    }
}

/// Contents produced for physical files so far in this run.
///
/// This is the only shared mutable state of a handler invocation: it is
/// created fresh per run, threaded through sequential entity processing, and
/// never exposed outside. Prior writes are looked up here, never detected by
/// re-reading the filesystem.
#[derive(Debug, Default)]
pub(crate) struct FileState {
    contents: BTreeMap<Utf8PathBuf, String>,
    written: BTreeSet<Utf8PathBuf>,
}

impl FileState {
    /// Current view of a file: the content most recently produced for it
    /// this run, else the original read through the workspace (cached, so
    /// each physical file is read at most once per run).
    pub async fn read(
        &mut self,
        workspace: &dyn Workspace,
        path: &Utf8Path,
    ) -> Result<String, FixError> {
        if let Some(contents) = self.contents.get(path) {
            return Ok(contents.clone());
        }
        let contents = workspace.read_file(path).await.map_err(FixError::Workspace)?;
        self.contents.insert(path.to_path_buf(), contents.clone());
        Ok(contents)
    }

    pub fn record_written(&mut self, path: Utf8PathBuf, contents: String) {
        self.contents.insert(path.clone(), contents);
        self.written.insert(path);
    }

    pub fn was_written(&self, path: &Utf8Path) -> bool {
        self.written.contains(path)
    }
}

/// One physical file a rewrite call will run against, with the advice
/// entries that may land there.
#[derive(Debug)]
pub(crate) struct FileTarget {
    pub path: Utf8PathBuf,
    pub advice: RemediationAdvice,
    /// True only for the pinning file chosen by `-c`-else-target.
    pub allow_pins: bool,
}

#[derive(Debug)]
pub(crate) struct ResolvedTargets {
    /// Scan order: the target file first, then referenced files in directive
    /// order.
    pub files: Vec<FileTarget>,
}

/// Work out which physical files this entity's advice applies to, against
/// the current run state.
pub(crate) async fn resolve_targets(
    workspace: &dyn Workspace,
    target: &Utf8Path,
    advice: &RemediationAdvice,
    state: &mut FileState,
) -> Result<ResolvedTargets, FixError> {
    let root_contents = state.read(workspace, target).await?;
    let directives = parse_directives(target, &root_contents);

    let mut scan: Vec<Utf8PathBuf> = vec![target.to_path_buf()];
    for directive in &directives {
        if !scan.contains(&directive.path) {
            scan.push(directive.path.clone());
        }
    }

    let pin_target = directives
        .iter()
        .find(|d| d.kind == DirectiveKind::Constraint)
        .map(|d| d.path.clone())
        .unwrap_or_else(|| target.to_path_buf());

    // Which normalized package names each scanned file currently declares.
    let mut declared: BTreeMap<Utf8PathBuf, BTreeSet<String>> = BTreeMap::new();
    for path in &scan {
        let contents = state.read(workspace, path).await?;
        let names = parse_requirements(&contents)
            .iter()
            .map(|r| normalize_package_name(&r.name))
            .collect();
        declared.insert(path.clone(), names);
    }
    let declared_anywhere: BTreeSet<String> =
        declared.values().flat_map(|names| names.iter().cloned()).collect();
    let declared_in_pin_file = declared.get(&pin_target).cloned().unwrap_or_default();

    let files = scan
        .into_iter()
        .map(|path| {
            let allow_pins = path == pin_target;
            let advice_for_file = if allow_pins {
                // A transitive dependency declared in some other scanned
                // file is upgraded there; it must not also pin here.
                advice.filtered(|entry| {
                    let name = normalize_package_name(&entry.installed.name);
                    !(entry.instruction.is_transitive
                        && declared_anywhere.contains(&name)
                        && !declared_in_pin_file.contains(&name))
                })
            } else {
                advice.clone()
            };
            FileTarget {
                path,
                advice: advice_for_file,
                allow_pins,
            }
        })
        .collect();

    Ok(ResolvedTargets { files })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn directives_resolve_relative_to_the_including_file() {
        let manifest = "-r base.txt\n-c constraints.txt\ndjango==1.6.1\n";
        let directives = parse_directives(Utf8Path::new("app/requirements.txt"), manifest);
        assert_eq!(directives.len(), 2);
        assert_eq!(directives[0].kind, DirectiveKind::Require);
        assert_eq!(directives[0].path, Utf8PathBuf::from("app/base.txt"));
        assert_eq!(directives[1].kind, DirectiveKind::Constraint);
        assert_eq!(directives[1].path, Utf8PathBuf::from("app/constraints.txt"));
    }

    #[test]
    fn directives_tolerate_leading_whitespace_only() {
        let directives = parse_directives(Utf8Path::new("dev.txt"), "  -r base.txt\n#-r no.txt\n");
        assert_eq!(directives.len(), 1);
        assert_eq!(directives[0].path, Utf8PathBuf::from("base.txt"));
    }

    #[test]
    fn fixed_file_name_is_a_sibling() {
        assert_eq!(
            fixed_file_name(Utf8Path::new("lib/requirements.txt")),
            Utf8PathBuf::from("lib/fixed-requirements.txt")
        );
        assert_eq!(
            fixed_file_name(Utf8Path::new("prod.txt")),
            Utf8PathBuf::from("fixed-prod.txt")
        );
    }
}
