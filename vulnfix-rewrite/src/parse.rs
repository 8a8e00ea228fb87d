use regex::Regex;
use std::sync::LazyLock;

/// Grammar for one dependency declaration:
/// `<name>[<extras>]<comparator><version><rest>`.
///
/// `rest` (environment markers, inline comments, trailing whitespace, a
/// stray CR) is captured verbatim so touched lines can be rebuilt around a
/// new version token without disturbing anything else.
static REQUIREMENT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?<name>[A-Za-z0-9][A-Za-z0-9._-]*)(?<extras>\[[A-Za-z0-9,._ -]*\])?(?<cmp>==|>=|<=|~=|>|<)(?<version>[0-9][0-9A-Za-z.]*)(?<rest>.*)$",
    )
    .expect("requirement grammar")
});

static NAME_SEPARATORS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[-_.]+").expect("name separator class"));

/// A dependency declaration parsed out of a requirements manifest, with the
/// exact spelling found in the file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Requirement {
    /// Index of the declaration in the manifest's line buffer.
    pub line: usize,
    /// Package name with the casing as written.
    pub name: String,
    /// Optional extras group, brackets included, e.g. `[argon2]`.
    pub extras: Option<String>,
    pub comparator: String,
    pub version: String,
    /// Everything after the version token, verbatim.
    pub rest: String,
}

impl Requirement {
    /// The line rebuilt with `version` substituted for the original version
    /// token; everything else is carried over unchanged.
    pub fn with_version(&self, version: &str) -> String {
        format!(
            "{}{}{}{}{}",
            self.name,
            self.extras.as_deref().unwrap_or(""),
            self.comparator,
            version,
            self.rest
        )
    }
}

/// PEP-503-style name normalization: lowercase, with runs of `-`/`_`/`.`
/// collapsed to `-`. pip treats `Clickhouse_Driver` and `clickhouse-driver`
/// as the same package.
pub fn normalize_package_name(name: &str) -> String {
    NAME_SEPARATORS_RE
        .replace_all(name, "-")
        .to_ascii_lowercase()
}

/// Parse every dependency declaration in `manifest`. Lines that do not match
/// the grammar (comments, blanks, include directives, anything malformed)
/// are skipped, never an error.
pub fn parse_requirements(manifest: &str) -> Vec<Requirement> {
    manifest
        .split('\n')
        .enumerate()
        .filter_map(|(idx, line)| parse_line(idx, line))
        .collect()
}

pub(crate) fn parse_line(idx: usize, line: &str) -> Option<Requirement> {
    let caps = REQUIREMENT_RE.captures(line)?;
    Some(Requirement {
        line: idx,
        name: caps["name"].to_string(),
        extras: caps.name("extras").map(|m| m.as_str().to_string()),
        comparator: caps["cmp"].to_string(),
        version: caps["version"].to_string(),
        rest: caps["rest"].to_string(),
    })
}
