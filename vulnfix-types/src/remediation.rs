use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// A package at a concrete installed or target version, e.g. `django@1.6.1`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageVersion {
    pub name: String,
    pub version: String,
}

impl PackageVersion {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
        }
    }
}

impl fmt::Display for PackageVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.name, self.version)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("expected `name@version`, got `{0}`")]
pub struct ParsePackageVersionError(String);

impl FromStr for PackageVersion {
    type Err = ParsePackageVersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('@') {
            Some((name, version)) if !name.is_empty() && !version.is_empty() => {
                Ok(Self::new(name, version))
            }
            _ => Err(ParsePackageVersionError(s.to_string())),
        }
    }
}

impl Serialize for PackageVersion {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for PackageVersion {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// What to do about one installed package: upgrade it to `upgrade_to`, or pin
/// it there when it is only reachable transitively.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PinInstruction {
    pub upgrade_to: PackageVersion,
    /// Issue ids resolved by this change. Empty for a pre-existing fix that
    /// no longer maps to an open issue.
    #[serde(default)]
    pub vulns: Vec<String>,
    pub is_transitive: bool,
}

/// One advice entry: the installed `name@version` plus its instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PinEntry {
    pub installed: PackageVersion,
    pub instruction: PinInstruction,
}

/// Remediation advice for one entity: an ordered map from installed
/// `name@version` to instruction.
///
/// The scanner emits this as a JSON object; entry order is the scanner's
/// declaration order and is preserved so generated pin lines and change
/// records are reproducible. Keys are unique per entity.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemediationAdvice {
    entries: Vec<PinEntry>,
}

impl RemediationAdvice {
    pub fn new(entries: Vec<PinEntry>) -> Self {
        Self { entries }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Entries in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &PinEntry> {
        self.entries.iter()
    }

    /// Issue ids of all entries, concatenated in declaration order.
    pub fn issue_ids(&self) -> Vec<String> {
        self.entries
            .iter()
            .flat_map(|e| e.instruction.vulns.iter().cloned())
            .collect()
    }

    /// Advice restricted to the entries for which `keep` holds, preserving
    /// declaration order.
    pub fn filtered(&self, keep: impl Fn(&PinEntry) -> bool) -> Self {
        Self {
            entries: self.entries.iter().filter(|e| keep(e)).cloned().collect(),
        }
    }
}

impl FromIterator<PinEntry> for RemediationAdvice {
    fn from_iter<T: IntoIterator<Item = PinEntry>>(iter: T) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl Serialize for RemediationAdvice {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for entry in &self.entries {
            map.serialize_entry(&entry.installed, &entry.instruction)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for RemediationAdvice {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct AdviceVisitor;

        impl<'de> Visitor<'de> for AdviceVisitor {
            type Value = RemediationAdvice;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map from `name@version` to a pin instruction")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
                let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some((installed, instruction)) =
                    map.next_entry::<PackageVersion, PinInstruction>()?
                {
                    entries.push(PinEntry {
                        installed,
                        instruction,
                    });
                }
                Ok(RemediationAdvice::new(entries))
            }
        }

        deserializer.deserialize_map(AdviceVisitor)
    }
}
