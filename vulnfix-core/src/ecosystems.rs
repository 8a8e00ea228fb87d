use crate::npm;
use std::fmt;
use std::str::FromStr;
use tracing::debug;
use vulnfix_types::{EcosystemResult, EntityToFix, FixOptions};

/// Ecosystems this engine dispatches. Closed set: adding one is a
/// compile-time-checked change to the match in `dispatch`, not a registry
/// entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum EcosystemKind {
    Python,
    Npm,
}

impl EcosystemKind {
    /// Key the ecosystem's results are reported under.
    pub fn plugin_id(self) -> &'static str {
        match self {
            EcosystemKind::Python => "python",
            EcosystemKind::Npm => "npm",
        }
    }

    /// Route a group of entities to this ecosystem's dispatcher.
    pub async fn dispatch(
        self,
        entities: Vec<EntityToFix>,
        options: &FixOptions,
    ) -> EcosystemResult {
        debug!(
            "dispatching {} entities to {}",
            entities.len(),
            self.plugin_id()
        );
        match self {
            EcosystemKind::Python => vulnfix_python::fix_python(entities, options).await,
            EcosystemKind::Npm => npm::fix_npm(entities, options).await,
        }
    }
}

impl fmt::Display for EcosystemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.plugin_id())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0} is not a supported ecosystem")]
pub struct UnknownEcosystem(pub String);

impl FromStr for EcosystemKind {
    type Err = UnknownEcosystem;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Scan results report pip projects under the package manager name.
        match s {
            "python" | "pip" => Ok(EcosystemKind::Python),
            "npm" => Ok(EcosystemKind::Npm),
            other => Err(UnknownEcosystem(other.to_string())),
        }
    }
}
