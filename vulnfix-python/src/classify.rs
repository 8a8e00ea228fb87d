use camino::Utf8Path;
use vulnfix_types::EntityToFix;

/// Project families the python dispatcher recognizes. Closed set: routing is
/// an exhaustive match, so adding a family is a compile-time-checked change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum HandlerKind {
    /// `requirements.txt` and friends (any `*.txt` manifest).
    Requirements,
    /// `Pipfile` projects, re-locked by the pipenv CLI.
    Pipenv,
    /// `pyproject.toml` / `poetry.lock` projects, re-locked by the poetry CLI.
    Poetry,
}

impl HandlerKind {
    pub fn as_str(self) -> &'static str {
        match self {
            HandlerKind::Requirements => "requirements.txt",
            HandlerKind::Pipenv => "pipenv",
            HandlerKind::Poetry => "poetry",
        }
    }
}

/// `dev.txt`, `lib/prod.txt` and the like all count as requirements
/// manifests, not just the literal `requirements.txt`.
pub fn is_requirements_txt(target_file: &Utf8Path) -> bool {
    target_file.as_str().ends_with(".txt")
}

/// Classify an entity by its target file name. `None` means the python
/// dispatcher has nowhere to route it and skips it.
pub fn classify(entity: &EntityToFix) -> Option<HandlerKind> {
    let target = entity.identity.target_file.as_deref()?;
    if is_requirements_txt(target) {
        return Some(HandlerKind::Requirements);
    }
    match target.file_name() {
        Some("Pipfile") => Some(HandlerKind::Pipenv),
        Some("pyproject.toml") | Some("poetry.lock") => Some(HandlerKind::Poetry),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8PathBuf;
    use std::sync::Arc;
    use vulnfix_types::{Identity, MemoryWorkspace};

    fn entity(target_file: Option<&str>) -> EntityToFix {
        EntityToFix::new(
            Arc::new(MemoryWorkspace::default()),
            Identity {
                ecosystem: Some("python".to_string()),
                target_file: target_file.map(Utf8PathBuf::from),
            },
        )
    }

    #[test]
    fn requirements_family_classification() {
        for target in ["requirements.txt", "dev.txt", "lib/prod.txt"] {
            assert_eq!(
                classify(&entity(Some(target))),
                Some(HandlerKind::Requirements),
                "{target}"
            );
        }
    }

    #[test]
    fn pipenv_and_poetry_classification() {
        assert_eq!(classify(&entity(Some("Pipfile"))), Some(HandlerKind::Pipenv));
        assert_eq!(
            classify(&entity(Some("app/Pipfile"))),
            Some(HandlerKind::Pipenv)
        );
        assert_eq!(
            classify(&entity(Some("pyproject.toml"))),
            Some(HandlerKind::Poetry)
        );
        assert_eq!(
            classify(&entity(Some("poetry.lock"))),
            Some(HandlerKind::Poetry)
        );
    }

    #[test]
    fn unsupported_targets_do_not_classify() {
        assert_eq!(classify(&entity(Some("package.json"))), None);
        assert_eq!(classify(&entity(None)), None);
    }
}
