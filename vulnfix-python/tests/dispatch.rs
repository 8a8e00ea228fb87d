//! Dispatcher-level tests: classification routing, handler-unavailable
//! fallout, and `select_file_for_pinning`.

use camino::{Utf8Path, Utf8PathBuf};
use pretty_assertions::assert_eq;
use std::sync::Arc;
use vulnfix_python::{fix_python, select_file_for_pinning};
use vulnfix_types::{
    EntityToFix, FixError, FixOptions, Identity, MemoryWorkspace, RemediationAdvice, Workspace,
};

fn advice(json: serde_json::Value) -> RemediationAdvice {
    serde_json::from_value(json).expect("advice fixture")
}

fn entity(
    workspace: &Arc<MemoryWorkspace>,
    target_file: &str,
    remediation: RemediationAdvice,
) -> EntityToFix {
    EntityToFix::new(
        Arc::clone(workspace) as Arc<dyn Workspace>,
        Identity {
            ecosystem: Some("python".to_string()),
            target_file: Some(Utf8PathBuf::from(target_file)),
        },
    )
    .with_remediation(remediation)
}

fn django_advice() -> RemediationAdvice {
    advice(serde_json::json!({
        "django@1.6.1": {
            "upgradeTo": "django@2.0.1", "vulns": ["SNYK-1"], "isTransitive": false
        }
    }))
}

#[tokio::test]
async fn routes_requirements_and_fails_external_handlers() {
    let ws = Arc::new(MemoryWorkspace::default());
    ws.insert("requirements.txt", "Django==1.6.1\n");

    let result = fix_python(
        vec![
            entity(&ws, "requirements.txt", django_advice()),
            entity(&ws, "Pipfile", django_advice()),
            entity(&ws, "pyproject.toml", django_advice()),
            entity(&ws, "setup.py", django_advice()),
        ],
        &FixOptions::default(),
    )
    .await;

    assert_eq!(result.succeeded.len(), 1);
    assert_eq!(
        ws.get("fixed-requirements.txt").unwrap(),
        "Django==2.0.1\n"
    );

    // Pipfile and poetry projects are re-locked externally; both fail, loudly.
    assert_eq!(result.failed.len(), 2);
    let handlers: Vec<String> = result
        .failed
        .iter()
        .map(|f| f.error.to_string())
        .collect();
    assert!(handlers.contains(&"no handler available for pipenv projects".to_string()));
    assert!(handlers.contains(&"no handler available for poetry projects".to_string()));

    // Anything unclassifiable is skipped with a reason.
    assert_eq!(result.skipped.len(), 1);
    assert_eq!(result.skipped[0].reason, "setup.py is not supported");
}

#[tokio::test]
async fn entity_without_target_file_is_skipped() {
    let ws = Arc::new(MemoryWorkspace::default());
    let no_target = EntityToFix::new(
        Arc::clone(&ws) as Arc<dyn Workspace>,
        Identity {
            ecosystem: Some("python".to_string()),
            target_file: None,
        },
    )
    .with_remediation(django_advice());

    let result = fix_python(vec![no_target], &FixOptions::default()).await;
    assert!(result.succeeded.is_empty());
    assert_eq!(result.skipped.len(), 1);
    assert_eq!(result.skipped[0].reason, "unknown target is not supported");
}

#[tokio::test]
async fn pinning_file_is_the_target_when_only_require_directives_exist() {
    let ws = Arc::new(MemoryWorkspace::default());
    ws.insert("with-require/dev.txt", "-r base.txt\nDjango==1.6.1\n");
    ws.insert("with-require/base.txt", "Jinja2==2.7.2\n");

    let pinning = select_file_for_pinning(&entity(&ws, "with-require/dev.txt", django_advice()))
        .await
        .unwrap();
    assert_eq!(pinning.file_name, Utf8PathBuf::from("with-require/dev.txt"));
    assert_eq!(
        pinning.contents,
        ws.get(Utf8Path::new("with-require/dev.txt")).unwrap()
    );
}

#[tokio::test]
async fn pinning_file_is_the_target_without_directives() {
    let ws = Arc::new(MemoryWorkspace::default());
    ws.insert("basic/prod.txt", "Django==1.6.1\n");

    let pinning = select_file_for_pinning(&entity(&ws, "basic/prod.txt", django_advice()))
        .await
        .unwrap();
    assert_eq!(pinning.file_name, Utf8PathBuf::from("basic/prod.txt"));
    assert_eq!(pinning.contents, "Django==1.6.1\n");
}

#[tokio::test]
async fn pinning_file_is_the_constraints_file_when_declared() {
    let ws = Arc::new(MemoryWorkspace::default());
    ws.insert(
        "app/requirements.txt",
        "-c constraints.txt\nDjango==1.6.1\n",
    );
    ws.insert("app/constraints.txt", "six==1.12.0\n");

    let pinning = select_file_for_pinning(&entity(&ws, "app/requirements.txt", django_advice()))
        .await
        .unwrap();
    assert_eq!(pinning.file_name, Utf8PathBuf::from("app/constraints.txt"));
    assert_eq!(pinning.contents, "six==1.12.0\n");
}

#[tokio::test]
async fn pinning_selection_without_target_is_an_error() {
    let ws = Arc::new(MemoryWorkspace::default());
    let no_target = EntityToFix::new(
        Arc::clone(&ws) as Arc<dyn Workspace>,
        Identity::default(),
    );
    let err = select_file_for_pinning(&no_target).await.unwrap_err();
    assert!(matches!(err, FixError::MissingFileName));
}
