/*!
 * Model Manifest Integration Tests
 */

use crate::common::{book, scope};
use ai_os_permissions::permissions::{CheckRegistry, ModelManifest, PermissionExecutor, PermissionKind};
use ai_os_permissions::{EngineConfig, PolicyError};
use pretty_assertions::assert_eq;
use std::io::Write;
use std::sync::Arc;
use tempfile::NamedTempFile;

const MANIFEST: &str = r#"{
    "checks": {
        "everyone": "Prefab.Role.All",
        "nobody": "Prefab.Role.None"
    },
    "models": [
        {
            "name": "book",
            "permissions": {
                "read": { "expression": "everyone" },
                "delete": { "any": ["nobody"] }
            },
            "fields": [
                { "name": "title", "permissions": { "update": { "all": ["everyone", "nobody"] } } },
                { "name": "price" }
            ]
        }
    ]
}"#;

fn write_manifest(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

#[test]
fn test_manifest_from_file_drives_decisions() {
    let file = write_manifest(MANIFEST);
    let dictionary = ModelManifest::from_path(file.path())
        .unwrap()
        .into_dictionary(CheckRegistry::default())
        .unwrap();

    assert_eq!(dictionary.all_fields("book"), ["title", "price"]);

    let mut executor = PermissionExecutor::new(Arc::new(dictionary), scope("alice"));
    let resource = book("1", "alice");
    executor.check_permission(PermissionKind::Read, &resource).unwrap();
    assert!(executor
        .check_permission(PermissionKind::Delete, &resource)
        .unwrap_err()
        .is_forbidden());
    assert!(executor
        .check_specific_field_permissions(&resource, None, PermissionKind::Update, "title")
        .unwrap_err()
        .is_forbidden());
    executor
        .check_specific_field_permissions(&resource, None, PermissionKind::Update, "price")
        .unwrap();
}

#[test]
fn test_manifest_with_broken_policy_is_rejected() {
    let file = write_manifest(
        r#"{ "models": [ { "name": "book", "permissions": { "read": { "expression": "(Prefab.Role.All" } } } ] }"#,
    );
    let manifest = ModelManifest::from_path(file.path()).unwrap();

    assert!(matches!(
        manifest.into_dictionary(CheckRegistry::default()),
        Err(PolicyError::Parse { .. })
    ));
}

#[test]
fn test_manifest_honours_configured_limits() {
    let file = write_manifest(MANIFEST);
    let config = EngineConfig {
        max_expression_len: 4,
        ..Default::default()
    };

    let err = ModelManifest::from_path(file.path())
        .unwrap()
        .into_dictionary_with(CheckRegistry::default(), config)
        .unwrap_err();
    assert!(matches!(err, PolicyError::LimitExceeded(_)), "{:?}", err);
}

#[test]
fn test_missing_manifest_file() {
    let dir = tempfile::tempdir().unwrap();
    let err = ModelManifest::from_path(dir.path().join("absent.json")).unwrap_err();
    assert!(matches!(err, PolicyError::Manifest(_)));
}
