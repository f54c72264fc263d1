/*!
 * Permission Executor Integration Tests
 */

use crate::common::{book, calls, register_counted, registry, scope};
use ai_os_permissions::permissions::{
    AuditLogger, DecisionPhase, EntityDictionary, ModelDefinition, PermissionExecutor,
    PermissionKind, PermissionSource, Record, Status,
};
use ai_os_permissions::PolicyError;
use pretty_assertions::assert_eq;
use serde_json::json;
use std::sync::Arc;

fn dictionary() -> Arc<EntityDictionary> {
    let mut dictionary = EntityDictionary::new(registry());
    dictionary
        .bind_entity(
            &ModelDefinition::new("book")
                .permission(PermissionKind::Read, PermissionSource::expression("A"))
                .permission(PermissionKind::Update, PermissionSource::expression("is owner"))
                .permission(PermissionKind::Share, PermissionSource::expression("Deny"))
                .field("title")
                .field_permission(
                    "price",
                    PermissionKind::Update,
                    PermissionSource::expression("price not negative"),
                ),
        )
        .unwrap();
    Arc::new(dictionary)
}

#[test]
fn test_owner_update_passes_after_commit() {
    let mut executor = PermissionExecutor::new(dictionary(), scope("alice"));
    let resource = book("1", "alice");
    let change = Record::new("book", "1").change("price", json!(12));

    executor
        .check_specific_field_permissions(&resource, Some(change), PermissionKind::Update, "price")
        .unwrap();
    assert_eq!(executor.pending_commit_checks(), 1);

    executor.execute_commit_checks().unwrap();
    assert_eq!(executor.pending_commit_checks(), 0);
    assert_eq!(executor.scope().auth_failure_count(), 0);
}

#[test]
fn test_commit_phase_denies_invalid_change() {
    let mut executor = PermissionExecutor::new(dictionary(), scope("alice"));
    let resource = book("1", "alice");
    let change = Record::new("book", "1").change("price", json!(-5));

    executor
        .check_specific_field_permissions(&resource, Some(change), PermissionKind::Update, "price")
        .unwrap();
    let err = executor.execute_commit_checks().unwrap_err();

    assert!(err.is_forbidden());
    assert_eq!(
        err,
        PolicyError::Forbidden("ForbiddenAccess price not negative book#1".into())
    );
    assert_eq!(executor.pending_commit_checks(), 0);
}

#[test]
fn test_non_owner_denied_at_commit() {
    let mut executor = PermissionExecutor::new(dictionary(), scope("mallory"));
    let resource = book("1", "alice");

    executor
        .check_specific_field_permissions(&resource, None, PermissionKind::Update, "title")
        .unwrap();
    assert!(executor.execute_commit_checks().unwrap_err().is_forbidden());
}

#[test]
fn test_user_check_failure_is_immediate() {
    let mut executor = PermissionExecutor::new(dictionary(), scope("alice"));
    let resource = book("1", "alice");

    let err = executor
        .check_permission(PermissionKind::Share, &resource)
        .unwrap_err();
    assert_eq!(err, PolicyError::Forbidden("ForbiddenAccess Deny".into()));
    assert_eq!(executor.pending_commit_checks(), 0);

    assert!(executor
        .check_user_permissions("book", PermissionKind::Share)
        .unwrap_err()
        .is_forbidden());
}

#[test]
fn test_user_prechecks_proceed_on_deferred() {
    let mut executor = PermissionExecutor::new(dictionary(), scope("mallory"));
    let resource = book("1", "alice");

    // "is owner" cannot be decided from the principal alone
    executor
        .check_user_permissions("book", PermissionKind::Update)
        .unwrap();
    executor
        .check_user_field_permissions(&resource, PermissionKind::Update, "price")
        .unwrap();
    executor
        .check_user_permissions("book", PermissionKind::Read)
        .unwrap();
    assert_eq!(executor.pending_commit_checks(), 0);
}

#[test]
fn test_missing_binding_allows_everything() {
    let mut executor = PermissionExecutor::new(dictionary(), scope("anyone"));
    let resource = book("1", "alice");

    executor
        .check_permission(PermissionKind::Delete, &resource)
        .unwrap();
    executor
        .check_specific_field_permissions(&resource, None, PermissionKind::Create, "title")
        .unwrap();
    executor
        .check_user_permissions("book", PermissionKind::Delete)
        .unwrap();
    assert_eq!(executor.pending_commit_checks(), 0);
}

#[test]
fn test_unknown_entity_is_an_error_not_a_denial() {
    let mut executor = PermissionExecutor::new(dictionary(), scope("alice"));
    let err = executor
        .check_user_permissions("author", PermissionKind::Read)
        .unwrap_err();
    assert_eq!(err, PolicyError::UnknownEntity("author".into()));
    assert!(!err.is_forbidden());
}

#[test]
fn test_failure_reasons_are_deduplicated() {
    let mut executor = PermissionExecutor::new(dictionary(), scope("alice"));
    let resource = book("1", "alice");

    for _ in 0..3 {
        let _ = executor.check_permission(PermissionKind::Share, &resource);
    }
    let _ = executor.check_user_permissions("book", PermissionKind::Share);

    assert_eq!(executor.scope().auth_failure_count(), 4);
    assert_eq!(
        executor.scope().auth_failure_reason(),
        "Failed authorization checks:\nForbiddenAccess Deny\n"
    );
}

#[test]
fn test_commit_checks_share_the_request_cache() {
    let mut registry = registry();
    let counter = register_counted(&mut registry, "audited", true);
    let mut dictionary = EntityDictionary::new(registry);
    dictionary
        .bind_entity(
            &ModelDefinition::new("book")
                .permission(PermissionKind::Update, PermissionSource::expression("audited"))
                .field("title")
                .field("price"),
        )
        .unwrap();

    let mut executor = PermissionExecutor::new(Arc::new(dictionary), scope("alice"));
    let resource = book("1", "alice");
    for field in ["title", "price"] {
        executor
            .check_specific_field_permissions(&resource, None, PermissionKind::Update, field)
            .unwrap();
    }
    assert_eq!(executor.pending_commit_checks(), 2);

    executor.execute_commit_checks().unwrap();
    assert_eq!(calls(&counter), 1);
    assert_eq!(executor.cache_stats().hits, 1);
}

#[test]
fn test_decisions_are_audited() {
    let audit = Arc::new(AuditLogger::new());
    let mut executor =
        PermissionExecutor::new(dictionary(), scope("mallory")).with_audit(audit.clone());
    let resource = book("1", "alice");

    executor.check_permission(PermissionKind::Read, &resource).unwrap();
    executor
        .check_specific_field_permissions(&resource, None, PermissionKind::Update, "title")
        .unwrap();
    let _ = executor.execute_commit_checks();

    let events = audit.for_request(executor.scope().request_id());
    let phases: Vec<(DecisionPhase, Status)> =
        events.iter().map(|e| (e.phase, e.result.status)).collect();
    assert_eq!(
        phases,
        vec![
            (DecisionPhase::Operation, Status::Pass),
            (DecisionPhase::Operation, Status::Deferred),
            (DecisionPhase::Commit, Status::Fail),
        ]
    );
    assert_eq!(audit.denial_count("book"), 1);
}
