/*!
 * Expression Evaluation Integration Tests
 */

use crate::common::{book, calls, register_counted, register_role, registry, scope};
use ai_os_permissions::permissions::{
    EntityDictionary, ExpressionResultCache, ModelDefinition, PermissionExpressionBuilder,
    PermissionKind, PermissionSource, Record, Status,
};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::sync::Arc;

fn builder(dictionary: EntityDictionary) -> PermissionExpressionBuilder {
    PermissionExpressionBuilder::new(
        Arc::new(dictionary),
        scope("alice"),
        Arc::new(ExpressionResultCache::default()),
    )
}

fn read_status(expression: &str) -> Status {
    let mut dictionary = EntityDictionary::new(registry());
    dictionary
        .bind_entity(
            &ModelDefinition::new("book")
                .permission(PermissionKind::Read, PermissionSource::expression(expression)),
        )
        .unwrap();

    let expressions = builder(dictionary)
        .build_any_field_expressions(&book("1", "alice"), PermissionKind::Read, None)
        .unwrap();
    expressions.operation.evaluate().status
}

#[test]
fn test_scenario_conjunction_of_passing_checks() {
    assert_eq!(read_status("A and Allow"), Status::Pass);
}

#[test]
fn test_scenario_disjunction_with_failing_check() {
    assert_eq!(read_status("A or Deny"), Status::Pass);
}

#[test]
fn test_scenario_negated_failure() {
    assert_eq!(read_status("not d"), Status::Pass);
}

#[test]
fn test_short_circuit_skips_exploding_checks() {
    assert_eq!(read_status("Deny and explodes"), Status::Fail);
    assert_eq!(read_status("A or explodes"), Status::Pass);
}

#[test]
fn test_any_field_scans_fields_in_declaration_order() {
    let mut registry = registry();
    let first = register_counted(&mut registry, "first open", false);
    let second = register_counted(&mut registry, "second open", false);
    let third = register_counted(&mut registry, "third open", true);

    let mut dictionary = EntityDictionary::new(registry);
    dictionary
        .bind_entity(
            &ModelDefinition::new("doc")
                .field_permission("a", PermissionKind::Update, PermissionSource::expression("first open"))
                .field_permission("b", PermissionKind::Update, PermissionSource::expression("second open"))
                .field_permission("c", PermissionKind::Update, PermissionSource::expression("third open")),
        )
        .unwrap();

    let doc: Arc<dyn ai_os_permissions::permissions::PersistentResource> =
        Arc::new(Record::new("doc", "9"));
    let expressions = builder(dictionary)
        .build_any_field_expressions(&doc, PermissionKind::Update, None)
        .unwrap();

    assert_eq!(expressions.operation.evaluate().status, Status::Deferred);
    assert_eq!(calls(&first), 0);

    let commit = expressions.commit.unwrap();
    assert_eq!(
        commit.to_string(),
        "(((FAIL or first open) or second open) or third open)"
    );
    assert_eq!(commit.evaluate().status, Status::Pass);
    assert_eq!((calls(&first), calls(&second), calls(&third)), (1, 1, 1));
}

#[test]
fn test_entity_pass_short_circuits_fields() {
    let mut registry = registry();
    let field = register_counted(&mut registry, "field open", true);

    let mut dictionary = EntityDictionary::new(registry);
    dictionary
        .bind_entity(
            &ModelDefinition::new("book")
                .permission(PermissionKind::Read, PermissionSource::expression("Allow"))
                .field_permission("title", PermissionKind::Read, PermissionSource::expression("field open")),
        )
        .unwrap();

    let expressions = builder(dictionary)
        .build_any_field_expressions(&book("1", "alice"), PermissionKind::Read, None)
        .unwrap();
    assert_eq!(expressions.commit.unwrap().evaluate().status, Status::Pass);
    assert_eq!(calls(&field), 0);
}

#[test]
fn test_check_runs_once_per_decision_window() {
    let mut registry = registry();
    let counter = register_counted(&mut registry, "counted", true);

    let mut dictionary = EntityDictionary::new(registry);
    dictionary
        .bind_entity(
            &ModelDefinition::new("book")
                .permission(PermissionKind::Update, PermissionSource::expression("counted"))
                .field_permission("title", PermissionKind::Update, PermissionSource::expression("counted and A"))
                .field_permission("price", PermissionKind::Update, PermissionSource::any_of(["counted"])),
        )
        .unwrap();

    let builder = builder(dictionary);
    let resource = book("1", "alice");
    for field in ["title", "price"] {
        let expressions = builder
            .build_specific_field_expressions(&resource, PermissionKind::Update, field, None)
            .unwrap();
        assert_eq!(expressions.commit.unwrap().evaluate().status, Status::Pass);
    }

    assert_eq!(calls(&counter), 1);
    assert!(builder.cache().stats().hits >= 3);
}

#[test]
fn test_distinct_resources_and_changes_are_cached_apart() {
    let mut registry = registry();
    let counter = register_counted(&mut registry, "counted", true);

    let mut dictionary = EntityDictionary::new(registry);
    dictionary
        .bind_entity(
            &ModelDefinition::new("book")
                .permission(PermissionKind::Update, PermissionSource::expression("counted")),
        )
        .unwrap();
    let builder = builder(dictionary);

    let first = book("1", "alice");
    let second = book("2", "alice");
    let change = Record::new("book", "1").change("price", json!(5));

    for (resource, change) in [
        (&first, None),
        (&second, None),
        (&first, Some(change.clone())),
        (&first, Some(change)),
    ] {
        builder
            .build_any_field_expressions(resource, PermissionKind::Update, change)
            .unwrap()
            .commit
            .unwrap()
            .evaluate();
    }

    // The last decision reuses the previous change descriptor's id
    assert_eq!(calls(&counter), 3);
}

#[test]
fn test_configured_instances_of_one_check_are_cached_apart() {
    let mut registry = registry();
    let is_alice = register_role(&mut registry, "is alice", "alice");
    let is_admin = register_role(&mut registry, "is admin", "admin");

    let mut dictionary = EntityDictionary::new(registry);
    dictionary
        .bind_entity(
            &ModelDefinition::new("book")
                .permission(PermissionKind::Read, PermissionSource::expression("is alice"))
                .permission(PermissionKind::Delete, PermissionSource::expression("is admin")),
        )
        .unwrap();
    let builder = builder(dictionary);
    let resource = book("1", "alice");

    for _ in 0..2 {
        let read = builder
            .build_any_field_expressions(&resource, PermissionKind::Read, None)
            .unwrap();
        assert_eq!(read.operation.evaluate().status, Status::Pass);

        let delete = builder
            .build_any_field_expressions(&resource, PermissionKind::Delete, None)
            .unwrap();
        assert_eq!(delete.operation.evaluate().status, Status::Fail);
    }

    assert_eq!(calls(&is_alice), 1);
    assert_eq!(calls(&is_admin), 1);
}

#[test]
fn test_missing_binding_is_unconditional_pass() {
    let mut registry = registry();
    let counter = register_counted(&mut registry, "counted", false);

    let mut dictionary = EntityDictionary::new(registry);
    dictionary
        .bind_entity(
            &ModelDefinition::new("book")
                .permission(PermissionKind::Update, PermissionSource::expression("counted")),
        )
        .unwrap();
    let builder = builder(dictionary);

    for kind in [PermissionKind::Read, PermissionKind::Create, PermissionKind::Delete] {
        let expressions = builder
            .build_any_field_expressions(&book("1", "bob"), kind, None)
            .unwrap();
        assert_eq!(expressions.operation.evaluate().status, Status::Pass);
        assert_eq!(expressions.commit.unwrap().evaluate().status, Status::Pass);
    }
    assert_eq!(calls(&counter), 0);
}

#[test]
fn test_failure_reason_names_check_and_resource() {
    let mut dictionary = EntityDictionary::new(registry());
    dictionary
        .bind_entity(
            &ModelDefinition::new("book")
                .permission(PermissionKind::Delete, PermissionSource::expression("is owner")),
        )
        .unwrap();

    let result = builder(dictionary)
        .build_any_field_expressions(&book("7", "bob"), PermissionKind::Delete, None)
        .unwrap()
        .commit
        .unwrap()
        .evaluate();

    assert_eq!(result.status, Status::Fail);
    assert_eq!(result.reason(), Some("ForbiddenAccess is owner book#7"));
}
