/*!
 * Policy Compiler Integration Tests
 */

use crate::common::registry;
use ai_os_permissions::permissions::{
    EntityDictionary, ModelDefinition, PermissionKind, PermissionSource, PolicyCompiler,
};
use ai_os_permissions::PolicyError;
use pretty_assertions::assert_eq;
use proptest::prelude::*;

fn expression() -> impl Strategy<Value = String> {
    let leaf = prop::sample::select(vec![
        "A",
        "Allow",
        "Deny",
        "d",
        "user has all access",
        "Prefab.Role.All",
        "is owner",
    ])
    .prop_map(String::from);

    leaf.prop_recursive(4, 32, 2, |inner| {
        prop_oneof![
            (inner.clone(), inner.clone()).prop_map(|(l, r)| format!("{} and {}", l, r)),
            (inner.clone(), inner.clone()).prop_map(|(l, r)| format!("{} OR {}", l, r)),
            inner.clone().prop_map(|e| format!("not ({})", e)),
            inner.prop_map(|e| format!("({})", e)),
        ]
    })
}

proptest! {
    #[test]
    fn prop_compile_is_deterministic(text in expression()) {
        let registry = registry();
        let compiler = PolicyCompiler::new(&registry);
        let first = compiler.compile(&text).unwrap();
        let second = compiler.compile(&text).unwrap();
        prop_assert_eq!(&first, &second);

        // The rendered tree is itself valid policy text for the same tree
        let rendered = compiler.compile(&first.to_string()).unwrap();
        prop_assert_eq!(first, rendered);
    }
}

#[test]
fn test_expression_and_list_are_exclusive() {
    let mut dictionary = EntityDictionary::new(registry());
    let source = PermissionSource {
        expression: "A".into(),
        all: vec!["Allow".into()],
        any: Vec::new(),
    };
    let model = ModelDefinition::new("book").permission(PermissionKind::Read, source);

    let err = dictionary.bind_entity(&model).unwrap_err();
    assert!(matches!(err, PolicyError::InvalidConfiguration { .. }), "{:?}", err);
    assert!(!dictionary.is_bound("book"));
}

#[test]
fn test_empty_source_is_rejected() {
    let mut dictionary = EntityDictionary::new(registry());
    let model = ModelDefinition::new("book")
        .field_permission("title", PermissionKind::Update, PermissionSource::default());

    assert!(matches!(
        dictionary.bind_entity(&model),
        Err(PolicyError::InvalidConfiguration { .. })
    ));
}

#[test]
fn test_any_list_synthesizes_disjunction() {
    let registry = registry();
    let compiler = PolicyCompiler::new(&registry);
    let tree = compiler
        .compile_source(
            PermissionKind::Share,
            "book",
            &PermissionSource::any_of(["is owner", "user has all access"]),
        )
        .unwrap();

    assert_eq!(tree.to_string(), "(is owner or user has all access)");
    assert!(!tree.is_user_only());
}

#[test]
fn test_malformed_text_fails_registration() {
    for text in ["A and (Deny", "A nand Deny", "", "A and is admin"] {
        let mut dictionary = EntityDictionary::new(registry());
        let model = ModelDefinition::new("book")
            .permission(PermissionKind::Read, PermissionSource::expression(text));
        let err = dictionary.bind_entity(&model).unwrap_err();
        assert!(
            matches!(
                err,
                PolicyError::Parse { .. }
                    | PolicyError::UnknownCheck(_)
                    | PolicyError::InvalidConfiguration { .. }
            ),
            "{:?} gave {:?}",
            text,
            err
        );
        assert!(!dictionary.is_bound("book"));
    }
}
