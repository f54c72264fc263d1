/*!
 * Shared fixtures for permission tests
 */

#![allow(dead_code)]

use ai_os_permissions::permissions::checks::prefab::role;
use ai_os_permissions::permissions::{
    ChangeSpec, CheckRegistry, OperationCheck, PersistentResource, Record, RequestScope, User,
    UserCheck,
};
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Operation check with a fixed answer that counts its invocations
pub struct Counted {
    calls: Arc<AtomicUsize>,
    pass: bool,
}

impl OperationCheck for Counted {
    fn ok(&self, _: &dyn PersistentResource, _: &RequestScope, _: Option<&ChangeSpec>) -> bool {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.pass
    }
}

/// Register a `Counted` check as `name`; the returned counter tracks its invocations
pub fn register_counted(
    registry: &mut CheckRegistry,
    name: &str,
    pass: bool,
) -> Arc<AtomicUsize> {
    let calls = Arc::new(AtomicUsize::new(0));
    let shared = calls.clone();
    registry
        .register_operation_with(name, move || Counted {
            calls: shared.clone(),
            pass,
        })
        .unwrap();
    calls
}

pub fn calls(counter: &AtomicUsize) -> usize {
    counter.load(Ordering::SeqCst)
}

/// Passes for principals holding `role`; counts its invocations
pub struct HasRole {
    role: &'static str,
    calls: Arc<AtomicUsize>,
}

impl UserCheck for HasRole {
    fn ok(&self, user: &User) -> bool {
        self.calls.fetch_add(1, Ordering::SeqCst);
        user.name() == self.role
    }
}

/// Register a `HasRole` check for `role` as `name`
pub fn register_role(registry: &mut CheckRegistry, name: &str, role: &'static str) -> Arc<AtomicUsize> {
    let calls = Arc::new(AtomicUsize::new(0));
    let shared = calls.clone();
    registry
        .register_user_with(name, move || HasRole {
            role,
            calls: shared.clone(),
        })
        .unwrap();
    calls
}

/// User check that must never run
#[derive(Default)]
pub struct Explodes;

impl UserCheck for Explodes {
    fn ok(&self, _user: &User) -> bool {
        panic!("check evaluated despite short-circuit");
    }
}

/// Passes when the resource's `owner` attribute names the acting user
#[derive(Default)]
pub struct IsOwner;

impl OperationCheck for IsOwner {
    fn ok(&self, resource: &dyn PersistentResource, scope: &RequestScope, _: Option<&ChangeSpec>) -> bool {
        resource
            .attribute("owner")
            .and_then(|owner| owner.as_str())
            .is_some_and(|owner| owner == scope.user().name())
    }
}

/// Passes unless the pending change sets a negative number
#[derive(Default)]
pub struct NotNegative;

impl OperationCheck for NotNegative {
    fn ok(&self, _: &dyn PersistentResource, _: &RequestScope, change: Option<&ChangeSpec>) -> bool {
        change
            .and_then(|c| c.modified.as_f64())
            .map_or(true, |value| value >= 0.0)
    }
}

/// Registry with the aliases used throughout the tests
pub fn registry() -> CheckRegistry {
    let mut registry = CheckRegistry::default();
    registry.alias("A", role::ALL).unwrap();
    registry.alias("Allow", role::ALL).unwrap();
    registry.alias("Deny", role::NONE).unwrap();
    registry.alias("d", role::NONE).unwrap();
    registry.alias("user has all access", role::ALL).unwrap();
    registry.register_user::<Explodes>("explodes").unwrap();
    registry.register_operation::<IsOwner>("is owner").unwrap();
    registry
        .register_operation::<NotNegative>("price not negative")
        .unwrap();
    registry
}

pub fn book(id: &str, owner: &str) -> Arc<dyn PersistentResource> {
    Arc::new(
        Record::new("book", id)
            .with_attribute("owner", json!(owner))
            .with_attribute("price", json!(10)),
    )
}

pub fn scope(user: &str) -> Arc<RequestScope> {
    Arc::new(RequestScope::new(User::new(user)))
}
