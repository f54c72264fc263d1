/*!
 * Check Registry
 * Explicit name -> factory catalog; unknown names fail at bind time
 */

use super::prefab;
use super::{Check, CheckId, CheckInstance, CheckKind, OperationCheck, UserCheck};
use crate::core::errors::{PolicyError, PolicyResult};
use ahash::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

type MakeCheck = dyn Fn() -> Check + Send + Sync;

/// Constructor for one registered check identifier
#[derive(Clone)]
pub struct CheckFactory {
    identifier: Arc<str>,
    id: CheckId,
    kind: CheckKind,
    make: Arc<MakeCheck>,
}

impl CheckFactory {
    pub(crate) fn user<C, F>(identifier: &str, make: F) -> Self
    where
        C: UserCheck + 'static,
        F: Fn() -> C + Send + Sync + 'static,
    {
        Self {
            identifier: Arc::from(identifier),
            id: CheckId::new::<C>(),
            kind: CheckKind::User,
            make: Arc::new(move || Check::User(Box::new(make()))),
        }
    }

    pub(crate) fn operation<C, F>(identifier: &str, make: F) -> Self
    where
        C: OperationCheck + 'static,
        F: Fn() -> C + Send + Sync + 'static,
    {
        Self {
            identifier: Arc::from(identifier),
            id: CheckId::new::<C>(),
            kind: CheckKind::Operation,
            make: Arc::new(move || Check::Operation(Box::new(make()))),
        }
    }

    /// Same check under another name
    fn renamed(&self, identifier: &str) -> Self {
        Self {
            identifier: Arc::from(identifier),
            ..self.clone()
        }
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn id(&self) -> CheckId {
        self.id
    }

    pub fn kind(&self) -> CheckKind {
        self.kind
    }

    /// Produce a fresh instance; instances never carry state between uses
    pub fn instantiate(&self) -> CheckInstance {
        CheckInstance::new(self.identifier.clone(), self.id, (self.make)())
    }
}

impl fmt::Debug for CheckFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CheckFactory")
            .field("identifier", &self.identifier)
            .field("id", &self.id)
            .field("kind", &self.kind)
            .finish()
    }
}

/// Catalog of checks available to policy expressions
#[derive(Clone, Debug)]
pub struct CheckRegistry {
    factories: HashMap<String, CheckFactory>,
}

impl CheckRegistry {
    /// Registry without the prefab checks
    pub fn empty() -> Self {
        Self {
            factories: HashMap::default(),
        }
    }

    /// Register a user check constructed through `Default`
    pub fn register_user<C>(&mut self, identifier: &str) -> PolicyResult<()>
    where
        C: UserCheck + Default + 'static,
    {
        self.register_user_with(identifier, C::default)
    }

    /// Register an operation check constructed through `Default`
    pub fn register_operation<C>(&mut self, identifier: &str) -> PolicyResult<()>
    where
        C: OperationCheck + Default + 'static,
    {
        self.register_operation_with(identifier, C::default)
    }

    /// Register a user check with a custom constructor
    ///
    /// Every registration is a distinct check, even when `C` is shared with
    /// another registration.
    pub fn register_user_with<C, F>(&mut self, identifier: &str, make: F) -> PolicyResult<()>
    where
        C: UserCheck + 'static,
        F: Fn() -> C + Send + Sync + 'static,
    {
        let identifier = Self::validate(identifier)?;
        self.insert(CheckFactory::user(identifier, make))
    }

    /// Register an operation check with a custom constructor
    ///
    /// Every registration is a distinct check, even when `C` is shared with
    /// another registration.
    pub fn register_operation_with<C, F>(&mut self, identifier: &str, make: F) -> PolicyResult<()>
    where
        C: OperationCheck + 'static,
        F: Fn() -> C + Send + Sync + 'static,
    {
        let identifier = Self::validate(identifier)?;
        self.insert(CheckFactory::operation(identifier, make))
    }

    /// Register `alias` as another name for an already registered check
    ///
    /// The alias keeps the target's identity and shares its cached results.
    pub fn alias(&mut self, alias: &str, target: &str) -> PolicyResult<()> {
        let alias = Self::validate(alias)?;
        let factory = self.resolve(target)?.renamed(alias);
        self.insert(factory)
    }

    fn validate(identifier: &str) -> PolicyResult<&str> {
        let trimmed = identifier.trim();
        if trimmed.is_empty() {
            return Err(PolicyError::invalid_configuration(
                "check",
                identifier,
                "empty check identifier",
            ));
        }
        Ok(trimmed)
    }

    fn insert(&mut self, factory: CheckFactory) -> PolicyResult<()> {
        if self.factories.contains_key(factory.identifier()) {
            return Err(PolicyError::DuplicateCheck(factory.identifier().to_string()));
        }

        debug!(
            check = factory.identifier(),
            implementation = %factory.id,
            kind = ?factory.kind,
            "Registered check"
        );
        self.factories
            .insert(factory.identifier().to_string(), factory);
        Ok(())
    }

    pub fn get(&self, identifier: &str) -> Option<&CheckFactory> {
        self.factories.get(identifier)
    }

    /// Look up a check, failing with `UnknownCheck`
    pub fn resolve(&self, identifier: &str) -> PolicyResult<&CheckFactory> {
        self.get(identifier)
            .ok_or_else(|| PolicyError::UnknownCheck(identifier.to_string()))
    }

    pub fn contains(&self, identifier: &str) -> bool {
        self.factories.contains_key(identifier)
    }

    pub fn identifiers(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}

impl Default for CheckRegistry {
    /// Registry pre-loaded with the prefab checks
    fn default() -> Self {
        let mut registry = Self::empty();
        for factory in prefab::factories() {
            registry
                .factories
                .insert(factory.identifier().to_string(), factory);
        }
        registry
    }
}
