/*!
 * Entity Dictionary
 * Registry of bound model types; the metadata provider for the expression builder
 *
 * Built once at startup through `bind_entity`, then shared read-only (typically
 * behind an `Arc`) by every request.
 */

use super::entity::EntityPermissions;
use super::model::ModelDefinition;
use crate::core::config::EngineConfig;
use crate::core::errors::{PolicyError, PolicyResult};
use crate::permissions::checks::CheckRegistry;
use crate::permissions::policy::{PolicyCompiler, PolicyTree};
use crate::permissions::types::PermissionKind;
use ahash::{HashMap, HashSet};
use tracing::{info, warn};

#[derive(Debug, Clone)]
struct EntityBinding {
    fields: Vec<String>,
    permissions: EntityPermissions,
}

/// Bound model types and the check catalog they were compiled against
#[derive(Debug, Clone)]
pub struct EntityDictionary {
    checks: CheckRegistry,
    config: EngineConfig,
    entities: HashMap<String, EntityBinding>,
}

impl EntityDictionary {
    pub fn new(checks: CheckRegistry) -> Self {
        Self::with_config(checks, EngineConfig::default())
    }

    pub fn with_config(checks: CheckRegistry, config: EngineConfig) -> Self {
        Self {
            checks,
            config,
            entities: HashMap::default(),
        }
    }

    pub fn checks(&self) -> &CheckRegistry {
        &self.checks
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Register a model type, compiling all of its permissions
    ///
    /// Nothing is stored unless every permission compiles.
    pub fn bind_entity(&mut self, model: &ModelDefinition) -> PolicyResult<()> {
        let name = model.name.trim();
        if name.is_empty() {
            return Err(PolicyError::UnknownEntity(String::new()));
        }
        if self.entities.contains_key(name) {
            return Err(PolicyError::DuplicateEntity(name.to_string()));
        }

        let mut seen = HashSet::default();
        for field in model.field_names() {
            if !seen.insert(field) {
                return Err(PolicyError::invalid_configuration(
                    "field",
                    format!("{}.{}", name, field),
                    "field declared more than once",
                ));
            }
        }

        let compiler = PolicyCompiler::with_config(&self.checks, &self.config);
        let permissions = EntityPermissions::new(&compiler, model).map_err(|e| {
            warn!(entity = name, error = %e, "Rejected model binding");
            e
        })?;

        info!(
            entity = name,
            fields = model.fields.len(),
            kinds = permissions.bound_kinds().count(),
            "Bound entity"
        );
        self.entities.insert(
            name.to_string(),
            EntityBinding {
                fields: model.field_names().map(str::to_string).collect(),
                permissions,
            },
        );
        Ok(())
    }

    pub fn is_bound(&self, entity: &str) -> bool {
        self.entities.contains_key(entity)
    }

    /// Bound entity names, sorted
    pub fn entity_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.entities.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn entity_permissions(&self, entity: &str) -> PolicyResult<&EntityPermissions> {
        self.binding(entity).map(|b| &b.permissions)
    }

    /// Does `entity` configure `kind` anywhere? Unknown entities configure nothing.
    pub fn entity_has_checks_for_permission(&self, entity: &str, kind: PermissionKind) -> bool {
        self.entities
            .get(entity)
            .is_some_and(|b| b.permissions.has_checks_for_permission(kind))
    }

    pub fn permissions_for_class(&self, entity: &str, kind: PermissionKind) -> Option<&PolicyTree> {
        self.entities
            .get(entity)
            .and_then(|b| b.permissions.class_checks_for_permission(kind))
    }

    pub fn permissions_for_field(
        &self,
        entity: &str,
        field: &str,
        kind: PermissionKind,
    ) -> Option<&PolicyTree> {
        self.entities
            .get(entity)
            .and_then(|b| b.permissions.field_checks_for_permission(field, kind))
    }

    /// Declared fields of `entity`, in declaration order
    pub fn all_fields(&self, entity: &str) -> &[String] {
        self.entities
            .get(entity)
            .map(|b| b.fields.as_slice())
            .unwrap_or(&[])
    }

    fn binding(&self, entity: &str) -> PolicyResult<&EntityBinding> {
        self.entities
            .get(entity)
            .ok_or_else(|| PolicyError::UnknownEntity(entity.to_string()))
    }
}

impl Default for EntityDictionary {
    fn default() -> Self {
        Self::new(CheckRegistry::default())
    }
}
