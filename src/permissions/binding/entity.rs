/*!
 * Entity Permissions
 * Per-type binding of each permission kind to its compiled policy trees
 */

use super::model::ModelDefinition;
use crate::core::errors::PolicyResult;
use crate::permissions::policy::{PolicyCompiler, PolicyTree};
use crate::permissions::types::PermissionKind;
use ahash::HashMap;
use std::collections::BTreeMap;
use tracing::debug;

/// Entity-level tree plus field-level trees for one permission kind
#[derive(Debug, Clone, Default)]
struct AnnotationBinding {
    class_permission: Option<PolicyTree>,
    field_permissions: HashMap<String, PolicyTree>,
}

/// Permission binding table for one model type
///
/// A kind is bound only when the type or one of its fields configures it; an
/// unbound kind means "no restriction configured".
#[derive(Debug, Clone, Default)]
pub struct EntityPermissions {
    bindings: BTreeMap<PermissionKind, AnnotationBinding>,
}

impl EntityPermissions {
    /// Compile every permission declared by `model`; any failure aborts the whole binding
    pub fn new(compiler: &PolicyCompiler<'_>, model: &ModelDefinition) -> PolicyResult<Self> {
        let mut bindings = BTreeMap::new();

        for kind in PermissionKind::ALL {
            let class_permission = match model.permissions.get(&kind) {
                Some(source) => Some(compiler.compile_source(kind, &model.name, source)?),
                None => None,
            };

            let mut field_permissions = HashMap::default();
            for field in &model.fields {
                if let Some(source) = field.permissions.get(&kind) {
                    let target = format!("{}.{}", model.name, field.name);
                    let tree = compiler.compile_source(kind, &target, source)?;
                    field_permissions.insert(field.name.clone(), tree);
                }
            }

            if class_permission.is_some() || !field_permissions.is_empty() {
                debug!(
                    entity = %model.name,
                    %kind,
                    class = class_permission.is_some(),
                    fields = field_permissions.len(),
                    "Bound permission"
                );
                bindings.insert(
                    kind,
                    AnnotationBinding {
                        class_permission,
                        field_permissions,
                    },
                );
            }
        }

        Ok(Self { bindings })
    }

    /// Does this permission exist for the entity or any field?
    pub fn has_checks_for_permission(&self, kind: PermissionKind) -> bool {
        self.bindings.contains_key(&kind)
    }

    /// Entity-level tree, if configured
    pub fn class_checks_for_permission(&self, kind: PermissionKind) -> Option<&PolicyTree> {
        self.bindings
            .get(&kind)
            .and_then(|b| b.class_permission.as_ref())
    }

    /// Field-level tree, if configured
    pub fn field_checks_for_permission(&self, field: &str, kind: PermissionKind) -> Option<&PolicyTree> {
        self.bindings
            .get(&kind)
            .and_then(|b| b.field_permissions.get(field))
    }

    /// Kinds with a binding
    pub fn bound_kinds(&self) -> impl Iterator<Item = PermissionKind> + '_ {
        self.bindings.keys().copied()
    }
}
