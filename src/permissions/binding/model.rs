/*!
 * Model Definitions
 * Explicit registration input: a type, its fields and their permission sources
 */

use crate::permissions::policy::PermissionSource;
use crate::permissions::types::PermissionKind;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One declared field of a model
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct FieldDefinition {
    pub name: String,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub permissions: BTreeMap<PermissionKind, PermissionSource>,
}

impl FieldDefinition {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            permissions: BTreeMap::new(),
        }
    }
}

/// A data-model type as seen by the permission engine
///
/// Field order is declaration order and is preserved for any-field decisions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct ModelDefinition {
    pub name: String,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub permissions: BTreeMap<PermissionKind, PermissionSource>,
    pub fields: Vec<FieldDefinition>,
}

impl ModelDefinition {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Attach an entity-level permission
    pub fn permission(mut self, kind: PermissionKind, source: PermissionSource) -> Self {
        self.permissions.insert(kind, source);
        self
    }

    /// Declare a field without permissions
    pub fn field(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        if self.field_mut(&name).is_none() {
            self.fields.push(FieldDefinition::new(name));
        }
        self
    }

    /// Attach a field-level permission, declaring the field if needed
    pub fn field_permission(
        mut self,
        name: impl Into<String>,
        kind: PermissionKind,
        source: PermissionSource,
    ) -> Self {
        let name = name.into();
        if self.field_mut(&name).is_none() {
            self.fields.push(FieldDefinition::new(name.clone()));
        }
        if let Some(field) = self.field_mut(&name) {
            field.permissions.insert(kind, source);
        }
        self
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }

    fn field_mut(&mut self, name: &str) -> Option<&mut FieldDefinition> {
        self.fields.iter_mut().find(|f| f.name == name)
    }
}
