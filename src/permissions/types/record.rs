/*!
 * In-memory Record
 * A field map implementation of PersistentResource
 */

use super::core::ChangeSpec;
use super::traits::PersistentResource;
use ahash::HashMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::any::Any;

/// Resource backed by a map of attribute values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    resource_type: String,
    id: String,
    #[serde(default)]
    attributes: HashMap<String, Value>,
}

impl Record {
    pub fn new(resource_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            resource_type: resource_type.into(),
            id: id.into(),
            attributes: HashMap::default(),
        }
    }

    pub fn with_attribute(mut self, field: impl Into<String>, value: Value) -> Self {
        self.attributes.insert(field.into(), value);
        self
    }

    /// Describe a change of `field` to `value` without applying it
    pub fn change(&self, field: &str, value: Value) -> ChangeSpec {
        let original = self.attributes.get(field).cloned().unwrap_or(Value::Null);
        ChangeSpec::new(field, original, value)
    }

    /// Apply a change, returning the previous value
    pub fn apply(&mut self, change: &ChangeSpec) -> Option<Value> {
        self.attributes
            .insert(change.field.clone(), change.modified.clone())
    }
}

impl PersistentResource for Record {
    fn resource_type(&self) -> &str {
        &self.resource_type
    }

    fn id(&self) -> &str {
        &self.id
    }

    fn attribute(&self, field: &str) -> Option<&Value> {
        self.attributes.get(field)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
