/*!
 * Permission Traits
 * Interfaces the engine consumes from the data layer
 */

use super::core::ResourceIdentity;
use serde_json::Value;
use std::any::Any;
use std::fmt::Debug;

/// Accessor for a candidate resource
///
/// The engine only needs a stable identity and field values; operation checks may
/// downcast through [`PersistentResource::as_any`] to reach the concrete model.
pub trait PersistentResource: Debug + Send + Sync {
    /// Type name the resource was registered under
    fn resource_type(&self) -> &str;

    /// Identifier, unique within the resource type
    fn id(&self) -> &str;

    /// Current value of a field, if present
    fn attribute(&self, field: &str) -> Option<&Value>;

    fn as_any(&self) -> &dyn Any;

    fn identity(&self) -> ResourceIdentity {
        ResourceIdentity::new(self.resource_type(), self.id())
    }
}
