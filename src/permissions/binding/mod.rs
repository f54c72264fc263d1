/*!
 * Permission Binding
 * Model registration and the per-type permission binding table
 */

mod dictionary;
mod entity;
mod model;

pub use dictionary::EntityDictionary;
pub use entity::EntityPermissions;
pub use model::{FieldDefinition, ModelDefinition};
