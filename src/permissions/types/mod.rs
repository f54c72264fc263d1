/*!
 * Permission Types Module
 * Core types and traits for the permission engine
 */

mod core;
mod record;
mod traits;

pub use self::core::{ChangeId, ChangeSpec, PermissionKind, ResourceIdentity};
pub use record::Record;
pub use traits::PersistentResource;
