/*!
 * AI-OS Permissions Library
 * Policy expression engine exposed as a library
 */

pub mod core;
pub mod monitoring;
pub mod permissions;

// Re-exports
pub use crate::core::{EngineConfig, PolicyError, PolicyResult};
pub use monitoring::init_tracing;
pub use permissions::{
    CheckRegistry, EntityDictionary, ModelDefinition, ModelManifest, PermissionExecutor,
    PermissionKind, PermissionSource, RequestScope, User,
};
