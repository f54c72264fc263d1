/*!
 * Model Manifest
 * Declarative JSON registration of check aliases and model definitions
 *
 * ```json
 * {
 *   "checks": { "is admin": "Prefab.Role.All" },
 *   "models": [
 *     {
 *       "name": "book",
 *       "permissions": { "read": { "expression": "is admin" } },
 *       "fields": [{ "name": "title" }]
 *     }
 *   ]
 * }
 * ```
 */

use crate::core::config::EngineConfig;
use crate::core::errors::PolicyResult;
use crate::permissions::binding::{EntityDictionary, ModelDefinition};
use crate::permissions::checks::CheckRegistry;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::info;

/// Serialized model registration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct ModelManifest {
    /// Alias -> already registered check identifier
    pub checks: BTreeMap<String, String>,
    pub models: Vec<ModelDefinition>,
}

impl ModelManifest {
    pub fn from_json(json: &str) -> PolicyResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> PolicyResult<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)?;
        let manifest = Self::from_json(&raw)?;
        info!(
            path = %path.display(),
            checks = manifest.checks.len(),
            models = manifest.models.len(),
            "Loaded model manifest"
        );
        Ok(manifest)
    }

    /// Register the aliases in `checks`, then bind every model in order
    pub fn into_dictionary(self, checks: CheckRegistry) -> PolicyResult<EntityDictionary> {
        self.into_dictionary_with(checks, EngineConfig::default())
    }

    pub fn into_dictionary_with(
        self,
        mut checks: CheckRegistry,
        config: EngineConfig,
    ) -> PolicyResult<EntityDictionary> {
        for (alias, target) in &self.checks {
            checks.alias(alias, target)?;
        }

        let mut dictionary = EntityDictionary::with_config(checks, config);
        for model in &self.models {
            dictionary.bind_entity(model)?;
        }
        Ok(dictionary)
    }
}
