/*!
 * Engine Configuration
 * Runtime-tunable limits with defaults from `core::limits`
 */

use super::limits::{
    DEFAULT_RESULT_CACHE_CAPACITY, MAX_POLICY_EXPRESSION_LEN, MAX_POLICY_NESTING_DEPTH,
};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Environment variable overriding the result cache capacity
pub const ENV_CACHE_CAPACITY: &str = "PERMISSIONS_CACHE_CAPACITY";
/// Environment variable overriding the maximum expression length
pub const ENV_MAX_EXPRESSION_LEN: &str = "PERMISSIONS_MAX_EXPRESSION_LEN";
/// Environment variable overriding the maximum nesting depth
pub const ENV_MAX_DEPTH: &str = "PERMISSIONS_MAX_DEPTH";

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct EngineConfig {
    /// Maximum entries held by each per-request result cache
    pub cache_capacity: usize,
    /// Longest accepted policy expression, in bytes
    pub max_expression_len: usize,
    /// Deepest accepted nesting of parentheses / negations
    pub max_depth: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            cache_capacity: DEFAULT_RESULT_CACHE_CAPACITY,
            max_expression_len: MAX_POLICY_EXPRESSION_LEN,
            max_depth: MAX_POLICY_NESTING_DEPTH,
        }
    }
}

impl EngineConfig {
    /// Defaults, overridden by any `PERMISSIONS_*` environment variables that parse
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`EngineConfig::from_env`] with an explicit variable source
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(value) = read_usize(&lookup, ENV_CACHE_CAPACITY) {
            config.cache_capacity = value;
        }
        if let Some(value) = read_usize(&lookup, ENV_MAX_EXPRESSION_LEN) {
            config.max_expression_len = value;
        }
        if let Some(value) = read_usize(&lookup, ENV_MAX_DEPTH) {
            config.max_depth = value;
        }
        config
    }
}

fn read_usize<F>(lookup: &F, key: &str) -> Option<usize>
where
    F: Fn(&str) -> Option<String>,
{
    let raw = lookup(key)?;
    match raw.trim().parse::<usize>() {
        Ok(value) if value > 0 => Some(value),
        _ => {
            warn!(variable = key, value = %raw, "Ignoring invalid configuration override");
            None
        }
    }
}
