/*!
 * System Limits and Constants
 *
 * Centralized location for engine-wide limits and defaults.
 * Organized by domain for maintainability and discoverability.
 *
 * - Performance-critical constants are marked with [PERF]
 * - Security-critical constants are marked with [SECURITY]
 */

// =============================================================================
// POLICY COMPILER LIMITS
// =============================================================================

/// Maximum length of a single policy expression (4KB)
/// Applies to synthesized all/any expressions as well as free-form text
/// [SECURITY] Bounds compile work for untrusted manifests
pub const MAX_POLICY_EXPRESSION_LEN: usize = 4 * 1024;

/// Maximum nesting depth of parentheses and negations
/// The parser and evaluator recurse once per level
/// [SECURITY] Prevents stack exhaustion on hostile input
pub const MAX_POLICY_NESTING_DEPTH: usize = 64;

// =============================================================================
// RESULT CACHE
// =============================================================================

/// Maximum entries held by a per-request result cache
/// [PERF] Most requests touch a handful of resources and checks
pub const DEFAULT_RESULT_CACHE_CAPACITY: usize = 4 * 1024;

// =============================================================================
// SECURITY & AUDIT
// =============================================================================

/// Maximum audit events kept in memory (ring buffer)
pub const MAX_AUDIT_EVENTS: usize = 10_000;

/// Maximum audit events kept per resource type
pub const MAX_AUDIT_EVENTS_PER_TYPE: usize = 100;
