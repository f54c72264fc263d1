/*!
 * Permission Audit Trail
 * Tracks authorization decisions and denials for monitoring
 */

use crate::core::limits::{MAX_AUDIT_EVENTS, MAX_AUDIT_EVENTS_PER_TYPE};
use crate::permissions::expression::{ExpressionResult, Status};
use crate::permissions::types::PermissionKind;
use ahash::RandomState;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, TimestampSeconds};
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::SystemTime;
use uuid::Uuid;

/// Phase a decision was made in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionPhase {
    /// User-only pre-check
    User,
    /// Pre-commit evaluation
    Operation,
    /// Post-commit evaluation
    Commit,
}

/// Audit event severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditSeverity {
    Info,
    Warning,
    Critical,
}

/// One authorization decision
#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct AuditEvent {
    pub request_id: Uuid,
    pub resource_type: String,
    pub kind: PermissionKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    pub phase: DecisionPhase,
    pub result: ExpressionResult,
    pub severity: AuditSeverity,
    #[serde_as(as = "TimestampSeconds<i64>")]
    pub logged_at: SystemTime,
}

impl AuditEvent {
    pub fn new(
        request_id: Uuid,
        resource_type: impl Into<String>,
        kind: PermissionKind,
        field: Option<&str>,
        phase: DecisionPhase,
        result: ExpressionResult,
    ) -> Self {
        let severity = match (result.status, phase) {
            (Status::Pass, _) => AuditSeverity::Info,
            // Denied at commit means the change was already applied
            (Status::Fail, DecisionPhase::Commit) => AuditSeverity::Critical,
            (Status::Fail, _) => AuditSeverity::Warning,
            (Status::Deferred, DecisionPhase::Commit) => AuditSeverity::Critical,
            (Status::Deferred, _) => AuditSeverity::Info,
        };

        Self {
            request_id,
            resource_type: resource_type.into(),
            kind,
            field: field.map(str::to_string),
            phase,
            result,
            severity,
            logged_at: SystemTime::now(),
        }
    }

    pub fn with_severity(mut self, severity: AuditSeverity) -> Self {
        self.severity = severity;
        self
    }

    pub fn is_denied(&self) -> bool {
        self.result.is_fail()
    }
}

/// Audit logger for authorization decisions
///
/// Unlike the result cache this is process-wide and shared between requests.
pub struct AuditLogger {
    /// Global event log (ring buffer)
    events: parking_lot::RwLock<VecDeque<AuditEvent>>,
    /// Per-type event logs
    type_events: Arc<DashMap<String, VecDeque<AuditEvent>, RandomState>>,
    /// Denial counters for monitoring
    denial_counts: Arc<DashMap<String, u64, RandomState>>,
}

impl AuditLogger {
    pub fn new() -> Self {
        Self {
            events: parking_lot::RwLock::new(VecDeque::with_capacity(MAX_AUDIT_EVENTS.min(1024))),
            type_events: Arc::new(DashMap::with_hasher(RandomState::new())),
            denial_counts: Arc::new(DashMap::with_hasher(RandomState::new())),
        }
    }

    /// Log a decision
    pub fn log(&self, event: AuditEvent) {
        let resource_type = event.resource_type.clone();
        let is_denied = event.is_denied();

        // Add to global log
        {
            let mut events = self.events.write();
            if events.len() >= MAX_AUDIT_EVENTS {
                events.pop_front();
            }
            events.push_back(event.clone());
        }

        // Add to type-specific log, trimming if needed
        {
            let mut entry = self
                .type_events
                .entry(resource_type.clone())
                .or_insert_with(|| VecDeque::with_capacity(MAX_AUDIT_EVENTS_PER_TYPE));
            entry.push_back(event);
            if entry.len() > MAX_AUDIT_EVENTS_PER_TYPE {
                entry.pop_front();
            }
        }

        // Track denials
        if is_denied {
            self.denial_counts
                .entry(resource_type)
                .and_modify(|count| *count += 1)
                .or_insert(1);
        }
    }

    /// Get recent events, newest first
    pub fn recent(&self, limit: usize) -> Vec<AuditEvent> {
        let events = self.events.read();
        events.iter().rev().take(limit).cloned().collect()
    }

    /// Get events for a resource type, newest first
    pub fn for_type(&self, resource_type: &str, limit: usize) -> Vec<AuditEvent> {
        if let Some(entry) = self.type_events.get(resource_type) {
            entry.iter().rev().take(limit).cloned().collect()
        } else {
            Vec::new()
        }
    }

    /// Get events recorded for one request, oldest first
    pub fn for_request(&self, request_id: &Uuid) -> Vec<AuditEvent> {
        let events = self.events.read();
        events
            .iter()
            .filter(|e| &e.request_id == request_id)
            .cloned()
            .collect()
    }

    /// Get denial count for a resource type
    pub fn denial_count(&self, resource_type: &str) -> u64 {
        self.denial_counts
            .get(resource_type)
            .map(|e| *e)
            .unwrap_or(0)
    }

    /// Get all resource types with denials, sorted by name
    pub fn types_with_denials(&self) -> Vec<(String, u64)> {
        let mut out: Vec<(String, u64)> = self
            .denial_counts
            .iter()
            .map(|entry| (entry.key().clone(), *entry.value()))
            .collect();
        out.sort();
        out
    }

    /// Clear logs for a resource type
    pub fn clear_type(&self, resource_type: &str) {
        self.type_events.remove(resource_type);
        self.denial_counts.remove(resource_type);
    }

    /// Clear all logs
    pub fn clear_all(&self) {
        self.events.write().clear();
        self.type_events.clear();
        self.denial_counts.clear();
    }

    /// Get statistics
    pub fn stats(&self) -> AuditStats {
        let total_events = self.events.read().len();
        let total_denials: u64 = self.denial_counts.iter().map(|e| *e.value()).sum();
        let types_tracked = self.type_events.len();

        AuditStats {
            total_events,
            total_denials,
            types_tracked,
        }
    }
}

impl Default for AuditLogger {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for AuditLogger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuditLogger")
            .field("stats", &self.stats())
            .finish()
    }
}

/// Audit statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditStats {
    pub total_events: usize,
    pub total_denials: u64,
    pub types_tracked: usize,
}
