/*!
 * Request Context
 * Acting principal and per-request data handed to checks
 */

use crate::monitoring::generate_request_id;
use ahash::{HashMap, HashSet};
use parking_lot::Mutex;
use std::any::Any;
use std::fmt;
use std::sync::Arc;
use std::time::SystemTime;
use uuid::Uuid;

/// The acting principal
///
/// The principal payload is opaque to the engine; checks downcast it.
#[derive(Clone)]
pub struct User {
    name: String,
    principal: Option<Arc<dyn Any + Send + Sync>>,
}

impl User {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            principal: None,
        }
    }

    pub fn anonymous() -> Self {
        Self::new("anonymous")
    }

    pub fn with_principal<T: Any + Send + Sync>(mut self, principal: T) -> Self {
        self.principal = Some(Arc::new(principal));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Principal payload, if one of type `T` was attached
    pub fn principal<T: Any>(&self) -> Option<&T> {
        self.principal.as_deref().and_then(|p| p.downcast_ref::<T>())
    }
}

impl fmt::Debug for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("User")
            .field("name", &self.name)
            .field("has_principal", &self.principal.is_some())
            .finish()
    }
}

/// Per-request state shared by every decision made for one request
pub struct RequestScope {
    request_id: Uuid,
    user: User,
    timestamp: SystemTime,
    metadata: HashMap<String, String>,
    failed_authorizations: Mutex<Vec<String>>,
}

impl RequestScope {
    pub fn new(user: User) -> Self {
        Self {
            request_id: generate_request_id(),
            user,
            timestamp: SystemTime::now(),
            metadata: HashMap::default(),
            failed_authorizations: Mutex::new(Vec::new()),
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn request_id(&self) -> &Uuid {
        &self.request_id
    }

    pub fn user(&self) -> &User {
        &self.user
    }

    pub fn timestamp(&self) -> SystemTime {
        self.timestamp
    }

    pub fn metadata(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).map(String::as_str)
    }

    /// Record the reason for a failed decision
    pub fn log_auth_failure(&self, reason: impl Into<String>) {
        self.failed_authorizations.lock().push(reason.into());
    }

    /// Number of failures logged so far, duplicates included
    pub fn auth_failure_count(&self) -> usize {
        self.failed_authorizations.lock().len()
    }

    /// Distinct failure reasons, in the order first seen
    pub fn auth_failure_reason(&self) -> String {
        let failures = self.failed_authorizations.lock();
        let mut seen: HashSet<&str> = HashSet::default();
        let mut buf = String::from("Failed authorization checks:\n");
        for reason in failures.iter() {
            if seen.insert(reason.as_str()) {
                buf.push_str(reason);
                buf.push('\n');
            }
        }
        buf
    }
}

impl fmt::Debug for RequestScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestScope")
            .field("request_id", &self.request_id)
            .field("user", &self.user)
            .finish_non_exhaustive()
    }
}
