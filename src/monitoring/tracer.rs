/*!
 * Decision Tracing
 * Structured tracing for authorization decisions using the tracing crate
 *
 * Features:
 * - Request id correlation on every decision span
 * - JSON-formatted logs for structured parsing
 * - Slow decision warnings
 */

use std::time::Instant;
use tracing::{debug, info, span, warn, Level};
use tracing_subscriber::{fmt::format::FmtSpan, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use uuid::Uuid;

/// Environment variable enabling JSON output
pub const ENV_TRACE_JSON: &str = "PERMISSIONS_TRACE_JSON";

/// Decisions slower than this are reported at warn level
const SLOW_DECISION_MICROS: u128 = 1_000;

/// Initialize structured tracing
///
/// Environment variables:
/// - RUST_LOG: Set log level (default: info)
/// - PERMISSIONS_TRACE_JSON: Enable JSON output (default: false)
pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let use_json = std::env::var(ENV_TRACE_JSON)
        .map(|v| v == "1" || v == "true")
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(env_filter);

    if use_json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(true)
                    .with_line_number(true)
                    .with_file(true)
                    .with_current_span(true)
                    .with_span_list(true)
                    .with_span_events(FmtSpan::CLOSE),
            )
            .init();
        info!("Structured tracing initialized with JSON output");
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_line_number(true)
                    .with_span_events(FmtSpan::CLOSE)
                    .compact(),
            )
            .init();
        info!("Structured tracing initialized");
    }
}

/// Generate a unique id for request correlation
pub fn generate_request_id() -> Uuid {
    Uuid::new_v4()
}

/// Span covering one authorization decision
pub struct DecisionSpan {
    span: tracing::Span,
    start: Instant,
    operation: &'static str,
}

impl DecisionSpan {
    pub fn new(operation: &'static str, request_id: &Uuid, resource_type: &str, kind: &str) -> Self {
        let span = span!(
            Level::DEBUG,
            "decision",
            request_id = %request_id,
            operation = operation,
            resource_type = resource_type,
            kind = kind,
            field = tracing::field::Empty,
            status = tracing::field::Empty,
        );

        Self {
            span,
            start: Instant::now(),
            operation,
        }
    }

    /// Record the field being authorized
    pub fn record_field(&self, field: &str) {
        self.span.record("field", field);
    }

    /// Record the decision outcome
    pub fn record_status(&self, status: &str) {
        self.span.record("status", status);
    }

    /// Enter the span context
    pub fn enter(&self) -> tracing::span::Entered<'_> {
        self.span.enter()
    }
}

impl Drop for DecisionSpan {
    fn drop(&mut self) {
        let elapsed = self.start.elapsed().as_micros();
        let _entered = self.span.enter();
        if elapsed > SLOW_DECISION_MICROS {
            warn!(operation = self.operation, duration_us = elapsed, slow = true, "slow decision");
        } else {
            debug!(operation = self.operation, duration_us = elapsed, "decision completed");
        }
    }
}
