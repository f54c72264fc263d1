/*!
 * Monitoring
 * Structured tracing for authorization decisions
 */

mod tracer;

pub use tracer::{generate_request_id, init_tracing, DecisionSpan, ENV_TRACE_JSON};
