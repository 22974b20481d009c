/*!
 * Monitoring
 * Structured logging setup and operation spans
 */

mod tracer;

pub use tracer::{init_tracing, span_operation, OperationSpan, LOG_JSON_ENV};
