/*!
 * Structured Tracing
 * Subscriber setup and timed spans around muxer operations
 */

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tracing::{debug, info, span, warn, Level};
use tracing_subscriber::{
    fmt::format::FmtSpan, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter,
};

/// Set to `1` or `true` for JSON log lines
pub const LOG_JSON_ENV: &str = "TRACEMUX_LOG_JSON";

/// Operations slower than this get a warning
const SLOW_OPERATION: Duration = Duration::from_millis(10);

static NEXT_OPERATION_ID: AtomicU64 = AtomicU64::new(1);

/// Initialize structured tracing
///
/// Environment variables:
/// - RUST_LOG: Set log level (default: info)
/// - TRACEMUX_LOG_JSON: Enable JSON output (default: false)
///
/// Later calls leave the first subscriber in place.
pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let use_json = std::env::var(LOG_JSON_ENV)
        .map(|v| v == "1" || v == "true")
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(env_filter);

    let installed = if use_json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_line_number(true)
                    .with_file(true)
                    .with_current_span(true)
                    .with_span_list(true)
                    .with_span_events(FmtSpan::CLOSE),
            )
            .try_init()
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_line_number(true)
                    .with_span_events(FmtSpan::CLOSE)
                    .compact(),
            )
            .try_init()
    };

    if installed.is_ok() {
        info!(json = use_json, "Structured tracing initialized");
    }
}

/// Span covering one muxer operation
///
/// Logs its duration when dropped.
pub struct OperationSpan {
    span: tracing::Span,
    start: Instant,
    operation: &'static str,
    operation_id: u64,
}

impl OperationSpan {
    pub fn new(operation: &'static str) -> Self {
        let operation_id = NEXT_OPERATION_ID.fetch_add(1, Ordering::Relaxed);
        let span = span!(
            Level::DEBUG,
            "muxer",
            operation = operation,
            operation_id = operation_id,
            session = tracing::field::Empty,
            result = tracing::field::Empty,
            duration_us = tracing::field::Empty,
        );

        Self {
            span,
            start: Instant::now(),
            operation,
            operation_id,
        }
    }

    /// Attach the session the operation is about
    pub fn record_session(&self, session: impl std::fmt::Display) {
        self.span
            .record("session", tracing::field::display(session));
    }

    pub fn record_result(&self, success: bool) {
        self.span
            .record("result", if success { "success" } else { "error" });
    }

    /// Enter the span for the current scope
    pub fn enter(&self) -> tracing::span::Entered<'_> {
        self.span.enter()
    }
}

impl Drop for OperationSpan {
    fn drop(&mut self) {
        let duration = self.start.elapsed();
        let _entered = self.span.enter();
        self.span
            .record("duration_us", duration.as_micros() as u64);

        if duration > SLOW_OPERATION {
            warn!(
                operation = self.operation,
                operation_id = self.operation_id,
                duration_ms = duration.as_millis() as u64,
                slow = true,
                "slow muxer operation"
            );
        } else {
            debug!(
                operation = self.operation,
                operation_id = self.operation_id,
                duration_us = duration.as_micros() as u64,
                "muxer operation completed"
            );
        }
    }
}

/// Start a span for `operation`
pub fn span_operation(operation: &'static str) -> OperationSpan {
    OperationSpan::new(operation)
}
