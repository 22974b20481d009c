/*!
 * Error Types
 * Centralized error handling with thiserror, miette, and serde support
 */

use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised by a control-file accessor
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "error_type")]
pub enum FacilityError {
    #[error("Failed to write {path}: {reason}")]
    WriteFailed { path: String, reason: String },

    #[error("Failed to read {path}: {reason}")]
    ReadFailed { path: String, reason: String },

    #[error("Operation not supported by this facility: {operation}")]
    Unsupported { operation: String },

    #[error("tracefs is not mounted")]
    NotMounted,
}

/// Result type for control-file operations
pub type FacilityResult<T> = Result<T, FacilityError>;

/// Errors that make a muxer operation fail as a whole
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Diagnostic)]
#[serde(tag = "error_type", content = "details", rename_all = "snake_case")]
pub enum MuxerError {
    #[error("Tracing is already enabled by another agent")]
    #[diagnostic(
        code(muxer::tracing_in_use),
        help("Another tool owns tracing_on. Stop it before starting a session.")
    )]
    TracingInUse,

    #[error("Tracing was disabled behind our back")]
    #[diagnostic(
        code(muxer::tracing_disabled_externally),
        help("An external agent wrote tracing_on while sessions were active.")
    )]
    TracingDisabledExternally,

    #[error("Current tracer is busy: {tracer}")]
    #[diagnostic(
        code(muxer::tracer_busy),
        help("function_graph needs the nop tracer. Reset the tracer first.")
    )]
    TracerBusy { tracer: String },

    #[error("Facility write failed: {0}")]
    #[diagnostic(code(muxer::facility))]
    Facility(#[from] FacilityError),

    #[error("Session id space exhausted")]
    #[diagnostic(code(muxer::ids_exhausted))]
    IdsExhausted,
}

/// Result type for muxer internals
pub type MuxerResult<T> = Result<T, MuxerError>;

/// Errors raised while building lookup tables
#[derive(Error, Debug)]
pub enum TableError {
    #[error("I/O error reading {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed event id in {path}: {value}")]
    MalformedId { path: String, value: String },
}

/// Result type for table loading
pub type TableResult<T> = Result<T, TableError>;
