/*!
 * Core Module
 * Fundamental types, limits, settings and error handling
 */

pub mod config;
pub mod errors;
pub mod limits;
pub mod types;

// Re-export for convenience
pub use config::MuxerSettings;
pub use errors::*;
pub use types::*;
