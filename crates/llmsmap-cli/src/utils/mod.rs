//! Shared helpers for the CLI commands.
//!
//! - [`logging`]: tracing subscriber and color control
//! - [`formatting`]: sizes and counts for terminal summaries

pub mod formatting;
pub mod logging;

pub use logging::initialize_logging;
