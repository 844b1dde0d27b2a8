//! Utility modules.

/// `Duration` serialization helpers for result types.
pub mod duration;

/// Log sanitization utilities to prevent API keys and large bodies from reaching logs.
pub mod log_sanitizer;
