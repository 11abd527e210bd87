//! Core types for the sync engine.
//!
//! This module provides the session and per-stream state the controller
//! operates on, plus the millisecond time representation shared by every
//! other module.

pub mod session;
pub mod stream;
pub mod time;

// Re-export core data structures for easier access.
pub use session::Session;
pub use stream::{StreamIndex, StreamRecord};
pub use time::{format_compact, format_full, Sign, TimeMs, ZERO};
