//! Orchestrator - fixed-step driver
//!
//! See `engine.rs` for full implementation.

pub mod engine;

// Re-export main types for convenience
pub use engine::{DriverError, DriverState, TickDriver, TickResult};
