//! Frame Loop: owns the engine state and runs one synchronous tick per display refresh.
//!
//! # Invariants
//! - Exactly one tick runs at a time; nothing inside a tick blocks.
//! - Input is drained at the start of a tick and the mouse delta is reset once per tick.
//! - The volume is uploaded to the backend once; it is immutable after generation.

pub mod engine;

pub use engine::{EngineError, EngineState, FrameClock, FrameOutcome, FrameStats};

pub fn crate_info() -> &'static str {
    "volray-kernel v0.1.0"
}
