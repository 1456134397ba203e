//! Input State: held keys and look-mode mouse deltas, independent of the host windowing layer.
//!
//! # Invariants
//! - Hosts only queue events; the frame loop drains them once per tick.
//! - The accumulated mouse delta is reset exactly once per tick, by `consume_mouse_delta`.

pub mod action;
pub mod state;

pub use action::{Key, KeyBindings, Movement};
pub use state::{InputEvent, InputState};

pub fn crate_info() -> &'static str {
    "volray-input v0.1.0"
}
