//! Rendering core: camera integration, frame uniform encoding, backend interface.
//!
//! # Invariants
//! - Uniform block offsets are fixed; the shader reads them blind.
//! - Backends never see camera or input state, only encoded bytes and the volume.
//! - Degenerate transforms are reported, never encoded as NaNs.

pub mod backend;
pub mod camera;
mod error;
pub mod projection;
pub mod uniforms;

pub use backend::{BackendCall, CUBE_VERTEX_COUNT, DrawStatus, RecordingBackend, RenderBackend};
pub use camera::{CameraBasis, CameraController, CameraState, CameraView, MAX_PITCH};
pub use error::RenderError;
pub use projection::Projection;
pub use uniforms::{FRAME_UNIFORMS_SIZE, FrameUniforms, encode};
pub use volray_common::CameraMode;

pub fn crate_info() -> &'static str {
    "volray-render v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("render"));
    }
}
