//! wgpu render backend for the volume renderer.
//!
//! Draws a single 36-vertex cube whose fragments ray-march a 3D density
//! texture. The frame loop talks to it only through `RenderBackend`.
//!
//! # Invariants
//! - The uniform buffer is exactly one `FrameUniforms` block (256 bytes).
//! - Bind group layout: 0 uniforms, 1 volume texture, 2 sampler, 3 material table (optional).
//! - The backend never reads camera or input state.

mod gpu;
mod mesh;
mod shaders;

pub use gpu::{FrameOverlay, GpuError, OverlayTarget, WgpuBackend};
pub use mesh::{CUBE_VERTEX_STRIDE, CubeVertex, cube_vertices};
pub use shaders::volume_shader;
