//! Frame State Encoder: the fixed 256-byte uniform block read by the ray-march shader.
//!
//! | offset | field |
//! |---|---|
//! | 0 | `projection * view * model` |
//! | 64 | inverse view |
//! | 128 | inverse model |
//! | 192 | viewport `(w, h, 0)`, padded to 16 |
//! | 208 | camera position, padded to 16 |
//! | 224 | light direction, `w = 1` when present, all zero otherwise |
//! | 240 | reserved |
//!
//! Floats are little-endian on every supported target.

use crate::camera::CameraView;
use crate::error::RenderError;
use crate::projection::Projection;
use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3, Vec4};
use std::mem::{offset_of, size_of};
use volray_common::Viewport;

pub const MVP_OFFSET: usize = 0;
pub const INV_VIEW_OFFSET: usize = 64;
pub const INV_MODEL_OFFSET: usize = 128;
pub const VIEWPORT_OFFSET: usize = 192;
pub const CAMERA_POSITION_OFFSET: usize = 208;
pub const LIGHT_DIRECTION_OFFSET: usize = 224;
pub const FRAME_UNIFORMS_SIZE: usize = 256;

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct FrameUniforms {
    pub mvp: [[f32; 4]; 4],
    pub inv_view: [[f32; 4]; 4],
    pub inv_model: [[f32; 4]; 4],
    pub viewport: [f32; 4],
    pub camera_position: [f32; 4],
    pub light_direction: [f32; 4],
    pub reserved: [f32; 4],
}

const _: () = {
    assert!(size_of::<FrameUniforms>() == FRAME_UNIFORMS_SIZE);
    assert!(offset_of!(FrameUniforms, mvp) == MVP_OFFSET);
    assert!(offset_of!(FrameUniforms, inv_view) == INV_VIEW_OFFSET);
    assert!(offset_of!(FrameUniforms, inv_model) == INV_MODEL_OFFSET);
    assert!(offset_of!(FrameUniforms, viewport) == VIEWPORT_OFFSET);
    assert!(offset_of!(FrameUniforms, camera_position) == CAMERA_POSITION_OFFSET);
    assert!(offset_of!(FrameUniforms, light_direction) == LIGHT_DIRECTION_OFFSET);
};

impl Default for FrameUniforms {
    fn default() -> Self {
        Self::zeroed()
    }
}

impl FrameUniforms {
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::bytes_of(self)
    }

    /// Decode a block previously produced by [`encode`].
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, RenderError> {
        bytemuck::try_pod_read_unaligned(bytes).map_err(|_| RenderError::UniformSize {
            expected: FRAME_UNIFORMS_SIZE,
            actual: bytes.len(),
        })
    }

    pub fn mvp(&self) -> Mat4 {
        Mat4::from_cols_array_2d(&self.mvp)
    }

    pub fn inv_view(&self) -> Mat4 {
        Mat4::from_cols_array_2d(&self.inv_view)
    }

    pub fn inv_model(&self) -> Mat4 {
        Mat4::from_cols_array_2d(&self.inv_model)
    }

    pub fn viewport(&self) -> Vec3 {
        Vec4::from_array(self.viewport).truncate()
    }

    pub fn camera_position(&self) -> Vec3 {
        Vec4::from_array(self.camera_position).truncate()
    }

    pub fn light_direction(&self) -> Option<Vec3> {
        let l = Vec4::from_array(self.light_direction);
        (l.w != 0.0).then(|| l.truncate())
    }
}

fn checked_inverse(m: Mat4, name: &'static str) -> Result<Mat4, RenderError> {
    let det = m.determinant();
    if !m.is_finite() || !det.is_finite() || det.abs() < f32::MIN_POSITIVE {
        return Err(RenderError::DegenerateTransform(name));
    }
    let inv = m.inverse();
    if !inv.is_finite() {
        return Err(RenderError::DegenerateTransform(name));
    }
    Ok(inv)
}

/// Pack one frame's camera, model and lighting state.
///
/// Fails with [`RenderError::DegenerateTransform`] rather than writing NaNs
/// when the view or model matrix cannot be inverted.
pub fn encode(
    camera: &CameraView,
    model: Mat4,
    projection: &Projection,
    viewport: Viewport,
    light_direction: Option<Vec3>,
) -> Result<FrameUniforms, RenderError> {
    let inv_view = checked_inverse(camera.view, "view")?;
    let inv_model = checked_inverse(model, "model")?;
    let mvp = projection.matrix() * camera.view * model;
    if !mvp.is_finite() {
        return Err(RenderError::DegenerateTransform("projection"));
    }

    let light = match light_direction {
        Some(dir) => dir.normalize_or_zero().extend(1.0),
        None => Vec4::ZERO,
    };

    Ok(FrameUniforms {
        mvp: mvp.to_cols_array_2d(),
        inv_view: inv_view.to_cols_array_2d(),
        inv_model: inv_model.to_cols_array_2d(),
        viewport: viewport.as_vec3().extend(0.0).to_array(),
        camera_position: camera.position.extend(0.0).to_array(),
        light_direction: light.to_array(),
        reserved: [0.0; 4],
    })
}
