use crate::error::RenderError;
use crate::uniforms::{FRAME_UNIFORMS_SIZE, FrameUniforms};
use volray_volume::{VolumeDims, VolumeGrid};

/// Vertices in the bounding cube: 6 faces, 2 triangles each, no index buffer.
pub const CUBE_VERTEX_COUNT: u32 = 36;

/// Result of a successful [`RenderBackend::draw`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawStatus {
    /// The frame reached the display.
    Presented,
    /// The surface was briefly unavailable and the frame was discarded.
    /// The loop carries on; the next tick draws again.
    Dropped,
}

/// What the frame loop needs from a GPU backend.
///
/// Bindings the backend's pipeline exposes to the shader: 0 = uniform block,
/// 1 = 3D volume texture view, 2 = sampler, 3 = optional read-only storage.
pub trait RenderBackend {
    /// Write `bytes` into the uniform buffer at `offset`.
    fn write_uniforms(&mut self, offset: u64, bytes: &[u8]);

    /// Copy the whole grid into the 3D texture.
    fn upload_volume(&mut self, volume: &VolumeGrid);

    /// Draw the bounding cube once. `MissingSurface` is fatal.
    fn draw(&mut self, vertex_count: u32) -> Result<DrawStatus, RenderError>;
}

/// One call received by a [`RecordingBackend`].
#[derive(Debug, Clone, PartialEq)]
pub enum BackendCall {
    WriteUniforms { offset: u64, len: usize },
    UploadVolume { dims: VolumeDims },
    Draw { vertex_count: u32 },
}

/// Headless backend that records calls and mirrors the uniform buffer.
///
/// Used by the CLI and tests in place of the wgpu backend. Clearing
/// `surface_available` makes the next draw fail with `MissingSurface`;
/// `drop_frames` discards that many upcoming draws.
#[derive(Debug)]
pub struct RecordingBackend {
    calls: Vec<BackendCall>,
    uniforms: [u8; FRAME_UNIFORMS_SIZE],
    pub surface_available: bool,
    pub drop_frames: u32,
}

impl Default for RecordingBackend {
    fn default() -> Self {
        Self {
            calls: Vec::new(),
            uniforms: [0; FRAME_UNIFORMS_SIZE],
            surface_available: true,
            drop_frames: 0,
        }
    }
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> &[BackendCall] {
        &self.calls
    }

    pub fn draw_count(&self) -> usize {
        self.calls
            .iter()
            .filter(|c| matches!(c, BackendCall::Draw { .. }))
            .count()
    }

    pub fn upload_count(&self) -> usize {
        self.calls
            .iter()
            .filter(|c| matches!(c, BackendCall::UploadVolume { .. }))
            .count()
    }

    /// Current contents of the mirrored uniform buffer.
    pub fn uniform_bytes(&self) -> &[u8] {
        &self.uniforms
    }

    pub fn uniforms(&self) -> FrameUniforms {
        bytemuck::pod_read_unaligned(&self.uniforms)
    }

    /// Human-readable dump of the mirrored uniform block.
    pub fn describe(&self) -> String {
        let u = self.uniforms();
        let p = u.camera_position();
        let v = u.viewport();
        let mut out = String::new();
        out.push_str(&format!(
            "=== Backend (draws={}, uploads={}) ===\n",
            self.draw_count(),
            self.upload_count()
        ));
        out.push_str(&format!("Viewport: {:.0}x{:.0}\n", v.x, v.y));
        out.push_str(&format!("Camera: ({:.3}, {:.3}, {:.3})\n", p.x, p.y, p.z));
        match u.light_direction() {
            Some(l) => out.push_str(&format!("Light: ({:.3}, {:.3}, {:.3})\n", l.x, l.y, l.z)),
            None => out.push_str("Light: none\n"),
        }
        out
    }
}

impl RenderBackend for RecordingBackend {
    fn write_uniforms(&mut self, offset: u64, bytes: &[u8]) {
        let start = offset as usize;
        let end = (start + bytes.len()).min(FRAME_UNIFORMS_SIZE);
        if start < end {
            self.uniforms[start..end].copy_from_slice(&bytes[..end - start]);
        }
        self.calls.push(BackendCall::WriteUniforms {
            offset,
            len: bytes.len(),
        });
    }

    fn upload_volume(&mut self, volume: &VolumeGrid) {
        self.calls.push(BackendCall::UploadVolume {
            dims: volume.dims(),
        });
    }

    fn draw(&mut self, vertex_count: u32) -> Result<DrawStatus, RenderError> {
        if !self.surface_available {
            return Err(RenderError::MissingSurface);
        }
        if self.drop_frames > 0 {
            self.drop_frames -= 1;
            return Ok(DrawStatus::Dropped);
        }
        self.calls.push(BackendCall::Draw { vertex_count });
        Ok(DrawStatus::Presented)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use volray_volume::{ChannelFillPolicy, NoiseSeed, generate};

    #[test]
    fn records_calls_in_order() {
        let grid = generate(NoiseSeed::default(), VolumeDims::cube(2), ChannelFillPolicy::Uniform)
            .unwrap();
        let mut b = RecordingBackend::new();
        b.upload_volume(&grid);
        b.write_uniforms(0, &[1, 2, 3, 4]);
        assert_eq!(b.draw(CUBE_VERTEX_COUNT).unwrap(), DrawStatus::Presented);
        assert_eq!(
            b.calls(),
            &[
                BackendCall::UploadVolume {
                    dims: VolumeDims::cube(2)
                },
                BackendCall::WriteUniforms { offset: 0, len: 4 },
                BackendCall::Draw { vertex_count: 36 },
            ]
        );
        assert_eq!(&b.uniform_bytes()[..4], &[1, 2, 3, 4]);
    }

    #[test]
    fn partial_write_lands_at_offset() {
        let mut b = RecordingBackend::new();
        b.write_uniforms(208, bytemuck::cast_slice(&[1.0f32, 2.0, 3.0]));
        let p = b.uniforms().camera_position();
        assert_eq!(p.to_array(), [1.0, 2.0, 3.0]);
        assert!(b.describe().contains("Camera: (1.000, 2.000, 3.000)"));
    }

    #[test]
    fn missing_surface_fails_draw() {
        let mut b = RecordingBackend::new();
        b.surface_available = false;
        let err = b.draw(CUBE_VERTEX_COUNT).unwrap_err();
        assert!(err.is_fatal());
        assert_eq!(b.draw_count(), 0);
    }

    #[test]
    fn dropped_frames_are_not_recorded() {
        let mut b = RecordingBackend::new();
        b.drop_frames = 2;
        assert_eq!(b.draw(CUBE_VERTEX_COUNT).unwrap(), DrawStatus::Dropped);
        assert_eq!(b.draw(CUBE_VERTEX_COUNT).unwrap(), DrawStatus::Dropped);
        assert_eq!(b.draw_count(), 0);
        assert_eq!(b.draw(CUBE_VERTEX_COUNT).unwrap(), DrawStatus::Presented);
        assert_eq!(b.draw_count(), 1);
    }

    #[test]
    fn describe_empty_backend() {
        let b = RecordingBackend::new();
        let out = b.describe();
        assert!(out.contains("draws=0"));
        assert!(out.contains("Light: none"));
    }
}
