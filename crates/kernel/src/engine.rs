use std::time::Instant;
use volray_common::{EngineConfig, Transform, Viewport};
use volray_input::{InputEvent, InputState};
use volray_render::{
    CUBE_VERTEX_COUNT, CameraController, DrawStatus, FrameUniforms, Projection, RenderBackend,
    RenderError, encode,
};
use volray_volume::{VolumeError, VolumeGenerator, VolumeGrid};

/// Errors that stop the frame loop.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("render error: {0}")]
    Render(#[from] RenderError),
    #[error("volume error: {0}")]
    Volume(#[from] VolumeError),
}

/// What happened to one tick's draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    /// Uniforms written and the cube drawn.
    Drawn,
    /// Encoding failed; nothing was submitted and the previous uniforms stand.
    Skipped,
    /// Uniforms written but the backend discarded the frame (surface lost,
    /// outdated or timed out). The camera still advanced.
    Dropped,
}

/// Running frame counters.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrameStats {
    pub frames_drawn: u64,
    pub frames_skipped: u64,
    pub frames_dropped: u64,
    /// `dt` used by the most recent tick, after sanitizing.
    pub last_dt: f32,
}

/// Wall-clock source for per-tick `dt`.
#[derive(Debug, Default)]
pub struct FrameClock {
    last: Option<Instant>,
}

impl FrameClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seconds since the previous call; zero on the first call.
    pub fn tick(&mut self, now: Instant) -> f32 {
        let dt = match self.last {
            Some(prev) => now.saturating_duration_since(prev).as_secs_f32(),
            None => 0.0,
        };
        self.last = Some(now);
        dt
    }
}

/// Everything the frame loop owns between ticks.
///
/// Constructed once at startup, advanced by [`EngineState::tick`] on every
/// display refresh, dropped at shutdown. The volume is generated here and
/// never mutated afterwards.
pub struct EngineState {
    config: EngineConfig,
    input: InputState,
    camera: CameraController,
    projection: Projection,
    viewport: Viewport,
    model: Transform,
    volume: VolumeGrid,
    volume_uploaded: bool,
    uniforms: FrameUniforms,
    stats: FrameStats,
}

impl EngineState {
    /// Generate the volume from `config` and set up the camera.
    pub fn new(config: EngineConfig, viewport: Viewport) -> Result<Self, EngineError> {
        let volume = VolumeGenerator::from_config(&config).generate()?;
        Ok(Self::with_volume(config, viewport, volume))
    }

    /// Use an already generated volume.
    pub fn with_volume(config: EngineConfig, viewport: Viewport, volume: VolumeGrid) -> Self {
        tracing::info!(
            mode = ?config.camera_mode,
            width = viewport.width,
            height = viewport.height,
            "engine state created"
        );
        Self {
            camera: CameraController::from_config(&config),
            projection: Projection::for_viewport(viewport),
            config,
            input: InputState::new(),
            viewport,
            model: Transform::default(),
            volume,
            volume_uploaded: false,
            uniforms: FrameUniforms::default(),
            stats: FrameStats::default(),
        }
    }

    /// Queue a host input event for the next tick.
    pub fn push_event(&mut self, event: InputEvent) {
        self.input.push(event);
    }

    pub fn input(&self) -> &InputState {
        &self.input
    }

    pub fn camera(&self) -> &CameraController {
        &self.camera
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn volume(&self) -> &VolumeGrid {
        &self.volume
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn projection(&self) -> &Projection {
        &self.projection
    }

    /// Last successfully encoded uniform block.
    pub fn uniforms(&self) -> &FrameUniforms {
        &self.uniforms
    }

    pub fn stats(&self) -> FrameStats {
        self.stats
    }

    pub fn set_model(&mut self, model: Transform) {
        self.model = model;
    }

    /// New surface size: the projection is rebuilt for the next tick.
    pub fn resize(&mut self, viewport: Viewport) {
        self.viewport = viewport;
        self.projection.resize(viewport);
    }

    /// Run one frame.
    ///
    /// Drains queued input, takes the mouse delta (the only reset per tick),
    /// advances the camera, encodes uniforms and draws. A degenerate transform
    /// skips the draw; a missing surface is returned as an error.
    pub fn tick<B: RenderBackend + ?Sized>(
        &mut self,
        dt: f32,
        backend: &mut B,
    ) -> Result<FrameOutcome, EngineError> {
        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };
        let dt = match self.config.max_frame_dt {
            Some(max) => dt.min(max),
            None => dt,
        };
        self.stats.last_dt = dt;

        self.input.drain_events();
        let mouse_delta = self.input.consume_mouse_delta();
        let movements = self.input.active_movements();
        self.camera.update(dt, mouse_delta, &movements);

        let encoded = encode(
            &self.camera.view(),
            self.model.to_matrix(),
            &self.projection,
            self.viewport,
            self.config.light_direction,
        );
        self.uniforms = match encoded {
            Ok(u) => u,
            Err(err @ RenderError::DegenerateTransform(_)) => {
                tracing::warn!("skipping frame: {err}");
                self.stats.frames_skipped += 1;
                return Ok(FrameOutcome::Skipped);
            }
            Err(err) => return Err(err.into()),
        };

        if !self.volume_uploaded {
            backend.upload_volume(&self.volume);
            self.volume_uploaded = true;
            tracing::debug!("volume uploaded");
        }
        backend.write_uniforms(0, self.uniforms.as_bytes());
        match backend.draw(CUBE_VERTEX_COUNT) {
            Ok(DrawStatus::Presented) => {
                self.stats.frames_drawn += 1;
                Ok(FrameOutcome::Drawn)
            }
            Ok(DrawStatus::Dropped) => {
                self.stats.frames_dropped += 1;
                Ok(FrameOutcome::Dropped)
            }
            Err(err) => {
                tracing::error!("draw failed: {err}");
                Err(err.into())
            }
        }
    }
}
