use anyhow::{Context, Result};
use clap::Parser;
use egui::Context as EguiContext;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing_subscriber::EnvFilter;
use volray_common::{CameraMode, ChannelFillPolicy, EngineConfig, Viewport};
use volray_input::{InputEvent, Key};
use volray_kernel::{EngineState, FrameClock};
use volray_render::{DrawStatus, RenderBackend, RenderError};
use volray_render_wgpu::{FrameOverlay, OverlayTarget, WgpuBackend};
use volray_volume::VolumeGrid;
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{DeviceEvent, ElementState, KeyEvent, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{CursorGrabMode, Window, WindowId};

#[derive(Parser)]
#[command(name = "volray-desktop", about = "Interactive volume renderer")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// YAML engine config; flags below override it
    #[arg(long)]
    config: Option<PathBuf>,

    /// Noise seed (0..=65535)
    #[arg(long)]
    seed: Option<u64>,

    /// free_fly, orbit or arcball
    #[arg(long)]
    camera_mode: Option<CameraMode>,

    /// uniform or random_red
    #[arg(long)]
    channel_fill: Option<ChannelFillPolicy>,

    /// Tint the volume with r,g,b through the material table
    #[arg(long, value_delimiter = ',')]
    tint: Option<Vec<f32>>,
}

impl Cli {
    fn engine_config(&self) -> Result<EngineConfig> {
        let mut config = match &self.config {
            Some(path) => EngineConfig::load(path)
                .with_context(|| format!("loading config {}", path.display()))?,
            None => EngineConfig::default(),
        };
        if let Some(seed) = self.seed {
            config.seed = seed;
        }
        if let Some(mode) = self.camera_mode {
            config.camera_mode = mode;
        }
        if let Some(policy) = self.channel_fill {
            config.channel_fill = policy;
        }
        config.validate()?;
        Ok(config)
    }

    fn material_table(&self) -> Result<Option<Vec<[f32; 4]>>> {
        match self.tint.as_deref() {
            None => Ok(None),
            Some([r, g, b]) => Ok(Some(vec![[*r, *g, *b, 1.0]])),
            Some(other) => anyhow::bail!("--tint takes r,g,b, got {} values", other.len()),
        }
    }
}

fn map_key(code: KeyCode) -> Key {
    match code {
        KeyCode::KeyW => Key::W,
        KeyCode::KeyA => Key::A,
        KeyCode::KeyS => Key::S,
        KeyCode::KeyD => Key::D,
        KeyCode::KeyH => Key::H,
        KeyCode::Space => Key::Space,
        KeyCode::ShiftLeft | KeyCode::ShiftRight => Key::Shift,
        KeyCode::Escape => Key::Escape,
        KeyCode::F1 => Key::F1,
        _ => Key::Other,
    }
}

/// egui output waiting to be painted on the next drawn frame.
struct PreparedUi {
    jobs: Vec<egui::ClippedPrimitive>,
    pixels_per_point: f32,
}

/// Stats HUD painted after the volume pass.
struct EguiOverlay {
    ctx: EguiContext,
    winit: egui_winit::State,
    renderer: egui_wgpu::Renderer,
    pending: Option<PreparedUi>,
    // Texture changes survive skipped frames until a paint applies them.
    textures_set: Vec<(egui::TextureId, egui::epaint::ImageDelta)>,
    textures_free: Vec<egui::TextureId>,
}

impl EguiOverlay {
    fn prepare(&mut self, window: &Window, ui: impl FnMut(&EguiContext)) {
        let raw_input = self.winit.take_egui_input(window);
        let full_output = self.ctx.run(raw_input, ui);
        self.winit
            .handle_platform_output(window, full_output.platform_output);
        self.textures_set.extend(full_output.textures_delta.set);
        self.textures_free.extend(full_output.textures_delta.free);
        let jobs = self
            .ctx
            .tessellate(full_output.shapes, full_output.pixels_per_point);
        self.pending = Some(PreparedUi {
            jobs,
            pixels_per_point: full_output.pixels_per_point,
        });
    }
}

impl FrameOverlay for EguiOverlay {
    fn paint(&mut self, target: OverlayTarget<'_>) {
        let Some(ui) = self.pending.take() else {
            return;
        };
        for (id, delta) in self.textures_set.drain(..) {
            self.renderer
                .update_texture(target.device, target.queue, id, &delta);
        }
        let screen = egui_wgpu::ScreenDescriptor {
            size_in_pixels: target.size,
            pixels_per_point: ui.pixels_per_point,
        };
        self.renderer.update_buffers(
            target.device,
            target.queue,
            target.encoder,
            &ui.jobs,
            &screen,
        );
        {
            let mut pass = target
                .encoder
                .begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("egui_pass"),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view: target.view,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load: wgpu::LoadOp::Load,
                            store: wgpu::StoreOp::Store,
                        },
                    })],
                    depth_stencil_attachment: None,
                    ..Default::default()
                })
                .forget_lifetime();
            self.renderer.render(&mut pass, &ui.jobs, &screen);
        }
        for id in self.textures_free.drain(..) {
            self.renderer.free_texture(&id);
        }
    }
}

/// Routes the frame loop's draw through the GPU backend with the HUD on top.
struct OverlayBackend<'a> {
    gpu: &'a mut WgpuBackend,
    overlay: &'a mut EguiOverlay,
}

impl RenderBackend for OverlayBackend<'_> {
    fn write_uniforms(&mut self, offset: u64, bytes: &[u8]) {
        self.gpu.write_uniforms(offset, bytes);
    }

    fn upload_volume(&mut self, volume: &VolumeGrid) {
        self.gpu.upload_volume(volume);
    }

    fn draw(&mut self, vertex_count: u32) -> Result<DrawStatus, RenderError> {
        self.gpu.draw_frame(vertex_count, Some(&mut *self.overlay as &mut dyn FrameOverlay))
    }
}

struct Hud {
    visible: bool,
    fingerprint: String,
    last_dt: f32,
}

impl Hud {
    fn draw(&self, ctx: &EguiContext, engine: &EngineState) {
        if !self.visible {
            return;
        }
        let stats = engine.stats();
        let cam = engine.camera().state();
        let dims = engine.volume().dims();
        egui::Window::new("volray")
            .default_pos([12.0, 12.0])
            .resizable(false)
            .show(ctx, |ui| {
                let fps = if self.last_dt > 0.0 { 1.0 / self.last_dt } else { 0.0 };
                ui.label(format!("{fps:.0} fps ({:.2} ms)", self.last_dt * 1000.0));
                ui.label(format!(
                    "Frames: {} drawn, {} skipped, {} dropped",
                    stats.frames_drawn, stats.frames_skipped, stats.frames_dropped
                ));
                ui.separator();
                ui.label(format!("Mode: {:?}", engine.camera().mode()));
                ui.label(format!(
                    "Camera: ({:.2}, {:.2}, {:.2})",
                    cam.position.x, cam.position.y, cam.position.z
                ));
                ui.label(format!("Yaw {:.3}  Pitch {:.3}", cam.yaw, cam.pitch));
                ui.label(format!(
                    "Look: {}",
                    if engine.input().is_look_engaged() { "on" } else { "off" }
                ));
                ui.separator();
                ui.label(format!(
                    "Volume {}x{}x{}  seed {}",
                    dims.width,
                    dims.height,
                    dims.depth,
                    engine.config().seed
                ));
                ui.small(&self.fingerprint[..16.min(self.fingerprint.len())]);
                ui.separator();
                ui.small("F1: Toggle HUD | H: Look | WASD/Space/Shift: Move");
            });
    }
}

struct App {
    engine: EngineState,
    clock: FrameClock,
    hud: Hud,
    materials: Option<Vec<[f32; 4]>>,
    window: Option<Arc<Window>>,
    gpu: Option<WgpuBackend>,
    overlay: Option<EguiOverlay>,
    cursor_locked: bool,
    fatal: Option<anyhow::Error>,
}

impl App {
    fn new(engine: EngineState, materials: Option<Vec<[f32; 4]>>) -> Self {
        let fingerprint = engine.volume().fingerprint();
        Self {
            engine,
            clock: FrameClock::new(),
            hud: Hud {
                visible: true,
                fingerprint,
                last_dt: 0.0,
            },
            materials,
            window: None,
            gpu: None,
            overlay: None,
            cursor_locked: false,
            fatal: None,
        }
    }

    fn init_gpu(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let attrs = Window::default_attributes()
            .with_title("volray")
            .with_inner_size(PhysicalSize::new(1280u32, 720));
        let window = Arc::new(event_loop.create_window(attrs)?);

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        let surface = instance.create_surface(window.clone())?;

        let size = window.inner_size();
        let gpu = WgpuBackend::new(
            &instance,
            surface,
            size.width,
            size.height,
            self.materials.as_deref(),
        )?;
        self.engine
            .resize(Viewport::new(size.width.max(1), size.height.max(1)));

        let ctx = EguiContext::default();
        let winit_state = egui_winit::State::new(
            ctx.clone(),
            egui::ViewportId::ROOT,
            &window,
            Some(window.scale_factor() as f32),
            None,
            None,
        );
        let renderer = egui_wgpu::Renderer::new(gpu.device(), gpu.surface_format(), None, 1, false);

        self.overlay = Some(EguiOverlay {
            ctx,
            winit: winit_state,
            renderer,
            pending: None,
            textures_set: Vec::new(),
            textures_free: Vec::new(),
        });
        self.gpu = Some(gpu);
        self.window = Some(window);
        Ok(())
    }

    fn sync_cursor(&mut self) {
        let engaged = self.engine.input().is_look_engaged();
        if engaged == self.cursor_locked {
            return;
        }
        let Some(window) = &self.window else {
            return;
        };
        if engaged {
            let grabbed = window
                .set_cursor_grab(CursorGrabMode::Locked)
                .or_else(|_| window.set_cursor_grab(CursorGrabMode::Confined));
            if let Err(e) = grabbed {
                tracing::warn!("cursor grab unavailable: {e}");
            }
        } else if let Err(e) = window.set_cursor_grab(CursorGrabMode::None) {
            tracing::warn!("cursor release failed: {e}");
        }
        window.set_cursor_visible(!engaged);
        self.cursor_locked = engaged;
        tracing::debug!(engaged, "look mode changed");
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let dt = self.clock.tick(Instant::now());
        self.hud.last_dt = dt;

        let (Some(window), Some(gpu), Some(overlay)) =
            (&self.window, &mut self.gpu, &mut self.overlay)
        else {
            return;
        };

        let hud = &self.hud;
        let engine = &self.engine;
        overlay.prepare(window, |ctx| hud.draw(ctx, engine));

        let mut backend = OverlayBackend { gpu, overlay };
        if let Err(e) = self.engine.tick(dt, &mut backend) {
            tracing::error!("frame loop stopped: {e}");
            self.fatal = Some(e.into());
            event_loop.exit();
            return;
        }

        self.sync_cursor();
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        if let Err(e) = self.init_gpu(event_loop) {
            tracing::error!("GPU initialization failed: {e:#}");
            self.fatal = Some(e);
            event_loop.exit();
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        if let (Some(overlay), Some(window)) = (&mut self.overlay, &self.window) {
            let response = overlay.winit.on_window_event(window, &event);
            if response.consumed && !self.cursor_locked {
                return;
            }
        }

        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(new_size) => {
                if let Some(gpu) = &mut self.gpu {
                    gpu.resize(new_size.width, new_size.height);
                    let [w, h] = gpu.size();
                    self.engine.resize(Viewport::new(w, h));
                }
            }
            WindowEvent::Focused(false) => {
                self.engine.push_event(InputEvent::FocusLost);
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(code),
                        state,
                        repeat,
                        ..
                    },
                ..
            } => {
                let key = map_key(code);
                match state {
                    ElementState::Pressed => {
                        if key == Key::F1 && !repeat {
                            self.hud.visible = !self.hud.visible;
                        }
                        self.engine.push_event(InputEvent::KeyDown(key));
                    }
                    ElementState::Released => {
                        self.engine.push_event(InputEvent::KeyUp(key));
                    }
                }
            }
            WindowEvent::RedrawRequested => self.redraw(event_loop),
            _ => {}
        }
    }

    fn device_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        _device_id: winit::event::DeviceId,
        event: DeviceEvent,
    ) {
        if let DeviceEvent::MouseMotion { delta } = event {
            // Negated so moving the pointer right turns toward the camera's right.
            self.engine.push_event(InputEvent::PointerMotion {
                dx: -(delta.0 as f32),
                dy: -(delta.1 as f32),
            });
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    tracing::info!("volray-desktop starting");

    let config = cli.engine_config()?;
    let materials = cli.material_table()?;
    let engine = EngineState::new(config, Viewport::new(1280, 720))?;

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new(engine, materials);
    event_loop.run_app(&mut app)?;

    match app.fatal.take() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
