use std::sync::Arc;

use anyhow::{Context, Result};
use glam::Vec2;
use log::{error, info, warn};
use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::{DeviceEvent, DeviceId, ElementState, KeyEvent, MouseScrollDelta, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{self, PhysicalKey};
use winit::window::{CursorGrabMode, Window, WindowId};

use crate::camera::Camera;
use crate::config::AppConfig;
use crate::error::ResourceError;
use crate::frame::{FrameClock, FrameStage};
use crate::input::{InputState, KeyCode, NamedKey};
use crate::render::Renderer;
use crate::scene::FrameTransforms;

/// Roughly one wheel notch worth of trackpad pixels.
const PIXELS_PER_LINE: f64 = 40.0;

/// Maps the physical keys the demo reacts to.
pub fn map_key(code: keyboard::KeyCode) -> Option<KeyCode> {
    use keyboard::KeyCode as Winit;
    let key = match code {
        Winit::KeyW => KeyCode::Character('W'),
        Winit::KeyA => KeyCode::Character('A'),
        Winit::KeyS => KeyCode::Character('S'),
        Winit::KeyD => KeyCode::Character('D'),
        Winit::ArrowUp => KeyCode::Named(NamedKey::Up),
        Winit::ArrowDown => KeyCode::Named(NamedKey::Down),
        Winit::ArrowLeft => KeyCode::Named(NamedKey::Left),
        Winit::ArrowRight => KeyCode::Named(NamedKey::Right),
        Winit::Escape => KeyCode::Named(NamedKey::Escape),
        _ => return None,
    };
    Some(key)
}

/// Wheel movement in lines, positive when scrolling away from the user.
pub fn scroll_lines(delta: MouseScrollDelta) -> f32 {
    match delta {
        MouseScrollDelta::LineDelta(_, y) => y,
        MouseScrollDelta::PixelDelta(position) => (position.y / PIXELS_PER_LINE) as f32,
    }
}

/// Everything the frame loop mutates apart from the GPU.
pub struct AppContext {
    pub config: AppConfig,
    pub camera: Camera,
    pub input: InputState,
    clock: FrameClock,
    stage: FrameStage,
}

impl AppContext {
    pub fn new(config: AppConfig) -> Self {
        let mut camera = Camera::new(config.camera.start_position);
        camera.movement_speed = config.camera.movement_speed;
        camera.mouse_sensitivity = config.camera.mouse_sensitivity;
        Self {
            config,
            camera,
            input: InputState::new(),
            clock: FrameClock::new(),
            stage: FrameStage::Init,
        }
    }

    pub fn stage(&self) -> FrameStage {
        self.stage
    }

    /// Runs the frame-begin step with `elapsed` seconds of input applied.
    /// Returns `false` once the loop has moved to shutdown.
    pub fn begin_frame(&mut self, elapsed: f32) -> bool {
        if matches!(self.stage, FrameStage::Init | FrameStage::Present) {
            self.stage = self.stage.next(false);
        }
        if self.stage != FrameStage::FrameBegin {
            return self.stage != FrameStage::Shutdown;
        }
        self.input
            .apply_to_camera(&mut self.camera, elapsed, &self.config.camera);
        self.stage = self.stage.next(self.input.close_requested());
        self.stage != FrameStage::Shutdown
    }

    /// Walks the recorded passes through to `Present`.
    pub fn finish_frame(&mut self) {
        for _ in FrameStage::PASSES {
            self.stage = self.stage.next(false);
        }
    }

    pub fn transforms(&self, width: u32, height: u32) -> FrameTransforms {
        FrameTransforms::new(&self.camera, &self.config, width, height)
    }
}

/// winit handler that owns the window, the renderer and the frame loop.
pub struct PetSimsApp {
    context: AppContext,
    renderer: Option<Renderer>,
    relative_mouse: bool,
    failure: Option<anyhow::Error>,
}

impl PetSimsApp {
    pub fn new(config: AppConfig) -> Self {
        Self {
            context: AppContext::new(config),
            renderer: None,
            relative_mouse: false,
            failure: None,
        }
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, err: anyhow::Error) {
        error!("{err:#}");
        self.failure = Some(err);
        event_loop.exit();
    }

    fn create_window(&self, event_loop: &ActiveEventLoop) -> Result<Arc<Window>, ResourceError> {
        let window_config = &self.context.config.window;
        let attributes = Window::default_attributes()
            .with_title(window_config.title.clone())
            .with_inner_size(LogicalSize::new(window_config.width, window_config.height));
        let window = event_loop
            .create_window(attributes)
            .map_err(|err| ResourceError::Window(err.to_string()))?;
        Ok(Arc::new(window))
    }

    /// Hides and captures the cursor. A locked cursor reports raw motion;
    /// a confined one keeps reporting absolute positions.
    fn capture_cursor(&mut self, window: &Window) {
        self.relative_mouse = window.set_cursor_grab(CursorGrabMode::Locked).is_ok();
        if !self.relative_mouse {
            if let Err(err) = window.set_cursor_grab(CursorGrabMode::Confined) {
                warn!("cursor could not be captured: {err}");
            }
        }
        window.set_cursor_visible(false);
    }

    fn handle_key(&mut self, event: KeyEvent) {
        let PhysicalKey::Code(code) = event.physical_key else {
            return;
        };
        let Some(key) = map_key(code) else {
            return;
        };
        match event.state {
            ElementState::Pressed => self.context.input.set_key_down(key),
            ElementState::Released => self.context.input.set_key_up(key),
        }
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let elapsed = self.context.clock.tick();
        if !self.context.begin_frame(elapsed) {
            info!(
                "Close requested after {} frames, shutting down",
                self.context.clock.frames()
            );
            event_loop.exit();
            return;
        }
        let Some(renderer) = self.renderer.as_mut() else {
            return;
        };

        let size = renderer.size();
        let transforms = self.context.transforms(size.width, size.height);
        match renderer.render_frame(&transforms) {
            Ok(()) => {}
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                warn!("surface lost or outdated, reconfiguring");
                renderer.reconfigure();
            }
            Err(wgpu::SurfaceError::Timeout) => warn!("surface timed out, skipping frame"),
            Err(err) => {
                let err = anyhow::Error::new(err).context("presenting the frame failed");
                self.fail(event_loop, err);
                return;
            }
        }
        self.context.finish_frame();
    }
}

impl ApplicationHandler for PetSimsApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.renderer.is_some() {
            return;
        }
        let window = match self.create_window(event_loop) {
            Ok(window) => window,
            Err(err) => return self.fail(event_loop, err.into()),
        };
        let renderer = pollster::block_on(Renderer::new(Arc::clone(&window), &self.context.config))
            .context("renderer initialisation failed");
        match renderer {
            Ok(renderer) => {
                for (name, meshes) in renderer.draw_summary() {
                    info!("Draw '{name}' submits {meshes} mesh(es)");
                }
                self.capture_cursor(&window);
                window.request_redraw();
                self.renderer = Some(renderer);
            }
            Err(err) => self.fail(event_loop, err),
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, window_id: WindowId, event: WindowEvent) {
        if self
            .renderer
            .as_ref()
            .is_some_and(|renderer| renderer.window_id() != window_id)
        {
            return;
        }
        match event {
            WindowEvent::CloseRequested => self.context.input.request_close(),
            WindowEvent::Resized(size) => {
                if let Some(renderer) = self.renderer.as_mut() {
                    if let Err(err) = renderer.resize(size) {
                        self.fail(event_loop, err.into());
                    }
                }
            }
            WindowEvent::KeyboardInput { event, .. } => self.handle_key(event),
            WindowEvent::CursorMoved { position, .. } if !self.relative_mouse => {
                self.context
                    .input
                    .set_mouse_position(Vec2::new(position.x as f32, position.y as f32));
            }
            WindowEvent::MouseWheel { delta, .. } => {
                self.context.input.add_scroll(scroll_lines(delta));
            }
            WindowEvent::Focused(false) => self.context.input.reset(),
            WindowEvent::RedrawRequested => self.redraw(event_loop),
            _ => {}
        }
    }

    fn device_event(&mut self, _event_loop: &ActiveEventLoop, _device_id: DeviceId, event: DeviceEvent) {
        if let DeviceEvent::MouseMotion { delta } = event {
            if self.relative_mouse {
                // raw motion has y growing downward
                self.context
                    .input
                    .add_mouse_motion(Vec2::new(delta.0 as f32, -(delta.1 as f32)));
            }
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self.context.input.close_requested() && self.context.stage() != FrameStage::Shutdown {
            if self.context.begin_frame(0.0) {
                self.context.finish_frame();
            } else {
                info!(
                    "Close requested after {} frames, shutting down",
                    self.context.clock.frames()
                );
                event_loop.exit();
                return;
            }
        }
        if let Some(renderer) = &self.renderer {
            renderer.window().request_redraw();
        }
    }
}

/// Opens the window and drives frames until a close request or a fatal error.
pub fn run(config: AppConfig) -> Result<()> {
    let event_loop = EventLoop::new().context("failed to create event loop")?;
    event_loop.set_control_flow(ControlFlow::Poll);
    let mut app = PetSimsApp::new(config);
    event_loop
        .run_app(&mut app)
        .context("event loop terminated abnormally")?;
    match app.failure.take() {
        Some(err) => Err(err),
        None => Ok(()),
    }
}
