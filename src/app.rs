//! Window, surface and event loop.
//!
//! [`App`] is a winit [`ApplicationHandler`]: it opens the window on
//! `resumed`, builds a [`SimulationContext`] against the window surface, and
//! calls [`SimulationContext::step`] once per `RedrawRequested`, asking for the
//! next redraw only after the frame has been submitted.

use std::sync::Arc;

use rand::rngs::SmallRng;
use rand::SeedableRng;
use winit::application::ApplicationHandler;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowId};

use crate::error::{GpuError, SimulationError};
use crate::gpu::{create_instance, request_device, FrameInput, SimulationContext};
use crate::input::{Input, InputAction, KeyAction, PointerAction};
use crate::settings::Settings;
use crate::sprite::SpriteTexture;
use crate::time::Time;

const WINDOW_TITLE: &str = "sparkfield";

struct Renderer {
    window: Arc<Window>,
    surface: wgpu::Surface<'static>,
    config: wgpu::SurfaceConfiguration,
    context: SimulationContext,
}

impl Renderer {
    async fn new(
        window: Arc<Window>,
        settings: Settings,
        rng: SmallRng,
        sprite: Option<&SpriteTexture>,
    ) -> Result<Self, SimulationError> {
        let size = window.inner_size();
        let width = size.width.max(1);
        let height = size.height.max(1);

        let instance = create_instance();
        let surface = instance
            .create_surface(window.clone())
            .map_err(GpuError::from)?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or(GpuError::NoAdapter)?;

        let (device, queue) = request_device(&adapter).await?;

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .copied()
            .or_else(|| surface_caps.formats.first().copied())
            .ok_or(GpuError::NoSurfaceFormat)?;

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width,
            height,
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: surface_caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);
        log::info!("surface {}x{} {:?}", width, height, surface_format);

        let mut context =
            SimulationContext::new(device, queue, surface_format, [width, height], settings, rng);
        if let Some(sprite) = sprite {
            context.set_sprite(sprite);
        }

        Ok(Self {
            window,
            surface,
            config,
            context,
        })
    }

    fn resize(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.config.width = width;
            self.config.height = height;
            self.surface.configure(self.context.device(), &self.config);
        }
    }

    fn reconfigure(&mut self) {
        self.surface.configure(self.context.device(), &self.config);
    }

    fn frame(&mut self, input: &FrameInput) -> Result<(), wgpu::SurfaceError> {
        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        self.context.step(input, Some(&view));
        output.present();
        Ok(())
    }
}

pub struct App {
    settings: Settings,
    seed: Option<u64>,
    sprite: Option<SpriteTexture>,
    renderer: Option<Renderer>,
    input: Input,
    time: Time,
    error: Option<SimulationError>,
}

impl App {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            seed: None,
            sprite: None,
            renderer: None,
            input: Input::default(),
            time: Time::new(),
            error: None,
        }
    }

    /// Fix the particle RNG seed for reproducible runs.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Draw particles with this sprite instead of the generated disc.
    pub fn with_sprite(mut self, sprite: SpriteTexture) -> Self {
        self.sprite = Some(sprite);
        self
    }

    fn rng(&self) -> SmallRng {
        match self.seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_entropy(),
        }
    }

    fn start(&mut self, event_loop: &ActiveEventLoop) -> Result<(), SimulationError> {
        let window_attrs = Window::default_attributes()
            .with_title(WINDOW_TITLE)
            .with_inner_size(winit::dpi::LogicalSize::new(1280, 720));
        let window = Arc::new(event_loop.create_window(window_attrs)?);

        let renderer = pollster::block_on(Renderer::new(
            window.clone(),
            self.settings.clone(),
            self.rng(),
            self.sprite.as_ref(),
        ))?;

        let [width, height] = renderer.context.canvas_size();
        self.input = Input::new(width, height);
        self.time.reset();
        self.renderer = Some(renderer);
        window.request_redraw();
        Ok(())
    }

    fn dispatch(&mut self, action: InputAction) {
        let Some(renderer) = &mut self.renderer else {
            return;
        };
        match action {
            InputAction::Pointer(PointerAction::AddAttractor(direction)) => {
                renderer.context.add_attractor(self.input.pointer(), direction);
            }
            // Follow state is read from `Input` every frame.
            InputAction::Pointer(PointerAction::FollowStart | PointerAction::FollowEnd) => {}
            InputAction::Key(KeyAction::Restart) => renderer.context.restart(),
            InputAction::Key(KeyAction::ClearAttractors) => renderer.context.clear_attractors(),
        }
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let delta_time = self.time.update();
        let input = FrameInput {
            delta_time,
            pointer: self.input.pointer(),
            pointer_held: self.input.following(),
        };

        let Some(renderer) = &mut self.renderer else {
            return;
        };
        if self.time.frame() % 60 == 0 {
            renderer
                .window
                .set_title(&format!("{} - {:.0} fps", WINDOW_TITLE, self.time.fps()));
        }
        match renderer.frame(&input) {
            Ok(()) => {}
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                log::warn!("surface lost, reconfiguring");
                renderer.reconfigure();
            }
            Err(wgpu::SurfaceError::OutOfMemory) => {
                log::error!("out of GPU memory");
                event_loop.exit();
                return;
            }
            Err(e) => log::warn!("Render error: {:?}", e),
        }
        renderer.window.request_redraw();
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.renderer.is_none() {
            if let Err(e) = self.start(event_loop) {
                log::error!("{}", e);
                self.error = Some(e);
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        if let Some(action) = self.input.handle_event(&event) {
            self.dispatch(action);
        }

        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(size) => {
                if let Some(renderer) = &mut self.renderer {
                    renderer.resize(size.width, size.height);
                    self.input.resize(size.width, size.height);
                }
            }
            WindowEvent::RedrawRequested => self.redraw(event_loop),
            _ => {}
        }
    }
}

/// Open a window and run until it is closed.
pub fn run(app: App) -> Result<(), SimulationError> {
    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = app;
    event_loop.run_app(&mut app)?;

    match app.error.take() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
