//! Application event loop.
//!
//! [`App`] wires winit to the [`Office`]: window events become input for the
//! controls and the interaction handler, every redraw advances the controls,
//! syncs the GPU mirror and draws a frame. Asset loads run in the background
//! (on the tokio runtime natively, on the browser's executor on the web) and
//! come back to the loop as [`OfficeEvent::Loaded`].
//!
//! # Lifecycle
//!
//! 1. `resumed` creates the window, the office and its loads
//! 2. the GPU context is created (synchronously natively, asynchronously on the web)
//! 3. every `RedrawRequested` runs one frame and requests the next
//! 4. `exiting` disposes the office

use std::{sync::Arc, time::Duration};

use instant::Instant;
use winit::{
    application::ApplicationHandler,
    dpi::LogicalSize,
    event::{ElementState, WindowEvent},
    event_loop::{ActiveEventLoop, EventLoop, EventLoopProxy},
    keyboard::PhysicalKey,
    window::Window,
};

use crate::{
    config::OfficeConfig,
    context::Context,
    loader::{LoadOutcome, PendingLoad},
    office::Office,
    render::Renderer,
    resources::AssetSource,
};

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

pub enum OfficeEvent {
    /// The GPU context finished initializing (web only).
    #[allow(dead_code)]
    Initialized(Box<Context>),
    Loaded(LoadOutcome),
}

impl std::fmt::Debug for OfficeEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Initialized(_) => f.write_str("Initialized"),
            Self::Loaded(outcome) => f.debug_tuple("Loaded").field(outcome).finish(),
        }
    }
}

/// Time between frames. Counting starts at construction and again at every
/// `restart`, so setup work never shows up as frame time.
#[derive(Debug)]
pub struct FrameClock {
    last: Instant,
}

impl FrameClock {
    pub fn new() -> Self {
        Self {
            last: Instant::now(),
        }
    }

    pub fn restart(&mut self) {
        self.last = Instant::now();
    }

    /// Time since the previous tick (or restart).
    pub fn tick(&mut self) -> Duration {
        let now = Instant::now();
        let dt = now - self.last;
        self.last = now;
        dt
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

pub struct App {
    #[cfg(not(target_arch = "wasm32"))]
    async_runtime: tokio::runtime::Runtime,
    proxy: EventLoopProxy<OfficeEvent>,
    config: OfficeConfig,
    office: Option<Office>,
    ctx: Option<Context>,
    renderer: Option<Renderer>,
    clock: FrameClock,
}

impl App {
    fn new(event_loop: &EventLoop<OfficeEvent>, config: OfficeConfig) -> anyhow::Result<Self> {
        let proxy = event_loop.create_proxy();
        #[cfg(not(target_arch = "wasm32"))]
        let async_runtime = tokio::runtime::Runtime::new()?;
        Ok(Self {
            #[cfg(not(target_arch = "wasm32"))]
            async_runtime,
            proxy,
            config,
            office: None,
            ctx: None,
            renderer: None,
            clock: FrameClock::new(),
        })
    }

    /// Runs a load in the background and posts its outcome to the event loop.
    fn spawn_load(&self, load: PendingLoad) {
        let proxy = self.proxy.clone();
        let fut = async move {
            let outcome = load.await;
            if proxy.send_event(OfficeEvent::Loaded(outcome)).is_err() {
                log::debug!("event loop closed before a load completed");
            }
        };

        #[cfg(not(target_arch = "wasm32"))]
        self.async_runtime.spawn(fut);

        #[cfg(target_arch = "wasm32")]
        wasm_bindgen_futures::spawn_local(fut);
    }

    fn init_gpu(&mut self, ctx: Context) {
        let size = ctx.window.inner_size();
        self.renderer = Some(Renderer::new(&ctx, self.config.axes_length));
        ctx.window.request_redraw();
        self.ctx = Some(ctx);
        self.resize(size.width, size.height);
        self.clock.restart();
    }

    fn resize(&mut self, width: u32, height: u32) {
        if let Some(ctx) = &mut self.ctx {
            ctx.resize(width, height);
        }
        if let Some(office) = &mut self.office {
            office.resize(width, height);
        }
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let dt = self.clock.tick();

        let (Some(office), Some(ctx), Some(renderer)) =
            (&mut self.office, &mut self.ctx, &mut self.renderer)
        else {
            return;
        };

        office.frame(dt);
        ctx.update_camera(office.camera(), office.projection());
        renderer.sync(ctx, office.scene_mut());

        match renderer.render(ctx) {
            Ok(()) => {}
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => ctx.reconfigure(),
            Err(wgpu::SurfaceError::OutOfMemory) => {
                log::error!("out of GPU memory, exiting");
                event_loop.exit();
            }
            Err(wgpu::SurfaceError::Timeout) => log::warn!("surface timeout"),
            Err(e) => log::warn!("frame skipped: {}", e),
        }
        ctx.window.request_redraw();
    }
}

/// Size of a window covering the browser viewport, from the page's
/// `innerWidth`/`innerHeight` in CSS pixels. Missing or degenerate
/// measurements fall back to one pixel.
pub fn viewport_size(inner_width: Option<f64>, inner_height: Option<f64>) -> LogicalSize<u32> {
    let side = |value: Option<f64>| match value {
        Some(v) if v.is_finite() && v >= 1.0 => v.round() as u32,
        _ => 1,
    };
    LogicalSize::new(side(inner_width), side(inner_height))
}

fn asset_source(config: &OfficeConfig) -> anyhow::Result<Arc<dyn AssetSource>> {
    #[cfg(not(target_arch = "wasm32"))]
    {
        let local = std::path::Path::new(&config.asset_root);
        let root = if local.is_dir() {
            local.to_path_buf()
        } else {
            std::path::Path::new(env!("OUT_DIR")).join(&config.asset_root)
        };
        log::info!("serving assets from {}", root.display());
        Ok(Arc::new(crate::resources::FsSource::new(root)))
    }

    #[cfg(target_arch = "wasm32")]
    {
        Ok(Arc::new(crate::resources::HttpSource::from_window(
            &config.asset_root,
        )?))
    }
}

impl ApplicationHandler<OfficeEvent> for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.office.is_some() {
            return;
        }

        #[allow(unused_mut)]
        let mut window_attributes = Window::default_attributes().with_title("Office");

        #[cfg(target_arch = "wasm32")]
        {
            use winit::platform::web::WindowAttributesExtWebSys;
            let browser = web_sys::window();
            let size = viewport_size(
                browser
                    .as_ref()
                    .and_then(|w| w.inner_width().ok())
                    .and_then(|v| v.as_f64()),
                browser
                    .as_ref()
                    .and_then(|w| w.inner_height().ok())
                    .and_then(|v| v.as_f64()),
            );
            log::info!("sizing the canvas to the {}x{} viewport", size.width, size.height);
            window_attributes = window_attributes.with_append(true).with_inner_size(size);
        }

        let window = match event_loop.create_window(window_attributes) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                log::error!("failed to create window: {}", e);
                event_loop.exit();
                return;
            }
        };
        let size = window.inner_size();

        let source = match asset_source(&self.config) {
            Ok(source) => source,
            Err(e) => {
                log::error!("no asset source: {:#}", e);
                event_loop.exit();
                return;
            }
        };
        let mut office = Office::new(self.config.clone(), source, size.width, size.height);
        for load in office.setup() {
            self.spawn_load(load);
        }
        self.office = Some(office);

        let config = self.config.clone();

        #[cfg(not(target_arch = "wasm32"))]
        match self.async_runtime.block_on(Context::new(window, &config)) {
            Ok(ctx) => self.init_gpu(ctx),
            Err(e) => {
                log::error!("failed to initialize graphics: {:#}", e);
                event_loop.exit();
            }
        }

        #[cfg(target_arch = "wasm32")]
        {
            let proxy = self.proxy.clone();
            wasm_bindgen_futures::spawn_local(async move {
                match Context::new(window, &config).await {
                    Ok(ctx) => {
                        if proxy
                            .send_event(OfficeEvent::Initialized(Box::new(ctx)))
                            .is_err()
                        {
                            log::error!("event loop closed during graphics setup");
                        }
                    }
                    Err(e) => log::error!("failed to initialize graphics: {:#}", e),
                }
            });
        }
    }

    fn user_event(&mut self, _event_loop: &ActiveEventLoop, event: OfficeEvent) {
        match event {
            OfficeEvent::Initialized(ctx) => self.init_gpu(*ctx),
            OfficeEvent::Loaded(outcome) => {
                if let Some(office) = &mut self.office {
                    office.on_loaded(outcome);
                }
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: winit::window::WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(size) => self.resize(size.width, size.height),
            WindowEvent::RedrawRequested => self.redraw(event_loop),
            WindowEvent::CursorMoved { position, .. } => {
                if let Some(office) = &mut self.office {
                    office.on_pointer_moved(position.x as f32, position.y as f32);
                }
            }
            WindowEvent::MouseInput { state, button, .. } => {
                if let Some(office) = &mut self.office {
                    office.on_mouse_button(button, state == ElementState::Pressed);
                }
            }
            WindowEvent::KeyboardInput { event, .. } => {
                if let (Some(office), PhysicalKey::Code(key)) = (&mut self.office, event.physical_key) {
                    office.on_key(key, event.state == ElementState::Pressed);
                }
            }
            _ => {}
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(office) = &mut self.office {
            office.dispose();
        }
    }
}

pub fn run(config: OfficeConfig) -> anyhow::Result<()> {
    #[cfg(not(target_arch = "wasm32"))]
    {
        if let Err(e) = env_logger::try_init() {
            println!("Warning: Could not initialize logger: {}", e);
        };
    }

    #[cfg(target_arch = "wasm32")]
    {
        console_log::init_with_level(log::Level::Info).unwrap_throw();
    }

    let event_loop: EventLoop<OfficeEvent> = EventLoop::with_user_event().build()?;
    let mut app = App::new(&event_loop, config)?;
    event_loop.run_app(&mut app)?;

    Ok(())
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn run_web() -> Result<(), wasm_bindgen::JsValue> {
    run(OfficeConfig::default()).map_err(|e| wasm_bindgen::JsValue::from_str(&format!("{:#}", e)))
}
