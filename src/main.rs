use std::sync::Arc;

use driftfield::gpu::GpuRenderer;
use driftfield::{AppError, LoopHandle, PointerTracker, RenderLoop, SceneComposer, SceneConfig, Time};
use winit::{
    application::ApplicationHandler,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    window::{Window, WindowId},
};

struct App {
    config: SceneConfig,
    window: Option<Arc<Window>>,
    renderer: Option<GpuRenderer>,
    render_loop: Option<RenderLoop<Time>>,
    handle: Option<LoopHandle>,
    pointer: PointerTracker,
    error: Option<AppError>,
}

impl App {
    fn new(config: SceneConfig) -> Self {
        Self {
            config,
            window: None,
            renderer: None,
            render_loop: None,
            handle: None,
            pointer: PointerTracker::default(),
            error: None,
        }
    }

    fn init(&mut self, event_loop: &ActiveEventLoop) -> Result<(), AppError> {
        let window_attrs = Window::default_attributes()
            .with_title("driftfield")
            .with_inner_size(winit::dpi::LogicalSize::new(1280, 720));
        let window = Arc::new(event_loop.create_window(window_attrs)?);
        let size = window.inner_size();
        self.pointer.set_window_size(size.width, size.height);

        let scene = SceneComposer::new(&self.config)?;
        let renderer = pollster::block_on(GpuRenderer::new(window.clone(), &self.config, &scene))?;
        let render_loop = RenderLoop::start(scene, Time::new());

        self.handle = Some(render_loop.handle());
        self.render_loop = Some(render_loop);
        self.renderer = Some(renderer);
        window.request_redraw();
        self.window = Some(window);
        Ok(())
    }

    fn shutdown(&mut self, event_loop: &ActiveEventLoop) {
        if let Some(handle) = &self.handle {
            if handle.cancel() {
                log::info!("render loop cancelled");
            }
        }
        event_loop.exit();
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_none() {
            if let Err(e) = self.init(event_loop) {
                log::error!("startup failed: {e}");
                self.error = Some(e);
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        self.pointer.handle_event(&event);

        match event {
            WindowEvent::CloseRequested => self.shutdown(event_loop),
            WindowEvent::Resized(physical_size) => {
                if let Some(renderer) = &mut self.renderer {
                    renderer.resize(physical_size);
                }
            }
            WindowEvent::RedrawRequested => {
                let (Some(renderer), Some(render_loop)) = (&mut self.renderer, &mut self.render_loop) else {
                    return;
                };
                if !render_loop.run_frame(&self.pointer, &self.pointer, renderer).is_rendered() {
                    return;
                }
                if render_loop.frames() % 600 == 0 {
                    log::debug!(
                        "frame {}: {:.1} fps, {:?}",
                        render_loop.frames(),
                        render_loop.clock().fps(),
                        renderer.stats()
                    );
                }
                let out_of_memory = match renderer.render() {
                    Ok(()) => false,
                    Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                        let size = winit::dpi::PhysicalSize::new(renderer.config.width, renderer.config.height);
                        renderer.resize(size);
                        false
                    }
                    Err(wgpu::SurfaceError::OutOfMemory) => true,
                    Err(e) => {
                        log::warn!("render error: {e:?}");
                        false
                    }
                };
                if out_of_memory {
                    log::error!("surface out of memory");
                    self.shutdown(event_loop);
                    return;
                }
                if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }
            _ => {}
        }
    }
}

fn main() -> Result<(), AppError> {
    env_logger::init();

    let config = match std::env::args().nth(1) {
        Some(path) => SceneConfig::load(path)?,
        None => SceneConfig::default(),
    };

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new(config);
    event_loop.run_app(&mut app)?;

    match app.error.take() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
