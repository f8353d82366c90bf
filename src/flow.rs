//! Application event loop.
//!
//! [`run`] opens the window (the `canvas` element on the web), builds the GPU
//! [`Context`], loads the configured model and then reacts to two kinds of
//! input:
//!
//! - window events: orbiting, resizing, palette keys, dropped files
//! - [`UiEvent`]s: colour picks, uploads and save requests, either translated
//!   from window events or posted from JavaScript through [`crate::web`]
//!
//! Frames are only drawn when something changed: a UI action marked the
//! configurator dirty, the window was resized or the camera is still gliding.
//!
//! # Lifecycle
//!
//! 1. `resumed` creates the window and the context (async on the web)
//! 2. the model is loaded once; failures are logged and leave the scene empty
//! 3. UI events are routed to the [`Configurator`]
//! 4. `RedrawRequested` rebuilds GPU buffers if dirty, advances the camera and draws
//! 5. `exiting` drops all GPU state before the loop returns

use std::{fmt::Debug, iter, sync::Arc};

use instant::Instant;
use winit::{
    application::ApplicationHandler,
    event::{ElementState, KeyEvent, WindowEvent},
    event_loop::{ActiveEventLoop, EventLoop},
    keyboard::{Key, NamedKey},
    window::Window,
};

use crate::{
    config::Config,
    configurator::{Configurator, SavedDesign},
    context::Context,
    data_structures::{color::Color, scene_graph::SceneNode, texture::Texture},
    render::{DrawScene, GpuScene},
    resources::load_model_gltf,
    stage::Stage,
    upload::Upload,
};

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

/// User actions, forwarded verbatim to the [`Configurator`].
#[derive(Debug, Clone)]
pub enum UiEvent {
    ColorPicked(Color),
    ImageUploaded(Upload),
    SaveRequested,
}

/// Host state bundle: GPU context, configurator, lights and the uploaded scene.
pub struct AppState {
    pub(crate) ctx: Context,
    configurator: Configurator,
    stage: Stage,
    scene: GpuScene,
    is_surface_configured: bool,
}

impl AppState {
    async fn new(window: Arc<Window>, config: &Config) -> anyhow::Result<Self> {
        let stage = Stage::new(&config.lights);
        let ctx = Context::new(window, config, stage.light_uniform()).await?;
        Ok(Self {
            ctx,
            configurator: Configurator::new(config),
            stage,
            scene: GpuScene::empty(),
            is_surface_configured: false,
        })
    }

    fn resize(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.ctx.config.width = width;
            self.ctx.config.height = height;
            self.is_surface_configured = true;
            self.ctx.projection.resize(width, height);
            self.ctx.camera.controller.resize(height);
            self.ctx
                .surface
                .configure(&self.ctx.device, &self.ctx.config);
            self.ctx.depth_texture = Texture::create_depth_texture(
                &self.ctx.device,
                [self.ctx.config.width, self.ctx.config.height],
                "depth_texture",
            );
        }
    }

    fn attach_model(&mut self, model: Box<dyn SceneNode>) {
        if self.configurator.attach_model(model).is_some() {
            log::info!("Replaced the previously loaded model");
        }
        self.ctx.window.request_redraw();
    }

    /// Rebuild the GPU copy of the model if the configurator changed it.
    fn sync_scene(&mut self) {
        if self.configurator.take_dirty() {
            self.scene = GpuScene::new(
                &self.ctx.device,
                &self.ctx.queue,
                &self.ctx.material_layout,
                &self.ctx.white,
                self.configurator.model_root(),
            );
            self.ctx
                .light
                .update(&self.ctx.queue, self.stage.light_uniform());
        }
    }

    /// Advance the camera. Returns true while it is still moving.
    fn update_camera(&mut self) -> bool {
        let moving = self
            .ctx
            .camera
            .controller
            .update(&mut self.ctx.camera.camera);
        self.ctx.write_camera();
        moving
    }

    fn render(&mut self) -> Result<(), wgpu::SurfaceError> {
        // Rendering requires the surface to be configured
        if !self.is_surface_configured {
            return Ok(());
        }

        let output = self.ctx.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder: wgpu::CommandEncoder =
            self.ctx
                .device
                .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some("Render Encoder"),
                });
        {
            let mut render_pass: wgpu::RenderPass<'_> =
                encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("Render Pass"),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view: &view,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load: wgpu::LoadOp::Clear(self.ctx.clear_colour),
                            store: wgpu::StoreOp::Store,
                        },
                        depth_slice: None,
                    })],
                    depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                        view: &self.ctx.depth_texture.view,
                        depth_ops: Some(wgpu::Operations {
                            load: wgpu::LoadOp::Clear(1.0),
                            store: wgpu::StoreOp::Store,
                        }),
                        stencil_ops: None,
                    }),
                    occlusion_query_set: None,
                    timestamp_writes: None,
                });

            render_pass.set_pipeline(&self.ctx.basic_pipeline);
            render_pass.draw_scene(
                &self.scene,
                &self.ctx.camera.bind_group,
                &self.ctx.light.bind_group,
            );
        }

        self.ctx.queue.submit(iter::once(encoder.finish()));
        output.present();
        Ok(())
    }
}

/// Events posted to the loop from async tasks and from JavaScript.
///
/// Native builds initialize and load synchronously and have no JavaScript
/// caller, so nothing posts these there.
#[cfg_attr(not(target_arch = "wasm32"), allow(dead_code))]
pub(crate) enum FlowEvent {
    Initialized(anyhow::Result<AppState>),
    ModelLoaded(anyhow::Result<Box<dyn SceneNode>>),
    Ui(UiEvent),
}

impl Debug for FlowEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Initialized(state) => f
                .debug_tuple("Initialized")
                .field(&state.as_ref().map(|_| "AppState"))
                .finish(),
            Self::ModelLoaded(model) => f
                .debug_tuple("ModelLoaded")
                .field(&model.as_ref().map(|root| root.name().map(str::to_string)))
                .finish(),
            Self::Ui(event) => f.debug_tuple("Ui").field(event).finish(),
        }
    }
}

pub struct App {
    #[cfg(not(target_arch = "wasm32"))]
    async_runtime: tokio::runtime::Runtime,
    #[allow(dead_code)]
    proxy: winit::event_loop::EventLoopProxy<FlowEvent>,
    config: Config,
    state: Option<AppState>,
}

impl App {
    fn new(event_loop: &EventLoop<FlowEvent>, config: Config) -> anyhow::Result<Self> {
        let proxy = event_loop.create_proxy();
        #[cfg(target_arch = "wasm32")]
        crate::web::register_proxy(proxy.clone());
        #[cfg(not(target_arch = "wasm32"))]
        let async_runtime = tokio::runtime::Runtime::new()?;
        Ok(Self {
            #[cfg(not(target_arch = "wasm32"))]
            async_runtime,
            proxy,
            config,
            state: None,
        })
    }

    /// Kick off the single model load. Errors are logged, nothing is retried.
    fn load_model(&mut self) {
        let model_path = self.config.model_path.clone();
        #[cfg(not(target_arch = "wasm32"))]
        {
            let result = self.async_runtime.block_on(load_model_gltf(&model_path));
            self.on_model_loaded(result);
        }

        #[cfg(target_arch = "wasm32")]
        {
            let proxy = self.proxy.clone();
            wasm_bindgen_futures::spawn_local(async move {
                let result = load_model_gltf(&model_path).await;
                if proxy.send_event(FlowEvent::ModelLoaded(result)).is_err() {
                    log::error!("Event loop closed before the model finished loading");
                }
            });
        }
    }

    fn on_model_loaded(&mut self, result: anyhow::Result<Box<dyn SceneNode>>) {
        let Some(state) = &mut self.state else {
            return;
        };
        match result {
            Ok(model) => {
                log::info!("Loaded model {}", self.config.model_path);
                state.attach_model(model);
            }
            Err(e) => {
                log::error!(
                    "Could not load model {}: {:#}. The scene stays empty.",
                    self.config.model_path,
                    e
                );
            }
        }
    }

    fn on_initialized(&mut self, state: AppState) {
        self.state = Some(state);
        if let Some(state) = &mut self.state {
            let size = state.ctx.window.inner_size();
            state.resize(size.width, size.height);
            state.ctx.window.request_redraw();
        }
        self.load_model();
    }

    fn handle_ui(&mut self, event: UiEvent) {
        let Some(state) = &mut self.state else {
            log::warn!("Ignoring {:?}, the scene is not ready yet", event);
            return;
        };
        let started = Instant::now();
        let kind = match &event {
            UiEvent::ColorPicked(_) => "colour pick",
            UiEvent::ImageUploaded(_) => "upload",
            UiEvent::SaveRequested => "save",
        };
        match event {
            UiEvent::ColorPicked(color) => {
                log::info!("Picked colour {}", color);
                state.configurator.pick_color(color);
            }
            UiEvent::ImageUploaded(upload) => match state.configurator.upload_image(&upload) {
                Ok(()) => {
                    log::info!("Applied texture {}", upload.file_name);
                    state.ctx.window.set_title(&self.config.window_title);
                }
                Err(e) => {
                    log::warn!("Rejected upload {}: {}", upload.file_name, e);
                    notify(state, &self.config, &e.to_string());
                }
            },
            UiEvent::SaveRequested => match state.configurator.save_design() {
                Ok(Some(design)) => {
                    if let Err(e) = deliver(&design, &self.config) {
                        log::error!("Could not save {}: {:#}", design.file_name, e);
                        notify(state, &self.config, "Saving the design failed.");
                    }
                }
                Ok(None) => (),
                Err(e) => log::error!("Export failed: {:#}", e),
            },
        }
        log::debug!("Handled {} in {:?}", kind, started.elapsed());
        state.ctx.window.request_redraw();
    }

    fn handle_key(&mut self, event_loop: &ActiveEventLoop, event: &KeyEvent) {
        if event.state != ElementState::Pressed || event.repeat {
            return;
        }
        match &event.logical_key {
            Key::Named(NamedKey::Escape) => event_loop.exit(),
            Key::Character(c) => match c.as_str() {
                "s" | "S" => self.handle_ui(UiEvent::SaveRequested),
                digit => {
                    let color = digit
                        .parse::<u32>()
                        .ok()
                        .and_then(|digit| self.config.palette_color(digit));
                    if let Some(color) = color {
                        self.handle_ui(UiEvent::ColorPicked(color));
                    }
                }
            },
            _ => (),
        }
    }
}

/// Surface a message to the user.
#[allow(unused_variables)]
fn notify(state: &AppState, config: &Config, message: &str) {
    #[cfg(not(target_arch = "wasm32"))]
    state
        .ctx
        .window
        .set_title(&format!("{} - {}", config.window_title, message));
    #[cfg(target_arch = "wasm32")]
    crate::web::alert(message);
}

/// Hand a saved design to the user: a file on disk or a browser download.
#[allow(unused_variables)]
fn deliver(design: &SavedDesign, config: &Config) -> anyhow::Result<()> {
    #[cfg(not(target_arch = "wasm32"))]
    {
        use anyhow::Context as _;

        let path = config.export_dir.join(&design.file_name);
        std::fs::write(&path, &design.bytes)
            .with_context(|| format!("Could not write {}", path.display()))?;
        log::info!("Saved design to {}", path.display());
    }
    #[cfg(target_arch = "wasm32")]
    crate::web::download(design)?;
    Ok(())
}

impl ApplicationHandler<FlowEvent> for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.state.is_some() {
            return;
        }

        #[allow(unused_mut)]
        let mut window_attributes = Window::default_attributes().with_title(&self.config.window_title);

        #[cfg(target_arch = "wasm32")]
        {
            use wasm_bindgen::JsCast;
            use winit::platform::web::WindowAttributesExtWebSys;

            const CANVAS_ID: &str = "canvas";

            let window = wgpu::web_sys::window().unwrap_throw();
            let document = window.document().unwrap_throw();
            let canvas = document.get_element_by_id(CANVAS_ID).unwrap_throw();
            let html_canvas_element = canvas.unchecked_into();
            window_attributes = window_attributes.with_canvas(Some(html_canvas_element));
        }

        let window = match event_loop.create_window(window_attributes) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                log::error!("Could not create a window: {}", e);
                event_loop.exit();
                return;
            }
        };

        #[cfg(not(target_arch = "wasm32"))]
        {
            match self
                .async_runtime
                .block_on(AppState::new(window, &self.config))
            {
                Ok(state) => self.on_initialized(state),
                Err(e) => {
                    log::error!("App initialization failed: {:#}", e);
                    event_loop.exit();
                }
            }
        }

        #[cfg(target_arch = "wasm32")]
        {
            let proxy = self.proxy.clone();
            let config = self.config.clone();
            wasm_bindgen_futures::spawn_local(async move {
                let state = AppState::new(window, &config).await;
                assert!(proxy.send_event(FlowEvent::Initialized(state)).is_ok());
            });
        }
    }

    fn user_event(&mut self, event_loop: &ActiveEventLoop, event: FlowEvent) {
        match event {
            FlowEvent::Initialized(Ok(state)) => self.on_initialized(state),
            FlowEvent::Initialized(Err(e)) => {
                log::error!("App initialization failed: {:#}", e);
                event_loop.exit();
            }
            FlowEvent::ModelLoaded(result) => self.on_model_loaded(result),
            FlowEvent::Ui(ui_event) => self.handle_ui(ui_event),
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: winit::window::WindowId,
        event: WindowEvent,
    ) {
        let state = match &mut self.state {
            Some(state) => state,
            None => return,
        };

        if state.ctx.camera.controller.handle_window_events(&event) {
            state.ctx.window.request_redraw();
        }

        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(size) => {
                state.resize(size.width, size.height);
                state.ctx.window.request_redraw();
            }
            WindowEvent::RedrawRequested => {
                state.sync_scene();
                let moving = state.update_camera();

                match state.render() {
                    Ok(_) => {
                        if moving {
                            state.ctx.window.request_redraw();
                        }
                    }
                    // Reconfigure the surface if it's lost or outdated
                    Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                        let size = state.ctx.window.inner_size();
                        state.resize(size.width, size.height);
                        state.ctx.window.request_redraw();
                    }
                    Err(e) => {
                        log::error!("Unable to render {}", e);
                    }
                }
            }
            WindowEvent::KeyboardInput { event, .. } => self.handle_key(event_loop, &event),
            #[cfg(not(target_arch = "wasm32"))]
            WindowEvent::DroppedFile(path) => match Upload::from_path(&path) {
                Ok(upload) => self.handle_ui(UiEvent::ImageUploaded(upload)),
                Err(e) => log::warn!("{:#}", e),
            },
            _ => {}
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(state) = self.state.take() {
            log::info!("Releasing GPU resources");
            // scene buffers go before the device
            let AppState { ctx, scene, .. } = state;
            drop(scene);
            drop(ctx);
        }
    }
}

pub fn run(config: Config) -> anyhow::Result<()> {
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

    let event_loop: EventLoop<FlowEvent> = EventLoop::with_user_event().build()?;

    let mut app = App::new(&event_loop, config)?;

    event_loop.run_app(&mut app)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flow_events_are_printable() {
        let save = FlowEvent::Ui(UiEvent::SaveRequested);
        assert_eq!(format!("{:?}", save), "Ui(SaveRequested)");

        let failed = FlowEvent::ModelLoaded(Err(anyhow::anyhow!("missing")));
        assert!(format!("{:?}", failed).starts_with("ModelLoaded(Err(missing"));
    }
}
