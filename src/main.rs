mod cli;
mod composite;
mod config;
mod engine;
mod framepace;
mod gpu;
mod gui;
mod layer;
mod nav;
mod particle;
mod render;
mod spawner;
mod surfaces;
mod utils;

use std::sync::{mpsc, Arc};

use clap::Parser;
use glam::Vec2;
use log::{error, info, trace};
use winit::{
    application::ApplicationHandler,
    event::{MouseScrollDelta, WindowEvent},
    event_loop::{ControlFlow, EventLoop},
    window::Window,
};

use crate::composite::CompositeModule;
use crate::config::EffectConfig;
use crate::engine::{Engine, FrameBatch};
use crate::framepace::Framepacer;
use crate::gpu::GpuContext;
use crate::gui::EguiIntegration;
use crate::nav::{Entrance, EntrancePose, NavError, NavFragment};
use crate::render::RenderModule;
use crate::surfaces::{Layer, SurfaceManager};
use crate::utils::Exists;

/// One wheel line in pixels, for the virtual page scroll offset.
const SCROLL_LINE_PX: f32 = 40.0;

fn main() -> anyhow::Result<()> {
    env_logger::builder()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    // Collect Arguments
    let args = cli::Args::parse();
    let config = EffectConfig {
        gravity: args.gravity,
        global_max: args.max_particles,
        ..Default::default()
    };

    // Setup Winit
    let event_loop = EventLoop::new()?;

    let tokio_rt = tokio::runtime::Runtime::new()?;

    // The nav fragment fetch runs in the background; the overlay appears
    // whenever it lands.
    let nav = match args.site_root {
        Some(site_root) => {
            let (tx, rx) = mpsc::channel();
            tokio_rt.spawn(async move {
                let _ = tx.send(nav::fetch(site_root).await);
            });
            NavState::Loading(rx)
        }
        None => NavState::Disabled,
    };

    // State
    let mut app_state = AppState {
        tokio_rt,
        gpu: Exists::None,
        gfx: Exists::None,
        engine: Engine::new(config),
        batch: FrameBatch::default(),
        framepace: Framepacer::new(),

        framerate: args.framerate,
        mouse_position: Vec2::ZERO,
        scroll_offset: 0.0,
        nav,
    };

    event_loop.run_app(&mut app_state)?;
    Ok(())
}

struct GfxState {
    window: Arc<Window>,
    egui: EguiIntegration,

    surfaces: SurfaceManager,
    render_module: RenderModule,
    composite_module: CompositeModule,
}

enum NavState {
    Disabled,
    Loading(mpsc::Receiver<Result<NavFragment, NavError>>),
    Ready {
        fragment: NavFragment,
        entrance: Entrance,
    },
    /// Load failed or the channel died; the container stays empty.
    Empty,
}

struct AppState<'a> {
    tokio_rt: tokio::runtime::Runtime,
    gpu: Exists<GpuContext<'a>>,
    gfx: Exists<GfxState>,
    engine: Engine,
    batch: FrameBatch,
    framepace: Framepacer,

    framerate: u32,
    mouse_position: Vec2,
    scroll_offset: f32,
    nav: NavState,
}

impl<'a> AppState<'a> {
    fn poll_nav(&mut self) {
        let NavState::Loading(rx) = &self.nav else {
            return;
        };

        match rx.try_recv() {
            Ok(Ok(fragment)) => {
                info!(
                    "navigation fragment loaded: {} links, {} stylesheets",
                    fragment.links.len(),
                    fragment.stylesheets.len()
                );
                self.nav = NavState::Ready {
                    fragment,
                    entrance: Entrance::new(),
                };
            }
            // Local failure: the overlay stays empty, everything else keeps
            // running.
            Ok(Err(err)) => {
                error!("navigation load failed: {err}");
                self.nav = NavState::Empty;
            }
            Err(mpsc::TryRecvError::Empty) => {}
            Err(mpsc::TryRecvError::Disconnected) => self.nav = NavState::Empty,
        }
    }
}

impl<'a> ApplicationHandler for AppState<'a> {
    fn resumed(&mut self, event_loop: &winit::event_loop::ActiveEventLoop) {
        event_loop.set_control_flow(ControlFlow::Poll);

        let window = Arc::new(
            event_loop
                .create_window(Window::default_attributes().with_title("startrail"))
                .unwrap(),
        );
        let window_size = window.inner_size();

        let gpu = self
            .tokio_rt
            .block_on(GpuContext::new(window.clone()))
            .unwrap();

        let surfaces = SurfaceManager::new(&gpu.device, window_size.width, window_size.height);
        let render_module = RenderModule::new(&gpu.device, self.engine.config().global_max);
        let composite_module = CompositeModule::new(&gpu.device, gpu.surface_format(), &surfaces);
        render_module.update_size(
            &gpu.queue,
            window_size.width.max(1),
            window_size.height.max(1),
        );

        self.engine.set_viewport(Vec2::new(
            window_size.width as f32,
            window_size.height as f32,
        ));

        let mut egui = EguiIntegration::new(&gpu.device, gpu.surface_format());
        egui.resize(window_size.width, window_size.height);

        self.gfx = Exists::Some(GfxState {
            window,
            egui,
            surfaces,
            render_module,
            composite_module,
        });
        self.gpu = Exists::Some(gpu);
    }

    fn window_event(
        &mut self,
        event_loop: &winit::event_loop::ActiveEventLoop,
        _window_id: winit::window::WindowId,
        event: WindowEvent,
    ) {
        if self.gfx.is_none() {
            return;
        }

        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }

            WindowEvent::Resized(new_size) => {
                self.gpu.config.width = new_size.width.max(1);
                self.gpu.config.height = new_size.height.max(1);
                self.gpu.reconfigure_surface();

                let gfx = &mut *self.gfx;
                gfx.surfaces
                    .resize(&self.gpu.device, new_size.width, new_size.height);
                gfx.composite_module.rebuild(&self.gpu.device, &gfx.surfaces);
                gfx.render_module.update_size(
                    &self.gpu.queue,
                    new_size.width.max(1),
                    new_size.height.max(1),
                );
                gfx.egui.resize(new_size.width, new_size.height);

                self.engine
                    .set_viewport(Vec2::new(new_size.width as f32, new_size.height as f32));
            }

            WindowEvent::CursorMoved { position, .. } => {
                let position = Vec2::new(position.x as f32, position.y as f32);
                self.gfx.egui.mouse_motion(position);
                self.engine.pointer_moved(position);
                self.mouse_position = position;
            }

            WindowEvent::MouseWheel { delta, .. } => {
                let pixels = match delta {
                    MouseScrollDelta::LineDelta(_, y) => y * SCROLL_LINE_PX,
                    MouseScrollDelta::PixelDelta(pos) => pos.y as f32,
                };

                // Wheel up is positive; the virtual page offset moves the
                // other way and bottoms out at the top of the page.
                self.scroll_offset = (self.scroll_offset - pixels).max(0.0);
                self.engine.scrolled(self.scroll_offset);
            }

            WindowEvent::MouseInput { state, button, .. } => {
                self.gfx.egui.mouse_event(self.mouse_position, state, button);
            }

            WindowEvent::ModifiersChanged(modifiers) => {
                self.gfx.egui.modifiers_event(modifiers);
            }

            _ => (),
        }
    }

    fn about_to_wait(&mut self, _event_loop: &winit::event_loop::ActiveEventLoop) {
        if self.gpu.is_none() || self.gfx.is_none() {
            return;
        }

        self.framepace.begin_frame();
        self.poll_nav();

        // One frame tick: advance and cull both layers, back first.
        self.engine.step(&mut self.batch);
        trace!("population {}", self.engine.population());

        let nav_pose = match &mut self.nav {
            NavState::Ready { entrance, .. } => Some(entrance.tick()),
            _ => None,
        };

        let gpu = &*self.gpu;
        let gfx = &mut *self.gfx;

        gfx.render_module
            .upload(&gpu.queue, Layer::Back, &self.batch.back);
        gfx.render_module
            .upload(&gpu.queue, Layer::Front, &self.batch.front);

        let frame = gpu.surface.get_current_texture().unwrap();
        let mut encoder = gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor { label: None });

        // Repaint both layer surfaces in full.
        gfx.render_module.layer_pass(
            &mut encoder,
            &gfx.surfaces.back.view,
            Layer::Back,
            self.batch.back.len() as u32,
        );
        gfx.render_module.layer_pass(
            &mut encoder,
            &gfx.surfaces.front.view,
            Layer::Front,
            self.batch.front.len() as u32,
        );

        let nav = &self.nav;
        gfx.egui.run(|ctx| {
            if let (Some(pose), NavState::Ready { fragment, .. }) = (nav_pose, nav) {
                draw_nav(ctx, fragment, pose);
            }
        });
        gfx.egui
            .pre_render(&gpu.device, &gpu.queue, &mut encoder, self.framepace.frametime());

        // Stack: background, back layer, page content, front layer.
        {
            let view = frame
                .texture
                .create_view(&wgpu::TextureViewDescriptor::default());

            let mut rpass = gfx.composite_module.begin_pass(&mut encoder, &view);
            gfx.composite_module.blit(&mut rpass, Layer::Back);
            gfx.egui.render(&mut rpass);
            gfx.composite_module.blit(&mut rpass, Layer::Front);
        }

        gpu.queue.submit(Some(encoder.finish()));
        frame.present();
        gfx.window.request_redraw();

        if self.framerate > 0 {
            self.framepace.end_frame(1.0 / self.framerate as f32);
        }
    }
}

fn draw_nav(ctx: &egui::Context, fragment: &NavFragment, pose: EntrancePose) {
    if pose.opacity <= 0.0 {
        return;
    }

    let text_color = egui::Color32::from_rgb(225, 235, 245).gamma_multiply(pose.opacity);
    let fill = egui::Color32::from_rgb(12, 18, 28).gamma_multiply(0.85 * pose.opacity);

    egui::Area::new(egui::Id::new("site-nav"))
        .anchor(
            egui::Align2::CENTER_TOP,
            egui::vec2(0.0, 10.0 + pose.offset_y),
        )
        .show(ctx, |ui| {
            egui::Frame::none()
                .fill(fill)
                .rounding(8.0)
                .inner_margin(egui::Margin::symmetric(14.0, 8.0))
                .show(ui, |ui| {
                    ui.horizontal(|ui| {
                        for link in &fragment.links {
                            let text = egui::RichText::new(&link.label).color(text_color);
                            ui.hyperlink_to(text, &link.href);
                        }
                    });
                });
        });
}
