use super::context::GfxContext;
use crate::camera::{Camera, CameraController};
use crate::plot::{self, FigureSize};
use anyhow::Result;
use cylmesh::Scene;
use egui::load::SizedTexture;
use std::path::PathBuf;
use std::sync::Arc;
use winit::{event::WindowEvent, window::Window};

/// Pixels of wheel scroll per zoom step.
const SCROLL_STEP: f64 = 50.0;

pub struct App {
    pub gfx: GfxContext,
    egui_renderer: egui_wgpu::Renderer,
    egui_ctx: egui::Context,
    egui_state: egui_winit::State,

    scene: Scene,
    camera: Camera,
    controller: CameraController,

    /// Size of images written by the save button.
    export_size: FigureSize,
    save_path: PathBuf,

    figure: Option<egui::TextureHandle>,
    /// Size and view the figure texture was last rendered for.
    rendered: Option<(FigureSize, Camera)>,
    status: Option<String>,
}

impl App {
    pub async fn new(
        window: Arc<Window>,
        scene: Scene,
        camera: Camera,
        export_size: FigureSize,
        save_path: PathBuf,
    ) -> Result<Self> {
        let gfx = GfxContext::new(window.clone()).await?;
        let egui_renderer = egui_wgpu::Renderer::new(&gfx.device, gfx.config.format, None, 1);

        let egui_ctx = egui::Context::default();
        egui_ctx.set_visuals(egui::Visuals::light());
        let egui_state = egui_winit::State::new(
            egui_ctx.clone(),
            egui_ctx.viewport_id(),
            &*window,
            None,
            None,
        );

        Ok(Self {
            gfx,
            egui_renderer,
            egui_ctx,
            egui_state,
            scene,
            controller: CameraController::new(camera.clone()),
            camera,
            export_size,
            save_path,
            figure: None,
            rendered: None,
            status: None,
        })
    }

    pub fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        self.gfx.resize(new_size);
    }

    /// Returns `true` when egui consumed the event.
    pub fn handle_event(&mut self, window: &Window, event: &WindowEvent) -> bool {
        let response = self.egui_state.on_window_event(window, event);
        if response.consumed {
            return true;
        }

        if let WindowEvent::Resized(physical_size) = event {
            self.resize(*physical_size);
        }

        false
    }

    fn save_current_view(&mut self) {
        let status = match plot::render_to_file(&self.scene, &self.camera, self.export_size, &self.save_path) {
            Ok(()) => {
                log::info!("Saved {}", self.save_path.display());
                format!("Saved {}", self.save_path.display())
            }
            Err(e) => {
                log::error!("Failed to save {}: {:#}", self.save_path.display(), e);
                format!("Save failed: {e}")
            }
        };
        self.status = Some(status);
    }

    /// Re-renders the figure texture if the view or panel size changed.
    fn refresh_figure(&mut self, ctx: &egui::Context, size: FigureSize) {
        let key = (size, self.camera.clone());
        if self.rendered.as_ref() == Some(&key) {
            return;
        }

        match plot::render_to_rgb(&self.scene, &self.camera, size) {
            Ok(rgb) => {
                let image =
                    egui::ColorImage::from_rgb([size.width as usize, size.height as usize], &rgb);
                match &mut self.figure {
                    Some(texture) => texture.set(image, egui::TextureOptions::LINEAR),
                    None => {
                        self.figure =
                            Some(ctx.load_texture("figure", image, egui::TextureOptions::LINEAR))
                    }
                }
            }
            Err(e) => log::error!("Failed to render figure: {e:#}"),
        }

        // Remember failures too, so a broken view is not retried every frame.
        self.rendered = Some(key);
    }

    fn draw_ui(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("toolbar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                if ui.button("Save PNG").clicked() {
                    self.save_current_view();
                }
                if ui.button("Reset view").clicked() {
                    self.controller.reset(&mut self.camera);
                }
                ui.separator();
                ui.label(format!(
                    "azimuth {:.0}°  elevation {:.0}°  zoom {:.2}",
                    self.camera.azimuth_rad.to_degrees(),
                    self.camera.elevation_rad.to_degrees(),
                    self.camera.zoom
                ));
                ui.separator();
                ui.label(format!("{} hits", self.scene.total_hits()));
                if let Some(status) = &self.status {
                    ui.separator();
                    ui.label(status);
                }
            });
        });

        egui::CentralPanel::default()
            .frame(egui::Frame::none().fill(egui::Color32::WHITE))
            .show(ctx, |ui| {
                let avail = ui.available_size();
                let ppp = ctx.pixels_per_point();
                let size = FigureSize::new(
                    ((avail.x * ppp).round() as u32).max(16),
                    ((avail.y * ppp).round() as u32).max(16),
                );
                self.refresh_figure(ctx, size);

                let Some(texture_id) = self.figure.as_ref().map(|t| t.id()) else {
                    return;
                };

                let response = ui.add(
                    egui::Image::new(SizedTexture::new(texture_id, avail)).sense(egui::Sense::drag()),
                );

                let drag = response.drag_delta();
                self.controller
                    .handle_drag(drag.x as f64, drag.y as f64, &mut self.camera);

                if response.hovered() {
                    let scroll = ui.input(|i| i.raw_scroll_delta.y) as f64;
                    self.controller
                        .handle_scroll(scroll / SCROLL_STEP, &mut self.camera);
                }
            });
    }

    pub fn render(&mut self, window: &Window) -> Result<(), wgpu::SurfaceError> {
        let frame = self.gfx.surface.get_current_texture()?;
        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let ctx = self.egui_ctx.clone();
        let egui_input = self.egui_state.take_egui_input(window);
        ctx.begin_frame(egui_input);
        self.draw_ui(&ctx);
        let egui_output = ctx.end_frame();

        self.egui_state
            .handle_platform_output(window, egui_output.platform_output);

        let shapes = ctx.tessellate(egui_output.shapes, ctx.pixels_per_point());
        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [self.gfx.config.width, self.gfx.config.height],
            pixels_per_point: ctx.pixels_per_point(),
        };

        let mut encoder = self
            .gfx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("UI Encoder"),
            });

        for (id, delta) in &egui_output.textures_delta.set {
            self.egui_renderer
                .update_texture(&self.gfx.device, &self.gfx.queue, *id, delta);
        }

        let extra_buffers = self.egui_renderer.update_buffers(
            &self.gfx.device,
            &self.gfx.queue,
            &mut encoder,
            &shapes,
            &screen_descriptor,
        );

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("EGUI Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::WHITE),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            self.egui_renderer
                .render(&mut render_pass, &shapes, &screen_descriptor);
        }

        for id in &egui_output.textures_delta.free {
            self.egui_renderer.free_texture(id);
        }

        self.gfx
            .queue
            .submit(extra_buffers.into_iter().chain(std::iter::once(encoder.finish())));
        frame.present();

        Ok(())
    }
}
