//! Viewer application: the egui shell around the GPU pipeline
//!
//! One explicit context struct owns the camera, the scheme controller and
//! the pipeline driver, and threads them through the frame loop: route
//! input to the active scheme, let it mutate its scene, drive the
//! compute/render pipeline, then lay out the UI with the finished frame
//! in the central viewport.

use crate::camera::Camera;
use crate::gpu::{ClipCounts, FrameReport, PipelineDriver, PipelineError};
use crate::scheme::{MouseButtons, SchemeController};
use crate::schemes;
use eframe::egui;
use log::info;

pub struct ViewerApp {
    render_state: egui_wgpu::RenderState,
    camera: Camera,
    schemes: SchemeController,
    driver: PipelineDriver,
    last_report: FrameReport,
    last_counts: ClipCounts,
    show_stats: bool,
    prev_buttons: MouseButtons,
    fps: f32,
}

impl ViewerApp {
    /// Builds the full app context; any failure here aborts startup
    pub fn new(cc: &eframe::CreationContext<'_>) -> Result<Self, PipelineError> {
        let render_state = cc
            .wgpu_render_state
            .clone()
            .ok_or(PipelineError::NoRenderState)?;
        let driver = PipelineDriver::new(&render_state.device)?;
        info!("pipeline initialized");

        Ok(Self {
            render_state,
            camera: Camera::new(),
            schemes: schemes::default_controller(),
            driver,
            last_report: FrameReport::default(),
            last_counts: ClipCounts::default(),
            show_stats: true,
            prev_buttons: MouseButtons::default(),
            fps: 0.0,
        })
    }

    fn forward_key_events(&mut self, ctx: &egui::Context) {
        let events = ctx.input(|i| i.events.clone());
        for event in events {
            if let egui::Event::Key {
                key,
                pressed,
                repeat: false,
                ..
            } = event
            {
                self.schemes.active_mut().handle_key(key, pressed);
            }
        }
    }

    fn menu_bar(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("menu_bar").show(ctx, |ui| {
            egui::menu::bar(ui, |ui| {
                ui.menu_button("Scheme", |ui| {
                    for (kind, name) in self.schemes.available() {
                        let active = self.schemes.active_kind() == kind;
                        if ui.radio(active, name).clicked() {
                            self.schemes.set_active(kind);
                            ui.close_menu();
                        }
                    }
                });
                ui.menu_button("View", |ui| {
                    ui.checkbox(&mut self.show_stats, "frame stats");
                });
                ui.separator();
                ui.label(format!("{:.0} fps", self.fps));
            });
        });
    }

    fn side_panel(&mut self, ctx: &egui::Context) {
        egui::SidePanel::right("controls")
            .default_width(300.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| {
                    self.schemes.active_mut().build_ui(ui, &mut self.camera);

                    if self.show_stats {
                        ui.separator();
                        ui.heading("Frame");
                        ui.label(format!(
                            "clipped: {} faces / {} vertices",
                            self.last_counts.clipped_faces, self.last_counts.clipped_vertices
                        ));
                        ui.label(if self.last_report.computed {
                            "compute: dispatched".to_owned()
                        } else {
                            format!(
                                "compute: skipped ({})",
                                self.last_report.skipped.as_deref().unwrap_or("unknown")
                            )
                        });
                        if self.last_report.static_reset {
                            ui.label("buffers: static reset");
                        }
                    }
                });
            });
    }

    fn viewport(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default()
            .frame(egui::Frame::NONE)
            .show(ctx, |ui| {
                let (rect, response) =
                    ui.allocate_exact_size(ui.available_size(), egui::Sense::click_and_drag());
                if rect.width() < 1.0 || rect.height() < 1.0 {
                    return;
                }

                // input routing
                let buttons = ctx.input(|i| MouseButtons {
                    primary: i.pointer.primary_down(),
                    secondary: i.pointer.secondary_down(),
                    middle: i.pointer.middle_down(),
                });
                if (buttons.primary != self.prev_buttons.primary
                    || buttons.secondary != self.prev_buttons.secondary
                    || buttons.middle != self.prev_buttons.middle)
                    && (response.hovered() || response.dragged())
                {
                    self.schemes.active_mut().handle_mouse_button(buttons);
                }
                self.prev_buttons = buttons;

                if response.dragged() {
                    let delta = response.drag_delta();
                    if delta != egui::Vec2::ZERO {
                        self.schemes.active_mut().handle_mouse_move(
                            &mut self.camera,
                            delta.x,
                            delta.y,
                            buttons,
                        );
                    }
                }
                if response.hovered() {
                    let scroll = ctx.input(|i| i.raw_scroll_delta.y);
                    if scroll != 0.0 {
                        self.schemes
                            .active_mut()
                            .handle_scroll(&mut self.camera, scroll * 0.01);
                    }
                }

                // drive the pipeline at the viewport's pixel size
                self.camera.set_aspect(rect.width() / rect.height());
                let ppp = ctx.pixels_per_point();
                let size = (
                    (rect.width() * ppp).round() as u32,
                    (rect.height() * ppp).round() as u32,
                );
                self.last_report = self.driver.frame(
                    &self.render_state.device,
                    &self.render_state.queue,
                    self.schemes.active().scene(),
                    &self.camera,
                    size,
                );
                if self.show_stats {
                    if let Ok(counts) = self
                        .driver
                        .compute_pipeline()
                        .read_counts(&self.render_state.device, &self.render_state.queue)
                    {
                        self.last_counts = counts;
                    }
                }

                let texture_id = {
                    let mut renderer = self.render_state.renderer.write();
                    self.driver
                        .render_pipeline_mut()
                        .register_texture(&self.render_state.device, &mut renderer)
                };
                ui.painter().image(
                    texture_id,
                    rect,
                    egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
                    egui::Color32::WHITE,
                );

                if let Some(reason) = &self.last_report.skipped {
                    ui.painter().text(
                        rect.left_top() + egui::vec2(8.0, 8.0),
                        egui::Align2::LEFT_TOP,
                        format!("frame degraded: {reason}"),
                        egui::FontId::proportional(13.0),
                        egui::Color32::from_rgb(230, 160, 60),
                    );
                }
            });
    }
}

impl eframe::App for ViewerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        ctx.request_repaint();

        let dt = ctx.input(|i| i.stable_dt).min(0.1);
        self.forward_key_events(ctx);
        self.schemes.active_mut().update(&mut self.camera, dt);
        if dt > 0.0 {
            self.fps = 0.95 * self.fps + 0.05 / dt;
        }

        self.menu_bar(ctx);
        self.side_panel(ctx);
        self.viewport(ctx);
    }
}
