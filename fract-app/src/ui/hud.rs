use eframe::egui;

use fract_render::CoordinatorState;

use crate::app::{FractApp, HUD_CORNER_RADIUS, HUD_MARGIN};

fn state_label(state: CoordinatorState) -> &'static str {
    match state {
        CoordinatorState::Idle => "Idle",
        CoordinatorState::Resizing => "Resizing",
        CoordinatorState::Distributing => "Rendering",
        CoordinatorState::ShuttingDown => "Shutting down",
    }
}

impl FractApp {
    pub(crate) fn show_hud(&self, ctx: &egui::Context) {
        if !self.preferences.show_status {
            return;
        }

        let hud_alpha =
            (self.preferences.hud_panel_opacity.clamp(0.0, 1.0) * 255.0).round() as u8;
        let status = self.engine.status();

        // -- Top-left: viewport readout --
        egui::Area::new(egui::Id::new("hud_status"))
            .anchor(egui::Align2::LEFT_TOP, [HUD_MARGIN, HUD_MARGIN])
            .show(ctx, |ui| {
                egui::Frame::NONE
                    .fill(egui::Color32::from_black_alpha(hud_alpha))
                    .inner_margin(egui::Margin::same(8))
                    .corner_radius(HUD_CORNER_RADIUS)
                    .show(ui, |ui| {
                        ui.style_mut().visuals.override_text_color =
                            Some(egui::Color32::from_rgb(220, 220, 220));
                        ui.style_mut().override_text_style = Some(egui::TextStyle::Monospace);

                        ui.label(format!("re:    {}", status.re));
                        ui.label(format!("im:    {}", status.im));
                        ui.label(format!("scale: {}", status.scale));
                        ui.label(format!("iter:  {}", status.iterations));
                        ui.label(format!("prec:  {}", status.precision));
                    });
            });

        // -- Bottom-centre: engine state --
        egui::Area::new(egui::Id::new("hud_render"))
            .anchor(egui::Align2::CENTER_BOTTOM, [0.0, -HUD_MARGIN])
            .show(ctx, |ui| {
                egui::Frame::NONE
                    .fill(egui::Color32::from_black_alpha(hud_alpha))
                    .inner_margin(egui::Margin::same(8))
                    .corner_radius(HUD_CORNER_RADIUS)
                    .show(ui, |ui| {
                        ui.set_min_width(180.0);
                        ui.style_mut().visuals.override_text_color =
                            Some(egui::Color32::from_rgb(200, 200, 200));
                        ui.style_mut().spacing.item_spacing.y = 2.0;

                        let state = self.engine.state();
                        let state_color = match state {
                            CoordinatorState::Idle => egui::Color32::from_rgb(100, 255, 100),
                            CoordinatorState::Resizing | CoordinatorState::Distributing => {
                                egui::Color32::YELLOW
                            }
                            CoordinatorState::ShuttingDown => egui::Color32::GRAY,
                        };
                        ui.colored_label(state_color, state_label(state));

                        let passes = self.engine.passes();
                        ui.label(format!(
                            "{} passes, {} aborted",
                            passes.completed, passes.aborted
                        ));
                        ui.label(format!(
                            "{}/{} workers idle, render scale {:.1}",
                            self.engine.idle_workers(),
                            self.engine.pool_size(),
                            self.preferences.render_scale,
                        ));

                        if let Some(error) = self.engine.last_error() {
                            ui.colored_label(egui::Color32::from_rgb(255, 180, 50), error);
                        }
                    });
            });
    }

    /// Outline every in-flight tile; abandoned ones are drawn in red.
    pub(crate) fn draw_tile_overlay(&self, painter: &egui::Painter, canvas: egui::Rect) {
        if !self.preferences.show_tile_overlay {
            return;
        }
        let to_screen = 1.0 / self.preferences.render_scale;
        for assignment in self.engine.assignments() {
            let tile = assignment.tile;
            let min = canvas.min + egui::vec2(tile.x as f32, tile.y as f32) * to_screen;
            let size = egui::vec2(tile.width as f32, tile.height as f32) * to_screen;
            let color = if assignment.abandoned {
                egui::Color32::from_rgb(255, 80, 80)
            } else {
                egui::Color32::from_rgb(80, 200, 255)
            };
            painter.rect_stroke(
                egui::Rect::from_min_size(min, size),
                0.0,
                egui::Stroke::new(1.0, color),
                egui::StrokeKind::Inside,
            );
        }
    }
}
