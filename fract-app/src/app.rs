use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use eframe::egui;
use tracing::{debug, error, info};

use fract_core::Viewport;
use fract_render::{Command, CoordinatorState, Gradient, RenderHandle};

use crate::preferences::AppPreferences;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// HUD box margin (same for all corners).
pub(crate) const HUD_MARGIN: f32 = 8.0;
/// HUD box corner radius.
pub(crate) const HUD_CORNER_RADIUS: f32 = 6.0;
/// Repaint interval while the engine is idle, so state changes still show.
const IDLE_REPAINT: Duration = Duration::from_millis(100);

// ---------------------------------------------------------------------------
// Application struct
// ---------------------------------------------------------------------------

pub(crate) struct FractApp {
    pub(crate) engine: RenderHandle,
    pub(crate) preferences: AppPreferences,
    texture: Option<egui::TextureHandle>,
    /// Render target size last sent to the engine.
    target_size: [u32; 2],
}

impl FractApp {
    pub(crate) fn new(engine: RenderHandle, preferences: AppPreferences, target_size: [u32; 2]) -> Self {
        Self {
            engine,
            preferences,
            texture: None,
            target_size,
        }
    }

    /// Ask the engine for a new target when the canvas or render scale changed.
    fn check_resize(&mut self, canvas: egui::Vec2) {
        let size = target_size(canvas, self.preferences.render_scale);
        if size != self.target_size {
            debug!(width = size[0], height = size[1], "Requesting render target resize");
            self.target_size = size;
            self.engine.send(Command::Resize {
                width: size[0],
                height: size[1],
            });
        }
    }

    /// Copy the engine's current frame into a texture. Tiles still in
    /// flight show up as they finish.
    fn upload_frame(&mut self, ctx: &egui::Context) {
        let frame = self.engine.frame();
        if frame.is_empty() {
            return;
        }
        let image = egui::ColorImage::from_rgba_unmultiplied(
            [frame.width() as usize, frame.height() as usize],
            &frame.to_rgba(),
        );
        match self.texture {
            Some(ref mut texture) => texture.set(image, egui::TextureOptions::LINEAR),
            None => {
                self.texture = Some(ctx.load_texture("fractal", image, egui::TextureOptions::LINEAR))
            }
        }
    }
}

/// Render target size for a canvas at the given resolution scale.
pub(crate) fn target_size(canvas: egui::Vec2, render_scale: f32) -> [u32; 2] {
    [
        (canvas.x * render_scale).max(1.0) as u32,
        (canvas.y * render_scale).max(1.0) as u32,
    ]
}

// ---------------------------------------------------------------------------
// eframe::App
// ---------------------------------------------------------------------------

impl eframe::App for FractApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        ctx.set_visuals(egui::Visuals::dark());
        self.handle_keys(ctx);
        self.upload_frame(ctx);

        egui::CentralPanel::default()
            .frame(egui::Frame::NONE.fill(egui::Color32::from_rgb(0x18, 0x18, 0x18)))
            .show(ctx, |ui| {
                let available = ui.available_size();
                self.check_resize(available);

                let (response, painter) = ui.allocate_painter(available, egui::Sense::click());
                if let Some(ref texture) = self.texture {
                    let uv = egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0));
                    painter.image(texture.id(), response.rect, uv, egui::Color32::WHITE);
                }
                self.draw_tile_overlay(&painter, response.rect);
                self.handle_canvas_input(&response);
            });

        self.show_hud(ctx);

        if self.engine.state() == CoordinatorState::Idle
            && self.engine.idle_workers() == self.engine.pool_size()
        {
            ctx.request_repaint_after(IDLE_REPAINT);
        } else {
            ctx.request_repaint();
        }
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        self.engine.shutdown();
        self.preferences.save();
        info!("Render engine stopped and preferences saved on exit");
    }
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

/// Load the gradient, start the render engine and run the window until it
/// closes. Startup failures are logged and end the process with status 1.
pub(crate) fn run(gradient_path: &Path) -> eframe::Result {
    info!("Starting Fract");

    let gradient = match Gradient::load(gradient_path) {
        Ok(gradient) => Arc::new(gradient),
        Err(e) => {
            error!("Failed to load gradient: {e}");
            std::process::exit(1);
        }
    };

    let prefs = AppPreferences::load();
    let initial_size = target_size(
        egui::vec2(prefs.window_width, prefs.window_height),
        prefs.render_scale,
    );
    let engine = match RenderHandle::spawn(
        prefs.render_config(),
        gradient,
        Viewport::initial(prefs.initial_params),
        initial_size[0],
        initial_size[1],
    ) {
        Ok(engine) => engine,
        Err(e) => {
            error!("Failed to start render engine: {e}");
            std::process::exit(1);
        }
    };

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("Fract")
            .with_inner_size([prefs.window_width, prefs.window_height]),
        ..Default::default()
    };

    eframe::run_native(
        "Fract",
        options,
        Box::new(move |_cc| Ok(Box::new(FractApp::new(engine, prefs, initial_size)))),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target_size_follows_render_scale() {
        assert_eq!(target_size(egui::vec2(800.0, 600.0), 1.0), [800, 600]);
        assert_eq!(target_size(egui::vec2(800.0, 600.0), 0.5), [400, 300]);
    }

    #[test]
    fn target_size_is_never_empty() {
        assert_eq!(target_size(egui::vec2(0.0, 3.0), 0.1), [1, 1]);
    }
}
