use eframe::egui;

use fract_render::Command;

use crate::app::FractApp;
use crate::preferences::{clamp_render_scale, MAX_RENDER_SCALE};

/// Screen pixels moved per pan key press.
pub(crate) const PAN_PIXELS: f64 = 100.0;
/// Scale multiplier per zoom key press.
pub(crate) const ZOOM_STEP: f64 = 2.0;
/// Iteration cap change per key press.
pub(crate) const ITERATION_STEP: i64 = 10;
/// Precision change in bits per key press.
pub(crate) const PRECISION_STEP: i64 = 10;
/// Render resolution scale change per key press.
pub(crate) const RENDER_SCALE_STEP: f32 = 0.1;

/// What a key press asks for.
#[derive(Debug, Clone)]
pub(crate) enum KeyAction {
    Engine(Command),
    AdjustRenderScale(f32),
    ResetRenderScale,
    ToggleTileOverlay,
}

/// Map a key to its action, if it has one.
pub(crate) fn key_action(key: egui::Key) -> Option<KeyAction> {
    use egui::Key;

    let action = match key {
        Key::W => KeyAction::Engine(Command::PanPixels {
            dx: 0.0,
            dy: -PAN_PIXELS,
        }),
        Key::S => KeyAction::Engine(Command::PanPixels {
            dx: 0.0,
            dy: PAN_PIXELS,
        }),
        Key::A => KeyAction::Engine(Command::PanPixels {
            dx: -PAN_PIXELS,
            dy: 0.0,
        }),
        Key::D => KeyAction::Engine(Command::PanPixels {
            dx: PAN_PIXELS,
            dy: 0.0,
        }),
        Key::Space => KeyAction::Engine(Command::Zoom { factor: ZOOM_STEP }),
        Key::U => KeyAction::Engine(Command::Zoom {
            factor: 1.0 / ZOOM_STEP,
        }),
        Key::C => KeyAction::Engine(Command::SetIterations {
            delta: ITERATION_STEP,
        }),
        Key::X => KeyAction::Engine(Command::SetIterations {
            delta: -ITERATION_STEP,
        }),
        Key::P => KeyAction::Engine(Command::SetPrecision {
            delta: PRECISION_STEP,
        }),
        Key::O => KeyAction::Engine(Command::SetPrecision {
            delta: -PRECISION_STEP,
        }),
        Key::T => KeyAction::AdjustRenderScale(-RENDER_SCALE_STEP),
        Key::Y => KeyAction::AdjustRenderScale(RENDER_SCALE_STEP),
        Key::R => KeyAction::ResetRenderScale,
        Key::F1 => KeyAction::ToggleTileOverlay,
        _ => return None,
    };
    Some(action)
}

/// Render scale after applying `action` to `current`.
pub(crate) fn next_render_scale(current: f32, action: &KeyAction) -> f32 {
    match action {
        KeyAction::AdjustRenderScale(delta) => {
            // Round to one decimal so repeated steps land on 0.1 multiples.
            clamp_render_scale(((current + delta) * 10.0).round() / 10.0)
        }
        KeyAction::ResetRenderScale => MAX_RENDER_SCALE,
        _ => current,
    }
}

impl FractApp {
    pub(crate) fn handle_keys(&mut self, ctx: &egui::Context) {
        let pressed: Vec<egui::Key> = ctx.input(|i| {
            i.events
                .iter()
                .filter_map(|event| match event {
                    egui::Event::Key {
                        key,
                        pressed: true,
                        ..
                    } => Some(*key),
                    _ => None,
                })
                .collect()
        });

        for key in pressed {
            let Some(action) = key_action(key) else {
                continue;
            };
            match action {
                KeyAction::Engine(command) => self.engine.send(command),
                KeyAction::AdjustRenderScale(_) | KeyAction::ResetRenderScale => {
                    self.preferences.render_scale =
                        next_render_scale(self.preferences.render_scale, &action);
                }
                KeyAction::ToggleTileOverlay => {
                    self.preferences.show_tile_overlay = !self.preferences.show_tile_overlay;
                }
            }
        }
    }

    /// A primary click recentres on the render-target pixel under the cursor.
    pub(crate) fn handle_canvas_input(&mut self, response: &egui::Response) {
        if !response.clicked_by(egui::PointerButton::Primary) {
            return;
        }
        let Some(pos) = response.interact_pointer_pos() else {
            return;
        };
        let scale = self.preferences.render_scale;
        let x = ((pos.x - response.rect.min.x) * scale) as i64;
        let y = ((pos.y - response.rect.min.y) * scale) as i64;
        self.engine.send(Command::Recenter { x, y });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pan_keys_move_one_hundred_pixels() {
        assert!(matches!(
            key_action(egui::Key::W),
            Some(KeyAction::Engine(Command::PanPixels { dx, dy })) if dx == 0.0 && dy == -100.0
        ));
        assert!(matches!(
            key_action(egui::Key::D),
            Some(KeyAction::Engine(Command::PanPixels { dx, dy })) if dx == 100.0 && dy == 0.0
        ));
    }

    #[test]
    fn zoom_keys_double_and_halve() {
        assert!(matches!(
            key_action(egui::Key::Space),
            Some(KeyAction::Engine(Command::Zoom { factor })) if factor == 2.0
        ));
        assert!(matches!(
            key_action(egui::Key::U),
            Some(KeyAction::Engine(Command::Zoom { factor })) if factor == 0.5
        ));
    }

    #[test]
    fn iteration_and_precision_keys() {
        assert!(matches!(
            key_action(egui::Key::X),
            Some(KeyAction::Engine(Command::SetIterations { delta: -10 }))
        ));
        assert!(matches!(
            key_action(egui::Key::P),
            Some(KeyAction::Engine(Command::SetPrecision { delta: 10 }))
        ));
        assert!(matches!(key_action(egui::Key::F1), Some(KeyAction::ToggleTileOverlay)));
    }

    #[test]
    fn unmapped_key_has_no_action() {
        assert!(key_action(egui::Key::Q).is_none());
    }

    #[test]
    fn render_scale_steps_stay_in_range() {
        let down = KeyAction::AdjustRenderScale(-RENDER_SCALE_STEP);
        let up = KeyAction::AdjustRenderScale(RENDER_SCALE_STEP);

        let mut scale = 1.0;
        for _ in 0..20 {
            scale = next_render_scale(scale, &down);
        }
        assert!((scale - 0.1).abs() < 1e-6);

        assert_eq!(next_render_scale(1.0, &up), 1.0);
        assert!((next_render_scale(0.5, &up) - 0.6).abs() < 1e-6);
        assert_eq!(next_render_scale(0.3, &KeyAction::ResetRenderScale), 1.0);
    }
}
