use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use fract_core::FractalParams;
use fract_render::{RenderConfig, TILE_SIZE};

/// Smallest render resolution scale reachable with the T key.
pub const MIN_RENDER_SCALE: f32 = 0.1;
pub const MAX_RENDER_SCALE: f32 = 1.0;

// ---------------------------------------------------------------------------
// Application preferences
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppPreferences {
    #[serde(default = "default_window_width")]
    pub window_width: f32,
    #[serde(default = "default_window_height")]
    pub window_height: f32,
    /// Iteration cap and precision of the first view.
    #[serde(default)]
    pub initial_params: FractalParams,
    /// Worker count override. `None` uses every hardware thread.
    #[serde(default)]
    pub worker_threads: Option<usize>,
    #[serde(default = "default_tile_size")]
    pub tile_size: u32,
    /// Render target size as a fraction of the window (0.1..=1.0).
    #[serde(default = "default_render_scale")]
    pub render_scale: f32,
    #[serde(default = "default_true")]
    pub show_status: bool,
    /// Outline tiles currently being computed.
    #[serde(default)]
    pub show_tile_overlay: bool,
    /// Status overlay background opacity 0.0..=1.0.
    #[serde(default = "default_hud_panel_opacity")]
    pub hud_panel_opacity: f32,
}

fn default_window_width() -> f32 {
    1280.0
}
fn default_window_height() -> f32 {
    720.0
}
fn default_tile_size() -> u32 {
    TILE_SIZE
}
fn default_render_scale() -> f32 {
    MAX_RENDER_SCALE
}
fn default_true() -> bool {
    true
}
fn default_hud_panel_opacity() -> f32 {
    0.65
}

impl Default for AppPreferences {
    fn default() -> Self {
        Self {
            window_width: default_window_width(),
            window_height: default_window_height(),
            initial_params: FractalParams::default(),
            worker_threads: None,
            tile_size: default_tile_size(),
            render_scale: default_render_scale(),
            show_status: true,
            show_tile_overlay: false,
            hud_panel_opacity: default_hud_panel_opacity(),
        }
    }
}

impl AppPreferences {
    /// Load preferences from next to the executable, falling back to defaults.
    pub fn load() -> Self {
        Self::load_from(&config_path())
    }

    /// Persist preferences next to the executable.
    pub fn save(&self) {
        self.save_to(&config_path());
    }

    fn load_from(path: &Path) -> Self {
        if path.exists() {
            match fs::read_to_string(path) {
                Ok(json) => match serde_json::from_str::<AppPreferences>(&json) {
                    Ok(mut prefs) => {
                        info!("Loaded preferences from {}", path.display());
                        prefs.render_scale = clamp_render_scale(prefs.render_scale);
                        return prefs;
                    }
                    Err(e) => {
                        error!("Failed to parse preferences: {e}");
                    }
                },
                Err(e) => {
                    error!("Failed to read preferences file: {e}");
                }
            }
        } else {
            debug!("No preferences file at {}", path.display());
        }
        Self::default()
    }

    fn save_to(&self, path: &Path) {
        if let Some(parent) = path.parent() {
            if let Err(e) = fs::create_dir_all(parent) {
                error!("Failed to create config directory: {e}");
                return;
            }
        }
        match serde_json::to_string_pretty(self) {
            Ok(json) => {
                if let Err(e) = fs::write(path, &json) {
                    error!("Failed to write preferences: {e}");
                } else {
                    debug!("Saved preferences");
                }
            }
            Err(e) => error!("Failed to serialize preferences: {e}"),
        }
    }

    /// Engine settings derived from these preferences.
    pub fn render_config(&self) -> RenderConfig {
        RenderConfig {
            worker_threads: self.worker_threads,
            tile_size: self.tile_size.max(1),
        }
    }
}

/// Keep a render scale within `MIN_RENDER_SCALE..=MAX_RENDER_SCALE`.
pub fn clamp_render_scale(scale: f32) -> f32 {
    if scale.is_finite() {
        scale.clamp(MIN_RENDER_SCALE, MAX_RENDER_SCALE)
    } else {
        MAX_RENDER_SCALE
    }
}

fn config_path() -> PathBuf {
    crate::app_dir::exe_directory().join("preferences.json")
}
