//! Colour lookup for normalized escape values.

use std::path::Path;

use tracing::{debug, info};

use crate::error::RenderError;

const ALPHA_OPAQUE: u32 = 0xff00_0000;

/// A fixed, read-only ramp of ARGB colours.
///
/// A value `v` in `[0, 1]` selects entry `floor(v * width)`, clamped to the
/// last entry so `v == 1.0` (a bounded point) stays in range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Gradient {
    colors: Vec<u32>,
}

impl Gradient {
    /// Build a gradient from ARGB words. At least one colour is required.
    pub fn from_colors(colors: Vec<u32>) -> crate::Result<Self> {
        if colors.is_empty() {
            return Err(RenderError::EmptyGradient);
        }
        Ok(Self { colors })
    }

    /// Linear ramp between two colours with `steps` entries.
    pub fn linear(from: u32, to: u32, steps: usize) -> crate::Result<Self> {
        let steps = steps.max(1);
        let colors = (0..steps)
            .map(|i| {
                let t = if steps == 1 { 0.0 } else { i as f64 / (steps - 1) as f64 };
                lerp_argb(from, to, t)
            })
            .collect();
        Self::from_colors(colors)
    }

    /// Decode an image asset and take its first row as the colour ramp.
    pub fn load(path: &Path) -> crate::Result<Self> {
        let image = image::open(path)
            .map_err(|source| RenderError::GradientDecode {
                path: path.display().to_string(),
                source,
            })?
            .to_rgba8();
        debug!(
            width = image.width(),
            height = image.height(),
            "Decoded gradient asset"
        );
        let colors: Vec<u32> = image
            .rows()
            .next()
            .map(|row| {
                row.map(|px| {
                    let [r, g, b, a] = px.0;
                    u32::from_be_bytes([a, r, g, b])
                })
                .collect()
            })
            .unwrap_or_default();
        let gradient = Self::from_colors(colors)?;
        info!(path = %path.display(), width = gradient.width(), "Loaded gradient");
        Ok(gradient)
    }

    /// Number of entries.
    pub fn width(&self) -> usize {
        self.colors.len()
    }

    pub fn colors(&self) -> &[u32] {
        &self.colors
    }

    /// Map a normalized value to an opaque ARGB colour.
    #[inline]
    pub fn color_of(&self, v: f64) -> u32 {
        color_of(v, self)
    }
}

/// Map `v` to `gradient[clamp(floor(v * width), 0, width - 1)]` with the
/// alpha channel forced to opaque.
///
/// Values below zero, above one, and NaN all clamp into range.
#[inline]
pub fn color_of(v: f64, gradient: &Gradient) -> u32 {
    let last = gradient.colors.len() - 1;
    // `as usize` saturates: negatives and NaN become 0.
    let index = ((v * gradient.colors.len() as f64).floor() as usize).min(last);
    gradient.colors[index] | ALPHA_OPAQUE
}

fn lerp_argb(a: u32, b: u32, t: f64) -> u32 {
    let a = a.to_be_bytes();
    let b = b.to_be_bytes();
    let inv = 1.0 - t;
    let mix = |i: usize| (a[i] as f64 * inv + b[i] as f64 * t).round() as u8;
    u32::from_be_bytes([0xff, mix(1), mix(2), mix(3)])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp() -> Gradient {
        Gradient::from_colors(vec![0x00_00_00_01, 0x00_00_00_02, 0x00_00_00_03, 0x00_00_00_04])
            .unwrap()
    }

    #[test]
    fn empty_gradient_is_rejected() {
        assert!(matches!(
            Gradient::from_colors(Vec::new()),
            Err(RenderError::EmptyGradient)
        ));
    }

    #[test]
    fn top_boundary_clamps_to_last_entry() {
        assert_eq!(color_of(1.0, &ramp()), 0xff00_0004);
    }

    #[test]
    fn floor_indexing() {
        let g = ramp();
        assert_eq!(color_of(0.0, &g), 0xff00_0001);
        assert_eq!(color_of(0.24, &g), 0xff00_0001);
        assert_eq!(color_of(0.25, &g), 0xff00_0002);
        assert_eq!(color_of(0.99, &g), 0xff00_0004);
    }

    #[test]
    fn out_of_range_values_clamp() {
        let g = ramp();
        assert_eq!(color_of(-0.5, &g), 0xff00_0001);
        assert_eq!(color_of(7.0, &g), 0xff00_0004);
        assert_eq!(color_of(f64::NAN, &g), 0xff00_0001);
        assert_eq!(color_of(f64::INFINITY, &g), 0xff00_0004);
    }

    #[test]
    fn alpha_is_forced_opaque() {
        let g = Gradient::from_colors(vec![0x0012_3456]).unwrap();
        assert_eq!(g.color_of(0.5), 0xff12_3456);
    }

    #[test]
    fn linear_ramp_endpoints() {
        let g = Gradient::linear(0xff00_0000, 0xffff_ffff, 256).unwrap();
        assert_eq!(g.width(), 256);
        assert_eq!(g.colors()[0], 0xff00_0000);
        assert_eq!(g.colors()[255], 0xffff_ffff);
    }

    #[test]
    fn load_takes_first_row() {
        let path = std::env::temp_dir().join(format!("fract-gradient-{}.png", std::process::id()));
        let mut img = image::RgbaImage::new(3, 2);
        img.put_pixel(0, 0, image::Rgba([255, 0, 0, 255]));
        img.put_pixel(1, 0, image::Rgba([0, 255, 0, 255]));
        img.put_pixel(2, 0, image::Rgba([0, 0, 255, 10]));
        img.put_pixel(0, 1, image::Rgba([9, 9, 9, 255]));
        img.save(&path).unwrap();

        let g = Gradient::load(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(g.colors(), &[0xffff_0000, 0xff00_ff00, 0x0a00_00ff]);
        assert_eq!(g.color_of(1.0), 0xff00_00ff);
    }

    #[test]
    fn load_missing_file_fails() {
        let err = Gradient::load(Path::new("/definitely/not/here.png")).unwrap_err();
        assert!(matches!(err, RenderError::GradientDecode { .. }));
    }
}
