use fract_core::{FractalParams, Mandelbrot, Viewport};
use rug::Float;

/// Evaluate every pixel of a `width × height` view and collect results.
fn evaluate_grid(viewport: &Viewport, width: u32, height: u32) -> Vec<f64> {
    let mandelbrot = Mandelbrot::new(*viewport.params());
    let mut results = Vec::with_capacity((width * height) as usize);
    for y in 0..height {
        for x in 0..width {
            let c = viewport.pixel_to_complex(x as i64, y as i64, width, height);
            results.push(mandelbrot.evaluate(&c));
        }
    }
    results
}

#[test]
fn headless_grid_contains_bounded_and_escaped_points() {
    let params = FractalParams::new(50, 64).unwrap();
    let mut viewport = Viewport::initial(params);
    viewport.zoom(0.1).unwrap();

    let results = evaluate_grid(&viewport, 40, 30);

    assert_eq!(results.len(), 40 * 30);
    assert!(results.iter().any(|&v| v == 1.0), "expected bounded points");
    assert!(results.iter().any(|&v| v == 0.0), "expected immediate escapes");
    assert!(results.iter().all(|v| (0.0..=1.0).contains(v)));
}

#[test]
fn headless_grid_is_deterministic() {
    let params = FractalParams::new(40, 96).unwrap();
    let viewport = Viewport::parse("-0.75", "0.1", "400", params).unwrap();

    let run1 = evaluate_grid(&viewport, 24, 16);
    let run2 = evaluate_grid(&viewport, 24, 16);

    assert_eq!(run1, run2, "identical inputs must give identical results");
}

#[test]
fn deep_zoom_keeps_neighbouring_pixels_distinct() {
    // At 2^70 pixels per unit, neighbouring pixels are 2^-70 apart: far below
    // f64 resolution near -0.75, but representable with enough bits.
    let params = FractalParams::new(10, 64).unwrap();
    let mut viewport = Viewport::parse("-0.75", "0.0", "1", params).unwrap();
    viewport.adjust_precision(96);
    viewport
        .set_scale(Float::with_val(160, Float::i_exp(1, 70)))
        .unwrap();

    let a = viewport.pixel_to_complex(0, 0, 4, 4);
    let b = viewport.pixel_to_complex(1, 0, 4, 4);
    assert_ne!(a.re, b.re);
    assert_eq!(a.re.to_f64(), b.re.to_f64(), "f64 cannot tell them apart");
}
