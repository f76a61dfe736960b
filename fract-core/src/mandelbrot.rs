use rug::{Assign, Float};

use crate::complex::BigComplex;
use crate::fractal::FractalParams;

/// Escape-time evaluator for `z ← z² + c`, starting from `z₀ = c`.
///
/// All arithmetic runs at `params.precision` bits, independent of the
/// precision the caller's coordinate was built with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Mandelbrot {
    params: FractalParams,
}

impl Mandelbrot {
    pub fn new(params: FractalParams) -> Self {
        Self { params }
    }

    /// Access the iteration parameters.
    pub fn params(&self) -> &FractalParams {
        &self.params
    }

    /// Normalized escape value of `c` in `[0, 1]`.
    ///
    /// `1.0` means the orbit stayed bounded for every iteration.
    pub fn evaluate(&self, c: &BigComplex) -> f64 {
        evaluate(c, self.params.max_iterations, self.params.precision)
    }
}

/// Iterate `c` for at most `max_iter` steps at `precision` bits and return
/// `i / max_iter`, where `i` is the number of steps completed before
/// `|z|² > 4`.
///
/// The escape test runs before every step, so a point already outside the
/// radius returns `0.0`. A cap of `0` is treated as `1`.
pub fn evaluate(c: &BigComplex, max_iter: u32, precision: u32) -> f64 {
    let max_iter = max_iter.max(1);

    let mut zre = Float::with_val(precision, &c.re);
    let mut zim = Float::with_val(precision, &c.im);
    let mut re2 = Float::new(precision);
    let mut im2 = Float::new(precision);
    let mut norm = Float::new(precision);

    let mut i = 0;
    while i < max_iter {
        re2.assign(&zre * &zre);
        im2.assign(&zim * &zim);
        norm.assign(&re2 + &im2);
        if norm > 4 {
            break;
        }

        // zim uses the old zre, so it is updated first.
        zim *= &zre;
        zim *= 2;
        zim += &c.im;

        zre.assign(&re2 - &im2);
        zre += &c.re;

        i += 1;
    }

    i as f64 / max_iter as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(re: f64, im: f64) -> BigComplex {
        BigComplex::with_val(64, re, im)
    }

    #[test]
    fn origin_never_escapes() {
        for max_iter in [1, 2, 10, 100] {
            assert_eq!(evaluate(&at(0.0, 0.0), max_iter, 64), 1.0);
        }
    }

    #[test]
    fn far_point_escapes_immediately() {
        for max_iter in [1, 10, 500] {
            assert_eq!(evaluate(&at(3.0, 0.0), max_iter, 64), 0.0);
        }
    }

    #[test]
    fn zero_cap_is_clamped_to_one() {
        assert_eq!(evaluate(&at(0.0, 0.0), 0, 64), 1.0);
        assert_eq!(evaluate(&at(3.0, 0.0), 0, 64), 0.0);
    }

    #[test]
    fn known_escape_count() {
        // z₀=1 (|z|²=1), z₁=2 (|z|²=4, not > 4), z₂=5 → stops after 2 steps.
        let v = evaluate(&at(1.0, 0.0), 10, 64);
        assert!((v - 0.2).abs() < 1e-12, "got {v}");
    }

    #[test]
    fn boundary_radius_is_not_escaped() {
        // |2|² = 4 is not strictly greater than 4, so one step happens.
        let v = evaluate(&at(2.0, 0.0), 4, 64);
        assert!((v - 0.25).abs() < 1e-12, "got {v}");
    }

    #[test]
    fn period_two_point_is_bounded() {
        assert_eq!(evaluate(&at(-1.0, 0.0), 200, 64), 1.0);
    }

    #[test]
    fn result_is_within_unit_interval() {
        for &(re, im) in &[(0.3, 0.5), (-0.75, 0.1), (-2.0, 0.0), (0.26, 0.0), (1.0, 1.0)] {
            let v = evaluate(&at(re, im), 64, 80);
            assert!((0.0..=1.0).contains(&v), "{re}+{im}i gave {v}");
        }
    }

    #[test]
    fn deterministic_results() {
        let m = Mandelbrot::new(FractalParams::new(300, 96).unwrap());
        let points = [at(-0.7436, 0.1318), at(0.2501, 0.0), at(-1.25, 0.02)];
        let run1: Vec<_> = points.iter().map(|c| m.evaluate(c)).collect();
        let run2: Vec<_> = points.iter().map(|c| m.evaluate(c)).collect();
        assert_eq!(run1, run2, "evaluation must be deterministic");
    }

    #[test]
    fn precision_separates_nearby_points() {
        // Two points 2⁻⁸⁰ apart collapse at 53 bits but not at 256 bits.
        let base = Float::with_val(256, -0.75);
        let eps = Float::with_val(256, Float::i_exp(1, -80));
        let a = BigComplex::new(Float::with_val(256, &base + &eps), Float::with_val(256, 0.1));
        let b = BigComplex::new(base, Float::with_val(256, 0.1));

        let mut a_low = a.clone();
        a_low.set_prec(53);
        let mut b_low = b.clone();
        b_low.set_prec(53);
        assert_eq!(a_low, b_low, "53 bits should not distinguish the points");
        assert_ne!(a, b, "256 bits should distinguish the points");
    }
}
