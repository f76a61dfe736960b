use rug::Float;
use tracing::debug;

use crate::complex::BigComplex;
use crate::error::CoreError;
use crate::fractal::FractalParams;

/// Digits after the point shown for the centre in the status readout.
pub const STATUS_CENTER_DIGITS: usize = 32;

/// Defines the visible region of the complex plane.
///
/// Pixel `(x, y)` of a `w × h` target maps to
/// `centre + ((x − w/2) / scale, (y − h/2) / scale)`, so `scale` is in
/// pixels per complex unit and grows as the user zooms in.
///
/// Every value carries `params.precision` bits. The type is an ordinary
/// value: cloning it is how a render pass takes a consistent snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct Viewport {
    center: BigComplex,
    scale: Float,
    params: FractalParams,
}

/// Decimal rendering of a [`Viewport`] for an on-screen overlay.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ViewportStatus {
    pub re: String,
    pub im: String,
    pub scale: String,
    pub iterations: u32,
    pub precision: u32,
}

impl Viewport {
    pub const DEFAULT_SCALE: f64 = 100.0;

    /// Starting view: the origin at 100 pixels per unit.
    pub fn initial(params: FractalParams) -> Self {
        Self {
            center: BigComplex::zero(params.precision),
            scale: Float::with_val(params.precision, Self::DEFAULT_SCALE),
            params,
        }
    }

    /// Create a viewport with explicit parameters.
    ///
    /// `center` and `scale` are rounded to `params.precision` bits.
    pub fn new(mut center: BigComplex, mut scale: Float, params: FractalParams) -> crate::Result<Self> {
        validate_scale(&scale)?;
        center.set_prec(params.precision);
        scale.set_prec(params.precision);
        Ok(Self {
            center,
            scale,
            params,
        })
    }

    /// Parse a viewport from decimal strings, e.g. a saved last view.
    pub fn parse(re: &str, im: &str, scale: &str, params: FractalParams) -> crate::Result<Self> {
        let prec = params.precision;
        let parse = |field: &'static str, text: &str| {
            Float::parse(text)
                .map(|p| Float::with_val(prec, p))
                .map_err(|source| CoreError::Parse { field, source })
        };
        let center = BigComplex::new(parse("re", re)?, parse("im", im)?);
        Self::new(center, parse("scale", scale)?, params)
    }

    pub fn center(&self) -> &BigComplex {
        &self.center
    }

    pub fn scale(&self) -> &Float {
        &self.scale
    }

    pub fn params(&self) -> &FractalParams {
        &self.params
    }

    pub fn max_iterations(&self) -> u32 {
        self.params.max_iterations
    }

    pub fn precision(&self) -> u32 {
        self.params.precision
    }

    /// Move the centre by a complex-plane offset.
    pub fn pan(&mut self, re: &Float, im: &Float) {
        self.center.re += re;
        self.center.im += im;
    }

    /// Move the centre by a screen-space offset at the current scale.
    pub fn pan_pixels(&mut self, dx: f64, dy: f64) {
        let prec = self.precision();
        let re = Float::with_val(prec, dx) / &self.scale;
        let im = Float::with_val(prec, dy) / &self.scale;
        self.pan(&re, &im);
    }

    /// Multiply the scale by `factor` (> 1 zooms in).
    pub fn zoom(&mut self, factor: f64) -> crate::Result<()> {
        if !(factor.is_finite() && factor > 0.0) {
            return Err(CoreError::InvalidZoomFactor(factor));
        }
        self.scale *= factor;
        Ok(())
    }

    /// Replace the scale outright.
    pub fn set_scale(&mut self, value: Float) -> crate::Result<()> {
        validate_scale(&value)?;
        self.scale = Float::with_val(self.precision(), &value);
        Ok(())
    }

    /// Change the iteration cap by `delta`; the cap never drops below 1.
    pub fn adjust_iterations(&mut self, delta: i64) {
        self.params = self.params.with_iterations_delta(delta);
    }

    /// Change the precision by `delta` bits and re-derive every value at the
    /// new precision.
    pub fn adjust_precision(&mut self, delta: i64) {
        let from = self.params.precision;
        self.params = self.params.with_precision_delta(delta);
        self.center.set_prec(self.params.precision);
        self.scale.set_prec(self.params.precision);
        debug!(from, to = self.params.precision, "Re-derived viewport precision");
    }

    /// Move the centre to the point under pixel `(x, y)` of a `width × height`
    /// target.
    pub fn recenter(&mut self, x: i64, y: i64, width: u32, height: u32) {
        self.center = self.pixel_to_complex(x, y, width, height);
    }

    /// Map a pixel of a `width × height` target to the complex plane.
    ///
    /// Coordinates outside the target are allowed and extrapolate linearly.
    pub fn pixel_to_complex(&self, x: i64, y: i64, width: u32, height: u32) -> BigComplex {
        let prec = self.precision();
        let mut re = Float::with_val(prec, x - (width / 2) as i64);
        re /= &self.scale;
        re += &self.center.re;
        let mut im = Float::with_val(prec, y - (height / 2) as i64);
        im /= &self.scale;
        im += &self.center.im;
        BigComplex { re, im }
    }

    /// Decimal rendering for an overlay.
    pub fn status(&self) -> ViewportStatus {
        ViewportStatus {
            re: fixed_digits(&self.center.re, STATUS_CENTER_DIGITS),
            im: fixed_digits(&self.center.im, STATUS_CENTER_DIGITS),
            scale: self.scale.to_string_radix(10, Some(12)),
            iterations: self.params.max_iterations,
            precision: self.params.precision,
        }
    }
}

fn validate_scale(scale: &Float) -> crate::Result<()> {
    if scale.is_finite() && *scale > 0 {
        Ok(())
    } else {
        Err(CoreError::InvalidScale(scale.to_string()))
    }
}

/// Render `value` with `digits` digits after the decimal point.
fn fixed_digits(value: &Float, digits: usize) -> String {
    // Scale by 10^digits, round to an integer and re-insert the point so
    // the output never switches to exponent notation.
    let prec = value.prec().max(64) + (digits as u32 * 4);
    let mut scaled = Float::with_val(prec, value);
    scaled *= Float::with_val(prec, Float::u_pow_u(10, digits as u32));
    let int = scaled.round().to_integer().unwrap_or_default();
    let negative = int < 0;
    let mut body = int.abs().to_string();
    if body.len() <= digits {
        body = format!("{}{}", "0".repeat(digits + 1 - body.len()), body);
    }
    let split = body.len() - digits;
    let sign = if negative { "-" } else { "" };
    format!("{sign}{}.{}", &body[..split], &body[split..])
}
