use rug::{Assign, Float};

/// A complex number with arbitrary-precision components.
///
/// Both parts always carry the same precision. Unlike a machine-float pair
/// this is not `Copy`: clones allocate, so the hot loop reuses scratch values
/// instead of building new ones per step.
#[derive(Debug, Clone, PartialEq)]
pub struct BigComplex {
    pub re: Float,
    pub im: Float,
}

impl BigComplex {
    /// Build a complex number from two existing values.
    ///
    /// The imaginary part is rounded to the real part's precision if they
    /// differ.
    pub fn new(re: Float, mut im: Float) -> Self {
        if im.prec() != re.prec() {
            im.set_prec(re.prec());
        }
        Self { re, im }
    }

    /// Build a complex number from machine floats at `prec` bits.
    pub fn with_val(prec: u32, re: f64, im: f64) -> Self {
        Self {
            re: Float::with_val(prec, re),
            im: Float::with_val(prec, im),
        }
    }

    /// The origin at `prec` bits.
    pub fn zero(prec: u32) -> Self {
        Self {
            re: Float::new(prec),
            im: Float::new(prec),
        }
    }

    /// Bits of significand carried by each component.
    #[inline]
    pub fn prec(&self) -> u32 {
        self.re.prec()
    }

    /// Round both components to `prec` bits in place.
    pub fn set_prec(&mut self, prec: u32) {
        self.re.set_prec(prec);
        self.im.set_prec(prec);
    }

    /// Returns `re² + im²` without taking the square root.
    pub fn norm_sq(&self) -> Float {
        let mut re2 = Float::with_val(self.prec(), &self.re * &self.re);
        let im2 = Float::with_val(self.prec(), &self.im * &self.im);
        re2 += &im2;
        re2
    }

    /// Add `other` component-wise in place.
    pub fn add_assign_ref(&mut self, other: &Self) {
        self.re += &other.re;
        self.im += &other.im;
    }

    /// Overwrite both components, keeping this value's precision.
    pub fn assign_from(&mut self, other: &Self) {
        self.re.assign(&other.re);
        self.im.assign(&other.im);
    }

    /// Lossy conversion for logging and coarse UI hints.
    pub fn to_f64(&self) -> (f64, f64) {
        (self.re.to_f64(), self.im.to_f64())
    }
}

impl std::fmt::Display for BigComplex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.im.is_sign_negative() {
            let abs_im = Float::with_val(self.prec(), self.im.abs_ref());
            write!(f, "{} - {}i", self.re, abs_im)
        } else {
            write!(f, "{} + {}i", self.re, self.im)
        }
    }
}
