use crate::error::CoreError;

/// Parameters controlling fractal iteration.
///
/// Both fields are clamped into their valid ranges on deserialization so a
/// hand-edited preferences file can never produce an unusable render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct FractalParams {
    /// Maximum number of iterations before declaring a point bounded.
    pub max_iterations: u32,

    /// Bits of significand used for every arbitrary-precision value.
    pub precision: u32,
}

/// Out-of-range values are clamped on load.
impl<'de> serde::Deserialize<'de> for FractalParams {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(serde::Deserialize)]
        struct Raw {
            max_iterations: u32,
            precision: u32,
        }
        let raw = Raw::deserialize(deserializer)?;
        Ok(Self {
            max_iterations: raw.max_iterations.max(1),
            precision: Self::clamp_precision(raw.precision as i64),
        })
    }
}

impl FractalParams {
    pub const DEFAULT_MAX_ITERATIONS: u32 = 10;
    pub const DEFAULT_PRECISION: u32 = 64;
    pub const MIN_PRECISION: u32 = 16;
    pub const MAX_PRECISION: u32 = 4096;

    pub fn new(max_iterations: u32, precision: u32) -> crate::Result<Self> {
        if max_iterations < 1 {
            return Err(CoreError::InvalidMaxIterations(max_iterations));
        }
        if !(Self::MIN_PRECISION..=Self::MAX_PRECISION).contains(&precision) {
            return Err(CoreError::InvalidPrecision(precision));
        }
        Ok(Self {
            max_iterations,
            precision,
        })
    }

    /// Return a copy with `delta` added to the iteration cap, never below 1.
    pub fn with_iterations_delta(self, delta: i64) -> Self {
        let next = (self.max_iterations as i64).saturating_add(delta);
        Self {
            max_iterations: next.clamp(1, u32::MAX as i64) as u32,
            ..self
        }
    }

    /// Return a copy with `delta` bits added to the precision, clamped.
    pub fn with_precision_delta(self, delta: i64) -> Self {
        Self {
            precision: Self::clamp_precision((self.precision as i64).saturating_add(delta)),
            ..self
        }
    }

    fn clamp_precision(bits: i64) -> u32 {
        bits.clamp(Self::MIN_PRECISION as i64, Self::MAX_PRECISION as i64) as u32
    }
}

impl Default for FractalParams {
    fn default() -> Self {
        Self {
            max_iterations: Self::DEFAULT_MAX_ITERATIONS,
            precision: Self::DEFAULT_PRECISION,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_params() {
        let p = FractalParams::default();
        assert_eq!(p.max_iterations, 10);
        assert_eq!(p.precision, 64);
    }

    #[test]
    fn invalid_max_iterations() {
        assert!(FractalParams::new(0, 64).is_err());
    }

    #[test]
    fn invalid_precision() {
        assert!(FractalParams::new(10, 0).is_err());
        assert!(FractalParams::new(10, FractalParams::MIN_PRECISION - 1).is_err());
        assert!(FractalParams::new(10, FractalParams::MAX_PRECISION + 1).is_err());
        assert!(FractalParams::new(10, FractalParams::MIN_PRECISION).is_ok());
    }

    #[test]
    fn iteration_delta_never_reaches_zero() {
        let p = FractalParams::new(10, 64).unwrap();
        assert_eq!(p.with_iterations_delta(-10).max_iterations, 1);
        assert_eq!(p.with_iterations_delta(-1000).max_iterations, 1);
        assert_eq!(p.with_iterations_delta(10).max_iterations, 20);
    }

    #[test]
    fn precision_delta_is_clamped() {
        let p = FractalParams::default();
        assert_eq!(p.with_precision_delta(10).precision, 74);
        assert_eq!(
            p.with_precision_delta(-1000).precision,
            FractalParams::MIN_PRECISION
        );
        assert_eq!(
            p.with_precision_delta(i64::MAX).precision,
            FractalParams::MAX_PRECISION
        );
    }

    #[test]
    fn deserialize_clamps_values() {
        let p: FractalParams =
            serde_json::from_str(r#"{"max_iterations":0,"precision":1}"#).unwrap();
        assert_eq!(p.max_iterations, 1);
        assert_eq!(p.precision, FractalParams::MIN_PRECISION);
    }

    #[test]
    fn serde_round_trip() {
        let p = FractalParams::new(250, 128).unwrap();
        let json = serde_json::to_string(&p).unwrap();
        let back: FractalParams = serde_json::from_str(&json).unwrap();
        assert_eq!(p, back);
    }
}
