use thiserror::Error;

/// Errors originating from the core fractal engine.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid max iterations: {0} (must be >= 1)")]
    InvalidMaxIterations(u32),

    #[error("invalid precision: {0} bits (must be within {min}..={max})", min = crate::FractalParams::MIN_PRECISION, max = crate::FractalParams::MAX_PRECISION)]
    InvalidPrecision(u32),

    #[error("invalid scale: {0} (must be positive and finite)")]
    InvalidScale(String),

    #[error("invalid zoom factor: {0} (must be positive and finite)")]
    InvalidZoomFactor(f64),

    #[error("could not parse {field} as a number: {source}")]
    Parse {
        field: &'static str,
        #[source]
        source: rug::float::ParseFloatError,
    },
}
