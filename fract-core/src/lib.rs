pub mod complex;
pub mod error;
pub mod fractal;
pub mod mandelbrot;
pub mod viewport;

// Re-export primary types for convenience.
pub use complex::BigComplex;
pub use error::CoreError;
pub use fractal::FractalParams;
pub use mandelbrot::{evaluate, Mandelbrot};
pub use viewport::{Viewport, ViewportStatus};

/// Convenience result type for the core crate.
pub type Result<T> = std::result::Result<T, CoreError>;
