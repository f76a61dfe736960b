use thiserror::Error;

/// Errors originating from the rendering pipeline.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("cannot allocate a {width}×{height} pixel buffer")]
    Allocation { width: u32, height: u32 },

    #[error("gradient must contain at least one colour")]
    EmptyGradient,

    #[error("could not load gradient {path}: {source}")]
    GradientDecode {
        path: String,
        #[source]
        source: image::ImageError,
    },

    #[error("failed to spawn {name} thread: {source}")]
    ThreadSpawn {
        name: String,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Core(#[from] fract_core::CoreError),
}
