use cityscape_common::ConfigurationError;

/// Startup failure: no usable device or surface. Fatal, never retried.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InitError {
    #[error("no compatible graphics adapter found")]
    NoAdapter,
    #[error("device request failed: {0}")]
    RequestDevice(String),
    #[error("could not create output surface: {0}")]
    CreateSurface(String),
    #[error("output surface is not supported by the adapter")]
    UnsupportedSurface,
}

/// A single frame could not be produced. The frame is skipped.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FrameError {
    #[error("output surface lost or outdated")]
    SurfaceLost,
    #[error("timed out acquiring the next surface texture")]
    Timeout,
    #[error("out of device memory")]
    OutOfMemory,
    #[error("nothing uploaded to draw")]
    NotReady,
    #[error("backend failure: {0}")]
    Backend(String),
}

/// Errors surfaced to the host from fallible renderer commands.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RenderError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
    #[error(transparent)]
    Init(#[from] InitError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configuration_errors_convert() {
        let err: RenderError = ConfigurationError::EmptyGrid { columns: 0, rows: 3 }.into();
        assert!(matches!(err, RenderError::Configuration(_)));
        assert!(err.to_string().contains('0'));
    }

    #[test]
    fn init_errors_convert() {
        let err: RenderError = InitError::NoAdapter.into();
        assert_eq!(err.to_string(), "no compatible graphics adapter found");
    }
}
