use thiserror::Error;

/// Errors surfaced by the core and by host/surface implementations.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum Error {
    /// No drawing surface could be found (e.g. missing canvas element).
    #[error("drawing surface not found: {0}")]
    SurfaceMissing(String),
    /// The surface exists but cannot provide a 2D drawing context.
    #[error("drawing surface is not supported: {0}")]
    ContextUnsupported(String),
    /// A configuration value is out of range.
    #[error("invalid configuration: {field} = {value}")]
    InvalidConfig { field: &'static str, value: f64 },
    /// The host environment refused an operation (subscribe, schedule, ...).
    #[error("host error: {0}")]
    Host(String),
    /// A drawing call failed.
    #[error("draw failed: {0}")]
    Draw(String),
}

pub type Result<T> = std::result::Result<T, Error>;
