//! Error types for the Galaxy3D render surfaces
//!
//! This module defines the error types used throughout the surface system,
//! including GPU binding failures, resource exhaustion and configuration errors.

use std::fmt;

/// Result type for surface operations
pub type Result<T> = std::result::Result<T, Error>;

/// Galaxy3D surface errors
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// Backend-specific error reported by the graphics device
    BackendError(String),

    /// Out of GPU memory
    OutOfMemory,

    /// Invalid resource (renderbuffer, texture, framebuffer, etc.)
    InvalidResource(String),

    /// Initialization failed (surface manager, environment map, etc.)
    InitializationFailed(String),

    /// A configuration value is outside of its legal domain
    InvalidConfiguration(String),

    /// The device cannot perform the operation on this resource
    /// (e.g. reading back pixels from a system framebuffer)
    Unsupported(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::BackendError(msg) => write!(f, "Backend error: {}", msg),
            Error::OutOfMemory => write!(f, "Out of GPU memory"),
            Error::InvalidResource(msg) => write!(f, "Invalid resource: {}", msg),
            Error::InitializationFailed(msg) => write!(f, "Initialization failed: {}", msg),
            Error::InvalidConfiguration(msg) => write!(f, "Invalid configuration: {}", msg),
            Error::Unsupported(msg) => write!(f, "Unsupported operation: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

// ===== ERROR MACROS =====

/// Log an ERROR message and build an `Error::BackendError` from it
///
/// # Example
///
/// ```ignore
/// let id = lookup(name).ok_or_else(|| engine_err!("galaxy3d::Framebuffer", "No id for {}", name))?;
/// ```
#[macro_export]
macro_rules! engine_err {
    ($source:expr, $($arg:tt)*) => {{
        let message = format!($($arg)*);
        $crate::engine_error!($source, "{}", message);
        $crate::galaxy3d::Error::BackendError(message)
    }};
}

/// Log an ERROR message and return early with an `Error::BackendError`
///
/// # Example
///
/// ```ignore
/// if samples == 0 {
///     engine_bail!("galaxy3d::Renderbuffer", "Sample count must be at least 1");
/// }
/// ```
#[macro_export]
macro_rules! engine_bail {
    ($source:expr, $($arg:tt)*) => {
        return Err($crate::engine_err!($source, $($arg)*))
    };
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
