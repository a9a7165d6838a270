//! Error types for the Galaxy3D buffer layer
//!
//! This module defines the error types returned by the device collaborator,
//! the backing arena and the buffer views.
//!
//! Precondition violations (mapping twice, referencing an empty view,
//! sub-range overruns...) are programmer errors and panic instead of
//! producing one of these values.

use std::fmt;

/// Result type for Galaxy3D buffer operations
pub type Result<T> = std::result::Result<T, Error>;

/// Galaxy3D buffer errors
#[derive(Debug, Clone)]
pub enum Error {
    /// Backend-specific error (Vulkan, mock device, etc.)
    BackendError(String),

    /// The device refused to create or map a backing allocation
    ResourceExhausted(String),

    /// Invalid resource (stale backing, destroyed allocation, etc.)
    InvalidResource(String),

    /// Initialization failed (engine, device, subsystems)
    InitializationFailed(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::BackendError(msg) => write!(f, "Backend error: {}", msg),
            Error::ResourceExhausted(msg) => write!(f, "Resource exhausted: {}", msg),
            Error::InvalidResource(msg) => write!(f, "Invalid resource: {}", msg),
            Error::InitializationFailed(msg) => write!(f, "Initialization failed: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

// ===== ERROR MACROS =====

/// Log an error and build an `Error::BackendError` from it
///
/// # Example
///
/// ```ignore
/// let err = engine_err!("galaxy3d::BufferArena", "Backing {:?} not found", key);
/// ```
#[macro_export]
macro_rules! engine_err {
    ($source:expr, $($arg:tt)*) => {{
        let message = format!($($arg)*);
        $crate::galaxy3d::Engine::log_detailed(
            $crate::galaxy3d::log::LogSeverity::Error,
            $source,
            message.clone(),
            file!(),
            line!()
        );
        $crate::galaxy3d::Error::BackendError(message)
    }};
}

/// Log an error and return early with an `Error::BackendError`
///
/// # Example
///
/// ```ignore
/// engine_bail!("galaxy3d::mock", "Buffer {} was destroyed", id);
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
