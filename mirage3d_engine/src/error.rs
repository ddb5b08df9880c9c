//! Error types for the Mirage3D engine
//!
//! This module defines the error types used throughout the engine,
//! including device initialization, resource creation and GPU submission.

use std::fmt;

/// Result type for Mirage3D engine operations
pub type Result<T> = std::result::Result<T, Error>;

/// Mirage3D engine errors
#[derive(Debug, Clone)]
pub enum Error {
    /// Backend-specific error (Vulkan, mock device, etc.)
    BackendError(String),

    /// Out of GPU memory
    OutOfMemory,

    /// Invalid resource (texture, buffer, render target, etc.)
    InvalidResource(String),

    /// Initialization failed (device, queue, subsystems)
    InitializationFailed(String),

    /// A wait on GPU work did not finish in time
    Timeout(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::BackendError(msg) => write!(f, "Backend error: {}", msg),
            Error::OutOfMemory => write!(f, "Out of GPU memory"),
            Error::InvalidResource(msg) => write!(f, "Invalid resource: {}", msg),
            Error::InitializationFailed(msg) => write!(f, "Initialization failed: {}", msg),
            Error::Timeout(msg) => write!(f, "Timed out: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
