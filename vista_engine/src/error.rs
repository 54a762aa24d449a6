//! Error types for the Vista engine
//!
//! Errors come from the graphics device while the renderer creates or
//! recreates GPU resources, and from building a renderer out of an unusable
//! configuration. Table and list exhaustion inside a frame is not an error:
//! it is reported as a warning and the submission returns `None`.

use std::fmt;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// The graphics device rejected a call
    Device(String),

    /// Device memory (or a fixed bone table) is exhausted
    OutOfMemory,

    /// A buffer, texture or bone id that does not exist
    InvalidResource(String),

    /// `Renderer::new` was given a configuration it cannot start from
    InitializationFailed(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Device(msg) => write!(f, "Device error: {}", msg),
            Error::OutOfMemory => f.write_str("Out of memory"),
            Error::InvalidResource(msg) => write!(f, "Invalid resource: {}", msg),
            Error::InitializationFailed(msg) => write!(f, "Renderer initialization failed: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
