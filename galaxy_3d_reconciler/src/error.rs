//! Error types for the Galaxy3D reconciler
//!
//! This module defines the error types used throughout the reconciler,
//! including instance creation, prop application, and root management.

use std::fmt;

/// Result type for reconciler operations
pub type Result<T> = std::result::Result<T, Error>;

/// Galaxy3D reconciler errors
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// Tag does not resolve to a registered native type
    UnknownType(String),

    /// `primitive` tag used without a valid backing object
    InvalidPrimitive(String),

    /// A bare text node was handed to a tree that only accepts structured nodes
    TextNode(String),

    /// A prop value could not be applied to its target field
    InvalidProp {
        /// Declared prop key (possibly a dash-separated path)
        key: String,
        /// Human readable reason
        reason: String,
    },

    /// Constructor arguments were rejected by a native type
    InvalidArgs {
        /// Canonical type name
        type_name: String,
        /// Human readable reason
        reason: String,
    },

    /// Instance key no longer refers to a live instance
    StaleInstance,

    /// Object key no longer refers to a live native object
    StaleObject,

    /// Root key no longer refers to a mounted root
    UnknownRoot,

    /// Operation is not valid in the current state
    InvalidOperation(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::UnknownType(tag) => write!(
                f,
                "Unknown type: '{}' is not part of the registry. Did you forget to register it?",
                tag
            ),
            Error::InvalidPrimitive(msg) => write!(f, "Invalid primitive: {}", msg),
            Error::TextNode(text) => write!(
                f,
                "Text nodes are not supported: '{}' must be wrapped in a structured node",
                text
            ),
            Error::InvalidProp { key, reason } => write!(f, "Invalid prop '{}': {}", key, reason),
            Error::InvalidArgs { type_name, reason } => {
                write!(f, "Invalid args for {}: {}", type_name, reason)
            }
            Error::StaleInstance => write!(f, "Stale instance key"),
            Error::StaleObject => write!(f, "Stale object key"),
            Error::UnknownRoot => write!(f, "Unknown root"),
            Error::InvalidOperation(msg) => write!(f, "Invalid operation: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

/// Log an error at ERROR severity before handing it back to the caller
///
/// Fail-fast paths use this so that every surfaced error also leaves a trace
/// in the active logger.
pub(crate) fn log_and_return_error(source: &str, error: Error) -> Error {
    crate::engine_error!(source, "{}", error);
    error
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
