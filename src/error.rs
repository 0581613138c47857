//! Error types for the geodesy object model.

use thiserror::Error;

/// Errors surfaced to callers of the object model.
///
/// Raw engine error codes never cross this boundary; every failure is mapped
/// to one of these variants. `DisposedAccess`, `ContextDropped`,
/// `InvalidArgument`, `IndexOutOfRange` and `InvariantViolation` indicate
/// caller or logic bugs and are not meant to be recovered from.
/// `NoUsableOperation` and `RemoteResource` are recoverable-by-caller
/// conditions (for example by retrying with different ranking options).
#[derive(Debug, Error)]
pub enum GeorefError {
    #[error("{kind} used after dispose")]
    DisposedAccess { kind: &'static str },

    #[error("context was dropped while dependent objects were still live")]
    ContextDropped,

    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),

    #[error("index {index} out of range for collection of {count}")]
    IndexOutOfRange { index: usize, count: usize },

    #[error("no usable transform found (last candidate {last_selected:?}, {excluded} excluded)")]
    NoUsableOperation {
        last_selected: Option<usize>,
        excluded: usize,
    },

    #[error("remote resource failure: {0}")]
    RemoteResource(String),

    #[error("invariant violation: {0}")]
    InvariantViolation(&'static str),

    #[error("engine error: {0}")]
    Engine(String),

    #[error("configuration error: {0}")]
    Config(String),
}

impl From<config::ConfigError> for GeorefError {
    fn from(err: config::ConfigError) -> Self {
        GeorefError::Config(err.to_string())
    }
}
