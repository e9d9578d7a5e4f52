//! # Error Module - Custom *tracearray* Error Type
//!
//! Defines the unified error type for construction, sequence import and call dispatch.
//!
//! ## Features
//! - Leaf variants carry the human readable reason (size mismatch, failed conversion, ...).
//! - Context variants (`Construction`, `Dispatch`) chain a boxed source so that the
//!   rendered message names both the operation and the target type, e.g.
//!   `Float.__init__(): Input has the wrong size (expected 3 elements, got 2).`
//! - `Internal` is reserved for backend failures that surface while finalising a
//!   deferred call, where the original call site may already be gone.

use thiserror::Error;

/// Catch all error type for `tracearray`
#[derive(Error, Debug)]
pub enum ArrayError {
    #[error("Constructor does not take keyword arguments.")]
    KeywordArguments,

    #[error("Input has the wrong size (expected {expected} elements, got {found}).")]
    SizeMismatch { expected: usize, found: usize },

    #[error("Broadcast from type '{from}' failed.{note}")]
    BroadcastFailed {
        from: String,
        note: &'static str,
        #[source]
        source: Box<ArrayError>,
    },

    #[error("Item assignment failed: {0}")]
    ItemAssignment(#[source] Box<ArrayError>),

    #[error("Item retrieval failed: {0}")]
    ItemRetrieval(#[source] Box<ArrayError>),

    #[error("Could not initialize array from argument list.")]
    ArgumentList,

    #[error("Could not construct from sequence (invalid type in input).")]
    InvalidSequence,

    #[error("Unable to determine the size of the given sequence.")]
    UnknownLength(#[source] Box<ArrayError>),

    #[error("Could not convert iterable into a sequence.")]
    Materialize(#[source] Box<ArrayError>),

    #[error("entry {index} is out of bounds (the array is of size {size}).")]
    IndexOutOfBounds { index: i64, size: usize },

    #[error("cannot convert {value} to '{target}'.")]
    Conversion { value: String, target: &'static str },

    #[error("{0}")]
    Type(String),

    #[error("{0}")]
    Value(String),

    #[error("incompatible results across call groups: {0}")]
    Incompatible(String),

    #[error("backend error: {0}")]
    Backend(String),

    #[error("{type_name}.__init__(): {source}")]
    Construction {
        type_name: String,
        #[source]
        source: Box<ArrayError>,
    },

    #[error("{op}(): {source}")]
    Dispatch {
        op: &'static str,
        #[source]
        source: Box<ArrayError>,
    },

    #[error("{op}(): internal error: {message}")]
    Internal { op: &'static str, message: String },
}

impl ArrayError {
    /// Shorthand for a [`ArrayError::Type`] error.
    pub fn type_error(message: impl Into<String>) -> Self {
        ArrayError::Type(message.into())
    }

    /// Shorthand for a [`ArrayError::Value`] error.
    pub fn value_error(message: impl Into<String>) -> Self {
        ArrayError::Value(message.into())
    }

    /// Shorthand for a [`ArrayError::Backend`] error.
    pub fn backend(message: impl Into<String>) -> Self {
        ArrayError::Backend(message.into())
    }

    /// Wraps the error as a failure of `<type_name>.__init__()`.
    ///
    /// Errors that already name the same constructor are passed through unchanged.
    pub fn in_constructor(self, type_name: &str) -> Self {
        if let ArrayError::Construction { type_name: t, .. } = &self {
            if t == type_name {
                return self;
            }
        }
        ArrayError::Construction {
            type_name: type_name.to_string(),
            source: Box::new(self),
        }
    }

    /// Wraps the error as a failure of the named operation, e.g. `switch()`.
    pub fn in_operation(self, op: &'static str) -> Self {
        if let ArrayError::Dispatch { op: o, .. } = &self {
            if *o == op {
                return self;
            }
        }
        ArrayError::Dispatch {
            op,
            source: Box::new(self),
        }
    }

    /// Walks `Construction`/`Dispatch` wrappers down to the innermost reason.
    pub fn root(&self) -> &ArrayError {
        match self {
            ArrayError::Construction { source, .. } | ArrayError::Dispatch { source, .. } => {
                source.root()
            }
            other => other,
        }
    }
}
