//! Error handling for BoardKit
//!
//! Provides the error types of the operation engine:
//! - Operation errors (context/table mismatches, bad parameters)
//! - Extended-object errors (hooks declining, registry misuse)
//!
//! Only `OperationError::InvalidContext` and friends ever reach a caller of
//! the dispatch entry points, and always before anything was mutated.
//! Extended-object errors are logged and swallowed by the hook protocol.
//!
//! All error types use `thiserror` for ergonomic error handling.

use thiserror::Error;

/// Operation error type
///
/// Raised while building or validating an operation context, before any
/// object is touched.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OperationError {
    /// The context variant does not belong to the table in use
    #[error("Invalid operation context for table '{table}': expected {expected}, got {actual}")]
    InvalidContext {
        /// The table name.
        table: String,
        /// The operation the table implements.
        expected: String,
        /// The operation the context was built for.
        actual: String,
    },

    /// No operation table with this name
    #[error("Unknown operation table: {name}")]
    UnknownTable {
        /// The requested table name.
        name: String,
    },

    /// A parameter the table needs was not supplied
    #[error("Missing parameter '{param}' for operation '{table}'")]
    MissingParameter {
        /// The table name.
        table: String,
        /// The missing parameter name.
        param: String,
    },

    /// A parameter was supplied but cannot be used
    #[error("Invalid parameter '{param}': {reason}")]
    InvalidParameter {
        /// The parameter name.
        param: String,
        /// Why the value was rejected.
        reason: String,
    },

    /// The addressed object does not exist
    #[error("Object {id} not found")]
    ObjectNotFound {
        /// The object id.
        id: u64,
    },
}

/// Extended-object error type
///
/// Returned by extended-object callbacks and by the registry.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtObjError {
    /// The descriptor refused to handle the request
    #[error("Extended object '{name}' declined: {reason}")]
    Declined {
        /// The descriptor name.
        name: String,
        /// Why the request was declined.
        reason: String,
    },

    /// A descriptor with the same name is already registered
    #[error("Extended object '{name}' is already registered")]
    DuplicateName {
        /// The descriptor name.
        name: String,
    },

    /// The descriptor is not registered
    #[error("Extended object '{name}' is not registered")]
    NotRegistered {
        /// The descriptor name.
        name: String,
    },
}

impl ExtObjError {
    /// Shorthand for a declined request.
    pub fn declined(name: impl Into<String>, reason: impl Into<String>) -> Self {
        ExtObjError::Declined {
            name: name.into(),
            reason: reason.into(),
        }
    }
}

/// Main error type for BoardKit
#[derive(Error, Debug)]
pub enum Error {
    /// Operation error
    #[error(transparent)]
    Operation(#[from] OperationError),

    /// Extended-object error
    #[error(transparent)]
    ExtObj(#[from] ExtObjError),

    /// Standard I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an error from a string message
    pub fn other(msg: impl Into<String>) -> Self {
        Error::Other(msg.into())
    }

    /// Check if this is an invalid-context error
    pub fn is_invalid_context(&self) -> bool {
        matches!(self, Error::Operation(OperationError::InvalidContext { .. }))
    }

    /// Check if this is an operation error
    pub fn is_operation_error(&self) -> bool {
        matches!(self, Error::Operation(_))
    }

    /// Check if this is an extended-object error
    pub fn is_extobj_error(&self) -> bool {
        matches!(self, Error::ExtObj(_))
    }
}

/// Result type using Error
pub type Result<T> = std::result::Result<T, Error>;
