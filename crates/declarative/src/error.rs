//! Error types for reconciliation.
//!
//! Codec errors (`MissingRequiredField`, `UnknownEnumValue`) are raised before
//! any remote call is made. Identity errors (`NotFound`, `AmbiguousResult`)
//! come from reads. `RemoteRejected` wraps whatever the API client reported.

use thiserror::Error;

/// Result type for reconciliation operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Boxed cause carried by [`Error::RemoteRejected`].
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Remote operation that produced a [`Error::RemoteRejected`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Create,
    Read,
    Update,
    Delete,
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Create => "create",
            Self::Read => "read",
            Self::Update => "update",
            Self::Delete => "delete",
        };
        f.write_str(s)
    }
}

/// Errors that can occur while encoding, decoding or reconciling a resource.
#[derive(Debug, Error)]
pub enum Error {
    /// A required field was absent (or empty) in the configuration
    #[error("missing required field: {field}")]
    MissingRequiredField {
        /// Configuration field name
        field: String,
    },

    /// A symbolic name or remote code has no entry in its translation table
    #[error("unknown {table} value: {value:?}")]
    UnknownEnumValue {
        /// Name of the translation table (e.g. "value type")
        table: &'static str,
        /// The value that could not be translated
        value: String,
    },

    /// Lookup by identifier matched nothing
    #[error("no {resource_type} found with id {id}")]
    NotFound {
        resource_type: &'static str,
        id: String,
    },

    /// Lookup by identifier matched more than one record
    #[error("{count} {resource_type} records found with id {id}, expected exactly one")]
    AmbiguousResult {
        resource_type: &'static str,
        id: String,
        count: usize,
    },

    /// The remote API refused the request or the transport failed
    #[error("remote {operation} rejected: {source}")]
    RemoteRejected {
        operation: Operation,
        #[source]
        source: BoxError,
    },

    /// One or more configured resources could not be encoded
    #[error("invalid configuration: {}", describe_invalid(.errors))]
    InvalidResources {
        /// Address and codec error of every invalid resource, in address order
        errors: Vec<(String, Error)>,
    },

    /// A create or update was accepted but the follow-up read failed
    #[error("{id} was written but could not be read back: {source}")]
    Unsynchronized {
        /// Identifier the remote system assigned or kept
        id: String,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    pub fn missing(field: impl Into<String>) -> Self {
        Self::MissingRequiredField {
            field: field.into(),
        }
    }

    pub fn unknown_enum(table: &'static str, value: impl Into<String>) -> Self {
        Self::UnknownEnumValue {
            table,
            value: value.into(),
        }
    }

    pub fn rejected(operation: Operation, source: impl Into<BoxError>) -> Self {
        Self::RemoteRejected {
            operation,
            source: source.into(),
        }
    }

    /// Identifier of an object that exists remotely but whose state is unknown
    pub fn orphaned_id(&self) -> Option<&str> {
        match self {
            Self::Unsynchronized { id, .. } => Some(id),
            _ => None,
        }
    }

    /// Whether the error was produced locally, before talking to the API.
    pub fn is_codec_error(&self) -> bool {
        matches!(
            self,
            Self::MissingRequiredField { .. }
                | Self::UnknownEnumValue { .. }
                | Self::InvalidResources { .. }
        )
    }
}

fn describe_invalid(errors: &[(String, Error)]) -> String {
    errors
        .iter()
        .map(|(address, e)| format!("{address}: {e}"))
        .collect::<Vec<_>>()
        .join("; ")
}
