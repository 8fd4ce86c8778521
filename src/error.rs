//! Error types for version resolution and template expansion.

use std::path::PathBuf;

/// Result alias used throughout the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Coarse classification of a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The requested key is absent from the manifest.
    NotFound,
    /// The manifest could not be interpreted.
    MalformedInput,
    /// A file could not be opened, read, or written.
    Io,
}

/// File operation that failed, carried by [`Error::Io`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IoOp {
    Open,
    Create,
    Read,
    Write,
    Flush,
}

impl std::fmt::Display for IoOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Open => "open",
            Self::Create => "create",
            Self::Read => "read",
            Self::Write => "write",
            Self::Flush => "flush",
        })
    }
}

/// All errors produced by the library.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The lookup key does not exist in the manifest's top-level object.
    #[error("key '{key}' not found in {}", path.display())]
    KeyNotFound { key: String, path: PathBuf },

    /// The manifest is not valid JSON.
    #[error("failed to parse {}", path.display())]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The manifest parsed, but its top level is not an object.
    #[error("{} must contain a JSON object at the top level, found {found}", path.display())]
    NotAnObject { path: PathBuf, found: &'static str },

    /// The value at the lookup key has no text form (null, array, object).
    #[error("value of '{key}' in {} is {found}, expected a string, number or boolean", path.display())]
    NotAScalar {
        key: String,
        path: PathBuf,
        found: &'static str,
    },

    #[error("failed to {op} {}", path.display())]
    Io {
        op: IoOp,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::KeyNotFound { .. } => ErrorKind::NotFound,
            Self::Malformed { .. } | Self::NotAnObject { .. } | Self::NotAScalar { .. } => {
                ErrorKind::MalformedInput
            }
            Self::Io { .. } => ErrorKind::Io,
        }
    }

    pub(crate) fn io(op: IoOp, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            op,
            path: path.into(),
            source,
        }
    }
}

/// Human-readable name of a JSON value's type, for diagnostics.
pub(crate) fn json_type_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}
