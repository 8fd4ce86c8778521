//! Version lookup in a `package.json`-style manifest.
//!
//! The manifest is a JSON document whose top level is an object. The version
//! is whatever scalar sits at the requested key. It is not validated as
//! semver; it is opaque text that gets spliced into templates.

use std::io::BufReader;
use std::path::{Path, PathBuf};

use crate::error::{Error, IoOp, Result, json_type_name};

/// Manifest key consulted when none is given.
pub const DEFAULT_VERSION_KEY: &str = "version";

/// A parsed manifest document.
#[derive(Debug)]
pub struct Manifest {
    path: PathBuf,
    fields: serde_json::Map<String, serde_json::Value>,
}

impl Manifest {
    /// Reads and parses the manifest at `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = std::fs::File::open(path).map_err(|e| Error::io(IoOp::Open, path, e))?;
        let value: serde_json::Value =
            serde_json::from_reader(BufReader::new(file)).map_err(|source| {
                // serde_json reports read failures through its own error type
                if source.is_io() {
                    Error::io(IoOp::Read, path, source.into())
                } else {
                    Error::Malformed {
                        path: path.to_path_buf(),
                        source,
                    }
                }
            })?;
        Self::from_value(path, value)
    }

    /// Parses a manifest from an in-memory string. `path` is only used for diagnostics.
    pub fn from_json_str(path: impl Into<PathBuf>, json: &str) -> Result<Self> {
        let path = path.into();
        match serde_json::from_str(json) {
            Ok(value) => Self::from_value(&path, value),
            Err(source) => Err(Error::Malformed { path, source }),
        }
    }

    fn from_value(path: &Path, value: serde_json::Value) -> Result<Self> {
        match value {
            serde_json::Value::Object(fields) => Ok(Self {
                path: path.to_path_buf(),
                fields,
            }),
            other => Err(Error::NotAnObject {
                path: path.to_path_buf(),
                found: json_type_name(&other),
            }),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the version stored at `key` in the top-level object.
    pub fn version(&self, key: &str) -> Result<Version> {
        let value = self.fields.get(key).ok_or_else(|| Error::KeyNotFound {
            key: key.to_string(),
            path: self.path.clone(),
        })?;

        let text = match value {
            serde_json::Value::String(s) => s.clone(),
            serde_json::Value::Number(n) => n.to_string(),
            serde_json::Value::Bool(b) => b.to_string(),
            other => {
                return Err(Error::NotAScalar {
                    key: key.to_string(),
                    path: self.path.clone(),
                    found: json_type_name(other),
                });
            }
        };

        Ok(Version(text))
    }
}

/// The resolved version, as the text that replaces each placeholder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Version(String);

impl Version {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// UTF-8 encoding of the version, as written into outputs.
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Loads the manifest at `path` and returns the version at `key`.
pub fn resolve_version(path: impl AsRef<Path>, key: &str) -> Result<Version> {
    let manifest = Manifest::load(path)?;
    let version = manifest.version(key)?;
    tracing::debug!(
        manifest = %manifest.path().display(),
        key,
        %version,
        "resolved version"
    );
    Ok(version)
}
