//! set-version: propagate a manifest's version into generated build files.
//!
//! The version is read from `package.json` and substituted for the
//! `%__version__%` placeholder in each configured template, producing files
//! that cannot reference the version themselves.

pub mod error;
pub mod generate;
pub mod manifest;
pub mod template;

pub use error::{Error, ErrorKind, Result};
