//! Version propagation across the configured template files.
//!
//! [`Generator`] resolves the version once and then expands each configured
//! output in order. It stops at the first failure; outputs generated before
//! the failure are left in place.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::manifest::{self, DEFAULT_VERSION_KEY, Version};
use crate::template::{self, Expansion, PLACEHOLDER, TEMPLATE_INFIX};

/// Outputs generated when no other list is configured.
pub const DEFAULT_FILES: &[&str] = &["sonar-project.properties"];

/// Manifest read when no other path is configured.
pub const DEFAULT_MANIFEST: &str = "package.json";

/// Configuration for a generation run.
#[derive(Debug, Clone)]
pub struct Config {
    /// Manifest holding the version, relative to the working directory.
    pub manifest_path: PathBuf,

    /// Top-level manifest key to read the version from.
    pub version_key: String,

    /// Output files, in processing order. Templates are derived from these.
    pub files: Vec<String>,

    pub placeholder: String,

    pub infix: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            manifest_path: PathBuf::from(DEFAULT_MANIFEST),
            version_key: DEFAULT_VERSION_KEY.to_string(),
            files: DEFAULT_FILES.iter().map(|f| (*f).to_string()).collect(),
            placeholder: PLACEHOLDER.to_string(),
            infix: TEMPLATE_INFIX.to_string(),
        }
    }
}

impl Config {
    /// Returns `(template, output)` pairs in processing order.
    pub fn file_pairs(&self) -> Vec<(String, String)> {
        self.files
            .iter()
            .map(|out| (template::template_path(out, &self.infix), out.clone()))
            .collect()
    }

    /// Renders the file pairs as `(TEMPLATE -> OUTPUT), ...`.
    pub fn describe_file_pairs(&self) -> String {
        let mut s = String::new();
        for (i, (template, output)) in self.file_pairs().iter().enumerate() {
            if i > 0 {
                s.push_str(", ");
            }
            let _ = write!(s, "({template} -> {output})");
        }
        s
    }
}

/// Runs version resolution and template expansion for a [`Config`].
pub struct Generator {
    config: Config,
}

impl Generator {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Reads the version from the configured manifest.
    pub fn resolve(&self) -> Result<Version> {
        manifest::resolve_version(&self.config.manifest_path, &self.config.version_key)
    }

    /// Expands every configured template with `version`, in order.
    pub fn expand_all(&self, version: &Version) -> Result<Vec<Expansion>> {
        let token = self.config.placeholder.as_bytes();
        let mut results = Vec::with_capacity(self.config.files.len());

        for (template, output) in self.config.file_pairs() {
            tracing::debug!(%template, %output, "expanding");
            let expansion = template::expand_file(
                Path::new(&template),
                Path::new(&output),
                token,
                version,
            )?;

            if expansion.replacements == 0 {
                tracing::warn!(
                    %template,
                    placeholder = %self.config.placeholder,
                    "template contains no placeholder, copied verbatim"
                );
            }
            tracing::info!(
                %output,
                replacements = expansion.replacements,
                sha256 = %expansion.sha256,
                "wrote"
            );
            results.push(expansion);
        }

        Ok(results)
    }

    /// Resolves the version and expands every configured template.
    pub fn run(&self) -> Result<Vec<Expansion>> {
        let version = self.resolve()?;
        tracing::info!(
            %version,
            key = %self.config.version_key,
            manifest = %self.config.manifest_path.display(),
            "resolved version"
        );
        self.expand_all(&version)
    }
}
