use crate::validate::{self, ValidateError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Manifest file name expected at the project root.
pub const MANIFEST_FILE: &str = "IronGantryfile";

/// Entrypoint written by `init`.
const DEFAULT_ENTRYPOINT: &str = "python main.py";

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("failed to read manifest file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse manifest: {0}")]
    ParseToml(#[from] toml::de::Error),
    #[error("failed to serialize manifest: {0}")]
    SerializeToml(#[from] toml::ser::Error),
    #[error(transparent)]
    Validate(#[from] ValidateError),
}

/// Raw key/value shape of an IronGantryfile. The schema is closed: any key
/// outside {project, python, packages, entrypoint} is a parse failure, not a
/// silently tolerated typo.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
struct RawManifest {
    project: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    python: Option<String>,
    #[serde(default)]
    packages: Vec<String>,
    entrypoint: String,
}

/// A fully validated project manifest.
///
/// Construction is only possible through [`Manifest::parse_str`] or
/// [`Manifest::load`], both of which run the full validation pass first;
/// any `Manifest` value in memory has already passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Manifest {
    project: String,
    python: Option<String>,
    packages: Vec<String>,
    entrypoint: String,
}

impl Manifest {
    /// Parse and validate a manifest from TOML text.
    ///
    /// Returns the first failure encountered; a bad manifest is never
    /// partially applied.
    pub fn parse_str(input: &str) -> Result<Self, ManifestError> {
        let raw: RawManifest = toml::from_str(input)?;

        validate::validate_project_name(&raw.project)?;
        validate::validate_entrypoint(&raw.entrypoint)?;
        if let Some(ver) = &raw.python {
            validate::validate_python_version(ver)?;
        }
        for spec in &raw.packages {
            validate::validate_package_spec(spec)?;
        }

        Ok(Self {
            project: raw.project,
            python: raw.python.map(|v| v.trim().to_owned()),
            // Order preserved, duplicates forwarded as-is; only surrounding
            // whitespace is normalized away.
            packages: raw.packages.iter().map(|s| s.trim().to_owned()).collect(),
            entrypoint: raw.entrypoint.trim().to_owned(),
        })
    }

    /// Read and validate a manifest file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ManifestError> {
        let content = fs::read_to_string(path)?;
        Self::parse_str(&content)
    }

    #[inline]
    pub fn project(&self) -> &str {
        &self.project
    }

    /// Informational python version pin, if any. Never affects control flow.
    #[inline]
    pub fn python(&self) -> Option<&str> {
        self.python.as_deref()
    }

    #[inline]
    pub fn packages(&self) -> &[String] {
        &self.packages
    }

    #[inline]
    pub fn entrypoint(&self) -> &str {
        &self.entrypoint
    }
}

/// Render the manifest written by `init` for a new project.
pub fn init_manifest(project: &str) -> Result<String, ManifestError> {
    validate::validate_project_name(project)?;
    let raw = RawManifest {
        project: project.to_owned(),
        python: None,
        packages: Vec::new(),
        entrypoint: DEFAULT_ENTRYPOINT.to_owned(),
    };
    Ok(toml::to_string_pretty(&raw)?)
}
