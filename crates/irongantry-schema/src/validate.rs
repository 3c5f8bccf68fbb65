use regex::Regex;
use std::sync::OnceLock;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidateError {
    #[error("project name must not be empty")]
    EmptyProjectName,
    #[error("invalid project name '{0}': only letters, digits, underscores, and hyphens are allowed")]
    ProjectName(String),
    #[error("package specifier must not be empty")]
    EmptyPackageSpec,
    #[error("package specifier '{0}' must not begin with '-'")]
    PackageFlag(String),
    #[error("package specifier '{0}' contains shell metacharacters")]
    PackageShellMeta(String),
    #[error("invalid package specifier: '{0}'")]
    PackageSpec(String),
    #[error("entrypoint must not be empty")]
    EmptyEntrypoint,
    #[error("entrypoint has unbalanced quoting: '{0}'")]
    EntrypointQuoting(String),
    #[error("entrypoint must start with 'python' or 'python3', got '{0}'")]
    EntrypointInterpreter(String),
    #[error("invalid python version '{0}': expected 'major.minor' (e.g. '3.12')")]
    PythonVersion(String),
}

static PROJECT_NAME_RE: OnceLock<Regex> = OnceLock::new();
static PACKAGE_SPEC_RE: OnceLock<Regex> = OnceLock::new();
static PYTHON_VERSION_RE: OnceLock<Regex> = OnceLock::new();

fn project_name_re() -> &'static Regex {
    PROJECT_NAME_RE.get_or_init(|| Regex::new(r"^[A-Za-z0-9_-]+$").expect("valid regex"))
}

// PEP 508 naming: name (letter/digit with internal `._-`), optional bracketed
// extras, optional version constraint clause.
fn package_spec_re() -> &'static Regex {
    PACKAGE_SPEC_RE.get_or_init(|| {
        Regex::new(
            r"^([A-Za-z0-9]([A-Za-z0-9._-]*[A-Za-z0-9])?)(\[([A-Za-z0-9._-]+(,[A-Za-z0-9._-]+)*)\])?([!<>=~].+)?$",
        )
        .expect("valid regex")
    })
}

fn python_version_re() -> &'static Regex {
    PYTHON_VERSION_RE.get_or_init(|| Regex::new(r"^\d+\.\d+$").expect("valid regex"))
}

/// Characters that must never reach the installer inside a specifier. The
/// version-clause grammar is permissive, so these are checked separately.
const SHELL_META: [&str; 5] = [";", "|", "&", "`", "$("];

/// Validate a project name: letters, digits, underscores, and hyphens only.
pub fn validate_project_name(name: &str) -> Result<(), ValidateError> {
    if name.is_empty() {
        return Err(ValidateError::EmptyProjectName);
    }
    if !project_name_re().is_match(name) {
        return Err(ValidateError::ProjectName(name.to_owned()));
    }
    Ok(())
}

/// Validate a single package specifier against PEP 508 naming rules.
///
/// Specifiers beginning with `-` are rejected so that a crafted name can
/// never be parsed as an installer flag, and shell metacharacters are
/// rejected outright even though no shell is ever involved downstream.
pub fn validate_package_spec(spec: &str) -> Result<(), ValidateError> {
    let spec = spec.trim();
    if spec.is_empty() {
        return Err(ValidateError::EmptyPackageSpec);
    }
    if spec.starts_with('-') {
        return Err(ValidateError::PackageFlag(spec.to_owned()));
    }
    if SHELL_META.iter().any(|meta| spec.contains(meta)) {
        return Err(ValidateError::PackageShellMeta(spec.to_owned()));
    }
    if !package_spec_re().is_match(spec) {
        return Err(ValidateError::PackageSpec(spec.to_owned()));
    }
    Ok(())
}

/// Split an entrypoint command line with shell-lexical rules.
///
/// The single tokenization point shared by validation and execution, so the
/// command the engine rewrites is exactly the command that was validated.
pub fn entrypoint_tokens(entry: &str) -> Result<Vec<String>, ValidateError> {
    let tokens = shlex::split(entry)
        .ok_or_else(|| ValidateError::EntrypointQuoting(entry.to_owned()))?;
    if tokens.is_empty() {
        return Err(ValidateError::EmptyEntrypoint);
    }
    Ok(tokens)
}

/// Validate an entrypoint: the first token must be exactly `python` or
/// `python3`. Token equality, never a substring match: a filename like
/// `pythonic_app.py` anywhere in the line must not affect the outcome.
pub fn validate_entrypoint(entry: &str) -> Result<(), ValidateError> {
    let tokens = entrypoint_tokens(entry)?;
    match tokens[0].as_str() {
        "python" | "python3" => Ok(()),
        other => Err(ValidateError::EntrypointInterpreter(other.to_owned())),
    }
}

/// Validate a python version string: `major.minor`, nothing else.
pub fn validate_python_version(ver: &str) -> Result<(), ValidateError> {
    let ver = ver.trim();
    if !python_version_re().is_match(ver) {
        return Err(ValidateError::PythonVersion(ver.to_owned()));
    }
    Ok(())
}
