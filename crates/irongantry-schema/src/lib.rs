//! Manifest parsing and input validation for IronGantry.
//!
//! This crate is the sole gate between untrusted manifest input and the rest
//! of the system: TOML manifest parsing (`Manifest`), stateless field
//! validators (`validate`), and shell-lexical entrypoint tokenization.
//! A [`Manifest`] value can only be obtained through parsing, which runs the
//! full validation pass first; there is no unvalidated manifest type.

pub mod manifest;
pub mod validate;

pub use manifest::{init_manifest, Manifest, ManifestError, MANIFEST_FILE};
pub use validate::{
    entrypoint_tokens, validate_entrypoint, validate_package_spec, validate_project_name,
    validate_python_version, ValidateError,
};
