//! Execution engine for IronGantry project lifecycle.
//!
//! This crate ties together manifest validation, environment layout
//! resolution, and provisioning backends into the `Engine`: the API for
//! initializing, building, running, and shipping a project. Path logic lives
//! in [`layout`], process-spawning provisioning behind the [`provision`]
//! seam, and portable-archive assembly in [`ship`].

pub mod engine;
pub mod layout;
pub mod provision;
pub mod ship;

pub use engine::Engine;
pub use layout::{EnvLayout, Platform, ENV_DIR};
pub use provision::{EnvProvisioner, MockProvisioner, VenvProvisioner};

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("manifest error: {0}")]
    Manifest(#[from] irongantry_schema::ManifestError),
    #[error("manifest not found: {} (run 'irongantry init' first)", .0.display())]
    ManifestMissing(PathBuf),
    #[error("{} already exists (remove it first to reinitialize)", .0.display())]
    AlreadyExists(PathBuf),
    #[error("environment not found at {} (run 'irongantry build' first)", .0.display())]
    EnvironmentMissing(PathBuf),
    #[error("build failed: {0}")]
    BuildFailed(String),
    #[error("failed to execute entrypoint: {0}")]
    ExecFailed(String),
    #[error("archive write failed: {0}")]
    ArchiveWriteFailed(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
