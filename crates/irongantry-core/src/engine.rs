use crate::layout::{EnvLayout, Platform};
use crate::provision::{EnvProvisioner, VenvProvisioner};
use crate::ship;
use crate::CoreError;
use irongantry_schema::{entrypoint_tokens, init_manifest, Manifest, ManifestError, MANIFEST_FILE};
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, info};

/// Central orchestration engine for one IronGantry invocation.
///
/// Constructed locally inside each command handler and dropped when the
/// command completes; no engine state outlives an invocation.
pub struct Engine {
    root: PathBuf,
    provisioner: Box<dyn EnvProvisioner>,
}

impl Engine {
    /// Engine rooted at the given project directory, provisioning real
    /// virtual environments.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::with_provisioner(root, Box::new(VenvProvisioner))
    }

    /// Engine with a custom provisioning backend (used by tests).
    pub fn with_provisioner(root: impl Into<PathBuf>, provisioner: Box<dyn EnvProvisioner>) -> Self {
        Self {
            root: root.into(),
            provisioner,
        }
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.root.join(MANIFEST_FILE)
    }

    fn load_manifest(&self) -> Result<Manifest, CoreError> {
        let path = self.manifest_path();
        if !path.is_file() {
            return Err(CoreError::ManifestMissing(path));
        }
        Ok(Manifest::load(&path)?)
    }

    /// Layout rooted at the absolute project path, so the interpreter path
    /// substituted into the entrypoint is absolute regardless of how the
    /// engine was invoked.
    fn layout(&self) -> Result<EnvLayout, CoreError> {
        let root = self.root.canonicalize()?;
        Ok(EnvLayout::resolve(root, Platform::host()))
    }

    /// Write a fresh manifest for a new project. Never overwrites.
    pub fn init(&self, name: &str) -> Result<PathBuf, CoreError> {
        let path = self.manifest_path();
        if path.exists() {
            return Err(CoreError::AlreadyExists(path));
        }
        let content = init_manifest(name)?;
        write_atomic(&path, &content)?;
        info!("created {} for project '{name}'", path.display());
        Ok(path)
    }

    /// Create the isolated environment and install the manifest's packages.
    ///
    /// Always from scratch: a pre-existing environment directory is deleted
    /// first, never patched incrementally. A failed build leaves the partial
    /// directory in place for inspection; the next build replaces it.
    pub fn build(&self) -> Result<(), CoreError> {
        let manifest = self.load_manifest()?;
        let layout = self.layout()?;

        let env_dir = layout.env_dir();
        if env_dir.is_dir() {
            debug!("removing previous environment at {}", env_dir.display());
            std::fs::remove_dir_all(&env_dir)?;
        }

        self.provisioner.create(&layout)?;
        self.provisioner.install(&layout, manifest.packages())?;

        info!("build complete for project '{}'", manifest.project());
        Ok(())
    }

    /// Execute the manifest entrypoint inside the environment, blocking
    /// until it exits. Returns the child's exit code for the caller to
    /// propagate. Never builds implicitly.
    pub fn run(&self) -> Result<i32, CoreError> {
        let manifest = self.load_manifest()?;
        let layout = self.layout()?;

        let python = layout.python_path();
        if !python.is_file() {
            return Err(CoreError::EnvironmentMissing(layout.env_dir()));
        }

        let tokens = resolve_command(manifest.entrypoint(), &python)?;
        let env_dir = layout.env_dir();
        let bin_dir = layout.bin_dir();

        // Child environment: everything inherited, plus VIRTUAL_ENV and the
        // environment bin directory at the front of PATH.
        let path_var = match std::env::var("PATH") {
            Ok(existing) => format!(
                "{}{}{existing}",
                bin_dir.display(),
                layout.platform().path_separator()
            ),
            Err(_) => bin_dir.display().to_string(),
        };

        info!("running entrypoint: {tokens:?}");
        let status = Command::new(&tokens[0])
            .args(&tokens[1..])
            .current_dir(layout.root())
            .env("VIRTUAL_ENV", &env_dir)
            .env("PATH", path_var)
            .status()
            .map_err(|e| CoreError::ExecFailed(format!("failed to spawn {}: {e}", tokens[0])))?;

        match status.code() {
            Some(code) => Ok(code),
            None => {
                #[cfg(unix)]
                {
                    use std::os::unix::process::ExitStatusExt;
                    if let Some(sig) = status.signal() {
                        return Err(CoreError::ExecFailed(format!(
                            "entrypoint killed by signal {sig}"
                        )));
                    }
                }
                Err(CoreError::ExecFailed(
                    "entrypoint failed with unknown status".to_owned(),
                ))
            }
        }
    }

    /// Package the project into a portable `<project>_shipped.zip`.
    pub fn ship(&self) -> Result<PathBuf, CoreError> {
        let manifest = self.load_manifest()?;
        let layout = self.layout()?;
        ship::ship(layout.root(), &manifest)
    }
}

/// Rewrite a validated entrypoint for execution: shell-lexical tokens with
/// exactly `tokens[0]` replaced by the absolute interpreter path. Positional
/// replacement only; the raw string is never search-and-replaced.
fn resolve_command(entrypoint: &str, python: &Path) -> Result<Vec<String>, CoreError> {
    let mut tokens = entrypoint_tokens(entrypoint).map_err(ManifestError::from)?;
    tokens[0] = python.to_string_lossy().into_owned();
    Ok(tokens)
}

fn write_atomic(dest: &Path, content: &str) -> Result<(), CoreError> {
    let dir = dest
        .parent()
        .map_or_else(|| PathBuf::from("."), Path::to_path_buf);
    let mut tmp = tempfile::NamedTempFile::new_in(&dir)?;
    use std::io::Write;
    tmp.write_all(content.as_bytes())?;
    tmp.as_file().sync_all()?;
    tmp.persist_noclobber(dest).map_err(|e| {
        if e.error.kind() == std::io::ErrorKind::AlreadyExists {
            CoreError::AlreadyExists(dest.to_path_buf())
        } else {
            CoreError::Io(e.error)
        }
    })?;
    Ok(())
}
