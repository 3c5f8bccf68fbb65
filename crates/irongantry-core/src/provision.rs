use crate::layout::EnvLayout;
use crate::CoreError;
use std::process::Command;
use tracing::info;

/// Isolated-environment provisioning backend.
///
/// The engine reaches environment creation and package installation only
/// through this seam, and only with inputs that have already passed manifest
/// validation.
pub trait EnvProvisioner {
    fn name(&self) -> &str;

    /// Create a fresh environment at `layout.env_dir()`.
    fn create(&self, layout: &EnvLayout) -> Result<(), CoreError>;

    /// Install the given package specifiers into the environment, in order.
    fn install(&self, layout: &EnvLayout, packages: &[String]) -> Result<(), CoreError>;
}

/// Provisions real virtual environments with the host python interpreter.
pub struct VenvProvisioner;

fn host_python() -> &'static str {
    if cfg!(windows) {
        "python"
    } else {
        "python3"
    }
}

impl EnvProvisioner for VenvProvisioner {
    fn name(&self) -> &'static str {
        "venv"
    }

    fn create(&self, layout: &EnvLayout) -> Result<(), CoreError> {
        let env_dir = layout.env_dir();
        info!("creating virtual environment at {}", env_dir.display());
        // --copies: hard-copy the interpreter so the environment survives
        // being shipped to another machine.
        let status = Command::new(host_python())
            .args(["-m", "venv", "--copies"])
            .arg(&env_dir)
            .status()
            .map_err(|e| {
                CoreError::BuildFailed(format!("failed to spawn {}: {e}", host_python()))
            })?;
        if !status.success() {
            return Err(CoreError::BuildFailed(format!(
                "environment creation exited with {status}"
            )));
        }
        Ok(())
    }

    fn install(&self, layout: &EnvLayout, packages: &[String]) -> Result<(), CoreError> {
        if packages.is_empty() {
            return Ok(());
        }
        let pip = layout.pip_path();
        info!("installing {} package(s)", packages.len());
        // `--` terminates option parsing, so a specifier can never be read as
        // an installer flag; the list is a literal argument array and no
        // shell is involved.
        let status = Command::new(&pip)
            .args(["install", "--"])
            .args(packages)
            .status()
            .map_err(|e| CoreError::BuildFailed(format!("failed to spawn {}: {e}", pip.display())))?;
        if !status.success() {
            return Err(CoreError::BuildFailed(format!(
                "package installation exited with {status}"
            )));
        }
        Ok(())
    }
}

/// Test provisioner: materializes the environment layout without spawning
/// python. On unix the fake interpreter is an executable shell stub that
/// records `VIRTUAL_ENV` next to the environment, so engine tests can
/// exercise the full run path.
pub struct MockProvisioner;

impl EnvProvisioner for MockProvisioner {
    fn name(&self) -> &'static str {
        "mock"
    }

    fn create(&self, layout: &EnvLayout) -> Result<(), CoreError> {
        std::fs::create_dir_all(layout.bin_dir())?;
        std::fs::write(
            layout.python_path(),
            "#!/bin/sh\necho \"$VIRTUAL_ENV\" > \"${0%/*}/../recorded-virtual-env\"\nexit 0\n",
        )?;
        std::fs::write(layout.pip_path(), "#!/bin/sh\nexit 0\n")?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            for bin in [layout.python_path(), layout.pip_path()] {
                std::fs::set_permissions(&bin, std::fs::Permissions::from_mode(0o755))?;
            }
        }
        Ok(())
    }

    fn install(&self, layout: &EnvLayout, packages: &[String]) -> Result<(), CoreError> {
        for (idx, spec) in packages.iter().enumerate() {
            std::fs::write(layout.env_dir().join(format!(".pkg-{idx}")), spec)?;
        }
        Ok(())
    }
}
