use crate::layout::ENV_DIR;
use crate::CoreError;
use irongantry_schema::Manifest;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info};
use zip::write::FileOptions;
use zip::ZipWriter;

const SHIPPED_SUFFIX: &str = "_shipped.zip";
const CACHE_DIR: &str = "__pycache__";
const BYTECODE_SUFFIXES: [&str; 2] = [".pyc", ".pyo"];
const BOOTSTRAP_FILE: &str = "bootstrap.py";

/// Archive name of the bundled tool binary.
fn bundled_tool_name() -> &'static str {
    if cfg!(windows) {
        "irongantry.exe"
    } else {
        "irongantry"
    }
}

/// Generated bootstrap: the recipient unpacks the archive and runs this with
/// a stock python; it builds the environment and runs the app through the
/// bundled tool.
const BOOTSTRAP_SRC: &str = r#""""Bootstrap: build the environment and run the app."""
import os
import stat
import subprocess

os.chdir(os.path.dirname(os.path.abspath(__file__)))
tool = os.path.join(".", "irongantry.exe" if os.name == "nt" else "irongantry")
mode = os.stat(tool).st_mode
os.chmod(tool, mode | stat.S_IXUSR | stat.S_IXGRP | stat.S_IXOTH)
subprocess.run([tool, "build"], check=True)
subprocess.run([tool, "run"], check=True)
"#;

/// Package the project into `<project>_shipped.zip` at the project root.
///
/// The archive holds every regular project file selected by the exclusion
/// policy, the bundled tool binary, and a generated bootstrap script. It is
/// written to a temporary file first and atomically renamed into place, so a
/// failed ship never leaves a half-written archive behind.
pub fn ship(root: &Path, manifest: &Manifest) -> Result<PathBuf, CoreError> {
    let archive_name = format!("{}{SHIPPED_SUFFIX}", manifest.project());
    let archive_path = root.join(&archive_name);

    info!("shipping project '{}' to {archive_name}", manifest.project());

    let mut files = Vec::new();
    collect_files(root, root, &mut files)
        .map_err(|e| CoreError::ArchiveWriteFailed(format!("failed to scan project: {e}")))?;
    files.sort();

    let tool_path = std::env::current_exe()
        .map_err(|e| CoreError::ArchiveWriteFailed(format!("cannot locate own binary: {e}")))?;

    // Collect first, then create the temp file, so the archive never tries
    // to include itself.
    let tmp = NamedTempFile::new_in(root)
        .map_err(|e| CoreError::ArchiveWriteFailed(format!("failed to create temp file: {e}")))?;

    let tmp = write_archive(tmp, root, &files, &tool_path)?;
    tmp.persist(&archive_path)
        .map_err(|e| CoreError::ArchiveWriteFailed(format!("failed to publish archive: {}", e.error)))?;

    info!("shipped {}", archive_path.display());
    Ok(archive_path)
}

fn write_archive(
    tmp: NamedTempFile,
    root: &Path,
    files: &[PathBuf],
    tool_path: &Path,
) -> Result<NamedTempFile, CoreError> {
    let err = |what: &str, e: &dyn std::fmt::Display| {
        CoreError::ArchiveWriteFailed(format!("{what}: {e}"))
    };

    let mut zip = ZipWriter::new(tmp);
    let file_options = FileOptions::default().unix_permissions(0o644);
    let tool_options = FileOptions::default().unix_permissions(0o755);

    for rel in files {
        let arc_name = archive_entry_name(rel);
        debug!("adding {arc_name}");
        zip.start_file(arc_name.as_str(), file_options)
            .map_err(|e| err("failed to add archive entry", &e))?;
        let mut source = fs::File::open(root.join(rel))
            .map_err(|e| err("failed to open project file", &e))?;
        io::copy(&mut source, &mut zip).map_err(|e| err("failed to write archive entry", &e))?;
    }

    // Bundle the running tool so the recipient needs no separate install.
    zip.start_file(bundled_tool_name(), tool_options)
        .map_err(|e| err("failed to add bundled tool", &e))?;
    let mut tool = fs::File::open(tool_path).map_err(|e| err("failed to open own binary", &e))?;
    io::copy(&mut tool, &mut zip).map_err(|e| err("failed to write bundled tool", &e))?;

    zip.start_file(BOOTSTRAP_FILE, file_options)
        .map_err(|e| err("failed to add bootstrap", &e))?;
    zip.write_all(BOOTSTRAP_SRC.as_bytes())
        .map_err(|e| err("failed to write bootstrap", &e))?;

    zip.finish().map_err(|e| err("failed to finalize archive", &e))
}

/// Recursive project walk with the exclusion policy applied while
/// descending: the environment directory, bytecode caches, dot-directories,
/// and previously shipped archives never enter the candidate list.
fn collect_files(base: &Path, current: &Path, out: &mut Vec<PathBuf>) -> io::Result<()> {
    for entry in fs::read_dir(current)? {
        let entry = entry?;
        let path = entry.path();
        let name = entry.file_name();
        let name_str = name.to_string_lossy();
        let file_type = entry.file_type()?;

        if file_type.is_dir() {
            if name_str == ENV_DIR || name_str == CACHE_DIR || name_str.starts_with('.') {
                continue;
            }
            collect_files(base, &path, out)?;
        } else if file_type.is_file() {
            if BYTECODE_SUFFIXES.iter().any(|s| name_str.ends_with(s)) {
                continue;
            }
            if name_str.ends_with(SHIPPED_SUFFIX) {
                continue;
            }
            out.push(path.strip_prefix(base).unwrap_or(&path).to_path_buf());
        }
        // Symlinks and other special files are deliberately left out.
    }
    Ok(())
}

/// Forward-slash archive name for a root-relative path.
fn archive_entry_name(rel: &Path) -> String {
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/")
}
