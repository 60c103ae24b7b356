// src/exec/launch.rs

//! Executable resolution and process spawning.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio::process::{Child, Command};
use tracing::{debug, info};

use crate::errors::LaunchError;
use crate::exec::ProcessSpec;

/// Resolve a [`ProcessSpec`] executable to a runnable file.
///
/// A bare name (`"msconvert"`) is looked up on `PATH`; anything with a path
/// separator must point at an existing file.
pub fn resolve_executable(executable: &Path) -> Result<PathBuf, LaunchError> {
    let is_bare_name = executable.components().count() == 1 && !executable.is_absolute();

    if !is_bare_name {
        if !executable.exists() {
            return Err(LaunchError::ExecutableNotFound(executable.to_path_buf()));
        }
        if !is_runnable(executable) {
            return Err(LaunchError::NotExecutable(executable.to_path_buf()));
        }
        return Ok(executable.to_path_buf());
    }

    let path_var = std::env::var_os("PATH").unwrap_or_default();
    for dir in std::env::split_paths(&path_var) {
        for candidate in candidates(&dir, executable) {
            if is_runnable(&candidate) {
                debug!(executable = ?executable, resolved = ?candidate, "resolved executable on PATH");
                return Ok(candidate);
            }
        }
    }

    Err(LaunchError::ExecutableNotFound(executable.to_path_buf()))
}

fn candidates(dir: &Path, name: &Path) -> Vec<PathBuf> {
    let plain = dir.join(name);
    if cfg!(windows) && name.extension().is_none() {
        vec![plain.with_extension("exe"), plain.with_extension("bat"), plain]
    } else {
        vec![plain]
    }
}

#[cfg(unix)]
fn is_runnable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;

    std::fs::metadata(path)
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_runnable(path: &Path) -> bool {
    path.is_file()
}

/// Check everything about `spec` that can fail before anything is created
/// on disk. Returns the resolved executable.
pub fn preflight(spec: &ProcessSpec) -> Result<PathBuf, LaunchError> {
    let exe = resolve_executable(spec.executable())?;

    if let Some(dir) = spec.working_directory() {
        if !dir.is_dir() {
            return Err(LaunchError::WorkingDirMissing(dir.to_path_buf()));
        }
    }

    Ok(exe)
}

/// Spawn `exe` (from [`preflight`]) with the arguments and environment of
/// `spec`.
///
/// stdout/stderr are piped for the console capture, stdin is closed, and on
/// Unix the child leads its own process group so that termination can reach
/// any helpers it starts.
pub fn spawn(spec: &ProcessSpec, exe: &Path) -> Result<Child, LaunchError> {
    let mut cmd = Command::new(exe);
    cmd.args(spec.arg_list())
        .envs(spec.env_overrides())
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    if let Some(dir) = spec.working_directory() {
        cmd.current_dir(dir);
    }

    #[cfg(unix)]
    cmd.process_group(0);

    let child = cmd.spawn().map_err(|source| LaunchError::Spawn {
        path: exe.to_path_buf(),
        source,
    })?;

    info!(
        pid = child.id(),
        cmd = %spec.command_line(),
        "started external process"
    );

    Ok(child)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_path_is_not_found() {
        let err = resolve_executable(Path::new("/definitely/not/here/DeconConsole")).unwrap_err();
        assert!(matches!(err, LaunchError::ExecutableNotFound(_)));
    }

    #[test]
    fn unknown_bare_name_is_not_found() {
        let err = resolve_executable(Path::new("no-such-tool-0d7c1b")).unwrap_err();
        assert!(matches!(err, LaunchError::ExecutableNotFound(_)));
    }

    #[cfg(unix)]
    #[test]
    fn bare_name_resolves_on_path() {
        let resolved = resolve_executable(Path::new("sh")).unwrap();
        assert!(resolved.ends_with("sh"));
    }

    #[test]
    fn preflight_rejects_missing_working_dir() {
        let spec = ProcessSpec::new("sh").working_dir("/definitely/not/here/work");
        let err = preflight(&spec).unwrap_err();
        assert!(matches!(err, LaunchError::WorkingDirMissing(_)));
    }

    #[cfg(unix)]
    #[test]
    fn non_executable_file_is_rejected() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let err = resolve_executable(file.path()).unwrap_err();
        assert!(matches!(err, LaunchError::NotExecutable(_)));
    }
}
