//! External commands used around a backup: tool lookup, disk usage, unmount

use std::env;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::{Error, Result};

/// Find an executable on PATH
pub fn find_command(name: &str) -> Option<PathBuf> {
    let path = env::var_os("PATH")?;
    env::split_paths(&path)
        .map(|dir| dir.join(name))
        .find(|candidate| candidate.is_file())
}

/// Fail early if a tool the backup depends on is not installed
pub fn require_command(name: &str) -> Result<PathBuf> {
    find_command(name).ok_or_else(|| Error::CommandMissing(name.to_string()))
}

/// Run a command to completion and turn a non-zero exit into an error
pub fn run_checked(command: &mut Command, name: &str) -> Result<()> {
    let status = command
        .status()
        .map_err(|e| Error::io(name, e))?;

    if status.success() {
        Ok(())
    } else {
        Err(Error::CommandFailed {
            command: name.to_string(),
            status,
        })
    }
}

/// Print free space of the filesystem holding `path` and the size of `path`.
///
/// Informational only; failures are logged and otherwise ignored.
pub fn report_disk_usage(path: &Path) {
    let checks: [(&str, &str); 2] = [("df", "-h"), ("du", "-sh")];
    for (tool, flag) in checks {
        let mut command = Command::new(tool);
        command.arg(flag).arg(path);
        if let Err(e) = run_checked(&mut command, tool) {
            tracing::warn!("could not report disk usage of {}: {}", path.display(), e);
        }
    }
}

/// Unmount the destination.
///
/// A failure here does not undo a finished backup, so it is only reported.
pub fn unmount(mount_point: &Path) -> bool {
    let mut command = Command::new("umount");
    command.arg(mount_point);
    match run_checked(&mut command, "umount") {
        Ok(()) => {
            println!("✅ Unmounted successfully.");
            true
        }
        Err(e) => {
            tracing::warn!("{}", e);
            println!("❌ Failed to unmount. Please do it manually.");
            false
        }
    }
}
