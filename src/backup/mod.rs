//! Backup of photo folders onto an external drive
//!
//! The heavy lifting is done by `rsync`: archive mode with checksum
//! comparison, optionally deleting files that disappeared from the sources.
//! The destination must already be mounted; finding and mounting devices is
//! left to the system.

pub mod system;

use std::ffi::OsString;
use std::path::PathBuf;
use std::process::Command;

use crate::error::{Error, Result};

/// How the destination relates to the sources after a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackupMode {
    /// Copy new and changed files, never delete anything
    #[default]
    Archive,
    /// Make the destination identical to the sources (deletes extra files)
    Mirror,
}

/// One backup run
#[derive(Debug, Clone)]
pub struct BackupPlan {
    pub sources: Vec<PathBuf>,
    pub destination: PathBuf,
    pub mode: BackupMode,
}

impl BackupPlan {
    /// Check that every folder involved exists before touching anything
    pub fn validate(&self) -> Result<()> {
        if self.sources.is_empty() {
            return Err(Error::invalid("sources", "none given"));
        }
        for source in &self.sources {
            if !source.is_dir() {
                return Err(Error::SourceMissing(source.clone()));
            }
        }
        if !self.destination.is_dir() {
            return Err(Error::DestinationMissing(self.destination.clone()));
        }
        Ok(())
    }

    /// Arguments passed to rsync, sources first, destination last
    pub fn rsync_args(&self) -> Vec<OsString> {
        let mut args: Vec<OsString> = [
            "-aAXvh",
            "--progress",
            "--checksum",
            "--no-owner",
            "--no-group",
        ]
        .iter()
        .map(OsString::from)
        .collect();

        if self.mode == BackupMode::Mirror {
            args.push("--delete".into());
        }

        args.extend(self.sources.iter().map(|s| s.as_os_str().to_owned()));
        args.push(self.destination.as_os_str().to_owned());
        args
    }
}

/// Copy the sources onto the destination.
///
/// Checks the plan and the rsync install before anything runs, and shows
/// disk usage of the destination before and after. rsync inherits the
/// terminal so its progress output stays visible.
pub fn run_backup(plan: &BackupPlan) -> Result<()> {
    plan.validate()?;
    system::require_command("rsync")?;

    println!("\n📊 Disk usage before backup:");
    system::report_disk_usage(&plan.destination);

    println!("🚀 Starting backup...");
    tracing::debug!("rsync {:?}", plan.rsync_args());

    let mut command = Command::new("rsync");
    command.args(plan.rsync_args());
    system::run_checked(&mut command, "rsync")?;

    println!("✅ Backup completed successfully!");

    println!("\n📊 Disk usage after backup:");
    system::report_disk_usage(&plan.destination);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plan(mode: BackupMode) -> BackupPlan {
        BackupPlan {
            sources: vec![PathBuf::from("/home/me/Pictures/Camera"), PathBuf::from("/home/me/Pictures/digikam")],
            destination: PathBuf::from("/mnt/sdb1"),
            mode,
        }
    }

    #[test]
    fn test_archive_args() {
        let args = plan(BackupMode::Archive).rsync_args();
        assert_eq!(
            args,
            vec![
                "-aAXvh",
                "--progress",
                "--checksum",
                "--no-owner",
                "--no-group",
                "/home/me/Pictures/Camera",
                "/home/me/Pictures/digikam",
                "/mnt/sdb1",
            ]
        );
    }

    #[test]
    fn test_mirror_adds_delete() {
        let args = plan(BackupMode::Mirror).rsync_args();
        assert!(args.iter().any(|a| a == "--delete"));
        assert!(args.iter().any(|a| a == "--checksum"));
        assert_eq!(args.last().unwrap(), "/mnt/sdb1");
        assert!(!plan(BackupMode::Archive).rsync_args().iter().any(|a| a == "--delete"));
    }

    #[test]
    fn test_validate() {
        let src = tempfile::tempdir().unwrap();
        let dest = tempfile::tempdir().unwrap();

        let mut plan = BackupPlan {
            sources: vec![src.path().to_path_buf()],
            destination: dest.path().to_path_buf(),
            mode: BackupMode::Archive,
        };
        assert!(plan.validate().is_ok());

        plan.sources.push(src.path().join("missing"));
        assert!(matches!(plan.validate(), Err(Error::SourceMissing(p)) if p.ends_with("missing")));

        plan.sources.pop();
        plan.destination = dest.path().join("not-mounted");
        assert!(matches!(plan.validate(), Err(Error::DestinationMissing(_))));

        plan.sources.clear();
        assert!(matches!(plan.validate(), Err(Error::InvalidArgument { .. })));
    }

    #[test]
    fn test_run_backup_checks_sources_first() {
        let dest = tempfile::tempdir().unwrap();
        let plan = BackupPlan {
            sources: vec![dest.path().join("nope")],
            destination: dest.path().to_path_buf(),
            mode: BackupMode::Mirror,
        };
        assert!(matches!(run_backup(&plan), Err(Error::SourceMissing(_))));
    }

    #[test]
    fn test_run_backup_checks_destination_before_reporting() {
        let src = tempfile::tempdir().unwrap();
        let plan = BackupPlan {
            sources: vec![src.path().to_path_buf()],
            destination: src.path().join("not-mounted"),
            mode: BackupMode::Archive,
        };
        assert!(matches!(run_backup(&plan), Err(Error::DestinationMissing(_))));
    }
}
