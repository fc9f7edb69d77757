//! CSV report of an analysis run

use chrono::Local;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

use crate::error::{Error, Result};
use crate::state::data::AnalysisResult;

/// Timestamp shared by the CSV and the figure of one run (to the second)
pub fn run_stamp() -> String {
    Local::now().format("%Y%m%d_%H%M%S").to_string()
}

/// File name of the CSV report for a run
pub fn report_file_name(stamp: &str) -> String {
    format!("photo_metadata_analysis_{}.csv", stamp)
}

/// Write the analysis table into a staged file in `output_dir`.
///
/// One header row, one row per image, columns in `ExposureRow` order.
/// Nothing is visible under the final name until the result is committed.
pub fn stage_report(result: &AnalysisResult, output_dir: &Path, stamp: &str) -> Result<StagedFile> {
    let staged = stage_file(output_dir, &report_file_name(stamp), |file, path| {
        let mut writer = csv::Writer::from_writer(file);
        for row in &result.rows {
            writer.serialize(row)?;
        }
        writer.flush().map_err(|e| Error::io(path, e))
    })?;

    tracing::debug!("staged {} rows for {}", result.len(), staged.target().display());
    Ok(staged)
}

/// A fully written temp file waiting to be renamed onto its final name.
///
/// Dropping it without committing removes the temp file.
#[derive(Debug)]
pub struct StagedFile {
    tmp: NamedTempFile,
    target: PathBuf,
}

impl StagedFile {
    /// Final path the file is committed to
    pub fn target(&self) -> &Path {
        &self.target
    }

    /// Rename the temp file onto its final name
    pub fn commit(self) -> Result<PathBuf> {
        let target = self.target;
        self.tmp
            .persist(&target)
            .map_err(|e| Error::io(&target, e.error))?;
        Ok(target)
    }
}

/// Write `file_name` inside `output_dir` into a temp file in the same directory.
///
/// The content is flushed to disk before this returns. On any error the
/// temp file is removed and the final name is left untouched.
pub fn stage_file<F>(output_dir: &Path, file_name: &str, write: F) -> Result<StagedFile>
where
    F: FnOnce(&mut File, &Path) -> Result<()>,
{
    fs::create_dir_all(output_dir).map_err(|e| Error::io(output_dir, e))?;

    let target = output_dir.join(file_name);
    let mut tmp = NamedTempFile::new_in(output_dir).map_err(|e| Error::io(output_dir, e))?;

    write(tmp.as_file_mut(), &target)?;
    tmp.as_file().sync_all().map_err(|e| Error::io(&target, e))?;

    Ok(StagedFile { tmp, target })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::data::ExposureRow;

    fn result() -> AnalysisResult {
        let row = |name: &str, iso: f64, lens: &str| ExposureRow {
            path: PathBuf::from(format!("/photos/{}", name)),
            rating: 5.0,
            aperture: 2.8,
            iso,
            shutter_speed: 0.004,
            focal_length: 35.0,
            lens: lens.to_string(),
            shutter_speed_log: 0.004f64.log10(),
        };
        AnalysisResult {
            rows: vec![row("a.jpg", 400.0, "XF35mmF1.4 R"), row("b.jpg", 3200.0, "")],
            scanned: 2,
            extracted: 2,
            ..Default::default()
        }
    }

    #[test]
    fn test_stamp_format() {
        let stamp = run_stamp();
        assert_eq!(stamp.len(), 15);
        assert_eq!(&stamp[8..9], "_");
        assert!(stamp.chars().filter(|c| *c != '_').all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn test_report_layout() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("analyzed_data");

        let path = stage_report(&result(), &out, "20240601_120000")
            .unwrap()
            .commit()
            .unwrap();
        assert_eq!(path, out.join("photo_metadata_analysis_20240601_120000.csv"));

        let text = fs::read_to_string(&path).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next().unwrap(),
            "File,Rating,F-Stop,ISO,Shutter Speed,Focal Length,Lens,Shutter Speed Log"
        );
        let first = lines.next().unwrap();
        assert!(first.starts_with("/photos/a.jpg,5.0,2.8,400.0,0.004,35.0,XF35mmF1.4 R,"));
        assert!(lines.next().unwrap().starts_with("/photos/b.jpg,5.0,2.8,3200.0,0.004,35.0,,"));
        assert!(lines.next().is_none());

        // Only the report itself, no leftovers
        assert_eq!(fs::read_dir(&out).unwrap().count(), 1);
    }

    #[test]
    fn test_unwritable_output_dir_fails() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("analyzed_data");
        fs::write(&blocker, b"a file, not a directory").unwrap();

        let err = stage_report(&result(), &blocker, "20240601_120000").unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
    }

    #[test]
    fn test_failed_persist_leaves_nothing_behind() {
        let dir = tempfile::tempdir().unwrap();
        // The final name is taken by a directory, so the rename must fail
        fs::create_dir(dir.path().join(report_file_name("20240601_120000"))).unwrap();

        let staged = stage_report(&result(), dir.path(), "20240601_120000").unwrap();
        assert!(staged.commit().is_err());

        let names: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from(report_file_name("20240601_120000"))]);
    }

    #[test]
    fn test_uncommitted_stage_leaves_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let staged = stage_report(&result(), dir.path(), "20240601_120000").unwrap();
        assert!(!staged.target().exists());

        drop(staged);
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_non_utf8_file_name_is_written_lossily() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let mut result = result();
        result.rows[0].path = PathBuf::from("/photos").join(OsStr::from_bytes(b"caf\xe9.tiff"));

        let dir = tempfile::tempdir().unwrap();
        let path = stage_report(&result, dir.path(), "20240601_120000")
            .unwrap()
            .commit()
            .unwrap();

        let text = fs::read_to_string(&path).unwrap();
        assert!(text.contains("/photos/caf\u{FFFD}.tiff,5.0,"));
        assert_eq!(text.lines().count(), 3);
    }
}
