//! Lens reference table.
//!
//! A small CSV kept next to the photo library that maps a lens model to the
//! f-stops it can shoot at. The stops are only used as aperture histogram
//! bucket edges. Format:
//!
//! ```text
//! Lens,FStopSteps
//! XF35mmF1.4 R,"1.4,2,2.8,4,5.6,8,11,16"
//! ```

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// One lens and its aperture bucket edges (ascending)
#[derive(Debug, Clone, PartialEq)]
pub struct LensProfile {
    pub name: String,
    pub f_stops: Vec<f64>,
}

/// Raw CSV row
#[derive(Debug, Deserialize)]
struct LensRow {
    #[serde(rename = "Lens")]
    lens: String,
    #[serde(rename = "FStopSteps")]
    f_stop_steps: String,
}

/// The loaded lens table, in file order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LensDatabase {
    profiles: Vec<LensProfile>,
}

impl LensDatabase {
    /// Load the table from `path`.
    ///
    /// A missing file is not an error: it returns `Ok(None)` and the caller
    /// falls back to analyzing every lens. Malformed rows are skipped with a
    /// warning. Only a file that cannot be read at all is an error.
    pub fn load(path: &Path) -> Result<Option<Self>> {
        if !path.exists() {
            tracing::warn!(
                "lens database '{}' not found; analyzing all lenses",
                path.display()
            );
            return Ok(None);
        }

        let mut reader = csv::Reader::from_path(path).map_err(|e| unreadable(path, e))?;
        let mut profiles = Vec::new();

        for (i, row) in reader.deserialize::<LensRow>().enumerate() {
            // +2: header line plus 1-based numbering
            let line = i + 2;
            let row = match row {
                Ok(row) => row,
                Err(e) if e.is_io_error() => return Err(unreadable(path, e)),
                Err(e) => {
                    tracing::warn!("{}: skipping line {}: {}", path.display(), line, e);
                    continue;
                }
            };

            match parse_f_stops(&row.f_stop_steps) {
                Some(f_stops) => profiles.push(LensProfile {
                    name: row.lens.trim().to_string(),
                    f_stops,
                }),
                None => tracing::warn!(
                    "{}: skipping line {}: bad FStopSteps '{}'",
                    path.display(),
                    line,
                    row.f_stop_steps
                ),
            }
        }

        tracing::debug!("loaded {} lenses from {}", profiles.len(), path.display());
        Ok(Some(Self { profiles }))
    }

    /// All lenses in file order
    pub fn profiles(&self) -> &[LensProfile] {
        &self.profiles
    }

    /// Pick a lens by menu index.
    ///
    /// 0 means "all lenses" and returns None; 1..=n picks the n-th entry.
    /// Anything out of range also falls back to all lenses.
    pub fn select(&self, index: usize) -> Option<&LensProfile> {
        if index == 0 {
            return None;
        }
        let profile = self.profiles.get(index - 1);
        if profile.is_none() {
            tracing::warn!("invalid lens selection {}; analyzing all lenses", index);
        }
        profile
    }
}

fn unreadable(path: &Path, e: csv::Error) -> Error {
    Error::LensTable {
        path: PathBuf::from(path),
        message: e.to_string(),
    }
}

/// Parse a comma-joined list of f-stops, sorted ascending.
///
/// Returns None if the list is empty or any entry is not a finite number.
pub fn parse_f_stops(text: &str) -> Option<Vec<f64>> {
    let mut stops = text
        .split(',')
        .map(|s| s.trim().parse::<f64>().ok().filter(|v| v.is_finite()))
        .collect::<Option<Vec<f64>>>()?;

    if stops.is_empty() {
        return None;
    }
    stops.sort_by(f64::total_cmp);
    Some(stops)
}
