//! Shared data structures for an analysis run.
//!
//! These structs represent the data model that flows from the EXIF
//! extractor, through the aggregator, into the report and the figure.

use serde::{Serialize, Serializer};
use std::path::{Path, PathBuf};

/// One photo that passed the rating filter during extraction.
///
/// Numeric fields are `None` when the tag is absent or could not be parsed.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageRecord {
    /// Full path to the image file
    pub path: PathBuf,
    /// Rating from the IFD0 Rating tag (always >= the minimum used to extract)
    pub rating: f64,
    /// F-number
    pub aperture: Option<f64>,
    /// ISO sensitivity
    pub iso: Option<f64>,
    /// Exposure time in seconds
    pub shutter_speed: Option<f64>,
    /// Focal length in mm
    pub focal_length: Option<f64>,
    /// Lens model, empty if the camera did not record one
    pub lens: String,
}

/// A fully validated row of the analysis table.
///
/// Field order is the CSV column order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExposureRow {
    /// Written lossily: a name that is not UTF-8 still gets its row
    #[serde(rename = "File", serialize_with = "serialize_path_lossy")]
    pub path: PathBuf,
    #[serde(rename = "Rating")]
    pub rating: f64,
    #[serde(rename = "F-Stop")]
    pub aperture: f64,
    #[serde(rename = "ISO")]
    pub iso: f64,
    #[serde(rename = "Shutter Speed")]
    pub shutter_speed: f64,
    #[serde(rename = "Focal Length")]
    pub focal_length: f64,
    #[serde(rename = "Lens")]
    pub lens: String,
    /// log10 of the shutter speed, for even bucketing across stops
    #[serde(rename = "Shutter Speed Log")]
    pub shutter_speed_log: f64,
}

impl ExposureRow {
    /// Coerce a record into a row.
    ///
    /// All-or-nothing: if any numeric field is missing, not finite or not
    /// positive the whole record is rejected. This is also what keeps
    /// `log10` away from non-positive exposure times.
    pub fn from_record(record: ImageRecord) -> Option<Self> {
        let aperture = positive(record.aperture)?;
        let iso = positive(record.iso)?;
        let shutter_speed = positive(record.shutter_speed)?;
        let focal_length = positive(record.focal_length)?;

        Some(Self {
            path: record.path,
            rating: record.rating,
            aperture,
            iso,
            shutter_speed,
            focal_length,
            lens: record.lens,
            shutter_speed_log: shutter_speed.log10(),
        })
    }
}

fn positive(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite() && *v > 0.0)
}

fn serialize_path_lossy<S: Serializer>(path: &Path, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&path.to_string_lossy())
}

/// Outcome of one aggregation run
#[derive(Debug, Clone, Default)]
pub struct AnalysisResult {
    /// Accepted rows, in no particular order
    pub rows: Vec<ExposureRow>,
    /// Candidate files handed to the extractor
    pub scanned: usize,
    /// Records that passed the rating filter
    pub extracted: usize,
    /// Records removed by the lens filter
    pub lens_rejected: usize,
    /// Records dropped because a numeric field was unusable
    pub incomplete: usize,
}

impl AnalysisResult {
    /// Number of rows in the table
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Collect one numeric column
    pub fn column(&self, field: fn(&ExposureRow) -> f64) -> Vec<f64> {
        self.rows.iter().map(field).collect()
    }
}
