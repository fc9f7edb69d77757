//! EXIF metadata extraction
//!
//! Reads the exposure settings and rating of one image file. Every failure
//! (unreadable file, no EXIF block, unsupported container) is reported as
//! "nothing to extract" so that one bad file never stops a batch.

use exif::{Context, Exif, In, Tag, Value};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use tokio::sync::OwnedSemaphorePermit;
use tokio::task;

use crate::error::Result;
use crate::state::data::ImageRecord;

/// IFD0 Rating tag (0 to 5 stars), written by most cameras and catalogs
pub const RATING: Tag = Tag(Context::Tiff, 0x4746);

/// Signature shared by per-file extractors
pub type ExtractFn = fn(&Path, f64) -> Option<ImageRecord>;

/// Run `extract_fn` on `path` on the blocking pool.
///
/// EXIF parsing is synchronous file I/O, so it runs under `spawn_blocking`
/// like every other per-file decode. The worker `permit` lives inside the
/// blocking closure: a caller that stops waiting does not free the slot
/// while the thread is still busy.
pub async fn extract_async(
    extract_fn: ExtractFn,
    path: PathBuf,
    min_rating: f64,
    permit: OwnedSemaphorePermit,
) -> Result<Option<ImageRecord>> {
    let record = task::spawn_blocking(move || {
        let _permit = permit;
        extract_fn(&path, min_rating)
    })
    .await?;
    Ok(record)
}

/// Extract a record from one image.
///
/// Returns `None` if the file has no readable EXIF data, or if its rating
/// is missing or below `min_rating`.
pub fn extract(path: &Path, min_rating: f64) -> Option<ImageRecord> {
    let exif = match read_exif(path) {
        Ok(exif) => exif,
        Err(e) => {
            tracing::debug!("skipping {}: {}", path.display(), e);
            return None;
        }
    };

    let rating = numeric_field(&exif, RATING)?;
    if rating < min_rating {
        return None;
    }

    Some(ImageRecord {
        path: path.to_path_buf(),
        rating,
        aperture: numeric_field(&exif, Tag::FNumber),
        iso: numeric_field(&exif, Tag::PhotographicSensitivity),
        shutter_speed: numeric_field(&exif, Tag::ExposureTime),
        focal_length: numeric_field(&exif, Tag::FocalLength),
        lens: text_field(&exif, Tag::LensModel).unwrap_or_default(),
    })
}

/// Open a file read-only and parse its EXIF container
fn read_exif(path: &Path) -> std::result::Result<Exif, exif::Error> {
    let file = File::open(path)?;
    let mut reader = BufReader::new(file);
    exif::Reader::new().read_from_container(&mut reader)
}

/// Numeric value of a primary-image tag, or None if absent/unparsable
fn numeric_field(exif: &Exif, tag: Tag) -> Option<f64> {
    let field = exif.get_field(tag, In::PRIMARY)?;
    parse_numeric(&value_text(&field.value)?)
}

/// Text value of a primary-image ASCII tag
fn text_field(exif: &Exif, tag: Tag) -> Option<String> {
    let field = exif.get_field(tag, In::PRIMARY)?;
    match field.value {
        Value::Ascii(ref v) => v.first().map(|s| clean_ascii(s)),
        _ => None,
    }
}

/// Render the first component of a tag value as text.
///
/// Rationals keep their `num/denom` form so that a zero denominator is
/// caught by [`parse_numeric`] rather than turning into infinity here.
fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::Rational(v) => v.first().map(|r| format!("{}/{}", r.num, r.denom)),
        Value::SRational(v) => v.first().map(|r| format!("{}/{}", r.num, r.denom)),
        Value::Byte(v) => v.first().map(|n| n.to_string()),
        Value::Short(v) => v.first().map(|n| n.to_string()),
        Value::Long(v) => v.first().map(|n| n.to_string()),
        Value::SByte(v) => v.first().map(|n| n.to_string()),
        Value::SShort(v) => v.first().map(|n| n.to_string()),
        Value::SLong(v) => v.first().map(|n| n.to_string()),
        Value::Float(v) => v.first().map(|n| n.to_string()),
        Value::Double(v) => v.first().map(|n| n.to_string()),
        Value::Ascii(v) => v.first().map(|s| clean_ascii(s)),
        _ => None,
    }
}

fn clean_ascii(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes)
        .trim_end_matches('\0')
        .trim()
        .to_string()
}

/// Parse a tag value rendered as text.
///
/// Accepts a plain number (`"400"`, `"2.8"`) or a fraction (`"1/250"`).
/// A zero denominator, an unparsable string or a non-finite result all
/// count as missing.
pub fn parse_numeric(text: &str) -> Option<f64> {
    let text = text.trim();
    let value = match text.split_once('/') {
        Some((num, denom)) => {
            let num: f64 = num.trim().parse().ok()?;
            let denom: f64 = denom.trim().parse().ok()?;
            if denom == 0.0 {
                return None;
            }
            num / denom
        }
        None => text.parse().ok()?,
    };

    value.is_finite().then_some(value)
}
