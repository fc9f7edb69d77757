//! Parallel EXIF aggregation
//!
//! Fans the extractor out over every candidate file, waits for all of them,
//! then filters and cleans the collected records into an `AnalysisResult`.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio::time;

use crate::error::{Error, Result};
use crate::metadata::{extract, extract_async, ExtractFn};
use crate::state::data::{AnalysisResult, ExposureRow, ImageRecord};

/// Knobs for one aggregation run
#[derive(Debug, Clone)]
pub struct AnalysisOptions {
    /// Images rated below this are ignored
    pub min_rating: f64,
    /// Keep only this exact lens model
    pub lens_filter: Option<String>,
    /// Maximum extractions in flight
    pub workers: usize,
    /// Stop waiting on a single file after this long
    pub extract_timeout: Duration,
}

/// Extract, filter and clean every path.
///
/// Row order in the result is unspecified. Returns `Error::NoData` when
/// nothing survives, which callers treat as a clean stop.
pub async fn aggregate(paths: Vec<PathBuf>, options: &AnalysisOptions) -> Result<AnalysisResult> {
    let scanned = paths.len();
    println!("⏳ Found {} images. Extracting metadata...", scanned);

    let records = extract_all(paths, options, extract).await;
    let extracted = records.len();

    let records: Vec<ImageRecord> = match &options.lens_filter {
        Some(lens) => records.into_iter().filter(|r| &r.lens == lens).collect(),
        None => records,
    };
    let lens_rejected = extracted - records.len();

    let kept = records.len();
    let rows: Vec<ExposureRow> = records
        .into_iter()
        .filter_map(ExposureRow::from_record)
        .collect();
    let incomplete = kept - rows.len();

    tracing::debug!(
        scanned,
        extracted,
        lens_rejected,
        incomplete,
        rows = rows.len(),
        "aggregation finished"
    );

    if rows.is_empty() {
        return Err(Error::NoData {
            min_rating: options.min_rating,
            lens: options.lens_filter.clone(),
        });
    }

    Ok(AnalysisResult {
        rows,
        scanned,
        extracted,
        lens_rejected,
        incomplete,
    })
}

/// Run `extract_fn` over `paths` with at most `options.workers` in flight.
///
/// Returns once every task has finished (or timed out). Files that fail,
/// panic or time out are logged and left out. A timed-out file keeps its
/// worker slot until its blocking thread returns.
async fn extract_all(
    paths: Vec<PathBuf>,
    options: &AnalysisOptions,
    extract_fn: ExtractFn,
) -> Vec<ImageRecord> {
    let permits = Arc::new(Semaphore::new(options.workers.max(1)));
    let mut tasks = JoinSet::new();

    for path in paths {
        let permits = Arc::clone(&permits);
        let min_rating = options.min_rating;
        let timeout = options.extract_timeout;

        tasks.spawn(async move {
            let permit = permits.acquire_owned().await.ok()?;
            let extraction = extract_async(extract_fn, path.clone(), min_rating, permit);

            match time::timeout(timeout, extraction).await {
                Ok(Ok(record)) => record,
                Ok(Err(e)) => {
                    tracing::warn!("extraction failed for {}: {}", path.display(), e);
                    None
                }
                Err(_) => {
                    tracing::warn!(
                        "extraction timed out after {:?} for {}",
                        timeout,
                        path.display()
                    );
                    None
                }
            }
        });
    }

    // Completion barrier
    let mut records = Vec::new();
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(Some(record)) => records.push(record),
            Ok(None) => {}
            Err(e) => tracing::warn!("extraction task failed: {}", e),
        }
    }
    records
}
