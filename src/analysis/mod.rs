//! Photo library analysis
//!
//! Pipeline stages:
//! 1. **Scan** - find candidate images under the library root
//! 2. **Aggregate** - extract EXIF in parallel, filter by rating and lens, clean
//! 3. **Report** - write the table as a timestamped CSV
//! 4. **Summarize** - bucket the four attributes and save the histogram figure

pub mod aggregator;
pub mod report;
pub mod summary;

pub use aggregator::{aggregate, AnalysisOptions};

use std::fs;
use std::path::PathBuf;
use tokio::task;

use crate::error::Result;
use crate::plot::histogram;
use crate::state::data::AnalysisResult;
use crate::state::library;
use summary::DistributionSummary;

/// Everything one `analyze` run needs
#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    /// Library root to scan
    pub root: PathBuf,
    /// Where the CSV and figure go
    pub output_dir: PathBuf,
    /// Rating/lens filters and worker settings
    pub options: AnalysisOptions,
    /// Aperture bucket edges of the selected lens
    pub f_stop_buckets: Option<Vec<f64>>,
}

/// What a successful run produced
#[derive(Debug, Clone)]
pub struct AnalysisOutput {
    pub result: AnalysisResult,
    pub summary: DistributionSummary,
    pub report: PathBuf,
    pub figure: PathBuf,
}

/// Run the whole pipeline.
///
/// Nothing is written unless aggregation produced at least one row; an
/// empty run comes back as `Error::NoData`.
pub async fn run_analysis(request: &AnalysisRequest) -> Result<AnalysisOutput> {
    run_analysis_at(request, &report::run_stamp()).await
}

async fn run_analysis_at(request: &AnalysisRequest, stamp: &str) -> Result<AnalysisOutput> {
    let root = request.root.clone();
    let paths = task::spawn_blocking(move || library::scan(&root)).await??;

    let result = aggregate(paths, &request.options).await?;
    println!("📊 Number of pictures analyzed: {}", result.len());

    let summary = summary::summarize(&result, request.f_stop_buckets.as_deref());
    let png = histogram::encode_png(&summary)?;

    // Both files are fully written before either gets its final name
    let report = report::stage_report(&result, &request.output_dir, stamp)?;
    let figure = histogram::stage_figure(&png, &request.output_dir, stamp)?;

    let report = report.commit()?;
    let figure = match figure.commit() {
        Ok(figure) => figure,
        Err(e) => {
            if let Err(cleanup) = fs::remove_file(&report) {
                tracing::warn!("could not remove {}: {}", report.display(), cleanup);
            }
            return Err(e);
        }
    };

    Ok(AnalysisOutput {
        result,
        summary,
        report,
        figure,
    })
}
