//! Frequency distributions of the four exposure attributes

use crate::state::data::{AnalysisResult, ExposureRow};

/// Bins used when no explicit edges are given
pub const DEFAULT_BINS: usize = 10;

/// Standard full-stop shutter speeds, in seconds, with their usual labels
pub const SHUTTER_SPEEDS: [(f64, &str); 19] = [
    (1.0 / 4000.0, "1/4000"),
    (1.0 / 2000.0, "1/2000"),
    (1.0 / 1000.0, "1/1000"),
    (1.0 / 500.0, "1/500"),
    (1.0 / 250.0, "1/250"),
    (1.0 / 125.0, "1/125"),
    (1.0 / 60.0, "1/60"),
    (1.0 / 30.0, "1/30"),
    (1.0 / 15.0, "1/15"),
    (1.0 / 8.0, "1/8"),
    (1.0 / 4.0, "1/4"),
    (1.0 / 2.0, "1/2"),
    (1.0, "1"),
    (2.0, "2"),
    (4.0, "4"),
    (8.0, "8"),
    (15.0, "15"),
    (30.0, "30"),
    (60.0, "60"),
];

/// A labelled axis position
#[derive(Debug, Clone, PartialEq)]
pub struct Tick {
    pub position: f64,
    pub label: String,
}

/// Histogram of one attribute.
///
/// `edges` has one more entry than `counts`. Bin `i` covers
/// `[edges[i], edges[i + 1])`, except the last bin which is closed.
#[derive(Debug, Clone, PartialEq)]
pub struct Distribution {
    pub title: &'static str,
    pub edges: Vec<f64>,
    pub counts: Vec<usize>,
    /// Labelled ticks; empty means "use the bin edges"
    pub ticks: Vec<Tick>,
}

impl Distribution {
    /// `bins` equal-width bins spanning the data
    pub fn equal_width(title: &'static str, values: &[f64], bins: usize) -> Self {
        let edges = equal_width_edges(values, bins.max(1));
        Self::with_edges(title, values, edges)
    }

    /// Bins between caller-supplied ascending edges; values outside are not counted
    pub fn with_edges(title: &'static str, values: &[f64], edges: Vec<f64>) -> Self {
        let counts = count_into(values, &edges);
        Self {
            title,
            edges,
            counts,
            ticks: Vec::new(),
        }
    }

    /// Number of values that landed in a bin
    pub fn total(&self) -> usize {
        self.counts.iter().sum()
    }

    /// Highest count in any bin
    pub fn max_count(&self) -> usize {
        self.counts.iter().copied().max().unwrap_or(0)
    }

    /// Range of the fullest bin (first one on ties)
    pub fn peak(&self) -> Option<(f64, f64)> {
        let max = self.max_count();
        if max == 0 {
            return None;
        }
        let i = self.counts.iter().position(|&c| c == max)?;
        Some((self.edges[i], self.edges[i + 1]))
    }

    /// Span of the x axis: the bin edges widened to include every tick
    pub fn x_range(&self) -> (f64, f64) {
        let lo = self.edges.first().copied().unwrap_or(0.0);
        let hi = self.edges.last().copied().unwrap_or(1.0);
        self.ticks
            .iter()
            .fold((lo, hi), |(lo, hi), t| (lo.min(t.position), hi.max(t.position)))
    }
}

/// Evenly spaced edges from min to max.
///
/// A single distinct value gets a unit-wide range around it.
fn equal_width_edges(values: &[f64], bins: usize) -> Vec<f64> {
    let (mut lo, mut hi) = values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));

    if values.is_empty() {
        lo = 0.0;
        hi = 1.0;
    } else if lo == hi {
        lo -= 0.5;
        hi += 0.5;
    }

    let width = (hi - lo) / bins as f64;
    let mut edges: Vec<f64> = (0..bins).map(|i| lo + width * i as f64).collect();
    edges.push(hi);
    edges
}

fn count_into(values: &[f64], edges: &[f64]) -> Vec<usize> {
    if edges.len() < 2 {
        return Vec::new();
    }
    let bins = edges.len() - 1;
    let mut counts = vec![0; bins];

    for &v in values {
        if v < edges[0] || v > edges[bins] {
            continue;
        }
        // partition_point >= 1 here because v >= edges[0]
        let i = (edges.partition_point(|&e| e <= v) - 1).min(bins - 1);
        counts[i] += 1;
    }
    counts
}

/// The four panels of the figure, in drawing order
#[derive(Debug, Clone, PartialEq)]
pub struct DistributionSummary {
    pub aperture: Distribution,
    pub iso: Distribution,
    pub shutter: Distribution,
    pub focal_length: Distribution,
}

impl DistributionSummary {
    /// Panels in figure order (row-major 2x2)
    pub fn panels(&self) -> [&Distribution; 4] {
        [&self.aperture, &self.iso, &self.shutter, &self.focal_length]
    }
}

/// Build the four distributions of an analysis result.
///
/// `f_stop_buckets` are the selected lens's stops; they become the aperture
/// bin edges when at least two are given.
pub fn summarize(result: &AnalysisResult, f_stop_buckets: Option<&[f64]>) -> DistributionSummary {
    let apertures = result.column(|r: &ExposureRow| r.aperture);
    let aperture = match f_stop_buckets {
        Some(edges) if edges.len() >= 2 => {
            Distribution::with_edges("F-Stop Distribution", &apertures, edges.to_vec())
        }
        Some(edges) => {
            tracing::warn!(
                "need at least two f-stops for aperture buckets, got {}; using {} bins",
                edges.len(),
                DEFAULT_BINS
            );
            Distribution::equal_width("F-Stop Distribution", &apertures, DEFAULT_BINS)
        }
        None => Distribution::equal_width("F-Stop Distribution", &apertures, DEFAULT_BINS),
    };

    let iso = Distribution::equal_width(
        "ISO Distribution",
        &result.column(|r: &ExposureRow| r.iso),
        DEFAULT_BINS,
    );

    let mut shutter = Distribution::equal_width(
        "Shutter Speed Distribution",
        &result.column(|r: &ExposureRow| r.shutter_speed_log),
        SHUTTER_SPEEDS.len(),
    );
    shutter.ticks = shutter_ticks();

    let focal_length = Distribution::equal_width(
        "Focal Length Distribution",
        &result.column(|r: &ExposureRow| r.focal_length),
        DEFAULT_BINS,
    );

    DistributionSummary {
        aperture,
        iso,
        shutter,
        focal_length,
    }
}

/// Ticks at log10 of every standard shutter speed
pub fn shutter_ticks() -> Vec<Tick> {
    SHUTTER_SPEEDS
        .iter()
        .map(|&(seconds, label)| Tick {
            position: seconds.log10(),
            label: label.to_string(),
        })
        .collect()
}
