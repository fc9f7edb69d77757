//! Histogram figure
//! Draws the four exposure distributions as a 2x2 grid of bar charts

use image::{ImageFormat, Rgb, RgbImage};
use std::io::{Cursor, Write};
use std::path::Path;

use crate::analysis::report::{stage_file, StagedFile};
use crate::analysis::summary::{Distribution, DistributionSummary};
use crate::error::{Error, Result};

/// Figure size in pixels (12x10 inches at 100 dpi)
pub const FIGURE_WIDTH: u32 = 1200;
pub const FIGURE_HEIGHT: u32 = 1000;

/// Space around each plot area inside its panel
const MARGIN: u32 = 50;
/// Length of tick marks below the x axis
const TICK_LENGTH: u32 = 8;

const WHITE: Rgb<u8> = Rgb([255, 255, 255]);
const AXIS: Rgb<u8> = Rgb([40, 40, 40]);
const GRID: Rgb<u8> = Rgb([225, 225, 225]);

/// Bar colors, one per panel: aperture, ISO, shutter, focal length
const COLORS: [Rgb<u8>; 4] = [
    Rgb([31, 119, 180]),  // Blue
    Rgb([214, 39, 40]),   // Red
    Rgb([44, 160, 44]),   // Green
    Rgb([148, 103, 189]), // Purple
];

/// File name of the figure for a run
pub fn plot_file_name(stamp: &str) -> String {
    format!("photo_metadata_plots_{}.png", stamp)
}

/// Render the four panels into an image
pub fn render(summary: &DistributionSummary) -> RgbImage {
    let mut img = RgbImage::from_pixel(FIGURE_WIDTH, FIGURE_HEIGHT, WHITE);
    let panel_width = FIGURE_WIDTH / 2;
    let panel_height = FIGURE_HEIGHT / 2;

    for (i, distribution) in summary.panels().into_iter().enumerate() {
        let col = i as u32 % 2;
        let row = i as u32 / 2;
        let area = PlotArea {
            left: col * panel_width + MARGIN,
            top: row * panel_height + MARGIN,
            width: panel_width - 2 * MARGIN,
            height: panel_height - 2 * MARGIN,
        };
        draw_panel(&mut img, distribution, &area, COLORS[i]);
    }

    img
}

/// Render the figure and encode it as PNG
pub fn encode_png(summary: &DistributionSummary) -> Result<Vec<u8>> {
    let img = render(summary);

    let mut png = Cursor::new(Vec::new());
    img.write_to(&mut png, ImageFormat::Png)?;
    Ok(png.into_inner())
}

/// Stage encoded PNG bytes as the figure of a run in `output_dir`
pub fn stage_figure(png: &[u8], output_dir: &Path, stamp: &str) -> Result<StagedFile> {
    stage_file(output_dir, &plot_file_name(stamp), |file, path| {
        file.write_all(png).map_err(|e| Error::io(path, e))
    })
}

/// Pixel rectangle of one plot area
struct PlotArea {
    left: u32,
    top: u32,
    width: u32,
    height: u32,
}

impl PlotArea {
    fn bottom(&self) -> u32 {
        self.top + self.height
    }

    /// Map a data x value to a pixel column
    fn x_pixel(&self, value: f64, (lo, hi): (f64, f64)) -> u32 {
        let t = if hi > lo { (value - lo) / (hi - lo) } else { 0.5 };
        self.left + (t.clamp(0.0, 1.0) * self.width as f64).round() as u32
    }
}

fn draw_panel(img: &mut RgbImage, distribution: &Distribution, area: &PlotArea, color: Rgb<u8>) {
    // Horizontal grid lines at quarter heights
    for q in 1..=4 {
        let y = area.bottom() - area.height * q / 4;
        fill_rect(img, area.left, y, area.width, 1, GRID);
    }

    let range = distribution.x_range();
    let max_count = distribution.max_count();

    if max_count > 0 {
        for (i, &count) in distribution.counts.iter().enumerate() {
            if count == 0 {
                continue;
            }
            // Normalize to the fullest bin
            let normalized = count as f64 / max_count as f64;
            let bar_height = ((normalized * area.height as f64).round() as u32).max(1);

            let x0 = area.x_pixel(distribution.edges[i], range);
            let x1 = area.x_pixel(distribution.edges[i + 1], range);
            // 1px gap between neighbouring bars
            let bar_width = x1.saturating_sub(x0).saturating_sub(1).max(1);

            fill_rect(img, x0, area.bottom() - bar_height, bar_width, bar_height, color);
        }
    }

    // Axes
    fill_rect(img, area.left, area.bottom(), area.width + 1, 1, AXIS);
    fill_rect(img, area.left, area.top, 1, area.height, AXIS);

    // Tick marks: labelled ticks if any, otherwise bin edges
    let ticks: Vec<f64> = if distribution.ticks.is_empty() {
        distribution.edges.clone()
    } else {
        distribution.ticks.iter().map(|t| t.position).collect()
    };
    for position in ticks {
        let x = area.x_pixel(position, range);
        fill_rect(img, x, area.bottom(), 1, TICK_LENGTH, AXIS);
    }
}

/// Fill a rectangle, clipped to the image
fn fill_rect(img: &mut RgbImage, x: u32, y: u32, width: u32, height: u32, color: Rgb<u8>) {
    let x_end = (x + width).min(img.width());
    let y_end = (y + height).min(img.height());
    for py in y..y_end {
        for px in x..x_end {
            img.put_pixel(px, py, color);
        }
    }
}
