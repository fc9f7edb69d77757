//! Figure rendering
//!
//! Histograms are drawn straight into an RGB buffer with the `image` crate
//! and saved as PNG.

pub mod histogram;
