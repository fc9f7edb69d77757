//! EXIF metadata module
//!
//! Turns one image file into an `ImageRecord` (or nothing).

pub mod extractor;

#[cfg(test)]
pub mod fixture;

pub use extractor::{extract, extract_async, ExtractFn};
