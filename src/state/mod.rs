//! State shared by the commands
//!
//! - Records and result tables of an analysis run (data.rs)
//! - The photo library on disk and its scanner (library.rs)
//! - The lens reference table (lens.rs)

pub mod data;
pub mod lens;
pub mod library;
