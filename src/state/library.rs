use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::error::{Error, Result};

/// Image file extensions the scanner picks up (compared lowercase)
pub const SUPPORTED_EXTENSIONS: [&str; 7] = ["jpg", "jpeg", "tiff", "dng", "nef", "cr2", "arw"];

/// The Library is a photo folder on disk.
/// It knows how to enumerate the image files under it; nothing is cached,
/// so every scan reflects the folder as it is right now.
#[derive(Debug, Clone)]
pub struct Library {
    root: PathBuf,
}

impl Library {
    /// Open a library rooted at `root`.
    ///
    /// Fails if the root is missing or not a directory, so that a typo in
    /// the path is reported as such instead of as an empty library.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        if !root.is_dir() {
            return Err(Error::LibraryRoot(root));
        }
        Ok(Library { root })
    }

    /// Walk the directory tree recursively and collect supported images.
    ///
    /// Symlinked directories are not followed (cycles). Entries that cannot
    /// be read are skipped. Order is directory traversal order.
    pub fn scan(&self) -> Vec<PathBuf> {
        println!("🔍 Scanning folder: {}", self.root.display());

        let mut images = Vec::new();
        for entry in WalkDir::new(&self.root).follow_links(false) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::debug!("skipping unreadable entry: {}", e);
                    continue;
                }
            };

            // Files and links to files; linked directories are never entered
            let is_file = entry.file_type().is_file()
                || (entry.path_is_symlink() && entry.path().is_file());
            if !is_file {
                continue;
            }

            if is_supported(entry.path()) {
                images.push(entry.into_path());
            }
        }

        tracing::debug!("found {} candidate images under {}", images.len(), self.root.display());
        images
    }
}

/// Scan `root` for supported image files
pub fn scan(root: &Path) -> Result<Vec<PathBuf>> {
    Ok(Library::open(root)?.scan())
}

/// Check if a path has one of the supported extensions (case-insensitive)
pub fn is_supported(path: &Path) -> bool {
    match path.extension() {
        Some(extension) => {
            let ext = extension.to_string_lossy().to_lowercase();
            SUPPORTED_EXTENSIONS.contains(&ext.as_str())
        }
        None => false,
    }
}
