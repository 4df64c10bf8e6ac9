//! Image collection: list a folder's supported images in natural order.

use crate::config::is_supported_image;
use crate::error::ConvertError;
use crate::pipeline::natural::natural_cmp;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Return the supported image files directly inside `dir`, naturally sorted
/// by file name.
///
/// Subdirectories are not descended into, and a directory whose name ends in
/// `.png` is still a directory. An empty result is an error: there is
/// nothing to pack.
pub fn collect_images(dir: &Path) -> Result<Vec<PathBuf>, ConvertError> {
    let entries = std::fs::read_dir(dir).map_err(|e| ConvertError::io(dir, e))?;

    let mut images = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| ConvertError::io(dir, e))?;
        let path = entry.path();
        if !is_supported_image(&path) {
            continue;
        }
        // file_type() does not follow symlinks; metadata() does.
        let is_file = std::fs::metadata(&path)
            .map(|m| m.is_file())
            .unwrap_or(false);
        if is_file {
            images.push(path);
        } else {
            debug!("Skipping non-file entry {}", path.display());
        }
    }

    if images.is_empty() {
        return Err(ConvertError::EmptyInput {
            dir: dir.to_path_buf(),
        });
    }

    images.sort_by(|a, b| natural_cmp(&file_name_lossy(a), &file_name_lossy(b)));
    info!("Collected {} images from {}", images.len(), dir.display());
    Ok(images)
}

fn file_name_lossy(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}
