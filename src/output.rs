//! Result types returned by the conversion entry points.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Result of packing a folder of images into one PDF.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackOutput {
    /// Where the PDF was written.
    pub output_path: PathBuf,
    /// One page per packed image.
    pub page_count: usize,
    /// Source images in page order.
    pub images: Vec<PathBuf>,
    /// Wall-clock time of the whole job.
    pub duration_ms: u64,
}

/// Result of rasterising a PDF into page images.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RasterOutput {
    /// Directory holding the page images.
    pub output_dir: PathBuf,
    /// Written files in page order (`page_001.png`, …).
    pub pages: Vec<PathBuf>,
    /// Zoom percentage used.
    pub zoom: u32,
    /// Wall-clock time of the whole job.
    pub duration_ms: u64,
}

/// Result of either conversion direction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum JobOutput {
    Pack(PackOutput),
    Raster(RasterOutput),
}

impl JobOutput {
    /// The path to report to the user: the PDF file or the image directory.
    pub fn location(&self) -> &std::path::Path {
        match self {
            JobOutput::Pack(p) => &p.output_path,
            JobOutput::Raster(r) => &r.output_dir,
        }
    }

    /// Number of pages written (PDF pages or PNG files).
    pub fn page_count(&self) -> usize {
        match self {
            JobOutput::Pack(p) => p.page_count,
            JobOutput::Raster(r) => r.pages.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_is_tagged_by_kind() {
        let out = JobOutput::Raster(RasterOutput {
            output_dir: PathBuf::from("/d/report_images"),
            pages: vec![PathBuf::from("/d/report_images/page_001.png")],
            zoom: 200,
            duration_ms: 12,
        });
        let json = serde_json::to_value(&out).unwrap();
        assert_eq!(json["kind"], "raster");
        assert_eq!(json["zoom"], 200);
        assert_eq!(out.page_count(), 1);
        assert_eq!(out.location(), std::path::Path::new("/d/report_images"));
    }
}
