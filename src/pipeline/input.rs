//! Source PDF validation, done before the engine is touched.
//!
//! Checking existence, read permission and the `%PDF` magic up front means a
//! wrong file (a text file renamed to `.pdf`, say) is rejected without binding
//! pdfium and before any output directory is created.

use crate::error::ConvertError;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::debug;

/// PDF files start with this marker (optionally after a few junk bytes,
/// which pdfium tolerates; we only look at the first 1 KiB).
const PDF_MAGIC: &[u8] = b"%PDF";
const MAGIC_WINDOW: usize = 1024;

/// Validate that `path` is a readable file that looks like a PDF.
pub fn validate_pdf(path: &Path) -> Result<PathBuf, ConvertError> {
    let open_failed = |detail: String| ConvertError::OpenFailed {
        path: path.to_path_buf(),
        detail,
    };

    if !path.exists() {
        return Err(open_failed("file not found".into()));
    }
    if path.is_dir() {
        return Err(open_failed("is a directory".into()));
    }

    let mut f = match std::fs::File::open(path) {
        Ok(f) => f,
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(open_failed("permission denied".into()));
        }
        Err(e) => return Err(open_failed(e.to_string())),
    };

    let mut head = Vec::with_capacity(MAGIC_WINDOW);
    f.by_ref()
        .take(MAGIC_WINDOW as u64)
        .read_to_end(&mut head)
        .map_err(|e| open_failed(e.to_string()))?;

    if !head.windows(PDF_MAGIC.len()).any(|w| w == PDF_MAGIC) {
        let shown = &head[..head.len().min(4)];
        return Err(open_failed(format!(
            "not a PDF file (first bytes: {shown:?})"
        )));
    }

    debug!("Validated PDF: {}", path.display());
    Ok(path.to_path_buf())
}
