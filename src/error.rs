//! Error types for the pdfimg library.
//!
//! Every conversion returns `Result<_, ConvertError>`. The variants form a
//! closed taxonomy so the presentation layer can map each kind to its own
//! status text via [`ConvertError::kind`] instead of stringifying whatever a
//! dependency happened to return.
//!
//! Only the kinds whose detail comes straight from a decoding or rendering
//! library ([`ErrorKind::is_pass_through`]) show that detail to the user.

use std::path::PathBuf;
use thiserror::Error;

/// All errors returned by the pdfimg library.
#[derive(Debug, Error)]
pub enum ConvertError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// The selected folder contains no file with a supported image extension.
    #[error("No supported images found in '{dir}'\nSupported extensions: png, jpg, jpeg, bmp, tiff, gif.")]
    EmptyInput { dir: PathBuf },

    /// The source PDF is missing, unreadable, or not a parseable PDF.
    #[error("Cannot open PDF '{path}': {detail}")]
    OpenFailed { path: PathBuf, detail: String },

    // ── Conversion errors ─────────────────────────────────────────────────
    /// A source image could not be decoded or embedded while building the PDF.
    #[error("Failed to pack image '{path}' into the PDF: {detail}")]
    PackingFailed { path: PathBuf, detail: String },

    /// pdfium could not rasterise a page (1-indexed).
    #[error("Rendering failed for page {page}: {detail}")]
    RenderFailed { page: usize, detail: String },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// An output directory or file could not be created or written.
    #[error("I/O error on '{path}': {source}")]
    IoFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Engine errors ─────────────────────────────────────────────────────
    /// No usable pdfium library could be bound.
    #[error("PDF engine unavailable: {0}")]
    EngineUnavailable(String),

    // ── Job errors ────────────────────────────────────────────────────────
    /// A job was submitted while another one is still running.
    #[error("Another conversion is already running; wait for it to finish.")]
    Busy,

    /// Unexpected internal error (e.g. a worker panicked).
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ConvertError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ConvertError::IoFailed {
            path: path.into(),
            source,
        }
    }

    /// The taxonomy kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ConvertError::EmptyInput { .. } => ErrorKind::EmptyInput,
            ConvertError::OpenFailed { .. } => ErrorKind::OpenFailed,
            ConvertError::PackingFailed { .. } => ErrorKind::PackingFailed,
            ConvertError::RenderFailed { .. } => ErrorKind::RenderFailed,
            ConvertError::IoFailed { .. } => ErrorKind::IoFailed,
            ConvertError::InvalidConfig(_) => ErrorKind::InvalidConfig,
            ConvertError::EngineUnavailable(_) => ErrorKind::EngineUnavailable,
            ConvertError::Busy => ErrorKind::Busy,
            ConvertError::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Message for the completion report shown to the user.
    ///
    /// Pass-through kinds carry the library's own wording; the rest are
    /// described in fixed terms plus the path involved.
    pub fn user_message(&self) -> String {
        if self.kind().is_pass_through() {
            return self.to_string();
        }
        match self {
            ConvertError::EmptyInput { dir } => {
                format!("The folder contains no supported images:\n{}", dir.display())
            }
            ConvertError::IoFailed { path, source } => format!(
                "Could not write output at {} ({})",
                path.display(),
                source.kind()
            ),
            ConvertError::InvalidConfig(msg) => format!("Invalid settings: {msg}"),
            ConvertError::Busy => self.to_string(),
            _ => "An unexpected internal error occurred.".to_string(),
        }
    }
}

/// Coarse classification of a [`ConvertError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ErrorKind {
    EmptyInput,
    OpenFailed,
    PackingFailed,
    RenderFailed,
    IoFailed,
    InvalidConfig,
    EngineUnavailable,
    Busy,
    Internal,
}

impl ErrorKind {
    /// Short status-line text for this kind.
    pub fn status_text(self) -> &'static str {
        match self {
            ErrorKind::EmptyInput => "No images found",
            ErrorKind::OpenFailed => "Cannot open PDF",
            ErrorKind::PackingFailed => "Image could not be packed",
            ErrorKind::RenderFailed => "Page could not be rendered",
            ErrorKind::IoFailed => "Output could not be written",
            ErrorKind::InvalidConfig => "Invalid settings",
            ErrorKind::EngineUnavailable => "PDF engine missing",
            ErrorKind::Busy => "Busy",
            ErrorKind::Internal => "Conversion failed",
        }
    }

    /// Whether the underlying library message is shown verbatim.
    pub fn is_pass_through(self) -> bool {
        matches!(
            self,
            ErrorKind::OpenFailed
                | ErrorKind::PackingFailed
                | ErrorKind::RenderFailed
                | ErrorKind::EngineUnavailable
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_display() {
        let e = ConvertError::EmptyInput {
            dir: PathBuf::from("/scans"),
        };
        let msg = e.to_string();
        assert!(msg.contains("/scans"), "got: {msg}");
        assert!(msg.contains("gif"));
        assert_eq!(e.kind(), ErrorKind::EmptyInput);
    }

    #[test]
    fn render_failed_display() {
        let e = ConvertError::RenderFailed {
            page: 7,
            detail: "bitmap alloc".into(),
        };
        assert!(e.to_string().contains("page 7"));
        assert!(e.user_message().contains("bitmap alloc"));
    }

    #[test]
    fn io_failed_hides_os_wording_in_user_message() {
        let e = ConvertError::io(
            "/out/doc.pdf",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "os error 13"),
        );
        assert_eq!(e.kind(), ErrorKind::IoFailed);
        let msg = e.user_message();
        assert!(msg.contains("/out/doc.pdf"), "got: {msg}");
        assert!(!msg.contains("os error 13"), "got: {msg}");
    }

    #[test]
    fn pass_through_kinds() {
        assert!(ErrorKind::OpenFailed.is_pass_through());
        assert!(ErrorKind::PackingFailed.is_pass_through());
        assert!(!ErrorKind::EmptyInput.is_pass_through());
        assert!(!ErrorKind::Internal.is_pass_through());
    }

    #[test]
    fn internal_error_is_not_leaked() {
        let e = ConvertError::Internal("JoinError::Panic(..)".into());
        assert!(!e.user_message().contains("JoinError"));
        assert_eq!(e.kind().status_text(), "Conversion failed");
    }
}
