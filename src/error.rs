//! Error types for pdf-gloss

use thiserror::Error;

/// Result type alias for pdf-gloss
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for pdf-gloss
#[derive(Error, Debug)]
pub enum Error {
    /// PDF file not found
    #[error("PDF not found: {path}")]
    PdfNotFound { path: String },

    /// Invalid PDF file
    #[error("Invalid PDF file: {reason}")]
    InvalidPdf { reason: String },

    /// PDF is password protected
    #[error("PDF is password protected")]
    PasswordRequired,

    /// Page out of bounds
    #[error("Page {page} out of bounds (total: {total})")]
    PageOutOfBounds { page: u32, total: u32 },

    /// Base64 decode error
    #[error("Invalid base64 data: {0}")]
    Base64Decode(#[from] base64::DecodeError),

    /// HTTP client error
    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// PDFium error
    #[error("PDFium error: {reason}")]
    Pdfium { reason: String },

    /// Configuration could not be loaded or is inconsistent
    #[error("Invalid configuration: {reason}")]
    InvalidConfig { reason: String },

    /// Word list could not be read
    #[error("Failed to load word list {path}: {reason}")]
    Lexicon { path: String, reason: String },

    /// Path access denied (outside allowed resource directories)
    #[error("Path access denied: {path}")]
    PathAccessDenied { path: String },

    /// Blocking task failed to complete
    #[error("Background task failed: {reason}")]
    Task { reason: String },
}

impl Error {
    /// Return a sanitized error message safe to send to clients.
    /// Internal details (paths, library errors) are omitted.
    /// Full details should be logged via tracing before calling this.
    pub fn client_message(&self) -> String {
        match self {
            Error::PdfNotFound { .. } => "PDF not found".to_string(),
            Error::InvalidPdf { .. } => "Invalid PDF file".to_string(),
            Error::PasswordRequired => "PDF is password protected".to_string(),
            Error::PageOutOfBounds { page, total } => {
                format!("Page {} out of bounds (total: {})", page, total)
            }
            Error::Base64Decode(_) => "Invalid base64 data".to_string(),
            Error::HttpClient(_) => "Dictionary client unavailable".to_string(),
            Error::Io(_) => "I/O error".to_string(),
            Error::Pdfium { .. } => "PDF processing error".to_string(),
            Error::InvalidConfig { .. } => "Server misconfigured".to_string(),
            Error::Lexicon { .. } => "Word list unavailable".to_string(),
            Error::PathAccessDenied { .. } => "Access denied".to_string(),
            Error::Task { .. } => "Internal error".to_string(),
        }
    }
}
