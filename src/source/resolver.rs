//! Source resolution for PDF data

use crate::error::{Error, Result};
use crate::pdf::ensure_pdf_header;
use base64::Engine;
use std::path::Path;

/// Resolved PDF data
#[derive(Debug)]
pub struct ResolvedPdf {
    pub data: Vec<u8>,
    pub source_name: String,
}

/// Read a PDF from disk
pub fn resolve_path<P: AsRef<Path>>(path: P) -> Result<ResolvedPdf> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(Error::PdfNotFound {
            path: path.display().to_string(),
        });
    }

    let data = std::fs::read(path).map_err(Error::Io)?;
    ensure_pdf_header(&data)?;

    Ok(ResolvedPdf {
        data,
        source_name: path.display().to_string(),
    })
}

/// Decode an inline base64 PDF
pub fn resolve_base64(base64_data: &str) -> Result<ResolvedPdf> {
    let engine = base64::engine::general_purpose::STANDARD;
    let data = engine.decode(base64_data.trim())?;

    if data.len() < 4 || &data[0..4] != b"%PDF" {
        return Err(Error::InvalidPdf {
            reason: "Decoded data is not a valid PDF file".to_string(),
        });
    }

    Ok(ResolvedPdf {
        data,
        source_name: "<base64>".to_string(),
    })
}
