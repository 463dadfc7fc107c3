//! PDFium binding and text-layer reader

use crate::config::PdfiumConfig;
use crate::error::{Error, Result};
use crate::pipeline::PageTextSource;
use pdfium_render::prelude::*;

/// Fixed places searched for the PDFium shared library
const LIBRARY_DIRS: &[&str] = &["./", "/opt/pdfium/lib"];

/// Bind a fresh PDFium instance (PDFium is not thread-safe, so each run gets its own)
pub fn create_pdfium(config: &PdfiumConfig) -> Result<Pdfium> {
    let mut last_error = None;

    let configured = config.library_dir.iter().map(String::as_str);
    for dir in configured.chain(LIBRARY_DIRS.iter().copied()) {
        match Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(dir)) {
            Ok(bindings) => return Ok(Pdfium::new(bindings)),
            Err(e) => {
                tracing::trace!(dir, error = %e, "PDFium not found");
                last_error = Some(e);
            }
        }
    }

    let bindings = Pdfium::bind_to_system_library().map_err(|e| Error::Pdfium {
        reason: format!(
            "Failed to initialize PDFium: {} (last search error: {})",
            e,
            last_error.map(|e| e.to_string()).unwrap_or_default()
        ),
    })?;

    Ok(Pdfium::new(bindings))
}

/// Cheap sniff before handing bytes to PDFium
pub fn ensure_pdf_header(data: &[u8]) -> Result<()> {
    if data.len() < 4 || &data[0..4] != b"%PDF" {
        return Err(Error::InvalidPdf {
            reason: "Not a valid PDF file".to_string(),
        });
    }
    Ok(())
}

/// Open a document, mapping load failures to a fatal source error
pub(crate) fn load_document<'a>(pdfium: &'a Pdfium, data: &'a [u8]) -> Result<PdfDocument<'a>> {
    pdfium
        .load_pdf_from_byte_slice(data, None)
        .map_err(|e| match e {
            PdfiumError::PdfiumLibraryInternalError(PdfiumInternalError::PasswordError) => {
                Error::PasswordRequired
            }
            _ => Error::InvalidPdf {
                reason: format!("{}", e),
            },
        })
}

/// Convert a 0-based page index to PDFium's index type
pub(crate) fn page_index(index: usize, total: usize) -> Result<PdfPageIndex> {
    PdfPageIndex::try_from(index)
        .ok()
        .filter(|_| index < total)
        .ok_or(Error::PageOutOfBounds {
            page: (index + 1) as u32,
            total: total as u32,
        })
}

/// Text layer of a loaded document; pages are extracted on demand
pub struct PdfiumTextReader<'a> {
    document: PdfDocument<'a>,
}

impl<'a> PdfiumTextReader<'a> {
    pub fn load(pdfium: &'a Pdfium, data: &'a [u8]) -> Result<Self> {
        Ok(Self {
            document: load_document(pdfium, data)?,
        })
    }
}

impl PageTextSource for PdfiumTextReader<'_> {
    fn page_count(&self) -> usize {
        self.document.pages().len() as usize
    }

    fn page_text(&self, index: usize) -> Result<String> {
        let index = page_index(index, self.page_count())?;
        let page = self.document.pages().get(index).map_err(|e| Error::Pdfium {
            reason: format!("Failed to get page {}: {}", index as usize + 1, e),
        })?;

        // A page without a text layer reads as empty
        Ok(page.text().map(|text| text.all()).unwrap_or_default())
    }
}
