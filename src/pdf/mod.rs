//! PDF processing layer
//!
//! PDFium-backed implementations of the pipeline's reader and writer seams.

mod reader;
mod writer;

pub use reader::{create_pdfium, ensure_pdf_header, PdfiumTextReader};
pub use writer::{PdfiumDocumentWriter, PdfiumPage};
