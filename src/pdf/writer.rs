//! PDFium document writer: visual search and annotation creation

use super::reader::{load_document, page_index};
use crate::annotate::{locate_in_glyphs, AnnotatablePage, Bounds, Color, Glyph, Note};
use crate::error::{Error, Result};
use crate::pipeline::AnnotatableDocument;
use pdfium_render::prelude::*;

fn pdfium_error(action: &str) -> impl Fn(PdfiumError) -> Error + '_ {
    move |e| Error::Pdfium {
        reason: format!("Failed to {}: {}", action, e),
    }
}

fn to_rect(bounds: Bounds) -> PdfRect {
    PdfRect::new_from_values(bounds.bottom, bounds.left, bounds.top, bounds.right)
}

fn to_color(color: Color) -> PdfColor {
    PdfColor::new(color.red, color.green, color.blue, color.alpha)
}

/// Writable copy of the source document
pub struct PdfiumDocumentWriter<'a> {
    document: PdfDocument<'a>,
}

impl<'a> PdfiumDocumentWriter<'a> {
    pub fn load(pdfium: &'a Pdfium, data: &'a [u8]) -> Result<Self> {
        Ok(Self {
            document: load_document(pdfium, data)?,
        })
    }

    /// Serialize the document with every annotation added so far
    pub fn save_to_bytes(&self) -> Result<Vec<u8>> {
        self.document
            .save_to_bytes()
            .map_err(pdfium_error("save annotated PDF"))
    }
}

impl<'a> AnnotatableDocument for PdfiumDocumentWriter<'a> {
    type Page<'p>
        = PdfiumPage<'a>
    where
        Self: 'p;

    fn page_count(&self) -> usize {
        self.document.pages().len() as usize
    }

    fn page(&mut self, index: usize) -> Result<Self::Page<'_>> {
        let index = page_index(index, self.page_count())?;
        let page = self
            .document
            .pages()
            .get(index)
            .map_err(pdfium_error("open page"))?;
        Ok(PdfiumPage::new(page))
    }
}

/// A page opened for annotation, with its glyph layout captured up front
pub struct PdfiumPage<'a> {
    page: PdfPage<'a>,
    glyphs: Vec<Glyph>,
}

impl<'a> PdfiumPage<'a> {
    fn new(page: PdfPage<'a>) -> Self {
        let glyphs = page
            .text()
            .map(|text| collect_glyphs(&text))
            .unwrap_or_default();
        Self { page, glyphs }
    }
}

/// Glyphs in text-layer order. Segment breaks become a blank glyph so a
/// search never matches across two separate runs of text.
fn collect_glyphs(text: &PdfPageText) -> Vec<Glyph> {
    let blank = Glyph {
        ch: ' ',
        bounds: Bounds::new(0.0, 0.0, 0.0, 0.0),
    };
    let mut glyphs = Vec::new();

    for segment in text.segments().iter() {
        if let Ok(chars) = segment.chars() {
            for char_result in chars.iter() {
                if let Some(c) = char_result.unicode_char() {
                    if let Ok(bounds) = char_result.loose_bounds() {
                        glyphs.push(Glyph {
                            ch: c,
                            bounds: Bounds::new(
                                bounds.left().value,
                                bounds.bottom().value,
                                bounds.right().value,
                                bounds.top().value,
                            ),
                        });
                    }
                }
            }
        }
        glyphs.push(blank);
    }

    glyphs
}

impl AnnotatablePage for PdfiumPage<'_> {
    fn locate(&self, needle: &str) -> Option<Bounds> {
        locate_in_glyphs(&self.glyphs, needle)
    }

    fn add_underline(&mut self, bounds: Bounds, stroke: Color) -> Result<()> {
        let rect = to_rect(bounds);
        let mut annotation = self
            .page
            .annotations_mut()
            .create_underline_annotation()
            .map_err(pdfium_error("create underline"))?;

        annotation
            .attachment_points_mut()
            .create_attachment_point_at_end(PdfQuadPoints::from_rect(&rect))
            .map_err(pdfium_error("set underline position"))?;
        annotation
            .set_bounds(rect)
            .map_err(pdfium_error("set underline bounds"))?;
        annotation
            .set_stroke_color(to_color(stroke))
            .map_err(pdfium_error("set underline colour"))?;

        Ok(())
    }

    fn add_highlight(&mut self, bounds: Bounds, color: Color, note: &Note) -> Result<()> {
        let rect = to_rect(bounds);
        let mut annotation = self
            .page
            .annotations_mut()
            .create_highlight_annotation()
            .map_err(pdfium_error("create highlight"))?;

        annotation
            .attachment_points_mut()
            .create_attachment_point_at_end(PdfQuadPoints::from_rect(&rect))
            .map_err(pdfium_error("set highlight position"))?;
        annotation
            .set_bounds(rect)
            .map_err(pdfium_error("set highlight bounds"))?;
        annotation
            .set_stroke_color(to_color(color))
            .map_err(pdfium_error("set highlight colour"))?;
        annotation
            .set_creator(&note.title)
            .map_err(pdfium_error("set note title"))?;
        annotation
            .set_contents(&note.body)
            .map_err(pdfium_error("set note text"))?;

        Ok(())
    }
}
