//! Document pipeline: text layer → hard words → definitions → annotations

use crate::annotate::{AnnotatablePage, AnnotationOutcome, PageAnnotator};
use crate::config::{PdfiumConfig, PipelineConfig};
use crate::definition::{DefinitionResolver, LookupMiss};
use crate::difficulty::{Classifier, Verdict};
use crate::error::Result;
use crate::pdf::{create_pdfium, ensure_pdf_header, PdfiumDocumentWriter, PdfiumTextReader};
use regex::Regex;
use std::collections::HashSet;
use std::fmt;
use std::sync::{Arc, LazyLock};

static WORD_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[A-Za-z]+").expect("word pattern is valid"));

/// Read side of a document: the text layer, page by page
pub trait PageTextSource {
    fn page_count(&self) -> usize;

    /// Text layer of a page (0-indexed). Empty when the page has none.
    fn page_text(&self, index: usize) -> Result<String>;
}

/// Write side of a document: pages that accept annotations
pub trait AnnotatableDocument {
    type Page<'p>: AnnotatablePage
    where
        Self: 'p;

    fn page_count(&self) -> usize;

    /// Open a page (0-indexed) for annotation
    fn page(&mut self, index: usize) -> Result<Self::Page<'_>>;
}

/// Alphabetic token from a page's text layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    /// As found on the page; used for the visual search
    pub surface: String,
    /// Lower-cased; used for scoring, lookup and caching
    pub normalized: String,
}

impl Candidate {
    pub fn new(surface: &str) -> Self {
        Self {
            surface: surface.to_string(),
            normalized: surface.to_lowercase(),
        }
    }
}

/// Alphabetic runs of `text`, deduplicated by surface form in first-seen order
pub fn extract_candidates(text: &str) -> Vec<Candidate> {
    let mut seen = HashSet::new();
    WORD_PATTERN
        .find_iter(text)
        .map(|m| m.as_str())
        .filter(|word| seen.insert(*word))
        .map(Candidate::new)
        .collect()
}

/// Why a hard word was not annotated
#[derive(Debug, Clone, PartialEq)]
pub enum SkipReason {
    /// Dictionary lookup failed or had nothing
    NoDefinition(LookupMiss),
    /// In the text layer but not found on the rendered page
    NotLocated,
    /// Backend refused to create the annotation
    AnnotationFailed(String),
    /// Writer-side page could not be opened
    PageUnavailable(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::NoDefinition(miss) => write!(f, "no definition ({})", miss),
            SkipReason::NotLocated => f.write_str("found in text but not visually on page"),
            SkipReason::AnnotationFailed(reason) => write!(f, "annotation failed ({})", reason),
            SkipReason::PageUnavailable(reason) => write!(f, "page unavailable ({})", reason),
        }
    }
}

/// Outcome of one page
#[derive(Debug, Clone, PartialEq)]
pub struct PageReport {
    /// 1-indexed page number
    pub page: usize,
    /// Hard words selected for lookup, in processing order
    pub hard_words: Vec<String>,
    /// Words that received an annotation
    pub annotated: Vec<String>,
    pub skipped: Vec<(String, SkipReason)>,
}

impl PageReport {
    fn new(page: usize) -> Self {
        Self {
            page,
            hard_words: Vec::new(),
            annotated: Vec::new(),
            skipped: Vec::new(),
        }
    }
}

/// Outcome of a whole document
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentReport {
    pub total_pages: usize,
    pub pages: Vec<PageReport>,
}

impl DocumentReport {
    pub fn pages_processed(&self) -> usize {
        self.pages.len()
    }

    pub fn annotations_applied(&self) -> usize {
        self.pages.iter().map(|p| p.annotated.len()).sum()
    }
}

/// Annotated PDF and what was done to it
#[derive(Debug, Clone)]
pub struct AnnotatedDocument {
    pub data: Vec<u8>,
    pub report: DocumentReport,
}

/// Drives classification, lookup and annotation over a document
pub struct Pipeline {
    config: PipelineConfig,
    classifier: Arc<Classifier>,
    resolver: Arc<DefinitionResolver>,
    annotator: PageAnnotator,
    pdfium: PdfiumConfig,
}

impl Pipeline {
    pub fn new(
        config: PipelineConfig,
        classifier: Arc<Classifier>,
        resolver: Arc<DefinitionResolver>,
    ) -> Self {
        Self {
            config,
            classifier,
            resolver,
            annotator: PageAnnotator::default(),
            pdfium: PdfiumConfig::default(),
        }
    }

    pub fn with_pdfium(mut self, pdfium: PdfiumConfig) -> Self {
        self.pdfium = pdfium;
        self
    }

    /// Annotate a PDF given as bytes.
    ///
    /// Fails only when the source cannot be opened or the result cannot be
    /// serialized; per-word problems are skipped and reported.
    pub fn process(&self, data: &[u8]) -> Result<AnnotatedDocument> {
        ensure_pdf_header(data)?;

        let pdfium = create_pdfium(&self.pdfium)?;
        let reader = PdfiumTextReader::load(&pdfium, data)?;
        let mut writer = PdfiumDocumentWriter::load(&pdfium, data)?;

        let report = self.annotate_document(&reader, &mut writer);
        let data = writer.save_to_bytes()?;

        tracing::info!(
            pages = report.pages_processed(),
            annotations = report.annotations_applied(),
            "PDF processing complete"
        );

        Ok(AnnotatedDocument { data, report })
    }

    /// Walk pages up to the page cap, annotating `writer` from `reader`'s text
    pub fn annotate_document<R, W>(&self, reader: &R, writer: &mut W) -> DocumentReport
    where
        R: PageTextSource + ?Sized,
        W: AnnotatableDocument + ?Sized,
    {
        let total_pages = reader.page_count();
        let to_process = total_pages.min(self.config.max_pages);

        if writer.page_count() != total_pages {
            tracing::warn!(
                reader_pages = total_pages,
                writer_pages = writer.page_count(),
                "Reader and writer disagree on page count"
            );
        }
        tracing::info!(total_pages, to_process, "Pages to process");

        let pages = (0..to_process)
            .map(|index| self.annotate_page(index, to_process, reader, writer))
            .collect();

        DocumentReport { total_pages, pages }
    }

    fn annotate_page<R, W>(
        &self,
        index: usize,
        to_process: usize,
        reader: &R,
        writer: &mut W,
    ) -> PageReport
    where
        R: PageTextSource + ?Sized,
        W: AnnotatableDocument + ?Sized,
    {
        let page_number = index + 1;
        let mut report = PageReport::new(page_number);
        tracing::info!(page = page_number, total = to_process, "Processing page");

        let text = reader.page_text(index).unwrap_or_else(|e| {
            tracing::warn!(page = page_number, error = %e, "Text extraction failed, treating page as empty");
            String::new()
        });

        let hard_words = self.select_hard_words(&text);
        tracing::info!(page = page_number, count = hard_words.len(), "Found hard words");
        report.hard_words = hard_words.iter().map(|(c, _)| c.surface.clone()).collect();

        if hard_words.is_empty() {
            return report;
        }

        let mut page = match writer.page(index) {
            Ok(page) => page,
            Err(e) => {
                tracing::warn!(page = page_number, error = %e, "Cannot open page for annotation");
                let reason = SkipReason::PageUnavailable(e.to_string());
                report.skipped = hard_words
                    .into_iter()
                    .map(|(c, _)| (c.surface, reason.clone()))
                    .collect();
                return report;
            }
        };

        for (candidate, verdict) in hard_words {
            let reasons: Vec<&str> = verdict.reasons.iter().map(|r| r.as_str()).collect();
            tracing::info!(word = %candidate.surface, reasons = %reasons.join(", "), "Checking word");

            let definition = match self.resolver.resolve(&candidate.normalized) {
                Ok(definition) => definition,
                Err(miss) => {
                    tracing::warn!(word = %candidate.surface, reason = %miss, "No meaning found");
                    report
                        .skipped
                        .push((candidate.surface, SkipReason::NoDefinition(miss)));
                    continue;
                }
            };

            match self
                .annotator
                .annotate(&mut page, &candidate.surface, &definition)
            {
                Ok(AnnotationOutcome::Applied(_)) => {
                    tracing::info!(word = %candidate.surface, page = page_number, "Annotated word");
                    report.annotated.push(candidate.surface);
                }
                Ok(AnnotationOutcome::NotLocated) => {
                    tracing::warn!(word = %candidate.surface, page = page_number, "Word found in text but not visually on page");
                    report.skipped.push((candidate.surface, SkipReason::NotLocated));
                }
                Ok(AnnotationOutcome::EmptyDefinition) => {
                    tracing::warn!(word = %candidate.surface, "Empty definition");
                    report
                        .skipped
                        .push((candidate.surface, SkipReason::NoDefinition(LookupMiss::NoEntry)));
                }
                Err(e) => {
                    tracing::warn!(word = %candidate.surface, page = page_number, error = %e, "Annotation failed");
                    report
                        .skipped
                        .push((candidate.surface, SkipReason::AnnotationFailed(e.to_string())));
                }
            }
        }

        report
    }

    /// Candidates of at least `min_word_length` letters that classify as hard,
    /// capped at `max_words_per_page` in first-seen order
    pub fn select_hard_words(&self, text: &str) -> Vec<(Candidate, Verdict)> {
        extract_candidates(text)
            .into_iter()
            .filter(|candidate| {
                let long_enough = candidate.surface.len() >= self.config.min_word_length;
                if !long_enough {
                    tracing::trace!(word = %candidate.surface, "Skipping short word");
                }
                long_enough
            })
            .filter_map(|candidate| {
                let verdict = self.classifier.classify(&candidate.normalized);
                verdict.is_hard.then_some((candidate, verdict))
            })
            .take(self.config.max_words_per_page)
            .collect()
    }
}
