//! Pipeline integration tests through in-memory PDF and dictionary fakes

use pdf_gloss::annotate::{locate_in_glyphs, AnnotatablePage, Bounds, Color, Glyph, Note};
use pdf_gloss::config::PipelineConfig;
use pdf_gloss::definition::{
    parse_entries, DefinitionResolver, DictionaryClient, DictionaryEntry, LookupMiss,
    UnboundedStore,
};
use pdf_gloss::pipeline::{AnnotatableDocument, PageTextSource};
use pdf_gloss::{Classifier, DocumentReport, Error, Pipeline, SkipReason};
use pretty_assertions::assert_eq;
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

// ============================================================================
// Fakes
// ============================================================================

/// Defines every word except those listed as unknown, counting lookups per word
#[derive(Default)]
struct FakeDictionary {
    unknown: HashSet<String>,
    calls: Mutex<HashMap<String, usize>>,
    total: AtomicUsize,
}

impl FakeDictionary {
    fn without(words: &[&str]) -> Self {
        Self {
            unknown: words.iter().map(|w| w.to_string()).collect(),
            ..Self::default()
        }
    }

    fn calls_for(&self, word: &str) -> usize {
        self.calls.lock().unwrap().get(word).copied().unwrap_or(0)
    }

    fn total_calls(&self) -> usize {
        self.total.load(Ordering::SeqCst)
    }
}

impl DictionaryClient for FakeDictionary {
    fn fetch(&self, word: &str) -> Result<Vec<DictionaryEntry>, LookupMiss> {
        self.total.fetch_add(1, Ordering::SeqCst);
        *self.calls.lock().unwrap().entry(word.to_string()).or_default() += 1;

        if self.unknown.contains(word) {
            return Err(LookupMiss::Status(404));
        }
        let body = format!(
            r#"[{{"word": "{word}", "meanings": [{{"definitions": [{{"definition": "Meaning of {word}."}}]}}]}}]"#
        );
        parse_entries(body.as_bytes())
    }
}

/// Text layer per page, recording which pages were read
struct FakeReader {
    pages: Vec<String>,
    reads: RefCell<Vec<usize>>,
}

impl FakeReader {
    fn new<S: Into<String>>(pages: impl IntoIterator<Item = S>) -> Self {
        Self {
            pages: pages.into_iter().map(Into::into).collect(),
            reads: RefCell::new(Vec::new()),
        }
    }
}

impl PageTextSource for FakeReader {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn page_text(&self, index: usize) -> pdf_gloss::Result<String> {
        self.reads.borrow_mut().push(index);
        Ok(self.pages[index].clone())
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Mark {
    Underline(Bounds, Color),
    Highlight(Bounds, Color, Note),
}

#[derive(Default)]
struct FakePage {
    glyphs: Vec<Glyph>,
    marks: Vec<Mark>,
    reject_annotations: bool,
}

impl FakePage {
    /// Lay `text` out on one line, 10 units per character
    fn rendering(text: &str) -> Self {
        let glyphs = text
            .chars()
            .enumerate()
            .map(|(i, ch)| Glyph {
                ch,
                bounds: Bounds::new(i as f32 * 10.0, 100.0, i as f32 * 10.0 + 9.0, 112.0),
            })
            .collect();
        Self {
            glyphs,
            ..Self::default()
        }
    }

    fn highlighted_notes(&self) -> Vec<&Note> {
        self.marks
            .iter()
            .filter_map(|mark| match mark {
                Mark::Highlight(_, _, note) => Some(note),
                Mark::Underline(..) => None,
            })
            .collect()
    }
}

impl AnnotatablePage for FakePage {
    fn locate(&self, needle: &str) -> Option<Bounds> {
        locate_in_glyphs(&self.glyphs, needle)
    }

    fn add_underline(&mut self, bounds: Bounds, stroke: Color) -> pdf_gloss::Result<()> {
        if self.reject_annotations {
            return Err(Error::Pdfium {
                reason: "annotation rejected".to_string(),
            });
        }
        self.marks.push(Mark::Underline(bounds, stroke));
        Ok(())
    }

    fn add_highlight(&mut self, bounds: Bounds, color: Color, note: &Note) -> pdf_gloss::Result<()> {
        self.marks.push(Mark::Highlight(bounds, color, note.clone()));
        Ok(())
    }
}

#[derive(Default)]
struct FakeWriter {
    pages: Vec<FakePage>,
    unavailable: HashSet<usize>,
}

impl FakeWriter {
    fn rendering<S: AsRef<str>>(pages: impl IntoIterator<Item = S>) -> Self {
        Self {
            pages: pages
                .into_iter()
                .map(|text| FakePage::rendering(text.as_ref()))
                .collect(),
            ..Self::default()
        }
    }

    fn mark_count(&self) -> usize {
        self.pages.iter().map(|p| p.marks.len()).sum()
    }
}

impl AnnotatableDocument for FakeWriter {
    type Page<'p>
        = &'p mut FakePage
    where
        Self: 'p;

    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn page(&mut self, index: usize) -> pdf_gloss::Result<Self::Page<'_>> {
        if self.unavailable.contains(&index) {
            return Err(Error::Pdfium {
                reason: format!("page {} is damaged", index + 1),
            });
        }
        Ok(&mut self.pages[index])
    }
}

// ============================================================================
// Helpers
// ============================================================================

fn pipeline_with(dictionary: Arc<FakeDictionary>) -> Pipeline {
    Pipeline::new(
        PipelineConfig::default(),
        Arc::new(Classifier::default()),
        Arc::new(DefinitionResolver::new(
            dictionary,
            Arc::new(UnboundedStore::new()),
        )),
    )
}

/// Same text for the text layer and the rendered page
fn run(pipeline: &Pipeline, pages: &[&str]) -> (DocumentReport, FakeWriter) {
    let reader = FakeReader::new(pages.iter().copied());
    let mut writer = FakeWriter::rendering(pages);
    let report = pipeline.annotate_document(&reader, &mut writer);
    (report, writer)
}

// ============================================================================
// Tests
// ============================================================================

#[test]
fn test_hard_words_get_underline_highlight_and_note() {
    let pipeline = pipeline_with(Arc::new(FakeDictionary::default()));
    let (report, writer) = run(&pipeline, &["The mitochondria is small."]);

    assert_eq!(report.total_pages, 1);
    assert_eq!(report.pages_processed(), 1);
    assert_eq!(report.pages[0].annotated, vec!["mitochondria"]);
    assert_eq!(report.annotations_applied(), 1);

    let page = &writer.pages[0];
    let expected = Bounds::new(40.0, 100.0, 159.0, 112.0);
    assert_eq!(
        page.marks,
        vec![
            Mark::Underline(expected, Color::BLACK),
            Mark::Highlight(
                expected,
                Color::opaque(255, 242, 153),
                Note {
                    title: "Meaning".to_string(),
                    body: "Mitochondria\n• Meaning of mitochondria.".to_string(),
                }
            ),
        ]
    );
}

#[test]
fn test_short_words_never_annotated() {
    let dictionary = Arc::new(FakeDictionary::default());
    let pipeline = pipeline_with(dictionary.clone());
    let (report, writer) = run(&pipeline, &["rhythm knight rhythm"]);

    assert!(report.pages[0].hard_words.is_empty());
    assert_eq!(report.annotations_applied(), 0);
    assert_eq!(writer.mark_count(), 0);
    assert_eq!(dictionary.total_calls(), 0);
}

#[test]
fn test_empty_page_is_not_an_error() {
    let pipeline = pipeline_with(Arc::new(FakeDictionary::default()));
    let (report, writer) = run(&pipeline, &["", "   ", "psychology"]);

    assert_eq!(report.pages_processed(), 3);
    assert!(report.pages[0].annotated.is_empty());
    assert!(report.pages[0].skipped.is_empty());
    assert!(report.pages[1].annotated.is_empty());
    assert_eq!(report.pages[2].annotated, vec!["psychology"]);
    assert_eq!(writer.pages[0].marks.len(), 0);
}

#[test]
fn test_word_not_located_is_skipped_rest_processed() {
    let pipeline = pipeline_with(Arc::new(FakeDictionary::default()));
    // Text layer has a word the rendered page lacks
    let reader = FakeReader::new(["mitochondria psychology"]);
    let mut writer = FakeWriter::rendering(["psychology"]);

    let report = pipeline.annotate_document(&reader, &mut writer);
    let page = &report.pages[0];

    assert_eq!(page.annotated, vec!["psychology"]);
    assert_eq!(
        page.skipped,
        vec![("mitochondria".to_string(), SkipReason::NotLocated)]
    );
    assert_eq!(writer.mark_count(), 2);
}

#[test]
fn test_lookup_failure_is_skipped() {
    let pipeline = pipeline_with(Arc::new(FakeDictionary::without(&["serendipity"])));
    let (report, writer) = run(&pipeline, &["serendipity psychology"]);
    let page = &report.pages[0];

    assert_eq!(page.annotated, vec!["psychology"]);
    assert_eq!(
        page.skipped,
        vec![(
            "serendipity".to_string(),
            SkipReason::NoDefinition(LookupMiss::Status(404))
        )]
    );
    assert_eq!(writer.pages[0].highlighted_notes().len(), 1);
}

#[test]
fn test_page_cap_limits_reads() {
    let dictionary = Arc::new(FakeDictionary::default());
    let pipeline = pipeline_with(dictionary.clone());
    let pages = vec!["mitochondria"; 600];

    let reader = FakeReader::new(pages.iter().copied());
    let mut writer = FakeWriter::rendering(&pages);
    let report = pipeline.annotate_document(&reader, &mut writer);

    assert_eq!(report.total_pages, 600);
    assert_eq!(report.pages_processed(), 500);
    assert_eq!(report.pages.last().map(|p| p.page), Some(500));

    let reads = reader.reads.borrow();
    assert_eq!(reads.len(), 500);
    assert!(reads.iter().all(|&index| index < 500));

    assert!(writer.pages[499].marks.len() == 2);
    assert!(writer.pages[500..].iter().all(|p| p.marks.is_empty()));
}

#[test]
fn test_repeated_word_is_looked_up_once() {
    let dictionary = Arc::new(FakeDictionary::default());
    let pipeline = pipeline_with(dictionary.clone());
    let (report, _) = run(
        &pipeline,
        &["mitochondria", "Mitochondria again", "more mitochondria"],
    );

    assert_eq!(report.annotations_applied(), 3);
    assert_eq!(dictionary.calls_for("mitochondria"), 1);
}

#[test]
fn test_word_cap_keeps_first_seen_order() {
    let words: Vec<String> = ('a'..='y').map(|c| format!("vocabulary{c}")).collect();
    let text = words.join(" ");

    let pipeline = pipeline_with(Arc::new(FakeDictionary::default()));
    let (report, writer) = run(&pipeline, &[text.as_str()]);
    let page = &report.pages[0];

    assert_eq!(page.hard_words.len(), 20);
    assert_eq!(page.annotated, words[..20].to_vec());
    assert_eq!(writer.pages[0].highlighted_notes().len(), 20);
}

#[test]
fn test_duplicates_annotated_once_per_page() {
    let pipeline = pipeline_with(Arc::new(FakeDictionary::default()));
    let (report, writer) = run(&pipeline, &["psychology and psychology and psychology"]);

    assert_eq!(report.pages[0].annotated, vec!["psychology"]);
    assert_eq!(writer.pages[0].marks.len(), 2);
}

#[test]
fn test_custom_caps() {
    let pipeline = Pipeline::new(
        PipelineConfig {
            max_pages: 2,
            max_words_per_page: 1,
            min_word_length: 7,
        },
        Arc::new(Classifier::default()),
        Arc::new(DefinitionResolver::new(
            Arc::new(FakeDictionary::default()),
            Arc::new(UnboundedStore::new()),
        )),
    );
    let (report, _) = run(
        &pipeline,
        &["psychology mitochondria", "algorithm", "chrysanthemum"],
    );

    assert_eq!(report.pages_processed(), 2);
    assert_eq!(report.pages[0].annotated, vec!["psychology"]);
    assert_eq!(report.pages[1].annotated, vec!["algorithm"]);
}

#[test]
fn test_unavailable_writer_page_skips_its_words() {
    let pipeline = pipeline_with(Arc::new(FakeDictionary::default()));
    let reader = FakeReader::new(["psychology", "mitochondria"]);
    let mut writer = FakeWriter::rendering(["psychology", "mitochondria"]);
    writer.unavailable.insert(0);

    let report = pipeline.annotate_document(&reader, &mut writer);

    assert!(report.pages[0].annotated.is_empty());
    assert!(matches!(
        report.pages[0].skipped.as_slice(),
        [(word, SkipReason::PageUnavailable(_))] if word == "psychology"
    ));
    assert_eq!(report.pages[1].annotated, vec!["mitochondria"]);
}

#[test]
fn test_backend_failure_is_skipped() {
    let pipeline = pipeline_with(Arc::new(FakeDictionary::default()));
    let reader = FakeReader::new(["psychology"]);
    let mut writer = FakeWriter::rendering(["psychology"]);
    writer.pages[0].reject_annotations = true;

    let report = pipeline.annotate_document(&reader, &mut writer);

    assert!(matches!(
        report.pages[0].skipped.as_slice(),
        [(_, SkipReason::AnnotationFailed(_))]
    ));
    assert_eq!(report.annotations_applied(), 0);
}

#[test]
fn test_invalid_bytes_fail_the_run() {
    let pipeline = pipeline_with(Arc::new(FakeDictionary::default()));
    assert!(matches!(
        pipeline.process(b"this is not a pdf"),
        Err(Error::InvalidPdf { .. })
    ));
    assert!(matches!(pipeline.process(b""), Err(Error::InvalidPdf { .. })));
}
