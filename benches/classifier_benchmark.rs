//! Performance benchmarks for word classification
//!
//! Run with: `cargo bench`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use pdf_gloss::config::PipelineConfig;
use pdf_gloss::definition::{
    DefinitionResolver, DictionaryClient, DictionaryEntry, LookupMiss, UnboundedStore,
};
use pdf_gloss::pipeline::extract_candidates;
use pdf_gloss::{Classifier, Pipeline};
use std::sync::Arc;

const PARAGRAPH: &str = "The mitochondria is the powerhouse of the cell. Photosynthesis \
    converts light energy into chemical energy, while cellular respiration releases \
    that energy. Chrysanthemums and rhododendrons flourish in acidic soil; their \
    physiology is surprisingly idiosyncratic. Serendipity, not methodology, explains \
    many breakthroughs in psychology and epistemology.";

struct NoDictionary;

impl DictionaryClient for NoDictionary {
    fn fetch(&self, _word: &str) -> Result<Vec<DictionaryEntry>, LookupMiss> {
        Err(LookupMiss::NoEntry)
    }
}

/// Benchmark single-word classification
fn bench_classify(c: &mut Criterion) {
    let classifier = Classifier::default();
    let mut group = c.benchmark_group("classify");

    for word in ["cat", "people", "mitochondria", "chrysanthemum", "idiosyncratic"] {
        group.bench_with_input(BenchmarkId::from_parameter(word), word, |b, word| {
            b.iter(|| classifier.classify(black_box(word)));
        });
    }

    group.finish();
}

/// Benchmark tokenizing page text
fn bench_extract_candidates(c: &mut Criterion) {
    let page = PARAGRAPH.repeat(20);

    let mut group = c.benchmark_group("extract_candidates");
    group.throughput(Throughput::Bytes(page.len() as u64));
    group.bench_function("page_text", |b| {
        b.iter(|| extract_candidates(black_box(&page)));
    });
    group.finish();
}

/// Benchmark the per-page selection step (tokenize, filter, classify, cap)
fn bench_select_hard_words(c: &mut Criterion) {
    let pipeline = Pipeline::new(
        PipelineConfig::default(),
        Arc::new(Classifier::default()),
        Arc::new(DefinitionResolver::new(
            Arc::new(NoDictionary),
            Arc::new(UnboundedStore::new()),
        )),
    );

    let mut group = c.benchmark_group("select_hard_words");
    for repeats in [1, 10, 50] {
        let page = PARAGRAPH.repeat(repeats);
        group.throughput(Throughput::Bytes(page.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(repeats), &page, |b, page| {
            b.iter(|| pipeline.select_hard_words(black_box(page)));
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_classify,
    bench_extract_candidates,
    bench_select_hard_words
);
criterion_main!(benches);
