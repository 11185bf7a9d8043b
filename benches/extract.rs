//! Benchmarks for the extraction and analysis front of the pipeline.

use criterion::{Criterion, black_box, criterion_group, criterion_main};

use dugout::analyze::Analyzer;
use dugout::extract::Extractor;
use dugout::resolve::{edit_distance, similarity};

const QUESTIONS: &[&str] = &[
    "How many goals has Luke Bangs scored?",
    "How many goals did the 2nd team score in 2017/18?",
    "Compare goals for Luke Bangs and Sam Hartley since 2020",
    "What is the longest unbeaten run of the 1s at home in the league?",
    "Show goals per season for Ruud van Nistel excluding the 3s",
];

fn bench_extract(c: &mut Criterion) {
    let extractor = Extractor::new();

    c.bench_function("extract_short_question", |bench| {
        bench.iter(|| black_box(extractor.extract(black_box(QUESTIONS[0]))))
    });

    c.bench_function("extract_question_batch", |bench| {
        bench.iter(|| {
            for question in QUESTIONS {
                black_box(extractor.extract(black_box(question)));
            }
        })
    });
}

fn bench_analyze(c: &mut Criterion) {
    let extractor = Extractor::new();
    let analyzer = Analyzer::new();
    let extractions: Vec<_> = QUESTIONS
        .iter()
        .map(|q| (*q, extractor.extract(q)))
        .collect();

    c.bench_function("analyze_question_batch", |bench| {
        bench.iter(|| {
            for (question, extraction) in &extractions {
                black_box(analyzer.analyze(question, extraction, None));
            }
        })
    });
}

fn bench_similarity(c: &mut Criterion) {
    c.bench_function("edit_distance_name", |bench| {
        bench.iter(|| black_box(edit_distance(black_box("Luke Bnags"), black_box("Luke Bangs"))))
    });

    c.bench_function("similarity_stat", |bench| {
        bench.iter(|| black_box(similarity(black_box("goasl"), black_box("Goals"))))
    });
}

criterion_group!(benches, bench_extract, bench_analyze, bench_similarity);
criterion_main!(benches);
