use criterion::{criterion_group, criterion_main, Criterion};
use cranrank_core::builder::build;
use cranrank_core::config::RunConfig;
use cranrank_core::query::QueryParser;
use cranrank_core::search::Searcher;
use cranrank_core::{Analyzer, Document, Similarity};

const WORDS: &[&str] = &[
    "boundary", "layer", "shock", "wave", "flutter", "panel", "wing", "slipstream", "heat", "transfer",
    "hypersonic", "flow", "plate", "laminar", "turbulent", "pressure", "drag", "lift", "nozzle", "mach",
];

fn synthetic_corpus(n: usize) -> Vec<Document> {
    (0..n)
        .map(|i| {
            let pick = |offset: usize, len: usize| -> String {
                (0..len).map(|j| WORDS[(i * 7 + j * 3 + offset) % WORDS.len()]).collect::<Vec<_>>().join(" ")
            };
            Document {
                id: (i + 1).to_string(),
                title: pick(0, 6),
                author: format!("author{},a.", i % 50),
                bibliography: format!("j. ae. scs. {}, 19{}.", i % 30, 50 + i % 20),
                body: pick(5, 120),
            }
        })
        .collect()
}

fn bench_analyze(c: &mut Criterion) {
    let text = synthetic_corpus(1)[0].body.clone();
    c.bench_function("analyze_english_body", |b| b.iter(|| Analyzer::English.analyze(&text)));
}

fn bench_search(c: &mut Criterion) {
    let docs = synthetic_corpus(1400);
    let index = build(&docs, Analyzer::English).expect("index builds");
    let parser = QueryParser::new(Analyzer::English, RunConfig::default().field_weights());
    let query = parser.parse("laminar boundary layer on a flat plate at high mach").expect("query parses");
    for code in 1..=5 {
        let sim = Similarity::from_code(code);
        let searcher = Searcher::new(&index, sim);
        c.bench_function(&format!("search_top50_{sim}"), |b| b.iter(|| searcher.search(&query, 50)));
    }
}

criterion_group!(benches, bench_analyze, bench_search);
criterion_main!(benches);
