use cranrank_core::config::RunConfig;
use cranrank_core::persist::{load_index, IndexPaths};
use cranrank_core::pipeline::{index_corpus, run, run_queries};
use cranrank_core::run::read_run;
use cranrank_core::{Analyzer, Error, Similarity};
use std::fs;
use std::io::BufReader;
use std::path::Path;
use tempfile::tempdir;

const CORPUS: &str = "\
.I 1
.T
experimental investigation of the aerodynamics of a wing in a slipstream
.A
brenckman,m.
.B
j. ae. scs. 25, 1958, 324.
.W
an experimental study of a wing in a propeller slipstream was
made in order to determine the spanwise distribution of the lift
.I 2
.T
simple shear flow past a flat plate in an incompressible fluid
.A
ting-yili
.B
department of aeronautical engineering, rensselaer polytechnic institute
.W
in the study of the boundary layer over a flat plate the shear flow is considered
.I 3
.T
the boundary layer in simple shear flow past a flat plate
.A
m. b. glauert
.B
department of mathematics, university of manchester
.W
.I 4
.T
approximate solutions of the incompressible laminar boundary layer equations
.A
mirels,h.
.W
real-gas effects on hypersonic nozzle flows
";

const QUERIES: &str = "\
.I 001
.W
what similarity laws must be obeyed when constructing aeroelastic models
of heated high speed aircraft ?
.I 002
.W
what are the structural and aeroelastic problems associated with flight
of high speed aircraft ?
.I 004
.W
boundary layer over a flat plate ?
.I 008
.W
propeller slipstream effect on wing lift ?
";

fn setup(dir: &Path) -> RunConfig {
    fs::write(dir.join("cran.all.1400"), CORPUS).unwrap();
    fs::write(dir.join("cran.qry"), QUERIES).unwrap();
    RunConfig {
        corpus: dir.join("cran.all.1400"),
        queries: dir.join("cran.qry"),
        index_dir: dir.join("index"),
        output_dir: dir.join("output"),
        ..RunConfig::default()
    }
}

fn entries(path: &Path) -> Vec<cranrank_core::run::RunEntry> {
    read_run(BufReader::new(fs::File::open(path).unwrap())).unwrap()
}

#[test]
fn full_run_writes_trec_lines() {
    let dir = tempdir().unwrap();
    let cfg = setup(dir.path());
    let (indexed, queried) = run(&cfg).unwrap();

    assert_eq!(indexed.num_docs, 4);
    assert_eq!(queried.queries, 4);
    assert_eq!(queried.failed, 0);
    assert_eq!(queried.output, dir.path().join("output/output-en-bm25.txt"));

    let lines = entries(&queried.output);
    assert_eq!(lines.len(), queried.lines);
    // queries 1 and 2 match nothing in this tiny collection
    assert!(lines.iter().all(|e| e.query_number == 3 || e.query_number == 4));
    assert!(lines.iter().all(|e| e.run_tag == "STANDARD"));

    let q3: Vec<_> = lines.iter().filter(|e| e.query_number == 3).collect();
    assert!(["2", "3"].contains(&q3[0].doc_id.as_str()));
    for (i, e) in q3.iter().enumerate() {
        assert_eq!(e.rank, i);
    }
    let q4: Vec<_> = lines.iter().filter(|e| e.query_number == 4).collect();
    assert_eq!(q4[0].doc_id, "1");
}

#[test]
fn reruns_are_identical() {
    let dir = tempdir().unwrap();
    let cfg = setup(dir.path());
    let (_, first) = run(&cfg).unwrap();
    let first_text = fs::read_to_string(&first.output).unwrap();
    let first_index = load_index(&IndexPaths::new(&cfg.index_dir)).unwrap();

    let (_, second) = run(&cfg).unwrap();
    assert_eq!(fs::read_to_string(&second.output).unwrap(), first_text);
    assert_eq!(load_index(&IndexPaths::new(&cfg.index_dir)).unwrap(), first_index);
}

#[test]
fn every_similarity_writes_its_own_run() {
    let dir = tempdir().unwrap();
    let base = setup(dir.path());
    index_corpus(&base).unwrap();
    for code in 1..=5 {
        let cfg = RunConfig { similarity: Similarity::from_code(code), ..base.clone() };
        let summary = run_queries(&cfg).unwrap();
        assert!(summary.output.ends_with(format!("output-en-{}.txt", cfg.similarity.name())));
        let q4: Vec<_> = entries(&summary.output).into_iter().filter(|e| e.query_number == 4).collect();
        assert_eq!(q4[0].doc_id, "1", "{}", cfg.similarity);
    }
}

#[test]
fn top_k_caps_each_query() {
    let dir = tempdir().unwrap();
    let cfg = RunConfig { top_k: 1, analyzer: Analyzer::Standard, ..setup(dir.path()) };
    let summary = run(&cfg).unwrap().1;
    let lines = entries(&summary.output);
    assert!(lines.iter().filter(|e| e.query_number == 3).count() <= 1);
    assert!(summary.output.ends_with("output-sd-bm25.txt"));
}

#[test]
fn bad_query_does_not_abort_the_batch() {
    let dir = tempdir().unwrap();
    let mut cfg = setup(dir.path());
    cfg.query_syntax = true;
    fs::write(&cfg.queries, ".I 1\n.W\ncolour:red\n.I 2\n.W\nwing slipstream\n").unwrap();
    let (_, summary) = run(&cfg).unwrap();
    assert_eq!(summary.queries, 2);
    assert_eq!(summary.failed, 1);
    let lines = entries(&summary.output);
    assert!(!lines.is_empty());
    assert!(lines.iter().all(|e| e.query_number == 2));
}

#[test]
fn missing_corpus_is_reported() {
    let dir = tempdir().unwrap();
    let cfg = RunConfig { corpus: dir.path().join("absent.1400"), ..setup(dir.path()) };
    match index_corpus(&cfg) {
        Err(Error::MissingInput { path }) => assert_eq!(path, cfg.corpus),
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn querying_without_an_index_is_fatal() {
    let dir = tempdir().unwrap();
    let cfg = setup(dir.path());
    assert!(matches!(run_queries(&cfg), Err(Error::MalformedIndex(_))));
}

#[test]
fn run_is_named_after_the_index_analyzer() {
    let dir = tempdir().unwrap();
    let built = RunConfig { analyzer: Analyzer::Standard, ..setup(dir.path()) };
    index_corpus(&built).unwrap();

    let requested = RunConfig { analyzer: Analyzer::English, ..built.clone() };
    let summary = run_queries(&requested).unwrap();
    assert!(summary.output.ends_with("output-sd-bm25.txt"));
    assert!(!dir.path().join("output/output-en-bm25.txt").exists());
}

#[test]
fn invalid_run_tag_writes_nothing() {
    let dir = tempdir().unwrap();
    let base = setup(dir.path());
    index_corpus(&base).unwrap();
    for tag in ["", "my run"] {
        let cfg = RunConfig { run_tag: tag.to_string(), ..base.clone() };
        assert!(matches!(run_queries(&cfg), Err(Error::Config(_))), "{tag:?}");
    }
    assert!(!base.output_path().exists());
}
