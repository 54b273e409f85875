//! Batch driver: index the collection, then run every query into a run file.

use std::fs::{self, File};
use std::io::BufWriter;
use std::path::PathBuf;

use crate::builder::IndexBuilder;
use crate::config::RunConfig;
use crate::corpus::{open_corpus, read_queries};
use crate::error::Result;
use crate::persist::{load_index, save_index, IndexPaths};
use crate::query::{escape, QueryParser};
use crate::run::{check_run_tag, RunWriter};
use crate::search::Searcher;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexSummary {
    pub num_docs: u32,
    pub index_dir: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuerySummary {
    pub queries: usize,
    /// Queries that failed to parse and produced no output.
    pub failed: usize,
    pub lines: usize,
    pub output: PathBuf,
}

/// Read the corpus, build the index and write it to a recreated directory.
pub fn index_corpus(cfg: &RunConfig) -> Result<IndexSummary> {
    tracing::info!(corpus = %cfg.corpus.display(), analyzer = %cfg.analyzer, "indexing");
    let mut builder = IndexBuilder::new(cfg.analyzer);
    for doc in open_corpus(&cfg.corpus)? {
        builder.add_document(&doc?)?;
    }
    let index = builder.finish();

    let paths = IndexPaths::new(&cfg.index_dir);
    save_index(&paths, &index)?;
    tracing::info!(num_docs = index.num_docs, "indexing finished");
    Ok(IndexSummary { num_docs: index.num_docs, index_dir: cfg.index_dir.clone() })
}

/// Reopen the index and write the top-k hits of every query to the run file.
/// Queries are analyzed with the index's analyzer, which also names the run.
pub fn run_queries(cfg: &RunConfig) -> Result<QuerySummary> {
    check_run_tag(&cfg.run_tag)?;
    let index = load_index(&IndexPaths::new(&cfg.index_dir))?;
    if index.analyzer != cfg.analyzer {
        tracing::warn!(index = %index.analyzer, requested = %cfg.analyzer, "index was built with a different analyzer; using the index's");
    }
    let cfg = &RunConfig { analyzer: index.analyzer, ..cfg.clone() };
    let queries = read_queries(&cfg.queries)?;
    let parser = QueryParser::new(index.analyzer, cfg.field_weights()).default_operator(cfg.operator);
    let searcher = Searcher::new(&index, cfg.similarity);

    let output = cfg.output_path();
    if let Some(dir) = output.parent() {
        fs::create_dir_all(dir)?;
    }
    let mut writer = RunWriter::new(BufWriter::new(File::create(&output)?), cfg.run_tag.clone())?;

    tracing::info!(queries = queries.len(), similarity = %cfg.similarity, "querying");
    let mut failed = 0;
    for q in &queries {
        let text = if cfg.query_syntax { q.text.clone() } else { escape(&q.text) };
        let query = match parser.parse(&text) {
            Ok(query) => query,
            Err(e) => {
                failed += 1;
                tracing::warn!(number = q.number, record = %q.record_id, error = %e, "skipping query");
                continue;
            }
        };
        let results = searcher.search(&query, cfg.top_k);
        tracing::debug!(number = q.number, terms = ?query.terms().collect::<Vec<_>>(), hits = results.len(), "query done");
        writer.write_results(q.number, &results)?;
    }
    let lines = writer.lines_written();
    writer.finish()?;

    tracing::info!(queries = queries.len(), failed, lines, output = %output.display(), "querying finished");
    Ok(QuerySummary { queries: queries.len(), failed, lines, output })
}

/// Both phases, in order.
pub fn run(cfg: &RunConfig) -> Result<(IndexSummary, QuerySummary)> {
    let indexed = index_corpus(cfg)?;
    let queried = run_queries(cfg)?;
    Ok((indexed, queried))
}
