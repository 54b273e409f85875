//! trec run files: `<query> Q0 <doc> <rank> <score> <tag>` per line.

use std::io::{BufRead, Write};

use crate::error::{Error, Result};
use crate::search::ScoredResult;

pub const DEFAULT_RUN_TAG: &str = "STANDARD";

pub struct RunWriter<W: Write> {
    out: W,
    run_tag: String,
    lines: usize,
}

/// A tag must be a single non-empty column.
pub fn check_run_tag(tag: &str) -> Result<()> {
    if tag.is_empty() || tag.chars().any(char::is_whitespace) {
        return Err(Error::Config(format!("run tag '{tag}' must be one word without whitespace")));
    }
    Ok(())
}

impl<W: Write> RunWriter<W> {
    pub fn new(out: W, run_tag: impl Into<String>) -> Result<Self> {
        let run_tag = run_tag.into();
        check_run_tag(&run_tag)?;
        Ok(Self { out, run_tag, lines: 0 })
    }

    /// Write one line per result, in the given order. Returns the number of
    /// lines written.
    pub fn write_results(&mut self, query_number: u32, results: &[ScoredResult]) -> Result<usize> {
        for r in results {
            writeln!(self.out, "{} Q0 {} {} {} {}", query_number, r.external_id, r.rank, r.score, self.run_tag)?;
        }
        self.lines += results.len();
        Ok(results.len())
    }

    pub fn lines_written(&self) -> usize {
        self.lines
    }

    pub fn finish(mut self) -> Result<W> {
        self.out.flush()?;
        Ok(self.out)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunEntry {
    pub query_number: u32,
    pub doc_id: String,
    pub rank: usize,
    pub score: f32,
    pub run_tag: String,
}

fn bad_line(line: usize, message: impl Into<String>) -> Error {
    Error::RunFormat { line, message: message.into() }
}

/// Parse a run file back into entries. Blank lines are skipped.
pub fn read_run<R: BufRead>(reader: R) -> Result<Vec<RunEntry>> {
    let mut entries = Vec::new();
    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        let line_no = i + 1;
        if line.trim().is_empty() {
            continue;
        }
        let cols: Vec<&str> = line.split_whitespace().collect();
        let [query, q0, doc, rank, score, tag] = cols.as_slice() else {
            return Err(bad_line(line_no, format!("expected 6 columns, found {}", cols.len())));
        };
        if *q0 != "Q0" {
            return Err(bad_line(line_no, format!("expected Q0, found {q0}")));
        }
        entries.push(RunEntry {
            query_number: query.parse().map_err(|_| bad_line(line_no, format!("bad query number {query}")))?,
            doc_id: doc.to_string(),
            rank: rank.parse().map_err(|_| bad_line(line_no, format!("bad rank {rank}")))?,
            score: score.parse().map_err(|_| bad_line(line_no, format!("bad score {score}")))?,
            run_tag: tag.to_string(),
        });
    }
    Ok(entries)
}
