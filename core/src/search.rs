use std::cmp::Ordering;

use crate::index::{DocId, FieldIndex, InvertedIndex};
use crate::query::{Clause, Occur, Query};
use crate::similarity::{Similarity, TermStats};

#[derive(Debug, Clone, PartialEq)]
pub struct ScoredResult {
    pub doc_id: DocId,
    pub external_id: String,
    /// Zero-based position in the ranking.
    pub rank: usize,
    pub score: f32,
}

/// Evaluates queries against a read-only index.
pub struct Searcher<'a> {
    index: &'a InvertedIndex,
    similarity: Similarity,
}

impl<'a> Searcher<'a> {
    pub fn new(index: &'a InvertedIndex, similarity: Similarity) -> Self {
        Self { index, similarity }
    }

    /// Return the `k` best documents, by descending score and then by
    /// ascending doc id.
    pub fn search(&self, query: &Query, k: usize) -> Vec<ScoredResult> {
        let n = self.index.num_docs as usize;
        if k == 0 || n == 0 || query.is_empty() {
            return Vec::new();
        }

        let mut scores = vec![0.0f32; n];
        let mut should_hit = vec![false; n];
        let mut must_hits = vec![0u32; n];
        let mut excluded = vec![false; n];
        // last clause (1-based) that matched each doc; dedupes multi-field matches
        let mut seen_in = vec![0usize; n];
        let required = query.clauses.iter().filter(|c| c.occur == Occur::Must).count() as u32;

        for (ci, clause) in query.clauses.iter().enumerate() {
            let mark = ci + 1;
            for fw in &clause.fields {
                let field_index = self.index.field(fw.field);
                let (matches, stats) = self.matches(field_index, clause);
                if matches.is_empty() {
                    continue;
                }
                if clause.occur == Occur::MustNot {
                    for (doc, _) in matches {
                        excluded[doc as usize] = true;
                    }
                    continue;
                }
                let scorer = self.similarity.scorer(&stats, fw.boost * clause.boost);
                for (doc, freq) in matches {
                    let d = doc as usize;
                    scores[d] += scorer.score(freq as f32, field_index.doc_length(doc));
                    if seen_in[d] != mark {
                        seen_in[d] = mark;
                        match clause.occur {
                            Occur::Must => must_hits[d] += 1,
                            _ => should_hit[d] = true,
                        }
                    }
                }
            }
        }

        let mut hits: Vec<(DocId, f32)> = (0..n)
            .filter(|&d| {
                !excluded[d] && if required > 0 { must_hits[d] == required } else { should_hit[d] }
            })
            .map(|d| (d as DocId, scores[d]))
            .collect();
        hits.sort_by(|a, b| match b.1.total_cmp(&a.1) {
            Ordering::Equal => a.0.cmp(&b.0),
            other => other,
        });
        hits.truncate(k);

        tracing::trace!(clauses = query.clauses.len(), hits = hits.len(), "query evaluated");
        hits.into_iter()
            .enumerate()
            .map(|(rank, (doc_id, score))| ScoredResult {
                doc_id,
                external_id: self.index.external_id(doc_id).unwrap_or_default().to_string(),
                rank,
                score,
            })
            .collect()
    }

    /// Documents matching `clause` in one field with their frequency, plus
    /// the statistics the similarity needs.
    fn matches(&self, field: &FieldIndex, clause: &Clause) -> (Vec<(DocId, u32)>, TermStats) {
        let matches: Vec<(DocId, u32)> = match clause.terms.as_slice() {
            [] => Vec::new(),
            [(term, _)] => field.postings(term).iter().map(|p| (p.doc_id, p.term_freq)).collect(),
            [(first, _), rest @ ..] => phrase_matches(field, first, rest),
        };
        let total_term_freq = matches.iter().map(|&(_, f)| f as u64).sum();
        let stats = TermStats {
            num_docs: self.index.num_docs,
            doc_freq: matches.len() as u32,
            total_term_freq,
            total_tokens: field.total_tokens,
            avg_field_length: field.avg_length(),
        };
        (matches, stats)
    }
}

fn phrase_matches(field: &FieldIndex, first: &str, rest: &[(String, u32)]) -> Vec<(DocId, u32)> {
    let lists: Vec<_> = rest.iter().map(|(t, off)| (field.postings(t), *off)).collect();
    if lists.iter().any(|(p, _)| p.is_empty()) {
        return Vec::new();
    }
    let mut out = Vec::new();
    'docs: for head in field.postings(first) {
        let mut others = Vec::with_capacity(lists.len());
        for (postings, off) in &lists {
            match postings.binary_search_by_key(&head.doc_id, |p| p.doc_id) {
                Ok(i) => others.push((&postings[i].positions, *off)),
                Err(_) => continue 'docs,
            }
        }
        let freq = head
            .positions
            .iter()
            .filter(|&&pos| others.iter().all(|(positions, off)| positions.binary_search(&(pos + off)).is_ok()))
            .count() as u32;
        if freq > 0 {
            out.push((head.doc_id, freq));
        }
    }
    out
}
