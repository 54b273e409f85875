//! Ranking functions.
//!
//! A [`Similarity`] is chosen once per run. For every (field, term) pair of
//! a query it produces a [`TermScorer`] that holds the collection-level
//! statistics, and that scorer is then applied to each posting.

use std::fmt;

/// Collection statistics for one term (or phrase) in one field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TermStats {
    /// Number of documents in the index.
    pub num_docs: u32,
    pub doc_freq: u32,
    /// Sum of the term's frequency over all documents.
    pub total_term_freq: u64,
    /// Sum of all field lengths.
    pub total_tokens: u64,
    pub avg_field_length: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Similarity {
    /// Okapi BM25.
    Bm25 { k1: f32, b: f32 },
    /// Vector space TF-IDF with length normalization.
    Classic,
    /// Every matching clause scores its boost.
    Boolean,
    /// Query likelihood with Dirichlet smoothing.
    LmDirichlet { mu: f32 },
    /// Information-based model: log-logistic distribution, lambda from
    /// document frequency, H1 length normalization.
    Ib,
}

impl Default for Similarity {
    fn default() -> Self {
        Similarity::Bm25 { k1: 1.2, b: 0.75 }
    }
}

impl Similarity {
    /// Maps a console menu choice; unknown codes fall back to BM25.
    pub fn from_code(code: i64) -> Self {
        match code {
            2 => Similarity::Classic,
            3 => Similarity::Boolean,
            4 => Similarity::LmDirichlet { mu: 2000.0 },
            5 => Similarity::Ib,
            _ => Similarity::default(),
        }
    }

    pub fn code(&self) -> i64 {
        match self {
            Similarity::Bm25 { .. } => 1,
            Similarity::Classic => 2,
            Similarity::Boolean => 3,
            Similarity::LmDirichlet { .. } => 4,
            Similarity::Ib => 5,
        }
    }

    /// Short name used in output file names.
    pub fn name(&self) -> &'static str {
        match self {
            Similarity::Bm25 { .. } => "bm25",
            Similarity::Classic => "classic",
            Similarity::Boolean => "boolean",
            Similarity::LmDirichlet { .. } => "lm",
            Similarity::Ib => "ibs",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        let sim = match name.to_ascii_lowercase().as_str() {
            "bm25" => Similarity::default(),
            "classic" | "vsm" | "tfidf" => Similarity::Classic,
            "boolean" => Similarity::Boolean,
            "lm" | "lmdirichlet" => Similarity::from_code(4),
            "ibs" | "ib" => Similarity::Ib,
            _ => return None,
        };
        Some(sim)
    }

    /// Precompute the per-term part of the formula.
    pub fn scorer(&self, stats: &TermStats, boost: f32) -> TermScorer {
        let n = stats.num_docs as f32;
        let df = stats.doc_freq as f32;
        let weight = match *self {
            Similarity::Bm25 { .. } => ((n - df + 0.5) / (df + 0.5) + 1.0).ln(),
            Similarity::Classic => {
                let idf = 1.0 + ((n + 1.0) / (df + 1.0)).ln();
                idf * idf
            }
            Similarity::Boolean => 1.0,
            Similarity::LmDirichlet { .. } => {
                // collection probability, add-one smoothed so unseen terms stay finite
                (stats.total_term_freq as f32 + 1.0) / (stats.total_tokens as f32 + 1.0)
            }
            Similarity::Ib => (df + 1.0) / (n + 1.0),
        };
        TermScorer { similarity: *self, weight, boost, avg_field_length: stats.avg_field_length }
    }
}

impl fmt::Display for Similarity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Scores postings of one term in one field.
#[derive(Debug, Clone, Copy)]
pub struct TermScorer {
    similarity: Similarity,
    /// idf for BM25, idf² for Classic, collection probability for LM,
    /// lambda for IB.
    weight: f32,
    boost: f32,
    avg_field_length: f32,
}

impl TermScorer {
    /// Score a document with frequency `freq` and field length `field_len`.
    pub fn score(&self, freq: f32, field_len: u32) -> f32 {
        if freq <= 0.0 {
            return 0.0;
        }
        let dl = field_len as f32;
        let raw = match self.similarity {
            Similarity::Bm25 { k1, b } => {
                let avgdl = if self.avg_field_length > 0.0 { self.avg_field_length } else { 1.0 };
                let norm = k1 * (1.0 - b + b * dl / avgdl);
                self.weight * freq * (k1 + 1.0) / (freq + norm)
            }
            Similarity::Classic => {
                let norm = if field_len > 0 { 1.0 / dl.sqrt() } else { 1.0 };
                freq.sqrt() * self.weight * norm
            }
            Similarity::Boolean => 1.0,
            Similarity::LmDirichlet { mu } => {
                let score = (1.0 + freq / (mu * self.weight)).ln() + (mu / (dl + mu)).ln();
                score.max(0.0)
            }
            Similarity::Ib => {
                let tfn = if field_len > 0 { freq * self.avg_field_length / dl } else { freq };
                let lambda = self.weight;
                -(lambda / (tfn + lambda)).ln()
            }
        };
        self.boost * raw
    }
}
