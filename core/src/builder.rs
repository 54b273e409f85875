use std::collections::{BTreeMap, HashSet};

use crate::error::{Error, Result};
use crate::index::{DocId, DocMeta, Document, Field, InvertedIndex, Posting};
use crate::tokenizer::Analyzer;

/// Accumulates documents into an [`InvertedIndex`].
pub struct IndexBuilder {
    index: InvertedIndex,
    seen_ids: HashSet<String>,
}

impl IndexBuilder {
    pub fn new(analyzer: Analyzer) -> Self {
        Self { index: InvertedIndex::new(analyzer), seen_ids: HashSet::new() }
    }

    pub fn add_document(&mut self, doc: &Document) -> Result<DocId> {
        if !self.seen_ids.insert(doc.id.clone()) {
            return Err(Error::DuplicateDocument(doc.id.clone()));
        }
        let doc_id = self.index.num_docs;
        let analyzer = self.index.analyzer;

        for field in Field::ALL {
            let tokens = analyzer.analyze(doc.field(field));
            let mut positions: BTreeMap<String, Vec<u32>> = BTreeMap::new();
            for (term, pos) in &tokens {
                positions.entry(term.clone()).or_default().push(*pos as u32);
            }

            let field_index = self.index.field_mut(field);
            field_index.doc_lengths.push(tokens.len() as u32);
            field_index.total_tokens += tokens.len() as u64;
            // doc ids only grow, so appending keeps every list sorted
            for (term, positions) in positions {
                field_index.postings.entry(term).or_default().push(Posting {
                    doc_id,
                    term_freq: positions.len() as u32,
                    positions,
                });
            }
        }

        self.index.docs.push(DocMeta { external_id: doc.id.clone() });
        self.index.num_docs += 1;
        Ok(doc_id)
    }

    pub fn finish(self) -> InvertedIndex {
        tracing::debug!(
            num_docs = self.index.num_docs,
            body_terms = self.index.field(Field::Body).num_terms(),
            "index built"
        );
        self.index
    }
}

/// Index a whole collection in order.
pub fn build<'a, I>(documents: I, analyzer: Analyzer) -> Result<InvertedIndex>
where
    I: IntoIterator<Item = &'a Document>,
{
    let mut builder = IndexBuilder::new(analyzer);
    for doc in documents {
        builder.add_document(doc)?;
    }
    Ok(builder.finish())
}
