use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::tokenizer::Analyzer;

pub type DocId = u32;

/// Text fields of a collection record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Field {
    Title,
    Author,
    Bibliography,
    Body,
}

impl Field {
    pub const ALL: [Field; 4] = [Field::Title, Field::Author, Field::Bibliography, Field::Body];

    pub fn name(self) -> &'static str {
        match self {
            Field::Title => "title",
            Field::Author => "author",
            Field::Bibliography => "bibliography",
            Field::Body => "body",
        }
    }

    fn slot(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Field {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "title" | "t" => Ok(Field::Title),
            "author" | "a" => Ok(Field::Author),
            "bibliography" | "bib" | "b" => Ok(Field::Bibliography),
            "body" | "content" | "w" => Ok(Field::Body),
            other => Err(format!("unknown field '{other}'")),
        }
    }
}

/// A parsed collection record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    pub id: String,
    pub title: String,
    pub author: String,
    pub bibliography: String,
    pub body: String,
}

impl Document {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into(), ..Self::default() }
    }

    pub fn field(&self, field: Field) -> &str {
        match field {
            Field::Title => &self.title,
            Field::Author => &self.author,
            Field::Bibliography => &self.bibliography,
            Field::Body => &self.body,
        }
    }

    pub fn field_mut(&mut self, field: Field) -> &mut String {
        match field {
            Field::Title => &mut self.title,
            Field::Author => &mut self.author,
            Field::Bibliography => &mut self.bibliography,
            Field::Body => &mut self.body,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocMeta {
    pub external_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Posting {
    pub doc_id: DocId,
    pub term_freq: u32,
    /// Token offsets of the term within the field, ascending.
    pub positions: Vec<u32>,
}

/// Postings and length statistics for one field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldIndex {
    pub postings: BTreeMap<String, Vec<Posting>>, // postings sorted by doc_id
    /// Token count per document, indexed by doc id.
    pub doc_lengths: Vec<u32>,
    pub total_tokens: u64,
}

impl FieldIndex {
    pub fn postings(&self, term: &str) -> &[Posting] {
        self.postings.get(term).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn doc_freq(&self, term: &str) -> u32 {
        self.postings(term).len() as u32
    }

    pub fn total_term_freq(&self, term: &str) -> u64 {
        self.postings(term).iter().map(|p| p.term_freq as u64).sum()
    }

    pub fn doc_length(&self, doc_id: DocId) -> u32 {
        self.doc_lengths.get(doc_id as usize).copied().unwrap_or(0)
    }

    pub fn avg_length(&self) -> f32 {
        if self.doc_lengths.is_empty() {
            0.0
        } else {
            self.total_tokens as f32 / self.doc_lengths.len() as f32
        }
    }

    pub fn num_terms(&self) -> usize {
        self.postings.len()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvertedIndex {
    pub analyzer: Analyzer,
    pub docs: Vec<DocMeta>,
    pub fields: [FieldIndex; 4],
    pub num_docs: u32,
}

impl InvertedIndex {
    pub fn new(analyzer: Analyzer) -> Self {
        Self { analyzer, docs: Vec::new(), fields: Default::default(), num_docs: 0 }
    }

    pub fn field(&self, field: Field) -> &FieldIndex {
        &self.fields[field.slot()]
    }

    pub(crate) fn field_mut(&mut self, field: Field) -> &mut FieldIndex {
        &mut self.fields[field.slot()]
    }

    pub fn external_id(&self, doc_id: DocId) -> Option<&str> {
        self.docs.get(doc_id as usize).map(|d| d.external_id.as_str())
    }
}
