pub mod builder;
pub mod config;
pub mod corpus;
pub mod error;
pub mod index;
pub mod persist;
pub mod pipeline;
pub mod query;
pub mod run;
pub mod search;
pub mod similarity;
pub mod tokenizer;

pub use error::{Error, Result};
pub use index::{DocId, DocMeta, Document, Field, FieldIndex, InvertedIndex, Posting};
pub use search::ScoredResult;
pub use similarity::Similarity;
pub use tokenizer::Analyzer;
