use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("input file not found: {}", path.display())]
    MissingInput { path: PathBuf },

    #[error("malformed index directory: {0}")]
    MalformedIndex(String),

    #[error("corpus parse error at line {line}: {message}")]
    Corpus { line: usize, message: String },

    #[error("run file parse error at line {line}: {message}")]
    RunFormat { line: usize, message: String },

    #[error("duplicate document id: {0}")]
    DuplicateDocument(String),

    #[error("query parse error: {0}")]
    QueryParse(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("encoding error: {0}")]
    Encode(#[from] bincode::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub(crate) fn query(message: impl Into<String>) -> Self {
        Error::QueryParse(message.into())
    }

    pub(crate) fn malformed(message: impl Into<String>) -> Self {
        Error::MalformedIndex(message.into())
    }
}
