//! Streaming reader for the tagged collection format.
//!
//! Each record starts with an `.I <id>` line and is followed by optional
//! `.T` (title), `.A` (author), `.B` (bibliography) and `.W` (body) sections.
//! A section runs until the next marker line; the body usually runs until
//! the next `.I`. Query files use the same layout with only `.I` and `.W`.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::error::{Error, Result};
use crate::index::{Document, Field};

/// Parser states. `AwaitRecord` means no section of the current record is
/// open, either before the first `.I` or directly after one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    AwaitRecord,
    InTitle,
    InAuthor,
    InBib,
    InBody,
}

impl State {
    fn field(self) -> Option<Field> {
        match self {
            State::AwaitRecord => None,
            State::InTitle => Some(Field::Title),
            State::InAuthor => Some(Field::Author),
            State::InBib => Some(Field::Bibliography),
            State::InBody => Some(Field::Body),
        }
    }
}

/// A classified input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Line<'a> {
    Record(&'a str),
    Title,
    Author,
    Bib,
    Body,
    Text(&'a str),
    Blank,
}

impl<'a> Line<'a> {
    pub fn classify(raw: &'a str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Line::Blank;
        }
        let (marker, rest) = match trimmed.char_indices().nth(2) {
            Some((idx, c)) if c.is_whitespace() => (&trimmed[..idx], trimmed[idx..].trim()),
            Some(_) => return Line::Text(trimmed),
            None => (trimmed, ""),
        };
        match marker {
            ".I" => Line::Record(rest),
            ".T" => Line::Title,
            ".A" => Line::Author,
            ".B" => Line::Bib,
            ".W" => Line::Body,
            _ => Line::Text(trimmed),
        }
    }
}

/// Side effect of a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action<'a> {
    /// Emit the open record (if any) and start a new one.
    StartRecord(&'a str),
    Append(Field, &'a str),
    Discard,
    None,
}

/// The single transition table for the tagged format.
pub fn transition<'a>(state: State, line: &Line<'a>) -> (State, Action<'a>) {
    match line {
        Line::Record(id) => (State::AwaitRecord, Action::StartRecord(id)),
        Line::Title => (State::InTitle, Action::None),
        Line::Author => (State::InAuthor, Action::None),
        Line::Bib => (State::InBib, Action::None),
        Line::Body => (State::InBody, Action::None),
        Line::Blank => (state, Action::None),
        Line::Text(text) => match state.field() {
            Some(field) => (state, Action::Append(field, text)),
            None => (state, Action::Discard),
        },
    }
}

/// Iterator over the documents of a tagged stream.
pub struct CorpusReader<R> {
    lines: std::io::Lines<R>,
    state: State,
    current: Option<Document>,
    line_no: usize,
    done: bool,
}

impl<R: BufRead> CorpusReader<R> {
    pub fn new(reader: R) -> Self {
        Self { lines: reader.lines(), state: State::AwaitRecord, current: None, line_no: 0, done: false }
    }

    fn step(&mut self) -> Result<Option<Document>> {
        loop {
            let raw = match self.lines.next() {
                Some(line) => line?,
                None => {
                    self.done = true;
                    return Ok(self.current.take());
                }
            };
            self.line_no += 1;
            let line = Line::classify(&raw);
            let (next, action) = transition(self.state, &line);
            self.state = next;
            match action {
                Action::StartRecord(id) => {
                    if id.is_empty() {
                        return Err(Error::Corpus { line: self.line_no, message: "record marker without id".into() });
                    }
                    let finished = self.current.replace(Document::new(id));
                    if finished.is_some() {
                        return Ok(finished);
                    }
                }
                Action::Append(field, text) => {
                    if let Some(doc) = self.current.as_mut() {
                        let slot = doc.field_mut(field);
                        if !slot.is_empty() {
                            slot.push(' ');
                        }
                        slot.push_str(text);
                    }
                }
                Action::Discard => {
                    tracing::trace!(line = self.line_no, "discarding text outside a section");
                }
                Action::None => {}
            }
        }
    }
}

impl<R: BufRead> Iterator for CorpusReader<R> {
    type Item = Result<Document>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.step() {
            Ok(Some(doc)) => Some(Ok(doc)),
            Ok(None) => None,
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

fn open(path: &Path) -> Result<BufReader<File>> {
    match File::open(path) {
        Ok(f) => Ok(BufReader::new(f)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(Error::MissingInput { path: path.to_path_buf() }),
        Err(e) => Err(e.into()),
    }
}

/// Stream the documents of a collection file.
pub fn open_corpus(path: &Path) -> Result<CorpusReader<BufReader<File>>> {
    Ok(CorpusReader::new(open(path)?))
}

/// A query taken from the body of a tagged block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryText {
    /// Sequential 1-based number in file order.
    pub number: u32,
    /// Id from the `.I` line.
    pub record_id: String,
    pub text: String,
}

/// Iterator over the queries of a tagged stream.
pub struct QueryReader<R> {
    inner: CorpusReader<R>,
    next_number: u32,
}

impl<R: BufRead> QueryReader<R> {
    pub fn new(reader: R) -> Self {
        Self { inner: CorpusReader::new(reader), next_number: 1 }
    }
}

impl<R: BufRead> Iterator for QueryReader<R> {
    type Item = Result<QueryText>;

    fn next(&mut self) -> Option<Self::Item> {
        let doc = match self.inner.next()? {
            Ok(doc) => doc,
            Err(e) => return Some(Err(e)),
        };
        let number = self.next_number;
        self.next_number += 1;
        let text = doc.body.replace('?', "").trim().to_string();
        Some(Ok(QueryText { number, record_id: doc.id, text }))
    }
}

/// Read every query of a query file.
pub fn read_queries(path: &Path) -> Result<Vec<QueryText>> {
    QueryReader::new(open(path)?).collect()
}
