//! Multi-field query parsing.
//!
//! Syntax, clause by clause (clauses are separated by whitespace):
//!
//! ```text
//! [+|-][field:](word|"a phrase")[^boost]
//! ```
//!
//! `+` marks a required clause and `-` a prohibited one. Without a field
//! prefix a clause is expanded over every configured field with that
//! field's boost. A backslash makes the next character literal; [`escape`]
//! applies that to free text so it always parses as plain words.

use crate::error::{Error, Result};
use crate::index::Field;
use crate::tokenizer::Analyzer;

const SPECIAL: &[char] = &[
    '\\', '+', '-', '!', '(', ')', ':', '^', '[', ']', '"', '{', '}', '~', '*', '?', '|', '&', '/',
];

/// Backslash-escape every syntax character in `text`.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if SPECIAL.contains(&c) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Occur {
    Should,
    Must,
    MustNot,
}

/// How unmarked clauses combine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Operator {
    #[default]
    Or,
    And,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldWeight {
    pub field: Field,
    pub boost: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Clause {
    /// Terms with their offset relative to the first term. A single entry
    /// is a term query, more than one is a phrase.
    pub terms: Vec<(String, u32)>,
    pub occur: Occur,
    pub boost: f32,
    pub fields: Vec<FieldWeight>,
}

impl Clause {
    pub fn is_phrase(&self) -> bool {
        self.terms.len() > 1
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    pub clauses: Vec<Clause>,
}

impl Query {
    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    /// Terms of every non-prohibited clause, in order.
    pub fn terms(&self) -> impl Iterator<Item = &str> {
        self.clauses
            .iter()
            .filter(|c| c.occur != Occur::MustNot)
            .flat_map(|c| c.terms.iter().map(|(t, _)| t.as_str()))
    }
}

#[derive(Debug, Clone)]
pub struct QueryParser {
    analyzer: Analyzer,
    fields: Vec<FieldWeight>,
    operator: Operator,
}

/// One clause before analysis.
#[derive(Debug, PartialEq)]
struct RawClause {
    occur: Option<Occur>,
    field: Option<String>,
    text: String,
    quoted: bool,
    boost: Option<f32>,
}

impl QueryParser {
    pub fn new(analyzer: Analyzer, fields: Vec<FieldWeight>) -> Self {
        Self { analyzer, fields, operator: Operator::Or }
    }

    pub fn default_operator(mut self, operator: Operator) -> Self {
        self.operator = operator;
        self
    }

    pub fn parse(&self, text: &str) -> Result<Query> {
        let mut clauses = Vec::new();
        for raw in lex(text)? {
            let occur = raw.occur.unwrap_or(match self.operator {
                Operator::Or => Occur::Should,
                Operator::And => Occur::Must,
            });
            let fields = match &raw.field {
                Some(name) => {
                    let field: Field = name.parse().map_err(Error::QueryParse)?;
                    vec![FieldWeight { field, boost: 1.0 }]
                }
                None => self.fields.clone(),
            };
            let boost = raw.boost.unwrap_or(1.0);
            let tokens = self.analyzer.analyze(&raw.text);
            if tokens.is_empty() {
                continue;
            }
            if raw.quoted && tokens.len() > 1 {
                let first = tokens[0].1;
                let terms = tokens.into_iter().map(|(t, pos)| (t, (pos - first) as u32)).collect();
                clauses.push(Clause { terms, occur, boost, fields });
            } else {
                for (term, _) in tokens {
                    clauses.push(Clause { terms: vec![(term, 0)], occur, boost, fields: fields.clone() });
                }
            }
        }
        Ok(Query { clauses })
    }
}

fn lex(text: &str) -> Result<Vec<RawClause>> {
    let mut chars = text.chars().peekable();
    let mut out = Vec::new();

    loop {
        while chars.next_if(|c| c.is_whitespace()).is_some() {}
        let Some(&first) = chars.peek() else { break };

        let occur = match first {
            '+' => Some(Occur::Must),
            '-' => Some(Occur::MustNot),
            _ => None,
        };
        if occur.is_some() {
            chars.next();
            if chars.peek().map_or(true, |c| c.is_whitespace()) {
                return Err(Error::query(format!("operator '{first}' is not followed by a term")));
            }
        }

        let mut field = None;
        let (text, quoted) = if chars.peek() == Some(&'"') {
            (read_phrase(&mut chars)?, true)
        } else {
            let word = read_word(&mut chars, true)?;
            if chars.peek() == Some(&':') {
                chars.next();
                if word.is_empty() {
                    return Err(Error::query("empty field name"));
                }
                field = Some(word);
                match chars.peek() {
                    Some('"') => (read_phrase(&mut chars)?, true),
                    Some(c) if !c.is_whitespace() => (read_word(&mut chars, false)?, false),
                    _ => return Err(Error::query("field prefix is not followed by a term")),
                }
            } else {
                (word, false)
            }
        };

        let boost = if chars.peek() == Some(&'^') {
            chars.next();
            let mut num = String::new();
            while let Some(c) = chars.next_if(|c| !c.is_whitespace()) {
                num.push(c);
            }
            match num.parse::<f32>() {
                Ok(b) if b.is_finite() && b >= 0.0 => Some(b),
                _ => return Err(Error::query(format!("invalid boost '{num}'"))),
            }
        } else {
            None
        };

        if let Some(&c) = chars.peek() {
            if !c.is_whitespace() {
                return Err(Error::query(format!("unexpected '{c}'")));
            }
        }
        out.push(RawClause { occur, field, text, quoted, boost });
    }
    Ok(out)
}

/// Read up to whitespace or an unescaped `^` (or `:` when `stop_at_colon`).
fn read_word(chars: &mut std::iter::Peekable<std::str::Chars<'_>>, stop_at_colon: bool) -> Result<String> {
    let mut word = String::new();
    while let Some(&c) = chars.peek() {
        if c.is_whitespace() || c == '^' || (stop_at_colon && c == ':') {
            break;
        }
        chars.next();
        if c == '\\' {
            match chars.next() {
                Some(escaped) => word.push(escaped),
                None => return Err(Error::query("dangling escape at end of query")),
            }
        } else {
            word.push(c);
        }
    }
    Ok(word)
}

fn read_phrase(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> Result<String> {
    chars.next();
    let mut phrase = String::new();
    loop {
        match chars.next() {
            Some('"') => return Ok(phrase),
            Some('\\') => match chars.next() {
                Some(escaped) => phrase.push(escaped),
                None => return Err(Error::query("dangling escape at end of query")),
            },
            Some(c) => phrase.push(c),
            None => return Err(Error::query("unterminated phrase")),
        }
    }
}
