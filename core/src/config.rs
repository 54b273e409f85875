use std::io::{BufRead, Write};
use std::path::PathBuf;

use crate::error::{Error, Result};
use crate::index::Field;
use crate::query::{FieldWeight, Operator};
use crate::run::DEFAULT_RUN_TAG;
use crate::similarity::Similarity;
use crate::tokenizer::Analyzer;

pub const DEFAULT_CORPUS: &str = "/opt/cran_files/cran.all.1400";
pub const DEFAULT_QUERIES: &str = "/opt/cran_files/cran.qry";
pub const DEFAULT_INDEX_DIR: &str = "lucene_index";
pub const DEFAULT_OUTPUT_DIR: &str = "output";
pub const DEFAULT_TOP_K: usize = 50;

/// Static per-field query weights.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldBoosts {
    pub title: f32,
    pub author: f32,
    pub bibliography: f32,
    pub body: f32,
}

impl Default for FieldBoosts {
    fn default() -> Self {
        Self { title: 0.65, author: 0.04, bibliography: 0.02, body: 0.35 }
    }
}

impl FieldBoosts {
    pub fn uniform() -> Self {
        Self { title: 1.0, author: 1.0, bibliography: 1.0, body: 1.0 }
    }

    pub fn get(&self, field: Field) -> f32 {
        match field {
            Field::Title => self.title,
            Field::Author => self.author,
            Field::Bibliography => self.bibliography,
            Field::Body => self.body,
        }
    }

    pub fn set(&mut self, field: Field, boost: f32) {
        match field {
            Field::Title => self.title = boost,
            Field::Author => self.author = boost,
            Field::Bibliography => self.bibliography = boost,
            Field::Body => self.body = boost,
        }
    }

    /// Apply a `field=value` override.
    pub fn apply(&mut self, assignment: &str) -> Result<()> {
        let (name, value) = assignment
            .split_once('=')
            .ok_or_else(|| Error::Config(format!("boost '{assignment}' is not of the form field=value")))?;
        let field: Field = name.trim().parse().map_err(Error::Config)?;
        let boost: f32 = value
            .trim()
            .parse()
            .map_err(|_| Error::Config(format!("invalid boost value '{value}'")))?;
        if !boost.is_finite() || boost < 0.0 {
            return Err(Error::Config(format!("boost for {field} must be a non-negative number")));
        }
        self.set(field, boost);
        Ok(())
    }
}

/// Everything a batch run needs. Built once and passed into each phase.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub corpus: PathBuf,
    pub queries: PathBuf,
    pub index_dir: PathBuf,
    pub output_dir: PathBuf,
    pub analyzer: Analyzer,
    pub similarity: Similarity,
    pub boosts: FieldBoosts,
    /// When false every field is weighted 1.0.
    pub boosting: bool,
    pub operator: Operator,
    /// Parse query text with operators, fields and phrases instead of
    /// escaping it to plain words.
    pub query_syntax: bool,
    pub top_k: usize,
    pub run_tag: String,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            corpus: DEFAULT_CORPUS.into(),
            queries: DEFAULT_QUERIES.into(),
            index_dir: DEFAULT_INDEX_DIR.into(),
            output_dir: DEFAULT_OUTPUT_DIR.into(),
            analyzer: Analyzer::English,
            similarity: Similarity::default(),
            boosts: FieldBoosts::default(),
            boosting: true,
            operator: Operator::Or,
            query_syntax: false,
            top_k: DEFAULT_TOP_K,
            run_tag: DEFAULT_RUN_TAG.to_string(),
        }
    }
}

impl RunConfig {
    /// Fields searched by every unqualified query clause, with their weights.
    pub fn field_weights(&self) -> Vec<FieldWeight> {
        let boosts = if self.boosting { self.boosts } else { FieldBoosts::uniform() };
        Field::ALL.iter().map(|&field| FieldWeight { field, boost: boosts.get(field) }).collect()
    }

    /// e.g. `output/output-en-bm25.txt`
    pub fn output_path(&self) -> PathBuf {
        self.output_dir
            .join(format!("output-{}-{}.txt", self.analyzer.short_name(), self.similarity.name()))
    }
}

pub const ANALYZER_MENU: &str = "Please select the type of Analyzer:\n1. Standard Analyzer\n2. English Analyzer";
pub const SIMILARITY_MENU: &str =
    "Please select the type of Similarity:\n1. BM25\n2. Classic (VSM)\n3. Boolean\n4. LMDirichlet\n5. IBS";

/// Print `menu` and read integers until one parses.
pub fn prompt_choice<R: BufRead, W: Write>(input: &mut R, out: &mut W, menu: &str) -> Result<i64> {
    writeln!(out, "{menu}")?;
    out.flush()?;
    let mut line = String::new();
    loop {
        line.clear();
        if input.read_line(&mut line)? == 0 {
            return Err(Error::Config("no selection made before end of input".into()));
        }
        match line.trim().parse::<i64>() {
            Ok(choice) => return Ok(choice),
            Err(_) => {
                writeln!(out, "Please enter a number.")?;
                out.flush()?;
            }
        }
    }
}

pub fn prompt_analyzer<R: BufRead, W: Write>(input: &mut R, out: &mut W) -> Result<Analyzer> {
    let analyzer = Analyzer::from_code(prompt_choice(input, out, ANALYZER_MENU)?);
    writeln!(out, "Selected {analyzer} analyzer")?;
    Ok(analyzer)
}

pub fn prompt_similarity<R: BufRead, W: Write>(input: &mut R, out: &mut W) -> Result<Similarity> {
    let code = prompt_choice(input, out, SIMILARITY_MENU)?;
    let similarity = Similarity::from_code(code);
    if similarity.code() == code {
        writeln!(out, "Selected {}", similarity.name())?;
    } else {
        writeln!(out, "Selected Default ({})", similarity.name())?;
    }
    Ok(similarity)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_path_names_analyzer_and_model() {
        let cfg = RunConfig { analyzer: Analyzer::Standard, similarity: Similarity::Ib, ..RunConfig::default() };
        assert_eq!(cfg.output_path(), PathBuf::from("output/output-sd-ibs.txt"));
        assert_eq!(RunConfig::default().output_path(), PathBuf::from("output/output-en-bm25.txt"));
    }

    #[test]
    fn boosting_toggle() {
        let mut cfg = RunConfig::default();
        let weights = cfg.field_weights();
        assert_eq!(weights.len(), 4);
        assert_eq!(weights[0], FieldWeight { field: Field::Title, boost: 0.65 });
        assert_eq!(weights[2], FieldWeight { field: Field::Bibliography, boost: 0.02 });

        cfg.boosting = false;
        assert!(cfg.field_weights().iter().all(|w| w.boost == 1.0));
    }

    #[test]
    fn boost_overrides() {
        let mut boosts = FieldBoosts::default();
        boosts.apply("bib=0.5").unwrap();
        boosts.apply(" content = 2 ").unwrap();
        assert_eq!(boosts.bibliography, 0.5);
        assert_eq!(boosts.body, 2.0);
        for bad in ["title", "pages=1", "title=abc", "title=-1"] {
            assert!(matches!(boosts.apply(bad), Err(Error::Config(_))), "{bad}");
        }
    }

    #[test]
    fn prompts_retry_until_a_number() {
        let mut input = "abc\n\n2\n9\n".as_bytes();
        let mut out = Vec::new();
        assert_eq!(prompt_analyzer(&mut input, &mut out).unwrap(), Analyzer::English);
        assert_eq!(prompt_similarity(&mut input, &mut out).unwrap(), Similarity::default());
        let shown = String::from_utf8(out).unwrap();
        assert!(shown.starts_with(ANALYZER_MENU));
        assert!(shown.contains("Please enter a number."));
        assert!(shown.contains("Selected Default (bm25)"));
    }

    #[test]
    fn prompt_fails_at_end_of_input() {
        let mut input = "".as_bytes();
        assert!(matches!(prompt_choice(&mut input, &mut Vec::<u8>::new(), "menu"), Err(Error::Config(_))));
    }
}
