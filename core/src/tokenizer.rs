use lazy_static::lazy_static;
use regex::Regex;
use rust_stemmers::{Algorithm, Stemmer};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use unicode_normalization::UnicodeNormalization;

lazy_static! {
    static ref RE: Regex = Regex::new(r"(?u)[\p{L}\p{N}][\p{L}\p{N}_']*").expect("valid regex");
    static ref STEMMER: Stemmer = Stemmer::create(Algorithm::English);
    /// The classic 33-word English stop set.
    static ref CLASSIC_STOPWORDS: HashSet<&'static str> = {
        let words: &[&str] = &[
            "a","an","and","are","as","at","be","but","by","for","if","in","into","is","it",
            "no","not","of","on","or","such","that","the","their","then","there","these",
            "they","this","to","was","will","with",
        ];
        words.iter().copied().collect()
    };
    static ref ENGLISH_STOPWORDS: HashSet<&'static str> = {
        let words: &[&str] = &[
            "a","about","above","after","again","against","all","am","an","and","any","are","aren't","as","at",
            "be","because","been","before","being","below","between","both","but","by",
            "can","can't","cannot","could","couldn't",
            "did","didn't","do","does","doesn't","doing","don't","down","during",
            "each","few","for","from","further",
            "had","hadn't","has","hasn't","have","haven't","having","he","he'd","he'll","he's","her","here","here's","hers","herself","him","himself","his","how","how's",
            "i","i'd","i'll","i'm","i've","if","in","into","is","isn't","it","it's","its","itself",
            "let's","me","more","most","mustn't","my","myself",
            "no","nor","not","of","off","on","once","only","or","other","ought","our","ours","ourselves","out","over","own",
            "same","she","she'd","she'll","she's","should","shouldn't","so","some","such",
            "than","that","that's","the","their","theirs","them","themselves","then","there","there's","these","they","they'd","they'll","they're","they've","this","those","through","to","too",
            "under","until","up","very",
            "was","wasn't","we","we'd","we'll","we're","we've","were","weren't","what","what's","when","when's","where","where's","which","while","who","who's","whom","why","why's","will","with","won't","would","wouldn't",
            "you","you'd","you'll","you're","you've","your","yours","yourself","yourselves"
        ];
        words.iter().copied().collect()
    };
}

/// Text analysis pipeline shared by indexing and querying.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Analyzer {
    /// NFKC, lowercase, classic stop words.
    Standard,
    /// Standard plus possessive stripping, a wider stop list and stemming.
    English,
}

impl Analyzer {
    /// Maps a console menu choice; anything other than 1 selects English.
    pub fn from_code(code: i64) -> Self {
        if code == 1 {
            Analyzer::Standard
        } else {
            Analyzer::English
        }
    }

    /// Short name used in output file names.
    pub fn short_name(self) -> &'static str {
        match self {
            Analyzer::Standard => "sd",
            Analyzer::English => "en",
        }
    }

    /// Tokenize text into (term, position). Positions count every word, so
    /// removed stop words leave gaps.
    pub fn analyze(self, text: &str) -> Vec<(String, usize)> {
        let normalized = text.nfkc().collect::<String>().to_lowercase();
        let mut tokens = Vec::new();
        for (pos, mat) in RE.find_iter(&normalized).enumerate() {
            let token = mat.as_str();
            match self {
                Analyzer::Standard => {
                    let token = token.trim_end_matches('\'');
                    if token.is_empty() || CLASSIC_STOPWORDS.contains(token) { continue; }
                    tokens.push((token.to_string(), pos));
                }
                Analyzer::English => {
                    if ENGLISH_STOPWORDS.contains(token) { continue; }
                    let token = strip_possessive(token);
                    if token.is_empty() || ENGLISH_STOPWORDS.contains(token) { continue; }
                    tokens.push((STEMMER.stem(token).to_string(), pos));
                }
            }
        }
        tokens
    }
}

impl fmt::Display for Analyzer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Analyzer::Standard => f.write_str("standard"),
            Analyzer::English => f.write_str("english"),
        }
    }
}

fn strip_possessive(token: &str) -> &str {
    let token = token.strip_suffix("'s").unwrap_or(token);
    token.trim_end_matches('\'')
}
