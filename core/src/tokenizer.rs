use lazy_static::lazy_static;
use regex::Regex;
use rust_stemmers::{Algorithm, Stemmer};
use std::collections::HashSet;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

lazy_static! {
    static ref WORD: Regex = Regex::new(r"[a-z0-9]+").expect("valid regex");
    static ref ASCII_WORD: Regex = Regex::new(r"[A-Za-z0-9]+").expect("valid regex");
    static ref STEMMER: Stemmer = Stemmer::create(Algorithm::English);
    static ref STOPWORDS: HashSet<&'static str> = {
        let words: &[&str] = &[
            "a","about","above","after","again","against","all","am","an","and","any","are","as","at",
            "be","because","been","before","being","below","between","both","but","by",
            "can","cannot","could",
            "did","do","does","doing","down","during",
            "each","few","for","from","further",
            "had","has","have","having","he","her","here","hers","herself","him","himself","his","how",
            "i","if","in","into","is","it","its","itself",
            "me","more","most","my","myself",
            "no","nor","not","of","off","on","once","only","or","other","ought","our","ours","ourselves","out","over","own",
            "same","she","should","so","some","such",
            "than","that","the","their","theirs","them","themselves","then","there","these","they","this","those","through","to","too",
            "under","until","up","very",
            "was","we","were","what","when","where","which","while","who","whom","why","with","would",
            "you","your","yours","yourself","yourselves"
        ];
        words.iter().copied().collect()
    };
}

/// Turns free text into the ordered sequence of index terms it should be looked up under.
///
/// The analyzer used at query time must normalize exactly like the one the index was built with,
/// otherwise terms route to the right partition but never match a key.
pub trait Analyzer: Send + Sync {
    fn terms(&self, text: &str) -> Vec<String>;
}

impl<F> Analyzer for F
where
    F: Fn(&str) -> Vec<String> + Send + Sync,
{
    fn terms(&self, text: &str) -> Vec<String> {
        self(text)
    }
}

pub fn is_stopword(token: &str) -> bool { STOPWORDS.contains(token) }

/// Tokenize text into terms in order: NFKD with combining marks stripped, lowercase,
/// alphanumeric runs, English stemming.
pub fn tokenize(text: &str) -> Vec<String> {
    let folded: String = text.nfkd().filter(|c| !is_combining_mark(*c)).collect::<String>().to_lowercase();
    WORD.find_iter(&folded).map(|mat| STEMMER.stem(mat.as_str()).into_owned()).collect()
}

/// Folded, lowercased, Snowball-stemmed alphanumeric runs. Stopwords are kept unless asked
/// otherwise. Index builders that use a different stemmer (Porter, say) or skip the Unicode
/// folding will disagree on some terms; pair such an index with a matching [`Analyzer`].
#[derive(Debug, Clone, Copy, Default)]
pub struct StemmingAnalyzer {
    drop_stopwords: bool,
}

impl StemmingAnalyzer {
    pub fn new() -> Self { Self::default() }

    pub fn without_stopwords(self) -> Self {
        Self { drop_stopwords: true }
    }
}

impl Analyzer for StemmingAnalyzer {
    fn terms(&self, text: &str) -> Vec<String> {
        let tokens = tokenize(text).into_iter();
        if self.drop_stopwords {
            tokens.filter(|term| !is_stopword(term)).collect()
        } else {
            tokens.collect()
        }
    }
}

/// ASCII alphanumeric runs, lowercased, no stemming.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainAnalyzer;

impl Analyzer for PlainAnalyzer {
    fn terms(&self, text: &str) -> Vec<String> {
        ASCII_WORD.find_iter(text).map(|m| m.as_str().to_ascii_lowercase()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_tokenize() {
        let t = tokenize("Running, runner's run!");
        assert_eq!(t.first().map(String::as_str), Some("run"));
        assert_eq!(t.len(), 4);
    }

    #[test]
    fn plain_splits_on_punctuation() {
        assert_eq!(PlainAnalyzer.terms("Hello, world! 123, testing."), vec!["hello", "world", "123", "testing"]);
        assert!(PlainAnalyzer.terms("  ... ").is_empty());
    }

    #[test]
    fn closures_are_analyzers() {
        let split = |text: &str| text.split_whitespace().map(str::to_owned).collect::<Vec<_>>();
        assert_eq!(split.terms("a B"), vec!["a", "B"]);
    }
}
