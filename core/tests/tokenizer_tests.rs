use query_core::tokenizer::{tokenize, Analyzer, PlainAnalyzer, StemmingAnalyzer};

#[test]
fn it_folds_and_stems() {
    let words = tokenize("Running Runners RUN! The café's menu.");
    // Stemming to "run" should appear
    assert!(words.contains(&"run".to_string()));
    // Diacritics are folded away: café -> cafe
    assert!(words.contains(&"cafe".to_string()));
}

#[test]
fn it_keeps_stopwords_unless_asked() {
    let text = "The quick brown fox and the lazy dog";
    let kept = StemmingAnalyzer::new().terms(text);
    assert!(kept.contains(&"the".to_string()));

    let dropped = StemmingAnalyzer::new().without_stopwords().terms(text);
    assert!(!dropped.contains(&"the".to_string()));
    assert!(!dropped.contains(&"and".to_string()));
    assert!(dropped.contains(&"fox".to_string()));
}

#[test]
fn analyzers_preserve_query_order() {
    assert_eq!(PlainAnalyzer.terms("Machine LEARNING machine"), vec!["machine", "learning", "machine"]);
    let stemmed = StemmingAnalyzer::new().terms("Learning machines");
    assert_eq!(stemmed, vec!["learn", "machin"]);
}

#[test]
fn punctuation_only_yields_nothing() {
    assert!(StemmingAnalyzer::new().terms("?! -- ...").is_empty());
    assert!(PlainAnalyzer.terms("").is_empty());
}
