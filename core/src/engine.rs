//! Query evaluation: boolean-AND candidate filtering, then tf-idf cosine scoring.
//!
//! A query is normalized into terms by the engine's [`Analyzer`]. Every distinct term must be
//! present in a document for that document to be a candidate; a single term missing from the
//! index (or whose partition cannot be loaded) empties the result. Surviving candidates are
//! scored by the cosine between the query's tf-idf vector and the document's, where a
//! document's term frequency is the sum of its text, header and emphasis occurrences. Results
//! are ordered by URL popularity, score, then URL, and truncated to `max_results`.

use crate::cache::{CacheStats, PartitionCache, TermLookup};
use crate::docstore::{load_documents, DocumentStore};
use crate::index::{DocId, Posting};
use crate::persist::{load_directory, IndexPaths};
use crate::rank::{compare_ranked, NoRank, RankedHit, UrlRank};
use crate::tokenizer::{Analyzer, StemmingAnalyzer};
use anyhow::Result;
use serde::Serialize;
use std::collections::HashMap;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Hit {
    pub doc_id: DocId,
    pub url: String,
    pub title: String,
    pub description: String,
    pub score: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum QueryError {
    /// Normalization left nothing to search for, as opposed to a query that matched nothing.
    #[error("query contains no searchable terms")]
    NoTerms,
}

#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Hits returned per query.
    pub max_results: usize,
    /// Corpus size used for idf. Defaults to the number of documents in the store.
    pub total_documents: Option<usize>,
    /// Raw text whose terms are preloaded by [`QueryEngine::warm_up`].
    pub warm_terms: Vec<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self { max_results: 5, total_documents: None, warm_terms: Vec::new() }
    }
}

pub struct QueryEngine {
    cache: PartitionCache,
    documents: DocumentStore,
    analyzer: Box<dyn Analyzer>,
    ranker: Box<dyn UrlRank>,
    config: EngineConfig,
}

// doc id -> combined frequency of each query term, in query-term order
type Candidates = HashMap<DocId, Vec<i64>>;

impl QueryEngine {
    pub fn new(cache: PartitionCache, documents: DocumentStore) -> Self {
        Self {
            cache,
            documents,
            analyzer: Box::new(StemmingAnalyzer::new()),
            ranker: Box::new(NoRank),
            config: EngineConfig::default(),
        }
    }

    /// Opens the index under `paths`: reads the partition directory and document store now,
    /// partitions on first use.
    pub fn open(paths: &IndexPaths) -> Result<Self> {
        let directory = load_directory(paths)?;
        let documents = load_documents(paths)?;
        info!(
            root = %paths.root.display(),
            partitions = directory.files().len(),
            documents = documents.len(),
            "index opened"
        );
        let cache = PartitionCache::new(directory, paths.partition_source());
        Ok(Self::new(cache, documents))
    }

    pub fn with_analyzer(mut self, analyzer: impl Analyzer + 'static) -> Self {
        self.analyzer = Box::new(analyzer);
        self
    }

    pub fn with_ranker(mut self, ranker: impl UrlRank + 'static) -> Self {
        self.ranker = Box::new(ranker);
        self
    }

    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn cache(&self) -> &PartitionCache { &self.cache }
    pub fn documents(&self) -> &DocumentStore { &self.documents }
    pub fn config(&self) -> &EngineConfig { &self.config }

    pub fn total_documents(&self) -> usize {
        self.config.total_documents.unwrap_or(self.documents.len()).max(1)
    }

    pub fn idf(&self, term: &str) -> Option<f64> {
        self.cache.idf(term, self.total_documents())
    }

    /// Loads every partition and caches the terms of `config.warm_terms` plus `extra`.
    /// Purely an optimization: evaluation fills the same caches lazily.
    pub fn warm_up<I, S>(&self, extra: I) -> CacheStats
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let loaded = self.cache.warm_partitions();
        let mut terms: Vec<String> = Vec::new();
        for text in &self.config.warm_terms {
            terms.extend(self.analyzer.terms(text));
        }
        for text in extra {
            terms.extend(self.analyzer.terms(text.as_ref()));
        }
        let found = self.cache.warm_terms(terms.iter().map(String::as_str), self.total_documents());
        let stats = self.cache.stats();
        info!(partitions = loaded, terms = terms.len(), found, "cache warm-up complete");
        stats
    }

    pub fn evaluate(&self, query: &str) -> Result<Vec<Hit>, QueryError> {
        let terms = self.analyzer.terms(query);
        if terms.is_empty() {
            return Err(QueryError::NoTerms);
        }

        // distinct terms in first-occurrence order, with their query frequency
        let mut order: Vec<&str> = Vec::new();
        let mut query_frequency: HashMap<&str, u32> = HashMap::new();
        for term in &terms {
            let count = query_frequency.entry(term.as_str()).or_insert(0);
            if *count == 0 {
                order.push(term.as_str());
            }
            *count += 1;
        }

        let Some(candidates) = self.intersect(&order) else {
            return Ok(Vec::new());
        };
        if candidates.is_empty() {
            debug!(query, "no document contains every term");
            return Ok(Vec::new());
        }

        // (idf, query weight) per term; None for terms without postings
        let total = self.total_documents();
        let weights: Vec<Option<(f64, f64)>> = order
            .iter()
            .map(|term| {
                let idf = self.cache.idf(term, total)?;
                Some((idf, f64::from(query_frequency[term]) * idf))
            })
            .collect();
        let query_norm = weights.iter().flatten().map(|(_, w)| w * w).sum::<f64>().sqrt();

        let candidate_count = candidates.len();
        let mut ranked: Vec<RankedHit> = candidates
            .into_iter()
            .map(|(doc_id, frequencies)| {
                let score = cosine(&frequencies, &weights, query_norm);
                let entry = self.documents.lookup(doc_id);
                RankedHit {
                    popularity: self.ranker.rank(&entry.url),
                    hit: Hit { doc_id, url: entry.url, title: entry.title, description: entry.description, score },
                }
            })
            .collect();
        ranked.sort_unstable_by(compare_ranked);
        ranked.truncate(self.config.max_results);

        let hits: Vec<Hit> = ranked.into_iter().map(|r| r.hit).collect();
        debug!(query, terms = order.len(), candidates = candidate_count, hits = hits.len(), "query evaluated");
        Ok(hits)
    }

    /// Documents containing every term, or `None` as soon as a term has no postings.
    /// Each step builds a fresh map from the previous one.
    fn intersect(&self, terms: &[&str]) -> Option<Candidates> {
        let mut candidates = Candidates::new();
        for (i, &term) in terms.iter().enumerate() {
            let postings = match self.cache.lookup(term) {
                TermLookup::Found(postings) => postings,
                TermLookup::Absent => {
                    debug!(term, "term not in index");
                    return None;
                }
                TermLookup::Unavailable => {
                    warn!(term, "partition unavailable, treating term as absent");
                    return None;
                }
            };

            // duplicate postings for one document add up
            let current = frequencies(&postings);
            candidates = if i == 0 {
                current
                    .into_iter()
                    .filter(|&(_, frequency)| frequency > 0)
                    .map(|(doc_id, frequency)| (doc_id, vec![frequency]))
                    .collect()
            } else {
                candidates
                    .into_iter()
                    .filter_map(|(doc_id, mut row)| {
                        row.push(*current.get(&doc_id)?);
                        Some((doc_id, row))
                    })
                    .collect()
            };
        }
        Some(candidates)
    }
}

fn frequencies(postings: &[Posting]) -> HashMap<DocId, i64> {
    let mut combined: HashMap<DocId, i64> = HashMap::with_capacity(postings.len());
    for posting in postings {
        let frequency = combined.entry(posting.document_id).or_insert(0);
        *frequency = frequency.saturating_add(posting.combined_frequency());
    }
    combined
}

/// Cosine between a candidate's tf-idf vector and the query's. Terms are visited in query
/// order so repeated evaluations sum in the same order and produce identical bits.
fn cosine(frequencies: &[i64], weights: &[Option<(f64, f64)>], query_norm: f64) -> f64 {
    let mut dot = 0.0;
    let mut norm = 0.0;
    for (&frequency, weight) in frequencies.iter().zip(weights) {
        let Some((idf, query_weight)) = weight else { continue };
        let doc_weight = frequency as f64 * idf;
        dot += doc_weight * query_weight;
        norm += doc_weight * doc_weight;
    }
    let doc_norm: f64 = norm.sqrt();
    if query_norm != 0.0 && doc_norm != 0.0 {
        dot / (query_norm * doc_norm)
    } else {
        0.0
    }
}
