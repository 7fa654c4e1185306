//! Process-lifetime caches over an immutable partitioned index.
//!
//! Three maps, each behind its own `RwLock` so concurrent queries only contend while inserting:
//!
//! - partitions: file name → parsed partition, filled on first touch;
//! - tokens: term → posting list, a shortcut that skips routing once a term has been seen;
//! - idf: term → inverse document frequency, tagged with the document total it was computed for.
//!
//! Nothing is ever evicted. Loads are idempotent, so two queries racing on the same cold
//! partition may both read it; the first insert wins and later readers see that copy.

use crate::index::{Partition, PartitionDirectory, Postings};
use crate::persist::PartitionSource;
use crate::router::resolve_file;
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Outcome of looking a term up in the index.
#[derive(Debug, Clone)]
pub enum TermLookup {
    Found(Postings),
    /// The term's partition loaded and does not contain it.
    Absent,
    /// The term's partition could not be read or parsed.
    Unavailable,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub partitions: usize,
    pub tokens: usize,
    pub idf: usize,
}

pub struct PartitionCache {
    directory: PartitionDirectory,
    source: Box<dyn PartitionSource>,
    partitions: RwLock<HashMap<String, Arc<Partition>>>,
    tokens: RwLock<HashMap<String, Postings>>,
    idf: RwLock<HashMap<String, (usize, f64)>>,
}

impl PartitionCache {
    pub fn new(directory: PartitionDirectory, source: impl PartitionSource + 'static) -> Self {
        Self {
            directory,
            source: Box::new(source),
            partitions: RwLock::new(HashMap::new()),
            tokens: RwLock::new(HashMap::new()),
            idf: RwLock::new(HashMap::new()),
        }
    }

    pub fn directory(&self) -> &PartitionDirectory {
        &self.directory
    }

    /// Postings for `term`, or `None` when the term is absent or its partition failed to load.
    pub fn get_postings(&self, term: &str) -> Option<Postings> {
        match self.lookup(term) {
            TermLookup::Found(postings) => Some(postings),
            TermLookup::Absent | TermLookup::Unavailable => None,
        }
    }

    pub fn lookup(&self, term: &str) -> TermLookup {
        let cached = { self.tokens.read().get(term).cloned() };
        if let Some(postings) = cached {
            return TermLookup::Found(postings);
        }

        let file = resolve_file(term, &self.directory);
        let Some(partition) = self.partition(file) else {
            return TermLookup::Unavailable;
        };
        let Some(postings) = partition.get(term) else {
            return TermLookup::Absent;
        };
        let postings = self.tokens.write().entry(term.to_owned()).or_insert_with(|| postings.clone()).clone();
        TermLookup::Found(postings)
    }

    /// Memoized `ln(total_documents / df(term))`, where df counts distinct documents; `None`
    /// when the term has no postings. A memo computed for another total is recomputed.
    pub fn idf(&self, term: &str, total_documents: usize) -> Option<f64> {
        let cached = { self.idf.read().get(term).copied() };
        if let Some((total, value)) = cached {
            if total == total_documents {
                return Some(value);
            }
        }
        let postings = self.get_postings(term)?;
        let df = postings.iter().map(|p| p.document_id).collect::<HashSet<_>>().len();
        let value = inverse_document_frequency(total_documents, df)?;
        let mut memo = self.idf.write();
        let entry = memo.entry(term.to_owned()).or_insert((total_documents, value));
        if entry.0 != total_documents {
            *entry = (total_documents, value);
        }
        Some(entry.1)
    }

    /// Loads every partition the directory names. Returns how many are resident afterwards.
    pub fn warm_partitions(&self) -> usize {
        let mut seen = HashSet::new();
        let mut resident = 0;
        for file in self.directory.files() {
            if seen.insert(file.as_str()) && self.partition(file).is_some() {
                resident += 1;
            }
        }
        info!(resident, files = seen.len(), "partitions warmed");
        resident
    }

    /// Fills the token and idf caches for `terms`. Returns how many were found.
    pub fn warm_terms<'a>(&self, terms: impl IntoIterator<Item = &'a str>, total_documents: usize) -> usize {
        terms.into_iter().filter(|term| self.idf(term, total_documents).is_some()).count()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            partitions: self.partitions.read().len(),
            tokens: self.tokens.read().len(),
            idf: self.idf.read().len(),
        }
    }

    fn partition(&self, file: &str) -> Option<Arc<Partition>> {
        let cached = { self.partitions.read().get(file).cloned() };
        if cached.is_some() {
            return cached;
        }
        // load outside the lock; a failure is not remembered so the next query retries
        match self.source.load(file) {
            Ok(loaded) => {
                debug!(partition = file, terms = loaded.len(), "partition loaded");
                let mut partitions = self.partitions.write();
                Some(partitions.entry(file.to_owned()).or_insert_with(|| Arc::new(loaded)).clone())
            }
            Err(err) => {
                let reason = format!("{err:#}");
                warn!(partition = file, error = %reason, "partition unavailable");
                None
            }
        }
    }
}

/// `ln(total / df)` with the total clamped to at least one document; `None` for `df == 0`.
pub fn inverse_document_frequency(total_documents: usize, document_frequency: usize) -> Option<f64> {
    if document_frequency == 0 {
        return None;
    }
    Some((total_documents.max(1) as f64 / document_frequency as f64).ln())
}
