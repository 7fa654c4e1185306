//! Query core for a range-partitioned tf-idf inverted index.
//!
//! The index is a set of read-only JSON artifacts: a directory of threshold keys naming the
//! partition files, the partitions themselves (term → postings), and a document store. A
//! [`QueryEngine`] owns a [`PartitionCache`] over them and answers free-text queries with
//! boolean-AND filtering and cosine tf-idf scoring.

pub mod cache;
pub mod docstore;
pub mod engine;
pub mod index;
pub mod persist;
pub mod rank;
pub mod router;
pub mod tokenizer;

pub use cache::{CacheStats, PartitionCache, TermLookup};
pub use docstore::DocumentStore;
pub use engine::{EngineConfig, Hit, QueryEngine, QueryError};
pub use index::{DirectoryError, DocId, DocumentEntry, Occurrences, Partition, PartitionDirectory, Posting, Postings};
pub use persist::{FsPartitionSource, IndexPaths, MemoryPartitions, PartitionSource};
pub use rank::{NoRank, StaticRank, UrlRank};
pub use tokenizer::{Analyzer, PlainAnalyzer, StemmingAnalyzer};
