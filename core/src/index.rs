use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

pub type DocId = u32;

/// Postings of one term, shared between the partition that owns them and the token cache.
pub type Postings = Arc<[Posting]>;

/// How often a term occurs in one document, split by where it occurred.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "RawOccurrences")]
pub struct Occurrences {
    pub text_count: i64,
    pub header_count: i64,
    pub important_count: i64,
}

impl Occurrences {
    pub fn text(text_count: i64) -> Self {
        Self { text_count, ..Self::default() }
    }

    /// Sum over every location; this is the term frequency used for scoring. Saturates
    /// instead of overflowing on absurd counts.
    pub fn combined(&self) -> i64 {
        self.text_count.saturating_add(self.header_count).saturating_add(self.important_count)
    }
}

// Older index builds wrote `occurrences` as a bare body-text count.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawOccurrences {
    Counts {
        #[serde(default, rename = "textCount")]
        text_count: i64,
        #[serde(default, rename = "headerCount")]
        header_count: i64,
        #[serde(default, rename = "importantCount")]
        important_count: i64,
    },
    Legacy(i64),
}

impl From<RawOccurrences> for Occurrences {
    fn from(raw: RawOccurrences) -> Self {
        match raw {
            RawOccurrences::Counts { text_count, header_count, important_count } => {
                Self { text_count, header_count, important_count }
            }
            RawOccurrences::Legacy(text_count) => Self::text(text_count),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Posting {
    pub document_id: DocId,
    #[serde(default)]
    pub occurrences: Occurrences,
}

impl Posting {
    pub fn new(document_id: DocId, occurrences: Occurrences) -> Self {
        Self { document_id, occurrences }
    }

    pub fn combined_frequency(&self) -> i64 {
        self.occurrences.combined()
    }
}

/// One leaf file of the inverted index: every term in its key range with its full posting list.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(from = "HashMap<String, Vec<Posting>>")]
pub struct Partition {
    terms: HashMap<String, Postings>,
}

impl Partition {
    pub fn get(&self, term: &str) -> Option<&Postings> {
        self.terms.get(term)
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn terms(&self) -> impl Iterator<Item = &str> {
        self.terms.keys().map(String::as_str)
    }
}

impl From<HashMap<String, Vec<Posting>>> for Partition {
    fn from(raw: HashMap<String, Vec<Posting>>) -> Self {
        let terms = raw.into_iter().map(|(term, postings)| (term, Postings::from(postings))).collect();
        Self { terms }
    }
}

impl<S: Into<String>> FromIterator<(S, Vec<Posting>)> for Partition {
    fn from_iter<I: IntoIterator<Item = (S, Vec<Posting>)>>(iter: I) -> Self {
        let terms = iter.into_iter().map(|(term, postings)| (term.into(), Postings::from(postings))).collect();
        Self { terms }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DirectoryError {
    #[error("partition directory lists no index files")]
    NoFiles,
    #[error("partition directory has {keys} keys for {files} files")]
    KeyCount { keys: usize, files: usize },
    #[error("partition keys are not strictly ascending at position {position}")]
    Unsorted { position: usize },
}

/// The root of a range-partitioned index: ascending threshold keys and the files they separate.
///
/// A directory either carries one key per file, or one key fewer than files (the keys are then
/// pure separators). In both shapes a term belongs to the file co-indexed with the first key
/// strictly greater than it, or to the last file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawDirectory", into = "RawDirectory")]
pub struct PartitionDirectory {
    keys: Vec<String>,
    files: Vec<String>,
}

impl PartitionDirectory {
    pub fn new(keys: Vec<String>, files: Vec<String>) -> Result<Self, DirectoryError> {
        if files.is_empty() {
            return Err(DirectoryError::NoFiles);
        }
        if keys.len() != files.len() && keys.len() + 1 != files.len() {
            return Err(DirectoryError::KeyCount { keys: keys.len(), files: files.len() });
        }
        if let Some(position) = keys.windows(2).position(|pair| pair[0] >= pair[1]) {
            return Err(DirectoryError::Unsorted { position: position + 1 });
        }
        Ok(Self { keys, files })
    }

    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    /// Never empty.
    pub fn files(&self) -> &[String] {
        &self.files
    }
}

#[derive(Serialize, Deserialize)]
struct RawDirectory {
    keys: Vec<String>,
    #[serde(rename = "indexFiles")]
    index_files: Vec<String>,
}

impl TryFrom<RawDirectory> for PartitionDirectory {
    type Error = DirectoryError;

    fn try_from(raw: RawDirectory) -> Result<Self, Self::Error> {
        Self::new(raw.keys, raw.index_files)
    }
}

impl From<PartitionDirectory> for RawDirectory {
    fn from(dir: PartitionDirectory) -> Self {
        Self { keys: dir.keys, index_files: dir.files }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DocumentEntry {
    pub id: DocId,
    pub url: String,
    pub title: String,
    pub description: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn occurrences_accept_both_shapes() {
        let postings: Vec<Posting> = serde_json::from_str(
            r#"[{"documentId": 1, "occurrences": {"textCount": 2, "headerCount": 1}},
                {"documentId": 2, "occurrences": 3},
                {"documentId": 3}]"#,
        )
        .unwrap();
        assert_eq!(postings[0].occurrences, Occurrences { text_count: 2, header_count: 1, important_count: 0 });
        assert_eq!(postings[0].combined_frequency(), 3);
        assert_eq!(postings[1].occurrences, Occurrences::text(3));
        assert_eq!(postings[2].combined_frequency(), 0);
    }

    #[test]
    fn combined_frequency_saturates() {
        let posting: Posting = serde_json::from_str(
            r#"{"documentId": 7, "occurrences": {"textCount": 9223372036854775807, "headerCount": 1}}"#,
        )
        .unwrap();
        assert_eq!(posting.combined_frequency(), i64::MAX);
        let low = Occurrences { text_count: i64::MIN, header_count: -1, important_count: 0 };
        assert_eq!(low.combined(), i64::MIN);
    }

    #[test]
    fn directory_rejects_malformed_layouts() {
        let s = |v: &[&str]| v.iter().map(|x| x.to_string()).collect::<Vec<_>>();
        assert_eq!(PartitionDirectory::new(s(&[]), s(&[])), Err(DirectoryError::NoFiles));
        assert_eq!(
            PartitionDirectory::new(s(&["a", "b", "c"]), s(&["p0"])),
            Err(DirectoryError::KeyCount { keys: 3, files: 1 })
        );
        assert_eq!(
            PartitionDirectory::new(s(&["m", "c"]), s(&["p0", "p1"])),
            Err(DirectoryError::Unsorted { position: 1 })
        );
        assert!(PartitionDirectory::new(s(&["m"]), s(&["p0", "p1"])).is_ok());
        assert!(PartitionDirectory::new(s(&["g", "m"]), s(&["p0", "p1"])).is_ok());
    }

    #[test]
    fn directory_reads_builder_json() {
        let dir: PartitionDirectory =
            serde_json::from_str(r#"{"keys": ["f", "q"], "indexFiles": ["index_0.json", "index_1.json", "index_2.json"]}"#)
                .unwrap();
        assert_eq!(dir.keys(), ["f", "q"]);
        assert_eq!(dir.files().len(), 3);

        let bad = serde_json::from_str::<PartitionDirectory>(r#"{"keys": ["q", "f"], "indexFiles": ["a", "b"]}"#);
        assert!(bad.is_err());
    }
}
