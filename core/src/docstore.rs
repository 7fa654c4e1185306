use crate::index::{DocId, DocumentEntry};
use crate::persist::{read_text, IndexPaths};
use anyhow::{Context, Result};
use serde::de::IgnoredAny;
use serde::Deserialize;
use std::collections::hash_map::Entry;
use std::collections::{BTreeMap, HashMap};
use tracing::warn;

/// Read-only metadata for every indexed document, keyed by the dense id the builder assigned.
#[derive(Debug, Clone, Default)]
pub struct DocumentStore {
    docs: HashMap<DocId, DocumentEntry>,
}

impl DocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `entry` unless its id is already taken; returns whether it was added.
    pub fn insert(&mut self, entry: DocumentEntry) -> bool {
        match self.docs.entry(entry.id) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(entry);
                true
            }
        }
    }

    pub fn get(&self, id: DocId) -> Option<&DocumentEntry> {
        self.docs.get(&id)
    }

    /// Metadata for `id`, or an entry with empty fields when a stale index references a
    /// document the store no longer knows.
    pub fn lookup(&self, id: DocId) -> DocumentEntry {
        self.get(id).cloned().unwrap_or_else(|| DocumentEntry { id, ..DocumentEntry::default() })
    }

    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    /// Parses either docs.json layout into one id-keyed store.
    ///
    /// Current builds key by id (`{"12": {"url": .., "title": .., "description": ..}}`); older
    /// ones key by URL with the id as value (`{"http://..": 12}` or `{"http://..": "12"}`).
    /// Entries whose id does not parse are skipped, and a repeated id keeps its first entry.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let raw: BTreeMap<String, StoredDocument> = serde_json::from_str(json)?;
        let mut store = Self::new();
        for (key, value) in raw {
            let entry = match value {
                StoredDocument::Metadata { url, title, description } => match key.trim().parse::<DocId>() {
                    Ok(id) => DocumentEntry { id, url, title, description },
                    Err(_) => {
                        warn!(key = %key, "skipping document with non-numeric id");
                        continue;
                    }
                },
                StoredDocument::UrlKeyed(id) => match id.parse() {
                    Some(id) => DocumentEntry { id, url: key, ..DocumentEntry::default() },
                    None => {
                        warn!(url = %key, "skipping document with unusable id");
                        continue;
                    }
                },
            };
            let id = entry.id;
            if !store.insert(entry) {
                warn!(id, "duplicate document id; keeping the first entry");
            }
        }
        Ok(store)
    }
}

impl FromIterator<DocumentEntry> for DocumentStore {
    fn from_iter<I: IntoIterator<Item = DocumentEntry>>(iter: I) -> Self {
        let mut store = Self::new();
        for entry in iter {
            store.insert(entry);
        }
        store
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StoredDocument {
    Metadata {
        #[serde(default)]
        url: String,
        #[serde(default)]
        title: String,
        #[serde(default)]
        description: String,
    },
    UrlKeyed(StoredId),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StoredId {
    Number(u64),
    Text(String),
    Other(IgnoredAny),
}

impl StoredId {
    fn parse(&self) -> Option<DocId> {
        match self {
            StoredId::Number(n) => DocId::try_from(*n).ok(),
            StoredId::Text(s) => s.trim().parse().ok(),
            StoredId::Other(_) => None,
        }
    }
}

pub fn load_documents(paths: &IndexPaths) -> Result<DocumentStore> {
    let path = paths.docs();
    let buf = read_text(&path)?;
    DocumentStore::from_json_str(&buf).with_context(|| format!("parsing {}", path.display()))
}
