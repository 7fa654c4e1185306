//! URL popularity, the primary ordering key for results.
//!
//! Ranks come from outside the index (a link-analysis job, a click log). Results sort by
//! popularity first, then by score, then by URL so equal inputs always produce the same order.

use crate::engine::Hit;
use crate::persist::read_text;
use anyhow::{Context, Result};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::path::Path;

/// A source of URL popularity. Higher ranks sort first; unknown URLs rank 0.
pub trait UrlRank: Send + Sync {
    fn rank(&self, url: &str) -> f64;
}

/// Every URL ranks 0, leaving the order to score and URL.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoRank;

impl UrlRank for NoRank {
    fn rank(&self, _url: &str) -> f64 {
        0.0
    }
}

/// Fixed URL → rank table, typically loaded from a JSON object.
#[derive(Debug, Clone, Default)]
pub struct StaticRank {
    ranks: HashMap<String, f64>,
}

impl StaticRank {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let ranks: HashMap<String, f64> = serde_json::from_str(json)?;
        Ok(Self { ranks })
    }

    pub fn load(path: &Path) -> Result<Self> {
        let buf = read_text(path)?;
        Self::from_json_str(&buf).with_context(|| format!("parsing {}", path.display()))
    }

    pub fn len(&self) -> usize {
        self.ranks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranks.is_empty()
    }
}

impl<S: Into<String>> FromIterator<(S, f64)> for StaticRank {
    fn from_iter<I: IntoIterator<Item = (S, f64)>>(iter: I) -> Self {
        Self { ranks: iter.into_iter().map(|(url, rank)| (url.into(), rank)).collect() }
    }
}

impl UrlRank for StaticRank {
    fn rank(&self, url: &str) -> f64 {
        self.ranks.get(url).copied().filter(|r| r.is_finite()).unwrap_or(0.0)
    }
}

/// A scored hit together with the popularity it sorts under.
#[derive(Debug, Clone)]
pub(crate) struct RankedHit {
    pub popularity: f64,
    pub hit: Hit,
}

/// Popularity descending, score descending, URL ascending, then document id.
pub(crate) fn compare_ranked(a: &RankedHit, b: &RankedHit) -> Ordering {
    b.popularity
        .total_cmp(&a.popularity)
        .then_with(|| b.hit.score.total_cmp(&a.hit.score))
        .then_with(|| a.hit.url.cmp(&b.hit.url))
        .then_with(|| a.hit.doc_id.cmp(&b.hit.doc_id))
}
