//! Immutable quote catalog.
//!
//! The catalog is loaded once from the bundled dataset (or an external file
//! named in the engine config). A dataset that is missing, malformed, or
//! empty is replaced by a small built-in set so the engine always has
//! something to show.

use std::collections::{BTreeSet, HashSet};
use std::path::Path;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

const BUNDLED_DATASET: &str = include_str!("../data/quotes.json");

/// A single quote. Never mutated after load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    pub id: String,
    pub text: String,
    pub author: String,
    #[serde(default)]
    pub topics: BTreeSet<String>,
    #[serde(default)]
    pub moods: BTreeSet<String>,
    /// Background category, only consulted by theme filtering.
    #[serde(default)]
    pub background_style: String,
}

impl Quote {
    pub fn new(id: impl Into<String>, text: impl Into<String>, author: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            author: author.into(),
            topics: BTreeSet::new(),
            moods: BTreeSet::new(),
            background_style: String::new(),
        }
    }

    pub fn with_topics<I, S>(mut self, topics: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.topics = topics.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_moods<I, S>(mut self, moods: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.moods = moods.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_background_style(mut self, style: impl Into<String>) -> Self {
        self.background_style = style.into();
        self
    }

    /// Notification body text: `"<text>" - <author>`.
    pub fn notification_body(&self) -> String {
        format!("\"{}\" - {}", self.text, self.author)
    }
}

fn fallback_quotes() -> Vec<Quote> {
    vec![
        Quote::new(
            "fallback-1",
            "The only way to do great work is to love what you do.",
            "Steve Jobs",
        )
        .with_topics(["work", "passion"])
        .with_moods(["motivated"])
        .with_background_style("minimal"),
        Quote::new(
            "fallback-2",
            "Believe you can and you're halfway there.",
            "Theodore Roosevelt",
        )
        .with_topics(["belief", "success"])
        .with_moods(["motivated", "hopeful"])
        .with_background_style("nature"),
        Quote::new(
            "fallback-3",
            "The best time to plant a tree was 20 years ago. The second best time is now.",
            "Chinese Proverb",
        )
        .with_topics(["action", "time"])
        .with_moods(["motivated", "peaceful"])
        .with_background_style("nature"),
    ]
}

/// In-memory list of quotes, shared read-only by every component.
#[derive(Debug, Clone)]
pub struct QuoteCatalog {
    quotes: Vec<Quote>,
    is_fallback: bool,
}

impl QuoteCatalog {
    /// Catalog built from the dataset compiled into the crate.
    pub fn bundled() -> Self {
        Self::from_json_str(BUNDLED_DATASET)
    }

    /// Catalog built from the built-in fallback set.
    pub fn fallback() -> Self {
        Self {
            quotes: fallback_quotes(),
            is_fallback: true,
        }
    }

    /// Wrap an explicit list of quotes. No fallback is applied, so the
    /// result may be empty.
    pub fn from_quotes(quotes: Vec<Quote>) -> Self {
        Self {
            quotes: dedup_by_id(quotes),
            is_fallback: false,
        }
    }

    /// Parse a JSON dataset, falling back to the built-in set when the
    /// document is not a non-empty array of valid quote records.
    pub fn from_json_str(json: &str) -> Self {
        match parse_dataset(json) {
            Ok(quotes) => Self::from_quotes(quotes),
            Err(reason) => {
                tracing::error!("quote dataset rejected ({reason}), using fallback quotes");
                Self::fallback()
            }
        }
    }

    /// Read a dataset from disk with the same fallback rule as
    /// [`from_json_str`](Self::from_json_str).
    pub fn load_from_path(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match std::fs::read_to_string(path) {
            Ok(content) => Self::from_json_str(&content),
            Err(e) => {
                tracing::error!("cannot read quote dataset {}: {e}, using fallback quotes", path.display());
                Self::fallback()
            }
        }
    }

    pub fn quotes(&self) -> &[Quote] {
        &self.quotes
    }

    pub fn len(&self) -> usize {
        self.quotes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.quotes.is_empty()
    }

    /// Whether the built-in fallback set replaced the requested dataset.
    pub fn is_fallback(&self) -> bool {
        self.is_fallback
    }

    pub fn get(&self, id: &str) -> Option<&Quote> {
        self.quotes.iter().find(|q| q.id == id)
    }

    /// Uniformly random quote, `None` only for an empty catalog.
    pub fn random<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<&Quote> {
        self.quotes.choose(rng)
    }

    /// Quotes by `author`, compared case-insensitively.
    pub fn by_author(&self, author: &str) -> Vec<&Quote> {
        if author.is_empty() {
            return Vec::new();
        }
        let needle = author.to_lowercase();
        self.quotes
            .iter()
            .filter(|q| q.author.to_lowercase() == needle)
            .collect()
    }

    /// Quotes tagged with `topic`, compared case-insensitively.
    pub fn by_topic(&self, topic: &str) -> Vec<&Quote> {
        Self::matching_tag(&self.quotes, topic, |q| &q.topics)
    }

    /// Quotes tagged with `mood`, compared case-insensitively.
    pub fn by_mood(&self, mood: &str) -> Vec<&Quote> {
        Self::matching_tag(&self.quotes, mood, |q| &q.moods)
    }

    pub fn authors(&self) -> BTreeSet<&str> {
        self.quotes.iter().map(|q| q.author.as_str()).collect()
    }

    pub fn topics(&self) -> BTreeSet<&str> {
        self.quotes
            .iter()
            .flat_map(|q| q.topics.iter().map(String::as_str))
            .collect()
    }

    pub fn moods(&self) -> BTreeSet<&str> {
        self.quotes
            .iter()
            .flat_map(|q| q.moods.iter().map(String::as_str))
            .collect()
    }

    fn matching_tag<'a>(
        quotes: &'a [Quote],
        tag: &str,
        tags: impl Fn(&Quote) -> &BTreeSet<String>,
    ) -> Vec<&'a Quote> {
        if tag.is_empty() {
            return Vec::new();
        }
        let needle = tag.to_lowercase();
        quotes
            .iter()
            .filter(|q| tags(q).iter().any(|t| t.to_lowercase() == needle))
            .collect()
    }
}

impl Default for QuoteCatalog {
    fn default() -> Self {
        Self::bundled()
    }
}

fn parse_dataset(json: &str) -> Result<Vec<Quote>, String> {
    let value: serde_json::Value = serde_json::from_str(json).map_err(|e| e.to_string())?;
    match value.as_array() {
        Some(items) if !items.is_empty() => {}
        Some(_) => return Err("dataset is empty".to_string()),
        None => return Err("dataset is not an array".to_string()),
    }
    serde_json::from_value(value).map_err(|e| e.to_string())
}

fn dedup_by_id(quotes: Vec<Quote>) -> Vec<Quote> {
    let mut seen = HashSet::new();
    quotes
        .into_iter()
        .filter(|q| {
            let fresh = seen.insert(q.id.clone());
            if !fresh {
                tracing::warn!("duplicate quote id '{}' ignored", q.id);
            }
            fresh
        })
        .collect()
}
