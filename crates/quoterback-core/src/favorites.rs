//! Favorited quote ids, kept in the order they were added.

use std::sync::Arc;

use crate::error::StorageError;
use crate::storage::{save_json, KeyValueStore, FAVORITES_KEY};

pub struct FavoritesStore {
    store: Arc<dyn KeyValueStore>,
    favorites: Vec<String>,
    persist_error: Option<StorageError>,
}

impl FavoritesStore {
    /// Load persisted favorites. Anything other than an array of strings
    /// is treated as an empty list.
    pub fn load(store: Arc<dyn KeyValueStore>) -> Self {
        let favorites = match store.load(FAVORITES_KEY) {
            Ok(Some(value)) => serde_json::from_value::<Vec<String>>(value).unwrap_or_else(|e| {
                tracing::error!("favorites record is not a list of ids, using empty list: {e}");
                Vec::new()
            }),
            Ok(None) => Vec::new(),
            Err(e) => {
                tracing::error!("failed to load favorites: {e}");
                Vec::new()
            }
        };

        let mut loaded = Self {
            store,
            favorites: Vec::new(),
            persist_error: None,
        };
        for id in favorites {
            if !loaded.favorites.contains(&id) {
                loaded.favorites.push(id);
            }
        }
        loaded
    }

    pub fn all(&self) -> &[String] {
        &self.favorites
    }

    pub fn is_favorite(&self, quote_id: &str) -> bool {
        self.favorites.iter().any(|id| id == quote_id)
    }

    /// Add `quote_id`. Returns false if it was already a favorite.
    pub fn add(&mut self, quote_id: &str) -> bool {
        if self.is_favorite(quote_id) {
            return false;
        }
        self.favorites.push(quote_id.to_string());
        self.persist();
        true
    }

    /// Remove `quote_id`. Returns false if it was not a favorite.
    pub fn remove(&mut self, quote_id: &str) -> bool {
        let before = self.favorites.len();
        self.favorites.retain(|id| id != quote_id);
        if self.favorites.len() == before {
            return false;
        }
        self.persist();
        true
    }

    /// Flip favorite state, returning the new state.
    pub fn toggle(&mut self, quote_id: &str) -> bool {
        if self.remove(quote_id) {
            false
        } else {
            self.add(quote_id)
        }
    }

    /// Most recent persist failure, cleared once taken.
    pub fn take_persist_error(&mut self) -> Option<StorageError> {
        self.persist_error.take()
    }

    fn persist(&mut self) {
        if let Err(e) = save_json(self.store.as_ref(), FAVORITES_KEY, &self.favorites) {
            tracing::error!("failed to save favorites: {e}");
            self.persist_error = Some(e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use serde_json::json;

    #[test]
    fn add_remove_and_persist() {
        let mem = Arc::new(MemoryStore::new());
        let mut favorites = FavoritesStore::load(mem.clone());

        assert!(favorites.add("q2"));
        assert!(favorites.add("q1"));
        assert!(!favorites.add("q2"));
        assert_eq!(favorites.all(), ["q2", "q1"]);
        assert_eq!(mem.raw(FAVORITES_KEY), Some(json!(["q2", "q1"])));

        assert!(favorites.remove("q2"));
        assert!(!favorites.remove("q2"));
        assert!(!favorites.is_favorite("q2"));
        assert_eq!(FavoritesStore::load(mem).all(), ["q1"]);
    }

    #[test]
    fn toggle_flips_state() {
        let mut favorites = FavoritesStore::load(Arc::new(MemoryStore::new()));
        assert!(favorites.toggle("q1"));
        assert!(favorites.is_favorite("q1"));
        assert!(!favorites.toggle("q1"));
        assert!(favorites.all().is_empty());
    }

    #[test]
    fn non_array_record_loads_empty() {
        let mem = Arc::new(MemoryStore::with_values([(FAVORITES_KEY, json!({"q1": true}))]));
        assert!(FavoritesStore::load(mem).all().is_empty());
    }

    #[test]
    fn write_failure_is_reported_once() {
        let mem = Arc::new(MemoryStore::new());
        let mut favorites = FavoritesStore::load(mem.clone());
        mem.set_fail_writes(true);

        assert!(favorites.add("q1"));
        assert!(favorites.is_favorite("q1"));
        assert!(favorites.take_persist_error().is_some());
        assert!(favorites.take_persist_error().is_none());
    }
}
