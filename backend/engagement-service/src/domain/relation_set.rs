//! Set-semantic storage for embedded relation lists.
//!
//! Relation edges live inside the owning document (a user's `liked_posts`, a
//! post's `likes`, ...). They are kept as an insertion-ordered list keyed by
//! the related id so that a repeated add never produces a second entry.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An entry of an embedded relation list, identified by the id it points at.
pub trait RelationEntry {
    fn key(&self) -> Uuid;
}

/// Deduplicating, insertion-ordered list of relation entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<T>", into = "Vec<T>")]
#[serde(bound(
    serialize = "T: Serialize + Clone",
    deserialize = "T: Deserialize<'de> + RelationEntry"
))]
pub struct RelationSet<T> {
    entries: Vec<T>,
}

impl<T> Default for RelationSet<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<T: RelationEntry> RelationSet<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `entry` unless an entry with the same key exists.
    /// Returns true when the set changed.
    pub fn insert(&mut self, entry: T) -> bool {
        if self.contains(entry.key()) {
            return false;
        }
        self.entries.push(entry);
        true
    }

    /// Removes the entry keyed by `key`. Returns true when the set changed.
    pub fn remove(&mut self, key: Uuid) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.key() != key);
        self.entries.len() != before
    }

    pub fn contains(&self, key: Uuid) -> bool {
        self.entries.iter().any(|e| e.key() == key)
    }

    pub fn get(&self, key: Uuid) -> Option<&T> {
        self.entries.iter().find(|e| e.key() == key)
    }

    pub fn keys(&self) -> Vec<Uuid> {
        self.entries.iter().map(RelationEntry::key).collect()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<T: RelationEntry> From<Vec<T>> for RelationSet<T> {
    fn from(entries: Vec<T>) -> Self {
        let mut set = Self::new();
        for entry in entries {
            set.insert(entry);
        }
        set
    }
}

impl<T> From<RelationSet<T>> for Vec<T> {
    fn from(set: RelationSet<T>) -> Self {
        set.entries
    }
}

impl<T: RelationEntry> FromIterator<T> for RelationSet<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut set = Self::new();
        for entry in iter {
            set.insert(entry);
        }
        set
    }
}

impl<'a, T> IntoIterator for &'a RelationSet<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{LikedPost, SavedPost};
    use chrono::Utc;

    #[test]
    fn insert_is_idempotent_per_key() {
        let post_id = Uuid::new_v4();
        let mut set = RelationSet::new();

        assert!(set.insert(SavedPost {
            post_id,
            saved_at: Utc::now(),
        }));
        assert!(!set.insert(SavedPost {
            post_id,
            saved_at: Utc::now(),
        }));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn remove_of_absent_key_is_noop() {
        let mut set: RelationSet<LikedPost> = RelationSet::new();
        set.insert(LikedPost {
            post_id: Uuid::new_v4(),
        });

        assert!(!set.remove(Uuid::new_v4()));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn deserializing_collapses_duplicates() {
        let post_id = Uuid::new_v4();
        let raw = serde_json::json!([
            { "post_id": post_id },
            { "post_id": post_id },
        ]);

        let set: RelationSet<LikedPost> = serde_json::from_value(raw).unwrap();
        assert_eq!(set.keys(), vec![post_id]);
    }

    #[test]
    fn preserves_insertion_order() {
        let ids: Vec<Uuid> = (0..4).map(|_| Uuid::new_v4()).collect();
        let set: RelationSet<LikedPost> = ids.iter().map(|&post_id| LikedPost { post_id }).collect();

        assert_eq!(set.keys(), ids);
    }
}
