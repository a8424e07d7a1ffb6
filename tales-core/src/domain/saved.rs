//! Saved tales per user

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Key prefix for a user's saved items
pub const SAVED_ITEMS_PREFIX: &str = "savedItems:";

/// Storage key holding the saved set for `user_id`
pub fn saved_items_key(user_id: &str) -> String {
    format!("{}{}", SAVED_ITEMS_PREFIX, user_id)
}

/// Set of saved tale identifiers for one user
///
/// Persisted as a JSON array of strings. Set semantics: no duplicates,
/// order is irrelevant.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SavedSet {
    ids: BTreeSet<String>,
}

impl SavedSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, item_id: &str) -> bool {
        self.ids.contains(item_id)
    }

    /// Flip membership of `item_id`. Returns true when the item is now saved.
    pub fn toggle(&mut self, item_id: &str) -> bool {
        if self.ids.remove(item_id) {
            false
        } else {
            self.ids.insert(item_id.to_string());
            true
        }
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Saved identifiers in sorted order
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.ids.iter().map(String::as_str)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn from_json(raw: &str) -> serde_json::Result<Self> {
        serde_json::from_str(raw)
    }
}

impl<S: Into<String>> FromIterator<S> for SavedSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            ids: iter.into_iter().map(Into::into).collect(),
        }
    }
}

/// Terminal result of a save toggle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SaveOutcome {
    Saved,
    Unsaved,
    /// The tier's quota does not allow another save. Nothing changed.
    Blocked,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toggle_is_an_involution() {
        let mut set = SavedSet::new();
        assert!(set.toggle("a"));
        assert!(set.contains("a"));
        assert!(!set.toggle("a"));
        assert!(set.is_empty());
    }

    #[test]
    fn test_json_accepts_duplicates_as_set() {
        let set = SavedSet::from_json(r#"["y","x","y"]"#).unwrap();
        assert_eq!(set.len(), 2);
        assert_eq!(set.ids().collect::<Vec<_>>(), vec!["x", "y"]);
    }

    #[test]
    fn test_json_round_trip_order_independent() {
        let set: SavedSet = ["y", "x"].into_iter().collect();
        let restored = SavedSet::from_json(&set.to_json().unwrap()).unwrap();
        let expected: SavedSet = ["x", "y"].into_iter().collect();
        assert_eq!(restored, expected);
    }

    #[test]
    fn test_key_is_user_scoped() {
        assert_eq!(saved_items_key("anon-7"), "savedItems:anon-7");
    }
}
