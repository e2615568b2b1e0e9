//! GameIndex - provider game id から表示名へのマッピング

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

/// Provider game id -> configured game name, scoped to one destination.
///
/// Persisted as a plain JSON object under `game_ids`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GameIndex {
    ids: BTreeMap<String, String>,
}

impl GameIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: impl Into<String>, name: impl Into<String>) {
        self.ids.insert(id.into(), name.into());
    }

    pub fn name_of(&self, id: &str) -> Option<&str> {
        self.ids.get(id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Ids whose mapped name is still present in `format`.
    ///
    /// Stale entries (the operator removed the game) are skipped silently.
    pub fn active_ids<V>(&self, format: &BTreeMap<String, V>) -> Vec<String> {
        self.ids
            .iter()
            .filter(|(_, name)| format.contains_key(name.as_str()))
            .map(|(id, _)| id.clone())
            .collect()
    }

    /// Names in `format` that no id maps to yet.
    pub fn missing_names<V>(&self, format: &BTreeMap<String, V>) -> Vec<String> {
        format
            .keys()
            .filter(|name| !self.ids.values().any(|known| known == *name))
            .cloned()
            .collect()
    }
}

impl Extend<(String, String)> for GameIndex {
    fn extend<I: IntoIterator<Item = (String, String)>>(&mut self, iter: I) {
        self.ids.extend(iter);
    }
}

impl From<HashMap<String, String>> for GameIndex {
    fn from(map: HashMap<String, String>) -> Self {
        Self {
            ids: map.into_iter().collect(),
        }
    }
}

impl FromIterator<(String, String)> for GameIndex {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            ids: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn active_ids_skip_games_missing_from_format() {
        let index: GameIndex = [
            ("21779".to_string(), "League of Legends".to_string()),
            ("32399".to_string(), "Counter-Strike".to_string()),
            ("488552".to_string(), "Overwatch".to_string()),
        ]
        .into_iter()
        .collect();

        let mut format = BTreeMap::new();
        format.insert("League of Legends".to_string(), String::new());
        format.insert("Overwatch".to_string(), "{name}".to_string());

        let ids = index.active_ids(&format);
        assert_eq!(ids, vec!["21779".to_string(), "488552".to_string()]);
        for id in &ids {
            let name = index.name_of(id).unwrap();
            assert!(format.contains_key(name));
        }
    }

    #[test]
    fn missing_names_are_format_games_without_an_id() {
        let mut index = GameIndex::new();
        index.insert("1", "Chess");
        index.insert("9", "Retired");
        let format = BTreeMap::from([
            ("Chess".to_string(), String::new()),
            ("Go".to_string(), String::new()),
        ]);

        assert_eq!(index.missing_names(&format), vec!["Go".to_string()]);

        index.extend([("2".to_string(), "Go".to_string())]);
        assert!(index.missing_names(&format).is_empty());
        assert_eq!(index.len(), 3);
    }

    #[test]
    fn serializes_as_plain_object() {
        let mut index = GameIndex::new();
        index.insert("1", "Dota 2");
        let value = serde_json::to_value(&index).unwrap();
        assert_eq!(value, serde_json::json!({"1": "Dota 2"}));
    }
}
