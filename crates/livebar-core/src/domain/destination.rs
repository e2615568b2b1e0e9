//! Per-destination persisted state.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use super::game_index::GameIndex;

/// Everything the bot knows about one managed subreddit.
///
/// Field names follow the on-disk settings file. Only the record fields and
/// `game_ids` change while the bot runs; the rest is operator configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DestinationState {
    pub name: String,

    /// Game display name -> entry template (`{name}`, `{url}`, `{viewers}`).
    /// An empty template means "use the default one".
    #[serde(deserialize_with = "templates")]
    pub format: BTreeMap<String, String>,

    /// Upper bound on sidebar entries.
    pub top_cut: usize,

    #[serde(rename = "wiki")]
    pub wiki_page_id: String,

    #[serde(rename = "maximum", default)]
    pub running_maximum: Option<u64>,

    #[serde(rename = "maximum_record", default)]
    pub running_maximum_timestamp: Option<String>,

    #[serde(rename = "minimum", default)]
    pub running_minimum: Option<u64>,

    #[serde(rename = "minimum_record", default)]
    pub running_minimum_timestamp: Option<String>,

    #[serde(default)]
    pub track_minimum: bool,

    #[serde(default)]
    pub game_ids: Option<GameIndex>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub widget: Option<WidgetConfig>,

    /// Keys the bot does not interpret, written back untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Operator settings for a sidebar widget. Carried through saves; the bot
/// only manages the old-style sidebar description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WidgetConfig {
    pub name: String,
    pub table: bool,
}

impl DestinationState {
    pub fn new(
        name: impl Into<String>,
        format: BTreeMap<String, String>,
        top_cut: usize,
        wiki_page_id: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            format,
            top_cut,
            wiki_page_id: wiki_page_id.into(),
            running_maximum: None,
            running_maximum_timestamp: None,
            running_minimum: None,
            running_minimum_timestamp: None,
            track_minimum: false,
            game_ids: None,
            widget: None,
            extra: Map::new(),
        }
    }

    /// The template for a game, if one is configured and non-empty.
    pub fn template_for(&self, game: &str) -> Option<&str> {
        self.format
            .get(game)
            .map(String::as_str)
            .filter(|t| !t.is_empty())
    }
}

// `null` templates are accepted and mean the same as an empty string.
fn templates<'de, D>(deserializer: D) -> Result<BTreeMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = BTreeMap::<String, Option<String>>::deserialize(deserializer)?;
    Ok(raw
        .into_iter()
        .map(|(game, template)| (game, template.unwrap_or_default()))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn deserializes_settings_file_layout() {
        let value = json!({
            "name": "leagueoflegends",
            "format": {"League of Legends": null, "Overwatch": "[{name}]({url})"},
            "top_cut": 10,
            "wiki": "livestreams",
            "maximum": 1200,
            "maximum_record": "Jan 01 2024 at 12:00 PM UTC",
            "game_ids": {"21779": "League of Legends"}
        });

        let state: DestinationState = serde_json::from_value(value).unwrap();
        assert_eq!(state.wiki_page_id, "livestreams");
        assert_eq!(state.running_maximum, Some(1200));
        assert_eq!(state.running_minimum, None);
        assert!(!state.track_minimum);
        assert_eq!(state.template_for("League of Legends"), None);
        assert_eq!(state.template_for("Overwatch"), Some("[{name}]({url})"));
        assert_eq!(
            state.game_ids.unwrap().name_of("21779"),
            Some("League of Legends")
        );
    }

    #[test]
    fn serializes_back_with_file_key_names() {
        let mut state = DestinationState::new("overwatch", BTreeMap::new(), 5, "streams");
        state.running_maximum = Some(42);
        let value = serde_json::to_value(&state).unwrap();

        assert_eq!(value["wiki"], "streams");
        assert_eq!(value["maximum"], 42);
        assert!(value.get("wiki_page_id").is_none());
        assert!(value.get("widget").is_none());
    }

    #[test]
    fn widget_and_unknown_keys_survive_a_round_trip() {
        let value = json!({
            "name": "chess",
            "format": {},
            "top_cut": 3,
            "wiki": "streams",
            "widget": {"name": "Live now", "table": true},
            "flair": "live"
        });

        let state: DestinationState = serde_json::from_value(value.clone()).unwrap();
        assert_eq!(
            state.widget,
            Some(WidgetConfig {
                name: "Live now".to_string(),
                table: true
            })
        );
        assert_eq!(state.extra.get("flair"), Some(&json!("live")));

        let back = serde_json::to_value(&state).unwrap();
        assert_eq!(back["widget"], value["widget"]);
        assert_eq!(back["flair"], "live");
    }
}
