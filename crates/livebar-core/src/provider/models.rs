//! Helix API のレスポンス型

use serde::Deserialize;

use crate::domain::StreamRecord;

pub(crate) const CHANNEL_URL_BASE: &str = "https://www.twitch.tv/";

/// Response of the client-credentials grant.
#[derive(Debug, Deserialize)]
pub(crate) struct TokenResponse {
    pub access_token: String,
    pub expires_in: i64,
}

/// One entry of `GET /games`.
#[derive(Debug, Deserialize)]
pub(crate) struct HelixGame {
    pub id: String,
    pub name: String,
}

/// One entry of `GET /streams`.
#[derive(Debug, Deserialize)]
pub(crate) struct HelixStream {
    pub user_login: String,
    pub user_name: String,
    pub game_id: String,
    pub viewer_count: u64,
    #[serde(default)]
    pub title: String,
}

impl From<HelixStream> for StreamRecord {
    fn from(raw: HelixStream) -> Self {
        StreamRecord {
            url: format!("{CHANNEL_URL_BASE}{}", raw.user_login),
            name: raw.user_name,
            viewers: raw.viewer_count,
            game: raw.game_id,
            title: raw.title.trim().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn helix_stream_becomes_record() {
        let raw: HelixStream = serde_json::from_value(json!({
            "id": "40952121085",
            "user_id": "101051819",
            "user_login": "afro",
            "user_name": "Afro",
            "game_id": "32982",
            "type": "live",
            "title": "  Jacob: Digital Den Laptops  ",
            "viewer_count": 1490,
        }))
        .unwrap();

        let record = StreamRecord::from(raw);
        assert_eq!(record.name, "Afro");
        assert_eq!(record.url, "https://www.twitch.tv/afro");
        assert_eq!(record.viewers, 1490);
        assert_eq!(record.game, "32982");
        assert_eq!(record.title, "Jacob: Digital Den Laptops");
    }
}
