//! Live channel snapshot.

use serde::{Deserialize, Serialize};

/// One live channel as reported by the provider during a single poll.
///
/// `game` holds the provider game id until the destination task relabels it
/// with the configured display name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamRecord {
    pub name: String,
    pub url: String,
    pub viewers: u64,
    pub game: String,
    pub title: String,
}

impl StreamRecord {
    pub fn new(
        name: impl Into<String>,
        url: impl Into<String>,
        viewers: u64,
        game: impl Into<String>,
        title: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            viewers,
            game: game.into(),
            title: title.into(),
        }
    }
}

/// Sorts by viewers, highest first. `sort_by` is stable, so equal counts keep
/// the provider's order.
pub fn rank_by_viewers(streams: &mut [StreamRecord]) {
    streams.sort_by(|a, b| b.viewers.cmp(&a.viewers));
}

pub fn total_viewers(streams: &[StreamRecord]) -> u64 {
    streams.iter().map(|s| s.viewers).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stream(name: &str, viewers: u64) -> StreamRecord {
        StreamRecord::new(name, format!("https://www.twitch.tv/{name}"), viewers, "1", "")
    }

    #[test]
    fn ranking_is_descending_and_stable() {
        let mut streams = vec![
            stream("a", 10),
            stream("b", 50),
            stream("c", 10),
            stream("d", 50),
        ];
        rank_by_viewers(&mut streams);

        let names: Vec<&str> = streams.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["b", "d", "a", "c"]);
    }

    #[test]
    fn total_sums_viewers() {
        assert_eq!(total_viewers(&[stream("a", 3), stream("b", 4)]), 7);
        assert_eq!(total_viewers(&[]), 0);
    }
}
