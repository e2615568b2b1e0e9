//! Wiki page - 全配信の一覧と統計

use crate::domain::{DestinationState, StreamRecord, total_viewers};

pub const WIKI_EDIT_REASON: &str = "Bot action";

/// Everything the wiki page shows besides the streams themselves.
#[derive(Debug, Clone)]
pub struct WikiContext<'a> {
    pub state: &'a DestinationState,
    /// Account the bot posts as, shown in the page header.
    pub username: &'a str,
    /// Cycle delay in seconds.
    pub delay_secs: u64,
    /// Already formatted "last updated" time.
    pub updated_at: &'a str,
}

/// Makes a stream title safe for a markdown table cell.
pub fn sanitize_cell(text: &str) -> String {
    text.replace('|', "&#124;")
        .replace('\n', "")
        .replace('*', "\\*")
}

/// Renders the full page. Records are read from `ctx.state`, so the record
/// tracker must have seen this cycle's total first.
pub fn render_wiki(streams: &[StreamRecord], ctx: &WikiContext<'_>) -> String {
    let state = ctx.state;
    let mut lines = vec![
        format!("Welcome to the /r/{} livestream page!\n", state.name),
        format!(
            "This page is automatically updated by /u/{} and should not be edited. \
             This page currently gets updated every {} minutes. \
             If something seems wrong, please contact the subreddit moderators.",
            ctx.username,
            ctx.delay_secs / 60
        ),
        "### Streams".to_string(),
        String::new(),
        format!("This page was last updated on {}\n", ctx.updated_at),
        "Game Name | Stream | Viewers | Status ".to_string(),
        ":---------|:-------|:-------:|:-------".to_string(),
    ];

    for stream in streams {
        lines.push(format!(
            "{}|[{}]({})|{}|{}",
            stream.game,
            stream.name,
            stream.url,
            stream.viewers,
            sanitize_cell(&stream.title)
        ));
    }

    lines.push(String::new());
    lines.push("### Statistics".to_string());
    lines.push(String::new());
    lines.push(format!("Total number of viewers: {}\n", total_viewers(streams)));
    if state.track_minimum {
        lines.push(format!(
            "Lowest number of total viewers: {} on {}\n",
            record_value(state.running_minimum),
            record_time(&state.running_minimum_timestamp)
        ));
    }
    lines.push(format!(
        "Highest number of total viewers: {} on {}",
        record_value(state.running_maximum),
        record_time(&state.running_maximum_timestamp)
    ));
    lines.push(String::new());

    lines.join("\n")
}

fn record_value(value: Option<u64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| v.to_string())
}

fn record_time(timestamp: &Option<String>) -> &str {
    timestamp.as_deref().unwrap_or("-")
}
