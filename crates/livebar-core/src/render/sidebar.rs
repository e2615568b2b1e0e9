//! Sidebar fitting - managed region の描画とサイズ調整
//!
//! The sidebar owns one region delimited by [`START_MARKER`] / [`END_MARKER`].
//! Everything outside the region belongs to the moderators and is preserved
//! byte for byte.

use std::collections::BTreeMap;

use crate::domain::StreamRecord;

pub const START_MARKER: &str = "###### START STREAM LIST";
pub const END_MARKER: &str = "###### END STREAM LIST";

/// Entry template used when a game has none (or an empty one).
pub const DEFAULT_TEMPLATE: &str = "[{name}]({url}) {viewers} viewers";

/// Result of [`fit_sidebar`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SidebarFit {
    /// Entries actually rendered into the region.
    pub count: usize,
    pub document: String,
    /// False when the document has no marker pair; `document` is then the input.
    pub region_found: bool,
    /// False when even an empty region leaves `document` over budget.
    pub fits: bool,
}

/// Substitutes `{name}`, `{url}` and `{viewers}`. Unknown placeholders are
/// left as they are.
pub fn render_template(template: &str, stream: &StreamRecord) -> String {
    let mut out = String::with_capacity(template.len() + stream.name.len() + stream.url.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let tail = &rest[open..];
        let Some(close) = tail.find('}') else {
            out.push_str(tail);
            return out;
        };
        match &tail[1..close] {
            "name" => out.push_str(&stream.name),
            "url" => out.push_str(&stream.url),
            "viewers" => out.push_str(&stream.viewers.to_string()),
            _ => out.push_str(&tail[..=close]),
        }
        rest = &tail[close + 1..];
    }
    out.push_str(rest);
    out
}

/// Renders the whole managed region, markers included.
pub fn render_region(streams: &[StreamRecord], templates: &BTreeMap<String, String>) -> String {
    let mut lines = Vec::with_capacity(streams.len() + 2);
    lines.push(format!("{START_MARKER}\n"));
    for stream in streams {
        let template = templates
            .get(&stream.game)
            .map(String::as_str)
            .filter(|t| !t.is_empty())
            .unwrap_or(DEFAULT_TEMPLATE);
        lines.push(format!("- {}", render_template(template, stream)));
    }
    lines.push(format!("\n{END_MARKER}"));
    lines.join("\n")
}

/// Replaces the first `START..END` span of `document` with `region`.
/// `None` when the document has no complete marker pair.
pub fn splice(document: &str, region: &str) -> Option<String> {
    let start = document.find(START_MARKER)?;
    let after_start = start + START_MARKER.len();
    let end = after_start + document[after_start..].find(END_MARKER)? + END_MARKER.len();

    let mut out = String::with_capacity(document.len() - (end - start) + region.len());
    out.push_str(&document[..start]);
    out.push_str(region);
    out.push_str(&document[end..]);
    Some(out)
}

/// Finds how many of the ranked `streams` fit into `document` within `budget` bytes.
///
/// Starts at `top_cut` and halves until the spliced document fits. When count 0
/// still does not fit the result has `fits == false` and must not be published.
pub fn fit_sidebar(
    document: &str,
    streams: &[StreamRecord],
    top_cut: usize,
    templates: &BTreeMap<String, String>,
    budget: usize,
) -> SidebarFit {
    let mut count = top_cut;
    loop {
        let shown = &streams[..count.min(streams.len())];
        let region = render_region(shown, templates);
        let (candidate, region_found) = match splice(document, &region) {
            Some(spliced) => (spliced, true),
            None => (document.to_string(), false),
        };

        let fits = candidate.len() <= budget;
        if fits || count == 0 {
            return SidebarFit {
                count: shown.len(),
                document: candidate,
                region_found,
                fits,
            };
        }
        count /= 2;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn stream(name: &str, viewers: u64, game: &str) -> StreamRecord {
        StreamRecord::new(
            name,
            format!("https://www.twitch.tv/{}", name.to_lowercase()),
            viewers,
            game,
            "",
        )
    }

    /// Entries of exactly 20 bytes: "- " plus an 18 character name.
    fn twenty_byte_streams(n: usize) -> (Vec<StreamRecord>, BTreeMap<String, String>) {
        let streams = (0..n)
            .map(|i| stream(&format!("channel{i:011}"), 100 - i as u64, "Game"))
            .collect();
        let templates = BTreeMap::from([("Game".to_string(), "{name}".to_string())]);
        (streams, templates)
    }

    fn empty_region() -> String {
        format!("{START_MARKER}{END_MARKER}")
    }

    #[test]
    fn template_substitutes_known_placeholders() {
        let s = stream("Alice", 42, "Chess");
        assert_eq!(
            render_template(DEFAULT_TEMPLATE, &s),
            "[Alice](https://www.twitch.tv/alice) 42 viewers"
        );
        assert_eq!(render_template("{name} {unknown} {", &s), "Alice {unknown} {");
        assert_eq!(render_template("no placeholders", &s), "no placeholders");
    }

    #[test]
    fn template_does_not_expand_inside_values() {
        let s = stream("{url}", 1, "Chess");
        assert_eq!(render_template("{name}", &s), "{url}");
    }

    #[test]
    fn region_layout() {
        let templates = BTreeMap::from([
            ("Chess".to_string(), "{name} plays ({viewers})".to_string()),
            ("Go".to_string(), String::new()),
        ]);
        let streams = vec![stream("A", 3, "Chess"), stream("B", 2, "Go")];

        let region = render_region(&streams, &templates);
        assert_eq!(
            region,
            "###### START STREAM LIST\n\n\
             - A plays (3)\n\
             - [B](https://www.twitch.tv/b) 2 viewers\n\
             \n###### END STREAM LIST"
        );
    }

    #[test]
    fn empty_region_overhead() {
        let region = render_region(&[], &BTreeMap::new());
        assert_eq!(region, "###### START STREAM LIST\n\n\n###### END STREAM LIST");
        assert_eq!(region.len(), 49);
    }

    #[test]
    fn splice_keeps_surrounding_text_and_first_span_only() {
        let doc = format!("intro\n{START_MARKER}old{END_MARKER}\nmiddle\n{START_MARKER}x{END_MARKER}");
        let out = splice(&doc, "NEW").unwrap();
        assert_eq!(out, format!("intro\nNEW\nmiddle\n{START_MARKER}x{END_MARKER}"));
    }

    #[rstest]
    #[case::no_markers("just a sidebar")]
    #[case::start_only("###### START STREAM LIST and nothing else")]
    #[case::reversed("###### END STREAM LIST then ###### START STREAM LIST")]
    fn splice_without_marker_pair(#[case] doc: &str) {
        assert_eq!(splice(doc, "NEW"), None);
    }

    #[test]
    fn ten_twenty_byte_entries_in_a_hundred_bytes_fit_two() {
        let (streams, templates) = twenty_byte_streams(10);

        // 49 bytes of marker overhead + 21 per entry: 10 -> 259, 5 -> 154, 2 -> 91
        let fit = fit_sidebar(&empty_region(), &streams, 10, &templates, 100);

        assert_eq!(fit.count, 2);
        assert_eq!(fit.document.len(), 91);
        assert!(fit.region_found);
        assert!(fit.fits);
        assert!(fit.document.contains("- channel00000000000\n- channel00000000001\n"));
    }

    #[rstest]
    #[case(10_240)]
    #[case(500)]
    #[case(200)]
    #[case(120)]
    #[case(70)]
    #[case(49)]
    fn output_fits_budget_or_is_marked_unfit(#[case] budget: usize) {
        let (streams, templates) = twenty_byte_streams(25);
        let doc = format!("header\n{}\nfooter", empty_region());

        let fit = fit_sidebar(&doc, &streams, 20, &templates, budget);

        assert!(fit.count <= 20);
        if fit.fits {
            assert!(fit.document.len() <= budget);
        } else {
            assert_eq!(fit.count, 0);
        }
    }

    #[test]
    fn nothing_fits_when_surrounding_text_exceeds_budget() {
        let (streams, templates) = twenty_byte_streams(4);
        let doc = format!("{}{}", "x".repeat(200), empty_region());

        let fit = fit_sidebar(&doc, &streams, 4, &templates, 100);

        assert_eq!(fit.count, 0);
        assert!(!fit.fits);
        assert!(fit.region_found);
    }

    #[test]
    fn fitting_is_idempotent() {
        let (streams, templates) = twenty_byte_streams(10);
        let doc = format!("rules\n\n{}\n\nlinks", empty_region());

        let first = fit_sidebar(&doc, &streams, 10, &templates, 200);
        let second = fit_sidebar(&first.document, &streams, first.count, &templates, 200);

        assert_eq!(second.count, first.count);
        assert_eq!(second.document, first.document);
    }

    #[test]
    fn fewer_streams_than_top_cut() {
        let (streams, templates) = twenty_byte_streams(3);
        let fit = fit_sidebar(&empty_region(), &streams, 10, &templates, 10_240);
        assert_eq!(fit.count, 3);
    }

    #[test]
    fn document_without_markers_is_returned_unchanged() {
        let (streams, templates) = twenty_byte_streams(5);
        let fit = fit_sidebar("plain sidebar", &streams, 5, &templates, 10_240);
        assert_eq!(fit.document, "plain sidebar");
        assert!(!fit.region_found);
    }

    #[test]
    fn multibyte_text_is_measured_in_bytes() {
        let streams = vec![stream("éééééééééé", 1, "Game")];
        let templates = BTreeMap::from([("Game".to_string(), "{name}".to_string())]);

        // 49 + 1 + ("- " + 20 bytes) = 72 bytes
        let fit = fit_sidebar(&empty_region(), &streams, 1, &templates, 71);
        assert_eq!(fit.count, 0);
        let fit = fit_sidebar(&empty_region(), &streams, 1, &templates, 72);
        assert_eq!(fit.count, 1);
    }
}
