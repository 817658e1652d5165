use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MediaSuggestion {
    #[serde(rename = "type")]
    pub kind: MediaKind,
    pub title: String,
    pub description: String,
    pub search_query: String,
}

/// Truncates to the first `max_chars` characters (not bytes). Used to bound
/// upstream text before it is embedded in a downstream prompt.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Extracts up to `count` topic lines from free-text model output. Blank
/// lines and markdown headings are dropped; fewer than `count` lines is not
/// an error.
pub fn related_topics(response: &str, count: usize) -> Vec<String> {
    response
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(|line| line.to_string())
        .take(count)
        .collect()
}

const MAX_SUGGESTIONS: usize = 4;

#[derive(Debug, Default)]
struct PartialSuggestion {
    kind: Option<String>,
    title: Option<String>,
    description: Option<String>,
    search_query: Option<String>,
}

enum Outcome {
    Parsed(MediaSuggestion),
    Incomplete,
}

impl PartialSuggestion {
    fn is_empty(&self) -> bool {
        self.kind.is_none()
            && self.title.is_none()
            && self.description.is_none()
            && self.search_query.is_none()
    }

    fn set(field: &mut Option<String>, value: &str) {
        let value = value.trim();
        if !value.is_empty() {
            *field = Some(value.to_string());
        }
    }

    // An item is accepted only with all four fields populated and a
    // recognizable TYPE; anything less counts as dropped.
    fn finish(self) -> Outcome {
        let kind = match self.kind.as_deref().map(str::to_ascii_lowercase).as_deref() {
            Some("image") => MediaKind::Image,
            Some("video") => MediaKind::Video,
            _ => return Outcome::Incomplete,
        };
        match (self.title, self.description, self.search_query) {
            (Some(title), Some(description), Some(search_query)) => {
                Outcome::Parsed(MediaSuggestion {
                    kind,
                    title,
                    description,
                    search_query,
                })
            }
            _ => Outcome::Incomplete,
        }
    }
}

#[derive(Debug)]
pub struct MediaParse {
    pub items: Vec<MediaSuggestion>,
    /// Count of malformed or incomplete blocks that were discarded.
    pub dropped: usize,
}

/// Parses `KEY: value` media-suggestion blocks from model output. A new
/// TYPE line starts a block and flushes the previous one. Malformed blocks
/// are dropped and counted, never raised; at most four items are returned.
pub fn media_suggestions(response: &str) -> MediaParse {
    let mut items = Vec::new();
    let mut dropped = 0;
    let mut current = PartialSuggestion::default();

    let flush = |current: PartialSuggestion, items: &mut Vec<MediaSuggestion>, dropped: &mut usize| {
        if !current.is_empty() {
            match current.finish() {
                Outcome::Parsed(item) => items.push(item),
                Outcome::Incomplete => *dropped += 1,
            }
        }
    };

    for line in response.lines() {
        let line = line.trim();
        if let Some(value) = line.strip_prefix("TYPE:") {
            flush(
                std::mem::take(&mut current),
                &mut items,
                &mut dropped,
            );
            PartialSuggestion::set(&mut current.kind, value);
        } else if let Some(value) = line.strip_prefix("TITLE:") {
            PartialSuggestion::set(&mut current.title, value);
        } else if let Some(value) = line.strip_prefix("DESCRIPTION:") {
            PartialSuggestion::set(&mut current.description, value);
        } else if let Some(value) = line.strip_prefix("SEARCH_QUERY:") {
            PartialSuggestion::set(&mut current.search_query, value);
        }
    }
    flush(current, &mut items, &mut dropped);

    if items.len() > MAX_SUGGESTIONS {
        dropped += items.len() - MAX_SUGGESTIONS;
        items.truncate(MAX_SUGGESTIONS);
    }

    MediaParse { items, dropped }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_chars_short_text_unchanged() {
        assert_eq!(truncate_chars("hello", 1000), "hello");
    }

    #[test]
    fn test_truncate_chars_cuts_at_char_count() {
        let text = "a".repeat(1200);
        assert_eq!(truncate_chars(&text, 1000).len(), 1000);
    }

    #[test]
    fn test_truncate_chars_is_not_byte_based() {
        // 'é' is two bytes in UTF-8; three characters must survive.
        let text = "ééééé";
        assert_eq!(truncate_chars(text, 3), "ééé");
    }

    #[test]
    fn test_related_topics_drops_headings_and_blanks() {
        let response = "# Related topics\n\nQuantum Error Correction\n\nTopological Qubits\n";
        let topics = related_topics(response, 5);
        assert_eq!(
            topics,
            vec!["Quantum Error Correction", "Topological Qubits"]
        );
    }

    #[test]
    fn test_related_topics_caps_at_count() {
        let response = "one\ntwo\nthree\nfour\nfive\nsix\nseven";
        let topics = related_topics(response, 5);
        assert_eq!(topics.len(), 5);
        assert_eq!(topics[4], "five");
    }

    fn block(kind: &str, n: usize) -> String {
        format!(
            "TYPE: {kind}\nTITLE: Title {n}\nDESCRIPTION: Description {n}\nSEARCH_QUERY: query {n}\n"
        )
    }

    #[test]
    fn test_media_four_well_formed_blocks() {
        let response = format!(
            "{}{}{}{}",
            block("image", 1),
            block("image", 2),
            block("video", 3),
            block("video", 4)
        );
        let parsed = media_suggestions(&response);
        assert_eq!(parsed.items.len(), 4);
        assert_eq!(parsed.dropped, 0);
        assert_eq!(parsed.items[0].kind, MediaKind::Image);
        assert_eq!(parsed.items[2].kind, MediaKind::Video);
        assert_eq!(parsed.items[3].search_query, "query 4");
    }

    #[test]
    fn test_media_block_missing_search_query_is_dropped() {
        let response = format!(
            "{}TYPE: image\nTITLE: No query\nDESCRIPTION: Missing its search term\n{}",
            block("image", 1),
            block("video", 3)
        );
        let parsed = media_suggestions(&response);
        assert_eq!(parsed.items.len(), 2);
        assert_eq!(parsed.dropped, 1);
        assert_eq!(parsed.items[0].title, "Title 1");
        assert_eq!(parsed.items[1].title, "Title 3");
    }

    #[test]
    fn test_media_unrecognized_type_is_dropped() {
        let response = format!(
            "TYPE: podcast\nTITLE: T\nDESCRIPTION: D\nSEARCH_QUERY: q\n{}",
            block("image", 1)
        );
        let parsed = media_suggestions(&response);
        assert_eq!(parsed.items.len(), 1);
        assert_eq!(parsed.dropped, 1);
    }

    #[test]
    fn test_media_capped_at_four() {
        let response: String = (1..=6).map(|n| block("image", n)).collect();
        let parsed = media_suggestions(&response);
        assert_eq!(parsed.items.len(), 4);
        assert_eq!(parsed.dropped, 2);
    }

    #[test]
    fn test_media_surrounding_prose_is_ignored() {
        let response = format!(
            "Here are some suggestions:\n\n{}\nHope these help!",
            block("image", 1)
        );
        let parsed = media_suggestions(&response);
        assert_eq!(parsed.items.len(), 1);
        assert_eq!(parsed.dropped, 0);
    }

    #[test]
    fn test_media_empty_value_counts_as_missing() {
        let response = "TYPE: image\nTITLE:\nDESCRIPTION: D\nSEARCH_QUERY: q\n";
        let parsed = media_suggestions(&response);
        assert!(parsed.items.is_empty());
        assert_eq!(parsed.dropped, 1);
    }
}
