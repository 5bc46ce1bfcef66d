//! Local enrichment heuristics.
//!
//! Used whenever the AI endpoint is not configured or its answer cannot be
//! used. Everything here is deterministic and allocation-light:
//!
//! - **category**: first entry of [`CATEGORY_KEYWORDS`] with a keyword present
//!   anywhere in the lowercased title + description. Matching is a plain
//!   substring test, so `sport` also catches `eSports`.
//! - **topics**: keyword frequency over alphanumeric tokens, minus stopwords
//!   and tokens shorter than [`MIN_TOPIC_LEN`], top [`MAX_HEURISTIC_TOPICS`].
//! - **summary**: the first two sentences of the description, or the title.

use crate::models::Enrichment;

pub const UNCATEGORIZED: &str = "Uncategorized";
pub const MAX_HEURISTIC_TOPICS: usize = 5;
pub const MIN_TOPIC_LEN: usize = 4;

/// Ordered category table. Earlier entries win.
pub const CATEGORY_KEYWORDS: &[(&str, &[&str])] = &[
    (
        "Tech & Coding",
        &[
            "developer",
            "coding",
            "program",
            "software",
            "tech",
            "technology",
            "ai",
            "machine learning",
        ],
    ),
    ("Gaming", &["game", "gaming", "let's play", "walkthrough"]),
    ("Music", &["music", "song", "album", "remix", "cover"]),
    ("Lifestyle", &["vlog", "lifestyle", "travel", "food", "recipe"]),
    (
        "Education",
        &["tutorial", "lesson", "how to", "educat", "class", "course"],
    ),
    ("News & Politics", &["news", "breaking", "politic", "election"]),
    (
        "Sports & Fitness",
        &["sport", "fitness", "workout", "training", "match"],
    ),
];

const STOPWORDS: &[&str] = &[
    "the", "and", "with", "from", "this", "that", "you", "your", "about", "into", "what", "when",
    "where", "will", "have", "just", "for", "but", "are", "was", "were", "how", "why", "who",
    "they", "them", "their", "its", "more", "like", "over", "also", "than", "then", "after",
    "before", "every", "make", "made", "very", "much", "many",
];

/// Full heuristic enrichment for one video.
///
/// `preferred_topic` is used as the category only when no keyword matches.
pub fn enrich(title: &str, description: &str, preferred_topic: Option<&str>) -> Enrichment {
    let text = format!("{} {}", title, description);
    let category = match match_category(&text) {
        Some(category) => category.to_string(),
        None => preferred_topic
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .unwrap_or(UNCATEGORIZED)
            .to_string(),
    };

    Enrichment {
        category,
        summary: summarize(title, description),
        topics: extract_topics(&text, MAX_HEURISTIC_TOPICS),
    }
}

/// Scan [`CATEGORY_KEYWORDS`] in order and return the first category with a
/// keyword present in `text`.
pub fn match_category(text: &str) -> Option<&'static str> {
    let lowered = text.to_lowercase();
    CATEGORY_KEYWORDS
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| lowered.contains(k)))
        .map(|(category, _)| *category)
}

/// Rank candidate topic words by frequency (ties keep first appearance).
pub fn extract_topics(text: &str, limit: usize) -> Vec<String> {
    let normalized: String = text
        .to_lowercase()
        .chars()
        .map(|c| {
            if c.is_ascii_lowercase() || c.is_ascii_digit() || c.is_whitespace() {
                c
            } else {
                ' '
            }
        })
        .collect();

    let mut counts: Vec<(&str, usize)> = Vec::new();
    for word in normalized.split_whitespace() {
        if word.len() < MIN_TOPIC_LEN || STOPWORDS.contains(&word) {
            continue;
        }
        match counts.iter_mut().find(|(w, _)| *w == word) {
            Some((_, n)) => *n += 1,
            None => counts.push((word, 1)),
        }
    }

    // Stable sort keeps first-appearance order among equal counts.
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts
        .into_iter()
        .take(limit)
        .map(|(w, _)| w.to_string())
        .collect()
}

/// First two sentences of `description`, or `title` when there is none.
pub fn summarize(title: &str, description: &str) -> String {
    let description = description.trim();
    if description.is_empty() {
        return title.trim().to_string();
    }
    split_sentences(description)
        .into_iter()
        .take(2)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Split after `.`, `!` or `?` when followed by whitespace.
fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();

    while let Some((_, c)) = chars.next() {
        if !matches!(c, '.' | '!' | '?') {
            continue;
        }
        let Some(&(boundary, next)) = chars.peek() else {
            break;
        };
        if !next.is_whitespace() {
            continue;
        }
        sentences.push(&text[start..boundary]);
        let mut resume = boundary;
        while let Some(&(idx, ws)) = chars.peek() {
            if !ws.is_whitespace() {
                break;
            }
            resume = idx + ws.len_utf8();
            chars.next();
        }
        start = resume;
    }

    if start < text.len() {
        sentences.push(&text[start..]);
    }
    sentences
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_first_table_entry_wins() {
        // Both "coding" (Tech) and "tutorial" (Education) match; Tech is earlier.
        assert_eq!(
            match_category("Coding tutorial for beginners"),
            Some("Tech & Coding")
        );
        assert_eq!(match_category("My morning workout"), Some("Sports & Fitness"));
        assert_eq!(match_category("Let's Play: Zelda"), Some("Gaming"));
    }

    #[test]
    fn test_category_prefix_keywords() {
        assert_eq!(match_category("Educational science"), Some("Education"));
        assert_eq!(match_category("Politics tonight"), Some("News & Politics"));
    }

    #[test]
    fn test_category_matches_inside_words() {
        assert_eq!(match_category("eSports highlights"), Some("Sports & Fitness"));
        assert_eq!(match_category("Retraining routine"), Some("Sports & Fitness"));
        assert_eq!(match_category("Livestream: bestsong ever"), Some("Music"));
        // "ai" inside "mountain" counts too.
        assert_eq!(match_category("Mountain sunrise"), Some("Tech & Coding"));
        assert_eq!(match_category("Sunset timelapse"), None);
    }

    #[test]
    fn test_enrich_defaults_to_uncategorized() {
        let e = enrich("Sunset timelapse", "", None);
        assert_eq!(e.category, UNCATEGORIZED);
        assert_eq!(e.summary, "Sunset timelapse");
    }

    #[test]
    fn test_enrich_uses_preferred_topic_when_nothing_matches() {
        let e = enrich("Sunset timelapse", "", Some("Nature"));
        assert_eq!(e.category, "Nature");
        let e = enrich("Sunset timelapse", "", Some("   "));
        assert_eq!(e.category, UNCATEGORIZED);
        // A keyword match still takes precedence.
        let e = enrich("Guitar song", "", Some("Nature"));
        assert_eq!(e.category, "Music");
    }

    #[test]
    fn test_topics_rank_by_frequency() {
        let topics = extract_topics(
            "Rust ownership. Rust borrowing! Ownership rules, rust traits and the compiler",
            5,
        );
        assert_eq!(topics[0], "rust");
        assert_eq!(topics[1], "ownership");
        assert!(topics.len() <= 5);
        assert!(!topics.contains(&"the".to_string()));
        assert!(!topics.contains(&"and".to_string()));
    }

    #[test]
    fn test_topics_drop_short_and_stopwords() {
        let topics = extract_topics("a an it is with from about into cats", 5);
        assert_eq!(topics, vec!["cats"]);
    }

    #[test]
    fn test_topics_respect_limit_and_ties() {
        let topics = extract_topics("alpha bravo charlie delta echoo foxtrot golf", 5);
        assert_eq!(topics, vec!["alpha", "bravo", "charlie", "delta", "echoo"]);
    }

    #[test]
    fn test_topics_strip_punctuation_and_unicode() {
        let topics = extract_topics("Café—review: espresso, espresso!", 5);
        assert_eq!(topics[0], "espresso");
        assert!(topics.contains(&"review".to_string()));
    }

    #[test]
    fn test_summary_takes_two_sentences() {
        let s = summarize(
            "Title",
            "First sentence. Second one!  Third?\nFourth.",
        );
        assert_eq!(s, "First sentence. Second one!");
    }

    #[test]
    fn test_summary_single_sentence_without_terminator() {
        assert_eq!(summarize("T", "  just words here  "), "just words here");
        assert_eq!(summarize("T", "v1.2 released"), "v1.2 released");
    }
}
