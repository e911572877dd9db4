//! Weighted keyword search across atlas topics, why cards and quiz questions.

use regex::RegexBuilder;
use serde::Serialize;

use crate::content::{AtlasTopic, CardId, ContentStore};
use crate::model::{Format, Region, System};

/// Queries shorter than this (after trimming) return nothing.
pub const MIN_QUERY_CHARS: usize = 2;
pub const MAX_RESULTS: usize = 30;
/// Atlas descriptions are cut to this many characters when indexed.
pub const DESCRIPTION_LIMIT: usize = 300;
pub const SNIPPET_LIMIT: usize = 120;

const TITLE_EXACT: u32 = 100;
const TITLE_PREFIX: u32 = 80;
const TITLE_CONTAINS: u32 = 60;
const REGION_CONTAINS: u32 = 30;
const SYSTEM_CONTAINS: u32 = 30;
const DESCRIPTION_CONTAINS: u32 = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Atlas,
    Why,
    Quiz,
}

impl EntryKind {
    pub const ALL: [EntryKind; 3] = [EntryKind::Atlas, EntryKind::Why, EntryKind::Quiz];

    pub fn heading(&self) -> &'static str {
        match self {
            EntryKind::Atlas => "Atlas",
            EntryKind::Why => "The Why",
            EntryKind::Quiz => "Quiz Bank",
        }
    }
}

/// Where a search hit leads.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "view", rename_all = "lowercase")]
pub enum NavigationTarget {
    Atlas {
        region: String,
        system: String,
        topic: String,
    },
    Why {
        #[serde(skip_serializing_if = "Option::is_none")]
        id: Option<CardId>,
        title: String,
    },
    Quiz {
        region: Region,
        system: System,
        mode: Format,
    },
}

/// One searchable item.
#[derive(Debug, Clone, Serialize)]
pub struct SearchEntry {
    pub kind: EntryKind,
    pub title: String,
    pub description: String,
    pub region: String,
    pub system: String,
    /// Upper-case format code for quiz entries.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
    pub target: NavigationTarget,
    #[serde(skip)]
    folded: Folded,
}

#[derive(Debug, Clone, Default)]
struct Folded {
    title: String,
    description: String,
    region: String,
    system: String,
}

impl SearchEntry {
    fn new(
        kind: EntryKind,
        title: String,
        description: String,
        region: String,
        system: String,
        mode: Option<String>,
        target: NavigationTarget,
    ) -> Self {
        let folded = Folded {
            title: title.to_lowercase(),
            description: description.to_lowercase(),
            region: region.to_lowercase(),
            system: system.to_lowercase(),
        };
        Self {
            kind,
            title,
            description,
            region,
            system,
            mode,
            target,
            folded,
        }
    }

    fn score(&self, tokens: &[String]) -> u32 {
        tokens
            .iter()
            .map(|token| {
                let f = &self.folded;
                let mut score = if f.title == *token {
                    TITLE_EXACT
                } else if f.title.starts_with(token.as_str()) {
                    TITLE_PREFIX
                } else if f.title.contains(token.as_str()) {
                    TITLE_CONTAINS
                } else {
                    0
                };
                if f.region.contains(token.as_str()) {
                    score += REGION_CONTAINS;
                }
                if f.system.contains(token.as_str()) {
                    score += SYSTEM_CONTAINS;
                }
                if f.description.contains(token.as_str()) {
                    score += DESCRIPTION_CONTAINS;
                }
                score
            })
            .sum()
    }

    /// Description cut for display.
    pub fn snippet(&self) -> String {
        snippet(&self.description)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchHit<'a> {
    pub entry: &'a SearchEntry,
    pub score: u32,
}

/// Flat index over all content. Rebuild after content changes.
#[derive(Debug, Clone, Default)]
pub struct SearchIndex {
    entries: Vec<SearchEntry>,
}

impl SearchIndex {
    pub fn build(store: &ContentStore) -> Self {
        let mut entries = Vec::new();

        for region in store.atlas() {
            for system in &region.systems {
                for topic in &system.topics {
                    entries.push(SearchEntry::new(
                        EntryKind::Atlas,
                        topic.title.clone(),
                        atlas_description(topic),
                        region.name.clone(),
                        system.name.clone(),
                        None,
                        NavigationTarget::Atlas {
                            region: region.name.clone(),
                            system: system.name.clone(),
                            topic: topic.title.clone(),
                        },
                    ));
                }
            }
        }

        for card in store.why_cards() {
            entries.push(SearchEntry::new(
                EntryKind::Why,
                card.title.clone(),
                card.why.clone(),
                card.category.clone(),
                card.comparison.clone(),
                None,
                NavigationTarget::Why {
                    id: card.id.clone(),
                    title: card.title.clone(),
                },
            ));
        }

        for (region, system, section) in store.quiz_sections() {
            for format in Format::ALL {
                for question in section.questions(format) {
                    entries.push(SearchEntry::new(
                        EntryKind::Quiz,
                        question.prompt.clone(),
                        question.explanation.clone(),
                        region.to_string(),
                        system.to_string(),
                        Some(format.code().to_uppercase()),
                        NavigationTarget::Quiz {
                            region,
                            system,
                            mode: format,
                        },
                    ));
                }
            }
        }

        tracing::debug!(entries = entries.len(), "search index built");
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[SearchEntry] {
        &self.entries
    }

    /// Ranked hits, best first; ties keep index order.
    pub fn search(&self, query: &str) -> Vec<SearchHit<'_>> {
        let tokens = tokenize(query);
        if tokens.is_empty() {
            return Vec::new();
        }

        let mut hits: Vec<SearchHit<'_>> = self
            .entries
            .iter()
            .filter_map(|entry| {
                let score = entry.score(&tokens);
                (score > 0).then_some(SearchHit { entry, score })
            })
            .collect();
        hits.sort_by(|a, b| b.score.cmp(&a.score));
        hits.truncate(MAX_RESULTS);
        hits
    }
}

/// Lower-cased whitespace tokens, or nothing for a too-short query.
pub fn tokenize(query: &str) -> Vec<String> {
    let trimmed = query.trim();
    if trimmed.chars().count() < MIN_QUERY_CHARS {
        return Vec::new();
    }
    trimmed
        .to_lowercase()
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

fn atlas_description(topic: &AtlasTopic) -> String {
    let mut parts: Vec<&str> = Vec::new();
    parts.extend(topic.subtitle.as_deref());
    parts.extend(topic.description.as_deref());
    for detail in &topic.details {
        parts.extend(detail.text.as_deref());
        parts.extend(detail.points.iter().filter_map(|p| p.text()));
    }
    parts.extend(topic.clinical.as_deref());
    parts.retain(|p| !p.is_empty());
    truncate_chars(&parts.join(" "), DESCRIPTION_LIMIT)
}

fn truncate_chars(text: &str, limit: usize) -> String {
    match text.char_indices().nth(limit) {
        Some((cut, _)) => text[..cut].to_string(),
        None => text.to_string(),
    }
}

/// First 120 characters followed by `...`, or the whole text if shorter.
pub fn snippet(text: &str) -> String {
    if text.chars().count() > SNIPPET_LIMIT {
        format!("{}...", truncate_chars(text, SNIPPET_LIMIT))
    } else {
        text.to_string()
    }
}

/// Wrap every case-insensitive occurrence of a query token in `<mark>`.
pub fn highlight(text: &str, query: &str) -> String {
    let mut tokens: Vec<&str> = query.split_whitespace().collect();
    if tokens.is_empty() {
        return text.to_string();
    }
    // Longest first so overlapping tokens prefer the wider match.
    tokens.sort_by_key(|t| std::cmp::Reverse(t.len()));
    tokens.dedup();
    let pattern = tokens
        .iter()
        .map(|t| regex::escape(t))
        .collect::<Vec<_>>()
        .join("|");

    match RegexBuilder::new(&pattern).case_insensitive(true).build() {
        Ok(re) => re.replace_all(text, "<mark>$0</mark>").into_owned(),
        Err(e) => {
            tracing::debug!(error = %e, "highlight pattern rejected");
            text.to_string()
        }
    }
}

/// Hits grouped by kind in atlas, why, quiz order. Empty groups are omitted.
pub fn group_hits<'a>(hits: &[SearchHit<'a>]) -> Vec<(EntryKind, Vec<SearchHit<'a>>)> {
    EntryKind::ALL
        .iter()
        .filter_map(|kind| {
            let group: Vec<_> = hits
                .iter()
                .filter(|h| h.entry.kind == *kind)
                .cloned()
                .collect();
            (!group.is_empty()).then_some((*kind, group))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONTENT: &str = r#"{
        "atlas": {
            "Forelimb": {
                "Osteology": [
                    {"title": "Scapula", "subtitle": "Shoulder blade",
                     "details": [{"text": "Spine of scapula", "points": ["acromion", {"text": "tuber"}]}],
                     "clinical": "Fractures are rare."},
                    {"title": "Humerus", "description": "Long bone of the arm."}
                ]
            }
        },
        "why": [
            {"id": 7, "title": "Why no clavicle?", "why": "Cursorial gait lengthens the stride.",
             "category": "Locomotion", "comparison": "Horse vs Dog"}
        ],
        "quiz": {
            "Thorax": {
                "Angiology": {
                    "mcq": [{"q": "Which vessel leaves the left ventricle?", "o": ["Aorta", "Vena cava"], "a": 0, "e": "The aorta."}],
                    "tf": [{"q": "The scapula is a flat bone", "a": true, "e": ""}]
                }
            }
        }
    }"#;

    fn index() -> SearchIndex {
        SearchIndex::build(&ContentStore::from_json_str(CONTENT).unwrap())
    }

    #[test]
    fn builds_entries_from_every_section() {
        let index = index();
        assert_eq!(index.len(), 5);
        let atlas = &index.entries()[0];
        assert_eq!(
            atlas.description,
            "Shoulder blade Spine of scapula acromion tuber Fractures are rare."
        );
        let quiz = index
            .entries()
            .iter()
            .find(|e| e.kind == EntryKind::Quiz)
            .unwrap();
        assert_eq!(quiz.mode.as_deref(), Some("MCQ"));
        let why = index.entries().iter().find(|e| e.kind == EntryKind::Why).unwrap();
        assert_eq!(why.region, "Locomotion");
        assert_eq!(why.system, "Horse vs Dog");
    }

    #[test]
    fn short_queries_return_nothing() {
        let index = index();
        assert!(index.search("").is_empty());
        assert!(index.search(" s ").is_empty());
        assert!(!index.search("sc").is_empty());
    }

    #[test]
    fn exact_title_outranks_mentions() {
        let index = index();
        let hits = index.search("scapula");
        assert_eq!(hits[0].entry.title, "Scapula");
        assert_eq!(hits[0].score, TITLE_EXACT + DESCRIPTION_CONTAINS);
        assert_eq!(hits[1].entry.title, "The scapula is a flat bone");
        assert_eq!(hits[1].score, TITLE_CONTAINS);
    }

    #[test]
    fn tokens_score_independently() {
        let index = index();
        let hits = index.search("thorax aorta");
        assert_eq!(hits[0].entry.kind, EntryKind::Quiz);
        // region +30 for "thorax", description +20 for "aorta"
        assert_eq!(hits[0].score, 50);
        assert!(hits.windows(2).all(|w| w[0].score >= w[1].score));
    }

    #[test]
    fn results_are_capped() {
        let mut store = ContentStore::default();
        for i in 0..50 {
            store.insert_question(
                Region::Pelvis,
                System::Myology,
                crate::model::Question::true_false(&format!("gluteal {i}"), true, ""),
            );
        }
        let index = SearchIndex::build(&store);
        assert_eq!(index.search("gluteal").len(), MAX_RESULTS);
    }

    #[test]
    fn highlight_escapes_and_ignores_case() {
        assert_eq!(
            highlight("Scapula and scapular", "SCAPULA"),
            "<mark>Scapula</mark> and <mark>scapula</mark>r"
        );
        assert_eq!(highlight("a+b (c)", "a+b (c)"), "<mark>a+b</mark> <mark>(c)</mark>");
        assert_eq!(highlight("plain", "  "), "plain");
    }

    #[test]
    fn snippet_and_description_limits() {
        let long = "x".repeat(130);
        let s = snippet(&long);
        assert_eq!(s.chars().count(), SNIPPET_LIMIT + 3);
        assert!(s.ends_with("..."));
        assert_eq!(snippet("short"), "short");
        assert_eq!(truncate_chars("héllo", 2), "hé");
    }

    #[test]
    fn quiz_entries_follow_region_order() {
        let content = serde_json::json!({
            "quiz": {
                "Pelvis": {"Myology": {"tf": [{"q": "Gluteal muscles extend the hip", "a": true, "e": ""}]}},
                "Thorax": {"Myology": {"tf": [{"q": "Intercostal muscles aid breathing", "a": true, "e": ""}]}}
            }
        });
        let index = SearchIndex::build(&ContentStore::from_value(content).unwrap());
        let regions: Vec<&str> = index.entries().iter().map(|e| e.region.as_str()).collect();
        assert_eq!(regions, vec!["Thorax", "Pelvis"]);
    }

    #[test]
    fn atlas_description_is_capped_on_char_boundaries() {
        let content = serde_json::json!({
            "atlas": {"Forelimb": {"Myology": [{
                "title": "Biceps brachii",
                "subtitle": "é".repeat(200),
                "description": "ü".repeat(150),
                "clinical": "x".repeat(50)
            }]}}
        });
        let index = SearchIndex::build(&ContentStore::from_value(content).unwrap());
        let description = &index.entries()[0].description;
        assert_eq!(description.chars().count(), DESCRIPTION_LIMIT);
        assert!(description.starts_with("ééé"));
        assert!(description.ends_with('ü'));
        assert!(!description.contains('x'));
    }

    #[test]
    fn groups_follow_kind_order() {
        let index = index();
        let hits = index.search("scapula");
        let groups = group_hits(&hits);
        assert_eq!(groups[0].0, EntryKind::Atlas);
        assert_eq!(groups[1].0, EntryKind::Quiz);
    }

    #[test]
    fn targets_serialize_with_view_tag() {
        let index = index();
        let quiz = index
            .entries()
            .iter()
            .find(|e| e.kind == EntryKind::Quiz)
            .unwrap();
        let json = serde_json::to_value(&quiz.target).unwrap();
        assert_eq!(json["view"], "quiz");
        assert_eq!(json["mode"], "mcq");
        assert_eq!(json["region"], "Thorax");
    }
}
