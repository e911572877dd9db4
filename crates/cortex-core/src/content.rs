//! Read-only content store: atlas topics, "why" cards and the quiz bank.
//!
//! Loading is lenient. Any section may be missing, and records whose shape
//! does not match are skipped with a warning instead of failing the load.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::ContentError;
use crate::model::{Format, Question, Region, System, WireQuestion};

/// The questions filed under one region/system pair.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QuestionSection {
    pub mcq: Vec<Question>,
    pub tf: Vec<Question>,
    pub fib: Vec<Question>,
}

impl QuestionSection {
    pub fn questions(&self, format: Format) -> &[Question] {
        match format {
            Format::Mcq => &self.mcq,
            Format::TrueFalse => &self.tf,
            Format::FillBlank => &self.fib,
        }
    }

    fn questions_mut(&mut self, format: Format) -> &mut Vec<Question> {
        match format {
            Format::Mcq => &mut self.mcq,
            Format::TrueFalse => &mut self.tf,
            Format::FillBlank => &mut self.fib,
        }
    }

    /// Number of questions of `format`, or of every format when `None`.
    pub fn count(&self, format: Option<Format>) -> usize {
        match format {
            Some(format) => self.questions(format).len(),
            None => self.mcq.len() + self.tf.len() + self.fib.len(),
        }
    }
}

/// One atlas region with its systems, in file order.
#[derive(Debug, Clone, PartialEq)]
pub struct AtlasRegion {
    pub name: String,
    pub systems: Vec<AtlasSystem>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AtlasSystem {
    pub name: String,
    pub topics: Vec<AtlasTopic>,
}

/// A reference topic in the atlas.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct AtlasTopic {
    #[serde(default, deserialize_with = "lenient_string")]
    pub title: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub subtitle: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub details: Vec<AtlasDetail>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub clinical: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct AtlasDetail {
    #[serde(default, deserialize_with = "lenient_text")]
    pub text: Option<String>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub points: Vec<DetailPoint>,
}

/// A bullet under an atlas detail: either bare text or an object with `text`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum DetailPoint {
    Text(String),
    Item {
        #[serde(default, deserialize_with = "lenient_text")]
        text: Option<String>,
    },
}

impl DetailPoint {
    pub fn text(&self) -> Option<&str> {
        match self {
            DetailPoint::Text(text) => Some(text),
            DetailPoint::Item { text } => text.as_deref(),
        }
    }
}

/// Identifier of a "why" card. Content files use numbers or strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CardId {
    Number(i64),
    Text(String),
}

impl fmt::Display for CardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CardId::Number(n) => write!(f, "{n}"),
            CardId::Text(s) => f.write_str(s),
        }
    }
}

/// A comparative-anatomy card.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct WhyCard {
    #[serde(default, deserialize_with = "lenient_id")]
    pub id: Option<CardId>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub title: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub why: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub category: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub comparison: String,
}

/// All browsable content. Read-only once loaded.
#[derive(Debug, Clone, Default)]
pub struct ContentStore {
    atlas: Vec<AtlasRegion>,
    why: Vec<WhyCard>,
    quiz: BTreeMap<Region, BTreeMap<System, QuestionSection>>,
}

impl ContentStore {
    /// Load a content file (`{"atlas": ..., "why": ..., "quiz": ...}`).
    pub fn from_path(path: &Path) -> Result<Self, ContentError> {
        let content = std::fs::read_to_string(path).map_err(|source| ContentError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&content)
    }

    pub fn from_json_str(content: &str) -> Result<Self, ContentError> {
        let value: Value = serde_json::from_str(content)?;
        Self::from_value(value)
    }

    pub fn from_value(value: Value) -> Result<Self, ContentError> {
        let Value::Object(root) = value else {
            return Err(ContentError::NotAnObject);
        };

        let store = Self {
            atlas: root.get("atlas").map(load_atlas).unwrap_or_default(),
            why: root.get("why").map(load_why).unwrap_or_default(),
            quiz: root.get("quiz").map(load_quiz).unwrap_or_default(),
        };

        tracing::debug!(
            atlas_regions = store.atlas.len(),
            why_cards = store.why.len(),
            quiz_sections = store.quiz.values().map(|s| s.len()).sum::<usize>(),
            "content loaded"
        );
        Ok(store)
    }

    /// File a question under `region`/`system`.
    pub fn insert_question(&mut self, region: Region, system: System, question: Question) {
        let format = question.format();
        self.quiz
            .entry(region)
            .or_default()
            .entry(system)
            .or_default()
            .questions_mut(format)
            .push(question);
    }

    pub fn section(&self, region: Region, system: System) -> Option<&QuestionSection> {
        self.quiz.get(&region).and_then(|systems| systems.get(&system))
    }

    /// Questions for one region/system/format; empty when any level is absent.
    pub fn questions(&self, region: Region, system: System, format: Format) -> &[Question] {
        self.section(region, system)
            .map(|section| section.questions(format))
            .unwrap_or(&[])
    }

    /// Every quiz section, in region then system enumeration order.
    pub fn quiz_sections(&self) -> impl Iterator<Item = (Region, System, &QuestionSection)> {
        self.quiz.iter().flat_map(|(region, systems)| {
            systems
                .iter()
                .map(move |(system, section)| (*region, *system, section))
        })
    }

    pub fn atlas(&self) -> &[AtlasRegion] {
        &self.atlas
    }

    pub fn why_cards(&self) -> &[WhyCard] {
        &self.why
    }

    /// Find an atlas topic by region, system and title (case-insensitive).
    pub fn atlas_topic(&self, region: &str, system: &str, title: &str) -> Option<&AtlasTopic> {
        self.atlas
            .iter()
            .filter(|r| r.name.eq_ignore_ascii_case(region))
            .flat_map(|r| r.systems.iter())
            .filter(|s| s.name.eq_ignore_ascii_case(system))
            .flat_map(|s| s.topics.iter())
            .find(|t| t.title.to_lowercase() == title.to_lowercase())
    }

    pub fn why_card(&self, id: &CardId) -> Option<&WhyCard> {
        self.why.iter().find(|card| card.id.as_ref() == Some(id))
    }

    pub fn is_empty(&self) -> bool {
        self.atlas.is_empty() && self.why.is_empty() && self.quiz.is_empty()
    }
}

fn load_atlas(value: &Value) -> Vec<AtlasRegion> {
    let Value::Object(regions) = value else {
        tracing::warn!("atlas section is not an object, skipping");
        return Vec::new();
    };

    regions
        .iter()
        .filter_map(|(region, systems)| {
            let Value::Object(systems) = systems else {
                tracing::warn!("atlas region '{region}' is not an object, skipping");
                return None;
            };
            let systems = systems
                .iter()
                .filter_map(|(system, items)| {
                    let Value::Array(items) = items else {
                        tracing::warn!("atlas list {region}/{system} is not an array, skipping");
                        return None;
                    };
                    let topics = items
                        .iter()
                        .filter_map(|item| decode_or_warn::<AtlasTopic>(item, "atlas topic"))
                        .collect();
                    Some(AtlasSystem {
                        name: system.clone(),
                        topics,
                    })
                })
                .collect();
            Some(AtlasRegion {
                name: region.clone(),
                systems,
            })
        })
        .collect()
}

fn load_why(value: &Value) -> Vec<WhyCard> {
    let Value::Array(cards) = value else {
        tracing::warn!("why section is not an array, skipping");
        return Vec::new();
    };
    cards
        .iter()
        .filter_map(|card| decode_or_warn::<WhyCard>(card, "why card"))
        .collect()
}

fn load_quiz(value: &Value) -> BTreeMap<Region, BTreeMap<System, QuestionSection>> {
    let mut bank: BTreeMap<Region, BTreeMap<System, QuestionSection>> = BTreeMap::new();
    let Value::Object(regions) = value else {
        tracing::warn!("quiz section is not an object, skipping");
        return bank;
    };

    for (region_name, systems) in regions {
        let region: Region = match region_name.parse() {
            Ok(region) => region,
            Err(e) => {
                tracing::warn!("skipping quiz region: {e}");
                continue;
            }
        };
        let Value::Object(systems) = systems else {
            tracing::warn!("quiz region '{region_name}' is not an object, skipping");
            continue;
        };

        for (system_name, section) in systems {
            let system: System = match system_name.parse() {
                Ok(system) => system,
                Err(e) => {
                    tracing::warn!("skipping quiz system under {region}: {e}");
                    continue;
                }
            };
            let Value::Object(section) = section else {
                tracing::warn!("quiz section {region}/{system} is not an object, skipping");
                continue;
            };

            let target = bank.entry(region).or_default().entry(system).or_default();
            for format in Format::ALL {
                let Some(Value::Array(items)) = section.get(format.code()) else {
                    continue;
                };
                for item in items {
                    let Some(wire) = decode_or_warn::<WireQuestion>(item, "quiz question") else {
                        continue;
                    };
                    match Question::from_wire(wire, format) {
                        Ok(question) => target.questions_mut(format).push(question),
                        Err(e) => tracing::warn!("skipping question in {region}/{system}: {e}"),
                    }
                }
            }
        }
    }

    bank
}

fn decode_or_warn<T: DeserializeOwned>(value: &Value, what: &str) -> Option<T> {
    match serde_json::from_value(value.clone()) {
        Ok(decoded) => Some(decoded),
        Err(e) => {
            tracing::warn!("skipping malformed {what}: {e}");
            None
        }
    }
}

fn lenient_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        _ => String::new(),
    })
}

fn lenient_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) if !s.is_empty() => Some(s),
        _ => None,
    })
}

fn lenient_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<CardId>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_i64().map(CardId::Number),
        Value::String(s) => Some(CardId::Text(s)),
        _ => None,
    })
}

fn lenient_list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Array(items) => items
            .into_iter()
            .filter_map(|item| serde_json::from_value(item).ok())
            .collect(),
        _ => Vec::new(),
    })
}
