//! Core data model types for cortex.
//!
//! Regions, systems and formats are closed enumerations; questions are a
//! tagged union keyed by format so each variant only carries the fields it
//! needs.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::error::ContentError;

/// Label used for the "union over every value" pseudo-choice.
pub const COMBINED: &str = "Combined";

/// Implemented by the closed enumerations that can be expanded by [`Scope::Combined`].
pub trait Enumerated: Sized + Copy + 'static {
    /// Every value, in canonical iteration order.
    const ALL: &'static [Self];
}

/// Top-level anatomical grouping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Region {
    Forelimb,
    Hindlimb,
    #[serde(rename = "Head & Neck")]
    HeadAndNeck,
    Thorax,
    Abdomen,
    Pelvis,
}

impl Enumerated for Region {
    const ALL: &'static [Self] = &[
        Region::Forelimb,
        Region::Hindlimb,
        Region::HeadAndNeck,
        Region::Thorax,
        Region::Abdomen,
        Region::Pelvis,
    ];
}

impl Region {
    pub fn as_str(&self) -> &'static str {
        match self {
            Region::Forelimb => "Forelimb",
            Region::Hindlimb => "Hindlimb",
            Region::HeadAndNeck => "Head & Neck",
            Region::Thorax => "Thorax",
            Region::Abdomen => "Abdomen",
            Region::Pelvis => "Pelvis",
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Region {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "forelimb" => Ok(Region::Forelimb),
            "hindlimb" => Ok(Region::Hindlimb),
            "head & neck" | "head and neck" | "head-neck" => Ok(Region::HeadAndNeck),
            "thorax" => Ok(Region::Thorax),
            "abdomen" => Ok(Region::Abdomen),
            "pelvis" => Ok(Region::Pelvis),
            other => Err(format!("unknown region: {other}")),
        }
    }
}

/// Anatomical subdivision within a region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum System {
    Osteology,
    Myology,
    Arthrology,
    Neurology,
    Angiology,
}

impl Enumerated for System {
    const ALL: &'static [Self] = &[
        System::Osteology,
        System::Myology,
        System::Arthrology,
        System::Neurology,
        System::Angiology,
    ];
}

impl System {
    pub fn as_str(&self) -> &'static str {
        match self {
            System::Osteology => "Osteology",
            System::Myology => "Myology",
            System::Arthrology => "Arthrology",
            System::Neurology => "Neurology",
            System::Angiology => "Angiology",
        }
    }
}

impl fmt::Display for System {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for System {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "osteology" => Ok(System::Osteology),
            "myology" => Ok(System::Myology),
            "arthrology" => Ok(System::Arthrology),
            "neurology" => Ok(System::Neurology),
            "angiology" => Ok(System::Angiology),
            other => Err(format!("unknown system: {other}")),
        }
    }
}

/// Question style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Format {
    #[serde(rename = "mcq")]
    Mcq,
    #[serde(rename = "tf")]
    TrueFalse,
    #[serde(rename = "fib")]
    FillBlank,
}

impl Format {
    pub const ALL: [Format; 3] = [Format::Mcq, Format::TrueFalse, Format::FillBlank];

    /// Short storage code (`mcq`, `tf`, `fib`).
    pub fn code(&self) -> &'static str {
        match self {
            Format::Mcq => "mcq",
            Format::TrueFalse => "tf",
            Format::FillBlank => "fib",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Format::Mcq => "Multiple Choice",
            Format::TrueFalse => "True / False",
            Format::FillBlank => "Fill in the Blank",
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Format {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "mcq" | "multiple-choice" => Ok(Format::Mcq),
            "tf" | "true-false" | "truefalse" => Ok(Format::TrueFalse),
            "fib" | "fill" | "fill-in-blank" => Ok(Format::FillBlank),
            other => Err(format!("unknown format: {other}")),
        }
    }
}

/// Either a single value or the `Combined` union over every value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope<T> {
    Combined,
    Only(T),
}

impl<T: Enumerated + PartialEq> Scope<T> {
    /// Expand into concrete values, in canonical order.
    pub fn expand(&self) -> Vec<T> {
        match self {
            Scope::Combined => T::ALL.to_vec(),
            Scope::Only(value) => vec![*value],
        }
    }
}

impl<T: fmt::Display> fmt::Display for Scope<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::Combined => f.write_str(COMBINED),
            Scope::Only(value) => value.fmt(f),
        }
    }
}

impl<T: FromStr> FromStr for Scope<T> {
    type Err = T::Err;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case(COMBINED) {
            Ok(Scope::Combined)
        } else {
            s.parse().map(Scope::Only)
        }
    }
}

impl<T: fmt::Display> Serialize for Scope<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de, T> Deserialize<'de> for Scope<T>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// A quiz question as stored in the content bank.
#[derive(Debug, Clone, PartialEq)]
pub struct Question {
    pub prompt: String,
    pub explanation: String,
    pub kind: QuestionKind,
}

/// Format-specific answer key.
#[derive(Debug, Clone, PartialEq)]
pub enum QuestionKind {
    Mcq { options: Vec<String>, answer: usize },
    TrueFalse { answer: bool },
    /// Accepted answers; the first one is canonical.
    FillBlank { answers: Vec<String> },
}

impl QuestionKind {
    pub fn format(&self) -> Format {
        match self {
            QuestionKind::Mcq { .. } => Format::Mcq,
            QuestionKind::TrueFalse { .. } => Format::TrueFalse,
            QuestionKind::FillBlank { .. } => Format::FillBlank,
        }
    }
}

impl Question {
    pub fn mcq(prompt: &str, options: &[&str], answer: usize, explanation: &str) -> Self {
        Self {
            prompt: prompt.to_string(),
            explanation: explanation.to_string(),
            kind: QuestionKind::Mcq {
                options: options.iter().map(|o| o.to_string()).collect(),
                answer,
            },
        }
    }

    pub fn true_false(prompt: &str, answer: bool, explanation: &str) -> Self {
        Self {
            prompt: prompt.to_string(),
            explanation: explanation.to_string(),
            kind: QuestionKind::TrueFalse { answer },
        }
    }

    pub fn fill_blank(prompt: &str, answers: &[&str], explanation: &str) -> Self {
        Self {
            prompt: prompt.to_string(),
            explanation: explanation.to_string(),
            kind: QuestionKind::FillBlank {
                answers: answers.iter().map(|a| a.to_string()).collect(),
            },
        }
    }

    pub fn format(&self) -> Format {
        self.kind.format()
    }

    /// Display text of the correct answer.
    pub fn correct_answer_text(&self) -> String {
        match &self.kind {
            QuestionKind::Mcq { options, answer } => {
                options.get(*answer).cloned().unwrap_or_default()
            }
            QuestionKind::TrueFalse { answer } => verdict_label(*answer).to_string(),
            QuestionKind::FillBlank { answers } => answers.first().cloned().unwrap_or_default(),
        }
    }

    /// Convert a content-bank record, checking it against the format it was filed under.
    pub(crate) fn from_wire(wire: WireQuestion, format: Format) -> Result<Self, ContentError> {
        let invalid = |reason: &str| ContentError::InvalidQuestion {
            prompt: wire.q.clone(),
            reason: reason.to_string(),
        };

        let kind = match (format, &wire.a) {
            (Format::Mcq, WireAnswerKey::Index(answer)) => {
                if wire.o.is_empty() {
                    return Err(invalid("multiple-choice question has no options"));
                }
                if *answer >= wire.o.len() {
                    return Err(invalid("correct option index is out of range"));
                }
                QuestionKind::Mcq {
                    options: wire.o.clone(),
                    answer: *answer,
                }
            }
            (Format::TrueFalse, WireAnswerKey::Verdict(answer)) => {
                QuestionKind::TrueFalse { answer: *answer }
            }
            (Format::FillBlank, WireAnswerKey::Accepted(answers)) => {
                if answers.is_empty() {
                    return Err(invalid("fill-in-blank question has no accepted answers"));
                }
                QuestionKind::FillBlank {
                    answers: answers.clone(),
                }
            }
            (Format::FillBlank, WireAnswerKey::Single(answer)) => QuestionKind::FillBlank {
                answers: vec![answer.clone()],
            },
            (format, _) => {
                return Err(invalid(&format!("answer key does not match format {format}")));
            }
        };

        Ok(Self {
            prompt: wire.q,
            explanation: wire.e,
            kind,
        })
    }

    pub(crate) fn to_wire(&self) -> WireQuestion {
        let (o, a) = match &self.kind {
            QuestionKind::Mcq { options, answer } => {
                (options.clone(), WireAnswerKey::Index(*answer))
            }
            QuestionKind::TrueFalse { answer } => (Vec::new(), WireAnswerKey::Verdict(*answer)),
            QuestionKind::FillBlank { answers } => {
                (Vec::new(), WireAnswerKey::Accepted(answers.clone()))
            }
        };
        WireQuestion {
            q: self.prompt.clone(),
            o,
            a,
            e: self.explanation.clone(),
        }
    }
}

/// Upper-case label for a true/false value.
pub fn verdict_label(value: bool) -> &'static str {
    if value {
        "TRUE"
    } else {
        "FALSE"
    }
}

/// Question record as it appears in content files and snapshots.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct WireQuestion {
    pub q: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub o: Vec<String>,
    pub a: WireAnswerKey,
    #[serde(default)]
    pub e: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub(crate) enum WireAnswerKey {
    Index(usize),
    Verdict(bool),
    Accepted(Vec<String>),
    Single(String),
}

/// A question placed in a quiz pool, stamped with where it came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "StampedWire", into = "StampedWire")]
pub struct PooledQuestion {
    pub question: Question,
    pub region: Region,
    pub system: System,
}

impl PooledQuestion {
    pub fn format(&self) -> Format {
        self.question.format()
    }

    /// Breakdown key, e.g. `Thorax > Myology`.
    pub fn category(&self) -> String {
        format!("{} > {}", self.region, self.system)
    }
}

#[derive(Serialize, Deserialize)]
struct StampedWire {
    #[serde(flatten)]
    question: WireQuestion,
    #[serde(rename = "_region")]
    region: Region,
    #[serde(rename = "_system")]
    system: System,
    #[serde(rename = "_mode")]
    mode: Format,
}

impl TryFrom<StampedWire> for PooledQuestion {
    type Error = ContentError;

    fn try_from(wire: StampedWire) -> Result<Self, Self::Error> {
        Ok(Self {
            question: Question::from_wire(wire.question, wire.mode)?,
            region: wire.region,
            system: wire.system,
        })
    }
}

impl From<PooledQuestion> for StampedWire {
    fn from(pooled: PooledQuestion) -> Self {
        Self {
            question: pooled.question.to_wire(),
            region: pooled.region,
            system: pooled.system,
            mode: pooled.question.format(),
        }
    }
}

/// What the user submitted for a question.
#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    Choice(usize),
    Verdict(bool),
    Text(String),
}

/// A recorded answer. Keeps the correct answer as it was at answer time so
/// review never has to consult the live question again.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Answer {
    #[serde(rename_all = "camelCase")]
    Choice {
        selected_idx: usize,
        is_correct: bool,
        correct_answer: String,
    },
    #[serde(rename_all = "camelCase")]
    Verdict {
        answer: bool,
        is_correct: bool,
        correct_answer: bool,
    },
    #[serde(rename_all = "camelCase")]
    Text {
        answer: String,
        is_correct: bool,
        correct_answer: String,
    },
}

impl Answer {
    pub fn is_correct(&self) -> bool {
        match self {
            Answer::Choice { is_correct, .. }
            | Answer::Verdict { is_correct, .. }
            | Answer::Text { is_correct, .. } => *is_correct,
        }
    }

    /// What the user picked, rendered against the question it answers.
    pub fn selected_text(&self, question: &Question) -> String {
        match (self, &question.kind) {
            (Answer::Choice { selected_idx, .. }, QuestionKind::Mcq { options, .. }) => {
                options.get(*selected_idx).cloned().unwrap_or_default()
            }
            (Answer::Choice { selected_idx, .. }, _) => format!("option {}", selected_idx + 1),
            (Answer::Verdict { answer, .. }, _) => verdict_label(*answer).to_string(),
            (Answer::Text { answer, .. }, _) => answer.clone(),
        }
    }

    pub fn correct_text(&self) -> String {
        match self {
            Answer::Choice { correct_answer, .. } | Answer::Text { correct_answer, .. } => {
                correct_answer.clone()
            }
            Answer::Verdict { correct_answer, .. } => verdict_label(*correct_answer).to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn region_display_and_parse() {
        assert_eq!(Region::HeadAndNeck.to_string(), "Head & Neck");
        assert_eq!("head & neck".parse::<Region>().unwrap(), Region::HeadAndNeck);
        assert_eq!("THORAX".parse::<Region>().unwrap(), Region::Thorax);
        assert!("Tail".parse::<Region>().is_err());
        assert_eq!(Region::ALL.len(), 6);
        assert_eq!(System::ALL.len(), 5);
    }

    #[test]
    fn scope_parse_and_expand() {
        let combined: Scope<Region> = "combined".parse().unwrap();
        assert_eq!(combined, Scope::Combined);
        assert_eq!(combined.expand(), Region::ALL.to_vec());

        let only: Scope<System> = "Myology".parse().unwrap();
        assert_eq!(only.expand(), vec![System::Myology]);
        assert_eq!(Scope::<System>::Combined.to_string(), "Combined");
    }

    #[test]
    fn scope_serializes_as_plain_string() {
        let json = serde_json::to_string(&Scope::Only(Region::HeadAndNeck)).unwrap();
        assert_eq!(json, "\"Head & Neck\"");
        let back: Scope<Region> = serde_json::from_str("\"Combined\"").unwrap();
        assert_eq!(back, Scope::Combined);
    }

    #[test]
    fn format_codes() {
        assert_eq!(Format::TrueFalse.to_string(), "tf");
        assert_eq!("FIB".parse::<Format>().unwrap(), Format::FillBlank);
        assert_eq!(
            serde_json::to_string(&Format::Mcq).unwrap(),
            "\"mcq\"".to_string()
        );
    }

    #[test]
    fn wire_question_rejects_mismatched_key() {
        let wire: WireQuestion =
            serde_json::from_str(r#"{"q":"Is the femur long?","a":true,"e":""}"#).unwrap();
        assert!(Question::from_wire(wire.clone(), Format::TrueFalse).is_ok());
        assert!(Question::from_wire(wire, Format::Mcq).is_err());
    }

    #[test]
    fn wire_mcq_index_out_of_range() {
        let wire: WireQuestion =
            serde_json::from_str(r#"{"q":"Pick","o":["a","b"],"a":2}"#).unwrap();
        let err = Question::from_wire(wire, Format::Mcq).unwrap_err();
        assert!(err.to_string().contains("out of range"));
    }

    #[test]
    fn pooled_question_keeps_stamp_in_json() {
        let pooled = PooledQuestion {
            question: Question::fill_blank("Longest bone?", &["femur", "os femoris"], "Thigh."),
            region: Region::Hindlimb,
            system: System::Osteology,
        };
        let json = serde_json::to_value(&pooled).unwrap();
        assert_eq!(json["_region"], "Hindlimb");
        assert_eq!(json["_system"], "Osteology");
        assert_eq!(json["_mode"], "fib");
        assert_eq!(json["a"][0], "femur");

        let back: PooledQuestion = serde_json::from_value(json).unwrap();
        assert_eq!(back, pooled);
    }

    #[test]
    fn answer_wire_shapes() {
        let choice: Answer = serde_json::from_str(
            r#"{"selectedIdx":1,"isCorrect":false,"correctAnswer":"Radius"}"#,
        )
        .unwrap();
        assert!(matches!(choice, Answer::Choice { selected_idx: 1, .. }));

        let verdict: Answer =
            serde_json::from_str(r#"{"answer":true,"isCorrect":true,"correctAnswer":true}"#)
                .unwrap();
        assert!(verdict.is_correct());
        assert_eq!(verdict.correct_text(), "TRUE");

        let text: Answer = serde_json::from_str(
            r#"{"answer":" Femur ","isCorrect":true,"correctAnswer":"femur"}"#,
        )
        .unwrap();
        assert!(matches!(text, Answer::Text { .. }));
    }

    #[test]
    fn correct_answer_text_per_kind() {
        let q = Question::mcq("Which?", &["Ulna", "Radius"], 1, "");
        assert_eq!(q.correct_answer_text(), "Radius");
        let q = Question::true_false("True?", false, "");
        assert_eq!(q.correct_answer_text(), "FALSE");
    }
}
