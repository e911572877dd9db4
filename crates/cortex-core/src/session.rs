//! A single quiz run: answers, navigation, bookmarks and scoring.
//!
//! The session is a plain state container. Lifecycle (starting, pausing,
//! completing, persisting) is driven by [`crate::engine::QuizEngine`].

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::model::{
    Answer, Format, PooledQuestion, Question, QuestionKind, Region, Response, Scope, System,
};

/// Engine-level lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum QuizState {
    Menu,
    Active,
    /// Closed mid-quiz; only the saved snapshot remains.
    Paused,
    Completed,
    Reviewing,
}

impl fmt::Display for QuizState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            QuizState::Menu => "menu",
            QuizState::Active => "active",
            QuizState::Paused => "paused",
            QuizState::Completed => "completed",
            QuizState::Reviewing => "reviewing",
        };
        f.write_str(s)
    }
}

/// Result of submitting a response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnswerOutcome {
    Recorded { correct: bool, correct_answer: String },
    /// The question already has an answer; nothing changed.
    AlreadyAnswered,
    Rejected(RejectReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    NotActive,
    Completed,
    EmptyText,
    WrongKind,
    OptionOutOfRange,
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RejectReason::NotActive => "no quiz is running",
            RejectReason::Completed => "the quiz is already complete",
            RejectReason::EmptyText => "answer is empty",
            RejectReason::WrongKind => "response does not fit this question format",
            RejectReason::OptionOutOfRange => "no such option",
        };
        f.write_str(s)
    }
}

/// Result of moving forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    Moved(usize),
    /// Moved past the last question.
    Completed,
    Stayed,
}

/// Grade a response against a question without touching any session state.
pub fn grade(question: &Question, response: &Response) -> Result<Answer, RejectReason> {
    match (&question.kind, response) {
        (QuestionKind::Mcq { options, answer }, Response::Choice(selected)) => {
            if *selected >= options.len() {
                return Err(RejectReason::OptionOutOfRange);
            }
            Ok(Answer::Choice {
                selected_idx: *selected,
                is_correct: selected == answer,
                correct_answer: question.correct_answer_text(),
            })
        }
        (QuestionKind::TrueFalse { answer }, Response::Verdict(value)) => Ok(Answer::Verdict {
            answer: *value,
            is_correct: value == answer,
            correct_answer: *answer,
        }),
        (QuestionKind::FillBlank { answers }, Response::Text(text)) => {
            let cleaned = text.trim().to_lowercase();
            if cleaned.is_empty() {
                return Err(RejectReason::EmptyText);
            }
            let is_correct = answers.iter().any(|a| a.trim().to_lowercase() == cleaned);
            Ok(Answer::Text {
                answer: text.clone(),
                is_correct,
                correct_answer: question.correct_answer_text(),
            })
        }
        _ => Err(RejectReason::WrongKind),
    }
}

/// `round(100 * score / attempted)`, or 0 when nothing was attempted.
pub fn accuracy_percent(score: u32, attempted: u32) -> u32 {
    if attempted == 0 {
        return 0;
    }
    (f64::from(score) * 100.0 / f64::from(attempted)).round() as u32
}

/// `1m 5s`
pub fn format_duration(secs: u64) -> String {
    format!("{}m {}s", secs / 60, secs % 60)
}

/// `01:05`
pub fn format_clock(secs: u64) -> String {
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

/// Raw parts used to rebuild a session from a snapshot.
pub(crate) struct SessionParts {
    pub format: Format,
    pub region: Scope<Region>,
    pub system: Scope<System>,
    pub questions: Vec<PooledQuestion>,
    pub current_index: usize,
    pub answers: Vec<Option<Answer>>,
    pub score: u32,
    pub wrong: u32,
    pub bookmarks: Vec<usize>,
    pub flags: Vec<usize>,
    pub start_time_ms: i64,
}

/// State of one quiz run.
#[derive(Debug, Clone)]
pub struct QuizSession {
    format: Format,
    region: Scope<Region>,
    system: Scope<System>,
    questions: Vec<PooledQuestion>,
    current_index: usize,
    answers: Vec<Option<Answer>>,
    score: u32,
    wrong: u32,
    bookmarks: BTreeSet<usize>,
    flags: BTreeSet<usize>,
    start_time_ms: i64,
    end_time_ms: Option<i64>,
}

impl QuizSession {
    pub fn new(
        format: Format,
        region: Scope<Region>,
        system: Scope<System>,
        questions: Vec<PooledQuestion>,
        start_time_ms: i64,
    ) -> Self {
        let answers = vec![None; questions.len()];
        Self {
            format,
            region,
            system,
            questions,
            current_index: 0,
            answers,
            score: 0,
            wrong: 0,
            bookmarks: BTreeSet::new(),
            flags: BTreeSet::new(),
            start_time_ms,
            end_time_ms: None,
        }
    }

    /// Rebuild from saved parts, rejecting anything that breaks the session invariants.
    pub(crate) fn from_parts(parts: SessionParts) -> Result<Self, String> {
        let len = parts.questions.len();
        if len == 0 {
            return Err("saved quiz has no questions".into());
        }
        if let Some(q) = parts.questions.iter().find(|q| q.format() != parts.format) {
            return Err(format!(
                "question '{}' is {} in a {} quiz",
                q.question.prompt,
                q.format(),
                parts.format
            ));
        }
        if parts.answers.len() != len {
            return Err(format!(
                "{} answer slots for {} questions",
                parts.answers.len(),
                len
            ));
        }
        if parts.current_index >= len {
            return Err(format!(
                "current index {} is outside {} questions",
                parts.current_index, len
            ));
        }

        for (i, (question, answer)) in parts.questions.iter().zip(&parts.answers).enumerate() {
            let fits = match (answer, &question.question.kind) {
                (None, _) => true,
                (Some(Answer::Choice { selected_idx, .. }), QuestionKind::Mcq { options, .. }) => {
                    *selected_idx < options.len()
                }
                (Some(Answer::Verdict { .. }), QuestionKind::TrueFalse { .. }) => true,
                (Some(Answer::Text { .. }), QuestionKind::FillBlank { .. }) => true,
                _ => false,
            };
            if !fits {
                return Err(format!("answer {} does not fit its question", i + 1));
            }
        }

        let correct = parts.answers.iter().flatten().filter(|a| a.is_correct()).count();
        let incorrect = parts.answers.iter().flatten().count() - correct;
        if parts.score as usize != correct || parts.wrong as usize != incorrect {
            return Err(format!(
                "score {}/{} does not match recorded answers {}/{}",
                parts.score, parts.wrong, correct, incorrect
            ));
        }

        if let Some(bad) = parts
            .bookmarks
            .iter()
            .chain(&parts.flags)
            .find(|i| **i >= len)
        {
            return Err(format!("marker index {bad} is outside {len} questions"));
        }

        Ok(Self {
            format: parts.format,
            region: parts.region,
            system: parts.system,
            questions: parts.questions,
            current_index: parts.current_index,
            answers: parts.answers,
            score: parts.score,
            wrong: parts.wrong,
            bookmarks: parts.bookmarks.into_iter().collect(),
            flags: parts.flags.into_iter().collect(),
            start_time_ms: parts.start_time_ms,
            end_time_ms: None,
        })
    }

    pub fn format(&self) -> Format {
        self.format
    }

    pub fn region(&self) -> Scope<Region> {
        self.region
    }

    pub fn system(&self) -> Scope<System> {
        self.system
    }

    pub fn questions(&self) -> &[PooledQuestion] {
        &self.questions
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    /// The question under the cursor, `None` once complete.
    pub fn current(&self) -> Option<&PooledQuestion> {
        self.questions.get(self.current_index)
    }

    pub fn answer(&self, index: usize) -> Option<&Answer> {
        self.answers.get(index).and_then(Option::as_ref)
    }

    pub fn answers(&self) -> &[Option<Answer>] {
        &self.answers
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn wrong(&self) -> u32 {
        self.wrong
    }

    pub fn bookmarks(&self) -> &BTreeSet<usize> {
        &self.bookmarks
    }

    pub fn flags(&self) -> &BTreeSet<usize> {
        &self.flags
    }

    pub fn start_time_ms(&self) -> i64 {
        self.start_time_ms
    }

    pub fn is_complete(&self) -> bool {
        self.current_index >= self.questions.len()
    }

    pub fn is_last(&self) -> bool {
        self.current_index + 1 == self.questions.len()
    }

    /// Grade and record a response for the current question.
    ///
    /// A question is answered at most once; later submissions are ignored.
    pub fn check_answer(&mut self, response: Response) -> AnswerOutcome {
        let index = self.current_index;
        let Some(pooled) = self.questions.get(index) else {
            return AnswerOutcome::Rejected(RejectReason::Completed);
        };
        if self.answers[index].is_some() {
            tracing::debug!(index, "ignoring second answer for question");
            return AnswerOutcome::AlreadyAnswered;
        }

        match grade(&pooled.question, &response) {
            Ok(answer) => {
                let correct = answer.is_correct();
                let correct_answer = answer.correct_text();
                if correct {
                    self.score += 1;
                } else {
                    self.wrong += 1;
                }
                self.answers[index] = Some(answer);
                AnswerOutcome::Recorded {
                    correct,
                    correct_answer,
                }
            }
            Err(reason) => AnswerOutcome::Rejected(reason),
        }
    }

    pub fn prev(&mut self) -> bool {
        if self.current_index > 0 && !self.is_complete() {
            self.current_index -= 1;
            true
        } else {
            false
        }
    }

    /// Move forward; stepping past the last question completes the run.
    pub fn next(&mut self) -> Advance {
        if self.is_complete() {
            return Advance::Stayed;
        }
        self.current_index += 1;
        if self.is_complete() {
            Advance::Completed
        } else {
            Advance::Moved(self.current_index)
        }
    }

    /// Jump to any question. Out-of-range targets are ignored.
    pub fn go_to(&mut self, index: usize) -> bool {
        if self.is_complete() || index >= self.questions.len() {
            return false;
        }
        self.current_index = index;
        true
    }

    /// Mark the run complete at `now_ms`.
    pub(crate) fn finish(&mut self, now_ms: i64) {
        self.current_index = self.questions.len();
        self.end_time_ms.get_or_insert(now_ms);
    }

    /// Toggle the bookmark on the current question; returns the new state.
    pub fn toggle_bookmark(&mut self) -> Option<bool> {
        if self.is_complete() {
            return None;
        }
        Some(toggle(&mut self.bookmarks, self.current_index))
    }

    /// Toggle the review flag on the current question; returns the new state.
    pub fn toggle_flag(&mut self) -> Option<bool> {
        if self.is_complete() {
            return None;
        }
        Some(toggle(&mut self.flags, self.current_index))
    }

    pub fn is_bookmarked(&self, index: usize) -> bool {
        self.bookmarks.contains(&index)
    }

    pub fn is_flagged(&self, index: usize) -> bool {
        self.flags.contains(&index)
    }

    /// Whole seconds since start, frozen once the run is complete.
    pub fn elapsed_secs(&self, now_ms: i64) -> u64 {
        let end = self.end_time_ms.unwrap_or(now_ms);
        (end - self.start_time_ms).max(0) as u64 / 1000
    }

    pub fn attempted(&self) -> u32 {
        self.score + self.wrong
    }

    pub fn unanswered(&self) -> usize {
        self.questions.len() - self.attempted() as usize
    }

    /// Accuracy over attempted questions only.
    pub fn accuracy(&self) -> u32 {
        accuracy_percent(self.score, self.attempted())
    }

    pub fn summary(&self, now_ms: i64) -> SessionSummary {
        let accuracy = self.accuracy();
        SessionSummary {
            region: self.region,
            system: self.system,
            format: self.format,
            total: self.questions.len(),
            score: self.score,
            wrong: self.wrong,
            attempted: self.attempted(),
            unanswered: self.unanswered(),
            accuracy,
            elapsed_secs: self.elapsed_secs(now_ms),
            advice: Advice::for_result(self.attempted(), accuracy),
        }
    }

    /// Per `Region > System` totals, in order of first appearance in the pool.
    pub fn breakdown(&self) -> Vec<CategoryStats> {
        let mut stats: Vec<CategoryStats> = Vec::new();
        for (i, pooled) in self.questions.iter().enumerate() {
            let key = pooled.category();
            let correct = self.answer(i).is_some_and(Answer::is_correct);
            let position = match stats.iter().position(|s| s.key == key) {
                Some(position) => position,
                None => {
                    stats.push(CategoryStats {
                        key,
                        region: pooled.region,
                        system: pooled.system,
                        total: 0,
                        correct: 0,
                    });
                    stats.len() - 1
                }
            };
            stats[position].total += 1;
            if correct {
                stats[position].correct += 1;
            }
        }
        stats
    }

    fn status(&self, index: usize) -> ReviewStatus {
        match self.answer(index) {
            Some(a) if a.is_correct() => ReviewStatus::Correct,
            Some(_) => ReviewStatus::Incorrect,
            None => ReviewStatus::Unanswered,
        }
    }

    /// Review items matching `filter`, in pool order.
    pub fn review(&self, filter: ReviewFilter) -> Vec<ReviewItem<'_>> {
        self.questions
            .iter()
            .enumerate()
            .map(|(index, question)| ReviewItem {
                index,
                question,
                answer: self.answer(index),
                status: self.status(index),
                bookmarked: self.is_bookmarked(index),
                flagged: self.is_flagged(index),
            })
            .filter(|item| filter.matches(item))
            .collect()
    }

    pub fn review_counts(&self) -> ReviewCounts {
        ReviewCounts {
            all: self.questions.len(),
            correct: self.score as usize,
            incorrect: self.wrong as usize,
            unanswered: self.unanswered(),
            bookmarked: self.bookmarks.len(),
            flagged: self.flags.len(),
        }
    }
}

fn toggle(set: &mut BTreeSet<usize>, index: usize) -> bool {
    if set.remove(&index) {
        false
    } else {
        set.insert(index);
        true
    }
}

/// End-of-run numbers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionSummary {
    pub region: Scope<Region>,
    pub system: Scope<System>,
    pub format: Format,
    pub total: usize,
    pub score: u32,
    pub wrong: u32,
    pub attempted: u32,
    pub unanswered: usize,
    pub accuracy: u32,
    pub elapsed_secs: u64,
    pub advice: Advice,
}

/// Performance band shown with the summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Advice {
    NotAttempted,
    Outstanding,
    Great,
    Good,
    KeepPracticing,
}

impl Advice {
    pub fn for_result(attempted: u32, accuracy: u32) -> Self {
        match accuracy {
            _ if attempted == 0 => Advice::NotAttempted,
            90.. => Advice::Outstanding,
            75..=89 => Advice::Great,
            60..=74 => Advice::Good,
            _ => Advice::KeepPracticing,
        }
    }

    pub fn message(&self, region: Scope<Region>, system: Scope<System>) -> String {
        match self {
            Advice::NotAttempted => {
                "No questions attempted. Try again when you're ready!".to_string()
            }
            Advice::Outstanding => format!(
                "OUTSTANDING! You have mastered {region} - {system}. Proceed to clinical applications with confidence."
            ),
            Advice::Great => format!(
                "GREAT JOB! Strong proficiency in {region} - {system}. Review the flagged and bookmarked questions to push higher."
            ),
            Advice::Good => format!(
                "GOOD EFFORT! You're building solid knowledge in {region} - {system}. Review the questions you missed."
            ),
            Advice::KeepPracticing => format!(
                "KEEP PRACTICING! {region} - {system} needs more study. Revisit the Atlas section."
            ),
        }
    }
}

/// Per-category result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryStats {
    pub key: String,
    pub region: Region,
    pub system: System,
    pub total: usize,
    pub correct: usize,
}

impl CategoryStats {
    pub fn percent(&self) -> u32 {
        accuracy_percent(self.correct as u32, self.total as u32)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewStatus {
    Correct,
    Incorrect,
    Unanswered,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReviewFilter {
    #[default]
    All,
    Correct,
    Incorrect,
    Unanswered,
    Bookmarked,
    Flagged,
}

impl ReviewFilter {
    fn matches(&self, item: &ReviewItem<'_>) -> bool {
        match self {
            ReviewFilter::All => true,
            ReviewFilter::Correct => item.status == ReviewStatus::Correct,
            ReviewFilter::Incorrect => item.status == ReviewStatus::Incorrect,
            ReviewFilter::Unanswered => item.status == ReviewStatus::Unanswered,
            ReviewFilter::Bookmarked => item.bookmarked,
            ReviewFilter::Flagged => item.flagged,
        }
    }
}

impl FromStr for ReviewFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "" | "all" => Ok(ReviewFilter::All),
            "correct" => Ok(ReviewFilter::Correct),
            "incorrect" | "wrong" => Ok(ReviewFilter::Incorrect),
            "unanswered" => Ok(ReviewFilter::Unanswered),
            "bookmarked" => Ok(ReviewFilter::Bookmarked),
            "flagged" => Ok(ReviewFilter::Flagged),
            other => Err(format!("unknown review filter: {other}")),
        }
    }
}

/// One row of the review list.
#[derive(Debug, Clone)]
pub struct ReviewItem<'a> {
    pub index: usize,
    pub question: &'a PooledQuestion,
    pub answer: Option<&'a Answer>,
    pub status: ReviewStatus,
    pub bookmarked: bool,
    pub flagged: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReviewCounts {
    pub all: usize,
    pub correct: usize,
    pub incorrect: usize,
    pub unanswered: usize,
    pub bookmarked: usize,
    pub flagged: usize,
}
