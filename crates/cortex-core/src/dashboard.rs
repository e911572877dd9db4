//! Aggregate statistics over the session history log.

use std::collections::BTreeSet;

use chrono::{DateTime, Days, NaiveDate, TimeZone};
use serde::Serialize;

use crate::model::{Region, Scope, System};
use crate::persistence::HistoryEntry;
use crate::session::accuracy_percent;

/// Entries shown in the accuracy trend.
pub const RECENT_LIMIT: usize = 20;
/// Entries shown in the history listing.
pub const HISTORY_LIMIT: usize = 25;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Overview {
    pub total_quizzes: usize,
    pub total_questions: u32,
    pub total_correct: u32,
    /// Correct over all answered questions, not a mean of per-quiz percentages.
    pub avg_accuracy: u32,
    pub best_accuracy: u32,
    pub study_streak: u32,
}

/// Headline numbers. `now` fixes both "today" and the calendar used for streak days.
pub fn overview<Tz: TimeZone>(entries: &[HistoryEntry], now: &DateTime<Tz>) -> Overview {
    if entries.is_empty() {
        return Overview::default();
    }
    let total_questions: u32 = entries.iter().map(|e| e.attempted).sum();
    let total_correct: u32 = entries.iter().map(|e| e.score).sum();
    Overview {
        total_quizzes: entries.len(),
        total_questions,
        total_correct,
        avg_accuracy: accuracy_percent(total_correct, total_questions),
        best_accuracy: entries
            .iter()
            .map(|e| e.accuracy_percent)
            .max()
            .unwrap_or(0),
        study_streak: study_streak(entries, now),
    }
}

/// Consecutive calendar days with at least one quiz, counting back from today.
pub fn study_streak<Tz: TimeZone>(entries: &[HistoryEntry], now: &DateTime<Tz>) -> u32 {
    let tz = now.timezone();
    let days: BTreeSet<NaiveDate> = entries
        .iter()
        .filter_map(|e| tz.timestamp_millis_opt(e.timestamp_ms).single())
        .map(|dt| dt.date_naive())
        .collect();

    let mut streak = 0;
    let mut expected = now.date_naive();
    while days.contains(&expected) {
        streak += 1;
        match expected.checked_sub_days(Days::new(1)) {
            Some(previous) => expected = previous,
            None => break,
        }
    }
    streak
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicStrength {
    pub region: Scope<Region>,
    pub system: Scope<System>,
    pub total_score: u32,
    pub total_questions: u32,
    pub attempts: u32,
    pub accuracy: u32,
}

impl TopicStrength {
    /// `region|system`
    pub fn key(&self) -> String {
        format!("{}|{}", self.region, self.system)
    }

    pub fn band(&self) -> Band {
        Band::for_accuracy(self.accuracy)
    }
}

/// Per region/system totals, in order of first appearance.
pub fn topic_strengths(entries: &[HistoryEntry]) -> Vec<TopicStrength> {
    let mut out: Vec<TopicStrength> = Vec::new();
    for entry in entries {
        let position = out
            .iter()
            .position(|t| t.region == entry.region && t.system == entry.system);
        let topic = match position {
            Some(i) => &mut out[i],
            None => {
                out.push(TopicStrength {
                    region: entry.region,
                    system: entry.system,
                    total_score: 0,
                    total_questions: 0,
                    attempts: 0,
                    accuracy: 0,
                });
                let last = out.len() - 1;
                &mut out[last]
            }
        };
        topic.total_score += entry.score;
        topic.total_questions += entry.attempted;
        topic.attempts += 1;
    }
    for topic in &mut out {
        topic.accuracy = accuracy_percent(topic.total_score, topic.total_questions);
    }
    out
}

/// The last [`RECENT_LIMIT`] entries, oldest first.
pub fn recent(entries: &[HistoryEntry]) -> &[HistoryEntry] {
    &entries[entries.len().saturating_sub(RECENT_LIMIT)..]
}

/// Up to [`HISTORY_LIMIT`] entries, newest first.
pub fn latest_first(entries: &[HistoryEntry]) -> Vec<&HistoryEntry> {
    entries.iter().rev().take(HISTORY_LIMIT).collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Band {
    Strong,
    Fair,
    Weak,
}

impl Band {
    pub fn for_accuracy(accuracy: u32) -> Self {
        match accuracy {
            80.. => Band::Strong,
            60..=79 => Band::Fair,
            _ => Band::Weak,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Format;
    use chrono::{Duration, FixedOffset};

    fn now() -> DateTime<FixedOffset> {
        FixedOffset::east_opt(0)
            .unwrap()
            .with_ymd_and_hms(2026, 10, 19, 18, 0, 0)
            .unwrap()
    }

    fn entry(region: Region, score: u32, attempted: u32, days_ago: i64) -> HistoryEntry {
        let at = now() - Duration::days(days_ago);
        HistoryEntry {
            region: Scope::Only(region),
            system: Scope::Only(System::Myology),
            format: Format::Mcq,
            score,
            attempted,
            accuracy_percent: accuracy_percent(score, attempted),
            timestamp_ms: at.timestamp_millis(),
            display_date: at.format("%b %-d, %Y").to_string(),
        }
    }

    #[test]
    fn empty_history_is_all_zero() {
        assert_eq!(overview(&[], &now()), Overview::default());
        assert!(topic_strengths(&[]).is_empty());
    }

    #[test]
    fn overview_pools_questions() {
        let history = vec![
            entry(Region::Thorax, 9, 10, 0),
            entry(Region::Thorax, 1, 10, 0),
            entry(Region::Pelvis, 0, 0, 1),
        ];
        let o = overview(&history, &now());
        assert_eq!(o.total_quizzes, 3);
        assert_eq!(o.total_questions, 20);
        assert_eq!(o.total_correct, 10);
        assert_eq!(o.avg_accuracy, 50);
        assert_eq!(o.best_accuracy, 90);
        assert_eq!(o.study_streak, 2);
    }

    #[test]
    fn streak_breaks_on_gap_and_needs_today() {
        let gap = vec![entry(Region::Thorax, 1, 1, 0), entry(Region::Thorax, 1, 1, 2)];
        assert_eq!(study_streak(&gap, &now()), 1);

        let stale = vec![entry(Region::Thorax, 1, 1, 1)];
        assert_eq!(study_streak(&stale, &now()), 0);
    }

    #[test]
    fn strengths_group_by_region_and_system() {
        let history = vec![
            entry(Region::Thorax, 3, 4, 0),
            entry(Region::Pelvis, 1, 4, 0),
            entry(Region::Thorax, 4, 4, 0),
        ];
        let strengths = topic_strengths(&history);
        assert_eq!(strengths.len(), 2);
        assert_eq!(strengths[0].key(), "Thorax|Myology");
        assert_eq!(strengths[0].attempts, 2);
        assert_eq!(strengths[0].accuracy, 88);
        assert_eq!(strengths[0].band(), Band::Strong);
        assert_eq!(strengths[1].band(), Band::Weak);
        assert_eq!(strengths[1].key(), "Pelvis|Myology");
    }

    #[test]
    fn recent_and_latest_windows() {
        let history: Vec<_> = (0..30).map(|i| entry(Region::Thorax, i, 30, 0)).collect();
        let recent = recent(&history);
        assert_eq!(recent.len(), RECENT_LIMIT);
        assert_eq!(recent[0].score, 10);
        let latest = latest_first(&history);
        assert_eq!(latest.len(), HISTORY_LIMIT);
        assert_eq!(latest[0].score, 29);
        assert_eq!(Band::for_accuracy(60), Band::Fair);
        assert_eq!(Band::for_accuracy(59), Band::Weak);
    }
}
