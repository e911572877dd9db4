//! The `cortex dashboard` command.

use anyhow::Result;
use chrono::Local;
use comfy_table::{Cell, Color, Table};

use cortex_core::config::CortexConfig;
use cortex_core::dashboard::{self, Band};
use cortex_core::persistence::HistoryLog;

use super::open_storage;

pub fn execute(config: &CortexConfig, clear: bool) -> Result<()> {
    let history = HistoryLog::new(open_storage(config));

    if clear {
        history.clear()?;
        println!("History cleared.");
        return Ok(());
    }

    let entries = history.read();
    if entries.is_empty() {
        println!("No quizzes recorded yet. Finish a quiz to start tracking progress.");
        return Ok(());
    }

    let overview = dashboard::overview(&entries, &Local::now());
    let mut table = Table::new();
    table.set_header(vec![
        "Quizzes",
        "Questions",
        "Correct",
        "Avg Accuracy",
        "Best",
        "Streak",
    ]);
    table.add_row(vec![
        Cell::new(overview.total_quizzes),
        Cell::new(overview.total_questions),
        Cell::new(overview.total_correct),
        banded(overview.avg_accuracy),
        Cell::new(format!("{}%", overview.best_accuracy)),
        Cell::new(format!("{} days", overview.study_streak)),
    ]);
    println!("{table}");

    let strengths = dashboard::topic_strengths(&entries);
    let mut table = Table::new();
    table.set_header(vec!["Region", "System", "Attempts", "Score", "Accuracy"]);
    for topic in &strengths {
        table.add_row(vec![
            Cell::new(topic.region),
            Cell::new(topic.system),
            Cell::new(topic.attempts),
            Cell::new(format!("{}/{}", topic.total_score, topic.total_questions)),
            banded(topic.accuracy),
        ]);
    }
    println!("\nTopic strengths\n{table}");

    let trend: Vec<String> = dashboard::recent(&entries)
        .iter()
        .map(|e| e.accuracy_percent.to_string())
        .collect();
    println!("\nRecent accuracy (oldest to newest): {}", trend.join(" "));

    let mut table = Table::new();
    table.set_header(vec!["Date", "Region", "System", "Mode", "Score", "Accuracy"]);
    for entry in dashboard::latest_first(&entries) {
        table.add_row(vec![
            Cell::new(&entry.display_date),
            Cell::new(entry.region),
            Cell::new(entry.system),
            Cell::new(entry.format.code().to_uppercase()),
            Cell::new(format!("{}/{}", entry.score, entry.attempted)),
            banded(entry.accuracy_percent),
        ]);
    }
    println!("\nHistory\n{table}");
    Ok(())
}

fn banded(accuracy: u32) -> Cell {
    let color = match Band::for_accuracy(accuracy) {
        Band::Strong => Color::Green,
        Band::Fair => Color::Yellow,
        Band::Weak => Color::Red,
    };
    Cell::new(format!("{accuracy}%")).fg(color)
}
