//! The `cortex quiz` command: an interactive quiz over stdin.

use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::time::MissedTickBehavior;

use cortex_core::clock::SystemClock;
use cortex_core::config::CortexConfig;
use cortex_core::model::{Format, QuestionKind, Region, Response, Scope, System};
use cortex_core::session::{
    format_clock, format_duration, Advance, AnswerOutcome, QuizState, ReviewFilter, ReviewStatus,
};
use cortex_core::{EngineOptions, Notice, QuizEngine, TimerEvent};

use super::{load_content, open_storage};

const HELP: &str = "Commands: a <answer>  n(ext)  p(rev)  g <number>  b(ookmark)  f(lag)  s(ave)  finish  q(uit)  review [all|correct|incorrect|unanswered|bookmarked|flagged]  help";

enum Flow {
    Continue,
    Quit,
}

pub async fn execute(
    config: &CortexConfig,
    region: Option<String>,
    system: Option<String>,
    format: String,
    seed: Option<u64>,
    resume: bool,
) -> Result<()> {
    let content = load_content(config)?;
    let mut engine = QuizEngine::new(content, open_storage(config), Arc::new(SystemClock))
        .with_options(EngineOptions::from(config));
    if let Some(seed) = seed {
        engine = engine.with_rng(StdRng::seed_from_u64(seed));
    }

    if resume {
        let resumed = engine.resume();
        print_notices(&mut engine);
        resumed.context("could not resume")?;
    } else {
        let region: Scope<Region> = region
            .context("--region is required (or use --resume)")?
            .parse()
            .map_err(|e: String| anyhow!(e))?;
        let system: Scope<System> = system
            .context("--system is required (or use --resume)")?
            .parse()
            .map_err(|e: String| anyhow!(e))?;
        let format: Format = format.parse().map_err(|e: String| anyhow!(e))?;

        engine.select_region(region)?;
        engine.select_system(system)?;
        let started = engine.start(format);
        print_notices(&mut engine);
        let size = started?;
        println!("{region} - {system}: {size} {} question(s)", format.label());
        if engine.has_saved_progress() {
            println!("(a previously saved quiz will be replaced on the next save)");
        }
    }
    println!("{HELP}");
    render_question(&engine);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut ticker = tokio::time::interval(config.tick_interval());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            line = lines.next_line() => {
                match line.context("failed to read input")? {
                    Some(line) => {
                        if let Flow::Quit = handle_line(&mut engine, line.trim())? {
                            break;
                        }
                    }
                    None => {
                        engine.dispose();
                        break;
                    }
                }
            }
            _ = ticker.tick() => {
                for event in engine.poll() {
                    match event {
                        TimerEvent::Autosaved => tracing::debug!("autosaved"),
                        TimerEvent::Tick { elapsed_secs } => {
                            tracing::trace!(elapsed = %format_clock(elapsed_secs), "tick");
                        }
                    }
                }
            }
        }
    }
    Ok(())
}

fn handle_line(engine: &mut QuizEngine, line: &str) -> Result<Flow> {
    let (command, arg) = match line.split_once(char::is_whitespace) {
        Some((command, arg)) => (command, arg.trim()),
        None => (line, ""),
    };

    match (engine.state(), command) {
        (_, "") => {}
        (_, "help" | "h" | "?") => println!("{HELP}"),
        (QuizState::Active, "a" | "answer") => answer(engine, arg),
        (QuizState::Active, "n" | "next") => {
            if engine.next()? == Advance::Completed {
                render_summary(engine);
            } else {
                render_question(engine);
            }
        }
        (QuizState::Active, "p" | "prev") => {
            if engine.prev() {
                render_question(engine);
            }
        }
        (QuizState::Active, "g" | "go") => match arg.parse::<usize>() {
            Ok(n) if n >= 1 && engine.go_to(n - 1) => render_question(engine),
            _ => println!("No question {arg}."),
        },
        (QuizState::Active, "b" | "bookmark") => {
            if let Some(on) = engine.toggle_bookmark() {
                println!("{}", if on { "Bookmarked." } else { "Bookmark removed." });
            }
        }
        (QuizState::Active, "f" | "flag") => {
            if let Some(on) = engine.toggle_flag() {
                println!("{}", if on { "Flagged for review." } else { "Flag removed." });
            }
        }
        (QuizState::Active, "s" | "save") => {
            if engine.save_snapshot()? {
                println!("Progress saved.");
            }
        }
        (QuizState::Active, "finish") => {
            engine.finish()?;
            render_summary(engine);
        }
        (QuizState::Active, "q" | "quit") => match engine.close() {
            Ok(()) => {
                println!("Progress saved. Resume later with `cortex quiz --resume`.");
                return Ok(Flow::Quit);
            }
            Err(e) => println!("Could not save progress: {e:#}. The quiz is still open."),
        },
        (QuizState::Completed | QuizState::Reviewing, "review" | "r") => {
            match arg.parse::<ReviewFilter>() {
                Ok(filter) => render_review(engine, filter)?,
                Err(e) => println!("{e}"),
            }
        }
        (_, "q" | "quit") => {
            engine.reset();
            return Ok(Flow::Quit);
        }
        (state, other) => println!("'{other}' is not available while {state}. Type 'help'."),
    }
    Ok(Flow::Continue)
}

fn answer(engine: &mut QuizEngine, arg: &str) {
    let Some(question) = engine.session().and_then(|s| s.current()) else {
        return;
    };
    let response = match parse_response(&question.question.kind, arg) {
        Some(response) => response,
        None => {
            println!("Could not read '{arg}' as an answer to this question.");
            return;
        }
    };
    let explanation = question.question.explanation.clone();

    match engine.answer(response) {
        AnswerOutcome::Recorded {
            correct,
            correct_answer,
        } => {
            if correct {
                println!("Correct!");
            } else {
                println!("Incorrect. Answer: {correct_answer}");
            }
            if !explanation.is_empty() {
                println!("  {explanation}");
            }
        }
        AnswerOutcome::AlreadyAnswered => println!("Already answered."),
        AnswerOutcome::Rejected(reason) => println!("Not recorded: {reason}."),
    }
}

/// Read a typed answer: option number or letter for mcq, t/f for true/false,
/// free text for fill-in-blank.
fn parse_response(kind: &QuestionKind, arg: &str) -> Option<Response> {
    match kind {
        QuestionKind::Mcq { .. } => {
            if let Ok(n) = arg.parse::<usize>() {
                return n.checked_sub(1).map(Response::Choice);
            }
            let mut chars = arg.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) if c.is_ascii_alphabetic() => Some(Response::Choice(
                    (c.to_ascii_lowercase() as u8 - b'a') as usize,
                )),
                _ => None,
            }
        }
        QuestionKind::TrueFalse { .. } => match arg.to_lowercase().as_str() {
            "t" | "true" | "y" | "yes" => Some(Response::Verdict(true)),
            "f" | "false" | "n" | "no" => Some(Response::Verdict(false)),
            _ => None,
        },
        QuestionKind::FillBlank { .. } => Some(Response::Text(arg.to_string())),
    }
}

fn render_question(engine: &QuizEngine) {
    let Some(session) = engine.session() else {
        return;
    };
    let Some(pooled) = session.current() else {
        return;
    };
    let index = session.current_index();
    let mut markers = String::new();
    if session.is_bookmarked(index) {
        markers.push_str(" [bookmarked]");
    }
    if session.is_flagged(index) {
        markers.push_str(" [flagged]");
    }

    let elapsed = engine.summary().map_or(0, |s| s.elapsed_secs);
    println!(
        "\nQuestion {} of {}  ({})  score {}  wrong {}  time {}{markers}",
        index + 1,
        session.len(),
        pooled.category(),
        session.score(),
        session.wrong(),
        format_clock(elapsed)
    );
    println!("{}", pooled.question.prompt);
    match &pooled.question.kind {
        QuestionKind::Mcq { options, .. } => {
            for (i, option) in options.iter().enumerate() {
                println!("  {}) {option}", (b'A' + (i % 26) as u8) as char);
            }
        }
        QuestionKind::TrueFalse { .. } => println!("  TRUE / FALSE"),
        QuestionKind::FillBlank { .. } => println!("  ____"),
    }
    if let Some(answer) = session.answer(index) {
        let verdict = if answer.is_correct() { "correct" } else { "incorrect" };
        println!(
            "  (answered: {} - {verdict})",
            answer.selected_text(&pooled.question)
        );
    }
}

fn render_summary(engine: &QuizEngine) {
    let Some(summary) = engine.summary() else {
        return;
    };
    println!("\nQuiz complete: {} - {}", summary.region, summary.system);
    println!(
        "Score: {}/{}  Accuracy: {}%  Unanswered: {}  Time: {}",
        summary.score,
        summary.attempted,
        summary.accuracy,
        summary.unanswered,
        format_duration(summary.elapsed_secs)
    );
    println!("{}", summary.advice.message(summary.region, summary.system));

    if let Some(session) = engine.session() {
        for stats in session.breakdown() {
            println!(
                "  {:<28} {}/{} ({}%)",
                stats.key,
                stats.correct,
                stats.total,
                stats.percent()
            );
        }
    }
    println!("Type 'review [filter]' to go over your answers, or 'q' to quit.");
}

fn render_review(engine: &mut QuizEngine, filter: ReviewFilter) -> Result<()> {
    let session = engine.review()?;
    let counts = session.review_counts();
    println!(
        "\nReview: all {}  correct {}  incorrect {}  unanswered {}  bookmarked {}  flagged {}",
        counts.all,
        counts.correct,
        counts.incorrect,
        counts.unanswered,
        counts.bookmarked,
        counts.flagged
    );
    let items = session.review(filter);
    if items.is_empty() {
        println!("Nothing to show for this filter.");
    }
    for item in items {
        let status = match item.status {
            ReviewStatus::Correct => "correct",
            ReviewStatus::Incorrect => "incorrect",
            ReviewStatus::Unanswered => "unanswered",
        };
        println!("\n{}. {} [{status}]", item.index + 1, item.question.question.prompt);
        let question = &item.question.question;
        let yours = item
            .answer
            .map(|a| a.selected_text(question))
            .unwrap_or_else(|| "-".to_string());
        let correct = item
            .answer
            .map(|a| a.correct_text())
            .unwrap_or_else(|| question.correct_answer_text());
        println!("   Your answer: {yours}   Correct: {correct}");
        if !question.explanation.is_empty() {
            println!("   {}", question.explanation);
        }
    }
    Ok(())
}

fn print_notices(engine: &mut QuizEngine) {
    for notice in engine.drain_notices() {
        match notice {
            Notice::Info(message) => println!("{message}"),
            Notice::Warning(message) => eprintln!("Warning: {message}"),
        }
    }
}
