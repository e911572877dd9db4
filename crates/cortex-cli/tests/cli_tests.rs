//! CLI integration tests using assert_cmd.

use std::path::PathBuf;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn fixture() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/content.json")
}

fn cortex(dir: &TempDir) -> Command {
    #[allow(deprecated)]
    let mut cmd = Command::cargo_bin("cortex").unwrap();
    cmd.current_dir(dir.path())
        .env("HOME", dir.path())
        .env_remove("CORTEX_CONTENT")
        .env_remove("CORTEX_STORAGE_DIR")
        .env_remove("RUST_LOG")
        .arg("--content")
        .arg(fixture())
        .arg("--storage-dir")
        .arg(dir.path().join("state"));
    cmd
}

fn tf_quiz(dir: &TempDir) -> Command {
    let mut cmd = cortex(dir);
    cmd.args([
        "quiz", "--region", "thorax", "--system", "myology", "--format", "tf", "--seed", "7",
    ]);
    cmd
}

#[test]
fn counts_lists_regions_with_combined() {
    let dir = TempDir::new().unwrap();
    cortex(&dir)
        .arg("counts")
        .assert()
        .success()
        .stdout(predicate::str::contains("Thorax"))
        .stdout(predicate::str::contains("Head & Neck"))
        .stdout(predicate::str::contains("COMBINED REGIONS"));
}

#[test]
fn counts_drills_into_formats() {
    let dir = TempDir::new().unwrap();
    cortex(&dir)
        .args(["counts", "--region", "Thorax", "--system", "Myology"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Formats for Thorax - Myology"))
        .stdout(predicate::str::contains("True / False"))
        .stdout(predicate::str::contains("Fill in the Blank"));
}

#[test]
fn counts_system_without_region_fails() {
    let dir = TempDir::new().unwrap();
    cortex(&dir)
        .args(["counts", "--system", "myology"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--system needs --region"));
}

#[test]
fn search_groups_and_highlights() {
    let dir = TempDir::new().unwrap();
    cortex(&dir)
        .args(["search", "scapula"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Atlas"))
        .stdout(predicate::str::contains("*Scapula*"))
        .stdout(predicate::str::contains("The Why"));
}

#[test]
fn search_json_carries_navigation_target() {
    let dir = TempDir::new().unwrap();
    cortex(&dir)
        .args(["search", "--json", "aortic"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"view\": \"atlas\""))
        .stdout(predicate::str::contains("\"topic\": \"Aortic arch\""));
}

#[test]
fn search_short_query_is_refused() {
    let dir = TempDir::new().unwrap();
    cortex(&dir)
        .args(["search", "a"])
        .assert()
        .success()
        .stdout(predicate::str::contains("at least 2 characters"));
}

#[test]
fn missing_content_file_is_an_error() {
    let dir = TempDir::new().unwrap();
    #[allow(deprecated)]
    Command::cargo_bin("cortex")
        .unwrap()
        .current_dir(dir.path())
        .env("HOME", dir.path())
        .env_remove("CORTEX_CONTENT")
        .args(["--content", "nope.json", "counts"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error"));
}

#[test]
fn full_quiz_records_history() {
    let dir = TempDir::new().unwrap();
    tf_quiz(&dir)
        .write_stdin("a t\nn\na true\nn\na yes\nn\nq\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Score: 3/3"))
        .stdout(predicate::str::contains("Accuracy: 100%"))
        .stdout(predicate::str::contains("OUTSTANDING"))
        .stdout(predicate::str::contains("Thorax > Myology"));

    cortex(&dir)
        .arg("dashboard")
        .assert()
        .success()
        .stdout(predicate::str::contains("Topic strengths"))
        .stdout(predicate::str::contains("Myology"))
        .stdout(predicate::str::contains("3/3"));

    cortex(&dir)
        .args(["dashboard", "--clear"])
        .assert()
        .success()
        .stdout(predicate::str::contains("History cleared."));

    cortex(&dir)
        .arg("dashboard")
        .assert()
        .success()
        .stdout(predicate::str::contains("No quizzes recorded yet"));
}

#[test]
fn empty_selection_reports_no_questions() {
    let dir = TempDir::new().unwrap();
    cortex(&dir)
        .args(["quiz", "--region", "pelvis", "--system", "myology", "--format", "tf"])
        .write_stdin("")
        .assert()
        .failure()
        .stderr(predicate::str::contains("no questions available"));
}

#[test]
fn quit_then_resume_continues_where_left() {
    let dir = TempDir::new().unwrap();
    tf_quiz(&dir)
        .write_stdin("a f\nq\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Incorrect. Answer: TRUE"))
        .stdout(predicate::str::contains("Progress saved"));

    cortex(&dir)
        .args(["quiz", "--resume"])
        .write_stdin("q\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Resumed at question 1 of 3"))
        .stdout(predicate::str::contains("answered: FALSE - incorrect"));
}

#[test]
fn resume_without_saved_quiz_fails() {
    let dir = TempDir::new().unwrap();
    cortex(&dir)
        .args(["quiz", "--resume"])
        .write_stdin("")
        .assert()
        .failure()
        .stderr(predicate::str::contains("could not resume"));
}

#[test]
fn review_filters_after_completion() {
    let dir = TempDir::new().unwrap();
    tf_quiz(&dir)
        .write_stdin("a t\nn\nn\nn\nreview unanswered\nq\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Score: 1/1"))
        .stdout(predicate::str::contains("unanswered 2"))
        .stdout(predicate::str::contains("[unanswered]"));
}

#[test]
fn unknown_review_filter_keeps_the_review_open() {
    let dir = TempDir::new().unwrap();
    tf_quiz(&dir)
        .write_stdin("a t\nn\nn\nn\nreview foo\nreview unanswered\nq\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("unknown review filter: foo"))
        .stdout(predicate::str::contains("[unanswered]"));
}

#[test]
fn question_header_shows_elapsed_time() {
    let dir = TempDir::new().unwrap();
    tf_quiz(&dir)
        .write_stdin("q\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Question 1 of 3"))
        .stdout(predicate::str::contains("time 00:0"));
}

#[test]
fn show_follows_atlas_why_and_quiz_targets() {
    let dir = TempDir::new().unwrap();
    cortex(&dir)
        .args(["show", "scapula"])
        .assert()
        .success()
        .stdout(predicate::str::contains("The shoulder blade"))
        .stdout(predicate::str::contains("Clinical:"));

    cortex(&dir)
        .args(["show", "clavicle"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Locomotion / Horse vs Human"));

    cortex(&dir)
        .args(["show", "inspiration"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Quiz: Thorax - Myology"))
        .stdout(predicate::str::contains("cortex quiz --region"));
}
