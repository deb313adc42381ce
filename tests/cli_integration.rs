//! CLI integration tests for todo
//!
//! These tests run the `todo` binary against todo.txt files in a temporary
//! directory, checking both the printed output and the files left behind.

use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Get a command instance for the todo binary, isolated from the user's config
fn todo_cmd(dir: &Path) -> assert_cmd::Command {
    let mut cmd = assert_cmd::Command::new(assert_cmd::cargo::cargo_bin!("todo"));
    cmd.current_dir(dir)
        .env("TODOTXT_CONFIG", dir.join("no-global-config.toml"))
        .env_remove("TODOTXT_PATH")
        .env_remove("ARCHIVE_PATH")
        .arg("--no-color");
    cmd
}

/// Create a temporary directory with a todo.txt holding `content`
fn setup_list(content: &str) -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("todo.txt"), content).unwrap();
    dir
}

fn read(dir: &TempDir, name: &str) -> String {
    fs::read_to_string(dir.path().join(name)).unwrap()
}

// =============================================================================
// Adding and Listing
// =============================================================================

#[test]
fn test_add_creates_file() {
    let dir = TempDir::new().unwrap();

    todo_cmd(dir.path())
        .args(["add", "2023-01-01 (A) Buy milk @store"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Added task 1"));

    assert_eq!(read(&dir, "todo.txt"), "2023-01-01 (A) Buy milk @store\n");
}

#[test]
fn test_add_sets_creation_date() {
    let dir = TempDir::new().unwrap();

    todo_cmd(dir.path()).args(["a", "Call mom"]).assert().success();

    let content = read(&dir, "todo.txt");
    let today = chrono::Local::now().date_naive().format("%Y-%m-%d").to_string();
    assert!(content.starts_with(&today), "unexpected content: {content}");
    assert!(content.ends_with(" Call mom\n"));
}

#[test]
fn test_add_multiple_lines() {
    let dir = setup_list("2023-01-01 Existing\n");

    todo_cmd(dir.path())
        .args(["add", "2023-01-02 First\n2023-01-03 Second"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Added task 2"))
        .stdout(predicate::str::contains("Added task 3"));

    assert_eq!(
        read(&dir, "todo.txt"),
        "2023-01-01 Existing\n2023-01-02 First\n2023-01-03 Second\n"
    );
}

#[test]
fn test_ls_numbers_lines() {
    let dir = setup_list("(B) Second thing\n# comment\n(A) First thing +proj\n");

    todo_cmd(dir.path())
        .arg("ls")
        .assert()
        .success()
        .stdout(predicate::str::contains("1 (B) Second thing"))
        .stdout(predicate::str::contains("2 (A) First thing +proj"))
        .stdout(predicate::str::contains("comment").not());
}

#[test]
fn test_ls_filter_and_sort() {
    let dir = setup_list("(C) Low @work due:2099-01-01\n(A) High @work due:2000-01-01\nOther @home\n");

    todo_cmd(dir.path())
        .args(["list", "@work", "--sort"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("2 (A) High"))
        .stdout(predicate::str::contains("1 (C) Low"))
        .stdout(predicate::str::contains("Other").not());
}

#[test]
fn test_ls_checkbox_format() {
    let dir = setup_list("x Done\nOpen\n");

    todo_cmd(dir.path())
        .args(["ls", "--checkbox"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1 [x]     Done"))
        .stdout(predicate::str::contains("2 [ ]     Open"));
}

#[test]
fn test_ls_json_export() {
    let dir = setup_list("(B) 2023-01-01 Task +dep @ctx due:2023-02-01 id:t1\n");

    let output = todo_cmd(dir.path())
        .args(["--format", "json", "ls"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let task = &json[0];
    assert_eq!(task["priority"], 1);
    assert_eq!(task["description"], "Task");
    assert_eq!(task["completed"], false);
    assert_eq!(task["due_date"], "2023-02-01");
    assert_eq!(task["creation_date"], "2023-01-01");
    assert_eq!(task["contexts"], serde_json::json!(["ctx"]));
    assert_eq!(task["dependencies"], serde_json::json!(["dep"]));
    assert_eq!(task["tags"], serde_json::json!({"id": "t1"}));
}

#[test]
fn test_ls_empty_list() {
    let dir = TempDir::new().unwrap();

    todo_cmd(dir.path())
        .arg("ls")
        .assert()
        .success()
        .stdout(predicate::str::contains("No tasks"));
}

// =============================================================================
// Completion and Removal
// =============================================================================

#[test]
fn test_do_completes_task() {
    let dir = setup_list("One\nTwo\n");

    todo_cmd(dir.path())
        .args(["do", "2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Completed task 2"));

    assert_eq!(read(&dir, "todo.txt"), "One\nx Two\n");
}

#[test]
fn test_do_advances_recurring_task() {
    let dir = setup_list("Water plants due:2023-05-01 rec:+1w\n");

    todo_cmd(dir.path())
        .args(["do", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("next due 2023-05-08"));

    assert_eq!(read(&dir, "todo.txt"), "Water plants due:2023-05-08 rec:+1w\n");
    assert_eq!(
        read(&dir, "todo.archive.txt"),
        "x Water plants due:2023-05-01 rec:+1w\n"
    );
}

#[test]
fn test_do_keeps_list_when_archive_fails() {
    let dir = setup_list("Water plants due:2023-05-01 rec:+1w\n");
    fs::create_dir(dir.path().join("archive_dir")).unwrap();

    todo_cmd(dir.path())
        .args(["--archive-file", "archive_dir", "do", "1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("archive_dir"))
        .stderr(predicate::str::contains("todo file").not());

    assert_eq!(read(&dir, "todo.txt"), "Water plants due:2023-05-01 rec:+1w\n");
}

#[test]
fn test_do_rejects_bad_recurrence() {
    let dir = setup_list("Broken due:2023-05-01 rec:2q\n");

    todo_cmd(dir.path())
        .args(["do", "1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown recurrence unit 'q'"));

    assert_eq!(read(&dir, "todo.txt"), "Broken due:2023-05-01 rec:2q\n");
}

#[test]
fn test_do_warns_about_missing_lines() {
    let dir = setup_list("Only\n");

    todo_cmd(dir.path())
        .args(["do", "1", "7"])
        .assert()
        .success()
        .stderr(predicate::str::contains("No task on line(s): 7"));

    assert_eq!(read(&dir, "todo.txt"), "x Only\n");
}

#[test]
fn test_rm_removes_tasks() {
    let dir = setup_list("One\nTwo\nThree\n");

    todo_cmd(dir.path())
        .args(["rm", "3", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Removed task 1: One"))
        .stdout(predicate::str::contains("Removed task 3: Three"));

    assert_eq!(read(&dir, "todo.txt"), "Two\n");
}

#[test]
fn test_delete_alias() {
    let dir = setup_list("One\nTwo\n");

    todo_cmd(dir.path()).args(["delete", "1"]).assert().success();

    assert_eq!(read(&dir, "todo.txt"), "Two\n");
}

// =============================================================================
// Ordering and Archiving
// =============================================================================

#[test]
fn test_sort_persists_urgency_order() {
    let dir = setup_list("x Done\n(B) Later due:2099-01-01\n(A) Now due:2000-01-01\n");

    todo_cmd(dir.path()).arg("sort").assert().success();
    assert_eq!(
        read(&dir, "todo.txt"),
        "(A) Now due:2000-01-01\n(B) Later due:2099-01-01\nx Done\n"
    );

    todo_cmd(dir.path()).args(["sort", "--reverse"]).assert().success();
    assert_eq!(
        read(&dir, "todo.txt"),
        "x Done\n(B) Later due:2099-01-01\n(A) Now due:2000-01-01\n"
    );
}

#[test]
fn test_next_shows_most_urgent_open_task() {
    let dir = setup_list("x Finished due:1999-01-01\n(B) Later due:2099-01-01\n(A) Now due:2000-01-01\n");

    todo_cmd(dir.path())
        .arg("next")
        .assert()
        .success()
        .stdout(predicate::str::starts_with("3 (A) Now"));
}

#[test]
fn test_archive_moves_completed_tasks() {
    let dir = setup_list("x Done\nOpen\n");
    fs::write(dir.path().join("todo.archive.txt"), "x Earlier").unwrap();

    todo_cmd(dir.path())
        .arg("archive")
        .assert()
        .success()
        .stdout(predicate::str::contains("Archived 1 completed tasks"));

    assert_eq!(read(&dir, "todo.txt"), "Open\n");
    assert_eq!(read(&dir, "todo.archive.txt"), "x Earlier\nx Done\n");
}

// =============================================================================
// Reconciliation
// =============================================================================

#[test]
fn test_merge_reports_conflicts() {
    let dir = setup_list("(A) Same\n(A) Shared id:s1 @context1\n");
    fs::write(
        dir.path().join("other.txt"),
        "(A) Same\n(B) Shared edited id:s1 @context2\nBrand new\n",
    )
    .unwrap();

    todo_cmd(dir.path())
        .args(["merge", "other.txt"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1 added, 1 skipped, 1 merged"))
        .stdout(predicate::str::contains("Conflict on line 2"))
        .stdout(predicate::str::contains("priority, description"));

    assert_eq!(
        read(&dir, "todo.txt"),
        "(A) Same\n(A) Shared @context1 @context2 id:s1\nBrand new\n"
    );
}

#[test]
fn test_merge_hard_prefer_other() {
    let dir = setup_list("(A) Shared id:s1\n");
    fs::write(dir.path().join("other.txt"), "(C) Shared id:s1\n").unwrap();

    todo_cmd(dir.path())
        .args(["merge", "other.txt", "--hard", "--prefer-other"])
        .assert()
        .success();

    assert_eq!(read(&dir, "todo.txt"), "(C) Shared id:s1\n");
}

#[test]
fn test_merge_json_report() {
    let dir = setup_list("(A) Shared id:s1\n");
    fs::write(dir.path().join("other.txt"), "(B) Shared id:s1\n").unwrap();

    let output = todo_cmd(dir.path())
        .args(["--format", "json", "merge", "other.txt"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["added"], 0);
    assert_eq!(json["merged"][0]["line"], 1);
    assert_eq!(json["merged"][0]["conflicts"]["priority"], true);
    assert_eq!(json["merged"][0]["original"]["priority"], 0);
}

#[test]
fn test_merge_missing_file_fails() {
    let dir = setup_list("One\n");

    todo_cmd(dir.path())
        .args(["merge", "nope.txt"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("File not found"));
}

#[test]
fn test_dedup_removes_duplicates() {
    let dir = setup_list("A k:1 j:2\nB\nA j:2 k:1\nB\n");

    todo_cmd(dir.path())
        .arg("dedup")
        .assert()
        .success()
        .stdout(predicate::str::contains("Removed 2 duplicate tasks"));

    assert_eq!(read(&dir, "todo.txt"), "A k:1 j:2\nB\n");
}

#[test]
fn test_check_reports_cycle() {
    let dir = setup_list("A id:A +B\nB id:B +C\nC id:C +A\n");

    todo_cmd(dir.path())
        .arg("check")
        .assert()
        .failure()
        .stdout(predicate::str::contains("Cycle: A -> C -> B"))
        .stderr(predicate::str::contains("Found 1 problem(s)"));
}

#[test]
fn test_check_reports_orphans_and_duplicate_ids() {
    let dir = setup_list("A id:A +ghost\nB id:A\n");

    todo_cmd(dir.path())
        .arg("check")
        .assert()
        .failure()
        .stdout(predicate::str::contains("Orphan dependency on line 1: +ghost"))
        .stdout(predicate::str::contains("Duplicate id A on lines 1, 2"));
}

#[test]
fn test_check_clean_list() {
    let dir = setup_list("A id:A\nB id:B +A\n");

    todo_cmd(dir.path())
        .arg("check")
        .assert()
        .success()
        .stdout(predicate::str::contains("No problems found"));
}

// =============================================================================
// Configuration
// =============================================================================

#[test]
fn test_file_flag_and_env() {
    let dir = TempDir::new().unwrap();
    fs::create_dir_all(dir.path().join("lists")).unwrap();

    todo_cmd(dir.path())
        .args(["--file", "lists/work.txt", "add", "2023-01-01 From flag"])
        .assert()
        .success();
    assert_eq!(read(&dir, "lists/work.txt"), "2023-01-01 From flag\n");

    todo_cmd(dir.path())
        .env("TODOTXT_PATH", "lists/work.txt")
        .arg("ls")
        .assert()
        .success()
        .stdout(predicate::str::contains("1 2023-01-01 From flag"));
}

#[test]
fn test_project_config_file() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join(".todo.toml"),
        "todo_file = \"tasks.txt\"\narchive_file = \"done.txt\"\n",
    )
    .unwrap();
    fs::write(dir.path().join("tasks.txt"), "x Finished\nOpen\n").unwrap();
    let sub_dir = dir.path().join("sub");
    fs::create_dir_all(&sub_dir).unwrap();

    todo_cmd(&sub_dir).arg("archive").assert().success();

    assert_eq!(read(&dir, "tasks.txt"), "Open\n");
    assert_eq!(read(&dir, "done.txt"), "x Finished\n");
}

#[test]
fn test_verbose_logs_to_stderr() {
    let dir = setup_list("One\n");

    todo_cmd(dir.path())
        .args(["-v", "ls"])
        .assert()
        .success()
        .stderr(predicate::str::contains("[verbose:ls] Loaded 1 tasks"));
}
