//! Integration tests for the `dr` CLI.
//!
//! Each test creates a temp board directory, runs `dr` as a subprocess,
//! and verifies stdout and/or file contents.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use tempfile::TempDir;

/// Get the path to the built `dr` binary.
fn dr_bin() -> PathBuf {
    // cargo test builds to target/debug/
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // remove test binary name
    path.pop(); // remove deps/
    path.push("dr");
    path
}

/// Board fixture: two layers, a handful of items including a three-part
/// series, one past-completed item, one far-future item, and a tray with
/// a one-off and a daily-recurring task.
const BOARD_FIXTURE: &str = r##"{
  "name": "Test Board",
  "layers": [
    { "id": "l-001", "name": "Work", "color": "#4C9BE8", "is_visible": true, "order": 1 },
    { "id": "l-002", "name": "Home", "color": "#52C47B", "is_visible": true, "order": 2 }
  ],
  "items": {
    "i-001": { "id": "i-001", "title": "Write report", "layer_id": "l-001", "start_time": "2025-06-02T09:00:00Z", "duration_minutes": 60, "status": "scheduled" },
    "i-002": { "id": "i-002", "title": "Laundry", "layer_id": "l-002", "start_time": "2025-06-02T18:00:00Z", "duration_minutes": 30, "status": "completed" },
    "i-003": { "id": "i-003", "title": "Standup", "layer_id": "l-001", "start_time": "2025-06-03T09:30:00Z", "duration_minutes": 15, "status": "scheduled", "series_id": "s-001", "occurrence_index": 0 },
    "i-004": { "id": "i-004", "title": "Standup", "layer_id": "l-001", "start_time": "2025-06-04T09:30:00Z", "duration_minutes": 15, "status": "scheduled", "series_id": "s-001", "occurrence_index": 1 },
    "i-005": { "id": "i-005", "title": "Standup", "layer_id": "l-001", "start_time": "2025-06-05T09:30:00Z", "duration_minutes": 15, "status": "scheduled", "series_id": "s-001", "occurrence_index": 2 },
    "i-006": { "id": "i-006", "title": "Plan trip", "layer_id": "l-001", "start_time": "2099-01-01T10:00:00Z", "duration_minutes": 60, "status": "scheduled" }
  },
  "tray": [
    { "id": "t-001", "title": "Email sweep", "duration_minutes": 30 },
    { "id": "t-002", "title": "Daily standup", "duration_minutes": 15, "recurrence": { "recurrence": { "kind": "daily" } } }
  ],
  "settings": { "zoom_horizontal": 100.0, "zoom_vertical": 100.0, "is_locked": true, "scroll_offset": 0.0, "view_mode": "day" },
  "counters": { "item": 6, "tray": 2, "layer": 2, "series": 1 }
}
"##;

/// Low occurrence cap keeps recurring-placement tests small.
const CONFIG_FIXTURE: &str = "[timeline]\nmax_occurrences = 5\n";

/// Board fixture that violates two invariants: a zero duration and a
/// reference to a layer that does not exist.
const BAD_BOARD_FIXTURE: &str = r##"{
  "name": "Broken",
  "layers": [
    { "id": "l-001", "name": "Work", "color": "#4C9BE8", "is_visible": true, "order": 1 }
  ],
  "items": {
    "i-001": { "id": "i-001", "title": "Ghost", "layer_id": "l-404", "start_time": "2025-06-02T09:00:00Z", "duration_minutes": 0, "status": "scheduled" }
  },
  "counters": { "item": 1, "layer": 1 }
}
"##;

/// Create a test board in the given directory.
fn create_test_board(root: &Path) {
    let drift_dir = root.join("drift");
    fs::create_dir_all(&drift_dir).unwrap();
    fs::write(drift_dir.join("board.json"), BOARD_FIXTURE).unwrap();
    fs::write(drift_dir.join("board.toml"), CONFIG_FIXTURE).unwrap();
}

/// Run `dr` with the given args in the given directory.
/// Returns (stdout, stderr, success).
fn run_dr(dir: &Path, args: &[&str]) -> (String, String, bool) {
    let output = Command::new(dr_bin())
        .args(args)
        .current_dir(dir)
        .output()
        .expect("failed to run dr");
    (
        String::from_utf8_lossy(&output.stdout).to_string(),
        String::from_utf8_lossy(&output.stderr).to_string(),
        output.status.success(),
    )
}

/// Run `dr` and panic unless it succeeded.
fn run_dr_ok(dir: &Path, args: &[&str]) -> String {
    let (stdout, stderr, ok) = run_dr(dir, args);
    assert!(
        ok,
        "dr {:?} failed:\nstdout: {}\nstderr: {}",
        args, stdout, stderr
    );
    stdout
}

// ============================================================================
// Init tests
// ============================================================================

#[test]
fn test_init_creates_board() {
    let tmp = TempDir::new().unwrap();
    let stdout = run_dr_ok(tmp.path(), &["init", "--name", "My Plans"]);

    assert!(stdout.contains("Initialized drift board: My Plans"));
    assert!(stdout.contains("layer: General (l-001)"));
    assert!(tmp.path().join("drift/board.json").exists());
    assert!(tmp.path().join("drift/board.toml").exists());
}

#[test]
fn test_init_with_extra_layers() {
    let tmp = TempDir::new().unwrap();
    let stdout = run_dr_ok(
        tmp.path(),
        &["init", "--name", "Plans", "--layer", "Deep", "--layer", "Admin"],
    );

    let general = stdout.find("layer: General").unwrap();
    let deep = stdout.find("layer: Deep").unwrap();
    let admin = stdout.find("layer: Admin").unwrap();
    assert!(general < deep && deep < admin);
}

#[test]
fn test_init_refuses_double_init() {
    let tmp = TempDir::new().unwrap();
    run_dr_ok(tmp.path(), &["init", "--name", "Once"]);

    let (_, stderr, ok) = run_dr(tmp.path(), &["init", "--name", "Twice"]);
    assert!(!ok);
    assert!(stderr.contains("already a drift board"));
}

#[test]
fn test_init_infers_name_from_directory() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path().join("q3-planning");
    fs::create_dir_all(&dir).unwrap();

    let stdout = run_dr_ok(&dir, &["init"]);
    assert!(stdout.contains("Initialized drift board: Q3 Planning"));
}

#[test]
fn test_init_warns_about_enclosing_board() {
    let tmp = TempDir::new().unwrap();
    create_test_board(tmp.path());
    let nested = tmp.path().join("sub");
    fs::create_dir_all(&nested).unwrap();

    let (stdout, stderr, ok) = run_dr(&nested, &["init", "--name", "Inner"]);
    assert!(ok, "init in a subdirectory should still succeed: {}", stderr);
    assert!(stdout.contains("Initialized drift board: Inner"));
    assert!(stderr.contains("enclosing board found"));
    assert!(nested.join("drift/board.json").exists());
}

// ============================================================================
// Read command tests
// ============================================================================

#[test]
fn test_list_sorted_by_start() {
    let tmp = TempDir::new().unwrap();
    create_test_board(tmp.path());

    let stdout = run_dr_ok(tmp.path(), &["list"]);
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(
        lines,
        vec![
            "[ ] i-001  2025-06-02 09:00 +1h  Write report",
            "[x] i-002  2025-06-02 18:00 +30m  Laundry",
            "[ ] i-003  2025-06-03 09:30 +15m  Standup  (s-001 #0)",
            "[ ] i-004  2025-06-04 09:30 +15m  Standup  (s-001 #1)",
            "[ ] i-005  2025-06-05 09:30 +15m  Standup  (s-001 #2)",
            "[ ] i-006  2099-01-01 10:00 +1h  Plan trip",
        ]
    );
}

#[test]
fn test_list_filters() {
    let tmp = TempDir::new().unwrap();
    create_test_board(tmp.path());

    let stdout = run_dr_ok(tmp.path(), &["list", "--layer", "l-002"]);
    assert_eq!(stdout.lines().count(), 1);
    assert!(stdout.contains("Laundry"));

    let stdout = run_dr_ok(tmp.path(), &["list", "--status", "completed"]);
    assert_eq!(stdout.lines().count(), 1);
    assert!(stdout.contains("i-002"));

    let stdout = run_dr_ok(tmp.path(), &["list", "--series", "s-001"]);
    assert_eq!(stdout.lines().count(), 3);

    // Day filter keeps the two items starting on June 2 and drops the rest
    let stdout = run_dr_ok(tmp.path(), &["list", "--on", "2025-06-02"]);
    assert_eq!(stdout.lines().count(), 2);
    assert!(stdout.contains("i-001"));
    assert!(stdout.contains("i-002"));
}

#[test]
fn test_list_rejects_unknown_status() {
    let tmp = TempDir::new().unwrap();
    create_test_board(tmp.path());

    let (_, stderr, ok) = run_dr(tmp.path(), &["list", "--status", "pending"]);
    assert!(!ok);
    assert!(stderr.contains("unknown status 'pending'"));
}

#[test]
fn test_list_json() {
    let tmp = TempDir::new().unwrap();
    create_test_board(tmp.path());

    let stdout = run_dr_ok(tmp.path(), &["list", "--layer", "l-002", "--json"]);
    let parsed: serde_json::Value = serde_json::from_str(&stdout).unwrap();

    let items = parsed.as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["id"], "i-002");
    assert_eq!(items[0]["status"], "completed");
    assert_eq!(items[0]["start"], "2025-06-02T18:00:00Z");
    assert_eq!(items[0]["end"], "2025-06-02T18:30:00Z");
    assert_eq!(items[0]["duration_minutes"], 30);
    assert!(items[0].get("series").is_none());
}

#[test]
fn test_list_json_series_fields() {
    let tmp = TempDir::new().unwrap();
    create_test_board(tmp.path());

    let stdout = run_dr_ok(tmp.path(), &["list", "--series", "s-001", "--json"]);
    let parsed: serde_json::Value = serde_json::from_str(&stdout).unwrap();

    let items = parsed.as_array().unwrap();
    assert_eq!(items.len(), 3);
    assert_eq!(items[0]["series"], "s-001");
    assert_eq!(items[0]["occurrence"], 0);
    assert_eq!(items[2]["occurrence"], 2);
}

#[test]
fn test_tray_ls() {
    let tmp = TempDir::new().unwrap();
    create_test_board(tmp.path());

    let stdout = run_dr_ok(tmp.path(), &["tray"]);
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(
        lines,
        vec![
            "t-001    30m  Email sweep",
            "t-002    15m  Daily standup  (daily)",
        ]
    );

    // `tray ls` is the same listing
    assert_eq!(run_dr_ok(tmp.path(), &["tray", "ls"]), stdout);
}

#[test]
fn test_mode_shows_current() {
    let tmp = TempDir::new().unwrap();
    create_test_board(tmp.path());

    let stdout = run_dr_ok(tmp.path(), &["mode"]);
    assert_eq!(stdout, "day  zoom 100%/100%\n");
}

#[test]
fn test_check_valid() {
    let tmp = TempDir::new().unwrap();
    create_test_board(tmp.path());

    let stdout = run_dr_ok(tmp.path(), &["check"]);
    assert_eq!(stdout, "✓ board is valid\n");
}

#[test]
fn test_check_reports_problems() {
    let tmp = TempDir::new().unwrap();
    let drift_dir = tmp.path().join("drift");
    fs::create_dir_all(&drift_dir).unwrap();
    fs::write(drift_dir.join("board.json"), BAD_BOARD_FIXTURE).unwrap();

    // Problems are reported on stdout; the command itself still succeeds
    let stdout = run_dr_ok(tmp.path(), &["check"]);
    assert!(stdout.contains("✗ board has problems"));
    assert!(stdout.contains("i-001: duration must be positive, got 0"));
    assert!(stdout.contains("i-001: references missing layer l-404"));

    let stdout = run_dr_ok(tmp.path(), &["check", "--json"]);
    let parsed: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(parsed["valid"], false);
    let problems = parsed["problems"].as_array().unwrap();
    assert_eq!(problems.len(), 2);
    assert_eq!(problems[0]["type"], "non_positive_duration");
    assert_eq!(problems[1]["type"], "orphaned_layer_ref");
}

#[test]
fn test_journal_empty_and_path() {
    let tmp = TempDir::new().unwrap();
    create_test_board(tmp.path());

    let stdout = run_dr_ok(tmp.path(), &["journal"]);
    assert_eq!(stdout, "journal is empty\n");

    let stdout = run_dr_ok(tmp.path(), &["journal", "path"]);
    assert!(stdout.trim().ends_with("drift/.journal.log"));
}

// ============================================================================
// Write command tests
// ============================================================================

#[test]
fn test_add_prints_id() {
    let tmp = TempDir::new().unwrap();
    create_test_board(tmp.path());

    let stdout = run_dr_ok(tmp.path(), &["add", "Call dentist", "--duration", "45m"]);
    assert_eq!(stdout, "t-003\n");

    let stdout = run_dr_ok(tmp.path(), &["tray"]);
    assert!(stdout.contains("t-003    45m  Call dentist"));

    let board = fs::read_to_string(tmp.path().join("drift/board.json")).unwrap();
    assert!(board.contains("Call dentist"));
}

#[test]
fn test_add_recurring_template_json() {
    let tmp = TempDir::new().unwrap();
    create_test_board(tmp.path());

    let stdout = run_dr_ok(
        tmp.path(),
        &["add", "Review", "--every", "weekly:mon", "--template", "--json"],
    );
    let parsed: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(parsed["id"], "t-003");
    assert_eq!(parsed["duration_minutes"], 60, "default duration is 1h");
    assert_eq!(parsed["recurrence"], "weekly:mon");
    assert_eq!(parsed["is_template"], true);
}

#[test]
fn test_add_rejects_bad_input() {
    let tmp = TempDir::new().unwrap();
    create_test_board(tmp.path());

    let (_, stderr, ok) = run_dr(tmp.path(), &["add", "X", "--duration", "soon"]);
    assert!(!ok);
    assert!(stderr.contains("could not parse duration 'soon'"));

    let (_, stderr, ok) = run_dr(tmp.path(), &["add", "X", "--every", "fortnightly"]);
    assert!(!ok);
    assert!(stderr.contains("unknown recurrence 'fortnightly'"));
}

#[test]
fn test_tray_rm() {
    let tmp = TempDir::new().unwrap();
    create_test_board(tmp.path());

    let stdout = run_dr_ok(tmp.path(), &["tray", "rm", "t-001"]);
    assert_eq!(stdout, "removed t-001 (Email sweep)\n");

    let stdout = run_dr_ok(tmp.path(), &["tray"]);
    assert!(!stdout.contains("t-001"));

    let (_, stderr, ok) = run_dr(tmp.path(), &["tray", "rm", "t-001"]);
    assert!(!ok);
    assert!(stderr.contains("no tray task with id t-001"));
}

#[test]
fn test_schedule_one_off() {
    let tmp = TempDir::new().unwrap();
    create_test_board(tmp.path());

    let stdout = run_dr_ok(tmp.path(), &["schedule", "t-001", "2099-01-05 09:00"]);
    assert_eq!(stdout, "i-007\n");

    let stdout = run_dr_ok(tmp.path(), &["list", "--on", "2099-01-05"]);
    assert_eq!(
        stdout.trim(),
        "[ ] i-007  2099-01-05 09:00 +30m  Email sweep"
    );

    // The one-off source is consumed by placement
    let stdout = run_dr_ok(tmp.path(), &["tray"]);
    assert!(!stdout.contains("t-001"));
}

#[test]
fn test_schedule_targets_named_layer() {
    let tmp = TempDir::new().unwrap();
    create_test_board(tmp.path());

    run_dr_ok(
        tmp.path(),
        &["schedule", "t-001", "2099-01-05 09:00", "--layer", "l-002"],
    );
    let stdout = run_dr_ok(tmp.path(), &["list", "--layer", "l-002"]);
    assert!(stdout.contains("Email sweep"));
}

#[test]
fn test_schedule_defaults_to_topmost_visible_layer() {
    let tmp = TempDir::new().unwrap();
    create_test_board(tmp.path());

    run_dr_ok(tmp.path(), &["layer", "hide", "l-001"]);
    run_dr_ok(tmp.path(), &["schedule", "t-001", "2099-01-05 09:00"]);

    let stdout = run_dr_ok(tmp.path(), &["list", "--layer", "l-002"]);
    assert!(stdout.contains("Email sweep"));
}

#[test]
fn test_schedule_recurring_caps_at_config() {
    let tmp = TempDir::new().unwrap();
    create_test_board(tmp.path());

    // board.toml caps occurrences at 5
    let stdout = run_dr_ok(tmp.path(), &["schedule", "t-002", "2099-01-05 09:00"]);
    assert_eq!(stdout, "s-002: 5 occurrence(s) created\n");

    let stdout = run_dr_ok(tmp.path(), &["list", "--series", "s-002"]);
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines.len(), 5);
    assert!(lines[0].contains("2099-01-05 09:00"));
    assert!(lines[4].contains("2099-01-09 09:00"));
    assert!(lines[0].ends_with("(s-002 #0)"));
    assert!(lines[4].ends_with("(s-002 #4)"));
}

#[test]
fn test_schedule_recurring_json() {
    let tmp = TempDir::new().unwrap();
    create_test_board(tmp.path());

    let stdout = run_dr_ok(
        tmp.path(),
        &["schedule", "t-002", "2099-01-05 09:00", "--json"],
    );
    let parsed: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(parsed["series"], "s-002");
    assert_eq!(parsed["created"].as_array().unwrap().len(), 5);
    assert_eq!(parsed["source_removed"], true);
    assert!(parsed.get("failed_occurrences").is_none());
}

#[test]
fn test_schedule_bad_input() {
    let tmp = TempDir::new().unwrap();
    create_test_board(tmp.path());

    let (_, stderr, ok) = run_dr(tmp.path(), &["schedule", "t-999", "2099-01-05 09:00"]);
    assert!(!ok);
    assert!(stderr.contains("tray task not found: t-999"));

    let (_, stderr, ok) = run_dr(tmp.path(), &["schedule", "t-001", "tomorrow"]);
    assert!(!ok);
    assert!(stderr.contains("could not parse time 'tomorrow'"));
}

#[test]
fn test_done_park_restore() {
    let tmp = TempDir::new().unwrap();
    create_test_board(tmp.path());

    let stdout = run_dr_ok(tmp.path(), &["done", "i-001"]);
    assert_eq!(stdout, "[x] i-001  2025-06-02 09:00 +1h  Write report\n");

    let stdout = run_dr_ok(tmp.path(), &["park", "i-001"]);
    assert_eq!(stdout, "[~] i-001  2025-06-02 09:00 +1h  Write report\n");

    // The window elapsed long ago, so restore lands on logjam
    let stdout = run_dr_ok(tmp.path(), &["restore", "i-001"]);
    assert_eq!(stdout, "[!] i-001  2025-06-02 09:00 +1h  Write report\n");

    // A future item restores to plain scheduled
    run_dr_ok(tmp.path(), &["park", "i-006"]);
    let stdout = run_dr_ok(tmp.path(), &["restore", "i-006"]);
    assert_eq!(stdout, "[ ] i-006  2099-01-01 10:00 +1h  Plan trip\n");
}

#[test]
fn test_status_change_persists() {
    let tmp = TempDir::new().unwrap();
    create_test_board(tmp.path());

    run_dr_ok(tmp.path(), &["done", "i-001"]);
    let stdout = run_dr_ok(tmp.path(), &["list", "--status", "completed"]);
    assert!(stdout.contains("i-001"));
    assert!(stdout.contains("i-002"));
}

#[test]
fn test_move_reschedules() {
    let tmp = TempDir::new().unwrap();
    create_test_board(tmp.path());

    let stdout = run_dr_ok(
        tmp.path(),
        &["move", "i-001", "2025-06-09 14:00", "--layer", "l-002"],
    );
    assert_eq!(stdout, "[ ] i-001  2025-06-09 14:00 +1h  Write report\n");

    let stdout = run_dr_ok(tmp.path(), &["list", "--layer", "l-002"]);
    assert!(stdout.contains("i-001"));

    // Without --layer the item stays where it is
    let stdout = run_dr_ok(tmp.path(), &["move", "i-001", "2025-06-10 08:00"]);
    assert_eq!(stdout, "[ ] i-001  2025-06-10 08:00 +1h  Write report\n");
    let stdout = run_dr_ok(tmp.path(), &["list", "--layer", "l-002"]);
    assert!(stdout.contains("i-001"));
}

#[test]
fn test_move_bad_input() {
    let tmp = TempDir::new().unwrap();
    create_test_board(tmp.path());

    let (_, stderr, ok) = run_dr(tmp.path(), &["move", "i-999", "2025-06-09 14:00"]);
    assert!(!ok);
    assert!(stderr.contains("item not found: i-999"));

    let (_, stderr, ok) = run_dr(
        tmp.path(),
        &["move", "i-001", "2025-06-09 14:00", "--layer", "l-999"],
    );
    assert!(!ok);
    assert!(stderr.contains("layer not found: l-999"));
}

#[test]
fn test_rm_single_journals_the_item() {
    let tmp = TempDir::new().unwrap();
    create_test_board(tmp.path());

    let stdout = run_dr_ok(tmp.path(), &["rm", "i-001"]);
    assert_eq!(stdout, "deleted i-001\n");

    let stdout = run_dr_ok(tmp.path(), &["list"]);
    assert!(!stdout.contains("i-001"));

    let stdout = run_dr_ok(tmp.path(), &["journal"]);
    assert!(stdout.contains("delete: item i-001 deleted"));
    assert!(stdout.contains("Title: Write report"));

    let stdout = run_dr_ok(tmp.path(), &["journal", "--json"]);
    let parsed: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    let entries = parsed.as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["category"], "delete");
    assert_eq!(entries[0]["fields"]["Item"], "i-001");
}

#[test]
fn test_rm_following_truncates_series() {
    let tmp = TempDir::new().unwrap();
    create_test_board(tmp.path());

    let stdout = run_dr_ok(tmp.path(), &["rm", "i-004", "--following"]);
    assert_eq!(stdout, "deleted 2 occurrence(s) from s-001\n");

    let stdout = run_dr_ok(tmp.path(), &["list", "--series", "s-001"]);
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines.len(), 1);
    assert!(lines[0].contains("i-003"));
}

#[test]
fn test_rm_series_deletes_everything() {
    let tmp = TempDir::new().unwrap();
    create_test_board(tmp.path());

    let stdout = run_dr_ok(tmp.path(), &["rm", "i-004", "--series"]);
    assert_eq!(stdout, "deleted 3 occurrence(s) from s-001\n");

    let stdout = run_dr_ok(tmp.path(), &["list", "--series", "s-001"]);
    assert_eq!(stdout, "");
}

#[test]
fn test_rm_following_requires_a_series() {
    let tmp = TempDir::new().unwrap();
    create_test_board(tmp.path());

    let (_, stderr, ok) = run_dr(tmp.path(), &["rm", "i-001", "--following"]);
    assert!(!ok);
    assert!(stderr.contains("i-001 is not part of a series"));
}

#[test]
fn test_journal_prune() {
    let tmp = TempDir::new().unwrap();
    create_test_board(tmp.path());

    run_dr_ok(tmp.path(), &["rm", "i-001"]);
    run_dr_ok(tmp.path(), &["rm", "i-002"]);

    let stdout = run_dr_ok(tmp.path(), &["journal", "prune", "--all"]);
    assert_eq!(stdout, "pruned 2 entries\n");

    let stdout = run_dr_ok(tmp.path(), &["journal"]);
    assert_eq!(stdout, "journal is empty\n");

    // Pruning again finds nothing; singular form this time would be wrong
    let stdout = run_dr_ok(tmp.path(), &["journal", "prune", "--all"]);
    assert_eq!(stdout, "pruned 0 entries\n");
}

#[test]
fn test_journal_prune_singular() {
    let tmp = TempDir::new().unwrap();
    create_test_board(tmp.path());

    run_dr_ok(tmp.path(), &["rm", "i-001"]);
    let stdout = run_dr_ok(tmp.path(), &["journal", "prune", "--all"]);
    assert_eq!(stdout, "pruned 1 entry\n");
}

#[test]
fn test_journal_limit_keeps_newest() {
    let tmp = TempDir::new().unwrap();
    create_test_board(tmp.path());

    run_dr_ok(tmp.path(), &["rm", "i-003"]);
    run_dr_ok(tmp.path(), &["rm", "i-004"]);
    run_dr_ok(tmp.path(), &["rm", "i-005"]);

    let stdout = run_dr_ok(tmp.path(), &["journal", "--limit", "2", "--json"]);
    let parsed: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    let entries = parsed.as_array().unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0]["description"], "item i-005 deleted");
    assert_eq!(entries[1]["description"], "item i-004 deleted");
}

// ============================================================================
// Layer management tests
// ============================================================================

#[test]
fn test_layer_ls() {
    let tmp = TempDir::new().unwrap();
    create_test_board(tmp.path());

    let stdout = run_dr_ok(tmp.path(), &["layer", "ls"]);
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(
        lines,
        vec!["l-001  #4C9BE8  Work  5 items", "l-002  #52C47B  Home  1 item"]
    );
}

#[test]
fn test_layer_ls_json() {
    let tmp = TempDir::new().unwrap();
    create_test_board(tmp.path());

    let stdout = run_dr_ok(tmp.path(), &["layer", "ls", "--json"]);
    let parsed: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    let layers = parsed.as_array().unwrap();
    assert_eq!(layers.len(), 2);
    assert_eq!(layers[0]["id"], "l-001");
    assert_eq!(layers[0]["items"], 5);
    assert_eq!(layers[0]["visible"], true);
    assert_eq!(layers[1]["name"], "Home");
}

#[test]
fn test_layer_add_cycles_palette() {
    let tmp = TempDir::new().unwrap();
    create_test_board(tmp.path());

    // Two layers exist, so the next palette slot is the third color
    let stdout = run_dr_ok(tmp.path(), &["layer", "add", "Errands"]);
    assert_eq!(stdout, "l-003  #E8A13C  Errands  0 items\n");

    let stdout = run_dr_ok(tmp.path(), &["layer", "add", "Fitness", "--color", "#FF8800"]);
    assert_eq!(stdout, "l-004  #FF8800  Fitness  0 items\n");
}

#[test]
fn test_layer_rename_and_color() {
    let tmp = TempDir::new().unwrap();
    create_test_board(tmp.path());

    let stdout = run_dr_ok(tmp.path(), &["layer", "rename", "l-002", "Family"]);
    assert_eq!(stdout, "l-002  #52C47B  Family  1 item\n");

    let stdout = run_dr_ok(tmp.path(), &["layer", "color", "l-002", "#FF8800"]);
    assert_eq!(stdout, "l-002  #FF8800  Family  1 item\n");
}

#[test]
fn test_layer_hide_and_show() {
    let tmp = TempDir::new().unwrap();
    create_test_board(tmp.path());

    let stdout = run_dr_ok(tmp.path(), &["layer", "hide", "l-002"]);
    assert_eq!(stdout, "l-002  #52C47B  Home  1 item  (hidden)\n");

    let stdout = run_dr_ok(tmp.path(), &["layer", "ls"]);
    assert!(stdout.contains("(hidden)"));

    let stdout = run_dr_ok(tmp.path(), &["layer", "show", "l-002"]);
    assert_eq!(stdout, "l-002  #52C47B  Home  1 item\n");
}

#[test]
fn test_layer_rm_refuses_nonempty() {
    let tmp = TempDir::new().unwrap();
    create_test_board(tmp.path());

    let (_, stderr, ok) = run_dr(tmp.path(), &["layer", "rm", "l-001"]);
    assert!(!ok);
    assert!(stderr.contains("layer l-001 still has items scheduled on it"));

    run_dr_ok(tmp.path(), &["layer", "add", "Errands"]);
    let stdout = run_dr_ok(tmp.path(), &["layer", "rm", "l-003"]);
    assert_eq!(stdout, "deleted l-003 (Errands)\n");
}

// ============================================================================
// View mode tests
// ============================================================================

#[test]
fn test_mode_switch_persists() {
    let tmp = TempDir::new().unwrap();
    create_test_board(tmp.path());

    let stdout = run_dr_ok(tmp.path(), &["mode", "week"]);
    assert_eq!(stdout, "week  zoom 100%/100%\n");

    let stdout = run_dr_ok(tmp.path(), &["mode"]);
    assert_eq!(stdout, "week  zoom 100%/100%\n");

    let board = fs::read_to_string(tmp.path().join("drift/board.json")).unwrap();
    assert!(board.contains("\"view_mode\": \"week\""));
}

#[test]
fn test_mode_switch_resets_zoom() {
    let tmp = TempDir::new().unwrap();
    create_test_board(tmp.path());

    // Dial the zoom away from 100% before switching
    let board_path = tmp.path().join("drift/board.json");
    let board = fs::read_to_string(&board_path).unwrap();
    let board = board.replace("\"zoom_horizontal\": 100.0", "\"zoom_horizontal\": 250.0");
    fs::write(&board_path, board).unwrap();

    let stdout = run_dr_ok(tmp.path(), &["mode", "month"]);
    assert_eq!(stdout, "month  zoom 100%/100%\n");
}

#[test]
fn test_mode_rejects_unknown() {
    let tmp = TempDir::new().unwrap();
    create_test_board(tmp.path());

    let (_, stderr, ok) = run_dr(tmp.path(), &["mode", "decade"]);
    assert!(!ok);
    assert!(stderr.contains("unknown mode 'decade'"));
}

#[test]
fn test_mode_json() {
    let tmp = TempDir::new().unwrap();
    create_test_board(tmp.path());

    let stdout = run_dr_ok(tmp.path(), &["mode", "--json"]);
    let parsed: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(parsed["mode"], "day");
    assert_eq!(parsed["zoom_horizontal"], 100.0);
    assert_eq!(parsed["locked"], true);
}

// ============================================================================
// Board discovery tests
// ============================================================================

#[test]
fn test_discovery_walks_up() {
    let tmp = TempDir::new().unwrap();
    create_test_board(tmp.path());
    let nested = tmp.path().join("notes/june");
    fs::create_dir_all(&nested).unwrap();

    let stdout = run_dr_ok(&nested, &["list", "--layer", "l-002"]);
    assert!(stdout.contains("Laundry"));
}

#[test]
fn test_board_dir_flag() {
    let board = TempDir::new().unwrap();
    create_test_board(board.path());
    let elsewhere = TempDir::new().unwrap();

    let board_dir = board.path().to_str().unwrap();
    let stdout = run_dr_ok(elsewhere.path(), &["-C", board_dir, "list", "--layer", "l-002"]);
    assert!(stdout.contains("Laundry"));

    // Writes through -C land in the right board
    run_dr_ok(elsewhere.path(), &["--board-dir", board_dir, "done", "i-001"]);
    let board_json = fs::read_to_string(board.path().join("drift/board.json")).unwrap();
    assert!(board_json.contains("\"status\": \"completed\""));
    assert!(!elsewhere.path().join("drift").exists());
}

#[test]
fn test_not_a_board() {
    let tmp = TempDir::new().unwrap();

    let (_, stderr, ok) = run_dr(tmp.path(), &["list"]);
    assert!(!ok);
    assert!(stderr.contains("not a drift board"));
}

#[test]
fn test_unknown_item_errors_to_stderr() {
    let tmp = TempDir::new().unwrap();
    create_test_board(tmp.path());

    let (stdout, stderr, ok) = run_dr(tmp.path(), &["done", "i-999"]);
    assert!(!ok);
    assert!(stdout.is_empty());
    assert!(stderr.contains("error: no item with id i-999"));
}
