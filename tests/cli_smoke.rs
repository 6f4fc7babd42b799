mod support;

use predicates::str::contains;

use support::{sprintboard_cmd, TestBoard};

#[test]
fn sprintboard_help_works() {
    sprintboard_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(contains("kanban"));
}

#[test]
fn subcommand_help_works() {
    let subcommands = ["init", "task", "sprint", "label", "projects"];

    for cmd in subcommands {
        sprintboard_cmd().arg(cmd).arg("--help").assert().success();
    }
}

#[test]
fn init_creates_config_and_data_dir() {
    let board = TestBoard::new();

    board
        .cmd()
        .args(["init", "--project", "lab68"])
        .assert()
        .success()
        .stdout(contains("initialized board"));

    assert!(board.data_dir().is_dir());
    let config = std::fs::read_to_string(board.path().join(".sprintboard.toml")).expect("config");
    assert!(config.contains("default_project = \"lab68\""));

    board
        .cmd()
        .arg("init")
        .assert()
        .success()
        .stdout(contains("nothing to do"));
}

#[test]
fn unknown_task_exits_with_user_error() {
    let board = TestBoard::new();
    board
        .cmd()
        .args(["task", "show", "NOPE-1"])
        .assert()
        .code(2)
        .stderr(contains("Task not found: NOPE-1"))
        .stderr(contains("hint: sprintboard task list"));
}

#[test]
fn json_errors_use_envelope() {
    let board = TestBoard::new();
    board
        .cmd()
        .args(["--json", "sprint", "start", "sprint_missing"])
        .assert()
        .code(2)
        .stdout(contains("\"status\": \"error\""))
        .stdout(contains("\"command\": \"sprint start\""))
        .stdout(contains("\"kind\": \"not_found\""));
}

#[test]
fn invalid_status_is_rejected() {
    let board = TestBoard::new();
    board
        .cmd()
        .args(["task", "new", "Bad", "--status", "someday"])
        .assert()
        .code(2)
        .stderr(contains("Invalid task status"));
}

#[test]
fn quiet_suppresses_human_output() {
    let board = TestBoard::new();
    board
        .cmd()
        .args(["--quiet", "task", "new", "Silent"])
        .assert()
        .success()
        .stdout("");
}
