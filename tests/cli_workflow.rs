mod support;

use predicates::str::contains;

use support::TestBoard;

#[test]
fn sprint_workflow_through_cli() {
    let board = TestBoard::new();
    board.cmd().args(["init", "--project", "lab68"]).assert().success();

    let task = board.json(&["task", "new", "Fix login bug", "--priority", "high", "--points", "5"]);
    assert_eq!(task["key"], "LAB6-1");
    assert_eq!(task["status"], "backlog");
    assert_eq!(task["priority"], "high");

    let sprint = board.json(&["sprint", "new", "Sprint 1", "--start", "2024-06-03", "--end", "2024-06-14"]);
    assert_eq!(sprint["status"], "planning");
    let sprint_id = sprint["id"].as_str().expect("sprint id").to_string();

    // Tasks and sprints resolve by key and by name.
    let moved = board.json(&["task", "sprint", "lab6-1", "Sprint 1"]);
    assert_eq!(moved["status"], "todo");
    assert_eq!(moved["sprintId"], sprint_id.as_str());

    let started = board.json(&["sprint", "start", &sprint_id]);
    assert_eq!(started["status"], "active");

    let active = board.json(&["sprint", "active"]);
    assert_eq!(active["active"]["id"], sprint_id.as_str());

    board.json(&["task", "status", "LAB6-1", "done"]);
    let stats = board.json(&["sprint", "stats", "Sprint 1"]);
    assert_eq!(stats["total"], 1);
    assert_eq!(stats["completed"], 1);
    assert_eq!(stats["completedPoints"], 5);
    assert_eq!(stats["pointsCompletionRate"], 100.0);

    let completed = board.json(&["sprint", "complete", &sprint_id]);
    assert_eq!(completed["status"], "completed");

    board
        .cmd()
        .args(["sprint", "complete", &sprint_id])
        .assert()
        .code(3)
        .stderr(contains("cannot move from completed"));

    let stats = board.json(&["sprint", "stats", &sprint_id]);
    assert_eq!(stats["velocity"], 5.0);
}

#[test]
fn list_applies_filters() {
    let board = TestBoard::new();
    board.json(&["label", "new", "backend"]);
    board.json(&["task", "new", "API timeout", "--label", "backend", "--priority", "high"]);
    board.json(&["task", "new", "Landing page", "--status", "done", "--priority", "high"]);
    board.json(&["task", "new", "Cleanup", "--status", "done", "--priority", "low"]);

    let all = board.json(&["task", "list"]);
    assert_eq!(all["total"], 3);

    let done_high = board.json(&["task", "list", "--status", "done", "--priority", "high"]);
    assert_eq!(done_high["total"], 1);
    assert_eq!(done_high["tasks"][0]["title"], "Landing page");

    let labelled = board.json(&["task", "list", "--label", "backend"]);
    assert_eq!(labelled["total"], 1);
    assert_eq!(labelled["tasks"][0]["labelNames"][0], "backend");

    let searched = board.json(&["task", "list", "--search", "  TIMEOUT "]);
    assert_eq!(searched["total"], 1);

    let backlog = board.json(&["task", "list", "--sprint", "backlog"]);
    assert_eq!(backlog["total"], 3);
}

#[test]
fn label_removal_strips_tasks() {
    let board = TestBoard::new();
    let label = board.json(&["label", "new", "ui", "--color", "#8B5CF6"]);
    assert_eq!(label["color"], "#8b5cf6");

    board.json(&["task", "new", "Button glitch", "--label", "ui"]);
    board.json(&["label", "rm", "ui"]);
    let again = board.json(&["label", "rm", "ui"]);
    assert_eq!(again["deleted"], false);

    let task = board.json(&["task", "show", "DEFA-1"]);
    assert_eq!(task["labels"].as_array().map(Vec::len), Some(0));
}

#[test]
fn board_groups_columns_in_order() {
    let board = TestBoard::new();
    board.json(&["task", "new", "First"]);
    board.json(&["task", "new", "Second"]);
    board.json(&["task", "new", "Shipped", "--status", "done"]);
    board.json(&["task", "reorder", "DEFA-2", "DEFA-1"]);

    let view = board.json(&["task", "board"]);
    let columns = view["columns"].as_array().expect("columns");
    assert_eq!(columns.len(), 7);
    assert_eq!(columns[0]["status"], "backlog");
    assert_eq!(columns[0]["tasks"][0]["title"], "Second");
    assert_eq!(columns[0]["tasks"][1]["title"], "First");
    assert_eq!(columns[4]["status"], "done");
    assert_eq!(columns[4]["tasks"][0]["title"], "Shipped");
}

#[test]
fn projects_lists_stored_projects() {
    let board = TestBoard::new();
    board.json(&["--project", "web", "task", "new", "One"]);
    board.json(&["--project", "api", "task", "new", "Two"]);

    let projects = board.json(&["projects"]);
    assert_eq!(projects["projects"], serde_json::json!(["api", "web"]));
    assert_eq!(projects["current"], "default");
}

#[test]
fn config_enables_backlog_reset() {
    let board = TestBoard::new();
    board
        .write_config("[tasks]\nreset_status_on_backlog = true\nkey_prefix = \"LAB\"\n")
        .expect("config");

    board.json(&["task", "new", "Bounce"]);
    board.json(&["sprint", "new", "S1"]);
    let moved = board.json(&["task", "sprint", "LAB-1", "S1"]);
    assert_eq!(moved["status"], "todo");

    let back = board.json(&["task", "backlog", "LAB-1"]);
    assert_eq!(back["status"], "backlog");
    assert!(back.get("sprintId").is_none());
}

#[test]
fn label_new_stores_description() {
    let board = TestBoard::new();
    let label = board.json(&["label", "new", "infra", "--description", "Servers and CI"]);
    assert_eq!(label["description"], "Servers and CI");

    let listed = board.json(&["label", "list"]);
    assert_eq!(listed["labels"][0]["description"], "Servers and CI");
}
