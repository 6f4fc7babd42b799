mod support;

use sprintboard::config::Config;
use sprintboard::{Board, Error, NewSprint, NewTask, Priority, TaskPatch, TaskStatus};

use support::TestBoard;

fn reset_policy() -> Config {
    let mut config = Config::default();
    config.tasks.reset_status_on_backlog = true;
    config
}

#[test]
fn backlog_round_trip_keeps_status_by_default() {
    let board = Board::in_memory(Config::default());
    let sprint = board
        .sprints()
        .create_sprint("p1", NewSprint::new("Sprint 1"))
        .expect("sprint");
    let task = board
        .tasks()
        .create_task("p1", NewTask::new("Wire login form"))
        .expect("task");

    let moved = board
        .tasks()
        .move_task_to_sprint("p1", &task.id, &sprint.id)
        .expect("to sprint");
    assert_eq!(moved.status, TaskStatus::Todo);

    let back = board
        .tasks()
        .move_task_to_backlog("p1", &task.id)
        .expect("to backlog");
    assert_eq!(back.sprint_id, None);
    assert_eq!(back.status, TaskStatus::Todo);
    assert!(back.in_backlog());
}

#[test]
fn backlog_round_trip_resets_status_when_configured() {
    let board = Board::in_memory(reset_policy());
    let sprint = board
        .sprints()
        .create_sprint("p1", NewSprint::new("Sprint 1"))
        .expect("sprint");
    let task = board
        .tasks()
        .create_task("p1", NewTask::new("Wire login form"))
        .expect("task");
    board
        .tasks()
        .move_task_to_sprint("p1", &task.id, &sprint.id)
        .expect("to sprint");

    let back = board
        .tasks()
        .move_task_to_backlog("p1", &task.id)
        .expect("to backlog");
    assert_eq!(back.sprint_id, None);
    assert_eq!(back.status, TaskStatus::Backlog);
}

#[test]
fn delete_task_twice_never_errors() {
    let board = Board::in_memory(Config::default());
    let task = board
        .tasks()
        .create_task("p1", NewTask::new("Throwaway"))
        .expect("task");

    board.tasks().delete_task("p1", &task.id).expect("first delete");
    board.tasks().delete_task("p1", &task.id).expect("second delete");
    board.tasks().delete_task("p1", "task_never_existed").expect("unknown delete");
    assert!(board.tasks().get_tasks("p1").expect("list").is_empty());
}

#[test]
fn missing_task_or_sprint_is_not_found() {
    let board = Board::in_memory(Config::default());
    let sprint = board
        .sprints()
        .create_sprint("p1", NewSprint::new("Sprint 1"))
        .expect("sprint");

    let err = board
        .tasks()
        .move_task_to_sprint("p1", "task_missing", &sprint.id)
        .expect_err("missing task");
    assert!(matches!(err, Error::NotFound { kind: "Task", .. }));

    let err = board
        .tasks()
        .move_task_to_backlog("p1", "task_missing")
        .expect_err("missing task");
    assert!(matches!(err, Error::NotFound { kind: "Task", .. }));
}

#[test]
fn sprint_from_other_project_is_not_found() {
    let board = Board::in_memory(Config::default());
    let foreign = board
        .sprints()
        .create_sprint("p2", NewSprint::new("Elsewhere"))
        .expect("sprint");
    let task = board
        .tasks()
        .create_task("p1", NewTask::new("Local"))
        .expect("task");

    let err = board
        .tasks()
        .move_task_to_sprint("p1", &task.id, &foreign.id)
        .expect_err("foreign sprint");
    assert!(matches!(err, Error::NotFound { kind: "Sprint", .. }));
}

#[test]
fn default_priority_comes_from_config() {
    let mut config = Config::default();
    config.tasks.default_priority = Priority::Low;
    let board = Board::in_memory(config);

    let task = board
        .tasks()
        .create_task("p1", NewTask::new("Low by default"))
        .expect("task");
    assert_eq!(task.priority, Priority::Low);

    let task = board
        .tasks()
        .create_task("p1", NewTask::new("Explicit").priority(Priority::High))
        .expect("task");
    assert_eq!(task.priority, Priority::High);
}

#[test]
fn tasks_by_sprint_none_is_backlog() {
    let board = Board::in_memory(Config::default());
    let sprint = board
        .sprints()
        .create_sprint("p1", NewSprint::new("Sprint 1"))
        .expect("sprint");
    let planned = board
        .tasks()
        .create_task("p1", NewTask::new("Planned"))
        .expect("planned");
    board
        .tasks()
        .create_task("p1", NewTask::new("Unplanned").status(TaskStatus::Todo))
        .expect("unplanned");
    board
        .tasks()
        .move_task_to_sprint("p1", &planned.id, &sprint.id)
        .expect("move");

    let backlog = board.tasks().tasks_by_sprint("p1", None).expect("backlog");
    assert_eq!(backlog.len(), 1);
    assert_eq!(backlog[0].title, "Unplanned");

    let in_sprint = board
        .tasks()
        .tasks_by_sprint("p1", Some(&sprint.id))
        .expect("sprint");
    assert_eq!(in_sprint.len(), 1);
    assert_eq!(in_sprint[0].title, "Planned");
}

#[test]
fn file_board_persists_updates() {
    let test = TestBoard::new();
    let board = test.open();
    let task = board
        .tasks()
        .create_task("web", NewTask::new("Persist me").story_points(3))
        .expect("task");
    board
        .tasks()
        .update_task(
            "web",
            &task.id,
            TaskPatch {
                status: Some(TaskStatus::Review),
                ..TaskPatch::default()
            },
        )
        .expect("update");

    let reopened = test.open();
    let stored = reopened.tasks().get_task("web", &task.id).expect("get");
    assert_eq!(stored.status, TaskStatus::Review);
    assert_eq!(stored.story_points, 3);
    assert_eq!(stored.key, "WEB-1");
    assert_eq!(stored.created_at, task.created_at);
}
