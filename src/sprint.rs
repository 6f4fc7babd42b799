//! Sprint lifecycle and sprint metrics.
//!
//! Sprints move `planning -> active -> completed` and never back. Metrics
//! are derived from task data on demand and never stored.

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use serde::Serialize;

use crate::error::{Error, Result};
use crate::model::{new_id, NewSprint, Sprint, SprintPatch, SprintStatus, Task, TaskStatus, SPRINT_ID_PREFIX};
use crate::repository::Repository;

/// Derived progress numbers for one sprint.
///
/// `completed` counts `done` only. `closed` work is reported separately, and
/// `points_completion_rate` measures story points over every resolved
/// (`done` or `closed`) task, the sprint-board progress bar.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SprintStats {
    pub total: usize,
    pub completed: usize,
    pub in_progress: usize,
    pub todo: usize,
    pub review: usize,
    pub closed: usize,
    pub total_points: u32,
    pub completed_points: u32,
    pub closed_points: u32,
    /// Percentage of tasks done, `0.0` for an empty sprint
    pub completion_rate: f64,
    /// Percentage of story points resolved, `0.0` when nothing is estimated
    pub points_completion_rate: f64,
}

impl SprintStats {
    pub fn from_tasks<'a>(tasks: impl IntoIterator<Item = &'a Task>) -> Self {
        let mut stats = SprintStats::default();
        for task in tasks {
            stats.total += 1;
            stats.total_points += task.story_points;
            match task.status {
                TaskStatus::Done => {
                    stats.completed += 1;
                    stats.completed_points += task.story_points;
                }
                TaskStatus::Closed => {
                    stats.closed += 1;
                    stats.closed_points += task.story_points;
                }
                TaskStatus::InProgress => stats.in_progress += 1,
                TaskStatus::Todo => stats.todo += 1,
                TaskStatus::Review => stats.review += 1,
                _ => {}
            }
        }
        if stats.total > 0 {
            stats.completion_rate = stats.completed as f64 / stats.total as f64 * 100.0;
        }
        if stats.total_points > 0 {
            stats.points_completion_rate = stats.resolved_points() as f64
                / stats.total_points as f64
                * 100.0;
        }
        stats
    }

    /// Tasks `done` or `closed`
    pub fn resolved(&self) -> usize {
        self.completed + self.closed
    }

    pub fn resolved_points(&self) -> u32 {
        self.completed_points + self.closed_points
    }
}

/// Days from `today` until the sprint's end date; negative once overdue.
pub fn days_remaining(sprint: &Sprint, today: NaiveDate) -> Option<i64> {
    sprint
        .end_date
        .map(|end| end.signed_duration_since(today).num_days())
}

pub struct SprintManager {
    sprints: Arc<dyn Repository<Sprint>>,
    tasks: Arc<dyn Repository<Task>>,
}

impl SprintManager {
    pub fn new(sprints: Arc<dyn Repository<Sprint>>, tasks: Arc<dyn Repository<Task>>) -> Self {
        Self { sprints, tasks }
    }

    /// Create a sprint in `planning`.
    pub fn create_sprint(&self, project_id: &str, new: NewSprint) -> Result<Sprint> {
        if project_id.trim().is_empty() {
            return Err(Error::Validation("project id cannot be empty".to_string()));
        }
        let name = validate_name(&new.name)?;
        validate_dates(new.start_date, new.end_date)?;

        let now = Utc::now();
        let sprint = Sprint {
            id: new_id(SPRINT_ID_PREFIX),
            project_id: project_id.to_string(),
            name,
            goal: clean_goal(new.goal),
            status: SprintStatus::Planning,
            start_date: new.start_date,
            end_date: new.end_date,
            created_at: now,
            updated_at: now,
        };
        let sprint = self.sprints.create(sprint)?;
        tracing::debug!(project = project_id, sprint = %sprint.id, name = %sprint.name, "sprint created");
        Ok(sprint)
    }

    pub fn get_sprints(&self, project_id: &str) -> Result<Vec<Sprint>> {
        self.sprints.list(project_id)
    }

    pub fn get_sprint(&self, project_id: &str, sprint_id: &str) -> Result<Sprint> {
        self.sprints
            .get(project_id, sprint_id)?
            .ok_or_else(|| Error::not_found("Sprint", sprint_id))
    }

    /// First active sprint in persisted order.
    pub fn get_active_sprint(&self, project_id: &str) -> Result<Option<Sprint>> {
        let mut active = self
            .sprints
            .list(project_id)?
            .into_iter()
            .filter(|sprint| sprint.status == SprintStatus::Active);
        let first = active.next();
        let others = active.count();
        if others > 0 {
            tracing::warn!(project = project_id, active = others + 1, "more than one active sprint");
        }
        Ok(first)
    }

    pub fn start_sprint(&self, project_id: &str, sprint_id: &str) -> Result<Sprint> {
        let sprint = self.get_sprint(project_id, sprint_id)?;
        ensure_transition(&sprint, SprintStatus::Active)?;

        let concurrent = self
            .sprints
            .list(project_id)?
            .iter()
            .filter(|other| other.id != sprint.id && other.status == SprintStatus::Active)
            .count();
        if concurrent > 0 {
            tracing::warn!(project = project_id, sprint = sprint_id, "starting sprint while another is active");
        }
        let has_tasks = self
            .tasks
            .list(project_id)?
            .iter()
            .any(|task| task.sprint_id.as_deref() == Some(sprint_id));
        if !has_tasks {
            tracing::warn!(project = project_id, sprint = sprint_id, "starting sprint with no tasks");
        }

        self.transition(sprint, SprintStatus::Active)
    }

    pub fn complete_sprint(&self, project_id: &str, sprint_id: &str) -> Result<Sprint> {
        let sprint = self.get_sprint(project_id, sprint_id)?;
        ensure_transition(&sprint, SprintStatus::Completed)?;
        self.transition(sprint, SprintStatus::Completed)
    }

    /// Edit name, goal and dates. Status is not reachable from here.
    pub fn update_sprint(&self, project_id: &str, sprint_id: &str, patch: SprintPatch) -> Result<Sprint> {
        let name = match &patch.name {
            Some(name) => Some(validate_name(name)?),
            None => None,
        };

        let mut sprint = self.get_sprint(project_id, sprint_id)?;
        if let Some(name) = name {
            sprint.name = name;
        }
        if let Some(goal) = patch.goal {
            sprint.goal = clean_goal(goal);
        }
        if let Some(start) = patch.start_date {
            sprint.start_date = start;
        }
        if let Some(end) = patch.end_date {
            sprint.end_date = end;
        }
        validate_dates(sprint.start_date, sprint.end_date)?;
        sprint.updated_at = Utc::now();

        self.sprints.update(sprint)
    }

    /// Remove a sprint; its tasks go back to the backlog as `backlog`.
    /// Unknown ids succeed without doing anything.
    pub fn delete_sprint(&self, project_id: &str, sprint_id: &str) -> Result<()> {
        let now = Utc::now();
        let mut released = 0usize;
        for mut task in self.tasks.list(project_id)? {
            if task.sprint_id.as_deref() != Some(sprint_id) {
                continue;
            }
            task.sprint_id = None;
            task.status = TaskStatus::Backlog;
            task.updated_at = now;
            self.tasks.update(task)?;
            released += 1;
        }
        self.sprints.delete(project_id, sprint_id)?;
        tracing::debug!(project = project_id, sprint = sprint_id, released, "sprint deleted");
        Ok(())
    }

    pub fn sprint_stats(&self, project_id: &str, sprint_id: &str) -> Result<SprintStats> {
        self.get_sprint(project_id, sprint_id)?;
        let tasks = self.tasks.list(project_id)?;
        Ok(SprintStats::from_tasks(
            tasks
                .iter()
                .filter(|task| task.sprint_id.as_deref() == Some(sprint_id)),
        ))
    }

    /// Mean completed story points per completed sprint; `0.0` when no
    /// sprint has been completed.
    pub fn velocity(&self, project_id: &str) -> Result<f64> {
        let completed: Vec<Sprint> = self
            .sprints
            .list(project_id)?
            .into_iter()
            .filter(|sprint| sprint.status == SprintStatus::Completed)
            .collect();
        if completed.is_empty() {
            return Ok(0.0);
        }

        let tasks = self.tasks.list(project_id)?;
        let points: u32 = completed
            .iter()
            .map(|sprint| {
                SprintStats::from_tasks(
                    tasks
                        .iter()
                        .filter(|task| task.sprint_id.as_deref() == Some(sprint.id.as_str())),
                )
                .completed_points
            })
            .sum();
        Ok(points as f64 / completed.len() as f64)
    }

    fn transition(&self, mut sprint: Sprint, to: SprintStatus) -> Result<Sprint> {
        let from = sprint.status;
        sprint.status = to;
        sprint.updated_at = Utc::now();
        let sprint = self.sprints.update(sprint)?;
        tracing::debug!(project = %sprint.project_id, sprint = %sprint.id, %from, %to, "sprint transitioned");
        Ok(sprint)
    }
}

fn ensure_transition(sprint: &Sprint, to: SprintStatus) -> Result<()> {
    if sprint.status.can_transition_to(to) {
        return Ok(());
    }
    Err(Error::InvalidState {
        sprint: sprint.id.clone(),
        from: sprint.status.to_string(),
        to: to.to_string(),
    })
}

fn validate_name(name: &str) -> Result<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(Error::Validation("sprint name cannot be empty".to_string()));
    }
    Ok(trimmed.to_string())
}

fn validate_dates(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Result<()> {
    if let (Some(start), Some(end)) = (start, end) {
        if end < start {
            return Err(Error::Validation(format!(
                "sprint end date {end} is before start date {start}"
            )));
        }
    }
    Ok(())
}

fn clean_goal(goal: Option<String>) -> Option<String> {
    goal.map(|g| g.trim().to_string()).filter(|g| !g.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::MemoryRepository;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    fn task(id: &str, status: TaskStatus, points: u32, sprint: Option<&str>) -> Task {
        let now = Utc::now();
        Task {
            id: id.to_string(),
            project_id: "p1".to_string(),
            key: String::new(),
            title: id.to_string(),
            description: String::new(),
            status,
            priority: Default::default(),
            issue_type: None,
            assignee: None,
            due_date: None,
            story_points: points,
            labels: Vec::new(),
            epic_id: None,
            order: 0,
            sprint_id: sprint.map(str::to_string),
            created_at: now,
            updated_at: now,
        }
    }

    fn manager() -> (SprintManager, Arc<MemoryRepository<Task>>) {
        let tasks = Arc::new(MemoryRepository::<Task>::new());
        let manager = SprintManager::new(Arc::new(MemoryRepository::<Sprint>::new()), tasks.clone());
        (manager, tasks)
    }

    #[test]
    fn create_starts_in_planning() {
        let (manager, _) = manager();
        let sprint = manager
            .create_sprint("p1", NewSprint::new("Sprint 1").goal("  "))
            .expect("create");
        assert_eq!(sprint.status, SprintStatus::Planning);
        assert_eq!(sprint.goal, None);
        assert!(sprint.id.starts_with("sprint_"));
    }

    #[test]
    fn create_validates_name_and_dates() {
        let (manager, _) = manager();
        let err = manager.create_sprint("p1", NewSprint::new(" ")).expect_err("name");
        assert!(matches!(err, Error::Validation(_)));

        let err = manager
            .create_sprint("p1", NewSprint::new("S").dates(date(2024, 2, 10), date(2024, 2, 1)))
            .expect_err("dates");
        assert!(matches!(err, Error::Validation(_)));
        assert!(manager.get_sprints("p1").expect("list").is_empty());
    }

    #[test]
    fn lifecycle_is_forward_only() {
        let (manager, _) = manager();
        let sprint = manager.create_sprint("p1", NewSprint::new("S")).expect("create");

        let err = manager.complete_sprint("p1", &sprint.id).expect_err("skip");
        assert!(matches!(err, Error::InvalidState { .. }));

        manager.start_sprint("p1", &sprint.id).expect("start");
        let err = manager.start_sprint("p1", &sprint.id).expect_err("restart");
        match err {
            Error::InvalidState { from, to, .. } => {
                assert_eq!(from, "active");
                assert_eq!(to, "active");
            }
            other => panic!("unexpected error: {other:?}"),
        }

        let done = manager.complete_sprint("p1", &sprint.id).expect("complete");
        assert_eq!(done.status, SprintStatus::Completed);
        assert!(manager.complete_sprint("p1", &sprint.id).is_err());
    }

    #[test]
    fn active_sprint_is_first_active() {
        let (manager, _) = manager();
        assert!(manager.get_active_sprint("p1").expect("none").is_none());
        let a = manager.create_sprint("p1", NewSprint::new("A")).expect("a");
        let b = manager.create_sprint("p1", NewSprint::new("B")).expect("b");
        manager.start_sprint("p1", &b.id).expect("start b");
        manager.start_sprint("p1", &a.id).expect("start a");

        let active = manager.get_active_sprint("p1").expect("active").expect("some");
        assert_eq!(active.id, a.id);
    }

    #[test]
    fn update_keeps_status_and_checks_dates() {
        let (manager, _) = manager();
        let sprint = manager
            .create_sprint("p1", NewSprint::new("S").dates(date(2024, 1, 1), date(2024, 1, 14)))
            .expect("create");
        manager.start_sprint("p1", &sprint.id).expect("start");

        let patch = SprintPatch {
            name: Some("Renamed".to_string()),
            goal: Some(Some("Ship login".to_string())),
            ..SprintPatch::default()
        };
        let updated = manager.update_sprint("p1", &sprint.id, patch).expect("update");
        assert_eq!(updated.name, "Renamed");
        assert_eq!(updated.goal.as_deref(), Some("Ship login"));
        assert_eq!(updated.status, SprintStatus::Active);

        let patch = SprintPatch {
            end_date: Some(Some(date(2023, 12, 1))),
            ..SprintPatch::default()
        };
        let err = manager.update_sprint("p1", &sprint.id, patch).expect_err("range");
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn delete_returns_tasks_to_backlog() {
        let (manager, tasks) = manager();
        let sprint = manager.create_sprint("p1", NewSprint::new("S")).expect("create");
        tasks
            .create(task("task_a", TaskStatus::InProgress, 3, Some(&sprint.id)))
            .expect("task");
        tasks
            .create(task("task_b", TaskStatus::Todo, 1, None))
            .expect("task");

        manager.delete_sprint("p1", &sprint.id).expect("delete");
        manager.delete_sprint("p1", &sprint.id).expect("delete again");

        let a = tasks.get("p1", "task_a").expect("get").expect("a");
        assert_eq!(a.sprint_id, None);
        assert_eq!(a.status, TaskStatus::Backlog);
        let b = tasks.get("p1", "task_b").expect("get").expect("b");
        assert_eq!(b.status, TaskStatus::Todo);
        assert!(manager.get_sprints("p1").expect("list").is_empty());
    }

    #[test]
    fn stats_count_statuses_and_points() {
        let tasks = vec![
            task("a", TaskStatus::Done, 5, None),
            task("b", TaskStatus::Done, 3, None),
            task("c", TaskStatus::InProgress, 2, None),
            task("d", TaskStatus::Review, 0, None),
        ];
        let stats = SprintStats::from_tasks(&tasks);
        assert_eq!(stats.total, 4);
        assert_eq!(stats.completed, 2);
        assert_eq!(stats.in_progress, 1);
        assert_eq!(stats.review, 1);
        assert_eq!(stats.todo, 0);
        assert_eq!(stats.total_points, 10);
        assert_eq!(stats.completed_points, 8);
        assert!((stats.completion_rate - 50.0).abs() < f64::EPSILON);

        assert_eq!(SprintStats::from_tasks(&Vec::<Task>::new()).completion_rate, 0.0);
    }

    #[test]
    fn closed_work_counts_toward_points_progress_only() {
        let tasks = vec![
            task("a", TaskStatus::Done, 3, None),
            task("b", TaskStatus::Closed, 1, None),
            task("c", TaskStatus::Todo, 4, None),
            task("d", TaskStatus::Closed, 0, None),
        ];
        let stats = SprintStats::from_tasks(&tasks);
        assert_eq!(stats.completed, 1);
        assert_eq!(stats.closed, 2);
        assert_eq!(stats.resolved(), 3);
        assert_eq!(stats.closed_points, 1);
        assert_eq!(stats.resolved_points(), 4);
        assert!((stats.completion_rate - 25.0).abs() < f64::EPSILON);
        assert!((stats.points_completion_rate - 50.0).abs() < f64::EPSILON);

        let unestimated = vec![task("e", TaskStatus::Done, 0, None)];
        assert_eq!(SprintStats::from_tasks(&unestimated).points_completion_rate, 0.0);
    }

    #[test]
    fn days_remaining_counts_to_end_date() {
        let (manager, _) = manager();
        let sprint = manager
            .create_sprint("p1", NewSprint::new("S").dates(date(2024, 3, 1), date(2024, 3, 15)))
            .expect("create");
        assert_eq!(days_remaining(&sprint, date(2024, 3, 10)), Some(5));
        assert_eq!(days_remaining(&sprint, date(2024, 3, 20)), Some(-5));

        let open = manager.create_sprint("p1", NewSprint::new("Open")).expect("create");
        assert_eq!(days_remaining(&open, date(2024, 3, 10)), None);
    }

    #[test]
    fn velocity_averages_completed_sprints() {
        let (manager, tasks) = manager();
        assert_eq!(manager.velocity("p1").expect("velocity"), 0.0);

        let first = manager.create_sprint("p1", NewSprint::new("1")).expect("s1");
        let second = manager.create_sprint("p1", NewSprint::new("2")).expect("s2");
        let open = manager.create_sprint("p1", NewSprint::new("3")).expect("s3");
        tasks.create(task("a", TaskStatus::Done, 8, Some(&first.id))).expect("a");
        tasks.create(task("b", TaskStatus::Todo, 5, Some(&first.id))).expect("b");
        tasks.create(task("c", TaskStatus::Done, 4, Some(&second.id))).expect("c");
        tasks.create(task("d", TaskStatus::Done, 13, Some(&open.id))).expect("d");

        for sprint in [&first, &second] {
            manager.start_sprint("p1", &sprint.id).expect("start");
            manager.complete_sprint("p1", &sprint.id).expect("complete");
        }

        assert!((manager.velocity("p1").expect("velocity") - 6.0).abs() < f64::EPSILON);
    }
}
