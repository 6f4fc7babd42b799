//! Task store: CRUD over project tasks plus the sprint/backlog and kanban
//! column transitions.
//!
//! Tasks are ordered within their status column by `order`. New tasks and
//! tasks whose status changes through a move helper land at the end of the
//! destination column.

use std::sync::Arc;

use chrono::Utc;

use crate::config::TasksConfig;
use crate::error::{Error, Result};
use crate::model::{new_id, normalize_labels, Sprint, SprintStatus, Task, TaskPatch, TaskStatus, NewTask, TASK_ID_PREFIX};
use crate::repository::Repository;

const FALLBACK_KEY_PREFIX: &str = "TASK";
const DERIVED_KEY_PREFIX_LEN: usize = 4;

pub struct TaskStore {
    tasks: Arc<dyn Repository<Task>>,
    sprints: Arc<dyn Repository<Sprint>>,
    config: TasksConfig,
}

impl TaskStore {
    pub fn new(
        tasks: Arc<dyn Repository<Task>>,
        sprints: Arc<dyn Repository<Sprint>>,
        config: TasksConfig,
    ) -> Self {
        Self {
            tasks,
            sprints,
            config,
        }
    }

    pub fn config(&self) -> &TasksConfig {
        &self.config
    }

    /// Create a task at the end of its status column.
    pub fn create_task(&self, project_id: &str, new: NewTask) -> Result<Task> {
        validate_project_id(project_id)?;
        let title = validate_title(&new.title)?;

        let prefix = self.key_prefix(project_id);
        let now = Utc::now();
        let draft = Task {
            id: new_id(TASK_ID_PREFIX),
            project_id: project_id.to_string(),
            key: String::new(),
            title,
            description: new.description,
            status: new.status,
            priority: new.priority.unwrap_or(self.config.default_priority),
            issue_type: new.issue_type,
            assignee: clean_assignee(new.assignee),
            due_date: new.due_date,
            story_points: new.story_points,
            labels: normalize_labels(new.labels),
            epic_id: clean_epic(new.epic_id),
            order: 0,
            sprint_id: None,
            created_at: now,
            updated_at: now,
        };

        // Key and order are derived under the repository's write lock.
        let task = self.tasks.create_with(project_id, &mut |existing| {
            let mut task = draft.clone();
            task.key = next_key(existing, &prefix);
            task.order = next_order(existing, task.status);
            Ok(task)
        })?;
        tracing::debug!(project = project_id, task = %task.id, key = %task.key, "task created");
        Ok(task)
    }

    /// Merge a patch into an existing task.
    pub fn update_task(&self, project_id: &str, task_id: &str, patch: TaskPatch) -> Result<Task> {
        let title = match &patch.title {
            Some(title) => Some(validate_title(title)?),
            None => None,
        };

        let mut task = self.get_task(project_id, task_id)?;
        if let Some(title) = title {
            task.title = title;
        }
        if let Some(description) = patch.description {
            task.description = description;
        }
        if let Some(status) = patch.status {
            task.status = status;
        }
        if let Some(priority) = patch.priority {
            task.priority = priority;
        }
        if let Some(issue_type) = patch.issue_type {
            task.issue_type = issue_type;
        }
        if let Some(assignee) = patch.assignee {
            task.assignee = clean_assignee(assignee);
        }
        if let Some(due_date) = patch.due_date {
            task.due_date = due_date;
        }
        if let Some(points) = patch.story_points {
            task.story_points = points;
        }
        if let Some(labels) = patch.labels {
            task.labels = normalize_labels(labels);
        }
        if let Some(epic_id) = patch.epic_id {
            task.epic_id = clean_epic(epic_id);
        }
        if let Some(order) = patch.order {
            task.order = order;
        }
        task.updated_at = Utc::now();

        self.tasks.update(task)
    }

    /// Remove a task. Unknown ids succeed without doing anything.
    pub fn delete_task(&self, project_id: &str, task_id: &str) -> Result<()> {
        self.tasks.delete(project_id, task_id)?;
        tracing::debug!(project = project_id, task = task_id, "task deleted");
        Ok(())
    }

    /// All tasks of a project in persisted order.
    pub fn get_tasks(&self, project_id: &str) -> Result<Vec<Task>> {
        self.tasks.list(project_id)
    }

    pub fn get_task(&self, project_id: &str, task_id: &str) -> Result<Task> {
        self.tasks
            .get(project_id, task_id)?
            .ok_or_else(|| Error::not_found("Task", task_id))
    }

    /// Assign a task to a sprint. A `backlog` task becomes `todo`; any
    /// other status is kept.
    pub fn move_task_to_sprint(&self, project_id: &str, task_id: &str, sprint_id: &str) -> Result<Task> {
        let tasks = self.tasks.list(project_id)?;
        let mut task = find_task(&tasks, task_id)?.clone();
        let sprint = self
            .sprints
            .get(project_id, sprint_id)?
            .ok_or_else(|| Error::not_found("Sprint", sprint_id))?;
        if sprint.status == SprintStatus::Completed {
            tracing::warn!(project = project_id, sprint = sprint_id, task = task_id, "assigning task to a completed sprint");
        }

        task.sprint_id = Some(sprint.id);
        if task.status == TaskStatus::Backlog {
            place_in_column(&mut task, TaskStatus::Todo, &tasks);
        }
        task.updated_at = Utc::now();

        let task = self.tasks.update(task)?;
        tracing::debug!(project = project_id, task = task_id, sprint = sprint_id, status = %task.status, "task moved to sprint");
        Ok(task)
    }

    /// Return a task to the product backlog.
    ///
    /// Status is left alone unless `tasks.reset_status_on_backlog` is set,
    /// in which case it becomes `backlog`.
    pub fn move_task_to_backlog(&self, project_id: &str, task_id: &str) -> Result<Task> {
        let tasks = self.tasks.list(project_id)?;
        let mut task = find_task(&tasks, task_id)?.clone();

        task.sprint_id = None;
        if self.config.reset_status_on_backlog && task.status != TaskStatus::Backlog {
            place_in_column(&mut task, TaskStatus::Backlog, &tasks);
        }
        task.updated_at = Utc::now();

        let task = self.tasks.update(task)?;
        tracing::debug!(project = project_id, task = task_id, status = %task.status, "task moved to backlog");
        Ok(task)
    }

    /// Move a task to another kanban column, appending it to that column.
    pub fn move_task_to_status(&self, project_id: &str, task_id: &str, status: TaskStatus) -> Result<Task> {
        let tasks = self.tasks.list(project_id)?;
        let mut task = find_task(&tasks, task_id)?.clone();
        if task.status != status {
            place_in_column(&mut task, status, &tasks);
        }
        task.updated_at = Utc::now();
        self.tasks.update(task)
    }

    /// Assign `order = index` to the listed tasks. Unknown ids are skipped.
    ///
    /// Each changed task is written separately; the sequence is not atomic.
    pub fn reorder_tasks(&self, project_id: &str, ordered_ids: &[String]) -> Result<Vec<Task>> {
        let tasks = self.tasks.list(project_id)?;
        let now = Utc::now();
        let mut updated = Vec::new();
        for (index, id) in ordered_ids.iter().enumerate() {
            let Some(task) = tasks.iter().find(|task| &task.id == id) else {
                tracing::debug!(project = project_id, task = %id, "reorder skipped unknown task");
                continue;
            };
            let order = index as i64;
            if task.order == order {
                continue;
            }
            let mut task = task.clone();
            task.order = order;
            task.updated_at = now;
            updated.push(self.tasks.update(task)?);
        }
        Ok(updated)
    }

    /// One kanban column, sorted by `order`.
    pub fn tasks_by_status(&self, project_id: &str, status: TaskStatus) -> Result<Vec<Task>> {
        let mut column: Vec<Task> = self
            .tasks
            .list(project_id)?
            .into_iter()
            .filter(|task| task.status == status)
            .collect();
        sort_column(&mut column);
        Ok(column)
    }

    /// Tasks of a sprint, or the backlog (no sprint) when `sprint_id` is
    /// `None`, sorted by `order`.
    pub fn tasks_by_sprint(&self, project_id: &str, sprint_id: Option<&str>) -> Result<Vec<Task>> {
        let mut tasks: Vec<Task> = self
            .tasks
            .list(project_id)?
            .into_iter()
            .filter(|task| task.sprint_id.as_deref() == sprint_id)
            .collect();
        sort_column(&mut tasks);
        Ok(tasks)
    }

    fn key_prefix(&self, project_id: &str) -> String {
        match &self.config.key_prefix {
            Some(prefix) => prefix.trim().to_ascii_uppercase(),
            None => derive_key_prefix(project_id),
        }
    }
}

/// Group tasks into kanban columns in status order; every status gets a
/// column, possibly empty.
pub fn group_by_status(tasks: &[Task]) -> Vec<(TaskStatus, Vec<Task>)> {
    TaskStatus::ALL
        .iter()
        .map(|status| {
            let mut column: Vec<Task> = tasks
                .iter()
                .filter(|task| task.status == *status)
                .cloned()
                .collect();
            sort_column(&mut column);
            (*status, column)
        })
        .collect()
}

/// Sort by `order`, breaking ties by creation time then id.
pub fn sort_column(tasks: &mut [Task]) {
    tasks.sort_by(|a, b| {
        a.order
            .cmp(&b.order)
            .then_with(|| a.created_at.cmp(&b.created_at))
            .then_with(|| a.id.cmp(&b.id))
    });
}

fn find_task<'a>(tasks: &'a [Task], task_id: &str) -> Result<&'a Task> {
    tasks
        .iter()
        .find(|task| task.id == task_id)
        .ok_or_else(|| Error::not_found("Task", task_id))
}

fn place_in_column(task: &mut Task, status: TaskStatus, tasks: &[Task]) {
    let others: Vec<Task> = tasks
        .iter()
        .filter(|other| other.id != task.id)
        .cloned()
        .collect();
    task.status = status;
    task.order = next_order(&others, status);
}

fn next_order(tasks: &[Task], status: TaskStatus) -> i64 {
    tasks
        .iter()
        .filter(|task| task.status == status)
        .map(|task| task.order)
        .max()
        .map(|max| max + 1)
        .unwrap_or(1)
}

fn next_key(tasks: &[Task], prefix: &str) -> String {
    let next = tasks
        .iter()
        .filter_map(|task| key_number(&task.key, prefix))
        .max()
        .unwrap_or(0)
        + 1;
    format!("{prefix}-{next}")
}

fn key_number(key: &str, prefix: &str) -> Option<u64> {
    let rest = key.strip_prefix(prefix)?.strip_prefix('-')?;
    rest.parse().ok()
}

/// Uppercased leading alphanumerics of the project id, or `TASK`.
fn derive_key_prefix(project_id: &str) -> String {
    let prefix: String = project_id
        .chars()
        .filter(|ch| ch.is_ascii_alphanumeric())
        .take(DERIVED_KEY_PREFIX_LEN)
        .collect::<String>()
        .to_ascii_uppercase();
    if prefix.is_empty() {
        FALLBACK_KEY_PREFIX.to_string()
    } else {
        prefix
    }
}

fn validate_project_id(project_id: &str) -> Result<()> {
    if project_id.trim().is_empty() {
        return Err(Error::Validation("project id cannot be empty".to_string()));
    }
    Ok(())
}

fn validate_title(title: &str) -> Result<String> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(Error::Validation("task title cannot be empty".to_string()));
    }
    Ok(trimmed.to_string())
}

fn clean_epic(epic_id: Option<String>) -> Option<String> {
    epic_id
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn clean_assignee(assignee: Option<String>) -> Option<String> {
    assignee
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
