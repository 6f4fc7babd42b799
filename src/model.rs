//! Domain records for the board: tasks, sprints and labels.
//!
//! Records serialize with camelCase field names. Snake_case aliases are
//! accepted on input so payloads written by the row-store API still load.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use ulid::Ulid;

use crate::error::{Error, Result};

pub(crate) const TASK_ID_PREFIX: &str = "task";
pub(crate) const SPRINT_ID_PREFIX: &str = "sprint";
pub(crate) const LABEL_ID_PREFIX: &str = "label";

/// Build a fresh record id of the form `<prefix>_<ulid>`.
pub(crate) fn new_id(prefix: &str) -> String {
    format!("{}_{}", prefix, Ulid::new().to_string().to_lowercase())
}

// =============================================================================
// Task status
// =============================================================================

/// Kanban column a task lives in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskStatus {
    Backlog,
    Todo,
    #[serde(alias = "in_progress")]
    InProgress,
    Review,
    Done,
    Closed,
    Blocked,
}

impl TaskStatus {
    pub const ALL: [TaskStatus; 7] = [
        TaskStatus::Backlog,
        TaskStatus::Todo,
        TaskStatus::InProgress,
        TaskStatus::Review,
        TaskStatus::Done,
        TaskStatus::Closed,
        TaskStatus::Blocked,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Backlog => "backlog",
            TaskStatus::Todo => "todo",
            TaskStatus::InProgress => "in-progress",
            TaskStatus::Review => "review",
            TaskStatus::Done => "done",
            TaskStatus::Closed => "closed",
            TaskStatus::Blocked => "blocked",
        }
    }

    /// `done` or `closed`: no further work expected.
    pub fn is_resolved(&self) -> bool {
        matches!(self, TaskStatus::Done | TaskStatus::Closed)
    }
}

impl Default for TaskStatus {
    fn default() -> Self {
        TaskStatus::Backlog
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "backlog" => Ok(TaskStatus::Backlog),
            "todo" | "to-do" => Ok(TaskStatus::Todo),
            "in-progress" | "in_progress" | "inprogress" => Ok(TaskStatus::InProgress),
            "review" => Ok(TaskStatus::Review),
            "done" => Ok(TaskStatus::Done),
            "closed" => Ok(TaskStatus::Closed),
            "blocked" => Ok(TaskStatus::Blocked),
            _ => Err(Error::InvalidArgument(format!(
                "Invalid task status '{}'. Expected: backlog, todo, in-progress, review, done, closed, blocked",
                s
            ))),
        }
    }
}

// =============================================================================
// Priority
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Lowest,
    Low,
    Medium,
    High,
    #[serde(alias = "critical")]
    Urgent,
}

impl Priority {
    pub const ALL: [Priority; 5] = [
        Priority::Lowest,
        Priority::Low,
        Priority::Medium,
        Priority::High,
        Priority::Urgent,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Lowest => "lowest",
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
            Priority::Urgent => "urgent",
        }
    }
}

impl Default for Priority {
    fn default() -> Self {
        Priority::Medium
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "lowest" => Ok(Priority::Lowest),
            "low" => Ok(Priority::Low),
            "medium" | "med" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            "urgent" | "critical" => Ok(Priority::Urgent),
            _ => Err(Error::InvalidArgument(format!(
                "Invalid priority '{}'. Expected: lowest, low, medium, high, urgent",
                s
            ))),
        }
    }
}

// =============================================================================
// Issue type
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueType {
    Story,
    Task,
    Bug,
    Epic,
    Subtask,
}

impl IssueType {
    pub fn as_str(&self) -> &'static str {
        match self {
            IssueType::Story => "story",
            IssueType::Task => "task",
            IssueType::Bug => "bug",
            IssueType::Epic => "epic",
            IssueType::Subtask => "subtask",
        }
    }
}

impl fmt::Display for IssueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IssueType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "story" => Ok(IssueType::Story),
            "task" => Ok(IssueType::Task),
            "bug" => Ok(IssueType::Bug),
            "epic" => Ok(IssueType::Epic),
            "subtask" | "sub-task" => Ok(IssueType::Subtask),
            _ => Err(Error::InvalidArgument(format!(
                "Invalid issue type '{}'. Expected: story, task, bug, epic, subtask",
                s
            ))),
        }
    }
}

// =============================================================================
// Sprint status
// =============================================================================

/// Sprint lifecycle: `planning -> active -> completed`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SprintStatus {
    Planning,
    Active,
    Completed,
}

impl SprintStatus {
    /// The only state reachable from this one, if any.
    pub fn next(&self) -> Option<SprintStatus> {
        match self {
            SprintStatus::Planning => Some(SprintStatus::Active),
            SprintStatus::Active => Some(SprintStatus::Completed),
            SprintStatus::Completed => None,
        }
    }

    pub fn can_transition_to(&self, target: SprintStatus) -> bool {
        self.next() == Some(target)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SprintStatus::Planning => "planning",
            SprintStatus::Active => "active",
            SprintStatus::Completed => "completed",
        }
    }
}

impl Default for SprintStatus {
    fn default() -> Self {
        SprintStatus::Planning
    }
}

impl fmt::Display for SprintStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SprintStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "planning" => Ok(SprintStatus::Planning),
            "active" => Ok(SprintStatus::Active),
            "completed" => Ok(SprintStatus::Completed),
            _ => Err(Error::InvalidArgument(format!(
                "Invalid sprint status '{}'. Expected: planning, active, completed",
                s
            ))),
        }
    }
}

// =============================================================================
// Label references
// =============================================================================

/// A label as it may appear inside a task payload: a bare id or an
/// embedded label object (only its id is kept).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum LabelRef {
    Id(String),
    Object { id: String },
}

impl LabelRef {
    pub fn id(&self) -> &str {
        match self {
            LabelRef::Id(id) => id,
            LabelRef::Object { id } => id,
        }
    }
}

impl From<String> for LabelRef {
    fn from(id: String) -> Self {
        LabelRef::Id(id)
    }
}

impl From<&str> for LabelRef {
    fn from(id: &str) -> Self {
        LabelRef::Id(id.to_string())
    }
}

impl From<&Label> for LabelRef {
    fn from(label: &Label) -> Self {
        LabelRef::Object {
            id: label.id.clone(),
        }
    }
}

/// Collapse label references into the canonical id list.
///
/// Ids are trimmed, blanks dropped and duplicates removed; the first
/// occurrence keeps its position.
pub fn normalize_labels<I, L>(refs: I) -> Vec<String>
where
    I: IntoIterator<Item = L>,
    L: Into<LabelRef>,
{
    let mut seen = HashSet::new();
    let mut ids = Vec::new();
    for label in refs {
        let label = label.into();
        let id = label.id().trim();
        if id.is_empty() {
            continue;
        }
        if seen.insert(id.to_string()) {
            ids.push(id.to_string());
        }
    }
    ids
}

fn deserialize_labels<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let refs: Option<Vec<LabelRef>> = Option::deserialize(deserializer)?;
    Ok(normalize_labels(refs.unwrap_or_default()))
}

fn deserialize_points<'de, D>(deserializer: D) -> std::result::Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let points: Option<u32> = Option::deserialize(deserializer)?;
    Ok(points.unwrap_or(0))
}

// =============================================================================
// Task
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    #[serde(alias = "project_id")]
    pub project_id: String,
    #[serde(default)]
    pub key: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub status: TaskStatus,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default, alias = "issue_type", skip_serializing_if = "Option::is_none")]
    pub issue_type: Option<IssueType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee: Option<String>,
    #[serde(default, alias = "due_date", skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
    #[serde(default, alias = "story_points", deserialize_with = "deserialize_points")]
    pub story_points: u32,
    #[serde(default, deserialize_with = "deserialize_labels")]
    pub labels: Vec<String>,
    /// Epic this issue rolls up to
    #[serde(default, alias = "epic_id", skip_serializing_if = "Option::is_none")]
    pub epic_id: Option<String>,
    #[serde(default, alias = "order_index")]
    pub order: i64,
    #[serde(default, alias = "sprint_id", skip_serializing_if = "Option::is_none")]
    pub sprint_id: Option<String>,
    #[serde(alias = "created_at")]
    pub created_at: DateTime<Utc>,
    #[serde(alias = "updated_at")]
    pub updated_at: DateTime<Utc>,
}

impl Task {
    pub fn in_backlog(&self) -> bool {
        self.sprint_id.is_none()
    }

    pub fn has_label(&self, label_id: &str) -> bool {
        self.labels.iter().any(|id| id == label_id)
    }
}

/// Caller-supplied fields for a new task
#[derive(Debug, Clone, Default)]
pub struct NewTask {
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
    pub priority: Option<Priority>,
    pub issue_type: Option<IssueType>,
    pub assignee: Option<String>,
    pub due_date: Option<NaiveDate>,
    pub story_points: u32,
    pub labels: Vec<LabelRef>,
    pub epic_id: Option<String>,
}

impl NewTask {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn status(mut self, status: TaskStatus) -> Self {
        self.status = status;
        self
    }

    pub fn priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn issue_type(mut self, issue_type: IssueType) -> Self {
        self.issue_type = Some(issue_type);
        self
    }

    pub fn assignee(mut self, assignee: impl Into<String>) -> Self {
        self.assignee = Some(assignee.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn story_points(mut self, points: u32) -> Self {
        self.story_points = points;
        self
    }

    pub fn label(mut self, label: impl Into<LabelRef>) -> Self {
        self.labels.push(label.into());
        self
    }

    pub fn epic(mut self, epic_id: impl Into<String>) -> Self {
        self.epic_id = Some(epic_id.into());
        self
    }
}

/// Partial update for a task. `None` leaves a field alone; for clearable
/// fields `Some(None)` clears it.
///
/// Sprint membership is not patchable here; it moves through
/// `TaskStore::move_task_to_sprint` / `move_task_to_backlog`.
#[derive(Debug, Clone, Default)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub priority: Option<Priority>,
    pub issue_type: Option<Option<IssueType>>,
    pub assignee: Option<Option<String>>,
    pub due_date: Option<Option<NaiveDate>>,
    pub story_points: Option<u32>,
    pub labels: Option<Vec<LabelRef>>,
    pub epic_id: Option<Option<String>>,
    pub order: Option<i64>,
}

impl TaskPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.status.is_none()
            && self.priority.is_none()
            && self.issue_type.is_none()
            && self.assignee.is_none()
            && self.due_date.is_none()
            && self.story_points.is_none()
            && self.labels.is_none()
            && self.epic_id.is_none()
            && self.order.is_none()
    }
}

// =============================================================================
// Sprint
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sprint {
    pub id: String,
    #[serde(alias = "project_id")]
    pub project_id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub goal: Option<String>,
    #[serde(default)]
    pub status: SprintStatus,
    #[serde(default, alias = "start_date", skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    #[serde(default, alias = "end_date", skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
    #[serde(alias = "created_at")]
    pub created_at: DateTime<Utc>,
    #[serde(alias = "updated_at")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct NewSprint {
    pub name: String,
    pub goal: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl NewSprint {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn goal(mut self, goal: impl Into<String>) -> Self {
        self.goal = Some(goal.into());
        self
    }

    pub fn dates(mut self, start: NaiveDate, end: NaiveDate) -> Self {
        self.start_date = Some(start);
        self.end_date = Some(end);
        self
    }
}

/// Field updates for a sprint. Status changes only through
/// `start_sprint` / `complete_sprint`.
#[derive(Debug, Clone, Default)]
pub struct SprintPatch {
    pub name: Option<String>,
    pub goal: Option<Option<String>>,
    pub start_date: Option<Option<NaiveDate>>,
    pub end_date: Option<Option<NaiveDate>>,
}

// =============================================================================
// Label
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Label {
    pub id: String,
    #[serde(alias = "project_id")]
    pub project_id: String,
    pub name: String,
    pub color: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Caller-supplied fields for a new label; color comes from the palette
/// when unset.
#[derive(Debug, Clone, Default)]
pub struct NewLabel {
    pub name: String,
    pub color: Option<String>,
    pub description: Option<String>,
}

impl NewLabel {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct LabelPatch {
    pub name: Option<String>,
    pub color: Option<String>,
    pub description: Option<Option<String>>,
}
