//! Epic roll-ups.
//!
//! An epic is a task whose type is `epic`; other tasks join it through
//! `epic_id`. Progress counts resolved issues (`done` or `closed`).

use serde::Serialize;

use crate::model::{IssueType, Task};

/// One epic with the issues that point at it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EpicSummary {
    pub id: String,
    pub key: String,
    pub title: String,
    pub description: String,
    pub issues: Vec<Task>,
    /// Percentage of issues resolved, `0.0` for an empty epic
    pub progress: f64,
    pub total_points: u32,
    pub completed_points: u32,
}

impl EpicSummary {
    fn new(epic: &Task) -> Self {
        Self {
            id: epic.id.clone(),
            key: epic.key.clone(),
            title: epic.title.clone(),
            description: epic.description.clone(),
            issues: Vec::new(),
            progress: 0.0,
            total_points: 0,
            completed_points: 0,
        }
    }

    fn push(&mut self, issue: &Task) {
        self.total_points += issue.story_points;
        if issue.status.is_resolved() {
            self.completed_points += issue.story_points;
        }
        self.issues.push(issue.clone());
    }

    pub fn resolved(&self) -> usize {
        self.issues
            .iter()
            .filter(|issue| issue.status.is_resolved())
            .count()
    }
}

/// Group issues under their epics, in input order.
///
/// Every epic-type task yields a summary, even with no issues. Issues whose
/// `epic_id` names no epic in `tasks`, and epics nested under epics, are
/// left out.
pub fn group_by_epic(tasks: &[Task]) -> Vec<EpicSummary> {
    let mut epics: Vec<EpicSummary> = tasks
        .iter()
        .filter(|task| is_epic(task))
        .map(EpicSummary::new)
        .collect();

    for issue in tasks.iter().filter(|task| !is_epic(task)) {
        let Some(epic_id) = issue.epic_id.as_deref() else {
            continue;
        };
        if let Some(epic) = epics.iter_mut().find(|epic| epic.id == epic_id) {
            epic.push(issue);
        }
    }

    for epic in &mut epics {
        if !epic.issues.is_empty() {
            epic.progress = epic.resolved() as f64 / epic.issues.len() as f64 * 100.0;
        }
    }
    epics
}

fn is_epic(task: &Task) -> bool {
    task.issue_type == Some(IssueType::Epic)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Priority, TaskStatus};
    use chrono::Utc;

    fn issue(id: &str, issue_type: Option<IssueType>, status: TaskStatus, points: u32, epic: Option<&str>) -> Task {
        let now = Utc::now();
        Task {
            id: id.to_string(),
            project_id: "p1".to_string(),
            key: id.to_uppercase(),
            title: id.to_string(),
            description: String::new(),
            status,
            priority: Priority::Medium,
            issue_type,
            assignee: None,
            due_date: None,
            story_points: points,
            labels: Vec::new(),
            epic_id: epic.map(str::to_string),
            order: 0,
            sprint_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn issues_roll_up_to_their_epic() {
        let tasks = vec![
            issue("auth", Some(IssueType::Epic), TaskStatus::InProgress, 0, None),
            issue("login", Some(IssueType::Story), TaskStatus::Done, 5, Some("auth")),
            issue("logout", None, TaskStatus::Closed, 2, Some("auth")),
            issue("reset", Some(IssueType::Bug), TaskStatus::Todo, 3, Some("auth")),
            issue("billing", Some(IssueType::Epic), TaskStatus::Backlog, 0, None),
            issue("loose", Some(IssueType::Task), TaskStatus::Done, 1, None),
            issue("orphan", Some(IssueType::Task), TaskStatus::Done, 1, Some("gone")),
        ];

        let epics = group_by_epic(&tasks);
        assert_eq!(epics.len(), 2);

        let auth = &epics[0];
        assert_eq!(auth.id, "auth");
        let ids: Vec<_> = auth.issues.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["login", "logout", "reset"]);
        assert_eq!(auth.total_points, 10);
        assert_eq!(auth.completed_points, 7);
        assert!((auth.progress - 200.0 / 3.0).abs() < 1e-9);

        let billing = &epics[1];
        assert!(billing.issues.is_empty());
        assert_eq!(billing.progress, 0.0);
    }

    #[test]
    fn epics_do_not_nest() {
        let tasks = vec![
            issue("outer", Some(IssueType::Epic), TaskStatus::Todo, 0, None),
            issue("inner", Some(IssueType::Epic), TaskStatus::Todo, 8, Some("outer")),
        ];
        let epics = group_by_epic(&tasks);
        assert_eq!(epics.len(), 2);
        assert!(epics.iter().all(|epic| epic.issues.is_empty()));
    }
}
