//! Task filtering for board and list views.

use serde::{Deserialize, Serialize};

use crate::model::{IssueType, Priority, Task, TaskStatus};

/// Criteria combined with AND across fields and OR within a field.
///
/// An empty field places no constraint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FilterSpec {
    pub search: String,
    pub statuses: Vec<TaskStatus>,
    pub priorities: Vec<Priority>,
    pub types: Vec<IssueType>,
    pub assignees: Vec<String>,
    /// Label ids; a task matches when it carries at least one of them
    pub labels: Vec<String>,
}

impl FilterSpec {
    pub fn matches(&self, task: &Task) -> bool {
        let needle = self.search.trim().to_lowercase();
        if !needle.is_empty() && !matches_search(task, &needle) {
            return false;
        }
        if !self.statuses.is_empty() && !self.statuses.contains(&task.status) {
            return false;
        }
        if !self.priorities.is_empty() && !self.priorities.contains(&task.priority) {
            return false;
        }
        if !self.types.is_empty() {
            match task.issue_type {
                Some(issue_type) if self.types.contains(&issue_type) => {}
                _ => return false,
            }
        }
        if !self.assignees.is_empty() {
            match &task.assignee {
                Some(assignee) if self.assignees.iter().any(|a| a == assignee) => {}
                _ => return false,
            }
        }
        if !self.labels.is_empty() && !self.labels.iter().any(|label| task.has_label(label)) {
            return false;
        }
        true
    }

    /// Whether any criterion is set.
    pub fn is_active(&self) -> bool {
        self.active_count() > 0
    }

    /// Number of selected criteria; a non-blank search counts once.
    pub fn active_count(&self) -> usize {
        let search = usize::from(!self.search.trim().is_empty());
        search
            + self.statuses.len()
            + self.priorities.len()
            + self.types.len()
            + self.assignees.len()
            + self.labels.len()
    }
}

fn matches_search(task: &Task, needle: &str) -> bool {
    task.title.to_lowercase().contains(needle)
        || task.description.to_lowercase().contains(needle)
        || task.key.to_lowercase().contains(needle)
}

/// Tasks matching `spec`, in input order.
pub fn filter_tasks(tasks: &[Task], spec: &FilterSpec) -> Vec<Task> {
    tasks.iter().filter(|task| spec.matches(task)).cloned().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn task(title: &str, status: TaskStatus, priority: Priority) -> Task {
        let now = Utc::now();
        Task {
            id: format!("task_{}", title.to_lowercase().replace(' ', "_")),
            project_id: "p1".to_string(),
            key: String::new(),
            title: title.to_string(),
            description: String::new(),
            status,
            priority,
            issue_type: None,
            assignee: None,
            due_date: None,
            story_points: 0,
            labels: Vec::new(),
            epic_id: None,
            order: 0,
            sprint_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn empty_spec_matches_everything() {
        let tasks = vec![
            task("A", TaskStatus::Todo, Priority::Low),
            task("B", TaskStatus::Done, Priority::High),
        ];
        let spec = FilterSpec::default();
        assert!(!spec.is_active());
        assert_eq!(filter_tasks(&tasks, &spec), tasks);
    }

    #[test]
    fn search_is_trimmed_and_case_insensitive() {
        let mut login = task("Fix Login bug", TaskStatus::Todo, Priority::High);
        login.key = "LAB-7".to_string();
        let mut other = task("Docs", TaskStatus::Todo, Priority::Low);
        other.description = "Mention the LOGIN flow".to_string();
        let tasks = vec![login, other, task("Unrelated", TaskStatus::Todo, Priority::Low)];

        let spec = FilterSpec {
            search: "  login ".to_string(),
            ..FilterSpec::default()
        };
        let titles: Vec<_> = filter_tasks(&tasks, &spec).into_iter().map(|t| t.title).collect();
        assert_eq!(titles, vec!["Fix Login bug", "Docs"]);

        let by_key = FilterSpec {
            search: "lab-7".to_string(),
            ..FilterSpec::default()
        };
        assert_eq!(filter_tasks(&tasks, &by_key).len(), 1);

        let blank = FilterSpec {
            search: "   ".to_string(),
            ..FilterSpec::default()
        };
        assert_eq!(filter_tasks(&tasks, &blank).len(), 3);
        assert!(!blank.is_active());
    }

    #[test]
    fn untyped_and_unassigned_never_match_set_filters() {
        let mut bug = task("Bug", TaskStatus::Todo, Priority::Medium);
        bug.issue_type = Some(IssueType::Bug);
        bug.assignee = Some("ana".to_string());
        let plain = task("Plain", TaskStatus::Todo, Priority::Medium);

        let by_type = FilterSpec {
            types: vec![IssueType::Bug, IssueType::Story],
            ..FilterSpec::default()
        };
        assert!(by_type.matches(&bug));
        assert!(!by_type.matches(&plain));

        let by_assignee = FilterSpec {
            assignees: vec!["ana".to_string()],
            ..FilterSpec::default()
        };
        assert!(by_assignee.matches(&bug));
        assert!(!by_assignee.matches(&plain));
    }

    #[test]
    fn active_count_counts_each_selection() {
        let spec = FilterSpec {
            search: "x".to_string(),
            statuses: vec![TaskStatus::Todo, TaskStatus::Done],
            labels: vec!["l1".to_string()],
            ..FilterSpec::default()
        };
        assert_eq!(spec.active_count(), 4);
        assert!(spec.is_active());
    }

    #[test]
    fn deserializes_partial_json() {
        let spec: FilterSpec =
            serde_json::from_str(r#"{"statuses": ["in-progress"], "priorities": ["critical"]}"#)
                .expect("spec");
        assert_eq!(spec.statuses, vec![TaskStatus::InProgress]);
        assert_eq!(spec.priorities, vec![Priority::Urgent]);
        assert!(spec.search.is_empty());
    }
}
