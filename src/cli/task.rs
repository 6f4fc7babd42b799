//! sprintboard task command implementations.

use serde::Serialize;

use crate::cli::{label, load_context, parse_date, sprint, Context, GlobalArgs};
use crate::epic::{group_by_epic, EpicSummary};
use crate::error::{Error, Result};
use crate::filter::{filter_tasks, FilterSpec};
use crate::label::resolve_labels;
use crate::model::{IssueType, Label, LabelRef, NewTask, Priority, SprintStatus, Task, TaskPatch, TaskStatus};
use crate::output::{emit_success, HumanOutput};
use crate::task::group_by_status;

pub struct NewOptions {
    pub title: String,
    pub description: Option<String>,
    pub status: Option<String>,
    pub priority: Option<String>,
    pub issue_type: Option<String>,
    pub assignee: Option<String>,
    pub points: Option<u32>,
    pub due: Option<String>,
    pub labels: Vec<String>,
    pub epic: Option<String>,
    pub global: GlobalArgs,
}

pub struct ListOptions {
    pub search: Option<String>,
    pub statuses: Vec<String>,
    pub priorities: Vec<String>,
    pub types: Vec<String>,
    pub assignees: Vec<String>,
    pub labels: Vec<String>,
    pub sprint: Option<String>,
    pub global: GlobalArgs,
}

pub struct ShowOptions {
    pub id: String,
    pub global: GlobalArgs,
}

pub struct EditOptions {
    pub id: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub priority: Option<String>,
    pub issue_type: Option<String>,
    pub assignee: Option<String>,
    pub clear_assignee: bool,
    pub points: Option<u32>,
    pub due: Option<String>,
    pub clear_due: bool,
    pub labels: Vec<String>,
    pub clear_labels: bool,
    pub epic: Option<String>,
    pub clear_epic: bool,
    pub global: GlobalArgs,
}

pub struct RmOptions {
    pub id: String,
    pub global: GlobalArgs,
}

pub struct StatusOptions {
    pub id: String,
    pub status: String,
    pub global: GlobalArgs,
}

pub struct SprintOptions {
    pub id: String,
    pub sprint: String,
    pub global: GlobalArgs,
}

pub struct BacklogOptions {
    pub id: String,
    pub global: GlobalArgs,
}

pub struct ReorderOptions {
    pub ids: Vec<String>,
    pub global: GlobalArgs,
}

pub struct BoardOptions {
    pub sprint: Option<String>,
    pub global: GlobalArgs,
}

#[derive(Serialize)]
struct TaskView<'a> {
    #[serde(flatten)]
    task: &'a Task,
    #[serde(rename = "labelNames", skip_serializing_if = "Vec::is_empty")]
    label_names: Vec<&'a str>,
}

#[derive(Serialize)]
struct TaskListOutput<'a> {
    total: usize,
    tasks: Vec<TaskView<'a>>,
}

#[derive(Serialize)]
struct TaskDeletedOutput {
    id: String,
    deleted: bool,
}

#[derive(Serialize)]
struct ReorderOutput {
    updated: Vec<String>,
    skipped: Vec<String>,
}

#[derive(Serialize)]
struct BoardColumn<'a> {
    status: TaskStatus,
    tasks: Vec<TaskView<'a>>,
}

#[derive(Serialize)]
struct BoardOutput<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    sprint: Option<String>,
    columns: Vec<BoardColumn<'a>>,
}

#[derive(Serialize)]
struct EpicsOutput {
    total: usize,
    epics: Vec<EpicSummary>,
}

pub fn run_new(options: NewOptions) -> Result<()> {
    let ctx = load_context(&options.global)?;

    let mut new = NewTask::new(options.title);
    if let Some(description) = options.description {
        new = new.description(description);
    }
    if let Some(status) = options.status.as_deref() {
        new = new.status(status.parse::<TaskStatus>()?);
    }
    if let Some(priority) = options.priority.as_deref() {
        new = new.priority(priority.parse::<Priority>()?);
    }
    if let Some(issue_type) = options.issue_type.as_deref() {
        new = new.issue_type(issue_type.parse::<IssueType>()?);
    }
    if let Some(assignee) = options.assignee {
        new = new.assignee(assignee);
    }
    if let Some(points) = options.points {
        new = new.story_points(points);
    }
    if let Some(due) = options.due.as_deref() {
        new.due_date = Some(parse_date("due", due)?);
    }
    for id in label::resolve_label_ids(&ctx, &options.labels)? {
        new = new.label(id);
    }
    if let Some(epic) = options.epic.as_deref() {
        new = new.epic(resolve_epic(&ctx, epic)?.id);
    }

    let task = ctx.board.tasks().create_task(&ctx.project, new)?;

    let mut human = HumanOutput::new(format!("Task {} created", task.key));
    push_task_summary(&mut human, &task, &[]);
    human.push_next_step(format!("sprintboard task sprint {} <sprint>", task.key));

    emit_success(options.global.output(), "task new", &task, Some(&human))
}

pub fn run_list(options: ListOptions) -> Result<()> {
    let ctx = load_context(&options.global)?;
    let spec = FilterSpec {
        search: options.search.unwrap_or_default(),
        statuses: parse_all::<TaskStatus>(&options.statuses)?,
        priorities: parse_all::<Priority>(&options.priorities)?,
        types: parse_all::<IssueType>(&options.types)?,
        assignees: options
            .assignees
            .iter()
            .map(|a| a.trim().to_string())
            .filter(|a| !a.is_empty())
            .collect(),
        labels: label::resolve_label_ids(&ctx, &options.labels)?,
    };

    let tasks = match options.sprint.as_deref() {
        Some(target) => {
            let sprint_id = resolve_sprint_scope(&ctx, target)?;
            ctx.board
                .tasks()
                .tasks_by_sprint(&ctx.project, sprint_id.as_deref())?
        }
        None => ctx.board.tasks().get_tasks(&ctx.project)?,
    };
    let tasks = filter_tasks(&tasks, &spec);
    let labels = ctx.board.labels().get_labels(&ctx.project)?;

    let output = TaskListOutput {
        total: tasks.len(),
        tasks: tasks.iter().map(|task| task_view(task, &labels)).collect(),
    };

    let mut human = HumanOutput::new(format!("Tasks in {}", ctx.project));
    human.push_summary("Total", tasks.len().to_string());
    if spec.is_active() {
        human.push_summary("Filters", spec.active_count().to_string());
    }
    for task in &tasks {
        human.push_detail(task_line(task, &labels));
    }

    emit_success(options.global.output(), "task list", &output, Some(&human))
}

pub fn run_show(options: ShowOptions) -> Result<()> {
    let ctx = load_context(&options.global)?;
    let task = resolve_task(&ctx, &options.id)?;
    let labels = ctx.board.labels().get_labels(&ctx.project)?;

    let mut human = HumanOutput::new(format!("Task {}", display_key(&task)));
    push_task_summary(&mut human, &task, &labels);
    if !task.description.is_empty() {
        human.push_detail(task.description.clone());
    }

    emit_success(
        options.global.output(),
        "task show",
        &task_view(&task, &labels),
        Some(&human),
    )
}

pub fn run_edit(options: EditOptions) -> Result<()> {
    let ctx = load_context(&options.global)?;
    let task = resolve_task(&ctx, &options.id)?;

    let mut patch = TaskPatch {
        title: options.title,
        description: options.description,
        priority: options.priority.as_deref().map(str::parse).transpose()?,
        issue_type: match options.issue_type.as_deref() {
            Some(value) => Some(Some(value.parse::<IssueType>()?)),
            None => None,
        },
        story_points: options.points,
        ..TaskPatch::default()
    };
    if options.clear_assignee {
        patch.assignee = Some(None);
    } else if let Some(assignee) = options.assignee {
        patch.assignee = Some(Some(assignee));
    }
    if options.clear_due {
        patch.due_date = Some(None);
    } else if let Some(due) = options.due.as_deref() {
        patch.due_date = Some(Some(parse_date("due", due)?));
    }
    if options.clear_labels {
        patch.labels = Some(Vec::new());
    } else if !options.labels.is_empty() {
        let ids = label::resolve_label_ids(&ctx, &options.labels)?;
        patch.labels = Some(ids.into_iter().map(LabelRef::from).collect());
    }
    if options.clear_epic {
        patch.epic_id = Some(None);
    } else if let Some(epic) = options.epic.as_deref() {
        let epic = resolve_epic(&ctx, epic)?;
        if epic.id == task.id {
            return Err(Error::InvalidArgument(format!(
                "task {} cannot be its own epic",
                display_key(&task)
            )));
        }
        patch.epic_id = Some(Some(epic.id));
    }
    if patch.is_empty() {
        return Err(Error::InvalidArgument(
            "nothing to edit; pass at least one field flag".to_string(),
        ));
    }

    let task = ctx.board.tasks().update_task(&ctx.project, &task.id, patch)?;
    let labels = ctx.board.labels().get_labels(&ctx.project)?;

    let mut human = HumanOutput::new(format!("Task {} updated", display_key(&task)));
    push_task_summary(&mut human, &task, &labels);

    emit_success(options.global.output(), "task edit", &task, Some(&human))
}

pub fn run_rm(options: RmOptions) -> Result<()> {
    let ctx = load_context(&options.global)?;
    let tasks = ctx.board.tasks().get_tasks(&ctx.project)?;
    // Unknown ids still go through the store so removal stays idempotent.
    let (id, existed) = match find_task(&tasks, &options.id) {
        Some(task) => (task.id.clone(), true),
        None => (options.id.trim().to_string(), false),
    };
    ctx.board.tasks().delete_task(&ctx.project, &id)?;

    let header = if existed {
        format!("Task {} deleted", options.id)
    } else {
        format!("Task {} not present; nothing to delete", options.id)
    };
    let human = HumanOutput::new(header);
    let output = TaskDeletedOutput {
        id,
        deleted: existed,
    };
    emit_success(options.global.output(), "task rm", &output, Some(&human))
}

pub fn run_status(options: StatusOptions) -> Result<()> {
    let ctx = load_context(&options.global)?;
    let status: TaskStatus = options.status.parse()?;
    let task = resolve_task(&ctx, &options.id)?;
    let previous = task.status;
    let task = ctx
        .board
        .tasks()
        .move_task_to_status(&ctx.project, &task.id, status)?;

    let mut human = HumanOutput::new(format!("Task {} moved to {}", display_key(&task), task.status));
    human.push_summary("From", previous.to_string());
    human.push_summary("Order", task.order.to_string());

    emit_success(options.global.output(), "task status", &task, Some(&human))
}

pub fn run_sprint(options: SprintOptions) -> Result<()> {
    let ctx = load_context(&options.global)?;
    let task = resolve_task(&ctx, &options.id)?;
    let target = sprint::resolve_sprint(&ctx, &options.sprint)?;
    let task = ctx
        .board
        .tasks()
        .move_task_to_sprint(&ctx.project, &task.id, &target.id)?;

    let mut human = HumanOutput::new(format!("Task {} added to {}", display_key(&task), target.name));
    human.push_summary("Sprint", target.id.clone());
    human.push_summary("Status", task.status.to_string());
    if target.status == SprintStatus::Completed {
        human.push_warning(format!("sprint {} is already completed", target.name));
    }

    emit_success(options.global.output(), "task sprint", &task, Some(&human))
}

pub fn run_backlog(options: BacklogOptions) -> Result<()> {
    let ctx = load_context(&options.global)?;
    let task = resolve_task(&ctx, &options.id)?;
    let task = ctx
        .board
        .tasks()
        .move_task_to_backlog(&ctx.project, &task.id)?;

    let mut human = HumanOutput::new(format!("Task {} moved to backlog", display_key(&task)));
    human.push_summary("Status", task.status.to_string());

    emit_success(options.global.output(), "task backlog", &task, Some(&human))
}

pub fn run_reorder(options: ReorderOptions) -> Result<()> {
    let ctx = load_context(&options.global)?;
    let tasks = ctx.board.tasks().get_tasks(&ctx.project)?;

    let mut ids = Vec::with_capacity(options.ids.len());
    let mut skipped = Vec::new();
    for input in &options.ids {
        match find_task(&tasks, input) {
            Some(task) => ids.push(task.id.clone()),
            None => {
                skipped.push(input.clone());
                ids.push(input.clone());
            }
        }
    }

    let updated = ctx.board.tasks().reorder_tasks(&ctx.project, &ids)?;

    let mut human = HumanOutput::new("Tasks reordered");
    human.push_summary("Updated", updated.len().to_string());
    for input in &skipped {
        human.push_warning(format!("unknown task {input} skipped"));
    }

    let output = ReorderOutput {
        updated: updated.into_iter().map(|task| task.id).collect(),
        skipped,
    };
    emit_success(options.global.output(), "task reorder", &output, Some(&human))
}

pub fn run_board(options: BoardOptions) -> Result<()> {
    let ctx = load_context(&options.global)?;
    let (tasks, sprint_id) = match options.sprint.as_deref() {
        Some(target) => {
            let sprint_id = resolve_sprint_scope(&ctx, target)?;
            let tasks = ctx
                .board
                .tasks()
                .tasks_by_sprint(&ctx.project, sprint_id.as_deref())?;
            (tasks, sprint_id)
        }
        None => (ctx.board.tasks().get_tasks(&ctx.project)?, None),
    };
    let labels = ctx.board.labels().get_labels(&ctx.project)?;
    let columns = group_by_status(&tasks);

    let mut human = HumanOutput::new(format!("Board for {}", ctx.project));
    for (status, column) in &columns {
        human.push_summary(status.as_str(), column.len().to_string());
        for task in column {
            human.push_detail(format!("{status}: {}", task_line(task, &labels)));
        }
    }

    let output = BoardOutput {
        sprint: sprint_id,
        columns: columns
            .iter()
            .map(|(status, column)| BoardColumn {
                status: *status,
                tasks: column.iter().map(|task| task_view(task, &labels)).collect(),
            })
            .collect(),
    };
    emit_success(options.global.output(), "task board", &output, Some(&human))
}

pub fn run_epics(global: GlobalArgs) -> Result<()> {
    let ctx = load_context(&global)?;
    let tasks = ctx.board.tasks().get_tasks(&ctx.project)?;
    let epics = group_by_epic(&tasks);

    let mut human = HumanOutput::new(format!("Epics in {}", ctx.project));
    human.push_summary("Total", epics.len().to_string());
    for epic in &epics {
        let key = if epic.key.is_empty() { &epic.id } else { &epic.key };
        human.push_detail(format!(
            "{key} {} {}/{} done ({:.0}%), {}/{} pts",
            epic.title,
            epic.resolved(),
            epic.issues.len(),
            epic.progress,
            epic.completed_points,
            epic.total_points
        ));
    }
    if epics.is_empty() {
        human.push_next_step("sprintboard task new <title> --type epic");
    }

    let output = EpicsOutput {
        total: epics.len(),
        epics,
    };
    emit_success(global.output(), "task epics", &output, Some(&human))
}

/// Resolve `input` to a task whose type is epic.
fn resolve_epic(ctx: &Context, input: &str) -> Result<Task> {
    let task = resolve_task(ctx, input)?;
    if task.issue_type != Some(IssueType::Epic) {
        return Err(Error::InvalidArgument(format!(
            "{} is not an epic",
            display_key(&task)
        )));
    }
    Ok(task)
}

/// Find a task by id or, case-insensitively, by key.
pub(crate) fn resolve_task(ctx: &Context, input: &str) -> Result<Task> {
    let tasks = ctx.board.tasks().get_tasks(&ctx.project)?;
    find_task(&tasks, input)
        .cloned()
        .ok_or_else(|| Error::not_found("Task", input.trim()))
}

fn find_task<'a>(tasks: &'a [Task], input: &str) -> Option<&'a Task> {
    let input = input.trim();
    tasks.iter().find(|task| task.id == input).or_else(|| {
        tasks
            .iter()
            .find(|task| !task.key.is_empty() && task.key.eq_ignore_ascii_case(input))
    })
}

/// `backlog` selects tasks without a sprint; anything else names a sprint.
fn resolve_sprint_scope(ctx: &Context, target: &str) -> Result<Option<String>> {
    if target.trim().eq_ignore_ascii_case("backlog") {
        return Ok(None);
    }
    Ok(Some(sprint::resolve_sprint(ctx, target)?.id))
}

fn parse_all<T>(values: &[String]) -> Result<Vec<T>>
where
    T: std::str::FromStr<Err = Error> + PartialEq,
{
    let mut parsed = Vec::new();
    for value in values.iter().filter(|v| !v.trim().is_empty()) {
        let item = value.parse::<T>()?;
        if !parsed.contains(&item) {
            parsed.push(item);
        }
    }
    Ok(parsed)
}

fn task_view<'a>(task: &'a Task, labels: &'a [Label]) -> TaskView<'a> {
    TaskView {
        task,
        label_names: resolve_labels(labels, task)
            .into_iter()
            .map(|label| label.name.as_str())
            .collect(),
    }
}

fn display_key(task: &Task) -> &str {
    if task.key.is_empty() {
        &task.id
    } else {
        &task.key
    }
}

fn task_line(task: &Task, labels: &[Label]) -> String {
    let mut line = format!(
        "{} [{}][{}] {}",
        display_key(task),
        task.status,
        task.priority,
        task.title
    );
    if let Some(assignee) = &task.assignee {
        line.push_str(&format!(" @{assignee}"));
    }
    if task.story_points > 0 {
        line.push_str(&format!(" ({} pts)", task.story_points));
    }
    let names: Vec<&str> = resolve_labels(labels, task)
        .into_iter()
        .map(|label| label.name.as_str())
        .collect();
    if !names.is_empty() {
        line.push_str(&format!(" #{}", names.join(" #")));
    }
    line
}

fn push_task_summary(human: &mut HumanOutput, task: &Task, labels: &[Label]) {
    human.push_summary("ID", task.id.clone());
    human.push_summary("Title", task.title.clone());
    human.push_summary("Status", task.status.to_string());
    human.push_summary("Priority", task.priority.to_string());
    if let Some(issue_type) = task.issue_type {
        human.push_summary("Type", issue_type.to_string());
    }
    if let Some(assignee) = &task.assignee {
        human.push_summary("Assignee", assignee.clone());
    }
    if task.story_points > 0 {
        human.push_summary("Points", task.story_points.to_string());
    }
    if let Some(due) = task.due_date {
        human.push_summary("Due", due.to_string());
    }
    if let Some(epic) = &task.epic_id {
        human.push_summary("Epic", epic.clone());
    }
    human.push_summary(
        "Sprint",
        task.sprint_id.clone().unwrap_or_else(|| "backlog".to_string()),
    );
    let names: Vec<&str> = resolve_labels(labels, task)
        .into_iter()
        .map(|label| label.name.as_str())
        .collect();
    if !names.is_empty() {
        human.push_summary("Labels", names.join(", "));
    }
}
