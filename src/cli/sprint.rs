//! sprintboard sprint command implementations.

use chrono::Local;
use serde::Serialize;

use crate::cli::{load_context, parse_date, Context, GlobalArgs};
use crate::error::{Error, Result};
use crate::model::{NewSprint, Sprint, SprintPatch, Task};
use crate::output::{emit_success, HumanOutput};
use crate::sprint::{days_remaining, SprintStats};

pub struct NewOptions {
    pub name: String,
    pub goal: Option<String>,
    pub start: Option<String>,
    pub end: Option<String>,
    pub global: GlobalArgs,
}

pub struct TargetOptions {
    pub id: String,
    pub global: GlobalArgs,
}

pub struct EditOptions {
    pub id: String,
    pub name: Option<String>,
    pub goal: Option<String>,
    pub clear_goal: bool,
    pub start: Option<String>,
    pub end: Option<String>,
    pub global: GlobalArgs,
}

#[derive(Serialize)]
struct SprintListOutput {
    total: usize,
    sprints: Vec<Sprint>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SprintDetails {
    #[serde(flatten)]
    sprint: Sprint,
    stats: SprintStats,
    #[serde(skip_serializing_if = "Option::is_none")]
    days_remaining: Option<i64>,
    tasks: Vec<Task>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SprintStatsOutput {
    sprint: String,
    #[serde(flatten)]
    stats: SprintStats,
    #[serde(skip_serializing_if = "Option::is_none")]
    days_remaining: Option<i64>,
    velocity: f64,
}

#[derive(Serialize)]
struct ActiveSprintOutput {
    active: Option<Sprint>,
}

#[derive(Serialize)]
struct SprintDeletedOutput {
    id: String,
    deleted: bool,
}

pub fn run_new(options: NewOptions) -> Result<()> {
    let ctx = load_context(&options.global)?;
    let new = NewSprint {
        name: options.name,
        goal: options.goal,
        start_date: options.start.as_deref().map(|v| parse_date("start", v)).transpose()?,
        end_date: options.end.as_deref().map(|v| parse_date("end", v)).transpose()?,
    };
    let sprint = ctx.board.sprints().create_sprint(&ctx.project, new)?;

    let mut human = HumanOutput::new(format!("Sprint {} created", sprint.name));
    push_sprint_summary(&mut human, &sprint);
    human.push_next_step(format!("sprintboard task sprint <task> {}", sprint.id));
    human.push_next_step(format!("sprintboard sprint start {}", sprint.id));

    emit_success(options.global.output(), "sprint new", &sprint, Some(&human))
}

pub fn run_list(global: GlobalArgs) -> Result<()> {
    let ctx = load_context(&global)?;
    let sprints = ctx.board.sprints().get_sprints(&ctx.project)?;

    let mut human = HumanOutput::new(format!("Sprints in {}", ctx.project));
    human.push_summary("Total", sprints.len().to_string());
    for sprint in &sprints {
        let mut line = format!("[{}] {} {}", sprint.status, sprint.id, sprint.name);
        if let (Some(start), Some(end)) = (sprint.start_date, sprint.end_date) {
            line.push_str(&format!(" ({start} .. {end})"));
        }
        human.push_detail(line);
    }

    let output = SprintListOutput {
        total: sprints.len(),
        sprints,
    };
    emit_success(global.output(), "sprint list", &output, Some(&human))
}

pub fn run_show(options: TargetOptions) -> Result<()> {
    let ctx = load_context(&options.global)?;
    let sprint = resolve_sprint(&ctx, &options.id)?;
    let tasks = ctx
        .board
        .tasks()
        .tasks_by_sprint(&ctx.project, Some(&sprint.id))?;
    let stats = SprintStats::from_tasks(&tasks);
    let remaining = days_remaining(&sprint, Local::now().date_naive());

    let mut human = HumanOutput::new(format!("Sprint {}", sprint.name));
    push_sprint_summary(&mut human, &sprint);
    push_stats_summary(&mut human, &stats, remaining);
    for task in &tasks {
        let key = if task.key.is_empty() { &task.id } else { &task.key };
        human.push_detail(format!("{key} [{}] {}", task.status, task.title));
    }

    let details = SprintDetails {
        sprint,
        stats,
        days_remaining: remaining,
        tasks,
    };
    emit_success(options.global.output(), "sprint show", &details, Some(&human))
}

pub fn run_start(options: TargetOptions) -> Result<()> {
    let ctx = load_context(&options.global)?;
    let target = resolve_sprint(&ctx, &options.id)?;

    let mut human = HumanOutput::new(format!("Sprint {} started", target.name));
    if let Some(active) = ctx.board.sprints().get_active_sprint(&ctx.project)? {
        if active.id != target.id {
            human.push_warning(format!("sprint {} is also active", active.name));
        }
    }
    let stats = ctx.board.sprints().sprint_stats(&ctx.project, &target.id)?;
    if stats.total == 0 {
        human.push_warning("sprint has no tasks");
    }

    let sprint = ctx.board.sprints().start_sprint(&ctx.project, &target.id)?;
    push_sprint_summary(&mut human, &sprint);
    human.push_next_step(format!("sprintboard sprint complete {}", sprint.id));

    emit_success(options.global.output(), "sprint start", &sprint, Some(&human))
}

pub fn run_complete(options: TargetOptions) -> Result<()> {
    let ctx = load_context(&options.global)?;
    let target = resolve_sprint(&ctx, &options.id)?;
    let sprint = ctx
        .board
        .sprints()
        .complete_sprint(&ctx.project, &target.id)?;
    let stats = ctx.board.sprints().sprint_stats(&ctx.project, &sprint.id)?;

    let mut human = HumanOutput::new(format!("Sprint {} completed", sprint.name));
    push_sprint_summary(&mut human, &sprint);
    push_stats_summary(&mut human, &stats, None);
    let unfinished = stats.total - stats.completed;
    if unfinished > 0 {
        human.push_warning(format!("{unfinished} task(s) not done"));
        human.push_next_step("sprintboard task backlog <task>");
    }

    emit_success(options.global.output(), "sprint complete", &sprint, Some(&human))
}

pub fn run_edit(options: EditOptions) -> Result<()> {
    let ctx = load_context(&options.global)?;
    let target = resolve_sprint(&ctx, &options.id)?;

    let goal = if options.clear_goal {
        Some(None)
    } else {
        options.goal.map(Some)
    };
    let patch = SprintPatch {
        name: options.name,
        goal,
        start_date: match options.start.as_deref() {
            Some(value) => Some(Some(parse_date("start", value)?)),
            None => None,
        },
        end_date: match options.end.as_deref() {
            Some(value) => Some(Some(parse_date("end", value)?)),
            None => None,
        },
    };
    if patch.name.is_none()
        && patch.goal.is_none()
        && patch.start_date.is_none()
        && patch.end_date.is_none()
    {
        return Err(Error::InvalidArgument(
            "nothing to edit; pass at least one field flag".to_string(),
        ));
    }

    let sprint = ctx
        .board
        .sprints()
        .update_sprint(&ctx.project, &target.id, patch)?;

    let mut human = HumanOutput::new(format!("Sprint {} updated", sprint.name));
    push_sprint_summary(&mut human, &sprint);

    emit_success(options.global.output(), "sprint edit", &sprint, Some(&human))
}

pub fn run_rm(options: TargetOptions) -> Result<()> {
    let ctx = load_context(&options.global)?;
    let (id, existed) = match resolve_sprint(&ctx, &options.id) {
        Ok(sprint) => (sprint.id, true),
        Err(Error::NotFound { .. }) => (options.id.trim().to_string(), false),
        Err(err) => return Err(err),
    };
    ctx.board.sprints().delete_sprint(&ctx.project, &id)?;

    let header = if existed {
        format!("Sprint {} deleted", options.id)
    } else {
        format!("Sprint {} not present; nothing to delete", options.id)
    };
    let human = HumanOutput::new(header);
    let output = SprintDeletedOutput {
        id,
        deleted: existed,
    };
    emit_success(options.global.output(), "sprint rm", &output, Some(&human))
}

pub fn run_active(global: GlobalArgs) -> Result<()> {
    let ctx = load_context(&global)?;
    let active = ctx.board.sprints().get_active_sprint(&ctx.project)?;

    let mut human = match &active {
        Some(sprint) => {
            let mut human = HumanOutput::new(format!("Active sprint: {}", sprint.name));
            push_sprint_summary(&mut human, sprint);
            human
        }
        None => {
            let mut human = HumanOutput::new("No active sprint");
            human.push_next_step("sprintboard sprint start <sprint>");
            human
        }
    };
    let actives = ctx
        .board
        .sprints()
        .get_sprints(&ctx.project)?
        .into_iter()
        .filter(|sprint| sprint.status == crate::model::SprintStatus::Active)
        .count();
    if actives > 1 {
        human.push_warning(format!("{actives} sprints are active"));
    }

    let output = ActiveSprintOutput { active };
    emit_success(global.output(), "sprint active", &output, Some(&human))
}

pub fn run_stats(options: TargetOptions) -> Result<()> {
    let ctx = load_context(&options.global)?;
    let sprint = resolve_sprint(&ctx, &options.id)?;
    let stats = ctx.board.sprints().sprint_stats(&ctx.project, &sprint.id)?;
    let velocity = ctx.board.sprints().velocity(&ctx.project)?;
    let remaining = days_remaining(&sprint, Local::now().date_naive());

    let mut human = HumanOutput::new(format!("Sprint {} stats", sprint.name));
    push_stats_summary(&mut human, &stats, remaining);
    human.push_summary("Velocity", format!("{velocity:.1} pts/sprint"));

    let output = SprintStatsOutput {
        sprint: sprint.id,
        stats,
        days_remaining: remaining,
        velocity,
    };
    emit_success(options.global.output(), "sprint stats", &output, Some(&human))
}

/// Find a sprint by id or by case-insensitive name.
///
/// A name shared by several sprints is rejected as ambiguous.
pub(crate) fn resolve_sprint(ctx: &Context, input: &str) -> Result<Sprint> {
    let sprints = ctx.board.sprints().get_sprints(&ctx.project)?;
    find_sprint(sprints, input)
}

fn find_sprint(sprints: Vec<Sprint>, input: &str) -> Result<Sprint> {
    let input = input.trim();
    if let Some(sprint) = sprints.iter().find(|sprint| sprint.id == input) {
        return Ok(sprint.clone());
    }
    let mut named: Vec<Sprint> = sprints
        .into_iter()
        .filter(|sprint| sprint.name.eq_ignore_ascii_case(input))
        .collect();
    match named.len() {
        0 => Err(Error::not_found("Sprint", input)),
        1 => Ok(named.remove(0)),
        n => Err(Error::InvalidArgument(format!(
            "sprint name '{input}' matches {n} sprints; use the sprint id"
        ))),
    }
}

fn push_sprint_summary(human: &mut HumanOutput, sprint: &Sprint) {
    human.push_summary("ID", sprint.id.clone());
    human.push_summary("Status", sprint.status.to_string());
    if let Some(goal) = &sprint.goal {
        human.push_summary("Goal", goal.clone());
    }
    if let Some(start) = sprint.start_date {
        human.push_summary("Start", start.to_string());
    }
    if let Some(end) = sprint.end_date {
        human.push_summary("End", end.to_string());
    }
}

fn push_stats_summary(human: &mut HumanOutput, stats: &SprintStats, remaining: Option<i64>) {
    human.push_summary("Tasks", format!("{}/{} done", stats.completed, stats.total));
    human.push_summary(
        "Points",
        format!("{}/{}", stats.completed_points, stats.total_points),
    );
    human.push_summary("Completion", format!("{:.0}%", stats.completion_rate));
    if stats.closed > 0 {
        human.push_summary("Closed", stats.closed.to_string());
    }
    human.push_summary(
        "Points resolved",
        format!("{:.0}%", stats.points_completion_rate),
    );
    if let Some(days) = remaining {
        human.push_summary("Days remaining", days.to_string());
    }
}
