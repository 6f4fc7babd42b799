//! sprintboard projects command.

use std::path::PathBuf;

use serde::Serialize;

use crate::cli::{load_context, GlobalArgs};
use crate::error::Result;
use crate::output::{emit_success, HumanOutput};

#[derive(Serialize)]
struct ProjectListOutput {
    root: PathBuf,
    current: String,
    projects: Vec<String>,
}

pub fn run_list(global: GlobalArgs) -> Result<()> {
    let ctx = load_context(&global)?;
    let projects = ctx.board.projects()?;

    let mut human = HumanOutput::new("Projects");
    human.push_summary("Root", ctx.root.display().to_string());
    human.push_summary("Current", ctx.project.clone());
    for project in &projects {
        if *project == ctx.project {
            human.push_detail(format!("{project} (current)"));
        } else {
            human.push_detail(project.clone());
        }
    }
    if projects.is_empty() {
        human.push_next_step("sprintboard task new <title>");
    }

    let output = ProjectListOutput {
        root: ctx.root,
        current: ctx.project,
        projects,
    };
    emit_success(global.output(), "projects", &output, Some(&human))
}
