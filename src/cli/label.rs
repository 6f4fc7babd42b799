//! sprintboard label command implementations.

use serde::Serialize;

use crate::cli::{load_context, Context, GlobalArgs};
use crate::error::{Error, Result};
use crate::model::{Label, LabelPatch, NewLabel};
use crate::output::{emit_success, HumanOutput};

pub struct NewOptions {
    pub name: String,
    pub color: Option<String>,
    pub description: Option<String>,
    pub global: GlobalArgs,
}

pub struct EditOptions {
    pub id: String,
    pub name: Option<String>,
    pub color: Option<String>,
    pub description: Option<String>,
    pub global: GlobalArgs,
}

pub struct RmOptions {
    pub id: String,
    pub global: GlobalArgs,
}

#[derive(Serialize)]
struct LabelListOutput {
    total: usize,
    labels: Vec<Label>,
}

#[derive(Serialize)]
struct LabelDeletedOutput {
    id: String,
    deleted: bool,
}

pub fn run_new(options: NewOptions) -> Result<()> {
    let ctx = load_context(&options.global)?;
    let mut new = NewLabel::new(options.name);
    if let Some(color) = options.color {
        new = new.color(color);
    }
    if let Some(description) = options.description {
        new = new.description(description);
    }
    let label = ctx.board.labels().create_label(&ctx.project, new)?;

    let mut human = HumanOutput::new(format!("Label {} created", label.name));
    human.push_summary("ID", label.id.clone());
    human.push_summary("Color", label.color.clone());

    emit_success(options.global.output(), "label new", &label, Some(&human))
}

pub fn run_list(global: GlobalArgs) -> Result<()> {
    let ctx = load_context(&global)?;
    let labels = ctx.board.labels().get_labels(&ctx.project)?;

    let mut human = HumanOutput::new(format!("Labels in {}", ctx.project));
    human.push_summary("Total", labels.len().to_string());
    for label in &labels {
        let mut line = format!("{} {} {}", label.color, label.id, label.name);
        if let Some(description) = &label.description {
            line.push_str(&format!(" - {description}"));
        }
        human.push_detail(line);
    }

    let output = LabelListOutput {
        total: labels.len(),
        labels,
    };
    emit_success(global.output(), "label list", &output, Some(&human))
}

pub fn run_edit(options: EditOptions) -> Result<()> {
    let ctx = load_context(&options.global)?;
    let target = resolve_label(&ctx, &options.id)?;
    let patch = LabelPatch {
        name: options.name,
        color: options.color,
        description: options.description.map(Some),
    };
    if patch.name.is_none() && patch.color.is_none() && patch.description.is_none() {
        return Err(Error::InvalidArgument(
            "nothing to edit; pass at least one field flag".to_string(),
        ));
    }
    let label = ctx
        .board
        .labels()
        .update_label(&ctx.project, &target.id, patch)?;

    let mut human = HumanOutput::new(format!("Label {} updated", label.name));
    human.push_summary("ID", label.id.clone());
    human.push_summary("Color", label.color.clone());

    emit_success(options.global.output(), "label edit", &label, Some(&human))
}

pub fn run_rm(options: RmOptions) -> Result<()> {
    let ctx = load_context(&options.global)?;
    let (id, existed) = match resolve_label(&ctx, &options.id) {
        Ok(label) => (label.id, true),
        Err(Error::NotFound { .. }) => (options.id.trim().to_string(), false),
        Err(err) => return Err(err),
    };
    ctx.board.labels().delete_label(&ctx.project, &id)?;

    let header = if existed {
        format!("Label {} deleted", options.id)
    } else {
        format!("Label {} not present; nothing to delete", options.id)
    };
    let output = LabelDeletedOutput {
        id,
        deleted: existed,
    };
    emit_success(
        options.global.output(),
        "label rm",
        &output,
        Some(&HumanOutput::new(header)),
    )
}

fn resolve_label(ctx: &Context, input: &str) -> Result<Label> {
    let labels = ctx.board.labels().get_labels(&ctx.project)?;
    find_label(&labels, input)
        .cloned()
        .ok_or_else(|| Error::not_found("Label", input.trim()))
}

/// Map label ids or names to ids, failing on the first unknown one.
pub(crate) fn resolve_label_ids(ctx: &Context, inputs: &[String]) -> Result<Vec<String>> {
    if inputs.iter().all(|input| input.trim().is_empty()) {
        return Ok(Vec::new());
    }
    let labels = ctx.board.labels().get_labels(&ctx.project)?;
    let mut ids = Vec::new();
    for input in inputs.iter().filter(|input| !input.trim().is_empty()) {
        let label = find_label(&labels, input)
            .ok_or_else(|| Error::not_found("Label", input.trim()))?;
        if !ids.contains(&label.id) {
            ids.push(label.id.clone());
        }
    }
    Ok(ids)
}

fn find_label<'a>(labels: &'a [Label], input: &str) -> Option<&'a Label> {
    let input = input.trim();
    labels
        .iter()
        .find(|label| label.id == input)
        .or_else(|| labels.iter().find(|label| label.name.eq_ignore_ascii_case(input)))
}
