//! Project-scoped label registry.

use std::sync::Arc;

use chrono::Utc;

use crate::config::{is_hex_color, DEFAULT_LABEL_COLORS};
use crate::error::{Error, Result};
use crate::model::{new_id, Label, LabelPatch, NewLabel, Task, LABEL_ID_PREFIX};
use crate::repository::Repository;

pub struct LabelRegistry {
    labels: Arc<dyn Repository<Label>>,
    tasks: Arc<dyn Repository<Task>>,
    palette: Vec<String>,
}

impl LabelRegistry {
    pub fn new(labels: Arc<dyn Repository<Label>>, tasks: Arc<dyn Repository<Task>>) -> Self {
        Self::with_palette(
            labels,
            tasks,
            DEFAULT_LABEL_COLORS.iter().map(|c| c.to_string()).collect(),
        )
    }

    /// An empty palette falls back to the default colors.
    pub fn with_palette(
        labels: Arc<dyn Repository<Label>>,
        tasks: Arc<dyn Repository<Task>>,
        palette: Vec<String>,
    ) -> Self {
        let palette = if palette.is_empty() {
            DEFAULT_LABEL_COLORS.iter().map(|c| c.to_string()).collect()
        } else {
            palette
        };
        Self {
            labels,
            tasks,
            palette,
        }
    }

    /// Create a label. Without a color, the palette is cycled by the number
    /// of labels the project already has.
    pub fn create_label(&self, project_id: &str, new: NewLabel) -> Result<Label> {
        if project_id.trim().is_empty() {
            return Err(Error::Validation("project id cannot be empty".to_string()));
        }
        let name = validate_name(&new.name)?;
        let color = new.color.as_deref().map(validate_color).transpose()?;
        let draft = Label {
            id: new_id(LABEL_ID_PREFIX),
            project_id: project_id.to_string(),
            name,
            color: color.clone().unwrap_or_default(),
            description: clean_description(new.description),
        };

        let label = self.labels.create_with(project_id, &mut |existing| {
            let mut label = draft.clone();
            if color.is_none() {
                label.color = self.palette[existing.len() % self.palette.len()].clone();
            }
            Ok(label)
        })?;
        tracing::debug!(project = project_id, label = %label.id, color = %label.color, "label created");
        Ok(label)
    }

    pub fn get_labels(&self, project_id: &str) -> Result<Vec<Label>> {
        self.labels.list(project_id)
    }

    pub fn get_label(&self, project_id: &str, label_id: &str) -> Result<Label> {
        self.labels
            .get(project_id, label_id)?
            .ok_or_else(|| Error::not_found("Label", label_id))
    }

    pub fn update_label(&self, project_id: &str, label_id: &str, patch: LabelPatch) -> Result<Label> {
        let name = patch.name.as_deref().map(validate_name).transpose()?;
        let color = patch.color.as_deref().map(validate_color).transpose()?;

        let mut label = self.get_label(project_id, label_id)?;
        if let Some(name) = name {
            label.name = name;
        }
        if let Some(color) = color {
            label.color = color;
        }
        if let Some(description) = patch.description {
            label.description = clean_description(description);
        }
        self.labels.update(label)
    }

    /// Remove a label and strip it from every task of the project.
    /// Unknown ids succeed without doing anything.
    pub fn delete_label(&self, project_id: &str, label_id: &str) -> Result<()> {
        let now = Utc::now();
        let mut stripped = 0usize;
        for mut task in self.tasks.list(project_id)? {
            if !task.has_label(label_id) {
                continue;
            }
            task.labels.retain(|id| id != label_id);
            task.updated_at = now;
            self.tasks.update(task)?;
            stripped += 1;
        }
        self.labels.delete(project_id, label_id)?;
        tracing::debug!(project = project_id, label = label_id, stripped, "label deleted");
        Ok(())
    }
}

/// Labels of `task` in the task's own order; ids with no matching label
/// are skipped.
pub fn resolve_labels<'a>(labels: &'a [Label], task: &Task) -> Vec<&'a Label> {
    task.labels
        .iter()
        .filter_map(|id| labels.iter().find(|label| &label.id == id))
        .collect()
}

fn validate_name(name: &str) -> Result<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(Error::Validation("label name cannot be empty".to_string()));
    }
    Ok(trimmed.to_string())
}

fn clean_description(description: Option<String>) -> Option<String> {
    description
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty())
}

fn validate_color(color: &str) -> Result<String> {
    let trimmed = color.trim();
    if !is_hex_color(trimmed) {
        return Err(Error::Validation(format!(
            "label color '{color}' is not a hex color like #3b82f6"
        )));
    }
    Ok(trimmed.to_lowercase())
}
