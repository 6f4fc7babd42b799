//! sprintboard init command implementation
//!
//! Creates the `.sprintboard/` data directory and a default config at the
//! board root. Existing files are left alone.

use std::path::{Path, PathBuf};

use crate::cli::GlobalArgs;
use crate::config::{Config, CONFIG_FILE};
use crate::error::{Error, Result};
use crate::output::{emit_success, HumanOutput};
use crate::storage::{Storage, DATA_DIR};

#[derive(serde::Serialize)]
struct InitReport {
    root: PathBuf,
    project: String,
    created: InitCreated,
}

#[derive(serde::Serialize)]
struct InitCreated {
    config: bool,
    data_dir: bool,
}

pub fn run(global: GlobalArgs) -> Result<()> {
    let root = global.root()?;
    std::fs::create_dir_all(&root)?;

    let storage = Storage::new(&root);
    let created_data_dir = ensure_dir(&storage.data_dir())?;
    let created_config = ensure_config(&root, global.project.as_deref())?;
    let project = Config::load_from_root(&root).default_project;

    let report = InitReport {
        root: root.clone(),
        project: project.clone(),
        created: InitCreated {
            config: created_config,
            data_dir: created_data_dir,
        },
    };

    let mut created_items = Vec::new();
    if created_config {
        created_items.push(CONFIG_FILE.to_string());
    }
    if created_data_dir {
        created_items.push(format!("{DATA_DIR}/"));
    }

    let header = if created_items.is_empty() {
        "sprintboard init: nothing to do".to_string()
    } else {
        "sprintboard init: initialized board".to_string()
    };

    let mut human = HumanOutput::new(header);
    human.push_summary("root", root.display().to_string());
    human.push_summary("project", project);
    human.push_summary(
        "created",
        if created_items.is_empty() {
            "none".to_string()
        } else {
            created_items.join(", ")
        },
    );
    human.push_next_step("sprintboard task new <title>");
    human.push_next_step("sprintboard sprint new <name>");

    emit_success(global.output(), "init", &report, Some(&human))
}

fn ensure_config(root: &Path, project: Option<&str>) -> Result<bool> {
    let config_path = root.join(CONFIG_FILE);
    if config_path.exists() {
        if !config_path.is_file() {
            return Err(Error::Storage(format!(
                "{CONFIG_FILE} exists but is not a file: {}",
                config_path.display()
            )));
        }
        return Ok(false);
    }

    let mut config = Config::default();
    if let Some(project) = project.map(str::trim).filter(|p| !p.is_empty()) {
        config.default_project = project.to_string();
    }
    config.save(&config_path)?;
    Ok(true)
}

fn ensure_dir(path: &Path) -> Result<bool> {
    if path.exists() {
        if !path.is_dir() {
            return Err(Error::Storage(format!(
                "Expected directory at {}",
                path.display()
            )));
        }
        return Ok(false);
    }

    std::fs::create_dir_all(path)?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ensure_config_writes_project_once() {
        let dir = tempfile::tempdir().expect("tempdir");
        assert!(ensure_config(dir.path(), Some("web")).expect("create"));
        assert!(!ensure_config(dir.path(), Some("api")).expect("exists"));

        let config = Config::load(&dir.path().join(CONFIG_FILE)).expect("load");
        assert_eq!(config.default_project, "web");
    }

    #[test]
    fn ensure_dir_rejects_files() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(DATA_DIR);
        std::fs::write(&path, "").expect("write");
        assert!(matches!(ensure_dir(&path), Err(Error::Storage(_))));
    }
}
