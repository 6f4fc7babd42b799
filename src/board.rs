//! Board facade wiring the task store, sprint manager and label registry
//! to one set of repositories.

use std::path::Path;
use std::sync::Arc;

use crate::config::Config;
use crate::error::Result;
use crate::label::LabelRegistry;
use crate::model::{Label, Sprint, Task};
use crate::repository::{MemoryRepository, Repository};
use crate::sprint::SprintManager;
use crate::storage::{FileRepository, Storage};
use crate::task::TaskStore;

pub struct Board {
    config: Config,
    storage: Option<Storage>,
    tasks: TaskStore,
    sprints: SprintManager,
    labels: LabelRegistry,
}

impl Board {
    /// Open the file-backed board under `root`.
    ///
    /// The data directory is not created here; see [`Storage::init`].
    pub fn open(root: &Path, config: Config) -> Self {
        let storage = Storage::new(root).with_lock_timeout(config.storage.lock_timeout_ms);
        let tasks: Arc<dyn Repository<Task>> = Arc::new(FileRepository::<Task>::new(storage.clone()));
        let sprints: Arc<dyn Repository<Sprint>> = Arc::new(FileRepository::<Sprint>::new(storage.clone()));
        let labels: Arc<dyn Repository<Label>> = Arc::new(FileRepository::<Label>::new(storage.clone()));
        tracing::debug!(root = %root.display(), "opened board");
        Self::from_repositories(config, Some(storage), tasks, sprints, labels)
    }

    pub fn in_memory(config: Config) -> Self {
        Self::from_repositories(
            config,
            None,
            Arc::new(MemoryRepository::<Task>::new()),
            Arc::new(MemoryRepository::<Sprint>::new()),
            Arc::new(MemoryRepository::<Label>::new()),
        )
    }

    /// Build a board over caller-supplied repositories.
    pub fn from_repositories(
        config: Config,
        storage: Option<Storage>,
        tasks: Arc<dyn Repository<Task>>,
        sprints: Arc<dyn Repository<Sprint>>,
        labels: Arc<dyn Repository<Label>>,
    ) -> Self {
        Self {
            tasks: TaskStore::new(tasks.clone(), sprints.clone(), config.tasks.clone()),
            sprints: SprintManager::new(sprints, tasks.clone()),
            labels: LabelRegistry::with_palette(labels, tasks, config.labels.palette.clone()),
            storage,
            config,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn storage(&self) -> Option<&Storage> {
        self.storage.as_ref()
    }

    pub fn tasks(&self) -> &TaskStore {
        &self.tasks
    }

    pub fn sprints(&self) -> &SprintManager {
        &self.sprints
    }

    pub fn labels(&self) -> &LabelRegistry {
        &self.labels
    }

    /// Projects with stored data. Always empty for an in-memory board.
    pub fn projects(&self) -> Result<Vec<String>> {
        match &self.storage {
            Some(storage) => storage.list_projects(),
            None => Ok(Vec::new()),
        }
    }
}
