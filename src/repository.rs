//! Persistence adapter contract.
//!
//! Every component talks to storage through [`Repository`], keyed by
//! project. Writes replace whole records by id; there is no versioning, so
//! the last writer wins.

use std::collections::HashMap;
use std::fmt;
use std::sync::Mutex;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{Error, Result};
use crate::model::{Label, Sprint, Task};

/// Kind of record a repository holds; also the storage key prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Task,
    Sprint,
    Label,
}

impl EntityKind {
    /// Collection name used for storage keys (`tasks_<project>`).
    pub fn collection(&self) -> &'static str {
        match self {
            EntityKind::Task => "tasks",
            EntityKind::Sprint => "sprints",
            EntityKind::Label => "labels",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            EntityKind::Task => "Task",
            EntityKind::Sprint => "Sprint",
            EntityKind::Label => "Label",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A project-scoped record with a stable id
pub trait Entity: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {
    const KIND: EntityKind;

    fn id(&self) -> &str;
    fn project_id(&self) -> &str;
}

impl Entity for Task {
    const KIND: EntityKind = EntityKind::Task;

    fn id(&self) -> &str {
        &self.id
    }

    fn project_id(&self) -> &str {
        &self.project_id
    }
}

impl Entity for Sprint {
    const KIND: EntityKind = EntityKind::Sprint;

    fn id(&self) -> &str {
        &self.id
    }

    fn project_id(&self) -> &str {
        &self.project_id
    }
}

impl Entity for Label {
    const KIND: EntityKind = EntityKind::Label;

    fn id(&self) -> &str {
        &self.id
    }

    fn project_id(&self) -> &str {
        &self.project_id
    }
}

/// Storage backend for one kind of entity.
///
/// Implementations report backend failures as storage errors and never
/// retry on their own.
pub trait Repository<E: Entity>: Send + Sync {
    /// All records of a project, in persisted order.
    fn list(&self, project_id: &str) -> Result<Vec<E>>;

    /// Persist a new record and return it as stored.
    fn create(&self, entity: E) -> Result<E>;

    /// Build a new record from the project's current records and persist it
    /// in one step.
    ///
    /// No other write to the project lands between the read handed to
    /// `build` and the insert, so values derived from existing records
    /// (keys, column order, palette slots) stay unique.
    fn create_with(&self, project_id: &str, build: &mut dyn FnMut(&[E]) -> Result<E>) -> Result<E>;

    /// Replace the stored record with the same id.
    ///
    /// Fails with `NotFound` when the id is unknown in the record's project.
    fn update(&self, entity: E) -> Result<E>;

    /// Remove a record. Unknown ids are not an error.
    fn delete(&self, project_id: &str, id: &str) -> Result<()>;

    /// Look up one record by id.
    fn get(&self, project_id: &str, id: &str) -> Result<Option<E>> {
        Ok(self
            .list(project_id)?
            .into_iter()
            .find(|entity| entity.id() == id))
    }
}

/// In-process repository, mainly for tests and embedding.
pub struct MemoryRepository<E: Entity> {
    projects: Mutex<HashMap<String, Vec<E>>>,
}

impl<E: Entity> MemoryRepository<E> {
    pub fn new() -> Self {
        Self {
            projects: Mutex::new(HashMap::new()),
        }
    }

    fn with_project<T>(
        &self,
        project_id: &str,
        f: impl FnOnce(&mut Vec<E>) -> Result<T>,
    ) -> Result<T> {
        let mut projects = self
            .projects
            .lock()
            .map_err(|_| Error::Storage(format!("{} store poisoned", E::KIND)))?;
        let records = projects.entry(project_id.to_string()).or_default();
        f(records)
    }
}

impl<E: Entity> Default for MemoryRepository<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Entity> Repository<E> for MemoryRepository<E> {
    fn list(&self, project_id: &str) -> Result<Vec<E>> {
        self.with_project(project_id, |records| Ok(records.clone()))
    }

    fn create(&self, entity: E) -> Result<E> {
        let project_id = entity.project_id().to_string();
        self.with_project(&project_id, |records| {
            insert_record(records, entity.clone())?;
            Ok(entity)
        })
    }

    fn create_with(&self, project_id: &str, build: &mut dyn FnMut(&[E]) -> Result<E>) -> Result<E> {
        self.with_project(project_id, |records| {
            let entity = build(records)?;
            check_project(&entity, project_id)?;
            insert_record(records, entity.clone())?;
            Ok(entity)
        })
    }

    fn update(&self, entity: E) -> Result<E> {
        let project_id = entity.project_id().to_string();
        self.with_project(&project_id, |records| {
            replace_record(records, entity.clone())?;
            Ok(entity)
        })
    }

    fn delete(&self, project_id: &str, id: &str) -> Result<()> {
        self.with_project(project_id, |records| {
            remove_record(records, id);
            Ok(())
        })
    }
}

/// Reject a built record that belongs to another project.
pub(crate) fn check_project<E: Entity>(entity: &E, project_id: &str) -> Result<()> {
    if entity.project_id() != project_id {
        return Err(Error::Storage(format!(
            "{} {} belongs to project '{}', not '{}'",
            E::KIND,
            entity.id(),
            entity.project_id(),
            project_id
        )));
    }
    Ok(())
}

/// Append a record, rejecting duplicate ids.
pub(crate) fn insert_record<E: Entity>(records: &mut Vec<E>, entity: E) -> Result<()> {
    if records.iter().any(|existing| existing.id() == entity.id()) {
        return Err(Error::Storage(format!(
            "{} already exists: {}",
            E::KIND,
            entity.id()
        )));
    }
    records.push(entity);
    Ok(())
}

/// Swap a record in place, keeping its position.
pub(crate) fn replace_record<E: Entity>(records: &mut [E], entity: E) -> Result<()> {
    let slot = records
        .iter_mut()
        .find(|existing| existing.id() == entity.id())
        .ok_or_else(|| Error::not_found(E::KIND.name(), entity.id()))?;
    *slot = entity;
    Ok(())
}

/// Drop a record if present; reports whether anything was removed.
pub(crate) fn remove_record<E: Entity>(records: &mut Vec<E>, id: &str) -> bool {
    let before = records.len();
    records.retain(|existing| existing.id() != id);
    records.len() != before
}
