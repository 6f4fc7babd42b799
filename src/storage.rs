//! JSON-file storage for board records
//!
//! Each `(collection, project)` pair is one JSON document, mirroring the
//! key-value layout the dashboard used to keep in browser storage:
//!
//! ```text
//! <root>/.sprintboard/
//!   tasks_<stem>.json        # {"schema_version": "sprintboard.v1", "project_id": ..., "records": [...]}
//!   tasks_<stem>.json.lock   # sidecar lock taken around read-modify-write
//!   sprints_<stem>.json
//!   labels_<stem>.json
//! ```
//!
//! `<stem>` is the project id when it is already lowercase and file-safe,
//! otherwise a sanitized form plus a digest of the real id (see
//! [`project_file_stem`]).

use std::collections::BTreeSet;
use std::fs;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::{Error, Result};
use crate::lock::{self, DocumentLock, DEFAULT_LOCK_TIMEOUT_MS};
use crate::repository::{
    check_project, insert_record, remove_record, replace_record, Entity, EntityKind, Repository,
};

/// Name of the data directory under the board root
pub const DATA_DIR: &str = ".sprintboard";

/// Schema tag written into every document
pub const SCHEMA_VERSION: &str = "sprintboard.v1";

const COLLECTIONS: [EntityKind; 3] = [EntityKind::Task, EntityKind::Sprint, EntityKind::Label];

/// On-disk envelope for one project's records of one kind
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document<E> {
    pub schema_version: String,
    pub project_id: String,
    pub records: Vec<E>,
}

impl<E> Document<E> {
    pub fn empty(project_id: &str) -> Self {
        Self {
            schema_version: SCHEMA_VERSION.to_string(),
            project_id: project_id.to_string(),
            records: Vec::new(),
        }
    }
}

/// Storage manager for the board's data directory
#[derive(Debug, Clone)]
pub struct Storage {
    /// Directory holding `.sprintboard/`
    root: PathBuf,
    lock_timeout_ms: u64,
}

impl Storage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            lock_timeout_ms: DEFAULT_LOCK_TIMEOUT_MS,
        }
    }

    pub fn with_lock_timeout(mut self, timeout_ms: u64) -> Self {
        self.lock_timeout_ms = timeout_ms;
        self
    }

    // =========================================================================
    // Path accessors
    // =========================================================================

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path to the `.sprintboard/` directory
    pub fn data_dir(&self) -> PathBuf {
        self.root.join(DATA_DIR)
    }

    /// Path of the document holding `kind` records for a project
    pub fn collection_file(&self, kind: EntityKind, project_id: &str) -> PathBuf {
        self.data_dir().join(format!(
            "{}_{}.json",
            kind.collection(),
            project_file_stem(project_id)
        ))
    }

    // =========================================================================
    // Initialization
    // =========================================================================

    pub fn init(&self) -> Result<()> {
        fs::create_dir_all(self.data_dir())?;
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.data_dir().is_dir()
    }

    // =========================================================================
    // File I/O helpers
    // =========================================================================

    /// Write JSON data atomically (write to temp, then rename)
    pub fn write_json<T: Serialize>(&self, path: &Path, data: &T) -> Result<()> {
        let json = serde_json::to_string_pretty(data)?;
        lock::write_atomic(path, json.as_bytes())
    }

    /// Read JSON data from a file
    pub fn read_json<T: DeserializeOwned>(&self, path: &Path) -> Result<T> {
        let content = fs::read_to_string(path)?;
        let data: T = serde_json::from_str(&content)?;
        Ok(data)
    }

    /// Load a project document, or an empty one if nothing is stored yet
    pub fn read_document<E: Entity>(&self, project_id: &str) -> Result<Document<E>> {
        let path = self.collection_file(E::KIND, project_id);
        if !path.exists() {
            return Ok(Document::empty(project_id));
        }
        let document: Document<E> = self.read_json(&path)?;
        if document.schema_version != SCHEMA_VERSION {
            return Err(Error::Storage(format!(
                "{}: unsupported schema version '{}' (expected {})",
                path.display(),
                document.schema_version,
                SCHEMA_VERSION
            )));
        }
        if document.project_id != project_id {
            return Err(Error::Storage(format!(
                "{}: belongs to project '{}', not '{}'",
                path.display(),
                document.project_id,
                project_id
            )));
        }
        Ok(document)
    }

    /// Read-modify-write a project document under its lock
    pub fn modify_document<E, T>(
        &self,
        project_id: &str,
        f: impl FnOnce(&mut Vec<E>) -> Result<T>,
    ) -> Result<T>
    where
        E: Entity,
    {
        let path = self.collection_file(E::KIND, project_id);
        let _lock = DocumentLock::acquire(&path, self.lock_timeout_ms)?;
        let mut document = self.read_document::<E>(project_id)?;
        let outcome = f(&mut document.records)?;
        self.write_json(&path, &document)?;
        Ok(outcome)
    }

    // =========================================================================
    // Project discovery
    // =========================================================================

    /// Project ids that have at least one stored document, sorted
    pub fn list_projects(&self) -> Result<Vec<String>> {
        let mut projects = BTreeSet::new();
        if !self.is_initialized() {
            return Ok(Vec::new());
        }
        for kind in COLLECTIONS {
            let pattern = self
                .data_dir()
                .join(format!("{}_*.json", kind.collection()))
                .display()
                .to_string();
            let paths = glob::glob(&pattern)
                .map_err(|err| Error::Storage(format!("invalid pattern '{pattern}': {err}")))?;
            for entry in paths {
                let path = entry.map_err(|err| Error::Storage(err.to_string()))?;
                let header: DocumentHeader = self.read_json(&path)?;
                projects.insert(header.project_id);
            }
        }
        Ok(projects.into_iter().collect())
    }
}

#[derive(Deserialize)]
struct DocumentHeader {
    project_id: String,
}

/// Make a project id safe for use inside a file name.
///
/// ASCII alphanumerics, `-` and `_` are kept (lowercased), everything else
/// becomes `_`.
pub fn sanitize_project_id(project_id: &str) -> String {
    let sanitized: String = project_id
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect();
    if sanitized.is_empty() {
        "_".to_string()
    } else {
        sanitized
    }
}

/// Digest length, in hex characters, appended to altered stems
const STEM_DIGEST_LEN: usize = 12;

/// File stem for a project's documents; distinct ids get distinct stems.
///
/// Ids that survive [`sanitize_project_id`] unchanged are used as is.
/// Others get `.<digest>` appended, a separator sanitizing never produces,
/// so `"a b"` and `"a_b"` (or `"Web"` and `"web"`) never share a document.
pub fn project_file_stem(project_id: &str) -> String {
    let sanitized = sanitize_project_id(project_id);
    if sanitized == project_id {
        return sanitized;
    }
    let digest = Sha256::digest(project_id.as_bytes());
    let mut hex = String::with_capacity(STEM_DIGEST_LEN);
    for byte in digest.iter().take(STEM_DIGEST_LEN / 2) {
        hex.push_str(&format!("{byte:02x}"));
    }
    format!("{sanitized}.{hex}")
}

/// Repository backed by per-project JSON documents
pub struct FileRepository<E: Entity> {
    storage: Storage,
    _entity: PhantomData<fn() -> E>,
}

impl<E: Entity> FileRepository<E> {
    pub fn new(storage: Storage) -> Self {
        Self {
            storage,
            _entity: PhantomData,
        }
    }
}

impl<E: Entity> Repository<E> for FileRepository<E> {
    fn list(&self, project_id: &str) -> Result<Vec<E>> {
        Ok(self.storage.read_document::<E>(project_id)?.records)
    }

    fn create(&self, entity: E) -> Result<E> {
        let project_id = entity.project_id().to_string();
        self.storage.modify_document::<E, _>(&project_id, |records| {
            insert_record(records, entity.clone())?;
            Ok(())
        })?;
        tracing::debug!(kind = %E::KIND, id = entity.id(), project = %project_id, "record created");
        Ok(entity)
    }

    fn create_with(&self, project_id: &str, build: &mut dyn FnMut(&[E]) -> Result<E>) -> Result<E> {
        let entity = self.storage.modify_document::<E, _>(project_id, |records| {
            let entity = build(records)?;
            check_project(&entity, project_id)?;
            insert_record(records, entity.clone())?;
            Ok(entity)
        })?;
        tracing::debug!(kind = %E::KIND, id = entity.id(), project = %project_id, "record created");
        Ok(entity)
    }

    fn update(&self, entity: E) -> Result<E> {
        let project_id = entity.project_id().to_string();
        self.storage.modify_document::<E, _>(&project_id, |records| {
            replace_record(records, entity.clone())
        })?;
        tracing::debug!(kind = %E::KIND, id = entity.id(), project = %project_id, "record updated");
        Ok(entity)
    }

    fn delete(&self, project_id: &str, id: &str) -> Result<()> {
        let path = self.storage.collection_file(E::KIND, project_id);
        if !path.exists() {
            return Ok(());
        }
        let removed = self
            .storage
            .modify_document::<E, _>(project_id, |records| Ok(remove_record(records, id)))?;
        if removed {
            tracing::debug!(kind = %E::KIND, id, project = %project_id, "record deleted");
        }
        Ok(())
    }
}
