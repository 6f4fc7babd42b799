//! sprintboard - backlog, sprint and kanban task engine
//!
//! This library provides the core of the sprintboard CLI: a task store,
//! a sprint lifecycle manager, a task filter engine and a label registry,
//! all persisting through a project-keyed [`repository::Repository`].
//!
//! # Core Concepts
//!
//! - **Tasks**: work items ordered within kanban status columns
//! - **Backlog**: tasks not assigned to any sprint
//! - **Sprints**: time-boxed iterations, `planning -> active -> completed`
//! - **Labels**: project-scoped tags with a display color
//! - **Epics**: epic-type tasks that other tasks roll up to via `epic_id`
//!
//! # Module Organization
//!
//! - `board`: Facade wiring all components to one set of repositories
//! - `cli`: Command-line interface using clap
//! - `config`: Configuration loading from `.sprintboard.toml`
//! - `epic`: Epic grouping and progress
//! - `error`: Error types and result aliases
//! - `filter`: Task filter specification and matching
//! - `label`: Label registry
//! - `lock`: File locking and atomic writes
//! - `model`: Task, sprint and label records
//! - `output`: Human and JSON output for CLI commands
//! - `repository`: Persistence contract and in-memory implementation
//! - `sprint`: Sprint lifecycle and metrics
//! - `storage`: JSON-file repository under `.sprintboard/`
//! - `task`: Task store

pub mod board;
pub mod cli;
pub mod config;
pub mod epic;
pub mod error;
pub mod filter;
pub mod label;
pub mod lock;
pub mod model;
pub mod output;
pub mod repository;
pub mod sprint;
pub mod storage;
pub mod task;

pub use board::Board;
pub use epic::{group_by_epic, EpicSummary};
pub use error::{Error, ErrorKind, Result};
pub use filter::{filter_tasks, FilterSpec};
pub use model::{
    normalize_labels, IssueType, Label, LabelPatch, LabelRef, NewLabel, NewSprint, NewTask, Priority,
    Sprint, SprintPatch, SprintStatus, Task, TaskPatch, TaskStatus,
};
pub use repository::{MemoryRepository, Repository};
pub use sprint::{days_remaining, SprintManager, SprintStats};
pub use storage::FileRepository;
pub use task::TaskStore;
pub use label::{resolve_labels, LabelRegistry};
