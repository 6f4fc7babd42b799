//! Command-line interface for sprintboard
//!
//! This module defines the CLI structure using clap derive macros.
//! Each command group is implemented in its own submodule.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use chrono::NaiveDate;

use crate::board::Board;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::output::OutputOptions;

mod init;
mod label;
mod project;
mod sprint;
mod task;

/// sprintboard - backlog, sprint and kanban board for Lab68 projects
#[derive(Parser, Debug)]
#[command(name = "sprintboard")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Board root holding `.sprintboard/` (defaults to current directory)
    #[arg(long, global = true, env = "SPRINTBOARD_ROOT")]
    pub root: Option<PathBuf>,

    /// Project to operate on (defaults to `default_project` from config)
    #[arg(short, long, global = true, env = "SPRINTBOARD_PROJECT")]
    pub project: Option<String>,

    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create the data directory and a default `.sprintboard.toml`
    Init,

    /// Task management
    #[command(subcommand)]
    Task(TaskCommands),

    /// Sprint lifecycle and metrics
    #[command(subcommand)]
    Sprint(SprintCommands),

    /// Label registry
    #[command(subcommand)]
    Label(LabelCommands),

    /// List projects with stored data
    Projects,
}

/// Task subcommands
#[derive(Subcommand, Debug)]
pub enum TaskCommands {
    /// Create a task
    New {
        /// Task title
        title: String,

        #[arg(short, long)]
        description: Option<String>,

        /// backlog, todo, in-progress, review, done, closed, blocked
        #[arg(long)]
        status: Option<String>,

        /// lowest, low, medium, high, urgent
        #[arg(long)]
        priority: Option<String>,

        /// story, task, bug, epic, subtask
        #[arg(long = "type")]
        issue_type: Option<String>,

        #[arg(long)]
        assignee: Option<String>,

        #[arg(long)]
        points: Option<u32>,

        /// Due date (YYYY-MM-DD)
        #[arg(long)]
        due: Option<String>,

        /// Label id or name (repeatable)
        #[arg(long = "label")]
        labels: Vec<String>,

        /// Parent epic (id or key)
        #[arg(long)]
        epic: Option<String>,
    },

    /// List tasks matching a filter
    List {
        /// Case-insensitive text in title, description or key
        #[arg(short, long)]
        search: Option<String>,

        #[arg(long, value_delimiter = ',')]
        status: Vec<String>,

        #[arg(long, value_delimiter = ',')]
        priority: Vec<String>,

        #[arg(long = "type", value_delimiter = ',')]
        issue_type: Vec<String>,

        #[arg(long, value_delimiter = ',')]
        assignee: Vec<String>,

        /// Label id or name
        #[arg(long, value_delimiter = ',')]
        label: Vec<String>,

        /// Sprint id or name, or `backlog` for tasks without a sprint
        #[arg(long)]
        sprint: Option<String>,
    },

    /// Show a task
    Show {
        /// Task id or key
        id: String,
    },

    /// Edit task fields
    Edit {
        /// Task id or key
        id: String,

        #[arg(long)]
        title: Option<String>,

        #[arg(short, long)]
        description: Option<String>,

        #[arg(long)]
        priority: Option<String>,

        #[arg(long = "type")]
        issue_type: Option<String>,

        #[arg(long, conflicts_with = "clear_assignee")]
        assignee: Option<String>,

        #[arg(long)]
        clear_assignee: bool,

        #[arg(long)]
        points: Option<u32>,

        #[arg(long, conflicts_with = "clear_due")]
        due: Option<String>,

        #[arg(long)]
        clear_due: bool,

        /// Replace the task's labels (repeatable)
        #[arg(long = "label", conflicts_with = "clear_labels")]
        labels: Vec<String>,

        #[arg(long)]
        clear_labels: bool,

        /// Parent epic (id or key)
        #[arg(long, conflicts_with = "clear_epic")]
        epic: Option<String>,

        #[arg(long)]
        clear_epic: bool,
    },

    /// Delete a task
    Rm {
        /// Task id or key
        id: String,
    },

    /// Move a task to a kanban column
    Status {
        /// Task id or key
        id: String,

        /// New status
        status: String,
    },

    /// Assign a task to a sprint
    Sprint {
        /// Task id or key
        id: String,

        /// Sprint id or name
        sprint: String,
    },

    /// Return a task to the backlog
    Backlog {
        /// Task id or key
        id: String,
    },

    /// Set column order from the given sequence of tasks
    Reorder {
        /// Task ids or keys, first gets order 0
        #[arg(required = true)]
        ids: Vec<String>,
    },

    /// Show the kanban board
    Board {
        /// Restrict to a sprint (id or name)
        #[arg(long)]
        sprint: Option<String>,
    },

    /// List epics with their issues and progress
    Epics,
}

/// Sprint subcommands
#[derive(Subcommand, Debug)]
pub enum SprintCommands {
    /// Create a sprint in planning
    New {
        name: String,

        #[arg(long)]
        goal: Option<String>,

        /// Start date (YYYY-MM-DD)
        #[arg(long)]
        start: Option<String>,

        /// End date (YYYY-MM-DD)
        #[arg(long)]
        end: Option<String>,
    },

    /// List sprints
    List,

    /// Show a sprint with its tasks
    Show {
        /// Sprint id or name
        id: String,
    },

    /// Start a planned sprint
    Start {
        /// Sprint id or name
        id: String,
    },

    /// Complete an active sprint
    Complete {
        /// Sprint id or name
        id: String,
    },

    /// Edit sprint name, goal or dates
    Edit {
        /// Sprint id or name
        id: String,

        #[arg(long)]
        name: Option<String>,

        #[arg(long, conflicts_with = "clear_goal")]
        goal: Option<String>,

        #[arg(long)]
        clear_goal: bool,

        #[arg(long)]
        start: Option<String>,

        #[arg(long)]
        end: Option<String>,
    },

    /// Delete a sprint, returning its tasks to the backlog
    Rm {
        /// Sprint id or name
        id: String,
    },

    /// Show the active sprint
    Active,

    /// Progress numbers for a sprint
    Stats {
        /// Sprint id or name
        id: String,
    },
}

/// Label subcommands
#[derive(Subcommand, Debug)]
pub enum LabelCommands {
    /// Create a label
    New {
        name: String,

        /// Hex color; picked from the palette when omitted
        #[arg(long)]
        color: Option<String>,

        #[arg(short, long)]
        description: Option<String>,
    },

    /// List labels
    List,

    /// Edit a label
    Edit {
        /// Label id or name
        id: String,

        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        color: Option<String>,

        #[arg(short, long)]
        description: Option<String>,
    },

    /// Delete a label and strip it from tasks
    Rm {
        /// Label id or name
        id: String,
    },
}

/// Flags shared by every command
#[derive(Debug, Clone)]
pub struct GlobalArgs {
    pub root: Option<PathBuf>,
    pub project: Option<String>,
    pub json: bool,
    pub quiet: bool,
}

impl GlobalArgs {
    pub fn output(&self) -> OutputOptions {
        OutputOptions {
            json: self.json,
            quiet: self.quiet,
        }
    }

    pub fn root(&self) -> Result<PathBuf> {
        match &self.root {
            Some(path) => Ok(path.clone()),
            None => Ok(std::env::current_dir()?),
        }
    }
}

/// Board opened for one project
pub(crate) struct Context {
    pub root: PathBuf,
    pub project: String,
    pub board: Board,
}

pub(crate) fn load_context(global: &GlobalArgs) -> Result<Context> {
    let root = global.root()?;
    let config = Config::load_from_root(&root);
    let project = global
        .project
        .clone()
        .unwrap_or_else(|| config.default_project.clone());
    let project = project.trim().to_string();
    if project.is_empty() {
        return Err(Error::InvalidArgument("project cannot be empty".to_string()));
    }
    tracing::debug!(root = %root.display(), project = %project, "loading board");
    let board = Board::open(&root, config);
    Ok(Context {
        root,
        project,
        board,
    })
}

pub(crate) fn parse_date(flag: &str, value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|_| {
        Error::InvalidArgument(format!("--{flag} expects YYYY-MM-DD, got '{value}'"))
    })
}

impl Cli {
    fn global(&self) -> GlobalArgs {
        GlobalArgs {
            root: self.root.clone(),
            project: self.project.clone(),
            json: self.json,
            quiet: self.quiet,
        }
    }

    /// Execute the CLI command
    pub fn run(self) -> Result<()> {
        let global = self.global();
        match self.command {
            Commands::Init => init::run(global),
            Commands::Projects => project::run_list(global),
            Commands::Task(cmd) => match cmd {
                TaskCommands::New {
                    title,
                    description,
                    status,
                    priority,
                    issue_type,
                    assignee,
                    points,
                    due,
                    labels,
                    epic,
                } => task::run_new(task::NewOptions {
                    title,
                    description,
                    status,
                    priority,
                    issue_type,
                    assignee,
                    points,
                    due,
                    labels,
                    epic,
                    global,
                }),
                TaskCommands::List {
                    search,
                    status,
                    priority,
                    issue_type,
                    assignee,
                    label,
                    sprint,
                } => task::run_list(task::ListOptions {
                    search,
                    statuses: status,
                    priorities: priority,
                    types: issue_type,
                    assignees: assignee,
                    labels: label,
                    sprint,
                    global,
                }),
                TaskCommands::Show { id } => task::run_show(task::ShowOptions { id, global }),
                TaskCommands::Edit {
                    id,
                    title,
                    description,
                    priority,
                    issue_type,
                    assignee,
                    clear_assignee,
                    points,
                    due,
                    clear_due,
                    labels,
                    clear_labels,
                    epic,
                    clear_epic,
                } => task::run_edit(task::EditOptions {
                    id,
                    title,
                    description,
                    priority,
                    issue_type,
                    assignee,
                    clear_assignee,
                    points,
                    due,
                    clear_due,
                    labels,
                    clear_labels,
                    epic,
                    clear_epic,
                    global,
                }),
                TaskCommands::Rm { id } => task::run_rm(task::RmOptions { id, global }),
                TaskCommands::Status { id, status } => {
                    task::run_status(task::StatusOptions { id, status, global })
                }
                TaskCommands::Sprint { id, sprint } => {
                    task::run_sprint(task::SprintOptions { id, sprint, global })
                }
                TaskCommands::Backlog { id } => {
                    task::run_backlog(task::BacklogOptions { id, global })
                }
                TaskCommands::Reorder { ids } => {
                    task::run_reorder(task::ReorderOptions { ids, global })
                }
                TaskCommands::Board { sprint } => {
                    task::run_board(task::BoardOptions { sprint, global })
                }
                TaskCommands::Epics => task::run_epics(global),
            },
            Commands::Sprint(cmd) => match cmd {
                SprintCommands::New {
                    name,
                    goal,
                    start,
                    end,
                } => sprint::run_new(sprint::NewOptions {
                    name,
                    goal,
                    start,
                    end,
                    global,
                }),
                SprintCommands::List => sprint::run_list(global),
                SprintCommands::Show { id } => sprint::run_show(sprint::TargetOptions { id, global }),
                SprintCommands::Start { id } => {
                    sprint::run_start(sprint::TargetOptions { id, global })
                }
                SprintCommands::Complete { id } => {
                    sprint::run_complete(sprint::TargetOptions { id, global })
                }
                SprintCommands::Edit {
                    id,
                    name,
                    goal,
                    clear_goal,
                    start,
                    end,
                } => sprint::run_edit(sprint::EditOptions {
                    id,
                    name,
                    goal,
                    clear_goal,
                    start,
                    end,
                    global,
                }),
                SprintCommands::Rm { id } => sprint::run_rm(sprint::TargetOptions { id, global }),
                SprintCommands::Active => sprint::run_active(global),
                SprintCommands::Stats { id } => {
                    sprint::run_stats(sprint::TargetOptions { id, global })
                }
            },
            Commands::Label(cmd) => match cmd {
                LabelCommands::New {
                    name,
                    color,
                    description,
                } => label::run_new(label::NewOptions {
                    name,
                    color,
                    description,
                    global,
                }),
                LabelCommands::List => label::run_list(global),
                LabelCommands::Edit {
                    id,
                    name,
                    color,
                    description,
                } => label::run_edit(label::EditOptions {
                    id,
                    name,
                    color,
                    description,
                    global,
                }),
                LabelCommands::Rm { id } => label::run_rm(label::RmOptions { id, global }),
            },
        }
    }
}
