//! Shared output formatting for sprintboard CLI commands.
//!
//! Every command either prints a human summary or, with `--json`, one
//! envelope on stdout:
//!
//! ```text
//! {"schema_version": "sprintboard.v1", "command": "task new",
//!  "status": "success", "data": {...}, "warnings": [...], "next_steps": [...]}
//! {"schema_version": "sprintboard.v1", "command": "task show",
//!  "status": "error", "error": {"message", "code", "kind", "details"}}
//! ```

use serde::Serialize;

use crate::error::{Error, JsonError, Result};

pub const SCHEMA_VERSION: &str = "sprintboard.v1";

#[derive(Debug, Clone, Copy)]
pub struct OutputOptions {
    pub json: bool,
    pub quiet: bool,
}

/// Human-readable report: a header line followed by optional sections.
#[derive(Debug, Clone, Default)]
pub struct HumanOutput {
    header: String,
    summary: Vec<(String, String)>,
    details: Vec<String>,
    warnings: Vec<String>,
    next_steps: Vec<String>,
}

impl HumanOutput {
    pub fn new(header: impl Into<String>) -> Self {
        Self {
            header: header.into(),
            ..Self::default()
        }
    }

    pub fn push_summary(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.summary.push((key.into(), value.into()));
    }

    pub fn push_detail(&mut self, value: impl Into<String>) {
        self.details.push(value.into());
    }

    pub fn push_warning(&mut self, value: impl Into<String>) {
        self.warnings.push(value.into());
    }

    pub fn push_next_step(&mut self, value: impl Into<String>) {
        self.next_steps.push(value.into());
    }
}

#[derive(Serialize, Clone, Copy)]
#[serde(rename_all = "snake_case")]
enum Outcome {
    Success,
    Error,
}

#[derive(Serialize)]
struct Envelope<'a, B: Serialize> {
    schema_version: &'static str,
    command: &'a str,
    status: Outcome,
    #[serde(flatten)]
    body: B,
    #[serde(skip_serializing_if = "<[String]>::is_empty")]
    warnings: &'a [String],
    #[serde(skip_serializing_if = "<[String]>::is_empty")]
    next_steps: &'a [String],
}

#[derive(Serialize)]
struct DataBody<'a, T: Serialize> {
    data: &'a T,
}

#[derive(Serialize)]
struct ErrorBody {
    error: JsonError,
}

/// JSON envelope for a successful command
pub fn render_success<T: Serialize>(
    command: &str,
    data: &T,
    human: Option<&HumanOutput>,
) -> Result<String> {
    let (warnings, next_steps) = match human {
        Some(human) => (human.warnings.as_slice(), human.next_steps.as_slice()),
        None => (&[][..], &[][..]),
    };
    let envelope = Envelope {
        schema_version: SCHEMA_VERSION,
        command,
        status: Outcome::Success,
        body: DataBody { data },
        warnings,
        next_steps,
    };
    Ok(serde_json::to_string_pretty(&envelope)?)
}

/// JSON envelope for a failed command
pub fn render_error(command: &str, err: &Error) -> Result<String> {
    let next_steps = error_next_steps(err);
    let envelope = Envelope {
        schema_version: SCHEMA_VERSION,
        command,
        status: Outcome::Error,
        body: ErrorBody {
            error: JsonError::from(err),
        },
        warnings: &[],
        next_steps: &next_steps,
    };
    Ok(serde_json::to_string_pretty(&envelope)?)
}

pub fn emit_success<T: Serialize>(
    options: OutputOptions,
    command: &str,
    data: &T,
    human: Option<&HumanOutput>,
) -> Result<()> {
    if options.json {
        println!("{}", render_success(command, data, human)?);
    } else if let Some(human) = human.filter(|_| !options.quiet) {
        println!("{}", format_human(human));
    }
    Ok(())
}

/// Report `err` on stdout (`--json`) or stderr with the first hint.
pub fn emit_error(command: &str, err: &Error, json: bool) -> Result<()> {
    if json {
        println!("{}", render_error(command, err)?);
        return Ok(());
    }

    eprintln!("error: {err}");
    if let Some(hint) = error_next_steps(err).first() {
        eprintln!("hint: {hint}");
    }
    Ok(())
}

pub fn format_human(output: &HumanOutput) -> String {
    let mut lines = Vec::new();
    lines.push(output.header.clone());

    push_summary(&mut lines, &output.summary);
    push_section(&mut lines, "Details", &output.details);
    push_section(&mut lines, "Warnings", &output.warnings);
    push_section(&mut lines, "Next steps", &output.next_steps);

    lines.join("\n")
}

/// Best-effort `"<command> <subcommand>"` name from argv, for error
/// envelopes emitted before or without a parsed CLI.
pub fn infer_command_name_from_args() -> String {
    command_name_from(std::env::args().skip(1))
}

fn command_name_from(args: impl IntoIterator<Item = String>) -> String {
    let mut args = args.into_iter();
    let mut command = None;

    // Values of global flags that take an argument are skipped with them.
    while let Some(arg) = args.next() {
        if matches!(arg.as_str(), "--root" | "--project" | "-p") {
            args.next();
            continue;
        }
        if arg.starts_with('-') {
            continue;
        }
        command = Some(arg);
        break;
    }

    let Some(command) = command else {
        return "sprintboard".to_string();
    };

    if matches!(command.as_str(), "task" | "sprint" | "label") {
        if let Some(sub) = args.find(|arg| !arg.starts_with('-')) {
            return format!("{command} {sub}");
        }
    }
    command
}

fn error_next_steps(err: &Error) -> Vec<String> {
    match err {
        Error::NotFound { kind: "Task", .. } => vec!["sprintboard task list".to_string()],
        Error::NotFound { kind: "Sprint", .. } => vec!["sprintboard sprint list".to_string()],
        Error::NotFound { kind: "Label", .. } => vec!["sprintboard label list".to_string()],
        Error::InvalidState { sprint, .. } => vec![format!("sprintboard sprint show {sprint}")],
        Error::InvalidConfig(_) => vec!["fix .sprintboard.toml then retry".to_string()],
        Error::LockFailed(_) => vec!["retry once the other writer finishes".to_string()],
        _ => Vec::new(),
    }
}

fn push_summary(lines: &mut Vec<String>, summary: &[(String, String)]) {
    if summary.is_empty() {
        return;
    }

    lines.push(String::new());
    lines.push("Summary:".to_string());
    for (key, value) in summary {
        if value.is_empty() {
            lines.push(format!("- {key}"));
        } else {
            lines.push(format!("- {key}: {value}"));
        }
    }
}

fn push_section(lines: &mut Vec<String>, title: &str, items: &[String]) {
    if items.is_empty() {
        return;
    }

    lines.push(String::new());
    lines.push(format!("{title}:"));
    for item in items {
        lines.push(format!("- {item}"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn command_name_includes_subcommand() {
        assert_eq!(command_name_from(args(&["--json", "task", "new", "x"])), "task new");
        assert_eq!(command_name_from(args(&["--project", "web", "sprint", "start"])), "sprint start");
        assert_eq!(command_name_from(args(&["init"])), "init");
        assert_eq!(command_name_from(args(&[])), "sprintboard");
    }

    #[test]
    fn human_output_sections() {
        let mut out = HumanOutput::new("sprintboard task new: created LAB-1");
        out.push_summary("status", "backlog");
        out.push_warning("sprint is completed");
        let text = format_human(&out);
        assert!(text.starts_with("sprintboard task new: created LAB-1"));
        assert!(text.contains("Summary:\n- status: backlog"));
        assert!(text.contains("Warnings:\n- sprint is completed"));
        assert!(!text.contains("Next steps"));
    }

    #[test]
    fn error_kinds_are_snake_case() {
        assert_eq!(Error::not_found("Task", "x").kind().as_str(), "not_found");
        assert_eq!(Error::Validation("x".into()).kind().as_str(), "validation");
        assert_eq!(Error::Storage("x".into()).kind().as_str(), "storage");
        assert_eq!(
            error_next_steps(&Error::not_found("Sprint", "x")),
            vec!["sprintboard sprint list".to_string()]
        );
    }

    #[test]
    fn success_envelope_carries_warnings() {
        let mut human = HumanOutput::new("Sprint started");
        human.push_warning("sprint has no tasks");
        let raw = render_success("sprint start", &serde_json::json!({"id": "s1"}), Some(&human))
            .expect("render");
        let value: serde_json::Value = serde_json::from_str(&raw).expect("json");
        assert_eq!(value["schema_version"], SCHEMA_VERSION);
        assert_eq!(value["status"], "success");
        assert_eq!(value["data"]["id"], "s1");
        assert_eq!(value["warnings"][0], "sprint has no tasks");
        assert!(value.get("next_steps").is_none());
    }

    #[test]
    fn error_envelope_carries_kind_and_hint() {
        let err = Error::InvalidState {
            sprint: "sprint_1".to_string(),
            from: "completed".to_string(),
            to: "completed".to_string(),
        };
        let raw = render_error("sprint complete", &err).expect("render");
        let value: serde_json::Value = serde_json::from_str(&raw).expect("json");
        assert_eq!(value["status"], "error");
        assert_eq!(value["error"]["kind"], "invalid_state");
        assert_eq!(value["error"]["code"], 3);
        assert_eq!(value["error"]["details"]["from"], "completed");
        assert_eq!(value["next_steps"][0], "sprintboard sprint show sprint_1");
        assert!(value.get("data").is_none());
    }
}
