//! sprintboard CLI
//!
//! Backlog, sprint and kanban board for Lab68 projects, stored as JSON
//! documents under `.sprintboard/`.

use clap::Parser;
use sprintboard::cli::Cli;
use sprintboard::output::{emit_error, infer_command_name_from_args};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const MAX_FILTER_LEN: usize = 4096;

/// Logs go to stderr so `--json` stdout stays parseable. Off unless
/// `RUST_LOG` (or `SPRINTBOARD_LOG`) holds a valid filter.
fn init_tracing() {
    let filter = ["RUST_LOG", "SPRINTBOARD_LOG"]
        .iter()
        .filter_map(|var| std::env::var(var).ok())
        .map(|raw| raw.trim().to_string())
        .find(|raw| !raw.is_empty() && raw.len() <= MAX_FILTER_LEN)
        .and_then(|raw| EnvFilter::try_new(raw).ok())
        .unwrap_or_else(|| EnvFilter::new("off"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .with(filter)
        .init();
}

fn main() {
    init_tracing();

    let command = infer_command_name_from_args();
    let cli = Cli::parse();
    let json = cli.json;
    let result = cli.run();
    if let Err(err) = result {
        tracing::debug!(command = %command, error = %err, "command failed");
        let _ = emit_error(&command, &err, json);
        std::process::exit(err.exit_code());
    }
}
