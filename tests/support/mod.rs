#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use serde_json::Value;
use sprintboard::config::{Config, CONFIG_FILE};
use sprintboard::Board;
use tempfile::TempDir;

/// Board root in a temp directory
pub struct TestBoard {
    dir: TempDir,
}

impl TestBoard {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("failed to create tempdir");
        Self { dir }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn write_file(&self, rel_path: &str, contents: &str) -> std::io::Result<PathBuf> {
        let path = self.dir.path().join(rel_path);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, contents)?;
        Ok(path)
    }

    pub fn write_config(&self, contents: &str) -> std::io::Result<PathBuf> {
        self.write_file(CONFIG_FILE, contents)
    }

    pub fn data_dir(&self) -> PathBuf {
        self.dir.path().join(".sprintboard")
    }

    /// File-backed board with the root's config (or defaults)
    pub fn open(&self) -> Board {
        Board::open(self.path(), Config::load_from_root(self.path()))
    }

    pub fn open_with(&self, config: Config) -> Board {
        Board::open(self.path(), config)
    }

    /// CLI invocation rooted at this board
    pub fn cmd(&self) -> Command {
        let mut cmd = sprintboard_cmd();
        cmd.env("SPRINTBOARD_ROOT", self.path());
        cmd.env_remove("SPRINTBOARD_PROJECT");
        cmd.current_dir(self.path());
        cmd
    }

    /// Run a `--json` command and return the envelope's `data`
    pub fn json(&self, args: &[&str]) -> Value {
        let output = self
            .cmd()
            .args(args)
            .arg("--json")
            .output()
            .expect("run sprintboard");
        assert!(
            output.status.success(),
            "sprintboard {:?} failed: {}{}",
            args,
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        );
        let envelope: Value = serde_json::from_slice(&output.stdout).expect("json envelope");
        assert_eq!(envelope["status"], "success");
        envelope["data"].clone()
    }
}

pub fn sprintboard_cmd() -> Command {
    let mut cmd = Command::cargo_bin("sprintboard").expect("binary");
    cmd.env_remove("RUST_LOG");
    cmd
}
