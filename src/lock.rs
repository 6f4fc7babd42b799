//! Document locks and atomic writes for `.sprintboard/`
//!
//! A document `tasks_web.json` is guarded by an advisory fs2 lock on the
//! sidecar `tasks_web.json.lock`. Writers hold the lock for a whole
//! read-modify-write and replace the document with a temp file + rename.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

use fs2::FileExt;

use crate::error::{Error, Result};

/// Default lock timeout in milliseconds
pub const DEFAULT_LOCK_TIMEOUT_MS: u64 = 5000;

const POLL_INTERVAL: Duration = Duration::from_millis(25);

const LOCK_SUFFIX: &str = "lock";

/// Exclusive hold on one stored document; released on drop
#[derive(Debug)]
pub struct DocumentLock {
    file: File,
    sidecar: PathBuf,
}

impl DocumentLock {
    /// Lock `document`, waiting at most `timeout_ms`
    ///
    /// The sidecar is created next to the document if needed. Contention past
    /// the timeout is `LockFailed`; any other failure is `Io`.
    pub fn acquire(document: &Path, timeout_ms: u64) -> Result<Self> {
        let sidecar = sidecar_path(document);
        if let Some(parent) = sidecar.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&sidecar)?;

        let deadline = Instant::now() + Duration::from_millis(timeout_ms);
        let mut waited = false;
        loop {
            match file.try_lock_exclusive() {
                Ok(()) => {
                    if waited {
                        tracing::debug!(lock = %sidecar.display(), "lock acquired after wait");
                    }
                    return Ok(Self { file, sidecar });
                }
                Err(err) if contended(&err) => {
                    if Instant::now() >= deadline {
                        tracing::warn!(lock = %sidecar.display(), timeout_ms, "lock wait timed out");
                        return Err(Error::LockFailed(sidecar));
                    }
                    waited = true;
                    thread::sleep(POLL_INTERVAL);
                }
                Err(err) => return Err(Error::Io(err)),
            }
        }
    }

    /// Sidecar file holding the lock
    pub fn sidecar(&self) -> &Path {
        &self.sidecar
    }
}

impl Drop for DocumentLock {
    fn drop(&mut self) {
        let _ = self.file.unlock();
    }
}

/// `<document>.lock`
pub fn sidecar_path(document: &Path) -> PathBuf {
    let mut name = document.as_os_str().to_os_string();
    name.push(".");
    name.push(LOCK_SUFFIX);
    PathBuf::from(name)
}

fn contended(err: &io::Error) -> bool {
    if err.kind() == io::ErrorKind::WouldBlock {
        return true;
    }
    // Windows reports sharing/lock violations as raw OS errors.
    cfg!(windows) && matches!(err.raw_os_error(), Some(32) | Some(33))
}

/// Replace `path` with `data` via a temp file in the same directory
///
/// Does not lock; callers writing a shared document hold its
/// [`DocumentLock`].
pub fn write_atomic(path: &Path, data: &[u8]) -> Result<()> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&parent)?;

    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document".to_string());
    let temp_path = parent.join(format!(
        ".{file_name}.{}.tmp",
        ulid::Ulid::new().to_string().to_lowercase()
    ));

    let written = File::create(&temp_path).and_then(|mut temp| {
        temp.write_all(data)?;
        temp.sync_all()
    });
    if let Err(err) = written.and_then(|()| fs::rename(&temp_path, path)) {
        let _ = fs::remove_file(&temp_path);
        return Err(Error::Io(err));
    }
    Ok(())
}
