//! PID file handling for the server process.
//!
//! The running server holds an exclusive advisory lock on its PID file for its
//! whole lifetime, so the lock, not the file's existence, decides whether a
//! server is running. A file left behind by a crashed server is simply taken
//! over.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use fs2::FileExt;
use sysinfo::{Pid, ProcessRefreshKind, ProcessStatus, ProcessesToUpdate, Signal, System};
use thiserror::Error;
use tracing::{debug, warn};

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Errors raised while managing the PID file.
#[derive(Error, Debug)]
pub enum PidError {
    /// Another server holds the PID file.
    #[error("server is already running")]
    AlreadyRunning {
        /// PID recorded in the file, if it could be read.
        pid: Option<u32>,
    },

    /// No server is running.
    #[error("server is not running")]
    NotRunning,

    /// The PID file could not be opened, read or written.
    #[error("PID file '{}': {source}", path.display())]
    Io {
        /// Path of the PID file.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: io::Error,
    },

    /// The PID file does not contain a process ID.
    #[error("PID file '{}' is invalid: {reason}", path.display())]
    Invalid {
        /// Path of the PID file.
        path: PathBuf,
        /// What is wrong with it.
        reason: String,
    },

    /// The stop signal could not be delivered.
    #[error("failed to send stop signal to process {0}")]
    Signal(u32),

    /// The process did not exit in time.
    #[error("process {pid} did not exit within {timeout:?}")]
    StopTimeout {
        /// Process that was signalled.
        pid: u32,
        /// How long we waited.
        timeout: Duration,
    },
}

impl PidError {
    fn io(path: &Path, source: io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// An acquired PID file. Dropping it removes the file and releases the lock.
#[derive(Debug)]
pub struct PidFile {
    path: PathBuf,
    file: File,
}

impl PidFile {
    /// Lock the PID file at `path` and record the current process ID in it.
    ///
    /// # Errors
    ///
    /// Returns [`PidError::AlreadyRunning`] if another process holds the lock.
    pub fn acquire(path: &Path) -> Result<Self, PidError> {
        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)
            .map_err(|e| PidError::io(path, e))?;

        if file.try_lock_exclusive().is_err() {
            return Err(PidError::AlreadyRunning {
                pid: read_pid(path).ok(),
            });
        }

        let mut previous = String::new();
        file.read_to_string(&mut previous)
            .map_err(|e| PidError::io(path, e))?;
        if !previous.trim().is_empty() {
            warn!(path = %path.display(), previous = previous.trim(), "taking over stale PID file");
        }

        let pid = std::process::id();
        write_pid(&mut file, pid).map_err(|e| PidError::io(path, e))?;

        debug!(path = %path.display(), pid, "acquired PID file");
        Ok(Self {
            path: path.to_path_buf(),
            file,
        })
    }

    /// Path of the PID file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for PidFile {
    fn drop(&mut self) {
        // Remove before unlocking so a new server never sees our file unlocked.
        remove_pid_file(&self.path);
        let _ = FileExt::unlock(&self.file);
    }
}

fn write_pid(file: &mut File, pid: u32) -> io::Result<()> {
    file.set_len(0)?;
    file.seek(SeekFrom::Start(0))?;
    writeln!(file, "{pid}")?;
    file.sync_all()
}

/// Read the process ID recorded at `path`.
///
/// # Errors
///
/// Returns [`PidError::NotRunning`] if the file does not exist.
pub fn read_pid(path: &Path) -> Result<u32, PidError> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Err(PidError::NotRunning),
        Err(e) => return Err(PidError::io(path, e)),
    };

    contents.trim().parse().map_err(|_| PidError::Invalid {
        path: path.to_path_buf(),
        reason: format!("expected a process ID, found {:?}", contents.trim()),
    })
}

/// Ask the server recorded at `path` to shut down and wait for it to exit.
///
/// Returns the PID of the stopped process. Only a file whose lock is held
/// by a live server is acted on: an unlocked file is stale, whatever PID it
/// records, and is removed without signalling anyone.
///
/// # Errors
///
/// Returns [`PidError::NotRunning`] if there is no PID file, nobody holds its
/// lock, or the recorded process is gone.
pub async fn stop(path: &Path, timeout: Duration) -> Result<u32, PidError> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Err(PidError::NotRunning),
        Err(e) => return Err(PidError::io(path, e)),
    };

    if file.try_lock_exclusive().is_ok() {
        warn!(path = %path.display(), "removing stale PID file");
        remove_pid_file(path);
        let _ = FileExt::unlock(&file);
        return Err(PidError::NotRunning);
    }

    let pid = read_pid(path)?;
    let target = Pid::from_u32(pid);
    let mut system = System::new();

    if !is_alive(&mut system, target) {
        warn!(path = %path.display(), pid, "PID file is locked but its process is gone");
        return Err(PidError::NotRunning);
    }

    let delivered = system
        .process(target)
        .and_then(|process| process.kill_with(Signal::Term))
        .unwrap_or(false);
    if !delivered {
        return Err(PidError::Signal(pid));
    }

    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        tokio::time::sleep(POLL_INTERVAL).await;
        if !is_alive(&mut system, target) {
            return Ok(pid);
        }
    }

    Err(PidError::StopTimeout { pid, timeout })
}

fn remove_pid_file(path: &Path) {
    if let Err(e) = fs::remove_file(path) {
        warn!(path = %path.display(), error = %e, "failed to remove PID file");
    }
}

fn is_alive(system: &mut System, pid: Pid) -> bool {
    system.refresh_processes_specifics(
        ProcessesToUpdate::Some(&[pid]),
        true,
        ProcessRefreshKind::new(),
    );

    system
        .process(pid)
        .is_some_and(|process| !matches!(process.status(), ProcessStatus::Zombie | ProcessStatus::Dead))
}
