use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// Advisory file lock serializing writes to the board directory.
///
/// Uses platform-native flock (Unix) so the TUI and CLI never interleave
/// board.json writes. The holder records its pid in the lock file; a
/// contending process reports that pid when it gives up waiting.
pub struct BoardLock {
    _file: File,
    path: PathBuf,
}

/// Error type for lock operations
#[derive(Debug, thiserror::Error)]
pub enum LockError {
    #[error("could not create lock file at {path}: {source}")]
    CreateError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not acquire lock on {path}: held by {holder}")]
    Timeout { path: PathBuf, holder: String },
    #[error("lock error: {0}")]
    IoError(#[from] std::io::Error),
}

impl BoardLock {
    /// Acquire an advisory lock on the drift directory.
    /// Blocks up to `timeout` waiting for the lock.
    pub fn acquire(drift_dir: &Path, timeout: Duration) -> Result<Self, LockError> {
        let lock_path = drift_dir.join(".lock");
        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(&lock_path)
            .map_err(|e| LockError::CreateError {
                path: lock_path.clone(),
                source: e,
            })?;

        let start = Instant::now();
        loop {
            match try_lock(&file) {
                Ok(()) => {
                    // Best effort; the lock works even if the pid write fails
                    let _ = file.set_len(0);
                    let _ = write!(file, "{}", std::process::id());
                    let _ = file.flush();
                    return Ok(BoardLock {
                        _file: file,
                        path: lock_path,
                    });
                }
                Err(_) if start.elapsed() < timeout => {
                    std::thread::sleep(Duration::from_millis(10));
                }
                Err(_) => {
                    let holder = match fs::read_to_string(&lock_path) {
                        Ok(pid) if !pid.trim().is_empty() => format!("pid {}", pid.trim()),
                        _ => "another drift process".to_string(),
                    };
                    return Err(LockError::Timeout {
                        path: lock_path,
                        holder,
                    });
                }
            }
        }
    }

    /// Acquire with default timeout (5 seconds)
    pub fn acquire_default(drift_dir: &Path) -> Result<Self, LockError> {
        Self::acquire(drift_dir, Duration::from_secs(5))
    }
}

impl Drop for BoardLock {
    fn drop(&mut self) {
        // flock releases with the file descriptor; remove the pid marker too
        let _ = fs::remove_file(&self.path);
    }
}

/// Try to acquire an exclusive flock on the file (non-blocking)
#[cfg(unix)]
fn try_lock(file: &File) -> Result<(), std::io::Error> {
    use std::os::unix::io::AsRawFd;
    let fd = file.as_raw_fd();
    let result = unsafe { libc::flock(fd, libc::LOCK_EX | libc::LOCK_NB) };
    if result == 0 {
        Ok(())
    } else {
        Err(std::io::Error::last_os_error())
    }
}

#[cfg(not(unix))]
fn try_lock(_file: &File) -> Result<(), std::io::Error> {
    // On non-Unix platforms, just succeed (advisory locking)
    Ok(())
}
