use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

/// How long a write command waits for another `cad` process by default
pub const DEFAULT_WAIT: Duration = Duration::from_secs(5);

const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Exclusive hold on a document for one load→edit→save cycle.
///
/// The lock is an advisory `flock` on `<document>.lock`. The file is
/// unlinked on release, so a holder only counts once the file it locked is
/// still the one at the lock path.
#[derive(Debug)]
pub struct DocumentLock {
    _file: File,
    path: PathBuf,
}

/// Error type for lock operations
#[derive(Debug, thiserror::Error)]
pub enum LockError {
    #[error("could not open lock file {path}: {source}")]
    Open { path: PathBuf, source: io::Error },
    #[error("{path} is held by another cad process (waited {waited:?})")]
    Busy { path: PathBuf, waited: Duration },
}

/// `notes.json` → `notes.json.lock`
pub fn lock_path_for(document: &Path) -> PathBuf {
    let mut name = document
        .file_name()
        .map(OsString::from)
        .unwrap_or_else(|| OsString::from("document"));
    name.push(".lock");
    document.with_file_name(name)
}

impl DocumentLock {
    /// Lock `document`, polling for up to `wait` while someone else holds it.
    pub fn acquire(document: &Path, wait: Duration) -> Result<Self, LockError> {
        let path = lock_path_for(document);
        let started = Instant::now();
        let mut announced = false;

        loop {
            // Reopen on every attempt: the previous holder may have unlinked
            // the file we saw last time.
            let file = open_lock_file(&path)?;
            let locked = try_flock(&file).map_err(|source| LockError::Open {
                path: path.clone(),
                source,
            })?;
            if locked {
                if is_current(&file, &path) {
                    tracing::debug!(path = %path.display(), "document lock acquired");
                    return Ok(DocumentLock { _file: file, path });
                }
                tracing::debug!(path = %path.display(), "locked a released lock file, retrying");
            }

            let waited = started.elapsed();
            if waited >= wait {
                return Err(LockError::Busy { path, waited });
            }
            if !announced {
                tracing::warn!(path = %path.display(), "waiting for document lock");
                announced = true;
            }
            thread::sleep(POLL_INTERVAL);
        }
    }

    pub fn acquire_default(document: &Path) -> Result<Self, LockError> {
        Self::acquire(document, DEFAULT_WAIT)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for DocumentLock {
    fn drop(&mut self) {
        // Unlink while the flock is still held; the flock goes with `_file`.
        let _ = fs::remove_file(&self.path);
        tracing::debug!(path = %self.path.display(), "document lock released");
    }
}

fn open_lock_file(path: &Path) -> Result<File, LockError> {
    OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(false)
        .open(path)
        .map_err(|source| LockError::Open {
            path: path.to_path_buf(),
            source,
        })
}

/// Non-blocking exclusive flock. `Ok(false)` when another holder has it.
#[cfg(unix)]
fn try_flock(file: &File) -> io::Result<bool> {
    use std::os::unix::io::AsRawFd;
    let rc = unsafe { libc::flock(file.as_raw_fd(), libc::LOCK_EX | libc::LOCK_NB) };
    if rc == 0 {
        return Ok(true);
    }
    let err = io::Error::last_os_error();
    if err.kind() == io::ErrorKind::WouldBlock {
        Ok(false)
    } else {
        Err(err)
    }
}

#[cfg(not(unix))]
fn try_flock(_file: &File) -> io::Result<bool> {
    Ok(true)
}

/// True when `file` is still the file linked at `path`.
#[cfg(unix)]
fn is_current(file: &File, path: &Path) -> bool {
    use std::os::unix::fs::MetadataExt;
    match (file.metadata(), fs::metadata(path)) {
        (Ok(held), Ok(linked)) => held.dev() == linked.dev() && held.ino() == linked.ino(),
        _ => false,
    }
}

#[cfg(not(unix))]
fn is_current(_file: &File, path: &Path) -> bool {
    path.exists()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;
    use tempfile::TempDir;

    #[test]
    fn test_lock_path_sits_beside_document() {
        assert_eq!(
            lock_path_for(Path::new("/data/habits.json")),
            PathBuf::from("/data/habits.json.lock")
        );
        assert_eq!(lock_path_for(Path::new("cadence.json")), PathBuf::from("cadence.json.lock"));
    }

    #[test]
    fn test_release_removes_lock_file() {
        let tmp = TempDir::new().unwrap();
        let doc = tmp.path().join("cadence.json");

        let lock = DocumentLock::acquire_default(&doc).unwrap();
        assert_eq!(lock.path(), lock_path_for(&doc));
        assert!(lock_path_for(&doc).exists());
        drop(lock);
        assert!(!lock_path_for(&doc).exists());

        assert!(DocumentLock::acquire(&doc, Duration::ZERO).is_ok());
    }

    #[cfg(unix)]
    #[test]
    fn test_second_holder_waits_then_gives_up() {
        let tmp = TempDir::new().unwrap();
        let doc = tmp.path().join("cadence.json");
        let _held = DocumentLock::acquire_default(&doc).unwrap();

        let err = DocumentLock::acquire(&doc, Duration::from_millis(50)).unwrap_err();
        assert!(matches!(err, LockError::Busy { .. }));
        assert!(err.to_string().contains("cadence.json.lock"));
    }

    #[cfg(unix)]
    #[test]
    fn test_replaced_lock_file_is_not_current() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("cadence.json.lock");
        let stale = open_lock_file(&path).unwrap();
        assert!(is_current(&stale, &path));

        fs::remove_file(&path).unwrap();
        assert!(!is_current(&stale, &path));
        let _fresh = open_lock_file(&path).unwrap();
        assert!(!is_current(&stale, &path));
    }

    #[cfg(unix)]
    #[test]
    fn test_waiter_and_newcomer_never_both_hold() {
        let tmp = TempDir::new().unwrap();
        let doc = tmp.path().join("cadence.json");
        let first = DocumentLock::acquire_default(&doc).unwrap();

        let (held_tx, held_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel::<()>();
        let waiter_doc = doc.clone();
        let waiter = thread::spawn(move || {
            let lock = DocumentLock::acquire_default(&waiter_doc).unwrap();
            held_tx.send(()).unwrap();
            release_rx.recv().unwrap();
            drop(lock);
        });

        // let the waiter start polling before the first holder lets go
        thread::sleep(Duration::from_millis(100));
        drop(first);
        held_rx.recv_timeout(Duration::from_secs(5)).unwrap();

        let newcomer = DocumentLock::acquire(&doc, Duration::from_millis(200));
        assert!(matches!(newcomer, Err(LockError::Busy { .. })));

        release_tx.send(()).unwrap();
        waiter.join().unwrap();
        assert!(DocumentLock::acquire(&doc, Duration::from_millis(200)).is_ok());
    }
}
