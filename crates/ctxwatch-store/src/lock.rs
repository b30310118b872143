use std::fs::{File, OpenOptions};
use std::path::Path;
use std::time::{Duration, Instant};
use tracing::debug;

const RETRY_STEP: Duration = Duration::from_millis(50);

/// Advisory cross-process exclusive lock with a bounded wait.
///
/// If the lock cannot be acquired before the timeout, the guard is returned
/// anyway with `acquired == false` and the caller proceeds unlocked: a stuck
/// peer must not wedge the host, and a racy state write only costs one extra
/// rescan cycle.
pub struct ScopedLock {
    file: Option<File>,
    acquired: bool,
}

impl ScopedLock {
    pub fn acquire(path: &Path, timeout: Duration) -> ScopedLock {
        let file = match OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)
        {
            Ok(file) => file,
            Err(err) => {
                debug!(path = %path.display(), %err, "lock file unavailable, proceeding unlocked");
                return ScopedLock {
                    file: None,
                    acquired: false,
                };
            }
        };

        let deadline = Instant::now() + timeout;
        loop {
            if fs2::FileExt::try_lock_exclusive(&file).is_ok() {
                return ScopedLock {
                    file: Some(file),
                    acquired: true,
                };
            }
            if Instant::now() >= deadline {
                debug!(path = %path.display(), "lock wait timed out, proceeding unlocked");
                return ScopedLock {
                    file: Some(file),
                    acquired: false,
                };
            }
            std::thread::sleep(RETRY_STEP);
        }
    }

    pub fn acquired(&self) -> bool {
        self.acquired
    }
}

impl Drop for ScopedLock {
    fn drop(&mut self) {
        if self.acquired
            && let Some(file) = &self.file
        {
            let _ = fs2::FileExt::unlock(file);
        }
    }
}
