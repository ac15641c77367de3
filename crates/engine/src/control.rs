use std::fmt;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

type FileHook = Box<dyn Fn(&Path, &ScanControl) + Send + Sync>;

/// Cooperative stop signal shared by every worker of a scan.
///
/// Workers poll [`ScanControl::should_stop`] before picking up a file. A file
/// that has already started always runs to completion.
#[derive(Default)]
pub struct ScanControl {
    cancelled: AtomicBool,
    deadline: Option<Instant>,
    on_file_started: Option<FileHook>,
}

impl ScanControl {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deadline `timeout` from now; `None` never expires.
    pub fn with_timeout(timeout: Option<Duration>) -> Self {
        Self {
            deadline: timeout.map(|t| Instant::now() + t),
            ..Self::default()
        }
    }

    /// Calls `hook` on the worker thread each time a file is picked up.
    pub fn on_file_started(
        mut self,
        hook: impl Fn(&Path, &ScanControl) + Send + Sync + 'static,
    ) -> Self {
        self.on_file_started = Some(Box::new(hook));
        self
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }

    pub fn deadline_passed(&self) -> bool {
        self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    pub fn should_stop(&self) -> bool {
        self.is_cancelled() || self.deadline_passed()
    }

    pub(crate) fn file_started(&self, path: &Path) {
        if let Some(hook) = &self.on_file_started {
            hook(path, self);
        }
    }
}

impl fmt::Debug for ScanControl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScanControl")
            .field("cancelled", &self.is_cancelled())
            .field("deadline", &self.deadline)
            .field("on_file_started", &self.on_file_started.is_some())
            .finish()
    }
}

/// Matching stopped because the file ran past its time limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("file time limit exceeded")]
pub struct Interrupted;
